//! Async HTTP client wrapping the facegate JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use facegate_core::{geometry::Geometry, identity::IdentityRecord};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the facegate API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// Result of a `/verify` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
  Granted { name: String, department: String },
  NotFound,
}

#[derive(Debug, Deserialize)]
struct SavedBody {
  id: Uuid,
}

#[derive(Debug, Deserialize)]
struct GrantedBody {
  name:       String,
  department: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Debug, Deserialize)]
pub struct LatestBody {
  pub face:   Geometry,
  pub age_ms: u64,
}

/// Async HTTP client for the facegate API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `POST /save`
  pub async fn register(&self, name: &str, department: &str, face: &Geometry) -> Result<Uuid> {
    let resp = self
      .client
      .post(self.url("/save"))
      .json(&json!({ "name": name, "department": department, "face": face }))
      .send()
      .await
      .context("POST /save failed")?;

    let saved: SavedBody = expect_success(resp, "POST /save").await?.json().await.context("deserialising saved id")?;
    Ok(saved.id)
  }

  /// `POST /verify`
  pub async fn verify(&self, face: &Geometry) -> Result<Verdict> {
    let resp = self
      .client
      .post(self.url("/verify"))
      .json(&json!({ "face": face }))
      .send()
      .await
      .context("POST /verify failed")?;

    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(Verdict::NotFound);
    }
    let body: GrantedBody = expect_success(resp, "POST /verify").await?.json().await.context("deserialising verdict")?;
    Ok(Verdict::Granted { name: body.name, department: body.department })
  }

  /// `GET /all`
  pub async fn list(&self) -> Result<Vec<IdentityRecord>> {
    let resp = self.client.get(self.url("/all")).send().await.context("GET /all failed")?;
    expect_success(resp, "GET /all").await?.json().await.context("deserialising records")
  }

  /// `PUT /user/{id}`. `Ok(false)` when no such record exists.
  pub async fn update(&self, id: Uuid, name: Option<&str>, department: Option<&str>) -> Result<bool> {
    let mut body = serde_json::Map::new();
    if let Some(name) = name {
      body.insert("name".into(), name.into());
    }
    if let Some(department) = department {
      body.insert("department".into(), department.into());
    }

    let resp = self
      .client
      .put(self.url(&format!("/user/{id}")))
      .json(&body)
      .send()
      .await
      .context("PUT /user failed")?;
    found(resp, "PUT /user").await
  }

  /// `DELETE /user/{id}`. `Ok(false)` when no such record exists.
  pub async fn delete(&self, id: Uuid) -> Result<bool> {
    let resp = self
      .client
      .delete(self.url(&format!("/user/{id}")))
      .send()
      .await
      .context("DELETE /user failed")?;
    found(resp, "DELETE /user").await
  }

  /// `POST /latest`
  pub async fn publish_latest(&self, face: &Geometry) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/latest"))
      .json(face)
      .send()
      .await
      .context("POST /latest failed")?;
    expect_success(resp, "POST /latest").await?;
    Ok(())
  }

  /// `GET /latest`. `None` when the server holds no fresh reading.
  pub async fn latest(&self) -> Result<Option<LatestBody>> {
    let resp = self.client.get(self.url("/latest")).send().await.context("GET /latest failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let body = expect_success(resp, "GET /latest").await?.json().await.context("deserialising latest reading")?;
    Ok(Some(body))
  }
}

async fn found(resp: Response, what: &str) -> Result<bool> {
  if resp.status() == StatusCode::NOT_FOUND {
    return Ok(false);
  }
  expect_success(resp, what).await?;
  Ok(true)
}

/// Pass successful responses through; turn anything else into an error
/// carrying the server's `{"error": ...}` message when there is one.
async fn expect_success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let text = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<ErrorBody>(&text).map(|b| b.error).unwrap_or(text);
  Err(anyhow!("{what} → {status}: {message}"))
}
