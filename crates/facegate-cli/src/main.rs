//! `facegate`: command-line client for the facegate server.
//!
//! Geometry arguments name a JSON file produced by the face extractor, or
//! `-` to read it from stdin.
//!
//! # Usage
//!
//! ```
//! facegate register --name Ann --department R&D --geometry face.json
//! extract-face frame.png | facegate verify --geometry -
//! facegate --url http://gate.local:5000 list
//! ```

mod client;

use std::{
  io::Read as _,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, Verdict};
use facegate_core::{geometry::Geometry, validate::validate_geometry};
use serde::Deserialize;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "facegate", about = "Client for the facegate verification server")]
struct Args {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the facegate server (default: http://127.0.0.1:5000).
  #[arg(long, env = "FACEGATE_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Register a new identity.
  Register {
    #[arg(long)]
    name:       String,
    #[arg(long)]
    department: String,
    /// Geometry JSON file, or `-` for stdin.
    #[arg(long, value_name = "FILE")]
    geometry:   PathBuf,
  },
  /// Check a face reading against registered identities.
  Verify {
    #[arg(long, value_name = "FILE")]
    geometry: PathBuf,
  },
  /// List every registered identity.
  List,
  /// Change an identity's name and/or department.
  Update {
    id:         Uuid,
    #[arg(long)]
    name:       Option<String>,
    #[arg(long)]
    department: Option<String>,
  },
  /// Permanently remove an identity.
  Delete { id: Uuid },
  /// Hand a reading to the server's latest-reading slot.
  Publish {
    #[arg(long, value_name = "FILE")]
    geometry: PathBuf,
  },
  /// Print the most recent fresh reading, if any.
  Latest,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout:  Duration::from_secs(file_cfg.timeout_secs.unwrap_or(30)),
  };
  debug!(url = %api_config.base_url, "using server");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Register { name, department, geometry } => {
      let face = read_geometry(&geometry)?;
      let id = client.register(&name, &department, &face).await?;
      println!("Data saved: {id}");
    }
    Command::Verify { geometry } => {
      let face = read_geometry(&geometry)?;
      match client.verify(&face).await? {
        Verdict::Granted { name, department } => {
          println!("Access Granted: {name} ({department})");
        }
        Verdict::NotFound => {
          println!("Face not found");
          std::process::exit(1);
        }
      }
    }
    Command::List => {
      for record in client.list().await? {
        let [left, right] = record.face.eyes;
        println!(
          "{}  {:<20} {:<16} {}x{}  L({},{}) R({},{})",
          record.id,
          record.name,
          record.department,
          record.face.face_width,
          record.face.face_height,
          left.x,
          left.y,
          right.x,
          right.y,
        );
      }
    }
    Command::Update { id, name, department } => {
      if name.is_none() && department.is_none() {
        anyhow::bail!("nothing to update: pass --name and/or --department");
      }
      if !client.update(id, name.as_deref(), department.as_deref()).await? {
        anyhow::bail!("no identity with id {id}");
      }
      println!("User updated");
    }
    Command::Delete { id } => {
      if !client.delete(id).await? {
        anyhow::bail!("no identity with id {id}");
      }
      println!("User deleted");
    }
    Command::Publish { geometry } => {
      let face = read_geometry(&geometry)?;
      client.publish_latest(&face).await?;
    }
    Command::Latest => match client.latest().await? {
      Some(reading) => {
        println!("{}", serde_json::to_string_pretty(&reading.face)?);
        println!("age: {}ms", reading.age_ms);
      }
      None => {
        println!("no fresh reading");
        std::process::exit(1);
      }
    },
  }
  Ok(())
}

/// Read extractor output from `path` (or stdin for `-`) and check it is a
/// complete geometry before anything is sent.
fn read_geometry(path: &Path) -> Result<Geometry> {
  let raw = if path.as_os_str() == "-" {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("reading geometry from stdin")?;
    buf
  } else {
    std::fs::read_to_string(path).with_context(|| format!("reading geometry file {}", path.display()))?
  };
  parse_geometry(&raw)
}

fn parse_geometry(raw: &str) -> Result<Geometry> {
  let value: serde_json::Value = serde_json::from_str(raw).context("geometry is not valid JSON")?;
  validate_geometry(&value).context("invalid geometry")
}
