//! Core types and trait definitions for the facegate identity store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend, the HTTP surface and the binaries all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod geometry;
pub mod identity;
pub mod latest;
pub mod matching;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
