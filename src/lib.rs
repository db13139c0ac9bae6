//! Skytap REST API client.
//!
//! A typed client for the Skytap cloud API: request construction,
//! authentication, JSON marshalling, and waiting for asynchronous state
//! transitions to settle.
//!
//! # Architecture
//!
//! 1. **API Layer** (`api`) - credentials, request building, response
//!    dispatch, and retry of busy (423), throttled (429) and 5xx responses
//! 2. **Convergence** (`convergence`) - polls a resource after a mutation
//!    until its run-state or requested fields match
//! 3. **Service Layer** (`service`) - facades for environments, VMs,
//!    networks, projects, interfaces, published services, label categories
//!
//! Every operation takes a [`context::Context`] that carries cancellation
//! and an optional deadline through retries and polling.
//!
//! ```no_run
//! use std::sync::Arc;
//! use skytap::api::ApiTokenCredentials;
//! use skytap::config::ClientConfig;
//! use skytap::context::Context;
//! use skytap::convergence::RunState;
//! use skytap::service::Client;
//!
//! # async fn demo() -> skytap::Result<()> {
//! let credentials = Arc::new(ApiTokenCredentials::new("user", "token"));
//! let client = Client::new(&ClientConfig::default(), credentials)?;
//! let env = client
//!     .environments()
//!     .set_runstate(&Context::background(), "123", RunState::Running)
//!     .await?;
//! println!("{:?}", env.runstate);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod convergence;
pub mod error;
pub mod metrics;
pub mod service;
pub mod types;

pub use error::{Error, Result};
pub use service::Client;

/// Crate version, sent in the default `User-Agent`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
