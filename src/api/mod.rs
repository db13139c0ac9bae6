//! Transport layer for the Skytap REST API.
//!
//! # Architecture
//!
//! - `credentials` - Authorization header providers
//! - `request` - Method, path and pre-serialized body of one logical call
//! - `dispatch` - Response classification and error-body parsing
//! - `retry` - Retry controller for busy/throttled/5xx responses
//! - `client` - The [`ApiClient`] tying these together

pub mod client;
pub mod credentials;
mod dispatch;
pub mod request;
pub mod retry;

pub use client::ApiClient;
pub use credentials::{
    resolve_credentials, ApiTokenCredentials, CredentialsProvider, NoAuth, PasswordCredentials,
};
pub use dispatch::REQUEST_ID_HEADER;
pub use request::RequestDescriptor;
pub use retry::{retry_with_policy, RetryPolicy};
