//! Credential providers for the `Authorization` header.
//!
//! Credentials are resolved in order:
//! 1. Explicit options
//! 2. Environment variables (SKYTAP_USERNAME with SKYTAP_API_TOKEN or SKYTAP_PASSWORD)

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::context::Context;
use crate::error::{Error, Result};

/// Produces the `Authorization` header value for a request.
///
/// An empty string means the header is omitted.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Retrieve the header value for the given context.
    async fn retrieve(&self, ctx: &Context) -> Result<String>;
}

/// Sends no `Authorization` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl CredentialsProvider for NoAuth {
    async fn retrieve(&self, ctx: &Context) -> Result<String> {
        ctx.check()?;
        Ok(String::new())
    }
}

/// Basic authentication with the account password.
#[derive(Clone)]
pub struct PasswordCredentials {
    username: String,
    password: String,
}

impl PasswordCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for PasswordCredentials {
    async fn retrieve(&self, ctx: &Context) -> Result<String> {
        ctx.check()?;
        Ok(basic_auth(&self.username, &self.password))
    }
}

/// Basic authentication with an API security token in place of the password.
#[derive(Clone)]
pub struct ApiTokenCredentials {
    username: String,
    api_token: String,
}

impl ApiTokenCredentials {
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for ApiTokenCredentials {
    async fn retrieve(&self, ctx: &Context) -> Result<String> {
        ctx.check()?;
        Ok(basic_auth(&self.username, &self.api_token))
    }
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ApiTokenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiTokenCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

fn basic_auth(username: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, secret)))
}

/// Resolve credentials from options or environment.
///
/// An API token takes precedence over a password.
///
/// # Errors
///
/// Returns [`Error::Config`] if no username, or neither a token nor a
/// password, can be resolved.
pub fn resolve_credentials(
    username: Option<&str>,
    api_token: Option<&str>,
) -> Result<Box<dyn CredentialsProvider>> {
    let username = username
        .map(String::from)
        .or_else(|| std::env::var("SKYTAP_USERNAME").ok())
        .ok_or_else(|| {
            Error::Config(
                "username is required. Provide it via:\n\
                 1. the username option\n\
                 2. SKYTAP_USERNAME environment variable"
                    .to_string(),
            )
        })?;

    if let Some(token) = api_token
        .map(String::from)
        .or_else(|| std::env::var("SKYTAP_API_TOKEN").ok())
    {
        return Ok(Box::new(ApiTokenCredentials::new(username, token)));
    }

    if let Ok(password) = std::env::var("SKYTAP_PASSWORD") {
        return Ok(Box::new(PasswordCredentials::new(username, password)));
    }

    Err(Error::Config(
        "API token is required. Provide it via:\n\
         1. the api token option\n\
         2. SKYTAP_API_TOKEN environment variable\n\
         3. SKYTAP_PASSWORD environment variable"
            .to_string(),
    ))
}
