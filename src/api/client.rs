//! HTTP client for the Skytap REST API.
//!
//! Every call goes through the same pipeline: credentials are resolved once,
//! the request is rebuilt from its [`RequestDescriptor`] for each attempt,
//! dispatched, and retried by [`retry_with_policy`] on 423/429/5xx.

use std::sync::Arc;

use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::api::credentials::CredentialsProvider;
use crate::api::dispatch;
use crate::api::request::RequestDescriptor;
use crate::api::retry::{retry_with_policy, RetryPolicy};
use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::metrics::{ClientMetrics, MetricsSnapshot};

/// API client for the Skytap backend.
///
/// Cloning is cheap; clones share the connection pool and metrics.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    user_agent: String,
    credentials: Arc<dyn CredentialsProvider>,
    retry: RetryPolicy,
    metrics: Arc<ClientMetrics>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the HTTP
    /// client cannot be created.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialsProvider>) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
            user_agent: config.user_agent.clone(),
            credentials,
            retry: config.retry.clone(),
            metrics: ClientMetrics::new(),
        })
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Retry policy applied to every call.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Counters for requests, retries and polling.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn shared_metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.metrics)
    }

    // ===== Verbs =====

    /// GET `path` and decode the JSON body.
    pub async fn get<R: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<R> {
        self.execute(ctx, RequestDescriptor::get(path)).await
    }

    /// POST `body` to `path` and decode the JSON response.
    pub async fn post<B, R>(&self, ctx: &Context, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::new(Method::POST, path).with_json(body)?;
        self.execute(ctx, descriptor).await
    }

    /// PUT `body` to `path` and decode the JSON response.
    pub async fn put<B, R>(&self, ctx: &Context, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::new(Method::PUT, path).with_json(body)?;
        self.execute(ctx, descriptor).await
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, ctx: &Context, path: &str) -> Result<()> {
        self.send(ctx, &RequestDescriptor::delete(path))
            .await
            .map(|_| ())
    }

    /// GET `path` and stream the raw body into `sink` without JSON decoding.
    ///
    /// Returns the number of bytes written. Nothing is written unless the
    /// response is 2xx, so retries never leave partial output behind.
    pub async fn download<W>(&self, ctx: &Context, path: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let response = self.send(ctx, &RequestDescriptor::get(path)).await?;
        dispatch::stream_to(ctx, response, sink).await
    }

    /// Run a prepared request through retry and decode the JSON response.
    pub async fn execute<R: DeserializeOwned>(
        &self,
        ctx: &Context,
        descriptor: RequestDescriptor,
    ) -> Result<R> {
        let response = self.send(ctx, &descriptor).await?;
        dispatch::decode_json(ctx, response).await
    }

    /// Dispatch with retry, returning the successful response.
    async fn send(&self, ctx: &Context, descriptor: &RequestDescriptor) -> Result<Response> {
        let authorization = self.credentials.retrieve(ctx).await?;
        let mut first_attempt = true;

        retry_with_policy(ctx, &self.retry, || {
            if !std::mem::replace(&mut first_attempt, false) {
                self.metrics.inc_retries();
            }
            self.dispatch_once(ctx, descriptor, &authorization)
        })
        .await
    }

    /// One physical request.
    async fn dispatch_once(
        &self,
        ctx: &Context,
        descriptor: &RequestDescriptor,
        authorization: &str,
    ) -> Result<Response> {
        let request = descriptor.build(&self.http, &self.base_url, &self.user_agent, authorization)?;
        debug!("{} {}", request.method(), request.url());
        self.metrics.inc_requests();

        let result = dispatch::send(ctx, &self.http, request).await;
        if let Err(Error::Api(e)) = &result {
            if !e.is_retryable() {
                self.metrics.inc_terminal_errors();
            }
            debug!("{} {} -> {}", descriptor.method(), descriptor.path(), e);
        }
        result
    }
}
