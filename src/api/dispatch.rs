//! Response classification and decoding.
//!
//! A 2xx response is handed back for decoding; anything else becomes an
//! [`ApiError`] carrying the payload message, `X-Request-Id`, `Retry-After`
//! and, for conflicts, the URL of the resource the server referenced.

use std::sync::LazyLock;
use std::time::Duration;

use bytes::Bytes;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{ApiError, Error, Result};

/// Correlation header echoed in error messages.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

static URL_IN_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("static regex"));

/// Error payload shapes returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    url: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        if let Some(m) = self.error.as_ref().or(self.message.as_ref()) {
            return Some(m.clone());
        }
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.join("; "))
        }
    }
}

/// Execute one physical request and classify the status.
///
/// Returns the response untouched for 2xx.
pub(crate) async fn send(
    ctx: &Context,
    http: &reqwest::Client,
    request: reqwest::Request,
) -> Result<Response> {
    let response = ctx.run(http.execute(request)).await??;
    if response.status().is_success() {
        return Ok(response);
    }
    Err(Error::Api(error_from_response(ctx, response).await?))
}

/// Build the structured error for a non-2xx response.
async fn error_from_response(ctx: &Context, response: Response) -> Result<ApiError> {
    let status = response.status();
    let headers = response.headers().clone();
    // The status alone decides retryability; an unreadable body only loses the message.
    let body = match ctx.run(response.bytes()).await? {
        Ok(body) => body,
        Err(e) => {
            debug!("Failed to read error body for {}: {}", status, e);
            Bytes::new()
        }
    };
    Ok(parse_error(status, &headers, &body))
}

/// Parse a non-2xx response into an [`ApiError`].
///
/// Unparsable bodies fall back to the canonical status text.
pub(crate) fn parse_error(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ApiError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = parsed
        .message()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

    let resource_url = parsed
        .url
        .clone()
        .or_else(|| {
            URL_IN_MESSAGE
                .find(&message)
                .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';']).to_string())
        });

    ApiError {
        status: status.as_u16(),
        message,
        request_id: headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        retry_after: parse_retry_after(headers),
        resource_url,
    }
}

/// Read `Retry-After` as whole seconds. Invalid values are treated as absent.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?;
    match value.to_str().ok().and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => {
            warn!("Ignoring unparsable Retry-After header: {:?}", value);
            None
        }
    }
}

/// Decode a successful JSON response. An empty body decodes as `null`.
pub(crate) async fn decode_json<R: DeserializeOwned>(ctx: &Context, response: Response) -> Result<R> {
    let body = ctx.run(response.bytes()).await??;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&body)?)
}

/// Copy a successful response verbatim into `sink`, returning the byte count.
pub(crate) async fn stream_to<W>(ctx: &Context, mut response: Response, sink: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut written = 0u64;
    while let Some(chunk) = ctx.run(response.chunk()).await?? {
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;
    Ok(written)
}
