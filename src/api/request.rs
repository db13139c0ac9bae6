//! Outgoing request construction.

use bytes::Bytes;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use serde::Serialize;

use crate::error::{Error, Result};

const APPLICATION_JSON: &str = "application/json";

/// Method, relative path and pre-serialized JSON body of one logical call.
///
/// The body is encoded once, so every retry sends identical bytes.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Bytes>,
}

impl RequestDescriptor {
    /// Describe a call with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// A `GET` of `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A `DELETE` of `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the body cannot be serialized.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(Bytes::from(serde_json::to_vec(body)?));
        Ok(self)
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path relative to the API base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The encoded body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Resolve the path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an empty path, an absolute URL
    /// or a path that does not join onto the base.
    pub fn url(&self, base_url: &Url) -> Result<Url> {
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            return Err(Error::InvalidRequest("empty request path".to_string()));
        }
        if path.contains("://") {
            return Err(Error::InvalidRequest(format!(
                "request path must be relative: {}",
                self.path
            )));
        }
        base_url
            .join(path)
            .map_err(|e| Error::InvalidRequest(format!("malformed path {:?}: {}", self.path, e)))
    }

    /// Build the HTTP request. No I/O happens here.
    ///
    /// `authorization` is omitted from the request when empty.
    pub fn build(
        &self,
        http: &reqwest::Client,
        base_url: &Url,
        user_agent: &str,
        authorization: &str,
    ) -> Result<reqwest::Request> {
        let url = self.url(base_url)?;

        let mut builder = http
            .request(self.method.clone(), url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(USER_AGENT, header_value(user_agent)?);

        if !authorization.is_empty() {
            let mut value = header_value(authorization)?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        if let Some(body) = &self.body {
            builder = builder
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .body(body.clone());
        }

        builder
            .build()
            .map_err(|e| Error::InvalidRequest(e.to_string()))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidRequest(format!("invalid header value: {}", e)))
}
