//! In-process mock of the Skytap API.
//!
//! Responses are scripted per method and path. Each request pops the next
//! scripted response; the last one repeats once the script runs out.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use axum::Router;
use serde_json::Value;

use skytap::api::{ApiTokenCredentials, RetryPolicy};
use skytap::config::ClientConfig;
use skytap::convergence::PollPolicy;
use skytap::service::Client;

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn raw(body: &[u8]) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type", "application/octet-stream".to_string())],
            body: body.to_vec(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }
}

/// A request as received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<(Method, String), VecDeque<MockResponse>>>,
    last: Mutex<HashMap<(Method, String), MockResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle to a running mock server.
pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url: format!("http://{}/", addr),
            state,
        }
    }

    /// Append responses for `method path`.
    pub fn script(&self, method: Method, path: &str, responses: Vec<MockResponse>) {
        self.state
            .scripts
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .extend(responses);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Client with fast retries and polling against this server.
    pub fn client(&self) -> Client {
        self.client_with(|_| {})
    }

    pub fn client_with(&self, customize: impl FnOnce(&mut ClientConfig)) -> Client {
        client_for(&self.base_url, customize)
    }
}

/// Client with fast retries and polling against any server.
pub fn client_for(base_url: &str, customize: impl FnOnce(&mut ClientConfig)) -> Client {
    let mut config = ClientConfig {
        url: base_url.to_string(),
        retry: RetryPolicy {
            max_retries: 5,
            default_delay: Duration::from_millis(10),
        },
        poll: PollPolicy {
            interval: Duration::from_millis(10),
            max_iterations: 5,
        },
        ..ClientConfig::default()
    };
    customize(&mut config);
    Client::new(&config, Arc::new(ApiTokenCredentials::new("user", "token")))
        .expect("valid client config")
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let key = (method.clone(), uri.path().to_string());
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: key.1.clone(),
        headers,
        body,
    });

    let next = state
        .scripts
        .lock()
        .unwrap()
        .get_mut(&key)
        .and_then(VecDeque::pop_front);
    let response = match next {
        Some(response) => {
            state.last.lock().unwrap().insert(key, response.clone());
            response
        }
        None => state
            .last
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| {
                MockResponse::json(404, serde_json::json!({"error": format!("no route {}", key.1)}))
            }),
    };

    let mut builder = Response::builder().status(StatusCode::from_u16(response.status).unwrap());
    for (name, value) in &response.headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(Body::from(response.body)).unwrap()
}
