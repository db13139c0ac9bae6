//! Request pipeline tests against an in-process mock of the API.
//!
//! These drive the real client over HTTP and count the physical requests the
//! mock receives for each status class.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::Method;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use common::{client_for, MockApi, MockResponse};
use skytap::context::Context;
use skytap::error::Error;
use skytap::types::{Environment, UpdateEnvironmentRequest};

const ENV_PATH: &str = "/v2/configurations/1";

fn environment(runstate: &str) -> Value {
    json!({"id": "1", "name": "lab", "runstate": runstate})
}

#[tokio::test]
async fn test_request_headers() {
    let mock = MockApi::start().await;
    mock.script(Method::GET, ENV_PATH, vec![MockResponse::json(200, environment("running"))]);
    let client = mock.client();

    let env = client
        .environments()
        .get(&Context::background(), "1")
        .await
        .unwrap();
    assert_eq!(env.name.as_deref(), Some("lab"));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.header("accept"), Some("application/json"));
    assert_eq!(request.header("authorization"), Some("Basic dXNlcjp0b2tlbg=="));
    assert!(request.header("user-agent").unwrap().starts_with("skytap-rs/"));
    assert_eq!(request.header("content-type"), None);
    assert!(request.body.is_empty());
}

#[tokio::test]
async fn test_retryable_statuses_resolve() {
    for status in [423, 429, 500, 502, 503] {
        let mock = MockApi::start().await;
        mock.script(
            Method::GET,
            ENV_PATH,
            vec![
                MockResponse::status(status),
                MockResponse::status(status),
                MockResponse::json(200, environment("stopped")),
            ],
        );
        let client = mock.client();

        let result = client.environments().get(&Context::background(), "1").await;
        assert!(result.is_ok(), "status {} did not resolve: {:?}", status, result);
        assert_eq!(mock.requests().len(), 3, "status {}", status);

        let metrics = client.api().metrics();
        assert_eq!(metrics.requests_total, 3);
        assert_eq!(metrics.retries_total, 2);
    }
}

#[tokio::test]
async fn test_terminal_statuses_single_request() {
    for status in [401, 404, 409, 422] {
        let mock = MockApi::start().await;
        mock.script(
            Method::GET,
            ENV_PATH,
            vec![MockResponse::json(status, json!({"error": "nope"}))],
        );
        let client = mock.client();

        let err = client
            .environments()
            .get(&Context::background(), "1")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(status));
        assert!(matches!(err, Error::Api(_)));
        assert_eq!(mock.requests().len(), 1, "status {}", status);
        assert_eq!(client.api().metrics().terminal_errors, 1);
    }
}

#[tokio::test]
async fn test_retries_resend_identical_body() {
    let mock = MockApi::start().await;
    mock.script(
        Method::PUT,
        ENV_PATH,
        vec![
            MockResponse::json(423, json!({"error": "busy"})),
            MockResponse::json(200, environment("running")),
        ],
    );
    let client = mock.client();
    let request = UpdateEnvironmentRequest {
        name: Some("lab".to_string()),
        ..UpdateEnvironmentRequest::default()
    };

    let _: Environment = client
        .api()
        .put(&Context::background(), "v2/configurations/1", &request)
        .await
        .unwrap();

    let puts = mock.requests_to(Method::PUT, ENV_PATH);
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].body, puts[1].body);
    assert_eq!(puts[0].json(), json!({"name": "lab"}));
    assert_eq!(puts[1].header("content-type"), Some("application/json"));
}

#[tokio::test]
async fn test_exhaustion_after_max_retries() {
    let mock = MockApi::start().await;
    mock.script(Method::GET, ENV_PATH, vec![MockResponse::status(503)]);
    let client = mock.client_with(|config| config.retry.max_retries = 2);

    let err = client
        .environments()
        .get(&Context::background(), "1")
        .await
        .unwrap_err();

    match &err {
        Error::RetriesExhausted { attempts, source } => {
            assert_eq!(*attempts, 3);
            assert_eq!(source.status(), Some(503));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert!(err.to_string().contains("maximum retries reached"));
    assert_eq!(mock.requests().len(), 3);
}

#[tokio::test]
async fn test_retry_after_header_is_honoured() {
    let mock = MockApi::start().await;
    mock.script(
        Method::GET,
        ENV_PATH,
        vec![
            MockResponse::status(429).header("retry-after", "1"),
            MockResponse::json(200, environment("running")),
        ],
    );
    let client = mock.client();

    let start = Instant::now();
    client
        .environments()
        .get(&Context::background(), "1")
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(mock.requests().len(), 2);
}

#[tokio::test]
async fn test_unparsable_retry_after_uses_default_delay() {
    let mock = MockApi::start().await;
    mock.script(
        Method::GET,
        ENV_PATH,
        vec![
            MockResponse::status(423).header("retry-after", "xxx"),
            MockResponse::json(200, environment("running")),
        ],
    );
    let client = mock.client_with(|config| config.retry.default_delay = Duration::from_millis(50));

    let start = Instant::now();
    client
        .environments()
        .get(&Context::background(), "1")
        .await
        .unwrap();

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(1));
}

#[tokio::test]
async fn test_error_payload_and_request_id() {
    let mock = MockApi::start().await;
    mock.script(
        Method::GET,
        ENV_PATH,
        vec![MockResponse::json(422, json!({"errors": ["name is too long", "bad owner"]}))
            .header("x-request-id", "req-42")],
    );
    let client = mock.client();

    let err = client
        .environments()
        .get(&Context::background(), "1")
        .await
        .unwrap_err();

    let api_error = err.api_error().unwrap();
    assert_eq!(api_error.message, "name is too long; bad owner");
    assert_eq!(api_error.request_id.as_deref(), Some("req-42"));
    assert!(err.to_string().contains("req-42"));
}

#[tokio::test]
async fn test_download_streams_raw_bytes() {
    let payload: Vec<u8> = vec![0x00, 0x9f, 0x92, 0x96, 0xff, b'{'];
    let mock = MockApi::start().await;
    mock.script(
        Method::GET,
        "/v2/exports/7",
        vec![MockResponse::status(503), MockResponse::raw(&payload)],
    );
    let client = mock.client();

    let mut sink: Vec<u8> = Vec::new();
    let written = client
        .api()
        .download(&Context::background(), "v2/exports/7", &mut sink)
        .await
        .unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(sink, payload);
}

#[tokio::test]
async fn test_delete_with_empty_body() {
    let mock = MockApi::start().await;
    mock.script(Method::DELETE, ENV_PATH, vec![MockResponse::status(200)]);
    let client = mock.client();

    client
        .environments()
        .delete(&Context::background(), "1")
        .await
        .unwrap();
    assert_eq!(mock.requests_to(Method::DELETE, ENV_PATH).len(), 1);
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let mock = MockApi::start().await;
    let client = mock.client();
    let ctx = Context::background();
    ctx.cancel();

    let err = client.environments().get(&ctx, "1").await.unwrap_err();

    assert!(err.is_cancellation());
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_deadline_stops_retrying() {
    let mock = MockApi::start().await;
    mock.script(Method::GET, ENV_PATH, vec![MockResponse::status(423)]);
    let client = mock.client_with(|config| config.retry.default_delay = Duration::from_secs(30));
    let ctx = Context::background().with_timeout(Duration::from_millis(200));

    let err = client.environments().get(&ctx, "1").await.unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded));
    assert_eq!(mock.requests().len(), 1);
}

/// Serve a 503 whose body is cut short, then a 200, one connection each.
async fn truncated_then_ok() -> (String, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            let hit = counter.fetch_add(1, Ordering::SeqCst);

            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }

            let response: &[u8] = if hit == 0 {
                &b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\nshort"[..]
            } else {
                &b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}"[..]
            };
            socket.write_all(response).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}/", addr), hits)
}

#[tokio::test]
async fn test_truncated_error_body_is_still_retried() {
    let (base_url, hits) = truncated_then_ok().await;
    let client = client_for(&base_url, |config| config.retry.max_retries = 3);

    let value: Value = client
        .api()
        .get(&Context::background(), "v2/configurations/1")
        .await
        .unwrap();

    assert_eq!(value, json!({}));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(client.api().metrics().retries_total, 1);
}
