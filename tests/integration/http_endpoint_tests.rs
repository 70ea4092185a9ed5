//! Integration tests for route status codes, rejections, and CORS.

use reqwest::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
};
use reqwest::{Method, StatusCode};

use super::test_helpers::{spawn_collector, test_config, wait_until_active};

// ── GET /ping ────────────────────────────────────────────────

#[tokio::test]
async fn ping_while_idle_returns_ok() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::get(format!("{}/ping", collector.base_url))
        .await
        .expect("GET /ping");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("body").is_empty());
}

#[tokio::test]
async fn ping_while_collecting_returns_busy() {
    let collector = spawn_collector(test_config()).await;
    let capture_url = format!("{}/", collector.base_url);
    let capture = tokio::spawn(async move { reqwest::get(capture_url).await });

    wait_until_active(&collector.state).await;
    let resp = reqwest::get(format!("{}/ping", collector.base_url))
        .await
        .expect("GET /ping");
    assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

    let done = capture.await.unwrap().expect("capture completes");
    assert_eq!(done.status(), StatusCode::OK);

    let resp = reqwest::get(format!("{}/ping", collector.base_url))
        .await
        .expect("GET /ping");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── POST /collect rejections ─────────────────────────────────

#[tokio::test]
async fn collect_without_instrument_is_bad_request() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/collect", collector.base_url))
        .body("[1]")
        .send()
        .await
        .expect("POST /collect");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.text().await.expect("body").contains("instrument"));
}

#[tokio::test]
async fn collect_with_invalid_json_is_bad_request() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/collect?instrument=a", collector.base_url))
        .body("[1,")
        .send()
        .await
        .expect("POST /collect");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collect_with_non_array_body_is_bad_request() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/collect?instrument=a", collector.base_url))
        .body(r#"{"name":"load"}"#)
        .send()
        .await
        .expect("POST /collect");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collect_while_idle_is_acknowledged() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/collect?instrument=a", collector.base_url))
        .header("content-type", "text/plain")
        .body(r#"["e1"]"#)
        .send()
        .await
        .expect("POST /collect");

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.expect("body").is_empty());
    assert!(!collector.state.collector.is_active());
}

#[tokio::test]
async fn get_on_collect_is_not_allowed() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::get(format!("{}/collect?instrument=a", collector.base_url))
        .await
        .expect("GET /collect");

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_path_without_static_root_is_not_found() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::get(format!("{}/index.html", collector.base_url))
        .await
        .expect("GET /index.html");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── CORS ─────────────────────────────────────────────────────

#[tokio::test]
async fn responses_allow_any_origin() {
    let collector = spawn_collector(test_config()).await;
    let client = reqwest::Client::new();

    let ping = client
        .get(format!("{}/ping", collector.base_url))
        .header(ORIGIN, "http://instrumented.example")
        .send()
        .await
        .expect("GET /ping");
    assert_eq!(ping.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let submit = client
        .post(format!("{}/collect?instrument=a", collector.base_url))
        .header(ORIGIN, "http://instrumented.example")
        .body("[]")
        .send()
        .await
        .expect("POST /collect");
    assert_eq!(submit.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let rejected = client
        .post(format!("{}/collect", collector.base_url))
        .header(ORIGIN, "http://instrumented.example")
        .body("[]")
        .send()
        .await
        .expect("POST /collect");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    assert_eq!(rejected.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn preflight_allows_get_and_post_with_long_max_age() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::Client::new()
        .request(
            Method::OPTIONS,
            format!("{}/collect?instrument=a", collector.base_url),
        )
        .header(ORIGIN, "http://instrumented.example")
        .header(ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await
        .expect("OPTIONS /collect");

    assert!(resp.status().is_success());
    let headers = resp.headers();
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let methods = headers[ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .expect("ascii header");
    assert!(methods.contains("GET"), "methods: {methods}");
    assert!(methods.contains("POST"), "methods: {methods}");
    assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
}

#[tokio::test]
async fn plain_responses_carry_methods_and_max_age() {
    let collector = spawn_collector(test_config()).await;

    let resp = reqwest::get(format!("{}/ping", collector.base_url))
        .await
        .expect("GET /ping");

    let headers = resp.headers();
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST");
    assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
}

// ── Body handling ────────────────────────────────────────────

#[tokio::test]
async fn batch_larger_than_default_body_limit_is_buffered() {
    let collector = spawn_collector(test_config()).await;
    let capture_url = format!("{}/", collector.base_url);
    let capture = tokio::spawn(async move { reqwest::get(capture_url).await });
    wait_until_active(&collector.state).await;

    let big = "x".repeat(3 * 1024 * 1024);
    let body = serde_json::json!([big]).to_string();
    let resp = reqwest::Client::new()
        .post(format!("{}/collect?instrument=a", collector.base_url))
        .body(body)
        .send()
        .await
        .expect("POST /collect");
    assert_eq!(resp.status(), StatusCode::OK);

    let events: Vec<serde_json::Value> = capture
        .await
        .unwrap()
        .expect("GET /")
        .json()
        .await
        .expect("json array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].as_str().map(str::len), Some(big.len()));
}

/// Bodies without `Content-Length` are accepted when sent chunked.
#[tokio::test]
async fn chunked_body_without_content_length_is_accepted() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let collector = spawn_collector(test_config()).await;
    let capture_url = format!("{}/", collector.base_url);
    let capture = tokio::spawn(async move { reqwest::get(capture_url).await });
    wait_until_active(&collector.state).await;

    let addr = collector.base_url.trim_start_matches("http://");
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect");
    let request = format!(
        "POST /collect?instrument=chunked HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Transfer-Encoding: chunked\r\n\
         Connection: close\r\n\
         \r\n\
         6\r\n[\"e1\"]\r\n0\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    assert!(response.starts_with("HTTP/1.1 200"), "response: {response}");

    let events: Vec<serde_json::Value> = capture
        .await
        .unwrap()
        .expect("GET /")
        .json()
        .await
        .expect("json array");
    assert_eq!(events, vec![serde_json::json!("e1")]);
}
