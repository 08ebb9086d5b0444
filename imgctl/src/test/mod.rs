//! End-to-end tests for the gateway over a real HTTP surface.
//!
//! Backend interactions are mocked with wiremock: the object store is an
//! S3-compatible mock (path-style addressing) and the transform backend is a
//! plain HTTP mock. Presigning never touches the network, so signed-URL
//! tests run against a placeholder endpoint.

use crate::api::models::SignedUrlResponse;
use crate::config::Config;
use axum::http::HeaderValue;
use axum::http::header;
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

fn create_test_config() -> Config {
    let mut config = Config::default();
    config.cdn_url = Url::parse("https://cdn.example.com").unwrap();
    config.cors.allowed_origin = Url::parse("https://app.example.com").unwrap();
    config.storage.bucket = "images".to_string();
    config.storage.access_key_id = "test-access-key".to_string();
    config.storage.secret_access_key = "test-secret-key".to_string();
    config.storage.force_path_style = true;
    config
}

fn test_server(config: Config) -> axum_test::TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}

/// Mock storage: the store speaks the S3 API, path-style, bucket "images".
async fn mock_store() -> wiremock::MockServer {
    wiremock::MockServer::start().await
}

fn config_with_store(store: &wiremock::MockServer) -> Config {
    let mut config = create_test_config();
    config.storage.endpoint = Url::parse(&store.uri()).unwrap();
    config
}

#[test_log::test(tokio::test)]
async fn signed_url_issuance_normalizes_and_returns_full_key() {
    let server = test_server(create_test_config());

    let response = server
        .post("/signed-url")
        .json(&json!({"path": "images", "extension": "PNG"}))
        .await;

    response.assert_status_ok();
    let body: SignedUrlResponse = response.json();

    // Key is "{path}/{uuid}.{extension}" with the extension lowercased
    let rest = body.key.strip_prefix("images/").expect("key keeps the logical path");
    let id = rest.strip_suffix(".png").expect("key keeps the normalized extension");
    Uuid::parse_str(id).expect("key component is a UUID");

    // The URL addresses that exact key and expires in 3600 seconds
    let url = Url::parse(&body.url).expect("signed URL is a valid URL");
    assert!(url.path().contains(&body.key));
    assert!(body.url.contains("X-Amz-Expires=3600"));
}

#[test_log::test(tokio::test)]
async fn signed_url_rejects_traversal_with_itemized_params() {
    let server = test_server(create_test_config());

    let response = server
        .post("/signed-url")
        .json(&json!({"path": "../etc", "extension": "png"}))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert_eq!(response.headers().get("content-language").unwrap(), "en");

    let body: Value = response.json();
    assert_eq!(body["type"], "https://cdn.example.com/problem/invalid");
    assert_eq!(body["instance"], "/signed-url");
    let params = body["invalidParams"].as_array().unwrap();
    assert!(params.iter().any(|p| p["code"] == "path_traversal"));
}

#[test_log::test(tokio::test)]
async fn signed_url_reports_every_violation_at_once() {
    let server = test_server(create_test_config());

    let response = server
        .post("/signed-url")
        .json(&json!({"path": "../a$b", "extension": "exe"}))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    let params = body["invalidParams"].as_array().unwrap();
    assert_eq!(params.len(), 3);
}

#[test_log::test(tokio::test)]
async fn delivery_serves_raw_object_with_cache_headers() {
    let store = mock_store().await;
    let png = b"\x89PNG\r\n\x1a\nfake image bytes".to_vec();

    // Path-style S3 GET: /{bucket}/{key}
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/images/images/abc.png"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_bytes(png.clone())
                .insert_header("content-type", "image/png"),
        )
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));
    let response = server.get("/images/images/abc.png").await;

    response.assert_status_ok();
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=315360000, immutable"
    );
    let etag = response.headers().get("etag").unwrap().to_str().unwrap();
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(response.as_bytes().as_ref(), png.as_slice());
}

#[test_log::test(tokio::test)]
async fn delivery_revalidates_with_if_none_match() {
    let store = mock_store().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/images/images/abc.png"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));

    let first = server.get("/images/images/abc.png").await;
    first.assert_status_ok();
    let etag = first.headers().get("etag").unwrap().clone();

    let second = server
        .get("/images/images/abc.png")
        .add_header(header::IF_NONE_MATCH, etag.clone())
        .await;

    assert_eq!(second.status_code(), 304);
    assert_eq!(second.headers().get("etag").unwrap(), &etag);
    assert!(second.as_bytes().is_empty());
}

#[test_log::test(tokio::test)]
async fn delivery_content_type_falls_back_to_the_extension() {
    let store = mock_store().await;
    // Object stored without content-type metadata
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/images/images/abc.webp"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(vec![0u8; 8]))
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));
    let response = server.get("/images/images/abc.webp").await;

    response.assert_status_ok();
    assert_eq!(response.headers().get("content-type").unwrap(), "image/webp");
}

#[test_log::test(tokio::test)]
async fn delivery_enforces_the_dimension_limit() {
    let server = test_server(create_test_config());

    // Oversized dimensions must be rejected before any backend call
    let response = server.get("/images/images/abc.png?width=5000").await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    assert_eq!(body["type"], "https://cdn.example.com/problem/invalid");
    assert!(body["detail"].as_str().unwrap().contains("3000"));
    let params = body["invalidParams"].as_array().unwrap();
    assert_eq!(params[0]["name"], "width");
    assert_eq!(params[0]["code"], "dimension_exceeded");
}

#[test_log::test(tokio::test)]
async fn delivery_rejects_non_numeric_dimensions() {
    let server = test_server(create_test_config());

    let response = server.get("/images/images/abc.png?height=abc").await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    let params = body["invalidParams"].as_array().unwrap();
    assert_eq!(params[0]["code"], "dimension_not_numeric");
}

#[test_log::test(tokio::test)]
async fn delivery_rejects_traversal_keys() {
    let server = test_server(create_test_config());

    // Percent-encoded so the client does not normalize the path away;
    // the Path extractor decodes it back to "images/../secrets.txt"
    let response = server.get("/images/images/..%2Fsecrets.txt").await;
    response.assert_status_bad_request();

    let body: Value = response.json();
    let params = body["invalidParams"].as_array().unwrap();
    assert!(params.iter().any(|p| p["code"] == "path_traversal"));
}

#[test_log::test(tokio::test)]
async fn missing_objects_use_the_uniform_problem_shape() {
    let store = mock_store().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(
            wiremock::ResponseTemplate::new(404)
                .set_body_string(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>"#,
                )
                .insert_header("content-type", "application/xml"),
        )
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));
    let response = server.get("/images/images/missing.png").await;

    response.assert_status_not_found();
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let body: Value = response.json();
    assert_eq!(body["type"], "https://cdn.example.com/problem/not-found");
    assert!(body["detail"].as_str().unwrap().contains("images/missing.png"));
}

#[test_log::test(tokio::test)]
async fn storage_failures_surface_as_generic_internal_errors() {
    let store = mock_store().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(
            wiremock::ResponseTemplate::new(500)
                .set_body_string("InternalError: disk 7 on shard db-3 is on fire"),
        )
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));
    let response = server.get("/images/images/abc.png").await;

    response.assert_status_internal_server_error();
    let body: Value = response.json();
    assert_eq!(body["type"], "https://cdn.example.com/problem/internal-error");
    // Backend detail must never leak
    assert!(!response.text().contains("disk 7"));
}

#[test_log::test(tokio::test)]
async fn transform_backend_receives_dimensions_and_fixed_format() {
    let transform = wiremock::MockServer::start().await;
    let webp = vec![0x52, 0x49, 0x46, 0x46];

    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/images/abc.png"))
        .and(wiremock::matchers::query_param("width", "100"))
        .and(wiremock::matchers::query_param("format", "webp"))
        .and(wiremock::matchers::query_param("metadata", "none"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_bytes(webp.clone())
                .insert_header("content-type", "image/webp"),
        )
        .expect(1)
        .mount(&transform)
        .await;

    let mut config = create_test_config();
    config.delivery.transform_url = Some(Url::parse(&transform.uri()).unwrap());

    let server = test_server(config);
    let response = server.get("/images/images/abc.png?width=100").await;

    response.assert_status_ok();
    assert_eq!(response.headers().get("content-type").unwrap(), "image/webp");
    assert_eq!(response.as_bytes().as_ref(), webp.as_slice());
}

#[test_log::test(tokio::test)]
async fn etag_is_stable_across_query_orderings() {
    let store = mock_store().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4]))
        .mount(&store)
        .await;

    let server = test_server(config_with_store(&store));

    let a = server.get("/images/images/abc.png?width=100&height=50").await;
    let b = server.get("/images/images/abc.png?height=50&width=100").await;

    a.assert_status_ok();
    b.assert_status_ok();
    assert_eq!(
        a.headers().get("etag").unwrap(),
        b.headers().get("etag").unwrap()
    );
}

#[test_log::test(tokio::test)]
async fn cors_allows_only_the_configured_origin() {
    let server = test_server(create_test_config());

    let response = server
        .post("/signed-url")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://app.example.com"))
        .json(&json!({"path": "images", "extension": "png"}))
        .await;

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example.com"
    );

    // A foreign origin gets no allow header back
    let response = server
        .post("/signed-url")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.example.com"))
        .json(&json!({"path": "images", "extension": "png"}))
        .await;

    assert!(response.headers().get("access-control-allow-origin").is_none());
}
