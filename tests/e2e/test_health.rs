use crate::e2e::helpers;

use helpers::TestContext;
use hyper::StatusCode;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ok_for_health_check(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();

    response.assert_status(StatusCode::OK);

    // Health endpoint returns plain text
    let body = String::from_utf8(response.body_bytes.clone()).unwrap();
    assert_eq!(body, "OK");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_ready_status(ctx: &TestContext) {
    let response = ctx.client.get("/health/ready").await.unwrap();

    response.assert_status(StatusCode::OK);

    let body = response.body.as_ref().unwrap();
    assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ready"));
    assert_eq!(body.get("storage").and_then(|v| v.as_str()), Some("writable"));
    assert_eq!(body.get("ffmpeg").and_then(|v| v.as_str()), Some("available"));
    assert_eq!(body.get("tts").and_then(|v| v.as_str()), Some("fake"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_include_request_id_in_health_responses(ctx: &TestContext) {
    let response = ctx.client.get("/health").await.unwrap();
    response.assert_header_exists("x-request-id");

    let response = ctx.client.get("/health/ready").await.unwrap();
    response.assert_header_exists("x-request-id");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_use_different_endpoints_for_liveness_and_readiness(ctx: &TestContext) {
    let liveness_response = ctx.client.get("/health").await.unwrap();
    liveness_response.assert_status(StatusCode::OK);

    let readiness_response = ctx.client.get("/health/ready").await.unwrap();
    readiness_response.assert_status(StatusCode::OK);

    assert!(liveness_response.body.is_none()); // Plain text
    assert!(readiness_response.body.is_some()); // JSON
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_echo_a_caller_supplied_request_id(ctx: &TestContext) {
    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "trace-abc-123")])
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("x-request-id").map(String::as_str), Some("trace-abc-123"));

    // Unusable ids are replaced
    let response = ctx
        .client
        .get_with_headers("/health", &[("x-request-id", "not valid!")])
        .await
        .unwrap();
    let id = response.header("x-request-id").unwrap();
    assert_ne!(id, "not valid!");
    assert!(!id.is_empty());
}
