mod common;

use axum_test::TestServer;

#[tokio::test]
async fn test_health_endpoint_success() {
    let ctx = common::create_test_context().await;
    let server = TestServer::new(common::test_app(ctx.state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(json["checks"]["database"]["message"], "Connected, 3 HTS codes");
    assert_eq!(json["checks"]["interpreter"]["status"], "ok");
    assert_eq!(json["checks"]["interpreter"]["message"], "rule_based reachable");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = common::create_test_context().await;
    let server = TestServer::new(common::test_app(ctx.state)).unwrap();

    let json = server.get("/health").await.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("database").is_some());
    assert!(json["checks"].get("interpreter").is_some());
}

#[tokio::test]
async fn test_health_does_not_require_token() {
    let ctx = common::create_test_context().await;
    let server = TestServer::new(common::test_app(ctx.state)).unwrap();

    server.get("/health").await.assert_status_ok();
}
