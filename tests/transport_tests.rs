//! Forward-auth transport tests

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use route_acl::access_control::{OutOfScope, PolicyFormat, PolicyHandle, load_policy_str};
use route_acl::adapter::{AclState, RoleChain};
use route_acl::config::AclConfig;
use route_acl::transport::router;
use serde_json::Value;
use tower::ServiceExt;

const POLICY: &str = r#"
base_url = "api"

[[groups]]
group = "user"

[[groups.permissions]]
resource = "orders"
methods = ["GET", "POST"]
action = "allow"
"#;

fn app(config: &AclConfig) -> Router {
    let policy = PolicyHandle::new(load_policy_str(POLICY, PolicyFormat::Toml, None).unwrap());
    let roles = RoleChain::forwarded(config).unwrap();
    router(AclState::from_config(policy, roles, config))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn auth_request(role: Option<&str>, method: &str, uri: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri("/auth")
        .header("x-forwarded-method", method)
        .header("x-forwarded-uri", uri);
    if let Some(role) = role {
        builder = builder.header("x-user-role", role);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_forward_auth_allows() {
    let (status, body) = send(
        app(&AclConfig::default()),
        auth_request(Some("user"), "post", "/api/orders/5?expand=items"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "ACCESS GRANTED");
}

#[tokio::test]
async fn test_forward_auth_denies() {
    let (status, body) = send(
        app(&AclConfig::default()),
        auth_request(Some("user"), "DELETE", "/api/orders/5"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], 403);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ACCESS DENIED");
}

#[tokio::test]
async fn test_forward_auth_resolves_dot_segments() {
    // The proxy forwards these upstream as /api/admin/1
    for uri in [
        "/api/admin/1",
        "/api/orders/../admin/1",
        "/api/orders/%2e%2e/admin/1",
        "/api/orders/%2E%2E/admin/1",
        "/api/./orders/../admin/1?x=1",
    ] {
        let (status, body) = send(
            app(&AclConfig::default()),
            auth_request(Some("user"), "GET", uri),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["error"], "ACCESS DENIED");
    }

    let (status, _) = send(
        app(&AclConfig::default()),
        auth_request(Some("user"), "GET", "/api/admin/../orders/5"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forward_auth_denies_escape_above_root() {
    let config = AclConfig {
        out_of_scope: OutOfScope::Allow,
        ..Default::default()
    };

    // Leaving the base URL hands the path to the out-of-scope fallback
    let (status, _) = send(
        app(&config),
        auth_request(Some("user"), "GET", "/api/orders/../../static/app.js"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/api/../../orders", "/%2e%2e/api/orders"] {
        let (status, _) = send(app(&config), auth_request(Some("user"), "GET", uri)).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_forward_auth_missing_role() {
    let (status, _) = send(
        app(&AclConfig::default()),
        auth_request(None, "GET", "/api/orders"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_forward_auth_custom_role_header() {
    let config = AclConfig {
        role_header: "x-auth-role".to_string(),
        ..Default::default()
    };

    // The default header is no longer consulted
    let (status, _) = send(app(&config), auth_request(Some("user"), "GET", "/api/orders")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/auth")
        .header("x-forwarded-method", "GET")
        .header("x-forwarded-uri", "/api/orders")
        .header("x-auth-role", "user")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(&config), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forward_auth_without_forwarded_headers() {
    // Falls back to the subrequest's own method and path, which lie outside
    // the base URL
    let request = Request::builder()
        .method("GET")
        .uri("/auth")
        .header("x-user-role", "user")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(&AclConfig::default()), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_healthz() {
    let request = Request::builder()
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&AclConfig::default()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["roles"], 1);
    assert_eq!(body["rules"], 1);
}
