//! Forward-auth HTTP server
//!
//! Answers authorization subrequests from a reverse proxy (nginx
//! `auth_request`, Traefik `forwardAuth`). The proxy passes the original
//! method and URI in `X-Forwarded-Method` / `X-Forwarded-Uri` and the
//! authenticated role in the configured role header.

use crate::access_control::Action;
use crate::adapter::{AclState, access_denied, access_granted};
use crate::error::TransportError;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Default port for the forward-auth server
pub const DEFAULT_HTTP_PORT: u16 = 20390;

pub const FORWARDED_METHOD: &str = "x-forwarded-method";
pub const FORWARDED_URI: &str = "x-forwarded-uri";

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:20390")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    roles: usize,
    rules: usize,
}

/// Build the forward-auth router
pub fn router(acl: AclState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth", any(forward_auth))
        .with_state(acl)
        .layer(TraceLayer::new_for_http())
}

/// Run the server until Ctrl+C
pub async fn run_http(acl: AclState, config: HttpConfig) -> Result<(), TransportError> {
    let listener = TcpListener::bind(config.bind).await?;
    info!("Forward-auth server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(acl))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    info!("Forward-auth server stopped");
    Ok(())
}

async fn healthz(State(acl): State<AclState>) -> impl IntoResponse {
    let policy = acl.policy().snapshot();
    Json(Health {
        status: "ok",
        roles: policy.group_count(),
        rules: policy.rule_count(),
    })
}

async fn forward_auth(State(acl): State<AclState>, request: Request) -> Response {
    let (parts, _) = request.into_parts();
    let role = acl.roles().extract_role(&parts);

    let method = forwarded_header(&parts.headers, FORWARDED_METHOD)
        .unwrap_or_else(|| parts.method.as_str().to_string());
    let target = forwarded_header(&parts.headers, FORWARDED_URI)
        .unwrap_or_else(|| parts.uri.path().to_string());

    match acl.evaluate(role.as_deref(), &method, &target).1 {
        Action::Allow => access_granted(),
        Action::Deny => access_denied(),
    }
}

fn forwarded_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
