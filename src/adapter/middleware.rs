//! Access control middleware for axum
//!
//! ```ignore
//! let acl = AclState::new(policy, RoleChain::in_process(&config.acl));
//! let app = Router::new()
//!     .route("/api/mangoes/{id}", get(show_mango))
//!     .layer(axum::middleware::from_fn_with_state(acl, authorize));
//! ```

use crate::access_control::{Action, Decision, OutOfScope, PolicyHandle};
use crate::adapter::extract::RoleExtractor;
use crate::adapter::path::{normalize, request_path};
use crate::config::AclConfig;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Body returned when a request is rejected
pub const ACCESS_DENIED: &str = "ACCESS DENIED";

/// Body returned by the forward-auth endpoint when a request is allowed
pub const ACCESS_GRANTED: &str = "ACCESS GRANTED";

#[derive(Debug, Serialize)]
struct DeniedBody {
    status: u16,
    success: bool,
    error: &'static str,
}

#[derive(Debug, Serialize)]
struct GrantedBody {
    status: u16,
    success: bool,
    message: &'static str,
}

/// 403 response with `{ status: 403, success: false, error: "ACCESS DENIED" }`
pub fn access_denied() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(DeniedBody {
            status: StatusCode::FORBIDDEN.as_u16(),
            success: false,
            error: ACCESS_DENIED,
        }),
    )
        .into_response()
}

/// 200 response with `{ status: 200, success: true, message: "ACCESS GRANTED" }`
pub fn access_granted() -> Response {
    (
        StatusCode::OK,
        Json(GrantedBody {
            status: StatusCode::OK.as_u16(),
            success: true,
            message: ACCESS_GRANTED,
        }),
    )
        .into_response()
}

/// Everything the middleware needs per request
#[derive(Clone)]
pub struct AclState {
    policy: PolicyHandle,
    roles: Arc<dyn RoleExtractor>,
    default_role: Option<String>,
    out_of_scope: OutOfScope,
}

impl AclState {
    /// Fail-closed state with no default role
    pub fn new(policy: PolicyHandle, roles: impl RoleExtractor + 'static) -> Self {
        Self {
            policy,
            roles: Arc::new(roles),
            default_role: None,
            out_of_scope: OutOfScope::Deny,
        }
    }

    /// State with default role and fallback taken from configuration
    pub fn from_config(
        policy: PolicyHandle,
        roles: impl RoleExtractor + 'static,
        config: &AclConfig,
    ) -> Self {
        Self {
            default_role: config.default_role.clone(),
            out_of_scope: config.out_of_scope,
            ..Self::new(policy, roles)
        }
    }

    /// Role to assume when the request carries none
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    /// What to do with paths outside the policy's base URL
    pub fn with_out_of_scope(mut self, fallback: OutOfScope) -> Self {
        self.out_of_scope = fallback;
        self
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    pub fn roles(&self) -> &dyn RoleExtractor {
        self.roles.as_ref()
    }

    /// Decide a request and collapse the decision to allow or deny.
    ///
    /// `target` is the raw request target: it may be percent-encoded, carry
    /// a query string and hold dot segments. A target whose `..` segments
    /// climb above the root is denied.
    pub fn evaluate(&self, role: Option<&str>, method: &str, target: &str) -> (Decision, Action) {
        let role = role.or(self.default_role.as_deref());
        let Some(path) = normalize(&request_path(target)) else {
            info!(
                role = role.unwrap_or("-"),
                method,
                target,
                "Access denied, path escapes the root"
            );
            return (Decision::default_deny(), Action::Deny);
        };

        // Loaded documents never hold an empty role, so a missing role still
        // goes through the base URL check and then resolves to UnknownRole.
        let decision = self.policy.decide(role.unwrap_or(""), method, &path);
        let action = decision.resolve(self.out_of_scope);

        match action {
            Action::Allow => debug!(
                role = role.unwrap_or("-"),
                method,
                path = %path,
                reason = %decision.reason,
                "Access granted"
            ),
            Action::Deny => info!(
                role = role.unwrap_or("-"),
                method,
                path = %path,
                reason = %decision.reason,
                rule = ?decision.rule,
                "Access denied"
            ),
        }

        (decision, action)
    }
}

/// axum middleware: pass allowed requests through untouched, reject the rest
/// with [`access_denied`]
pub async fn authorize(State(acl): State<AclState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let role = acl.roles.extract_role(&parts);
    let (_, action) = acl.evaluate(role.as_deref(), parts.method.as_str(), parts.uri.path());

    match action {
        Action::Allow => next.run(Request::from_parts(parts, body)).await,
        Action::Deny => access_denied(),
    }
}
