//! Route ACL
//!
//! Role-based access control for HTTP routes, driven by a declarative
//! policy document.
//!
//! ## Features
//!
//! - **First-match rules** per role over resource segment and HTTP method
//! - **Fail-closed** defaults: unknown roles and unmatched requests are denied
//! - **Atomic reload** of the policy without pausing in-flight decisions
//! - **axum middleware** and a **forward-auth server** for reverse proxies
//!
//! ## Decision Flow
//!
//! ```text
//! base URL check → role group lookup → rules in order → default deny
//! ```
//!
//! ## Example Policy
//!
//! ```json
//! [{
//!   "group": "user",
//!   "permissions": [
//!     { "resource": "mangoes", "methods": ["POST", "GET", "PUT"], "action": "allow" },
//!     { "resource": "*", "methods": "*", "action": "deny" }
//!   ]
//! }]
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [policy]
//! path = "nacl.json"
//! base_url = "api"
//!
//! [acl]
//! default_role = "guest"
//! out_of_scope = "deny"
//! ```

pub mod access_control;
pub mod adapter;
pub mod config;
pub mod error;
pub mod transport;

// Re-export main types
pub use access_control::{Decision, PolicyDocument, PolicyHandle, decide};
pub use adapter::{AclState, RoleChain, authorize};
pub use config::{AppConfig, load_config};
pub use error::{AppError, MalformedPolicy, PolicyError, Result};
