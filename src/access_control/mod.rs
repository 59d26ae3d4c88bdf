//! Access control module
//!
//! Role-based decisions over HTTP method and resource path.
//!
//! ## Model
//!
//! A policy is a set of groups keyed by role. Each group holds an ordered
//! list of rules `{resource, methods, action}`:
//!
//! - `resource` is `*` or the exact first path segment after the base URL
//! - `methods` is `*` or a list of HTTP methods (case-insensitive)
//! - `action` is `allow` or `deny`
//!
//! The first rule that matches decides. If none matches, or the role has no
//! group, the request is denied. Paths outside the base URL are not
//! governed by the policy and resolve through a configurable fallback.
//!
//! ## Example Policy
//!
//! ```json
//! [{
//!   "group": "user",
//!   "permissions": [
//!     { "resource": "mangoes", "methods": ["DELETE"], "action": "deny" },
//!     { "resource": "*", "methods": "*", "action": "allow" }
//!   ]
//! }]
//! ```

pub mod handle;
pub mod loader;
pub mod patterns;
pub mod resolver;
pub mod types;

pub use handle::PolicyHandle;
pub use loader::{
    PolicyFormat, RawPolicy, load, load_policy_file, load_policy_str, load_with_base_url,
};
pub use patterns::{MethodPattern, ResourcePattern, WILDCARD};
pub use resolver::{Decision, OutOfScope, Outcome, Reason, decide};
pub use types::{Action, BaseUrl, Group, PolicyDocument, Rule};
