//! Request adapter
//!
//! Bridges HTTP requests and the decision engine: pulls the role, method
//! and path off a request, then either forwards it or answers with a 403.

pub mod extract;
pub mod middleware;
pub mod path;

pub use extract::{
    AuthenticatedRole, Claims, ClaimsRole, ExtensionRole, HeaderRole, RoleChain, RoleExtractor,
};
pub use middleware::{
    ACCESS_DENIED, ACCESS_GRANTED, AclState, access_denied, access_granted, authorize,
};
pub use path::{normalize, request_path};
