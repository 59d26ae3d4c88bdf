//! Transport module
//!
//! Serves decisions over HTTP for proxies that delegate authorization.

pub mod http;
pub mod reload;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, router, run_http};
pub use reload::spawn_reload_on_hangup;
