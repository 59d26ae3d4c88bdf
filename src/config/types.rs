//! Configuration types for route-acl
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::access_control::OutOfScope;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Forward-auth server settings
    pub server: ServerConfig,

    /// Where the policy comes from
    pub policy: PolicyConfig,

    /// Request adapter behaviour
    pub acl: AclConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Forward-auth server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP host
    pub host: String,

    /// HTTP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20390,
        }
    }
}

/// Policy source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Policy file (`.json` or `.toml`); `~` is expanded
    pub path: String,

    /// Base URL prefix; overrides the one in the policy file
    pub base_url: Option<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            path: "nacl.json".to_string(),
            base_url: None,
        }
    }
}

impl PolicyConfig {
    /// Policy path with `~` expanded
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }
}

/// Request adapter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Role used when the request carries none (e.g. "guest")
    pub default_role: Option<String>,

    /// Fallback for paths outside the base URL
    pub out_of_scope: OutOfScope,

    /// Header carrying the authenticated role
    pub role_header: String,

    /// Dot path to the role inside decoded token claims (e.g. "user.role")
    pub claims_path: Option<String>,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            default_role: None,
            out_of_scope: OutOfScope::Deny,
            role_header: "x-user-role".to_string(),
            claims_path: Some("role".to_string()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
