//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (ROUTE_ACL__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use axum::http::HeaderName;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "route-acl.toml",
    ".route-acl.toml",
    "~/.config/route-acl/config.toml",
    "/etc/route-acl/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    // Values from a local .env file become regular environment variables
    let _ = dotenvy::dotenv();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g., ROUTE_ACL__POLICY__PATH, ROUTE_ACL__ACL__DEFAULT_ROLE
    // Double underscore (__) maps to nested keys (policy.path)
    builder = builder.add_source(
        Environment::with_prefix("ROUTE_ACL")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.policy.path.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "policy.path".to_string(),
        });
    }

    if HeaderName::from_bytes(config.acl.role_header.as_bytes()).is_err() {
        return Err(ConfigError::Invalid {
            message: format!(
                "acl.role_header is not a valid header name: {:?}",
                config.acl.role_header
            ),
        });
    }

    if let Some(role) = &config.acl.default_role
        && role.trim().is_empty()
    {
        return Err(ConfigError::Invalid {
            message: "acl.default_role must not be empty".to_string(),
        });
    }

    if let Some(path) = &config.acl.claims_path
        && path.split('.').any(str::is_empty)
    {
        return Err(ConfigError::Invalid {
            message: format!("acl.claims_path has an empty segment: {:?}", path),
        });
    }

    Ok(())
}
