//! Error types for route-acl
//!
//! This module defines the error hierarchy used throughout the crate.
//! Only load-time problems are errors: every per-request condition resolves
//! to a concrete allow/deny decision and never reaches this module.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },
}

/// Errors raised while turning a configuration source into a policy document
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse policy document: {0}")]
    Parse(String),

    #[error("Unsupported policy format for '{path}' (expected .json or .toml)")]
    UnsupportedFormat { path: String },

    #[error("Malformed policy: {0}")]
    Malformed(#[from] MalformedPolicy),
}

/// A policy document that parsed but violates the document invariants.
///
/// `location` points at the offending entry, e.g. `groups[1] (user).permissions[0]`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{location}: {reason}")]
pub struct MalformedPolicy {
    pub location: String,
    pub reason: String,
}

impl MalformedPolicy {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_role(location: impl Into<String>) -> Self {
        Self::new(location, "group has no role name")
    }

    pub fn duplicate_role(location: impl Into<String>, role: &str) -> Self {
        Self::new(location, format!("role '{}' is defined more than once", role))
    }

    pub fn missing_action(location: impl Into<String>) -> Self {
        Self::new(location, "rule has no action")
    }

    pub fn unknown_action(location: impl Into<String>, action: &str) -> Self {
        Self::new(
            location,
            format!("action '{}' is not one of 'allow' or 'deny'", action),
        )
    }

    /// An empty method list could mean "nothing" or "everything"; refuse to guess.
    pub fn empty_methods(location: impl Into<String>) -> Self {
        Self::new(
            location,
            "methods list is empty; use \"*\" to match every method",
        )
    }

    pub fn missing_field(location: impl Into<String>, field: &str) -> Self {
        Self::new(
            location,
            format!("rule has no '{}'; use \"*\" to match everything", field),
        )
    }

    pub fn invalid_method(location: impl Into<String>, method: &str) -> Self {
        Self::new(location, format!("'{}' is not a valid HTTP method", method))
    }

    pub fn invalid_resource(location: impl Into<String>, resource: &str, why: &str) -> Self {
        Self::new(location, format!("resource '{}' {}", resource, why))
    }
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for policy loading
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;
