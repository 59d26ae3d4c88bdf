//! Role extraction
//!
//! The engine only needs a role name. Where that name lives on a request is
//! up to the host application, so extraction sits behind [`RoleExtractor`].

use crate::config::AclConfig;
use axum::http::{HeaderName, request::Parts};
use serde_json::Value;
use std::sync::Arc;

/// Reads the subject's role from an inbound request
pub trait RoleExtractor: Send + Sync {
    fn extract_role(&self, parts: &Parts) -> Option<String>;
}

impl<F> RoleExtractor for F
where
    F: Fn(&Parts) -> Option<String> + Send + Sync,
{
    fn extract_role(&self, parts: &Parts) -> Option<String> {
        self(parts)
    }
}

/// Role established by an upstream authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedRole(pub String);

/// Decoded token claims inserted by an upstream authentication layer
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(pub Value);

/// Role from a request header
#[derive(Debug, Clone)]
pub struct HeaderRole {
    name: HeaderName,
}

impl HeaderRole {
    pub fn new(name: HeaderName) -> Self {
        Self { name }
    }
}

impl RoleExtractor for HeaderRole {
    fn extract_role(&self, parts: &Parts) -> Option<String> {
        let value = parts.headers.get(&self.name)?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Role from an [`AuthenticatedRole`] extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionRole;

impl RoleExtractor for ExtensionRole {
    fn extract_role(&self, parts: &Parts) -> Option<String> {
        parts
            .extensions
            .get::<AuthenticatedRole>()
            .map(|role| role.0.clone())
            .filter(|role| !role.is_empty())
    }
}

/// Role from a dot path into a [`Claims`] extension, e.g. `user.role`
#[derive(Debug, Clone)]
pub struct ClaimsRole {
    path: Vec<String>,
}

impl ClaimsRole {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.split('.').map(str::to_string).collect(),
        }
    }
}

impl RoleExtractor for ClaimsRole {
    fn extract_role(&self, parts: &Parts) -> Option<String> {
        let claims = parts.extensions.get::<Claims>()?;
        let value = self
            .path
            .iter()
            .try_fold(&claims.0, |value, key| value.get(key))?;

        match value {
            Value::String(role) if !role.is_empty() => Some(role.clone()),
            _ => None,
        }
    }
}

/// Tries extractors in order and returns the first role found
#[derive(Clone, Default)]
pub struct RoleChain {
    extractors: Vec<Arc<dyn RoleExtractor>>,
}

impl RoleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extractor: impl RoleExtractor + 'static) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Extractors for middleware running inside the application: the
    /// authenticated-role extension, then decoded claims when configured
    pub fn in_process(config: &AclConfig) -> Self {
        let chain = Self::new().with(ExtensionRole);
        match config.claims_path.as_deref() {
            Some(path) => chain.with(ClaimsRole::new(path)),
            None => chain,
        }
    }

    /// Extractor for a forward-auth endpoint behind a trusted proxy that
    /// sets the role header
    pub fn forwarded(config: &AclConfig) -> Result<Self, axum::http::header::InvalidHeaderName> {
        let name = HeaderName::from_bytes(config.role_header.as_bytes())?;
        Ok(Self::new().with(HeaderRole::new(name)))
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl RoleExtractor for RoleChain {
    fn extract_role(&self, parts: &Parts) -> Option<String> {
        self.extractors
            .iter()
            .find_map(|extractor| extractor.extract_role(parts))
    }
}
