//! Swappable policy handle
//!
//! Decisions read a snapshot (`Arc<PolicyDocument>`) with a single atomic
//! load. A reload publishes a whole new document; decisions already holding
//! a snapshot keep evaluating the document they started with.

use crate::access_control::loader::load_policy_file;
use crate::access_control::resolver::Decision;
use crate::access_control::types::PolicyDocument;
use crate::error::PolicyResult;
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Shared, atomically replaceable reference to the current policy
#[derive(Clone)]
pub struct PolicyHandle {
    inner: Arc<ArcSwap<PolicyDocument>>,
}

impl PolicyHandle {
    pub fn new(document: PolicyDocument) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(document)),
        }
    }

    /// The current document
    pub fn snapshot(&self) -> Arc<PolicyDocument> {
        self.inner.load_full()
    }

    /// Publish a new document, returning the previous one
    pub fn swap(&self, document: PolicyDocument) -> Arc<PolicyDocument> {
        self.inner.swap(Arc::new(document))
    }

    /// Decide against the current document
    pub fn decide(&self, role: &str, method: &str, path: &str) -> Decision {
        self.inner.load().decide(role, method, path)
    }

    /// Reload from a policy file.
    ///
    /// On error the current document stays active and the error is returned.
    pub fn reload_from(&self, path: &Path, base_url: Option<&str>) -> PolicyResult<()> {
        match load_policy_file(path, base_url) {
            Ok(document) => {
                let roles = document.group_count();
                self.swap(document);
                info!(path = %path.display(), roles, "Policy reloaded");
                Ok(())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Policy reload rejected, keeping previous policy");
                Err(e)
            }
        }
    }
}

impl From<PolicyDocument> for PolicyHandle {
    fn from(document: PolicyDocument) -> Self {
        Self::new(document)
    }
}

impl std::fmt::Debug for PolicyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyHandle")
            .field("document", &self.snapshot())
            .finish()
    }
}
