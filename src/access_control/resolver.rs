//! Access control resolver
//!
//! Decides a request against a [`PolicyDocument`]:
//! 1. Paths outside the base URL are not applicable
//! 2. Roles without a group are denied (`UnknownRole`)
//! 3. The group's rules are walked in declaration order; the first rule whose
//!    resource and method patterns both match decides
//! 4. If nothing matched, the request is denied (`DefaultDeny`)
//!
//! Evaluation is a pure function of its inputs. It never fails and never
//! touches shared mutable state, so a document can be shared across threads.

use crate::access_control::types::{Action, PolicyDocument};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};

/// Outcome of a decision before any fallback is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Deny,
    /// The path is outside the policy's base URL
    NotApplicable,
}

/// Why a decision came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// A rule matched; its action is the outcome
    Matched,
    /// The role has no group in the document
    UnknownRole,
    /// The group has no matching rule
    DefaultDeny,
    /// The path is outside the policy's base URL
    NotApplicable,
}

impl Reason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Reason::Matched => "matched",
            Reason::UnknownRole => "unknown_role",
            Reason::DefaultDeny => "default_deny",
            Reason::NotApplicable => "not_applicable",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with requests outside the policy's jurisdiction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfScope {
    /// Fail closed
    #[default]
    Deny,
    /// Pass the request through untouched
    Allow,
}

/// Result of evaluating a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub reason: Reason,
    /// Index of the deciding rule within the role's group, when one matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<usize>,
}

impl Decision {
    pub const fn matched(action: Action, rule: usize) -> Self {
        let outcome = match action {
            Action::Allow => Outcome::Allow,
            Action::Deny => Outcome::Deny,
        };
        Self {
            outcome,
            reason: Reason::Matched,
            rule: Some(rule),
        }
    }

    pub const fn unknown_role() -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: Reason::UnknownRole,
            rule: None,
        }
    }

    pub const fn default_deny() -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: Reason::DefaultDeny,
            rule: None,
        }
    }

    pub const fn not_applicable() -> Self {
        Self {
            outcome: Outcome::NotApplicable,
            reason: Reason::NotApplicable,
            rule: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.outcome, Outcome::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self.outcome, Outcome::Deny)
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self.outcome, Outcome::NotApplicable)
    }

    /// Collapse the decision to a concrete action, applying `fallback` to
    /// requests outside the policy's jurisdiction
    pub fn resolve(&self, fallback: OutOfScope) -> Action {
        match (self.outcome, fallback) {
            (Outcome::Allow, _) => Action::Allow,
            (Outcome::Deny, _) => Action::Deny,
            (Outcome::NotApplicable, OutOfScope::Allow) => Action::Allow,
            (Outcome::NotApplicable, OutOfScope::Deny) => Action::Deny,
        }
    }
}

/// Decide whether `role` may perform `method` on `path`.
///
/// `path` must already be normalized (no query string, percent-decoded).
pub fn decide(policy: &PolicyDocument, role: &str, method: &str, path: &str) -> Decision {
    debug!(role, method, path, "Checking access");

    let Some(resource) = policy.base_url().resource_token(path) else {
        trace!(base_url = %policy.base_url(), "Path outside base URL");
        return Decision::not_applicable();
    };

    let Some(group) = policy.group(role) else {
        trace!("No group for role");
        return Decision::unknown_role();
    };

    for (index, rule) in group.rules().iter().enumerate() {
        if rule.matches(resource, method) {
            trace!(index, %rule, resource, "Matched rule");
            return Decision::matched(rule.action, index);
        }
    }

    trace!(resource, rules = group.rules().len(), "No rule matched");
    Decision::default_deny()
}
