//! Access control types
//!
//! The in-memory policy document: groups keyed by role, each holding an
//! ordered list of rules. Documents are immutable once built.

use crate::access_control::patterns::{MethodPattern, ResourcePattern};
use crate::access_control::resolver::{self, Decision};
use crate::error::MalformedPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What a matching rule does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Allow,
    Deny,
}

impl Action {
    /// Parse a policy action token, ignoring ASCII case
    pub fn try_parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("allow") {
            Some(Action::Allow)
        } else if s.eq_ignore_ascii_case("deny") {
            Some(Action::Deny)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Deny => "deny",
        }
    }

    pub const fn is_allow(&self) -> bool {
        matches!(self, Action::Allow)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub resource: ResourcePattern,
    pub methods: MethodPattern,
    pub action: Action,
}

impl Rule {
    pub fn new(resource: ResourcePattern, methods: MethodPattern, action: Action) -> Self {
        Self {
            resource,
            methods,
            action,
        }
    }

    /// Check if this rule applies to a resource segment and request method
    pub fn matches(&self, resource: &str, method: &str) -> bool {
        self.resource.matches(resource) && self.methods.matches(method)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} on {}",
            self.action, self.methods, self.resource
        )
    }
}

/// The rules that apply to one role, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    role: String,
    rules: Vec<Rule>,
}

impl Group {
    pub fn new(role: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            role: role.into(),
            rules,
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Path prefix that every governed resource path starts with
///
/// Stored as segments so `api` covers `/api/users` but not `/apix/users`.
/// An empty base URL covers every path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrl {
    segments: Vec<String>,
}

impl BaseUrl {
    /// Parse a prefix such as `api`, `/api/` or `api/v1`
    pub fn parse(prefix: &str) -> Self {
        Self {
            segments: prefix
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Extract the resource token for a path under this prefix.
    ///
    /// Returns `None` when the path lies outside the prefix. A path equal to
    /// the prefix yields the empty token.
    pub fn resource_token<'a>(&self, path: &'a str) -> Option<&'a str> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        for expected in &self.segments {
            match segments.next() {
                Some(segment) if segment == expected => {}
                _ => return None,
            }
        }
        Some(segments.next().unwrap_or(""))
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

/// An immutable, validated policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    base_url: BaseUrl,
    groups: HashMap<String, Group>,
}

impl PolicyDocument {
    /// Build a document, rejecting duplicate role names
    pub fn new(
        base_url: BaseUrl,
        groups: impl IntoIterator<Item = Group>,
    ) -> Result<Self, MalformedPolicy> {
        let mut by_role = HashMap::new();
        for (index, group) in groups.into_iter().enumerate() {
            if by_role.contains_key(group.role()) {
                return Err(MalformedPolicy::duplicate_role(
                    format!("groups[{}]", index),
                    group.role(),
                ));
            }
            by_role.insert(group.role().to_string(), group);
        }

        Ok(Self {
            base_url,
            groups: by_role,
        })
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Look up the group for a role
    pub fn group(&self, role: &str) -> Option<&Group> {
        self.groups.get(role)
    }

    /// Role names, sorted
    pub fn roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        roles.sort_unstable();
        roles
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn rule_count(&self) -> usize {
        self.groups.values().map(|g| g.rules.len()).sum()
    }

    /// Decide a request against this document
    pub fn decide(&self, role: &str, method: &str, path: &str) -> Decision {
        resolver::decide(self, role, method, path)
    }
}
