//! Pattern matching for access control
//!
//! A pattern is either the whole-field wildcard `*` or an exact value.
//! There is no partial globbing, so matching a rule is O(1) per field.

use std::fmt;

/// Token that matches any resource or any method
pub const WILDCARD: &str = "*";

/// Pattern over the first path segment after the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourcePattern {
    /// Matches every resource, including the empty one
    Any,
    /// Matches a single resource segment, compared case-sensitively
    Exact(String),
}

impl ResourcePattern {
    /// Build a pattern from a policy token (`*` becomes [`ResourcePattern::Any`])
    pub fn parse(token: &str) -> Self {
        if token == WILDCARD {
            ResourcePattern::Any
        } else {
            ResourcePattern::Exact(token.to_string())
        }
    }

    /// Check if a resource segment matches this pattern
    pub fn matches(&self, resource: &str) -> bool {
        match self {
            ResourcePattern::Any => true,
            ResourcePattern::Exact(expected) => expected == resource,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ResourcePattern::Any)
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourcePattern::Any => f.write_str(WILDCARD),
            ResourcePattern::Exact(resource) => f.write_str(resource),
        }
    }
}

/// Pattern over the HTTP method
///
/// Method names are stored upper-cased by the loader; request methods are
/// compared ASCII case-insensitively so `DElETE` matches `DELETE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodPattern {
    /// Matches every method
    Any,
    /// Matches any of the listed methods, in declaration order
    OneOf(Vec<String>),
}

impl MethodPattern {
    /// Check if a request method matches this pattern
    pub fn matches(&self, method: &str) -> bool {
        match self {
            MethodPattern::Any => true,
            MethodPattern::OneOf(methods) => {
                methods.iter().any(|m| m.eq_ignore_ascii_case(method))
            }
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, MethodPattern::Any)
    }

    /// The listed methods, or `None` for the wildcard
    pub fn methods(&self) -> Option<&[String]> {
        match self {
            MethodPattern::Any => None,
            MethodPattern::OneOf(methods) => Some(methods),
        }
    }
}

impl fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodPattern::Any => f.write_str(WILDCARD),
            MethodPattern::OneOf(methods) => write!(f, "[{}]", methods.join(", ")),
        }
    }
}
