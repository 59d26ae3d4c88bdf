//! Policy loader
//!
//! Parses a raw policy source (JSON or TOML) and validates it into an
//! immutable [`PolicyDocument`]. No matching happens here; the loader only
//! rejects malformed entries and normalizes tokens (method names are
//! upper-cased and de-duplicated).
//!
//! ## Example (JSON)
//!
//! ```json
//! {
//!   "baseUrl": "api",
//!   "groups": [
//!     {
//!       "group": "user",
//!       "permissions": [
//!         { "resource": "mangoes", "methods": ["GET"], "action": "allow" },
//!         { "resource": "*", "methods": "*", "action": "deny" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A bare array of groups is accepted as well.

use crate::access_control::patterns::{MethodPattern, ResourcePattern, WILDCARD};
use crate::access_control::types::{Action, BaseUrl, Group, PolicyDocument, Rule};
use crate::error::{MalformedPolicy, PolicyError, PolicyResult};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

/// HTTP method token after upper-casing
static METHOD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_-]*$").expect("method token regex is valid"));

/// A policy source as written by its author, before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPolicy {
    /// `[{"group": ..., "permissions": [...]}, ...]`
    Groups(Vec<RawGroup>),
    /// `{"baseUrl": ..., "groups": [...]}`
    Document(RawDocument),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDocument {
    #[serde(default, alias = "baseUrl")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub groups: Vec<RawGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawGroup {
    /// Role name
    #[serde(default, alias = "role")]
    pub group: Option<String>,

    #[serde(default)]
    pub permissions: Vec<RawRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    #[serde(default)]
    pub resource: Option<String>,

    #[serde(default)]
    pub methods: Option<RawMethods>,

    #[serde(default)]
    pub action: Option<String>,
}

/// `"*"`, a single method name, or a list of method names
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMethods {
    One(String),
    Many(Vec<String>),
}

/// On-disk policy format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Json,
    Toml,
}

impl PolicyFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> PolicyResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(PolicyFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(PolicyFormat::Toml),
            _ => Err(PolicyError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Validate a raw policy, using the document's own base URL
pub fn load(raw: RawPolicy) -> Result<PolicyDocument, MalformedPolicy> {
    load_with_base_url(raw, None)
}

/// Validate a raw policy. A `base_url` given here takes precedence over the
/// one in the document; with neither, every path is governed.
pub fn load_with_base_url(
    raw: RawPolicy,
    base_url: Option<&str>,
) -> Result<PolicyDocument, MalformedPolicy> {
    let (document_base_url, raw_groups) = match raw {
        RawPolicy::Groups(groups) => (None, groups),
        RawPolicy::Document(doc) => (doc.base_url, doc.groups),
    };

    let base_url = BaseUrl::parse(base_url.or(document_base_url.as_deref()).unwrap_or(""));

    let mut groups = Vec::with_capacity(raw_groups.len());
    for (index, raw_group) in raw_groups.iter().enumerate() {
        groups.push(compile_group(index, raw_group)?);
    }

    PolicyDocument::new(base_url, groups)
}

/// Parse a policy source without validating it
pub fn parse_policy_str(source: &str, format: PolicyFormat) -> PolicyResult<RawPolicy> {
    match format {
        PolicyFormat::Json => {
            serde_json::from_str(source).map_err(|e| PolicyError::Parse(e.to_string()))
        }
        PolicyFormat::Toml => toml::from_str::<RawDocument>(source)
            .map(RawPolicy::Document)
            .map_err(|e| PolicyError::Parse(e.to_string())),
    }
}

/// Parse and validate a policy source
pub fn load_policy_str(
    source: &str,
    format: PolicyFormat,
    base_url: Option<&str>,
) -> PolicyResult<PolicyDocument> {
    let raw = parse_policy_str(source, format)?;
    Ok(load_with_base_url(raw, base_url)?)
}

/// Read, parse and validate a policy file
pub fn load_policy_file(path: &Path, base_url: Option<&str>) -> PolicyResult<PolicyDocument> {
    let format = PolicyFormat::from_path(path)?;
    let source = std::fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let document = load_policy_str(&source, format, base_url)?;

    info!(
        path = %path.display(),
        base_url = %document.base_url(),
        roles = document.group_count(),
        rules = document.rule_count(),
        "Loaded access policy"
    );

    Ok(document)
}

fn compile_group(index: usize, raw: &RawGroup) -> Result<Group, MalformedPolicy> {
    let role = match raw.group.as_deref().map(str::trim) {
        Some(role) if !role.is_empty() => role,
        _ => return Err(MalformedPolicy::missing_role(format!("groups[{}]", index))),
    };

    let mut rules = Vec::with_capacity(raw.permissions.len());
    for (rule_index, raw_rule) in raw.permissions.iter().enumerate() {
        let location = format!("groups[{}] ({}).permissions[{}]", index, role, rule_index);
        rules.push(compile_rule(&location, raw_rule)?);
    }

    debug!(role, rules = rules.len(), "Compiled policy group");
    Ok(Group::new(role, rules))
}

fn compile_rule(location: &str, raw: &RawRule) -> Result<Rule, MalformedPolicy> {
    let action = match raw.action.as_deref() {
        None => return Err(MalformedPolicy::missing_action(location)),
        Some(token) => {
            Action::try_parse(token).ok_or_else(|| MalformedPolicy::unknown_action(location, token))?
        }
    };

    let resource = match raw.resource.as_deref() {
        None => return Err(MalformedPolicy::missing_field(location, "resource")),
        Some(token) => compile_resource(location, token)?,
    };

    let methods = match &raw.methods {
        None => return Err(MalformedPolicy::missing_field(location, "methods")),
        Some(methods) => compile_methods(location, methods)?,
    };

    Ok(Rule::new(resource, methods, action))
}

fn compile_resource(location: &str, token: &str) -> Result<ResourcePattern, MalformedPolicy> {
    if token == WILDCARD {
        return Ok(ResourcePattern::Any);
    }
    if token.contains('/') {
        return Err(MalformedPolicy::invalid_resource(
            location,
            token,
            "must be a single path segment",
        ));
    }
    if token.contains('*') {
        return Err(MalformedPolicy::invalid_resource(
            location,
            token,
            "may only use \"*\" on its own",
        ));
    }
    Ok(ResourcePattern::parse(token))
}

fn compile_methods(location: &str, raw: &RawMethods) -> Result<MethodPattern, MalformedPolicy> {
    let tokens: &[String] = match raw {
        RawMethods::One(token) => std::slice::from_ref(token),
        RawMethods::Many(tokens) if tokens.is_empty() => {
            return Err(MalformedPolicy::empty_methods(location));
        }
        RawMethods::Many(tokens) => tokens,
    };

    if tokens.iter().any(|t| t.trim() == WILDCARD) {
        return Ok(MethodPattern::Any);
    }

    let mut methods: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let method = token.trim().to_ascii_uppercase();
        if !METHOD_TOKEN.is_match(&method) {
            return Err(MalformedPolicy::invalid_method(location, token));
        }
        if !methods.contains(&method) {
            methods.push(method);
        }
    }

    Ok(MethodPattern::OneOf(methods))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_json(json: &str) -> Result<PolicyDocument, MalformedPolicy> {
        let raw = parse_policy_str(json, PolicyFormat::Json).unwrap();
        load(raw)
    }

    #[test]
    fn test_load_bare_group_array() {
        let doc = load_json(
            r#"[{
                "group": "user",
                "permissions": [{ "resource": "*", "methods": ["POST", "GET", "PUT"], "action": "allow" }]
            }]"#,
        )
        .unwrap();

        assert!(doc.base_url().is_empty());
        let rules = doc.group("user").unwrap().rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].resource, ResourcePattern::Any);
        assert_eq!(
            rules[0].methods.methods().unwrap(),
            &["POST".to_string(), "GET".to_string(), "PUT".to_string()]
        );
        assert_eq!(rules[0].action, Action::Allow);
    }

    #[test]
    fn test_load_document_with_base_url() {
        let doc = load_json(
            r#"{
                "baseUrl": "api",
                "groups": [{ "role": "admin", "permissions": [] }]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.base_url(), &BaseUrl::parse("api"));
        assert!(doc.group("admin").unwrap().rules().is_empty());
    }

    #[test]
    fn test_base_url_override() {
        let raw = parse_policy_str(r#"{"baseUrl": "api", "groups": []}"#, PolicyFormat::Json)
            .unwrap();
        let doc = load_with_base_url(raw, Some("/v2/")).unwrap();
        assert_eq!(doc.base_url(), &BaseUrl::parse("v2"));
    }

    #[test]
    fn test_methods_normalized() {
        let doc = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "users", "methods": ["get", "Get", " post "], "action": "allow" }
            ]}]"#,
        )
        .unwrap();

        let rule = &doc.group("user").unwrap().rules()[0];
        assert_eq!(
            rule.methods,
            MethodPattern::OneOf(vec!["GET".to_string(), "POST".to_string()])
        );
    }

    #[test]
    fn test_single_method_string() {
        let doc = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "users", "methods": "delete", "action": "deny" }
            ]}]"#,
        )
        .unwrap();
        let rule = &doc.group("user").unwrap().rules()[0];
        assert_eq!(rule.methods, MethodPattern::OneOf(vec!["DELETE".to_string()]));
    }

    #[test]
    fn test_wildcard_in_method_list() {
        let doc = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "users", "methods": ["GET", "*"], "action": "allow" }
            ]}]"#,
        )
        .unwrap();
        assert!(doc.group("user").unwrap().rules()[0].methods.is_wildcard());
    }

    #[test]
    fn test_action_case_insensitive() {
        let doc = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "*", "methods": "*", "action": "Deny" }
            ]}]"#,
        )
        .unwrap();
        assert_eq!(doc.group("user").unwrap().rules()[0].action, Action::Deny);
    }

    #[test]
    fn test_missing_role_rejected() {
        let err = load_json(r#"[{ "permissions": [] }]"#).unwrap_err();
        assert_eq!(err, MalformedPolicy::missing_role("groups[0]"));

        let err = load_json(r#"[{ "group": "  ", "permissions": [] }]"#).unwrap_err();
        assert_eq!(err.location, "groups[0]");
    }

    #[test]
    fn test_missing_action_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [{ "resource": "*", "methods": "*" }] }]"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MalformedPolicy::missing_action("groups[0] (user).permissions[0]")
        );
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "*", "methods": "*", "action": "permit" }
            ]}]"#,
        )
        .unwrap_err();
        assert!(err.reason.contains("permit"));
    }

    #[test]
    fn test_empty_methods_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "*", "methods": [], "action": "allow" }
            ]}]"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MalformedPolicy::empty_methods("groups[0] (user).permissions[0]")
        );
    }

    #[test]
    fn test_missing_methods_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [{ "resource": "*", "action": "deny" }] }]"#,
        )
        .unwrap_err();
        assert!(err.reason.contains("methods"));
    }

    #[test]
    fn test_missing_resource_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [{ "methods": "*", "action": "deny" }] }]"#,
        )
        .unwrap_err();
        assert!(err.reason.contains("resource"));
    }

    #[test]
    fn test_invalid_resource_rejected() {
        for resource in ["users/admin", "mango*", "*s"] {
            let json = format!(
                r#"[{{ "group": "user", "permissions": [
                    {{ "resource": "{}", "methods": "*", "action": "deny" }}
                ]}}]"#,
                resource
            );
            let err = load_json(&json).unwrap_err();
            assert!(err.reason.contains(resource), "{}", err);
        }
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [
                { "resource": "*", "methods": ["GET", "PO ST"], "action": "allow" }
            ]}]"#,
        )
        .unwrap_err();
        assert!(err.reason.contains("PO ST"));
    }

    #[test]
    fn test_role_name_trimmed() {
        let doc = load_json(r#"[{ "group": " user ", "permissions": [] }]"#).unwrap();
        assert!(doc.group("user").is_some());
        assert_eq!(doc.roles(), vec!["user"]);

        let err = load_json(
            r#"[{ "group": "user", "permissions": [] }, { "group": "user ", "permissions": [] }]"#,
        )
        .unwrap_err();
        assert_eq!(err.location, "groups[1]");
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let err = load_json(
            r#"[{ "group": "user", "permissions": [] }, { "group": "user", "permissions": [] }]"#,
        )
        .unwrap_err();
        assert_eq!(err.location, "groups[1]");
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let result = parse_policy_str(
            r#"[{ "group": "user", "permisions": [] }]"#,
            PolicyFormat::Json,
        );
        assert!(matches!(result, Err(PolicyError::Parse(_))));
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
base_url = "api"

[[groups]]
group = "user"

[[groups.permissions]]
resource = "mangoes"
methods = ["GET"]
action = "allow"

[[groups.permissions]]
resource = "*"
methods = "*"
action = "deny"
"#;
        let doc = load_policy_str(toml, PolicyFormat::Toml, None).unwrap();
        assert_eq!(doc.base_url(), &BaseUrl::parse("api"));
        let rules = doc.group("user").unwrap().rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].action, Action::Deny);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            PolicyFormat::from_path(Path::new("nacl.json")).unwrap(),
            PolicyFormat::Json
        );
        assert_eq!(
            PolicyFormat::from_path(Path::new("/etc/acl/policy.TOML")).unwrap(),
            PolicyFormat::Toml
        );
        assert!(matches!(
            PolicyFormat::from_path(Path::new("policy.yml")),
            Err(PolicyError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_load_policy_file_missing() {
        let result = load_policy_file(Path::new("/nonexistent/route-acl/policy.json"), None);
        assert!(matches!(result, Err(PolicyError::Read { .. })));
    }
}
