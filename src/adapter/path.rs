//! Request path normalization
//!
//! The decision engine only sees clean absolute paths. Query strings and
//! fragments are dropped, percent-escapes decoded and dot segments resolved
//! the way a proxy resolves them before forwarding upstream.

use axum::http::Uri;
use std::borrow::Cow;

/// Path component of a request target, without query or fragment.
///
/// Accepts origin-form (`/a/b?x=1`) and absolute-form
/// (`https://host/a/b`) targets.
pub fn request_path(target: &str) -> Cow<'_, str> {
    match target.parse::<Uri>() {
        Ok(parsed) => Cow::Owned(parsed.path().to_string()),
        Err(_) => Cow::Borrowed(target.split(['?', '#']).next().unwrap_or_default()),
    }
}

/// Decode and resolve a path into its canonical segments.
///
/// Returns `None` when a `..` segment climbs above the root.
pub fn normalize(path: &str) -> Option<String> {
    let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }

    Some(format!("/{}", segments.join("/")))
}
