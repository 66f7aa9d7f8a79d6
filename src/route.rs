//! Named routes.
//!
//! The portal's destinations are literal paths, each with a stable name
//! (the route identifier the sidebar anchors carry in `data-url`). Forward
//! resolution turns a request path into that name; reverse lookup turns a
//! name back into its canonical href.

use std::borrow::Cow;

use crate::error::ManifestError;

#[derive(Debug, Clone)]
pub struct RoutePattern {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RoutePattern>,
}

impl RouteTable {
    pub fn new(patterns: Vec<RoutePattern>) -> Result<Self, ManifestError> {
        let mut seen: Vec<&str> = Vec::new();
        for pattern in &patterns {
            if seen.contains(&pattern.name.as_str()) {
                return Err(ManifestError::DuplicateRoute(pattern.name.clone()));
            }
            seen.push(&pattern.name);
        }
        let routes = patterns
            .into_iter()
            .map(|p| RoutePattern {
                path: normalize(&p.path).into_owned(),
                name: p.name,
            })
            .collect();
        Ok(RouteTable { routes })
    }

    /// Resolves a raw request path to a route name. Unknown paths resolve
    /// to `None`, which downstream means "highlight nothing".
    pub fn resolve(&self, path: &str) -> Option<&str> {
        let decoded = decode_path(path);
        let normalized = normalize(&decoded);
        self.routes
            .iter()
            .find(|r| r.path == normalized.as_ref())
            .map(|r| r.name.as_str())
    }

    pub fn reverse(&self, name: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutePattern> {
        self.routes.iter()
    }
}

fn decode_path(path: &str) -> String {
    let bare = path.split(['?', '#']).next().unwrap_or(path);
    match urlencoding::decode(bare) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => bare.to_string(),
    }
}

/// Leading slash enforced, trailing slash appended; Django-style paths all
/// end in one, and requests arrive both ways.
fn normalize(path: &str) -> Cow<'_, str> {
    let trimmed = path.trim();
    let mut out = String::with_capacity(trimmed.len() + 2);
    if !trimmed.starts_with('/') {
        out.push('/');
    }
    out.push_str(trimmed);
    if !out.ends_with('/') {
        out.push('/');
    }
    if out == trimmed {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(out)
    }
}
