use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::ManifestError;
use crate::route::{RoutePattern, RouteTable};

const DEFAULT_MANIFEST: &str = include_str!("default_manifest.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Client,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub url_name: String,
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub badge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavSection {
    pub title: String,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceNav {
    pub audience: Audience,
    #[serde(default)]
    pub prefix: String,
    pub sections: Vec<NavSection>,
}

/// A badge's live value: a count, and whether it is in the alert state.
/// An alert badge renders red and stays red even when its link is the
/// active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub count: u32,
    #[serde(default)]
    pub alert: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavManifest {
    pub audiences: Vec<AudienceNav>,
}

impl NavManifest {
    pub fn from_yaml(raw: &str) -> Result<Self, ManifestError> {
        let manifest: NavManifest = serde_yaml::from_str(raw)?;
        if manifest.audiences.is_empty() {
            return Err(ManifestError::EmptyManifest);
        }
        // Route names must be unique across every audience; surface the
        // clash now rather than at request time.
        manifest.route_table()?;
        Ok(manifest)
    }

    pub fn from_file(path: &str) -> Result<Self, ManifestError> {
        let raw = fs::read_to_string(path)?;
        NavManifest::from_yaml(&raw)
    }

    pub fn builtin() -> Result<Self, ManifestError> {
        NavManifest::from_yaml(DEFAULT_MANIFEST)
    }

    pub fn items(&self) -> impl Iterator<Item = &NavItem> {
        self.audiences
            .iter()
            .flat_map(|a| a.sections.iter())
            .flat_map(|s| s.items.iter())
    }

    pub fn contains_route(&self, name: &str) -> bool {
        self.items().any(|item| item.url_name == name)
    }

    pub fn route_table(&self) -> Result<RouteTable, ManifestError> {
        RouteTable::new(
            self.items()
                .map(|item| RoutePattern {
                    path: item.path.clone(),
                    name: item.url_name.clone(),
                })
                .collect(),
        )
    }

    pub fn audience(&self, audience: Audience) -> Option<&AudienceNav> {
        self.audiences.iter().find(|a| a.audience == audience)
    }

    /// Picks the audience whose prefix matches the request path, longest
    /// prefix first. The client audience carries an empty prefix and so
    /// catches everything that is not the admin panel.
    pub fn audience_for(&self, path: &str) -> Option<&AudienceNav> {
        self.audiences
            .iter()
            .filter(|a| path.starts_with(&a.prefix))
            .max_by_key(|a| a.prefix.len())
    }
}
