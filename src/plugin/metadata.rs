//! Plugin Metadata Types
//!
//! Describes a plugin for discovery and for the `tunedeck plugins` listing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Metadata describing a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Plugin identifier as used in configuration (e.g., "adblocker")
    pub id: String,

    /// Human-readable name (e.g., "Ad Blocker")
    pub display_name: String,

    /// Brief description
    pub description: String,

    /// Semantic version of the plugin
    pub version: semver::Version,

    /// Plugin author or organization
    pub author: String,

    /// Which parts of the plugin ship with the shell
    pub kind: PluginKind,

    /// Shell facilities the plugin hooks into (e.g., "network", "song-info")
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl PluginMetadata {
    /// Create plugin metadata for a plugin with a backend
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: String::new(),
            version: semver::Version::new(1, 0, 0),
            author: String::new(),
            kind: PluginKind::Backend,
            features: BTreeSet::new(),
        }
    }

    /// Create metadata for a plugin that only ships a page-side component
    pub fn frontend(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            kind: PluginKind::Frontend,
            ..Self::new(id, display_name)
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the version. Falls back to 1.0.0 if `version` is not valid semver.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = match semver::Version::parse(version) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    plugin_id = %self.id,
                    version = %version,
                    error = %e,
                    "Invalid plugin version, falling back to 1.0.0"
                );
                semver::Version::new(1, 0, 0)
            }
        };
        self
    }

    /// Add multiple features
    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }
}

/// Which components a plugin ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Process-level backend activated by the loader
    #[default]
    Backend,
    /// Page-side component only; the loader skips it
    Frontend,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginKind::Backend => write!(f, "backend"),
            PluginKind::Frontend => write!(f, "frontend"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_metadata_builder() {
        let metadata = PluginMetadata::new("adblocker", "Ad Blocker")
            .with_description("Cancels requests to ad hosts")
            .with_author("tunedeck")
            .with_version("2.1.0")
            .with_features(["network"]);

        assert_eq!(metadata.id, "adblocker");
        assert_eq!(metadata.display_name, "Ad Blocker");
        assert_eq!(metadata.kind, PluginKind::Backend);
        assert_eq!(metadata.version, semver::Version::new(2, 1, 0));
        assert!(metadata.features.contains("network"));
    }

    #[test]
    fn test_invalid_version_falls_back() {
        let metadata = PluginMetadata::new("x", "X").with_version("not-a-version");
        assert_eq!(metadata.version, semver::Version::new(1, 0, 0));
    }

    #[test]
    fn test_frontend_kind() {
        let metadata = PluginMetadata::frontend("blur-nav-bar", "Blur navigation bar");
        assert_eq!(metadata.kind, PluginKind::Frontend);
        assert_eq!(metadata.kind.to_string(), "frontend");
    }
}
