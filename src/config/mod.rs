//! Configuration module for the Tunedeck shell
//!
//! This module handles shell configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//!
//! # Example
//! ```rust,no_run
//! use tunedeck::config::ShellConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ShellConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallbacks
//! let config_path = PathBuf::from("tunedeck.yaml");
//! let config = ShellConfig::from_file(&config_path)?;
//!
//! for plugin in config.enabled_plugins() {
//!     println!("{}", plugin.id);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod env;
mod merge;
pub mod yaml;

use crate::network::ListenerFailurePolicy;
use crate::plugin::registry::normalize_id;

/// One entry of the ordered plugin list
///
/// # Example YAML
/// ```yaml
/// plugins:
///   - id: notifications
///     enabled: true
///     options:
///       unpause_notification: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Opaque options handed to the plugin backend
    #[serde(default)]
    pub options: Value,
}

fn default_enabled() -> bool {
    true
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            options: Value::Null,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Song-info pipeline settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfoConfig {
    /// Bound for one page script evaluation (0 = unbounded)
    pub script_timeout_ms: u64,
    /// Bound for one cover download (0 = unbounded)
    pub fetch_timeout_ms: u64,
    /// User agent for cover downloads; reqwest's default when unset
    pub user_agent: Option<String>,
}

impl SongInfoConfig {
    pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

    pub fn script_timeout(&self) -> Option<Duration> {
        millis(self.script_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        millis(self.fetch_timeout_ms)
    }
}

impl Default for SongInfoConfig {
    fn default() -> Self {
        Self {
            script_timeout_ms: Self::DEFAULT_SCRIPT_TIMEOUT_MS,
            fetch_timeout_ms: Self::DEFAULT_FETCH_TIMEOUT_MS,
            user_agent: None,
        }
    }
}

/// Header interception settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Bound for one header listener (0 = unbounded)
    pub listener_timeout_ms: u64,
    pub listener_failure_policy: ListenerFailurePolicy,
}

impl NetworkConfig {
    pub const DEFAULT_LISTENER_TIMEOUT_MS: u64 = 2_000;
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listener_timeout_ms: Self::DEFAULT_LISTENER_TIMEOUT_MS,
            listener_failure_policy: ListenerFailurePolicy::default(),
        }
    }
}

/// Window behavior not tied to any plugin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowConfig {
    /// Open developer tools once the page has loaded
    pub open_dev_tools: bool,
    /// CSS file replacing the built-in shared stylesheet
    pub stylesheet_path: Option<PathBuf>,
}

impl WindowConfig {
    /// Read the configured stylesheet, if any
    pub fn load_stylesheet(&self) -> std::io::Result<Option<String>> {
        self.stylesheet_path
            .as_deref()
            .map(std::fs::read_to_string)
            .transpose()
    }
}

/// Shell configuration
///
/// Contains everything needed to bootstrap one shell window:
/// - The ordered plugin list
/// - Song-info pipeline timeouts
/// - Header interception settings
/// - Window options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellConfig {
    pub plugins: Vec<PluginDescriptor>,
    pub song_info: SongInfoConfig,
    pub network: NetworkConfig,
    pub window: WindowConfig,
}

impl ShellConfig {
    /// Load configuration from environment variables
    ///
    /// Note: .env file is loaded in main.rs at application startup
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables
    /// filling whatever the file leaves out
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        // Priority: YAML > environment (.env + actual ENV) > defaults
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty or duplicate plugin ids (compared case-insensitively)
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            let id = normalize_id(&plugin.id);
            if id.is_empty() {
                return Err("Plugin id must not be empty".into());
            }
            if !seen.insert(id) {
                return Err(format!("Plugin '{}' is listed more than once", plugin.id).into());
            }
        }
        Ok(())
    }

    /// Enabled plugins in configuration order
    pub fn enabled_plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.iter().filter(|plugin| plugin.enabled)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
