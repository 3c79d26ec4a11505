use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::PluginDescriptor;
use crate::network::ListenerFailurePolicy;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override the environment.
///
/// # Example YAML structure
/// ```yaml
/// plugins:
///   - id: adblocker
///     options:
///       additional_patterns: ["/api/stats/qoe"]
///   - id: notifications
///     options:
///       unpause_notification: true
///   - id: blur-nav-bar
///   - id: window-title
///     enabled: false
///
/// song_info:
///   script_timeout_ms: 5000
///   fetch_timeout_ms: 10000
///   user_agent: "Mozilla/5.0 (X11; Linux x86_64)"
///
/// network:
///   listener_timeout_ms: 2000
///   listener_failure_policy: isolate
///
/// window:
///   open_dev_tools: false
///   stylesheet_path: "/etc/tunedeck/style.css"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    /// Replaces the environment's plugin list when present
    pub plugins: Option<Vec<PluginDescriptor>>,
    pub song_info: Option<SongInfoYaml>,
    pub network: Option<NetworkYaml>,
    pub window: Option<WindowYaml>,
}

/// Song-info pipeline configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SongInfoYaml {
    pub script_timeout_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Header interception configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct NetworkYaml {
    pub listener_timeout_ms: Option<u64>,
    pub listener_failure_policy: Option<ListenerFailurePolicy>,
}

/// Window configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WindowYaml {
    pub open_dev_tools: Option<bool>,
    pub stylesheet_path: Option<PathBuf>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
