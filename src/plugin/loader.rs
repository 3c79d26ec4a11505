//! Plugin Loader
//!
//! Bridges static configuration and the registry: walks the enabled plugin
//! descriptors in order and activates each backend against one window.

use std::sync::Arc;

use dashmap::DashMap;

use super::host::PluginHost;
use super::lifecycle::{PluginEntry, PluginState};
use super::registry::{PluginRegistry, normalize_id};
use crate::config::{PluginDescriptor, WindowConfig};

/// Stylesheet injected into the page before any plugin runs
pub const SHARED_STYLESHEET: &str = r#"
/* Hide the cast button, the host has no cast target */
ytmusic-cast-button {
  display: none !important;
}

/* Let the navigation bar act as the window drag handle */
ytmusic-nav-bar {
  -webkit-user-select: none;
  -webkit-app-region: drag;
}

ytmusic-nav-bar input,
ytmusic-nav-bar span,
ytmusic-nav-bar [role="button"],
ytmusic-nav-bar yt-icon,
tp-yt-iron-dropdown {
  -webkit-app-region: no-drag;
}
"#;

/// Loader behavior that is not tied to any particular plugin
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// CSS injected before plugin activation
    pub stylesheet: String,
    /// Open developer tools once the page finishes loading
    pub open_dev_tools: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            stylesheet: SHARED_STYLESHEET.to_string(),
            open_dev_tools: false,
        }
    }
}

impl LoaderOptions {
    /// Build options from the window configuration; `stylesheet` replaces the
    /// built-in stylesheet when present.
    pub fn from_window_config(config: &WindowConfig, stylesheet: Option<String>) -> Self {
        Self {
            stylesheet: stylesheet.unwrap_or_else(|| SHARED_STYLESHEET.to_string()),
            open_dev_tools: config.open_dev_tools,
        }
    }
}

/// Outcome of one [`PluginLoader::load_all`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Plugins whose backend was activated, in activation order
    pub activated: Vec<String>,
    /// Enabled plugins without backend, or already active
    pub skipped: Vec<String>,
    /// Plugins whose activation failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl LoadReport {
    /// No plugin failed to activate
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Activates enabled plugins for a single window
pub struct PluginLoader<'r> {
    registry: &'r PluginRegistry,
    options: LoaderOptions,
    entries: DashMap<String, PluginEntry>,
}

impl<'r> PluginLoader<'r> {
    pub fn new(registry: &'r PluginRegistry, options: LoaderOptions) -> Self {
        Self {
            registry,
            options,
            entries: DashMap::new(),
        }
    }

    /// Activate every enabled plugin in `descriptors`, in order.
    ///
    /// Unknown ids and front-end-only plugins are skipped. A failing plugin is
    /// logged and recorded; loading continues with the next one. A plugin that
    /// is already active for this window is not activated again.
    pub async fn load_all(
        &self,
        host: &PluginHost,
        descriptors: &[PluginDescriptor],
    ) -> LoadReport {
        if let Err(e) = host.window().insert_css(&self.options.stylesheet).await {
            tracing::warn!(error = %e, "Failed to inject shared stylesheet");
        }

        if self.options.open_dev_tools {
            let window = Arc::downgrade(host.window());
            host.window().on_did_finish_load(Box::new(move || {
                if let Some(window) = window.upgrade() {
                    window.open_dev_tools();
                }
            }));
        }

        let mut report = LoadReport::default();

        for descriptor in descriptors.iter().filter(|d| d.enabled) {
            let id = normalize_id(&descriptor.id);
            let mut entry = self.entries.entry(id.clone()).or_default();

            if !entry.state.can_activate() {
                tracing::debug!(
                    plugin_id = %id,
                    state = %entry.state,
                    "Plugin not eligible for activation"
                );
                report.skipped.push(id);
                continue;
            }

            entry.transition(PluginState::Activating);
            match self.registry.activate(&id, host, &descriptor.options) {
                None => {
                    tracing::debug!(plugin_id = %id, "Plugin has no backend, skipping");
                    entry.transition(PluginState::Skipped);
                    report.skipped.push(id);
                }
                Some(Ok(())) => {
                    tracing::info!(plugin_id = %id, "Plugin activated");
                    entry.record_activation();
                    report.activated.push(id);
                }
                Some(Err(e)) => {
                    tracing::error!(plugin_id = %id, error = %e, "Plugin activation failed");
                    entry.record_error(e.to_string());
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        tracing::info!(
            activated = report.activated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Plugin loading finished"
        );

        report
    }

    /// Lifecycle state of a plugin in this window
    pub fn plugin_state(&self, plugin_id: &str) -> Option<PluginState> {
        self.entries
            .get(&normalize_id(plugin_id))
            .map(|entry| entry.state)
    }

    /// Last activation error recorded for a plugin
    pub fn last_error(&self, plugin_id: &str) -> Option<String> {
        self.entries
            .get(&normalize_id(plugin_id))
            .and_then(|entry| entry.last_error.clone())
    }
}
