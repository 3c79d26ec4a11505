//! Mirrors the current track into the window title.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::plugin::host::{PluginHost, parse_options};
use crate::plugin::isolation::PluginError;
use crate::plugin::metadata::PluginMetadata;
use crate::song_info::PlaybackSnapshot;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowTitleOptions {
    /// Title template; `{title}` and `{artist}` are substituted
    pub format: String,
    /// Title used while nothing is known about the track
    pub idle_title: String,
}

impl Default for WindowTitleOptions {
    fn default() -> Self {
        Self {
            format: "{artist} - {title}".to_string(),
            idle_title: "Tunedeck".to_string(),
        }
    }
}

impl WindowTitleOptions {
    pub fn render(&self, snapshot: &PlaybackSnapshot) -> String {
        if snapshot.title.is_empty() {
            return self.idle_title.clone();
        }
        self.format
            .replace("{title}", &snapshot.title)
            .replace("{artist}", &snapshot.artist)
    }
}

fn metadata() -> PluginMetadata {
    PluginMetadata::new("window-title", "Window title")
        .with_description("Shows the playing track in the window title")
        .with_features(["song-info", "window"])
}

fn activate(host: &PluginHost, options: &Value) -> Result<(), PluginError> {
    let options: WindowTitleOptions = parse_options(options)?;
    if !options.format.contains("{title}") {
        return Err(PluginError::InvalidOptions(
            "format must contain {title}".to_string(),
        ));
    }

    let window = Arc::downgrade(host.window());
    let _subscription = host
        .song_info()
        .register_observer(move |snapshot: &Arc<PlaybackSnapshot>| {
            if let Some(window) = window.upgrade() {
                window.set_title(&options.render(snapshot));
            }
        });

    Ok(())
}

crate::register_plugin!("window-title", metadata, activate);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let options = WindowTitleOptions::default();
        let snapshot = PlaybackSnapshot {
            title: "Song".to_string(),
            artist: "Band".to_string(),
            ..Default::default()
        };
        assert_eq!(options.render(&snapshot), "Band - Song");
    }

    #[test]
    fn test_render_idle() {
        let options = WindowTitleOptions::default();
        assert_eq!(options.render(&PlaybackSnapshot::default()), "Tunedeck");
    }

    #[tokio::test]
    async fn test_rejects_format_without_title() {
        let host = PluginHost::headless();
        let result = activate(&host, &serde_json::json!({"format": "{artist}"}));
        assert!(matches!(result, Err(PluginError::InvalidOptions(_))));
    }
}
