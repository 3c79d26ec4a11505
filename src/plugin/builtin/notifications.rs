//! Desktop notification when a new track starts playing.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::plugin::host::{PluginHost, parse_options};
use crate::plugin::isolation::PluginError;
use crate::plugin::metadata::PluginMetadata;
use crate::song_info::PlaybackSnapshot;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationOptions {
    /// Also notify when playback resumes on the same track
    pub unpause_notification: bool,
}

/// Decides whether a snapshot deserves a notification
#[derive(Debug, Default)]
struct NotificationGate {
    last_url: Mutex<Option<String>>,
    unpause_notification: bool,
}

impl NotificationGate {
    fn should_notify(&self, snapshot: &PlaybackSnapshot) -> bool {
        if snapshot.is_paused || snapshot.title.is_empty() {
            return false;
        }
        let mut last_url = self.last_url.lock();
        let changed = last_url.as_deref() != Some(snapshot.canonical_url.as_str());
        if changed || self.unpause_notification {
            *last_url = Some(snapshot.canonical_url.clone());
            return true;
        }
        false
    }
}

fn metadata() -> PluginMetadata {
    PluginMetadata::new("notifications", "Notifications")
        .with_description("Shows a notification with the title and artist of each new track")
        .with_features(["song-info"])
}

fn activate(host: &PluginHost, options: &Value) -> Result<(), PluginError> {
    let options: NotificationOptions = parse_options(options)?;
    let gate = NotificationGate {
        last_url: Mutex::new(None),
        unpause_notification: options.unpause_notification,
    };
    let window = Arc::downgrade(host.window());

    // Lives as long as the window; the subscription is intentionally not kept
    let _subscription = host
        .song_info()
        .register_observer(move |snapshot: &Arc<PlaybackSnapshot>| {
            if !gate.should_notify(snapshot) {
                return;
            }
            if let Some(window) = window.upgrade() {
                window.notify(&snapshot.title, &snapshot.artist);
            }
        });

    Ok(())
}

crate::register_plugin!("notifications", metadata, activate);

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(url: &str) -> PlaybackSnapshot {
        PlaybackSnapshot {
            title: "Song".to_string(),
            artist: "Band".to_string(),
            canonical_url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_notifies_once_per_track() {
        let gate = NotificationGate::default();
        assert!(gate.should_notify(&playing("https://x/1")));
        assert!(!gate.should_notify(&playing("https://x/1")));
        assert!(gate.should_notify(&playing("https://x/2")));
    }

    #[test]
    fn test_paused_never_notifies() {
        let gate = NotificationGate::default();
        let mut snapshot = playing("https://x/1");
        snapshot.is_paused = true;
        assert!(!gate.should_notify(&snapshot));
    }

    #[test]
    fn test_unpause_option_repeats() {
        let gate = NotificationGate {
            unpause_notification: true,
            ..Default::default()
        };
        assert!(gate.should_notify(&playing("https://x/1")));
        assert!(gate.should_notify(&playing("https://x/1")));
    }
}
