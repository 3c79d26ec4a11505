//! Plugin Lifecycle Management
//!
//! Tracks where each enabled plugin is in its per-window lifecycle.
//!
//! # Lifecycle State Machine
//!
//! ```text
//!     +-------------+
//!     | Registered  |  (inventory::collect! / runtime register)
//!     +------+------+
//!            |
//!     +------+-------+
//!     |              |
//!     v              v
//! +---+--------+  +--+------+
//! | Activating |  | Skipped |  (no backend)
//! +---+--------+  +---------+
//!     |
//!     +------+------+
//!     |             |
//!     v             v
//! +---+----+   +----+----+
//! | Active |   |  Failed |
//! +--------+   +---------+
//! ```

use std::time::{Duration, Instant};

/// Plugin lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Plugin is known to the registry but has not been looked at by a loader
    Registered,

    /// Activation function is running
    Activating,

    /// Activation completed successfully
    Active,

    /// Plugin is enabled but ships no backend
    Skipped,

    /// Activation returned an error or panicked
    Failed,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginState::Registered => write!(f, "registered"),
            PluginState::Activating => write!(f, "activating"),
            PluginState::Active => write!(f, "active"),
            PluginState::Skipped => write!(f, "skipped"),
            PluginState::Failed => write!(f, "failed"),
        }
    }
}

impl PluginState {
    /// Whether the plugin's backend is running in this window
    pub fn is_active(&self) -> bool {
        matches!(self, PluginState::Active)
    }

    /// A plugin may only be activated from these states
    pub fn can_activate(&self) -> bool {
        matches!(self, PluginState::Registered | PluginState::Failed)
    }
}

/// Per-window lifecycle record for one plugin
#[derive(Debug)]
pub struct PluginEntry {
    /// Current plugin state
    pub state: PluginState,

    /// Time when the loader first saw the plugin
    pub registered_at: Instant,

    /// Time when activation succeeded
    pub activated_at: Option<Instant>,

    /// Number of failed activations
    pub error_count: u64,

    /// Last error message (if any)
    pub last_error: Option<String>,
}

impl PluginEntry {
    pub fn new() -> Self {
        Self {
            state: PluginState::Registered,
            registered_at: Instant::now(),
            activated_at: None,
            error_count: 0,
            last_error: None,
        }
    }

    /// Record a successful activation
    pub fn record_activation(&mut self) {
        self.activated_at = Some(Instant::now());
        self.transition(PluginState::Active);
    }

    /// Record a failed activation
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.error_count += 1;
        self.last_error = Some(error.into());
        self.transition(PluginState::Failed);
    }

    /// Transition to a new state
    pub fn transition(&mut self, new_state: PluginState) {
        tracing::debug!(
            from = %self.state,
            to = %new_state,
            "Plugin state transition"
        );
        self.state = new_state;
    }

    /// Time since activation, if the plugin is active
    pub fn uptime(&self) -> Option<Duration> {
        self.activated_at.map(|at| at.elapsed())
    }
}

impl Default for PluginEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_state_display() {
        assert_eq!(format!("{}", PluginState::Active), "active");
        assert_eq!(format!("{}", PluginState::Skipped), "skipped");
        assert_eq!(format!("{}", PluginState::Failed), "failed");
    }

    #[test]
    fn test_plugin_state_activation_rules() {
        assert!(PluginState::Registered.can_activate());
        assert!(PluginState::Failed.can_activate());
        assert!(!PluginState::Active.can_activate());
        assert!(!PluginState::Skipped.can_activate());
    }

    #[test]
    fn test_plugin_entry() {
        let mut entry = PluginEntry::new();
        assert_eq!(entry.state, PluginState::Registered);
        assert!(entry.uptime().is_none());

        entry.record_error("boom");
        assert_eq!(entry.state, PluginState::Failed);
        assert_eq!(entry.error_count, 1);
        assert!(entry.last_error.as_ref().unwrap().contains("boom"));

        entry.record_activation();
        assert!(entry.state.is_active());
        assert!(entry.uptime().is_some());
    }
}
