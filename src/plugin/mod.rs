//! Plugin System for the Tunedeck shell
//!
//! Plugins are self-contained feature modules. Each one may ship a backend
//! entry point (run once per window by the [`PluginLoader`]) and a page-side
//! component that the shell does not manage.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Plugin Registration                        │
//! │  inventory crate ──▶ global_registry() ──▶ DashMap by id      │
//! └──────────────────────────────────────────────────────────────┘
//!                ShellConfig.plugins (enabled, in order)
//!                               │
//!                               ▼
//!          PluginLoader::load_all(host) ──▶ activate(host, options)
//! ```
//!
//! A backend receives a [`PluginHost`] and may register header interception
//! listeners or song-info observers. It never calls back into the loader.
//!
//! # Registering a Built-in Plugin
//!
//! ```ignore
//! use tunedeck::plugin::prelude::*;
//!
//! fn metadata() -> PluginMetadata {
//!     PluginMetadata::new("hello", "Hello")
//! }
//!
//! fn activate(host: &PluginHost, _options: &Value) -> Result<(), PluginError> {
//!     host.window().set_title("hello");
//!     Ok(())
//! }
//!
//! tunedeck::register_plugin!("hello", metadata, activate);
//! ```

pub mod builtin;
pub mod host;
pub mod isolation;
pub mod lifecycle;
pub mod loader;
#[macro_use]
pub mod macros;
pub mod metadata;
pub mod registry;

// Re-exports for convenience
pub use host::{PluginHost, parse_options};
pub use isolation::{PluginError, call_plugin_safely_async, call_plugin_safely_value};
pub use lifecycle::{PluginEntry, PluginState};
pub use loader::{LoadReport, LoaderOptions, PluginLoader, SHARED_STYLESHEET};
pub use metadata::{PluginKind, PluginMetadata};
pub use registry::{PluginRegistry, global_registry, init_registry};

/// Prelude module for convenient imports
///
/// Use this for plugin development:
/// ```ignore
/// use tunedeck::plugin::prelude::*;
/// ```
pub mod prelude {
    pub use super::host::{PluginHost, parse_options};
    pub use super::isolation::PluginError;
    pub use super::metadata::{PluginKind, PluginMetadata};
    pub use super::registry::{ActivateFn, PluginConstructor, PluginRegistry, global_registry};

    // Re-export commonly needed external crates
    pub use inventory;
    pub use serde_json::Value;
    pub use std::sync::Arc;

    // Types plugins register against
    pub use crate::network::{RequestDetails, ResponsePatch, WebRequestEvent};
    pub use crate::song_info::PlaybackSnapshot;
    pub use crate::window::ShellWindow;
}
