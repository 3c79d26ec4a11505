//! Built-in Plugin Registrations
//!
//! Registers the plugins that ship with the shell using the `inventory`
//! crate.
//!
//! # Plugins
//!
//! ## With backend (3)
//! - adblocker, notifications, window-title
//!
//! ## Front-end only (1)
//! - blur-nav-bar

pub mod adblocker;
pub mod notifications;
pub mod window_title;

use crate::plugin::metadata::PluginMetadata;

fn blur_nav_bar_metadata() -> PluginMetadata {
    PluginMetadata::frontend("blur-nav-bar", "Blur navigation bar")
        .with_description("Makes the navigation bar translucent (page-side only)")
}

crate::register_frontend_plugin!("blur-nav-bar", blur_nav_bar_metadata);
