//! Plugin Registration Macros
//!
//! Convenience wrappers around `inventory::submit!` for registering plugins
//! with the global registry at compile time.
//!
//! # Example
//!
//! ```ignore
//! use tunedeck::plugin::prelude::*;
//! use tunedeck::register_plugin;
//!
//! fn activate(host: &PluginHost, options: &Value) -> Result<(), PluginError> {
//!     host.window().set_title("hello");
//!     Ok(())
//! }
//!
//! fn metadata() -> PluginMetadata {
//!     PluginMetadata::new("hello", "Hello")
//! }
//!
//! register_plugin!("hello", metadata, activate);
//! ```

/// Register a plugin backend with the shell.
///
/// # Arguments
///
/// * `$id` - The plugin identifier as used in configuration
/// * `$metadata_fn` - Function that returns `PluginMetadata`
/// * `$activate_fn` - Entry point with signature
///   `fn(&PluginHost, &serde_json::Value) -> Result<(), PluginError>`
///
/// # Optional Arguments
///
/// * `aliases: [$alias1, $alias2, ...]` - Alternative ids for the plugin
#[macro_export]
macro_rules! register_plugin {
    ($id:expr, $metadata_fn:expr, $activate_fn:expr) => {
        ::inventory::submit! {
            $crate::plugin::registry::PluginConstructor::backend($id, $metadata_fn, $activate_fn)
        }
    };
    ($id:expr, $metadata_fn:expr, $activate_fn:expr, aliases: [$($alias:expr),* $(,)?]) => {
        ::inventory::submit! {
            $crate::plugin::registry::PluginConstructor::backend($id, $metadata_fn, $activate_fn)
                .with_aliases(&[$($alias),*])
        }
    };
}

/// Register a plugin that only ships a page-side component.
///
/// The loader skips such plugins without error.
#[macro_export]
macro_rules! register_frontend_plugin {
    ($id:expr, $metadata_fn:expr) => {
        ::inventory::submit! {
            $crate::plugin::registry::PluginConstructor::frontend_only($id, $metadata_fn)
        }
    };
}
