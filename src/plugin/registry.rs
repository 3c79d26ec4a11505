//! Plugin Registry
//!
//! Central mapping from plugin id to its activation function. Built-in plugins
//! are registered at compile time using the `inventory` crate; embedders and
//! tests can add more at runtime with [`PluginRegistry::register`].
//!
//! Plugin ids are matched case-insensitively.
//!
//! # Usage
//!
//! ```ignore
//! use tunedeck::plugin::global_registry;
//!
//! if let Some(result) = global_registry().activate("adblocker", &host, &options) {
//!     result?;
//! }
//! ```

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use super::host::PluginHost;
use super::isolation::{PluginError, call_plugin_preserving_error};
use super::metadata::PluginMetadata;

/// Activation function type for plugin backends
pub type ActivateFn =
    Arc<dyn Fn(&PluginHost, &Value) -> Result<(), PluginError> + Send + Sync>;

/// Activation function pointer type (non-Arc version for PluginConstructor)
pub type ActivatePtr = fn(&PluginHost, &Value) -> Result<(), PluginError>;

/// Metadata function type for deferred metadata creation
pub type MetadataFn = fn() -> PluginMetadata;

/// Plugin constructor for inventory-based registration
///
/// Uses function pointers to defer non-const operations (metadata creation)
/// until runtime, making it compatible with `inventory::submit!`.
pub struct PluginConstructor {
    /// Plugin ID for lookup
    pub plugin_id: &'static str,

    /// Metadata function (deferred creation for const compatibility)
    pub metadata_fn: MetadataFn,

    /// Backend entry point; `None` for front-end-only plugins
    pub activate: Option<ActivatePtr>,

    /// Aliases for this plugin
    pub aliases: &'static [&'static str],
}

impl PluginConstructor {
    /// Constructor for a plugin with a backend entry point
    pub const fn backend(
        plugin_id: &'static str,
        metadata_fn: MetadataFn,
        activate: ActivatePtr,
    ) -> Self {
        Self {
            plugin_id,
            metadata_fn,
            activate: Some(activate),
            aliases: &[],
        }
    }

    /// Constructor for a plugin that ships only a page-side component
    pub const fn frontend_only(plugin_id: &'static str, metadata_fn: MetadataFn) -> Self {
        Self {
            plugin_id,
            metadata_fn,
            activate: None,
            aliases: &[],
        }
    }

    /// Add aliases for this plugin
    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Get the metadata (calls the deferred function)
    pub fn metadata(&self) -> PluginMetadata {
        (self.metadata_fn)()
    }
}

// Collect all registered plugins at link time
inventory::collect!(PluginConstructor);

struct RegisteredPlugin {
    activate: Option<ActivateFn>,
    metadata: PluginMetadata,
}

/// Central plugin registry
pub struct PluginRegistry {
    /// Plugins indexed by lowercase id and alias
    plugins: DashMap<String, RegisteredPlugin>,

    /// Canonical ids in registration order (excluding aliases)
    plugin_ids: RwLock<Vec<String>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            plugins: DashMap::new(),
            plugin_ids: RwLock::new(Vec::new()),
        }
    }

    /// Register a plugin under `plugin_id`
    ///
    /// Registering an id twice replaces the earlier entry.
    pub fn register(
        &self,
        plugin_id: &str,
        activate: Option<ActivateFn>,
        metadata: PluginMetadata,
    ) {
        let id = normalize_id(plugin_id);
        let has_backend = activate.is_some();

        self.plugins.insert(
            id.clone(),
            RegisteredPlugin {
                activate,
                metadata,
            },
        );

        {
            let mut ids = self.plugin_ids.write();
            if !ids.contains(&id) {
                ids.push(id.clone());
            }
        }

        tracing::debug!(plugin_id = %id, has_backend, "Registered plugin");
    }

    /// Register a plugin backend from a closure
    pub fn register_backend<F>(&self, plugin_id: &str, metadata: PluginMetadata, activate: F)
    where
        F: Fn(&PluginHost, &Value) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.register(plugin_id, Some(Arc::new(activate)), metadata);
    }

    /// Register an alias pointing at an existing plugin
    fn register_alias(&self, alias: &str, plugin_id: &str) {
        let Some(entry) = self.plugins.get(&normalize_id(plugin_id)) else {
            return;
        };
        let alias_entry = RegisteredPlugin {
            activate: entry.activate.clone(),
            metadata: entry.metadata.clone(),
        };
        drop(entry);
        self.plugins.insert(normalize_id(alias), alias_entry);
    }

    /// Activate a plugin backend
    ///
    /// Returns `None` when the plugin is unknown or ships no backend. The
    /// activation itself runs under panic isolation.
    pub fn activate(
        &self,
        plugin_id: &str,
        host: &PluginHost,
        options: &Value,
    ) -> Option<Result<(), PluginError>> {
        let id = normalize_id(plugin_id);

        let activate = self.plugins.get(&id)?.activate.clone()?;
        // Lock released before calling into plugin code

        Some(call_plugin_preserving_error(
            AssertUnwindSafe(|| activate(host, options)),
            PluginError::Panic,
        ))
    }

    /// Check if a plugin is registered (with or without backend)
    pub fn has_plugin(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(&normalize_id(plugin_id))
    }

    /// Check if a plugin has a backend entry point
    pub fn has_backend(&self, plugin_id: &str) -> bool {
        self.plugins
            .get(&normalize_id(plugin_id))
            .is_some_and(|entry| entry.activate.is_some())
    }

    /// Get plugin metadata by id or alias
    pub fn metadata(&self, plugin_id: &str) -> Option<PluginMetadata> {
        self.plugins
            .get(&normalize_id(plugin_id))
            .map(|entry| entry.metadata.clone())
    }

    /// All canonical plugin ids in registration order
    pub fn plugin_ids(&self) -> Vec<String> {
        self.plugin_ids.read().clone()
    }

    /// Number of registered plugins (excluding aliases)
    pub fn plugin_count(&self) -> usize {
        self.plugin_ids.read().len()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of a plugin id: surrounding whitespace dropped, lowercased
pub fn normalize_id(plugin_id: &str) -> String {
    plugin_id.trim().to_lowercase()
}

/// Global registry instance
static GLOBAL_REGISTRY: OnceLock<PluginRegistry> = OnceLock::new();

/// Get the global plugin registry
///
/// The registry is lazily initialized on first access and populated
/// with all plugins registered via `inventory::submit!`.
pub fn global_registry() -> &'static PluginRegistry {
    GLOBAL_REGISTRY.get_or_init(|| {
        let registry = PluginRegistry::new();

        for constructor in inventory::iter::<PluginConstructor> {
            let activate = constructor
                .activate
                .map(|activate| -> ActivateFn { Arc::new(activate) });

            registry.register(constructor.plugin_id, activate, constructor.metadata());

            for alias in constructor.aliases {
                registry.register_alias(alias, constructor.plugin_id);
            }
        }

        tracing::info!(
            plugin_count = registry.plugin_count(),
            "Plugin registry initialized"
        );

        registry
    })
}

/// Initialize the global registry
///
/// Forces registration of all built-in plugins. Call during startup so the
/// first window does not pay for it.
pub fn init_registry() {
    let _ = global_registry();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::plugin::host::PluginHost;

    #[test]
    fn test_registry_new() {
        let registry = PluginRegistry::new();
        assert_eq!(registry.plugin_count(), 0);
        assert!(registry.plugin_ids().is_empty());
    }

    #[test]
    fn test_registry_register_case_insensitive() {
        let registry = PluginRegistry::new();
        registry.register_backend("My-Plugin", PluginMetadata::new("my-plugin", "Mine"), |_, _| {
            Ok(())
        });

        assert!(registry.has_plugin("my-plugin"));
        assert!(registry.has_plugin("MY-PLUGIN"));
        assert!(registry.has_backend("my-plugin"));
        assert!(!registry.has_plugin("unknown"));
        assert_eq!(registry.plugin_ids(), vec!["my-plugin".to_string()]);
    }

    #[test]
    fn test_registry_ignores_surrounding_whitespace() {
        let registry = PluginRegistry::new();
        registry.register_backend(" Padded ", PluginMetadata::new("padded", "Padded"), |_, _| {
            Ok(())
        });

        assert!(registry.has_backend("padded"));
        assert!(registry.has_backend("  PADDED\t"));
        assert_eq!(registry.plugin_ids(), vec!["padded".to_string()]);
    }

    #[test]
    fn test_registry_frontend_only_has_no_backend() {
        let registry = PluginRegistry::new();
        registry.register("front", None, PluginMetadata::frontend("front", "Front"));

        assert!(registry.has_plugin("front"));
        assert!(!registry.has_backend("front"));
    }

    #[test]
    fn test_registry_reregister_keeps_single_id() {
        let registry = PluginRegistry::new();
        registry.register("dup", None, PluginMetadata::frontend("dup", "First"));
        registry.register_backend("dup", PluginMetadata::new("dup", "Second"), |_, _| Ok(()));

        assert_eq!(registry.plugin_count(), 1);
        assert_eq!(registry.metadata("dup").unwrap().display_name, "Second");
        assert!(registry.has_backend("dup"));
    }

    #[tokio::test]
    async fn test_registry_activate_unknown_returns_none() {
        let registry = PluginRegistry::new();
        let host = PluginHost::headless();
        assert!(registry.activate("ghost", &host, &Value::Null).is_none());
    }

    #[tokio::test]
    async fn test_registry_activate_passes_options() {
        let registry = PluginRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_plugin = seen.clone();
        registry.register_backend(
            "counter",
            PluginMetadata::new("counter", "Counter"),
            move |_host: &PluginHost, options: &Value| {
                let step = options["step"].as_u64().unwrap_or(1) as usize;
                seen_in_plugin.fetch_add(step, Ordering::SeqCst);
                Ok(())
            },
        );

        let host = PluginHost::headless();
        let result = registry.activate("counter", &host, &serde_json::json!({"step": 3}));
        assert!(matches!(result, Some(Ok(()))));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_registry_activate_isolates_panic() {
        let registry = PluginRegistry::new();
        registry.register_backend("bomb", PluginMetadata::new("bomb", "Bomb"), |_, _| {
            panic!("bomb went off")
        });

        let host = PluginHost::headless();
        match registry.activate("bomb", &host, &Value::Null) {
            Some(Err(PluginError::Panic(msg))) => assert!(msg.contains("bomb went off")),
            other => panic!("Expected panic error, got {other:?}"),
        }
    }

    #[test]
    fn test_global_registry_has_builtins() {
        let registry = global_registry();
        assert!(registry.has_backend("adblocker"));
        assert!(registry.has_backend("notifications"));
        assert!(registry.has_backend("window-title"));
        assert!(registry.has_plugin("blur-nav-bar"));
        assert!(!registry.has_backend("blur-nav-bar"));
        // alias
        assert!(registry.has_backend("adblock"));
    }
}
