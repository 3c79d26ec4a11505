//! Plugin Isolation and Panic Safety
//!
//! Plugin activation functions, header listeners and song-info observers are
//! all third-party code running inside the shell process. Every call into them
//! goes through one of the helpers here so that a panic is caught and turned
//! into a [`PluginError`] instead of tearing down the window.
//!
//! # Safety Considerations
//!
//! - `catch_unwind` only catches panics, not aborts
//! - The shell must be built with `panic = "unwind"` (the default) for
//!   isolation to take effect

use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, UnwindSafe, catch_unwind};

use futures::FutureExt;

/// Plugin-specific error type
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin panicked during execution
    #[error("Plugin panicked: {0}")]
    Panic(String),

    /// Plugin activation returned an error
    #[error("Plugin activation failed: {0}")]
    ActivationFailed(String),

    /// Options blob could not be interpreted by the plugin
    #[error("Invalid plugin options: {0}")]
    InvalidOptions(String),

    /// Plugin internal error
    #[error("Plugin internal error: {0}")]
    InternalError(String),
}

/// Call a plugin function, preserving its own error type
///
/// Panics are caught and converted with `panic_to_error`; regular errors are
/// passed through untouched.
///
/// # Example
///
/// ```ignore
/// let result = call_plugin_preserving_error(
///     AssertUnwindSafe(|| activate(&host, &options)),
///     PluginError::Panic,
/// );
/// ```
pub fn call_plugin_preserving_error<F, T, E, PC>(plugin_fn: F, panic_to_error: PC) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + UnwindSafe,
    PC: FnOnce(String) -> E,
{
    match catch_unwind(plugin_fn) {
        Ok(result) => result,
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked");
            Err(panic_to_error(msg))
        }
    }
}

/// Call a plugin function that returns a value directly (no Result)
///
/// Used for song-info observers, which have no error channel.
pub fn call_plugin_safely_value<F, T>(plugin_fn: F) -> Result<T, PluginError>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match catch_unwind(plugin_fn) {
        Ok(result) => Ok(result),
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked");
            Err(PluginError::Panic(msg))
        }
    }
}

/// Call an async plugin function with panic catching
///
/// Panics are caught both while the future is created and while it is
/// polled. Errors returned by the future are stringified into
/// [`PluginError::InternalError`].
///
/// # Example
///
/// ```ignore
/// let patch = call_plugin_safely_async(AssertUnwindSafe(move || listener(details))).await?;
/// ```
///
/// # Note
///
/// Panics inside tasks spawned by the plugin are not caught here.
pub async fn call_plugin_safely_async<F, Fut, T, E>(plugin_fn: F) -> Result<T, PluginError>
where
    F: FnOnce() -> Fut + UnwindSafe,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let future = match catch_unwind(plugin_fn) {
        Ok(fut) => fut,
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked during future creation");
            return Err(PluginError::Panic(msg));
        }
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(PluginError::InternalError(e.to_string())),
        Err(panic_info) => {
            let msg = extract_panic_message(&panic_info);
            tracing::error!(message = %msg, "Plugin panicked during async execution");
            Err(PluginError::Panic(msg))
        }
    }
}

/// Extract a human-readable message from a panic payload
fn extract_panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic (non-string payload)".to_string()
    }
}
