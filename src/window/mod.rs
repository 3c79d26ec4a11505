//! Browser window abstraction.
//!
//! Window creation, geometry and menus belong to the embedding application.
//! The shell core only talks to a window through [`ShellWindow`].

pub mod headless;

use async_trait::async_trait;
use serde_json::Value;

pub use headless::HeadlessWindow;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WindowError {
    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Window is closed")]
    Closed,

    #[error("Stylesheet injection failed: {0}")]
    Stylesheet(String),
}

/// Callback run when the page finishes loading
pub type LoadFinishedFn = Box<dyn Fn() + Send + Sync>;

/// The browser surface hosting the music player page
#[async_trait]
pub trait ShellWindow: Send + Sync {
    /// Evaluate `script` in the page and return its JSON-converted result
    async fn execute_script(&self, script: &str) -> Result<Value, WindowError>;

    /// Send `payload` to the page on the inter-process `channel`
    fn send(&self, channel: &str, payload: String) -> Result<(), WindowError>;

    /// Inject a stylesheet into the page
    async fn insert_css(&self, css: &str) -> Result<(), WindowError>;

    fn set_title(&self, title: &str);

    /// Show a desktop notification
    fn notify(&self, title: &str, body: &str);

    fn open_dev_tools(&self);

    /// Register `callback` for every did-finish-load of the page
    fn on_did_finish_load(&self, callback: LoadFinishedFn);
}
