//! In-memory [`ShellWindow`] used by the CLI and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{LoadFinishedFn, ShellWindow, WindowError};

/// Window without a page.
///
/// Scripts resolve to canned results set with
/// [`set_script_result`](HeadlessWindow::set_script_result); unknown scripts
/// evaluate to `null`. Everything sent to the window is recorded.
#[derive(Default)]
pub struct HeadlessWindow {
    script_results: Mutex<HashMap<String, Result<Value, WindowError>>>,
    sent: Mutex<Vec<(String, String)>>,
    stylesheets: Mutex<Vec<String>>,
    title: Mutex<String>,
    notifications: Mutex<Vec<(String, String)>>,
    dev_tools_opened: Mutex<bool>,
    load_callbacks: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
    closed: Mutex<bool>,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script_result(self, script: &str, result: Value) -> Self {
        self.set_script_result(script, result);
        self
    }

    pub fn set_script_result(&self, script: &str, result: Value) {
        self.script_results.lock().insert(script.to_string(), Ok(result));
    }

    /// Make evaluation of `script` fail
    pub fn set_script_error(&self, script: &str, message: &str) {
        self.script_results
            .lock()
            .insert(script.to_string(), Err(WindowError::Script(message.to_string())));
    }

    /// Messages sent to the page as `(channel, payload)`
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn stylesheets(&self) -> Vec<String> {
        self.stylesheets.lock().clone()
    }

    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    /// Notifications shown as `(title, body)`
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().clone()
    }

    pub fn dev_tools_opened(&self) -> bool {
        *self.dev_tools_opened.lock()
    }

    /// Simulate the page finishing a load.
    ///
    /// Callbacks run without the callback list locked, so they may register
    /// further callbacks; those run from the next load on.
    pub fn finish_load(&self) {
        let callbacks = self.load_callbacks.lock().clone();
        for callback in callbacks {
            callback();
        }
    }

    /// Further sends and script evaluations fail with [`WindowError::Closed`]
    pub fn close(&self) {
        *self.closed.lock() = true;
    }

    fn ensure_open(&self) -> Result<(), WindowError> {
        if *self.closed.lock() {
            return Err(WindowError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl ShellWindow for HeadlessWindow {
    async fn execute_script(&self, script: &str) -> Result<Value, WindowError> {
        self.ensure_open()?;
        self.script_results
            .lock()
            .get(script)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }

    fn send(&self, channel: &str, payload: String) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.sent.lock().push((channel.to_string(), payload));
        Ok(())
    }

    async fn insert_css(&self, css: &str) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.stylesheets.lock().push(css.to_string());
        Ok(())
    }

    fn set_title(&self, title: &str) {
        *self.title.lock() = title.to_string();
    }

    fn notify(&self, title: &str, body: &str) {
        self.notifications
            .lock()
            .push((title.to_string(), body.to_string()));
    }

    fn open_dev_tools(&self) {
        *self.dev_tools_opened.lock() = true;
    }

    fn on_did_finish_load(&self, callback: LoadFinishedFn) {
        self.load_callbacks.lock().push(Arc::from(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_script_is_null() {
        let window = HeadlessWindow::new();
        assert_eq!(window.execute_script("1 + 1").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_canned_script_result() {
        let window = HeadlessWindow::new().with_script_result("document.title", "A - B".into());
        assert_eq!(window.execute_script("document.title").await.unwrap(), "A - B");
    }

    #[tokio::test]
    async fn test_closed_window_rejects_send() {
        let window = HeadlessWindow::new();
        window.close();
        assert!(matches!(window.send("x", String::new()), Err(WindowError::Closed)));
        assert!(window.execute_script("document.title").await.is_err());
    }

    #[test]
    fn test_finish_load_runs_callbacks() {
        let window = Arc::new(HeadlessWindow::new());
        let weak = Arc::downgrade(&window);
        window.on_did_finish_load(Box::new(move || {
            if let Some(window) = weak.upgrade() {
                window.open_dev_tools();
            }
        }));
        assert!(!window.dev_tools_opened());
        window.finish_load();
        assert!(window.dev_tools_opened());
    }

    #[test]
    fn test_callback_may_register_another_callback() {
        let window = Arc::new(HeadlessWindow::new());
        let weak = Arc::downgrade(&window);
        window.on_did_finish_load(Box::new(move || {
            let Some(window) = weak.upgrade() else {
                return;
            };
            let inner = Arc::downgrade(&window);
            window.on_did_finish_load(Box::new(move || {
                if let Some(window) = inner.upgrade() {
                    window.open_dev_tools();
                }
            }));
        }));

        window.finish_load();
        assert!(!window.dev_tools_opened());
        window.finish_load();
        assert!(window.dev_tools_opened());
    }
}
