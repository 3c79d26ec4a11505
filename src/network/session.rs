//! Browser session abstraction.
//!
//! The embedding web view owns the real session. The shell only needs its
//! partition name and the single handler slot per network event.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::types::{RequestDetails, ResolvedResponse, WebRequestEvent};

/// Handler occupying a session's slot for one event
pub type ComposedHandler =
    Arc<dyn Fn(RequestDetails) -> BoxFuture<'static, ResolvedResponse> + Send + Sync>;

/// A browser session with one handler slot per [`WebRequestEvent`]
pub trait WebSession: Send + Sync {
    /// Partition name identifying the session (e.g. `persist:main`)
    fn partition(&self) -> &str;

    /// Replace the handler for `event`
    fn set_handler(&self, event: WebRequestEvent, handler: ComposedHandler);
}

/// In-memory session used by the CLI and tests.
///
/// Requests are fed in with [`dispatch`](HeadlessSession::dispatch).
pub struct HeadlessSession {
    partition: String,
    handlers: Mutex<HashMap<WebRequestEvent, ComposedHandler>>,
    installs: Mutex<usize>,
}

impl HeadlessSession {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            handlers: Mutex::new(HashMap::new()),
            installs: Mutex::new(0),
        }
    }

    pub fn has_handler(&self, event: WebRequestEvent) -> bool {
        self.handlers.lock().contains_key(&event)
    }

    /// How many times any handler slot was written
    pub fn handler_installs(&self) -> usize {
        *self.installs.lock()
    }

    /// Deliver a network event to the installed handler.
    ///
    /// Returns `None` when nothing is installed for `event`.
    pub async fn dispatch(
        &self,
        event: WebRequestEvent,
        details: RequestDetails,
    ) -> Option<ResolvedResponse> {
        let handler = self.handlers.lock().get(&event).cloned()?;
        Some(handler(details).await)
    }
}

impl WebSession for HeadlessSession {
    fn partition(&self) -> &str {
        &self.partition
    }

    fn set_handler(&self, event: WebRequestEvent, handler: ComposedHandler) {
        self.handlers.lock().insert(event, handler);
        *self.installs.lock() += 1;
    }
}
