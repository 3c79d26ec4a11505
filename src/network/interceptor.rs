//! Header Interception Layer
//!
//! A web session exposes a single handler slot per network event. The
//! [`WebRequestInterceptor`] owns that slot and fans each event out to any
//! number of listeners, merging their patches into one response.
//!
//! # Resolution
//!
//! ```text
//! original headers ──▶ L1 ──▶ L2 ──▶ ... ──▶ Ln ──▶ ResolvedResponse
//!                      │      │
//!                      └──────┴── each sees the headers accumulated so far
//! ```
//!
//! Listeners run one after another in registration order. A later listener
//! wins when two set the same header. Once a listener cancels, the remaining
//! listeners are not consulted.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::session::{ComposedHandler, WebSession};
use super::types::{
    InterceptError, ListenerError, RequestDetails, ResolvedResponse, ResponsePatch, WebRequestEvent,
};
use crate::config::NetworkConfig;
use crate::plugin::isolation::call_plugin_safely_async;

/// Boxed listener as stored by the interceptor
pub type ListenerFn = Arc<
    dyn Fn(RequestDetails) -> BoxFuture<'static, Result<ResponsePatch, ListenerError>>
        + Send
        + Sync,
>;

/// Identifies a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    pub event: WebRequestEvent,
    /// Position in the event's listener list (0-based)
    pub position: usize,
    /// Interceptor-wide registration sequence number
    pub seq: u64,
}

/// What to do when a listener errors, panics or times out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerFailurePolicy {
    /// Drop the failing listener's contribution and keep merging
    #[default]
    Isolate,
    /// Stop merging; the original response is delivered unmodified
    Abort,
}

#[derive(Debug, Clone)]
pub struct InterceptorOptions {
    /// Upper bound for a single listener; `None` waits indefinitely
    pub listener_timeout: Option<Duration>,
    pub failure_policy: ListenerFailurePolicy,
}

impl Default for InterceptorOptions {
    fn default() -> Self {
        Self {
            listener_timeout: Some(Duration::from_millis(
                NetworkConfig::DEFAULT_LISTENER_TIMEOUT_MS,
            )),
            failure_policy: ListenerFailurePolicy::default(),
        }
    }
}

impl InterceptorOptions {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            listener_timeout: (config.listener_timeout_ms > 0)
                .then(|| Duration::from_millis(config.listener_timeout_ms)),
            failure_policy: config.listener_failure_policy,
        }
    }
}

struct RegisteredListener {
    id: ListenerId,
    name: String,
    handler: ListenerFn,
}

/// Composes many header listeners behind a session's single handler slot
pub struct WebRequestInterceptor {
    listeners: RwLock<HashMap<WebRequestEvent, Vec<Arc<RegisteredListener>>>>,
    /// Partitions of sessions already hooked
    installed: DashSet<String>,
    next_seq: AtomicU64,
    options: InterceptorOptions,
}

impl WebRequestInterceptor {
    pub fn new(options: InterceptorOptions) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            installed: DashSet::new(),
            next_seq: AtomicU64::new(0),
            options,
        }
    }

    pub fn options(&self) -> &InterceptorOptions {
        &self.options
    }

    /// Hook the interceptor into `session`.
    ///
    /// Returns `false` when the session's partition was already hooked; the
    /// session's handlers are left as they are in that case.
    pub fn install(self: &Arc<Self>, session: &dyn WebSession) -> bool {
        let partition = session.partition().to_string();
        if !self.installed.insert(partition.clone()) {
            tracing::debug!(partition = %partition, "Interceptor already installed");
            return false;
        }

        for event in WebRequestEvent::ALL {
            let interceptor = Arc::clone(self);
            let handler: ComposedHandler = Arc::new(move |details: RequestDetails| {
                let interceptor = Arc::clone(&interceptor);
                async move { interceptor.handle(event, details).await }.boxed()
            });
            session.set_handler(event, handler);
        }

        tracing::info!(partition = %partition, "Installed web request interceptor");
        true
    }

    /// Whether a session partition has been hooked
    pub fn is_installed(&self, partition: &str) -> bool {
        self.installed.contains(partition)
    }

    /// Append a listener for `event`.
    ///
    /// Listeners registered before or after [`install`](Self::install) are
    /// all consulted; registration order decides ties.
    pub fn register<F, Fut>(
        &self,
        event: WebRequestEvent,
        name: impl Into<String>,
        listener: F,
    ) -> ListenerId
    where
        F: Fn(RequestDetails) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponsePatch, ListenerError>> + Send + 'static,
    {
        let handler: ListenerFn = Arc::new(move |details| listener(details).boxed());
        let name = name.into();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let mut listeners = self.listeners.write();
        let list = listeners.entry(event).or_default();
        let id = ListenerId {
            event,
            position: list.len(),
            seq,
        };
        tracing::debug!(
            event = %event,
            listener = %name,
            position = id.position,
            "Registered header listener"
        );
        list.push(Arc::new(RegisteredListener { id, name, handler }));
        id
    }

    pub fn listener_count(&self, event: WebRequestEvent) -> usize {
        self.listeners.read().get(&event).map_or(0, Vec::len)
    }

    /// Names of the listeners for `event`, in resolution order
    pub fn listener_names(&self, event: WebRequestEvent) -> Vec<String> {
        self.listeners
            .read()
            .get(&event)
            .map(|list| list.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Run every listener for `event` and merge their patches.
    ///
    /// With [`ListenerFailurePolicy::Abort`] the first failing listener ends
    /// resolution with an error. With `Isolate` it is logged and skipped.
    pub async fn resolve(
        &self,
        event: WebRequestEvent,
        details: RequestDetails,
    ) -> Result<ResolvedResponse, InterceptError> {
        // Clone the list so no lock is held across listener awaits
        let listeners: Vec<Arc<RegisteredListener>> =
            self.listeners.read().get(&event).cloned().unwrap_or_default();

        let mut resolved = ResolvedResponse::passthrough(&details);

        for listener in listeners {
            let mut current = details.clone();
            current.response_headers = resolved.response_headers.clone();

            match self.invoke(event, &listener, current).await {
                Ok(patch) if event.accepts_headers() => resolved.apply(patch),
                Ok(patch) => resolved.apply(patch.without_headers()),
                Err(e) => match self.options.failure_policy {
                    ListenerFailurePolicy::Isolate => {
                        tracing::warn!(
                            event = %event,
                            listener = %listener.name,
                            position = listener.id.position,
                            request_id = details.id,
                            error = %e,
                            "Dropping contribution of failed header listener"
                        );
                    }
                    ListenerFailurePolicy::Abort => return Err(e),
                },
            }

            if resolved.cancel {
                tracing::debug!(
                    event = %event,
                    listener = %listener.name,
                    url = %details.url,
                    "Request cancelled"
                );
                break;
            }
        }

        Ok(resolved)
    }

    async fn invoke(
        &self,
        event: WebRequestEvent,
        listener: &RegisteredListener,
        details: RequestDetails,
    ) -> Result<ResponsePatch, InterceptError> {
        let handler = Arc::clone(&listener.handler);
        let call = call_plugin_safely_async(AssertUnwindSafe(move || handler(details)));

        let outcome = match self.options.listener_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                InterceptError::ListenerTimedOut {
                    event,
                    listener: listener.name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => call.await,
        };

        outcome.map_err(|e| InterceptError::ListenerFailed {
            event,
            listener: listener.name.clone(),
            reason: e.to_string(),
        })
    }

    /// Entry point of the composed session handler; never fails
    async fn handle(&self, event: WebRequestEvent, details: RequestDetails) -> ResolvedResponse {
        let original = ResolvedResponse::passthrough(&details);
        match self.resolve(event, details).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(
                    event = %event,
                    error = %e,
                    "Header resolution aborted, delivering original response"
                );
                original
            }
        }
    }
}

impl Default for WebRequestInterceptor {
    fn default() -> Self {
        Self::new(InterceptorOptions::default())
    }
}

/// Interceptors keyed by session partition.
///
/// A session has a single handler slot per event, so every window sharing a
/// session must register its listeners with the same interceptor.
#[derive(Default)]
pub struct SessionInterceptors {
    by_partition: DashMap<String, Arc<WebRequestInterceptor>>,
}

impl SessionInterceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interceptor hooked into `session`.
    ///
    /// The first call for a partition builds an interceptor from `options`
    /// and installs it; the returned flag is `true` only then. Later calls
    /// return the same interceptor and ignore `options`.
    pub fn get_or_install(
        &self,
        session: &dyn WebSession,
        options: InterceptorOptions,
    ) -> (Arc<WebRequestInterceptor>, bool) {
        match self.by_partition.entry(session.partition().to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!(
                    partition = %session.partition(),
                    "Reusing web request interceptor for session"
                );
                (Arc::clone(entry.get()), false)
            }
            Entry::Vacant(entry) => {
                let interceptor = Arc::new(WebRequestInterceptor::new(options));
                interceptor.install(session);
                entry.insert(Arc::clone(&interceptor));
                (interceptor, true)
            }
        }
    }

    pub fn get(&self, partition: &str) -> Option<Arc<WebRequestInterceptor>> {
        self.by_partition
            .get(partition)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.by_partition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_partition.is_empty()
    }
}

static SESSION_INTERCEPTORS: OnceLock<SessionInterceptors> = OnceLock::new();

/// Process-wide interceptors, one per session partition
pub fn session_interceptors() -> &'static SessionInterceptors {
    SESSION_INTERCEPTORS.get_or_init(SessionInterceptors::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{HeadlessSession, headers_from_pairs};
    use http::HeaderValue;
    use http::header::HeaderName;

    fn set(name: &'static str, value: &'static str) -> ResponsePatch {
        ResponsePatch::pass()
            .set_header(HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    #[test]
    fn test_options_from_config() {
        let config = NetworkConfig {
            listener_timeout_ms: 0,
            listener_failure_policy: ListenerFailurePolicy::Abort,
        };
        let options = InterceptorOptions::from_config(&config);
        assert!(options.listener_timeout.is_none());
        assert_eq!(options.failure_policy, ListenerFailurePolicy::Abort);
    }

    #[test]
    fn test_session_interceptors_share_per_partition() {
        let interceptors = SessionInterceptors::new();
        let session = HeadlessSession::new("persist:main");

        let (first, created) =
            interceptors.get_or_install(&session, InterceptorOptions::default());
        assert!(created);
        let (second, created) = interceptors.get_or_install(
            &session,
            InterceptorOptions {
                listener_timeout: None,
                failure_policy: ListenerFailurePolicy::Abort,
            },
        );
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        // options of the first install stay in effect
        assert_eq!(second.options().failure_policy, ListenerFailurePolicy::Isolate);
        assert_eq!(session.handler_installs(), WebRequestEvent::ALL.len());

        let other = HeadlessSession::new("persist:other");
        let (third, created) =
            interceptors.get_or_install(&other, InterceptorOptions::default());
        assert!(created);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(interceptors.len(), 2);
        assert!(interceptors.get("persist:main").is_some());
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        let policy: ListenerFailurePolicy = serde_json::from_str("\"abort\"").unwrap();
        assert_eq!(policy, ListenerFailurePolicy::Abort);
    }

    #[test]
    fn test_register_positions_per_event() {
        let interceptor = WebRequestInterceptor::default();
        let a = interceptor.register(WebRequestEvent::HeadersReceived, "a", |_| async {
            Ok(ResponsePatch::pass())
        });
        let b = interceptor.register(WebRequestEvent::BeforeRequest, "b", |_| async {
            Ok(ResponsePatch::pass())
        });
        let c = interceptor.register(WebRequestEvent::HeadersReceived, "c", |_| async {
            Ok(ResponsePatch::pass())
        });

        assert_eq!((a.position, b.position, c.position), (0, 0, 1));
        assert!(a.seq < b.seq && b.seq < c.seq);
        assert_eq!(
            interceptor.listener_names(WebRequestEvent::HeadersReceived),
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_resolve_without_listeners_is_passthrough() {
        let interceptor = WebRequestInterceptor::default();
        let details = RequestDetails::new("https://a")
            .with_response_headers(headers_from_pairs([("x-a", "1")]).unwrap());
        let resolved = interceptor
            .resolve(WebRequestEvent::HeadersReceived, details.clone())
            .await
            .unwrap();
        assert_eq!(resolved, ResolvedResponse::passthrough(&details));
    }

    #[tokio::test]
    async fn test_before_request_ignores_headers() {
        let interceptor = WebRequestInterceptor::default();
        interceptor.register(WebRequestEvent::BeforeRequest, "setter", |_| async {
            Ok(set("x-added", "1"))
        });

        let resolved = interceptor
            .resolve(WebRequestEvent::BeforeRequest, RequestDetails::new("https://a"))
            .await
            .unwrap();
        assert!(resolved.response_headers.is_empty());
        assert!(!resolved.cancel);
    }

    #[tokio::test]
    async fn test_listener_sees_accumulated_headers() {
        let interceptor = WebRequestInterceptor::default();
        interceptor.register(WebRequestEvent::HeadersReceived, "first", |_| async {
            Ok(set("x-stage", "one"))
        });
        interceptor.register(
            WebRequestEvent::HeadersReceived,
            "second",
            |details: RequestDetails| async move {
                let seen = details
                    .response_headers
                    .get("x-stage")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("none")
                    .to_string();
                let value = HeaderValue::from_str(&seen)
                    .map_err(|e| ListenerError::failed(e.to_string()));
                value.map(|value| {
                    ResponsePatch::pass().set_header(HeaderName::from_static("x-seen"), value)
                })
            },
        );

        let resolved = interceptor
            .resolve(WebRequestEvent::HeadersReceived, RequestDetails::new("https://a"))
            .await
            .unwrap();
        assert_eq!(resolved.response_headers["x-seen"], "one");
    }

    #[tokio::test]
    async fn test_timeout_is_isolated() {
        let interceptor = WebRequestInterceptor::new(InterceptorOptions {
            listener_timeout: Some(Duration::from_millis(20)),
            failure_policy: ListenerFailurePolicy::Isolate,
        });
        interceptor.register(WebRequestEvent::HeadersReceived, "slow", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(set("x-slow", "1"))
        });
        interceptor.register(WebRequestEvent::HeadersReceived, "fast", |_| async {
            Ok(set("x-fast", "1"))
        });

        let resolved = interceptor
            .resolve(WebRequestEvent::HeadersReceived, RequestDetails::new("https://a"))
            .await
            .unwrap();
        assert!(resolved.response_headers.get("x-slow").is_none());
        assert_eq!(resolved.response_headers["x-fast"], "1");
    }

    #[tokio::test]
    async fn test_timeout_aborts_under_abort_policy() {
        let interceptor = WebRequestInterceptor::new(InterceptorOptions {
            listener_timeout: Some(Duration::from_millis(20)),
            failure_policy: ListenerFailurePolicy::Abort,
        });
        interceptor.register(WebRequestEvent::HeadersReceived, "slow", |_| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ResponsePatch::pass())
        });

        let result = interceptor
            .resolve(WebRequestEvent::HeadersReceived, RequestDetails::new("https://a"))
            .await;
        assert!(matches!(
            result,
            Err(InterceptError::ListenerTimedOut { timeout_ms: 20, .. })
        ));
    }
}
