//! Request and response types exchanged with header interception listeners.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// Network interception events a listener can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebRequestEvent {
    /// Before the request leaves; listeners may only cancel
    BeforeRequest,
    /// Response headers arrived; listeners may cancel or rewrite headers
    HeadersReceived,
}

impl WebRequestEvent {
    pub const ALL: [WebRequestEvent; 2] = [Self::BeforeRequest, Self::HeadersReceived];

    /// Name of the event as the embedding web view calls it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeRequest => "onBeforeRequest",
            Self::HeadersReceived => "onHeadersReceived",
        }
    }

    /// Whether header patches returned for this event are honored
    pub fn accepts_headers(&self) -> bool {
        matches!(self, Self::HeadersReceived)
    }
}

impl fmt::Display for WebRequestEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Details of one network request as seen by listeners
#[derive(Debug, Clone)]
pub struct RequestDetails {
    pub id: u64,
    pub url: String,
    pub method: Method,
    /// Web view resource type ("mainFrame", "script", "image", ...)
    pub resource_type: String,
    /// Response status; `None` before the response exists
    pub status_code: Option<StatusCode>,
    /// Response headers; empty for [`WebRequestEvent::BeforeRequest`]
    pub response_headers: HeaderMap,
}

impl RequestDetails {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            url: url.into(),
            method: Method::GET,
            resource_type: "other".to_string(),
            status_code: None,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn with_response_headers(mut self, headers: HeaderMap) -> Self {
        self.response_headers = headers;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }
}

/// What a single listener wants done with a response.
///
/// An empty patch means "no opinion".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePatch {
    pub cancel: bool,
    /// Headers to set, replacing every existing value of the same name
    pub set_headers: Vec<(HeaderName, HeaderValue)>,
    /// Headers to drop
    pub remove_headers: Vec<HeaderName>,
}

impl ResponsePatch {
    /// Leave the response untouched
    pub fn pass() -> Self {
        Self::default()
    }

    /// Cancel the request
    pub fn cancel() -> Self {
        Self {
            cancel: true,
            ..Self::default()
        }
    }

    pub fn set_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.set_headers.push((name, value));
        self
    }

    pub fn remove_header(mut self, name: HeaderName) -> Self {
        self.remove_headers.push(name);
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.cancel && self.set_headers.is_empty() && self.remove_headers.is_empty()
    }

    /// Same patch with header edits discarded
    pub fn without_headers(self) -> Self {
        Self {
            cancel: self.cancel,
            ..Self::default()
        }
    }
}

/// Merged outcome of every listener for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedResponse {
    pub cancel: bool,
    pub response_headers: HeaderMap,
}

impl ResolvedResponse {
    /// The original response, unmodified
    pub fn passthrough(details: &RequestDetails) -> Self {
        Self {
            cancel: false,
            response_headers: details.response_headers.clone(),
        }
    }

    /// Fold a listener's patch into the accumulated response.
    ///
    /// Removals apply first, then sets, so a listener can replace a header
    /// by removing and setting it in one patch. Later patches override
    /// earlier ones on the same header name.
    pub fn apply(&mut self, patch: ResponsePatch) {
        self.cancel |= patch.cancel;
        for name in &patch.remove_headers {
            self.response_headers.remove(name);
        }
        for (name, value) in patch.set_headers {
            self.response_headers.insert(name, value);
        }
    }
}

/// Build a [`HeaderMap`] from string pairs, rejecting invalid names/values
pub fn headers_from_pairs<'a, I>(pairs: I) -> Result<HeaderMap, InterceptError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| InterceptError::InvalidHeader(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| InterceptError::InvalidHeader(format!("{name}: {e}")))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Error a listener may return instead of a patch
#[derive(Debug, Clone, thiserror::Error)]
pub enum ListenerError {
    #[error("{0}")]
    Failed(String),
}

impl ListenerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors surfaced by [`crate::network::WebRequestInterceptor::resolve`]
#[derive(Debug, Clone, thiserror::Error)]
pub enum InterceptError {
    #[error("Listener '{listener}' on {event} failed: {reason}")]
    ListenerFailed {
        event: WebRequestEvent,
        listener: String,
        reason: String,
    },

    #[error("Listener '{listener}' on {event} timed out after {timeout_ms}ms")]
    ListenerTimedOut {
        event: WebRequestEvent,
        listener: String,
        timeout_ms: u64,
    },

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_SECURITY_POLICY, CONTENT_TYPE};

    #[test]
    fn test_event_names() {
        assert_eq!(WebRequestEvent::BeforeRequest.to_string(), "onBeforeRequest");
        assert_eq!(WebRequestEvent::HeadersReceived.as_str(), "onHeadersReceived");
        assert!(!WebRequestEvent::BeforeRequest.accepts_headers());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestDetails::new("https://a");
        let b = RequestDetails::new("https://b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_apply_remove_then_set() {
        let headers =
            headers_from_pairs([("content-type", "text/html"), ("content-security-policy", "x")])
                .unwrap();
        let details = RequestDetails::new("https://a").with_response_headers(headers);
        let mut resolved = ResolvedResponse::passthrough(&details);

        resolved.apply(
            ResponsePatch::pass()
                .remove_header(CONTENT_SECURITY_POLICY)
                .remove_header(CONTENT_TYPE)
                .set_header(CONTENT_TYPE, HeaderValue::from_static("application/json")),
        );

        assert!(!resolved.cancel);
        assert!(resolved.response_headers.get(CONTENT_SECURITY_POLICY).is_none());
        assert_eq!(resolved.response_headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_cancel_is_sticky() {
        let mut resolved = ResolvedResponse::default();
        resolved.apply(ResponsePatch::cancel());
        resolved.apply(ResponsePatch::pass());
        assert!(resolved.cancel);
    }

    #[test]
    fn test_without_headers_keeps_cancel() {
        let patch = ResponsePatch::cancel().set_header(CONTENT_TYPE, HeaderValue::from_static("x"));
        let stripped = patch.without_headers();
        assert!(stripped.cancel);
        assert!(stripped.set_headers.is_empty());
    }

    #[test]
    fn test_headers_from_pairs_rejects_bad_name() {
        assert!(matches!(
            headers_from_pairs([("bad header", "x")]),
            Err(InterceptError::InvalidHeader(_))
        ));
    }
}
