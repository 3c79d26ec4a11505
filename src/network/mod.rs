//! Network-layer hooks: the header interception layer, the CSP filter and
//! the session abstraction they attach to.

pub mod csp;
pub mod interceptor;
pub mod session;
pub mod types;

pub use interceptor::{
    InterceptorOptions, ListenerFailurePolicy, ListenerFn, ListenerId, SessionInterceptors,
    WebRequestInterceptor, session_interceptors,
};
pub use session::{ComposedHandler, HeadlessSession, WebSession};
pub use types::{
    InterceptError, ListenerError, RequestDetails, ResolvedResponse, ResponsePatch, WebRequestEvent,
    headers_from_pairs,
};
