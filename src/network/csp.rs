//! CSP relaxation: strips content-security-policy headers from responses so
//! page-side plugin scripts can run.

use http::HeaderMap;
use http::header::{CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_REPORT_ONLY};

use super::interceptor::{ListenerId, WebRequestInterceptor};
use super::types::{RequestDetails, ResponsePatch, WebRequestEvent};

pub const LISTENER_NAME: &str = "csp-relaxation";

/// Patch removing both CSP headers, or an empty patch if neither is present
pub fn relax_csp(headers: &HeaderMap) -> ResponsePatch {
    if !headers.contains_key(CONTENT_SECURITY_POLICY)
        && !headers.contains_key(CONTENT_SECURITY_POLICY_REPORT_ONLY)
    {
        return ResponsePatch::pass();
    }

    ResponsePatch::pass()
        .remove_header(CONTENT_SECURITY_POLICY)
        .remove_header(CONTENT_SECURITY_POLICY_REPORT_ONLY)
}

/// Register the filter on [`WebRequestEvent::HeadersReceived`]
pub fn register(interceptor: &WebRequestInterceptor) -> ListenerId {
    interceptor.register(
        WebRequestEvent::HeadersReceived,
        LISTENER_NAME,
        |details: RequestDetails| async move { Ok(relax_csp(&details.response_headers)) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::headers_from_pairs;

    #[test]
    fn test_no_csp_is_empty_patch() {
        let headers = headers_from_pairs([("content-type", "text/html")]).unwrap();
        let patch = relax_csp(&headers);
        assert!(patch.is_empty());
    }

    #[test]
    fn test_mixed_case_names_are_removed() {
        let headers = headers_from_pairs([
            ("Content-Security-Policy", "default-src 'self'"),
            ("content-type", "text/html"),
        ])
        .unwrap();
        let patch = relax_csp(&headers);
        assert!(!patch.cancel);
        assert_eq!(
            patch.remove_headers,
            vec![CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_REPORT_ONLY]
        );
    }

    #[test]
    fn test_report_only_alone_triggers_removal() {
        let headers =
            headers_from_pairs([("CONTENT-SECURITY-POLICY-REPORT-ONLY", "script-src 'none'")])
                .unwrap();
        assert!(!relax_csp(&headers).is_empty());
    }
}
