//! Ad blocker: cancels outgoing requests whose URL matches a blocklist.

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::network::{RequestDetails, ResponsePatch, WebRequestEvent};
use crate::plugin::host::{PluginHost, parse_options};
use crate::plugin::isolation::PluginError;
use crate::plugin::metadata::PluginMetadata;

/// Patterns blocked when the options blob does not list its own
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"^https?://([^/]+\.)?doubleclick\.net/",
    r"^https?://([^/]+\.)?googlesyndication\.com/",
    r"^https?://([^/]+\.)?googleadservices\.com/",
    r"/pagead/",
    r"/api/stats/ads",
    r"/ptracking\?",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdblockerOptions {
    /// Regular expressions matched against the full request URL
    pub patterns: Vec<String>,
    /// Extra patterns appended to `patterns`
    pub additional_patterns: Vec<String>,
}

impl Default for AdblockerOptions {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            additional_patterns: Vec::new(),
        }
    }
}

impl AdblockerOptions {
    fn compile(&self) -> Result<Vec<Regex>, PluginError> {
        self.patterns
            .iter()
            .chain(&self.additional_patterns)
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    PluginError::InvalidOptions(format!("invalid pattern '{pattern}': {e}"))
                })
            })
            .collect()
    }
}

fn metadata() -> PluginMetadata {
    PluginMetadata::new("adblocker", "Ad Blocker")
        .with_description("Cancels requests to known advertising and tracking endpoints")
        .with_features(["network"])
}

fn activate(host: &PluginHost, options: &Value) -> Result<(), PluginError> {
    let options: AdblockerOptions = parse_options(options)?;
    let blocklist = Arc::new(options.compile()?);
    tracing::debug!(patterns = blocklist.len(), "Ad blocker armed");

    host.interceptor().register(
        WebRequestEvent::BeforeRequest,
        "adblocker",
        move |details: RequestDetails| {
            let blocklist = Arc::clone(&blocklist);
            async move {
                if blocklist.iter().any(|pattern| pattern.is_match(&details.url)) {
                    tracing::debug!(url = %details.url, "Blocked request");
                    Ok(ResponsePatch::cancel())
                } else {
                    Ok(ResponsePatch::pass())
                }
            }
        },
    );

    Ok(())
}

crate::register_plugin!("adblocker", metadata, activate, aliases: ["adblock"]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns_compile() {
        let patterns = AdblockerOptions::default().compile().unwrap();
        assert_eq!(patterns.len(), DEFAULT_PATTERNS.len());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let options = AdblockerOptions {
            patterns: vec!["(unclosed".to_string()],
            additional_patterns: Vec::new(),
        };
        assert!(matches!(options.compile(), Err(PluginError::InvalidOptions(_))));
    }

    #[tokio::test]
    async fn test_blocks_matching_requests_only() {
        let host = PluginHost::headless();
        activate(&host, &serde_json::json!({"patterns": ["ads\\.example\\.com"]})).unwrap();

        let blocked = host
            .interceptor()
            .resolve(
                WebRequestEvent::BeforeRequest,
                RequestDetails::new("https://ads.example.com/banner.js"),
            )
            .await
            .unwrap();
        assert!(blocked.cancel);

        let allowed = host
            .interceptor()
            .resolve(
                WebRequestEvent::BeforeRequest,
                RequestDetails::new("https://music.example.com/watch?v=1"),
            )
            .await
            .unwrap();
        assert!(!allowed.cancel);
    }
}
