//! Environment variable loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::PluginDescriptor;
use crate::network::ListenerFailurePolicy;

pub const PLUGINS: &str = "TUNEDECK_PLUGINS";
pub const OPEN_DEVTOOLS: &str = "TUNEDECK_OPEN_DEVTOOLS";
pub const STYLESHEET_PATH: &str = "TUNEDECK_STYLESHEET_PATH";
pub const SCRIPT_TIMEOUT_MS: &str = "TUNEDECK_SCRIPT_TIMEOUT_MS";
pub const FETCH_TIMEOUT_MS: &str = "TUNEDECK_FETCH_TIMEOUT_MS";
pub const USER_AGENT: &str = "TUNEDECK_USER_AGENT";
pub const LISTENER_TIMEOUT_MS: &str = "TUNEDECK_LISTENER_TIMEOUT_MS";
pub const LISTENER_FAILURE_POLICY: &str = "TUNEDECK_LISTENER_FAILURE_POLICY";

/// Values read from the environment; `None` when a variable is unset
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub plugins: Option<Vec<PluginDescriptor>>,
    pub open_dev_tools: Option<bool>,
    pub stylesheet_path: Option<PathBuf>,
    pub script_timeout_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub listener_timeout_ms: Option<u64>,
    pub listener_failure_policy: Option<ListenerFailurePolicy>,
}

impl EnvConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            plugins: non_empty(PLUGINS).map(|list| parse_plugin_list(&list)),
            open_dev_tools: non_empty(OPEN_DEVTOOLS)
                .map(|value| parse_bool(OPEN_DEVTOOLS, &value))
                .transpose()?,
            stylesheet_path: non_empty(STYLESHEET_PATH).map(PathBuf::from),
            script_timeout_ms: parse_var(SCRIPT_TIMEOUT_MS)?,
            fetch_timeout_ms: parse_var(FETCH_TIMEOUT_MS)?,
            user_agent: non_empty(USER_AGENT),
            listener_timeout_ms: parse_var(LISTENER_TIMEOUT_MS)?,
            listener_failure_policy: non_empty(LISTENER_FAILURE_POLICY)
                .map(|value| parse_policy(&value))
                .transpose()?,
        })
    }
}

/// Comma-separated plugin ids, all enabled with no options
pub fn parse_plugin_list(list: &str) -> Vec<PluginDescriptor> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(PluginDescriptor::new)
        .collect()
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(key: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| -> Box<dyn std::error::Error> {
                    format!("Invalid value for {key}: {e}").into()
                })
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("Invalid value for {key}: '{other}' is not a boolean").into()),
    }
}

fn parse_policy(value: &str) -> Result<ListenerFailurePolicy, Box<dyn std::error::Error>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "isolate" => Ok(ListenerFailurePolicy::Isolate),
        "abort" => Ok(ListenerFailurePolicy::Abort),
        other => Err(format!(
            "Invalid value for {LISTENER_FAILURE_POLICY}: '{other}' (expected isolate or abort)"
        )
        .into()),
    }
}
