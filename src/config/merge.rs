//! Merging YAML and environment configurations.
//!
//! Priority: YAML > environment (`.env` loaded into it by `main`) > defaults.

use super::env::EnvConfig;
use super::yaml::YamlConfig;
use super::{NetworkConfig, ShellConfig, SongInfoConfig, WindowConfig};

pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ShellConfig, Box<dyn std::error::Error>> {
    let env = EnvConfig::load()?;
    Ok(merge(env, yaml.unwrap_or_default()))
}

fn merge(env: EnvConfig, yaml: YamlConfig) -> ShellConfig {
    let song_info_yaml = yaml.song_info.unwrap_or_default();
    let network_yaml = yaml.network.unwrap_or_default();
    let window_yaml = yaml.window.unwrap_or_default();

    let song_info_defaults = SongInfoConfig::default();
    let network_defaults = NetworkConfig::default();

    ShellConfig {
        plugins: yaml.plugins.or(env.plugins).unwrap_or_default(),
        song_info: SongInfoConfig {
            script_timeout_ms: song_info_yaml
                .script_timeout_ms
                .or(env.script_timeout_ms)
                .unwrap_or(song_info_defaults.script_timeout_ms),
            fetch_timeout_ms: song_info_yaml
                .fetch_timeout_ms
                .or(env.fetch_timeout_ms)
                .unwrap_or(song_info_defaults.fetch_timeout_ms),
            user_agent: song_info_yaml.user_agent.or(env.user_agent),
        },
        network: NetworkConfig {
            listener_timeout_ms: network_yaml
                .listener_timeout_ms
                .or(env.listener_timeout_ms)
                .unwrap_or(network_defaults.listener_timeout_ms),
            listener_failure_policy: network_yaml
                .listener_failure_policy
                .or(env.listener_failure_policy)
                .unwrap_or(network_defaults.listener_failure_policy),
        },
        window: WindowConfig {
            open_dev_tools: window_yaml
                .open_dev_tools
                .or(env.open_dev_tools)
                .unwrap_or(false),
            stylesheet_path: window_yaml.stylesheet_path.or(env.stylesheet_path),
        },
    }
}
