use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tunedeck::{
    AppState, ShellConfig, global_registry,
    network::HeadlessSession,
    plugin::registry::normalize_id,
    song_info::{CoverFetcher, SongInfoPipeline, pipeline::ARTIST_SCRIPT},
    window::{HeadlessWindow, ShellWindow},
};

/// Tunedeck - desktop shell core for a hosted web music player
#[derive(Parser, Debug)]
#[command(name = "tunedeck")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run (defaults to `check`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered plugins and whether the configuration enables them
    Plugins,

    /// Run a player-data payload through the song-info pipeline and print
    /// the published snapshot
    SongInfo {
        /// Player data as JSON, or @FILE to read it from a file
        #[arg(value_name = "JSON|@FILE")]
        payload: String,

        /// Artist shown in the page's player bar
        #[arg(long)]
        artist: Option<String>,
    },

    /// Bootstrap a headless window and print the plugin load report
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing; logs go to stderr so command output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file or environment
    let config = if let Some(config_path) = &cli.config {
        tracing::info!(path = %config_path.display(), "Loading configuration");
        ShellConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        ShellConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Plugins => list_plugins(&config),
        Commands::SongInfo { payload, artist } => song_info(&config, &payload, artist).await,
        Commands::Check => check(config).await,
    }
}

fn list_plugins(config: &ShellConfig) -> anyhow::Result<()> {
    let registry = global_registry();

    for id in registry.plugin_ids() {
        let Some(metadata) = registry.metadata(&id) else {
            continue;
        };
        let enabled = config
            .enabled_plugins()
            .any(|plugin| normalize_id(&plugin.id) == id);

        println!(
            "{:<16} {:<8} {:<9} {:<8} {}",
            id,
            metadata.version.to_string(),
            metadata.kind.to_string(),
            if enabled { "enabled" } else { "-" },
            metadata.description
        );
    }

    for plugin in config.enabled_plugins() {
        if !registry.has_plugin(&plugin.id) {
            println!("{:<16} (not registered)", plugin.id);
        }
    }

    Ok(())
}

async fn song_info(
    config: &ShellConfig,
    payload: &str,
    artist: Option<String>,
) -> anyhow::Result<()> {
    let payload = match payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read payload file {path}: {e}"))?,
        None => payload.to_string(),
    };

    let window = HeadlessWindow::new();
    if let Some(artist) = artist {
        window.set_script_result(ARTIST_SCRIPT, artist.into());
    }
    let window: Arc<dyn ShellWindow> = Arc::new(window);

    let fetcher = CoverFetcher::new(&config.song_info)?;
    let handle = SongInfoPipeline::new(window, fetcher, &config.song_info).spawn();
    handle.player_data(payload)?;
    handle.flush().await?;

    let snapshot = handle
        .latest()
        .ok_or_else(|| anyhow!("Payload was rejected, nothing published"))?;
    println!("{}", serde_json::to_string_pretty(&*snapshot)?);

    Ok(())
}

async fn check(config: ShellConfig) -> anyhow::Result<()> {
    let window: Arc<dyn ShellWindow> = Arc::new(HeadlessWindow::new());
    let session = HeadlessSession::new("persist:tunedeck");

    let state = AppState::bootstrap(config, window, &session).await?;
    let report = &state.load_report;

    println!("activated: {}", report.activated.join(", "));
    println!("skipped:   {}", report.skipped.join(", "));
    for (id, error) in &report.failed {
        println!("failed:    {id}: {error}");
    }

    if !report.is_clean() {
        anyhow::bail!("{} plugin(s) failed to activate", report.failed.len());
    }
    Ok(())
}
