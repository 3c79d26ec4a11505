//! Per-window application state.

use std::sync::Arc;

use crate::config::ShellConfig;
use crate::errors::{AppError, AppResult};
use crate::ipc::SONG_INFO_REQUEST;
use crate::network::{
    InterceptorOptions, SessionInterceptors, WebRequestInterceptor, WebSession, csp,
    session_interceptors,
};
use crate::plugin::{
    LoadReport, LoaderOptions, PluginHost, PluginLoader, PluginRegistry, global_registry,
};
use crate::song_info::{CoverFetcher, SongInfoHandle, SongInfoPipeline};
use crate::window::ShellWindow;

/// Core components wired for one window
pub struct AppState {
    pub config: Arc<ShellConfig>,
    pub window: Arc<dyn ShellWindow>,
    pub interceptor: Arc<WebRequestInterceptor>,
    pub song_info: SongInfoHandle,
    /// Outcome of plugin activation for this window
    pub load_report: LoadReport,
}

impl AppState {
    /// Wire the shell core into a freshly created window, using the built-in
    /// plugin registry and the process-wide session interceptors
    pub async fn bootstrap(
        config: ShellConfig,
        window: Arc<dyn ShellWindow>,
        session: &dyn WebSession,
    ) -> AppResult<Self> {
        Self::bootstrap_with(config, window, session, global_registry(), session_interceptors())
            .await
    }

    /// Same as [`bootstrap`](Self::bootstrap) with an explicit registry and
    /// interceptor set.
    ///
    /// Windows on the same session share one interceptor. The first window
    /// installs it and registers the CSP filter before any plugin runs, so
    /// plugin listeners resolve after the filter.
    pub async fn bootstrap_with(
        config: ShellConfig,
        window: Arc<dyn ShellWindow>,
        session: &dyn WebSession,
        registry: &PluginRegistry,
        interceptors: &SessionInterceptors,
    ) -> AppResult<Self> {
        let stylesheet = config.window.load_stylesheet()?;

        let (interceptor, installed) = interceptors
            .get_or_install(session, InterceptorOptions::from_config(&config.network));
        if installed {
            csp::register(&interceptor);
        }

        let fetcher = CoverFetcher::new(&config.song_info)?;
        let song_info =
            SongInfoPipeline::new(Arc::clone(&window), fetcher, &config.song_info).spawn();

        let host =
            PluginHost::new(Arc::clone(&window), song_info.clone(), Arc::clone(&interceptor));
        let loader = PluginLoader::new(
            registry,
            LoaderOptions::from_window_config(&config.window, stylesheet),
        );
        let load_report = loader.load_all(&host, &config.plugins).await;

        tracing::info!(
            partition = %session.partition(),
            plugins = load_report.activated.len(),
            failed = load_report.failed.len(),
            "Shell window ready"
        );

        Ok(Self {
            config: Arc::new(config),
            window,
            interceptor,
            song_info,
            load_report,
        })
    }

    /// Route a message received from the page
    pub fn handle_ipc(&self, channel: &str, payload: &str) -> AppResult<()> {
        match channel {
            SONG_INFO_REQUEST => Ok(self.song_info.player_data(payload)?),
            other => Err(AppError::UnknownChannel(other.to_string())),
        }
    }

    /// The page title changed
    pub fn page_title_updated(&self) -> AppResult<()> {
        Ok(self.song_info.title_changed()?)
    }
}
