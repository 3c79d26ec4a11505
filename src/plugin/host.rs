//! Handle passed to plugin backends on activation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::isolation::PluginError;
use crate::network::{InterceptorOptions, WebRequestInterceptor};
use crate::song_info::{CoverFetcher, SongInfoConfig, SongInfoHandle, SongInfoPipeline};
use crate::window::{HeadlessWindow, ShellWindow};

/// Everything a plugin backend may touch: the window it was activated for,
/// the song-info observer list and the header interception layer.
///
/// Plugins only ever register with these; none of them call back into the
/// plugin loader.
#[derive(Clone)]
pub struct PluginHost {
    window: Arc<dyn ShellWindow>,
    song_info: SongInfoHandle,
    interceptor: Arc<WebRequestInterceptor>,
}

impl PluginHost {
    pub fn new(
        window: Arc<dyn ShellWindow>,
        song_info: SongInfoHandle,
        interceptor: Arc<WebRequestInterceptor>,
    ) -> Self {
        Self {
            window,
            song_info,
            interceptor,
        }
    }

    /// Host backed by a [`HeadlessWindow`] and a fresh interceptor.
    ///
    /// Must be called inside a tokio runtime (the song-info worker is spawned).
    pub fn headless() -> Self {
        let window: Arc<dyn ShellWindow> = Arc::new(HeadlessWindow::new());
        let config = SongInfoConfig::default();
        let fetcher = CoverFetcher::with_client(reqwest::Client::new());
        let song_info = SongInfoPipeline::new(window.clone(), fetcher, &config).spawn();
        let interceptor = Arc::new(WebRequestInterceptor::new(InterceptorOptions::default()));
        Self::new(window, song_info, interceptor)
    }

    pub fn window(&self) -> &Arc<dyn ShellWindow> {
        &self.window
    }

    pub fn song_info(&self) -> &SongInfoHandle {
        &self.song_info
    }

    pub fn interceptor(&self) -> &Arc<WebRequestInterceptor> {
        &self.interceptor
    }
}

/// Deserialize a plugin's options blob, using `T::default()` when the blob is
/// absent (`null`).
pub fn parse_options<T>(options: &Value) -> Result<T, PluginError>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| PluginError::InvalidOptions(e.to_string()))
}
