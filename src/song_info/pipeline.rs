//! Per-window worker turning page events into published snapshots.
//!
//! ```text
//! title changed ─┐
//!                ├──▶ mpsc ──▶ worker ──▶ observers ──▶ update-song-info
//! player data ───┘
//! ```
//!
//! The worker owns the working snapshot and handles one trigger at a time,
//! in arrival order.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::cleanup::cleanup_name;
use super::cover::CoverFetcher;
use super::observers::{ObserverList, Subscription};
use super::player_data::PlayerData;
use super::snapshot::PlaybackSnapshot;
use super::{SongInfoConfig, SongInfoError};
use crate::ipc::UPDATE_SONG_INFO;
use crate::window::ShellWindow;

pub const TITLE_SCRIPT: &str = "document.title";
pub const PROGRESS_SCRIPT: &str = r##"document.querySelector("#progress-bar")?.value"##;
pub const ARTIST_SCRIPT: &str =
    r#"document.querySelector(".subtitle.ytmusic-player-bar .yt-formatted-string")?.textContent"#;

/// What the worker is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingTitle,
    ResolvingArtist,
    ResolvingProgress,
    Publishing,
}

enum Trigger {
    TitleChanged,
    PlayerData(String),
    Flush(oneshot::Sender<()>),
}

/// Song-info worker for one window; started with [`spawn`](Self::spawn)
pub struct SongInfoPipeline {
    window: Arc<dyn ShellWindow>,
    fetcher: CoverFetcher,
    script_timeout: Option<Duration>,
    observers: ObserverList,
    working: PlaybackSnapshot,
    latest: Arc<RwLock<Option<Arc<PlaybackSnapshot>>>>,
    state: Arc<Mutex<PipelineState>>,
}

impl SongInfoPipeline {
    pub fn new(
        window: Arc<dyn ShellWindow>,
        fetcher: CoverFetcher,
        config: &SongInfoConfig,
    ) -> Self {
        Self {
            window,
            fetcher,
            script_timeout: config.script_timeout(),
            observers: ObserverList::new(),
            working: PlaybackSnapshot::default(),
            latest: Arc::new(RwLock::new(None)),
            state: Arc::new(Mutex::new(PipelineState::Idle)),
        }
    }

    /// Start the worker task. Must be called inside a tokio runtime.
    ///
    /// The worker stops once every [`SongInfoHandle`] is dropped.
    pub fn spawn(self) -> SongInfoHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = SongInfoHandle {
            sender,
            observers: self.observers.clone(),
            latest: Arc::clone(&self.latest),
            state: Arc::clone(&self.state),
        };
        tokio::spawn(self.run(receiver));
        handle
    }

    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Trigger>) {
        tracing::debug!("Song-info worker started");
        while let Some(trigger) = receiver.recv().await {
            match trigger {
                Trigger::TitleChanged => self.on_title_changed().await,
                Trigger::PlayerData(payload) => self.on_player_data(&payload).await,
                Trigger::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("Song-info worker stopped");
    }

    async fn on_title_changed(&mut self) {
        self.set_state(PipelineState::AwaitingTitle);
        if let Some(title) = self.evaluate(TITLE_SCRIPT).await.and_then(value_as_text) {
            self.working.is_paused = !title.contains('-');
        }

        self.set_state(PipelineState::ResolvingProgress);
        if let Some(elapsed) = self.evaluate(PROGRESS_SCRIPT).await.and_then(value_as_seconds) {
            self.working.elapsed_seconds = elapsed;
        }

        self.publish();
    }

    async fn on_player_data(&mut self, payload: &str) {
        let data = match PlayerData::parse(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring song-info payload");
                return;
            }
        };

        self.set_state(PipelineState::ResolvingArtist);
        let dom_artist = self
            .evaluate(ARTIST_SCRIPT)
            .await
            .and_then(value_as_text)
            .map(|artist| artist.trim().to_string())
            .filter(|artist| !artist.is_empty());

        let details = &data.video_details;
        let microformat = &data.microformat.microformat_data_renderer;
        let thumbnail_url = data.last_thumbnail_url().unwrap_or_default().to_string();

        let mut next = self.working.clone();
        next.title = cleanup_name(&details.title);
        next.artist = dom_artist.unwrap_or_else(|| cleanup_name(&details.author));
        next.views = details.view_count;
        next.duration_seconds = details.length_seconds;
        next.upload_date = microformat.upload_date.clone();
        next.canonical_url = microformat.url_canonical.clone();

        if thumbnail_url != next.thumbnail_url || next.cover.is_none() {
            next.cover = self.fetcher.resolve(&thumbnail_url).await;
        }
        next.thumbnail_url = thumbnail_url;

        self.working = next;
        self.publish();
    }

    /// Evaluate `script`; `None` on failure or timeout
    async fn evaluate(&self, script: &str) -> Option<Value> {
        let call = self.window.execute_script(script);
        let result = match self.script_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        script = %script,
                        timeout_ms = timeout.as_millis() as u64,
                        "Page script timed out"
                    );
                    return None;
                }
            },
            None => call.await,
        };

        result
            .map_err(|e| tracing::warn!(script = %script, error = %e, "Page script failed"))
            .ok()
    }

    fn publish(&mut self) {
        self.set_state(PipelineState::Publishing);

        let snapshot = Arc::new(self.working.clone());
        *self.latest.write() = Some(Arc::clone(&snapshot));

        tracing::debug!(
            title = %snapshot.title,
            artist = %snapshot.artist,
            is_paused = snapshot.is_paused,
            observers = self.observers.len(),
            "Publishing song info"
        );
        self.observers.notify(&snapshot);

        match snapshot.to_json() {
            Ok(json) => {
                if let Err(e) = self.window.send(UPDATE_SONG_INFO, json) {
                    tracing::warn!(
                        error = %e,
                        channel = UPDATE_SONG_INFO,
                        "Failed to send song info"
                    );
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize song info"),
        }

        self.set_state(PipelineState::Idle);
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock() = state;
    }
}

/// Cheap handle to a running [`SongInfoPipeline`]
#[derive(Clone)]
pub struct SongInfoHandle {
    sender: mpsc::UnboundedSender<Trigger>,
    observers: ObserverList,
    latest: Arc<RwLock<Option<Arc<PlaybackSnapshot>>>>,
    state: Arc<Mutex<PipelineState>>,
}

impl SongInfoHandle {
    /// Add an observer called with every published snapshot
    pub fn register_observer<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&Arc<PlaybackSnapshot>) + Send + Sync + 'static,
    {
        self.observers.register(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// The page title changed
    pub fn title_changed(&self) -> Result<(), SongInfoError> {
        self.send(Trigger::TitleChanged)
    }

    /// The page reported player data
    pub fn player_data(&self, payload: impl Into<String>) -> Result<(), SongInfoError> {
        self.send(Trigger::PlayerData(payload.into()))
    }

    /// Wait until every trigger queued so far has been handled
    pub async fn flush(&self) -> Result<(), SongInfoError> {
        let (done, wait) = oneshot::channel();
        self.send(Trigger::Flush(done))?;
        wait.await.map_err(|_| SongInfoError::QueueClosed)
    }

    /// Most recently published snapshot
    pub fn latest(&self) -> Option<Arc<PlaybackSnapshot>> {
        self.latest.read().clone()
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock()
    }

    fn send(&self, trigger: Trigger) -> Result<(), SongInfoError> {
        self.sender
            .send(trigger)
            .map_err(|_| SongInfoError::QueueClosed)
    }
}

fn value_as_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Progress bar value: a number of seconds, possibly fractional or quoted
fn value_as_seconds(value: Value) -> Option<u64> {
    let seconds = match &value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (seconds.is_finite() && seconds >= 0.0).then(|| seconds.round() as u64)
}
