//! Song-info extraction: scrapes now-playing metadata out of the hosted page
//! and republishes it as [`PlaybackSnapshot`]s.

pub mod cleanup;
pub mod cover;
pub mod observers;
pub mod pipeline;
pub mod player_data;
pub mod snapshot;

pub use crate::config::SongInfoConfig;
pub use cleanup::{PROMOTIONAL_SUFFIXES, cleanup_name};
pub use cover::{CoverFetcher, disguised_jpeg_url};
pub use observers::{ObserverFn, ObserverList, Subscription};
pub use pipeline::{PipelineState, SongInfoHandle, SongInfoPipeline};
pub use player_data::PlayerData;
pub use snapshot::{CoverArt, PlaybackSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum SongInfoError {
    #[error("Malformed player data: {0}")]
    MalformedPayload(String),

    #[error("Song-info worker is no longer running")]
    QueueClosed,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Cover fetch failed: {0}")]
    Fetch(String),

    #[error("Cover decode failed: {0}")]
    CoverDecode(String),

    #[error("Failed to serialize snapshot: {0}")]
    Serialize(String),
}
