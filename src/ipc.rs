//! Inter-process channel names shared with the page's privileged script context.

/// Inbound: the page reports its player data (JSON)
pub const SONG_INFO_REQUEST: &str = "song-info-request";

/// Outbound: the latest published snapshot (JSON)
pub const UPDATE_SONG_INFO: &str = "update-song-info";
