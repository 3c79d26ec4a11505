//! Player-data payload reported by the page on `song-info-request`.
//!
//! Only the fields the pipeline reads are modelled. Numeric fields arrive as
//! numbers or as numeric strings depending on the page version.

use serde::{Deserialize, Deserializer};

use super::SongInfoError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerData {
    pub video_details: VideoDetails,
    pub microformat: Microformat,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub author: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub view_count: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub length_seconds: u64,
    pub thumbnail: ThumbnailList,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThumbnailList {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Microformat {
    pub microformat_data_renderer: MicroformatDataRenderer,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicroformatDataRenderer {
    pub upload_date: String,
    pub url_canonical: String,
}

impl PlayerData {
    pub fn parse(payload: &str) -> Result<Self, SongInfoError> {
        serde_json::from_str(payload).map_err(|e| SongInfoError::MalformedPayload(e.to_string()))
    }

    /// Last declared thumbnail, which the page lists at the highest resolution
    pub fn last_thumbnail_url(&self) -> Option<&str> {
        self.video_details
            .thumbnail
            .thumbnails
            .last()
            .map(|thumbnail| thumbnail.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    Float(f64),
    String(String),
}

/// Accept `180`, `180.0`, `"180"` or `null` (as 0)
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::Float(f)) if f >= 0.0 => Ok(f as u64),
        Some(NumberOrString::Float(f)) => Err(serde::de::Error::custom(format!(
            "negative number {f}"
        ))),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(0),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a non-negative integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "videoDetails": {
            "title": "Song - Topic",
            "author": "Band",
            "viewCount": "10",
            "thumbnail": {"thumbnails": [{"url": "small.jpg"}, {"url": "large.jpg", "width": 544}]},
            "lengthSeconds": 180
        },
        "microformat": {
            "microformatDataRenderer": {"uploadDate": "2020-01-01", "urlCanonical": "https://x"}
        }
    }"#;

    #[test]
    fn test_parse_full_payload() {
        let data = PlayerData::parse(PAYLOAD).unwrap();
        assert_eq!(data.video_details.title, "Song - Topic");
        assert_eq!(data.video_details.view_count, 10);
        assert_eq!(data.video_details.length_seconds, 180);
        assert_eq!(data.last_thumbnail_url(), Some("large.jpg"));
        assert_eq!(data.microformat.microformat_data_renderer.upload_date, "2020-01-01");
        assert_eq!(data.microformat.microformat_data_renderer.url_canonical, "https://x");
    }

    #[test]
    fn test_missing_sections_default() {
        let data = PlayerData::parse("{}").unwrap();
        assert!(data.video_details.title.is_empty());
        assert_eq!(data.last_thumbnail_url(), None);
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            PlayerData::parse("not json"),
            Err(SongInfoError::MalformedPayload(_))
        ));
        assert!(matches!(
            PlayerData::parse(r#"{"videoDetails": {"lengthSeconds": "three"}}"#),
            Err(SongInfoError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_null_count_is_zero() {
        let data = PlayerData::parse(r#"{"videoDetails": {"viewCount": null}}"#).unwrap();
        assert_eq!(data.video_details.view_count, 0);
    }
}
