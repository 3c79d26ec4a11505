//! Published playback state.

use std::io::Cursor;

use base64::Engine;
use bytes::Bytes;
use image::{ImageFormat, ImageReader};
use serde::{Serialize, Serializer};

use super::SongInfoError;

/// Decoded cover image. Keeps the original encoded bytes for re-publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverArt {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

impl CoverArt {
    /// Validate `bytes` as an image; empty or undecodable input is an error
    pub fn decode(bytes: Bytes) -> Result<Self, SongInfoError> {
        if bytes.is_empty() {
            return Err(SongInfoError::CoverDecode("empty body".to_string()));
        }

        let reader = ImageReader::new(Cursor::new(&bytes[..]))
            .with_guessed_format()
            .map_err(|e| SongInfoError::CoverDecode(e.to_string()))?;
        let format = reader.format();
        let image = reader
            .decode()
            .map_err(|e| SongInfoError::CoverDecode(e.to_string()))?;

        Ok(Self {
            width: image.width(),
            height: image.height(),
            format,
            bytes,
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream")
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

impl Serialize for CoverArt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

/// Now-playing state at one instant. Never mutated after publication.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub title: String,
    pub artist: String,
    pub views: u64,
    pub upload_date: String,
    #[serde(rename = "url")]
    pub canonical_url: String,
    #[serde(rename = "imageSrc")]
    pub thumbnail_url: String,
    #[serde(rename = "image")]
    pub cover: Option<CoverArt>,
    pub is_paused: bool,
    #[serde(rename = "songDuration")]
    pub duration_seconds: u64,
    pub elapsed_seconds: u64,
}

impl PlaybackSnapshot {
    pub fn to_json(&self) -> Result<String, SongInfoError> {
        serde_json::to_string(self).map_err(|e| SongInfoError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// Tiny PNG used by cover tests
    pub(crate) fn png_bytes() -> Vec<u8> {
        let image = ImageBuffer::from_pixel(2, 3, Rgb([200u8, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let cover = CoverArt::decode(Bytes::from(png_bytes())).unwrap();
        assert_eq!((cover.width, cover.height), (2, 3));
        assert_eq!(cover.mime_type(), "image/png");
        assert!(cover.to_data_url().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(CoverArt::decode(Bytes::from_static(b"<html>not found</html>")).is_err());
        assert!(CoverArt::decode(Bytes::new()).is_err());
    }

    #[test]
    fn test_snapshot_wire_names() {
        let snapshot = PlaybackSnapshot {
            title: "Song".to_string(),
            artist: "Band".to_string(),
            duration_seconds: 180,
            canonical_url: "https://music.example.com/watch?v=1".to_string(),
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();

        assert_eq!(json["title"], "Song");
        assert_eq!(json["songDuration"], 180);
        assert_eq!(json["url"], "https://music.example.com/watch?v=1");
        assert_eq!(json["isPaused"], false);
        assert!(json["image"].is_null());
        assert!(json.get("uploadDate").is_some());
        assert!(json.get("imageSrc").is_some());
        assert!(json.get("elapsedSeconds").is_some());
    }
}
