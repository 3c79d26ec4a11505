//! Cover art download.
//!
//! Thumbnail URLs sometimes carry sizing parameters after the extension
//! (`.../hqdefault.jpg?sqp=...` or `.../cover.jpg-w544-h544`). When such a URL
//! does not yield an image, the fetch is retried once with everything after
//! the last `.jpg` cut off.

use std::time::Duration;

use bytes::Bytes;
use url::Url;

use super::snapshot::CoverArt;
use super::{SongInfoConfig, SongInfoError};

const JPG_EXTENSION: &str = ".jpg";

#[derive(Debug, Clone)]
pub struct CoverFetcher {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl CoverFetcher {
    /// Build a fetcher with its own HTTP client
    pub fn new(config: &SongInfoConfig) -> Result<Self, SongInfoError> {
        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        Ok(Self {
            client: builder.build()?,
            timeout: config.fetch_timeout(),
        })
    }

    /// Fetcher sharing an existing client, without a timeout
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Download and decode the cover at `url`.
    ///
    /// Returns `None` when neither `url` nor its truncated `.jpg` form gives
    /// a decodable image.
    pub async fn resolve(&self, url: &str) -> Option<CoverArt> {
        if url.is_empty() {
            return None;
        }

        let first_error = match self.fetch_image(url).await {
            Ok(cover) => return Some(cover),
            Err(e) => e,
        };

        let Some(retry_url) = disguised_jpeg_url(url) else {
            tracing::debug!(url = %url, error = %first_error, "No cover image");
            return None;
        };

        tracing::debug!(
            url = %url,
            retry_url = %retry_url,
            error = %first_error,
            "Retrying cover without suffix"
        );
        match self.fetch_image(retry_url).await {
            Ok(cover) => Some(cover),
            Err(e) => {
                tracing::debug!(url = %retry_url, error = %e, "No cover image");
                None
            }
        }
    }

    async fn fetch_image(&self, url: &str) -> Result<CoverArt, SongInfoError> {
        let bytes = self.fetch(url).await?;
        CoverArt::decode(bytes)
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, SongInfoError> {
        let url = Url::parse(url).map_err(|e| SongInfoError::Fetch(format!("{url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SongInfoError::Fetch(format!("unsupported scheme '{}'", url.scheme())));
        }

        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}

/// `url` cut right after its last `.jpg`, if it contains one but does not end
/// with it
pub fn disguised_jpeg_url(url: &str) -> Option<&str> {
    if url.ends_with(JPG_EXTENSION) {
        return None;
    }
    url.rfind(JPG_EXTENSION)
        .map(|index| &url[..index + JPG_EXTENSION.len()])
}
