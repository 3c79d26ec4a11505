//! Errors surfaced while bootstrapping a shell window.

use thiserror::Error;

use crate::song_info::SongInfoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read stylesheet: {0}")]
    Stylesheet(#[from] std::io::Error),

    #[error(transparent)]
    SongInfo(#[from] SongInfoError),

    #[error("Unknown inter-process channel: {0}")]
    UnknownChannel(String),
}

impl From<Box<dyn std::error::Error>> for AppError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
