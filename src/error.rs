//! Crate-wide error type.

use thiserror::Error;

/// Errors raised while configuring or starting the visualizer
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("audio device unavailable: {0}")]
    AudioDevice(String),

    #[error("audio stream failed: {0}")]
    AudioStream(String),

    #[error("failed to decode audio file: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("resampling failed: {0}")]
    Resample(String),

    #[error("failed to write soundtrack: {0}")]
    Wav(#[from] hound::Error),

    #[error("render setup failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
