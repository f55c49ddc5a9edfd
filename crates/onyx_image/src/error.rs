//! Image pipeline error types

use thiserror::Error;

/// Errors from fetching, decoding or scaling art
#[derive(Error, Debug)]
pub enum ImageError {
    /// The art source could not provide bytes
    #[error("Failed to fetch art '{id}': {reason}")]
    Fetch { id: String, reason: String },

    /// Bytes were not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Scaling to a zero-sized target
    #[error("Cannot scale to an empty {0}x{1} target")]
    EmptyTarget(u32, u32),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
