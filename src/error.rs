//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.
//! [`Error`] covers infrastructure failures (object storage, configuration,
//! broken internal guarantees). [`PipelineError`] is the terminal outcome taxonomy of an
//! upload and is what callers and the feedback channel see.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage rejected object size: {0}")]
    StorageTooLarge(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why an upload did not produce a published asset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("caller is not allowed to upload this kind of image")]
    PermissionDenied,

    #[error("unsupported content type: {0}")]
    InvalidFormat(String),

    #[error("original is {size} bytes, limit is {limit} bytes")]
    OriginalTooLarge { size: usize, limit: usize },

    #[error("could not decode image: {0}")]
    DecodeFailure(String),

    #[error("could not encode image: {0}")]
    EncodeFailure(String),

    #[error("processed image is {size} bytes, limit is {limit} bytes")]
    CompressedTooLarge { size: usize, limit: usize },

    #[error("storage rejected the object size: {0}")]
    StorageRejectedSize(String),

    #[error("storage write failed: {0}")]
    StorageFailure(String),

    #[error("unexpected error: {0}")]
    UnknownError(String),
}

impl PipelineError {
    /// Short heading shown to the user.
    pub fn title(&self) -> &'static str {
        match self {
            PipelineError::PermissionDenied => "Permission denied",
            PipelineError::InvalidFormat(_) => "Unsupported file type",
            PipelineError::OriginalTooLarge { .. } => "File too large",
            PipelineError::DecodeFailure(_) => "Unreadable image",
            PipelineError::EncodeFailure(_) => "Image conversion failed",
            PipelineError::CompressedTooLarge { .. } => "Image too large after optimization",
            PipelineError::StorageRejectedSize(_) => "Storage size limit exceeded",
            PipelineError::StorageFailure(_) => "Upload failed",
            PipelineError::UnknownError(_) => "Unexpected error",
        }
    }

    /// Human readable explanation. Never includes the technical cause.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::PermissionDenied => {
                "You do not have permission to upload this image.".to_string()
            }
            PipelineError::InvalidFormat(_) => {
                "Please choose a PNG, JPEG, GIF, WebP or SVG image.".to_string()
            }
            PipelineError::OriginalTooLarge { limit, .. } => format!(
                "The selected file is larger than {} KB. Please choose a smaller image.",
                limit / 1024
            ),
            PipelineError::DecodeFailure(_) => {
                "The file could not be read as an image. It may be corrupted.".to_string()
            }
            PipelineError::EncodeFailure(_) => {
                "The image could not be converted for storage. Please try another file."
                    .to_string()
            }
            PipelineError::CompressedTooLarge { limit, .. } => format!(
                "Even after optimization the image exceeds {} KB. Please use a simpler or smaller image.",
                limit / 1024
            ),
            PipelineError::StorageRejectedSize(_) => {
                "The storage service rejected the file because of its size.".to_string()
            }
            PipelineError::StorageFailure(_) => {
                "The image could not be saved. Please try again later.".to_string()
            }
            PipelineError::UnknownError(_) => {
                "Something went wrong while uploading the image.".to_string()
            }
        }
    }
}

impl From<Error> for PipelineError {
    /// The storage client decides whether a failure was a size rejection;
    /// every non-storage infrastructure error is unexpected.
    fn from(err: Error) -> Self {
        match err {
            Error::StorageTooLarge(message) => PipelineError::StorageRejectedSize(message),
            Error::Storage(message) => PipelineError::StorageFailure(message),
            other => PipelineError::UnknownError(other.to_string()),
        }
    }
}
