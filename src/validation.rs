//! Cheap checks run before any decoding.

use crate::error::PipelineError;
use crate::mime::MediaType;
use crate::models::{UploadRequest, HARD_LIMIT};

/// Checks the declared type against the allow-list, then the original size.
pub fn validate(request: &UploadRequest) -> Result<MediaType, PipelineError> {
    let media_type = MediaType::from_mime(request.declared_mime())
        .ok_or_else(|| PipelineError::InvalidFormat(request.declared_mime().to_string()))?;

    if request.byte_size() > HARD_LIMIT {
        return Err(PipelineError::OriginalTooLarge {
            size: request.byte_size(),
            limit: HARD_LIMIT,
        });
    }

    Ok(media_type)
}
