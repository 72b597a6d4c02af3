//! Chooses which payload gets published.
//!
//! The normalized variant is preferred. When re-encoding a branding image
//! made it larger than the ceiling, a lossless original that was already
//! within the ceiling is published instead. Avatars never fall back.

use crate::error::PipelineError;
use crate::mime::MediaType;
use crate::models::{ProcessedVariant, UploadRequest, HARD_LIMIT};

/// The submitted bytes as a publishable payload.
pub fn original_payload(request: &UploadRequest, media_type: MediaType) -> ProcessedVariant {
    ProcessedVariant::new(
        request.raw().to_vec(),
        media_type.mime_type(),
        media_type.extension(),
    )
}

/// `candidate` is the normalized variant, or the original for vector input.
pub fn resolve(
    request: &UploadRequest,
    media_type: MediaType,
    candidate: ProcessedVariant,
) -> Result<ProcessedVariant, PipelineError> {
    if candidate.byte_size <= HARD_LIMIT {
        return Ok(candidate);
    }

    if request.byte_size() <= HARD_LIMIT
        && request.purpose().is_branding()
        && media_type.is_lossless_raster()
    {
        tracing::info!(
            "Re-encoded {} grew to {} bytes; publishing the {} byte original instead",
            media_type.mime_type(),
            candidate.byte_size,
            request.byte_size()
        );
        return Ok(original_payload(request, media_type));
    }

    Err(PipelineError::CompressedTooLarge {
        size: candidate.byte_size,
        limit: HARD_LIMIT,
    })
}
