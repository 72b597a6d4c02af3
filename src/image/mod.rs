//! Raster normalization
//!
//! Decodes uploaded raster images, fits them inside the purpose's bounding
//! box without changing aspect ratio, and re-encodes them to the profile's
//! storage format.

pub mod mock;
pub mod processor;

pub use mock::MockImageProcessor;
pub use processor::{fit_within, ImageProcessor};

use crate::error::PipelineError;
use crate::mime::MediaType;
use crate::models::{NormalizationProfile, ProcessedVariant};
use async_trait::async_trait;

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn normalize(
        &self,
        data: &[u8],
        media_type: MediaType,
        profile: NormalizationProfile,
    ) -> Result<ProcessedVariant, PipelineError>;
}
