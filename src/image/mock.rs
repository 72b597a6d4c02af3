use super::ImageService;
use crate::error::PipelineError;
use crate::mime::MediaType;
use crate::models::{NormalizationProfile, ProcessedVariant};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Stand-in normalizer that never decodes. By default it echoes the input
/// bytes back in the profile's output format.
#[derive(Clone)]
pub struct MockImageProcessor {
    process_count: Arc<Mutex<usize>>,
    output_size: Arc<Mutex<Option<usize>>>,
    failure: Arc<Mutex<Option<PipelineError>>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(Mutex::new(0)),
            output_size: Arc::new(Mutex::new(None)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Makes every normalized variant exactly `size` bytes long.
    pub fn with_output_size(self, size: usize) -> Self {
        *self.output_size.lock().unwrap() = Some(size);
        self
    }

    pub fn with_failure(self, error: PipelineError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    pub fn get_process_count(&self) -> usize {
        *self.process_count.lock().unwrap()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn normalize(
        &self,
        data: &[u8],
        _media_type: MediaType,
        profile: NormalizationProfile,
    ) -> Result<ProcessedVariant, PipelineError> {
        *self.process_count.lock().unwrap() += 1;

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        let bytes = match *self.output_size.lock().unwrap() {
            Some(size) => vec![0u8; size],
            None => data.to_vec(),
        };

        Ok(ProcessedVariant::new(
            bytes,
            profile.output_format.mime_type(),
            profile.output_format.extension(),
        ))
    }
}
