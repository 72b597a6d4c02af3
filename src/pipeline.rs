//! Upload orchestration: permission gate, validation, normalization, size
//! policy and publishing.

use crate::clock::{Clock, SystemClock};
use crate::error::PipelineError;
use crate::feedback::{Feedback, FeedbackReporter, TracingFeedback};
use crate::image::{ImageProcessor, ImageService};
use crate::mime::{looks_like_svg, MediaType};
use crate::models::{
    Caller, Config, ProcessedVariant, PublishedAsset, UploadRequest, HARD_LIMIT,
};
use crate::naming::{self, StorageKey};
use crate::storage::{MockStorageClient, S3StorageClient, StorageService};
use crate::{policy, validation, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs uploads from submission to a published public URL.
pub struct MediaPipeline {
    image: Box<dyn ImageService>,
    storage: Box<dyn StorageService>,
    feedback: Box<dyn FeedbackReporter>,
    clock: Box<dyn Clock>,
    slots: SlotLocks,
}

/// Injectable service bundle used to construct [`MediaPipeline`].
pub struct PipelineServices {
    pub image: Box<dyn ImageService>,
    pub storage: Box<dyn StorageService>,
    pub feedback: Box<dyn FeedbackReporter>,
    pub clock: Box<dyn Clock>,
}

impl MediaPipeline {
    pub fn with_services(services: PipelineServices) -> Self {
        Self {
            image: services.image,
            storage: services.storage,
            feedback: services.feedback,
            clock: services.clock,
            slots: SlotLocks::default(),
        }
    }

    /// Production wiring. Dry-run mode keeps uploads in memory.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage: Box<dyn StorageService> = if config.dry_run {
            info!("DRY_RUN enabled, uploads stay in memory");
            Box::new(MockStorageClient::new().with_base_url(config.storage_public_base_url.clone()))
        } else {
            info!(
                "Publishing to bucket {} at {}",
                config.storage_bucket, config.storage_endpoint
            );
            Box::new(S3StorageClient::from_config(config).await?)
        };

        Ok(Self::with_services(PipelineServices {
            image: Box::new(ImageProcessor::new()),
            storage,
            feedback: Box::new(TracingFeedback),
            clock: Box::new(SystemClock),
        }))
    }

    /// Uploads and returns the public URL, or `None` after reporting the
    /// failure through the feedback channel.
    pub async fn upload(&self, caller: &Caller, request: UploadRequest) -> Option<String> {
        self.upload_asset(caller, request)
            .await
            .map(|asset| asset.public_url)
    }

    /// Like [`upload`](Self::upload) but keeps the storage key.
    pub async fn upload_asset(
        &self,
        caller: &Caller,
        request: UploadRequest,
    ) -> Option<PublishedAsset> {
        let purpose = request.purpose();

        match self.ingest(caller, request).await {
            Ok(asset) => {
                if purpose.is_branding() {
                    self.feedback.report(Feedback::success(
                        "Logo updated",
                        "The new logo has been saved.",
                    ));
                }
                Some(asset)
            }
            Err(err) => {
                error!("Upload of {} failed: {}", purpose, err);
                self.feedback.report(Feedback::from(&err));
                None
            }
        }
    }

    /// Runs every stage and returns the typed outcome. Nothing is reported.
    pub async fn ingest(
        &self,
        caller: &Caller,
        request: UploadRequest,
    ) -> std::result::Result<PublishedAsset, PipelineError> {
        let span = info_span!(
            "ingest",
            request_id = %Uuid::new_v4(),
            purpose = %request.purpose()
        );
        self.run_stages(caller, &request).instrument(span).await
    }

    async fn run_stages(
        &self,
        caller: &Caller,
        request: &UploadRequest,
    ) -> std::result::Result<PublishedAsset, PipelineError> {
        let purpose = request.purpose();
        if !caller.role.can_upload(purpose) {
            warn!("{:?} may not upload {}", caller.role, purpose);
            return Err(PipelineError::PermissionDenied);
        }

        let submitted_at = self.clock.now_millis();
        let media_type = validation::validate(request)?;
        info!(
            "Accepted {} ({} bytes)",
            media_type.mime_type(),
            request.byte_size()
        );

        let candidate = self.normalize(request, media_type).await?;
        let chosen = policy::resolve(request, media_type, candidate)?;
        if chosen.byte_size > HARD_LIMIT {
            return Err(Error::Invariant(format!(
                "payload of {} bytes reached the publisher",
                chosen.byte_size
            ))
            .into());
        }

        self.publish(request, chosen, submitted_at).await
    }

    async fn normalize(
        &self,
        request: &UploadRequest,
        media_type: MediaType,
    ) -> std::result::Result<ProcessedVariant, PipelineError> {
        if media_type.is_vector() {
            if !looks_like_svg(request.raw()) {
                return Err(PipelineError::DecodeFailure(
                    "payload is not an SVG document".to_string(),
                ));
            }
            return Ok(policy::original_payload(request, media_type));
        }

        let variant = self
            .image
            .normalize(request.raw(), media_type, request.purpose().profile())
            .await?;
        info!(
            "Normalized {} bytes -> {} bytes ({})",
            request.byte_size(),
            variant.byte_size,
            variant.mime_type
        );
        Ok(variant)
    }

    async fn publish(
        &self,
        request: &UploadRequest,
        payload: ProcessedVariant,
        submitted_at: i64,
    ) -> std::result::Result<PublishedAsset, PipelineError> {
        let purpose = request.purpose();
        let key = StorageKey::new(
            purpose,
            request.identifier(),
            submitted_at,
            &payload.extension,
        );

        // Uploads for the same slot publish one at a time, in arrival order.
        let slot_name = format!(
            "{}/{}",
            purpose,
            naming::slot_name(purpose, request.identifier())
        );
        let written = {
            let slot = self.slots.acquire(&slot_name);
            let _held = slot.lock().await;
            self.storage
                .upload_file(key.as_str(), &payload.data, &payload.mime_type)
                .await
        };
        written?;

        let public_url = self.storage.public_url(key.as_str());
        info!(
            "Published {} ({} bytes, {})",
            key, payload.byte_size, payload.mime_type
        );

        Ok(PublishedAsset {
            storage_key: key.into_string(),
            public_url,
        })
    }
}

/// Per-slot async locks. Entries live only while some upload holds or waits
/// on them.
#[derive(Default)]
struct SlotLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    holders: usize,
}

impl SlotLocks {
    fn acquire(&self, name: &str) -> SlotHandle<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(name.to_string()).or_insert_with(|| Slot {
            lock: Arc::new(AsyncMutex::new(())),
            holders: 0,
        });
        slot.holders += 1;

        SlotHandle {
            locks: self,
            name: name.to_string(),
            lock: Arc::clone(&slot.lock),
        }
    }

    fn release(&self, name: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(name) {
            slot.holders -= 1;
            if slot.holders == 0 {
                slots.remove(name);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration in [`SlotLocks`]. Dropping it, even from a cancelled
/// upload still waiting for the lock, gives the registration back.
struct SlotHandle<'a> {
    locks: &'a SlotLocks,
    name: String,
    lock: Arc<AsyncMutex<()>>,
}

impl SlotHandle<'_> {
    async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for SlotHandle<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.name);
    }
}
