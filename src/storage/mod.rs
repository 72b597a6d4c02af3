//! Object storage integration for publishing uploaded images
//!
//! Writes chosen payloads to S3-compatible storage (DigitalOcean Spaces or
//! any path-style endpoint) and resolves their public addresses.

pub mod client;
pub mod mock;

pub use client::S3StorageClient;
pub use mock::MockStorageClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes `data` under `key`, replacing any object already stored there.
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;
    fn public_url(&self, key: &str) -> String;
}
