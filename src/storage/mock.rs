use super::StorageService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Failure {
    Unavailable(String),
    TooLarge(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store. Writes to an existing key replace it.
#[derive(Clone)]
pub struct MockStorageClient {
    files: Arc<Mutex<HashMap<String, StoredObject>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    failure: Arc<Mutex<Option<Failure>>>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Every upload fails with a storage error carrying `message`.
    pub fn with_failure(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::Unavailable(message.to_string()));
        self
    }

    /// Every upload is refused as too large, like an HTTP 413 from the store.
    pub fn with_size_rejection(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::TooLarge(message.to_string()));
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, StoredObject> {
        self.files.lock().unwrap().clone()
    }

    pub fn get_file(&self, key: &str) -> Option<StoredObject> {
        self.files.lock().unwrap().get(key).cloned()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        *self.upload_count.lock().unwrap() += 1;

        match self.failure.lock().unwrap().clone() {
            Some(Failure::Unavailable(message)) => return Err(Error::Storage(message)),
            Some(Failure::TooLarge(message)) => return Err(Error::StorageTooLarge(message)),
            None => {}
        }

        self.files.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_storage_upload() {
        let client = MockStorageClient::new();

        client
            .upload_file("logo-1.png", b"png", "image/png")
            .await
            .unwrap();

        assert_eq!(client.get_upload_count(), 1);
        assert!(client.get_file("logo-1.png").is_some());
        assert!(client.get_file("missing.png").is_none());
        assert_eq!(
            client.public_url("logo-1.png"),
            "https://mock-storage.example.com/logo-1.png"
        );
    }

    #[tokio::test]
    async fn test_mock_storage_overwrites_same_key() {
        let client = MockStorageClient::new();

        client
            .upload_file("avatars/a-1.jpg", b"first", "image/jpeg")
            .await
            .unwrap();
        client
            .upload_file("avatars/a-1.jpg", b"second", "image/png")
            .await
            .unwrap();

        let stored = client.get_file("avatars/a-1.jpg").unwrap();
        assert_eq!(stored.data, b"second");
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(client.get_files().len(), 1);
        assert_eq!(client.get_upload_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_storage_with_custom_base_url() {
        let client = MockStorageClient::new().with_base_url("https://custom.test".to_string());
        assert_eq!(client.public_url("x.png"), "https://custom.test/x.png");
    }

    #[tokio::test]
    async fn test_mock_storage_with_failure() {
        let client = MockStorageClient::new().with_failure("bucket offline");

        let result = client.upload_file("x.png", b"png", "image/png").await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("bucket offline"));
        assert!(client.get_files().is_empty());
    }

    #[tokio::test]
    async fn test_mock_storage_with_size_rejection() {
        let client = MockStorageClient::new().with_size_rejection("EntityTooLarge");

        let result = client.upload_file("x.png", b"png", "image/png").await;

        assert!(matches!(result, Err(Error::StorageTooLarge(_))));
        assert!(client.get_files().is_empty());
    }
}
