use super::StorageService;
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{config::Region, types::ObjectCannedAcl, Client as S3Client};

pub struct S3StorageClient {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        access_key_id: String,
        secret_access_key: String,
        endpoint: String,
        region: String,
        bucket: String,
        base_url: String,
    ) -> Result<Self> {
        let credentials = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "campus-media-storage",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region))
            .endpoint_url(endpoint)
            .load()
            .await;

        // Path-style keeps the bucket out of the hostname for self-hosted endpoints.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: S3Client::from_conf(s3_config),
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let access_key_id = config
            .storage_access_key_id
            .clone()
            .ok_or_else(|| Error::Config("STORAGE_ACCESS_KEY_ID not set".to_string()))?;
        let secret_access_key = config
            .storage_secret_access_key
            .clone()
            .ok_or_else(|| Error::Config("STORAGE_SECRET_ACCESS_KEY not set".to_string()))?;

        Self::new(
            access_key_id,
            secret_access_key,
            config.storage_endpoint.clone(),
            config.storage_region.clone(),
            config.storage_bucket.clone(),
            config.storage_public_base_url.clone(),
        )
        .await
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                let detail = format!("Failed to upload {}: {}", key, DisplayErrorContext(&e));
                if is_size_rejection(&e) {
                    Error::StorageTooLarge(detail)
                } else {
                    Error::Storage(detail)
                }
            })?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

/// Classifies from the response itself, never from our own request details.
fn is_size_rejection<E: ProvideErrorMetadata>(err: &SdkError<E, HttpResponse>) -> bool {
    let status = err.raw_response().map(|response| response.status().as_u16());
    size_rejected(status, err.code(), err.message())
}

fn size_rejected(status: Option<u16>, code: Option<&str>, message: Option<&str>) -> bool {
    if status == Some(413) || code == Some("EntityTooLarge") {
        return true;
    }
    // Some S3-compatible stores only say it in the service message.
    message.is_some_and(|message| {
        let lower = message.to_ascii_lowercase();
        lower.contains("too large") || lower.contains("maximum allowed size")
    })
}
