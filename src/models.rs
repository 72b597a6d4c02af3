//! Data models and structures
//!
//! Defines the upload request, normalization profiles, candidate payloads and
//! the published result, plus environment configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hard ceiling for both the submitted original and whatever gets published.
pub const HARD_LIMIT: usize = 200 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    Logo,
    StaffAvatar,
    StudentAvatar,
}

impl Purpose {
    pub fn profile(self) -> NormalizationProfile {
        match self {
            Purpose::Logo => NormalizationProfile::BRANDING,
            Purpose::StaffAvatar | Purpose::StudentAvatar => NormalizationProfile::AVATAR,
        }
    }

    pub fn is_branding(self) -> bool {
        matches!(self, Purpose::Logo)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Logo => "logo",
            Purpose::StaffAvatar => "staff-avatar",
            Purpose::StudentAvatar => "student-avatar",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logo" => Ok(Purpose::Logo),
            "staff-avatar" | "staff" => Ok(Purpose::StaffAvatar),
            "student-avatar" | "student" => Ok(Purpose::StudentAvatar),
            other => Err(format!(
                "Invalid purpose '{}'. Expected one of: logo, staff-avatar, student-avatar",
                other
            )),
        }
    }
}

/// Role of the signed-in user, as decided by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Guest,
}

impl Role {
    pub fn can_upload(self, purpose: Purpose) -> bool {
        match self {
            Role::Admin => true,
            Role::Staff => !purpose.is_branding(),
            Role::Guest => false,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "guest" => Ok(Role::Guest),
            other => Err(format!(
                "Invalid role '{}'. Expected one of: admin, staff, guest",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub role: Role,
}

impl Caller {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

/// Caller supplied half of an upload: what the image is for and whose it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub purpose: Purpose,
    pub identifier: Option<String>,
}

impl UploadConfig {
    pub fn new(purpose: Purpose) -> Self {
        Self {
            purpose,
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// A submitted upload. Fields are read-only after construction.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    raw: Vec<u8>,
    declared_mime: String,
    purpose: Purpose,
    identifier: Option<String>,
}

impl UploadRequest {
    pub fn new(raw: Vec<u8>, declared_mime: impl Into<String>, config: UploadConfig) -> Self {
        Self {
            raw,
            declared_mime: declared_mime.into(),
            purpose: config.purpose,
            identifier: config.identifier,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn byte_size(&self) -> usize {
        self.raw.len()
    }

    pub fn declared_mime(&self) -> &str {
        &self.declared_mime
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Bounding box and encoding target for a purpose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationProfile {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality in `0.0..=1.0`; only the lossy format uses it.
    pub quality: f32,
    pub output_format: OutputFormat,
}

impl NormalizationProfile {
    pub const BRANDING: Self = Self {
        max_width: 500,
        max_height: 500,
        quality: 1.0,
        output_format: OutputFormat::Png,
    };

    pub const AVATAR: Self = Self {
        max_width: 300,
        max_height: 300,
        quality: 0.7,
        output_format: OutputFormat::Jpeg,
    };

    /// Quality on the 1-100 scale JPEG encoders take.
    pub fn encoder_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// A candidate payload for publication: a re-encoded image or the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedVariant {
    pub data: Vec<u8>,
    pub byte_size: usize,
    pub mime_type: String,
    pub extension: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProcessedVariant {
    pub fn new(data: Vec<u8>, mime_type: &str, extension: &str) -> Self {
        Self {
            byte_size: data.len(),
            data,
            mime_type: mime_type.to_string(),
            extension: extension.to_string(),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAsset {
    pub storage_key: String,
    pub public_url: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_access_key_id: Option<String>,
    pub storage_secret_access_key: Option<String>,
    pub storage_endpoint: String,
    pub storage_region: String,
    pub storage_bucket: String,
    pub storage_public_base_url: String,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let dry_run = var("DRY_RUN")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let storage_access_key_id = var("STORAGE_ACCESS_KEY_ID");
        let storage_secret_access_key = var("STORAGE_SECRET_ACCESS_KEY");
        if !dry_run {
            if storage_access_key_id.is_none() {
                return Err(crate::Error::Config(
                    "STORAGE_ACCESS_KEY_ID not set".to_string(),
                ));
            }
            if storage_secret_access_key.is_none() {
                return Err(crate::Error::Config(
                    "STORAGE_SECRET_ACCESS_KEY not set".to_string(),
                ));
            }
        }

        let storage_endpoint = var("STORAGE_ENDPOINT")
            .unwrap_or_else(|| "https://nyc3.digitaloceanspaces.com".to_string());
        let storage_bucket = var("STORAGE_BUCKET").unwrap_or_else(|| "school-assets".to_string());
        let storage_public_base_url = var("STORAGE_PUBLIC_BASE_URL").unwrap_or_else(|| {
            format!("{}/{}", storage_endpoint.trim_end_matches('/'), storage_bucket)
        });

        Ok(Self {
            storage_access_key_id,
            storage_secret_access_key,
            storage_region: var("STORAGE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            storage_endpoint,
            storage_bucket,
            storage_public_base_url,
            dry_run,
        })
    }
}
