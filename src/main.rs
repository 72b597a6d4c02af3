use anyhow::{Context, Result};
use campus_media::mime::{detect_image_mime, MediaType};
use campus_media::models::{Caller, Config, Purpose, Role, UploadConfig, UploadRequest};
use campus_media::pipeline::MediaPipeline;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "campus-media")]
#[command(about = "Validate, normalize and publish a logo or avatar image")]
struct CliArgs {
    /// Image file to upload.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// What the image is for: logo, staff-avatar or student-avatar.
    #[arg(long, value_parser = parse_purpose)]
    purpose: Purpose,

    /// Staff or student identifier used in the storage key.
    #[arg(long)]
    identifier: Option<String>,

    /// Declared content type. Sniffed from the file when omitted.
    #[arg(long)]
    mime: Option<String>,

    /// Role of the uploading user.
    #[arg(long, default_value = "admin", value_parser = parse_role)]
    role: Role,

    /// Print the published asset as JSON instead of the bare URL.
    #[arg(long)]
    json: bool,
}

fn parse_purpose(input: &str) -> std::result::Result<Purpose, String> {
    input.parse()
}

fn parse_role(input: &str) -> std::result::Result<Role, String> {
    input.parse()
}

/// Content type to declare for `path`: magic bytes first, then the extension.
fn declared_mime(path: &Path, bytes: &[u8]) -> String {
    detect_image_mime(bytes)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(MediaType::from_extension)
                .map(MediaType::mime_type)
        })
        .unwrap_or("application/octet-stream")
        .to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_media=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let mime = args
        .mime
        .clone()
        .unwrap_or_else(|| declared_mime(&args.file, &bytes));
    info!(
        "Uploading {} ({} bytes, {}) as {}",
        args.file.display(),
        bytes.len(),
        mime,
        args.purpose
    );

    let mut upload_config = UploadConfig::new(args.purpose);
    if let Some(identifier) = args.identifier.clone() {
        upload_config = upload_config.with_identifier(identifier);
    }
    let request = UploadRequest::new(bytes, mime, upload_config);

    let config = Config::from_env()?;
    let pipeline = match MediaPipeline::from_config(&config).await {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Failed to initialize pipeline: {}", e);
            std::process::exit(1);
        }
    };

    match pipeline
        .upload_asset(&Caller::new(args.role), request)
        .await
    {
        Some(asset) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&asset)?);
            } else {
                println!("{}", asset.public_url);
            }
            Ok(())
        }
        None => std::process::exit(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_purpose_arg() {
        assert_eq!(parse_purpose("staff-avatar").unwrap(), Purpose::StaffAvatar);
        assert!(parse_purpose("poster").unwrap_err().contains("logo"));
    }

    #[test]
    fn test_parse_role_arg() {
        assert_eq!(parse_role("Guest").unwrap(), Role::Guest);
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn test_declared_mime_prefers_magic_bytes() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]).unwrap();
        let bytes = std::fs::read(file.path()).unwrap();

        assert_eq!(declared_mime(file.path(), &bytes), "image/png");
    }

    #[test]
    fn test_declared_mime_falls_back_to_extension() {
        assert_eq!(
            declared_mime(Path::new("logo.WEBP"), &[0, 1, 2]),
            "image/webp"
        );
        assert_eq!(
            declared_mime(Path::new("notes.txt"), b"hello"),
            "application/octet-stream"
        );
    }
}
