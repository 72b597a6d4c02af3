//! Accepted image content types and magic-byte sniffing.

use image::ImageFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Gif,
    Jpeg,
    Svg,
    /// Accepted as input only; never chosen as an output format.
    WebP,
}

impl MediaType {
    /// Parses a declared content type. Case and parameters are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/gif" => Some(MediaType::Gif),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/svg+xml" => Some(MediaType::Svg),
            "image/webp" => Some(MediaType::WebP),
            _ => None,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(MediaType::Png),
            "gif" => Some(MediaType::Gif),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "svg" => Some(MediaType::Svg),
            "webp" => Some(MediaType::WebP),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Svg => "image/svg+xml",
            MediaType::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Png => "png",
            MediaType::Gif => "gif",
            MediaType::Jpeg => "jpg",
            MediaType::Svg => "svg",
            MediaType::WebP => "webp",
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, MediaType::Svg)
    }

    pub fn is_lossless_raster(self) -> bool {
        matches!(self, MediaType::Png | MediaType::Gif)
    }

    /// Decoder format for raster types.
    pub fn image_format(self) -> Option<ImageFormat> {
        match self {
            MediaType::Png => Some(ImageFormat::Png),
            MediaType::Gif => Some(ImageFormat::Gif),
            MediaType::Jpeg => Some(ImageFormat::Jpeg),
            MediaType::WebP => Some(ImageFormat::WebP),
            MediaType::Svg => None,
        }
    }
}

pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ if looks_like_svg(bytes) => Some("image/svg+xml"),
        _ => {
            tracing::debug!(
                "Unrecognized image signature (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}

/// True when the payload is UTF-8 text containing an `<svg` element.
pub fn looks_like_svg(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes)
        .map(|text| text.contains("<svg"))
        .unwrap_or(false)
}
