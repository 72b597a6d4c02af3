use super::ImageService;
use crate::error::PipelineError;
use crate::mime::MediaType;
use crate::models::{NormalizationProfile, OutputFormat, ProcessedVariant};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader, Limits, Rgb,
    RgbImage, Rgba, RgbaImage,
};
use std::io::Cursor;

/// Largest width or height we are willing to decode.
const MAX_DECODE_DIMENSION: u32 = 10_000;

/// Target size for a `width` x `height` image inside a `max_width` x
/// `max_height` box, scaled by its longer side. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = if width > height {
        (width > max_width).then(|| max_width as f64 / width as f64)
    } else {
        (height > max_height).then(|| max_height as f64 / height as f64)
    };

    match scale {
        Some(scale) => {
            let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
            (scaled(width), scaled(height))
        }
        None => (width, height),
    }
}

pub struct ImageProcessor {
    filter: FilterType,
    max_decode_dimension: u32,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
            max_decode_dimension: MAX_DECODE_DIMENSION,
        }
    }

    fn decode(
        data: &[u8],
        media_type: MediaType,
        max_dimension: u32,
    ) -> Result<DynamicImage, PipelineError> {
        let decode_failure = |e: image::ImageError| PipelineError::DecodeFailure(e.to_string());

        let mut reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| PipelineError::DecodeFailure(e.to_string()))?;
        // Sniffed format first; the declared type covers bytes sniffing cannot place.
        if reader.format().is_none() {
            if let Some(format) = media_type.image_format() {
                reader.set_format(format);
            }
        }

        let mut limits = Limits::default();
        limits.max_image_width = Some(max_dimension);
        limits.max_image_height = Some(max_dimension);
        reader.limits(limits);

        let mut decoder = reader.into_decoder().map_err(decode_failure)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(decode_failure)?;
        image.apply_orientation(orientation);
        Ok(image)
    }

    fn encode(image: RgbaImage, profile: &NormalizationProfile) -> Result<Vec<u8>, PipelineError> {
        let encode_failure = |e: image::ImageError| PipelineError::EncodeFailure(e.to_string());
        let mut bytes = Vec::new();

        match profile.output_format {
            OutputFormat::Png => {
                DynamicImage::ImageRgba8(image)
                    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                    .map_err(encode_failure)?;
            }
            OutputFormat::Jpeg => {
                let rgb = flatten_onto_white(&image);
                let mut encoder =
                    JpegEncoder::new_with_quality(&mut bytes, profile.encoder_quality());
                encoder
                    .encode(
                        rgb.as_raw(),
                        rgb.width(),
                        rgb.height(),
                        ExtendedColorType::Rgb8,
                    )
                    .map_err(encode_failure)?;
            }
        }

        Ok(bytes)
    }

    fn normalize_sync(
        data: &[u8],
        media_type: MediaType,
        profile: NormalizationProfile,
        filter: FilterType,
        max_decode_dimension: u32,
    ) -> Result<ProcessedVariant, PipelineError> {
        let image = Self::decode(data, media_type, max_decode_dimension)?;
        let (width, height) = (image.width(), image.height());
        let (target_width, target_height) =
            fit_within(width, height, profile.max_width, profile.max_height);

        // The RGBA surface starts fully transparent, so alpha survives the resize.
        let surface = image.to_rgba8();
        let rendered = if (target_width, target_height) == (width, height) {
            surface
        } else {
            imageops::resize(&surface, target_width, target_height, filter)
        };

        tracing::debug!(
            "Normalized {}x{} -> {}x{} as {}",
            width,
            height,
            target_width,
            target_height,
            profile.output_format.mime_type()
        );

        let bytes = Self::encode(rendered, &profile)?;
        Ok(ProcessedVariant::new(
            bytes,
            profile.output_format.mime_type(),
            profile.output_format.extension(),
        )
        .with_dimensions(target_width, target_height))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops alpha for formats without transparency by compositing over white.
fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = a as u16;
        let blend = |channel: u8| {
            ((channel as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn normalize(
        &self,
        data: &[u8],
        media_type: MediaType,
        profile: NormalizationProfile,
    ) -> Result<ProcessedVariant, PipelineError> {
        let data = data.to_vec();
        let filter = self.filter;
        let max_decode_dimension = self.max_decode_dimension;

        tokio::task::spawn_blocking(move || {
            Self::normalize_sync(&data, media_type, profile, filter, max_decode_dimension)
        })
        .await
        .map_err(|e| {
            PipelineError::UnknownError(format!("Image processing task join error: {}", e))
        })?
    }
}
