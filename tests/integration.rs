use campus_media::{
    clock::FixedClock,
    feedback::{FeedbackKind, RecordingFeedback},
    image::{ImageProcessor, MockImageProcessor},
    models::{Caller, Purpose, Role, UploadConfig, UploadRequest, HARD_LIMIT},
    pipeline::{MediaPipeline, PipelineServices},
    storage::MockStorageClient,
    PipelineError,
};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::io::Cursor;

const T0: i64 = 1_726_000_000_000;

fn build_pipeline(
    storage: &MockStorageClient,
    feedback: &RecordingFeedback,
) -> MediaPipeline {
    MediaPipeline::with_services(PipelineServices {
        image: Box::new(ImageProcessor::new()),
        storage: Box::new(storage.clone()),
        feedback: Box::new(feedback.clone()),
        clock: Box::new(FixedClock::new(T0)),
    })
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn solid_png(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([20, 120, 200, 255]),
        )),
        ImageFormat::Png,
    )
}

fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

/// Deterministic pseudo-random pixels; compresses poorly.
fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    let img = RgbaImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, a] = state.to_le_bytes();
        Rgba([r, g, b, a | 0x80])
    });
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

/// Grayscale noise: one byte per pixel on disk, three or more once the
/// normalizer re-encodes it as RGBA.
fn noisy_gray_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    let img = GrayImage::from_fn(width, height, |_, _| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Luma([state.to_le_bytes()[0]])
    });
    encode(DynamicImage::ImageLuma8(img), ImageFormat::Png)
}

fn upload(bytes: Vec<u8>, mime: &str, purpose: Purpose, id: Option<&str>) -> UploadRequest {
    let mut config = UploadConfig::new(purpose);
    if let Some(id) = id {
        config = config.with_identifier(id);
    }
    UploadRequest::new(bytes, mime, config)
}

#[tokio::test]
async fn test_logo_is_normalized_and_published() {
    let storage = MockStorageClient::new().with_base_url("https://assets.school.test".to_string());
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);

    let url = pipeline
        .upload(
            &Caller::new(Role::Admin),
            upload(solid_png(2000, 1200), "image/png", Purpose::Logo, None),
        )
        .await
        .unwrap();

    let key = format!("school-logo-{}.png", T0);
    assert_eq!(url, format!("https://assets.school.test/{}", key));

    let stored = storage.get_file(&key).unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert!(stored.data.len() <= HARD_LIMIT);
    let published = image::load_from_memory(&stored.data).unwrap();
    assert_eq!((published.width(), published.height()), (500, 300));

    let report = feedback.latest().unwrap();
    assert_eq!(report.kind, FeedbackKind::Success);
}

#[tokio::test]
async fn test_staff_avatar_is_converted_to_jpeg() {
    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);

    let asset = pipeline
        .ingest(
            &Caller::new(Role::Staff),
            upload(
                gradient_jpeg(400, 600),
                "image/jpeg",
                Purpose::StaffAvatar,
                Some("staff-12"),
            ),
        )
        .await
        .unwrap();

    assert_eq!(asset.storage_key, format!("avatars/staff-12-{}.jpg", T0));
    let stored = storage.get_file(&asset.storage_key).unwrap();
    assert_eq!(stored.content_type, "image/jpeg");
    let published = image::load_from_memory(&stored.data).unwrap();
    assert_eq!((published.width(), published.height()), (200, 300));
    assert!(feedback.is_empty());
}

#[tokio::test]
async fn test_webp_input_is_never_published_as_webp() {
    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);
    let webp = encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 640, Rgba([1, 2, 3, 255]))),
        ImageFormat::WebP,
    );

    let asset = pipeline
        .ingest(
            &Caller::new(Role::Admin),
            upload(webp, "image/webp", Purpose::StudentAvatar, Some("s-4")),
        )
        .await
        .unwrap();

    assert!(asset.storage_key.ends_with(".jpg"));
    assert_eq!(
        storage.get_file(&asset.storage_key).unwrap().content_type,
        "image/jpeg"
    );
}

#[tokio::test]
async fn test_every_published_payload_fits_the_ceiling() {
    let inputs = vec![
        (solid_png(3000, 500), "image/png", Purpose::Logo),
        (noisy_png(180, 180), "image/png", Purpose::Logo),
        (noisy_png(180, 180), "image/png", Purpose::StaffAvatar),
        (gradient_jpeg(600, 450), "image/jpeg", Purpose::StudentAvatar),
        (gradient_jpeg(64, 64), "image/jpeg", Purpose::Logo),
    ];

    for (index, (bytes, mime, purpose)) in inputs.into_iter().enumerate() {
        let storage = MockStorageClient::new();
        let feedback = RecordingFeedback::new();
        let pipeline = build_pipeline(&storage, &feedback);
        let id = format!("case-{}", index);

        match pipeline
            .ingest(
                &Caller::new(Role::Admin),
                upload(bytes, mime, purpose, Some(&id)),
            )
            .await
        {
            Ok(asset) => {
                let stored = storage.get_file(&asset.storage_key).unwrap();
                assert!(stored.data.len() <= HARD_LIMIT, "case {}", index);
            }
            Err(PipelineError::CompressedTooLarge { .. }) => {
                assert!(storage.get_files().is_empty());
            }
            Err(other) => panic!("case {} failed unexpectedly: {}", index, other),
        }
    }
}

#[tokio::test]
async fn test_oversized_original_is_rejected_and_reported() {
    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);

    let url = pipeline
        .upload(
            &Caller::new(Role::Admin),
            upload(vec![0u8; 250 * 1024], "image/jpeg", Purpose::Logo, None),
        )
        .await;

    assert!(url.is_none());
    assert!(storage.get_files().is_empty());
    let report = feedback.latest().unwrap();
    assert_eq!(report.kind, FeedbackKind::Error);
    assert_eq!(report.title, "File too large");
}

#[tokio::test]
async fn test_corrupt_png_is_a_decode_failure() {
    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);
    let mut bytes = solid_png(50, 50);
    bytes.truncate(30);

    let err = pipeline
        .ingest(
            &Caller::new(Role::Admin),
            upload(bytes, "image/png", Purpose::StaffAvatar, None),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DecodeFailure(_)));
}

#[tokio::test]
async fn test_unsupported_type_is_reported() {
    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);

    let url = pipeline
        .upload(
            &Caller::new(Role::Admin),
            upload(b"%PDF-1.7".to_vec(), "application/pdf", Purpose::Logo, None),
        )
        .await;

    assert!(url.is_none());
    assert_eq!(feedback.latest().unwrap().title, "Unsupported file type");
}

#[tokio::test]
async fn test_fallback_applies_to_logo_but_not_avatar() {
    let original = vec![5u8; 150 * 1024];

    for (purpose, expect_published) in [
        (Purpose::Logo, true),
        (Purpose::StaffAvatar, false),
        (Purpose::StudentAvatar, false),
    ] {
        let storage = MockStorageClient::new();
        let feedback = RecordingFeedback::new();
        let pipeline = MediaPipeline::with_services(PipelineServices {
            image: Box::new(MockImageProcessor::new().with_output_size(210 * 1024)),
            storage: Box::new(storage.clone()),
            feedback: Box::new(feedback.clone()),
            clock: Box::new(FixedClock::new(T0)),
        });

        let result = pipeline
            .ingest(
                &Caller::new(Role::Admin),
                upload(original.clone(), "image/png", purpose, Some("x")),
            )
            .await;

        if expect_published {
            let asset = result.unwrap();
            let stored = storage.get_file(&asset.storage_key).unwrap();
            assert_eq!(stored.data, original);
            assert_eq!(stored.content_type, "image/png");
        } else {
            assert!(matches!(
                result,
                Err(PipelineError::CompressedTooLarge { .. })
            ));
        }
    }
}

#[tokio::test]
async fn test_logo_falls_back_to_original_when_reencoding_inflates_it() {
    let original = noisy_gray_png(400, 400);
    assert!(original.len() <= HARD_LIMIT, "{} bytes", original.len());

    let storage = MockStorageClient::new();
    let feedback = RecordingFeedback::new();
    let pipeline = build_pipeline(&storage, &feedback);

    let asset = pipeline
        .ingest(
            &Caller::new(Role::Admin),
            upload(original.clone(), "image/png", Purpose::Logo, Some("crest")),
        )
        .await
        .unwrap();

    assert_eq!(asset.storage_key, format!("crest-{}.png", T0));
    let stored = storage.get_file(&asset.storage_key).unwrap();
    assert_eq!(stored.content_type, "image/png");
    assert!(stored.data == original, "original bytes were not published");
}
