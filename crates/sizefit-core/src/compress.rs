//! Top-level compression entry point.
//!
//! [`CompressOptions`] is the caller-facing option bag. Field names are
//! camelCase on the wire so a plain JavaScript object deserializes
//! directly:
//!
//! ```json
//! { "qualityPercent": 80, "maxFileSize": 1048576, "format": "image/jpeg" }
//! ```

use serde::{Deserialize, Serialize};

use crate::converge::{CompressError, CompressionRequest, Convergence, SizeConverger};
use crate::encode::{EncodedImage, RasterEncoder};
use crate::{ImageFormat, SourceImage};

/// Options for [`compress_image`]. Every field is optional; see
/// [`CompressionRequest::from_options`] for the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressOptions {
    /// Starting quality, 0-100.
    pub quality_percent: Option<i32>,
    /// Largest acceptable output in bytes. Must not exceed the source size;
    /// 0 disables the size search.
    pub max_file_size: Option<u64>,
    /// Smallest acceptable output in bytes.
    pub min_file_size: Option<u64>,
    /// Output format. Defaults to the source format.
    pub format: Option<ImageFormat>,
    /// Give up after this many encodes instead of searching forever.
    pub max_attempts: Option<u32>,
}

/// Compress `source` so its size lands in the requested window.
///
/// # Example
///
/// ```ignore
/// use sizefit_core::{compress_image, CompressOptions, ImageFormat, SourceImage};
///
/// let bytes = std::fs::read("photo.png").unwrap();
/// let source = SourceImage::with_mime_type(&bytes, "image/png");
/// let options = CompressOptions {
///     quality_percent: Some(80),
///     max_file_size: Some(1024 * 1024),
///     format: Some(ImageFormat::Jpeg),
///     ..Default::default()
/// };
/// let jpeg = compress_image(&source, &options).unwrap();
/// ```
pub fn compress_image(
    source: &SourceImage<'_>,
    options: &CompressOptions,
) -> Result<EncodedImage, CompressError> {
    compress_image_traced(source, options).map(Convergence::into_image)
}

/// Like [`compress_image`], but also returns every attempt made.
pub fn compress_image_traced(
    source: &SourceImage<'_>,
    options: &CompressOptions,
) -> Result<Convergence, CompressError> {
    let request = CompressionRequest::from_options(source.size(), options);
    SizeConverger::new(RasterEncoder::new()).converge(source, &request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncodeError;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    /// Noisy PNG: incompressible enough that JPEG size tracks quality.
    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0xDEAD_BEEF;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_shrinks_below_max_in_steps_of_ten() {
        let bytes = noisy_png(128, 128);
        let source = SourceImage::with_mime_type(&bytes, "image/png");
        let max = source.size() / 4;
        let options = CompressOptions {
            max_file_size: Some(max),
            format: Some(ImageFormat::Jpeg),
            max_attempts: Some(20),
            ..Default::default()
        };

        let convergence = compress_image_traced(&source, &options).unwrap();
        assert!(convergence.image.size() <= max);
        assert!(convergence.image.size() >= 512);
        assert_eq!(convergence.image.format(), ImageFormat::Jpeg);

        let qualities: Vec<i32> = convergence
            .attempts
            .iter()
            .map(|a| a.quality_percent)
            .collect();
        assert_eq!(qualities[0], 100);
        for pair in qualities.windows(2) {
            assert_eq!(pair[1], pair[0] - 10);
        }
    }

    #[test]
    fn test_webp_target_shrinks_below_max() {
        let bytes = noisy_png(128, 128);
        let source = SourceImage::new(&bytes);
        let max = source.size() / 3;
        let options = CompressOptions {
            max_file_size: Some(max),
            format: Some(ImageFormat::Webp),
            max_attempts: Some(20),
            ..Default::default()
        };

        let convergence = compress_image_traced(&source, &options).unwrap();
        assert!(convergence.image.size() <= max);
        assert_eq!(convergence.image.format(), ImageFormat::Webp);
        assert!(convergence.total_attempts > 1);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let bytes = noisy_png(64, 64);
        let source = SourceImage::new(&bytes);
        let options = CompressOptions {
            quality_percent: Some(90),
            max_file_size: Some(source.size() / 3),
            format: Some(ImageFormat::Jpeg),
            max_attempts: Some(20),
            ..Default::default()
        };

        let first = compress_image(&source, &options).unwrap();
        let second = compress_image(&source, &options).unwrap();
        assert_eq!(first.bytes(), second.bytes());
    }

    #[test]
    fn test_unbounded_max_matches_single_encode() {
        use crate::encode::Encoder;

        let bytes = noisy_png(32, 32);
        let source = SourceImage::new(&bytes);
        let options = CompressOptions {
            quality_percent: Some(60),
            max_file_size: Some(0),
            format: Some(ImageFormat::Jpeg),
            ..Default::default()
        };

        let compressed = compress_image(&source, &options).unwrap();
        let single = RasterEncoder::new()
            .encode(&source, Some(ImageFormat::Jpeg), Some(60))
            .unwrap();
        assert_eq!(compressed, single);
    }

    #[test]
    fn test_max_larger_than_source_is_rejected() {
        let bytes = noisy_png(8, 8);
        let source = SourceImage::new(&bytes);
        let options = CompressOptions {
            max_file_size: Some(source.size() + 1),
            ..Default::default()
        };

        let result = compress_image(&source, &options);
        assert!(matches!(result, Err(CompressError::InvalidOptions(_))));
    }

    #[test]
    fn test_corrupt_source_surfaces_encode_error() {
        let bytes = vec![0u8; 4096];
        let source = SourceImage::with_mime_type(&bytes, "image/jpeg");

        let result = compress_image(&source, &CompressOptions::default());
        assert!(matches!(
            result,
            Err(CompressError::Encode(EncodeError::Decode(_)))
        ));
    }

    #[test]
    fn test_svg_target_is_an_encode_error() {
        let bytes = noisy_png(8, 8);
        let source = SourceImage::new(&bytes);
        let options = CompressOptions {
            format: Some(ImageFormat::Svg),
            ..Default::default()
        };

        let result = compress_image(&source, &options);
        assert!(matches!(
            result,
            Err(CompressError::Encode(EncodeError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_options_default_is_empty() {
        let options = CompressOptions::default();
        assert_eq!(options.quality_percent, None);
        assert_eq!(options.max_file_size, None);
        assert_eq!(options.min_file_size, None);
        assert_eq!(options.format, None);
        assert_eq!(options.max_attempts, None);
    }
}
