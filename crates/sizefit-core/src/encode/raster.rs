//! Raster re-encoding backed by the `image` crate.
//!
//! This is the decode → draw → re-encode primitive. The quality fraction
//! drives JPEG and WebP, which are lossy; the other raster formats are
//! lossless and ignore it, the same way a canvas `toBlob` call does.
//!
//! Lossy WebP comes from `zenwebp`; the `image` crate only writes lossless
//! WebP.

use std::io::Cursor;

use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, GenericImageView, ImageEncoder, RgbImage};
use thiserror::Error;

use super::{EncodedImage, Encoder};
use crate::decode::{decode_surface, DecodeError};
use crate::{ImageFormat, SourceImage};

/// Errors that can occur while producing an encoded image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The target format has no raster encoder, or the source format could
    /// not be determined.
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The source bytes could not be decoded.
    #[error("Failed to decode source image: {0}")]
    Decode(#[from] DecodeError),

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec failed to produce output.
    #[error("Failed to create blob: {0}")]
    EncodingFailed(String),
}

/// The production [`Encoder`]: fully decodes and re-encodes on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterEncoder;

impl RasterEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for RasterEncoder {
    fn encode(
        &self,
        source: &SourceImage<'_>,
        format: Option<ImageFormat>,
        quality_percent: Option<i32>,
    ) -> Result<EncodedImage, EncodeError> {
        let target = match format {
            Some(format) => format,
            None => source.format().ok_or_else(|| {
                EncodeError::UnsupportedFormat("unknown source image type".to_string())
            })?,
        };
        if target.to_image_format().is_none() {
            return Err(EncodeError::UnsupportedFormat(target.to_string()));
        }

        // The surface is owned by this call and is dropped on every exit
        // path, so nothing accumulates across attempts.
        let surface = decode_surface(source.bytes())?;
        let bytes = encode_surface(&surface, target, quality_fraction(quality_percent))?;

        Ok(EncodedImage::new(bytes, target))
    }
}

/// Convert an optional quality percentage to the fraction handed to the codec.
///
/// `None` means full quality (1.0). Values outside 0..=100 are passed through
/// unchanged; [`encode_surface`] clamps them.
pub fn quality_fraction(quality_percent: Option<i32>) -> f32 {
    quality_percent.unwrap_or(100) as f32 / 100.0
}

/// Map a quality fraction onto the WebP encoder's 0-100 scale.
fn webp_quality(fraction: f32) -> f32 {
    let scaled = fraction * 100.0;
    if scaled.is_nan() {
        return 100.0;
    }
    scaled.clamp(0.0, 100.0)
}

/// Draw the surface onto an opaque black background, as a canvas does
/// before writing a format without alpha.
fn flatten_onto_black(surface: &DynamicImage) -> RgbImage {
    if !surface.color().has_alpha() {
        return surface.to_rgb8();
    }
    let rgba = surface.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        image::Rgb([scale(r), scale(g), scale(b)])
    })
}

/// Map a quality fraction onto the JPEG encoder's 1-100 scale.
fn jpeg_quality(fraction: f32) -> u8 {
    let scaled = (fraction * 100.0).round();
    if scaled.is_nan() {
        return 100;
    }
    scaled.clamp(1.0, 100.0) as u8
}

/// Encode a decoded surface into `format` at the given quality fraction.
///
/// # Arguments
///
/// * `surface` - The decoded image, at its natural dimensions
/// * `format` - Output format; must have a raster encoder
/// * `quality` - Quality fraction (0.0-1.0). Only JPEG and WebP use it.
///
/// # Errors
///
/// Returns `EncodeError::UnsupportedFormat` for [`ImageFormat::Svg`],
/// `EncodeError::InvalidDimensions` for an empty surface, and
/// `EncodeError::EncodingFailed` if the codec rejects the data.
pub fn encode_surface(
    surface: &DynamicImage,
    format: ImageFormat,
    quality: f32,
) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let mut buffer = Cursor::new(Vec::new());

    let result = match format {
        ImageFormat::Jpeg => {
            let rgb = flatten_onto_black(surface);
            JpegEncoder::new_with_quality(&mut buffer, jpeg_quality(quality)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        ImageFormat::Png => {
            let rgba = surface.to_rgba8();
            PngEncoder::new(&mut buffer).write_image(
                rgba.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )
        }
        ImageFormat::Webp => {
            let rgba = surface.to_rgba8();
            let config = zenwebp::LossyConfig::new().with_quality(webp_quality(quality));
            let encoded = zenwebp::EncodeRequest::lossy(
                &config,
                rgba.as_raw(),
                zenwebp::PixelLayout::Rgba8,
                width,
                height,
            )
            .encode()
            .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
            return Ok(encoded);
        }
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder.encode_frame(Frame::new(surface.to_rgba8()))
        }
        ImageFormat::Bmp => {
            let rgba = surface.to_rgba8();
            BmpEncoder::new(&mut buffer).write_image(
                rgba.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )
        }
        ImageFormat::Tiff => {
            let rgba = surface.to_rgba8();
            TiffEncoder::new(&mut buffer).write_image(
                rgba.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )
        }
        ImageFormat::Svg => return Err(EncodeError::UnsupportedFormat(format.to_string())),
    };

    result.map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
