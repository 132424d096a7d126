//! Decoding source bytes into a drawable surface.
//!
//! The surface is what a canvas would hold after drawing the source image:
//! natural dimensions with EXIF orientation applied.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};

use super::{DecodeError, Orientation};

/// Decode image bytes into a surface at natural dimensions, applying EXIF
/// orientation correction.
///
/// The container format is sniffed from the bytes, not taken from any
/// declared MIME type.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a recognised image.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
pub fn decode_surface(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
    let orientation = extract_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(apply_orientation(img, orientation))
}

/// Read the EXIF orientation tag, falling back to `Orientation::Normal`.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 64]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_png_natural_dimensions() {
        let bytes = png_bytes(40, 30);
        let surface = decode_surface(&bytes).unwrap();
        assert_eq!(surface.dimensions(), (40, 30));
    }

    #[test]
    fn test_decode_without_exif_is_normal() {
        let bytes = png_bytes(4, 4);
        assert_eq!(extract_orientation(&bytes), Orientation::Normal);
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        let result = decode_surface(b"definitely not an image");
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_is_invalid_format() {
        let result = decode_surface(&[]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png_is_corrupted() {
        let bytes = png_bytes(32, 32);
        let result = decode_surface(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::CorruptedFile(_))));
    }

    #[test]
    fn test_apply_orientation_rotations_swap_dimensions() {
        for value in 1..=8u32 {
            let orientation = Orientation::from(value);
            let img = DynamicImage::ImageRgb8(RgbImage::new(6, 2));
            let rotated = apply_orientation(img, orientation);
            let expected = if value >= 5 { (2, 6) } else { (6, 2) };
            assert_eq!(rotated.dimensions(), expected, "orientation {value}");
        }
    }

    #[test]
    fn test_apply_orientation_flip_horizontal() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let flipped = apply_orientation(DynamicImage::ImageRgb8(img), Orientation::FlipHorizontal)
            .into_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(flipped.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }
}
