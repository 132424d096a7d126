//! Supported image formats, keyed by their MIME type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An image format addressed by MIME type.
///
/// This is the set of `type` strings a browser canvas accepts for
/// `toBlob`. [`ImageFormat::Svg`] is accepted as a value but has no raster
/// encoder, so encoding to it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/bmp")]
    Bmp,
    #[serde(rename = "image/tiff")]
    Tiff,
    #[serde(rename = "image/svg+xml")]
    Svg,
}

impl ImageFormat {
    /// All formats, in declaration order.
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Webp,
        ImageFormat::Gif,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Svg,
    ];

    /// The canonical MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Parse a MIME type, ignoring case, surrounding whitespace and any
    /// `;`-separated parameters. `image/jpg` is accepted as an alias.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::Webp),
            "image/gif" => Some(ImageFormat::Gif),
            "image/bmp" => Some(ImageFormat::Bmp),
            "image/tiff" => Some(ImageFormat::Tiff),
            "image/svg+xml" => Some(ImageFormat::Svg),
            _ => None,
        }
    }

    /// Convert to the image crate's format, if it has a raster codec.
    pub fn to_image_format(self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Webp => Some(image::ImageFormat::WebP),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
            ImageFormat::Svg => None,
        }
    }

    /// Map from the image crate's format. Formats outside the supported set
    /// return `None`.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            image::ImageFormat::Bmp => Some(ImageFormat::Bmp),
            image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_roundtrip_for_every_format() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_mime(format.mime_type()), Some(format));
        }
    }

    #[test]
    fn test_from_mime_is_lenient() {
        assert_eq!(ImageFormat::from_mime("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime(" image/jpg "), Some(ImageFormat::Jpeg));
        assert_eq!(
            ImageFormat::from_mime("image/webp; charset=binary"),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::from_mime("image/avif"), None);
        assert_eq!(ImageFormat::from_mime(""), None);
    }

    #[test]
    fn test_svg_has_no_raster_codec() {
        assert!(ImageFormat::Svg.to_image_format().is_none());
        for format in ImageFormat::ALL.into_iter().filter(|f| *f != ImageFormat::Svg) {
            let raster = format.to_image_format().unwrap();
            assert_eq!(ImageFormat::from_image_format(raster), Some(format));
        }
    }

    #[test]
    fn test_display_is_mime_type() {
        assert_eq!(ImageFormat::Svg.to_string(), "image/svg+xml");
    }
}
