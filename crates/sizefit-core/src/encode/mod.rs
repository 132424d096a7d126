//! The single-shot encode primitive.
//!
//! [`Encoder`] is the unit of work the size search repeats: given the
//! source, a target format and a quality percentage it produces one
//! independent [`EncodedImage`]. Implementations must not cache or retry;
//! every call redoes the full decode and encode.
//!
//! [`RasterEncoder`] is the production implementation over the `image`
//! crate. Tests substitute a deterministic mock.
//!
//! # Examples
//!
//! ```ignore
//! use sizefit_core::encode::{Encoder, RasterEncoder};
//! use sizefit_core::{ImageFormat, SourceImage};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let source = SourceImage::with_mime_type(&bytes, "image/png");
//! let jpeg = RasterEncoder::new()
//!     .encode(&source, Some(ImageFormat::Jpeg), Some(80))
//!     .unwrap();
//! println!("Encoded {} bytes", jpeg.size());
//! ```

mod raster;

pub use raster::{encode_surface, quality_fraction, EncodeError, RasterEncoder};

use crate::{ImageFormat, SourceImage};

/// One encoded blob and the format it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the encoded data.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Decode-and-re-encode at a given format and quality.
pub trait Encoder {
    /// Produce one encoded image.
    ///
    /// * `format` - Output format; `None` keeps the source's own format
    /// * `quality_percent` - Quality as a percentage; `None` means 100. The
    ///   value is not range-checked here, the search may push it outside
    ///   0..=100.
    fn encode(
        &self,
        source: &SourceImage<'_>,
        format: Option<ImageFormat>,
        quality_percent: Option<i32>,
    ) -> Result<EncodedImage, EncodeError>;
}

impl<E: Encoder + ?Sized> Encoder for &E {
    fn encode(
        &self,
        source: &SourceImage<'_>,
        format: Option<ImageFormat>,
        quality_percent: Option<i32>,
    ) -> Result<EncodedImage, EncodeError> {
        (**self).encode(source, format, quality_percent)
    }
}
