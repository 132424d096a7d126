//! sizefit Core - size-targeted image compression
//!
//! This crate re-encodes an image until its byte size falls inside a
//! requested window. It is built from two pieces:
//!
//! - [`encode`] - the single-shot decode → re-encode primitive ([`Encoder`])
//! - [`converge`] - the quality search that drives repeated encodes
//!   ([`SizeConverger`])
//!
//! [`compress_image`] ties them together behind a caller-facing option bag.

pub mod compress;
pub mod converge;
pub mod decode;
pub mod encode;
pub mod format;

pub use compress::{compress_image, compress_image_traced, CompressOptions};
pub use converge::{
    Attempt, CompressError, CompressionRequest, Convergence, SizeConverger,
    DEFAULT_MIN_FILE_SIZE, DEFAULT_QUALITY_PERCENT, TRACE_LIMIT,
};
pub use encode::{EncodeError, EncodedImage, Encoder, RasterEncoder};
pub use format::ImageFormat;

/// The caller's input image: raw bytes plus an optional declared type.
///
/// The declared type plays the role of a browser `File.type`. It decides
/// the output format when none is requested.
#[derive(Debug, Clone, Copy)]
pub struct SourceImage<'a> {
    bytes: &'a [u8],
    declared_format: Option<ImageFormat>,
}

impl<'a> SourceImage<'a> {
    /// Wrap raw bytes with no declared type.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            declared_format: None,
        }
    }

    /// Wrap raw bytes with a declared MIME type. Unrecognised types are
    /// treated as undeclared.
    pub fn with_mime_type(bytes: &'a [u8], mime_type: &str) -> Self {
        Self {
            bytes,
            declared_format: ImageFormat::from_mime(mime_type),
        }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Size of the source in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn declared_format(&self) -> Option<ImageFormat> {
        self.declared_format
    }

    /// The source's format: the declared type if any, otherwise sniffed
    /// from the magic bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        self.declared_format.or_else(|| {
            image::guess_format(self.bytes)
                .ok()
                .and_then(ImageFormat::from_image_format)
        })
    }
}
