//! Quality search toward a byte-size window.
//!
//! [`SizeConverger`] re-encodes the source until the output size lies in
//! `[min_file_size, max_file_size]`:
//!
//! - output too large: quality drops by [`QUALITY_DECREASE_STEP`]
//! - output too small: quality rises by [`QUALITY_INCREASE_STEP`]
//!
//! The steps are asymmetric so the search leans toward shrinking, which is
//! the usual reason to call it. There is no step decay and the quality is
//! not clamped to 0..=100 while searching; the encoder clamps what it hands
//! to the codec.
//!
//! # Termination
//!
//! If no reachable quality produces a size in the window, the search does
//! not end. Set [`CompressionRequest::max_attempts`] to turn that case into
//! [`CompressError::NotConverged`] instead.
//!
//! The attempt trace returned in [`Convergence`] keeps only the most recent
//! [`TRACE_LIMIT`] attempts, so an unbounded search runs in constant memory.

use thiserror::Error;

use crate::compress::CompressOptions;
use crate::encode::{EncodeError, EncodedImage, Encoder};
use crate::{ImageFormat, SourceImage};

/// Lower size bound applied when the caller gives none.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 512;

/// Starting quality applied when the caller gives none.
pub const DEFAULT_QUALITY_PERCENT: i32 = 100;

/// Quality decrease after an attempt above the window.
pub const QUALITY_DECREASE_STEP: i32 = 10;

/// Quality increase after an attempt below the window.
pub const QUALITY_INCREASE_STEP: i32 = 5;

/// Attempts kept in a [`Convergence`] trace; older ones are dropped.
pub const TRACE_LIMIT: usize = 64;

const INVALID_QUALITY: &str = "qualityPercent must be a number between 0 and 100";

/// Errors from a compression call. No partial result accompanies any of them.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Rejected before any encode was attempted.
    #[error("{0}")]
    InvalidOptions(String),

    /// An encode attempt failed; the search is abandoned.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The attempt limit was reached without landing in the window.
    #[error(
        "No size within range after {attempts} attempts \
         (last attempt: {last_size} bytes at quality {quality_percent})"
    )]
    NotConverged {
        attempts: u32,
        last_size: u64,
        quality_percent: i32,
    },
}

/// A fully defaulted compression request.
///
/// A zero `max_file_size` means unbounded: a single encode is returned
/// without searching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    /// Size of the original image in bytes.
    pub source_size: u64,
    /// Output format; `None` keeps the source format.
    pub format: Option<ImageFormat>,
    /// Starting quality percentage.
    pub quality_percent: i32,
    /// Smallest acceptable output size in bytes.
    pub min_file_size: u64,
    /// Largest acceptable output size in bytes (0 = unbounded).
    pub max_file_size: u64,
    /// Encode attempts allowed before giving up; `None` searches forever.
    pub max_attempts: Option<u32>,
}

impl CompressionRequest {
    /// Build a request from caller options, applying defaults.
    ///
    /// - `min_file_size` defaults to [`DEFAULT_MIN_FILE_SIZE`]
    /// - `max_file_size` defaults to `source_size`
    /// - `quality_percent` defaults to [`DEFAULT_QUALITY_PERCENT`]
    pub fn from_options(source_size: u64, options: &CompressOptions) -> Self {
        Self {
            source_size,
            format: options.format,
            quality_percent: options.quality_percent.unwrap_or(DEFAULT_QUALITY_PERCENT),
            min_file_size: options.min_file_size.unwrap_or(DEFAULT_MIN_FILE_SIZE),
            max_file_size: options.max_file_size.unwrap_or(source_size),
            max_attempts: options.max_attempts,
        }
    }

    /// Check the request before any encoding happens.
    ///
    /// # Errors
    ///
    /// Returns `CompressError::InvalidOptions` when:
    /// - both `max_file_size` and `quality_percent` are zero
    /// - `quality_percent` is non-zero and outside 0..=100
    /// - `max_file_size` is non-zero and larger than `source_size`
    /// - `max_attempts` is `Some(0)`
    pub fn validate(&self) -> Result<(), CompressError> {
        if self.max_file_size == 0 && self.quality_percent == 0 {
            return Err(CompressError::InvalidOptions(INVALID_QUALITY.to_string()));
        }
        if self.quality_percent != 0 && !(0..=100).contains(&self.quality_percent) {
            return Err(CompressError::InvalidOptions(INVALID_QUALITY.to_string()));
        }
        if self.max_file_size != 0 && self.max_file_size > self.source_size {
            return Err(CompressError::InvalidOptions(format!(
                "maxFileSize ({}) must not be larger than the original file size ({})",
                self.max_file_size, self.source_size
            )));
        }
        if self.max_attempts == Some(0) {
            return Err(CompressError::InvalidOptions(
                "maxAttempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a size lies inside `[min_file_size, max_file_size]`.
    pub fn accepts(&self, size: u64) -> bool {
        self.min_file_size <= size && size <= self.max_file_size
    }

    /// The quality to try after an attempt of `size` bytes at `quality`.
    fn next_quality(&self, quality: i32, size: u64) -> i32 {
        if size > self.max_file_size {
            quality.saturating_sub(QUALITY_DECREASE_STEP)
        } else {
            quality.saturating_add(QUALITY_INCREASE_STEP)
        }
    }
}

/// One encode made during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality_percent: i32,
    pub size: u64,
}

/// The accepted image and the attempts that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convergence {
    pub image: EncodedImage,
    /// The last [`TRACE_LIMIT`] attempts, oldest first. The final entry is
    /// the accepted one.
    pub attempts: Vec<Attempt>,
    /// Every encode made, including those dropped from `attempts`.
    pub total_attempts: u32,
}

impl Convergence {
    pub fn into_image(self) -> EncodedImage {
        self.image
    }

    /// Quality of the accepted attempt.
    pub fn final_quality(&self) -> Option<i32> {
        self.attempts.last().map(|a| a.quality_percent)
    }

    /// 0-based search position of `attempts[0]`.
    pub fn first_traced(&self) -> u32 {
        self.total_attempts - self.attempts.len() as u32
    }
}

/// Rolling window over the attempts of one search.
#[derive(Debug, Default)]
struct Trace {
    recent: Vec<Attempt>,
    total: u32,
}

impl Trace {
    fn push(&mut self, attempt: Attempt) {
        if self.recent.len() == TRACE_LIMIT {
            self.recent.remove(0);
        }
        self.recent.push(attempt);
        self.total = self.total.saturating_add(1);
    }

    fn finish(self, image: EncodedImage) -> Convergence {
        Convergence {
            image,
            attempts: self.recent,
            total_attempts: self.total,
        }
    }
}

/// Drives an [`Encoder`] until the output size is acceptable.
///
/// Holds no state between calls; the current quality lives on the stack of
/// each [`converge`](Self::converge) call.
#[derive(Debug, Clone, Default)]
pub struct SizeConverger<E> {
    encoder: E,
}

impl<E: Encoder> SizeConverger<E> {
    pub fn new(encoder: E) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Validate `request`, then encode and adjust quality until the size is
    /// in the window.
    ///
    /// # Errors
    ///
    /// - `CompressError::InvalidOptions` if validation fails (no encode is made)
    /// - `CompressError::Encode` as soon as any attempt fails
    /// - `CompressError::NotConverged` once `max_attempts` encodes have missed
    pub fn converge(
        &self,
        source: &SourceImage<'_>,
        request: &CompressionRequest,
    ) -> Result<Convergence, CompressError> {
        request.validate()?;

        let mut trace = Trace::default();
        let mut quality = request.quality_percent;
        let mut image = self.attempt(source, request, quality, &mut trace)?;

        if request.max_file_size == 0 {
            return Ok(trace.finish(image));
        }

        while !request.accepts(image.size()) {
            if let Some(limit) = request.max_attempts {
                if trace.total >= limit {
                    return Err(CompressError::NotConverged {
                        attempts: limit,
                        last_size: image.size(),
                        quality_percent: quality,
                    });
                }
            }

            quality = request.next_quality(quality, image.size());
            image = self.attempt(source, request, quality, &mut trace)?;
        }

        Ok(trace.finish(image))
    }

    fn attempt(
        &self,
        source: &SourceImage<'_>,
        request: &CompressionRequest,
        quality: i32,
        trace: &mut Trace,
    ) -> Result<EncodedImage, CompressError> {
        let image = self.encoder.encode(source, request.format, Some(quality))?;
        trace.push(Attempt {
            quality_percent: quality,
            size: image.size(),
        });
        Ok(image)
    }
}
