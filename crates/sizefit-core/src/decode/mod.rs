//! Source decoding for the encode primitive.
//!
//! Every encode attempt starts by turning the caller's bytes back into a
//! pixel surface. Decoding is redone on each attempt; nothing is cached
//! between calls.
//!
//! # Examples
//!
//! ```ignore
//! use sizefit_core::decode::decode_surface;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let surface = decode_surface(&bytes).unwrap();
//! println!("Decoded {}x{} surface", surface.width(), surface.height());
//! ```

mod surface;
mod types;

pub use surface::decode_surface;
pub use types::{DecodeError, Orientation};
