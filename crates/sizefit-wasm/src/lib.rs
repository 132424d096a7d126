//! sizefit WASM - WebAssembly bindings for sizefit
//!
//! This crate exposes the sizefit-core compression search to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `compress` - `compressImage` and option defaults
//!
//! # Usage
//!
//! ```typescript
//! import init, { compressImage } from '@sizefit/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const blob = await compressImage(bytes, file.type, { maxFileSize: 200_000 });
//! console.log(`Compressed to ${blob.size} bytes`);
//! ```

use wasm_bindgen::prelude::*;

mod compress;

pub use compress::{compress_defaults, compress_image};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    // Future: Set up panic hook for better error messages in browser console
    // when console_error_panic_hook feature is added
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
