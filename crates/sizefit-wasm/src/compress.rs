//! Compression WASM bindings.
//!
//! This module exposes `sizefit_core::compress_image` to JavaScript as a
//! promise-returning `compressImage`, mirroring the shape of a browser
//! `canvas.toBlob` workflow.
//!
//! # Example
//!
//! ```typescript
//! import init, { compressImage } from '@sizefit/wasm';
//!
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const blob = await compressImage(bytes, file.type, {
//!   qualityPercent: 80,
//!   maxFileSize: 1024 * 1024,
//!   format: 'image/jpeg',
//! });
//! ```

use js_sys::{Array, Promise, Uint8Array};
use serde::Serialize;
use sizefit_core::{compress_image_traced, Attempt, CompressOptions, EncodedImage, SourceImage};
use wasm_bindgen::prelude::*;
use web_sys::{console, Blob, BlobPropertyBag};

/// Compress an image until its size lands in the requested window.
///
/// # Arguments
///
/// * `bytes` - The source file bytes as a `Uint8Array`
/// * `mime_type` - The source MIME type (e.g. `File.type`); used as the
///   output format when `options.format` is absent
/// * `options` - `{ qualityPercent?, maxFileSize?, minFileSize?, format?,
///   maxAttempts? }`, or `undefined` for all defaults
///
/// # Returns
///
/// A `Promise` resolving to a `Blob` whose `type` is the output MIME type.
/// The promise rejects with an error message string for invalid options or
/// a failed encode.
#[wasm_bindgen(js_name = compressImage)]
pub fn compress_image(bytes: &[u8], mime_type: Option<String>, options: JsValue) -> Promise {
    match compress_to_blob(bytes, mime_type.as_deref(), options) {
        Ok(blob) => Promise::resolve(&JsValue::from(blob)),
        Err(err) => {
            console::error_1(&err);
            Promise::reject(&err)
        }
    }
}

/// Synchronous core of [`compress_image`].
pub(crate) fn compress_to_blob(
    bytes: &[u8],
    mime_type: Option<&str>,
    options: JsValue,
) -> Result<Blob, JsValue> {
    let options = parse_options(options)?;
    let source = match mime_type {
        Some(mime) => SourceImage::with_mime_type(bytes, mime),
        None => SourceImage::new(bytes),
    };

    let convergence =
        compress_image_traced(&source, &options).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let first = convergence.first_traced() as usize;
    for (index, attempt) in convergence.attempts.iter().enumerate() {
        console::debug_1(&JsValue::from_str(&describe_attempt(first + index, attempt)));
    }

    to_blob(&convergence.image)
}

fn parse_options(options: JsValue) -> Result<CompressOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(CompressOptions::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))
}

fn to_blob(image: &EncodedImage) -> Result<Blob, JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(image.bytes()));

    let properties = BlobPropertyBag::new();
    properties.set_type(image.mime_type());

    Blob::new_with_u8_array_sequence_and_options(&parts, &properties)
}

/// One console line per encode attempt.
fn describe_attempt(index: usize, attempt: &Attempt) -> String {
    format!(
        "sizefit: attempt {} at quality {} -> {} bytes",
        index + 1,
        attempt.quality_percent,
        attempt.size
    )
}

/// Default option values, for display in a UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionDefaults {
    quality_percent: i32,
    min_file_size: u64,
}

/// Get the defaults applied to omitted options.
///
/// `maxFileSize` defaults to the source size, so it is not listed.
#[wasm_bindgen(js_name = compressDefaults)]
pub fn compress_defaults() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&option_defaults())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn option_defaults() -> OptionDefaults {
    OptionDefaults {
        quality_percent: sizefit_core::DEFAULT_QUALITY_PERCENT,
        min_file_size: sizefit_core::DEFAULT_MIN_FILE_SIZE,
    }
}
