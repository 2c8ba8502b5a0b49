//! WASM bindings for the pdfdesk browser front end
//!
//! All PDF work happens in Rust. JavaScript reads the dropped files, shows
//! the status messages and offers the returned files for download.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { runTool, parsePageRange } from './pkg/pdfdesk_wasm.js';
//!
//! await init();
//!
//! const files = [{ name: file.name, type: file.type, bytes: new Uint8Array(await file.arrayBuffer()) }];
//! const result = runTool(files, "split", { splitPages: "1-3, 5" });
//! result.status.forEach(s => showStatus(s.message, s.severity));
//! if (result.success) result.outputs.forEach(o => download(o.filename, o.media_type, o.data));
//! ```

pub mod tool;

use pdfdesk_core::{PdfDeskError, Severity};
use wasm_bindgen::prelude::*;

pub use tool::{run_tool, tool_actions};

fn to_js(err: PdfDeskError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Zero-based page indices for a range expression such as `"1-3,5"`.
/// Malformed pieces are skipped, so this never fails.
#[wasm_bindgen(js_name = parsePageRange)]
pub fn parse_page_range(expression: &str) -> Vec<u32> {
    pdfdesk_core::parse_page_range(expression).into_vec()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    pdfdesk_core::quick_validate(bytes).map_err(to_js)
}

/// Page count, version and per-page sizes for one PDF
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = pdfdesk_core::inspect(bytes).map_err(to_js)?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    pdfdesk_core::get_page_count(bytes).map_err(to_js)
}

/// Text for the status chip: "Info", "Ready" or "Error".
#[wasm_bindgen(js_name = chipLabel)]
pub fn chip_label(severity: &str) -> String {
    let severity = match severity {
        "success" => Severity::Success,
        "error" => Severity::Error,
        _ => Severity::Info,
    };
    severity.chip_label().to_string()
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
