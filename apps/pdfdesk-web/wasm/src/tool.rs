//! Stateless tool runs from JavaScript
//!
//! JavaScript passes the dropped files, the selected tool id and the option
//! values; everything else happens in `pdfdesk_core`.

use js_sys::{Array, Reflect, Uint8Array};
use pdfdesk_core::{
    accept_files, process, InputFile, ProcessResult, StatusMessage, ToolAction, ToolOptions,
    ToolRequest,
};
use wasm_bindgen::prelude::*;

/// Build a request from already-extracted parts and run it.
/// Kept free of `JsValue` so it runs under `cargo test`.
pub(crate) fn run_tool_internal<F>(
    files: Vec<InputFile>,
    action: &str,
    options: ToolOptions,
    now_ms: F,
) -> Result<ProcessResult, String>
where
    F: Fn() -> f64,
{
    let action: ToolAction = action.parse().map_err(|e| format!("{}", e))?;

    let mut intake: Vec<StatusMessage> = Vec::new();
    // Nothing usable: run with no files so the result carries the status
    let files = accept_files(files, &mut intake).unwrap_or_default();

    let request = ToolRequest::new(files, action, options);
    let mut result = process(&request, now_ms);
    intake.append(&mut result.status);
    result.status = intake;
    Ok(result)
}

/// Read `{ name, type, bytes }` objects from a JS array.
fn read_files(files: &Array) -> Result<Vec<InputFile>, JsValue> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let name = Reflect::get(&file, &JsValue::from_str("name"))?
                .as_string()
                .unwrap_or_else(|| format!("file-{}", index + 1));
            let media_type = Reflect::get(&file, &JsValue::from_str("type"))?
                .as_string()
                .unwrap_or_default();
            let bytes = Reflect::get(&file, &JsValue::from_str("bytes"))?;
            if !bytes.is_instance_of::<Uint8Array>() {
                return Err(JsValue::from_str(&format!(
                    "File {} has no Uint8Array `bytes`",
                    name
                )));
            }
            let bytes = Uint8Array::new(&bytes).to_vec();
            Ok(InputFile::with_media_type(name, &media_type, bytes))
        })
        .collect()
}

/// Run one tool and return a `ProcessResult` object.
///
/// `files` is an array of `{ name, type, bytes: Uint8Array }`; `options` may
/// be `undefined` or any subset of the tool options in camelCase.
#[wasm_bindgen(js_name = runTool)]
pub fn run_tool(files: Array, action: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let files = read_files(&files)?;
    let options: ToolOptions = if options.is_undefined() || options.is_null() {
        ToolOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
    };

    let result = run_tool_internal(files, action, options, js_sys::Date::now)
        .map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Ids of every tool, in display order.
#[wasm_bindgen(js_name = toolActions)]
pub fn tool_actions() -> Vec<String> {
    ToolAction::ALL
        .iter()
        .map(|action| action.id().to_string())
        .collect()
}
