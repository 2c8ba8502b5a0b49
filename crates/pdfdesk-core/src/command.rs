//! Tool requests and dispatch
//!
//! A front end collects files and options into an immutable [`ToolRequest`]
//! and calls [`run`]. Each [`ToolAction`] maps to one handler through
//! [`ToolAction::handler`]; `run` wraps the handler with the status
//! messages the user sees.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compress::{compress_document, CompressionLevel};
use crate::document;
use crate::error::PdfDeskError;
use crate::export::{export_text, ExportFormat};
use crate::flatten::flatten_forms;
use crate::images::{extract_images, images_to_pdf};
use crate::media::FileKind;
use crate::merge::merge_documents;
use crate::page_numbers::add_page_numbers;
use crate::page_range::{parse_number, PageSelection};
use crate::pages::{delete_pages, rotate_pages};
use crate::split::{reorder_document, split_document};
use crate::status::{StatusMessage, StatusSink};
use crate::watermark::add_watermark;

/// A user-supplied file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Kind sniffed from the content, falling back to the file name.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = FileKind::sniff(&name, &bytes);
        Self { name, kind, bytes }
    }

    /// Kind taken from a declared media type when it is one we know.
    pub fn with_media_type(name: impl Into<String>, media_type: &str, bytes: Vec<u8>) -> Self {
        match FileKind::from_media_type(media_type) {
            FileKind::Other => Self::new(name, bytes),
            kind => Self {
                name: name.into(),
                kind,
                bytes,
            },
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.kind == FileKind::Pdf
    }
}

/// A finished result, ready to download or write to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, FileKind::Pdf.media_type(), bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolAction {
    Merge,
    Split,
    Compress,
    Watermark,
    PdfText,
    PdfImages,
    ImagesPdf,
    Reorder,
    PageNumbers,
    Flatten,
    DeletePages,
    Rotate,
}

pub type Handler = fn(&ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError>;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

impl ToolAction {
    pub const ALL: [ToolAction; 12] = [
        ToolAction::Merge,
        ToolAction::Split,
        ToolAction::Compress,
        ToolAction::Watermark,
        ToolAction::PdfText,
        ToolAction::PdfImages,
        ToolAction::ImagesPdf,
        ToolAction::Reorder,
        ToolAction::PageNumbers,
        ToolAction::Flatten,
        ToolAction::DeletePages,
        ToolAction::Rotate,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolAction::Merge => "merge",
            ToolAction::Split => "split",
            ToolAction::Compress => "compress",
            ToolAction::Watermark => "watermark",
            ToolAction::PdfText => "pdfText",
            ToolAction::PdfImages => "pdfImages",
            ToolAction::ImagesPdf => "imagesPdf",
            ToolAction::Reorder => "reorder",
            ToolAction::PageNumbers => "pageNumbers",
            ToolAction::Flatten => "flatten",
            ToolAction::DeletePages => "deletePages",
            ToolAction::Rotate => "rotate",
        }
    }

    /// The id with its first letter capitalised, e.g. `PdfText`.
    pub fn label(self) -> String {
        let id = self.id();
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn handler(self) -> Handler {
        match self {
            ToolAction::Merge => run_merge,
            ToolAction::Split => run_split,
            ToolAction::Compress => run_compress,
            ToolAction::Watermark => run_watermark,
            ToolAction::PdfText => run_pdf_text,
            ToolAction::PdfImages => run_pdf_images,
            ToolAction::ImagesPdf => run_images_pdf,
            ToolAction::Reorder => run_reorder,
            ToolAction::PageNumbers => run_page_numbers,
            ToolAction::Flatten => run_flatten,
            ToolAction::DeletePages => run_delete_pages,
            ToolAction::Rotate => run_rotate,
        }
    }

    /// Checks that need no document parsing, run before any work starts.
    pub fn check(self, request: &ToolRequest) -> Result<(), PdfDeskError> {
        let options = &request.options;
        match self {
            ToolAction::Merge => {
                if request.pdfs().count() < 2 {
                    return Err(PdfDeskError::validation("Need at least 2 PDFs to merge."));
                }
            }
            ToolAction::ImagesPdf => {
                if request.images().next().is_none() {
                    return Err(PdfDeskError::validation(
                        "Please add JPG/PNG images for this tool.",
                    ));
                }
            }
            _ => {
                request.first_pdf()?;
            }
        }

        match self {
            ToolAction::Split => {
                split_selection(options)?;
            }
            ToolAction::Reorder => {
                reorder_selection(options)?;
            }
            ToolAction::DeletePages => {
                delete_selection(options)?;
            }
            ToolAction::PageNumbers => {
                number_selection(options)?;
            }
            ToolAction::Watermark => {
                if options.watermark_text.trim().is_empty() {
                    return Err(PdfDeskError::validation("Enter watermark text."));
                }
            }
            ToolAction::Rotate => {
                if options.rotation % 90 != 0 {
                    return Err(PdfDeskError::validation(
                        "Rotation must be a multiple of 90 degrees.",
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Status shown while the handler runs.
    pub fn progress(self, options: &ToolOptions) -> String {
        match self {
            ToolAction::Merge => "Merging PDFs…".into(),
            ToolAction::Split => "Splitting PDF…".into(),
            ToolAction::Compress => {
                format!("Compressing PDF (level {})…", options.compress_level.get())
            }
            ToolAction::Watermark => "Adding watermark…".into(),
            ToolAction::PdfText => "Extracting text…".into(),
            ToolAction::PdfImages => "Extracting images…".into(),
            ToolAction::ImagesPdf => "Building PDF from images…".into(),
            ToolAction::Reorder => "Reordering pages…".into(),
            ToolAction::PageNumbers => "Adding page numbers…".into(),
            ToolAction::Flatten => "Flattening forms…".into(),
            ToolAction::DeletePages => "Deleting pages…".into(),
            ToolAction::Rotate => format!("Rotating pages to {}°…", options.rotation.rem_euclid(360)),
        }
    }

    /// Status shown once the outputs are ready.
    pub fn success(self, outputs: &[OutputFile]) -> String {
        let name = outputs
            .first()
            .map(|file| file.filename.as_str())
            .unwrap_or_default();
        match self {
            ToolAction::Merge => format!("Merged and downloaded as {}", name),
            ToolAction::Split => format!("Split complete — downloaded as {}", name),
            ToolAction::Compress => format!("Compressed and downloaded as {}", name),
            ToolAction::Watermark => format!("Watermark added — downloaded as {}", name),
            ToolAction::PdfText => format!("Exported as {}", name),
            ToolAction::PdfImages => format!("Exported {} image(s) from the PDF.", outputs.len()),
            ToolAction::ImagesPdf => format!("Images combined into {}", name),
            ToolAction::Reorder => format!("Reordered and downloaded as {}", name),
            ToolAction::PageNumbers => format!("Page numbers added — downloaded as {}", name),
            ToolAction::Flatten => format!("Flattened and downloaded as {}", name),
            ToolAction::DeletePages => format!("Pages deleted — downloaded as {}", name),
            ToolAction::Rotate => format!("Rotated and downloaded as {}", name),
        }
    }

    /// Status shown when the document engine fails.
    pub fn failure(self, error: &PdfDeskError) -> String {
        match self {
            ToolAction::Merge => "Error merging PDFs. Please try again.".into(),
            ToolAction::Split => "Error splitting PDF. Check page numbers and try again.".into(),
            ToolAction::Compress => "Error compressing PDF. Please try again.".into(),
            ToolAction::Watermark => format!("Error adding watermark: {}", error),
            ToolAction::ImagesPdf => format!("Error building PDF from images: {}", error),
            ToolAction::DeletePages => {
                "Error deleting pages. Check page numbers and try again.".into()
            }
            _ => GENERIC_FAILURE.into(),
        }
    }
}

impl fmt::Display for ToolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolAction {
    type Err = PdfDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ToolAction::ALL
            .into_iter()
            .find(|action| action.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| PdfDeskError::validation(format!("Unknown tool: {}", s)))
    }
}

/// Per-tool settings. Range expressions are kept as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolOptions {
    pub split_pages: String,
    pub reorder_pages: String,
    pub delete_pages: String,
    /// Pages that receive a number; blank means every page.
    pub number_pages: String,
    pub watermark_text: String,
    pub compress_level: CompressionLevel,
    pub export_format: ExportFormat,
    /// Number printed on the first page. `0` and text without digits mean 1.
    #[serde(deserialize_with = "deserialize_page_number_start")]
    pub page_number_start: i64,
    pub rotation: i64,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            split_pages: String::new(),
            reorder_pages: String::new(),
            delete_pages: String::new(),
            number_pages: String::new(),
            watermark_text: String::new(),
            compress_level: CompressionLevel::default(),
            export_format: ExportFormat::default(),
            page_number_start: 1,
            rotation: 90,
        }
    }
}

/// A start of `0` means "not set" and numbering begins at 1.
fn first_page_number(start: i64) -> i64 {
    if start == 0 {
        1
    } else {
        start
    }
}

/// Accepts the value as a number or as the text typed into a form field.
fn deserialize_page_number_start<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StartValue {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    let start = match StartValue::deserialize(deserializer)? {
        StartValue::Integer(n) => n,
        StartValue::Float(f) => f.trunc() as i64,
        StartValue::Text(text) => parse_number(&text).unwrap_or(0),
    };
    Ok(first_page_number(start))
}

/// Everything one run needs. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub files: Vec<InputFile>,
    pub action: ToolAction,
    pub options: ToolOptions,
}

impl ToolRequest {
    pub fn new(files: Vec<InputFile>, action: ToolAction, options: ToolOptions) -> Self {
        Self {
            files,
            action,
            options,
        }
    }

    pub fn pdfs(&self) -> impl Iterator<Item = &InputFile> {
        self.files.iter().filter(|file| file.is_pdf())
    }

    pub fn images(&self) -> impl Iterator<Item = &InputFile> {
        self.files.iter().filter(|file| file.kind.is_image())
    }

    /// Single-document tools work on the first PDF in the request.
    pub fn first_pdf(&self) -> Result<&InputFile, PdfDeskError> {
        self.pdfs()
            .next()
            .ok_or_else(|| PdfDeskError::validation("No PDF found in selection."))
    }
}

/// Keep the PDFs and images, dropping anything else.
pub fn accept_files<I>(files: I, status: &mut dyn StatusSink) -> Result<Vec<InputFile>, PdfDeskError>
where
    I: IntoIterator<Item = InputFile>,
{
    let accepted: Vec<InputFile> = files
        .into_iter()
        .filter(|file| {
            let keep = file.kind != FileKind::Other;
            if !keep {
                debug!(name = %file.name, "Ignored unsupported file");
            }
            keep
        })
        .collect();

    if accepted.is_empty() {
        let message = "Please add valid PDF or image files.";
        status.report(StatusMessage::error(message));
        return Err(PdfDeskError::validation(message));
    }

    status.report(StatusMessage::success(format!(
        "{} PDF(s) ready. Choose a tool and run.",
        accepted.len()
    )));
    Ok(accepted)
}

/// Run one tool, reporting progress and outcome to `status`.
pub fn run(request: &ToolRequest, status: &mut dyn StatusSink) -> Result<Vec<OutputFile>, PdfDeskError> {
    let action = request.action;
    if request.files.is_empty() {
        let message = "Upload PDFs first.";
        status.report(StatusMessage::error(message));
        return Err(PdfDeskError::validation(message));
    }

    status.report(StatusMessage::info(format!("Selected: {}.", action.label())));

    if let Err(err) = action.check(request) {
        report_failure(action, &err, status);
        return Err(err);
    }

    status.report(StatusMessage::info(action.progress(&request.options)));
    match (action.handler())(request) {
        Ok(outputs) => {
            info!(%action, outputs = outputs.len(), "Tool finished");
            status.report(StatusMessage::success(action.success(&outputs)));
            Ok(outputs)
        }
        Err(err) => {
            report_failure(action, &err, status);
            Err(err)
        }
    }
}

fn report_failure(action: ToolAction, error: &PdfDeskError, status: &mut dyn StatusSink) {
    let message = if error.is_validation() {
        error.to_string()
    } else {
        tracing::error!(%action, %error, "Tool failed");
        action.failure(error)
    };
    status.report(StatusMessage::error(message));
}

fn required_selection(
    expression: &str,
    missing: &str,
    empty: &str,
) -> Result<PageSelection, PdfDeskError> {
    if expression.trim().is_empty() {
        return Err(PdfDeskError::validation(missing));
    }
    let selection = PageSelection::parse(expression);
    if selection.is_empty() {
        return Err(PdfDeskError::validation(empty));
    }
    Ok(selection)
}

fn split_selection(options: &ToolOptions) -> Result<PageSelection, PdfDeskError> {
    required_selection(
        &options.split_pages,
        "Enter page numbers to split.",
        "No valid pages to split.",
    )
}

fn reorder_selection(options: &ToolOptions) -> Result<PageSelection, PdfDeskError> {
    required_selection(
        &options.reorder_pages,
        "Enter the new page order.",
        "No valid pages to reorder.",
    )
}

fn delete_selection(options: &ToolOptions) -> Result<PageSelection, PdfDeskError> {
    required_selection(
        &options.delete_pages,
        "Enter page numbers to delete.",
        "No valid pages to delete.",
    )
}

fn number_selection(options: &ToolOptions) -> Result<Option<PageSelection>, PdfDeskError> {
    if options.number_pages.trim().is_empty() {
        return Ok(None);
    }
    required_selection(&options.number_pages, "", "No valid pages to number.").map(Some)
}

fn run_merge(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let documents = request.pdfs().map(|file| file.bytes.clone()).collect();
    Ok(vec![OutputFile::pdf("merged.pdf", merge_documents(documents)?)])
}

fn run_split(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let selection = split_selection(&request.options)?;
    let bytes = split_document(&request.first_pdf()?.bytes, &selection)?;
    Ok(vec![OutputFile::pdf("split.pdf", bytes)])
}

fn run_compress(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let bytes = compress_document(&request.first_pdf()?.bytes, request.options.compress_level)?;
    Ok(vec![OutputFile::pdf("compressed.pdf", bytes)])
}

fn run_watermark(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let bytes = add_watermark(&request.first_pdf()?.bytes, &request.options.watermark_text)?;
    Ok(vec![OutputFile::pdf("watermarked.pdf", bytes)])
}

fn run_pdf_text(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let format = request.options.export_format;
    let text = export_text(&request.first_pdf()?.bytes, format)?;
    Ok(vec![OutputFile::new(
        format.filename(),
        format.media_type(),
        text.into_bytes(),
    )])
}

fn run_pdf_images(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let images = extract_images(&request.first_pdf()?.bytes)?;
    if images.is_empty() {
        return Err(PdfDeskError::validation("No embedded images found in this PDF."));
    }
    Ok(images
        .into_iter()
        .map(|image| OutputFile::new(image.filename(), image.kind.media_type(), image.bytes))
        .collect())
}

fn run_images_pdf(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let bytes = images_to_pdf(
        request
            .images()
            .map(|file| (file.name.as_str(), file.bytes.as_slice())),
    )?;
    Ok(vec![OutputFile::pdf("images.pdf", bytes)])
}

fn run_reorder(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let selection = reorder_selection(&request.options)?;
    let bytes = reorder_document(&request.first_pdf()?.bytes, &selection)?;
    Ok(vec![OutputFile::pdf("reordered.pdf", bytes)])
}

fn run_page_numbers(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let selection = number_selection(&request.options)?;
    let bytes = add_page_numbers(
        &request.first_pdf()?.bytes,
        first_page_number(request.options.page_number_start),
        selection.as_ref(),
    )?;
    Ok(vec![OutputFile::pdf("paged.pdf", bytes)])
}

fn run_flatten(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let bytes = flatten_forms(&request.first_pdf()?.bytes)?;
    Ok(vec![OutputFile::pdf("flattened.pdf", bytes)])
}

fn run_delete_pages(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let selection = delete_selection(&request.options)?;
    let bytes = delete_pages(&request.first_pdf()?.bytes, &selection)?;
    Ok(vec![OutputFile::pdf("trimmed.pdf", bytes)])
}

fn run_rotate(request: &ToolRequest) -> Result<Vec<OutputFile>, PdfDeskError> {
    let bytes = rotate_pages(&request.first_pdf()?.bytes, request.options.rotation)?;
    Ok(vec![OutputFile::pdf("rotated.pdf", bytes)])
}

/// Result of one run, shaped for JavaScript.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub outputs: Vec<EncodedOutput>,
    pub error: Option<String>,
    pub status: Vec<StatusMessage>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodedOutput {
    pub filename: String,
    pub media_type: String,
    /// Base64-encoded file data
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

/// Run `request` and package the outcome. `now_ms` supplies a millisecond
/// clock, since `std::time::Instant` is unavailable in the browser.
pub fn process<F>(request: &ToolRequest, now_ms: F) -> ProcessResult
where
    F: Fn() -> f64,
{
    let started = now_ms();
    let mut status = Vec::new();
    let outcome = run(request, &mut status);
    let elapsed = (now_ms() - started).max(0.0) as u64;

    match outcome {
        Ok(outputs) => {
            let page_count = outputs
                .iter()
                .filter(|file| file.media_type == FileKind::Pdf.media_type())
                .filter_map(|file| document::load(&file.bytes).ok())
                .map(|doc| document::page_count(&doc))
                .sum();
            let metrics = ProcessMetrics {
                input_size_bytes: request.files.iter().map(|file| file.bytes.len()).sum(),
                output_size_bytes: outputs.iter().map(|file| file.bytes.len()).sum(),
                page_count,
                processing_time_ms: elapsed,
            };
            let engine = base64::engine::general_purpose::STANDARD;
            ProcessResult {
                success: true,
                outputs: outputs
                    .into_iter()
                    .map(|file| EncodedOutput {
                        data: engine.encode(&file.bytes),
                        filename: file.filename,
                        media_type: file.media_type,
                    })
                    .collect(),
                error: None,
                status,
                metrics: Some(metrics),
            }
        }
        Err(err) => ProcessResult {
            success: false,
            outputs: Vec::new(),
            error: Some(err.to_string()),
            status,
            metrics: None,
        },
    }
}
