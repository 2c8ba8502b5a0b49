//! PDF desk tools
//!
//! Merge, split, compress, watermark and the other page tools behind the
//! `pdfdesk` CLI and the browser build, all running over `lopdf` on
//! in-memory buffers.
//!
//! Front ends build a [`ToolRequest`] and hand it to [`run`] (or
//! [`process`] for a serialisable result). The operations are also
//! available individually.

pub mod command;
pub mod compress;
pub mod document;
pub mod error;
pub mod export;
pub mod flatten;
pub mod images;
pub mod inspect;
pub mod media;
pub mod merge;
mod overlay;
pub mod page_numbers;
pub mod page_range;
pub mod pages;
pub mod split;
pub mod status;
pub mod watermark;

#[cfg(test)]
mod test_support;

pub use command::{
    accept_files, process, run, InputFile, OutputFile, ProcessMetrics, ProcessResult,
    ToolAction, ToolOptions, ToolRequest,
};
pub use compress::{compress_document, CompressionLevel};
pub use error::PdfDeskError;
pub use export::{export_text, ExportFormat};
pub use flatten::flatten_forms;
pub use images::{extract_images, images_to_pdf, ExtractedImage};
pub use inspect::{inspect, quick_validate, PageInfo, PageOrientation, PdfInfo};
pub use media::FileKind;
pub use merge::merge_documents;
pub use page_numbers::add_page_numbers;
pub use page_range::{parse_page_range, PageSelection, MAX_SELECTION_LEN};
pub use pages::{delete_pages, rotate_pages};
pub use split::{reorder_document, split_document};
pub use status::{OutputSink, Severity, StatusMessage, StatusSink};
pub use watermark::add_watermark;

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfDeskError> {
    document::load(bytes).map(|doc| document::page_count(&doc))
}
