//! Page extraction: split and reorder
//!
//! Both build a new document from a [`PageSelection`] of zero-based indices,
//! in selection order. Split and reorder differ only in intent, so they
//! share [`extract_pages`].

use tracing::info;

use crate::document::{self, copy_pages};
use crate::error::PdfDeskError;
use crate::page_range::PageSelection;

/// Extract the selected pages into a new PDF.
///
/// Indices past the end of the document fail with
/// [`PdfDeskError::PageOutOfRange`]; the selection is not bounds-checked
/// when it is parsed.
pub fn split_document(bytes: &[u8], selection: &PageSelection) -> Result<Vec<u8>, PdfDeskError> {
    extract_pages(bytes, selection, "split")
}

/// Rebuild a PDF with its pages in the order given by `selection`.
///
/// Pages left out of the selection are dropped and repeated pages are
/// duplicated, exactly as with [`split_document`].
pub fn reorder_document(bytes: &[u8], selection: &PageSelection) -> Result<Vec<u8>, PdfDeskError> {
    extract_pages(bytes, selection, "reorder")
}

fn extract_pages(
    bytes: &[u8],
    selection: &PageSelection,
    operation: &'static str,
) -> Result<Vec<u8>, PdfDeskError> {
    if selection.is_empty() {
        return Err(PdfDeskError::EmptySelection(operation));
    }

    let source = document::load(bytes)?;
    let mut doc = copy_pages(&source, selection)?;
    doc.compress();

    info!(
        operation,
        source_pages = document::page_count(&source),
        selected = selection.len(),
        "Extracted pages"
    );

    document::save(&mut doc)
}
