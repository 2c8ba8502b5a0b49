//! Page removal and rotation.

use lopdf::Object;
use tracing::info;

use crate::document::{self, page_ids};
use crate::error::PdfDeskError;
use crate::page_range::PageSelection;

/// Remove the selected pages. Repeated indices are ignored.
pub fn delete_pages(bytes: &[u8], selection: &PageSelection) -> Result<Vec<u8>, PdfDeskError> {
    if selection.is_empty() {
        return Err(PdfDeskError::EmptySelection("delete"));
    }

    let mut doc = document::load(bytes)?;
    let page_count = document::page_count(&doc);

    let mut numbers = selection.page_numbers();
    numbers.sort_unstable_by(|a, b| b.cmp(a));
    numbers.dedup();

    if let Some(&highest) = numbers.first() {
        if highest > page_count {
            return Err(PdfDeskError::PageOutOfRange {
                index: highest - 1,
                page_count,
            });
        }
    }
    if numbers.len() as u32 >= page_count {
        return Err(PdfDeskError::validation("Cannot delete every page."));
    }

    doc.delete_pages(&numbers);
    doc.prune_objects();

    info!(
        deleted = numbers.len(),
        remaining = document::page_count(&doc),
        "Deleted pages"
    );
    document::save(&mut doc)
}

/// Set every page's `/Rotate` to `degrees`, normalised to `0..360`.
pub fn rotate_pages(bytes: &[u8], degrees: i64) -> Result<Vec<u8>, PdfDeskError> {
    if degrees % 90 != 0 {
        return Err(PdfDeskError::validation(
            "Rotation must be a multiple of 90 degrees.",
        ));
    }

    let mut doc = document::load(bytes)?;
    let rotation = degrees.rem_euclid(360);
    let pages = page_ids(&doc);
    for &page_id in &pages {
        doc.get_dictionary_mut(page_id)?
            .set("Rotate", Object::Integer(rotation));
    }

    info!(pages = pages.len(), rotation, "Rotated pages");
    document::save(&mut doc)
}
