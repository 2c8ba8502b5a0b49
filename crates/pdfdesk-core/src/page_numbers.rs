//! Page numbering
//!
//! Labels are centred near the bottom edge of each page.

use tracing::{info, warn};

use crate::document::{self, add_page_resource, append_page_content, page_box, page_ids};
use crate::error::PdfDeskError;
use crate::overlay::{add_helvetica, helvetica_text_width, text_stamp_content, TextStamp, FONT_RESOURCE};
use crate::page_range::PageSelection;

const FONT_SIZE: f32 = 10.0;
const GRAY: f32 = 0.6;
/// Baseline distance from the bottom of the page.
const BOTTOM_MARGIN: f32 = 20.0;

/// Number pages, labelling the page at position `idx` with `start + idx`.
///
/// With `selection`, only the selected pages get a label; the label still
/// follows the page's position, so numbering pages `2-3` with `start = 1`
/// prints `2` and `3`.
pub fn add_page_numbers(
    bytes: &[u8],
    start: i64,
    selection: Option<&PageSelection>,
) -> Result<Vec<u8>, PdfDeskError> {
    let mut doc = document::load(bytes)?;
    let font_id = add_helvetica(&mut doc);

    let mut numbered = 0usize;
    for (idx, page_id) in page_ids(&doc).into_iter().enumerate() {
        if selection.is_some_and(|selection| !selection.contains(idx as u32)) {
            continue;
        }

        let label = start.saturating_add(idx as i64).to_string();
        let bounds = page_box(&doc, page_id);
        let width = helvetica_text_width(&label, FONT_SIZE);
        let stamp = TextStamp {
            text: &label,
            x: bounds.x + (bounds.width - width) / 2.0,
            y: bounds.y + BOTTOM_MARGIN,
            size: FONT_SIZE,
            gray: GRAY,
            rotation_degrees: 0.0,
            graphics_state: None,
        };

        add_page_resource(&mut doc, page_id, "Font", FONT_RESOURCE, font_id)?;
        append_page_content(&mut doc, page_id, text_stamp_content(&stamp)?)?;
        numbered += 1;
    }

    if numbered == 0 {
        warn!("Page selection matched no pages; nothing numbered");
    }
    info!(start, numbered, "Added page numbers");
    document::save(&mut doc)
}
