//! Diagonal text watermark on every page.

use tracing::info;

use crate::document::{self, add_page_resource, append_page_content, page_box, page_ids};
use crate::error::PdfDeskError;
use crate::overlay::{
    add_helvetica, add_opacity_state, text_stamp_content, TextStamp, FONT_RESOURCE,
};

const FONT_SIZE: f32 = 50.0;
const OPACITY: f32 = 0.3;
const GRAY: f32 = 0.5;
const ROTATION_DEGREES: f32 = 45.0;
/// Horizontal offset per character used to roughly centre the text.
const CHAR_OFFSET: f32 = 10.0;
const STATE_RESOURCE: &str = "PdfDeskWatermark";

/// Stamp `text` across the middle of every page.
///
/// The text is set in Helvetica 50pt, gray, 30% opaque and rotated 45°.
/// Blank text is rejected with a validation error.
pub fn add_watermark(bytes: &[u8], text: &str) -> Result<Vec<u8>, PdfDeskError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PdfDeskError::validation("Enter watermark text."));
    }

    let mut doc = document::load(bytes)?;
    let font_id = add_helvetica(&mut doc);
    let state_id = add_opacity_state(&mut doc, OPACITY);

    let pages = page_ids(&doc);
    for &page_id in &pages {
        let bounds = page_box(&doc, page_id);
        let stamp = TextStamp {
            text,
            x: bounds.x + bounds.width / 2.0 - text.chars().count() as f32 * CHAR_OFFSET,
            y: bounds.y + bounds.height / 2.0,
            size: FONT_SIZE,
            gray: GRAY,
            rotation_degrees: ROTATION_DEGREES,
            graphics_state: Some(STATE_RESOURCE),
        };

        add_page_resource(&mut doc, page_id, "Font", FONT_RESOURCE, font_id)?;
        add_page_resource(&mut doc, page_id, "ExtGState", STATE_RESOURCE, state_id)?;
        append_page_content(&mut doc, page_id, text_stamp_content(&stamp)?)?;
    }

    info!(pages = pages.len(), "Added watermark");
    document::save(&mut doc)
}
