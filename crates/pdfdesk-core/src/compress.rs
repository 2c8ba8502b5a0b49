//! Lightweight size reduction
//!
//! No image re-encoding happens here. The savings come from dropping
//! metadata and unreachable objects and from Flate-compressing streams.

use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::document::{self, catalog_mut, page_ids};
use crate::error::PdfDeskError;

/// Info dictionary entries that are removed.
const INFO_KEYS: [&[u8]; 6] = [
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Producer",
    b"Creator",
];

/// Page entries that only carry editor or thumbnail data.
const PAGE_EXTRAS: [&[u8]; 2] = [b"Thumb", b"PieceInfo"];

/// Compression strength, clamped to `1..=9`.
///
/// Levels below 5 additionally strip XMP metadata and page thumbnails and
/// renumber objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn strips_extras(self) -> bool {
        self.0 < 5
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl From<u8> for CompressionLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<CompressionLevel> for u8 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

pub fn compress_document(bytes: &[u8], level: CompressionLevel) -> Result<Vec<u8>, PdfDeskError> {
    let mut doc = document::load(bytes)?;

    clear_info(&mut doc);

    if level.strips_extras() {
        strip_extras(&mut doc)?;
    }

    let pruned = doc.prune_objects();
    if level.strips_extras() {
        doc.renumber_objects();
    }
    doc.compress();

    let output = document::save(&mut doc)?;
    info!(
        level = level.get(),
        pruned = pruned.len(),
        input_bytes = bytes.len(),
        output_bytes = output.len(),
        "Compressed document"
    );
    Ok(output)
}

fn clear_info(doc: &mut Document) {
    let info_id = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();
    let info = match info_id {
        Some(id) => doc.get_dictionary_mut(id).ok(),
        None => doc
            .trailer
            .get_mut(b"Info")
            .ok()
            .and_then(|info| info.as_dict_mut().ok()),
    };

    if let Some(info) = info {
        for key in INFO_KEYS {
            info.remove(key);
        }
    }
}

fn strip_extras(doc: &mut Document) -> Result<(), PdfDeskError> {
    if catalog_mut(doc)?.remove(b"Metadata").is_some() {
        debug!("Removed XMP metadata");
    }

    for page_id in page_ids(doc) {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for key in PAGE_EXTRAS {
                page.remove(key);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_texts, sample_pdf, sample_pdf_with_info};

    fn info_dict(bytes: &[u8]) -> lopdf::Dictionary {
        let doc = Document::load_mem(bytes).unwrap();
        let id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        doc.get_dictionary(id).unwrap().clone()
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(CompressionLevel::new(0).get(), 1);
        assert_eq!(CompressionLevel::new(42).get(), 9);
        assert_eq!(CompressionLevel::default().get(), 3);
    }

    #[test]
    fn test_compress_removes_info_entries() {
        let pdf = sample_pdf_with_info(2);
        assert!(info_dict(&pdf).has(b"Title"));

        let out = compress_document(&pdf, CompressionLevel::default()).unwrap();
        let info = info_dict(&out);
        assert!(!info.has(b"Title"));
        assert!(!info.has(b"Author"));
        assert!(!info.has(b"Producer"));
    }

    #[test]
    fn test_compress_keeps_pages() {
        let pdf = sample_pdf(4);
        for level in [1, 5, 9] {
            let out = compress_document(&pdf, CompressionLevel::new(level)).unwrap();
            assert_eq!(
                page_texts(&out),
                vec!["Page 1", "Page 2", "Page 3", "Page 4"]
            );
        }
    }

    #[test]
    fn test_compress_without_info() {
        let out = compress_document(&sample_pdf(1), CompressionLevel::new(2)).unwrap();
        assert!(Document::load_mem(&out).is_ok());
    }

    #[test]
    fn test_level_deserializes_from_number() {
        let level: CompressionLevel = serde_json::from_str("12").unwrap();
        assert_eq!(level.get(), 9);
    }
}
