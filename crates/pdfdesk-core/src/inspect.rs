//! PDF validation and info extraction
//!
//! Validates PDF files and reports document and per-page metadata.

use lopdf::Document;
use serde::Serialize;

use crate::document::{self, page_box, page_rotation, resolve};
use crate::error::PdfDeskError;

/// PDF file information
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    /// Whether the document parsed and has pages
    pub valid: bool,
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Vec<PageInfo>,
}

/// Information about a single PDF page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub page_num: u32,
    /// Page width in points (1 point = 1/72 inch)
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Page rotation in degrees (0, 90, 180, 270)
    pub rotation: i64,
    /// Orientation as displayed, after rotation
    pub orientation: PageOrientation,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

impl PageOrientation {
    fn of(width: f32, height: f32, rotation: i64) -> Self {
        let (w, h) = if rotation == 90 || rotation == 270 {
            (height, width)
        } else {
            (width, height)
        };

        if (w - h).abs() < 1.0 {
            PageOrientation::Square
        } else if w > h {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

/// Parse a PDF and describe it.
pub fn inspect(bytes: &[u8]) -> Result<PdfInfo, PdfDeskError> {
    check_header(bytes)?;

    let doc = document::load(bytes)?;
    let pages = page_infos(&doc);
    if pages.is_empty() {
        return Err(PdfDeskError::validation("PDF has no pages"));
    }

    Ok(PdfInfo {
        page_count: pages.len() as u32,
        version: doc.version.clone(),
        encrypted: doc.is_encrypted(),
        size_bytes: bytes.len(),
        valid: true,
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
        pages,
    })
}

/// Quick validation without full parsing (for large files)
pub fn quick_validate(bytes: &[u8]) -> Result<(), PdfDeskError> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(1024)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(PdfDeskError::validation(
            "PDF appears truncated (missing %%EOF marker)",
        ));
    }
    Ok(())
}

fn check_header(bytes: &[u8]) -> Result<(), PdfDeskError> {
    if bytes.len() < 8 {
        return Err(PdfDeskError::validation("File too small to be a valid PDF"));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(PdfDeskError::validation(
            "Not a valid PDF file (missing %PDF- header)",
        ));
    }
    Ok(())
}

fn page_infos(doc: &Document) -> Vec<PageInfo> {
    doc.get_pages()
        .into_iter()
        .map(|(page_num, page_id)| {
            let bounds = page_box(doc, page_id);
            let rotation = page_rotation(doc, page_id);
            PageInfo {
                page_num,
                width: bounds.width,
                height: bounds.height,
                rotation,
                orientation: PageOrientation::of(bounds.width, bounds.height, rotation),
            }
        })
        .collect()
}

/// Read a text entry of the Info dictionary. Empty strings count as absent.
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = resolve(doc, doc.trailer.get(b"Info").ok()?).as_dict().ok()?;
    let value = resolve(doc, info.get(key).ok()?).as_str().ok()?;
    let text = decode_text_string(value);
    (!text.is_empty()).then_some(text)
}

/// PDF text strings are UTF-16BE when they start with a byte order mark,
/// otherwise PDFDocEncoding, treated here as Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
