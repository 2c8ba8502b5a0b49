//! Text overlays drawn with the standard Helvetica font
//!
//! Shared by the watermark and page-number stamps.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::PdfDeskError;

/// Resource names are prefixed to stay clear of names already on the page.
pub(crate) const FONT_RESOURCE: &str = "PdfDeskHelv";

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// A single line of text placed on a page.
#[derive(Debug, Clone)]
pub(crate) struct TextStamp<'a> {
    pub text: &'a str,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub gray: f32,
    pub rotation_degrees: f32,
    /// ExtGState resource name, when the stamp is translucent.
    pub graphics_state: Option<&'a str>,
}

/// Add a Helvetica font dictionary (WinAnsi encoded) to the document.
pub(crate) fn add_helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]))
}

/// Add an ExtGState setting both stroke and fill opacity.
pub(crate) fn add_opacity_state(doc: &mut Document, opacity: f32) -> ObjectId {
    doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"ExtGState".to_vec())),
        ("CA", Object::Real(opacity)),
        ("ca", Object::Real(opacity)),
    ]))
}

/// Encode text for a WinAnsi font. Characters outside Latin-1 become `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Width of `text` set in Helvetica at `size` points.
pub(crate) fn helvetica_text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = u32::from(c);
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                u32::from(DEFAULT_WIDTH)
            }
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Content stream drawing one [`TextStamp`], isolated in its own `q … Q`.
pub(crate) fn text_stamp_content(stamp: &TextStamp<'_>) -> Result<Vec<u8>, PdfDeskError> {
    let radians = stamp.rotation_degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let mut operations = vec![Operation::new("q", vec![])];
    if let Some(state) = stamp.graphics_state {
        operations.push(Operation::new(
            "gs",
            vec![Object::Name(state.as_bytes().to_vec())],
        ));
    }
    operations.extend([
        Operation::new(
            "rg",
            vec![
                Object::Real(stamp.gray),
                Object::Real(stamp.gray),
                Object::Real(stamp.gray),
            ],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_RESOURCE.as_bytes().to_vec()),
                Object::Real(stamp.size),
            ],
        ),
        Operation::new(
            "Tm",
            vec![
                Object::Real(cos),
                Object::Real(sin),
                Object::Real(-sin),
                Object::Real(cos),
                Object::Real(stamp.x),
                Object::Real(stamp.y),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(
                encode_win_ansi(stamp.text),
                StringFormat::Literal,
            )],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]);

    Content { operations }
        .encode()
        .map_err(|e| PdfDeskError::Operation(format!("Failed to encode overlay: {}", e)))
}
