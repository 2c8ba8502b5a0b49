//! Fixture documents for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

fn helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]))
}

fn text_content(text: &str) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

fn media_box(width: i64, height: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(width),
        Object::Integer(height),
    ])
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<ObjectId>) -> (Document, ObjectId) {
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        (
            "Kids",
            Object::Array(kids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));
    (doc, catalog_id)
}

fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn build_pages(num_pages: u32) -> (Document, ObjectId, Vec<ObjectId>) {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = helvetica(&mut doc);

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            text_content(&format!("Page {}", i + 1)),
        ));
        let resources = Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "F1",
                Object::Reference(font_id),
            )])),
        )]);
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", media_box(612, 792)),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }
    (doc, pages_id, page_ids)
}

/// A Letter-sized PDF whose page `n` shows the text `Page n`.
pub fn sample_pdf(num_pages: u32) -> Vec<u8> {
    let (doc, pages_id, page_ids) = build_pages(num_pages);
    let (doc, _) = finish(doc, pages_id, page_ids);
    to_bytes(doc)
}

/// Same as [`sample_pdf`] with a populated Info dictionary.
pub fn sample_pdf_with_info(num_pages: u32) -> Vec<u8> {
    let (doc, pages_id, page_ids) = build_pages(num_pages);
    let (mut doc, _) = finish(doc, pages_id, page_ids);
    let info = Dictionary::from_iter(vec![
        (
            "Title",
            Object::String(b"Quarterly Report".to_vec(), StringFormat::Literal),
        ),
        (
            "Author",
            Object::String(b"Finance Team".to_vec(), StringFormat::Literal),
        ),
        (
            "Producer",
            Object::String(b"Some Producer".to_vec(), StringFormat::Literal),
        ),
    ]);
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));
    to_bytes(doc)
}

/// Two pages under an intermediate `Pages` node; MediaBox and Resources are
/// only set on the root.
pub fn nested_tree_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_id = doc.new_object_id();
    let middle_id = doc.new_object_id();
    let font_id = helvetica(&mut doc);

    let mut kids = Vec::new();
    for i in 0..2 {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            text_content(&format!("Nested {}", i + 1)),
        ));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(middle_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let middle = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Parent", Object::Reference(root_id)),
        ("Count", Object::Integer(2)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(middle_id, Object::Dictionary(middle));

    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]);
    let root = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(2)),
        ("Kids", Object::Array(vec![Object::Reference(middle_id)])),
        ("MediaBox", media_box(300, 400)),
        ("Resources", Object::Dictionary(resources)),
    ]);
    doc.objects.insert(root_id, Object::Dictionary(root));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(root_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    to_bytes(doc)
}

/// One page with a text field widget carrying a normal appearance stream.
pub fn form_pdf() -> Vec<u8> {
    let (mut doc, pages_id, page_ids) = build_pages(1);
    let page_id = page_ids[0];

    let appearance = Stream::new(
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Form".to_vec())),
            (
                "BBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(200),
                    Object::Integer(20),
                ]),
            ),
        ]),
        b"BT /F1 12 Tf 2 5 Td (Jane Doe) Tj ET".to_vec(),
    );
    let appearance_id = doc.add_object(appearance);

    let widget = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Widget".to_vec())),
        ("FT", Object::Name(b"Tx".to_vec())),
        (
            "T",
            Object::String(b"name".to_vec(), StringFormat::Literal),
        ),
        (
            "V",
            Object::String(b"Jane Doe".to_vec(), StringFormat::Literal),
        ),
        (
            "Rect",
            Object::Array(vec![
                Object::Integer(100),
                Object::Integer(600),
                Object::Integer(300),
                Object::Integer(620),
            ]),
        ),
        ("P", Object::Reference(page_id)),
        (
            "AP",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "N",
                Object::Reference(appearance_id),
            )])),
        ),
    ]);
    let widget_id = doc.add_object(widget);

    let link = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Link".to_vec())),
        (
            "Rect",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(10),
                Object::Integer(10),
            ]),
        ),
    ]);
    let link_id = doc.add_object(link);

    doc.get_dictionary_mut(page_id).unwrap().set(
        "Annots",
        Object::Array(vec![
            Object::Reference(widget_id),
            Object::Reference(link_id),
        ]),
    );

    let (mut doc, catalog_id) = finish(doc, pages_id, page_ids);
    let acro_form = Dictionary::from_iter(vec![(
        "Fields",
        Object::Array(vec![Object::Reference(widget_id)]),
    )]);
    doc.get_dictionary_mut(catalog_id)
        .unwrap()
        .set("AcroForm", Object::Dictionary(acro_form));
    to_bytes(doc)
}

/// One page drawing a JPEG (`Im1`) and a 2x2 Flate RGB image (`Im2`).
pub fn image_pdf() -> Vec<u8> {
    let (mut doc, pages_id, page_ids) = build_pages(1);
    let page_id = page_ids[0];

    let jpeg = Stream::new(
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(4)),
            ("Height", Object::Integer(3)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]),
        sample_jpeg(4, 3),
    );
    let jpeg_id = doc.add_object(jpeg);

    let pixels: Vec<u8> = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    let mut raw = Stream::new(
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(2)),
            ("Height", Object::Integer(2)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]),
        pixels,
    );
    raw.compress().unwrap();
    let raw_id = doc.add_object(raw);

    let xobjects = Dictionary::from_iter(vec![
        ("Im1", Object::Reference(jpeg_id)),
        ("Im2", Object::Reference(raw_id)),
    ]);
    let page = doc.get_dictionary_mut(page_id).unwrap();
    page.get_mut(b"Resources")
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("XObject", Object::Dictionary(xobjects));

    let (doc, _) = finish(doc, pages_id, page_ids);
    to_bytes(doc)
}

/// Header-only baseline JPEG: SOI, SOF0 and EOI. Enough for embedding.
pub fn sample_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    // APP0 segment to make sure the scanner skips non-SOF markers
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
    bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.push(3);
    for component in 1..=3u8 {
        bytes.extend_from_slice(&[component, 0x11, 0x00]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

/// A small PNG encoded with the `png` crate.
pub fn sample_png(width: u32, height: u32, color: png::ColorType) -> Vec<u8> {
    let channels = match color {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => 1,
    };
    let data = vec![128u8; (width * height) as usize * channels];

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&data).unwrap();
    }
    out
}

/// Text drawn by each page's `Tj` operators, in page order.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| op.operands.first())
                .filter_map(|operand| operand.as_str().ok())
                .map(|text| String::from_utf8_lossy(text).into_owned())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}
