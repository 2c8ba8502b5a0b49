//! Images to PDF, and embedded images out of a PDF
//!
//! JPEG data is passed through untouched (`DCTDecode`). PNG is decoded with
//! the `png` crate and stored as Flate-compressed samples, with the alpha
//! channel moved into a soft mask.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::document::{self, resolve};
use crate::error::PdfDeskError;
use crate::media::FileKind;

const IMAGE_RESOURCE: &str = "Im0";

/// An image found in a page's resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position among the page's images.
    pub index: usize,
    pub kind: FileKind,
    pub bytes: Vec<u8>,
}

impl ExtractedImage {
    pub fn filename(&self) -> String {
        format!("page-{}-{}.{}", self.page, self.index, self.kind.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegHeader {
    width: u16,
    height: u16,
    components: u8,
}

/// Build a PDF with one page per image, each page the size of its image.
pub fn images_to_pdf<'a, I>(images: I) -> Result<Vec<u8>, PdfDeskError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();

    for (name, bytes) in images {
        let (image_id, width, height) = match FileKind::sniff(name, bytes) {
            FileKind::Jpeg => embed_jpeg(&mut doc, name, bytes)?,
            FileKind::Png => embed_png(&mut doc, name, bytes)?,
            _ => {
                return Err(PdfDeskError::UnsupportedImage {
                    name: name.to_string(),
                    reason: "only PNG and JPEG images are supported".into(),
                })
            }
        };

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(width as i64),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(height as i64),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                IMAGE_RESOURCE,
                Object::Reference(image_id),
            )])),
        )]);
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width as i64),
                    Object::Integer(height as i64),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        kids.push(doc.add_object(page));
        debug!(name, width, height, "Added image page");
    }

    if kids.is_empty() {
        return Err(PdfDeskError::validation(
            "Please add JPG/PNG images for this tool.",
        ));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        (
            "Kids",
            Object::Array(kids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    info!(pages = kids.len(), "Built PDF from images");
    document::save(&mut doc)
}

fn embed_jpeg(
    doc: &mut Document,
    name: &str,
    bytes: &[u8],
) -> Result<(ObjectId, u32, u32), PdfDeskError> {
    let header = jpeg_header(bytes).ok_or_else(|| PdfDeskError::UnsupportedImage {
        name: name.to_string(),
        reason: "no JPEG frame header found".into(),
    })?;

    let color_space: &[u8] = match header.components {
        1 => b"DeviceGray",
        3 => b"DeviceRGB",
        4 => b"DeviceCMYK",
        n => {
            return Err(PdfDeskError::UnsupportedImage {
                name: name.to_string(),
                reason: format!("{} colour components", n),
            })
        }
    };

    let dict = image_dict(
        u32::from(header.width),
        u32::from(header.height),
        color_space,
        b"DCTDecode",
    );
    let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);
    Ok((
        doc.add_object(stream),
        u32::from(header.width),
        u32::from(header.height),
    ))
}

fn embed_png(
    doc: &mut Document,
    name: &str,
    bytes: &[u8],
) -> Result<(ObjectId, u32, u32), PdfDeskError> {
    let unsupported = |reason: String| PdfDeskError::UnsupportedImage {
        name: name.to_string(),
        reason,
    };

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(|e| unsupported(e.to_string()))?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|e| unsupported(e.to_string()))?;
    let samples = &buffer[..frame.buffer_size()];

    let (color_space, channels, has_alpha): (&[u8], usize, bool) = match frame.color_type {
        png::ColorType::Grayscale => (b"DeviceGray", 1, false),
        png::ColorType::GrayscaleAlpha => (b"DeviceGray", 1, true),
        png::ColorType::Rgb => (b"DeviceRGB", 3, false),
        png::ColorType::Rgba => (b"DeviceRGB", 3, true),
        png::ColorType::Indexed => return Err(unsupported("unexpanded palette".into())),
    };

    let (color, alpha) = if has_alpha {
        split_alpha(samples, channels)
    } else {
        (samples.to_vec(), Vec::new())
    };

    let mut dict = image_dict(frame.width, frame.height, color_space, b"FlateDecode");
    if has_alpha {
        let mask = Stream::new(
            image_dict(frame.width, frame.height, b"DeviceGray", b"FlateDecode"),
            deflate(&alpha)?,
        )
        .with_compression(false);
        let mask_id = doc.add_object(mask);
        dict.set("SMask", Object::Reference(mask_id));
    }

    let stream = Stream::new(dict, deflate(&color)?).with_compression(false);
    Ok((doc.add_object(stream), frame.width, frame.height))
}

fn image_dict(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(filter.to_vec())),
    ])
}

/// Separate interleaved `channels + 1` samples into colour and alpha planes.
fn split_alpha(samples: &[u8], channels: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = channels + 1;
    let pixels = samples.len() / stride;
    let mut color = Vec::with_capacity(pixels * channels);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in samples.chunks_exact(stride) {
        color.extend_from_slice(&pixel[..channels]);
        alpha.push(pixel[channels]);
    }
    (color, alpha)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfDeskError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfDeskError::Operation(format!("Compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfDeskError::Operation(format!("Compression failed: {}", e)))
}

/// Find the first start-of-frame segment and read size and component count.
fn jpeg_header(bytes: &[u8]) -> Option<JpegHeader> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = bytes[pos + 1];
        match marker {
            // Fill bytes
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let segment = bytes.get(pos + 4..pos + 2 + length)?;
            if segment.len() < 6 {
                return None;
            }
            return Some(JpegHeader {
                height: u16::from_be_bytes([segment[1], segment[2]]),
                width: u16::from_be_bytes([segment[3], segment[4]]),
                components: segment[5],
            });
        }
        pos += 2 + length;
    }
    None
}

/// Collect the images drawn directly by each page.
///
/// JPEG streams are written out as-is. 8-bit Gray or RGB samples, raw or
/// Flate-compressed, are re-encoded as PNG. Anything else (other filters,
/// indexed or CMYK colour, images nested in form XObjects) is skipped.
pub fn extract_images(bytes: &[u8]) -> Result<Vec<ExtractedImage>, PdfDeskError> {
    let doc = document::load(bytes)?;
    let mut images = Vec::new();

    for (page, page_id) in doc.get_pages() {
        let Some(xobjects) = page_xobjects(&doc, page_id) else {
            continue;
        };

        let mut index = 0;
        for (name, value) in xobjects.iter() {
            let Ok(stream) = resolve(&doc, value).as_stream() else {
                continue;
            };
            if !matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Image")) {
                continue;
            }

            match export_image(&doc, stream) {
                Some((kind, data)) => {
                    index += 1;
                    images.push(ExtractedImage {
                        page,
                        index,
                        kind,
                        bytes: data,
                    });
                }
                None => debug!(
                    page,
                    name = %String::from_utf8_lossy(name),
                    "Skipped image with unsupported encoding"
                ),
            }
        }
    }

    info!(images = images.len(), "Extracted images");
    Ok(images)
}

fn page_xobjects(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let resources = document::page_resources(doc, page_id)?;
    let xobjects = resources.get(b"XObject").ok()?;
    resolve(doc, xobjects).as_dict().ok().cloned()
}

fn export_image(doc: &Document, stream: &Stream) -> Option<(FileKind, Vec<u8>)> {
    let filters = stream_filters(&stream.dict);
    match filters.as_slice() {
        [filter] if filter.as_slice() == b"DCTDecode" => {
            Some((FileKind::Jpeg, stream.content.clone()))
        }
        [] => encode_raw_image(doc, &stream.dict, &stream.content),
        [filter] if filter.as_slice() == b"FlateDecode" => {
            let samples = stream.decompressed_content().ok()?;
            encode_raw_image(doc, &stream.dict, &samples)
        }
        _ => None,
    }
}

fn stream_filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn encode_raw_image(doc: &Document, dict: &Dictionary, samples: &[u8]) -> Option<(FileKind, Vec<u8>)> {
    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    let bits = dict.get(b"BitsPerComponent").ok()?.as_i64().ok()?;
    if bits != 8 {
        return None;
    }

    let color_space = resolve(doc, dict.get(b"ColorSpace").ok()?).as_name().ok()?;
    let (color, channels) = match color_space {
        b"DeviceGray" => (png::ColorType::Grayscale, 1usize),
        b"DeviceRGB" => (png::ColorType::Rgb, 3usize),
        _ => return None,
    };

    let expected = width as usize * height as usize * channels;
    if samples.len() < expected {
        return None;
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().ok()?;
        writer.write_image_data(&samples[..expected]).ok()?;
    }
    Some((FileKind::Png, out))
}
