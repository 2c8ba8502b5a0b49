//! Shared `lopdf` plumbing
//!
//! Loading and saving, page lookup, page-tree rebuilding and the small
//! content/resource edits every stamping operation needs.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::PdfDeskError;
use crate::page_range::PageSelection;

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_MEDIA_BOX: PageBox = PageBox {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Page rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn load(bytes: &[u8]) -> Result<Document, PdfDeskError> {
    Document::load_mem(bytes).map_err(|e| PdfDeskError::Parse(e.to_string()))
}

pub fn save(doc: &mut Document) -> Result<Vec<u8>, PdfDeskError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfDeskError::Save(e.to_string()))?;
    Ok(buffer)
}

/// Page object ids in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

pub fn page_count(doc: &Document) -> u32 {
    doc.get_pages().len() as u32
}

/// Id of the root `Pages` node referenced by the catalog.
pub fn pages_root_id(doc: &Document) -> Result<ObjectId, PdfDeskError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfDeskError::Operation("No Root in trailer".into()))?;

    doc.get_dictionary(catalog_id)
        .map_err(|_| PdfDeskError::Operation("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfDeskError::Operation("No Pages in catalog".into()))
}

/// Mutable access to the document catalog.
pub fn catalog_mut(doc: &mut Document) -> Result<&mut Dictionary, PdfDeskError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| PdfDeskError::Operation("No Root in trailer".into()))?;
    doc.get_dictionary_mut(catalog_id)
        .map_err(|_| PdfDeskError::Operation("Catalog not found".into()))
}

/// Replace the root page tree with a flat list of pages.
///
/// Every listed page gets the root as its `Parent`; intermediate `Pages`
/// nodes become unreachable and are dropped by the next `prune_objects`.
pub fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfDeskError> {
    let pages_id = pages_root_id(doc)?;

    for &page_id in page_refs {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let pages_dict = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| PdfDeskError::Operation("Invalid pages dictionary".into()))?;
    let kids = page_refs
        .iter()
        .map(|&id| Object::Reference(id))
        .collect::<Vec<_>>();
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_refs.len() as i64));

    Ok(())
}

/// Copy inherited attributes from the page's ancestors onto the page itself,
/// so the page survives being re-parented.
pub fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfDeskError> {
    let inherited: Vec<(&[u8], Object)> = {
        let page = doc.get_dictionary(page_id)?;
        INHERITABLE_KEYS
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|&key| inherited_value(doc, page, key).map(|value| (key, value)))
            .collect()
    };

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

fn inherited_value(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    None
}

/// Build a document holding the selected pages of `source`, in selection
/// order.
///
/// Repeated indices produce independent page objects that share content and
/// resources. Fails with [`PdfDeskError::PageOutOfRange`] if any index is
/// past the end of the document.
pub fn copy_pages(source: &Document, selection: &PageSelection) -> Result<Document, PdfDeskError> {
    let source_pages = page_ids(source);
    let page_count = source_pages.len() as u32;

    if let Some(index) = selection.iter().find(|&index| index >= page_count) {
        return Err(PdfDeskError::PageOutOfRange { index, page_count });
    }

    let mut doc = source.clone();
    for &page_id in &source_pages {
        materialize_inherited(&mut doc, page_id)?;
    }

    let mut used = HashSet::new();
    let mut kids = Vec::with_capacity(selection.len());
    for index in selection {
        let page_id = source_pages[index as usize];
        if used.insert(page_id) {
            kids.push(page_id);
        } else {
            let copy = doc.get_dictionary(page_id)?.clone();
            kids.push(doc.add_object(copy));
        }
    }

    for page_id in source_pages.iter().filter(|id| !used.contains(*id)) {
        doc.objects.remove(page_id);
    }

    rebuild_page_tree(&mut doc, &kids)?;
    let pruned = doc.prune_objects();
    debug!(
        pages = kids.len(),
        pruned = pruned.len(),
        "Copied pages into new document"
    );

    Ok(doc)
}

/// Resolve one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// Read a four-number rectangle (`[x1 y1 x2 y2]`), normalised.
pub(crate) fn rectangle(doc: &Document, object: &Object) -> Option<PageBox> {
    let values = resolve(doc, object).as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let coords: Vec<f32> = values
        .iter()
        .filter_map(|v| number(resolve(doc, v)))
        .collect();
    if coords.len() != 4 {
        return None;
    }
    let (x1, x2) = (coords[0].min(coords[2]), coords[0].max(coords[2]));
    let (y1, y2) = (coords[1].min(coords[3]), coords[1].max(coords[3]));
    Some(PageBox {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// The page's MediaBox, following inheritance, or US Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return DEFAULT_MEDIA_BOX;
    };

    let media_box = match page.get(b"MediaBox") {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_value(doc, page, b"MediaBox"),
    };

    media_box
        .and_then(|value| rectangle(doc, &value))
        .filter(|b| b.width > 0.0 && b.height > 0.0)
        .unwrap_or(DEFAULT_MEDIA_BOX)
}

/// The page's `/Rotate`, following inheritance, normalised to 0..360.
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return 0;
    };
    let rotate = match page.get(b"Rotate") {
        Ok(value) => Some(value.clone()),
        Err(_) => inherited_value(doc, page, b"Rotate"),
    };
    rotate
        .and_then(|value| resolve(doc, &value).as_i64().ok())
        .map(|r| r.rem_euclid(360))
        .unwrap_or(0)
}

/// The page's resource dictionary, following inheritance.
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let page = doc.get_dictionary(page_id).ok()?;
    let resources = match page.get(b"Resources") {
        Ok(value) => value.clone(),
        Err(_) => inherited_value(doc, page, b"Resources")?,
    };
    resolve(doc, &resources).as_dict().ok().cloned()
}

/// Content stream references of a page, flattening a referenced array.
fn content_refs(doc: &Document, page: &Dictionary) -> Vec<Object> {
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            Ok(_) => vec![Object::Reference(*id)],
            Err(_) => Vec::new(),
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Draw `content` on top of a page.
///
/// Existing content is wrapped in `q … Q` so a graphics state it leaves
/// behind does not leak into the overlay.
pub fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), PdfDeskError> {
    let existing = content_refs(doc, doc.get_dictionary(page_id)?);

    let contents = if existing.is_empty() {
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), content));
        vec![Object::Reference(overlay_id)]
    } else {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend_from_slice(&content);
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));
        contents
    };

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Register `target` under `/Resources/<category>/<name>` for a page.
///
/// Resource dictionaries shared through references are edited in place.
pub fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), PdfDeskError> {
    materialize_inherited(doc, page_id)?;

    let resources_id = match doc.get_dictionary(page_id)?.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let category_id = {
        let resources = resources_mut(doc, page_id, resources_id)?;
        let existing = match resources.get(category.as_bytes()) {
            Ok(Object::Reference(id)) => Some(Some(*id)),
            Ok(Object::Dictionary(_)) => Some(None),
            _ => None,
        };
        match existing {
            Some(found) => found,
            None => {
                resources.set(category, Dictionary::new());
                None
            }
        }
    };

    let entries = match category_id {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => resources_mut(doc, page_id, resources_id)?
            .get_mut(category.as_bytes())?
            .as_dict_mut()?,
    };
    entries.set(name, Object::Reference(target));
    Ok(())
}

fn resources_mut(
    doc: &mut Document,
    page_id: ObjectId,
    resources_id: Option<ObjectId>,
) -> Result<&mut Dictionary, PdfDeskError> {
    if let Some(id) = resources_id {
        return Ok(doc.get_dictionary_mut(id)?);
    }

    let page = doc.get_dictionary_mut(page_id)?;
    if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
        page.set("Resources", Dictionary::new());
    }
    Ok(page.get_mut(b"Resources")?.as_dict_mut()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{nested_tree_pdf, page_texts, sample_pdf};

    #[test]
    fn test_copy_pages_keeps_selection_order() {
        let doc = load(&sample_pdf(5)).unwrap();
        let mut copy = copy_pages(&doc, &PageSelection::parse("3,1,2")).unwrap();
        let bytes = save(&mut copy).unwrap();
        assert_eq!(page_texts(&bytes), vec!["Page 3", "Page 1", "Page 2"]);
    }

    #[test]
    fn test_copy_pages_duplicates_pages() {
        let doc = load(&sample_pdf(3)).unwrap();
        let mut copy = copy_pages(&doc, &PageSelection::parse("2,2,2")).unwrap();
        let bytes = save(&mut copy).unwrap();
        let reloaded = load(&bytes).unwrap();
        assert_eq!(page_count(&reloaded), 3);
        assert_eq!(page_texts(&bytes), vec!["Page 2", "Page 2", "Page 2"]);
    }

    #[test]
    fn test_copy_pages_out_of_range() {
        let doc = load(&sample_pdf(2)).unwrap();
        let err = copy_pages(&doc, &PageSelection::parse("1,3")).unwrap_err();
        assert!(matches!(
            err,
            PdfDeskError::PageOutOfRange {
                index: 2,
                page_count: 2
            }
        ));
    }

    #[test]
    fn test_copy_pages_materializes_inherited_media_box() {
        let doc = load(&nested_tree_pdf()).unwrap();
        let mut copy = copy_pages(&doc, &PageSelection::parse("2")).unwrap();
        let bytes = save(&mut copy).unwrap();
        let reloaded = load(&bytes).unwrap();
        let page_id = page_ids(&reloaded)[0];
        let media_box = page_box(&reloaded, page_id);
        assert_eq!(media_box.width, 300.0);
        assert_eq!(media_box.height, 400.0);
        assert!(reloaded
            .get_dictionary(page_id)
            .unwrap()
            .has(b"Resources"));
    }

    #[test]
    fn test_page_box_defaults_to_letter() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.add_object(Dictionary::new());
        assert_eq!(page_box(&doc, page_id), DEFAULT_MEDIA_BOX);
    }

    #[test]
    fn test_append_content_wraps_existing_content() {
        let mut doc = load(&sample_pdf(1)).unwrap();
        let page_id = page_ids(&doc)[0];
        append_page_content(&mut doc, page_id, b"0 0 m 10 10 l S".to_vec()).unwrap();

        let contents = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(contents.len(), 3);

        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with("q\n"));
        assert!(text.contains("Q\n0 0 m 10 10 l S"));
    }

    #[test]
    fn test_add_page_resource_creates_category() {
        let mut doc = load(&sample_pdf(1)).unwrap();
        let page_id = page_ids(&doc)[0];
        let gs_id = doc.add_object(Dictionary::new());
        add_page_resource(&mut doc, page_id, "ExtGState", "GS0", gs_id).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = resolve(&doc, page.get(b"Resources").unwrap())
            .as_dict()
            .unwrap();
        let ext = resolve(&doc, resources.get(b"ExtGState").unwrap())
            .as_dict()
            .unwrap();
        assert_eq!(ext.get(b"GS0").unwrap().as_reference().unwrap(), gs_id);
        // Existing fonts are untouched
        assert!(resources.has(b"Font"));
    }
}
