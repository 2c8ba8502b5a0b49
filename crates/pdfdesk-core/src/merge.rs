//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document.

use std::collections::BTreeMap;

use lopdf::{Document, Object};
use tracing::{debug, info};

use crate::document::{self, materialize_inherited, page_ids, rebuild_page_tree};
use crate::error::PdfDeskError;

/// Merge multiple PDFs into one, keeping every page in input order.
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If single document, return it as-is
/// 3. Use the first document as the destination
/// 4. For each further source document:
///    a. Calculate ID offset to avoid conflicts
///    b. Import all objects with remapped IDs
///    c. Append its pages to the destination page list
/// 5. Rebuild the page tree, drop orphaned objects, compress and return
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfDeskError> {
    let mut documents = documents.into_iter();
    let Some(first) = documents.next() else {
        return Err(PdfDeskError::Operation("No documents to merge".into()));
    };

    let rest: Vec<Vec<u8>> = documents.collect();
    if rest.is_empty() {
        return Ok(first);
    }

    let mut dest = Document::load_mem(&first)
        .map_err(|e| PdfDeskError::Parse(format!("Failed to load document 0: {}", e)))?;
    let mut dest_max_id = dest.max_id;

    let mut dest_page_refs = page_ids(&dest);
    for &page_id in &dest_page_refs {
        materialize_inherited(&mut dest, page_id)?;
    }

    for (i, bytes) in rest.iter().enumerate() {
        let mut source = Document::load_mem(bytes)
            .map_err(|e| PdfDeskError::Parse(format!("Failed to load document {}: {}", i + 1, e)))?;

        let source_pages = page_ids(&source);
        for &page_id in &source_pages {
            materialize_inherited(&mut source, page_id)?;
        }

        let id_offset = dest_max_id;

        let mut remapped_objects = BTreeMap::new();
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            remapped_objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        dest.objects.extend(remapped_objects);

        dest_page_refs.extend(
            source_pages
                .iter()
                .map(|page_ref| (page_ref.0 + id_offset, page_ref.1)),
        );

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
        debug!(
            document = i + 1,
            pages = source_pages.len(),
            id_offset,
            "Imported document"
        );
    }

    dest.max_id = dest_max_id;
    rebuild_page_tree(&mut dest, &dest_page_refs)?;
    dest.prune_objects();
    dest.compress();

    info!(
        documents = rest.len() + 1,
        pages = dest_page_refs.len(),
        "Merged documents"
    );

    document::save(&mut dest)
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
