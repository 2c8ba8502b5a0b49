//! Form flattening
//!
//! Each widget's normal appearance is drawn into the page content as a form
//! XObject, then the widgets and the catalog `AcroForm` are removed.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, warn};

use crate::document::{
    self, add_page_resource, append_page_content, catalog_mut, page_ids, rectangle, resolve, PageBox,
};
use crate::error::PdfDeskError;

/// Annotation flag bit for hidden annotations.
const HIDDEN_FLAG: i64 = 1 << 1;

/// An appearance ready to be painted onto its page.
struct Placement {
    name: String,
    appearance: ObjectId,
    matrix: [f32; 6],
}

pub fn flatten_forms(bytes: &[u8]) -> Result<Vec<u8>, PdfDeskError> {
    let mut doc = document::load(bytes)?;

    let has_form = catalog_mut(&mut doc)?.has(b"AcroForm");
    if !has_form {
        warn!("Document has no form fields; nothing to flatten");
        return document::save(&mut doc);
    }

    let mut flattened = 0;
    for page_id in page_ids(&doc) {
        let annots = page_annotations(&doc, page_id);
        if annots.is_empty() {
            continue;
        }

        let mut kept = Vec::new();
        let mut placements = Vec::new();
        for annot in annots {
            let Ok(dict) = resolve(&doc, &annot).as_dict().cloned() else {
                kept.push(annot);
                continue;
            };
            if !matches!(dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Widget")) {
                kept.push(annot);
                continue;
            }

            let hidden = dict
                .get(b"F")
                .and_then(Object::as_i64)
                .map(|flags| flags & HIDDEN_FLAG != 0)
                .unwrap_or(false);
            if hidden {
                debug!(?page_id, "Dropped hidden widget");
                continue;
            }

            match widget_placement(&doc, &dict, placements.len()) {
                Some(placement) => placements.push(placement),
                None => debug!(?page_id, "Dropped widget without a normal appearance"),
            }
        }

        let mut content = Vec::new();
        for placement in &placements {
            add_page_resource(
                &mut doc,
                page_id,
                "XObject",
                &placement.name,
                placement.appearance,
            )?;
            let [a, b, c, d, e, f] = placement.matrix;
            content.extend_from_slice(
                format!(
                    "q {} {} {} {} {} {} cm /{} Do Q\n",
                    a, b, c, d, e, f, placement.name
                )
                .as_bytes(),
            );
        }
        if !content.is_empty() {
            append_page_content(&mut doc, page_id, content)?;
        }
        flattened += placements.len();

        let page = doc.get_dictionary_mut(page_id)?;
        if kept.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", Object::Array(kept));
        }
    }

    catalog_mut(&mut doc)?.remove(b"AcroForm");
    doc.prune_objects();

    info!(widgets = flattened, "Flattened form");
    document::save(&mut doc)
}

fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Annots") {
        Ok(value) => resolve(doc, value)
            .as_array()
            .map(|items| items.to_vec())
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

/// Locate the widget's normal appearance and map its BBox onto its Rect.
fn widget_placement(doc: &Document, widget: &Dictionary, position: usize) -> Option<Placement> {
    let rect = rectangle(doc, widget.get(b"Rect").ok()?)?;
    let appearances = resolve(doc, widget.get(b"AP").ok()?).as_dict().ok()?;
    let normal = appearances.get(b"N").ok()?;

    // N is either the appearance stream itself or a dictionary of states
    let appearance = match normal {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => *id,
            Object::Dictionary(states) => state_appearance(widget, states)?,
            _ => return None,
        },
        Object::Dictionary(states) => state_appearance(widget, states)?,
        _ => return None,
    };

    let stream = doc.get_object(appearance).ok()?.as_stream().ok()?;
    let bbox = stream
        .dict
        .get(b"BBox")
        .ok()
        .and_then(|value| rectangle(doc, value))
        .filter(|b| b.width > 0.0 && b.height > 0.0)
        .unwrap_or(PageBox {
            x: 0.0,
            y: 0.0,
            width: rect.width,
            height: rect.height,
        });

    Some(Placement {
        name: format!("PdfDeskFlat{}", position),
        appearance,
        matrix: fit_matrix(bbox, rect),
    })
}

fn state_appearance(widget: &Dictionary, states: &Dictionary) -> Option<ObjectId> {
    let state = widget.get(b"AS").and_then(Object::as_name).ok()?;
    states.get(state).and_then(Object::as_reference).ok()
}

/// Matrix that scales and translates `bbox` onto `rect`.
fn fit_matrix(bbox: PageBox, rect: PageBox) -> [f32; 6] {
    let sx = rect.width / bbox.width;
    let sy = rect.height / bbox.height;
    [sx, 0.0, 0.0, sy, rect.x - bbox.x * sx, rect.y - bbox.y * sy]
}
