//! Page-level PDF surgery: appending overlay content and font resources.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::config::{Align, TextPlacement};
use super::font::FontEncoder;
use super::OverlayError;

const FONT_RESOURCE_PREFIX: &str = "FOverlay";
const LINE_HEIGHT: f32 = 1.2;
const MAX_PARENT_DEPTH: usize = 64;

/// Build the content operations drawing `placements` with font `font_name`.
pub(crate) fn text_operations(
    placements: &[&TextPlacement],
    font_name: &[u8],
    encoder: &mut FontEncoder<'_>,
) -> Vec<Operation> {
    let mut operations = Vec::new();

    for placement in placements {
        for (index, line) in placement.text.split('\n').enumerate() {
            let encoded = encoder.encode(line);
            if encoded.glyphs.is_empty() {
                continue;
            }

            let width = encoded.width_at(placement.font_size);
            let x = match placement.align {
                Align::Left => placement.x,
                Align::Center => placement.x - width / 2.0,
                Align::Right => placement.x - width,
            };
            let y = placement.y - index as f32 * placement.font_size * LINE_HEIGHT;

            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font_name.to_vec()), placement.font_size.into()],
            ));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![encoded.to_pdf_string()]));
            operations.push(Operation::new("ET", vec![]));
        }
    }

    operations
}

fn resolve_dictionary(doc: &Document, object: &Object) -> Result<Dictionary, OverlayError> {
    match object {
        Object::Dictionary(dict) => Ok(dict.clone()),
        Object::Reference(id) => Ok(doc.get_dictionary(*id)?.clone()),
        _ => Err(OverlayError::MalformedPage(
            "expected a resource dictionary".to_string(),
        )),
    }
}

/// The page's own resources, or the nearest ones inherited through `/Parent`.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, OverlayError> {
    let mut current = page_id;

    for _ in 0..MAX_PARENT_DEPTH {
        let node = doc.get_dictionary(current)?;
        if let Ok(resources) = node.get(b"Resources") {
            return resolve_dictionary(doc, resources);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Ok(Dictionary::new()),
        }
    }

    Err(OverlayError::MalformedPage(
        "page tree nesting is too deep".to_string(),
    ))
}

/// Register `font_id` in the page's font resources and return the name it got.
///
/// Resources are copied inline onto the page so pages sharing a resource
/// dictionary are left untouched.
pub(crate) fn add_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<Vec<u8>, OverlayError> {
    let mut resources = effective_resources(doc, page_id)?;
    let mut fonts = match resources.get(b"Font") {
        Ok(fonts) => resolve_dictionary(doc, fonts)?,
        Err(_) => Dictionary::new(),
    };

    let mut name = FONT_RESOURCE_PREFIX.as_bytes().to_vec();
    let mut suffix = 1;
    while fonts.has(&name) {
        name = format!("{}{}", FONT_RESOURCE_PREFIX, suffix).into_bytes();
        suffix += 1;
    }

    fonts.set(name.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));

    Ok(name)
}

fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, OverlayError> {
    let page = doc.get_dictionary(page_id)?;
    let contents = match page.get(b"Contents") {
        Ok(contents) => contents.clone(),
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Reference(id) => match doc.get_object(id)? {
            Object::Array(items) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(id)]),
        },
        Object::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Append `operations` after the page's content, isolating the original
/// content in its own `q ... Q` graphics state.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<(), OverlayError> {
    let original = existing_contents(doc, page_id)?;
    let overlay = Content { operations }.encode()?;

    let mut contents = Vec::with_capacity(original.len() + 2);
    if original.is_empty() {
        contents.push(Object::Reference(
            doc.add_object(Stream::new(Dictionary::new(), overlay)),
        ));
    } else {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut restored = b"\nQ\n".to_vec();
        restored.extend_from_slice(&overlay);
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), restored));

        contents.push(Object::Reference(save_id));
        contents.extend(original);
        contents.push(Object::Reference(overlay_id));
    }

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));

    Ok(())
}
