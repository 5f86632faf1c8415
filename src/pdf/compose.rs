//! Page compositing
//!
//! Merges a watermark overlay onto every page of a source PDF. The overlay's
//! objects are imported into the source document with their IDs renumbered
//! past the source's range, then each source page gets the overlay content
//! appended to its `Contents` and the overlay resources merged into its
//! `Resources`. Existing page content stays visible beneath the watermark.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::pdf::overlay::{build_overlay, WatermarkSpec};

/// Watermark a whole document for one recipient.
///
/// Loads the source from `input_path`, builds the overlay once, merges it
/// onto every page in original order, and writes the result to
/// `output_path` (created or truncated). The source file is never modified.
pub fn watermark_document(
    input_path: &Path,
    spec: &WatermarkSpec,
    output_path: &Path,
) -> Result<()> {
    let mut doc = Document::load(input_path)?;
    let overlay = build_overlay(spec)?;
    apply_overlay(&mut doc, &overlay)?;
    doc.compress();
    doc.save(output_path)?;
    Ok(())
}

/// Merge the overlay's single page onto every page of `doc`.
///
/// Page count and order are untouched; only `Contents` and `Resources` of
/// each page change.
pub fn apply_overlay(doc: &mut Document, overlay: &Document) -> Result<()> {
    // Content streams are parsed and rewritten below, so work decompressed.
    doc.decompress();

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    log::debug!("merging overlay onto {} page(s)", page_ids.len());

    // Wrap existing page content in q/Q first so a dangling transform or
    // unbalanced graphics state in the source cannot displace the overlay.
    for &page_id in &page_ids {
        isolate_page_content(doc, page_id)?;
    }

    let id_map = import_overlay_objects(doc, overlay);
    let (content_refs, resources) = overlay_page_parts(overlay, &id_map)?;

    for &page_id in &page_ids {
        append_overlay_content(doc, page_id, &content_refs)?;
        merge_page_resources(doc, page_id, &resources)?;
    }

    Ok(())
}

/// Copy every overlay object into `doc`, renumbering IDs past the source's
/// range. Returns the old-to-new ID map.
fn import_overlay_objects(doc: &mut Document, overlay: &Document) -> HashMap<ObjectId, ObjectId> {
    let offset = doc.max_id + 1;
    let id_map: HashMap<ObjectId, ObjectId> = overlay
        .objects
        .keys()
        .map(|&(num, gen)| ((num, gen), (num + offset, gen)))
        .collect();

    for (old_id, object) in overlay.objects.iter() {
        doc.objects
            .insert(id_map[old_id], remap_references(object, &id_map));
    }
    doc.max_id = overlay.max_id + offset;

    id_map
}

/// Rewrite every indirect reference in an object through `id_map`.
fn remap_references(object: &Object, id_map: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => Object::Reference(*id_map.get(id).unwrap_or(id)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| remap_references(item, id_map))
                .collect(),
        ),
        Object::Dictionary(dict) => {
            let mut remapped = Dictionary::new();
            for (key, value) in dict.iter() {
                remapped.set(key.clone(), remap_references(value, id_map));
            }
            Object::Dictionary(remapped)
        }
        Object::Stream(stream) => {
            let mut dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                dict.set(key.clone(), remap_references(value, id_map));
            }
            Object::Stream(Stream {
                dict,
                content: stream.content.clone(),
                allows_compression: stream.allows_compression,
                start_position: stream.start_position,
            })
        }
        other => other.clone(),
    }
}

/// Pull the overlay page's content references and resources dictionary,
/// already remapped into the destination document's ID space.
fn overlay_page_parts(
    overlay: &Document,
    id_map: &HashMap<ObjectId, ObjectId>,
) -> Result<(Vec<Object>, Dictionary)> {
    let page_id = overlay
        .get_pages()
        .into_values()
        .next()
        .ok_or_else(|| Error::General("overlay document has no page".to_string()))?;
    let page_dict = overlay.get_object(page_id)?.as_dict()?;

    let content_refs = match page_dict.get(b"Contents") {
        Ok(contents) => match remap_references(contents, id_map) {
            Object::Array(items) => items,
            single => vec![single],
        },
        Err(_) => Vec::new(),
    };

    let resources = match page_dict.get(b"Resources") {
        Ok(Object::Reference(id)) => overlay.get_object(*id)?.as_dict()?.clone(),
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };
    let resources = match remap_references(&Object::Dictionary(resources), id_map) {
        Object::Dictionary(dict) => dict,
        _ => Dictionary::new(),
    };

    Ok((content_refs, resources))
}

/// Collapse a page's content streams into one stream wrapped in q/Q.
///
/// Pages whose `Contents` is neither a reference nor an array of references
/// are left alone.
fn isolate_page_content(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let content_ids: Vec<ObjectId> = {
        let page_dict = doc.get_object(page_id)?.as_dict()?;
        match page_dict.get(b"Contents") {
            Ok(Object::Reference(id)) => vec![*id],
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_reference().ok())
                .collect(),
            _ => return Ok(()),
        }
    };

    let mut wrapped = b"q\n".to_vec();
    for content_id in content_ids {
        if let Ok(Object::Stream(stream)) = doc.get_object(content_id) {
            wrapped.extend_from_slice(&stream.content);
            wrapped.push(b'\n');
        }
    }
    wrapped.extend_from_slice(b"Q\n");

    let wrapped_id = doc.add_object(Stream::new(Dictionary::new(), wrapped));
    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Reference(wrapped_id));

    Ok(())
}

/// Append the overlay content references after a page's existing content so
/// the watermark draws on top.
fn append_overlay_content(
    doc: &mut Document,
    page_id: ObjectId,
    overlay_refs: &[Object],
) -> Result<()> {
    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;

    let merged = match page_dict.get(b"Contents").ok().cloned() {
        Some(Object::Reference(existing)) => {
            let mut items = vec![Object::Reference(existing)];
            items.extend_from_slice(overlay_refs);
            items
        }
        Some(Object::Array(mut items)) => {
            items.extend_from_slice(overlay_refs);
            items
        }
        _ => overlay_refs.to_vec(),
    };
    page_dict.set("Contents", Object::Array(merged));

    Ok(())
}

/// How far up the Pages tree to look for inherited attributes
const INHERIT_DEPTH_LIMIT: usize = 10;

/// Resolve the resources in effect for a page: its own entry (direct or
/// referenced), or the nearest one inherited through the Pages tree.
fn effective_page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut node_id = page_id;
    for _ in 0..INHERIT_DEPTH_LIMIT {
        let Ok(dict) = doc.get_object(node_id).and_then(Object::as_dict) else {
            break;
        };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return resources.clone(),
            Ok(Object::Reference(id)) => {
                if let Ok(Object::Dictionary(resources)) = doc.get_object(*id) {
                    return resources.clone();
                }
                break;
            }
            _ => {}
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => break,
        }
    }
    Dictionary::new()
}

/// Merge the overlay resources into a page's resources.
///
/// Resource categories present on both sides (Font, ExtGState, ...) are
/// merged entry-by-entry with the overlay winning on a name clash; the
/// overlay uses names no ordinary producer emits, so clashes do not happen
/// in practice. The result is set inline on the page so sibling pages
/// sharing an indirect or inherited resources object are unaffected.
fn merge_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    overlay_resources: &Dictionary,
) -> Result<()> {
    let mut merged = effective_page_resources(doc, page_id);

    for (key, value) in overlay_resources.iter() {
        match (merged.get(key).ok().cloned(), value) {
            (Some(Object::Dictionary(mut existing)), Object::Dictionary(addition)) => {
                for (sub_key, sub_value) in addition.iter() {
                    existing.set(sub_key.clone(), sub_value.clone());
                }
                merged.set(key.clone(), Object::Dictionary(existing));
            }
            _ => {
                merged.set(key.clone(), value.clone());
            }
        }
    }

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(merged));

    Ok(())
}
