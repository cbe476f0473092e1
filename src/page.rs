//! Page-tree traversal and resource inheritance. Walks
//! `root_catalog/Pages`, expanding `/Type /Pages` nodes through `/Kids`
//! and collecting `/Type /Page` leaves, carrying each leaf's merged
//! resources and media box through to the content interpreter.

use std::collections::HashSet;

use crate::document::Document;
use crate::object::{Dictionary, Object, ObjectId};
use crate::options::ExtractOptions;

/// One discovered page leaf: its own dictionary, the resource dictionary
/// merged from every ancestor (child wins), and its media box, if any.
pub(crate) struct PageLeaf {
    pub(crate) dict: Dictionary,
    pub(crate) resources: Dictionary,
    pub(crate) media_box: Option<[f64; 4]>,
}

/// Sub-dictionaries that deep-merge (child entry wins per key, but keys
/// only the parent carries still survive).
const MERGED_SUBDICTS: &[&[u8]] = &[b"Font", b"XObject", b"ExtGState", b"ColorSpace", b"Pattern", b"Shading", b"Properties"];

/// Walks the page tree starting at `root_catalog`'s `/Pages`, honoring the
/// caps in `opts` (max depth, max kids per node, max pages) and guarding
/// against `Kids` cycles by `(objNum, gen)`.
pub(crate) fn collect_pages(doc: &Document, root_catalog: &Dictionary, opts: &ExtractOptions) -> Vec<PageLeaf> {
    let mut pages = Vec::new();
    let Ok(pages_ref) = root_catalog.get(b"Pages") else {
        return pages;
    };
    let Ok(pages_id) = pages_ref.as_reference() else {
        return pages;
    };
    let mut seen = HashSet::new();
    walk(doc, pages_id, Dictionary::new(), None, 0, opts, &mut seen, &mut pages);
    pages
}

#[allow(clippy::too_many_arguments)]
fn walk(
    doc: &Document,
    node_id: ObjectId,
    inherited_resources: Dictionary,
    inherited_media_box: Option<[f64; 4]>,
    depth: usize,
    opts: &ExtractOptions,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<PageLeaf>,
) {
    if out.len() >= opts.max_pages || depth > opts.max_page_tree_depth {
        if depth > opts.max_page_tree_depth {
            log::warn!("page tree depth exceeded cap of {}", opts.max_page_tree_depth);
        }
        return;
    }
    if !seen.insert(node_id) {
        log::warn!("page tree cycle detected at object {node_id:?}");
        return;
    }

    let node = doc.get_object(node_id);
    let Ok(dict) = node.as_dict() else { return };

    let resources = merge_resources(doc, &inherited_resources, dict);
    let media_box = read_media_box(doc, dict).or(inherited_media_box);

    if dict.has_type(b"Page") {
        out.push(PageLeaf {
            dict: dict.clone(),
            resources,
            media_box,
        });
        return;
    }

    let Ok(kids) = dict.get(b"Kids").and_then(Object::as_array) else {
        // Malformed intermediate node with no recognizable type or kids:
        // treat as a leaf so damaged trees still yield something (§4.C
        // robust-by-default policy extended to the page tree).
        if !dict.has_type(b"Pages") {
            out.push(PageLeaf { dict: dict.clone(), resources, media_box });
        }
        return;
    };

    for (i, kid) in kids.iter().enumerate() {
        if i >= opts.max_kids_per_node {
            log::warn!("page tree node exceeds kid cap of {}", opts.max_kids_per_node);
            break;
        }
        if out.len() >= opts.max_pages {
            break;
        }
        let Ok(kid_id) = kid.as_reference() else { continue };
        walk(doc, kid_id, resources.clone(), media_box, depth + 1, opts, seen, out);
    }
}

/// Merges `child`'s own `/Resources` over `inherited`, deep-merging the
/// sub-dictionaries named in `MERGED_SUBDICTS` and shallow-overriding
/// everything else.
fn merge_resources(doc: &Document, inherited: &Dictionary, node: &Dictionary) -> Dictionary {
    let own = node
        .get(b"Resources")
        .map(|o| doc.dereference(o))
        .ok()
        .and_then(|o| o.as_dict().ok().cloned());

    let Some(own) = own else { return inherited.clone() };

    let mut merged = inherited.clone();
    for (key, value) in own.iter() {
        if MERGED_SUBDICTS.contains(&key.as_slice()) {
            let child_sub = doc.dereference(value);
            if let Ok(child_sub) = child_sub.as_dict() {
                let mut combined = merged.get(key).and_then(Object::as_dict).cloned().unwrap_or_default();
                for (sub_key, sub_value) in child_sub.iter() {
                    combined.set(sub_key.clone(), sub_value.clone());
                }
                merged.set(key.clone(), Object::Dictionary(combined));
                continue;
            }
        }
        merged.set(key.clone(), value.clone());
    }
    merged
}

fn read_media_box(doc: &Document, dict: &Dictionary) -> Option<[f64; 4]> {
    let arr = dict.get(b"MediaBox").map(|o| doc.dereference(o)).ok()?;
    let arr = arr.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = doc.dereference(&arr[i]).as_f64().ok()?;
    }
    Some(out)
}
