//! The structure/xref resolver façade the rest of the crate is built on:
//! `parse()`, `get_object(id, gen)`, and access to the trailer, root
//! catalog, and xref map.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::Error;
use crate::object::{Dictionary, Object, ObjectId};
use crate::object_stream::ObjectStream;
use crate::options::ExtractOptions;
use crate::parser;
use crate::reconstruct;
use crate::xref::{XrefEntry, XrefTable};
use crate::xref_parse::{self, XrefKind};

/// A fully parsed PDF document: the object table, trailer, and the
/// resolution machinery (object cache, cycle guard, retrieval budget).
pub struct Document {
    buffer: Vec<u8>,
    pub version: String,
    pub trailer: Dictionary,
    pub xref: XrefTable,
    pub root: Option<ObjectId>,
    objects: RefCell<HashMap<ObjectId, Object>>,
    parsing: RefCell<HashSet<ObjectId>>,
    retrievals: Cell<usize>,
    opts: ExtractOptions,
}

impl Document {
    /// Parses `bytes` into a `Document`. Never fails except when the
    /// buffer cannot be treated as a PDF at all — every other fault
    /// degrades via reconstruction or an empty substitute.
    pub fn parse(bytes: &[u8]) -> Result<Document, Error> {
        Document::parse_with_options(bytes, &ExtractOptions::default())
    }

    pub fn parse_with_options(bytes: &[u8], opts: &ExtractOptions) -> Result<Document, Error> {
        let header_pos = bytes.windows(5).position(|w| w == b"%PDF-");
        let Some(header_pos) = header_pos else {
            return Err(Error::UnreadableDocument(
                "no %PDF- header found in buffer".to_string(),
            ));
        };
        let buffer = bytes[header_pos..].to_vec();

        let version = parser::header(&buffer).unwrap_or_else(|| {
            warn!("could not parse PDF version; defaulting to 1.7");
            "1.7".to_string()
        });

        let (xref, trailer) = resolve_xref_and_trailer(&buffer, opts);

        let mut doc = Document {
            buffer,
            version,
            trailer,
            xref,
            root: None,
            objects: RefCell::new(HashMap::new()),
            parsing: RefCell::new(HashSet::new()),
            retrievals: Cell::new(0),
            opts: *opts,
        };

        doc.root = resolve_root(&doc);
        Ok(doc)
    }

    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Document, Error> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| Error::UnreadableDocument(format!("could not read file: {e}")))?;
        Document::parse(&bytes)
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.opts
    }

    /// Resolves an indirect reference to its value, following exactly one
    /// level of indirection (references to references are resolved by a
    /// second `get_object` call inside, since `get_object` caches and
    /// breaks cycles).
    pub fn dereference(&self, obj: &Object) -> Object {
        match obj.as_reference() {
            Ok(id) => self.get_object(id),
            Err(_) => obj.clone(),
        }
    }

    /// Resolves an object by id. Guarded by a parse-in-progress set
    /// (returns an empty dictionary on re-entry to break cycles) and a
    /// global resolution counter (fails soft to `Null` after
    /// `max_object_retrievals`).
    pub fn get_object(&self, id: ObjectId) -> Object {
        if let Some(obj) = self.objects.borrow().get(&id) {
            return obj.clone();
        }
        if id.0 > 10_000_000 || id.1 > 65_535 {
            return Object::Null;
        }
        if self.parsing.borrow().contains(&id) {
            warn!("reference cycle detected resolving object {id:?}");
            return Object::Dictionary(Dictionary::new());
        }
        if self.retrievals.get() >= self.opts.max_object_retrievals {
            debug!("object retrieval budget of {} exceeded", self.opts.max_object_retrievals);
            return Object::Null;
        }
        self.retrievals.set(self.retrievals.get() + 1);

        self.parsing.borrow_mut().insert(id);
        // Early-placeholder: install an empty dictionary so a cyclic
        // reference encountered while resolving this object sees a finite
        // value instead of recursing.
        self.objects.borrow_mut().insert(id, Object::Dictionary(Dictionary::new()));

        let resolved = self.resolve_object(id).unwrap_or(Object::Null);

        self.parsing.borrow_mut().remove(&id);
        self.objects.borrow_mut().insert(id, resolved.clone());
        resolved
    }

    fn resolve_object(&self, id: ObjectId) -> Option<Object> {
        let entry = *self.xref.get(id.0)?;
        match entry {
            XrefEntry::Free => None,
            XrefEntry::Normal { offset, .. } => {
                let (_, mut obj) = parser::indirect_object(&self.buffer, offset as usize, Some(id), &self.opts).ok()?;
                if let Ok(stream) = obj.as_stream_mut() {
                    self.fill_stream_content(stream, offset as usize);
                }
                Some(obj)
            }
            XrefEntry::Compressed { container, index } => self.resolve_compressed(container, index),
        }
    }

    /// Slices a stream's raw bytes if they were not resolved at parse time
    /// (i.e. `/Length` was an indirect reference). `parser::parse_object`
    /// leaves `start_position` set and an empty `raw` in that case.
    fn fill_stream_content(&self, stream: &mut crate::object::Stream, obj_offset: usize) {
        if !stream.raw.is_empty() {
            return;
        }
        let Some(start) = stream.start_position else { return };
        let length = match stream.dict.get(b"Length") {
            Ok(obj) => self.dereference(obj).as_i64().ok(),
            Err(_) => None,
        };
        let Some(length) = length else {
            warn!("stream at offset {obj_offset} is missing a resolvable /Length entry");
            return;
        };
        if length < 0 {
            return;
        }
        let end = (start + length as usize).min(self.buffer.len());
        if start <= end {
            stream.set_content(self.buffer[start..end].to_vec());
        }
    }

    fn resolve_compressed(&self, container: u32, index: u16) -> Option<Object> {
        let container_obj = self.get_object((container, 0));
        let stream = container_obj.as_stream().ok()?;
        let object_stream = ObjectStream::parse(stream, &self.opts).ok()?;
        object_stream
            .objects
            .get(index as usize)
            .map(|(_, obj)| obj.clone())
    }

    pub fn root_catalog(&self) -> Option<Dictionary> {
        let root = self.root?;
        self.get_object(root).as_dict().ok().cloned()
    }

    pub fn is_encrypted(&self) -> bool {
        self.trailer.has_key(b"Encrypt")
    }

    pub(crate) fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}

fn resolve_xref_and_trailer(buffer: &[u8], opts: &ExtractOptions) -> (XrefTable, Dictionary) {
    match try_resolve_xref_chain(buffer, opts) {
        Some(result) => result,
        None => {
            warn!("xref resolution failed; reconstructing from byte scan");
            let mut table = reconstruct::reconstruct_xref(buffer, opts);
            reconstruct::discover_object_streams(buffer, &mut table, opts);
            let trailer = reconstruct::find_trailer(buffer, opts).unwrap_or_else(|| {
                warn!("{}", reconstruct::no_trailer_error());
                Dictionary::new()
            });
            (table, trailer)
        }
    }
}

fn try_resolve_xref_chain(buffer: &[u8], opts: &ExtractOptions) -> Option<(XrefTable, Dictionary)> {
    let xref_start = locate_startxref(buffer)?;
    if xref_start > buffer.len() {
        return None;
    }

    let (mut table, mut trailer) = parse_xref_at(buffer, xref_start, opts)?;

    let mut seen_offsets = HashSet::new();
    seen_offsets.insert(xref_start);
    let mut prev = trailer.remove(b"Prev").and_then(|o| o.as_i64().ok());

    while let Some(prev_offset) = prev {
        if prev_offset < 0 || prev_offset as usize > buffer.len() {
            break;
        }
        if !seen_offsets.insert(prev_offset as usize) {
            break;
        }
        let Some((prev_table, mut prev_trailer)) = parse_xref_at(buffer, prev_offset as usize, opts) else {
            break;
        };
        table.merge(prev_table);

        if let Some(hybrid) = trailer.get(b"XRefStm").ok().and_then(|o| o.as_i64().ok()) {
            if hybrid >= 0 && (hybrid as usize) <= buffer.len() {
                if let Some((hybrid_table, _)) = parse_xref_at(buffer, hybrid as usize, opts) {
                    table.merge(hybrid_table);
                }
            }
        }

        prev = prev_trailer.remove(b"Prev").and_then(|o| o.as_i64().ok());
    }

    let expected_size = table.max_id() + 1;
    if table.size != expected_size {
        debug!(
            "xref /Size is {}, correcting to observed {}",
            table.size, expected_size
        );
        table.size = expected_size;
    }

    Some((table, trailer))
}

fn parse_xref_at(buffer: &[u8], offset: usize, opts: &ExtractOptions) -> Option<(XrefTable, Dictionary)> {
    match xref_parse::classify(buffer, offset) {
        XrefKind::Classic => xref_parse::parse_classic_xref(buffer, offset, opts).ok(),
        XrefKind::Stream => xref_parse::parse_xref_stream(buffer, offset, opts).ok(),
        XrefKind::Damaged => None,
    }
}

/// Searches the last 4 KiB for `startxref` and parses the trailing integer
/// offset.
fn locate_startxref(buffer: &[u8]) -> Option<usize> {
    let seek_from = buffer.len().saturating_sub(4096);
    let window = &buffer[seek_from..];
    let pos = window.windows(9).rposition(|w| w == b"startxref")?;
    let offset = parser::xref_start(&window[pos + 9..])?;
    if offset < 0 {
        return None;
    }
    Some(offset as usize)
}

fn resolve_root(doc: &Document) -> Option<ObjectId> {
    if let Ok(root) = doc.trailer.get(b"Root") {
        if let Ok(id) = root.as_reference() {
            if doc.get_object(id).as_dict().is_ok() {
                return Some(id);
            }
        }
    }
    warn!("trailer has no usable /Root; scanning for a Catalog object");
    reconstruct::find_root_catalog(&doc.buffer, &doc.xref, &doc.opts)
}
