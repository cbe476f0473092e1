//! Object streams (PDF 1.5+ compressed objects).

use crate::error::{OResult, ObjectError};
use crate::object::{Object, ObjectId, Stream};
use crate::options::ExtractOptions;
use crate::parser;

/// The decoded contents of one `/Type /ObjStm` stream: every object it
/// carries, keyed by id (generation is always 0 for compressed objects).
pub(crate) struct ObjectStream {
    pub(crate) objects: Vec<(ObjectId, Object)>,
}

impl ObjectStream {
    /// Parses `N` header pairs `(objNum, offset)`, skips the first `/First`
    /// bytes of header-pair text, then parses the value at `first +
    /// offset` for each pair.
    pub(crate) fn parse(stream: &Stream, opts: &ExtractOptions) -> OResult<Self> {
        let n = stream
            .dict
            .get(b"N")
            .and_then(Object::as_i64)
            .map_err(|_| ObjectError::MissingLength((0, 0)))? as usize;
        let first = stream
            .dict
            .get(b"First")
            .and_then(Object::as_i64)
            .map_err(|_| ObjectError::MissingLength((0, 0)))? as usize;

        let data = stream.decompressed_content();
        let header = &data[..first.min(data.len())];

        let mut pairs = Vec::with_capacity(n);
        let mut pos = 0usize;
        for _ in 0..n {
            let rest = crate::lexer::skip_whitespace_and_comments(&header[pos..]);
            let skipped = header[pos..].len() - rest.len();
            pos += skipped;
            let (obj_num, _, c1) = crate::lexer::scan_number(&header[pos..]).ok_or(ObjectError::Parse(
                crate::error::ParseError::InvalidObject(pos),
            ))?;
            pos += c1;
            let rest = crate::lexer::skip_whitespace_and_comments(&header[pos..]);
            let skipped = header[pos..].len() - rest.len();
            pos += skipped;
            let (offset, _, c2) = crate::lexer::scan_number(&header[pos..]).ok_or(ObjectError::Parse(
                crate::error::ParseError::InvalidObject(pos),
            ))?;
            pos += c2;
            pairs.push((obj_num as u32, offset as usize));
        }

        let mut objects = Vec::with_capacity(pairs.len());
        for (obj_num, rel_offset) in pairs {
            let start = first + rel_offset;
            if start > data.len() {
                log::warn!("object stream entry {obj_num} offset out of bounds");
                continue;
            }
            match parser::parse_object(&data[start..], 0, opts) {
                Ok((obj, _)) => objects.push(((obj_num, 0), obj)),
                Err(e) => log::warn!("failed to parse compressed object {obj_num}: {e}"),
            }
        }

        Ok(ObjectStream { objects })
    }
}
