//! Damage recovery: xref reconstruction from a byte scan, trailer
//! recovery, and root-catalog discovery.

use crate::error::XrefError;
use crate::object::Object;
use crate::object_stream::ObjectStream;
use crate::options::ExtractOptions;
use crate::parser;
use crate::xref::{XrefEntry, XrefTable};

const CHUNK_SIZE: usize = 1024 * 1024;
const CHUNK_OVERLAP: usize = 100;

/// Scans `buffer` in 1 MiB chunks (with a 100-byte overlap so an `obj`
/// keyword split across a chunk boundary is never missed) for literal
/// `obj` occurrences, backtracking over whitespace/digits to recover the
/// object number and generation.
pub(crate) fn reconstruct_xref(buffer: &[u8], opts: &ExtractOptions) -> XrefTable {
    let mut table = XrefTable::new();
    let mut start = 0usize;

    'chunks: while start < buffer.len() {
        let end = (start + CHUNK_SIZE).min(buffer.len());
        let chunk = &buffer[start..end];

        for hit in find_obj_keyword_positions(chunk) {
            let abs_hit = start + hit;
            if let Some((obj_num, gen, entry_start)) = backtrack_object_header(buffer, abs_hit) {
                table.insert(obj_num, XrefEntry::Normal {
                    offset: entry_start as u32,
                    generation: gen,
                });
                if table.entries.len() >= opts.max_xref_entries {
                    log::warn!("xref reconstruction capped at {} entries", opts.max_xref_entries);
                    break 'chunks;
                }
            }
        }

        if end == buffer.len() {
            break;
        }
        start = end.saturating_sub(CHUNK_OVERLAP);
        if start == 0 && end == buffer.len() {
            break;
        }
        // guarantee forward progress even if overlap underflows on tiny buffers
        if end.saturating_sub(CHUNK_OVERLAP) <= start && start != 0 {
            start = end;
        }
    }

    table.size = table.max_id() + 1;
    table
}

fn find_obj_keyword_positions(chunk: &[u8]) -> Vec<usize> {
    let mut hits = Vec::new();
    let needle = b"obj";
    let mut i = 0;
    while let Some(pos) = chunk.get(i..).and_then(|s| s.windows(3).position(|w| w == needle)) {
        let abs = i + pos;
        // must not be part of a longer word like "endobj" (we only want
        // the opening keyword) or "objStm" etc; require a following
        // delimiter/whitespace.
        let next_ok = chunk
            .get(abs + 3)
            .map(|&b| b.is_ascii_whitespace() || crate::lexer::is_delimiter(b))
            .unwrap_or(true);
        let prev_not_end = abs < 3 || &chunk[abs - 3..abs] != b"end";
        if next_ok && prev_not_end {
            hits.push(abs);
        }
        i = abs + 3;
    }
    hits
}

/// Given the absolute position of the `obj` keyword, backtracks over
/// whitespace to capture generation digits, more whitespace, then the
/// object-number digits. Returns `(object_number, generation,
/// absolute_offset_of_object_number_start)`.
fn backtrack_object_header(buffer: &[u8], obj_keyword_pos: usize) -> Option<(u32, u16, usize)> {
    let mut i = obj_keyword_pos;

    i = skip_back_whitespace(buffer, i);
    let gen_end = i;
    i = skip_back_digits(buffer, i);
    let gen_start = i;
    if gen_start == gen_end {
        return None;
    }

    i = skip_back_whitespace(buffer, i);
    let num_end = i;
    i = skip_back_digits(buffer, i);
    let num_start = i;
    if num_start == num_end {
        return None;
    }

    let gen: u16 = std::str::from_utf8(&buffer[gen_start..gen_end]).ok()?.parse().ok()?;
    let num: u32 = std::str::from_utf8(&buffer[num_start..num_end]).ok()?.parse().ok()?;
    Some((num, gen, num_start))
}

fn skip_back_whitespace(buffer: &[u8], mut i: usize) -> usize {
    while i > 0 && buffer[i - 1].is_ascii_whitespace() {
        i -= 1;
    }
    i
}

fn skip_back_digits(buffer: &[u8], mut i: usize) -> usize {
    while i > 0 && buffer[i - 1].is_ascii_digit() {
        i -= 1;
    }
    i
}

/// Object-stream discovery during reconstruction: for every
/// already-found object whose dictionary is `/Type /ObjStm`, parse its
/// header pairs and register compressed entries for its members.
pub(crate) fn discover_object_streams(
    buffer: &[u8],
    table: &mut XrefTable,
    opts: &ExtractOptions,
) {
    let candidates: Vec<(u32, u32)> = table
        .entries
        .iter()
        .filter_map(|(&id, entry)| match entry {
            XrefEntry::Normal { offset, .. } => Some((id, *offset)),
            _ => None,
        })
        .collect();

    for (container_id, offset) in candidates {
        let Ok((_, obj)) = parser::indirect_object(buffer, offset as usize, Some((container_id, 0)), opts) else {
            continue;
        };
        let Ok(stream) = obj.as_stream() else { continue };
        if !stream.dict.has_type(b"ObjStm") {
            continue;
        }
        let Ok(members) = ObjectStream::parse(stream, opts) else {
            continue;
        };
        for (index, (id, _)) in members.objects.iter().enumerate() {
            table.entries.entry(id.0).or_insert(XrefEntry::Compressed {
                container: container_id,
                index: index as u16,
            });
        }
    }
}

/// Searches the last 2 KiB of `buffer` for the `trailer` keyword and
/// parses the dictionary that follows it.
pub(crate) fn find_trailer(buffer: &[u8], opts: &ExtractOptions) -> Option<crate::object::Dictionary> {
    let window_start = buffer.len().saturating_sub(2048);
    let window = &buffer[window_start..];
    let pos = window.windows(7).rposition(|w| w == b"trailer")?;
    let after = &window[pos + 7..];
    let (obj, _) = parser::parse_object(after, 0, opts).ok()?;
    obj.as_dict().ok().cloned()
}

/// Fabricates a trailer's `/Root` by scanning objects for a dictionary
/// whose `/Type` resolves to `/Catalog`, capped at `opts.max_root_search`.
pub(crate) fn find_root_catalog(
    buffer: &[u8],
    table: &XrefTable,
    opts: &ExtractOptions,
) -> Option<crate::object::ObjectId> {
    for (count, (&id, entry)) in table.entries.iter().enumerate() {
        if count >= opts.max_root_search {
            log::warn!("root catalog search capped at {} objects", opts.max_root_search);
            break;
        }
        let offset = match entry {
            XrefEntry::Normal { offset, .. } => *offset,
            _ => continue,
        };
        let Ok((_, obj)) = parser::indirect_object(buffer, offset as usize, None, opts) else {
            continue;
        };
        if let Object::Dictionary(d) = &obj {
            if d.has_type(b"Catalog") {
                let gen = match entry {
                    XrefEntry::Normal { generation, .. } => *generation,
                    _ => 0,
                };
                return Some((id, gen));
            }
        }
    }
    None
}

pub(crate) fn no_trailer_error() -> XrefError {
    XrefError::NoTrailer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_simple_object() {
        let buffer = b"garbage garbage 5 0 obj\n<< /Type /Catalog >>\nendobj\n";
        let table = reconstruct_xref(buffer, &ExtractOptions::default());
        assert!(matches!(table.get(5), Some(XrefEntry::Normal { generation: 0, .. })));
    }

    #[test]
    fn newline_separated_header_is_found() {
        let buffer = b"xx 2\n0 obj\n<< /Foo true >>\nendobj";
        let table = reconstruct_xref(buffer, &ExtractOptions::default());
        match table.get(2) {
            Some(XrefEntry::Normal { offset, generation: 0 }) => {
                assert_eq!(&buffer[*offset as usize..*offset as usize + 1], b"2");
            }
            other => panic!("expected normal entry, got {other:?}"),
        }
    }

    #[test]
    fn caps_pathological_obj_counts() {
        let mut buffer = Vec::new();
        for i in 0..20_000 {
            buffer.extend_from_slice(format!("{i} 0 obj <<>> endobj\n").as_bytes());
        }
        let mut opts = ExtractOptions::default();
        opts.max_xref_entries = 100;
        let table = reconstruct_xref(&buffer, &opts);
        assert!(table.entries.len() <= 100);
    }
}
