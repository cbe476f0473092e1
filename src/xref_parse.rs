//! Classic xref table and xref stream parsing, plus the `startxref`
//! classification dispatch.

use crate::error::XrefError;
use crate::lexer;
use crate::object::{Dictionary, Object};
use crate::options::ExtractOptions;
use crate::parser;
use crate::xref::{XrefEntry, XrefTable};

pub(crate) enum XrefKind {
    Classic,
    Stream,
    Damaged,
}

/// Classifies the bytes at the claimed xref offset.
pub(crate) fn classify(buffer: &[u8], offset: usize) -> XrefKind {
    let Some(data) = buffer.get(offset..) else {
        return XrefKind::Damaged;
    };
    let data = lexer::skip_whitespace_and_comments(data);
    if data.starts_with(b"xref") {
        return XrefKind::Classic;
    }
    // "N G obj" header: a generation/stream-xref object.
    let (_, _, c1) = match lexer::scan_number(data) {
        Some(v) => v,
        None => return XrefKind::Damaged,
    };
    let rest = lexer::skip_whitespace_and_comments(&data[c1..]);
    if lexer::scan_number(rest).is_none() {
        return XrefKind::Damaged;
    }
    XrefKind::Stream
}

/// Parses a classic `xref` table: one or more subsections of `first
/// count` followed by `count` 20-byte entries, then the trailer that
/// follows.
pub(crate) fn parse_classic_xref(
    buffer: &[u8],
    offset: usize,
    opts: &ExtractOptions,
) -> Result<(XrefTable, Dictionary), XrefError> {
    let mut data = buffer.get(offset..).ok_or(XrefError::Malformed)?;
    data = strip_prefix_ws(data, b"xref").ok_or(XrefError::Malformed)?;

    let mut table = XrefTable::new();

    loop {
        data = lexer::skip_whitespace_and_comments(data);
        if data.starts_with(b"trailer") {
            data = &data[7..];
            break;
        }
        let Some((first, _, c1)) = lexer::scan_number(data) else {
            break;
        };
        data = lexer::skip_whitespace_and_comments(&data[c1..]);
        let Some((count, _, c2)) = lexer::scan_number(data) else {
            return Err(XrefError::Malformed);
        };
        data = &data[c2..];
        // consume the single EOL after the subsection header
        data = skip_single_eol(data);

        let count = count as usize;
        for i in 0..count {
            if data.len() < 20 {
                return Err(XrefError::Malformed);
            }
            let entry_bytes = &data[..20];
            if let Some(entry) = parse_classic_entry(entry_bytes) {
                if let XrefEntry::Normal { .. } = entry {
                    table.insert(first as u32 + i as u32, entry);
                }
            } else {
                return Err(XrefError::Malformed);
            }
            data = &data[20..];
            if table.entries.len() > opts.max_xref_entries {
                log::warn!("classic xref table exceeds cap of {} entries", opts.max_xref_entries);
                return Err(XrefError::Malformed);
            }
        }
    }

    let (trailer_obj, _) = parser::parse_object(data, 0, opts).map_err(|_| XrefError::NoTrailer)?;
    let trailer = trailer_obj.as_dict().map_err(|_| XrefError::NoTrailer)?.clone();

    if let Ok(size) = trailer.get(b"Size").and_then(Object::as_i64) {
        table.size = size as u32;
    } else {
        table.size = table.max_id() + 1;
    }

    Ok((table, trailer))
}

fn parse_classic_entry(bytes: &[u8]) -> Option<XrefEntry> {
    // `^(\d{10}) (\d{5}) [nf] $`
    if bytes.len() < 18 {
        return None;
    }
    let offset: u32 = std::str::from_utf8(&bytes[0..10]).ok()?.trim().parse().ok()?;
    let generation: u16 = std::str::from_utf8(&bytes[11..16]).ok()?.trim().parse().ok()?;
    match bytes[17] {
        b'n' => Some(XrefEntry::Normal { offset, generation }),
        b'f' => Some(XrefEntry::Free),
        _ => None,
    }
}

fn strip_prefix_ws<'a>(data: &'a [u8], keyword: &[u8]) -> Option<&'a [u8]> {
    let data = lexer::skip_whitespace_and_comments(data);
    data.strip_prefix(keyword)
}

fn skip_single_eol(data: &[u8]) -> &[u8] {
    if data.first() == Some(&b'\r') {
        let data = &data[1..];
        if data.first() == Some(&b'\n') {
            &data[1..]
        } else {
            data
        }
    } else if data.first() == Some(&b'\n') {
        &data[1..]
    } else if data.first() == Some(&b' ') {
        // some writers pad classic xref subsection headers with a trailing
        // space before the EOL; tolerate an extra byte.
        skip_single_eol(&data[1..])
    } else {
        data
    }
}

/// Parses an xref stream's dictionary and decodes its entries:
/// `/Type /XRef`, `/Size`, `/W = [w0 w1 w2]`, optional `/Index`.
pub(crate) fn parse_xref_stream(
    buffer: &[u8],
    offset: usize,
    opts: &ExtractOptions,
) -> Result<(XrefTable, Dictionary), XrefError> {
    let (_, obj) = parser::indirect_object(buffer, offset, None, opts).map_err(|_| XrefError::Malformed)?;
    let stream = obj.as_stream().map_err(|_| XrefError::Malformed)?;
    let dict = stream.dict.clone();

    let widths = dict.get(b"W").and_then(Object::as_array).map_err(|_| XrefError::Malformed)?;
    if widths.len() != 3 {
        return Err(XrefError::Malformed);
    }
    let w: Vec<usize> = widths
        .iter()
        .map(|o| o.as_i64().unwrap_or(0) as usize)
        .collect();

    let size = dict.get(b"Size").and_then(Object::as_i64).unwrap_or(0);
    let index_pairs: Vec<(i64, i64)> = match dict.get(b"Index").and_then(Object::as_array) {
        Ok(arr) => arr
            .chunks_exact(2)
            .filter_map(|pair| Some((pair[0].as_i64().ok()?, pair[1].as_i64().ok()?)))
            .collect(),
        Err(_) => vec![(0, size)],
    };

    let data = stream.decompressed_content();
    let entry_width = w[0] + w[1] + w[2];
    if entry_width == 0 {
        return Err(XrefError::Malformed);
    }

    let mut table = XrefTable::new();
    table.size = size as u32;
    let mut pos = 0usize;

    'outer: for (start, count) in index_pairs {
        for i in 0..count {
            if pos + entry_width > data.len() {
                break 'outer;
            }
            let id = (start + i) as u32;
            let entry_type = if w[0] == 0 { 1 } else { read_be(&data[pos..pos + w[0]]) };
            let f2 = read_be(&data[pos + w[0]..pos + w[0] + w[1]]);
            let f3 = read_be(&data[pos + w[0] + w[1]..pos + entry_width]);
            pos += entry_width;

            match entry_type {
                0 => {} // free
                1 => {
                    table.insert(id, XrefEntry::Normal {
                        offset: f2 as u32,
                        generation: f3 as u16,
                    });
                }
                2 => {
                    table.insert(id, XrefEntry::Compressed {
                        container: f2 as u32,
                        index: f3 as u16,
                    });
                }
                _ => {}
            }

            if table.entries.len() > opts.max_xref_entries {
                log::warn!("xref stream exceeds cap of {} entries", opts.max_xref_entries);
                break 'outer;
            }
        }
    }

    Ok((table, dict))
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_classic_table() {
        let xref = b"xref\n0 2\n0000000000 65535 f \n0000000010 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R >>";
        let (table, trailer) = parse_classic_xref(xref, 0, &ExtractOptions::default()).unwrap();
        assert!(matches!(table.get(1), Some(XrefEntry::Normal { offset: 10, generation: 0 })));
        assert_eq!(trailer.get(b"Size").unwrap().as_i64().unwrap(), 2);
    }
}
