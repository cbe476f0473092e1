//! Document-level object parsing: header, cross-reference classification,
//! and the recursive value/array/dictionary/stream grammar.

use crate::error::{ParseError, PResult};
use crate::lexer::{self, is_delimiter};
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::options::ExtractOptions;

/// Reads the PDF version from the first 20 bytes: `%PDF-major.minor`.
pub(crate) fn header(buffer: &[u8]) -> Option<String> {
    let window = &buffer[..buffer.len().min(20)];
    let pos = window.windows(5).position(|w| w == b"%PDF-")?;
    let rest = &window[pos + 5..];
    let mut end = 0;
    while end < rest.len() && (rest[end].is_ascii_digit() || rest[end] == b'.') {
        end += 1;
    }
    if end == 0 {
        return None;
    }
    std::str::from_utf8(&rest[..end]).ok().map(|s| s.to_string())
}

/// Reads the binary-mark comment on the header's second line, if all of
/// its bytes are `>= 128`.
pub(crate) fn binary_mark(line: &[u8]) -> Option<Vec<u8>> {
    let line = line.strip_prefix(b"%")?;
    let end = line.iter().position(|&b| b == b'\n' || b == b'\r').unwrap_or(line.len());
    let mark = &line[..end];
    if !mark.is_empty() && mark.iter().all(|&b| b >= 128) {
        Some(mark.to_vec())
    } else {
        None
    }
}

/// Parses the trailing integer offset out of a `startxref` marker: the
/// marker itself has already been located; this reads the decimal integer
/// that follows it.
pub(crate) fn xref_start(after_keyword: &[u8]) -> Option<i64> {
    let trimmed = lexer::skip_whitespace_and_comments(after_keyword);
    let (value, is_int, _) = lexer::scan_number(trimmed)?;
    if !is_int {
        return None;
    }
    Some(value as i64)
}

/// Parses a single PDF value at `data[0..]`. Returns the object and the
/// number of bytes consumed. `depth` is the current recursion depth,
/// checked against `opts.max_parse_depth` before descending into an array
/// or dictionary.
pub(crate) fn parse_object(data: &[u8], depth: usize, opts: &ExtractOptions) -> PResult<(Object, usize)> {
    if depth > opts.max_parse_depth {
        return Err(ParseError::DepthExceeded);
    }
    let leading_ws = lexer::whitespace_len(data);
    let data = &data[leading_ws..];

    let result: PResult<(Object, usize)> = match data.first() {
        None => Ok((Object::Null, 0)),
        Some(b'/') => {
            let (name, consumed) = lexer::scan_name(data).ok_or(ParseError::InvalidObject(0))?;
            Ok((Object::Name(name), consumed))
        }
        Some(b'(') => {
            let (s, consumed) = lexer::scan_literal_string(data).ok_or(ParseError::InvalidObject(0))?;
            Ok((Object::String(s, StringFormat::Literal), consumed))
        }
        Some(b'<') if data.get(1) == Some(&b'<') => parse_dict_or_stream(data, depth, opts),
        Some(b'<') => {
            let (s, consumed) = lexer::scan_hex_string(data).ok_or(ParseError::InvalidObject(0))?;
            Ok((Object::String(s, StringFormat::Hex), consumed))
        }
        Some(b'[') => parse_array(data, depth, opts),
        Some(b't') if data.starts_with(b"true") => Ok((Object::Boolean(true), 4)),
        Some(b'f') if data.starts_with(b"false") => Ok((Object::Boolean(false), 5)),
        Some(b'n') if data.starts_with(b"null") => Ok((Object::Null, 4)),
        Some(b'+') | Some(b'-') | Some(b'0'..=b'9') | Some(b'.') => parse_number_or_reference(data),
        _ => {
            // unrecognized token: consume a bareword so callers make progress.
            let (_, consumed) = lexer::scan_keyword(data);
            Err(ParseError::InvalidObject(consumed.max(1)))
        }
    };
    result.map(|(obj, consumed)| (obj, leading_ws + consumed))
}

fn parse_number_or_reference(data: &[u8]) -> PResult<(Object, usize)> {
    let (v1, is_int1, c1) = lexer::scan_number(data).ok_or(ParseError::InvalidObject(0))?;
    if is_int1 && v1 >= 0.0 {
        let after_first = &data[c1..];
        let ws1 = lexer::whitespace_len(after_first);
        let rest1 = &after_first[ws1..];
        if let Some((v2, is_int2, c2)) = lexer::scan_number(rest1) {
            if is_int2 && v2 >= 0.0 {
                let after_second = &rest1[c2..];
                let ws2 = lexer::whitespace_len(after_second);
                let rest2 = &after_second[ws2..];
                if rest2.first() == Some(&b'R') && rest2.get(1).map(|&b| is_delimiter(b) || b.is_ascii_whitespace()).unwrap_or(true) {
                    let total = c1 + ws1 + c2 + ws2 + 1;
                    return Ok((Object::Reference((v1 as u32, v2 as u16)), total));
                }
            }
        }
    }
    if is_int1 {
        Ok((Object::Integer(v1 as i64), c1))
    } else {
        Ok((Object::Real(v1), c1))
    }
}

fn parse_array(data: &[u8], depth: usize, opts: &ExtractOptions) -> PResult<(Object, usize)> {
    let mut i = 1; // skip '['
    let mut items = Vec::new();
    loop {
        let rest = &data[i..];
        let skipped = lexer::whitespace_len(rest);
        i += skipped;
        match data.get(i) {
            Some(b']') => {
                i += 1;
                break;
            }
            None => break,
            _ => {
                let (obj, consumed) = parse_object(&data[i..], depth + 1, opts)?;
                if consumed == 0 {
                    i += 1;
                    continue;
                }
                if items.len() < opts.max_array_entries {
                    items.push(obj);
                } else {
                    log::warn!("array truncated at {} entries", opts.max_array_entries);
                }
                i += consumed;
            }
        }
    }
    Ok((Object::Array(items), i))
}

fn parse_dict_or_stream(data: &[u8], depth: usize, opts: &ExtractOptions) -> PResult<(Object, usize)> {
    let mut i = 2; // skip '<<'
    let mut dict = Dictionary::new();
    loop {
        let rest = &data[i..];
        let skipped = lexer::whitespace_len(rest);
        i += skipped;
        if data[i..].starts_with(b">>") {
            i += 2;
            break;
        }
        if i >= data.len() {
            return Err(ParseError::InvalidDictionary);
        }
        let (key, key_consumed) = lexer::scan_name(&data[i..]).ok_or(ParseError::InvalidDictionary)?;
        i += key_consumed;
        let ws = lexer::whitespace_len(&data[i..]);
        i += ws;
        let (value, value_consumed) = parse_object(&data[i..], depth + 1, opts)?;
        i += value_consumed;
        if dict.len() < opts.max_dict_entries {
            dict.set(key, value);
        } else {
            log::warn!("dictionary truncated at {} entries", opts.max_dict_entries);
        }
    }

    // Peek for a following `stream` keyword.
    let after_dict = &data[i..];
    let ws = lexer::whitespace_len(after_dict);
    let after_ws = &after_dict[ws..];
    if after_ws.starts_with(b"stream") {
        let mut j = 6;
        // exactly one EOL (CRLF or LF) follows the keyword.
        if after_ws.get(j) == Some(&b'\r') {
            j += 1;
        }
        if after_ws.get(j) == Some(&b'\n') {
            j += 1;
        }
        let data_start_in_doc_relative = i + ws + j;
        let mut stream = Stream::new(dict, Vec::new());
        stream.start_position = Some(data_start_in_doc_relative);

        // If /Length is a direct integer, slice the stream body now and
        // consume through `endstream`; otherwise the caller resolves
        // `/Length` afterwards and fills `raw` in a second pass.
        let length = stream.dict.get(b"Length").ok().and_then(|o| o.as_i64().ok());
        if let Some(length) = length {
            if length >= 0 {
                let len = length as usize;
                let body_start = data_start_in_doc_relative;
                let body_end = (body_start + len).min(data.len());
                stream.raw = data[body_start..body_end].to_vec();
                let after_body = &data[body_end..];
                let ws2 = lexer::whitespace_len(after_body);
                let tail = &after_body[ws2..];
                let consumed_to_endstream = if tail.starts_with(b"endstream") {
                    body_end + ws2 + 9
                } else {
                    // Length didn't land on `endstream`; fall back to a
                    // literal scan so the object boundary is still found.
                    match find_subslice(data, b"endstream", body_start) {
                        Some(pos) => {
                            stream.raw = data[body_start..pos].to_vec();
                            pos + 9
                        }
                        None => data.len(),
                    }
                };
                return Ok((Object::Stream(stream), consumed_to_endstream));
            }
        }

        // Indirect /Length: scan for `endstream` as a provisional boundary;
        // the resolved byte range is filled in later against the real
        // Length value.
        let consumed = match find_subslice(data, b"endstream", data_start_in_doc_relative) {
            Some(pos) => pos + 9,
            None => data.len(),
        };
        return Ok((Object::Stream(stream), consumed));
    }

    Ok((Object::Dictionary(dict), i))
}

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack.get(from..)?.windows(needle.len()).position(|w| w == needle).map(|p| p + from)
}

/// Parses `N G obj ... endobj` at `offset`, returning the object id and
/// value. Used both for direct offset lookups and for reconstruction hits.
pub(crate) fn indirect_object(
    buffer: &[u8],
    offset: usize,
    expected_id: Option<ObjectId>,
    opts: &ExtractOptions,
) -> PResult<(ObjectId, Object)> {
    if offset > buffer.len() {
        return Err(ParseError::OutOfBounds(offset));
    }
    let data = &buffer[offset..];
    let data = lexer::skip_whitespace_and_comments(data);

    let (num, _, c1) = lexer::scan_number(data).ok_or(ParseError::InvalidObject(offset))?;
    let rest = &data[c1..];
    let ws1 = lexer::whitespace_len(rest);
    let rest = &rest[ws1..];
    let (gen, _, c2) = lexer::scan_number(rest).ok_or(ParseError::InvalidObject(offset))?;
    let rest = &rest[c2..];
    let ws2 = lexer::whitespace_len(rest);
    let rest = &rest[ws2..];
    if !rest.starts_with(b"obj") {
        return Err(ParseError::InvalidObject(offset));
    }
    let rest = &rest[3..];

    let id = (num as u32, gen as u16);
    if let Some(expected) = expected_id {
        if expected != id {
            log::warn!("object id mismatch at offset {offset}: expected {expected:?}, found {id:?}");
        }
    }

    let (obj, _consumed) = parse_object(rest, 0, opts)?;
    Ok((id, obj))
}
