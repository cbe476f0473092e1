//! Content-stream tokenizer: produces `(operator, operands[])`
//! entries, reusing the same literal/hex-string/name/number grammar as the
//! document-level parser since CID byte access depends on
//! getting identical raw bytes out of both.

use crate::lexer;
use crate::object::{Dictionary, Object};
use crate::options::ExtractOptions;
use crate::parser;

pub(crate) enum ContentToken {
    Op { operator: String, operands: Vec<Object> },
    InlineImage { dict: Dictionary, data: Vec<u8> },
}

pub(crate) fn tokenize(mut data: &[u8], opts: &ExtractOptions) -> Vec<ContentToken> {
    let mut tokens = Vec::new();
    let mut operands: Vec<Object> = Vec::new();

    loop {
        data = lexer::skip_whitespace_and_comments(data);
        if data.is_empty() {
            break;
        }

        if is_keyword_at(data, b"BI") {
            let (token, consumed) = parse_inline_image(&data[2..], opts);
            tokens.push(token);
            data = &data[2 + consumed..];
            operands.clear();
            continue;
        }

        match parser::parse_object(data, 0, opts) {
            Ok((obj, consumed)) if consumed > 0 => {
                operands.push(obj);
                data = &data[consumed..];
            }
            _ => {
                let (keyword, consumed) = lexer::scan_keyword(data);
                if consumed == 0 {
                    // stray delimiter byte (e.g. an unmatched `)`); skip it
                    // so tokenization always makes forward progress.
                    data = &data[1..];
                    continue;
                }
                let operator = String::from_utf8_lossy(keyword).into_owned();
                tokens.push(ContentToken::Op {
                    operator,
                    operands: std::mem::take(&mut operands),
                });
                data = &data[consumed..];
            }
        }
    }

    tokens
}

fn is_keyword_at(data: &[u8], keyword: &[u8]) -> bool {
    data.starts_with(keyword)
        && data
            .get(keyword.len())
            .map(|&b| b.is_ascii_whitespace() || lexer::is_delimiter(b))
            .unwrap_or(true)
}

/// Parses the abbreviated inline-image dictionary between `BI` and `ID`,
/// then the binary data up to the first plausible `EI` terminator.
fn parse_inline_image(data: &[u8], opts: &ExtractOptions) -> (ContentToken, usize) {
    let mut pos = 0;
    let mut dict = Dictionary::new();

    loop {
        let rest = lexer::skip_whitespace_and_comments(&data[pos..]);
        pos += data[pos..].len() - rest.len();
        if is_keyword_at(&data[pos..], b"ID") {
            pos += 2;
            break;
        }
        if pos >= data.len() {
            break;
        }
        let Some((key, key_consumed)) = lexer::scan_name(&data[pos..]) else {
            break;
        };
        pos += key_consumed;
        let ws = lexer::whitespace_len(&data[pos..]);
        pos += ws;
        let Ok((value, value_consumed)) = parser::parse_object(&data[pos..], 0, opts) else {
            break;
        };
        pos += value_consumed;
        dict.set(canonical_inline_key(&key), value);
    }

    // exactly one whitespace byte separates `ID` from the binary payload
    if data.get(pos).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
        pos += 1;
    }

    let data_start = pos;
    let data_end = find_ei(&data[pos..]).map(|p| pos + p).unwrap_or(data.len());
    let image_bytes = data[data_start..data_end].to_vec();

    let mut end = data_end;
    if data[end..].starts_with(b"EI") {
        end += 2;
    }

    (ContentToken::InlineImage { dict, data: image_bytes }, end)
}

fn canonical_inline_key(key: &[u8]) -> Vec<u8> {
    match key {
        b"W" => b"Width".to_vec(),
        b"H" => b"Height".to_vec(),
        b"BPC" => b"BitsPerComponent".to_vec(),
        b"CS" => b"ColorSpace".to_vec(),
        b"F" => b"Filter".to_vec(),
        b"DP" => b"DecodeParms".to_vec(),
        b"IM" => b"ImageMask".to_vec(),
        b"D" => b"Decode".to_vec(),
        b"I" => b"Interpolate".to_vec(),
        other => other.to_vec(),
    }
}

/// Finds a whitespace-delimited `EI` marker, the de facto way inline image
/// data is bounded when no explicit `/L` length is given.
fn find_ei(data: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] == b'E' && data[i + 1] == b'I' {
            let before_ok = i == 0 || data[i - 1].is_ascii_whitespace();
            let after_ok = data.get(i + 2).map(|b| b.is_ascii_whitespace() || lexer::is_delimiter(*b)).unwrap_or(true);
            if before_ok && after_ok {
                let end = if i > 0 && data[i - 1].is_ascii_whitespace() { i - 1 } else { i };
                return Some(end);
            }
        }
        i += 1;
    }
    None
}
