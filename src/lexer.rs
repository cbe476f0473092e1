//! The shared low-level byte-level token scanner. Used both by the
//! document object parser and by the content-stream lexer, so that CID
//! byte access and text decoding stay consistent between the two — both
//! walk the same literal/hex string grammar.
//!
//! Every scanner here takes a byte slice and returns `(value, consumed)`
//! where `consumed` is the number of bytes read from the front of the
//! slice.

use nom::bytes::complete::take_while;
use nom::character::complete::digit1;
use nom::combinator::opt;
use nom::sequence::pair;
use nom::IResult;

pub(crate) fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Advances past whitespace and `%...` comments (to end of line).
pub(crate) fn skip_whitespace_and_comments(mut data: &[u8]) -> &[u8] {
    loop {
        let start = data;
        while let Some(&b) = data.first() {
            if is_pdf_whitespace(b) {
                data = &data[1..];
            } else {
                break;
            }
        }
        if data.first() == Some(&b'%') {
            while let Some(&b) = data.first() {
                data = &data[1..];
                if b == b'\n' || b == b'\r' {
                    break;
                }
            }
        }
        if std::ptr::eq(start, data) || start.len() == data.len() {
            break;
        }
    }
    data
}

/// Returns the byte offset just past leading whitespace/comments.
pub(crate) fn whitespace_len(data: &[u8]) -> usize {
    data.len() - skip_whitespace_and_comments(data).len()
}

/// Parses a PDF name token `/Foo#20Bar`, returning the decoded bytes
/// (`#xx` hex escapes resolved) without the leading slash, and the number
/// of input bytes consumed (including the slash).
pub(crate) fn scan_name(data: &[u8]) -> Option<(Vec<u8>, usize)> {
    if data.first() != Some(&b'/') {
        return None;
    }
    let mut i = 1;
    let mut out = Vec::new();
    while let Some(&b) = data.get(i) {
        if is_pdf_whitespace(b) || is_delimiter(b) {
            break;
        }
        if b == b'#' {
            if let (Some(&h1), Some(&h2)) = (data.get(i + 1), data.get(i + 2)) {
                if let (Some(hi), Some(lo)) = (hex_digit(h1), hex_digit(h2)) {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(b);
        i += 1;
    }
    Some((out, i))
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parses a literal string `(...)`, honoring nested parentheses, the
/// standard backslash escapes, line continuations, and 1–3 digit octal
/// escapes (mod 256). Returns the decoded bytes and bytes consumed.
pub(crate) fn scan_literal_string(data: &[u8]) -> Option<(Vec<u8>, usize)> {
    if data.first() != Some(&b'(') {
        return None;
    }
    let mut i = 1;
    let mut depth = 1u32;
    let mut out = Vec::new();

    while let Some(&b) = data.get(i) {
        match b {
            b'(' => {
                depth += 1;
                out.push(b);
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Some((out, i));
                }
                out.push(b);
            }
            b'\\' => {
                i += 1;
                match data.get(i).copied() {
                    Some(b'n') => {
                        out.push(b'\n');
                        i += 1;
                    }
                    Some(b'r') => {
                        out.push(b'\r');
                        i += 1;
                    }
                    Some(b't') => {
                        out.push(b'\t');
                        i += 1;
                    }
                    Some(b'b') => {
                        out.push(0x08);
                        i += 1;
                    }
                    Some(b'f') => {
                        out.push(0x0C);
                        i += 1;
                    }
                    Some(b'(') => {
                        out.push(b'(');
                        i += 1;
                    }
                    Some(b')') => {
                        out.push(b')');
                        i += 1;
                    }
                    Some(b'\\') => {
                        out.push(b'\\');
                        i += 1;
                    }
                    Some(b'\r') => {
                        i += 1;
                        if data.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    Some(b'\n') => {
                        i += 1;
                    }
                    Some(d @ b'0'..=b'7') => {
                        let mut value = (d - b'0') as u32;
                        i += 1;
                        for _ in 0..2 {
                            match data.get(i) {
                                Some(&d2 @ b'0'..=b'7') => {
                                    value = value * 8 + (d2 - b'0') as u32;
                                    i += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value % 256) as u8);
                    }
                    Some(other) => {
                        out.push(other);
                        i += 1;
                    }
                    None => break,
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    // unterminated string: return what we have, consuming the rest.
    Some((out, i))
}

/// Parses a hex string `<...>`, ignoring whitespace, padding an odd
/// trailing nibble with `0`.
pub(crate) fn scan_hex_string(data: &[u8]) -> Option<(Vec<u8>, usize)> {
    if data.first() != Some(&b'<') || data.get(1) == Some(&b'<') {
        return None;
    }
    let mut i = 1;
    let mut nibbles = Vec::new();
    loop {
        match data.get(i) {
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(&b) if is_pdf_whitespace(b) => i += 1,
            Some(&b) => {
                if let Some(n) = hex_digit(b) {
                    nibbles.push(n);
                }
                i += 1;
            }
            None => break,
        }
    }
    if nibbles.len() % 2 != 0 {
        nibbles.push(0);
    }
    let bytes = nibbles.chunks_exact(2).map(|p| (p[0] << 4) | p[1]).collect();
    Some((bytes, i))
}

/// Parses an integer or real number token. Returns `(text, consumed)`;
/// callers decide integer vs. real by presence of `.`/exponent-like chars.
fn number_token(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let start = input;
    let (input, _) = opt(nom::character::complete::one_of("+-"))(input)?;
    let (input, _int) = digit1(input)?;
    let (input, _frac) = opt(pair(nom::character::complete::char('.'), nom::combinator::cut(take_while(|c: u8| c.is_ascii_digit()))))(input)?;
    let consumed = start.len() - input.len();
    Ok((input, &start[..consumed]))
}

/// Scans a bare number at the front of `data` (no leading `.`-only reals
/// are produced by real PDF writers but a leading `.5` is tolerated).
pub(crate) fn scan_number(data: &[u8]) -> Option<(f64, bool, usize)> {
    if let Ok((_, tok)) = number_token(data) {
        let text = std::str::from_utf8(tok).ok()?;
        let is_integer = !text.contains('.');
        let value: f64 = text.parse().ok()?;
        return Some((value, is_integer, tok.len()));
    }
    // tolerate a bare leading `.5`
    if data.first() == Some(&b'.') {
        let mut i = 1;
        while data.get(i).map(|b| b.is_ascii_digit()).unwrap_or(false) {
            i += 1;
        }
        if i > 1 {
            let text = std::str::from_utf8(&data[..i]).ok()?;
            let value: f64 = text.parse().ok()?;
            return Some((value, false, i));
        }
    }
    None
}

/// Scans a bareword (keyword/operator/regular token) terminated by
/// whitespace or a delimiter.
pub(crate) fn scan_keyword(data: &[u8]) -> (&[u8], usize) {
    let mut i = 0;
    while let Some(&b) = data.get(i) {
        if is_pdf_whitespace(b) || is_delimiter(b) {
            break;
        }
        i += 1;
    }
    (&data[..i], i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_with_hex_escape() {
        let (name, consumed) = scan_name(b"/Foo#20Bar ").unwrap();
        assert_eq!(name, b"Foo Bar");
        assert_eq!(consumed, 10);
    }

    #[test]
    fn literal_string_nested_parens() {
        let (s, consumed) = scan_literal_string(b"(a(b)c)rest").unwrap();
        assert_eq!(s, b"a(b)c");
        assert_eq!(consumed, 7);
    }

    #[test]
    fn literal_string_octal_escape() {
        let (s, _) = scan_literal_string(b"(\\101\\102)").unwrap();
        assert_eq!(s, b"AB");
    }

    #[test]
    fn literal_string_line_continuation() {
        let (s, _) = scan_literal_string(b"(a\\\nb)").unwrap();
        assert_eq!(s, b"ab");
    }

    #[test]
    fn hex_string_odd_nibble_padded() {
        let (s, _) = scan_hex_string(b"<6>").unwrap();
        assert_eq!(s, vec![0x60]);
    }

    #[test]
    fn number_integer_and_real() {
        assert_eq!(scan_number(b"123 ").map(|(v, i, c)| (v, i, c)), Some((123.0, true, 3)));
        assert_eq!(scan_number(b"-12.5 ").map(|(v, i, _)| (v, i)), Some((-12.5, false)));
    }
}
