//! Standard PDF text encodings and `/Differences` array application.

use std::collections::HashMap;

use crate::document::Document;
use crate::object::{Dictionary, Object};

/// The three standard single-byte text encodings named by `/BaseEncoding`
/// (and by a font's bare `/Encoding` name with no `/Differences`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
}

/// Maps a `/BaseEncoding` (or bare `/Encoding`) name to the standard table
/// it names, if recognized.
pub(crate) fn parse_base_encoding(name: &str) -> Option<BaseEncoding> {
    match name {
        "StandardEncoding" => Some(BaseEncoding::Standard),
        "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
        "MacRomanEncoding" => Some(BaseEncoding::MacRoman),
        _ => None,
    }
}

/// `StandardEncoding`/`WinAnsiEncoding`/`MacRomanEncoding` agree with ASCII
/// for the printable range; only the high byte differs between them, so
/// `standard_encoding_char` (used as the final fallback once `ToUnicode`
/// and `/Differences` have both missed) dispatches to the table named by
/// `base`, defaulting to `WinAnsi` when the font declares none — the
/// encoding real-world Helvetica/Times PDFs overwhelmingly use.
pub(crate) fn standard_encoding_char(code: u8, base: BaseEncoding) -> Option<char> {
    if (0x20..=0x7E).contains(&code) {
        return Some(code as char);
    }
    match base {
        BaseEncoding::Standard => standard_high(code),
        BaseEncoding::WinAnsi => win_ansi_high(code),
        BaseEncoding::MacRoman => mac_roman_high(code),
    }
}

fn win_ansi_high(code: u8) -> Option<char> {
    let c = match code {
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0xA0 => '\u{00A0}',
        0xA9 => '\u{00A9}',
        0xAE => '\u{00AE}',
        0xB0 => '\u{00B0}',
        _ if code >= 0xA0 => code as char,
        _ => return None,
    };
    Some(c)
}

/// Adobe `StandardEncoding` high byte table: a modest subset (quote glyphs
/// and the high-byte Latin punctuation block) rather than the full 0241-0377
/// octal table, matching the best-effort-fallback spirit of this decoder.
fn standard_high(code: u8) -> Option<char> {
    let c = match code {
        0xA1 => '\u{2018}',
        0xA2 => '\u{2019}',
        0xA8 => '\u{2044}',
        0xB2 => '\u{2013}',
        0xB3 => '\u{2014}',
        0xB4 => '\u{201C}',
        0xB5 => '\u{201D}',
        0xC7 => '\u{2022}',
        _ => return None,
    };
    Some(c)
}

/// `MacRomanEncoding` high byte table: the common accented-Latin subset.
fn mac_roman_high(code: u8) -> Option<char> {
    let c = match code {
        0x80 => '\u{00C4}',
        0x81 => '\u{00C5}',
        0x82 => '\u{00C7}',
        0x83 => '\u{00C9}',
        0x87 => '\u{00E1}',
        0x8A => '\u{00E0}',
        0x8E => '\u{00E9}',
        0x8F => '\u{00E8}',
        0x9A => '\u{00F6}',
        0x9F => '\u{00FC}',
        0xA5 => '\u{2022}',
        0xD0 => '\u{2013}',
        0xD1 => '\u{2014}',
        0xD2 => '\u{201C}',
        0xD3 => '\u{201D}',
        0xD4 => '\u{2018}',
        0xD5 => '\u{2019}',
        _ => return None,
    };
    Some(c)
}

/// Glyph-name → Unicode for the subset of the Adobe Glyph List that shows
/// up in `/Differences` arrays in practice, plus the `uniXXXX` convention.
fn glyph_name_to_char(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni") {
        if let Ok(code) = u32::from_str_radix(hex, 16) {
            return char::from_u32(code);
        }
    }
    let c = match name {
        "space" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" | "quoteright" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "asciicircum" => '^',
        "underscore" => '_',
        "grave" | "quoteleft" => '`',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "asciitilde" => '~',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "emdash" => '\u{2014}',
        "endash" => '\u{2013}',
        "bullet" => '\u{2022}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        _ if name.len() == 1 => name.chars().next(),
        _ => return None,
    };
    Some(c)
}

/// Reads the `/Encoding` entry's declared base encoding name: either the
/// name itself, when `/Encoding` is a bare name (e.g. `/WinAnsiEncoding`),
/// or its `/BaseEncoding` entry, when `/Encoding` is a dictionary.
pub(crate) fn declared_base_encoding(doc: &Document, font_dict: &Dictionary) -> Option<BaseEncoding> {
    let encoding = font_dict.get(b"Encoding").ok()?;
    let resolved = doc.dereference(encoding);
    match &resolved {
        Object::Name(_) => parse_base_encoding(resolved.as_name_str().ok()?),
        Object::Dictionary(enc_dict) => {
            let base_name = enc_dict.get(b"BaseEncoding").and_then(Object::as_name_str).ok()?;
            parse_base_encoding(base_name)
        }
        _ => None,
    }
}

/// Builds a code→char map from `/Encoding`'s `/Differences` array, seeded
/// by `/BaseEncoding` where recognized (so a byte the `/Differences` array
/// doesn't touch still resolves through the declared base table rather
/// than falling through to the WinAnsi default); numbers in the array
/// reset the current code, names advance it and register at the current
/// code.
pub(crate) fn build_differences_encoding(doc: &Document, font_dict: &Dictionary) -> Option<HashMap<u8, char>> {
    let encoding = font_dict.get(b"Encoding").ok()?;
    let resolved = doc.dereference(encoding);
    let enc_dict = resolved.as_dict().ok()?;

    let base = enc_dict
        .get(b"BaseEncoding")
        .and_then(Object::as_name_str)
        .ok()
        .and_then(parse_base_encoding);

    let mut map = HashMap::new();
    if let Some(base) = base {
        for code in 0u16..=255 {
            if let Some(c) = standard_encoding_char(code as u8, base) {
                map.insert(code as u8, c);
            }
        }
    }

    let differences = enc_dict.get(b"Differences").and_then(Object::as_array).ok();
    let mut current_code: i64 = 0;
    if let Some(differences) = differences {
        for item in differences {
            if let Ok(n) = item.as_i64() {
                current_code = n;
            } else if let Ok(name) = item.as_name_str() {
                if let Some(c) = glyph_name_to_char(name) {
                    if (0..=255).contains(&current_code) {
                        map.insert(current_code as u8, c);
                    }
                }
                current_code += 1;
            }
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn ascii_range_is_identity() {
        assert_eq!(standard_encoding_char(b'A', BaseEncoding::WinAnsi), Some('A'));
    }

    #[test]
    fn win_ansi_and_mac_roman_high_bytes_differ() {
        assert_eq!(standard_encoding_char(0x80, BaseEncoding::MacRoman), Some('\u{00C4}'));
        assert_ne!(
            standard_encoding_char(0x80, BaseEncoding::MacRoman),
            standard_encoding_char(0x80, BaseEncoding::WinAnsi)
        );
    }

    #[test]
    fn differences_numbers_reset_code() {
        let doc_bytes = b"%PDF-1.7\n1 0 obj\n<< >>\nendobj\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF";
        let doc = crate::document::Document::parse(doc_bytes).unwrap();
        let mut font = Dictionary::new();
        let mut enc = Dictionary::new();
        enc.set(
            "Differences",
            Object::Array(vec![
                Object::Integer(65),
                Object::Name(b"A".to_vec()),
                Object::Name(b"B".to_vec()),
            ]),
        );
        font.set("Encoding", Object::Dictionary(enc));
        let map = build_differences_encoding(&doc, &font).unwrap();
        assert_eq!(map.get(&65), Some(&'A'));
        assert_eq!(map.get(&66), Some(&'B'));
    }

    #[test]
    fn base_encoding_seeds_map_before_differences_apply() {
        let doc_bytes = b"%PDF-1.7\n1 0 obj\n<< >>\nendobj\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF";
        let doc = crate::document::Document::parse(doc_bytes).unwrap();
        let mut font = Dictionary::new();
        let mut enc = Dictionary::new();
        enc.set("BaseEncoding", Object::Name(b"MacRomanEncoding".to_vec()));
        enc.set(
            "Differences",
            Object::Array(vec![Object::Integer(65), Object::Name(b"B".to_vec())]),
        );
        font.set("Encoding", Object::Dictionary(enc));
        let map = build_differences_encoding(&doc, &font).unwrap();
        // Seeded from MacRomanEncoding, untouched by /Differences.
        assert_eq!(map.get(&0x80), Some(&'\u{00C4}'));
        // Overridden by /Differences.
        assert_eq!(map.get(&65), Some(&'B'));
    }

    #[test]
    fn declared_base_encoding_reads_bare_name_and_dict() {
        let doc_bytes = b"%PDF-1.7\n1 0 obj\n<< >>\nendobj\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF";
        let doc = crate::document::Document::parse(doc_bytes).unwrap();

        let mut bare = Dictionary::new();
        bare.set("Encoding", Object::Name(b"MacRomanEncoding".to_vec()));
        assert_eq!(declared_base_encoding(&doc, &bare), Some(BaseEncoding::MacRoman));

        let mut enc = Dictionary::new();
        enc.set("BaseEncoding", Object::Name(b"StandardEncoding".to_vec()));
        let mut dict_form = Dictionary::new();
        dict_form.set("Encoding", Object::Dictionary(enc));
        assert_eq!(declared_base_encoding(&doc, &dict_form), Some(BaseEncoding::Standard));
    }
}
