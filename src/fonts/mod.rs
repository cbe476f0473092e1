//! Font dictionary decoding: builds a code→Unicode map for every font a
//! content stream references.

mod cmap;
mod encoding;
mod truetype;

use std::collections::HashMap;

use crate::document::Document;
use crate::object::{Dictionary, Object};

/// Resolved decoding strategy for one font dictionary, cached per font-dict
/// identity by the content interpreter.
#[derive(Debug, Clone, Default)]
pub(crate) struct FontInfo {
    pub(crate) font_name: String,
    /// `/Subtype` of the font dictionary (`Type1`, `TrueType`, `Type0`, ...).
    pub(crate) font_type: String,
    /// Declared `/Encoding` name, or the dictionary form's `/BaseEncoding`.
    pub(crate) encoding_name: Option<String>,
    /// `/FontDescriptor`'s `/Flags` bit 3 (symbolic).
    pub(crate) is_symbolic: bool,
    /// Whether a `FontFile`/`FontFile2`/`FontFile3` is present on the
    /// (descendant, for CID fonts) descriptor.
    pub(crate) is_embedded: bool,
    pub(crate) is_cid_font: bool,
    pub(crate) custom_encoding: Option<HashMap<u8, char>>,
    pub(crate) to_unicode: Option<HashMap<u32, String>>,
    pub(crate) gid_to_unicode: Option<HashMap<u32, String>>,
}

impl FontInfo {
    /// Decodes a text-showing operand's raw bytes into a Unicode string.
    pub(crate) fn decode(&self, bytes: &[u8]) -> String {
        if self.is_cid_font {
            self.decode_cid(bytes)
        } else {
            self.decode_simple(bytes)
        }
    }

    fn decode_cid(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        for pair in bytes.chunks(2) {
            let code = if pair.len() == 2 {
                ((pair[0] as u32) << 8) | pair[1] as u32
            } else {
                pair[0] as u32
            };
            if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(&code)) {
                out.push_str(text);
                continue;
            }
            if let Some(text) = self.gid_to_unicode.as_ref().and_then(|m| m.get(&code)) {
                out.push_str(text);
                continue;
            }
            if let Some(c) = char::from_u32(code) {
                out.push(c);
            }
        }
        out
    }

    fn decode_simple(&self, bytes: &[u8]) -> String {
        let base = self
            .encoding_name
            .as_deref()
            .and_then(encoding::parse_base_encoding)
            .unwrap_or(encoding::BaseEncoding::WinAnsi);
        let mut out = String::new();
        for &b in bytes {
            if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.get(&(b as u32))) {
                out.push_str(text);
                continue;
            }
            if let Some(c) = self.custom_encoding.as_ref().and_then(|m| m.get(&b)) {
                out.push(*c);
                continue;
            }
            if let Some(c) = encoding::standard_encoding_char(b, base) {
                out.push(c);
                continue;
            }
            out.push(b as char);
        }
        out
    }
}

/// Builds a `FontInfo` from a (possibly indirect) font dictionary,
/// classifying by `/Subtype` and combining `ToUnicode`, `/Differences`,
/// standard encodings, and (for CID TrueType fonts) an embedded `cmap`
/// table walk.
pub(crate) fn build_font_info(doc: &Document, font_dict: &Dictionary, name: &str) -> FontInfo {
    let subtype = font_dict.get(b"Subtype").and_then(Object::as_name_str).unwrap_or("").to_string();

    if subtype == "Type0" {
        return build_type0_font(doc, font_dict, name);
    }

    let descriptor = font_descriptor(doc, font_dict);
    let mut info = FontInfo {
        font_name: name.to_string(),
        font_type: subtype,
        encoding_name: encoding_name(doc, font_dict),
        is_symbolic: descriptor.as_ref().map(is_symbolic_flag).unwrap_or(false),
        is_embedded: descriptor.as_ref().map(has_embedded_font_file).unwrap_or(false),
        is_cid_font: false,
        ..Default::default()
    };

    info.custom_encoding = encoding::build_differences_encoding(doc, font_dict);
    info.to_unicode = build_to_unicode(doc, font_dict);
    info
}

fn build_type0_font(doc: &Document, font_dict: &Dictionary, name: &str) -> FontInfo {
    let subtype = font_dict.get(b"Subtype").and_then(Object::as_name_str).unwrap_or("Type0").to_string();
    let mut info = FontInfo {
        font_name: name.to_string(),
        font_type: subtype,
        encoding_name: encoding_name(doc, font_dict),
        is_cid_font: true,
        ..Default::default()
    };
    info.to_unicode = build_to_unicode(doc, font_dict);

    let descendant = font_dict
        .get(b"DescendantFonts")
        .map(|o| doc.dereference(o))
        .ok()
        .and_then(|o| o.as_array().ok().and_then(|a| a.first().cloned()))
        .map(|o| doc.dereference(&o))
        .and_then(|o| o.as_dict().ok().cloned());

    let Some(descendant) = descendant else { return info };

    let descendant_descriptor = font_descriptor(doc, &descendant);
    info.is_symbolic = descendant_descriptor.as_ref().map(is_symbolic_flag).unwrap_or(false);
    info.is_embedded = descendant_descriptor.as_ref().map(has_embedded_font_file).unwrap_or(false);

    let is_identity_gid_map = match descendant.get(b"CIDToGIDMap") {
        Ok(obj) => matches!(obj.as_name_str(), Ok("Identity")) || obj.as_reference().is_ok(),
        Err(_) => true, // default is Identity
    };
    let is_truetype_cid = matches!(descendant.get(b"Subtype").and_then(Object::as_name_str), Ok("CIDFontType2"));

    if is_truetype_cid && is_identity_gid_map && info.to_unicode.is_none() {
        if let Some(font_file) = font_program_bytes(doc, &descendant) {
            info.gid_to_unicode = truetype::build_gid_to_unicode(&font_file);
        }
    }

    info
}

/// Resolves the (possibly indirect) `/FontDescriptor` dictionary.
fn font_descriptor(doc: &Document, font_dict: &Dictionary) -> Option<Dictionary> {
    font_dict
        .get(b"FontDescriptor")
        .map(|o| doc.dereference(o))
        .ok()?
        .as_dict()
        .ok()
        .cloned()
}

/// `/Flags` bit 3 (value 4) marks a symbolic font.
fn is_symbolic_flag(descriptor: &Dictionary) -> bool {
    descriptor.get(b"Flags").and_then(Object::as_i64).map(|f| f & 4 != 0).unwrap_or(false)
}

fn has_embedded_font_file(descriptor: &Dictionary) -> bool {
    descriptor.has_key(b"FontFile") || descriptor.has_key(b"FontFile2") || descriptor.has_key(b"FontFile3")
}

/// The declared encoding name: `/Encoding`'s bare name, or the dictionary
/// form's `/BaseEncoding`.
fn encoding_name(doc: &Document, font_dict: &Dictionary) -> Option<String> {
    encoding::declared_base_encoding(doc, font_dict).map(|base| match base {
        encoding::BaseEncoding::Standard => "StandardEncoding".to_string(),
        encoding::BaseEncoding::WinAnsi => "WinAnsiEncoding".to_string(),
        encoding::BaseEncoding::MacRoman => "MacRomanEncoding".to_string(),
    })
}

fn font_program_bytes(doc: &Document, descendant: &Dictionary) -> Option<Vec<u8>> {
    let descriptor = font_descriptor(doc, descendant)?;
    let file = descriptor
        .get(b"FontFile2")
        .or_else(|_| descriptor.get(b"FontFile3"))
        .or_else(|_| descriptor.get(b"FontFile"))
        .ok()?;
    let stream_obj = doc.dereference(file);
    let stream = stream_obj.as_stream().ok()?;
    Some(stream.decompressed_content())
}

fn build_to_unicode(doc: &Document, font_dict: &Dictionary) -> Option<HashMap<u32, String>> {
    let to_unicode = font_dict.get(b"ToUnicode").ok()?;
    let resolved = doc.dereference(to_unicode);
    let stream = resolved.as_stream().ok()?;
    let bytes = stream.decompressed_content();
    Some(cmap::parse_to_unicode_cmap(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_font_falls_back_to_standard_encoding() {
        let info = FontInfo {
            font_name: "F1".to_string(),
            ..Default::default()
        };
        assert_eq!(info.decode(b"A"), "A");
    }

    #[test]
    fn cid_font_decodes_big_endian_pairs() {
        let mut to_unicode = HashMap::new();
        to_unicode.insert(0x0041, "A".to_string());
        to_unicode.insert(0x0042, "B".to_string());
        let info = FontInfo {
            font_name: "F1".to_string(),
            is_cid_font: true,
            to_unicode: Some(to_unicode),
            ..Default::default()
        };
        assert_eq!(info.decode(&[0x00, 0x41, 0x00, 0x42]), "AB");
    }

    #[test]
    fn custom_encoding_used_before_standard() {
        let mut custom = HashMap::new();
        custom.insert(b'A', 'Z');
        let info = FontInfo {
            custom_encoding: Some(custom),
            ..Default::default()
        };
        assert_eq!(info.decode(b"A"), "Z");
    }

    #[test]
    fn build_font_info_reports_type_encoding_and_embedding() {
        let doc_bytes = b"%PDF-1.7\n1 0 obj\n<< >>\nendobj\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF";
        let doc = crate::document::Document::parse(doc_bytes).unwrap();

        let mut descriptor = Dictionary::new();
        descriptor.set("Flags", Object::Integer(4));
        descriptor.set("FontFile2", Object::Null);

        let mut font = Dictionary::new();
        font.set("Subtype", Object::Name(b"TrueType".to_vec()));
        font.set("Encoding", Object::Name(b"MacRomanEncoding".to_vec()));
        font.set("FontDescriptor", Object::Dictionary(descriptor));

        let info = build_font_info(&doc, &font, "F1");
        assert_eq!(info.font_type, "TrueType");
        assert_eq!(info.encoding_name.as_deref(), Some("MacRomanEncoding"));
        assert!(info.is_symbolic);
        assert!(info.is_embedded);
    }
}
