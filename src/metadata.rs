//! Document-level metadata extraction from the `/Info` dictionary and the
//! page tree's `/Count`.

use encoding_rs::UTF_16BE;

use crate::document::Document;
use crate::object::{Dictionary, Object};

/// Metadata extracted from `Info` dict string entries and the page tree,
/// consumed by the external façade.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: u32,
    pub version: String,
    pub is_encrypted: bool,
}

impl Document {
    /// Reads metadata without walking or interpreting the page tree's
    /// content streams (a fast path distinct from `extract`).
    pub fn metadata(&self) -> DocumentMetadata {
        let info = self
            .trailer
            .get(b"Info")
            .ok()
            .map(|o| self.dereference(o))
            .and_then(|o| o.as_dict().ok().cloned());

        let mut meta = DocumentMetadata {
            version: self.version.clone(),
            is_encrypted: self.is_encrypted(),
            ..Default::default()
        };

        if let Some(info) = info {
            meta.title = string_field(&info, b"Title");
            meta.author = string_field(&info, b"Author");
            meta.subject = string_field(&info, b"Subject");
            meta.keywords = string_field(&info, b"Keywords");
            meta.creator = string_field(&info, b"Creator");
            meta.producer = string_field(&info, b"Producer");
            meta.creation_date = string_field(&info, b"CreationDate");
            meta.modification_date = string_field(&info, b"ModDate");
        }

        meta.page_count = self.page_count();
        meta
    }

    fn page_count(&self) -> u32 {
        let Some(root) = self.root_catalog() else { return 0 };
        let Ok(pages) = root.get(b"Pages") else { return 0 };
        let pages = self.dereference(pages);
        let Ok(dict) = pages.as_dict() else { return 0 };
        if let Ok(count) = dict.get(b"Count").and_then(Object::as_i64) {
            return count.max(0) as u32;
        }
        let mut seen = std::collections::HashSet::new();
        self.count_pages_tree(dict, &mut seen)
    }

    fn count_pages_tree(&self, node: &Dictionary, seen: &mut std::collections::HashSet<(u32, u16)>) -> u32 {
        let Ok(kids) = node.get(b"Kids").and_then(Object::as_array) else {
            return if node.has_type(b"Page") { 1 } else { 0 };
        };
        let mut total = 0;
        for kid in kids {
            if let Ok(id) = kid.as_reference() {
                if !seen.insert(id) {
                    continue;
                }
            }
            let resolved = self.dereference(kid);
            if let Ok(dict) = resolved.as_dict() {
                total += self.count_pages_tree(dict, seen);
            }
        }
        total
    }
}

/// Extracts a PDF string value, decoding a UTF-16BE BOM-prefixed string as
/// such and otherwise treating the bytes as Latin-1/ASCII text (matching
/// how `Info` dictionary text strings are written in practice).
fn string_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let obj = dict.get(key).ok()?;
    let bytes = obj.as_str().ok()?;
    Some(decode_pdf_text_string(bytes))
}

pub(crate) fn decode_pdf_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (text, _, had_errors) = UTF_16BE.decode(&bytes[2..]);
        if !had_errors {
            return text.into_owned();
        }
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn pdf_with_info() -> Vec<u8> {
        let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec();
        let obj2 = b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec();
        let obj3 = b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 10 10] >>\nendobj\n".to_vec();
        let obj4 = b"4 0 obj\n<< /Title (Test Doc) /Author (Jane) >>\nendobj\n".to_vec();

        let mut buffer = b"%PDF-1.7\n".to_vec();
        let mut offsets = vec![0u32; 5];
        for (i, obj) in [obj1, obj2, obj3, obj4].into_iter().enumerate() {
            offsets[i + 1] = buffer.len() as u32;
            buffer.extend_from_slice(&obj);
        }
        let xref_start = buffer.len();
        buffer.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
        for i in 1..5 {
            buffer.extend_from_slice(format!("{:010} 00000 n \n", offsets[i]).as_bytes());
        }
        buffer.extend_from_slice(b"trailer\n<< /Size 5 /Root 1 0 R /Info 4 0 R >>\nstartxref\n");
        buffer.extend_from_slice(format!("{xref_start}\n%%EOF").as_bytes());
        buffer
    }

    #[test]
    fn reads_info_and_page_count() {
        let buffer = pdf_with_info();
        let doc = Document::parse(&buffer).unwrap();
        let meta = doc.metadata();
        assert_eq!(meta.title.as_deref(), Some("Test Doc"));
        assert_eq!(meta.author.as_deref(), Some("Jane"));
        assert_eq!(meta.page_count, 1);
        assert!(!meta.is_encrypted);
    }

    #[test]
    fn utf16_be_title_decodes() {
        let mut dict = Dictionary::new();
        let mut bytes = vec![0xFE, 0xFF];
        for c in "Hi".encode_utf16() {
            bytes.extend_from_slice(&c.to_be_bytes());
        }
        dict.set("Title", Object::String(bytes, crate::object::StringFormat::Literal));
        assert_eq!(string_field(&dict, b"Title"), Some("Hi".to_string()));
    }
}
