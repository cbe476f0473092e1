//! Image XObject and inline-image decoding, and magic-byte MIME sniffing:
//! the core produces decoded bytes and a detected MIME type; any
//! re-encoding into a particular container format is left to callers.

use crate::content::state::{self, Matrix};
use crate::filters;
use crate::object::{Dictionary, Object};

/// One decoded image placement: an identifier, pixel bytes, detected MIME
/// type, pixel dimensions, the owning page, and the page-space origin the
/// CTM places it at.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub page_number: u32,
    pub width: u32,
    pub height: u32,
    pub x: f64,
    pub y: f64,
}

pub(crate) fn decode_image_xobject(id: &str, dict: &Dictionary, decoded: &[u8], ctm: Matrix) -> Option<ImageRecord> {
    build_record(id, dict, decoded.to_vec(), ctm)
}

pub(crate) fn decode_inline_image(id: &str, dict: &Dictionary, raw: &[u8], ctm: Matrix) -> Option<ImageRecord> {
    let decoded = filters::decode_stream(raw, dict);
    build_record(id, dict, decoded, ctm)
}

fn build_record(id: &str, dict: &Dictionary, data: Vec<u8>, ctm: Matrix) -> Option<ImageRecord> {
    let width = dict.get(b"Width").and_then(Object::as_i64).ok()?.max(0) as u32;
    let height = dict.get(b"Height").and_then(Object::as_i64).ok()?.max(0) as u32;
    let (x, y) = state::apply(ctm, 0.0, 0.0);
    let mime_type = detect_mime(&data).to_string();
    Some(ImageRecord {
        id: id.to_string(),
        data,
        mime_type,
        page_number: 0,
        width,
        height,
        x,
        y,
    })
}

/// Identifies a decoded image's container format by magic bytes.
/// Anything unrecognized (most commonly raw, still-compressed pixel data
/// from a filter this crate doesn't decode, such as `DCTDecode`/`JPXDecode`
/// passthrough or an undecoded `FlateDecode` pixel buffer) is reported as
/// `application/octet-stream`.
pub(crate) fn detect_mime(data: &[u8]) -> &'static str {
    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    if data.starts_with(&PNG_MAGIC) {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }
    "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_png_magic_bytes() {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.extend_from_slice(b"rest");
        assert_eq!(detect_mime(&data), "image/png");
    }

    #[test]
    fn detects_jpeg_magic_bytes() {
        assert_eq!(detect_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
    }

    #[test]
    fn unrecognized_bytes_default_to_octet_stream() {
        assert_eq!(detect_mime(b"not an image"), "application/octet-stream");
    }

    #[test]
    fn builds_record_from_dict_and_ctm() {
        let mut dict = Dictionary::new();
        dict.set("Width", Object::Integer(10));
        dict.set("Height", Object::Integer(20));
        let ctm = state::translate(5.0, 6.0);
        let record = build_record("Im1", &dict, vec![0xFF, 0xD8, 0xFF], ctm).unwrap();
        assert_eq!(record.id, "Im1");
        assert_eq!(record.width, 10);
        assert_eq!(record.height, 20);
        assert_eq!((record.x, record.y), (5.0, 6.0));
        assert_eq!(record.mime_type, "image/jpeg");
    }
}
