//! End-to-end extraction scenarios, built as literal byte-string PDF
//! fixtures: hand-written object bodies wrapped in a `format!`-ed classic
//! xref table.

use pdfcore::{Document, ExtractOptions, Object, StringFormat};

fn helloworld_pdf() -> Vec<u8> {
    let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec();
    let obj2 = b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec();
    let content = b"BT /F1 24 Tf 100 700 Td (Hello, World!) Tj ET";
    let obj3 = b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>\nendobj\n".to_vec();
    let obj4 = b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".to_vec();
    let obj5 = format!(
        "5 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
        content.len(),
        String::from_utf8_lossy(content)
    )
    .into_bytes();

    build_classic_pdf(vec![obj1, obj2, obj3, obj4, obj5])
}

/// Wraps `objects` (1-indexed, contiguous) in a `%PDF-1.7` header and a
/// classic xref table + trailer pointing at a `/Catalog` root.
fn build_classic_pdf(objects: Vec<Vec<u8>>) -> Vec<u8> {
    let n = objects.len();
    let mut buffer = b"%PDF-1.7\n".to_vec();
    let mut offsets = vec![0u32; n + 1];
    for (i, obj) in objects.into_iter().enumerate() {
        offsets[i + 1] = buffer.len() as u32;
        buffer.extend_from_slice(&obj);
    }
    let xref_start = buffer.len();
    buffer.extend_from_slice(format!("xref\n0 {}\n", n + 1).as_bytes());
    buffer.extend_from_slice(b"0000000000 65535 f \n");
    for i in 1..=n {
        buffer.extend_from_slice(format!("{:010} 00000 n \n", offsets[i]).as_bytes());
    }
    buffer.extend_from_slice(format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n", n + 1).as_bytes());
    buffer.extend_from_slice(format!("{xref_start}\n%%EOF").as_bytes());
    buffer
}

#[test]
fn minimal_hello_world_extracts_text_and_metadata() {
    let buffer = helloworld_pdf();
    let doc = Document::parse(&buffer).unwrap();
    let result = doc.extract();
    assert_eq!(result.pages.len(), 1);
    assert!(result.pages[0].text.contains("Hello, World!"));
    assert_eq!(result.metadata.page_count, 1);
    assert!(!result.metadata.is_encrypted);
}

#[test]
fn damaged_startxref_reconstructs_to_same_result() {
    let mut buffer = helloworld_pdf();
    let pos = buffer.windows(9).rposition(|w| w == b"startxref").unwrap();
    let eof = buffer.windows(5).rposition(|w| w == b"%%EOF").unwrap();
    let replacement = b"startxref\n99999\n".to_vec();
    buffer.splice(pos..eof, replacement);

    let doc = Document::parse(&buffer).unwrap();
    let result = doc.extract();
    assert_eq!(result.pages.len(), 1);
    assert!(result.pages[0].text.contains("Hello, World!"));
    assert_eq!(result.metadata.page_count, 1);
}

#[test]
fn inline_image_and_form_xobject_produce_no_text_and_no_panic() {
    let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec();
    let obj2 = b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec();
    let content = b"q 50 0 0 50 0 0 cm BI /W 1 /H 1 /BPC 8 /CS /G ID \x7f EI Q /Fm1 Do";
    let obj3 = format!(
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Resources << /XObject << /Fm1 4 0 R >> >> /Contents 5 0 R >>\nendobj\n"
    )
    .into_bytes();
    let form_content = b"0 0 1 RG 0 0 50 50 re S";
    let obj4 = format!(
        "4 0 obj\n<< /Type /XObject /Subtype /Form /BBox [0 0 50 50] /Length {} >>\nstream\n{}\nendstream\nendobj\n",
        form_content.len(),
        String::from_utf8_lossy(form_content)
    )
    .into_bytes();
    let obj5 = format!(
        "5 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
        content.len(),
        String::from_utf8_lossy(content)
    )
    .into_bytes();

    let buffer = build_classic_pdf(vec![obj1, obj2, obj3, obj4, obj5]);
    let doc = Document::parse(&buffer).unwrap();
    let result = doc.extract();
    assert_eq!(result.pages.len(), 1);
    assert!(result.pages[0].text.is_empty());
    assert!(result.images.len() <= usize::MAX);
}

#[test]
fn ascii85_filter_decodes_sample_payload() {
    let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec();
    let obj2 = b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n".to_vec();
    let obj3 = b"3 0 obj\n<< /Filter /ASCII85Decode /Length 5 >>\nstream\n9jqo^\nendstream\nendobj\n".to_vec();
    let buffer = build_classic_pdf(vec![obj1, obj2, obj3]);
    let doc = Document::parse(&buffer).unwrap();
    let obj = doc.get_object((3, 0));
    let stream = obj.as_stream_pub();
    assert_eq!(stream.decompressed_content(), b"Man ");
}

#[test]
fn newline_separated_object_header_found_by_reconstruction() {
    let mut buffer = b"%PDF-1.7\n".to_vec();
    buffer.extend_from_slice(b"garbage preceding data that isn't a valid xref\n");
    buffer.extend_from_slice(b"2\n0 obj\n<< /Foo true >>\nendobj\n");
    buffer.extend_from_slice(b"startxref\n999999\n%%EOF");

    let doc = Document::parse(&buffer).unwrap();
    let obj = doc.get_object((2, 0));
    assert!(obj.as_dict_pub().has_key(b"Foo"));
}

#[test]
fn tj_word_gap_threshold() {
    let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec();
    let obj2 = b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec();
    let content = b"BT /F1 12 Tf [(Hello) -350 (World)] TJ ET";
    let obj3 = b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>\nendobj\n".to_vec();
    let obj4 = b"4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>\nendobj\n".to_vec();
    let obj5 = format!(
        "5 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
        content.len(),
        String::from_utf8_lossy(content)
    )
    .into_bytes();
    let buffer = build_classic_pdf(vec![obj1, obj2, obj3, obj4, obj5]);
    let doc = Document::parse(&buffer).unwrap();
    let result = doc.extract();
    assert_eq!(result.pages[0].text, "HelloWorld");
}

#[test]
fn document_level_metadata_reports_version_and_root_unreachable_gracefully() {
    let opts = ExtractOptions::default();
    assert_eq!(opts.max_pages, 100);
    let garbage = b"not a pdf at all";
    assert!(Document::parse(garbage).is_err());
}

trait ObjectTestExt {
    fn as_stream_pub(&self) -> &pdfcore::Stream;
    fn as_dict_pub(&self) -> &pdfcore::Dictionary;
}

impl ObjectTestExt for Object {
    fn as_stream_pub(&self) -> &pdfcore::Stream {
        match self {
            Object::Stream(s) => s,
            other => panic!("expected a stream object, got {other:?}"),
        }
    }

    fn as_dict_pub(&self) -> &pdfcore::Dictionary {
        match self {
            Object::Dictionary(d) => d,
            other => panic!("expected a dictionary object, got {other:?}"),
        }
    }
}

// `StringFormat` is exercised indirectly through `Object::String`; this
// import keeps the public re-export covered by the integration test build.
#[allow(dead_code)]
fn _string_format_is_reachable(_: StringFormat) {}
