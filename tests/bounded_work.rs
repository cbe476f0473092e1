//! Pathological inputs terminate within the caps `ExtractOptions`
//! advertises instead of hanging or exhausting memory.

use pdfcore::{Document, ExtractOptions};
use std::time::{Duration, Instant};

const BUDGET: Duration = Duration::from_secs(10);

#[test]
fn reconstruction_caps_on_pathological_obj_count() {
    // A body stuffed with 20,000 bare `obj` occurrences that are not real
    // indirect objects, forcing damage recovery to scan the whole thing.
    let mut buffer = b"%PDF-1.7\n".to_vec();
    for _ in 0..20_000 {
        buffer.extend_from_slice(b"not an obj header\n");
    }
    buffer.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    buffer.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
    buffer.extend_from_slice(b"startxref\n999999999\n%%EOF");

    let start = Instant::now();
    let doc = Document::parse(&buffer);
    assert!(start.elapsed() < BUDGET, "reconstruction scan did not terminate promptly");
    assert!(doc.is_ok());
}

#[test]
fn reconstruction_caps_entry_count_below_max_xref_entries() {
    let opts = ExtractOptions { max_xref_entries: 50, ..ExtractOptions::default() };
    let mut buffer = b"%PDF-1.7\n".to_vec();
    for i in 0..500u32 {
        buffer.extend_from_slice(format!("{} 0 obj\n<< /N {} >>\nendobj\n", i + 1, i).as_bytes());
    }
    buffer.extend_from_slice(b"startxref\n999999999\n%%EOF");

    let start = Instant::now();
    let doc = Document::parse_with_options(&buffer, &opts);
    assert!(start.elapsed() < BUDGET);
    assert!(doc.is_ok());
}

#[test]
fn dictionary_with_many_keys_is_truncated_not_hung() {
    let mut dict_body = String::new();
    for i in 0..5_000 {
        dict_body.push_str(&format!("/K{i} {i}\n"));
    }
    let obj2 = format!("2 0 obj\n<< {dict_body} >>\nendobj\n");

    let obj1 = b"1 0 obj\n<< /Type /Catalog /Pages 3 0 R >>\nendobj\n".to_vec();
    let obj3 = b"3 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n".to_vec();

    let mut buffer = b"%PDF-1.7\n".to_vec();
    let mut offsets = vec![0u32; 4];
    for (i, obj) in [obj1, obj2.into_bytes(), obj3].into_iter().enumerate() {
        offsets[i + 1] = buffer.len() as u32;
        buffer.extend_from_slice(&obj);
    }
    let xref_start = buffer.len();
    buffer.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
    for i in 1..4 {
        buffer.extend_from_slice(format!("{:010} 00000 n \n", offsets[i]).as_bytes());
    }
    buffer.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n");
    buffer.extend_from_slice(format!("{xref_start}\n%%EOF").as_bytes());

    let start = Instant::now();
    let doc = Document::parse(&buffer).unwrap();
    let obj = doc.get_object((2, 0));
    assert!(start.elapsed() < BUDGET);
    match obj {
        pdfcore::Object::Dictionary(d) => {
            assert!(d.len() <= ExtractOptions::default().max_dict_entries);
        }
        other => panic!("expected a dictionary, got {other:?}"),
    }
}

#[test]
fn deeply_nested_form_xobjects_terminate_within_depth_cap() {
    // 150 forms, each invoking the next via `Do`, well past the default
    // recursion cap of 30.
    const DEPTH: usize = 150;

    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_vec());
    objects.push(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_vec());

    // object 4 is the first form; objects 4..4+DEPTH are the chain, each
    // referencing the next by XObject name `/Fm{n}` through its own
    // `/Resources`, and object 3 is the page that kicks it off.
    let page_content = b"/Fm0 Do";
    objects.push(
        format!(
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Resources << /XObject << /Fm0 4 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            4 + DEPTH
        )
        .into_bytes(),
    );

    for i in 0..DEPTH {
        let obj_num = 4 + i;
        let next_name = format!("Fm{}", i + 1);
        let next_obj = 4 + i + 1;
        let body = format!("/{next_name} Do");
        objects.push(
            format!(
                "{obj_num} 0 obj\n<< /Type /XObject /Subtype /Form /BBox [0 0 50 50] /Resources << /XObject << /{next_name} {next_obj} 0 R >> >> /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                body.len(),
                body
            )
            .into_bytes(),
        );
    }
    // terminal form: draws nothing further
    let terminal_obj = 4 + DEPTH;
    objects.push(format!("{terminal_obj} 0 obj\n<< /Type /XObject /Subtype /Form /BBox [0 0 50 50] /Length 0 >>\nstream\n\nendstream\nendobj\n").into_bytes());

    let content_obj = 4 + DEPTH;
    // overwrite placeholder: the page's own content stream is object
    // `4 + DEPTH`, reusing the terminal form's number would collide, so
    // push the real content stream as one further object instead.
    let real_content_obj = content_obj + 1;
    objects[2] = format!(
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Resources << /XObject << /Fm0 4 0 R >> >> /Contents {real_content_obj} 0 R >>\nendobj\n"
    )
    .into_bytes();
    objects.push(
        format!(
            "{real_content_obj} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
            page_content.len(),
            String::from_utf8_lossy(page_content)
        )
        .into_bytes(),
    );

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

    let start = Instant::now();
    let doc = Document::parse(&buffer).unwrap();
    let result = doc.extract();
    assert!(start.elapsed() < BUDGET, "form recursion did not terminate promptly");
    assert_eq!(result.pages.len(), 1);
}
