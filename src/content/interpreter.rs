//! The content-stream operator VM: executes operators, tracks
//! text/graphics state, honors marked-content `ActualText`, recurses into
//! Form XObjects, and emits placed text runs and images.

use std::collections::HashMap;
use std::rc::Rc;

use crate::content::lexer::{self, ContentToken};
use crate::content::state::{self, GraphicsState, Matrix, TextState};
use crate::document::Document;
use crate::fonts::{self, FontInfo};
use crate::images::{self, ImageRecord};
use crate::metadata::decode_pdf_text_string;
use crate::object::{Dictionary, Object, ObjectId};
use crate::options::ExtractOptions;

/// One emitted, placed text run.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
}

#[derive(Default)]
pub(crate) struct InterpretResult {
    pub(crate) runs: Vec<TextRun>,
    pub(crate) images: Vec<ImageRecord>,
    inline_image_count: usize,
}

type FontCache = HashMap<ObjectId, Rc<FontInfo>>;

pub(crate) fn interpret_page_content(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    opts: &ExtractOptions,
) -> InterpretResult {
    let mut result = InterpretResult::default();
    let mut font_cache = FontCache::new();
    let mut gs = GraphicsState::default();
    let mut ts = TextState::default();
    let mut gs_stack: Vec<(GraphicsState, TextState)> = Vec::new();
    let mut suppression: Vec<bool> = vec![false];

    run(
        doc,
        content,
        resources,
        opts,
        0,
        &mut gs,
        &mut ts,
        &mut gs_stack,
        &mut suppression,
        &mut font_cache,
        &mut result,
    );
    result
}

#[allow(clippy::too_many_arguments)]
fn run(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    opts: &ExtractOptions,
    depth: usize,
    gs: &mut GraphicsState,
    ts: &mut TextState,
    gs_stack: &mut Vec<(GraphicsState, TextState)>,
    suppression: &mut Vec<bool>,
    font_cache: &mut FontCache,
    out: &mut InterpretResult,
) {
    let tokens = lexer::tokenize(content, opts);

    for token in tokens {
        match token {
            ContentToken::InlineImage { dict, data } => {
                let id = format!("inline{}", out.inline_image_count);
                out.inline_image_count += 1;
                if let Some(image) = images::decode_inline_image(&id, &dict, &data, gs.ctm) {
                    out.images.push(image);
                }
            }
            ContentToken::Op { operator, operands } => {
                execute_operator(
                    doc, &operator, &operands, resources, opts, depth, gs, ts, gs_stack, suppression, font_cache, out,
                );
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn execute_operator(
    doc: &Document,
    operator: &str,
    operands: &[Object],
    resources: &Dictionary,
    opts: &ExtractOptions,
    depth: usize,
    gs: &mut GraphicsState,
    ts: &mut TextState,
    gs_stack: &mut Vec<(GraphicsState, TextState)>,
    suppression: &mut Vec<bool>,
    font_cache: &mut FontCache,
    out: &mut InterpretResult,
) {
    let is_suppressed = suppression.last().copied().unwrap_or(false);

    match operator {
        "q" => gs_stack.push((gs.clone(), ts.clone())),
        "Q" => {
            if let Some((saved_gs, saved_ts)) = gs_stack.pop() {
                *gs = saved_gs;
                *ts = saved_ts;
            }
        }
        "cm" => {
            if let Some(m) = read_matrix(operands) {
                gs.ctm = state::compose(m, gs.ctm);
            }
        }
        "BT" => {
            ts.text_matrix = state::IDENTITY;
            ts.line_matrix = state::IDENTITY;
        }
        "ET" => {}
        "Tm" => {
            if let Some(m) = read_matrix(operands) {
                ts.text_matrix = m;
                ts.line_matrix = m;
            }
        }
        "Td" => {
            if let Some((tx, ty)) = read_pair(operands) {
                apply_td(ts, tx, ty);
            }
        }
        "TD" => {
            if let Some((tx, ty)) = read_pair(operands) {
                ts.leading = -ty;
                apply_td(ts, tx, ty);
            }
        }
        "T*" => apply_td(ts, 0.0, -ts.leading),
        "Tc" => {
            if let Some(v) = read_num(operands, 0) {
                ts.char_spacing = v;
            }
        }
        "Tw" => {
            if let Some(v) = read_num(operands, 0) {
                ts.word_spacing = v;
            }
        }
        "Tz" => {
            if let Some(v) = read_num(operands, 0) {
                ts.h_scale = v;
            }
        }
        "TL" => {
            if let Some(v) = read_num(operands, 0) {
                ts.leading = v;
            }
        }
        "Tf" => {
            if let (Some(Object::Name(name)), Some(size)) = (operands.first(), read_num(operands, 1)) {
                let name_str = String::from_utf8_lossy(name).into_owned();
                ts.font_info = resolve_font(doc, resources, font_cache, &name_str, opts);
                ts.font_name = Some(name_str);
                ts.font_size = size;
            }
        }
        "Tr" => {
            if let Some(v) = read_num(operands, 0) {
                ts.render_mode = v as i64;
            }
        }
        "Ts" => {
            if let Some(v) = read_num(operands, 0) {
                ts.rise = v;
            }
        }
        "Tj" => {
            if let Some(Object::String(bytes, _)) = operands.first() {
                show_text(gs, ts, bytes, is_suppressed, out);
            }
        }
        "'" => {
            apply_td(ts, 0.0, -ts.leading);
            if let Some(Object::String(bytes, _)) = operands.first() {
                show_text(gs, ts, bytes, is_suppressed, out);
            }
        }
        "\"" => {
            if let (Some(aw), Some(ac), Some(Object::String(bytes, _))) = (
                read_num(operands, 0),
                read_num(operands, 1),
                operands.get(2),
            ) {
                ts.word_spacing = aw;
                ts.char_spacing = ac;
                apply_td(ts, 0.0, -ts.leading);
                show_text(gs, ts, bytes, is_suppressed, out);
            }
        }
        "TJ" => {
            if let Some(Object::Array(items)) = operands.first() {
                show_text_array(gs, ts, items, is_suppressed, out);
            }
        }
        "BMC" => suppression.push(is_suppressed),
        "BDC" => {
            let props = operands.get(1).and_then(|o| resolve_properties(doc, resources, o));
            if let Some(actual_text) = props.and_then(|p| p.get(b"ActualText").ok().cloned()) {
                if let Ok(bytes) = actual_text.as_str() {
                    if !is_suppressed {
                        emit_run(gs, ts, decode_pdf_text_string(bytes), out);
                    }
                }
                suppression.push(true);
            } else {
                suppression.push(is_suppressed);
            }
        }
        "EMC" => {
            suppression.pop();
        }
        "Do" => {
            if let Some(Object::Name(name)) = operands.first() {
                execute_do(doc, name, resources, opts, depth, gs, suppression, font_cache, out);
            }
        }
        _ => {}
    }
}

fn resolve_properties(doc: &Document, resources: &Dictionary, operand: &Object) -> Option<Dictionary> {
    if let Ok(dict) = operand.as_dict() {
        return Some(dict.clone());
    }
    let name = operand.as_name().ok()?;
    let properties = resources.get(b"Properties").ok().map(|o| doc.dereference(o))?;
    let props_dict = properties.as_dict().ok()?;
    let entry = props_dict.get(name).ok()?;
    doc.dereference(entry).as_dict().ok().cloned()
}

fn read_matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = operands[i].as_f64().ok()?;
    }
    Some(m)
}

fn read_pair(operands: &[Object]) -> Option<(f64, f64)> {
    Some((operands.first()?.as_f64().ok()?, operands.get(1)?.as_f64().ok()?))
}

fn read_num(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index)?.as_f64().ok()
}

fn apply_td(ts: &mut TextState, tx: f64, ty: f64) {
    let new_line = state::compose(state::translate(tx, ty), ts.line_matrix);
    ts.line_matrix = new_line;
    ts.text_matrix = new_line;
}

/// Estimated advance for `n` decoded characters, absent real glyph
/// metrics: `n · fontSize · 0.55 · hscale/100 + (n-1) · charSpacing`.
fn estimate_advance(ts: &TextState, char_count: usize) -> f64 {
    if char_count == 0 {
        return 0.0;
    }
    let scale = ts.h_scale / 100.0;
    let per_char = ts.font_size * 0.55 * scale;
    char_count as f64 * per_char + (char_count.saturating_sub(1)) as f64 * ts.char_spacing
}

fn show_text(gs: &GraphicsState, ts: &mut TextState, bytes: &[u8], suppressed: bool, out: &mut InterpretResult) {
    let text = decode_with_font(ts, bytes);
    let advance = estimate_advance(ts, text.chars().count());
    if !suppressed && !text.is_empty() {
        emit_run_with_advance(gs, ts, text, advance, out);
    }
    ts.text_matrix = state::compose(state::translate(advance, 0.0), ts.text_matrix);
}

fn decode_with_font(ts: &TextState, bytes: &[u8]) -> String {
    match &ts.font_info {
        Some(info) => info.decode(bytes),
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Word-gap threshold `max(wordSpacing·0.7, fontSize·0.4)`.
fn word_gap_threshold(ts: &TextState) -> f64 {
    (ts.word_spacing * 0.7).max(ts.font_size * 0.4)
}

fn show_text_array(gs: &GraphicsState, ts: &mut TextState, items: &[Object], suppressed: bool, out: &mut InterpretResult) {
    let start_matrix = ts.text_matrix;
    let mut text = String::new();
    let mut total_advance = 0.0_f64;
    let threshold = word_gap_threshold(ts);
    let scale = ts.h_scale / 100.0;

    for item in items {
        match item {
            Object::String(bytes, _) => {
                let decoded = decode_with_font(ts, bytes);
                text.push_str(&decoded);
                total_advance += estimate_advance(ts, decoded.chars().count());
            }
            Object::Integer(_) | Object::Real(_) => {
                let n = item.as_f64().unwrap_or(0.0);
                let advance = -n / 1000.0 * ts.font_size * scale;
                if advance > threshold {
                    text.push(' ');
                }
                total_advance += advance;
            }
            _ => {}
        }
    }

    if !suppressed && !text.is_empty() {
        emit_run_from(gs, start_matrix, ts, text, total_advance, out);
    }
    ts.text_matrix = state::compose(state::translate(total_advance, 0.0), start_matrix);
}

fn emit_run(gs: &GraphicsState, ts: &TextState, text: String, out: &mut InterpretResult) {
    emit_run_with_advance(gs, ts, text, 0.0, out)
}

fn emit_run_with_advance(gs: &GraphicsState, ts: &TextState, text: String, advance: f64, out: &mut InterpretResult) {
    emit_run_from(gs, ts.text_matrix, ts, text, advance, out)
}

fn emit_run_from(gs: &GraphicsState, start_text_matrix: Matrix, ts: &TextState, text: String, advance: f64, out: &mut InterpretResult) {
    let full = state::compose(gs.ctm, start_text_matrix);
    let (x, y) = state::apply(full, 0.0, 0.0);
    let (ex, ey) = state::apply(full, advance, 0.0);
    let width = ((ex - x).powi(2) + (ey - y).powi(2)).sqrt();
    out.runs.push(TextRun {
        text,
        x,
        y,
        width,
        font_size: ts.font_size,
        char_spacing: ts.char_spacing,
        word_spacing: ts.word_spacing,
    });
}

fn resolve_font(doc: &Document, resources: &Dictionary, cache: &mut FontCache, name: &str, _opts: &ExtractOptions) -> Option<Rc<FontInfo>> {
    let font_dict_obj = doc.dereference(resources.get(b"Font").ok()?);
    let font_dict = font_dict_obj.as_dict().ok()?;
    let entry = font_dict.get(name.as_bytes()).ok()?;
    let cache_key = entry.as_reference().ok();

    if let Some(id) = cache_key {
        if let Some(cached) = cache.get(&id) {
            return Some(cached.clone());
        }
    }

    let resolved = doc.dereference(entry);
    let dict = resolved.as_dict().ok()?.clone();
    let info = Rc::new(fonts::build_font_info(doc, &dict, name));
    if let Some(id) = cache_key {
        cache.insert(id, info.clone());
    }
    Some(info)
}

#[allow(clippy::too_many_arguments)]
fn execute_do(
    doc: &Document,
    name: &[u8],
    resources: &Dictionary,
    opts: &ExtractOptions,
    depth: usize,
    gs: &mut GraphicsState,
    suppression: &mut Vec<bool>,
    font_cache: &mut FontCache,
    out: &mut InterpretResult,
) {
    let Ok(xobjects_ref) = resources.get(b"XObject") else { return };
    let xobjects = doc.dereference(xobjects_ref);
    let Ok(xobjects) = xobjects.as_dict() else { return };
    let Ok(entry) = xobjects.get(name) else { return };
    let resolved = doc.dereference(entry);
    let Ok(stream) = resolved.as_stream() else { return };

    if stream.dict.has_type(b"Image") {
        let id = String::from_utf8_lossy(name).into_owned();
        if let Some(image) = images::decode_image_xobject(&id, &stream.dict, &stream.decompressed_content(), gs.ctm) {
            out.images.push(image);
        }
        return;
    }

    if !stream.dict.has_type(b"Form") {
        return;
    }
    if depth >= opts.max_form_recursion_depth {
        log::warn!("Form XObject recursion depth {depth} exceeded cap");
        return;
    }

    let form_matrix = stream
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .ok()
        .and_then(read_matrix_slice)
        .unwrap_or(state::IDENTITY);

    let form_resources = stream
        .dict
        .get(b"Resources")
        .map(|o| doc.dereference(o))
        .ok()
        .and_then(|o| o.as_dict().ok().cloned())
        .unwrap_or_else(|| resources.clone());

    let saved_ctm = gs.ctm;
    gs.ctm = state::compose(form_matrix, gs.ctm);

    let mut form_ts = TextState::default();
    let mut form_stack = Vec::new();
    let content = stream.decompressed_content();
    run(
        doc,
        &content,
        &form_resources,
        opts,
        depth + 1,
        gs,
        &mut form_ts,
        &mut form_stack,
        suppression,
        font_cache,
        out,
    );

    gs.ctm = saved_ctm;
}

fn read_matrix_slice(items: &[Object]) -> Option<Matrix> {
    if items.len() != 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for (i, slot) in m.iter_mut().enumerate() {
        *slot = items[i].as_f64().ok()?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc_with_page(content: &str) -> (Document, Dictionary) {
        let bytes = format!(
            "%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n2 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\ntrailer\n<< /Size 3 /Root 1 0 R >>\nstartxref\n0\n%%EOF",
            content.len(),
            content
        );
        let doc = Document::parse(bytes.as_bytes()).unwrap();
        (doc, Dictionary::new())
    }

    #[test]
    fn simple_text_show_emits_run() {
        let (doc, resources) = doc_with_page("BT /F1 24 Tf 100 700 Td (Hello, World!) Tj ET");
        let stream_obj = doc.get_object((2, 0));
        let content = stream_obj.as_stream().unwrap().decompressed_content();
        let result = interpret_page_content(&doc, &content, &resources, doc.options());
        assert_eq!(result.runs.len(), 1);
        assert!(result.runs[0].text.contains("Hello, World!"));
        assert_eq!(result.runs[0].x, 100.0);
        assert_eq!(result.runs[0].y, 700.0);
    }

    #[test]
    fn tj_word_gap_threshold() {
        let (doc, resources) = doc_with_page("BT /F1 12 Tf [(Hello) -350 (World)] TJ ET");
        let stream_obj = doc.get_object((2, 0));
        let content = stream_obj.as_stream().unwrap().decompressed_content();
        let result = interpret_page_content(&doc, &content, &resources, doc.options());
        assert_eq!(result.runs.len(), 1);
        assert_eq!(result.runs[0].text, "HelloWorld");
    }

    #[test]
    fn tj_word_gap_threshold_exceeded_inserts_space() {
        let (doc, resources) = doc_with_page("BT /F1 12 Tf [(Hello) -500 (World)] TJ ET");
        let stream_obj = doc.get_object((2, 0));
        let content = stream_obj.as_stream().unwrap().decompressed_content();
        let result = interpret_page_content(&doc, &content, &resources, doc.options());
        assert_eq!(result.runs[0].text, "Hello World");
    }

    #[test]
    fn actual_text_suppresses_nested_tj() {
        let (doc, resources) = doc_with_page(
            "BT /F1 12 Tf /P <</ActualText (Foo)>> BDC (Bar) Tj EMC ET",
        );
        let stream_obj = doc.get_object((2, 0));
        let content = stream_obj.as_stream().unwrap().decompressed_content();
        let result = interpret_page_content(&doc, &content, &resources, doc.options());
        let combined: String = result.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(combined, "Foo");
    }

    #[test]
    fn q_and_capital_q_restore_ctm() {
        let (doc, resources) = doc_with_page("q 2 0 0 2 0 0 cm Q BT /F1 12 Tf 10 10 Td (X) Tj ET");
        let stream_obj = doc.get_object((2, 0));
        let content = stream_obj.as_stream().unwrap().decompressed_content();
        let result = interpret_page_content(&doc, &content, &resources, doc.options());
        assert_eq!(result.runs[0].x, 10.0);
        assert_eq!(result.runs[0].y, 10.0);
    }
}
