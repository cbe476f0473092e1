//! The top-level extraction entry point: walks the page tree, interprets
//! each page's content stream, and assembles the `{ pages, images,
//! metadata }` result an external façade would consume. `extract` never
//! fails — a page whose content stream cannot be interpreted simply
//! contributes an empty-text page, the per-operator skip semantics
//! bubbled up to the page level.

use crate::content::{self, ImageRecord};
use crate::document::Document;
use crate::metadata::DocumentMetadata;
use crate::object::{Dictionary, Object};
use crate::options::ExtractOptions;
use crate::page::{self, PageLeaf};

/// One extracted page: its 1-based page number, size (from `/MediaBox`),
/// placed text, and the images it carries.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_number: u32,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub images: Vec<ImageRecord>,
}

/// The complete result of extracting a document.
#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub pages: Vec<Page>,
    pub images: Vec<ImageRecord>,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Extracts text, images, and metadata using this document's own
    /// `ExtractOptions` (set at `parse_with_options` time).
    pub fn extract(&self) -> ExtractResult {
        self.extract_with_options(self.options())
    }

    /// Extracts text, images, and metadata, applying `opts`'s caps to the
    /// page-tree walk and content interpretation independently of whatever
    /// caps were used while parsing the xref/object table.
    pub fn extract_with_options(&self, opts: &ExtractOptions) -> ExtractResult {
        let metadata = self.metadata();
        let Some(root) = self.root_catalog() else {
            return ExtractResult { pages: Vec::new(), images: Vec::new(), metadata };
        };

        let leaves = page::collect_pages(self, &root, opts);
        let mut pages = Vec::with_capacity(leaves.len());
        let mut images = Vec::new();

        for (i, leaf) in leaves.into_iter().enumerate() {
            let page_number = (i + 1) as u32;
            let page = interpret_leaf(self, leaf, page_number, opts);
            images.extend(page.images.iter().cloned());
            pages.push(page);
        }

        ExtractResult { pages, images, metadata }
    }
}

fn interpret_leaf(doc: &Document, leaf: PageLeaf, page_number: u32, opts: &ExtractOptions) -> Page {
    let (width, height) = leaf
        .media_box
        .map(|[x1, y1, x2, y2]| (x2 - x1, y2 - y1))
        .unwrap_or((0.0, 0.0));

    let content = page_content_bytes(doc, &leaf.dict);
    let mut result = content::interpret_page_content(doc, &content, &leaf.resources, opts);
    for image in result.images.iter_mut() {
        image.page_number = page_number;
    }

    let text = join_runs(&result.runs);

    Page {
        page_number,
        width,
        height,
        text,
        images: result.images,
    }
}

/// Concatenates a page's runs into the page's flat `text` field, with a
/// newline between runs whose origin drops to a lower `y` than the
/// previous run (a new line in user space) and a space otherwise.
fn join_runs(runs: &[content::TextRun]) -> String {
    let mut text = String::new();
    let mut prev_y: Option<f64> = None;
    for run in runs {
        if let Some(y) = prev_y {
            if (run.y - y).abs() > 0.5 {
                text.push('\n');
            } else if !text.is_empty() {
                text.push(' ');
            }
        }
        text.push_str(&run.text);
        prev_y = Some(run.y);
    }
    text
}

/// `/Contents` may be a single stream reference or an array of them; per
/// PDF convention, concatenated streams are joined with a newline so
/// operators split across streams don't run together.
fn page_content_bytes(doc: &Document, page_dict: &Dictionary) -> Vec<u8> {
    let Ok(contents) = page_dict.get(b"Contents") else { return Vec::new() };
    let resolved = doc.dereference(contents);

    if let Ok(stream) = resolved.as_stream() {
        return stream.decompressed_content();
    }
    if let Ok(arr) = resolved.as_array() {
        let mut bytes = Vec::new();
        for item in arr {
            let resolved = doc.dereference(item);
            if let Ok(stream) = resolved.as_stream() {
                if !bytes.is_empty() {
                    bytes.push(b'\n');
                }
                bytes.extend_from_slice(&stream.decompressed_content());
            }
        }
        return bytes;
    }
    Vec::new()
}
