//! `pdfcore`: a dependency-free PDF reader core that extracts text,
//! embedded raster images, and document metadata from arbitrary PDF
//! byte streams, including files whose cross-reference structure is
//! damaged or absent.
//!
//! The crate is organized leaves-first: [`filters`] decodes stream bytes,
//! [`object`] is the tagged
//! value universe, [`xref`]/[`xref_parse`]/[`reconstruct`]/[`document`]
//! locate and resolve objects (including damage recovery), [`fonts`]
//! builds code→Unicode maps, and [`content`] interprets page content
//! streams into placed text runs and images. [`page`] and [`extract`]
//! tie the pieces together into the single entry point most callers
//! want: [`Document::extract`].
//!
//! ```no_run
//! use pdfcore::Document;
//!
//! let doc = Document::load_file("sample.pdf")?;
//! let result = doc.extract();
//! for page in &result.pages {
//!     println!("page {}: {}", page.page_number, page.text);
//! }
//! # Ok::<(), pdfcore::Error>(())
//! ```

mod content;
mod document;
mod error;
mod extract;
mod filters;
mod fonts;
mod images;
mod lexer;
mod metadata;
mod object;
mod object_stream;
mod options;
mod page;
mod parser;
mod reconstruct;
mod xref;
mod xref_parse;

pub use content::TextRun;
pub use document::Document;
pub use error::{Error, Result};
pub use extract::{ExtractResult, Page};
pub use images::ImageRecord;
pub use metadata::DocumentMetadata;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use options::ExtractOptions;
