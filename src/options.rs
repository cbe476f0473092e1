//! The core's entire configuration surface: no environment variables, no
//! hidden constants. Every resource cap is a field here rather than a
//! buried literal, so callers can tune them without forking the crate.

/// Resource caps enforced while parsing and extracting a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Reconstruction scan cap on discovered `obj` occurrences.
    pub max_xref_entries: usize,
    /// Global resolution counter cap for `get_object`.
    pub max_object_retrievals: usize,
    /// Value/dictionary/array parse recursion depth.
    pub max_parse_depth: usize,
    /// Per-dictionary entry cap.
    pub max_dict_entries: usize,
    /// Per-array entry cap.
    pub max_array_entries: usize,
    /// Page-tree traversal depth cap.
    pub max_page_tree_depth: usize,
    /// Max `/Kids` entries processed per `Pages` node.
    pub max_kids_per_node: usize,
    /// Max leaf pages extracted from the page tree.
    pub max_pages: usize,
    /// Max `Do`-recursion depth into nested Form XObjects.
    pub max_form_recursion_depth: usize,
    /// Search budget for locating a root catalog when `/Root` is absent.
    pub max_root_search: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            max_xref_entries: 10_000,
            max_object_retrievals: 5_000,
            max_parse_depth: 50,
            max_dict_entries: 1_000,
            max_array_entries: 1_000,
            max_page_tree_depth: 30,
            max_kids_per_node: 1_000,
            max_pages: 100,
            max_form_recursion_depth: 30,
            max_root_search: 5_000,
        }
    }
}
