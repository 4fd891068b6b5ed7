//! Output formatting for loaded documents.

use colored::*;
use indexmap::IndexMap;
use yoml_rs::{emit, Document, Error, NodeRef};

// =============================================================================
// Documents
// =============================================================================

/// Separator written between documents of one output stream.
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Render documents as block YAML, separated by `---` lines.
pub fn render_documents(docs: &[Document]) -> String {
    docs.iter()
        .map(|doc| emit(doc.root()))
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

// =============================================================================
// Anchors
// =============================================================================

/// Anchored nodes of a document grouped by anchor name, in document order.
pub fn anchors(doc: &Document) -> IndexMap<&str, Vec<NodeRef<'_>>> {
    let mut anchors: IndexMap<&str, Vec<NodeRef<'_>>> = IndexMap::new();
    for node in doc.nodes() {
        if let Some(anchor) = node.anchor() {
            anchors.entry(anchor).or_default().push(node);
        }
    }
    anchors
}

/// One line per anchored node: name, kind, position and share count.
pub fn render_anchors(doc: &Document) -> String {
    let mut out = String::new();
    for (name, nodes) in anchors(doc) {
        for node in nodes {
            out.push_str(&format!(
                "&{}\t{}\t{}\tshares={}\n",
                name,
                node.kind(),
                node.position(),
                node.share_count()
            ));
        }
    }
    out
}

// =============================================================================
// Errors
// =============================================================================

/// Error message prefixed with the input's label.
pub fn format_error(label: &str, err: &Error) -> String {
    match err.position() {
        Some(_) => format!("{}:{}", label, err),
        None => format!("{}: {}", label, err),
    }
}

pub fn print_error(message: &str) {
    eprintln!("{}: {}", "Error".bright_red(), message);
}

// =============================================================================
// Unit Tests
// =============================================================================
