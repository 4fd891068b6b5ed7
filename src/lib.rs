//! YAML document trees with anchor, alias and merge-key resolution.
//!
//! The crate turns a stream of structural parse events into a tree of
//! reference-counted nodes, then resolves aliases into shared links to their
//! anchored node and expands `<<` merge keys.
//!
//! ```
//! use yoml_rs::{load_str, ParseOptions};
//!
//! let docs = load_str("base: &b {x: 1}\nderived: {<<: *b, y: 2}\n", &ParseOptions::new()).unwrap();
//! let derived = docs[0].root().get("derived").unwrap();
//! assert_eq!(derived.keys(), vec!["x", "y"]);
//! ```
//!
//! # Module Organization
//!
//! - [`event`]: Events, positions and the [`EventSource`] contract
//! - [`source`]: Event source over YAML text
//! - [`dom`]: Node store, translation, resolution and output
//! - [`erase`]: Secure erasure of scalar buffers

pub mod dom;
pub mod erase;
pub mod event;
pub mod source;

pub use dom::{
    emit, parse_document, Document, Error, Loader, NodeId, NodeKind, NodeRef, ParseOptions,
};
pub use erase::Eraser;
pub use event::{Event, EventKind, EventQueue, EventSource, MarkedEvent, Position, SourceError};
pub use source::TextSource;

/// Load every document of a YAML text.
pub fn load_str(text: &str, options: &ParseOptions) -> Result<Vec<Document>, Error> {
    Loader::new(TextSource::new(text), options.clone()).collect()
}
