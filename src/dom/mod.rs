//! In-memory YAML document tree.
//!
//! A document is built in two passes over an [`EventSource`]:
//! translation allocates one node per scalar, sequence, mapping and alias
//! event, then resolution replaces aliases by shared links to the anchored
//! nodes and expands `<<` merge keys.
//!
//! # Module Organization
//!
//! - [`error`]: Error type for a document parse
//! - [`node`]: Node records, links and entries
//! - [`store`]: Reference-counted node arena and read-only views
//! - [`translate`]: Event-to-tree translation
//! - [`resolve`]: Alias and merge-key resolution
//! - [`emit`]: Block-style YAML output of a tree

mod emit;
mod error;
mod node;
mod resolve;
mod store;
mod translate;

pub use emit::emit;
pub use error::Error;
pub use node::{Content, Entry, Link, NodeId, NodeKind};
pub use resolve::{resolve, MERGE_KEY};
pub use store::{NodeRef, NodeStore};
pub use translate::{Step, Translator};

use crate::erase::Eraser;
use crate::event::{Event, EventKind, EventSource};
use std::rc::Rc;

// =============================================================================
// Options
// =============================================================================

/// Settings of a parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    origin: Option<Rc<str>>,
    eraser: Option<Eraser>,
    resolve: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            origin: None,
            eraser: None,
            resolve: true,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label recorded on every node, typically the file name.
    pub fn origin(mut self, origin: impl AsRef<str>) -> Self {
        self.origin = Some(Rc::from(origin.as_ref()));
        self
    }

    /// Overwrite scalar buffers with `eraser` once they are no longer needed.
    pub fn eraser(mut self, eraser: Eraser) -> Self {
        self.eraser = Some(eraser);
        self
    }

    /// Overwrite scalar buffers with the default byte pattern.
    pub fn secure_erase(self) -> Self {
        self.eraser(Eraser::default())
    }

    /// Whether to resolve aliases and merge keys (default: true).
    ///
    /// An unresolved document keeps its alias nodes and `<<` entries.
    pub fn resolve(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }

    pub fn origin_label(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

// =============================================================================
// Document
// =============================================================================

/// A parsed document: the node store and the single root handle into it.
///
/// Dropping the document releases the root.
#[derive(Debug)]
pub struct Document {
    store: NodeStore,
    root: NodeId,
    resolved: bool,
}

impl Document {
    pub fn root(&self) -> NodeRef<'_> {
        self.store.view(self.root)
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn live_nodes(&self) -> usize {
        self.store.live_nodes()
    }

    /// Every live node in document order, starting at the root, each
    /// listed once even when shared.
    pub fn nodes(&self) -> Vec<NodeRef<'_>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = self.store.view(id);
            out.push(node);
            for entry in node.entry_links().iter().rev() {
                pending.push(entry.value.id());
                pending.push(entry.key.id());
            }
            pending.extend(node.element_links().iter().rev().map(Link::id));
        }
        out
    }

    /// Finish a translated tree: resolve it unless disabled.
    fn build(mut store: NodeStore, root: NodeId, options: &ParseOptions) -> Result<Self, Error> {
        if options.resolve {
            if let Err(e) = resolve(&mut store, root) {
                store.release_id(root);
                return Err(e);
            }
        }
        log::debug!(
            "document built: {} nodes{}",
            store.live_nodes(),
            match &options.origin {
                Some(origin) => format!(" from {}", origin),
                None => String::new(),
            }
        );
        Ok(Self {
            store,
            root,
            resolved: options.resolve,
        })
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.store.release_id(self.root);
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Build the next document of `source`.
///
/// Stream and document start events are skipped; the document end event
/// that follows the root node is left in the source. A terminator where the
/// root node was expected is reported as [`Error::UnexpectedEvent`].
pub fn parse_document<S: EventSource + ?Sized>(
    source: &mut S,
    options: &ParseOptions,
) -> Result<Document, Error> {
    let mut store = NodeStore::with_eraser(options.eraser.clone());
    let step = Translator::new(source, &mut store, options.origin.clone(), options.eraser.clone())
        .parse_node()?;
    match step {
        Step::Node(root) => Document::build(store, root, options),
        Step::End(kind, position) => Err(Error::UnexpectedEvent { kind, position }),
    }
}

/// Iterator over the documents of one event stream.
///
/// Stops after the stream end event, or after the first error.
pub struct Loader<S> {
    source: S,
    options: ParseOptions,
    finished: bool,
}

impl<S: EventSource> Loader<S> {
    pub fn new(source: S, options: ParseOptions) -> Self {
        Self {
            source,
            options,
            finished: false,
        }
    }

    /// Next document, or `None` once the stream has ended.
    pub fn next_document(&mut self) -> Result<Option<Document>, Error> {
        if self.finished {
            return Ok(None);
        }
        let result = self.load_next();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn load_next(&mut self) -> Result<Option<Document>, Error> {
        let mut store = NodeStore::with_eraser(self.options.eraser.clone());
        let step = Translator::new(
            &mut self.source,
            &mut store,
            self.options.origin.clone(),
            self.options.eraser.clone(),
        )
        .parse_node()?;
        let root = match step {
            Step::Node(root) => root,
            Step::End(EventKind::StreamEnd, _) => return Ok(None),
            Step::End(kind, position) => return Err(Error::UnexpectedEvent { kind, position }),
        };

        match self.source.next_event() {
            Ok(marked) if marked.event == Event::DocumentEnd => {}
            Ok(marked) => {
                store.release_id(root);
                return Err(Error::UnexpectedEvent {
                    kind: marked.event.kind(),
                    position: marked.position,
                });
            }
            Err(e) => {
                store.release_id(root);
                return Err(e.into());
            }
        }

        Document::build(store, root, &self.options).map(Some)
    }
}

impl<S: EventSource> Iterator for Loader<S> {
    type Item = Result<Document, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_document().transpose()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
