//! Event-to-tree translation.
//!
//! Builds the raw tree of one document by recursive descent over the event
//! stream. Aliases become placeholder nodes; nothing is resolved here.

use super::error::Error;
use super::node::{Content, Link, NodeId};
use super::store::NodeStore;
use crate::erase::Eraser;
use crate::event::{Event, EventKind, EventSource, MarkedEvent, Position};
use std::rc::Rc;

/// Outcome of one element-rule call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A node was built
    Node(NodeId),
    /// A terminator event was seen instead of a node
    End(EventKind, Position),
}

/// Pulls events from a source and allocates the nodes they describe.
pub struct Translator<'a, S: EventSource + ?Sized> {
    source: &'a mut S,
    store: &'a mut NodeStore,
    origin: Option<Rc<str>>,
    eraser: Option<Eraser>,
}

impl<'a, S: EventSource + ?Sized> Translator<'a, S> {
    pub fn new(
        source: &'a mut S,
        store: &'a mut NodeStore,
        origin: Option<Rc<str>>,
        eraser: Option<Eraser>,
    ) -> Self {
        Self {
            source,
            store,
            origin,
            eraser,
        }
    }

    /// Element rule: build the next node, or report the terminator seen.
    ///
    /// Stream and document start events are skipped. On error, every node
    /// allocated by this call has already been released.
    pub fn parse_node(&mut self) -> Result<Step, Error> {
        let MarkedEvent { event, position } = loop {
            let marked = self.source.next_event()?;
            log::trace!("event {} at {}", marked.event.kind(), marked.position);
            if !matches!(marked.event, Event::StreamStart | Event::DocumentStart) {
                break marked;
            }
        };

        let id = match event {
            Event::Scalar { value, anchor } => {
                let text = match &self.eraser {
                    Some(eraser) => {
                        let text = value.clone();
                        eraser.erase_string(value);
                        text
                    }
                    None => value,
                };
                self.allocate(Content::Scalar(text), anchor, position)
            }
            Event::Alias { name } => self.allocate(Content::Alias(name), None, position),
            Event::SequenceStart { anchor } => self.parse_sequence(anchor, position)?,
            Event::MappingStart { anchor } => self.parse_mapping(anchor, position)?,
            other => return Ok(Step::End(other.kind(), position)),
        };
        Ok(Step::Node(id))
    }

    fn allocate(&mut self, content: Content, anchor: Option<String>, position: Position) -> NodeId {
        self.store
            .allocate(content, anchor, position, self.origin.clone())
    }

    fn parse_sequence(
        &mut self,
        anchor: Option<String>,
        position: Position,
    ) -> Result<NodeId, Error> {
        let seq = self.allocate(Content::Sequence(Vec::new()), anchor, position);
        loop {
            match self.parse_node() {
                Ok(Step::Node(element)) => self.store.push_element(seq, Link::Owned(element)),
                Ok(Step::End(EventKind::SequenceEnd, _)) => return Ok(seq),
                Ok(Step::End(kind, position)) => {
                    return self.abort(seq, Error::UnexpectedEvent { kind, position })
                }
                Err(e) => return self.abort(seq, e),
            }
        }
    }

    fn parse_mapping(
        &mut self,
        anchor: Option<String>,
        position: Position,
    ) -> Result<NodeId, Error> {
        let map = self.allocate(Content::Mapping(Vec::new()), anchor, position);
        loop {
            let key = match self.parse_node() {
                Ok(Step::Node(key)) => key,
                Ok(Step::End(EventKind::MappingEnd, _)) => return Ok(map),
                Ok(Step::End(kind, position)) => {
                    return self.abort(map, Error::UnexpectedEvent { kind, position })
                }
                Err(e) => return self.abort(map, e),
            };
            let value = match self.parse_node() {
                Ok(Step::Node(value)) => value,
                Ok(Step::End(kind, position)) => {
                    self.store.release(Link::Owned(key));
                    return self.abort(map, Error::UnexpectedEvent { kind, position });
                }
                Err(e) => {
                    self.store.release(Link::Owned(key));
                    return self.abort(map, e);
                }
            };
            self.store
                .push_entry(map, Link::Owned(key), Link::Owned(value));
        }
    }

    fn abort(&mut self, partial: NodeId, error: Error) -> Result<NodeId, Error> {
        log::debug!("discarding partial node {}: {}", partial, error);
        self.store.release(Link::Owned(partial));
        Err(error)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
