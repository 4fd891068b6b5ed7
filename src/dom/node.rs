//! Node records and the links between them.

use crate::event::Position;
use std::fmt;
use std::rc::Rc;

/// Stable address of a node inside its [`NodeStore`](super::NodeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A stored reference to a node, accounting for exactly one share.
///
/// `Owned` links are created while translating events and form the
/// structural tree. `Shared` links come from retaining an existing node,
/// when an alias is resolved or a merged entry is copied. Links are not
/// `Clone`: duplicating a reference must go through the store's `retain`.
#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Link {
    Owned(NodeId),
    Shared(NodeId),
}

impl Link {
    pub fn id(&self) -> NodeId {
        match self {
            Link::Owned(id) | Link::Shared(id) => *id,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Link::Shared(_))
    }
}

/// One key/value pair of a mapping.
#[derive(Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Link,
    pub value: Link,
}

/// Payload of a node.
#[derive(Debug, PartialEq, Eq)]
pub enum Content {
    Scalar(String),
    Sequence(Vec<Link>),
    Mapping(Vec<Entry>),
    /// Unresolved alias, holding the anchor name it refers to.
    Alias(String),
}

/// Shape of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scalar,
    Sequence,
    Mapping,
    Alias,
}

impl Content {
    pub fn kind(&self) -> NodeKind {
        match self {
            Content::Scalar(_) => NodeKind::Scalar,
            Content::Sequence(_) => NodeKind::Sequence,
            Content::Mapping(_) => NodeKind::Mapping,
            Content::Alias(_) => NodeKind::Alias,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
            NodeKind::Alias => "alias",
        };
        write!(f, "{}", name)
    }
}

/// A node record as held by the store.
#[derive(Debug)]
pub struct Node {
    pub(crate) content: Content,
    pub(crate) anchor: Option<String>,
    pub(crate) position: Position,
    pub(crate) origin: Option<Rc<str>>,
    pub(crate) share_count: usize,
}

impl Node {
    pub(crate) fn new(
        content: Content,
        anchor: Option<String>,
        position: Position,
        origin: Option<Rc<str>>,
    ) -> Self {
        Self {
            content,
            anchor,
            position,
            origin,
            share_count: 1,
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn kind(&self) -> NodeKind {
        self.content.kind()
    }
}
