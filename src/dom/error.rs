//! Error types for document building and resolution.

use crate::event::{EventKind, Position, SourceError};
use std::fmt;

/// Error type for a document parse.
///
/// Every variant is terminal: a failed parse never yields a partial tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The event source failed
    Source(SourceError),
    /// A terminator event was seen where a node was required
    UnexpectedEvent { kind: EventKind, position: Position },
    /// No node in the document carries the referenced anchor
    UnresolvedAlias { name: String, position: Position },
    /// Value of a merge key is neither a mapping nor a sequence of mappings
    InvalidMergeSource { position: Position },
}

impl Error {
    /// Position of the offending token, when known.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::Source(e) => e.position,
            Error::UnexpectedEvent { position, .. }
            | Error::UnresolvedAlias { position, .. }
            | Error::InvalidMergeSource { position } => Some(*position),
        }
    }
}

impl std::error::Error for Error {}

impl From<SourceError> for Error {
    fn from(e: SourceError) -> Self {
        Error::Source(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Source(e) => write!(f, "{}", e),
            Error::UnexpectedEvent { kind, position } => {
                write!(f, "{}: no value, saw unexpected {} event", position, kind)
            }
            Error::UnresolvedAlias { name, position } => {
                write!(f, "{}: could not resolve the alias '{}'", position, name)
            }
            Error::InvalidMergeSource { position } => write!(
                f,
                "{}: value of the merge key must be a mapping or a sequence of mappings",
                position
            ),
        }
    }
}
