//! Structural parse events and the event source contract.
//!
//! The DOM builder never looks at YAML text. It pulls typed [`Event`]s, each
//! tagged with the [`Position`] of its first token, from an [`EventSource`].
//! Any tokenizer can feed it by implementing that trait; [`EventQueue`]
//! replays a prepared list of events and [`crate::source::TextSource`] wraps
//! the `yaml-rust2` pull parser.

use std::collections::VecDeque;
use std::fmt;

// =============================================================================
// Position
// =============================================================================

/// Source position of a token (1-based line and column).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// =============================================================================
// Events
// =============================================================================

/// One structural parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Scalar {
        value: String,
        anchor: Option<String>,
    },
    SequenceStart {
        anchor: Option<String>,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
    },
    MappingEnd,
    Alias {
        name: String,
    },
}

/// Discriminant of an [`Event`], kept in errors and terminator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    Scalar,
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
    Alias,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StreamStart => EventKind::StreamStart,
            Event::StreamEnd => EventKind::StreamEnd,
            Event::DocumentStart => EventKind::DocumentStart,
            Event::DocumentEnd => EventKind::DocumentEnd,
            Event::Scalar { .. } => EventKind::Scalar,
            Event::SequenceStart { .. } => EventKind::SequenceStart,
            Event::SequenceEnd => EventKind::SequenceEnd,
            Event::MappingStart { .. } => EventKind::MappingStart,
            Event::MappingEnd => EventKind::MappingEnd,
            Event::Alias { .. } => EventKind::Alias,
        }
    }

    /// Shorthand for an unanchored scalar event.
    pub fn scalar(value: &str) -> Self {
        Event::Scalar {
            value: value.to_string(),
            anchor: None,
        }
    }

    /// Shorthand for an alias event.
    pub fn alias(name: &str) -> Self {
        Event::Alias {
            name: name.to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::StreamStart => "stream-start",
            EventKind::StreamEnd => "stream-end",
            EventKind::DocumentStart => "document-start",
            EventKind::DocumentEnd => "document-end",
            EventKind::Scalar => "scalar",
            EventKind::SequenceStart => "sequence-start",
            EventKind::SequenceEnd => "sequence-end",
            EventKind::MappingStart => "mapping-start",
            EventKind::MappingEnd => "mapping-end",
            EventKind::Alias => "alias",
        };
        write!(f, "{}", name)
    }
}

/// An event together with the position of its first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedEvent {
    pub event: Event,
    pub position: Position,
}

impl MarkedEvent {
    pub fn new(event: Event, position: Position) -> Self {
        Self { event, position }
    }
}

// =============================================================================
// Event Source
// =============================================================================

/// Failure reported by an event source (malformed low-level syntax).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub message: String,
    pub position: Option<Position>,
}

impl SourceError {
    pub fn new(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SourceError {}

/// Producer of structural events, pulled one at a time.
///
/// Implementations hand over ownership of each event. The translator may
/// overwrite a scalar's buffer before dropping the event when erasure is
/// requested, so sources should not keep a second copy of scalar text.
pub trait EventSource {
    fn next_event(&mut self) -> Result<MarkedEvent, SourceError>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<MarkedEvent, SourceError> {
        (**self).next_event()
    }
}

/// Replays a prepared list of events.
///
/// Once exhausted it reports a [`SourceError`], like a tokenizer reading
/// past the end of its input.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    events: VecDeque<MarkedEvent>,
    line: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event at an explicit position.
    pub fn push_at(&mut self, event: Event, position: Position) -> &mut Self {
        self.events.push_back(MarkedEvent::new(event, position));
        self
    }

    /// Queue an event on the next line, column 1.
    pub fn push(&mut self, event: Event) -> &mut Self {
        self.line += 1;
        let pos = Position::new(self.line, 1);
        self.push_at(event, pos)
    }

    /// Queue a full document: stream and document boundaries around `body`.
    pub fn document(body: Vec<Event>) -> Self {
        let mut queue = Self::new();
        queue.push(Event::StreamStart).push(Event::DocumentStart);
        for event in body {
            queue.push(event);
        }
        queue.push(Event::DocumentEnd).push(Event::StreamEnd);
        queue
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for EventQueue {
    fn next_event(&mut self) -> Result<MarkedEvent, SourceError> {
        self.events
            .pop_front()
            .ok_or_else(|| SourceError::new("unexpected end of event stream", None))
    }
}

impl FromIterator<MarkedEvent> for EventQueue {
    fn from_iter<I: IntoIterator<Item = MarkedEvent>>(iter: I) -> Self {
        let events: VecDeque<MarkedEvent> = iter.into_iter().collect();
        let line = events.iter().map(|e| e.position.line).max().unwrap_or(0);
        Self { events, line }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
