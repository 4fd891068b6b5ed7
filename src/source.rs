//! Event source over YAML text, backed by the `yaml-rust2` pull parser.
//!
//! `yaml-rust2` identifies anchors by a numeric id assigned at definition
//! time, and rejects aliases to anchors not yet defined. Anchor and alias
//! names produced here are those ids in decimal, which is enough for
//! resolution since each definition gets its own id.

use crate::event::{Event, EventSource, MarkedEvent, Position, SourceError};
use yaml_rust2::parser::{Event as YamlEvent, Parser};
use yaml_rust2::scanner::{Marker, ScanError};

type NextToken<'a> = Box<dyn FnMut() -> Result<(YamlEvent, Marker), ScanError> + 'a>;

/// Structural events of a YAML text.
pub struct TextSource<'a> {
    next: NextToken<'a>,
    done: bool,
}

impl<'a> TextSource<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut parser = Parser::new_from_str(text);
        Self {
            next: Box::new(move || parser.next_token()),
            done: false,
        }
    }
}

fn position(marker: &Marker) -> Position {
    Position::new(marker.line(), marker.col() + 1)
}

fn anchor_name(id: usize) -> Option<String> {
    (id != 0).then(|| id.to_string())
}

impl EventSource for TextSource<'_> {
    fn next_event(&mut self) -> Result<MarkedEvent, SourceError> {
        if self.done {
            return Err(SourceError::new("read past the end of the stream", None));
        }
        loop {
            let (event, marker) = (self.next)()
                .map_err(|e| SourceError::new(e.info(), Some(position(e.marker()))))?;
            let event = match event {
                YamlEvent::Nothing => continue,
                YamlEvent::StreamStart => Event::StreamStart,
                YamlEvent::StreamEnd => {
                    self.done = true;
                    Event::StreamEnd
                }
                YamlEvent::DocumentStart => Event::DocumentStart,
                YamlEvent::DocumentEnd => Event::DocumentEnd,
                YamlEvent::Scalar(value, _style, anchor, _tag) => Event::Scalar {
                    value,
                    anchor: anchor_name(anchor),
                },
                YamlEvent::SequenceStart(anchor, _tag) => Event::SequenceStart {
                    anchor: anchor_name(anchor),
                },
                YamlEvent::SequenceEnd => Event::SequenceEnd,
                YamlEvent::MappingStart(anchor, _tag) => Event::MappingStart {
                    anchor: anchor_name(anchor),
                },
                YamlEvent::MappingEnd => Event::MappingEnd,
                YamlEvent::Alias(anchor) => Event::Alias {
                    name: anchor.to_string(),
                },
            };
            return Ok(MarkedEvent::new(event, position(&marker)));
        }
    }
}
