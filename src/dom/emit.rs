//! Block-style YAML output of a document tree.
//!
//! A node carrying an anchor is written with `&anchor` the first time it is
//! met and as `*anchor` afterwards, so shared nodes of a resolved tree are
//! printed once. Unresolved alias nodes print as `*name`. Shared nodes
//! without an anchor (entries spliced in by a merge key) are written in full
//! at every place they appear.

use super::node::{Content, NodeId};
use super::store::NodeRef;
use std::collections::HashSet;

/// Serialize `node` and everything below it to block YAML.
pub fn emit(node: NodeRef<'_>) -> String {
    let mut emitter = Emitter::default();
    emitter.root(node);
    emitter.out
}

#[derive(Default)]
struct Emitter {
    out: String,
    /// Anchored nodes already written.
    emitted: HashSet<NodeId>,
    /// Collections currently being written, for cycle detection.
    active: Vec<NodeId>,
}

impl Emitter {
    fn root(&mut self, node: NodeRef<'_>) {
        if let Some(text) = self.inline(node) {
            self.out.push_str(&text);
            self.out.push('\n');
            return;
        }
        if let Some(anchor) = self.anchor(node) {
            self.out.push_str(&anchor);
            self.out.push('\n');
        }
        self.body(node, 0, false);
    }

    /// Single-line rendering, or `None` for a collection to write as a block.
    fn inline(&mut self, node: NodeRef<'_>) -> Option<String> {
        if let Content::Alias(name) = node.content() {
            return Some(format!("*{}", name));
        }
        if let Some(anchor) = node.anchor() {
            if self.emitted.contains(&node.id()) {
                return Some(format!("*{}", anchor));
            }
        }
        if self.active.contains(&node.id()) {
            log::warn!("node {} contains itself; writing a placeholder", node.id());
            return Some(quote("<recursive>"));
        }
        let text = match node.content() {
            Content::Scalar(text) => scalar(text),
            Content::Sequence(elements) if elements.is_empty() => "[]".to_string(),
            Content::Mapping(entries) if entries.is_empty() => "{}".to_string(),
            _ => return None,
        };
        Some(match self.anchor(node) {
            Some(anchor) => format!("{} {}", anchor, text),
            None => text,
        })
    }

    /// `&anchor` of a node about to be written, marking it as emitted.
    fn anchor(&mut self, node: NodeRef<'_>) -> Option<String> {
        let anchor = node.anchor()?;
        self.emitted.insert(node.id());
        Some(format!("&{}", anchor))
    }

    fn body(&mut self, node: NodeRef<'_>, indent: usize, first_inline: bool) {
        self.active.push(node.id());
        if node.is_mapping() {
            self.mapping(node, indent, first_inline);
        } else {
            self.sequence(node, indent, first_inline);
        }
        self.active.pop();
    }

    fn mapping(&mut self, node: NodeRef<'_>, indent: usize, first_inline: bool) {
        for (i, (key, value)) in node.entries().enumerate() {
            if i > 0 || !first_inline {
                self.pad(indent);
            }
            let key = match self.inline(key) {
                Some(text) => text,
                None => self.flow(key),
            };
            self.out.push_str(&key);
            self.out.push(':');
            self.value(value, indent + 2);
        }
    }

    fn sequence(&mut self, node: NodeRef<'_>, indent: usize, first_inline: bool) {
        for (i, item) in node.elements().enumerate() {
            if i > 0 || !first_inline {
                self.pad(indent);
            }
            self.out.push('-');
            self.item(item, indent + 2);
        }
    }

    /// Write a mapping value, after its `key:`.
    fn value(&mut self, node: NodeRef<'_>, indent: usize) {
        if let Some(text) = self.inline(node) {
            self.out.push(' ');
            self.out.push_str(&text);
            self.out.push('\n');
            return;
        }
        if let Some(anchor) = self.anchor(node) {
            self.out.push(' ');
            self.out.push_str(&anchor);
        }
        self.out.push('\n');
        self.body(node, indent, false);
    }

    /// Write a sequence item, after its `-`.
    fn item(&mut self, node: NodeRef<'_>, indent: usize) {
        self.out.push(' ');
        if let Some(text) = self.inline(node) {
            self.out.push_str(&text);
            self.out.push('\n');
            return;
        }
        match self.anchor(node) {
            Some(anchor) => {
                self.out.push_str(&anchor);
                self.out.push('\n');
                self.body(node, indent, false);
            }
            None => self.body(node, indent, true),
        }
    }

    /// Flow rendering, used for collection keys.
    fn flow(&mut self, node: NodeRef<'_>) -> String {
        if let Some(text) = self.inline(node) {
            return text;
        }
        let mut text = self.anchor(node).map(|a| a + " ").unwrap_or_default();
        self.active.push(node.id());
        if node.is_mapping() {
            let entries: Vec<String> = node
                .entries()
                .map(|(k, v)| format!("{}: {}", self.flow(k), self.flow(v)))
                .collect();
            text.push_str(&format!("{{{}}}", entries.join(", ")));
        } else {
            let items: Vec<String> = node.elements().map(|n| self.flow(n)).collect();
            text.push_str(&format!("[{}]", items.join(", ")));
        }
        self.active.pop();
        text
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }
}

// =============================================================================
// Scalars
// =============================================================================

/// Plain rendering when it reads back as the same text, quoted otherwise.
fn scalar(text: &str) -> String {
    if is_plain(text) {
        text.to_string()
    } else {
        quote(text)
    }
}

fn is_plain(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    if "[]{},#&*!|>'\"%@`".contains(first) || first.is_whitespace() {
        return false;
    }
    if "-?:".contains(first) && text.chars().nth(1).map_or(true, char::is_whitespace) {
        return false;
    }
    if text.ends_with(char::is_whitespace) || text.ends_with(':') {
        return false;
    }
    !text.contains(": ")
        && !text.contains(" #")
        && !text.chars().any(|c| c.is_control())
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
