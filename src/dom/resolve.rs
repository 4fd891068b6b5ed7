//! Alias and merge-key resolution.
//!
//! Runs once over a fully translated document. Alias placeholders are
//! replaced by shared links to the anchored node, and `<<` entries are
//! expanded by splicing the entries of the referenced mapping(s) into the
//! receiving mapping. Mappings are walked from their last entry to their
//! first: entries removed or inserted at the cursor never shift the indices
//! still to be visited.
//!
//! The walk follows owned links only. A node reached through a shared link is
//! resolved at its owning position, or on demand when it is used as a merge
//! source.

use super::error::Error;
use super::node::{Content, Entry, Link, NodeId, NodeKind};
use super::store::NodeStore;
use crate::event::Position;
use std::collections::HashSet;

/// Reserved key whose value is merged into the enclosing mapping.
pub const MERGE_KEY: &str = "<<";

/// Resolve aliases and merge keys of the tree rooted at `root`.
///
/// On failure the tree is left consistent (every link still accounts for
/// exactly one share) and the caller releases it through `root`.
pub fn resolve(store: &mut NodeStore, root: NodeId) -> Result<(), Error> {
    Resolver {
        store,
        root,
        visited: HashSet::new(),
    }
    .resolve_node(root)
}

struct Resolver<'a> {
    store: &'a mut NodeStore,
    root: NodeId,
    /// Nodes already resolved or being resolved up the stack.
    visited: HashSet<NodeId>,
}

impl Resolver<'_> {
    fn resolve_node(&mut self, id: NodeId) -> Result<(), Error> {
        if !self.visited.insert(id) {
            return Ok(());
        }
        match self.store.view(id).kind() {
            NodeKind::Scalar | NodeKind::Alias => Ok(()),
            NodeKind::Sequence => self.resolve_sequence(id),
            NodeKind::Mapping => self.resolve_mapping(id),
        }
    }

    /// Resolve a child reached through an owned link.
    ///
    /// Returns the link that must replace it when the child is an alias.
    fn resolve_child(&mut self, id: NodeId) -> Result<Option<Link>, Error> {
        let node = self.store.view(id);
        let Some(name) = node.alias_name() else {
            self.resolve_node(id)?;
            return Ok(None);
        };
        match self.find_anchor(name) {
            Some(target) => {
                log::debug!("alias '{}' at {} resolved to node {}", name, node.position(), target);
                Ok(Some(self.store.retain(target)))
            }
            None => Err(Error::UnresolvedAlias {
                name: name.to_string(),
                position: node.position(),
            }),
        }
    }

    fn resolve_sequence(&mut self, seq: NodeId) -> Result<(), Error> {
        let len = self.store.view(seq).len();
        for index in 0..len {
            let link = &self.store.view(seq).element_links()[index];
            if link.is_shared() {
                continue;
            }
            let child = link.id();
            if let Some(target) = self.resolve_child(child)? {
                let placeholder = self.store.replace_element(seq, index, target);
                self.store.release(placeholder);
            }
        }
        Ok(())
    }

    fn resolve_mapping(&mut self, map: NodeId) -> Result<(), Error> {
        let mut index = self.store.view(map).len();
        while index > 0 {
            index -= 1;

            let value = &self.store.view(map).entry_links()[index].value;
            if !value.is_shared() {
                let value = value.id();
                if let Some(target) = self.resolve_child(value)? {
                    let placeholder = self.store.replace_value(map, index, target);
                    self.store.release(placeholder);
                }
            }

            let key = &self.store.view(map).entry_links()[index].key;
            let key_node = self.store.view(key.id());
            if key_node.as_str() == Some(MERGE_KEY) {
                self.expand_merge(map, index)?;
            } else if !key.is_shared() {
                let key = key.id();
                if let Some(target) = self.resolve_child(key)? {
                    let placeholder = self.store.replace_key(map, index, target);
                    self.store.release(placeholder);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Merge keys
    // =========================================================================

    /// Detach the `<<` entry at `slot` and splice its source(s) in its place.
    fn expand_merge(&mut self, map: NodeId, slot: usize) -> Result<(), Error> {
        let Entry { key, value } = self.store.remove_entry(map, slot);
        let position = self.store.view(key.id()).position();
        let result = self.merge_value(map, slot, value.id(), position);
        self.store.release(key);
        self.store.release(value);
        result
    }

    fn merge_value(
        &mut self,
        map: NodeId,
        slot: usize,
        source: NodeId,
        position: Position,
    ) -> Result<(), Error> {
        match self.store.view(source).kind() {
            NodeKind::Sequence => {
                let sources: Vec<NodeId> = self
                    .store
                    .view(source)
                    .element_links()
                    .iter()
                    .map(Link::id)
                    .collect();
                let mut cursor = slot;
                for source in sources {
                    cursor += self.merge_mapping(map, cursor, source, position)?;
                }
                Ok(())
            }
            NodeKind::Mapping => self.merge_mapping(map, slot, source, position).map(|_| ()),
            _ => Err(Error::InvalidMergeSource { position }),
        }
    }

    /// Insert the entries of `source` at `at`, skipping scalar keys the
    /// receiving mapping already has. Returns the number of entries inserted.
    fn merge_mapping(
        &mut self,
        map: NodeId,
        at: usize,
        source: NodeId,
        position: Position,
    ) -> Result<usize, Error> {
        if self.store.view(source).kind() != NodeKind::Mapping {
            return Err(Error::InvalidMergeSource { position });
        }
        // a source shared from elsewhere may still hold aliases or merge keys
        self.resolve_node(source)?;

        let pairs: Vec<(NodeId, NodeId)> = self
            .store
            .view(source)
            .entry_links()
            .iter()
            .map(|e| (e.key.id(), e.value.id()))
            .collect();

        let mut inserted = 0;
        for (key, value) in pairs.into_iter().rev() {
            let taken = match self.store.view(key).as_str() {
                Some(text) => self.store.view(map).get(text).is_some(),
                None => false,
            };
            if taken {
                log::trace!("merge into node {}: key {} already present", map, key);
                continue;
            }
            let key = self.store.retain(key);
            let value = self.store.retain(value);
            self.store.insert_entry(map, at, Entry { key, value });
            inserted += 1;
        }
        log::debug!(
            "merged {} entries of node {} into node {}",
            inserted,
            source,
            map
        );
        Ok(inserted)
    }

    // =========================================================================
    // Anchors
    // =========================================================================

    /// First node carrying `name` in a depth-first, pre-order walk of the
    /// whole document (mapping keys before their values).
    fn find_anchor(&self, name: &str) -> Option<NodeId> {
        let mut seen = HashSet::new();
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = self.store.view(id);
            if node.anchor() == Some(name) {
                return Some(id);
            }
            match node.content() {
                Content::Sequence(elements) => {
                    pending.extend(elements.iter().rev().map(Link::id));
                }
                Content::Mapping(entries) => {
                    for entry in entries.iter().rev() {
                        pending.push(entry.value.id());
                        pending.push(entry.key.id());
                    }
                }
                Content::Scalar(_) | Content::Alias(_) => {}
            }
        }
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::translate::{Step, Translator};
    use crate::event::{Event, EventQueue};

    fn build(body: Vec<Event>) -> (NodeStore, NodeId) {
        let mut queue = EventQueue::document(body);
        let mut store = NodeStore::new();
        let step = Translator::new(&mut queue, &mut store, None, None)
            .parse_node()
            .unwrap();
        match step {
            Step::Node(root) => (store, root),
            Step::End(kind, _) => panic!("no document, saw {}", kind),
        }
    }

    fn map_start() -> Event {
        Event::MappingStart { anchor: None }
    }

    fn anchored_map(name: &str) -> Event {
        Event::MappingStart {
            anchor: Some(name.to_string()),
        }
    }

    fn pairs(store: &NodeStore, id: NodeId) -> Vec<(String, String)> {
        store
            .get(id)
            .unwrap()
            .entries()
            .map(|(k, v)| {
                (
                    k.as_str().unwrap_or("?").to_string(),
                    v.as_str().unwrap_or("?").to_string(),
                )
            })
            .collect()
    }

    fn kv(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_tree_is_unchanged() {
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("a"),
            Event::scalar("1"),
            Event::scalar("b"),
            Event::SequenceStart { anchor: None },
            Event::scalar("x"),
            Event::SequenceEnd,
            Event::MappingEnd,
        ]);
        let before = store.live_nodes();
        resolve(&mut store, root).unwrap();
        assert_eq!(store.live_nodes(), before);
        let map = store.get(root).unwrap();
        assert_eq!(map.keys(), vec!["a", "b"]);
        assert!(map
            .entry_links()
            .iter()
            .all(|e| !e.key.is_shared() && !e.value.is_shared()));
    }

    #[test]
    fn test_alias_becomes_shared_link_to_anchor() {
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("base"),
            anchored_map("b"),
            Event::scalar("x"),
            Event::scalar("1"),
            Event::MappingEnd,
            Event::scalar("one"),
            Event::alias("b"),
            Event::scalar("two"),
            Event::alias("b"),
            Event::MappingEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let map = store.get(root).unwrap();
        let base = map.get("base").unwrap();
        assert_eq!(map.get("one").unwrap().id(), base.id());
        assert_eq!(map.get("two").unwrap().id(), base.id());
        assert_eq!(base.share_count(), 3);
        assert!(map.entry_links()[1].value.is_shared());
        assert!(!map.entry_links()[0].value.is_shared());
    }

    #[test]
    fn test_forward_alias_resolves() {
        let (mut store, root) = build(vec![
            Event::SequenceStart { anchor: None },
            Event::alias("later"),
            Event::Scalar {
                value: "v".to_string(),
                anchor: Some("later".to_string()),
            },
            Event::SequenceEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let seq = store.get(root).unwrap();
        assert_eq!(seq.at(0).unwrap().id(), seq.at(1).unwrap().id());
        assert_eq!(seq.at(0).unwrap().as_str(), Some("v"));
    }

    #[test]
    fn test_first_anchor_in_document_order_wins() {
        let (mut store, root) = build(vec![
            Event::SequenceStart { anchor: None },
            Event::Scalar {
                value: "first".to_string(),
                anchor: Some("dup".to_string()),
            },
            Event::Scalar {
                value: "second".to_string(),
                anchor: Some("dup".to_string()),
            },
            Event::alias("dup"),
            Event::SequenceEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let seq = store.get(root).unwrap();
        assert_eq!(seq.at(2).unwrap().as_str(), Some("first"));
    }

    #[test]
    fn test_unresolved_alias_reports_alias_position() {
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("a"),
            Event::alias("nowhere"),
            Event::MappingEnd,
        ]);
        let err = resolve(&mut store, root).unwrap_err();
        assert_eq!(
            err,
            Error::UnresolvedAlias {
                name: "nowhere".to_string(),
                position: Position::new(5, 1),
            }
        );
        store.release(Link::Owned(root));
        assert_eq!(store.live_nodes(), 0);
    }

    #[test]
    fn test_explicit_key_wins_over_merged() {
        // {a: 1, <<: {a: 2, b: 3}}
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("a"),
            Event::scalar("1"),
            Event::scalar("<<"),
            map_start(),
            Event::scalar("a"),
            Event::scalar("2"),
            Event::scalar("b"),
            Event::scalar("3"),
            Event::MappingEnd,
            Event::MappingEnd,
        ]);
        resolve(&mut store, root).unwrap();
        assert_eq!(pairs(&store, root), kv(&[("a", "1"), ("b", "3")]));
        // the inline source and its losing entry are gone
        assert_eq!(store.live_nodes(), 5);
    }

    #[test]
    fn test_earlier_merge_source_wins() {
        // {<<: [{a: 1}, {a: 2, b: 3}]}
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("<<"),
            Event::SequenceStart { anchor: None },
            map_start(),
            Event::scalar("a"),
            Event::scalar("1"),
            Event::MappingEnd,
            map_start(),
            Event::scalar("a"),
            Event::scalar("2"),
            Event::scalar("b"),
            Event::scalar("3"),
            Event::MappingEnd,
            Event::SequenceEnd,
            Event::MappingEnd,
        ]);
        resolve(&mut store, root).unwrap();
        assert_eq!(pairs(&store, root), kv(&[("a", "1"), ("b", "3")]));
    }

    #[test]
    fn test_merge_lands_at_merge_key_slot() {
        // {x: 0, <<: *m, y: 9} with m = {p: 1, q: 2}
        let (mut store, root) = build(vec![
            Event::SequenceStart { anchor: None },
            anchored_map("m"),
            Event::scalar("p"),
            Event::scalar("1"),
            Event::scalar("q"),
            Event::scalar("2"),
            Event::MappingEnd,
            map_start(),
            Event::scalar("x"),
            Event::scalar("0"),
            Event::scalar("<<"),
            Event::alias("m"),
            Event::scalar("y"),
            Event::scalar("9"),
            Event::MappingEnd,
            Event::SequenceEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let seq = store.get(root).unwrap();
        let source = seq.at(0).unwrap();
        let target = seq.at(1).unwrap();
        assert_eq!(
            pairs(&store, target.id()),
            kv(&[("x", "0"), ("p", "1"), ("q", "2"), ("y", "9")])
        );
        // merged entries share the source's key and value nodes
        let (p_key, p_value) = source.entries().next().unwrap();
        assert_eq!(p_key.share_count(), 2);
        assert_eq!(p_value.share_count(), 2);
        assert!(target.entry_links()[1].key.is_shared());
        // the alias link taken by `<<` was released with the merge entry
        assert_eq!(source.share_count(), 1);
    }

    #[test]
    fn test_chained_merge_through_alias() {
        // [&root {r: 1}, &mid {<<: *root, m: 2}, {<<: *mid, t: 3}]
        let (mut store, root) = build(vec![
            Event::SequenceStart { anchor: None },
            anchored_map("root"),
            Event::scalar("r"),
            Event::scalar("1"),
            Event::MappingEnd,
            anchored_map("mid"),
            Event::scalar("<<"),
            Event::alias("root"),
            Event::scalar("m"),
            Event::scalar("2"),
            Event::MappingEnd,
            map_start(),
            Event::scalar("<<"),
            Event::alias("mid"),
            Event::scalar("t"),
            Event::scalar("3"),
            Event::MappingEnd,
            Event::SequenceEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let last = store.get(root).unwrap().at(2).unwrap().id();
        assert_eq!(
            pairs(&store, last),
            kv(&[("r", "1"), ("m", "2"), ("t", "3")])
        );
    }

    #[test]
    fn test_scalar_merge_source_is_rejected() {
        let mut queue = EventQueue::new();
        let at = |line| Position::new(line, 3);
        queue
            .push_at(Event::StreamStart, at(1))
            .push_at(Event::DocumentStart, at(1))
            .push_at(map_start(), at(1))
            .push_at(Event::scalar("a"), at(1))
            .push_at(Event::scalar("1"), at(1))
            .push_at(Event::scalar("<<"), Position::new(2, 1))
            .push_at(Event::scalar("x"), Position::new(2, 5))
            .push_at(Event::MappingEnd, at(3));
        let mut store = NodeStore::new();
        let Step::Node(root) = Translator::new(&mut queue, &mut store, None, None)
            .parse_node()
            .unwrap()
        else {
            panic!("expected a node");
        };

        let err = resolve(&mut store, root).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMergeSource {
                position: Position::new(2, 1)
            }
        );
        // the sibling entry is intact and the merge entry is gone
        assert_eq!(pairs(&store, root), kv(&[("a", "1")]));
        store.release(Link::Owned(root));
        assert_eq!(store.live_nodes(), 0);
    }

    #[test]
    fn test_sequence_with_scalar_merge_source_is_rejected() {
        let (mut store, root) = build(vec![
            map_start(),
            Event::scalar("<<"),
            Event::SequenceStart { anchor: None },
            map_start(),
            Event::scalar("a"),
            Event::scalar("1"),
            Event::MappingEnd,
            Event::scalar("oops"),
            Event::SequenceEnd,
            Event::MappingEnd,
        ]);
        let err = resolve(&mut store, root).unwrap_err();
        assert!(matches!(err, Error::InvalidMergeSource { .. }));
        // entries merged before the failure stay consistently shared
        assert_eq!(pairs(&store, root), kv(&[("a", "1")]));
        store.release(Link::Owned(root));
        assert_eq!(store.live_nodes(), 0);
    }

    #[test]
    fn test_alias_to_ancestor_does_not_loop() {
        let (mut store, root) = build(vec![
            anchored_map("self"),
            Event::scalar("me"),
            Event::alias("self"),
            Event::MappingEnd,
        ]);
        resolve(&mut store, root).unwrap();
        let map = store.get(root).unwrap();
        assert_eq!(map.get("me").unwrap().id(), root);
        assert_eq!(map.share_count(), 2);
    }
}
