//! Arena of reference-counted nodes.
//!
//! Nodes live in slots addressed by [`NodeId`]. Each slot keeps a share
//! count equal to the number of [`Link`]s pointing at it (plus the document
//! root handle). Releasing the last share frees the slot and releases the
//! node's children in turn. Freed slots are never reused, so a stale
//! `NodeId` can not silently alias a newer node.

use super::node::{Content, Entry, Link, Node, NodeId, NodeKind};
use crate::erase::Eraser;
use crate::event::Position;
use std::rc::Rc;

/// Owner of every node of one or more documents.
///
/// Dropping the store frees every remaining slot, including nodes kept alive
/// only by alias cycles; their scalar text still goes through the eraser.
#[derive(Debug, Default)]
pub struct NodeStore {
    slots: Vec<Option<Node>>,
    live: usize,
    eraser: Option<Eraser>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose freed scalar buffers are passed to `eraser` first.
    pub fn with_eraser(eraser: Option<Eraser>) -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            eraser,
        }
    }

    // =========================================================================
    // Allocation and sharing
    // =========================================================================

    /// Allocate a node with a share count of 1.
    pub fn allocate(
        &mut self,
        content: Content,
        anchor: Option<String>,
        position: Position,
        origin: Option<Rc<str>>,
    ) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots
            .push(Some(Node::new(content, anchor, position, origin)));
        self.live += 1;
        id
    }

    /// Take one more share of `id`, returned as a shared link.
    pub fn retain(&mut self, id: NodeId) -> Link {
        self.node_mut(id).share_count += 1;
        Link::Shared(id)
    }

    /// Drop one share of the node behind `link`.
    ///
    /// When the count reaches zero the slot is freed and all of the node's
    /// own links are released as well.
    pub fn release(&mut self, link: Link) {
        self.release_id(link.id());
    }

    /// Release the share held by a root handle.
    pub(crate) fn release_id(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = self.node_mut(id);
            node.share_count -= 1;
            if node.share_count > 0 {
                continue;
            }
            let node = match self.slots[id.0].take() {
                Some(node) => node,
                None => unreachable!(),
            };
            self.live -= 1;
            log::trace!("freed node {} ({})", id, node.kind());
            match node.content {
                Content::Scalar(text) | Content::Alias(text) => {
                    if let Some(eraser) = &self.eraser {
                        eraser.erase_string(text);
                    }
                }
                Content::Sequence(elements) => {
                    pending.extend(elements.iter().map(Link::id));
                }
                Content::Mapping(entries) => {
                    for entry in entries.iter().rev() {
                        pending.push(entry.value.id());
                        pending.push(entry.key.id());
                    }
                }
            }
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    pub fn push_element(&mut self, seq: NodeId, element: Link) {
        match &mut self.node_mut(seq).content {
            Content::Sequence(elements) => elements.push(element),
            other => panic!("push_element on a {} node", other.kind()),
        }
    }

    pub fn push_entry(&mut self, map: NodeId, key: Link, value: Link) {
        self.entries_mut(map).push(Entry { key, value });
    }

    pub fn insert_entry(&mut self, map: NodeId, index: usize, entry: Entry) {
        self.entries_mut(map).insert(index, entry);
    }

    /// Detach an entry, keeping the relative order of the others.
    pub fn remove_entry(&mut self, map: NodeId, index: usize) -> Entry {
        self.entries_mut(map).remove(index)
    }

    /// Swap the element at `index` for `link`, returning the previous one.
    pub fn replace_element(&mut self, seq: NodeId, index: usize, link: Link) -> Link {
        match &mut self.node_mut(seq).content {
            Content::Sequence(elements) => std::mem::replace(&mut elements[index], link),
            other => panic!("replace_element on a {} node", other.kind()),
        }
    }

    pub fn replace_key(&mut self, map: NodeId, index: usize, link: Link) -> Link {
        std::mem::replace(&mut self.entries_mut(map)[index].key, link)
    }

    pub fn replace_value(&mut self, map: NodeId, index: usize, link: Link) -> Link {
        std::mem::replace(&mut self.entries_mut(map)[index].value, link)
    }

    fn entries_mut(&mut self, map: NodeId) -> &mut Vec<Entry> {
        match &mut self.node_mut(map).content {
            Content::Mapping(entries) => entries,
            other => panic!("mapping operation on a {} node", other.kind()),
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Number of allocated, not yet freed nodes.
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.0), Some(Some(_)))
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.contains(id).then_some(NodeRef { store: self, id })
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("access to released node {}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("access to released node {}", id),
        }
    }

    pub(crate) fn view(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { store: self, id }
    }
}

impl Drop for NodeStore {
    fn drop(&mut self) {
        let Some(eraser) = &self.eraser else {
            return;
        };
        for node in self.slots.drain(..).flatten() {
            if let Content::Scalar(text) | Content::Alias(text) = node.content {
                eraser.erase_string(text);
            }
        }
    }
}

// =============================================================================
// NodeRef
// =============================================================================

/// Read-only view of a live node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    store: &'a NodeStore,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        self.store.node(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind()
    }

    pub fn content(&self) -> &'a Content {
        &self.node().content
    }

    pub fn anchor(&self) -> Option<&'a str> {
        self.node().anchor.as_deref()
    }

    pub fn position(&self) -> Position {
        self.node().position
    }

    pub fn origin(&self) -> Option<&'a str> {
        self.node().origin.as_deref()
    }

    pub fn share_count(&self) -> usize {
        self.node().share_count
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == NodeKind::Scalar
    }

    pub fn is_sequence(&self) -> bool {
        self.kind() == NodeKind::Sequence
    }

    pub fn is_mapping(&self) -> bool {
        self.kind() == NodeKind::Mapping
    }

    /// Text of a scalar node.
    pub fn as_str(&self) -> Option<&'a str> {
        match self.content() {
            Content::Scalar(text) => Some(text),
            _ => None,
        }
    }

    /// Anchor name referenced by an unresolved alias node.
    pub fn alias_name(&self) -> Option<&'a str> {
        match self.content() {
            Content::Alias(name) => Some(name),
            _ => None,
        }
    }

    /// Links of a sequence (empty for other kinds).
    pub fn element_links(&self) -> &'a [Link] {
        match self.content() {
            Content::Sequence(elements) => elements,
            _ => &[],
        }
    }

    /// Entries of a mapping (empty for other kinds).
    pub fn entry_links(&self) -> &'a [Entry] {
        match self.content() {
            Content::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let store = self.store;
        self.element_links()
            .iter()
            .map(move |link| store.view(link.id()))
    }

    pub fn entries(&self) -> impl Iterator<Item = (NodeRef<'a>, NodeRef<'a>)> + 'a {
        let store = self.store;
        self.entry_links()
            .iter()
            .map(move |e| (store.view(e.key.id()), store.view(e.value.id())))
    }

    /// Number of elements or entries; 0 for scalars and aliases.
    pub fn len(&self) -> usize {
        match self.content() {
            Content::Sequence(elements) => elements.len(),
            Content::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of the first entry whose scalar key equals `key`.
    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        self.entries()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Element of a sequence by index.
    pub fn at(&self, index: usize) -> Option<NodeRef<'a>> {
        self.element_links()
            .get(index)
            .map(|link| self.store.view(link.id()))
    }

    /// Scalar keys of a mapping, in entry order.
    pub fn keys(&self) -> Vec<&'a str> {
        self.entries().filter_map(|(k, _)| k.as_str()).collect()
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("position", &self.position())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn pos() -> Position {
        Position::new(1, 1)
    }

    fn scalar(store: &mut NodeStore, text: &str) -> Link {
        Link::Owned(store.allocate(Content::Scalar(text.to_string()), None, pos(), None))
    }

    #[test]
    fn test_allocate_starts_with_one_share() {
        let mut store = NodeStore::new();
        let id = store.allocate(Content::Sequence(Vec::new()), None, pos(), None);
        let node = store.get(id).unwrap();
        assert_eq!(node.share_count(), 1);
        assert!(node.is_empty());
        assert_eq!(store.live_nodes(), 1);
    }

    #[test]
    fn test_release_frees_children() {
        let mut store = NodeStore::new();
        let map = store.allocate(Content::Mapping(Vec::new()), None, pos(), None);
        let key = scalar(&mut store, "a");
        let value = scalar(&mut store, "1");
        store.push_entry(map, key, value);
        assert_eq!(store.live_nodes(), 3);

        store.release(Link::Owned(map));
        assert_eq!(store.live_nodes(), 0);
        assert!(!store.contains(map));
    }

    #[test]
    fn test_retained_child_survives_parent() {
        let mut store = NodeStore::new();
        let seq = store.allocate(Content::Sequence(Vec::new()), None, pos(), None);
        let child = scalar(&mut store, "kept");
        let child_id = child.id();
        store.push_element(seq, child);

        let extra = store.retain(child_id);
        assert!(extra.is_shared());
        assert_eq!(store.get(child_id).unwrap().share_count(), 2);

        store.release(Link::Owned(seq));
        assert_eq!(store.live_nodes(), 1);
        assert_eq!(store.get(child_id).unwrap().as_str(), Some("kept"));

        store.release(extra);
        assert_eq!(store.live_nodes(), 0);
    }

    #[test]
    fn test_freed_scalars_are_erased() {
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let eraser = Eraser::new(move |buf: &mut [u8]| {
            sink.borrow_mut().push(String::from_utf8_lossy(buf).into_owned());
        });
        let mut store = NodeStore::with_eraser(Some(eraser));
        let link = scalar(&mut store, "token");
        store.release(link);
        assert_eq!(seen.borrow().as_slice(), ["token".to_string()]);
    }

    #[test]
    fn test_insert_and_remove_entry_keep_order() {
        let mut store = NodeStore::new();
        let map = store.allocate(Content::Mapping(Vec::new()), None, pos(), None);
        for name in ["a", "b", "c"] {
            let key = scalar(&mut store, name);
            let value = scalar(&mut store, "v");
            store.push_entry(map, key, value);
        }
        let removed = store.remove_entry(map, 1);
        assert_eq!(store.get(map).unwrap().keys(), vec!["a", "c"]);

        store.insert_entry(map, 0, removed);
        assert_eq!(store.get(map).unwrap().keys(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_get_returns_first_matching_key() {
        let mut store = NodeStore::new();
        let map = store.allocate(Content::Mapping(Vec::new()), None, pos(), None);
        for value in ["first", "second"] {
            let key = scalar(&mut store, "dup");
            let value = scalar(&mut store, value);
            store.push_entry(map, key, value);
        }
        let node = store.get(map).unwrap();
        assert_eq!(node.get("dup").unwrap().as_str(), Some("first"));
        assert!(node.get("missing").is_none());
    }
}
