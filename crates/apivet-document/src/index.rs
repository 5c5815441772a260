//! The identity-keyed location index.
//!
//! Every node a parser produces gets exactly one reachable
//! [`LocationRecord`] here: the document it belongs to, its JSON-Pointer
//! path, and (when the node came from text) its byte span. Values created
//! in memory get path-only records. The reference resolver registers fresh
//! records for substituted copies and evicts records of discarded `$ref`
//! subtrees, so the table never outlives the nodes it describes.

use crate::node::{Node, NodeId, Value};
use crate::pointer::Pointer;
use apivet_source_map::{FileId, Range};
use std::collections::HashMap;

/// Identifier of a top-level document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(pub usize);

/// One top-level document: its root node and the source it was loaded from.
///
/// Shared by id across all nodes of the document, so local `$ref`
/// resolution can find the owning root without re-walking.
#[derive(Debug, Clone)]
pub struct RootDescriptor {
    pub node: NodeId,
    pub source: String,
    pub file: FileId,
}

/// Where a node came from.
#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub root: RootId,
    pub path: Pointer,
    /// Byte span in the root's source; `None` for pure in-memory values.
    pub span: Option<Range>,
}

/// Which span of an object property a lookup wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Just the key token
    Key,
    /// Just the value
    Value,
    /// Key through value
    Entry,
}

/// A resolved location, ready for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub file: FileId,
    pub source: String,
    pub pointer: String,
    pub range: Option<Range>,
}

/// Side table mapping node identity to location records.
#[derive(Debug, Default)]
pub struct LocationIndex {
    next_id: u64,
    records: HashMap<NodeId, LocationRecord>,
    roots: Vec<RootDescriptor>,
}

impl LocationIndex {
    pub fn new() -> Self {
        LocationIndex::default()
    }

    /// Allocate a fresh node id.
    pub fn alloc(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a new top-level document. The root node id is filled in
    /// once parsing completes.
    pub fn add_root(&mut self, source: impl Into<String>, file: FileId) -> RootId {
        let id = RootId(self.roots.len());
        self.roots.push(RootDescriptor {
            node: NodeId(u64::MAX),
            source: source.into(),
            file,
        });
        id
    }

    pub fn set_root_node(&mut self, root: RootId, node: NodeId) {
        self.roots[root.0].node = node;
    }

    pub fn root(&self, id: RootId) -> &RootDescriptor {
        &self.roots[id.0]
    }

    pub fn record(&mut self, node: NodeId, record: LocationRecord) {
        self.records.insert(node, record);
    }

    /// Register a span for a node whose pointer path is assigned later by
    /// [`LocationIndex::assign_paths`].
    pub fn record_span(&mut self, node: NodeId, root: RootId, span: Range) {
        self.records.insert(
            node,
            LocationRecord {
                root,
                path: Pointer::root(),
                span: Some(span),
            },
        );
    }

    pub fn record_of(&self, node: NodeId) -> Option<&LocationRecord> {
        self.records.get(&node)
    }

    /// Walk a completed tree and fill in pointer paths for every record.
    ///
    /// Parsers build bottom-up, so a node's path is only known once its
    /// ancestors exist; this pass runs right after the root completes.
    pub fn assign_paths(&mut self, root: &Node, root_id: RootId) {
        self.assign_paths_at(root, Pointer::root());
        self.set_root_node(root_id, root.id);
    }

    fn assign_paths_at(&mut self, node: &Node, path: Pointer) {
        if let Some(record) = self.records.get_mut(&node.id) {
            record.path = path.clone();
        }
        match &node.value {
            Value::Object(entries) => {
                for entry in entries {
                    let child = path.child(entry.key.clone());
                    if let Some(record) = self.records.get_mut(&entry.key_id) {
                        record.path = child.clone();
                    }
                    self.assign_paths_at(&entry.value, child);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.assign_paths_at(item, path.child(i.to_string()));
                }
            }
            _ => {}
        }
    }

    /// Resolve a node id to a displayable location.
    pub fn locate(&self, node: NodeId) -> Option<Located> {
        let record = self.records.get(&node)?;
        let root = self.root(record.root);
        Some(Located {
            file: root.file,
            source: root.source.clone(),
            pointer: record.path.to_string(),
            range: record.span,
        })
    }

    /// Look up a location on a node, or on one of its object properties.
    ///
    /// With a `key`, the filter chooses the key token span, the value
    /// span, or the whole entry; a key absent from the node falls back to
    /// the container's own location.
    pub fn lookup(&self, node: &Node, key: Option<&str>, kind: LookupKind) -> Option<Located> {
        let Some(key) = key else {
            return self.locate(node.id);
        };
        let Some(entry) = node.entry(key) else {
            return self.locate(node.id);
        };
        match kind {
            LookupKind::Key => self.locate(entry.key_id),
            LookupKind::Value => self.locate(entry.value.id),
            LookupKind::Entry => {
                let key_loc = self.locate(entry.key_id)?;
                let value_loc = self.locate(entry.value.id)?;
                let range = match (key_loc.range, value_loc.range) {
                    (Some(a), Some(b)) => Some(a.cover(&b)),
                    (a, b) => a.or(b),
                };
                Some(Located { range, ..value_loc })
            }
        }
    }

    /// Deep-copy a subtree with fresh ids, duplicating location records.
    ///
    /// Copies keep the provenance of the originals: a substituted subtree
    /// still reports the file and span it was actually written in.
    pub fn deep_copy(&mut self, node: &Node) -> Node {
        let id = self.alloc();
        if let Some(record) = self.records.get(&node.id).cloned() {
            self.records.insert(id, record);
        }
        let value = match &node.value {
            Value::Array(items) => Value::Array(items.iter().map(|n| self.deep_copy(n)).collect()),
            Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|e| {
                        let key_id = self.alloc();
                        if let Some(record) = self.records.get(&e.key_id).cloned() {
                            self.records.insert(key_id, record);
                        }
                        crate::node::ObjectEntry {
                            key: e.key.clone(),
                            key_id,
                            value: self.deep_copy(&e.value),
                        }
                    })
                    .collect(),
            ),
            scalar => scalar.clone(),
        };
        Node::new(id, value)
    }

    /// Drop the records of a discarded subtree.
    pub fn evict(&mut self, node: &Node) {
        self.records.remove(&node.id);
        match &node.value {
            Value::Array(items) => {
                for item in items {
                    self.evict(item);
                }
            }
            Value::Object(entries) => {
                for entry in entries {
                    self.records.remove(&entry.key_id);
                    self.evict(&entry.value);
                }
            }
            _ => {}
        }
    }

    /// Number of live records (used by eviction tests).
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ObjectEntry;
    use apivet_source_map::Location;

    fn span(start: usize, len: usize) -> Range {
        Range {
            start: Location { offset: start, row: 0, column: start },
            end: Location { offset: start + len, row: 0, column: start + len },
        }
    }

    fn sample(index: &mut LocationIndex) -> (Node, RootId) {
        let root_id = index.add_root("mem.yml", FileId(0));
        let key_id = index.alloc();
        let value_id = index.alloc();
        let root_node_id = index.alloc();
        index.record_span(key_id, root_id, span(0, 1));
        index.record_span(value_id, root_id, span(3, 2));
        index.record_span(root_node_id, root_id, span(0, 5));
        let node = Node::new(
            root_node_id,
            Value::Object(vec![ObjectEntry {
                key: "a".into(),
                key_id,
                value: Node::new(value_id, Value::Int(42)),
            }]),
        );
        index.assign_paths(&node, root_id);
        (node, root_id)
    }

    #[test]
    fn test_paths_assigned() {
        let mut index = LocationIndex::new();
        let (node, root_id) = sample(&mut index);
        assert_eq!(index.root(root_id).node, node.id);
        let value = node.get("a").unwrap();
        assert_eq!(index.locate(value.id).unwrap().pointer, "/a");
        assert_eq!(index.locate(node.id).unwrap().pointer, "");
    }

    #[test]
    fn test_lookup_key_vs_value() {
        let mut index = LocationIndex::new();
        let (node, _) = sample(&mut index);

        let key = index.lookup(&node, Some("a"), LookupKind::Key).unwrap();
        assert_eq!(key.range.unwrap().start.offset, 0);

        let value = index.lookup(&node, Some("a"), LookupKind::Value).unwrap();
        assert_eq!(value.range.unwrap().start.offset, 3);

        let entry = index.lookup(&node, Some("a"), LookupKind::Entry).unwrap();
        assert_eq!(entry.range.unwrap().start.offset, 0);
        assert_eq!(entry.range.unwrap().end.offset, 5);
    }

    #[test]
    fn test_lookup_missing_key_falls_back_to_container() {
        let mut index = LocationIndex::new();
        let (node, _) = sample(&mut index);
        let loc = index.lookup(&node, Some("nope"), LookupKind::Value).unwrap();
        assert_eq!(loc.range.unwrap().start.offset, 0);
        assert_eq!(loc.range.unwrap().end.offset, 5);
    }

    #[test]
    fn test_deep_copy_fresh_ids_same_provenance() {
        let mut index = LocationIndex::new();
        let (node, _) = sample(&mut index);
        let copy = index.deep_copy(&node);

        assert_ne!(copy.id, node.id);
        assert!(copy.value_eq(&node));

        let original = index.locate(node.get("a").unwrap().id).unwrap();
        let copied = index.locate(copy.get("a").unwrap().id).unwrap();
        assert_eq!(original, copied);
    }

    #[test]
    fn test_evict_drops_subtree_records() {
        let mut index = LocationIndex::new();
        let (node, _) = sample(&mut index);
        let before = index.record_count();
        index.evict(&node);
        assert_eq!(index.record_count(), before - 3);
    }
}
