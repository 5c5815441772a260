//! JSON and YAML parsers building located node trees.
//!
//! Both formats share one marked-event builder: yaml-rust2 parses a strict
//! superset of JSON and its event markers carry byte offsets, which the
//! position mapper turns into (row, column) spans. JSON input is first
//! checked by serde_json so strictly-invalid JSON fails with a JSON syntax
//! message rather than silently degrading to YAML semantics.

use crate::error::{ParseError, Result};
use crate::index::{LocationIndex, RootId};
use crate::node::{Node, NodeId, ObjectEntry, Value};
use crate::sniff::{DocFormat, detect_format};
use apivet_source_map::{FileId, PositionMapper, SourceContext};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// A successfully parsed top-level document.
#[derive(Debug)]
pub struct ParsedDocument {
    pub root: Node,
    pub root_id: RootId,
    pub file: FileId,
    pub format: DocFormat,
}

/// Owns everything a load session accumulates: the source file registry
/// and the identity-location index. All parsing goes through here so that
/// node ids stay unique across documents.
#[derive(Debug, Default)]
pub struct DocumentSet {
    pub sources: SourceContext,
    pub index: LocationIndex,
}

impl DocumentSet {
    pub fn new() -> Self {
        DocumentSet::default()
    }

    /// Parse one document, registering its source and populating the
    /// location index in the same pass.
    ///
    /// `source` is the path or URL the content came from; `declared` is a
    /// loader-supplied content type, if any. Only the first document of a
    /// multi-document YAML stream is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Syntax`] for malformed input and
    /// [`ParseError::Empty`] when the input holds no document.
    pub fn parse(
        &mut self,
        source: &str,
        content: &str,
        declared: Option<&str>,
    ) -> Result<ParsedDocument> {
        let format = detect_format(declared, source, content);

        if format == DocFormat::Json
            && let Err(e) = serde_json::from_str::<serde_json::Value>(content)
        {
            return Err(ParseError::Syntax {
                format,
                message: e.to_string(),
            });
        }

        let file = self.sources.add_file(source, content);
        let root_id = self.index.add_root(source, file);

        let mut builder = TreeBuilder {
            index: &mut self.index,
            root_id,
            mapper: PositionMapper::new(content),
            stack: Vec::new(),
            root: None,
        };
        let mut parser = Parser::new_from_str(content);
        parser
            .load(&mut builder, false) // single document only
            .map_err(|e| ParseError::Syntax {
                format,
                message: e.to_string(),
            })?;

        let root = builder.root.ok_or(ParseError::Empty)?;
        self.index.assign_paths(&root, root_id);

        Ok(ParsedDocument {
            root,
            root_id,
            file,
            format,
        })
    }
}

/// Event receiver constructing the node tree bottom-up.
struct TreeBuilder<'a> {
    index: &'a mut LocationIndex,
    root_id: RootId,
    mapper: PositionMapper,
    stack: Vec<BuildNode>,
    root: Option<Node>,
}

enum BuildNode {
    Sequence {
        start: Marker,
        items: Vec<Node>,
    },
    Mapping {
        start: Marker,
        entries: Vec<(Node, Option<Node>)>,
    },
}

impl TreeBuilder<'_> {
    fn push_complete(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some(BuildNode::Sequence { items, .. }) => items.push(node),
            Some(BuildNode::Mapping { entries, .. }) => match entries.last_mut() {
                Some((_, value @ None)) => *value = Some(node),
                _ => entries.push((node, None)),
            },
        }
    }

    fn alloc_spanned(&mut self, offset: usize, len: usize) -> NodeId {
        let id = self.index.alloc();
        let span = self.mapper.range(offset, len);
        self.index.record_span(id, self.root_id, span);
        id
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(text, style, _anchor_id, tag) => {
                // Scalar length approximates as the text length; exact for
                // plain scalars, short by the quote characters otherwise.
                let id = self.alloc_spanned(marker.index(), text.len());
                let value = scalar_value(&text, style, tag.is_some());
                self.push_complete(Node::new(id, value));
            }

            Event::SequenceStart(_anchor_id, _tag) => {
                self.stack.push(BuildNode::Sequence {
                    start: marker,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let Some(BuildNode::Sequence { start, items }) = self.stack.pop() else {
                    unreachable!("SequenceEnd without SequenceStart");
                };
                let len = marker.index().saturating_sub(start.index());
                let id = self.alloc_spanned(start.index(), len);
                self.push_complete(Node::new(id, Value::Array(items)));
            }

            Event::MappingStart(_anchor_id, _tag) => {
                self.stack.push(BuildNode::Mapping {
                    start: marker,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let Some(BuildNode::Mapping { start, entries }) = self.stack.pop() else {
                    unreachable!("MappingEnd without MappingStart");
                };
                let len = marker.index().saturating_sub(start.index());
                let id = self.alloc_spanned(start.index(), len);

                let entries = entries
                    .into_iter()
                    .map(|(key, value)| {
                        let value = value.expect("mapping entry without value");
                        ObjectEntry {
                            key: key_string(&key),
                            key_id: key.id,
                            value,
                        }
                    })
                    .collect();

                self.push_complete(Node::new(id, Value::Object(entries)));
            }

            Event::Alias(_anchor_id) => {
                // Anchors are not tracked; an alias resolves to null.
                let id = self.alloc_spanned(marker.index(), 0);
                self.push_complete(Node::new(id, Value::Null));
            }
        }
    }
}

/// Render a key node as an object key string.
fn key_string(key: &Node) -> String {
    match &key.value {
        Value::Str(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        // Complex keys are legal YAML; render them structurally.
        _ => key.to_json().to_string(),
    }
}

/// Type a scalar according to its style.
///
/// Only plain, untagged scalars undergo inference; quoted scalars stay
/// strings, so JSON `"false"` never re-types to a boolean.
fn scalar_value(text: &str, style: TScalarStyle, tagged: bool) -> Value {
    if !matches!(style, TScalarStyle::Plain) || tagged {
        return Value::Str(text.to_string());
    }

    match text {
        "null" | "Null" | "NULL" | "~" | "" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if text.starts_with(['-', '+', '.']) || text.starts_with(|c: char| c.is_ascii_digit()) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }

    Value::Str(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LookupKind;

    fn parse(content: &str) -> (DocumentSet, ParsedDocument) {
        let mut docs = DocumentSet::new();
        let parsed = docs.parse("test.yml", content, None).unwrap();
        (docs, parsed)
    }

    #[test]
    fn test_parse_scalar() {
        let (_, parsed) = parse("hello");
        assert_eq!(parsed.root.as_str(), Some("hello"));
    }

    #[test]
    fn test_parse_typed_scalars() {
        let (_, parsed) = parse("[42, 1.5, true, null, plain]");
        let items = parsed.root.items().unwrap();
        assert_eq!(items[0].as_i64(), Some(42));
        assert_eq!(items[1].as_f64(), Some(1.5));
        assert_eq!(items[2].as_bool(), Some(true));
        assert!(items[3].is_null());
        assert_eq!(items[4].as_str(), Some("plain"));
    }

    #[test]
    fn test_quoted_scalar_stays_string() {
        let (_, parsed) = parse("a: \"false\"\nb: '42'");
        assert_eq!(parsed.root.get("a").unwrap().as_str(), Some("false"));
        assert_eq!(parsed.root.get("b").unwrap().as_str(), Some("42"));
    }

    #[test]
    fn test_parse_hash() {
        let (_, parsed) = parse("title: Pets\nversion: 2");
        assert_eq!(parsed.root.len(), 2);
        assert_eq!(parsed.root.get("title").unwrap().as_str(), Some("Pets"));
        assert_eq!(parsed.root.get("version").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn test_duplicate_keys_first_wins_on_get() {
        let (_, parsed) = parse("a: 1\na: 2");
        assert_eq!(parsed.root.len(), 2);
        assert_eq!(parsed.root.get("a").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn test_yaml_value_location() {
        // "boolean: false" — the false token starts at offset 9.
        let (docs, parsed) = parse("boolean: false");
        let loc = docs
            .index
            .lookup(&parsed.root, Some("boolean"), LookupKind::Value)
            .unwrap();
        let range = loc.range.unwrap();
        assert_eq!(range.start.offset, 9);
        assert_eq!(range.start.row, 0);
        assert_eq!(range.start.column, 9);
        assert_eq!(range.len(), 5);
    }

    #[test]
    fn test_yaml_key_location() {
        let (docs, parsed) = parse("info:\n  title: Pets\n");
        let info = parsed.root.get("info").unwrap();
        let loc = docs
            .index
            .lookup(info, Some("title"), LookupKind::Key)
            .unwrap();
        let range = loc.range.unwrap();
        assert_eq!(range.start.row, 1);
        assert_eq!(range.start.column, 2);
    }

    #[test]
    fn test_json_value_location() {
        // {"boolean": false} — the false token starts at offset 12.
        let mut docs = DocumentSet::new();
        let parsed = docs
            .parse("test.json", "{\"boolean\": false}", None)
            .unwrap();
        assert_eq!(parsed.format, DocFormat::Json);
        assert_eq!(parsed.root.get("boolean").unwrap().as_bool(), Some(false));

        let loc = docs
            .index
            .lookup(&parsed.root, Some("boolean"), LookupKind::Value)
            .unwrap();
        let range = loc.range.unwrap();
        assert_eq!(range.start.offset, 12);
        assert_eq!(range.start.row, 0);
        assert_eq!(range.start.column, 12);
    }

    #[test]
    fn test_pointer_paths() {
        let (docs, parsed) = parse("paths:\n  /pets:\n    get: {}\n");
        let get = parsed
            .root
            .get("paths")
            .and_then(|p| p.get("/pets"))
            .and_then(|p| p.get("get"))
            .unwrap();
        let loc = docs.index.locate(get.id).unwrap();
        assert_eq!(loc.pointer, "/paths/~1pets/get");
        assert_eq!(loc.source, "test.yml");
    }

    #[test]
    fn test_array_pointer_paths() {
        let (docs, parsed) = parse("servers:\n  - url: a\n  - url: b\n");
        let second = parsed.root.get("servers").unwrap().get_item(1).unwrap();
        let loc = docs.index.locate(second.id).unwrap();
        assert_eq!(loc.pointer, "/servers/1");
    }

    #[test]
    fn test_empty_input() {
        let mut docs = DocumentSet::new();
        assert!(matches!(
            docs.parse("e.yml", "", None),
            Err(ParseError::Empty)
        ));
    }

    #[test]
    fn test_invalid_json_is_a_json_error() {
        let mut docs = DocumentSet::new();
        let err = docs
            .parse("bad.json", "{\"a\": }", None)
            .unwrap_err();
        match err {
            ParseError::Syntax { format, .. } => assert_eq!(format, DocFormat::Json),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_yaml_is_a_yaml_error() {
        let mut docs = DocumentSet::new();
        let err = docs.parse("bad.yml", "a: [1, 2", None).unwrap_err();
        match err {
            ParseError::Syntax { format, .. } => assert_eq!(format, DocFormat::Yaml),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_node_ids_unique_across_documents() {
        let mut docs = DocumentSet::new();
        let a = docs.parse("a.yml", "x: 1", None).unwrap();
        let b = docs.parse("b.yml", "x: 1", None).unwrap();
        assert_ne!(a.root.id, b.root.id);
        assert_eq!(docs.index.root(a.root_id).source, "a.yml");
        assert_eq!(docs.index.root(b.root_id).source, "b.yml");
    }
}
