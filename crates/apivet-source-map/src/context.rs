//! Registry of loaded source files.

use crate::location::FileId;
use crate::mapper::PositionMapper;
use serde::{Deserialize, Serialize};

/// Registry of every source file seen during a load session.
///
/// File ids are dense indices in registration order, so the id handed out
/// for a document is stable for the lifetime of the context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// One registered source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path or URL the content was loaded from
    pub path: String,
    /// The raw text, retained for excerpt rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Position mapper built from the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper: Option<PositionMapper>,
}

impl SourceContext {
    pub fn new() -> Self {
        SourceContext::default()
    }

    /// Register a file and return its id.
    ///
    /// The position mapper is built immediately from the content.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        let content = content.into();
        let mapper = PositionMapper::new(&content);
        self.files.push(SourceFile {
            path: path.into(),
            content: Some(content),
            mapper: Some(mapper),
        });
        id
    }

    /// Register a path without retaining content (no excerpts, no mapper).
    pub fn add_path_only(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            path: path.into(),
            content: None,
            mapper: None,
        });
        id
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Path of a registered file, or `"<unknown>"` for a stale id.
    pub fn path(&self, id: FileId) -> &str {
        self.get(id).map_or("<unknown>", |f| f.path.as_str())
    }

    /// The mapper for a file, when content was retained.
    pub fn mapper(&self, id: FileId) -> Option<&PositionMapper> {
        self.get(id).and_then(|f| f.mapper.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let ctx = SourceContext::new();
        assert!(ctx.get(FileId(0)).is_none());
        assert_eq!(ctx.path(FileId(0)), "<unknown>");
    }

    #[test]
    fn test_add_and_get() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("openapi.yml", "openapi: 3.0.0");
        assert_eq!(id, FileId(0));
        assert_eq!(ctx.path(id), "openapi.yml");
        assert_eq!(ctx.mapper(id).unwrap().total_length(), 14);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut ctx = SourceContext::new();
        let a = ctx.add_file("a.yml", "x: 1");
        let b = ctx.add_file("b.yml", "y: 2");
        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
    }

    #[test]
    fn test_path_only_has_no_mapper() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_path_only("remote.json");
        assert!(ctx.mapper(id).is_none());
        assert_eq!(ctx.path(id), "remote.json");
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut ctx = SourceContext::new();
        ctx.add_file("spec.json", "{\"a\": 1}");
        let json = serde_json::to_string(&ctx).unwrap();
        let back: SourceContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path(FileId(0)), "spec.json");
        assert_eq!(back.mapper(FileId(0)).unwrap().total_length(), 8);
    }
}
