//! The diagnostic message type.

use crate::catalog;
use crate::severity::Severity;
use apivet_source_map::{FileId, Range};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved source location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path or URL of the source document
    pub source: String,
    /// File id in the session's source context, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileId>,
    /// JSON-Pointer path within the document
    pub pointer: String,
    /// Byte span in the source text, when the value came from text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

impl SourceLocation {
    /// The pointer rendered as a `>`-joined breadcrumb (`a > b > c`).
    pub fn breadcrumb(&self) -> String {
        self.pointer
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.replace("~1", "/").replace("~0", "~"))
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) => {
                let (line, col) = range.start.one_based();
                write!(f, "{}:{}:{}", self.source, line, col)
            }
            None => f.write_str(&self.source),
        }
    }
}

/// One recorded finding.
///
/// Construction goes through the message catalog: the code fixes the
/// message template, default severity, alternate severities, and the
/// documentation reference. Metadata supplied with [`Diagnostic::meta`]
/// fills the template's `{placeholder}` slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub level: Severity,
    pub locations: Vec<SourceLocation>,
    pub message: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub alternate_levels: Vec<Severity>,
}

impl Diagnostic {
    /// Start a diagnostic for a cataloged code.
    ///
    /// # Panics
    ///
    /// Panics if `code` is not in the catalog; recording an uncataloged
    /// code is a programming error, not a runtime condition.
    pub fn new(code: &str) -> Self {
        let entry = catalog::get(code)
            .unwrap_or_else(|| panic!("diagnostic code {code} is not in the message catalog"));
        Diagnostic {
            code: code.to_string(),
            level: entry.level,
            locations: Vec::new(),
            message: entry.template.clone(),
            metadata: serde_json::Map::new(),
            reference: entry.reference.clone(),
            alternate_levels: entry.alternate_levels.clone(),
        }
    }

    /// Attach a metadata value and re-render the message template.
    pub fn meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self.render_message();
        self
    }

    /// Attach a source location.
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.locations.push(location);
        self
    }

    fn render_message(&mut self) {
        let template = catalog::get(&self.code)
            .map(|e| e.template.as_str())
            .unwrap_or_default();
        self.message = interpolate(template, &self.metadata);
    }

    /// JSON rendering used by machine-readable report output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("diagnostic serialization cannot fail")
    }
}

/// Fill `{placeholder}` slots from metadata. Unknown placeholders are
/// left in place so missing metadata is visible rather than silent.
fn interpolate(template: &str, metadata: &serde_json::Map<String, serde_json::Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match metadata.get(key) {
                    Some(serde_json::Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
