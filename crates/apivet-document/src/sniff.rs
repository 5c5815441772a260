//! Document format detection.

use std::fmt;

/// The wire format of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Json,
    Yaml,
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFormat::Json => write!(f, "JSON"),
            DocFormat::Yaml => write!(f, "YAML"),
        }
    }
}

/// Decide whether content is JSON or YAML.
///
/// Sniffing order: the loader-declared content type wins, then the file
/// extension, then a strict parse attempt (valid JSON is JSON, everything
/// else is YAML — YAML being the superset makes it the safe default).
pub fn detect_format(declared: Option<&str>, path: &str, content: &str) -> DocFormat {
    if let Some(declared) = declared {
        let declared = declared.to_ascii_lowercase();
        if declared.contains("json") {
            return DocFormat::Json;
        }
        if declared.contains("yaml") || declared.contains("yml") {
            return DocFormat::Yaml;
        }
    }

    match extension(path) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => return DocFormat::Json,
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            return DocFormat::Yaml;
        }
        _ => {}
    }

    if serde_json::from_str::<serde_json::Value>(content).is_ok() {
        DocFormat::Json
    } else {
        DocFormat::Yaml
    }
}

fn extension(path: &str) -> Option<&str> {
    // Works for both filesystem paths and URLs; query/fragment stripped
    // so "spec.json?v=2" still sniffs as JSON.
    let name = path
        .split(['?', '#'])
        .next()
        .unwrap_or(path)
        .rsplit(['/', '\\'])
        .next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty()).then_some(ext)
}
