//! Terminal source excerpts for single diagnostics.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use apivet_source_map::SourceContext;

/// Render a compiler-style source excerpt for a diagnostic.
///
/// Uses the first location that has both a span and retained file
/// content; returns `None` when no location qualifies.
pub fn render_snippet(diagnostic: &Diagnostic, sources: &SourceContext) -> Option<String> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let location = diagnostic
        .locations
        .iter()
        .find(|l| l.range.is_some() && l.file.is_some())?;
    let file = sources.get(location.file?)?;
    let content = file.content.as_ref()?;
    let range = location.range?;

    let (kind, color) = match diagnostic.level {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warn => (ReportKind::Warning, Color::Yellow),
        _ => (ReportKind::Advice, Color::Cyan),
    };

    let report = Report::build(kind, file.path.clone(), range.start.offset)
        .with_message(format!("[{}] {}", diagnostic.code, diagnostic.message))
        .with_label(
            Label::new((file.path.clone(), range.start.offset..range.end.offset))
                .with_message(&diagnostic.message)
                .with_color(color),
        )
        .finish();

    let mut out = Vec::new();
    report
        .write((file.path.clone(), Source::from(content.as_str())), &mut out)
        .ok()?;
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::codes;
    use crate::diagnostic::SourceLocation;
    use apivet_source_map::{Location, Range};

    #[test]
    fn test_snippet_renders_for_located_diagnostic() {
        let mut sources = SourceContext::new();
        let file = sources.add_file("a.yml", "boolean: maybe\n");

        let diagnostic = Diagnostic::new(codes::TYPE_MISMATCH)
            .meta("expected", "boolean")
            .meta("actual", "string")
            .at(SourceLocation {
                source: "a.yml".into(),
                file: Some(file),
                pointer: "/boolean".into(),
                range: Some(Range {
                    start: Location { offset: 9, row: 0, column: 9 },
                    end: Location { offset: 14, row: 0, column: 14 },
                }),
            });

        let snippet = render_snippet(&diagnostic, &sources).unwrap();
        assert!(snippet.contains("TYPE_MISMATCH"));
        assert!(snippet.contains("a.yml"));
    }

    #[test]
    fn test_no_snippet_without_location() {
        let sources = SourceContext::new();
        let diagnostic = Diagnostic::new(codes::NULL_INVALID);
        assert!(render_snippet(&diagnostic, &sources).is_none());
    }
}
