//! The hierarchical diagnostics store.

use crate::catalog;
use crate::diagnostic::Diagnostic;
use crate::report::{Report, build_report};
use crate::severity::Severity;
use std::cell::Cell;
use std::collections::HashMap;
use thiserror::Error;

/// Configuration faults. Unlike every load/validation finding, these are
/// programmer errors and propagate as hard failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown diagnostic code: {0}")]
    UnknownCode(String),
}

/// Aggregated message counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub ignored: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
}

impl SeverityCounts {
    fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Ignore => self.ignored += 1,
            Severity::Info => self.info += 1,
            Severity::Warn => self.warn += 1,
            Severity::Error => self.error += 1,
        }
    }

    fn merge(mut self, other: SeverityCounts) -> SeverityCounts {
        self.ignored += other.ignored;
        self.info += other.info;
        self.warn += other.warn;
        self.error += other.error;
        self
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Ignore => self.ignored,
            Severity::Info => self.info,
            Severity::Warn => self.warn,
            Severity::Error => self.error,
        }
    }
}

/// One context in the breadcrumb tree. Owns its messages and its named
/// child contexts; created lazily the first time a path touches it.
#[derive(Debug, Default)]
pub(crate) struct ContextNode {
    pub(crate) key: String,
    pub(crate) messages: Vec<Diagnostic>,
    pub(crate) children: Vec<ContextNode>,
    /// Memoized aggregate of this subtree; cleared by any add below.
    counts: Cell<Option<SeverityCounts>>,
}

impl ContextNode {
    fn named(key: &str) -> Self {
        ContextNode {
            key: key.to_string(),
            ..ContextNode::default()
        }
    }

    /// Get-or-create the named child context.
    fn child_mut(&mut self, key: &str) -> &mut ContextNode {
        let position = self.children.iter().position(|c| c.key == key);
        match position {
            Some(i) => &mut self.children[i],
            None => {
                self.children.push(ContextNode::named(key));
                self.children.last_mut().expect("just pushed")
            }
        }
    }

    fn invalidate(&self) {
        self.counts.set(None);
    }

    pub(crate) fn counts(&self) -> SeverityCounts {
        if let Some(cached) = self.counts.get() {
            return cached;
        }
        let mut own = SeverityCounts::default();
        for message in &self.messages {
            own.bump(message.level);
        }
        let total = self
            .children
            .iter()
            .fold(own, |acc, child| acc.merge(child.counts()));
        self.counts.set(Some(total));
        total
    }
}

/// Accumulates diagnostics under breadcrumb paths mirroring the document.
///
/// Per-severity aggregates are memoized per context and recomputed lazily
/// after any `add` below the owner. Severity remapping is gated by the
/// message catalog: a code only remaps to a severity listed in its
/// alternate levels, and an illegal request is itself reported as a
/// warning rather than silently ignored.
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    root: ContextNode,
    overrides: HashMap<String, Severity>,
}

impl DiagnosticsStore {
    pub fn new() -> Self {
        DiagnosticsStore::default()
    }

    /// Record a diagnostic under the given breadcrumb path.
    ///
    /// Intermediate contexts are created as needed; count caches along the
    /// path are invalidated. An active severity override for the code is
    /// applied here, at record time.
    pub fn add<S: AsRef<str>>(&mut self, path: &[S], mut diagnostic: Diagnostic) {
        if let Some(&level) = self.overrides.get(&diagnostic.code) {
            diagnostic.level = level;
        }
        let mut node = &mut self.root;
        node.invalidate();
        for segment in path {
            node = node.child_mut(segment.as_ref());
            node.invalidate();
        }
        node.messages.push(diagnostic);
    }

    /// Request a severity remap for a code.
    ///
    /// Succeeds when the requested severity is the code's default or one
    /// of its alternate levels. An illegal request leaves the severity
    /// unchanged and records a `DIAG_REMAP_INVALID` warning. An unknown
    /// code is a configuration fault.
    pub fn remap(&mut self, code: &str, level: Severity) -> Result<(), ConfigError> {
        let entry =
            catalog::get(code).ok_or_else(|| ConfigError::UnknownCode(code.to_string()))?;

        if level == entry.level {
            self.overrides.remove(code);
        } else if entry.alternate_levels.contains(&level) {
            self.overrides.insert(code.to_string(), level);
        } else {
            let allowed: Vec<&str> = std::iter::once(entry.level.as_str())
                .chain(entry.alternate_levels.iter().map(Severity::as_str))
                .collect();
            let warning = Diagnostic::new(catalog::codes::DIAG_REMAP_INVALID)
                .meta("code", code)
                .meta("requested", level.as_str())
                .meta("allowed", allowed.join(", "));
            self.add::<&str>(&[], warning);
        }
        Ok(())
    }

    /// Aggregated counts for the whole store.
    pub fn counts(&self) -> SeverityCounts {
        self.root.counts()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts().get(severity)
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn is_empty(&self) -> bool {
        let counts = self.counts();
        counts.ignored + counts.info + counts.warn + counts.error == 0
    }

    /// The report for one severity.
    pub fn report(&self, severity: Severity) -> Report {
        build_report(severity, &self.root)
    }

    /// Every recorded diagnostic with its breadcrumb, depth-first.
    pub fn flatten(&self) -> Vec<(String, &Diagnostic)> {
        let mut out = Vec::new();
        flatten_into(&self.root, String::new(), &mut out);
        out
    }
}

fn flatten_into<'a>(
    node: &'a ContextNode,
    breadcrumb: String,
    out: &mut Vec<(String, &'a Diagnostic)>,
) {
    for message in &node.messages {
        out.push((breadcrumb.clone(), message));
    }
    for child in &node.children {
        let next = if breadcrumb.is_empty() {
            child.key.clone()
        } else {
            format!("{} > {}", breadcrumb, child.key)
        };
        flatten_into(child, next, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::codes;

    #[test]
    fn test_add_and_count() {
        let mut store = DiagnosticsStore::new();
        store.add(&["paths", "/pets"], Diagnostic::new(codes::TYPE_MISMATCH));
        store.add(&["info"], Diagnostic::new(codes::PROP_UNKNOWN));

        assert_eq!(store.count(Severity::Error), 1);
        assert_eq!(store.count(Severity::Warn), 1);
        assert!(store.has_errors());
        assert!(!store.is_empty());
    }

    #[test]
    fn test_counts_cache_invalidated_by_add() {
        let mut store = DiagnosticsStore::new();
        store.add(&["a"], Diagnostic::new(codes::TYPE_MISMATCH));
        assert_eq!(store.count(Severity::Error), 1);
        // A second add below the same owner must be visible.
        store.add(&["a", "b"], Diagnostic::new(codes::TYPE_MISMATCH));
        assert_eq!(store.count(Severity::Error), 2);
    }

    #[test]
    fn test_legal_remap_applies_to_later_adds() {
        let mut store = DiagnosticsStore::new();
        store.remap(codes::REF_NOT_RESOLVED, Severity::Warn).unwrap();
        store.add(&["x"], Diagnostic::new(codes::REF_NOT_RESOLVED));
        assert_eq!(store.count(Severity::Error), 0);
        assert_eq!(store.count(Severity::Warn), 1);
    }

    #[test]
    fn test_remap_back_to_default_clears_override() {
        let mut store = DiagnosticsStore::new();
        store.remap(codes::REF_NOT_RESOLVED, Severity::Warn).unwrap();
        store.remap(codes::REF_NOT_RESOLVED, Severity::Error).unwrap();
        store.add(&["x"], Diagnostic::new(codes::REF_NOT_RESOLVED));
        assert_eq!(store.count(Severity::Error), 1);
    }

    #[test]
    fn test_illegal_remap_warns_and_leaves_severity() {
        let mut store = DiagnosticsStore::new();
        // TYPE_MISMATCH lists no alternate levels.
        store.remap(codes::TYPE_MISMATCH, Severity::Info).unwrap();

        // The remap attempt itself is reported as a warning.
        assert_eq!(store.count(Severity::Warn), 1);
        let flat = store.flatten();
        assert_eq!(flat[0].1.code, codes::DIAG_REMAP_INVALID);

        // And the code keeps its default severity.
        store.add(&["x"], Diagnostic::new(codes::TYPE_MISMATCH));
        assert_eq!(store.count(Severity::Error), 1);
    }

    #[test]
    fn test_remap_unknown_code_is_a_config_fault() {
        let mut store = DiagnosticsStore::new();
        let err = store.remap("NOPE", Severity::Warn).unwrap_err();
        assert_eq!(err, ConfigError::UnknownCode("NOPE".into()));
    }

    #[test]
    fn test_ignore_suppresses_from_error_and_warn_counts() {
        let mut store = DiagnosticsStore::new();
        store.remap(codes::PROP_UNKNOWN, Severity::Ignore).unwrap();
        store.add(&["x"], Diagnostic::new(codes::PROP_UNKNOWN));
        assert_eq!(store.count(Severity::Warn), 0);
        assert_eq!(store.count(Severity::Ignore), 1);
    }

    #[test]
    fn test_flatten_breadcrumbs() {
        let mut store = DiagnosticsStore::new();
        store.add(&["a", "b"], Diagnostic::new(codes::TYPE_MISMATCH));
        let flat = store.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, "a > b");
    }
}
