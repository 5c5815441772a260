//! Per-severity report assembly and text rendering.
//!
//! The rendered shape is a contract: contexts print as indented `at:`
//! blocks; a context with no messages of its own and exactly one active
//! branch collapses into a single `>`-joined breadcrumb line; diagnostics
//! sharing an identical set of locations group into one item with
//! multiple entries.

use crate::diagnostic::{Diagnostic, SourceLocation};
use crate::severity::Severity;
use crate::store::ContextNode;
use std::fmt::Write as _;
use std::str::FromStr;

/// How much detail the text rendering includes. Profiles are cumulative:
/// each level includes everything below it; `all` is the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    None,
    Code,
    Breadcrumbs,
    Locations,
    Footnote,
    All,
}

impl Verbosity {
    fn show_code(self) -> bool {
        self >= Verbosity::Code
    }

    fn show_breadcrumbs(self) -> bool {
        self >= Verbosity::Breadcrumbs
    }

    fn show_locations(self) -> bool {
        self >= Verbosity::Locations
    }

    fn show_footnotes(self) -> bool {
        self >= Verbosity::Footnote
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Verbosity::None),
            "code" => Ok(Verbosity::Code),
            "breadcrumbs" => Ok(Verbosity::Breadcrumbs),
            "locations" => Ok(Verbosity::Locations),
            "footnote" => Ok(Verbosity::Footnote),
            "all" => Ok(Verbosity::All),
            other => Err(format!(
                "unknown verbosity {other:?}; expected none, code, breadcrumbs, locations, footnote, or all"
            )),
        }
    }
}

/// All diagnostics of one severity, arranged by context.
#[derive(Debug, Clone)]
pub struct Report {
    pub severity: Severity,
    pub count: usize,
    pub root: Option<ReportNode>,
}

/// One context in the report tree. The key may already be a collapsed
/// breadcrumb (`a > b > c`).
#[derive(Debug, Clone)]
pub struct ReportNode {
    pub key: String,
    pub items: Vec<ReportItem>,
    pub children: Vec<ReportNode>,
}

/// Diagnostics sharing one identical set of locations.
#[derive(Debug, Clone)]
pub struct ReportItem {
    pub locations: Vec<SourceLocation>,
    pub entries: Vec<Diagnostic>,
}

pub(crate) fn build_report(severity: Severity, root: &ContextNode) -> Report {
    Report {
        severity,
        count: root.counts().get(severity),
        root: build_node(root, severity),
    }
}

fn build_node(ctx: &ContextNode, severity: Severity) -> Option<ReportNode> {
    let items = group_by_location_set(
        ctx.messages
            .iter()
            .filter(|d| d.level == severity),
    );
    let mut children: Vec<ReportNode> = ctx
        .children
        .iter()
        .filter_map(|c| build_node(c, severity))
        .collect();

    if items.is_empty() && children.is_empty() {
        return None;
    }

    // A context with nothing of its own and a single active branch folds
    // into one breadcrumb line.
    if items.is_empty() && children.len() == 1 {
        let child = children.pop().expect("one child");
        let key = if ctx.key.is_empty() {
            child.key
        } else {
            format!("{} > {}", ctx.key, child.key)
        };
        return Some(ReportNode {
            key,
            items: child.items,
            children: child.children,
        });
    }

    Some(ReportNode {
        key: ctx.key.clone(),
        items,
        children,
    })
}

fn group_by_location_set<'a>(messages: impl Iterator<Item = &'a Diagnostic>) -> Vec<ReportItem> {
    let mut items: Vec<ReportItem> = Vec::new();
    for message in messages {
        match items.iter_mut().find(|i| i.locations == message.locations) {
            Some(item) => item.entries.push(message.clone()),
            None => items.push(ReportItem {
                locations: message.locations.clone(),
                entries: vec![message.clone()],
            }),
        }
    }
    items
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Render the report as indented text.
    pub fn to_text(&self, verbosity: Verbosity) -> String {
        let mut out = String::new();
        let noun = self.severity.noun();
        let plural = if self.count == 1 { "" } else { "s" };
        let _ = writeln!(out, "{} {}{}", self.count, noun, plural);

        let mut footnotes: Vec<(String, String)> = Vec::new();
        if let Some(root) = &self.root {
            render_node(root, 1, verbosity, &mut out, &mut footnotes);
        }

        if verbosity.show_footnotes() && !footnotes.is_empty() {
            let _ = writeln!(out, "see:");
            for (code, url) in footnotes {
                let _ = writeln!(out, "  {code}: {url}");
            }
        }
        out
    }

    /// Machine-readable rendering.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "severity": self.severity,
            "count": self.count,
            "root": self.root.as_ref().map(node_json),
        })
    }
}

fn node_json(node: &ReportNode) -> serde_json::Value {
    serde_json::json!({
        "at": node.key,
        "items": node.items.iter().map(|item| serde_json::json!({
            "locations": item.locations,
            "entries": item.entries.iter().map(Diagnostic::to_json).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "children": node.children.iter().map(node_json).collect::<Vec<_>>(),
    })
}

fn render_node(
    node: &ReportNode,
    depth: usize,
    verbosity: Verbosity,
    out: &mut String,
    footnotes: &mut Vec<(String, String)>,
) {
    // The root context owns no name; its content starts at this depth.
    let body_depth = if node.key.is_empty() {
        depth
    } else {
        indent(out, depth);
        let _ = writeln!(out, "at: {}", node.key);
        depth + 1
    };

    for item in &node.items {
        render_item(item, body_depth, verbosity, out, footnotes);
    }
    for child in &node.children {
        render_node(child, body_depth, verbosity, out, footnotes);
    }
}

fn render_item(
    item: &ReportItem,
    depth: usize,
    verbosity: Verbosity,
    out: &mut String,
    footnotes: &mut Vec<(String, String)>,
) {
    // A grouped item prints its shared location set once, as a header.
    let grouped = item.entries.len() > 1;
    let mut entry_depth = depth;
    if grouped && verbosity.show_locations() && !item.locations.is_empty() {
        indent(out, depth);
        let _ = writeln!(out, "at {}:", join_locations(&item.locations));
        entry_depth = depth + 1;
    }

    for entry in &item.entries {
        indent(out, entry_depth);
        out.push_str(&entry.message);
        if verbosity.show_code() {
            let _ = write!(out, " [{}]", entry.code);
        }
        if verbosity.show_breadcrumbs()
            && let Some(first) = item.locations.first()
        {
            let breadcrumb = first.breadcrumb();
            if !breadcrumb.is_empty() {
                let _ = write!(out, " (at {breadcrumb})");
            }
        }
        if !grouped && verbosity.show_locations() && !item.locations.is_empty() {
            let _ = write!(out, " ({})", join_locations(&item.locations));
        }
        out.push('\n');

        if verbosity.show_footnotes()
            && let Some(reference) = &entry.reference
            && !footnotes.iter().any(|(code, _)| code == &entry.code)
        {
            footnotes.push((entry.code.clone(), reference.clone()));
        }
    }
}

fn join_locations(locations: &[SourceLocation]) -> String {
    locations
        .iter()
        .map(SourceLocation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth.saturating_sub(1) {
        out.push_str("  ");
    }
}
