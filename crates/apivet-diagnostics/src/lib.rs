//! # apivet-diagnostics
//!
//! Hierarchical, severity-overridable diagnostics.
//!
//! Loading and validating an OpenAPI document never aborts on the first
//! problem; every finding becomes a [`Diagnostic`] recorded in the
//! [`DiagnosticsStore`] under a context path mirroring the document's
//! breadcrumbs. Callers then pull per-severity [`Report`]s and decide for
//! themselves whether an error is fatal to their use case.
//!
//! Diagnostic codes live in an embedded message catalog that fixes each
//! code's message template, default severity, and the alternate severities
//! it may legally be remapped to. The catalog is verified complete the
//! first time it is touched — an incomplete catalog is a bug, not a
//! runtime condition.

mod catalog;
mod diagnostic;
mod report;
mod severity;
mod snippet;
mod store;

pub use catalog::{CATALOG, CatalogEntry, codes};
pub use diagnostic::{Diagnostic, SourceLocation};
pub use report::{Report, ReportItem, ReportNode, Verbosity};
pub use severity::Severity;
pub use snippet::render_snippet;
pub use store::{ConfigError, DiagnosticsStore, SeverityCounts};
