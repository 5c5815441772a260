//! # apivet-document
//!
//! Parsed document trees with source location tracking.
//!
//! This crate turns OpenAPI document text (JSON or YAML) into an owned
//! [`Node`] tree and records, for every node, where it came from: the
//! document it belongs to, its JSON-Pointer path, and its byte span in the
//! source text. The [`LocationIndex`] is the identity-keyed side table that
//! answers "where did this come from" for all later stages — the reference
//! resolver re-registers substituted nodes here, and the validation engine
//! reads diagnostic locations from it.
//!
//! ## Design
//!
//! Uses the owned data approach: nodes own their children outright, and a
//! parser-allocated [`NodeId`] on every node keys the parallel location
//! table. Substitution therefore means deep-copying with fresh ids rather
//! than aliasing, and dropping a [`DocumentSet`] drops all location records
//! with it.
//!
//! ## Example
//!
//! ```rust
//! use apivet_document::DocumentSet;
//!
//! let mut docs = DocumentSet::new();
//! let parsed = docs.parse("openapi.yml", "info:\n  title: Pets\n", None).unwrap();
//! let title = parsed.root.get("info").and_then(|i| i.get("title")).unwrap();
//! let at = docs.index.locate(title.id).unwrap();
//! assert_eq!(at.pointer, "/info/title");
//! ```

mod error;
mod index;
mod node;
mod parser;
mod pointer;
mod sniff;

pub use error::{ParseError, Result};
pub use index::{Located, LocationIndex, LocationRecord, LookupKind, RootDescriptor, RootId};
pub use node::{Node, NodeId, ObjectEntry, Value};
pub use parser::{DocumentSet, ParsedDocument};
pub use pointer::Pointer;
pub use sniff::{DocFormat, detect_format};
