//! # apivet-engine
//!
//! The schema-driven validation and build engine.
//!
//! The engine is a generic, versioned tree-walker: it knows nothing about
//! any particular OpenAPI object and is driven entirely by declarative
//! per-object-type schemas supplied through the [`ObjectType`] contract.
//! Walking a raw definition alongside a schema either validates it or
//! builds a typed value, reading locations from the document set's index
//! and writing findings into the diagnostics store.
//!
//! A small built-in component subset (document root, `info`, `contact`,
//! `license`, `tags`, `externalDocs`) ships with the engine; the full
//! object-type catalog is external configuration.
//!
//! ## Example
//!
//! ```rust
//! use apivet_diagnostics::DiagnosticsStore;
//! use apivet_document::DocumentSet;
//! use apivet_engine::Engine;
//!
//! let mut docs = DocumentSet::new();
//! let parsed = docs
//!     .parse("spec.yml", "openapi: \"3.0.0\"\ninfo:\n  title: Pets\n  version: \"1\"\npaths: {}\n", None)
//!     .unwrap();
//!
//! let engine = Engine::with_builtins();
//! let mut store = DiagnosticsStore::new();
//! engine.validate("OpenApi", &parsed.root, None, &docs, &mut store);
//! assert!(!store.has_errors());
//! ```

mod builtin;
mod component;
mod processor;
mod schema;
mod version;

pub use builtin::{Contact, ExternalDocumentation, Info, License, OpenApi, Tag, register_builtins};
pub use component::ObjectType;
pub use processor::{CrossRefEntry, Engine, Finalizer, Mode, Processor};
pub use schema::{
    NumberSchema, ObjectSchema, OneOfCandidate, PropertySpec, SchemaKind, StringSchema, ValueSchema,
};
pub use version::{SpecVersion, Support, VersionDetection, detect};
