//! # apivet-loader
//!
//! Resource loading and reference resolution.
//!
//! Given a path or URL, this crate loads the document text through a
//! pluggable chain of [`ResourceLoader`]s, parses it into a located node
//! tree, and dereferences every `$ref` — local, cross-document, or
//! whole-document — substituting resolved values in place. Cross-document
//! loads for sibling references run concurrently on the single-threaded
//! cooperative runtime and share one write-once cache keyed by resolved
//! absolute path, so a file is parsed once no matter how many references
//! target it.
//!
//! Resolution is best-effort: an unreachable resource or a dangling
//! pointer becomes a diagnostic and resolution continues elsewhere. Only
//! configuration mistakes fail hard.

mod env;
mod loader;
mod resolver;

pub use env::{Environment, HttpResponse, OsEnvironment};
pub use loader::{FileLoader, HttpLoader, LoadOutcome, LoaderSet, MemoryLoader, ResourceLoader};
pub use resolver::{LoadResult, load, load_into};
