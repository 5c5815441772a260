//! # apivet
//!
//! Load, resolve, and vet OpenAPI documents.
//!
//! This crate assembles the pipeline: text goes through the loader chain
//! and parsers, references resolve across documents, and the resolved
//! tree validates (or builds) against the schema engine — with every
//! finding accumulated in one source-located diagnostics store.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), apivet::diagnostics::ConfigError> {
//! use apivet::{VetOptions, vet};
//!
//! let result = vet("openapi.yml", VetOptions::default()).await?;
//! if result.store.has_errors() {
//!     print!("{}", result.store.report(apivet::diagnostics::Severity::Error)
//!         .to_text(apivet::diagnostics::Verbosity::Locations));
//! }
//! # Ok(())
//! # }
//! ```

pub use apivet_diagnostics as diagnostics;
pub use apivet_document as document;
pub use apivet_engine as engine;
pub use apivet_loader as loader;
pub use apivet_source_map as source_map;

use apivet_diagnostics::{ConfigError, Diagnostic, DiagnosticsStore, Severity, SourceLocation, codes};
use apivet_document::{DocumentSet, Node};
use apivet_engine::{Engine, SpecVersion, VersionDetection};
use apivet_loader::{Environment, LoaderSet, OsEnvironment, load_into};

/// Pipeline configuration.
#[derive(Debug, Default)]
pub struct VetOptions {
    /// Pin the specification version instead of honoring the document's
    /// declaration.
    pub version: Option<SpecVersion>,
    /// Severity remaps applied before anything is recorded.
    pub remaps: Vec<(String, Severity)>,
    /// Build the typed value in addition to validating.
    pub build: bool,
}

/// Everything a vet run produces.
pub struct VetResult {
    /// The resolved root document, when it loaded at all
    pub root: Option<Node>,
    /// Resolved absolute key of the root document
    pub root_key: String,
    /// The built value, when [`VetOptions::build`] was set
    pub built: Option<serde_json::Value>,
    pub docs: DocumentSet,
    pub store: DiagnosticsStore,
}

/// Run the full pipeline with the standard environment and loader chain.
///
/// # Errors
///
/// Only configuration faults (an unknown code in a remap) return `Err`;
/// every load, reference, and validation finding lands in the result's
/// store instead.
pub async fn vet(path: &str, options: VetOptions) -> Result<VetResult, ConfigError> {
    let env = OsEnvironment::new();
    let loaders = LoaderSet::standard();
    vet_with(path, &env, &loaders, options).await
}

/// [`vet`] with a caller-supplied environment and loader chain.
pub async fn vet_with(
    path: &str,
    env: &dyn Environment,
    loaders: &LoaderSet,
    options: VetOptions,
) -> Result<VetResult, ConfigError> {
    let mut store = DiagnosticsStore::new();
    for (code, level) in &options.remaps {
        store.remap(code, *level)?;
    }

    let loaded = load_into(path, env, loaders, store).await;
    let root = loaded.root;
    let docs = loaded.docs;
    let mut store = loaded.store;

    let mut built = None;
    if let Some(root) = &root {
        let declared = match apivet_engine::detect(root) {
            VersionDetection::Declared(version) => Some(version),
            VersionDetection::Unknown { raw, node } => {
                let mut diagnostic =
                    Diagnostic::new(codes::VERSION_MISMATCH).meta("version", raw);
                if let Some(located) = docs.index.locate(node) {
                    diagnostic = diagnostic.at(SourceLocation {
                        source: located.source,
                        file: Some(located.file),
                        pointer: located.pointer,
                        range: located.range,
                    });
                }
                store.add::<&str>(&[], diagnostic);
                None
            }
            VersionDetection::Missing => None,
        };
        let version = options.version.or(declared);

        let engine = Engine::with_builtins();
        if options.build {
            built = Some(engine.build("OpenApi", root, version, &docs, &mut store));
        } else {
            engine.validate("OpenApi", root, version, &docs, &mut store);
        }
    }

    Ok(VetResult {
        root,
        root_key: loaded.root_key,
        built,
        docs,
        store,
    })
}
