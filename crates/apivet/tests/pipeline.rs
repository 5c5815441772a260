//! Whole-pipeline behavior: load, resolve, and validate in one pass.

use apivet::diagnostics::{Severity, Verbosity, codes};
use apivet::loader::{LoaderSet, MemoryLoader, OsEnvironment};
use apivet::{VetOptions, vet_with};

fn fixtures(entries: &[(&str, &str)]) -> LoaderSet {
    let mut memory = MemoryLoader::new();
    for (path, content) in entries {
        memory.insert(*path, *content);
    }
    let mut set = LoaderSet::new();
    set.register(memory);
    set
}

const PETSTORE: &str = concat!(
    "openapi: \"3.0.0\"\n",
    "info:\n",
    "  title: Petstore\n",
    "  version: \"1.0\"\n",
    "  contact:\n",
    "    $ref: \"shared.yml#/contact\"\n",
    "paths: {}\n",
);

const SHARED: &str = concat!(
    "contact:\n",
    "  name: API Team\n",
    "  email: team@example.com\n",
);

#[tokio::test]
async fn clean_document_with_cross_file_ref_vets_clean() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[("/petstore.yml", PETSTORE), ("/shared.yml", SHARED)]);

    let result = vet_with("/petstore.yml", &env, &loaders, VetOptions::default())
        .await
        .unwrap();

    assert!(result.store.is_empty(), "got: {:?}", result.store.flatten());
    let contact = result
        .root
        .as_ref()
        .unwrap()
        .get("info")
        .and_then(|i| i.get("contact"))
        .unwrap();
    assert_eq!(contact.get("name").unwrap().as_str(), Some("API Team"));
}

#[tokio::test]
async fn validation_error_in_referenced_file_locates_the_real_source() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[
        ("/petstore.yml", PETSTORE),
        (
            "/shared.yml",
            "contact:\n  name: API Team\n  email: not-an-email\n",
        ),
    ]);

    let result = vet_with("/petstore.yml", &env, &loaders, VetOptions::default())
        .await
        .unwrap();

    let flat = result.store.flatten();
    assert_eq!(flat.len(), 1);
    let (breadcrumb, diagnostic) = &flat[0];
    assert_eq!(diagnostic.code, codes::STR_PATTERN);
    // The context follows the document structure...
    assert_eq!(breadcrumb, "info > contact > email");
    // ...but the location points into the file the value came from.
    assert_eq!(diagnostic.locations[0].source, "/shared.yml");
}

#[tokio::test]
async fn unknown_declared_version_reports_mismatch_and_still_validates() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[(
        "/spec.yml",
        "openapi: \"4.0\"\ninfo:\n  title: T\n  version: \"1\"\npaths: {}\n",
    )]);

    let result = vet_with("/spec.yml", &env, &loaders, VetOptions::default())
        .await
        .unwrap();

    let seen: Vec<&str> = result
        .store
        .flatten()
        .iter()
        .map(|(_, d)| d.code.as_str())
        .collect();
    assert!(seen.contains(&codes::VERSION_MISMATCH));
    // Validation proceeded under the default version: "openapi" is a
    // declared property there, so no unknown-property warning for it.
    assert!(!seen.contains(&codes::PROP_UNKNOWN));
}

#[tokio::test]
async fn remap_propagates_and_bad_code_is_a_hard_fault() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[(
        "/spec.yml",
        "openapi: \"3.0.0\"\ninfo:\n  title: T\n  version: \"1\"\npaths: {}\nextra: 1\n",
    )]);

    // PROP_UNKNOWN defaults to warn; remap it up to error.
    let options = VetOptions {
        remaps: vec![(codes::PROP_UNKNOWN.to_string(), Severity::Error)],
        ..VetOptions::default()
    };
    let result = vet_with("/spec.yml", &env, &loaders, options).await.unwrap();
    assert_eq!(result.store.count(Severity::Error), 1);
    assert!(result.store.has_errors());

    let options = VetOptions {
        remaps: vec![("NOT_A_CODE".to_string(), Severity::Warn)],
        ..VetOptions::default()
    };
    let err = vet_with("/spec.yml", &env, &loaders, options).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn build_mode_returns_the_built_value() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[("/petstore.yml", PETSTORE), ("/shared.yml", SHARED)]);

    let options = VetOptions {
        build: true,
        ..VetOptions::default()
    };
    let result = vet_with("/petstore.yml", &env, &loaders, options).await.unwrap();

    let built = result.built.unwrap();
    assert_eq!(built["info"]["title"], serde_json::json!("Petstore"));
    assert_eq!(
        built["info"]["contact"]["email"],
        serde_json::json!("team@example.com")
    );
}

#[tokio::test]
async fn text_report_renders_breadcrumbs_and_locations() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[(
        "/spec.yml",
        "openapi: \"3.0.0\"\ninfo:\n  title: 5\n  version: \"1\"\npaths: {}\n",
    )]);

    let result = vet_with("/spec.yml", &env, &loaders, VetOptions::default())
        .await
        .unwrap();

    let text = result.store.report(Severity::Error).to_text(Verbosity::Locations);
    assert!(text.starts_with("1 error\n"));
    assert!(text.contains("at: info > title"));
    assert!(text.contains("/spec.yml:3:"));
}

#[tokio::test]
async fn root_load_failure_yields_no_root_and_one_diagnostic() {
    let env = OsEnvironment::new();
    let loaders = fixtures(&[]);

    let result = vet_with("/missing.yml", &env, &loaders, VetOptions::default())
        .await
        .unwrap();

    assert!(result.root.is_none());
    assert!(result.built.is_none());
    assert_eq!(result.store.count(Severity::Error), 1);
    assert_eq!(result.store.flatten()[0].1.code, codes::LOAD_FAILED);
}
