//! Built-in component types.
//!
//! The full per-object-type catalog lives outside the engine; this subset
//! covers the document root and the objects reachable from `info`,
//! `tags`, and `externalDocs`, which is enough to vet a document's
//! descriptive surface and to exercise every engine mechanism. Everything
//! else under `paths`/`components` passes through unvalidated until a
//! catalog registers types for it.

use crate::component::ObjectType;
use crate::processor::{Engine, Processor};
use crate::schema::{ObjectSchema, PropertySpec, StringSchema, ValueSchema};
use crate::version::{SpecVersion, Support};
use apivet_diagnostics::{Diagnostic, codes};
use apivet_document::LookupKind;
use once_cell::sync::Lazy;
use serde_json::json;

/// Register the built-in subset on an engine.
pub fn register_builtins(engine: &mut Engine) {
    engine.register(OpenApi);
    engine.register(Info);
    engine.register(Contact);
    engine.register(License);
    engine.register(Tag);
    engine.register(ExternalDocumentation);
}

/// The document root.
pub struct OpenApi;

static OPENAPI_V3: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("openapi", ValueSchema::string()).required(),
        PropertySpec::new("info", ValueSchema::component("Info")).required(),
        PropertySpec::new("servers", ValueSchema::array(ValueSchema::any())),
        PropertySpec::new("paths", ValueSchema::any()).required(),
        PropertySpec::new("components", ValueSchema::any()),
        PropertySpec::new("security", ValueSchema::array(ValueSchema::any())),
        PropertySpec::new("tags", ValueSchema::array(ValueSchema::component("Tag"))),
        PropertySpec::new(
            "externalDocs",
            ValueSchema::component("ExternalDocumentation"),
        ),
    ])
});

static OPENAPI_V2: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("swagger", ValueSchema::string().with_enum(vec![json!("2.0")]))
            .required(),
        PropertySpec::new("info", ValueSchema::component("Info")).required(),
        PropertySpec::new("host", ValueSchema::string()),
        PropertySpec::new(
            "basePath",
            ValueSchema::string_with(StringSchema {
                pattern: Some("^/"),
                ..Default::default()
            }),
        ),
        PropertySpec::new(
            "schemes",
            ValueSchema::array(ValueSchema::string().with_enum(vec![
                json!("http"),
                json!("https"),
                json!("ws"),
                json!("wss"),
            ])),
        ),
        PropertySpec::new("consumes", ValueSchema::array(ValueSchema::string())),
        PropertySpec::new("produces", ValueSchema::array(ValueSchema::string())),
        PropertySpec::new("paths", ValueSchema::any()).required(),
        PropertySpec::new("definitions", ValueSchema::any()),
        PropertySpec::new("parameters", ValueSchema::any()),
        PropertySpec::new("responses", ValueSchema::any()),
        PropertySpec::new("securityDefinitions", ValueSchema::any()),
        PropertySpec::new("security", ValueSchema::array(ValueSchema::any())),
        PropertySpec::new("tags", ValueSchema::array(ValueSchema::component("Tag"))),
        PropertySpec::new(
            "externalDocs",
            ValueSchema::component("ExternalDocumentation"),
        ),
    ])
});

impl ObjectType for OpenApi {
    fn name(&self) -> &'static str {
        "OpenApi"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#swagger-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#openapi-object")
        }
    }

    fn schema(&self, version: SpecVersion) -> &ObjectSchema {
        if version.is_v2() { &OPENAPI_V2 } else { &OPENAPI_V3 }
    }
}

/// The `info` object.
pub struct Info;

static INFO_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("title", ValueSchema::string()).required(),
        PropertySpec::new("description", ValueSchema::string()),
        PropertySpec::new("termsOfService", ValueSchema::string()),
        PropertySpec::new("contact", ValueSchema::component("Contact")),
        PropertySpec::new("license", ValueSchema::component("License")),
        PropertySpec::new("version", ValueSchema::string()).required(),
    ])
});

impl ObjectType for Info {
    fn name(&self) -> &'static str {
        "Info"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#info-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#info-object")
        }
    }

    fn schema(&self, _version: SpecVersion) -> &ObjectSchema {
        &INFO_SCHEMA
    }
}

/// The `info.contact` object.
pub struct Contact;

static CONTACT_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("name", ValueSchema::string()),
        PropertySpec::new("url", ValueSchema::string()),
        PropertySpec::new(
            "email",
            ValueSchema::string_with(StringSchema {
                pattern: Some(r"^[^\s@]+@[^\s@]+$"),
                ..Default::default()
            }),
        ),
    ])
});

impl ObjectType for Contact {
    fn name(&self) -> &'static str {
        "Contact"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#contact-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#contact-object")
        }
    }

    fn schema(&self, _version: SpecVersion) -> &ObjectSchema {
        &CONTACT_SCHEMA
    }
}

/// The `info.license` object.
pub struct License;

static LICENSE_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("name", ValueSchema::string()).required(),
        PropertySpec::new("url", ValueSchema::string()),
        // An SPDX identifier names the license; a URL points at its text.
        // Declaring both is contradictory.
        PropertySpec::new("identifier", ValueSchema::string()).not_allowed_when(|node| {
            node.get("url")
                .map(|_| "identifier and url are mutually exclusive".to_string())
        }),
    ])
});

impl ObjectType for License {
    fn name(&self) -> &'static str {
        "License"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#license-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#license-object")
        }
    }

    fn schema(&self, _version: SpecVersion) -> &ObjectSchema {
        &LICENSE_SCHEMA
    }
}

/// A root-level `tags` entry.
pub struct Tag;

static TAG_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("name", ValueSchema::string()).required(),
        PropertySpec::new("description", ValueSchema::string()),
        PropertySpec::new(
            "externalDocs",
            ValueSchema::component("ExternalDocumentation"),
        ),
    ])
});

impl ObjectType for Tag {
    fn name(&self) -> &'static str {
        "Tag"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#tag-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#tag-object")
        }
    }

    fn schema(&self, _version: SpecVersion) -> &ObjectSchema {
        &TAG_SCHEMA
    }

    fn validate(&self, cx: &mut Processor<'_, '_>) {
        // Tag names must be unique across the whole document, which a
        // local walk cannot see; sightings go to the cross-reference map
        // and one deferred check sweeps them.
        let Some(name) = cx.node().get("name").and_then(|n| n.as_str()) else {
            return;
        };
        let location = cx.location(Some("name"), LookupKind::Value);
        cx.crossref("tag", name, location);

        cx.lastly("unique-tag-names", |finalizer| {
            for ((category, name), sightings) in finalizer.crossref {
                if category.as_str() != "tag" || sightings.len() < 2 {
                    continue;
                }
                let mut diagnostic = Diagnostic::new(codes::DUPLICATE_VALUE)
                    .meta("kind", "tag name")
                    .meta("value", name.clone());
                for sighting in sightings {
                    if let Some(location) = &sighting.location {
                        diagnostic = diagnostic.at(location.clone());
                    }
                }
                let context: Vec<String> = sightings[0]
                    .path
                    .iter()
                    .take(sightings[0].path.len().saturating_sub(1))
                    .cloned()
                    .collect();
                finalizer.store.add(&context, diagnostic);
            }
        });
    }
}

/// The `externalDocs` object.
pub struct ExternalDocumentation;

static EXTERNAL_DOCS_SCHEMA: Lazy<ObjectSchema> = Lazy::new(|| {
    ObjectSchema::new(vec![
        PropertySpec::new("url", ValueSchema::string()).required(),
        PropertySpec::new("description", ValueSchema::string()),
    ])
});

impl ObjectType for ExternalDocumentation {
    fn name(&self) -> &'static str {
        "ExternalDocumentation"
    }

    fn support(&self, version: SpecVersion) -> Support {
        if version.is_v2() {
            Support::Documented("https://swagger.io/specification/v2/#external-documentation-object")
        } else {
            Support::Documented("https://spec.openapis.org/oas/v3.0.3.html#external-documentation-object")
        }
    }

    fn schema(&self, _version: SpecVersion) -> &ObjectSchema {
        &EXTERNAL_DOCS_SCHEMA
    }
}
