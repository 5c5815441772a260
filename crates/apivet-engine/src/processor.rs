//! The schema-driven tree walker.
//!
//! One [`Engine::validate`] or [`Engine::build`] call walks a raw
//! definition alongside the declarative schema for the target component
//! type. Each component node goes through the same lifecycle: version
//! gate, custom validate hook, declared properties (in declaration
//! order), dynamic/additional properties, then the after hook once every
//! child has fully processed. Checks that need whole-document visibility
//! register on the shared, identifier-deduplicated lastly queue, which
//! runs once after the full pass.

use crate::component::ObjectType;
use crate::schema::{ObjectSchema, SchemaKind, ValueSchema};
use crate::version::SpecVersion;
use apivet_diagnostics::{Diagnostic, DiagnosticsStore, SourceLocation, codes};
use apivet_document::{DocumentSet, Located, LookupKind, Node};
use regex::Regex;
use serde_json::Value as Json;
use std::collections::{BTreeMap, HashMap};

/// Whether the engine builds a typed value or only validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Build,
    Validate,
}

/// One entry in the cross-reference map: where a named thing was seen.
#[derive(Debug, Clone)]
pub struct CrossRefEntry {
    pub path: Vec<String>,
    pub location: Option<SourceLocation>,
}

/// State handed to deferred checks after the full pass.
pub struct Finalizer<'f> {
    pub store: &'f mut DiagnosticsStore,
    /// (category, key) → every sighting, in a stable order
    pub crossref: &'f BTreeMap<(String, String), Vec<CrossRefEntry>>,
}

/// Root-shared traversal state.
struct Shared<'a> {
    docs: &'a DocumentSet,
    store: &'a mut DiagnosticsStore,
    lastly: Vec<(String, Box<dyn FnOnce(&mut Finalizer<'_>) + 'a>)>,
    crossref: BTreeMap<(String, String), Vec<CrossRefEntry>>,
}

/// The view a component hook gets of the node being processed.
pub struct Processor<'a, 'b> {
    node: &'a Node,
    version: SpecVersion,
    mode: Mode,
    path: &'b [String],
    built: &'b mut Json,
    shared: &'b mut Shared<'a>,
}

impl<'a, 'b> Processor<'a, 'b> {
    /// The raw definition.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn version(&self) -> SpecVersion {
        self.version
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Breadcrumb path of this node from the document root.
    pub fn path(&self) -> &[String] {
        self.path
    }

    /// The in-progress built value (an object map for components).
    pub fn built(&mut self) -> &mut Json {
        self.built
    }

    /// Source location of this node, or of one of its properties.
    pub fn location(&self, key: Option<&str>, kind: LookupKind) -> Option<SourceLocation> {
        locate(self.shared, self.node, key, kind)
    }

    /// Record a diagnostic at this node's context.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.shared.store.add(self.path, diagnostic);
    }

    /// Record a diagnostic under a property of this node, located at the
    /// property's key or value span.
    pub fn report_at(&mut self, key: &str, kind: LookupKind, diagnostic: Diagnostic) {
        let diagnostic = match self.location(Some(key), kind) {
            Some(location) => diagnostic.at(location),
            None => diagnostic,
        };
        let mut path = self.path.to_vec();
        path.push(key.to_string());
        self.shared.store.add(&path, diagnostic);
    }

    /// File a sighting into the cross-reference map for deferred lookups.
    pub fn crossref(&mut self, category: &str, key: &str, location: Option<SourceLocation>) {
        self.shared
            .crossref
            .entry((category.to_string(), key.to_string()))
            .or_default()
            .push(CrossRefEntry {
                path: self.path.to_vec(),
                location,
            });
    }

    /// Register a deferred check, deduplicated by identifier: the first
    /// registration wins, later ones are dropped, and the task runs once
    /// after the full pass.
    pub fn lastly(&mut self, id: &str, task: impl FnOnce(&mut Finalizer<'_>) + 'a) {
        if self.shared.lastly.iter().any(|(existing, _)| existing == id) {
            return;
        }
        self.shared.lastly.push((id.to_string(), Box::new(task)));
    }
}

/// The component registry plus the walker.
#[derive(Default)]
pub struct Engine {
    registry: HashMap<&'static str, Box<dyn ObjectType>>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    /// An engine preloaded with the built-in component subset.
    pub fn with_builtins() -> Self {
        let mut engine = Engine::new();
        crate::builtin::register_builtins(&mut engine);
        engine
    }

    pub fn register(&mut self, component: impl ObjectType + 'static) {
        self.registry.insert(component.name(), Box::new(component));
    }

    pub fn component(&self, name: &str) -> Option<&dyn ObjectType> {
        self.registry.get(name).map(|c| c.as_ref())
    }

    /// The highest version the component supports, used when the caller
    /// doesn't pin one.
    pub fn default_version(&self, component: &str) -> SpecVersion {
        let Some(component) = self.component(component) else {
            return SpecVersion::latest();
        };
        SpecVersion::ALL
            .iter()
            .rev()
            .copied()
            .find(|v| component.support(*v).is_supported())
            .unwrap_or_else(SpecVersion::latest)
    }

    /// Validate a definition against a component type.
    pub fn validate(
        &self,
        component: &str,
        node: &Node,
        version: Option<SpecVersion>,
        docs: &DocumentSet,
        store: &mut DiagnosticsStore,
    ) {
        self.run(Mode::Validate, component, node, version, docs, store);
    }

    /// Build the typed value for a definition, validating along the way.
    pub fn build(
        &self,
        component: &str,
        node: &Node,
        version: Option<SpecVersion>,
        docs: &DocumentSet,
        store: &mut DiagnosticsStore,
    ) -> Json {
        self.run(Mode::Build, component, node, version, docs, store)
    }

    fn run(
        &self,
        mode: Mode,
        component: &str,
        node: &Node,
        version: Option<SpecVersion>,
        docs: &DocumentSet,
        store: &mut DiagnosticsStore,
    ) -> Json {
        let version = version.unwrap_or_else(|| self.default_version(component));
        tracing::debug!(component, %version, ?mode, "processing definition");

        let mut shared = Shared {
            docs,
            store,
            lastly: Vec::new(),
            crossref: BTreeMap::new(),
        };
        let mut path = Vec::new();
        let built = self.process_component(component, node, version, &mut path, &mut shared, mode);

        let Shared {
            store,
            lastly,
            crossref,
            ..
        } = shared;
        let mut finalizer = Finalizer {
            store,
            crossref: &crossref,
        };
        for (id, task) in lastly {
            tracing::trace!(%id, "running deferred check");
            task(&mut finalizer);
        }
        built
    }

    fn process_component<'a>(
        &self,
        name: &str,
        node: &'a Node,
        version: SpecVersion,
        path: &mut Vec<String>,
        shared: &mut Shared<'a>,
        mode: Mode,
    ) -> Json {
        let component = self
            .registry
            .get(name)
            .unwrap_or_else(|| {
                panic!("component type {name} is not registered - this is a bug in the schema catalog")
            })
            .as_ref();

        if !component.support(version).is_supported() {
            let mut diagnostic = Diagnostic::new(codes::VERSION_NOT_SUPPORTED)
                .meta("component", name)
                .meta("version", version.as_str());
            if let Some(location) = locate(shared, node, None, LookupKind::Value) {
                diagnostic = diagnostic.at(location);
            }
            shared.store.add(path, diagnostic);
            // Structural property checks are skipped for an unsupported
            // component.
            return Json::Null;
        }

        if !node.is_object() {
            report_type_mismatch(shared, path, node, "object");
            return Json::Null;
        }

        let mut built = Json::Object(serde_json::Map::new());

        {
            let mut cx = Processor {
                node,
                version,
                mode,
                path,
                built: &mut built,
                shared,
            };
            component.validate(&mut cx);
        }

        let schema = component.schema(version);
        self.process_object_schema(schema, node, &mut built, version, path, shared, mode);

        {
            let mut cx = Processor {
                node,
                version,
                mode,
                path,
                built: &mut built,
                shared,
            };
            if mode == Mode::Build {
                component.build(&mut cx);
            }
            component.after(&mut cx);
        }

        built
    }

    fn process_object_schema<'a>(
        &self,
        schema: &ObjectSchema,
        node: &'a Node,
        built: &mut Json,
        version: SpecVersion,
        path: &mut Vec<String>,
        shared: &mut Shared<'a>,
        mode: Mode,
    ) {
        // Declared properties first, in declaration order.
        for prop in &schema.properties {
            match node.get(prop.name) {
                Some(child) => {
                    if let Some(predicate) = prop.not_allowed
                        && let Some(reason) = predicate(node)
                    {
                        let mut diagnostic = Diagnostic::new(codes::PROP_NOT_ALLOWED)
                            .meta("property", prop.name)
                            .meta("reason", reason);
                        if let Some(location) = locate(shared, node, Some(prop.name), LookupKind::Key)
                        {
                            diagnostic = diagnostic.at(location);
                        }
                        path.push(prop.name.to_string());
                        shared.store.add(path, diagnostic);
                        path.pop();
                        continue;
                    }

                    path.push(prop.name.to_string());
                    let value = self.process_value(&prop.schema, child, version, path, shared, mode);
                    path.pop();
                    if mode == Mode::Build {
                        insert_built(built, prop.name, value);
                    }
                }
                None => {
                    if prop.required {
                        let mut diagnostic = Diagnostic::new(codes::REQUIRED_MISSING)
                            .meta("property", prop.name);
                        if let Some(location) = locate(shared, node, None, LookupKind::Value) {
                            diagnostic = diagnostic.at(location);
                        }
                        shared.store.add(path, diagnostic);
                    } else if mode == Mode::Build
                        && let Some(default) = &prop.schema.default
                    {
                        insert_built(built, prop.name, default.clone());
                    }
                }
            }
        }

        // Dynamic and additional properties after the declared ones.
        let entries = node.entries().unwrap_or_default();
        for entry in entries {
            if schema.property(&entry.key).is_some() {
                continue;
            }
            if entry.key.starts_with("x-") && schema.allows_extensions {
                if mode == Mode::Build {
                    insert_built(built, &entry.key, entry.value.to_json());
                }
                continue;
            }
            if let Some(additional) = &schema.additional {
                path.push(entry.key.clone());
                let value = self.process_value(additional, &entry.value, version, path, shared, mode);
                path.pop();
                if mode == Mode::Build {
                    insert_built(built, &entry.key, value);
                }
                continue;
            }

            let mut diagnostic =
                Diagnostic::new(codes::PROP_UNKNOWN).meta("property", entry.key.clone());
            if let Some(location) = locate(shared, node, Some(&entry.key), LookupKind::Key) {
                diagnostic = diagnostic.at(location);
            }
            path.push(entry.key.clone());
            shared.store.add(path, diagnostic);
            path.pop();
        }
    }

    fn process_value<'a>(
        &self,
        schema: &ValueSchema,
        node: &'a Node,
        version: SpecVersion,
        path: &mut Vec<String>,
        shared: &mut Shared<'a>,
        mode: Mode,
    ) -> Json {
        if node.is_null() {
            if !schema.nullable {
                report_at_node(shared, path, node, Diagnostic::new(codes::NULL_INVALID));
            }
            return Json::Null;
        }

        if let Some(values) = &schema.enum_values {
            let actual = node.to_json();
            if !values.contains(&actual) {
                report_at_node(
                    shared,
                    path,
                    node,
                    Diagnostic::new(codes::ENUM_MISMATCH)
                        .meta("allowed", Json::Array(values.clone()))
                        .meta("actual", actual.clone()),
                );
                return actual;
            }
        }

        match &schema.kind {
            SchemaKind::Any => node.to_json(),

            SchemaKind::Boolean => {
                if node.as_bool().is_none() {
                    report_type_mismatch(shared, path, node, "boolean");
                }
                node.to_json()
            }

            SchemaKind::Number(bounds) => {
                let Some(value) = node.as_f64() else {
                    report_type_mismatch(shared, path, node, "number");
                    return node.to_json();
                };
                let mut check = |constraint: &str, limit: f64, failed: bool| {
                    if failed {
                        report_at_node(
                            shared,
                            path,
                            node,
                            Diagnostic::new(codes::NUM_OUT_OF_RANGE)
                                .meta("constraint", constraint)
                                .meta("limit", limit)
                                .meta("actual", value),
                        );
                    }
                };
                if let Some(min) = bounds.minimum {
                    check("at least", min, value < min);
                }
                if let Some(max) = bounds.maximum {
                    check("at most", max, value > max);
                }
                if let Some(min) = bounds.exclusive_minimum {
                    check("greater than", min, value <= min);
                }
                if let Some(max) = bounds.exclusive_maximum {
                    check("less than", max, value >= max);
                }
                node.to_json()
            }

            SchemaKind::String(constraints) => {
                let Some(value) = node.as_str() else {
                    report_type_mismatch(shared, path, node, "string");
                    return node.to_json();
                };
                if let Some(min) = constraints.min_length
                    && value.len() < min
                {
                    report_at_node(
                        shared,
                        path,
                        node,
                        Diagnostic::new(codes::STR_LENGTH)
                            .meta("constraint", "at least")
                            .meta("limit", min)
                            .meta("actual", value.len()),
                    );
                }
                if let Some(max) = constraints.max_length
                    && value.len() > max
                {
                    report_at_node(
                        shared,
                        path,
                        node,
                        Diagnostic::new(codes::STR_LENGTH)
                            .meta("constraint", "at most")
                            .meta("limit", max)
                            .meta("actual", value.len()),
                    );
                }
                if let Some(pattern) = constraints.pattern {
                    let regex = Regex::new(pattern).unwrap_or_else(|e| {
                        panic!("invalid pattern {pattern:?} in schema: {e} - this is a bug in the schema catalog")
                    });
                    if !regex.is_match(value) {
                        report_at_node(
                            shared,
                            path,
                            node,
                            Diagnostic::new(codes::STR_PATTERN).meta("pattern", pattern),
                        );
                    }
                }
                node.to_json()
            }

            SchemaKind::Array(items) => {
                let Some(elements) = node.items() else {
                    report_type_mismatch(shared, path, node, "array");
                    return node.to_json();
                };
                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    path.push(i.to_string());
                    out.push(self.process_value(items, element, version, path, shared, mode));
                    path.pop();
                }
                Json::Array(out)
            }

            SchemaKind::Object(object) => {
                if !node.is_object() {
                    report_type_mismatch(shared, path, node, "object");
                    return node.to_json();
                }
                let mut built = Json::Object(serde_json::Map::new());
                self.process_object_schema(object, node, &mut built, version, path, shared, mode);
                built
            }

            SchemaKind::Component(name) => {
                self.process_component(name, node, version, path, shared, mode)
            }

            SchemaKind::OneOf(candidates) => {
                for candidate in candidates {
                    if (candidate.when)(node) {
                        return self.process_value(&candidate.schema, node, version, path, shared, mode);
                    }
                }
                report_at_node(shared, path, node, Diagnostic::new(codes::ONE_OF_NO_MATCH));
                node.to_json()
            }
        }
    }
}

fn insert_built(built: &mut Json, key: &str, value: Json) {
    if let Json::Object(map) = built {
        map.insert(key.to_string(), value);
    }
}

fn locate(
    shared: &Shared<'_>,
    node: &Node,
    key: Option<&str>,
    kind: LookupKind,
) -> Option<SourceLocation> {
    shared.docs.index.lookup(node, key, kind).map(to_source_location)
}

fn to_source_location(located: Located) -> SourceLocation {
    SourceLocation {
        source: located.source,
        file: Some(located.file),
        pointer: located.pointer,
        range: located.range,
    }
}

fn report_at_node(shared: &mut Shared<'_>, path: &[String], node: &Node, diagnostic: Diagnostic) {
    let diagnostic = match locate(shared, node, None, LookupKind::Value) {
        Some(location) => diagnostic.at(location),
        None => diagnostic,
    };
    shared.store.add(path, diagnostic);
}

fn report_type_mismatch(shared: &mut Shared<'_>, path: &[String], node: &Node, expected: &str) {
    report_at_node(
        shared,
        path,
        node,
        Diagnostic::new(codes::TYPE_MISMATCH)
            .meta("expected", expected)
            .meta("actual", node.type_name()),
    );
}
