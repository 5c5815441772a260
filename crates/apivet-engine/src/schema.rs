//! Declarative schema nodes.
//!
//! A [`ValueSchema`] describes one position in a definition: its shape
//! (via [`SchemaKind`]), whether null is tolerated, and an optional
//! closed value set. Object shapes list their declared properties in
//! processing order; component shapes defer to a registered
//! [`crate::ObjectType`] by name.

use apivet_document::Node;

/// The shape a schema node drives.
#[derive(Clone)]
pub enum SchemaKind {
    /// Anything goes (used for subtrees whose component types live in an
    /// external catalog)
    Any,
    Boolean,
    Number(NumberSchema),
    String(StringSchema),
    /// Array with one item schema
    Array(Box<ValueSchema>),
    /// Inline (non-component) object
    Object(ObjectSchema),
    /// A registered component type, by name
    Component(&'static str),
    /// Ordered candidates; the first predicate match wins
    OneOf(Vec<OneOfCandidate>),
}

/// Numeric bounds, with exclusive variants.
#[derive(Clone, Copy, Default)]
pub struct NumberSchema {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
}

/// String length and pattern constraints.
#[derive(Clone, Default)]
pub struct StringSchema {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
}

/// One `oneOf` candidate: an ordered predicate over the raw node and the
/// schema that applies when it matches.
#[derive(Clone)]
pub struct OneOfCandidate {
    pub when: fn(&Node) -> bool,
    pub schema: ValueSchema,
}

/// A complete schema node.
#[derive(Clone)]
pub struct ValueSchema {
    pub kind: SchemaKind,
    pub nullable: bool,
    /// Closed value set, compared structurally
    pub enum_values: Option<Vec<serde_json::Value>>,
    /// Value injected in build mode when the property is absent
    pub default: Option<serde_json::Value>,
}

impl ValueSchema {
    pub fn new(kind: SchemaKind) -> Self {
        ValueSchema {
            kind,
            nullable: false,
            enum_values: None,
            default: None,
        }
    }

    pub fn any() -> Self {
        ValueSchema::new(SchemaKind::Any)
    }

    pub fn boolean() -> Self {
        ValueSchema::new(SchemaKind::Boolean)
    }

    pub fn number(schema: NumberSchema) -> Self {
        ValueSchema::new(SchemaKind::Number(schema))
    }

    pub fn string() -> Self {
        ValueSchema::new(SchemaKind::String(StringSchema::default()))
    }

    pub fn string_with(schema: StringSchema) -> Self {
        ValueSchema::new(SchemaKind::String(schema))
    }

    pub fn array(items: ValueSchema) -> Self {
        ValueSchema::new(SchemaKind::Array(Box::new(items)))
    }

    pub fn object(schema: ObjectSchema) -> Self {
        ValueSchema::new(SchemaKind::Object(schema))
    }

    pub fn component(name: &'static str) -> Self {
        ValueSchema::new(SchemaKind::Component(name))
    }

    pub fn one_of(candidates: Vec<OneOfCandidate>) -> Self {
        ValueSchema::new(SchemaKind::OneOf(candidates))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// One declared object property.
#[derive(Clone)]
pub struct PropertySpec {
    pub name: &'static str,
    pub required: bool,
    /// When present and returning a reason, the property may not appear;
    /// the predicate sees the owning object so the condition can depend
    /// on sibling properties.
    pub not_allowed: Option<fn(&Node) -> Option<String>>,
    pub schema: ValueSchema,
}

impl PropertySpec {
    pub fn new(name: &'static str, schema: ValueSchema) -> Self {
        PropertySpec {
            name,
            required: false,
            not_allowed: None,
            schema,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn not_allowed_when(mut self, predicate: fn(&Node) -> Option<String>) -> Self {
        self.not_allowed = Some(predicate);
        self
    }
}

/// The declarative shape of an object type.
#[derive(Clone)]
pub struct ObjectSchema {
    /// Whether `x-` specification extensions are accepted
    pub allows_extensions: bool,
    /// Declared properties, processed in order before anything dynamic
    pub properties: Vec<PropertySpec>,
    /// Schema for undeclared non-extension properties; absent means
    /// undeclared properties are reported
    pub additional: Option<Box<ValueSchema>>,
}

impl ObjectSchema {
    pub fn new(properties: Vec<PropertySpec>) -> Self {
        ObjectSchema {
            allows_extensions: true,
            properties,
            additional: None,
        }
    }

    pub fn closed_to_extensions(mut self) -> Self {
        self.allows_extensions = false;
        self
    }

    pub fn with_additional(mut self, schema: ValueSchema) -> Self {
        self.additional = Some(Box::new(schema));
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }
}
