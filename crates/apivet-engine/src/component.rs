//! The object-type contract.
//!
//! Every OpenAPI object type — built-in or supplied by an external
//! catalog — implements [`ObjectType`]: a per-version support table, a
//! declarative object schema, and optional hooks. This is the sole
//! extension point for teaching the engine a new object type.

use crate::processor::Processor;
use crate::schema::ObjectSchema;
use crate::version::{SpecVersion, Support};

/// A declaratively-described OpenAPI object type.
pub trait ObjectType {
    /// Registry name, referenced by `SchemaKind::Component`.
    fn name(&self) -> &'static str;

    /// Whether this type exists in the given specification version.
    fn support(&self, version: SpecVersion) -> Support;

    /// The declarative schema driving structural checks.
    ///
    /// Called once per processed node; implementations memoize the
    /// computed schema (the built-ins use `once_cell`).
    fn schema(&self, version: SpecVersion) -> &ObjectSchema;

    /// Custom checks on the raw definition, before children process.
    fn validate(&self, cx: &mut Processor<'_, '_>) {
        let _ = cx;
    }

    /// Build-mode transformation of the in-progress built value. Runs
    /// after children, before [`ObjectType::after`].
    fn build(&self, cx: &mut Processor<'_, '_>) {
        let _ = cx;
    }

    /// Cross-field checks; every child is fully processed by the time
    /// this runs, so derived child values are available.
    fn after(&self, cx: &mut Processor<'_, '_>) {
        let _ = cx;
    }
}
