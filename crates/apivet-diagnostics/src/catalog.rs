//! The embedded message catalog.
//!
//! Maps each diagnostic code to its message template, default severity,
//! the alternate severities it may be remapped to, and a documentation
//! reference. The catalog is embedded at compile time and checked for
//! completeness against [`codes::ALL`] the first time it is accessed.

use crate::severity::Severity;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known diagnostic codes.
pub mod codes {
    pub const LOAD_FAILED: &str = "LOAD_FAILED";
    pub const PARSE_FAILED: &str = "PARSE_FAILED";
    pub const REF_NOT_RESOLVED: &str = "REF_NOT_RESOLVED";
    pub const REF_CYCLE: &str = "REF_CYCLE";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const NULL_INVALID: &str = "NULL_INVALID";
    pub const REQUIRED_MISSING: &str = "REQUIRED_MISSING";
    pub const PROP_NOT_ALLOWED: &str = "PROP_NOT_ALLOWED";
    pub const PROP_UNKNOWN: &str = "PROP_UNKNOWN";
    pub const ENUM_MISMATCH: &str = "ENUM_MISMATCH";
    pub const NUM_OUT_OF_RANGE: &str = "NUM_OUT_OF_RANGE";
    pub const STR_LENGTH: &str = "STR_LENGTH";
    pub const STR_PATTERN: &str = "STR_PATTERN";
    pub const ONE_OF_NO_MATCH: &str = "ONE_OF_NO_MATCH";
    pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
    pub const VERSION_NOT_SUPPORTED: &str = "VERSION_NOT_SUPPORTED";
    pub const DUPLICATE_VALUE: &str = "DUPLICATE_VALUE";
    pub const DIAG_REMAP_INVALID: &str = "DIAG_REMAP_INVALID";

    /// Every code apivet may record. The embedded catalog must cover all
    /// of them; the check runs eagerly when the catalog loads.
    pub const ALL: &[&str] = &[
        LOAD_FAILED,
        PARSE_FAILED,
        REF_NOT_RESOLVED,
        REF_CYCLE,
        TYPE_MISMATCH,
        NULL_INVALID,
        REQUIRED_MISSING,
        PROP_NOT_ALLOWED,
        PROP_UNKNOWN,
        ENUM_MISMATCH,
        NUM_OUT_OF_RANGE,
        STR_LENGTH,
        STR_PATTERN,
        ONE_OF_NO_MATCH,
        VERSION_MISMATCH,
        VERSION_NOT_SUPPORTED,
        DUPLICATE_VALUE,
        DIAG_REMAP_INVALID,
    ];
}

/// Catalog metadata for one diagnostic code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Message template with `{placeholder}` slots filled from metadata
    pub template: String,

    /// Default severity
    pub level: Severity,

    /// Severities this code may legally be remapped to
    #[serde(default)]
    pub alternate_levels: Vec<Severity>,

    /// Documentation URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// The message catalog, embedded at compile time.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid or any code in
/// [`codes::ALL`] is missing — both are bugs in apivet, not runtime
/// conditions.
pub static CATALOG: Lazy<HashMap<String, CatalogEntry>> = Lazy::new(|| {
    let json = include_str!("../message_catalog.json");
    let catalog: HashMap<String, CatalogEntry> =
        serde_json::from_str(json).expect("invalid message catalog JSON - this is a bug in apivet");
    for code in codes::ALL {
        assert!(
            catalog.contains_key(*code),
            "message catalog is missing {code} - this is a bug in apivet"
        );
    }
    catalog
});

/// Look up a code's catalog entry.
pub fn get(code: &str) -> Option<&'static CatalogEntry> {
    CATALOG.get(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads_and_is_complete() {
        assert_eq!(CATALOG.len(), codes::ALL.len());
    }

    #[test]
    fn test_ref_not_resolved_entry() {
        let entry = get(codes::REF_NOT_RESOLVED).unwrap();
        assert_eq!(entry.level, Severity::Error);
        assert_eq!(entry.alternate_levels, vec![Severity::Warn]);
        assert!(entry.reference.as_deref().unwrap().contains("REF_NOT_RESOLVED"));
    }

    #[test]
    fn test_remap_invalid_has_no_alternates() {
        let entry = get(codes::DIAG_REMAP_INVALID).unwrap();
        assert_eq!(entry.level, Severity::Warn);
        assert!(entry.alternate_levels.is_empty());
    }

    #[test]
    fn test_unknown_code() {
        assert!(get("NOT_A_CODE").is_none());
    }
}
