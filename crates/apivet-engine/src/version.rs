//! Specification versions and per-component support.

use apivet_document::{Node, NodeId};
use std::fmt;
use std::str::FromStr;

/// An OpenAPI/Swagger specification version apivet understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpecVersion {
    V2_0,
    V3_0_0,
    V3_0_1,
    V3_0_2,
    V3_0_3,
}

impl SpecVersion {
    /// All versions, ascending.
    pub const ALL: &[SpecVersion] = &[
        SpecVersion::V2_0,
        SpecVersion::V3_0_0,
        SpecVersion::V3_0_1,
        SpecVersion::V3_0_2,
        SpecVersion::V3_0_3,
    ];

    pub fn latest() -> SpecVersion {
        SpecVersion::V3_0_3
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecVersion::V2_0 => "2.0",
            SpecVersion::V3_0_0 => "3.0.0",
            SpecVersion::V3_0_1 => "3.0.1",
            SpecVersion::V3_0_2 => "3.0.2",
            SpecVersion::V3_0_3 => "3.0.3",
        }
    }

    pub fn is_v2(&self) -> bool {
        matches!(self, SpecVersion::V2_0)
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2.0" => Ok(SpecVersion::V2_0),
            // A bare "3.0" means the first 3.0 release.
            "3.0" | "3.0.0" => Ok(SpecVersion::V3_0_0),
            "3.0.1" => Ok(SpecVersion::V3_0_1),
            "3.0.2" => Ok(SpecVersion::V3_0_2),
            "3.0.3" => Ok(SpecVersion::V3_0_3),
            other => Err(format!("unrecognized specification version {other:?}")),
        }
    }
}

/// Whether a component type exists in a given specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Supported,
    /// Supported, with a canonical documentation link
    Documented(&'static str),
    Unsupported,
}

impl Support {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Support::Unsupported)
    }

    pub fn reference(&self) -> Option<&'static str> {
        match self {
            Support::Documented(url) => Some(url),
            _ => None,
        }
    }
}

/// What a document declares about its own version.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionDetection {
    Declared(SpecVersion),
    /// A version field exists but isn't one apivet recognizes
    Unknown { raw: String, node: NodeId },
    Missing,
}

/// Read the `openapi` (3.x) or `swagger` (2.0) field of a root document.
pub fn detect(root: &Node) -> VersionDetection {
    for key in ["openapi", "swagger"] {
        let Some(declared) = root.get(key) else {
            continue;
        };
        let Some(raw) = declared.as_str() else {
            return VersionDetection::Unknown {
                raw: declared.to_json().to_string(),
                node: declared.id,
            };
        };
        return match raw.parse() {
            Ok(version) => VersionDetection::Declared(version),
            Err(_) => VersionDetection::Unknown {
                raw: raw.to_string(),
                node: declared.id,
            },
        };
    }
    VersionDetection::Missing
}
