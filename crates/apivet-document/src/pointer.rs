//! JSON-Pointer paths.

use crate::node::Node;
use std::fmt;

/// A JSON-Pointer path into a document.
///
/// Segments are stored unescaped; `~1` and `~0` are decoded on parse and
/// re-encoded on display, per RFC 6901. The empty pointer addresses the
/// whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer(Vec<String>);

impl Pointer {
    /// The whole-document pointer.
    pub fn root() -> Self {
        Pointer::default()
    }

    /// Parse a pointer string such as `/paths/~1pets/get`.
    ///
    /// Accepts an optional leading `#`. Returns `None` for a non-empty
    /// pointer that does not start with `/`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.strip_prefix('#').unwrap_or(text);
        if text.is_empty() {
            return Some(Pointer::root());
        }
        let rest = text.strip_prefix('/')?;
        Some(Pointer(rest.split('/').map(unescape).collect()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend with one segment.
    pub fn child(&self, segment: impl Into<String>) -> Pointer {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Pointer(segments)
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Follow this pointer through a node tree.
    ///
    /// Object segments match entry keys; array segments must parse as
    /// indices. Returns `None` when any segment fails to match.
    pub fn locate<'a>(&self, root: &'a Node) -> Option<&'a Node> {
        let mut current = root;
        for segment in &self.0 {
            current = match &current.value {
                crate::node::Value::Object(_) => current.get(segment)?,
                crate::node::Value::Array(_) => {
                    let index: usize = segment.parse().ok()?;
                    current.get_item(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable variant of [`Pointer::locate`].
    pub fn locate_mut<'a>(&self, root: &'a mut Node) -> Option<&'a mut Node> {
        let mut current = root;
        for segment in &self.0 {
            current = match &mut current.value {
                crate::node::Value::Object(entries) => entries
                    .iter_mut()
                    .find(|e| e.key == *segment)
                    .map(|e| &mut e.value)?,
                crate::node::Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// True when `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Pointer) -> bool {
        other.0.len() >= self.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

fn unescape(segment: &str) -> String {
    // Order matters: ~1 first, then ~0, so "~01" decodes to "~1".
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}
