//! The environment adapter.
//!
//! The loader and resolver depend only on this contract for anything that
//! touches the outside world: the working directory, path arithmetic that
//! understands both URLs and filesystem paths, the platform line ending,
//! and a plain asynchronous GET. Tests and embedders swap implementations
//! without touching the resolution pipeline.

use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Response from [`Environment::request`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub data: String,
    pub content_type: Option<String>,
    pub status: u16,
}

/// Host capabilities the core depends on.
#[async_trait(?Send)]
pub trait Environment {
    /// The working directory relative paths resolve against.
    fn cwd(&self) -> String;

    /// Directory (or URL prefix) containing `path`.
    fn dirname(&self, path: &str) -> String;

    /// Resolve `relative` against a base directory, URL-aware.
    ///
    /// An absolute path or full URL passes through (normalized); a
    /// relative path joins the base, folding `.` and `..` segments.
    fn resolve(&self, base: &str, relative: &str) -> String;

    /// Platform line ending for rendered output.
    fn line_ending(&self) -> &'static str;

    /// Perform an HTTP GET.
    async fn request(&self, url: &str) -> io::Result<HttpResponse>;
}

/// True for http(s) URLs; everything else is treated as a filesystem path.
pub(crate) fn is_url(path: &str) -> bool {
    Url::parse(path).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// The real environment: std paths, url joining, reqwest.
#[derive(Debug, Default)]
pub struct OsEnvironment {
    client: reqwest::Client,
}

impl OsEnvironment {
    pub fn new() -> Self {
        OsEnvironment::default()
    }
}

#[async_trait(?Send)]
impl Environment for OsEnvironment {
    fn cwd(&self) -> String {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "/".to_string())
    }

    fn dirname(&self, path: &str) -> String {
        if is_url(path) {
            // Joining "." against a URL drops the final path segment.
            if let Ok(base) = Url::parse(path)
                && let Ok(dir) = base.join(".")
            {
                return dir.to_string();
            }
            return path.to_string();
        }
        Path::new(path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string())
    }

    fn resolve(&self, base: &str, relative: &str) -> String {
        if is_url(relative) {
            return relative.to_string();
        }
        if is_url(base) {
            if let Ok(base_url) = Url::parse(base)
                && let Ok(joined) = base_url.join(relative)
            {
                return joined.to_string();
            }
            return relative.to_string();
        }
        let path = Path::new(relative);
        if path.is_absolute() {
            return normalize(path);
        }
        normalize(&Path::new(base).join(path))
    }

    fn line_ending(&self) -> &'static str {
        if cfg!(windows) { "\r\n" } else { "\n" }
    }

    async fn request(&self, url: &str) -> io::Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(io::Error::other)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = response.text().await.map_err(io::Error::other)?;
        Ok(HttpResponse {
            data,
            content_type,
            status,
        })
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/spec.yml"));
        assert!(is_url("http://localhost:8080/a"));
        assert!(!is_url("specs/a.yml"));
        assert!(!is_url("/absolute/a.yml"));
    }

    #[test]
    fn test_dirname_fs() {
        let env = OsEnvironment::new();
        assert_eq!(env.dirname("/specs/openapi.yml"), "/specs");
        assert_eq!(env.dirname("openapi.yml"), ".");
    }

    #[test]
    fn test_dirname_url() {
        let env = OsEnvironment::new();
        assert_eq!(
            env.dirname("https://example.com/api/spec.yml"),
            "https://example.com/api/"
        );
    }

    #[test]
    fn test_resolve_relative_fs() {
        let env = OsEnvironment::new();
        assert_eq!(env.resolve("/specs", "b.yml"), "/specs/b.yml");
        assert_eq!(env.resolve("/specs/v1", "../b.yml"), "/specs/b.yml");
        assert_eq!(env.resolve("/specs", "./b.yml"), "/specs/b.yml");
    }

    #[test]
    fn test_resolve_absolute_passthrough() {
        let env = OsEnvironment::new();
        assert_eq!(env.resolve("/specs", "/other/b.yml"), "/other/b.yml");
        assert_eq!(
            env.resolve("/specs", "https://example.com/b.yml"),
            "https://example.com/b.yml"
        );
    }

    #[test]
    fn test_resolve_against_url_base() {
        let env = OsEnvironment::new();
        assert_eq!(
            env.resolve("https://example.com/api/", "schemas/pet.json"),
            "https://example.com/api/schemas/pet.json"
        );
        assert_eq!(
            env.resolve("https://example.com/api/", "../b.yml"),
            "https://example.com/b.yml"
        );
    }
}
