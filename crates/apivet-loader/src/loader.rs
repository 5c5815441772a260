//! The pluggable resource loader chain.

use crate::env::{Environment, is_url};
use async_trait::async_trait;
use std::collections::HashMap;

/// What a loader did with a load request.
///
/// Declining is the normal miss case — the next loader in the chain gets
/// its turn, and if every loader declines the concatenated reasons become
/// one `LOAD_FAILED` diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded {
        content: String,
        /// Loader-declared content type, consulted first by format sniffing
        content_type: Option<String>,
    },
    Declined {
        reason: String,
    },
}

/// A source of raw document text.
#[async_trait(?Send)]
pub trait ResourceLoader {
    /// Short name used in declination reports.
    fn name(&self) -> &'static str;

    async fn load(&self, path: &str, env: &dyn Environment) -> LoadOutcome;
}

/// Ordered loader chain; the most recently registered loader is tried
/// first.
#[derive(Default)]
pub struct LoaderSet {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl LoaderSet {
    pub fn new() -> Self {
        LoaderSet::default()
    }

    /// The built-in chain: filesystem first, then HTTP.
    pub fn standard() -> Self {
        let mut set = LoaderSet::new();
        set.register(HttpLoader);
        set.register(FileLoader);
        set
    }

    pub fn register(&mut self, loader: impl ResourceLoader + 'static) {
        self.loaders.push(Box::new(loader));
    }

    /// Try each loader in order. On total failure, returns every loader's
    /// declination as `(name, reason)` pairs.
    pub async fn try_load(
        &self,
        path: &str,
        env: &dyn Environment,
    ) -> Result<(String, Option<String>), Vec<(String, String)>> {
        let mut reasons = Vec::new();
        for loader in self.loaders.iter().rev() {
            match loader.load(path, env).await {
                LoadOutcome::Loaded {
                    content,
                    content_type,
                } => {
                    tracing::debug!(loader = loader.name(), %path, "resource loaded");
                    return Ok((content, content_type));
                }
                LoadOutcome::Declined { reason } => {
                    reasons.push((loader.name().to_string(), reason));
                }
            }
        }
        Err(reasons)
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// Reads local files with tokio.
pub struct FileLoader;

#[async_trait(?Send)]
impl ResourceLoader for FileLoader {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self, path: &str, _env: &dyn Environment) -> LoadOutcome {
        if is_url(path) {
            return LoadOutcome::Declined {
                reason: "not a filesystem path".to_string(),
            };
        }
        match tokio::fs::read_to_string(path).await {
            Ok(content) => LoadOutcome::Loaded {
                content,
                content_type: None,
            },
            Err(e) => LoadOutcome::Declined {
                reason: e.to_string(),
            },
        }
    }
}

/// Fetches http(s) URLs through the environment's request primitive.
pub struct HttpLoader;

#[async_trait(?Send)]
impl ResourceLoader for HttpLoader {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn load(&self, path: &str, env: &dyn Environment) -> LoadOutcome {
        if !is_url(path) {
            return LoadOutcome::Declined {
                reason: "not an http(s) URL".to_string(),
            };
        }
        match env.request(path).await {
            Ok(response) if (200..300).contains(&response.status) => LoadOutcome::Loaded {
                content: response.data,
                content_type: response.content_type,
            },
            Ok(response) => LoadOutcome::Declined {
                reason: format!("HTTP status {}", response.status),
            },
            Err(e) => LoadOutcome::Declined {
                reason: e.to_string(),
            },
        }
    }
}

/// In-memory fixtures, keyed by exact resolved path.
#[derive(Default)]
pub struct MemoryLoader {
    entries: HashMap<String, (String, Option<String>)>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.entries.insert(path.into(), (content.into(), None));
        self
    }

    pub fn insert_typed(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> &mut Self {
        self.entries
            .insert(path.into(), (content.into(), Some(content_type.into())));
        self
    }
}

#[async_trait(?Send)]
impl ResourceLoader for MemoryLoader {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, path: &str, _env: &dyn Environment) -> LoadOutcome {
        match self.entries.get(path) {
            Some((content, content_type)) => LoadOutcome::Loaded {
                content: content.clone(),
                content_type: content_type.clone(),
            },
            None => LoadOutcome::Declined {
                reason: format!("no in-memory fixture for {path}"),
            },
        }
    }
}
