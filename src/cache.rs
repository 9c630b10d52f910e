use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::Result;

/// Key-value cache of serialized collections, one JSON file per namespace.
///
/// Last write wins. Entries never expire.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_namespace(namespace)))
    }

    pub async fn write<T: Serialize + ?Sized>(&self, namespace: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let content = serde_json::to_string(value)?;
        let path = self.path_for(namespace);
        fs::write(&path, content).await?;
        debug!(namespace, path = %path.display(), "cache entry written");
        Ok(())
    }

    /// Reads an entry, returning `default` when it is absent or unreadable.
    pub async fn read<T: DeserializeOwned>(&self, namespace: &str, default: T) -> T {
        let path = self.path_for(namespace);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return default,
            Err(e) => {
                warn!(namespace, error = %e, "failed to read cache entry, using default");
                return default;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!(namespace, error = %e, "corrupt cache entry, using default");
                default
            }
        }
    }

    pub async fn remove(&self, namespace: &str) -> Result<()> {
        match fs::remove_file(self.path_for(namespace)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// Turn a namespace into a safe file stem
fn sanitize_namespace(namespace: &str) -> String {
    let sanitized: String = namespace
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}
