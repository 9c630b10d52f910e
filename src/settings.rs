use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::search::DEFAULT_THRESHOLD;
use crate::Result;

// User-visible strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Messages {
    pub default_title: String,
    pub default_content: String,
    pub created: String,
    pub deleted: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            default_title: "New note".to_string(),
            default_content: "Start writing...".to_string(),
            created: "Note created".to_string(),
            deleted: "Note deleted".to_string(),
        }
    }
}

// App settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_url: String,
    pub user_id: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub notes_key: String,
    pub debounce_ms: u64,
    pub search_threshold: f64,
    pub request_timeout_secs: u64,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api/".to_string(),
            user_id: None,
            cache_dir: None,
            notes_key: "notes".to_string(),
            debounce_ms: 500,
            search_threshold: DEFAULT_THRESHOLD,
            request_timeout_secs: 10,
            messages: Messages::default(),
        }
    }
}

impl Settings {
    /// Loads settings from disk. A missing or invalid file yields defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "settings file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
                Self::default()
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Applies `NOTES_API_URL`, `NOTES_USER_ID` and `NOTES_CACHE_DIR`.
    pub fn apply_env(mut self) -> Self {
        if let Some(url) = var("NOTES_API_URL") {
            info!("NOTES_API_URL set, using {url}");
            self.api_url = url;
        }
        if let Some(user) = var("NOTES_USER_ID") {
            info!("NOTES_USER_ID set, using {user}");
            self.user_id = Some(user);
        }
        if let Some(dir) = var("NOTES_CACHE_DIR") {
            info!("NOTES_CACHE_DIR set, using {dir}");
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolved_cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .map(|dir| dir.join("notes-sync"))
                .unwrap_or_else(|| PathBuf::from(".notes-cache")),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
