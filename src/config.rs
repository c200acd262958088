//! Runtime configuration.
//!
//! Resolution order: defaults, then `<config_dir>/storymap/config.json`, then
//! `STORYMAP_*` environment variables, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::db::{CorruptPolicy, Database, DEFAULT_STORAGE_KEY};
use crate::store::{FileStore, MemoryStore, RecordStore, SqliteStore};

const APP_NAME: &str = "storymap";
const CONFIG_FILE: &str = "config.json";
const SQLITE_FILE: &str = "storymap.db";

/// Which [`RecordStore`] implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Sqlite,
    File,
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sqlite" => Some(Self::Sqlite),
            "file" => Some(Self::File),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorymapConfig {
    pub backend: Backend,
    /// Directory holding the data files. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Key the document is stored under.
    pub storage_key: String,
    pub corrupt_policy: CorruptPolicy,
}

impl Default for StorymapConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            corrupt_policy: CorruptPolicy::default(),
        }
    }
}

impl StorymapConfig {
    /// Load from `path` (or the default location) and apply environment
    /// overrides. A missing or unreadable file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    fn try_load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save to `path` (or the default location).
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Override fields from `STORYMAP_*` variables. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("STORYMAP_DATA_DIR").filter(|s| !s.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup("STORYMAP_BACKEND") {
            match Backend::from_str(raw.trim()) {
                Some(backend) => self.backend = backend,
                None => tracing::warn!("Ignoring unknown STORYMAP_BACKEND '{}'", raw),
            }
        }
        if let Some(key) = lookup("STORYMAP_STORAGE_KEY").filter(|s| !s.is_empty()) {
            self.storage_key = key;
        }
    }

    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    /// Open the configured backend and wrap it in a [`Database`].
    pub fn open_database(&self) -> Result<Database> {
        let store: Arc<dyn RecordStore> = match self.backend {
            Backend::Memory => Arc::new(MemoryStore::new()),
            Backend::File => {
                let dir = self.resolved_data_dir()?;
                Arc::new(FileStore::open(&dir).with_context(|| {
                    format!("Failed to open data directory {}", dir.display())
                })?)
            }
            Backend::Sqlite => {
                let path = self.resolved_data_dir()?.join(SQLITE_FILE);
                let store = SqliteStore::open(&path)
                    .with_context(|| format!("Failed to open database {}", path.display()))?;
                store.migrate().context("Failed to run migrations")?;
                Arc::new(store)
            }
        };

        tracing::debug!(
            backend = self.backend.as_str(),
            key = %self.storage_key,
            "Opened record store"
        );

        let db = Database::new(store)
            .with_key(self.storage_key.clone())
            .context("Unusable storage_key")?
            .with_policy(self.corrupt_policy);
        Ok(db)
    }
}

fn default_config_path() -> Result<PathBuf> {
    let mut path =
        dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorymapConfig::try_load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config, StorymapConfig::default());
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"backend":"file","corrupt_policy":"fail"}"#).unwrap();

        let config = StorymapConfig::try_load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.corrupt_policy, CorruptPolicy::Fail);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = StorymapConfig {
            backend: Backend::Memory,
            data_dir: Some(dir.path().to_path_buf()),
            storage_key: "team-a".to_string(),
            corrupt_policy: CorruptPolicy::Fail,
        };

        config.save(Some(&path)).unwrap();
        assert_eq!(StorymapConfig::try_load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("STORYMAP_DATA_DIR", "/tmp/storymap"),
            ("STORYMAP_BACKEND", "bogus"),
            ("STORYMAP_STORAGE_KEY", "team-b"),
        ]
        .into_iter()
        .collect();

        let mut config = StorymapConfig::default();
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/storymap")));
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.storage_key, "team-b");
    }

    #[test]
    fn reserved_storage_key_is_refused() {
        let config = StorymapConfig {
            backend: Backend::Memory,
            storage_key: "user".to_string(),
            ..Default::default()
        };
        let Err(err) = config.open_database() else {
            panic!("storage key `user` should be refused");
        };
        assert!(format!("{:#}", err).contains("reserved"));
    }

    #[test]
    fn opens_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        for backend in [Backend::Memory, Backend::File, Backend::Sqlite] {
            let config = StorymapConfig {
                backend,
                data_dir: Some(dir.path().join(backend.as_str())),
                ..Default::default()
            };
            let db = config.open_database().unwrap();
            assert_eq!(db.backend_name(), backend.as_str());
            assert!(db.list_stories().unwrap().is_empty());
        }
    }
}
