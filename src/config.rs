// ⚙️ Configuration - loading and data folder resolution
//
// Each value is resolved independently, highest priority first:
// 1. Command-line flag
// 2. Environment variable
// 3. TOML config file (`<config_dir>/consult-ledger/config.toml`)
// 4. Compiled default

use crate::db::SqliteStorage;
use crate::error::{Error, Result};
use crate::storage::{FileStorage, Storage};
use crate::store::DEFAULT_STORAGE_KEY;
use crate::temporal::utc_offset;
use chrono::FixedOffset;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const APP_DIR: &str = "consult-ledger";
pub const SQLITE_FILE: &str = "ledger.db";

pub const ENV_DATA_DIR: &str = "LEDGER_DATA_DIR";
pub const ENV_BACKEND: &str = "LEDGER_BACKEND";
pub const ENV_STORAGE_KEY: &str = "LEDGER_STORAGE_KEY";
pub const ENV_UTC_OFFSET: &str = "LEDGER_UTC_OFFSET_MINUTES";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Sqlite,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" | "json" => Ok(BackendKind::File),
            "sqlite" | "db" => Ok(BackendKind::Sqlite),
            other => Err(Error::Config(format!(
                "unknown backend '{}' (expected file or sqlite)",
                other
            ))),
        }
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<String>,
    pub storage_key: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

/// Contents of config.toml; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub backend: Option<BackendKind>,
    pub storage_key: Option<String>,
    pub utc_offset_minutes: Option<i32>,
}

impl FileConfig {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("config.toml: {}", e)))
    }

    /// Read the file if it exists; a missing file is an empty config
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub storage_key: String,
    pub utc_offset_minutes: i32,
}

impl Config {
    /// Resolve against the process environment and the user's config file
    pub fn resolve(overrides: Overrides) -> Result<Self> {
        let file = match config_file_path() {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve_with(overrides, |name| std::env::var(name).ok(), file)
    }

    /// Resolution with the environment and file contents supplied by the caller
    pub fn resolve_with(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
        file: FileConfig,
    ) -> Result<Self> {
        let data_dir = overrides
            .data_dir
            .or_else(|| env(ENV_DATA_DIR).map(PathBuf::from))
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir);

        let backend = match overrides.backend.or_else(|| env(ENV_BACKEND)) {
            Some(raw) => raw.parse()?,
            None => file.backend.unwrap_or_default(),
        };

        let storage_key = overrides
            .storage_key
            .or_else(|| env(ENV_STORAGE_KEY))
            .or(file.storage_key)
            .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string());

        let utc_offset_minutes = match overrides.utc_offset_minutes {
            Some(minutes) => minutes,
            None => match env(ENV_UTC_OFFSET) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be whole minutes, got '{}'", ENV_UTC_OFFSET, raw))
                })?,
                None => file.utc_offset_minutes.unwrap_or(0),
            },
        };

        let config = Config {
            data_dir,
            backend,
            storage_key,
            utc_offset_minutes,
        };
        config.offset()?;

        debug!("Resolved config: {:?}", config);
        Ok(config)
    }

    /// Offset used for month boundaries and displayed dates
    pub fn offset(&self) -> Result<FixedOffset> {
        utc_offset(self.utc_offset_minutes).ok_or_else(|| {
            Error::Config(format!(
                "UTC offset {} minutes is out of range",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE)
    }

    /// Open the configured backend, creating the data folder if needed
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        fs::create_dir_all(&self.data_dir)?;
        let storage: Box<dyn Storage> = match self.backend {
            BackendKind::File => Box::new(FileStorage::new(&self.data_dir)),
            BackendKind::Sqlite => Box::new(SqliteStorage::open(&self.sqlite_path())?),
        };
        debug!("Opened {} storage in {}", self.backend, self.data_dir.display());
        Ok(storage)
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./consult_ledger_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::resolve_with(Overrides::default(), env_of(&[]), FileConfig::default()).unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.storage_key, "ledger_data_v1");
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.data_dir, default_data_dir());
    }

    #[test]
    fn test_priority_order() {
        let file = FileConfig::parse(
            r#"
            data_dir = "/from/file"
            backend = "sqlite"
            storage_key = "file_key"
            utc_offset_minutes = 60
            "#,
        )
        .unwrap();
        let env = env_of(&[(ENV_DATA_DIR, "/from/env"), (ENV_UTC_OFFSET, "300")]);
        let overrides = Overrides {
            storage_key: Some("cli_key".to_string()),
            ..Default::default()
        };

        let config = Config::resolve_with(overrides, env, file).unwrap();
        assert_eq!(config.storage_key, "cli_key");
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
        assert_eq!(config.utc_offset_minutes, 300);
        assert_eq!(config.backend, BackendKind::Sqlite);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_backend = Overrides {
            backend: Some("redis".to_string()),
            ..Default::default()
        };
        assert!(Config::resolve_with(bad_backend, env_of(&[]), FileConfig::default()).is_err());

        let bad_offset = env_of(&[(ENV_UTC_OFFSET, "five")]);
        assert!(Config::resolve_with(Overrides::default(), bad_offset, FileConfig::default()).is_err());

        let out_of_range = Overrides {
            utc_offset_minutes: Some(24 * 60),
            ..Default::default()
        };
        assert!(Config::resolve_with(out_of_range, env_of(&[]), FileConfig::default()).is_err());

        assert!(FileConfig::parse("backend = \"tape\"").is_err());
    }

    #[test]
    fn test_open_storage_backends() {
        let dir = tempfile::tempdir().unwrap();
        for backend in [BackendKind::File, BackendKind::Sqlite] {
            let config = Config {
                data_dir: dir.path().join("data"),
                backend,
                storage_key: DEFAULT_STORAGE_KEY.to_string(),
                utc_offset_minutes: 0,
            };
            let mut storage = config.open_storage().unwrap();
            storage.set("k", "v").unwrap();
            assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        }
        assert!(dir.path().join("data").join(SQLITE_FILE).exists());
    }

    #[test]
    fn test_missing_config_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert!(file.backend.is_none());
    }
}
