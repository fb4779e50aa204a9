use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::{DB_FILE, DEFAULT_USER};
use crate::error::{BudgieError, Result};
use crate::recurrence::ProcessOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default = "default_user")]
    pub default_user: i64,
    /// Per-run limit on occurrences for one recurring transaction. Unset
    /// means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_catch_up: Option<usize>,
}

fn default_user() -> i64 {
    DEFAULT_USER
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_user: default_user(),
            max_catch_up: None,
        }
    }
}

impl Settings {
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            max_catch_up: self.max_catch_up,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("budgie")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("budgie")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BudgieError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_db_path() -> PathBuf {
    load_settings().db_path()
}

/// `--user` if given, else the configured default owner.
pub fn resolve_user(user: Option<i64>) -> i64 {
    user.unwrap_or_else(|| load_settings().default_user)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
