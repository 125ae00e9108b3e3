//! Configuration handling for the form editor

use crate::record::RecordKind;
use crate::schema::Locale;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the record store location
pub const DATA_DIR_ENV: &str = "HR_FORMS_DATA_DIR";

/// User configuration for the form editor
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EditorConfig {
    /// Root of the file-backed record store
    pub data_dir: Option<PathBuf>,
    /// Locale used for titles and labels
    pub locale: Option<Locale>,
    /// Record kind used when none is given on the command line
    pub default_kind: Option<RecordKind>,
}

impl EditorConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("az", "hr-forms", "hr-forms")
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Record store root: env override, then config, then platform data dir
    pub fn data_dir(&self) -> PathBuf {
        Self::resolve_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from), self)
    }

    fn resolve_data_dir(env: Option<PathBuf>, config: &Self) -> PathBuf {
        env.or_else(|| config.data_dir.clone())
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn locale(&self) -> Locale {
        self.locale.unwrap_or_default()
    }

    pub fn default_kind(&self) -> RecordKind {
        self.default_kind.unwrap_or(RecordKind::Candidate)
    }
}
