use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    pub db_url: String,
    /// Empty when nobody is logged in
    #[serde(default)]
    pub current_user_name: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// A config with nobody logged in and no file path yet.
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            ..Default::default()
        }
    }

    /// `~/.gatorconfig.json`
    pub fn default_path() -> Result<PathBuf> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config("cannot locate home directory".to_string()))?;
        Ok(PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::from_str(&content)?;
        config.path = path.as_ref().to_path_buf();
        Ok(config)
    }

    /// Parse config from a JSON string (useful for testing)
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Where [`Config::save`] writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = path.into();
        self
    }

    pub fn current_user(&self) -> Option<&str> {
        Some(self.current_user_name.as_str()).filter(|name| !name.is_empty())
    }

    /// Switch the current user and rewrite the file.
    pub fn set_user(&mut self, name: &str) -> Result<()> {
        self.current_user_name = name.to_string();
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Config("config has no file path".to_string()));
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
