//! JSON Configuration Management
//!
//! Handles reading and writing the analysis configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::AnalysisSettings;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_iatrikos_dir};

/// Configuration service for managing analysis settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AnalysisSettings,
}

impl ConfigService {
    /// Load `~/.iatrikos/config.json`, creating it with defaults if absent
    pub fn new() -> AppResult<Self> {
        ensure_iatrikos_dir()?;
        Self::open(config_path()?)
    }

    /// Load an explicit config file, creating it with defaults if absent
    pub fn open(config_path: PathBuf) -> AppResult<Self> {
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AnalysisSettings::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AnalysisSettings> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisSettings = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AnalysisSettings) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AnalysisSettings {
        &self.config
    }

    /// Configuration with the API key resolved from the process environment
    pub fn resolved_config(&self) -> AnalysisSettings {
        let mut config = self.config.clone();
        config.apply_env_api_key(|var| std::env::var(var).ok());
        config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }
}
