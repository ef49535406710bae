use crate::core::dispatcher::DEFAULT_WORKERS;
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub test_command: Option<String>,
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_attempts() -> u32 {
    60
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_color() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                url: "https://tmc.mooc.fi".to_string(),
                username: None,
                password: None,
                poll_interval_ms: default_poll_interval_ms(),
                poll_attempts: default_poll_attempts(),
            },
            general: GeneralConfig {
                cache_file: None,
                workers: DEFAULT_WORKERS,
                test_command: None,
                color: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        Self::load_custom(&Self::config_file_path())
    }

    pub fn ensure_config_exists() -> AppResult<()> {
        let config_path = Self::config_file_path();
        if !config_path.exists() {
            Config::default().save_to(&config_path)?;
        }
        Ok(())
    }

    pub fn load_custom(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            let default_config = Config::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|e| AppError::Io(e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| AppError::System(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.server.url.is_empty() {
            return Err(AppError::System("Server URL cannot be empty".to_string()));
        }

        if self.general.workers == 0 {
            return Err(AppError::System(
                "Worker count must be at least 1".to_string(),
            ));
        }

        if self.server.poll_attempts == 0 {
            return Err(AppError::System(
                "Submission poll attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::System(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content).map_err(|e| AppError::Io(e.to_string()))?;

        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tmc")
            .join("config.toml")
    }

    /// Default location for a cache file when none is configured
    pub fn default_cache_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tmc")
            .join("exercises.cache")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_custom(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.server.url, "https://tmc.mooc.fi");
        assert_eq!(config.general.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nurl = \"http://localhost:3000\"\nusername = \"student\"\n\n[general]\n",
        )
        .unwrap();

        let config = Config::load_custom(&path).unwrap();

        assert_eq!(config.server.username.as_deref(), Some("student"));
        assert_eq!(config.server.poll_attempts, 60);
        assert!(config.general.cache_file.is_none());
        assert!(config.general.color);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.general.workers = 0;

        assert!(matches!(config.validate(), Err(AppError::System(_))));
    }

    #[test]
    fn test_save_and_reload_keeps_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.general.cache_file = Some(dir.path().join("exercises.cache"));
        config.save_to(&path).unwrap();

        let reloaded = Config::load_custom(&path).unwrap();
        assert_eq!(reloaded.general.cache_file, config.general.cache_file);
    }
}
