use crate::error::{RepoPulseError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub bearer token used for all source-control calls
    pub github_token: Option<String>,

    /// OpenAI API key used for summary generation
    pub openai_api_key: Option<String>,

    /// Model used for summary generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Default lookback window in days
    #[serde(default = "default_since_days")]
    pub default_since_days: u32,

    /// Repository listing cache TTL in days
    #[serde(default = "default_repo_cache_ttl")]
    pub repo_cache_ttl_days: i64,

    /// Upper bound on concurrent commit-detail requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Override for the cache directory (repo listing cache)
    pub cache_dir: Option<PathBuf>,

    /// Override for the data directory (insight store)
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location (~/.config/repo-pulse/config.toml)
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RepoPulseError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RepoPulseError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("repo-pulse").join("config.toml"))
    }

    /// Directory holding the repository listing cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| RepoPulseError::config("Could not determine home directory"))?;
        Ok(home.join(".cache").join("repo-pulse"))
    }

    /// Directory holding the durable insight store
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir()
            .ok_or_else(|| RepoPulseError::config("Could not determine data directory"))?;
        Ok(base.join("repo-pulse"))
    }

    /// Create a default configuration file at the default location
    pub fn create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&config_path, toml_string)?;

        Ok(config)
    }

    /// GitHub token from config, falling back to the GITHUB_TOKEN env var
    pub fn get_github_token(&self) -> Result<String> {
        if let Some(ref token) = self.github_token {
            if !token.is_empty() {
                return Ok(token.clone());
            }
        }
        env::var("GITHUB_TOKEN").map_err(|_| {
            RepoPulseError::MissingConfig(
                "github_token (or the GITHUB_TOKEN environment variable)".to_string(),
            )
        })
    }

    /// OpenAI API key from config, falling back to the OPENAI_API_KEY env var
    pub fn get_openai_api_key(&self) -> Result<String> {
        if let Some(ref key) = self.openai_api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        env::var("OPENAI_API_KEY").map_err(|_| {
            RepoPulseError::MissingConfig(
                "openai_api_key (or the OPENAI_API_KEY environment variable)".to_string(),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_since_days == 0 {
            return Err(RepoPulseError::config("default_since_days must be > 0"));
        }

        if self.repo_cache_ttl_days <= 0 {
            return Err(RepoPulseError::config("repo_cache_ttl_days must be > 0"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(RepoPulseError::config(
                "max_concurrent_requests must be > 0",
            ));
        }

        if self.model.is_empty() {
            return Err(RepoPulseError::config("model must not be empty"));
        }

        Ok(())
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(RepoPulseError::Config(_)) => {
                eprintln!("Config file not found. Creating default config...");
                Self::create_default()
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            openai_api_key: None,
            model: default_model(),
            default_since_days: default_since_days(),
            repo_cache_ttl_days: default_repo_cache_ttl(),
            max_concurrent_requests: default_max_concurrent(),
            cache_dir: None,
            data_dir: None,
        }
    }
}

// Serde default functions
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_since_days() -> u32 {
    7
}

fn default_repo_cache_ttl() -> i64 {
    7
}

fn default_max_concurrent() -> usize {
    8
}
