use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tokio::fs;

use crate::error::{Result, VideolangError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Whole-transfer budget for the storage PUT of one clip
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(15 * 60);

pub const API_URL_ENV: &str = "VIDEOLANG_API_URL";
pub const POLL_SECS_ENV: &str = "VIDEOLANG_POLL_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

/// On-disk overrides, every field optional
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub upload_timeout_secs: Option<u64>,
}

pub fn get_root_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("videolang")
}

pub fn get_config_path() -> PathBuf {
    get_root_config_dir().join("config.json")
}

/// Read the config file; a missing file is the same as an empty one
pub async fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let json_content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(e) => return Err(e.into()),
    };
    let file: ConfigFile = serde_json::from_str(&json_content)?;
    Ok(file)
}

impl ClientConfig {
    /// Defaults, then the config file, then the environment
    pub async fn load() -> Result<Self> {
        let file = load_config_file(&get_config_path()).await?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    pub fn from_sources(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = ClientConfig::default();

        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = file.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.upload_timeout_secs {
            config.upload_timeout = Duration::from_secs(secs);
        }

        if let Some(base_url) = env(API_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(raw) = env(POLL_SECS_ENV) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| VideolangError::InvalidConfig {
                    reason: format!(
                        "{} must be a whole number of seconds, got {:?}",
                        POLL_SECS_ENV, raw
                    ),
                })?;
            config.poll_interval = Duration::from_secs(secs);
        }

        config.validate()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        self.base_url = base_url.into();
        self.validate()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self> {
        self.poll_interval = interval;
        self.validate()
    }

    fn validate(mut self) -> Result<Self> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();

        let url = reqwest::Url::parse(&self.base_url).map_err(|e| VideolangError::InvalidConfig {
            reason: format!("base url {:?}: {}", self.base_url, e),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(VideolangError::InvalidConfig {
                reason: format!("base url {:?} must use http or https", self.base_url),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(VideolangError::InvalidConfig {
                reason: "poll interval must be greater than zero".to_string(),
            });
        }
        if self.upload_timeout < self.request_timeout {
            return Err(VideolangError::InvalidConfig {
                reason: "upload timeout must not be shorter than the request timeout".to_string(),
            });
        }

        Ok(self)
    }
}
