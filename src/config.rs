//! Layered client configuration.
//!
//! Resolution order, later layers winning:
//!
//! 1. `config.toml` (default `~/.config/taskboard/config.toml`)
//! 2. Environment, including a `.env` file in the working directory
//! 3. Command-line flags
//!
//! ```toml
//! api_url = "https://boards.example.com"
//! token = "eyJhbGciOi..."
//! poll_interval_secs = 30
//! request_timeout_secs = 15
//! page_size = 10
//! ```
//!
//! A missing API base URL is fatal: nothing else can work without it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const ENV_API_URL: &str = "TASKBOARD_API_URL";
pub const ENV_TOKEN: &str = "TASKBOARD_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "TASKBOARD_POLL_INTERVAL_SECS";
pub const ENV_TIMEOUT: &str = "TASKBOARD_TIMEOUT_SECS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PAGE_SIZE: u32 = 10;

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ConfigFile {
    /// Load a config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub token: Option<String>,
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without a trailing slash.
    pub api_url: String,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub config_path: PathBuf,
}

impl Config {
    /// Load from the config file, the process environment and `overrides`.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        let path = overrides
            .config_path
            .clone()
            .unwrap_or_else(default_config_path);
        let file = ConfigFile::load(&path)?;
        Self::resolve(path, file, |key| std::env::var(key).ok(), overrides)
    }

    /// Merge the layers. `env` is injected so tests never touch process state.
    pub fn resolve(
        config_path: PathBuf,
        file: ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let env_nonempty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| env_nonempty(ENV_API_URL))
            .or(file.api_url)
            .ok_or_else(|| ConfigError::MissingApiUrl {
                path: config_path.display().to_string(),
            })?;
        let api_url = normalize_api_url(&api_url)?;

        let token = overrides
            .token
            .clone()
            .or_else(|| env_nonempty(ENV_TOKEN))
            .or(file.token);

        let poll_interval_secs = match env_nonempty(ENV_POLL_INTERVAL) {
            Some(raw) => parse_secs(ENV_POLL_INTERVAL, &raw)?,
            None => file.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        };
        let timeout_secs = match env_nonempty(ENV_TIMEOUT) {
            Some(raw) => parse_secs(ENV_TIMEOUT, &raw)?,
            None => file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs",
                value: "0".into(),
            });
        }

        Ok(Self {
            api_url,
            token,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            page_size: file.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            config_path,
        })
    }
}

/// `~/.config/taskboard/config.toml`, or `./taskboard.toml` without a home.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("taskboard").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("taskboard.toml"))
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidApiUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_secs(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn path() -> PathBuf {
        PathBuf::from("/tmp/taskboard/config.toml")
    }

    #[test]
    fn missing_api_url_is_fatal() {
        let err = Config::resolve(
            path(),
            ConfigFile::default(),
            env_from(&[]),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiUrl { .. }));
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        let config = Config::resolve(
            path(),
            ConfigFile::default(),
            env_from(&[(ENV_API_URL, "https://api.example.com/")]),
            &Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.token, None);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = ConfigFile {
            api_url: Some("http://file.example".into()),
            token: Some("file-token".into()),
            poll_interval_secs: Some(60),
            ..Default::default()
        };
        let env = env_from(&[
            (ENV_API_URL, "http://env.example"),
            (ENV_TOKEN, "env-token"),
        ]);
        let overrides = Overrides {
            api_url: Some("http://cli.example".into()),
            ..Default::default()
        };
        let config = Config::resolve(path(), file, env, &overrides).unwrap();
        assert_eq!(config.api_url, "http://cli.example");
        assert_eq!(config.token.as_deref(), Some("env-token"));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn rejects_non_http_url_and_bad_numbers() {
        let err = Config::resolve(
            path(),
            ConfigFile::default(),
            env_from(&[(ENV_API_URL, "ftp://files.example")]),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiUrl { .. }));

        let err = Config::resolve(
            path(),
            ConfigFile::default(),
            env_from(&[(ENV_API_URL, "http://ok.example"), (ENV_POLL_INTERVAL, "soon")]),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn config_file_round_trips_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.toml");
        std::fs::write(
            &file_path,
            "api_url = \"http://localhost:5000\"\npoll_interval_secs = 5\npage_size = 20\n",
        )
        .unwrap();
        let file = ConfigFile::load(&file_path).unwrap();
        assert_eq!(file.api_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(file.poll_interval_secs, Some(5));
        assert_eq!(file.page_size, Some(20));
    }

    #[test]
    fn missing_config_file_is_empty_and_garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            ConfigFile::load(&dir.path().join("absent.toml")).unwrap(),
            ConfigFile::default()
        );
        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "api_url = [").unwrap();
        assert!(matches!(
            ConfigFile::load(&bad),
            Err(ConfigError::ParseFailed { .. })
        ));
    }
}
