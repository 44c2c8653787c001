use super::{OutputFormat, ThemeArg};
use clap::ValueEnum;
use reljoin::model::{Price, Rating};
use reljoin::query::QueryOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::Duration;

const SECONDS_PER_DAY: i64 = 86_400;

/// Settings read from `cli.toml`, before flags are applied.
#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let config = Self { path, data };
        config.query_options()?;
        config.format()?;
        config.theme()?;
        Ok(config)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data_path(&self) -> Option<&PathBuf> {
        self.data.data.as_ref()
    }

    pub fn format(&self) -> Result<Option<OutputFormat>, ConfigError> {
        self.data
            .format
            .as_deref()
            .map(|value| {
                OutputFormat::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "format",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn theme(&self) -> Result<Option<ThemeArg>, ConfigError> {
        self.data
            .theme
            .as_deref()
            .map(|value| {
                ThemeArg::from_str(value, true).map_err(|_| ConfigError::InvalidValue {
                    key: "theme",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    /// Query tunables with file overrides applied over the defaults.
    pub fn query_options(&self) -> Result<QueryOptions, ConfigError> {
        let mut options = QueryOptions::default();
        let section = &self.data.query;
        if let Some(amount) = section.min_price {
            options.min_price =
                Price::from_decimal(amount).map_err(|_| ConfigError::InvalidValue {
                    key: "query.min_price",
                    value: amount.to_string(),
                })?;
        }
        if let Some(rating) = section.min_rating {
            options.min_rating = Rating::new(rating).map_err(|_| ConfigError::InvalidValue {
                key: "query.min_rating",
                value: rating.to_string(),
            })?;
        }
        if let Some(days) = section.recent_window_days {
            options.recent_window = (days >= 0)
                .then(|| days.checked_mul(SECONDS_PER_DAY))
                .flatten()
                .map(Duration::seconds)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "query.recent_window_days",
                    value: days.to_string(),
                })?;
        }
        Ok(options)
    }

    /// Writes a config file holding the built-in defaults.
    pub fn write_defaults(&self, force: bool) -> Result<PathBuf, ConfigError> {
        let target = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path().ok_or(ConfigError::NoConfigPath)?,
        };
        if target.exists() && !force {
            return Err(ConfigError::AlreadyExists { path: target });
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let defaults = QueryOptions::default();
        let data = RawConfig {
            data: None,
            format: Some("text".to_string()),
            theme: Some("auto".to_string()),
            query: QuerySection {
                min_price: Some(defaults.min_price.as_decimal()),
                min_rating: Some(defaults.min_rating.get()),
                recent_window_days: Some(defaults.recent_window.whole_days()),
            },
        };
        let serialized =
            toml::to_string_pretty(&data).map_err(|source| ConfigError::Serialize { source })?;
        fs::write(&target, serialized).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theme: Option<String>,
    #[serde(default)]
    query: QuerySection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct QuerySection {
    min_price: Option<f64>,
    min_rating: Option<u8>,
    recent_window_days: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize CLI config: {source}")]
    Serialize { source: toml::ser::Error },
    #[error("failed to write CLI config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config {path} already exists; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },
    #[error("config value '{value}' is invalid for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("no config directory found; pass --config or set RELJOIN_CONFIG")]
    NoConfigPath,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("reljoin").join("cli.toml"))
}
