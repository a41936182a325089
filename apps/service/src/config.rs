use std::time::Duration;
use std::{env, fmt, fs, io, path};

use probe_engine::RunnerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: io::Error },

    #[error("failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: io::Error },

    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("no config directory: neither XDG_CONFIG_HOME nor a home directory is available")]
    ConfigPathUnavailable,

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runner: Runner,
    pub logging: Logging,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runner {
    /// Request timeout applied to probes without their own
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Probes of one definitions file run at most this many at a time
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    /// `compact` or `json`
    pub format: String,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: probe_engine::transport::USER_AGENT.to_string(),
            max_concurrency: 4,
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".into(), format: "compact".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/probe-engine/config.toml or
/// $HOME/.config/...)
pub fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("probe-engine/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Runner")?;
        write_1(f, "Timeout (s)", &self.runner.timeout_secs)?;
        write_1(f, "User Agent", &self.runner.user_agent)?;
        write_1(f, "Max Concurrency", &self.runner.max_concurrency)?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        write_1(f, "Format", &self.logging.format)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/probe-engine/config.toml
    ///  or the specified path, with the extension .toml, if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: parent.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.timeout_secs == 0 {
            return Err(ConfigError::Invalid("runner.timeout_secs must be greater than 0".into()));
        }

        if self.runner.max_concurrency == 0 {
            return Err(ConfigError::Invalid("runner.max_concurrency must be greater than 0".into()));
        }

        if self.runner.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("runner.user_agent cannot be empty".into()));
        }

        self.log_format()?;
        self.log_level()?;

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.runner.timeout_secs)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default().with_timeout(self.timeout())
    }

    pub fn log_format(&self) -> Result<logger::LogFormat, ConfigError> {
        self.logging.format.parse().map_err(ConfigError::Invalid)
    }

    pub fn log_level(&self) -> Result<logger::LevelFilter, ConfigError> {
        self.logging
            .level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.logging.level)))
    }
}
