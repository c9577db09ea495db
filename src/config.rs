//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <FILE>` or `config.toml` in the platform config dir
//! 3. `DUPSWEEP_*` environment variables (e.g. `DUPSWEEP_LANES=8`)
//! 4. Command-line flags, applied by the caller
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("{}", config.to_toml().unwrap());
//! ```

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::duplicates::{default_lanes, ScanConfig};
use crate::scanner::HashAlgorithm;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Errors raised while loading or rendering configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer held a value of the wrong type or unparsable TOML.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// A configured value is out of range.
    #[error("Invalid value for {key}: {message}")]
    Value { key: &'static str, message: String },

    /// The effective configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing lanes; unset means one per available CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lanes: Option<usize>,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Confirm hash matches byte for byte.
    pub verify: bool,
    /// Draw a progress bar during scans.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lanes: None,
            algorithm: HashAlgorithm::default(),
            verify: false,
            progress: true,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file; when `None` the platform default is
    ///   used if it exists.
    ///
    /// # Errors
    ///
    /// Fails when an explicit file is missing, when any layer holds an
    /// invalid value, or when `lanes` is 0.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }

        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        let config: Self = Self::figment(file.as_deref())
            .extract()
            .map_err(Box::new)?;
        config.validate()?;

        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Build the provider stack: defaults, then `file`, then environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            log::trace!("Reading config file {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == Some(0) {
            return Err(ConfigError::Value {
                key: "lanes",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Lane count to use for scans.
    #[must_use]
    pub fn effective_lanes(&self) -> usize {
        self.lanes.unwrap_or_else(default_lanes).max(1)
    }

    /// Scan configuration derived from these settings.
    #[must_use]
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_lanes(self.effective_lanes())
            .with_algorithm(self.algorithm)
            .with_verify(self.verify)
    }

    /// Render as TOML, with `lanes` resolved to its effective value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let resolved = Self {
            lanes: Some(self.effective_lanes()),
            ..self.clone()
        };
        Ok(toml::to_string(&resolved)?)
    }
}
