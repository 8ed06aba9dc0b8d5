//! Configuration of the error layer and the layered loader shared by hosts.
//!
//! Sources are merged in order, later ones winning:
//! 1. `Default` values
//! 2. YAML file (if provided)
//! 3. environment variables with the given prefix, `__` separating nested keys

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Configuration error for layered config loading
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file does not exist: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
    #[error("invalid api_prefix '{prefix}': must start with '/' and not end with '/'")]
    InvalidApiPrefix { prefix: String },
}

/// Settings of the classification and rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Requests under this path get problem JSON; all others get HTML.
    pub api_prefix: String,
    /// Locale used when the request does not name one.
    pub default_locale: String,
    /// Link target of the "Home" link on error pages.
    pub home_href: String,
    /// `locale -> code -> template` validation messages.
    pub messages: HashMap<String, HashMap<String, String>>,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_owned(),
            default_locale: "en".to_owned(),
            home_href: "/".to_owned(),
            messages: HashMap::new(),
        }
    }
}

impl ErrorsConfig {
    /// # Errors
    /// Returns `ConfigError::InvalidApiPrefix` if the prefix is not an absolute path
    /// without a trailing slash.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.api_prefix;
        if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
            return Err(ConfigError::InvalidApiPrefix {
                prefix: prefix.clone(),
            });
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `faultgate=debug,tower_http=warn`.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Load `T` from defaults, an optional YAML file and prefixed environment variables.
///
/// # Errors
/// Returns `ConfigError::MissingFile` if `path` is given but is not a file, and
/// `ConfigError::Invalid` if the merged sources do not deserialize into `T`.
pub fn load_layered<T>(path: Option<&Path>, env_prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Serialize + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()));
    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Yaml::file(path));
    }
    figment = figment.merge(Env::prefixed(env_prefix).split("__"));
    figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
}
