use std::collections::BTreeMap;
use std::path::Path;

use faultgate::{ConfigError, ErrorsConfig, LoggingConfig, load_layered};
use serde::{Deserialize, Serialize};

use crate::users::Role;

/// Environment variables with this prefix override file values, e.g.
/// `FAULTGATE__SERVER__BIND=0.0.0.0:9000`.
pub const ENV_PREFIX: &str = "FAULTGATE__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_owned(),
        }
    }
}

/// Bearer tokens accepted on the admin API and the role each one grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: BTreeMap<String, Role>,
}

impl AuthConfig {
    #[must_use]
    pub fn role_of(&self, token: &str) -> Option<Role> {
        self.tokens.get(token).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub errors: ErrorsConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Layered config: defaults -> YAML (if provided) -> env (`FAULTGATE__*`).
    ///
    /// # Errors
    /// Returns an error if the file is missing, a source does not deserialize, or the
    /// error settings are invalid.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = load_layered(path, ENV_PREFIX)?;
        config.errors.validate()?;
        Ok(config)
    }

    /// CLI flags win over every other source.
    pub fn apply_cli_overrides(&mut self, bind: Option<&str>, verbose: u8) {
        if let Some(bind) = bind {
            bind.clone_into(&mut self.server.bind);
        }
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// # Errors
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
