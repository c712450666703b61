//! # crew-config
//!
//! Layered configuration loading for Crew using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CREW_*` prefix, `__` as separator)
//! 2. An explicit file passed with `crewd --config`
//! 3. Working-directory `crew.toml`
//! 4. User-level `~/.config/crew/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CREW_AUTH__SECRET_KEY` -> `auth.secret_key`,
//! `CREW_LIMITS__MAX_POINTS` -> `limits.max_points`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use crew_config::CrewConfig;
//!
//! let config = CrewConfig::load_with_dotenv(None).expect("config");
//! if config.auth.is_configured() {
//!     println!("listening on {}", config.server.bind_addr);
//! }
//! ```

mod auth;
mod database;
mod error;
mod server;

pub use auth::{AuthConfig, MIN_SECRET_KEY_BYTES};
pub use crew_core::limits::Limits;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CREW_";
const LOCAL_CONFIG_FILE: &str = "crew.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CrewConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: Limits,
}

impl CrewConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`CrewConfig::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingFile` if `explicit` does not exist, or
    /// `ConfigError::Figment` if a source cannot be parsed or a value has the
    /// wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.filter(|p| !p.exists()) {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        Self::figment(explicit).extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading `.env` from the working directory.
    ///
    /// # Errors
    ///
    /// Same as [`CrewConfig::load`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load(explicit)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Working-directory config
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Explicit --config file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.connection_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.connection_buffer".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_secs".into(),
                reason: "must be positive".into(),
            });
        }
        if self.limits.max_points < 1 {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_points".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("crew").join("config.toml"))
    }
}
