//! Runtime configuration: an optional TOML file overlaid with environment
//! variables.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::availability::BusinessHours;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("business hours must open before they close")]
    InvalidBusinessHours,
    #[error("no JWT secret configured: set BOOKING_JWT_SECRET or auth.jwt_secret")]
    MissingJwtSecret,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 secret of the identity provider issuing client tokens.
    pub jwt_secret: Option<String>,
    /// Lifetime of tokens minted by [`super::identity::IdentityVerifier::issue`].
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    /// `sqlite://` URL; defaults to `db.sqlite` in the asset directory.
    pub database_url: Option<String>,
    pub business_hours: BusinessHours,
    /// When off, every booking blocks the whole schedule regardless of
    /// therapist.
    pub therapist_scoping: bool,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: None,
            business_hours: BusinessHours::default(),
            therapist_scoping: true,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load `path` if it exists (defaults otherwise), then apply process
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment) and
    /// validate the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env(&lookup, "PORT")? {
            self.server.port = port;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(secret) = lookup("BOOKING_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(scoping) = parse_env(&lookup, "BOOKING_THERAPIST_SCOPING")? {
            self.therapist_scoping = scoping;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.business_hours.open >= self.business_hours.close {
            return Err(ConfigError::InvalidBusinessHours);
        }
        if self.auth.token_ttl_minutes <= 0 {
            warn!(
                token_ttl_minutes = self.auth.token_ttl_minutes,
                "Non-positive token lifetime, issued tokens will already be expired"
            );
        }
        Ok(())
    }

    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        self.auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingJwtSecret)
    }

    pub fn scoping_enabled(&self) -> bool {
        self.therapist_scoping
    }
}

fn parse_env<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { key, value }),
    }
}
