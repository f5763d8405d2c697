//! Configuration for the store and the token service.
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! [store]
//! path = "database.json"
//! password_iterations = 600000
//! # session_ttl_secs = 2592000
//!
//! [auth]
//! jwt_secret = "change-me"
//! issuer = "chirpy"
//! access_ttl_secs = 86400
//! refresh_access_ttl_secs = 3600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ChirpyError, Result, StorageError};

/// PBKDF2 work factor used when none is configured.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 600_000;

/// Lifetime of an access token when the caller supplies no positive TTL.
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 86_400;

/// Lifetime of an access token minted from a refresh token.
pub const DEFAULT_REFRESH_ACCESS_TTL_SECS: i64 = 3_600;

/// Issuer claim written into every token.
pub const DEFAULT_ISSUER: &str = "chirpy";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChirpyConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Location of the JSON document.
    pub path: PathBuf,
    /// PBKDF2 iteration count for new password hashes.
    pub password_iterations: u32,
    /// Refresh token lifetime. `None` keeps tokens until revoked.
    pub session_ttl_secs: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.json"),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
            session_ttl_secs: None,
        }
    }
}

impl StoreConfig {
    /// The refresh token expiry policy this section describes.
    pub fn session_policy(&self) -> SessionPolicy {
        match self.session_ttl_secs {
            Some(secs) => SessionPolicy::ExpireAfter(Duration::from_secs(secs)),
            None => SessionPolicy::NeverExpire,
        }
    }

    /// Reject values the store cannot run with.
    ///
    /// A zero session TTL would expire every refresh token the moment it
    /// is issued, so it is refused rather than silently breaking login.
    pub fn validate(&self) -> Result<()> {
        if self.password_iterations == 0 {
            return Err(ChirpyError::Validation(
                "store.password_iterations must be positive".into(),
            ));
        }
        if self.session_ttl_secs == Some(0) {
            return Err(ChirpyError::Validation(
                "store.session_ttl_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret for signing access tokens.
    pub jwt_secret: String,
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_access_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_access_ttl_secs: DEFAULT_REFRESH_ACCESS_TTL_SECS,
        }
    }
}

/// How long a refresh token stays usable after login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPolicy {
    /// Tokens live until explicitly revoked.
    #[default]
    NeverExpire,
    /// Tokens are rejected once this much time has passed since login.
    ExpireAfter(Duration),
}

impl ChirpyConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(StorageError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ChirpyError::Validation(
                "auth.jwt_secret must not be empty".into(),
            ));
        }
        self.store.validate()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
