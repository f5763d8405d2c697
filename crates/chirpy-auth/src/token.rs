//! Signed, time-limited bearer tokens (JWT, HMAC-SHA256).
//!
//! A token binds a subject (the account id, as a decimal string) to the
//! configured issuer with `iat`/`exp` timestamps, and is signed with a
//! shared secret. Validation accepts only the HMAC algorithm family, so a
//! token whose header names `none` or an asymmetric algorithm is rejected
//! before its signature is even looked at.
//!
//! Expiry is checked against the service's [`Clock`] rather than inside
//! `jsonwebtoken`, with zero leeway: a token is expired once `now >= exp`.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use chirpy_core::config::{
    AuthConfig, DEFAULT_ACCESS_TTL_SECS, DEFAULT_ISSUER, DEFAULT_REFRESH_ACCESS_TTL_SECS,
};
use chirpy_core::clock::{Clock, SystemClock};
use chirpy_core::{AuthFailure, ChirpyError, Result, StorageError};

/// Algorithm used when signing.
const SIGNING_ALG: Algorithm = Algorithm::HS256;

/// Algorithms accepted when validating: the HMAC family only.
const ACCEPTED_ALGS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Registered claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id in decimal.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expires-at, unix seconds.
    pub exp: i64,
}

impl Claims {
    /// The account id named by the subject claim.
    pub fn account_id(&self) -> Result<u64> {
        self.sub.parse().map_err(|_| {
            AuthFailure::InvalidToken {
                reason: format!("subject is not an account id: {:?}", self.sub),
            }
            .into()
        })
    }
}

/// Issues and validates access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    default_ttl_secs: i64,
    refresh_ttl_secs: i64,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("default_ttl_secs", &self.default_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a service signing with `secret`, using the default issuer and
    /// lifetimes and the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpyError::Validation`] if `secret` is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ChirpyError::Validation(
                "token secret must not be empty".into(),
            ));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: DEFAULT_ISSUER.to_string(),
            default_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_ACCESS_TTL_SECS,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a service from the `[auth]` config section.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let mut service = Self::new(config.jwt_secret.as_bytes())?.with_issuer(&config.issuer);
        if config.access_ttl_secs > 0 {
            service.default_ttl_secs = config.access_ttl_secs;
        }
        if config.refresh_access_ttl_secs > 0 {
            service.refresh_ttl_secs = config.refresh_access_ttl_secs;
        }
        Ok(service)
    }

    /// Replace the issuer claim written and required by this service.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `account_id` valid for `ttl_secs` seconds.
    ///
    /// A zero or negative `ttl_secs` falls back to the default lifetime
    /// (24 hours unless configured otherwise).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encode`] if signing fails.
    #[instrument(skip(self))]
    pub fn issue(&self, account_id: u64, ttl_secs: i64) -> Result<String> {
        let ttl = if ttl_secs > 0 {
            ttl_secs
        } else {
            self.default_ttl_secs
        };
        let now = self.clock.now().timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let token = jsonwebtoken::encode(&Header::new(SIGNING_ALG), &claims, &self.encoding)
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        debug!(account_id, exp = claims.exp, "issued access token");
        Ok(token)
    }

    /// Issue the short-lived token handed out in exchange for a refresh
    /// token.
    pub fn issue_refreshed(&self, account_id: u64) -> Result<String> {
        self.issue(account_id, self.refresh_ttl_secs)
    }

    /// Verify the signature, algorithm, issuer and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpyError::Auth`] with [`AuthFailure::WrongAlgorithm`],
    /// [`AuthFailure::TokenExpired`] or [`AuthFailure::InvalidToken`].
    #[instrument(skip_all)]
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation())
            .map_err(|e| {
                warn!(error = %e, "token rejected");
                map_jwt_error(e)
            })?;

        let claims = data.claims;
        let now = self.clock.now().timestamp();
        if now >= claims.exp {
            warn!(sub = %claims.sub, exp = claims.exp, now, "token expired");
            return Err(AuthFailure::TokenExpired.into());
        }
        Ok(claims)
    }

    /// Validate `token` and return the account id it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<u64> {
        self.validate(token)?.account_id()
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(SIGNING_ALG);
        validation.algorithms = ACCEPTED_ALGS.to_vec();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> ChirpyError {
    let failure = match err.kind() {
        JwtErrorKind::InvalidAlgorithm
        | JwtErrorKind::InvalidAlgorithmName
        | JwtErrorKind::MissingAlgorithm => AuthFailure::WrongAlgorithm,
        JwtErrorKind::ExpiredSignature => AuthFailure::TokenExpired,
        _ => AuthFailure::InvalidToken {
            reason: err.to_string(),
        },
    };
    failure.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
