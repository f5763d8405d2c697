//! Error types shared by every Chirpy crate.
//!
//! Every store, token and hashing operation returns [`ChirpyError`] via
//! [`Result`]. The enum is closed over five kinds so a transport layer can
//! map outcomes to responses with a single `match` on [`ChirpyError::kind`]:
//!
//! | kind         | typical response |
//! |--------------|------------------|
//! | `NotFound`   | 404              |
//! | `Auth`       | 401              |
//! | `Forbidden`  | 403              |
//! | `Validation` | 400              |
//! | `Storage`    | 500              |

use std::path::PathBuf;

/// Alias for `Result<T, ChirpyError>`.
pub type Result<T> = std::result::Result<T, ChirpyError>;

/// Unified error type for the Chirpy persistence and authentication core.
#[derive(Debug, thiserror::Error)]
pub enum ChirpyError {
    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Bad credentials, a bad token, or a malformed `Authorization` header.
    #[error("unauthorized: {0}")]
    Auth(#[from] AuthFailure),

    /// The caller is authenticated but does not own the resource.
    #[error("forbidden: {entity} {id} is owned by another account")]
    Forbidden { entity: &'static str, id: String },

    /// Caller-supplied data violates a stated constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reading, decoding, encoding or writing persistent state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse category of a [`ChirpyError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Auth,
    Forbidden,
    Validation,
    Storage,
}

impl ChirpyError {
    /// Build a [`ChirpyError::NotFound`] for `entity` with the given id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a [`ChirpyError::Forbidden`] for `entity` with the given id.
    pub fn forbidden(entity: &'static str, id: impl ToString) -> Self {
        Self::Forbidden {
            entity,
            id: id.to_string(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}

/// Why an authentication attempt was rejected.
///
/// The display text is deliberately generic for [`AuthFailure::InvalidCredentials`]
/// so that an unknown email and a wrong password are indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The header did not start with the required scheme prefix.
    #[error("missing `{scheme}` authorization scheme")]
    MissingScheme { scheme: &'static str },

    /// The header had the right prefix but no credential after it.
    #[error("empty credential in authorization header")]
    EmptyCredential,

    /// The token signature, structure or claims are invalid.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    /// The token was signed with an algorithm outside the HMAC family.
    #[error("unexpected token signing algorithm")]
    WrongAlgorithm,

    /// The token is past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// The refresh token is not registered, has been revoked, or expired.
    #[error("unknown or revoked refresh token")]
    UnknownRefreshToken,
}

/// Low-level persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document or a config file could not be decoded or encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML configuration file could not be decoded.
    #[error("config decode error: {0}")]
    Config(#[from] toml::de::Error),

    /// Renaming the temporary file over the document failed.
    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A previous holder of the document lock panicked.
    #[error("document lock poisoned")]
    LockPoisoned,

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    TaskJoin(String),

    /// An in-memory value (e.g. token claims) could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The system random number generator failed.
    #[error("random number generator failure")]
    Rng,
}

impl From<std::io::Error> for ChirpyError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(StorageError::Io(err))
    }
}

impl From<serde_json::Error> for ChirpyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(StorageError::Json(err))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
