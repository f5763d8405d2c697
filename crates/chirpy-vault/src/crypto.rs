//! Password hashing and random token generation using the `ring` crate.
//!
//! - **Hashing**: PBKDF2-HMAC-SHA256 with a random 256-bit salt per hash and
//!   a fixed work factor chosen when the [`CredentialHasher`] is built.
//! - **Verification**: `ring::pbkdf2::verify`, which compares the derived
//!   key in constant time.
//! - **Refresh tokens**: 256 bits from the system CSPRNG, hex-encoded.
//!
//! # Hash layout
//!
//! A [`PasswordHash`] is opaque bytes, base64-encoded when serialized:
//!
//! ```text
//! [4 bytes: iteration count, big-endian]
//! [32 bytes: PBKDF2 salt]
//! [32 bytes: derived key]
//! ```
//!
//! Storing the iteration count makes every hash self-describing, so raising
//! the work factor later does not invalidate existing credentials.

use std::fmt;
use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use chirpy_core::config::DEFAULT_PASSWORD_ITERATIONS;
use chirpy_core::{ChirpyError, Result, StorageError};

/// Length of the PBKDF2 salt in bytes.
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of a refresh token before hex encoding.
pub const REFRESH_TOKEN_BYTES: usize = 32;

const ITERATIONS_LEN: usize = 4;

/// A stored hash may record at most this multiple of the configured work
/// factor; anything above is treated as malformed.
pub const MAX_ITERATION_FACTOR: u32 = 10;

/// Total length of an encoded hash.
const HASH_LEN: usize = ITERATIONS_LEN + SALT_LEN + KEY_LEN;

/// PBKDF2 algorithm: HMAC-SHA256.
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

// ---------------------------------------------------------------------------
// PasswordHash
// ---------------------------------------------------------------------------

/// A salted one-way password hash.
///
/// `Debug` never prints the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(Vec<u8>);

impl PasswordHash {
    /// Wrap previously produced hash bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Split into `(iterations, salt, key)`, or `None` if malformed.
    fn parts(&self) -> Option<(NonZeroU32, &[u8], &[u8])> {
        if self.0.len() != HASH_LEN {
            return None;
        }
        let (iter_bytes, rest) = self.0.split_at(ITERATIONS_LEN);
        let iterations = u32::from_be_bytes(iter_bytes.try_into().ok()?);
        let (salt, key) = rest.split_at(SALT_LEN);
        Some((NonZeroU32::new(iterations)?, salt, key))
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

impl Serialize for PasswordHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for PasswordHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// CredentialHasher
// ---------------------------------------------------------------------------

/// Hashes and verifies passwords with a fixed PBKDF2 work factor.
#[derive(Clone)]
pub struct CredentialHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(
            NonZeroU32::new(DEFAULT_PASSWORD_ITERATIONS)
                .expect("DEFAULT_PASSWORD_ITERATIONS is non-zero"),
        )
    }
}

impl CredentialHasher {
    /// Build a hasher that derives keys with `iterations` rounds.
    pub fn new(iterations: NonZeroU32) -> Self {
        Self {
            iterations,
            rng: SystemRandom::new(),
        }
    }

    /// Build a hasher from a configured iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`ChirpyError::Validation`] if `iterations` is zero.
    pub fn with_iterations(iterations: u32) -> Result<Self> {
        NonZeroU32::new(iterations)
            .map(Self::new)
            .ok_or_else(|| ChirpyError::Validation("password iterations must be positive".into()))
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Highest iteration count [`verify`](Self::verify) will run.
    pub fn max_iterations(&self) -> u32 {
        self.iterations.get().saturating_mul(MAX_ITERATION_FACTOR)
    }

    /// Hash `plaintext` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Rng`] if the system CSPRNG fails.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash> {
        let mut salt = [0u8; SALT_LEN];
        self.rng.fill(&mut salt).map_err(|_| StorageError::Rng)?;

        let mut key = [0u8; KEY_LEN];
        pbkdf2::derive(
            PBKDF2_ALG,
            self.iterations,
            &salt,
            plaintext.as_bytes(),
            &mut key,
        );

        let mut bytes = Vec::with_capacity(HASH_LEN);
        bytes.extend_from_slice(&self.iterations.get().to_be_bytes());
        bytes.extend_from_slice(&salt);
        bytes.extend_from_slice(&key);

        tracing::trace!(iterations = self.iterations.get(), "hashed password");
        Ok(PasswordHash(bytes))
    }

    /// Check `plaintext` against a stored hash.
    ///
    /// Uses the iteration count recorded in the hash, so hashes made with a
    /// different work factor still verify. A malformed hash never matches,
    /// and neither does one recording more than [`MAX_ITERATION_FACTOR`]
    /// times this hasher's work factor.
    pub fn verify(&self, hash: &PasswordHash, plaintext: &str) -> bool {
        let Some((iterations, salt, key)) = hash.parts() else {
            tracing::warn!("stored password hash is malformed");
            return false;
        };
        if iterations.get() > self.max_iterations() {
            tracing::warn!(
                recorded = iterations.get(),
                limit = self.max_iterations(),
                "stored password hash exceeds the work factor limit"
            );
            return false;
        }
        pbkdf2::verify(PBKDF2_ALG, iterations, salt, plaintext.as_bytes(), key).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Random tokens
// ---------------------------------------------------------------------------

/// Generate an opaque refresh token: 32 random bytes, hex-encoded.
///
/// # Errors
///
/// Returns [`StorageError::Rng`] if the system CSPRNG fails.
pub fn generate_refresh_token() -> Result<String> {
    let mut buf = [0u8; REFRESH_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| StorageError::Rng)?;
    Ok(hex::encode(buf))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
