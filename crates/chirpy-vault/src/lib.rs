//! Credential hashing for Chirpy.
//!
//! Passwords are never stored or logged in plaintext: the store keeps only
//! the [`PasswordHash`] produced by a [`CredentialHasher`], and refresh
//! tokens come from [`generate_refresh_token`].
//!
//! ```rust,no_run
//! use chirpy_vault::CredentialHasher;
//!
//! # fn example() -> chirpy_core::Result<()> {
//! let hasher = CredentialHasher::default();
//! let hash = hasher.hash("hunter2")?;
//! assert!(hasher.verify(&hash, "hunter2"));
//! # Ok(())
//! # }
//! ```

pub mod crypto;

pub use crypto::{CredentialHasher, PasswordHash, generate_refresh_token};
