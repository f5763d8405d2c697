//! Bearer-token service for Chirpy.
//!
//! - [`TokenService`] issues HS256 JWTs binding an account id to the
//!   service issuer, and validates them (algorithm family, signature,
//!   issuer, expiry).
//! - [`extract_bearer`] / [`extract_api_key`] pull credentials out of an
//!   `Authorization` header value.
//! - [`Clock`] lets callers and tests control the notion of "now".
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chirpy_auth::{TokenService, extract_bearer};
//!
//! # fn example(header: &str) -> chirpy_core::Result<()> {
//! let tokens = TokenService::new(b"shared-secret")?;
//! let jwt = tokens.issue(1, 0)?;
//!
//! let account_id = tokens.authenticate(extract_bearer(header)?)?;
//! # let _ = (jwt, account_id);
//! # Ok(())
//! # }
//! ```

pub mod header;
pub mod token;

pub use chirpy_core::clock::{Clock, FixedClock, SystemClock};
pub use header::{extract_api_key, extract_bearer};
pub use token::{Claims, TokenService};
