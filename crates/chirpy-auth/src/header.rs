//! `Authorization` header parsing.
//!
//! Only the `Authorization` header value is ever inspected. Two schemes are
//! recognised: `Bearer <token>` for access and refresh tokens, and
//! `ApiKey <key>` for the premium-upgrade webhook. The prefix match is
//! exact and case-sensitive, including the single trailing space.

use chirpy_core::{AuthFailure, Result};

pub const BEARER_PREFIX: &str = "Bearer ";
pub const API_KEY_PREFIX: &str = "ApiKey ";

/// Extract the token from a `Bearer <token>` header value.
///
/// # Errors
///
/// [`AuthFailure::MissingScheme`] if the prefix is absent and
/// [`AuthFailure::EmptyCredential`] if nothing follows it.
pub fn extract_bearer(header: &str) -> Result<&str> {
    extract(header, BEARER_PREFIX, "Bearer")
}

/// Extract the key from an `ApiKey <key>` header value.
pub fn extract_api_key(header: &str) -> Result<&str> {
    extract(header, API_KEY_PREFIX, "ApiKey")
}

fn extract<'a>(header: &'a str, prefix: &str, scheme: &'static str) -> Result<&'a str> {
    let rest = header
        .strip_prefix(prefix)
        .ok_or(AuthFailure::MissingScheme { scheme })?;
    let credential = rest.trim();
    if credential.is_empty() {
        return Err(AuthFailure::EmptyCredential.into());
    }
    Ok(credential)
}
