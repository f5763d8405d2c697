//! Entities persisted by the store.
//!
//! Field names match the on-disk JSON document, which is also the shape
//! the HTTP layer returns to clients.

use serde::{Deserialize, Serialize};

/// A short text entry ("chirp") owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique, store-assigned, always >= 1.
    pub id: u64,
    /// The text; at most [`crate::body::MAX_BODY_CHARS`] characters when
    /// prepared through [`crate::body::prepare_body`].
    pub body: String,
    /// The owning account. Not checked against the accounts collection.
    pub author_id: u64,
}

/// A registered user identity.
///
/// The password hash lives in a separate collection and never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique, store-assigned, always >= 1.
    pub id: u64,
    pub email: String,
    /// Premium upgrade marker.
    #[serde(rename = "is_chirpy_red", default)]
    pub premium: bool,
}

/// Ordering of [`Post`]s by id in listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// Parse a `sort` query value. Anything other than `desc` is ascending.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
