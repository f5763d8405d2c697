//! The on-disk JSON document and its atomic load/persist cycle.
//!
//! The whole dataset is one JSON object:
//!
//! ```json
//! {
//!   "chirps":         { "1": { "id": 1, "body": "hi", "author_id": 1 } },
//!   "users":          { "1": { "id": 1, "email": "a@x.com", "is_chirpy_red": false } },
//!   "passwords":      { "1": "<base64 hash>" },
//!   "refresh_tokens": { "<token>": 1 }
//! }
//! ```
//!
//! Collections are `BTreeMap`s so iteration is always in ascending key
//! order. A missing or empty file decodes to [`Document::default`].
//! Writes go to a temporary file in the same directory which is then
//! renamed over the target, so readers only ever see a complete document.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use chirpy_core::{Account, Post, Result, StorageError};
use chirpy_vault::PasswordHash;

/// Every collection the store persists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chirps: BTreeMap<u64, Post>,
    #[serde(default)]
    pub users: BTreeMap<u64, Account>,
    #[serde(default)]
    pub passwords: BTreeMap<u64, PasswordHash>,
    #[serde(default)]
    pub refresh_tokens: BTreeMap<String, u64>,
    /// Login time (unix seconds) per refresh token. Only written when a
    /// session expiry policy is configured.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub refresh_token_issued_at: BTreeMap<String, i64>,
}

/// Smallest id >= 1 not present in `map`.
///
/// Scans keys in ascending order and stops at the first gap; a dense
/// collection yields `len + 1`.
pub fn next_free_id<V>(map: &BTreeMap<u64, V>) -> u64 {
    let mut candidate = 1;
    for &id in map.keys() {
        if id == candidate {
            candidate += 1;
        } else if id > candidate {
            break;
        }
    }
    candidate
}

/// Read the document at `path`.
///
/// An absent or whitespace-only file is the empty default document.
pub fn load(path: &Path) -> Result<Document> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::default()),
        Err(e) => return Err(StorageError::Io(e).into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    let document = serde_json::from_slice(&bytes)?;
    Ok(document)
}

/// Atomically replace the document at `path` with `document`.
///
/// Encoding happens before any file is touched, so an encode failure
/// leaves the previous document in place.
pub fn persist(path: &Path, document: &Document) -> Result<()> {
    let encoded = serde_json::to_vec_pretty(document)?;
    let dir = parent_dir(path);

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&encoded)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    debug!(
        path = %path.display(),
        bytes = encoded.len(),
        chirps = document.chirps.len(),
        users = document.users.len(),
        "document persisted"
    );
    Ok(())
}

/// Directory holding `path`; `.` for a bare file name.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// ── tests ────────────────────────────────────────────────────────────
