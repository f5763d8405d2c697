//! # chirpy-core
//!
//! Types shared by the Chirpy persistence and authentication crates: the
//! closed [`ChirpyError`] type, the persisted entities, post body
//! preparation, the injectable [`Clock`], and configuration.
//!
//! ```text
//! chirpy-store ──► chirpy-vault ──► chirpy-core
//!                                        ▲
//!                    chirpy-auth ────────┘
//! ```

pub mod body;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;

// ── re-exports ───────────────────────────────────────────────────────

pub use body::{MAX_BODY_CHARS, censor, prepare_body};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AuthConfig, ChirpyConfig, SessionPolicy, StoreConfig};
pub use error::{AuthFailure, ChirpyError, ErrorKind, Result, StorageError};
pub use model::{Account, Post, SortOrder};
