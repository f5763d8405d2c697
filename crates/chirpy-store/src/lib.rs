//! # chirpy-store
//!
//! File-backed persistence for Chirpy: posts ("chirps"), accounts, their
//! password hashes, and refresh-token sessions, all kept in one JSON
//! document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  SharedStore (Arc + spawn_blocking)     │
//! ├─────────────────────────────────────────┤
//! │  Store  (RwLock held per whole cycle)   │
//! │    load ─► mutate ─► persist            │
//! ├─────────────────────────────────────────┤
//! │  Document (serde_json, BTreeMap keyed)  │
//! │  atomic replace via tempfile + rename   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use chirpy_store::Store;
//! use chirpy_core::SortOrder;
//!
//! let store = Store::open("database.json")?;
//! let account = store.create_account("a@x.com", "secret")?;
//! store.create_post("hello", account.id)?;
//! let posts = store.list_posts(Some(account.id), SortOrder::Descending)?;
//! ```

pub mod document;
pub mod shared;
pub mod store;

// ── re-exports ───────────────────────────────────────────────────────

pub use document::Document;
pub use shared::SharedStore;
pub use store::Store;
