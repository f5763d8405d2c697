//! Async handle over a [`Store`].
//!
//! [`SharedStore`] is a cheap-to-clone `Arc<Store>` whose [`run`] method
//! dispatches a store call onto Tokio's blocking thread pool via
//! `tokio::task::spawn_blocking`, keeping file I/O and password hashing off
//! the async runtime. Dropping the returned future does not cancel the
//! blocking call, so a load-mutate-persist cycle always runs to completion.
//!
//! [`run`]: SharedStore::run

use std::sync::Arc;

use chirpy_core::{Result, StorageError};

use crate::store::Store;

/// Thread-safe, clonable handle to a [`Store`].
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<Store>,
}

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Borrow the underlying store for synchronous use.
    pub fn store(&self) -> &Store {
        &self.inner
    }

    /// Execute `f` against the store on the blocking pool.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let post = shared.run(move |store| store.create_post(&body, author_id)).await?;
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Store) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StorageError::TaskJoin(e.to_string()))?
    }
}

impl From<Store> for SharedStore {
    fn from(store: Store) -> Self {
        Self::new(store)
    }
}

// ── tests ────────────────────────────────────────────────────────────
