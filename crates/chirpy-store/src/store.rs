//! Atomic CRUD over posts, accounts, credentials and refresh tokens.
//!
//! Every public operation is one self-contained cycle: take the lock, load
//! the document from disk, inspect or mutate it, and (for mutations that
//! changed something) persist it back with an atomic replace. Mutations
//! hold the write lock for the whole cycle so two writers can never start
//! from the same snapshot; reads share the read lock. Nothing is cached
//! between calls.
//!
//! Password hashing is CPU-heavy, so it happens outside the lock. Login
//! verifies against a snapshot taken under the read lock and only then
//! takes the write lock, re-checking that the credential it verified is
//! still the stored one.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, info, instrument, warn};

use chirpy_core::clock::{Clock, SystemClock};
use chirpy_core::{
    Account, AuthFailure, ChirpyError, Post, Result, SessionPolicy, SortOrder, StorageError,
    StoreConfig,
};
use chirpy_vault::{CredentialHasher, PasswordHash};

use crate::document::{self, Document, next_free_id};

/// File-backed store for the whole Chirpy dataset.
///
/// One `Store` guards one document file. Share it between threads with an
/// `Arc`, or wrap it in a [`crate::SharedStore`] for async callers.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    lock: RwLock<()>,
    hasher: CredentialHasher,
    sessions: SessionPolicy,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open (or initialise) the document at `path` with the default
    /// password work factor and non-expiring refresh tokens.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, CredentialHasher::default(), SessionPolicy::NeverExpire)
    }

    /// Open with an explicit hasher and refresh token policy.
    ///
    /// If the file does not exist an empty document is written, so the
    /// file on disk is always a complete document. An existing file is
    /// decoded once to fail fast on corruption.
    pub fn open_with(
        path: impl AsRef<Path>,
        hasher: CredentialHasher,
        sessions: SessionPolicy,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            document::load(&path)?;
        } else {
            document::persist(&path, &Document::default())?;
            info!(path = %path.display(), "initialised empty document");
        }

        Ok(Self {
            path,
            lock: RwLock::new(()),
            hasher,
            sessions,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source used for refresh token issue and expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open using the `[store]` config section.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let hasher = CredentialHasher::with_iterations(config.password_iterations)?;
        Self::open_with(&config.path, hasher, config.session_policy())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_policy(&self) -> SessionPolicy {
        self.sessions
    }

    /// Load a full snapshot of the document under the read lock.
    pub fn snapshot(&self) -> Result<Document> {
        self.read(|doc| Ok(doc.clone()))
    }

    // ── posts ────────────────────────────────────────────────────────

    /// Store a new post under the lowest free id.
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub fn create_post(&self, body: &str, author_id: u64) -> Result<Post> {
        let post = self.write(|doc| {
            let post = Post {
                id: next_free_id(&doc.chirps),
                body: body.to_string(),
                author_id,
            };
            doc.chirps.insert(post.id, post.clone());
            Ok(post)
        })?;
        debug!(post_id = post.id, author_id, "post created");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub fn get_post(&self, id: u64) -> Result<Post> {
        self.read(|doc| {
            doc.chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| ChirpyError::not_found("post", id))
        })
    }

    /// List posts sorted by id. `Some(0)` means no author filter.
    #[instrument(skip(self))]
    pub fn list_posts(&self, author_id: Option<u64>, order: SortOrder) -> Result<Vec<Post>> {
        let author = author_id.filter(|&id| id > 0);
        self.read(|doc| {
            let matching = doc
                .chirps
                .values()
                .filter(|post| author.is_none_or(|a| post.author_id == a))
                .cloned();
            let posts = match order {
                SortOrder::Ascending => matching.collect(),
                SortOrder::Descending => matching.rev().collect(),
            };
            Ok(posts)
        })
    }

    /// Remove a post owned by `requester_id`.
    ///
    /// # Errors
    ///
    /// [`ChirpyError::NotFound`] if the post is absent and
    /// [`ChirpyError::Forbidden`] if another account owns it; in both
    /// cases nothing is written.
    #[instrument(skip(self))]
    pub fn remove_post(&self, id: u64, requester_id: u64) -> Result<Post> {
        let post = self.write(|doc| {
            let owner = doc
                .chirps
                .get(&id)
                .map(|post| post.author_id)
                .ok_or_else(|| ChirpyError::not_found("post", id))?;
            if owner != requester_id {
                return Err(ChirpyError::forbidden("post", id));
            }
            doc.chirps
                .remove(&id)
                .ok_or_else(|| ChirpyError::not_found("post", id))
        })?;
        debug!(post_id = id, "post deleted");
        Ok(post)
    }

    /// Delete a post if it exists and `requester_id` wrote it.
    ///
    /// Returns `false`, changing nothing, when the post is missing or owned
    /// by someone else. Use [`Store::remove_post`] to tell those apart.
    pub fn delete_post(&self, id: u64, requester_id: u64) -> Result<bool> {
        match self.remove_post(id, requester_id) {
            Ok(_) => Ok(true),
            Err(ChirpyError::NotFound { .. } | ChirpyError::Forbidden { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── accounts ─────────────────────────────────────────────────────

    /// Register an account and its credential record.
    #[instrument(skip(self, password))]
    pub fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        validate_credentials(email, password)?;
        let hash = self.hasher.hash(password)?;

        let account = self.write(|doc| {
            let account = Account {
                id: next_free_id(&doc.users),
                email: email.to_string(),
                premium: false,
            };
            doc.users.insert(account.id, account.clone());
            doc.passwords.insert(account.id, hash);
            Ok(account)
        })?;
        debug!(account_id = account.id, "account created");
        Ok(account)
    }

    /// Overwrite an account's email and password.
    #[instrument(skip(self, password))]
    pub fn update_account(&self, id: u64, email: &str, password: &str) -> Result<Account> {
        validate_credentials(email, password)?;
        let hash = self.hasher.hash(password)?;

        let account = self.write(|doc| {
            let account = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| ChirpyError::not_found("account", id))?;
            account.email = email.to_string();
            let updated = account.clone();
            doc.passwords.insert(id, hash);
            Ok(updated)
        })?;
        debug!(account_id = id, "account updated");
        Ok(account)
    }

    #[instrument(skip(self))]
    pub fn get_account(&self, id: u64) -> Result<Account> {
        self.read(|doc| {
            doc.users
                .get(&id)
                .cloned()
                .ok_or_else(|| ChirpyError::not_found("account", id))
        })
    }

    /// Set the premium flag. Returns `false` if the account does not exist.
    #[instrument(skip(self))]
    pub fn set_premium(&self, account_id: u64, premium: bool) -> Result<bool> {
        let found = self.write(|doc| match doc.users.get_mut(&account_id) {
            Some(account) => {
                account.premium = premium;
                Ok(true)
            }
            None => Ok(false),
        })?;
        if found {
            debug!(account_id, premium, "premium flag updated");
        }
        Ok(found)
    }

    // ── sessions ─────────────────────────────────────────────────────

    /// Check credentials and register `refresh_token` for the account.
    ///
    /// When several accounts share an email, the lowest id wins. An unknown
    /// email and a wrong password produce the same error.
    #[instrument(skip(self, password, refresh_token))]
    pub fn login(&self, email: &str, password: &str, refresh_token: &str) -> Result<Account> {
        if refresh_token.is_empty() {
            return Err(ChirpyError::Validation(
                "refresh token must not be empty".into(),
            ));
        }

        let result = self.verify_login(email, password).and_then(|(account, hash)| {
            self.register_session(account.id, email, &hash, refresh_token)
        });

        match &result {
            Ok(account) => debug!(account_id = account.id, "login succeeded"),
            Err(e) if e.is_auth() => warn!("login rejected"),
            Err(_) => {}
        }
        result
    }

    /// Find the account for `email` and check `password` against its stored
    /// hash. Only the lookup holds the (shared) lock.
    fn verify_login(&self, email: &str, password: &str) -> Result<(Account, PasswordHash)> {
        let (account, hash) = self
            .read(|doc| {
                let found = doc
                    .users
                    .values()
                    .find(|account| account.email == email)
                    .and_then(|account| {
                        let hash = doc.passwords.get(&account.id)?;
                        Some((account.clone(), hash.clone()))
                    });
                Ok(found)
            })?
            .ok_or(AuthFailure::InvalidCredentials)?;

        if !self.hasher.verify(&hash, password) {
            return Err(AuthFailure::InvalidCredentials.into());
        }
        Ok((account, hash))
    }

    /// Map `refresh_token` to `account_id`, provided the account still has
    /// the email and credential hash that were verified.
    fn register_session(
        &self,
        account_id: u64,
        email: &str,
        verified: &PasswordHash,
        refresh_token: &str,
    ) -> Result<Account> {
        let issued_at = self.clock.now().timestamp();
        self.write(|doc| {
            let account = doc
                .users
                .get(&account_id)
                .filter(|account| account.email == email)
                .filter(|_| doc.passwords.get(&account_id) == Some(verified))
                .cloned()
                .ok_or(AuthFailure::InvalidCredentials)?;

            doc.refresh_tokens
                .insert(refresh_token.to_string(), account_id);
            if let SessionPolicy::ExpireAfter(_) = self.sessions {
                doc.refresh_token_issued_at
                    .insert(refresh_token.to_string(), issued_at);
            }
            Ok(account)
        })
    }

    /// Resolve a refresh token to its account.
    #[instrument(skip_all)]
    pub fn account_from_refresh_token(&self, token: &str) -> Result<Account> {
        let now = self.clock.now().timestamp();
        self.read(|doc| {
            let account_id = doc
                .refresh_tokens
                .get(token)
                .copied()
                .ok_or(AuthFailure::UnknownRefreshToken)?;
            if self.session_expired(doc, token, now) {
                return Err(AuthFailure::UnknownRefreshToken.into());
            }
            doc.users
                .get(&account_id)
                .cloned()
                .ok_or_else(|| AuthFailure::UnknownRefreshToken.into())
        })
    }

    /// Forget a refresh token. Idempotent; returns whether it was present.
    #[instrument(skip_all)]
    pub fn revoke_refresh_token(&self, token: &str) -> Result<bool> {
        let existed = self.write(|doc| {
            doc.refresh_token_issued_at.remove(token);
            Ok(doc.refresh_tokens.remove(token).is_some())
        })?;
        debug!(existed, "refresh token revoked");
        Ok(existed)
    }

    /// Drop every refresh token the session policy considers expired.
    ///
    /// Returns how many were removed; always zero under
    /// [`SessionPolicy::NeverExpire`].
    #[instrument(skip(self))]
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        if self.sessions == SessionPolicy::NeverExpire {
            return Ok(0);
        }
        let now = self.clock.now().timestamp();
        let purged = self.write(|doc| {
            let current: &Document = doc;
            let expired: Vec<String> = current
                .refresh_tokens
                .keys()
                .filter(|token| self.session_expired(current, token, now))
                .cloned()
                .collect();
            for token in &expired {
                doc.refresh_tokens.remove(token);
                doc.refresh_token_issued_at.remove(token);
            }
            Ok(expired.len())
        })?;
        if purged > 0 {
            info!(purged, "purged expired refresh tokens");
        }
        Ok(purged)
    }

    /// Tokens with no recorded login time are treated as expired once a
    /// TTL is configured.
    fn session_expired(&self, doc: &Document, token: &str, now: i64) -> bool {
        match self.sessions {
            SessionPolicy::NeverExpire => false,
            SessionPolicy::ExpireAfter(ttl) => {
                let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                doc.refresh_token_issued_at
                    .get(token)
                    .is_none_or(|&issued| now >= issued.saturating_add(ttl))
            }
        }
    }

    // ── load / persist cycle ─────────────────────────────────────────

    /// Run `f` against a freshly loaded document under the shared lock.
    fn read<T>(&self, f: impl FnOnce(&Document) -> Result<T>) -> Result<T> {
        let _guard = self.lock.read().map_err(|_| StorageError::LockPoisoned)?;
        let doc = document::load(&self.path)?;
        f(&doc)
    }

    /// Run `f` against a freshly loaded document under the exclusive lock,
    /// persisting the result if `f` succeeded and changed anything.
    fn write<T>(&self, f: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let _guard = self.lock.write().map_err(|_| StorageError::LockPoisoned)?;
        let mut doc = document::load(&self.path)?;
        let before = doc.clone();
        let out = f(&mut doc)?;
        if doc != before {
            document::persist(&self.path, &doc)?;
        }
        Ok(out)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(ChirpyError::Validation("email must not be empty".into()));
    }
    if password.is_empty() {
        return Err(ChirpyError::Validation("password must not be empty".into()));
    }
    Ok(())
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use chirpy_core::{ErrorKind, FixedClock};

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::with_iterations(1_000).unwrap()
    }

    fn setup_store(dir: &tempfile::TempDir) -> Store {
        Store::open_with(
            dir.path().join("database.json"),
            fast_hasher(),
            SessionPolicy::NeverExpire,
        )
        .unwrap()
    }

    #[test]
    fn open_initialises_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        assert!(store.path().exists());
        assert_eq!(store.snapshot().unwrap(), Document::default());
    }

    #[test]
    fn open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Store::open_with(&path, fast_hasher(), SessionPolicy::NeverExpire).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn create_and_get_post() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        let post = store.create_post("hello", 9).unwrap();
        assert_eq!(post.id, 1);
        assert_eq!(post.author_id, 9);
        assert_eq!(store.get_post(1).unwrap(), post);
    }

    #[test]
    fn get_missing_post_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        let err = store.get_post(99).unwrap_err();
        match err {
            ChirpyError::NotFound { entity, id } => {
                assert_eq!(entity, "post");
                assert_eq!(id, "99");
            }
            other => panic!("expected NotFound, got: {other}"),
        }
    }

    #[test]
    fn deleted_post_id_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        for expected in 1..=3 {
            assert_eq!(store.create_post("x", 1).unwrap().id, expected);
        }
        assert!(store.delete_post(2, 1).unwrap());
        assert_eq!(store.create_post("again", 1).unwrap().id, 2);
        assert_eq!(store.create_post("next", 1).unwrap().id, 4);
    }

    #[test]
    fn list_posts_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        store.create_post("a1", 1).unwrap();
        store.create_post("b1", 2).unwrap();
        store.create_post("a2", 1).unwrap();

        let all = store.list_posts(None, SortOrder::Ascending).unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let desc = store.list_posts(None, SortOrder::Descending).unwrap();
        assert_eq!(desc.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let by_one = store.list_posts(Some(1), SortOrder::Descending).unwrap();
        assert_eq!(by_one.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 1]);

        let zero_means_all = store.list_posts(Some(0), SortOrder::Ascending).unwrap();
        assert_eq!(zero_means_all.len(), 3);

        assert!(store.list_posts(Some(42), SortOrder::Ascending).unwrap().is_empty());
    }

    #[test]
    fn delete_by_non_author_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        let post = store.create_post("mine", 1).unwrap();
        assert!(!store.delete_post(post.id, 2).unwrap());
        assert_eq!(store.get_post(post.id).unwrap(), post);

        assert!(store.delete_post(post.id, 1).unwrap());
        assert!(store.get_post(post.id).unwrap_err().is_not_found());
    }

    #[test]
    fn remove_post_distinguishes_missing_from_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let post = store.create_post("mine", 1).unwrap();

        assert_eq!(
            store.remove_post(post.id, 2).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            store.remove_post(77, 1).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(store.remove_post(post.id, 1).unwrap(), post);
    }

    #[test]
    fn delete_missing_post_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        assert!(!store.delete_post(1, 1).unwrap());
    }

    #[test]
    fn create_account_stores_hash_not_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        let account = store.create_account("a@x.com", "secret").unwrap();
        assert_eq!(
            account,
            Account {
                id: 1,
                email: "a@x.com".into(),
                premium: false
            }
        );

        let doc = store.snapshot().unwrap();
        let hash = &doc.passwords[&account.id];
        assert_ne!(hash.as_bytes(), b"secret");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("\"secret\""));
    }

    #[test]
    fn empty_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        assert_eq!(
            store.create_account("", "pw").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            store.create_account("a@x.com", "").unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert!(store.snapshot().unwrap().users.is_empty());
    }

    #[test]
    fn update_account_changes_email_and_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let account = store.create_account("old@x.com", "old-pw").unwrap();

        let updated = store
            .update_account(account.id, "new@x.com", "new-pw")
            .unwrap();
        assert_eq!(updated.email, "new@x.com");
        assert_eq!(store.get_account(account.id).unwrap(), updated);

        assert!(store.login("new@x.com", "old-pw", "t1").unwrap_err().is_auth());
        assert_eq!(store.login("new@x.com", "new-pw", "t2").unwrap().id, account.id);
    }

    #[test]
    fn update_missing_account_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);

        let err = store.update_account(5, "a@x.com", "pw").unwrap_err();
        assert!(err.is_not_found());
        assert!(store.snapshot().unwrap().passwords.is_empty());
    }

    #[test]
    fn login_wrong_password_and_unknown_email_look_alike() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        store.create_account("a@x.com", "secret").unwrap();

        let wrong = store.login("a@x.com", "nope", "t").unwrap_err();
        let unknown = store.login("b@x.com", "secret", "t").unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(
            wrong,
            ChirpyError::Auth(AuthFailure::InvalidCredentials)
        ));
        assert!(store.snapshot().unwrap().refresh_tokens.is_empty());
    }

    #[test]
    fn login_with_duplicate_email_picks_lowest_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let first = store.create_account("dup@x.com", "one").unwrap();
        let second = store.create_account("dup@x.com", "two").unwrap();
        assert!(first.id < second.id);

        assert_eq!(store.login("dup@x.com", "one", "t1").unwrap().id, first.id);
        // The second account is shadowed by the first match.
        assert!(store.login("dup@x.com", "two", "t2").unwrap_err().is_auth());
    }

    #[test]
    fn set_premium_flag() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let account = store.create_account("a@x.com", "pw").unwrap();

        assert!(store.set_premium(account.id, true).unwrap());
        assert!(store.get_account(account.id).unwrap().premium);

        assert!(!store.set_premium(99, true).unwrap());
    }

    #[test]
    fn revoke_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        store.create_account("a@x.com", "pw").unwrap();
        store.login("a@x.com", "pw", "tok").unwrap();

        assert!(store.revoke_refresh_token("tok").unwrap());
        assert!(!store.revoke_refresh_token("tok").unwrap());
        assert!(!store.revoke_refresh_token("never-issued").unwrap());
        assert!(store.account_from_refresh_token("tok").unwrap_err().is_auth());
    }

    #[test]
    fn refresh_token_for_missing_account_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        std::fs::write(
            &path,
            r#"{"chirps":{},"users":{},"passwords":{},"refresh_tokens":{"dangling":3}}"#,
        )
        .unwrap();
        let store = Store::open_with(&path, fast_hasher(), SessionPolicy::NeverExpire).unwrap();

        assert!(store.account_from_refresh_token("dangling").unwrap_err().is_auth());
    }

    #[test]
    fn never_expire_policy_keeps_document_at_four_members() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        store.create_account("a@x.com", "pw").unwrap();
        store.login("a@x.com", "pw", "tok").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.as_object().unwrap().len(), 4);
        assert_eq!(store.purge_expired_sessions().unwrap(), 0);
    }

    #[test]
    fn expiring_sessions_are_rejected_and_purged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");

        let short = Store::open_with(
            &path,
            fast_hasher(),
            SessionPolicy::ExpireAfter(Duration::ZERO),
        )
        .unwrap();
        short.create_account("a@x.com", "pw").unwrap();
        short.login("a@x.com", "pw", "tok").unwrap();
        assert!(short.account_from_refresh_token("tok").unwrap_err().is_auth());

        assert_eq!(short.purge_expired_sessions().unwrap(), 1);
        let doc = short.snapshot().unwrap();
        assert!(doc.refresh_tokens.is_empty());
        assert!(doc.refresh_token_issued_at.is_empty());
    }

    #[test]
    fn session_expires_exactly_at_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::starting_now());
        let store = Store::open_with(
            dir.path().join("database.json"),
            fast_hasher(),
            SessionPolicy::ExpireAfter(Duration::from_secs(60)),
        )
        .unwrap()
        .with_clock(clock.clone());
        let account = store.create_account("a@x.com", "pw").unwrap();
        store.login("a@x.com", "pw", "tok").unwrap();

        clock.advance(chrono::Duration::seconds(59));
        assert_eq!(store.account_from_refresh_token("tok").unwrap(), account);
        assert_eq!(store.purge_expired_sessions().unwrap(), 0);

        clock.advance(chrono::Duration::seconds(1));
        assert!(store.account_from_refresh_token("tok").unwrap_err().is_auth());
        assert_eq!(store.purge_expired_sessions().unwrap(), 1);
        assert!(store.snapshot().unwrap().refresh_tokens.is_empty());
    }

    #[test]
    fn session_not_registered_when_credential_changed_after_verify() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let account = store.create_account("a@x.com", "old-pw").unwrap();

        let (verified, hash) = store.verify_login("a@x.com", "old-pw").unwrap();
        assert_eq!(verified, account);

        // The password changes between verification and registration.
        store
            .update_account(account.id, "a@x.com", "new-pw")
            .unwrap();
        let err = store
            .register_session(account.id, "a@x.com", &hash, "tok")
            .unwrap_err();
        assert!(matches!(
            err,
            ChirpyError::Auth(AuthFailure::InvalidCredentials)
        ));
        assert!(store.snapshot().unwrap().refresh_tokens.is_empty());
    }

    #[test]
    fn session_not_registered_when_email_changed_after_verify() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(&dir);
        let account = store.create_account("a@x.com", "pw").unwrap();

        let (_, hash) = store.verify_login("a@x.com", "pw").unwrap();
        store.update_account(account.id, "b@x.com", "pw").unwrap();

        assert!(
            store
                .register_session(account.id, "a@x.com", &hash, "tok")
                .unwrap_err()
                .is_auth()
        );
    }

    #[test]
    fn from_config_rejects_zero_session_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("configured.json"),
            password_iterations: 1_000,
            session_ttl_secs: Some(0),
        };
        let err = Store::from_config(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!config.path.exists());
    }

    #[test]
    fn long_lived_sessions_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_with(
            dir.path().join("database.json"),
            fast_hasher(),
            SessionPolicy::ExpireAfter(Duration::from_secs(3_600)),
        )
        .unwrap();
        let account = store.create_account("a@x.com", "pw").unwrap();
        store.login("a@x.com", "pw", "tok").unwrap();

        assert_eq!(store.account_from_refresh_token("tok").unwrap(), account);
        assert_eq!(store.purge_expired_sessions().unwrap(), 0);

        assert!(store.revoke_refresh_token("tok").unwrap());
        assert!(store.snapshot().unwrap().refresh_token_issued_at.is_empty());
    }

    #[test]
    fn from_config_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("configured.json"),
            password_iterations: 1_000,
            session_ttl_secs: Some(60),
        };
        let store = Store::from_config(&config).unwrap();
        assert_eq!(store.path(), config.path.as_path());
        assert_eq!(
            store.session_policy(),
            SessionPolicy::ExpireAfter(Duration::from_secs(60))
        );
    }
}
