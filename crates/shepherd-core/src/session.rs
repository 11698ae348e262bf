//! The vault session/lock state machine.
//!
//! A [`Session`] is the client's record of the backend-held vault:
//! closed, open-but-locked, or open-and-unlocked. Every operation is
//! validated against the current state *before* a backend call is made,
//! and a transition is applied only when the backend confirms it —
//! never optimistically. On any failure, local state is left exactly as
//! it was.
//!
//! Operations take `&mut self`, so the session is an exclusive-owner
//! object: two in-flight state-mutating calls cannot exist at once, by
//! construction.

use shepherd_api::{Entry, Listing, VaultBackend};

use crate::cache::EntryCache;
use crate::error::SessionError;

/// Client-side session state. The tagged form makes
/// "authenticated without an open vault" unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No vault file is designated.
    Closed,
    /// A vault is open; the master password has not been verified.
    OpenLocked {
        /// Vault display name (may be empty after a status resync).
        name: String,
        /// Entry count reported by the backend.
        entry_count: u64,
    },
    /// A vault is open and the master password has been verified.
    OpenUnlocked {
        /// Vault display name (may be empty after a status resync).
        name: String,
        /// Entry count reported by the backend.
        entry_count: u64,
    },
}

impl SessionState {
    /// Short state description used in guard errors and status output.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::OpenLocked { .. } => "locked",
            Self::OpenUnlocked { .. } => "unlocked",
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, Self::OpenUnlocked { .. })
    }
}

/// The session state machine, driving a [`VaultBackend`].
///
/// Owns the entry cache: the cache exists only while unlocked, is
/// populated only by [`reload`](Session::reload), and is discarded —
/// not merely hidden — on every transition out of the unlocked state.
pub struct Session<B: VaultBackend> {
    backend: B,
    state: SessionState,
    cache: Option<EntryCache>,
}

impl<B: VaultBackend> Session<B> {
    /// A fresh session: closed, no cache.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: SessionState::Closed,
            cache: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The entry cache, if one has been loaded in the current unlocked
    /// session.
    pub fn cache(&self) -> Option<&EntryCache> {
        self.cache.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Entries matching `query` from the current cache snapshot, in
    /// backend order. Pure and synchronous; with no cache (locked or
    /// closed) the result is empty.
    pub fn filter(&self, query: &str) -> Vec<&Entry> {
        self.cache.as_ref().map_or_else(Vec::new, |c| c.filter(query))
    }

    /// Like [`filter`](Session::filter), but each hit carries its
    /// backend-order index — the one [`delete_entry`](Session::delete_entry)
    /// and [`modify_entry`](Session::modify_entry) address.
    pub fn filter_indexed(&self, query: &str) -> Vec<(usize, &Entry)> {
        self.cache
            .as_ref()
            .map_or_else(Vec::new, |c| c.filter_indexed(query))
    }

    /// Adopt the backend's authoritative open/authenticated state.
    ///
    /// Used at process start: the backend holds the real session, and a
    /// fresh client must not guess. Status carries no display metadata,
    /// so a resynchronized open state starts with an empty name and a
    /// zero count until the next load refreshes them.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the status call fails; the
    /// local state is left unchanged.
    pub async fn resync(&mut self) -> Result<(), SessionError> {
        let status = self.backend.vault_status().await?;
        self.state = if !status.is_open {
            SessionState::Closed
        } else if status.is_authenticated {
            SessionState::OpenUnlocked {
                name: String::new(),
                entry_count: 0,
            }
        } else {
            SessionState::OpenLocked {
                name: String::new(),
                entry_count: 0,
            }
        };
        self.cache = None;
        tracing::debug!(state = self.state.describe(), "session resynchronized");
        Ok(())
    }

    /// List a directory via the backend. Legal in every state — the
    /// browser is a selection helper, not a vault operation.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Backend`] if the listing fails.
    pub async fn browse(&self, path: &str) -> Result<Listing, SessionError> {
        Ok(self.backend.browse(path).await?)
    }

    /// Create a new vault. `CLOSED → OPEN_UNLOCKED` directly — the
    /// creator supplied the password — followed by an entry load.
    ///
    /// # Errors
    ///
    /// Fails locally on a missing path or password, on a non-closed
    /// session, and otherwise as the backend reports.
    pub async fn create(
        &mut self,
        path: &str,
        password: &str,
        name: &str,
    ) -> Result<(), SessionError> {
        self.require_closed("create a vault")?;
        if path.is_empty() {
            return Err(SessionError::validation("a vault path is required"));
        }
        if password.is_empty() {
            return Err(SessionError::validation("a master password is required"));
        }

        let info = self.backend.create_vault(path, password, name).await?;
        self.state = SessionState::OpenUnlocked {
            name: info.name,
            entry_count: info.entries,
        };
        self.cache = None;
        self.reload().await
    }

    /// Open an existing vault. `CLOSED → OPEN_LOCKED`, always — entry
    /// contents stay out of reach until [`unlock`](Session::unlock).
    ///
    /// # Errors
    ///
    /// Fails locally on an empty path or a non-closed session, and
    /// otherwise as the backend reports.
    pub async fn open(&mut self, path: &str) -> Result<(), SessionError> {
        self.require_closed("open a vault")?;
        if path.is_empty() {
            return Err(SessionError::validation("a vault path is required"));
        }

        let info = self.backend.open_vault(path).await?;
        self.state = SessionState::OpenLocked {
            name: info.name,
            entry_count: info.entries,
        };
        self.cache = None;
        Ok(())
    }

    /// Verify the master password. `OPEN_LOCKED → OPEN_UNLOCKED`, then
    /// an entry load. A wrong password leaves the session locked.
    ///
    /// # Errors
    ///
    /// Fails locally on an empty password or when the session is not in
    /// the locked state, and otherwise as the backend reports.
    pub async fn unlock(&mut self, password: &str) -> Result<(), SessionError> {
        let SessionState::OpenLocked { name, entry_count } = &self.state else {
            return Err(SessionError::InvalidState {
                action: "unlock the vault",
                state: self.state.describe(),
            });
        };
        if password.is_empty() {
            return Err(SessionError::validation("a password is required"));
        }
        let (name, entry_count) = (name.clone(), *entry_count);

        self.backend.authenticate(password).await?;
        self.state = SessionState::OpenUnlocked { name, entry_count };
        self.reload().await
    }

    /// Close the vault. `OPEN_* → CLOSED`; the cache is discarded
    /// unconditionally.
    ///
    /// # Errors
    ///
    /// Fails locally when no vault is open, and on transport failure —
    /// in which case the session stays open.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.require_open("close the vault")?;

        self.backend.close_vault().await?;
        self.state = SessionState::Closed;
        self.cache = None;
        Ok(())
    }

    /// Fetch the entry list and replace the cache atomically.
    ///
    /// Two-step exchange: the backend first decrypts its entries into a
    /// servable view, then the list is fetched. The cache is swapped
    /// only once the full list has arrived — callers never observe a
    /// half-updated cache.
    ///
    /// # Errors
    ///
    /// Fails locally unless the session is unlocked, and otherwise as
    /// the backend reports; on failure the previous cache is kept.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        self.require_unlocked("load entries")?;

        self.backend.load_entries().await?;
        let entries = self.backend.get_entries().await?;

        if let SessionState::OpenUnlocked { entry_count, .. } = &mut self.state {
            *entry_count = entries.len() as u64;
        }
        self.cache = Some(EntryCache::new(entries));
        Ok(())
    }

    /// Add an entry, then reload so server-assigned order stays
    /// authoritative.
    ///
    /// # Errors
    ///
    /// Fails locally on an empty name or password (no backend call is
    /// made), on a non-unlocked session, and otherwise as the backend
    /// reports.
    pub async fn add_entry(&mut self, entry: &Entry) -> Result<(), SessionError> {
        self.require_unlocked("add an entry")?;
        validate_entry(entry)?;

        self.backend.add_entry(entry).await?;
        self.reload().await
    }

    /// Delete the entry at `index` (backend order), then reload.
    ///
    /// # Errors
    ///
    /// Fails locally on a non-unlocked session, and otherwise as the
    /// backend reports.
    pub async fn delete_entry(&mut self, index: usize) -> Result<(), SessionError> {
        self.require_unlocked("delete an entry")?;

        self.backend.delete_entry(index).await?;
        self.reload().await
    }

    /// Overwrite the entry at `index` (backend order), then reload.
    ///
    /// # Errors
    ///
    /// Same contract as [`add_entry`](Session::add_entry).
    pub async fn modify_entry(&mut self, index: usize, entry: &Entry) -> Result<(), SessionError> {
        self.require_unlocked("modify an entry")?;
        validate_entry(entry)?;

        self.backend.modify_entry(index, entry).await?;
        self.reload().await
    }

    // --- Guards ---

    fn require_closed(&self, action: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Closed => Ok(()),
            _ => Err(SessionError::InvalidState {
                action,
                state: self.state.describe(),
            }),
        }
    }

    fn require_open(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                action,
                state: self.state.describe(),
            })
        }
    }

    fn require_unlocked(&self, action: &'static str) -> Result<(), SessionError> {
        if self.state.is_unlocked() {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                action,
                state: self.state.describe(),
            })
        }
    }
}

fn validate_entry(entry: &Entry) -> Result<(), SessionError> {
    if entry.name.is_empty() || entry.password.is_empty() {
        return Err(SessionError::validation("name and password are required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use shepherd_api::{MockBackend, MockVault, VaultBackend as _};

    use super::*;

    fn entry(name: &str, username: &str) -> Entry {
        Entry {
            name: name.to_owned(),
            username: username.to_owned(),
            password: "pw".to_owned(),
            ..Entry::default()
        }
    }

    async fn backend_with_vault(entries: Vec<Entry>) -> MockBackend {
        let backend = MockBackend::new();
        backend
            .seed_vault(
                "/home/u/personal.shpd",
                MockVault {
                    name: "Personal".to_owned(),
                    password: "hunter2".to_owned(),
                    entries,
                },
            )
            .await;
        backend
    }

    fn five_entries() -> Vec<Entry> {
        (1..=5).map(|i| entry(&format!("site{i}"), "u")).collect()
    }

    #[tokio::test]
    async fn open_lands_locked_with_no_cache() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);

        session.open("/home/u/personal.shpd").await.unwrap();

        assert_eq!(
            *session.state(),
            SessionState::OpenLocked {
                name: "Personal".to_owned(),
                entry_count: 5,
            }
        );
        assert!(session.cache().is_none());
        assert!(session.filter("").is_empty());
    }

    #[tokio::test]
    async fn wrong_password_leaves_session_locked() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();

        let err = session.unlock("letmein").await.unwrap_err();
        assert_eq!(err.display_message(), "Invalid password");
        assert_eq!(session.state().describe(), "locked");
        assert!(session.cache().is_none());
    }

    #[tokio::test]
    async fn right_password_unlocks_and_populates_cache() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();

        session.unlock("hunter2").await.unwrap();

        assert!(session.state().is_unlocked());
        let cache = session.cache().unwrap();
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.entries()[0].name, "site1");
        assert_eq!(cache.entries()[4].name, "site5");
    }

    #[tokio::test]
    async fn close_discards_cache_and_every_filter_is_empty() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();
        assert_eq!(session.filter("").len(), 5);

        session.close().await.unwrap();

        assert_eq!(*session.state(), SessionState::Closed);
        for q in ["", "site", "1", "zzz"] {
            assert!(session.filter(q).is_empty(), "filter({q:?}) not empty");
        }
    }

    #[tokio::test]
    async fn create_jumps_straight_to_unlocked_with_empty_cache() {
        let backend = MockBackend::new();
        let mut session = Session::new(backend);

        session.create("/home/u/new.shpd", "pw", "Fresh").await.unwrap();

        assert!(session.state().is_unlocked());
        let cache = session.cache().unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn guarded_actions_fail_locally_with_zero_backend_calls() {
        let backend = MockBackend::new();
        let mut session = Session::new(backend);

        let err = session.unlock("pw").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));

        let err = session.reload().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));

        let err = session.add_entry(&entry("a", "")).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));

        let err = session.close().await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));

        assert_eq!(session.backend().call_count(), 0);
    }

    #[tokio::test]
    async fn add_with_empty_password_is_rejected_before_any_call() {
        let backend = backend_with_vault(Vec::new()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();
        let calls_before = session.backend().call_count();

        let bad = Entry {
            name: "site".to_owned(),
            ..Entry::default()
        };
        let err = session.add_entry(&bad).await.unwrap_err();

        assert!(matches!(err, SessionError::Validation { .. }));
        assert_eq!(session.backend().call_count(), calls_before);
    }

    #[tokio::test]
    async fn create_with_empty_password_is_rejected_before_any_call() {
        let backend = MockBackend::new();
        let mut session = Session::new(backend);

        let err = session.create("/home/u/v.shpd", "", "V").await.unwrap_err();

        assert!(matches!(err, SessionError::Validation { .. }));
        assert_eq!(session.backend().call_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_leaves_state_unchanged() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();

        session.backend().set_offline(true);
        let err = session.unlock("hunter2").await.unwrap_err();

        match &err {
            SessionError::Backend(api) => assert!(api.is_transport()),
            other => panic!("expected a backend error, got {other:?}"),
        }
        assert_eq!(
            err.display_message(),
            "could not reach the vault backend"
        );
        assert_eq!(session.state().describe(), "locked");
    }

    #[tokio::test]
    async fn add_entry_reloads_with_server_order() {
        let backend = backend_with_vault(vec![entry("first", "")]).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();

        session.add_entry(&entry("second", "jo")).await.unwrap();

        let cache = session.cache().unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.entries()[1].name, "second");
        if let SessionState::OpenUnlocked { entry_count, .. } = session.state() {
            assert_eq!(*entry_count, 2);
        }
    }

    #[tokio::test]
    async fn delete_and_modify_keep_cache_authoritative() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();

        session.delete_entry(0).await.unwrap();
        assert_eq!(session.cache().unwrap().len(), 4);
        assert_eq!(session.cache().unwrap().entries()[0].name, "site2");

        let replacement = entry("renamed", "u");
        session.modify_entry(0, &replacement).await.unwrap();
        assert_eq!(session.cache().unwrap().entries()[0].name, "renamed");
        assert_eq!(session.cache().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn filter_is_pure_and_hits_no_backend() {
        let backend = backend_with_vault(five_entries()).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();
        let calls = session.backend().call_count();

        assert_eq!(session.filter("SITE1").len(), 1);
        assert_eq!(session.filter("").len(), 5);
        assert_eq!(session.backend().call_count(), calls);
    }

    #[tokio::test]
    async fn resync_adopts_backend_state() {
        let backend = backend_with_vault(five_entries()).await;
        // Another client already opened and unlocked the vault.
        backend.open_vault("/home/u/personal.shpd").await.unwrap();
        backend.authenticate("hunter2").await.unwrap();

        let mut session = Session::new(backend);
        session.resync().await.unwrap();

        assert!(session.state().is_unlocked());
        assert!(session.cache().is_none());

        // The first explicit load fills in the real entries.
        session.reload().await.unwrap();
        assert_eq!(session.cache().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn indexed_filter_addresses_the_right_entry_for_deletion() {
        // A filtered display must hand out backend-order indices:
        // deleting through them removes the matched entry, never a
        // bystander hidden by the filter.
        let entries = vec![entry("a-mail", ""), entry("bank", ""), entry("c-mail", "")];
        let backend = backend_with_vault(entries).await;
        let mut session = Session::new(backend);
        session.open("/home/u/personal.shpd").await.unwrap();
        session.unlock("hunter2").await.unwrap();

        let hits = session.filter_indexed("mail");
        let indexed: Vec<(usize, String)> =
            hits.iter().map(|(i, e)| (*i, e.name.clone())).collect();
        assert_eq!(indexed[1], (2, "c-mail".to_owned()));

        let (second_hit_index, _) = indexed[1];
        session.delete_entry(second_hit_index).await.unwrap();

        let names: Vec<&str> = session
            .cache()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["a-mail", "bank"]);
    }

    #[tokio::test]
    async fn resync_maps_open_locked_backend_to_locked() {
        let backend = backend_with_vault(five_entries()).await;
        // Another client opened the vault but has not unlocked it.
        backend.open_vault("/home/u/personal.shpd").await.unwrap();

        let mut session = Session::new(backend);
        session.resync().await.unwrap();

        assert_eq!(session.state().describe(), "locked");
        assert!(session.cache().is_none());
        assert!(session.filter("").is_empty());
    }

    #[tokio::test]
    async fn resync_maps_closed_backend_to_closed() {
        let backend = MockBackend::new();
        let mut session = Session::new(backend);
        session.resync().await.unwrap();
        assert_eq!(*session.state(), SessionState::Closed);
    }
}
