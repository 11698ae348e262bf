//! In-memory backend simulation for testing.
//!
//! [`MockBackend`] reproduces the daemon's observable behavior — the
//! open/authenticated gating, the rejection messages, the full entry
//! list on fetch — without files or cryptography. It also counts every
//! trait invocation, so tests can assert that local validation
//! short-circuited before any "network" call, and it can be switched
//! offline to simulate transport failures.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::types::{DirItem, Entry, Listing, VaultInfo, VaultStatus};
use crate::VaultBackend;

/// A vault seeded into the mock, addressed by its path.
#[derive(Debug, Clone)]
pub struct MockVault {
    /// Display name stored in the vault header.
    pub name: String,
    /// Master password that `authenticate` accepts.
    pub password: String,
    /// Entries in backend order.
    pub entries: Vec<Entry>,
}

#[derive(Debug, Default)]
struct MockState {
    vaults: Vec<(String, MockVault)>,
    listings: Vec<(String, Vec<DirItem>)>,
    open: Option<OpenVault>,
}

#[derive(Debug)]
struct OpenVault {
    path: String,
    authenticated: bool,
}

/// An in-memory [`VaultBackend`] simulation. Testing only.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: RwLock<MockState>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockBackend {
    /// Create an empty mock: no vaults, no listings, nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a vault file at `path`.
    pub async fn seed_vault(&self, path: &str, vault: MockVault) {
        let mut state = self.state.write().await;
        state.vaults.push((path.to_owned(), vault));
    }

    /// Seed a directory listing served for `path`.
    pub async fn seed_listing(&self, path: &str, items: Vec<DirItem>) {
        let mut state = self.state.write().await;
        state.listings.push((path.to_owned(), items));
    }

    /// Number of trait invocations so far, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// When offline, every call fails with [`ApiError::Timeout`]
    /// before touching any state.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn record_call(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Timeout);
        }
        Ok(())
    }
}

fn rejected(message: &str) -> ApiError {
    ApiError::Rejected {
        message: message.to_owned(),
    }
}

impl MockState {
    fn open_vault(&self) -> Result<&OpenVault, ApiError> {
        self.open.as_ref().ok_or_else(|| rejected("No vault is open"))
    }

    fn unlocked_vault_index(&self) -> Result<usize, ApiError> {
        let open = self.open_vault()?;
        if !open.authenticated {
            return Err(rejected("Not authenticated"));
        }
        let path = open.path.clone();
        self.vaults
            .iter()
            .position(|(p, _)| *p == path)
            .ok_or_else(|| rejected("No vault is open"))
    }
}

#[async_trait::async_trait]
impl VaultBackend for MockBackend {
    async fn browse(&self, path: &str) -> Result<Listing, ApiError> {
        self.record_call()?;
        let state = self.state.read().await;
        state
            .listings
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, items)| Listing {
                path: p.clone(),
                items: items.clone(),
            })
            .ok_or_else(|| rejected(&format!("Cannot open directory: {path}")))
    }

    async fn create_vault(
        &self,
        path: &str,
        password: &str,
        name: &str,
    ) -> Result<VaultInfo, ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        if state.vaults.iter().any(|(p, _)| p == path) {
            return Err(rejected(&format!("File already exists: {path}")));
        }
        state.vaults.push((
            path.to_owned(),
            MockVault {
                name: name.to_owned(),
                password: password.to_owned(),
                entries: Vec::new(),
            },
        ));
        // The creator supplied the password, so the new vault opens
        // already authenticated.
        state.open = Some(OpenVault {
            path: path.to_owned(),
            authenticated: true,
        });
        Ok(VaultInfo {
            name: name.to_owned(),
            entries: 0,
        })
    }

    async fn open_vault(&self, path: &str) -> Result<VaultInfo, ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        let Some((_, vault)) = state.vaults.iter().find(|(p, _)| p == path) else {
            return Err(rejected(&format!("File does not exist: {path}")));
        };
        let info = VaultInfo {
            name: vault.name.clone(),
            entries: vault.entries.len() as u64,
        };
        state.open = Some(OpenVault {
            path: path.to_owned(),
            authenticated: false,
        });
        Ok(info)
    }

    async fn authenticate(&self, password: &str) -> Result<(), ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        let path = state.open_vault()?.path.clone();
        let Some((_, vault)) = state.vaults.iter().find(|(p, _)| *p == path) else {
            return Err(rejected("No vault is open"));
        };
        if vault.password != password {
            return Err(rejected("Invalid password"));
        }
        if let Some(open) = state.open.as_mut() {
            open.authenticated = true;
        }
        Ok(())
    }

    async fn close_vault(&self) -> Result<(), ApiError> {
        self.record_call()?;
        // Close always succeeds on the backend, open vault or not.
        let mut state = self.state.write().await;
        state.open = None;
        Ok(())
    }

    async fn load_entries(&self) -> Result<(), ApiError> {
        self.record_call()?;
        let state = self.state.read().await;
        state.unlocked_vault_index().map(|_| ())
    }

    async fn get_entries(&self) -> Result<Vec<Entry>, ApiError> {
        self.record_call()?;
        let state = self.state.read().await;
        let idx = state.unlocked_vault_index()?;
        Ok(state.vaults[idx].1.entries.clone())
    }

    async fn add_entry(&self, entry: &Entry) -> Result<(), ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        let idx = state.unlocked_vault_index()?;
        state.vaults[idx].1.entries.push(entry.clone());
        Ok(())
    }

    async fn delete_entry(&self, index: usize) -> Result<(), ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        let idx = state.unlocked_vault_index()?;
        let entries = &mut state.vaults[idx].1.entries;
        if index >= entries.len() {
            return Err(rejected("Invalid entry index"));
        }
        entries.remove(index);
        Ok(())
    }

    async fn modify_entry(&self, index: usize, entry: &Entry) -> Result<(), ApiError> {
        self.record_call()?;
        let mut state = self.state.write().await;
        let idx = state.unlocked_vault_index()?;
        let entries = &mut state.vaults[idx].1.entries;
        if index >= entries.len() {
            return Err(rejected("Invalid entry index"));
        }
        entries[index] = entry.clone();
        Ok(())
    }

    async fn vault_status(&self) -> Result<VaultStatus, ApiError> {
        self.record_call()?;
        let state = self.state.read().await;
        Ok(VaultStatus {
            is_open: state.open.is_some(),
            is_authenticated: state.open.as_ref().is_some_and(|o| o.authenticated),
        })
    }
}
