//! Backend transport abstraction for the Shepherd vault client.
//!
//! This crate defines the [`VaultBackend`] trait — the exact JSON API
//! surface the Shepherd daemon exposes — together with the wire types it
//! exchanges. It knows nothing about session state or caching; the state
//! machine in `shepherd-core` drives a backend through this trait.
//!
//! Two implementations are provided:
//!
//! - [`HttpBackend`] — production transport over reqwest
//! - [`MockBackend`] — in-memory simulation, for testing only

mod error;
mod http;
mod mock;
mod types;

pub use error::ApiError;
pub use http::HttpBackend;
pub use mock::{MockBackend, MockVault};
pub use types::{DirItem, Entry, Listing, VaultInfo, VaultStatus};

/// The backend API surface the client relies on.
///
/// Every operation is a single request/response exchange. A logical
/// rejection (the backend answered `success:false`) surfaces as
/// [`ApiError::Rejected`] with the backend's message carried verbatim;
/// transport-level failures surface as the other variants. Callers must
/// treat rejection messages as opaque display text.
///
/// Implementations must be safe to share across async tasks
/// (`Send + Sync`).
#[async_trait::async_trait]
pub trait VaultBackend: Send + Sync {
    /// List a directory for the file browser.
    ///
    /// The backend expands `~` and filters the listing to directories
    /// and vault files.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the directory cannot be read.
    async fn browse(&self, path: &str) -> Result<Listing, ApiError>;

    /// Create a new vault file and open it authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the file already exists or
    /// cannot be created.
    async fn create_vault(
        &self,
        path: &str,
        password: &str,
        name: &str,
    ) -> Result<VaultInfo, ApiError>;

    /// Open an existing vault file. The vault stays locked until
    /// [`authenticate`](VaultBackend::authenticate) succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] if the file is missing or not a
    /// vault.
    async fn open_vault(&self, path: &str) -> Result<VaultInfo, ApiError>;

    /// Verify the master password for the open vault.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] on a wrong password or when no
    /// vault is open.
    async fn authenticate(&self, password: &str) -> Result<(), ApiError>;

    /// Close the open vault. The backend discards its decrypted state.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure — close itself always
    /// succeeds on the backend.
    async fn close_vault(&self) -> Result<(), ApiError>;

    /// Ask the backend to decrypt its entries into a servable view.
    ///
    /// Must be followed by [`get_entries`](VaultBackend::get_entries)
    /// to fetch the data.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when not authenticated or when an
    /// entry fails to decrypt.
    async fn load_entries(&self) -> Result<(), ApiError>;

    /// Fetch the decrypted entry list, in backend order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when not authenticated.
    async fn get_entries(&self) -> Result<Vec<Entry>, ApiError>;

    /// Append a new entry to the vault.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when not authenticated.
    async fn add_entry(&self, entry: &Entry) -> Result<(), ApiError>;

    /// Delete the entry at `index` (backend order).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] on an out-of-range index or when
    /// not authenticated.
    async fn delete_entry(&self, index: usize) -> Result<(), ApiError>;

    /// Overwrite the entry at `index` (backend order).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] on an out-of-range index or when
    /// not authenticated.
    async fn modify_entry(&self, index: usize, entry: &Entry) -> Result<(), ApiError>;

    /// Report whether a vault is open and whether it is unlocked.
    ///
    /// Valid in every state; used to resynchronize a fresh client
    /// process with the backend's authoritative session.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure.
    async fn vault_status(&self) -> Result<VaultStatus, ApiError>;
}
