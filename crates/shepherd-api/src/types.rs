//! Wire types shared between the transport and the session layer.

use serde::{Deserialize, Serialize};

/// One credential record, exactly as the backend serves it.
///
/// `name` and `password` are required by the backend; the rest may be
/// empty. The backend stores fixed-width fields, so over-long values
/// are truncated server-side — the client does not pre-validate widths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name of the credential.
    pub name: String,
    /// Account username, possibly empty.
    #[serde(default)]
    pub username: String,
    /// The secret itself.
    pub password: String,
    /// Associated website, possibly empty.
    #[serde(default)]
    pub url: String,
    /// Free-form notes, possibly empty.
    #[serde(default)]
    pub notes: String,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirItem {
    /// File or directory name (no path).
    pub name: String,
    /// Absolute path, ready to browse into or open.
    pub path: String,
    /// True for directories, false for vault files.
    pub is_dir: bool,
}

/// A directory listing as returned by `/api/browse`.
///
/// `path` is the canonicalized directory the backend actually listed
/// (it expands `~`), which may differ from the requested path.
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    /// The listed directory, canonicalized by the backend.
    pub path: String,
    /// Directories and vault files, in backend order (unsorted).
    pub items: Vec<DirItem>,
}

/// Display metadata returned by vault create/open.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultInfo {
    /// Vault display name from the file header.
    pub name: String,
    /// Number of entries recorded in the header.
    pub entries: u64,
}

/// Backend-side session state, from `/api/vault/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VaultStatus {
    /// A vault file is currently open.
    pub is_open: bool,
    /// The master password has been verified for the open vault.
    pub is_authenticated: bool,
}

/// Entry list payload of `GET /api/entries`.
#[derive(Debug, Deserialize)]
pub(crate) struct EntriesPayload {
    pub entries: Vec<Entry>,
}

/// Payload for responses that carry nothing beyond the envelope.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Ack {}
