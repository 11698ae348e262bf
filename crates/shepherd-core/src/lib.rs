//! Core library for the Shepherd vault client.
//!
//! Contains the session/lock state machine, the entry cache with its
//! search projection, and the pure helpers behind the file browser.
//! This crate drives any [`shepherd_api::VaultBackend`] and performs no
//! I/O of its own beyond that trait — the state machine is unit-tested
//! against the in-memory mock, without a daemon.

pub mod browse;
pub mod cache;
pub mod error;
pub mod session;

pub use cache::EntryCache;
pub use error::SessionError;
pub use session::{Session, SessionState};
