//! Error types for the session layer.
//!
//! Mirrors the three-kind taxonomy the client observes: local
//! validation failures (caught before any backend call), guard
//! violations (the operation is illegal in the current state), and
//! backend errors — which themselves split into logical rejections and
//! transport failures, see [`shepherd_api::ApiError`].

use shepherd_api::ApiError;

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A required field was missing or empty. No backend call was made.
    #[error("{reason}")]
    Validation {
        /// Human-readable description of the missing input.
        reason: String,
    },

    /// The operation is not legal in the current session state. No
    /// backend call was made.
    #[error("cannot {action} while the session is {state}")]
    InvalidState {
        /// The attempted operation, e.g. `"add an entry"`.
        action: &'static str,
        /// Description of the current state, e.g. `"locked"`.
        state: &'static str,
    },

    /// The backend call failed; local state is unchanged.
    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl SessionError {
    pub(crate) fn validation(reason: &str) -> Self {
        Self::Validation {
            reason: reason.to_owned(),
        }
    }

    /// The message to show the user. Backend rejections surface their
    /// text verbatim; transport failures collapse to a generic
    /// connectivity message (the detail stays in the logs).
    pub fn display_message(&self) -> String {
        match self {
            Self::Backend(api) if api.is_transport() => {
                "could not reach the vault backend".to_owned()
            }
            other => other.to_string(),
        }
    }
}
