//! Error types for the backend transport.
//!
//! Two failure kinds matter to callers: the backend *rejected* the
//! request (`success:false` with a human-readable message), or the
//! request never completed a valid exchange (everything else). The
//! session layer keeps its state unchanged in both cases; only the
//! displayed message differs.

/// All errors a [`VaultBackend`](crate::VaultBackend) call can produce.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered `success:false`. The message is opaque
    /// display text — never parsed programmatically.
    #[error("{message}")]
    Rejected {
        /// Error text from the backend, verbatim.
        message: String,
    },

    /// Non-success HTTP status without a readable error envelope.
    #[error("backend returned HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Network or HTTP client failure — no response arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not the JSON shape the API promises.
    #[error("unparsable response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// True for failures where no valid response arrived (transport
    /// kind), false for logical rejections the backend stated.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}
