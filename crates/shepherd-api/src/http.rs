//! HTTP transport over reqwest.
//!
//! The backend speaks a uniform envelope: every response is a JSON
//! object with a `success` flag and, on failure, an `error` string.
//! Payload fields sit beside the flag, so a successful body
//! deserializes directly into the payload type.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::types::{Ack, EntriesPayload, Entry, Listing, VaultInfo, VaultStatus};
use crate::VaultBackend;

/// Default request timeout. A timed-out request surfaces as
/// [`ApiError::Timeout`], a transport failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Production transport: JSON over HTTP to a Shepherd daemon.
pub struct HttpBackend {
    http: reqwest::Client,
    addr: String,
}

impl HttpBackend {
    /// Build a transport for the daemon at `addr`
    /// (e.g. `http://127.0.0.1:8100`), with a bounded per-request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the underlying client cannot be
    /// constructed.
    pub fn new(addr: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shpd/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            addr: addr.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::warn!(%path, "request timed out");
                ApiError::Timeout
            } else {
                tracing::warn!(%path, error = %e, "transport failure");
                ApiError::Network(e)
            }
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::Network)?;

        match accept(&text) {
            Ok(payload) => Ok(payload),
            Err(err) => {
                // The daemon answers 200 with an error envelope; an
                // unparsable body on a non-2xx status means we are not
                // talking to a Shepherd backend at all.
                if matches!(&err, ApiError::Json(_)) && !status.is_success() {
                    tracing::warn!(%path, status = status.as_u16(), "non-success status without envelope");
                    return Err(ApiError::Http {
                        status: status.as_u16(),
                    });
                }
                if let ApiError::Rejected { message } = &err {
                    tracing::debug!(%path, %message, "backend rejected request");
                }
                Err(err)
            }
        }
    }
}

/// Interpret a response body under the `{success, error, ...}` envelope.
///
/// On `success:true` the remaining fields deserialize into `T`; on
/// `success:false` (or a missing flag) the `error` text is carried
/// verbatim as [`ApiError::Rejected`].
fn accept<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let value: Value = serde_json::from_str(body)?;

    if value.get("success").and_then(Value::as_bool).unwrap_or(false) {
        serde_json::from_value(value).map_err(ApiError::Json)
    } else {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("backend reported an unspecified failure")
            .to_owned();
        Err(ApiError::Rejected { message })
    }
}

#[async_trait::async_trait]
impl VaultBackend for HttpBackend {
    async fn browse(&self, path: &str) -> Result<Listing, ApiError> {
        self.exchange(Method::POST, "/api/browse", Some(&json!({ "path": path })))
            .await
    }

    async fn create_vault(
        &self,
        path: &str,
        password: &str,
        name: &str,
    ) -> Result<VaultInfo, ApiError> {
        self.exchange(
            Method::POST,
            "/api/vault/create",
            Some(&json!({ "path": path, "password": password, "name": name })),
        )
        .await
    }

    async fn open_vault(&self, path: &str) -> Result<VaultInfo, ApiError> {
        self.exchange(
            Method::POST,
            "/api/vault/open",
            Some(&json!({ "path": path })),
        )
        .await
    }

    async fn authenticate(&self, password: &str) -> Result<(), ApiError> {
        self.exchange::<Ack>(
            Method::POST,
            "/api/vault/authenticate",
            Some(&json!({ "password": password })),
        )
        .await
        .map(|_| ())
    }

    async fn close_vault(&self) -> Result<(), ApiError> {
        self.exchange::<Ack>(Method::POST, "/api/vault/close", None)
            .await
            .map(|_| ())
    }

    async fn load_entries(&self) -> Result<(), ApiError> {
        self.exchange::<Ack>(Method::POST, "/api/entries/load", None)
            .await
            .map(|_| ())
    }

    async fn get_entries(&self) -> Result<Vec<Entry>, ApiError> {
        let payload: EntriesPayload = self.exchange(Method::GET, "/api/entries", None).await?;
        Ok(payload.entries)
    }

    async fn add_entry(&self, entry: &Entry) -> Result<(), ApiError> {
        let body = serde_json::to_value(entry)?;
        self.exchange::<Ack>(Method::POST, "/api/entries/add", Some(&body))
            .await
            .map(|_| ())
    }

    async fn delete_entry(&self, index: usize) -> Result<(), ApiError> {
        self.exchange::<Ack>(
            Method::POST,
            "/api/entries/delete",
            Some(&json!({ "index": index })),
        )
        .await
        .map(|_| ())
    }

    async fn modify_entry(&self, index: usize, entry: &Entry) -> Result<(), ApiError> {
        let mut body = serde_json::to_value(entry)?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert("index".to_owned(), json!(index));
        }
        self.exchange::<Ack>(Method::POST, "/api/entries/modify", Some(&body))
            .await
            .map(|_| ())
    }

    async fn vault_status(&self) -> Result<VaultStatus, ApiError> {
        self.exchange(Method::GET, "/api/vault/status", None).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn accept_success_with_payload() {
        let body = r#"{"success": true, "name": "Personal", "entries": 5}"#;
        let info: VaultInfo = accept(body).unwrap();
        assert_eq!(info.name, "Personal");
        assert_eq!(info.entries, 5);
    }

    #[test]
    fn accept_success_bare_envelope() {
        let body = r#"{"success": true}"#;
        accept::<Ack>(body).unwrap();
    }

    #[test]
    fn accept_failure_carries_message_verbatim() {
        let body = r#"{"success": false, "error": "Invalid password"}"#;
        let err = accept::<Ack>(body).unwrap_err();
        match err {
            ApiError::Rejected { message } => assert_eq!(message, "Invalid password"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn accept_failure_without_message() {
        let err = accept::<Ack>(r#"{"success": false}"#).unwrap_err();
        assert!(!err.is_transport());
        assert!(err.to_string().contains("unspecified"));
    }

    #[test]
    fn accept_missing_flag_is_rejection() {
        // A well-formed JSON object without `success` is treated as a
        // rejection, not a transport error.
        let err = accept::<Ack>(r#"{"entries": []}"#).unwrap_err();
        assert!(!err.is_transport());
    }

    #[test]
    fn accept_garbage_is_transport_kind() {
        let err = accept::<Ack>("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn accept_entries_payload() {
        let body = r#"{
            "success": true,
            "entries": [
                {"name": "mail", "username": "jo", "password": "x", "url": "", "notes": ""},
                {"name": "bank", "password": "y"}
            ]
        }"#;
        let payload: EntriesPayload = accept(body).unwrap();
        assert_eq!(payload.entries.len(), 2);
        assert_eq!(payload.entries[1].name, "bank");
        assert_eq!(payload.entries[1].username, "");
    }

    #[test]
    fn backend_addr_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://127.0.0.1:8100/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(backend.url("/api/browse"), "http://127.0.0.1:8100/api/browse");
    }
}
