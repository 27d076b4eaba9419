//! JSON-backed credential records.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use storage_traits::{BlobStore, Credential, TokenRecord};
use tracing::{debug, info, warn};

/// Serializable wrapper for one persisted credential record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredential {
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<TokenRecord>,
}

/// Persists one credential record per name, typically keyed by the
/// backend's identifier.
///
/// I/O failures on `save` and `read` are caught and logged rather than
/// propagated: `read` reports plain `false` instead. A corrupted or
/// unreadable record is therefore indistinguishable from "no record" to the
/// caller — a documented limitation of the format.
#[derive(Clone)]
pub struct CredentialStore {
    blobs: Arc<dyn BlobStore>,
}

impl CredentialStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        debug!("initializing credential store");
        Self { blobs }
    }

    /// Persist the credential's account identifier and token fields under
    /// `name`, overwriting any prior record.
    pub async fn save(&self, name: &str, credential: &Credential) {
        let record = StoredCredential {
            account_id: credential.account_id.clone(),
            token: credential.token.clone(),
        };

        let json = match serde_json::to_vec_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!(name, error = %e, "failed to serialize credential record");
                return;
            }
        };

        match self.blobs.put(&self.record_key(name), &json).await {
            Ok(()) => {
                info!(
                    name,
                    has_token = record.token.is_some(),
                    "credential record saved"
                );
            }
            Err(e) => {
                warn!(name, error = %e, "failed to persist credential record");
            }
        }
    }

    /// Fill `credential` from the record saved under `name`.
    ///
    /// Returns `true` when a record was read back successfully. A missing
    /// token sub-record is tolerated and leaves the credential's token
    /// unset. Missing, unreadable, and corrupt records all yield `false`.
    pub async fn read(&self, name: &str, credential: &mut Credential) -> bool {
        let data = match self.blobs.get(&self.record_key(name)).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!(name, "no credential record found");
                return false;
            }
            Err(e) => {
                warn!(name, error = %e, "failed to read credential record");
                return false;
            }
        };

        let record: StoredCredential = match serde_json::from_slice(&data) {
            Ok(record) => record,
            Err(e) => {
                warn!(name, error = %e, "credential record corrupted");
                return false;
            }
        };

        credential.account_id = record.account_id;
        if record.token.is_some() {
            credential.token = record.token;
        }
        debug!(name, "credential record restored");
        true
    }

    /// Whether a record exists under `name`.
    pub async fn has_saved(&self, name: &str) -> bool {
        match self.blobs.contains(&self.record_key(name)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(name, error = %e, "failed to probe credential record");
                false
            }
        }
    }

    /// Delete the record under `name`; returns whether deletion occurred.
    pub async fn clear(&self, name: &str) -> bool {
        match self.blobs.delete(&self.record_key(name)).await {
            Ok(deleted) => {
                if deleted {
                    info!(name, "credential record cleared");
                }
                deleted
            }
            Err(e) => {
                warn!(name, error = %e, "failed to clear credential record");
                false
            }
        }
    }

    /// Records are namespaced within the blob store.
    fn record_key(&self, name: &str) -> String {
        format!("credentials:{name}")
    }
}
