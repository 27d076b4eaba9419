//! The wire-call boundary of the drive backend.
//!
//! The adapter performs the actual remote calls (HTTP, vendor SDK) and
//! speaks in its own record types; the provider projects them into the
//! common entry shape. Query strings handed to [`DriveAdapter::run_query`]
//! follow the field-equality convention built by
//! [`Query`](storage_traits::Query).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use storage_traits::TokenRecord;

use crate::error::DriveResult;

/// Native MIME type the drive backend uses to mark folders.
pub const DRIVE_FOLDER_MIME: &str = "application/x.drive.folder";

/// One file or folder record as the drive backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveRecord {
    /// Backend-assigned opaque id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Native MIME type; [`DRIVE_FOLDER_MIME`] for folders.
    pub mime_type: String,

    /// Size in bytes, reported as a decimal string (omitted for folders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Creation time (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Modification time (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,

    /// Direct download URL, when exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Parent folder ids.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Whether the record is soft-deleted.
    #[serde(default)]
    pub trashed: bool,
}

/// Authenticated session handle returned by [`DriveAdapter::authorize`].
///
/// Threaded explicitly through every adapter call; the provider owns one
/// per instance, so multiple accounts mean multiple provider instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSession {
    /// Resolved account identifier.
    pub account_id: String,
}

/// One grant on an entry as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivePermission {
    /// User identity (typically an email address).
    pub user: String,
    /// Wire role name: `owner`, `writer`, or `reader`.
    pub role: String,
}

/// Wire-level calls into the drive backend.
///
/// One method per capability of the provider contract. Implementations own
/// retry/backoff policy and HTTP plumbing; the provider never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveAdapter: Send + Sync {
    /// Exchange a token record for a session. Fails when the token is
    /// expired or rejected.
    async fn authorize(&self, token: &TokenRecord) -> DriveResult<DriveSession>;

    /// Full metadata for one id; `Ok(None)` when the id does not exist.
    async fn record(&self, session: &DriveSession, id: &str) -> DriveResult<Option<DriveRecord>>;

    /// Run a query string, returning shallow listing records.
    async fn run_query(
        &self,
        session: &DriveSession,
        query: &str,
    ) -> DriveResult<Vec<DriveRecord>>;

    /// Create a folder under a parent id (`"root"` addresses the backend
    /// root).
    async fn create_dir(
        &self,
        session: &DriveSession,
        parent_id: &str,
        name: &str,
    ) -> DriveResult<DriveRecord>;

    /// Upload a new file under a parent id.
    async fn upload(
        &self,
        session: &DriveSession,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> DriveResult<DriveRecord>;

    /// Replace an existing file's content.
    async fn update(
        &self,
        session: &DriveSession,
        id: &str,
        mime_type: &str,
        data: Bytes,
    ) -> DriveResult<DriveRecord>;

    /// Rename an entry; the id is preserved.
    async fn rename(&self, session: &DriveSession, id: &str, name: &str)
        -> DriveResult<DriveRecord>;

    /// Permanently delete an entry by id.
    async fn delete(&self, session: &DriveSession, id: &str) -> DriveResult<()>;

    /// Download an entry's content.
    async fn download(&self, session: &DriveSession, id: &str) -> DriveResult<Bytes>;

    /// Grants on one entry.
    async fn permissions(
        &self,
        session: &DriveSession,
        id: &str,
    ) -> DriveResult<Vec<DrivePermission>>;

    /// Grant a wire role on an entry to a user.
    async fn share(
        &self,
        session: &DriveSession,
        id: &str,
        user: &str,
        role: &str,
    ) -> DriveResult<()>;

    /// Revoke a user's grant on an entry.
    async fn unshare(&self, session: &DriveSession, id: &str, user: &str) -> DriveResult<()>;

    /// Records other accounts shared with this one.
    async fn shared_with_me(&self, session: &DriveSession) -> DriveResult<Vec<DriveRecord>>;

    /// Soft-deleted records.
    async fn trashed(&self, session: &DriveSession) -> DriveResult<Vec<DriveRecord>>;

    /// Move an entry to the trash.
    async fn trash(&self, session: &DriveSession, id: &str) -> DriveResult<()>;

    /// Restore an entry from the trash.
    async fn restore(&self, session: &DriveSession, id: &str) -> DriveResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_record() {
        let json = r#"{
            "id": "abc123",
            "name": "Report.pdf",
            "mimeType": "application/pdf",
            "size": "2048",
            "createdTime": "2023-01-01T00:00:00.000Z",
            "modifiedTime": "2023-01-02T00:00:00.000Z",
            "parents": ["folder1"],
            "trashed": false
        }"#;

        let record: DriveRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.name, "Report.pdf");
        assert_eq!(record.mime_type, "application/pdf");
        assert_eq!(record.size, Some("2048".to_string()));
        assert_eq!(record.parents, vec!["folder1"]);
        assert!(!record.trashed);
    }

    #[test]
    fn test_deserialize_record_defaults() {
        let json = r#"{
            "id": "d1",
            "name": "Stuff",
            "mimeType": "application/x.drive.folder"
        }"#;

        let record: DriveRecord = serde_json::from_str(json).unwrap();
        assert!(record.parents.is_empty());
        assert!(!record.trashed);
        assert!(record.size.is_none());
        assert_eq!(record.mime_type, DRIVE_FOLDER_MIME);
    }

    #[test]
    fn test_deserialize_permission() {
        let json = r#"{"user": "alice@example.com", "role": "owner"}"#;
        let perm: DrivePermission = serde_json::from_str(json).unwrap();
        assert_eq!(perm.user, "alice@example.com");
        assert_eq!(perm.role, "owner");
    }
}
