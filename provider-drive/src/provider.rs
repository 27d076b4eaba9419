//! `StorageProvider` implementation over a [`DriveAdapter`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use core_credentials::CredentialStore;
use storage_traits::{
    AuthOutcome, Credential, EntrySnapshot, FileContent, Permission, Query, RemoteEntry, Result,
    Role, Search, SharedWithMe, Sharing, StorageError, StorageProvider, Trashed, UserRole,
    FOLDER_MIME,
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::adapter::{DriveAdapter, DriveRecord, DriveSession, DRIVE_FOLDER_MIME};
use crate::error::DriveError;

/// Backend identifier; also the credential record name.
const BACKEND_ID: &str = "drive";

/// Sentinel parent id addressing the backend root in queries.
const ROOT_PARENT: &str = "root";

struct DriveInner {
    adapter: Arc<dyn DriveAdapter>,
    credentials: CredentialStore,
    session: RwLock<Option<DriveSession>>,
}

impl DriveInner {
    /// Clone the active session, or fail when `authenticate` has not
    /// succeeded yet.
    async fn session(&self) -> Result<DriveSession> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(StorageError::Unauthenticated {
                backend: BACKEND_ID,
            })
    }
}

/// The ID-addressed hierarchical backend.
///
/// Entries are shallow when they come from a listing or query and become
/// Detailed after `fetch_details`, which costs a second adapter round trip.
/// All four capability facets are supported.
///
/// Each instance owns its own session; there is no process-wide state, so
/// multiple accounts are simply multiple instances.
pub struct DriveProvider {
    inner: Arc<DriveInner>,
}

impl DriveProvider {
    pub fn new(adapter: Arc<dyn DriveAdapter>, credentials: CredentialStore) -> Self {
        Self {
            inner: Arc::new(DriveInner {
                adapter,
                credentials,
                session: RwLock::new(None),
            }),
        }
    }

    /// Parse an RFC 3339 timestamp into Unix seconds.
    fn parse_timestamp(rfc3339: Option<&str>) -> Option<i64> {
        rfc3339
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp())
    }

    /// Project an adapter record into the common snapshot shape.
    ///
    /// The backend's native folder marker is mapped onto the reserved
    /// folder sentinel; fields with no common projection land in `extra`.
    fn snapshot_from(record: DriveRecord, detailed: bool) -> EntrySnapshot {
        let DriveRecord {
            id,
            name,
            mime_type,
            size,
            created_time,
            modified_time,
            download_url,
            parents,
            trashed,
        } = record;

        let mut extra = HashMap::new();
        extra.insert("trashed".to_string(), trashed.to_string());
        if !parents.is_empty() {
            extra.insert("parents".to_string(), parents.join(","));
        }

        let projected_mime = if mime_type == DRIVE_FOLDER_MIME {
            extra.insert("nativeMimeType".to_string(), mime_type);
            FOLDER_MIME.to_string()
        } else {
            mime_type
        };

        EntrySnapshot {
            backend: BACKEND_ID,
            id,
            name,
            mime_type: Some(projected_mime),
            size: size.and_then(|s| s.parse().ok()),
            created_at: Self::parse_timestamp(created_time.as_deref()),
            modified_at: Self::parse_timestamp(modified_time.as_deref()),
            download_url,
            detailed,
            extra,
        }
    }

    fn entry_from(record: DriveRecord, detailed: bool) -> RemoteEntry {
        RemoteEntry::from_snapshot(Self::snapshot_from(record, detailed))
    }

    fn ensure_same_backend(entry: &RemoteEntry) -> Result<()> {
        if entry.backend() != BACKEND_ID {
            return Err(StorageError::IncompatibleSnapshot);
        }
        Ok(())
    }

    fn role_to_wire(role: Role) -> &'static str {
        match role {
            Role::Owner => "owner",
            Role::Full => "writer",
            Role::Read => "reader",
        }
    }

    fn role_from_wire(role: &str) -> Role {
        match role {
            "owner" => Role::Owner,
            "writer" | "full" => Role::Full,
            _ => Role::Read,
        }
    }
}

#[async_trait]
impl StorageProvider for DriveProvider {
    fn id(&self) -> &'static str {
        BACKEND_ID
    }

    #[instrument(skip(self, credential))]
    async fn authenticate(&self, credential: &mut Credential, persist: bool) -> AuthOutcome {
        // Fall back to the persisted record when the caller supplied no
        // account identifier.
        if credential.account_id.is_none() {
            let mut saved = Credential::default();
            if self.inner.credentials.read(BACKEND_ID, &mut saved).await {
                debug!("restored persisted credential record");
                credential.account_id = saved.account_id;
                if credential.token.is_none() {
                    credential.token = saved.token;
                }
            }
        }

        let Some(token) = credential.token.clone() else {
            warn!("authentication attempted without token material");
            return AuthOutcome::failure(
                DriveError::AuthorizationFailed("no token material supplied".to_string()).into(),
            );
        };

        match self.inner.adapter.authorize(&token).await {
            Ok(session) => {
                if credential.account_id.is_none() {
                    credential.account_id = Some(session.account_id.clone());
                }
                info!(account = %session.account_id, "authenticated with drive backend");
                *self.inner.session.write().await = Some(session);
                if persist {
                    self.inner.credentials.save(BACKEND_ID, credential).await;
                }
                AuthOutcome::success()
            }
            Err(e) => {
                warn!(error = %e, "drive authentication failed");
                AuthOutcome::failure(e.into())
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: &str) -> Result<Option<RemoteEntry>> {
        let session = self.inner.session().await?;
        let record = self.inner.adapter.record(&session, id).await?;
        Ok(record.map(|r| Self::entry_from(r, true)))
    }

    async fn fetch_details(&self, entry: &RemoteEntry) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        let session = self.inner.session().await?;
        let record = self
            .inner
            .adapter
            .record(&session, entry.id())
            .await?
            .ok_or_else(|| {
                StorageError::backend(format!("entry '{}' no longer exists", entry.id()))
            })?;
        Ok(Self::entry_from(record, true))
    }

    #[instrument(skip(self, parent))]
    async fn list(&self, parent: Option<&RemoteEntry>) -> Result<Vec<RemoteEntry>> {
        let parent_id = parent.map(|p| p.id()).unwrap_or(ROOT_PARENT);
        let entries = self.query(&Query::new().field("parent", parent_id)).await?;
        debug!(parent = parent_id, count = entries.len(), "listed entries");
        Ok(entries)
    }

    #[instrument(skip(self, parent))]
    async fn create_dir(&self, parent: Option<&RemoteEntry>, name: &str) -> Result<RemoteEntry> {
        let session = self.inner.session().await?;
        let record = self
            .inner
            .adapter
            .create_dir(&session, parent.map(|p| p.id()).unwrap_or(ROOT_PARENT), name)
            .await?;
        info!(id = %record.id, name, "created directory");
        Ok(Self::entry_from(record, true))
    }

    #[instrument(skip(self, parent, content))]
    async fn create_file(
        &self,
        parent: Option<&RemoteEntry>,
        name: &str,
        content: FileContent,
    ) -> Result<RemoteEntry> {
        let session = self.inner.session().await?;
        let record = self
            .inner
            .adapter
            .upload(
                &session,
                parent.map(|p| p.id()).unwrap_or(ROOT_PARENT),
                name,
                &content.mime_type,
                content.data,
            )
            .await?;
        info!(id = %record.id, name, "created file");
        Ok(Self::entry_from(record, true))
    }

    async fn update(&self, entry: &RemoteEntry, content: FileContent) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        let session = self.inner.session().await?;
        let record = self
            .inner
            .adapter
            .update(&session, entry.id(), &content.mime_type, content.data)
            .await?;
        Ok(Self::entry_from(record, true))
    }

    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        let session = self.inner.session().await?;
        let record = self
            .inner
            .adapter
            .rename(&session, entry.id(), new_name)
            .await?;
        Ok(Self::entry_from(record, true))
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &str) -> Result<()> {
        let session = self.inner.session().await?;
        self.inner.adapter.delete(&session, id).await?;
        info!(id, "deleted entry");
        Ok(())
    }

    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
        let session = self.inner.session().await?;
        let records = self.inner.adapter.run_query(&session, &query.build()).await?;
        Ok(records
            .into_iter()
            .map(|r| Self::entry_from(r, false))
            .collect())
    }

    #[instrument(skip(self, entry, destination))]
    async fn download(&self, entry: &RemoteEntry, destination: &Path) -> Result<()> {
        Self::ensure_same_backend(entry)?;
        let session = self.inner.session().await?;
        let data = self.inner.adapter.download(&session, entry.id()).await?;
        tokio::fs::write(destination, &data).await?;
        info!(id = %entry.id(), bytes = data.len(), "downloaded entry");
        Ok(())
    }

    fn sharing(&self) -> Arc<dyn Sharing> {
        Arc::new(DriveSharing {
            inner: Arc::clone(&self.inner),
        })
    }

    fn shared_with_me(&self) -> Arc<dyn SharedWithMe> {
        Arc::new(DriveSharedWithMe {
            inner: Arc::clone(&self.inner),
        })
    }

    fn trashed(&self) -> Arc<dyn Trashed> {
        Arc::new(DriveTrashed {
            inner: Arc::clone(&self.inner),
        })
    }

    fn search(&self) -> Arc<dyn Search> {
        Arc::new(DriveSearch {
            inner: Arc::clone(&self.inner),
        })
    }
}

struct DriveSharing {
    inner: Arc<DriveInner>,
}

#[async_trait]
impl Sharing for DriveSharing {
    async fn permissions(&self, entry_id: &str) -> Result<Permission> {
        let session = self.inner.session().await?;
        let grants = self.inner.adapter.permissions(&session, entry_id).await?;
        Ok(Permission::new(
            grants
                .into_iter()
                .map(|g| UserRole {
                    role: DriveProvider::role_from_wire(&g.role),
                    user: g.user,
                })
                .collect(),
        ))
    }

    async fn share(&self, entry_id: &str, user: &str, role: Role) -> Result<()> {
        let session = self.inner.session().await?;
        self.inner
            .adapter
            .share(&session, entry_id, user, DriveProvider::role_to_wire(role))
            .await?;
        info!(entry_id, user, "shared entry");
        Ok(())
    }

    async fn unshare(&self, entry_id: &str, user: &str) -> Result<()> {
        let session = self.inner.session().await?;
        self.inner.adapter.unshare(&session, entry_id, user).await?;
        info!(entry_id, user, "unshared entry");
        Ok(())
    }
}

struct DriveSharedWithMe {
    inner: Arc<DriveInner>,
}

#[async_trait]
impl SharedWithMe for DriveSharedWithMe {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        let session = self.inner.session().await?;
        let records = self.inner.adapter.shared_with_me(&session).await?;
        Ok(records
            .into_iter()
            .map(|r| DriveProvider::entry_from(r, false))
            .collect())
    }
}

struct DriveTrashed {
    inner: Arc<DriveInner>,
}

#[async_trait]
impl Trashed for DriveTrashed {
    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        let session = self.inner.session().await?;
        let records = self.inner.adapter.trashed(&session).await?;
        Ok(records
            .into_iter()
            .map(|r| DriveProvider::entry_from(r, false))
            .collect())
    }

    async fn trash(&self, entry_id: &str) -> Result<()> {
        let session = self.inner.session().await?;
        self.inner.adapter.trash(&session, entry_id).await?;
        Ok(())
    }

    async fn restore(&self, entry_id: &str) -> Result<()> {
        let session = self.inner.session().await?;
        self.inner.adapter.restore(&session, entry_id).await?;
        Ok(())
    }
}

struct DriveSearch {
    inner: Arc<DriveInner>,
}

#[async_trait]
impl Search for DriveSearch {
    async fn search(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
        let session = self.inner.session().await?;
        let records = self.inner.adapter.run_query(&session, &query.build()).await?;
        Ok(records
            .into_iter()
            .map(|r| DriveProvider::entry_from(r, false))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockDriveAdapter;
    use async_trait::async_trait;
    use std::collections::HashMap as Map;
    use storage_traits::{BlobStore, TokenRecord};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryBlobStore {
        blobs: Mutex<Map<String, Vec<u8>>>,
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
            self.blobs
                .lock()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.blobs.lock().await.get(key).cloned())
        }

        async fn delete(&self, key: &str) -> Result<bool> {
            Ok(self.blobs.lock().await.remove(key).is_some())
        }
    }

    fn credential_store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryBlobStore::default()))
    }

    fn file_record(id: &str, name: &str) -> DriveRecord {
        DriveRecord {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            size: Some("42".to_string()),
            created_time: Some("2024-03-01T10:00:00.000Z".to_string()),
            modified_time: Some("2024-03-02T10:00:00.000Z".to_string()),
            download_url: None,
            parents: vec!["root".to_string()],
            trashed: false,
        }
    }

    fn folder_record(id: &str, name: &str) -> DriveRecord {
        DriveRecord {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: DRIVE_FOLDER_MIME.to_string(),
            size: None,
            created_time: None,
            modified_time: None,
            download_url: None,
            parents: vec![],
            trashed: false,
        }
    }

    async fn authenticated(adapter: MockDriveAdapter) -> DriveProvider {
        let provider = DriveProvider::new(Arc::new(adapter), credential_store());
        let mut credential = Credential::from_token(TokenRecord::with_access_token("tok"));
        let outcome = provider.authenticate(&mut credential, false).await;
        assert!(outcome.is_success());
        provider
    }

    fn authorizing_adapter() -> MockDriveAdapter {
        let mut adapter = MockDriveAdapter::new();
        adapter.expect_authorize().returning(|_| {
            Ok(DriveSession {
                account_id: "user@example.com".to_string(),
            })
        });
        adapter
    }

    #[tokio::test]
    async fn test_operations_before_authenticate_fail() {
        let provider = DriveProvider::new(Arc::new(MockDriveAdapter::new()), credential_store());

        let err = provider.list(None).await.unwrap_err();
        assert!(matches!(err, StorageError::Unauthenticated { .. }));

        let err = provider.get_by_id("f1").await.unwrap_err();
        assert!(matches!(err, StorageError::Unauthenticated { .. }));

        let err = provider.delete("f1").await.unwrap_err();
        assert!(matches!(err, StorageError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_failure_reported_as_outcome() {
        let mut adapter = MockDriveAdapter::new();
        adapter.expect_authorize().returning(|_| {
            Err(DriveError::AuthorizationFailed("token expired".to_string()))
        });

        let provider = DriveProvider::new(Arc::new(adapter), credential_store());
        let mut credential = Credential::from_token(TokenRecord::with_access_token("stale"));
        let outcome = provider.authenticate(&mut credential, false).await;

        assert!(!outcome.is_success());
        assert!(outcome.error().is_some());
        // Still unauthenticated afterwards.
        assert!(provider.list(None).await.is_err());
    }

    #[tokio::test]
    async fn test_authenticate_without_token_fails() {
        let provider = DriveProvider::new(Arc::new(MockDriveAdapter::new()), credential_store());
        let mut credential = Credential::default();
        let outcome = provider.authenticate(&mut credential, false).await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_authenticate_fills_account_id_from_session() {
        let provider = authenticated(authorizing_adapter()).await;
        let mut credential = Credential::from_token(TokenRecord::with_access_token("tok"));
        provider.authenticate(&mut credential, false).await;
        assert_eq!(credential.account_id.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn test_authenticate_persists_and_restores_credential() {
        let blobs = Arc::new(MemoryBlobStore::default());
        let store = CredentialStore::new(Arc::clone(&blobs) as Arc<dyn BlobStore>);

        let provider = DriveProvider::new(Arc::new(authorizing_adapter()), store.clone());
        let mut credential = Credential::from_token(TokenRecord::with_access_token("tok"));
        assert!(provider.authenticate(&mut credential, true).await.is_success());

        // A later attempt with a bare credential finds the persisted record.
        let provider = DriveProvider::new(Arc::new(authorizing_adapter()), store);
        let mut bare = Credential::default();
        assert!(provider.authenticate(&mut bare, false).await.is_success());
        assert_eq!(bare.account_id.as_deref(), Some("user@example.com"));
        assert!(bare.token.is_some());
    }

    #[tokio::test]
    async fn test_query_appends_trashed_exclusion() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_run_query()
            .withf(|_, q| q == "name = 'File11' AND trashed = false")
            .returning(|_, _| Ok(vec![]));

        let provider = authenticated(adapter).await;
        let result = provider.get(None, "File11").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_listing_yields_shallow_entries() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_run_query()
            .withf(|_, q| q == "parent = 'root' AND trashed = false")
            .returning(|_, _| Ok(vec![file_record("f1", "File11")]));

        let provider = authenticated(adapter).await;
        let entries = provider.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].has_details());
        assert_eq!(entries[0].size(), Some(42));
        assert!(entries[0].modified_at().is_some());
    }

    #[tokio::test]
    async fn test_fetch_details_costs_a_record_round_trip() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_run_query()
            .returning(|_, _| Ok(vec![file_record("f1", "File11")]));
        adapter
            .expect_record()
            .withf(|_, id| id == "f1")
            .times(1)
            .returning(|_, _| Ok(Some(file_record("f1", "File11"))));

        let provider = authenticated(adapter).await;
        let mut entry = provider.list(None).await.unwrap().remove(0);
        assert!(!entry.has_details());

        entry.fetch_details(&provider).await.unwrap();
        assert!(entry.has_details());

        // Second call is a local no-op; the mock allows exactly one fetch.
        entry.fetch_details(&provider).await.unwrap();
        assert!(entry.has_details());
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_absence() {
        let mut adapter = authorizing_adapter();
        adapter.expect_record().returning(|_, _| Ok(None));

        let provider = authenticated(adapter).await;
        assert!(provider.get_by_id("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_dir_yields_directory_entry() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_create_dir()
            .withf(|_, parent, name| parent == "root" && name == "Folder10")
            .returning(|_, _, name| Ok(folder_record("d1", name)));

        let provider = authenticated(adapter).await;
        let dir = provider.create_dir(None, "Folder10").await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.mime_type(), Some(FOLDER_MIME));
        assert_eq!(dir.extra().get("nativeMimeType").unwrap(), DRIVE_FOLDER_MIME);
    }

    #[tokio::test]
    async fn test_create_file_takes_payload_mime() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_upload()
            .withf(|_, _, name, mime, _| name == "notes.md" && mime == "text/markdown")
            .returning(|_, _, name, mime, data| {
                let mut record = file_record("f9", name);
                record.mime_type = mime.to_string();
                record.size = Some(data.len().to_string());
                Ok(record)
            });

        let provider = authenticated(adapter).await;
        let file = provider
            .create_file(None, "notes.md", FileContent::new("text/markdown", "# hi"))
            .await
            .unwrap();
        assert_eq!(file.mime_type(), Some("text/markdown"));
        assert!(!file.is_dir());
    }

    #[tokio::test]
    async fn test_rename_preserves_id_and_consumes() {
        let mut adapter = authorizing_adapter();
        adapter
            .expect_run_query()
            .returning(|_, _| Ok(vec![file_record("f1", "Old")]));
        adapter
            .expect_rename()
            .withf(|_, id, name| id == "f1" && name == "New")
            .returning(|_, id, name| Ok(file_record(id, name)));

        let provider = authenticated(adapter).await;
        let mut entry = provider.list(None).await.unwrap().remove(0);
        entry.rename(&provider, "New").await.unwrap();
        assert_eq!(entry.id(), "f1");
        assert_eq!(entry.name(), "New");
    }

    #[tokio::test]
    async fn test_foreign_entry_rejected() {
        let provider = authenticated(authorizing_adapter()).await;
        let foreign = RemoteEntry::from_snapshot(EntrySnapshot::new("local", "/x", "x"));
        let err = provider
            .update(&foreign, FileContent::new("text/plain", "data"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::IncompatibleSnapshot));
    }

    #[tokio::test]
    async fn test_sharing_facet_maps_roles() {
        let mut adapter = authorizing_adapter();
        adapter.expect_permissions().returning(|_, _| {
            Ok(vec![
                crate::adapter::DrivePermission {
                    user: "owner@example.com".to_string(),
                    role: "owner".to_string(),
                },
                crate::adapter::DrivePermission {
                    user: "reader@example.com".to_string(),
                    role: "reader".to_string(),
                },
            ])
        });
        adapter
            .expect_share()
            .withf(|_, id, user, role| id == "f1" && user == "bob@example.com" && role == "writer")
            .returning(|_, _, _, _| Ok(()));

        let provider = authenticated(adapter).await;
        let sharing = provider.sharing();
        assert!(sharing.is_supported());

        let permission = sharing.permissions("f1").await.unwrap();
        assert_eq!(permission.len(), 2);
        assert_eq!(permission.owner().unwrap().user, "owner@example.com");

        sharing
            .share("f1", "bob@example.com", Role::Full)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_facets_require_authentication() {
        let provider = DriveProvider::new(Arc::new(MockDriveAdapter::new()), credential_store());
        let err = provider.trashed().list().await.unwrap_err();
        assert!(matches!(err, StorageError::Unauthenticated { .. }));
    }
}
