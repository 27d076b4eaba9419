//! Remote entry handles and their snapshot lifecycle.

use std::collections::HashMap;

use crate::error::{Result, StorageError};
use crate::provider::{FileContent, StorageProvider};

/// Reserved MIME type marking directory entries across every backend.
///
/// Providers map their native folder markers onto this sentinel when
/// projecting adapter records into [`EntrySnapshot`]s.
pub const FOLDER_MIME: &str = "application/x-folder";

/// An immutable field set describing one remote file or folder at a point
/// in time.
///
/// Snapshots are produced by providers when projecting adapter records; a
/// [`RemoteEntry`] is rebound to a fresh snapshot via
/// [`RemoteEntry::consume`] or [`RemoteEntry::with_snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySnapshot {
    /// Identifier of the backend that produced this snapshot.
    pub backend: &'static str,
    /// Backend-defined opaque token re-addressing the entry. Stable across
    /// refreshes of the same logical entry.
    pub id: String,
    /// Display name (last path segment for path-addressed backends).
    pub name: String,
    /// MIME-like type, [`FOLDER_MIME`] for directories.
    pub mime_type: Option<String>,
    /// Size in bytes, when the backend reports one.
    pub size: Option<u64>,
    /// Creation time, Unix seconds.
    pub created_at: Option<i64>,
    /// Last modification time, Unix seconds.
    pub modified_at: Option<i64>,
    /// Direct download URL, when the backend exposes one.
    pub download_url: Option<String>,
    /// Whether this snapshot came from a full-metadata fetch rather than a
    /// shallow listing record.
    pub detailed: bool,
    /// Backend-specific fields not projected into the common shape.
    pub extra: HashMap<String, String>,
}

impl EntrySnapshot {
    /// A minimal snapshot; the remaining fields default to absent/shallow.
    pub fn new(backend: &'static str, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            backend,
            id: id.into(),
            name: name.into(),
            mime_type: None,
            size: None,
            created_at: None,
            modified_at: None,
            download_url: None,
            detailed: false,
            extra: HashMap::new(),
        }
    }
}

/// Handle to one remote file or directory.
///
/// A handle is an independent snapshot, not a shared mutable cell: two
/// handles addressing the same backend id never observe each other's
/// mutations. Mutating operations (`fetch_details`, `upload`, `rename`)
/// replace the handle's entire snapshot in one assignment, so no partial
/// state is ever observable.
///
/// The `has_details` flag only transitions `false -> true` for the lifetime
/// of a handle, never back.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    snapshot: EntrySnapshot,
    has_details: bool,
}

impl RemoteEntry {
    /// Wrap a freshly fetched snapshot into a handle.
    pub fn from_snapshot(snapshot: EntrySnapshot) -> Self {
        let has_details = snapshot.detailed;
        Self {
            snapshot,
            has_details,
        }
    }

    pub fn backend(&self) -> &'static str {
        self.snapshot.backend
    }

    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    pub fn name(&self) -> &str {
        &self.snapshot.name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.snapshot.mime_type.as_deref()
    }

    /// Whether the entry is a directory, derived from the reserved folder
    /// MIME sentinel.
    pub fn is_dir(&self) -> bool {
        self.snapshot.mime_type.as_deref() == Some(FOLDER_MIME)
    }

    pub fn size(&self) -> Option<u64> {
        self.snapshot.size
    }

    pub fn created_at(&self) -> Option<i64> {
        self.snapshot.created_at
    }

    pub fn modified_at(&self) -> Option<i64> {
        self.snapshot.modified_at
    }

    pub fn download_url(&self) -> Option<&str> {
        self.snapshot.download_url.as_deref()
    }

    /// True once full metadata (not just a shallow listing record) has been
    /// installed into this handle.
    pub fn has_details(&self) -> bool {
        self.has_details
    }

    /// Backend-specific fields not projected into the common shape.
    pub fn extra(&self) -> &HashMap<String, String> {
        &self.snapshot.extra
    }

    /// Borrow the current snapshot.
    pub fn snapshot(&self) -> &EntrySnapshot {
        &self.snapshot
    }

    /// Consume the handle, yielding its snapshot.
    pub fn into_snapshot(self) -> EntrySnapshot {
        self.snapshot
    }

    /// Replace this handle's state from a freshly fetched snapshot.
    ///
    /// The snapshot must come from the same backend and address the same
    /// logical entry; otherwise the handle is left untouched and
    /// [`StorageError::IncompatibleSnapshot`] is returned. The replacement
    /// is a single assignment, so no partial mutation is observable.
    pub fn consume(&mut self, snapshot: EntrySnapshot) -> Result<()> {
        if snapshot.backend != self.snapshot.backend || snapshot.id != self.snapshot.id {
            return Err(StorageError::IncompatibleSnapshot);
        }
        let detailed = self.has_details || snapshot.detailed;
        self.snapshot = snapshot;
        self.has_details = detailed;
        Ok(())
    }

    /// Pure variant of [`consume`](Self::consume): returns a new handle
    /// bound to `snapshot`, leaving `self` untouched. Callers holding the
    /// old handle choose whether to rebind.
    pub fn with_snapshot(&self, snapshot: EntrySnapshot) -> Result<RemoteEntry> {
        if snapshot.backend != self.snapshot.backend || snapshot.id != self.snapshot.id {
            return Err(StorageError::IncompatibleSnapshot);
        }
        let has_details = self.has_details || snapshot.detailed;
        Ok(RemoteEntry {
            snapshot,
            has_details,
        })
    }

    /// Fetch the full metadata record through the owning provider and
    /// install it. No-op success when the handle is already detailed;
    /// idempotent afterwards.
    pub async fn fetch_details(&mut self, provider: &dyn StorageProvider) -> Result<()> {
        if self.has_details {
            return Ok(());
        }
        let detailed = provider.fetch_details(self).await?;
        self.consume(detailed.into_snapshot())
    }

    /// Replace the remote content, then install the returned snapshot. The
    /// entry's id is preserved by the backend.
    pub async fn upload(
        &mut self,
        provider: &dyn StorageProvider,
        content: FileContent,
    ) -> Result<()> {
        let updated = provider.update(self, content).await?;
        self.consume(updated.into_snapshot())
    }

    /// Rename the remote entry, then install the returned snapshot.
    ///
    /// Path-addressed backends derive the id from the path, so the handle
    /// may rebind to a new id here. The snapshot must still come from the
    /// same backend.
    pub async fn rename(&mut self, provider: &dyn StorageProvider, new_name: &str) -> Result<()> {
        let renamed = provider.rename(self, new_name).await?;
        let snapshot = renamed.into_snapshot();
        if snapshot.backend != self.snapshot.backend {
            return Err(StorageError::IncompatibleSnapshot);
        }
        let has_details = self.has_details || snapshot.detailed;
        self.snapshot = snapshot;
        self.has_details = has_details;
        Ok(())
    }

    /// Delete the remote entry by id. On success the handle is stale and
    /// must not be trusted afterwards; this is a caller obligation the type
    /// system does not enforce.
    pub async fn delete(&self, provider: &dyn StorageProvider) -> Result<()> {
        provider.delete(self.id()).await
    }
}
