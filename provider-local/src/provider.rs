//! `StorageProvider` implementation over a local directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use core_credentials::CredentialStore;
use storage_traits::{
    path as vpath, AuthOutcome, Clause, Credential, EntrySnapshot, FileContent, Query, RemoteEntry,
    Result, Search, SharedWithMe, Sharing, StorageError, StorageProvider, Trashed,
    UnsupportedFacet, FOLDER_MIME,
};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Backend identifier; also the credential record name.
const BACKEND_ID: &str = "local";

/// Account identifier used when the credential names none.
const DEFAULT_ACCOUNT: &str = "local";

/// MIME type reported for regular files; the file system carries no type
/// information of its own.
const FILE_MIME: &str = "application/octet-stream";

/// The path-addressed local mirror backend.
///
/// Entry ids are canonical rooted virtual paths (`"/Folder/File"`) resolved
/// against a mirror root directory on the local file system. Metadata is
/// free here, so every entry is born Detailed and `fetch_details` is a
/// re-stat. None of the optional facets are supported.
pub struct LocalMirrorProvider {
    root: PathBuf,
    credentials: CredentialStore,
    authenticated: RwLock<bool>,
}

impl LocalMirrorProvider {
    pub fn new(root: impl Into<PathBuf>, credentials: CredentialStore) -> Self {
        Self {
            root: root.into(),
            credentials,
            authenticated: RwLock::new(false),
        }
    }

    /// The mirror root on the local file system.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_authenticated(&self) -> Result<()> {
        if *self.authenticated.read().await {
            Ok(())
        } else {
            Err(StorageError::Unauthenticated {
                backend: BACKEND_ID,
            })
        }
    }

    /// Resolve a virtual id to a real path under the mirror root.
    ///
    /// Ids are canonicalized first, so non-rooted inputs are accepted.
    /// Traversal segments are rejected: no resolved path ever escapes the
    /// root.
    fn resolve(&self, id: &str) -> Result<(String, PathBuf)> {
        let rooted = vpath::clean(Some(id)).unwrap_or_else(|| vpath::SEPARATOR.to_string());
        let mut real = self.root.clone();
        for segment in rooted.split(vpath::SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    warn!(id, "rejected path escaping the mirror root");
                    return Err(StorageError::backend(format!(
                        "path '{id}' escapes the mirror root"
                    )));
                }
                segment => real.push(segment),
            }
        }
        Ok((rooted, real))
    }

    /// Stat a resolved path into a snapshot; `Ok(None)` when it does not
    /// exist.
    async fn snapshot_at(&self, id: &str, real: &Path) -> Result<Option<EntrySnapshot>> {
        let metadata = match fs::metadata(real).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut snapshot = EntrySnapshot::new(BACKEND_ID, id, vpath::file_name(id));
        snapshot.detailed = true;
        if metadata.is_dir() {
            snapshot.mime_type = Some(FOLDER_MIME.to_string());
        } else {
            snapshot.mime_type = Some(FILE_MIME.to_string());
            snapshot.size = Some(metadata.len());
        }
        snapshot.created_at = metadata
            .created()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        snapshot.modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);
        Ok(Some(snapshot))
    }

    async fn entry_at(&self, id: &str) -> Result<Option<RemoteEntry>> {
        let (rooted, real) = self.resolve(id)?;
        Ok(self
            .snapshot_at(&rooted, &real)
            .await?
            .map(RemoteEntry::from_snapshot))
    }

    /// Require that an entry exists, for operations addressing one.
    async fn existing_entry(&self, id: &str) -> Result<RemoteEntry> {
        self.entry_at(id)
            .await?
            .ok_or_else(|| StorageError::backend(format!("entry '{id}' does not exist")))
    }

    fn ensure_same_backend(entry: &RemoteEntry) -> Result<()> {
        if entry.backend() != BACKEND_ID {
            return Err(StorageError::IncompatibleSnapshot);
        }
        Ok(())
    }

    fn child_id(parent: Option<&RemoteEntry>, name: &str) -> String {
        let combined = vpath::combine(parent.map(|p| p.id()), Some(name));
        vpath::clean(Some(&combined)).unwrap_or_else(|| vpath::SEPARATOR.to_string())
    }
}

#[async_trait]
impl StorageProvider for LocalMirrorProvider {
    fn id(&self) -> &'static str {
        BACKEND_ID
    }

    #[instrument(skip(self, credential))]
    async fn authenticate(&self, credential: &mut Credential, persist: bool) -> AuthOutcome {
        if credential.account_id.is_none() {
            let mut saved = Credential::default();
            if self.credentials.read(BACKEND_ID, &mut saved).await {
                debug!("restored persisted credential record");
                credential.account_id = saved.account_id;
            }
        }
        if credential.account_id.is_none() {
            credential.account_id = Some(DEFAULT_ACCOUNT.to_string());
        }

        // The mirror root is the whole backend; make sure it exists.
        if let Err(e) = fs::create_dir_all(&self.root).await {
            warn!(root = %self.root.display(), error = %e, "mirror root unavailable");
            return AuthOutcome::failure(e.into());
        }

        *self.authenticated.write().await = true;
        info!(root = %self.root.display(), "authenticated with local mirror");
        if persist {
            self.credentials.save(BACKEND_ID, credential).await;
        }
        AuthOutcome::success()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<RemoteEntry>> {
        self.ensure_authenticated().await?;
        self.entry_at(id).await
    }

    async fn fetch_details(&self, entry: &RemoteEntry) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        self.ensure_authenticated().await?;
        self.existing_entry(entry.id()).await
    }

    #[instrument(skip(self, parent))]
    async fn list(&self, parent: Option<&RemoteEntry>) -> Result<Vec<RemoteEntry>> {
        self.ensure_authenticated().await?;
        let parent_id = parent.map(|p| p.id()).unwrap_or("/");
        let (rooted, real) = self.resolve(parent_id)?;

        let mut names = Vec::new();
        let mut dir = fs::read_dir(&real).await?;
        while let Some(child) = dir.next_entry().await? {
            match child.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    warn!(name = ?raw, "skipping entry with non-UTF-8 name");
                }
            }
        }
        // Directory iteration order is platform-defined; keep listings
        // deterministic.
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let id = vpath::combine(Some(&rooted), Some(&name));
            if let Some(entry) = self.entry_at(&id).await? {
                entries.push(entry);
            }
        }
        debug!(parent = %rooted, count = entries.len(), "listed entries");
        Ok(entries)
    }

    #[instrument(skip(self, parent))]
    async fn create_dir(&self, parent: Option<&RemoteEntry>, name: &str) -> Result<RemoteEntry> {
        self.ensure_authenticated().await?;
        let id = Self::child_id(parent, name);
        let (rooted, real) = self.resolve(&id)?;
        fs::create_dir(&real).await?;
        info!(id = %rooted, "created directory");
        self.existing_entry(&rooted).await
    }

    #[instrument(skip(self, parent, content))]
    async fn create_file(
        &self,
        parent: Option<&RemoteEntry>,
        name: &str,
        content: FileContent,
    ) -> Result<RemoteEntry> {
        self.ensure_authenticated().await?;
        let id = Self::child_id(parent, name);
        let (rooted, real) = self.resolve(&id)?;
        fs::write(&real, &content.data).await?;
        info!(id = %rooted, bytes = content.data.len(), "created file");

        // The file system does not record the declared type; the returned
        // snapshot carries it for this handle's lifetime.
        let mut entry = self.existing_entry(&rooted).await?;
        let mut snapshot = entry.snapshot().clone();
        snapshot.mime_type = Some(content.mime_type);
        entry.consume(snapshot)?;
        Ok(entry)
    }

    async fn update(&self, entry: &RemoteEntry, content: FileContent) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        self.ensure_authenticated().await?;
        let (rooted, real) = self.resolve(entry.id())?;
        self.existing_entry(&rooted).await?;
        fs::write(&real, &content.data).await?;

        let mut refreshed = self.existing_entry(&rooted).await?;
        let mut snapshot = refreshed.snapshot().clone();
        snapshot.mime_type = Some(content.mime_type);
        refreshed.consume(snapshot)?;
        Ok(refreshed)
    }

    /// Renaming a path-addressed entry moves it within its parent, so the
    /// returned handle carries a new id.
    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> Result<RemoteEntry> {
        Self::ensure_same_backend(entry)?;
        self.ensure_authenticated().await?;
        let (old_id, old_real) = self.resolve(entry.id())?;
        let parent = vpath::parent_of(&old_id).unwrap_or_else(|| vpath::SEPARATOR.to_string());
        let new_id = vpath::combine(Some(&parent), Some(new_name));
        let (new_id, new_real) = self.resolve(&new_id)?;

        fs::rename(&old_real, &new_real).await?;
        info!(from = %old_id, to = %new_id, "renamed entry");
        self.existing_entry(&new_id).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &str) -> Result<()> {
        self.ensure_authenticated().await?;
        let (rooted, real) = self.resolve(id)?;
        if rooted == "/" {
            return Err(StorageError::backend("refusing to delete the mirror root"));
        }
        let metadata = fs::metadata(&real).await?;
        if metadata.is_dir() {
            fs::remove_dir_all(&real).await?;
        } else {
            fs::remove_file(&real).await?;
        }
        info!(id = %rooted, "deleted entry");
        Ok(())
    }

    /// Interprets `name` and `parent` equality clauses natively; opaque
    /// expressions have no meaning against a plain file system.
    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
        self.ensure_authenticated().await?;
        if query
            .clauses()
            .iter()
            .any(|c| matches!(c, Clause::Raw(_)))
        {
            return Err(StorageError::Unsupported {
                backend: BACKEND_ID,
                capability: "raw queries",
            });
        }

        let parent = match query.eq_value("parent") {
            Some(id) => Some(self.existing_entry(id).await?),
            None => None,
        };

        let mut entries = self.list(parent.as_ref()).await?;
        if let Some(name) = query.eq_value("name") {
            entries.retain(|e| e.name() == name);
        }
        Ok(entries)
    }

    #[instrument(skip(self, entry, destination))]
    async fn download(&self, entry: &RemoteEntry, destination: &Path) -> Result<()> {
        Self::ensure_same_backend(entry)?;
        self.ensure_authenticated().await?;
        let (rooted, real) = self.resolve(entry.id())?;
        let bytes = fs::copy(&real, destination).await?;
        info!(id = %rooted, bytes, "downloaded entry");
        Ok(())
    }

    fn sharing(&self) -> Arc<dyn Sharing> {
        Arc::new(UnsupportedFacet::new(BACKEND_ID, "sharing"))
    }

    fn shared_with_me(&self) -> Arc<dyn SharedWithMe> {
        Arc::new(UnsupportedFacet::new(BACKEND_ID, "shared-with-me"))
    }

    fn trashed(&self) -> Arc<dyn Trashed> {
        Arc::new(UnsupportedFacet::new(BACKEND_ID, "trash"))
    }

    fn search(&self) -> Arc<dyn Search> {
        Arc::new(UnsupportedFacet::new(BACKEND_ID, "search"))
    }
}
