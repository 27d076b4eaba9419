//! The storage provider contract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use core_dispatch::Dispatcher;

use crate::credential::Credential;
use crate::entry::RemoteEntry;
use crate::error::Result;
use crate::facets::{Search, SharedWithMe, Sharing, Trashed};
use crate::outcome::AuthOutcome;
use crate::query::Query;

/// Local content handed to `create_file`/`update`.
#[derive(Debug, Clone)]
pub struct FileContent {
    /// Declared MIME type of the payload; becomes the created entry's type.
    pub mime_type: String,
    pub data: Bytes,
}

impl FileContent {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a local file into a payload. Callers that know the real MIME
    /// type should pass it; otherwise the generic byte-stream type is used.
    pub async fn from_path(path: &Path, mime_type: Option<&str>) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self {
            mime_type: mime_type.unwrap_or("application/octet-stream").to_string(),
            data: Bytes::from(data),
        })
    }
}

/// The capability-complete contract every backend implements.
///
/// Backends differ in addressing (opaque ids with parent references vs.
/// hierarchical paths) and in detail-fetch cost; this trait presents one
/// model over both. Lookups for missing entries return `Ok(None)`, never an
/// error. Every operation attempted before a successful
/// [`authenticate`](Self::authenticate) fails with
/// [`StorageError::Unauthenticated`](crate::StorageError::Unauthenticated).
///
/// Each concrete backend is an independent module implementing this trait,
/// selected at construction time; there is no shared mutable base state and
/// no process-wide session.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Stable identifier of the backend (also the credential record name).
    fn id(&self) -> &'static str;

    /// Authenticate with a credential.
    ///
    /// When the credential lacks an account identifier, a previously
    /// persisted record under [`id`](Self::id) is consulted as a fallback
    /// and the identifier is filled in from it. On success the credential
    /// is persisted unless `persist` is `false`. Failure is reported in the
    /// returned [`AuthOutcome`], not thrown.
    async fn authenticate(&self, credential: &mut Credential, persist: bool) -> AuthOutcome;

    /// Whether an entry named `name` exists, optionally scoped to a parent.
    ///
    /// Defined as `get(...) != absent` and must stay consistent with it,
    /// barring a genuine race with a concurrent delete.
    async fn exists(&self, parent: Option<&RemoteEntry>, name: &str) -> Result<bool> {
        Ok(self.get(parent, name).await?.is_some())
    }

    /// Look up an entry by human-readable name, optionally scoped to a
    /// parent. Defined as the first result of a field-equality query on
    /// `name` (and `parent` when scoped).
    async fn get(&self, parent: Option<&RemoteEntry>, name: &str) -> Result<Option<RemoteEntry>> {
        let mut query = Query::new().field("name", name);
        if let Some(parent) = parent {
            query = query.field("parent", parent.id());
        }
        self.first(&query).await
    }

    /// Look up an entry by its opaque backend id.
    async fn get_by_id(&self, id: &str) -> Result<Option<RemoteEntry>>;

    /// Fetch the full metadata record for an entry, returning a Detailed
    /// handle. Backends whose listings already carry full metadata return
    /// an equivalent snapshot.
    async fn fetch_details(&self, entry: &RemoteEntry) -> Result<RemoteEntry>;

    /// List entries under a parent, or under the root when `None`.
    /// Soft-deleted entries are excluded.
    async fn list(&self, parent: Option<&RemoteEntry>) -> Result<Vec<RemoteEntry>>;

    /// Create a directory-typed entry.
    async fn create_dir(&self, parent: Option<&RemoteEntry>, name: &str) -> Result<RemoteEntry>;

    /// Create a file-typed entry from a local content payload; the entry's
    /// type is the payload's declared MIME type.
    async fn create_file(
        &self,
        parent: Option<&RemoteEntry>,
        name: &str,
        content: FileContent,
    ) -> Result<RemoteEntry>;

    /// Replace a file's content, returning the refreshed snapshot.
    async fn update(&self, entry: &RemoteEntry, content: FileContent) -> Result<RemoteEntry>;

    /// Rename an entry, returning the refreshed snapshot. The id is
    /// preserved.
    async fn rename(&self, entry: &RemoteEntry, new_name: &str) -> Result<RemoteEntry>;

    /// Delete an entry by id. Handles addressing this id are stale
    /// afterwards.
    async fn delete(&self, id: &str) -> Result<()>;

    /// First match of a query, or `None`.
    async fn first(&self, query: &Query) -> Result<Option<RemoteEntry>> {
        Ok(self.query(query).await?.into_iter().next())
    }

    /// All matches of a query.
    async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>>;

    /// Download an entry's content to a local destination path.
    async fn download(&self, entry: &RemoteEntry, destination: &Path) -> Result<()>;

    /// Sharing facet; an [`UnsupportedFacet`](crate::facets::UnsupportedFacet)
    /// stub when the backend has no sharing concept.
    fn sharing(&self) -> Arc<dyn Sharing>;

    /// Shared-with-me facet.
    fn shared_with_me(&self) -> Arc<dyn SharedWithMe>;

    /// Trash facet.
    fn trashed(&self) -> Arc<dyn Trashed>;

    /// Search facet.
    fn search(&self) -> Arc<dyn Search>;
}

/// Continuation-based twins of every provider operation.
///
/// Each twin enqueues the operation on the [`Dispatcher`] and returns
/// immediately; the work runs on a pool worker, never on the caller's
/// thread. The continuation receives the operation's full `Result`, so the
/// error path is a mandatory part of every async signature and a worker
/// fault can never bypass the caller.
///
/// Arguments are taken by value because the work unit outlives the call.
pub trait ProviderAsyncExt: StorageProvider + 'static {
    fn authenticate_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        mut credential: Credential,
        persist: bool,
        on_done: C,
    ) where
        C: FnOnce(Credential, AuthOutcome) + Send + 'static,
    {
        dispatcher.dispatch(
            async move {
                let outcome = self.authenticate(&mut credential, persist).await;
                (credential, outcome)
            },
            |(credential, outcome)| on_done(credential, outcome),
        );
    }

    fn exists_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        parent: Option<RemoteEntry>,
        name: String,
        on_done: C,
    ) where
        C: FnOnce(Result<bool>) + Send + 'static,
    {
        dispatcher.dispatch(
            async move { self.exists(parent.as_ref(), &name).await },
            on_done,
        );
    }

    fn get_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        parent: Option<RemoteEntry>,
        name: String,
        on_done: C,
    ) where
        C: FnOnce(Result<Option<RemoteEntry>>) + Send + 'static,
    {
        dispatcher.dispatch(
            async move { self.get(parent.as_ref(), &name).await },
            on_done,
        );
    }

    fn get_by_id_async<C>(self: Arc<Self>, dispatcher: &Dispatcher, id: String, on_done: C)
    where
        C: FnOnce(Result<Option<RemoteEntry>>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.get_by_id(&id).await }, on_done);
    }

    fn fetch_details_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        entry: RemoteEntry,
        on_done: C,
    ) where
        C: FnOnce(Result<RemoteEntry>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.fetch_details(&entry).await }, on_done);
    }

    fn list_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        parent: Option<RemoteEntry>,
        on_done: C,
    ) where
        C: FnOnce(Result<Vec<RemoteEntry>>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.list(parent.as_ref()).await }, on_done);
    }

    fn create_dir_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        parent: Option<RemoteEntry>,
        name: String,
        on_done: C,
    ) where
        C: FnOnce(Result<RemoteEntry>) + Send + 'static,
    {
        dispatcher.dispatch(
            async move { self.create_dir(parent.as_ref(), &name).await },
            on_done,
        );
    }

    fn create_file_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        parent: Option<RemoteEntry>,
        name: String,
        content: FileContent,
        on_done: C,
    ) where
        C: FnOnce(Result<RemoteEntry>) + Send + 'static,
    {
        dispatcher.dispatch(
            async move { self.create_file(parent.as_ref(), &name, content).await },
            on_done,
        );
    }

    fn update_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        entry: RemoteEntry,
        content: FileContent,
        on_done: C,
    ) where
        C: FnOnce(Result<RemoteEntry>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.update(&entry, content).await }, on_done);
    }

    fn rename_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        entry: RemoteEntry,
        new_name: String,
        on_done: C,
    ) where
        C: FnOnce(Result<RemoteEntry>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.rename(&entry, &new_name).await }, on_done);
    }

    fn delete_async<C>(self: Arc<Self>, dispatcher: &Dispatcher, id: String, on_done: C)
    where
        C: FnOnce(Result<()>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.delete(&id).await }, on_done);
    }

    fn first_async<C>(self: Arc<Self>, dispatcher: &Dispatcher, query: Query, on_done: C)
    where
        C: FnOnce(Result<Option<RemoteEntry>>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.first(&query).await }, on_done);
    }

    fn query_async<C>(self: Arc<Self>, dispatcher: &Dispatcher, query: Query, on_done: C)
    where
        C: FnOnce(Result<Vec<RemoteEntry>>) + Send + 'static,
    {
        dispatcher.dispatch(async move { self.query(&query).await }, on_done);
    }

    fn download_async<C>(
        self: Arc<Self>,
        dispatcher: &Dispatcher,
        entry: RemoteEntry,
        destination: PathBuf,
        on_done: C,
    ) where
        C: FnOnce(Result<()>) + Send + 'static,
    {
        dispatcher.dispatch(
            async move { self.download(&entry, &destination).await },
            on_done,
        );
    }
}

impl<P: StorageProvider + ?Sized + 'static> ProviderAsyncExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntrySnapshot;
    use crate::facets::UnsupportedFacet;
    use tokio::sync::oneshot;

    /// Minimal in-memory provider exercising the default trait methods.
    struct StubProvider {
        entries: Vec<EntrySnapshot>,
    }

    impl StubProvider {
        fn new() -> Self {
            let mut a = EntrySnapshot::new("stub", "id-a", "Alpha");
            a.extra.insert("parent".to_string(), "root".to_string());
            let mut b = EntrySnapshot::new("stub", "id-b", "Beta");
            b.extra.insert("parent".to_string(), "id-a".to_string());
            Self {
                entries: vec![a, b],
            }
        }
    }

    #[async_trait]
    impl StorageProvider for StubProvider {
        fn id(&self) -> &'static str {
            "stub"
        }

        async fn authenticate(&self, _credential: &mut Credential, _persist: bool) -> AuthOutcome {
            AuthOutcome::success()
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<RemoteEntry>> {
            Ok(self
                .entries
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .map(RemoteEntry::from_snapshot))
        }

        async fn fetch_details(&self, entry: &RemoteEntry) -> Result<RemoteEntry> {
            let mut snapshot = entry.snapshot().clone();
            snapshot.detailed = true;
            Ok(RemoteEntry::from_snapshot(snapshot))
        }

        async fn list(&self, _parent: Option<&RemoteEntry>) -> Result<Vec<RemoteEntry>> {
            Ok(self
                .entries
                .iter()
                .cloned()
                .map(RemoteEntry::from_snapshot)
                .collect())
        }

        async fn create_dir(
            &self,
            _parent: Option<&RemoteEntry>,
            _name: &str,
        ) -> Result<RemoteEntry> {
            unimplemented!("not exercised")
        }

        async fn create_file(
            &self,
            _parent: Option<&RemoteEntry>,
            _name: &str,
            _content: FileContent,
        ) -> Result<RemoteEntry> {
            unimplemented!("not exercised")
        }

        async fn update(&self, _entry: &RemoteEntry, _content: FileContent) -> Result<RemoteEntry> {
            unimplemented!("not exercised")
        }

        async fn rename(&self, _entry: &RemoteEntry, _new_name: &str) -> Result<RemoteEntry> {
            unimplemented!("not exercised")
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn query(&self, query: &Query) -> Result<Vec<RemoteEntry>> {
            let matches = self
                .entries
                .iter()
                .filter(|e| {
                    query
                        .eq_value("name")
                        .map(|name| e.name == name)
                        .unwrap_or(true)
                        && query
                            .eq_value("parent")
                            .map(|p| e.extra.get("parent").map(String::as_str) == Some(p))
                            .unwrap_or(true)
                })
                .cloned()
                .map(RemoteEntry::from_snapshot)
                .collect();
            Ok(matches)
        }

        async fn download(&self, _entry: &RemoteEntry, _destination: &Path) -> Result<()> {
            Ok(())
        }

        fn sharing(&self) -> Arc<dyn Sharing> {
            Arc::new(UnsupportedFacet::new("stub", "sharing"))
        }

        fn shared_with_me(&self) -> Arc<dyn SharedWithMe> {
            Arc::new(UnsupportedFacet::new("stub", "shared-with-me"))
        }

        fn trashed(&self) -> Arc<dyn Trashed> {
            Arc::new(UnsupportedFacet::new("stub", "trash"))
        }

        fn search(&self) -> Arc<dyn Search> {
            Arc::new(UnsupportedFacet::new("stub", "search"))
        }
    }

    #[tokio::test]
    async fn test_get_is_first_of_name_query() {
        let provider = StubProvider::new();
        let found = provider.get(None, "Alpha").await.unwrap().unwrap();
        assert_eq!(found.id(), "id-a");
        assert!(provider.get(None, "Gamma").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_scoped_to_parent() {
        let provider = StubProvider::new();
        let parent = provider.get_by_id("id-a").await.unwrap().unwrap();
        let found = provider.get(Some(&parent), "Beta").await.unwrap().unwrap();
        assert_eq!(found.id(), "id-b");
        assert!(provider
            .get(Some(&parent), "Alpha")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_exists_consistent_with_get() {
        let provider = StubProvider::new();
        assert!(provider.exists(None, "Alpha").await.unwrap());
        assert!(!provider.exists(None, "Gamma").await.unwrap());
    }

    #[tokio::test]
    async fn test_async_twin_delivers_through_continuation() {
        let provider = Arc::new(StubProvider::new());
        let dispatcher = Dispatcher::with_workers(2);
        let (tx, rx) = oneshot::channel();

        provider.get_async(&dispatcher, None, "Alpha".to_string(), move |result| {
            tx.send(result).unwrap();
        });

        let found = rx.await.unwrap().unwrap().unwrap();
        assert_eq!(found.name(), "Alpha");
    }

    #[tokio::test]
    async fn test_async_twin_works_through_trait_object() {
        let provider: Arc<dyn StorageProvider> = Arc::new(StubProvider::new());
        let dispatcher = Dispatcher::with_workers(1);
        let (tx, rx) = oneshot::channel();

        provider.list_async(&dispatcher, None, move |result| {
            tx.send(result).unwrap();
        });

        assert_eq!(rx.await.unwrap().unwrap().len(), 2);
    }
}
