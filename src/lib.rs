//! Unified remote storage.
//!
//! One capability-oriented API over heterogeneous storage backends, so
//! calling code can list, fetch, create, update, delete, rename, share, and
//! search files without knowing which backend is active.
//!
//! The workspace splits into:
//!
//! - [`storage_traits`] — the [`StorageProvider`] contract, the
//!   [`RemoteEntry`] lifecycle, path normalization, the query convention,
//!   and the capability facets.
//! - [`core_dispatch`] — the worker pool behind every continuation-based
//!   `*_async` operation.
//! - [`core_credentials`] — persistence of per-backend credential records.
//! - [`provider_drive`] — the ID-addressed hierarchical backend over an
//!   opaque wire adapter.
//! - [`provider_local`] — the path-addressed local mirror backend.
//!
//! This facade re-exports the surface most embedders need and hosts the
//! logging bootstrap.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unistore::{
//!     Credential, CredentialStore, FileContent, FsBlobStore, LocalMirrorProvider,
//!     StorageProvider,
//! };
//!
//! # async fn run() -> unistore::Result<()> {
//! let blobs = Arc::new(FsBlobStore::new("/var/lib/app/blobs"));
//! let provider = LocalMirrorProvider::new("/var/lib/app/mirror", CredentialStore::new(blobs));
//!
//! let mut credential = Credential::default();
//! assert!(provider.authenticate(&mut credential, true).await.is_success());
//!
//! let docs = provider.create_dir(None, "Documents").await?;
//! provider
//!     .create_file(Some(&docs), "notes.txt", FileContent::new("text/plain", "hello"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig, LoggingError};

pub use core_dispatch::Dispatcher;
pub use storage_traits::{
    path, AuthOutcome, BlobStore, Credential, EntrySnapshot, FileContent, Permission,
    ProviderAsyncExt, Query, RemoteEntry, Result, Role, Search, SharedWithMe, Sharing,
    StorageError, StorageProvider, TokenRecord, Trashed, UserRole, FOLDER_MIME,
};

pub use core_credentials::CredentialStore;
pub use provider_drive::{DriveAdapter, DriveProvider};
pub use provider_local::{FsBlobStore, LocalMirrorProvider};
