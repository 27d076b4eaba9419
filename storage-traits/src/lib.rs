//! Storage abstraction contracts.
//!
//! This crate defines the capability surface that every storage backend
//! implements, plus the shared data model flowing across it:
//!
//! - [`provider::StorageProvider`] — the capability-complete backend contract
//!   and its continuation-based async twins.
//! - [`entry::RemoteEntry`] — the file/folder handle with its lazy-detail
//!   lifecycle and snapshot "consume" semantics.
//! - [`path`] — pure path combination and canonicalization functions that
//!   reconcile ID-addressed and path-addressed backends.
//! - [`query::Query`] — the field-equality query convention imposed on
//!   backend adapters.
//! - [`facets`] — optional capabilities (sharing, shared-with-me, trash,
//!   search) with a uniform unsupported-operation policy.
//! - [`credential::Credential`] — the identity/token record a provider is
//!   authenticated with.
//! - [`blob::BlobStore`] — the key/value byte-storage collaborator used for
//!   credential persistence.

pub mod blob;
pub mod credential;
pub mod entry;
pub mod error;
pub mod facets;
pub mod outcome;
pub mod path;
pub mod provider;
pub mod query;

pub use blob::BlobStore;
pub use credential::{Credential, TokenRecord};
pub use entry::{EntrySnapshot, RemoteEntry, FOLDER_MIME};
pub use error::{Result, StorageError};
pub use facets::{Permission, Role, Search, SharedWithMe, Sharing, Trashed, UnsupportedFacet, UserRole};
pub use outcome::AuthOutcome;
pub use provider::{FileContent, ProviderAsyncExt, StorageProvider};
pub use query::{Clause, Query};
