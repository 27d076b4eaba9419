//! Path-addressed local mirror backend.
//!
//! Implements the [`StorageProvider`](storage_traits::StorageProvider)
//! contract directly over the local file system, rooted at a mirror
//! directory. Entry ids are canonical rooted paths; metadata is free, so
//! entries are born Detailed. Also hosts [`FsBlobStore`], the file-backed
//! byte storage used for credential persistence.

pub mod blob_store;
pub mod provider;

pub use blob_store::FsBlobStore;
pub use provider::LocalMirrorProvider;
