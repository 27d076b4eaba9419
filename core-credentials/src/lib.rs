//! Credential persistence.
//!
//! One named identity/token record per backend, serialized as a
//! human-inspectable JSON document and stored through the
//! [`BlobStore`](storage_traits::BlobStore) collaborator. Absence of a
//! record is a valid "no saved credential" state, not an error.

pub mod store;

pub use store::CredentialStore;
