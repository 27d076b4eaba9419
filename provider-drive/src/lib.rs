//! ID-addressed hierarchical storage backend.
//!
//! Implements the [`StorageProvider`](storage_traits::StorageProvider)
//! contract over an opaque [`DriveAdapter`], the collaborator performing
//! the actual wire-level calls. Entries are addressed by backend-assigned
//! opaque ids with parent references; listing records are shallow and full
//! metadata costs a second round trip.

pub mod adapter;
pub mod error;
pub mod provider;

pub use adapter::{DriveAdapter, DrivePermission, DriveRecord, DriveSession, DRIVE_FOLDER_MIME};
pub use error::{DriveError, DriveResult};
pub use provider::DriveProvider;
