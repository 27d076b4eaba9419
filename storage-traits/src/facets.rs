//! Optional capability facets.
//!
//! Backends differ in what they support beyond the core contract: sharing,
//! a "shared with me" view, a trash, free-form search. Each optional
//! capability is a facet trait obtained from the provider. The policy is
//! uniform: providers always return a facet handle, and a backend lacking
//! the capability returns [`UnsupportedFacet`], whose every operation fails
//! with [`StorageError::Unsupported`] and whose `is_supported` probe is
//! `false`. No facet method ever silently no-ops.

use async_trait::async_trait;

use crate::entry::RemoteEntry;
use crate::error::{Result, StorageError};
use crate::query::Query;

/// Access role granted to a user on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The unique owner of the entry.
    Owner,
    /// Full read/write access.
    Full,
    /// Read-only access.
    Read,
}

/// One user's role on an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRole {
    pub user: String,
    pub role: Role,
}

/// Ordered collection of user roles on one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permission(Vec<UserRole>);

impl Permission {
    pub fn new(roles: Vec<UserRole>) -> Self {
        Self(roles)
    }

    pub fn push(&mut self, role: UserRole) {
        self.0.push(role);
    }

    /// The unique role flagged as owner, absent if none is.
    pub fn owner(&self) -> Option<&UserRole> {
        self.0.iter().find(|r| r.role == Role::Owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserRole> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Permission management on individual entries.
#[async_trait]
pub trait Sharing: Send + Sync {
    /// Whether the backend actually implements this facet.
    fn is_supported(&self) -> bool {
        true
    }

    /// List the roles granted on an entry.
    async fn permissions(&self, entry_id: &str) -> Result<Permission>;

    /// Grant `role` on an entry to a user.
    async fn share(&self, entry_id: &str, user: &str, role: Role) -> Result<()>;

    /// Revoke a user's access to an entry.
    async fn unshare(&self, entry_id: &str, user: &str) -> Result<()>;
}

/// Entries other accounts have shared with the authenticated one.
#[async_trait]
pub trait SharedWithMe: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>>;
}

/// Soft-deleted entries.
#[async_trait]
pub trait Trashed: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// List soft-deleted entries.
    async fn list(&self) -> Result<Vec<RemoteEntry>>;

    /// Move an entry to the trash.
    async fn trash(&self, entry_id: &str) -> Result<()>;

    /// Restore an entry from the trash.
    async fn restore(&self, entry_id: &str) -> Result<()>;
}

/// Free-form search against the backend's query language.
#[async_trait]
pub trait Search: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    async fn search(&self, query: &Query) -> Result<Vec<RemoteEntry>>;
}

/// Stub facet returned by backends lacking a capability.
///
/// Every operation fails with [`StorageError::Unsupported`] naming the
/// backend and the capability, so callers get an explicit, immediate signal
/// rather than a silent no-op.
#[derive(Debug, Clone, Copy)]
pub struct UnsupportedFacet {
    backend: &'static str,
    capability: &'static str,
}

impl UnsupportedFacet {
    pub fn new(backend: &'static str, capability: &'static str) -> Self {
        Self {
            backend,
            capability,
        }
    }

    fn err(&self) -> StorageError {
        StorageError::Unsupported {
            backend: self.backend,
            capability: self.capability,
        }
    }
}

#[async_trait]
impl Sharing for UnsupportedFacet {
    fn is_supported(&self) -> bool {
        false
    }

    async fn permissions(&self, _entry_id: &str) -> Result<Permission> {
        Err(self.err())
    }

    async fn share(&self, _entry_id: &str, _user: &str, _role: Role) -> Result<()> {
        Err(self.err())
    }

    async fn unshare(&self, _entry_id: &str, _user: &str) -> Result<()> {
        Err(self.err())
    }
}

#[async_trait]
impl SharedWithMe for UnsupportedFacet {
    fn is_supported(&self) -> bool {
        false
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        Err(self.err())
    }
}

#[async_trait]
impl Trashed for UnsupportedFacet {
    fn is_supported(&self) -> bool {
        false
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>> {
        Err(self.err())
    }

    async fn trash(&self, _entry_id: &str) -> Result<()> {
        Err(self.err())
    }

    async fn restore(&self, _entry_id: &str) -> Result<()> {
        Err(self.err())
    }
}

#[async_trait]
impl Search for UnsupportedFacet {
    fn is_supported(&self) -> bool {
        false
    }

    async fn search(&self, _query: &Query) -> Result<Vec<RemoteEntry>> {
        Err(self.err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_accessor() {
        let perm = Permission::new(vec![
            UserRole {
                user: "alice@example.com".to_string(),
                role: Role::Read,
            },
            UserRole {
                user: "bob@example.com".to_string(),
                role: Role::Owner,
            },
        ]);
        assert_eq!(perm.owner().unwrap().user, "bob@example.com");
    }

    #[test]
    fn test_owner_absent_when_none_flagged() {
        let perm = Permission::new(vec![UserRole {
            user: "alice@example.com".to_string(),
            role: Role::Full,
        }]);
        assert!(perm.owner().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_facet_fails_explicitly() {
        let facet = UnsupportedFacet::new("local", "sharing");
        assert!(!Sharing::is_supported(&facet));

        let err = facet.permissions("f1").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Unsupported {
                backend: "local",
                capability: "sharing"
            }
        ));

        let err = facet.share("f1", "alice@example.com", Role::Read).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_unsupported_trash_operations_all_fail() {
        let facet = UnsupportedFacet::new("local", "trash");
        assert!(Trashed::list(&facet).await.is_err());
        assert!(facet.trash("f1").await.is_err());
        assert!(facet.restore("f1").await.is_err());
    }
}
