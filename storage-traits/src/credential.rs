//! Credential and token records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend-specific token material.
///
/// Opaque to the core except for the three named fields; any of them may be
/// absent depending on the backend's authentication scheme. The `Debug`
/// implementation redacts all three.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl TokenRecord {
    pub fn with_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "[REDACTED]"
            } else {
                "<absent>"
            }
        }
        f.debug_struct("TokenRecord")
            .field("application_key", &mask(&self.application_key))
            .field("application_secret", &mask(&self.application_secret))
            .field("access_token", &mask(&self.access_token))
            .finish()
    }
}

/// Identity and token record a provider authenticates with.
///
/// Constructed by the caller; the provider may fill in the account
/// identifier from a previously persisted record during authentication, and
/// persists the credential on success unless the caller opts out.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    /// Account identifier, optional until resolved by authentication.
    pub account_id: Option<String>,
    /// Backend-specific token material.
    pub token: Option<TokenRecord>,
}

impl Credential {
    pub fn new(account_id: impl Into<String>, token: TokenRecord) -> Self {
        Self {
            account_id: Some(account_id.into()),
            token: Some(token),
        }
    }

    /// A credential carrying only token material; the account identifier is
    /// resolved during authentication.
    pub fn from_token(token: TokenRecord) -> Self {
        Self {
            account_id: None,
            token: Some(token),
        }
    }
}
