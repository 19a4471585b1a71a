//! Admin session: access to the stored bearer credential
//!
//! The token is never cached in memory. Every privileged call asks the
//! `Session` for it, which reads the `CredentialStore` afresh, so a logout in
//! another process takes effect on the next call.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::error::ApiError;

/// Fixed key the token is stored under
pub const TOKEN_KEY: &str = "token";

/// Persistent storage for the opaque admin token
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load_token(&self) -> Result<Option<String>>;
    async fn store_token(&self, token: &str) -> Result<()>;
    async fn clear_token(&self) -> Result<()>;
}

/// An opaque bearer token read from the credential store
#[derive(Clone, PartialEq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value of the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Explicit session object handed to the table controller and import pipeline
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Token for a privileged call, or `MissingCredential`
    pub async fn bearer(&self) -> Result<BearerToken, ApiError> {
        match self.optional_bearer().await {
            Some(token) => Ok(token),
            None => {
                log::warn!("No admin token stored");
                Err(ApiError::MissingCredential)
            }
        }
    }

    /// Token if one is stored; read failures count as "not logged in"
    pub async fn optional_bearer(&self) -> Option<BearerToken> {
        match self.store.load_token().await {
            Ok(Some(token)) if !token.trim().is_empty() => Some(BearerToken::new(token)),
            Ok(_) => None,
            Err(e) => {
                log::error!("Failed to read stored token: {:#}", e);
                None
            }
        }
    }

    pub async fn sign_in(&self, token: &str) -> Result<()> {
        self.store.store_token(token).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.store.clear_token().await
    }

    pub async fn is_signed_in(&self) -> bool {
        self.optional_bearer().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MemoryCredentialStore;

    #[tokio::test]
    async fn test_bearer_requires_stored_token() {
        let session = Session::new(Arc::new(MemoryCredentialStore::default()));
        assert_eq!(session.bearer().await, Err(ApiError::MissingCredential));

        session.sign_in("abc").await.unwrap();
        assert_eq!(session.bearer().await.unwrap().header_value(), "Bearer abc");

        session.sign_out().await.unwrap();
        assert!(!session.is_signed_in().await);
    }

    #[tokio::test]
    async fn test_blank_token_counts_as_missing() {
        let session = Session::new(Arc::new(MemoryCredentialStore::with_token("  ")));
        assert!(session.optional_bearer().await.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = BearerToken::new("secret");
        assert_eq!(format!("{:?}", token), "BearerToken(***)");
    }
}
