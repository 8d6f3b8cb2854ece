use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, ResetToken};

#[derive(Debug)]
pub struct StoreError {
    pub message: String,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for StoreError {
    fn from(s: String) -> Self {
        StoreError { message: s }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError {
            message: err.to_string(),
        }
    }
}

/// Persistence collaborator for the reset flow. Two implementations ship:
/// `db::PgStore` for deployments and `reset::memory::MemoryStore` for tests
/// and database-less development.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Lookup an account. `email` is already normalized (trimmed, lowercased).
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Invalidate all prior unconsumed tokens for the account, then persist
    /// a new one. Both happen in one transaction so a crash cannot leave the
    /// account with zero valid tokens after a request.
    async fn create_token(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, StoreError>;

    async fn find_token_by_hash(&self, token_hash: &str)
        -> Result<Option<ResetToken>, StoreError>;

    /// The compound atomic operation: mark the token consumed and update the
    /// account's credential hash, all-or-nothing. The consumed mark is a
    /// compare-and-swap; returns `false` when a concurrent caller already
    /// consumed the token, in which case the credential is untouched.
    async fn consume_token_and_update_credential(
        &self,
        token_id: Uuid,
        account_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError>;

    /// Maintenance: drop tokens whose expiry is in the past, consumed or not.
    /// Returns the number of rows removed.
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
