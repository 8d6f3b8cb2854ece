pub mod accounts;
pub mod reset_tokens;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Account, ResetToken};
use crate::reset::store::{StoreError, TokenStore};

/// Postgres-backed `TokenStore`, delegating to the query modules above.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(accounts::find_by_email(&self.pool, email).await?)
    }

    async fn create_token(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, StoreError> {
        Ok(reset_tokens::create(&self.pool, account_id, token_hash, expires_at).await?)
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetToken>, StoreError> {
        Ok(reset_tokens::find_by_hash(&self.pool, token_hash).await?)
    }

    async fn consume_token_and_update_credential(
        &self,
        token_id: Uuid,
        account_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        Ok(
            reset_tokens::consume_and_update_password(&self.pool, token_id, account_id, password_hash)
                .await?,
        )
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(reset_tokens::delete_expired(&self.pool, now).await?)
    }
}
