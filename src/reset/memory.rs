use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{StoreError, TokenStore};
use crate::models::{Account, ResetToken};

/// In-memory `TokenStore` behind a single mutex, so the compound
/// consume-and-update call is one critical section. Backs the test suite and
/// database-less development runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    tokens: Vec<ResetToken>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Provisioning is the host application's concern; this
    /// exists for tests and development setups.
    pub fn insert_account(&self, email: &str, password_hash: &str) -> Account {
        let account = Account {
            id: Uuid::now_v7(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        self.lock()
            .expect("memory store lock")
            .accounts
            .push(account.clone());
        account
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::from("memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn create_token(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, StoreError> {
        let mut inner = self.lock()?;
        let now = Utc::now();

        for token in inner
            .tokens
            .iter_mut()
            .filter(|t| t.account_id == account_id && t.consumed_at.is_none())
        {
            token.consumed_at = Some(now);
        }

        let token = ResetToken {
            id: Uuid::now_v7(),
            account_id,
            token_hash: token_hash.to_string(),
            expires_at,
            consumed_at: None,
            created_at: now,
        };
        inner.tokens.push(token.clone());
        Ok(token)
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ResetToken>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn consume_token_and_update_credential(
        &self,
        token_id: Uuid,
        account_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        let Some(token) = inner.tokens.iter_mut().find(|t| t.id == token_id) else {
            return Ok(false);
        };
        if token.consumed_at.is_some() {
            return Ok(false);
        }

        let Some(account) = inner.accounts.iter_mut().find(|a| a.id == account_id) else {
            return Err(StoreError::from(format!("account {account_id} missing")));
        };

        token.consumed_at = Some(Utc::now());
        account.password_hash = password_hash.to_string();
        Ok(true)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.tokens.len();
        inner.tokens.retain(|t| t.expires_at >= now);
        Ok((before - inner.tokens.len()) as u64)
    }
}
