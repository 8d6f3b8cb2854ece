pub mod memory;
pub mod notify;
pub mod store;
pub mod token;

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::email::templates;
use crate::password;
use notify::Notifier;
use store::TokenStore;

#[derive(Debug)]
pub enum ResetError {
    /// Internal only: `request_reset` masks this into the generic success
    /// path before returning.
    AccountNotFound,
    Notification(String),
    TokenNotFound,
    TokenExpired,
    TokenAlreadyUsed,
    WeakPassword { min_len: usize },
    Hash(String),
    Store(String),
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetError::AccountNotFound => write!(f, "No account matches that email"),
            ResetError::Notification(msg) => write!(f, "Notification failed: {msg}"),
            ResetError::TokenNotFound => write!(f, "Reset token not found"),
            ResetError::TokenExpired => write!(f, "Reset token expired"),
            ResetError::TokenAlreadyUsed => write!(f, "Reset token already used"),
            ResetError::WeakPassword { min_len } => {
                write!(f, "Password must be at least {min_len} characters")
            }
            ResetError::Hash(msg) => write!(f, "Credential hashing failed: {msg}"),
            ResetError::Store(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl From<store::StoreError> for ResetError {
    fn from(err: store::StoreError) -> Self {
        ResetError::Store(err.message)
    }
}

impl From<notify::NotifyError> for ResetError {
    fn from(err: notify::NotifyError) -> Self {
        ResetError::Notification(err.message)
    }
}

#[derive(Debug, Clone)]
pub struct ResetPolicy {
    /// Lifetime of an issued token.
    pub token_ttl: Duration,
    pub min_password_len: usize,
    /// Prefix for the links placed in reset emails.
    pub base_url: String,
}

/// Issuer and verifier for password-reset tokens, over injected store and
/// notifier collaborators.
pub struct ResetService {
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    policy: ResetPolicy,
}

impl ResetService {
    pub fn new(store: Arc<dyn TokenStore>, notifier: Arc<dyn Notifier>, policy: ResetPolicy) -> Self {
        Self {
            store,
            notifier,
            policy,
        }
    }

    /// Issue a reset token for `email` and deliver the reset link.
    ///
    /// Unknown emails return Ok with no token created; the caller must hand
    /// out the same acknowledgement either way. Notification failures are
    /// returned so the caller can tell the user to retry — the invalidated
    /// prior tokens make re-requesting safe.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let email = normalize_email(email);
        match self.issue(&email).await {
            Err(ResetError::AccountNotFound) => {
                // Burn the same generation work as the issue path; unknown
                // addresses must not answer measurably faster than known ones.
                let decoy = token::generate();
                let _ = token::hash_value(&decoy);
                tracing::info!("Password reset requested for unknown email");
                Ok(())
            }
            other => other,
        }
    }

    async fn issue(&self, email: &str) -> Result<(), ResetError> {
        let account = self
            .store
            .find_account_by_email(email)
            .await?
            .ok_or(ResetError::AccountNotFound)?;

        let value = token::generate();
        let token_hash = token::hash_value(&value);
        let expires_at = Utc::now() + self.policy.token_ttl;

        self.store
            .create_token(account.id, &token_hash, expires_at)
            .await?;

        let reset_url = format!("{}/reset-password?token={value}", self.policy.base_url);
        let html = templates::render_password_reset(&reset_url);
        self.notifier
            .send(&account.email, "Reset your password", &html)
            .await?;

        tracing::info!(account_id = %account.id, "Password reset link sent");
        Ok(())
    }

    /// Validate `token_value` and, if it holds, atomically consume it and
    /// set the account's credential to `new_password`.
    pub async fn reset_password(
        &self,
        token_value: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        if new_password.chars().count() < self.policy.min_password_len {
            return Err(ResetError::WeakPassword {
                min_len: self.policy.min_password_len,
            });
        }

        let token_hash = token::hash_value(token_value);
        let stored = self
            .store
            .find_token_by_hash(&token_hash)
            .await?
            .ok_or(ResetError::TokenNotFound)?;

        if stored.is_expired(Utc::now()) {
            return Err(ResetError::TokenExpired);
        }
        if stored.is_consumed() {
            return Err(ResetError::TokenAlreadyUsed);
        }

        let password_hash = password::hash(new_password).map_err(ResetError::Hash)?;

        let consumed = self
            .store
            .consume_token_and_update_credential(stored.id, stored.account_id, &password_hash)
            .await?;
        if !consumed {
            // Lost the race to a concurrent submission of the same token.
            return Err(ResetError::TokenAlreadyUsed);
        }

        tracing::info!(account_id = %stored.account_id, "Password reset completed");
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
