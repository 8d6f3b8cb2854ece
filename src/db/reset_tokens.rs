use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ResetToken;

/// Invalidate every outstanding token for the account, then insert the new
/// one. One transaction: a request either replaces the active token or
/// changes nothing.
pub async fn create(
    pool: &PgPool,
    account_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<ResetToken, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE password_reset_tokens SET consumed_at = now()
         WHERE account_id = $1 AND consumed_at IS NULL",
    )
    .bind(account_id)
    .execute(&mut *tx)
    .await?;

    let token = sqlx::query_as::<_, ResetToken>(
        "INSERT INTO password_reset_tokens (account_id, token_hash, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(account_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(token)
}

pub async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<ResetToken>, sqlx::Error> {
    sqlx::query_as::<_, ResetToken>("SELECT * FROM password_reset_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

/// Mark the token consumed and update the account credential in one
/// transaction. The consumed mark is a compare-and-swap on `consumed_at IS
/// NULL`; returns false without touching the credential when a concurrent
/// caller got there first. Rollback on any error or caller disconnect leaves
/// the pre-transaction state intact.
pub async fn consume_and_update_password(
    pool: &PgPool,
    token_id: Uuid,
    account_id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        "UPDATE password_reset_tokens SET consumed_at = now()
         WHERE id = $1 AND consumed_at IS NULL",
    )
    .bind(token_id)
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
        .bind(account_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn delete_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
