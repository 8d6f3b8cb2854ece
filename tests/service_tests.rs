mod common;

use std::sync::Arc;

use chrono::Duration;

use passgate::password;
use passgate::reset::memory::MemoryStore;
use passgate::reset::store::TokenStore;
use passgate::reset::ResetError;

use common::{service, FailingMailer, RecordingMailer};

// ── Issuer ──────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_email_gets_masked_success() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));

    let result = svc.request_reset("ghost@example.com").await;

    assert!(result.is_ok());
    assert_eq!(mailer.sent_count(), 0);
}

#[tokio::test]
async fn request_normalizes_email_and_sends_link() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));

    svc.request_reset("  User@Example.COM ").await.unwrap();

    assert_eq!(mailer.sent_count(), 1);
    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent[0].to, "user@example.com");
    assert_eq!(sent[0].subject, "Reset your password");
    assert!(sent[0]
        .body
        .contains(&format!("{}/reset-password?token=", common::BASE_URL)));
}

#[tokio::test]
async fn new_request_invalidates_prior_token() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));

    svc.request_reset("user@example.com").await.unwrap();
    let first = mailer.last_token().unwrap();
    svc.request_reset("user@example.com").await.unwrap();
    let second = mailer.last_token().unwrap();
    assert_ne!(first, second);

    let result = svc.reset_password(&first, "brand-new-pass").await;
    assert!(matches!(result, Err(ResetError::TokenAlreadyUsed)));

    svc.reset_password(&second, "brand-new-pass").await.unwrap();
}

#[tokio::test]
async fn notification_failure_surfaces_and_rerequest_recovers() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());

    let failing = service(store.clone(), Arc::new(FailingMailer), Duration::hours(1));
    let result = failing.request_reset("user@example.com").await;
    assert!(matches!(result, Err(ResetError::Notification(_))));

    // The orphaned token from the failed attempt is burned by the retry.
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));
    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();
    svc.reset_password(&token, "brand-new-pass").await.unwrap();
}

// ── Verifier ────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_updates_credential() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store.clone(), mailer.clone(), Duration::hours(1));

    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();

    svc.reset_password(&token, "new-password12").await.unwrap();

    let account = store
        .find_account_by_email("user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(password::verify("new-password12", &account.password_hash).unwrap());
    assert!(!password::verify("old-password", &account.password_hash).unwrap());
}

#[tokio::test]
async fn consumed_token_never_validates_again() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));

    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();

    svc.reset_password(&token, "first-new-pass").await.unwrap();
    let result = svc.reset_password(&token, "second-new-pass").await;
    assert!(matches!(result, Err(ResetError::TokenAlreadyUsed)));
}

#[tokio::test]
async fn expired_token_rejected() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::seconds(-5));

    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();

    let result = svc.reset_password(&token, "brand-new-pass").await;
    assert!(matches!(result, Err(ResetError::TokenExpired)));
}

#[tokio::test]
async fn bogus_token_not_found() {
    let store = Arc::new(MemoryStore::new());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer, Duration::hours(1));

    let result = svc.reset_password("bogus-token-value", "validPassw0rd").await;
    assert!(matches!(result, Err(ResetError::TokenNotFound)));
}

#[tokio::test]
async fn short_password_rejected_and_token_stays_usable() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = service(store, mailer.clone(), Duration::hours(1));

    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();

    let result = svc.reset_password(&token, "short").await;
    assert!(matches!(result, Err(ResetError::WeakPassword { min_len: 8 })));

    // The rejected attempt must not have consumed the token.
    svc.reset_password(&token, "long-enough-pw").await.unwrap();
}

// ── Concurrency ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_double_submission_has_one_winner() {
    let store = Arc::new(MemoryStore::new());
    store.insert_account("user@example.com", &password::hash("old-password").unwrap());
    let mailer = RecordingMailer::new();
    let svc = Arc::new(service(store, mailer.clone(), Duration::hours(1)));

    svc.request_reset("user@example.com").await.unwrap();
    let token = mailer.last_token().unwrap();

    let (a, b) = {
        let svc_a = svc.clone();
        let svc_b = svc.clone();
        let token_a = token.clone();
        let token_b = token.clone();
        let ha = tokio::spawn(async move { svc_a.reset_password(&token_a, "first-password").await });
        let hb =
            tokio::spawn(async move { svc_b.reset_password(&token_b, "second-password").await });
        (ha.await.unwrap(), hb.await.unwrap())
    };

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one submission must win: {a:?} / {b:?}");
    for result in [a, b] {
        if let Err(e) = result {
            assert!(
                matches!(e, ResetError::TokenAlreadyUsed | ResetError::TokenNotFound),
                "loser saw unexpected error: {e:?}"
            );
        }
    }
}

#[tokio::test]
async fn compound_consume_is_single_shot() {
    let store = MemoryStore::new();
    let account = store.insert_account("user@example.com", "old-hash");
    let token = store
        .create_token(account.id, "some-token-hash", chrono::Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let first = store
        .consume_token_and_update_credential(token.id, account.id, "new-hash")
        .await
        .unwrap();
    let second = store
        .consume_token_and_update_credential(token.id, account.id, "other-hash")
        .await
        .unwrap();

    assert!(first);
    assert!(!second);

    // The losing call must not have touched the credential.
    let account = store
        .find_account_by_email("user@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.password_hash, "new-hash");
}

// ── Maintenance ─────────────────────────────────────────────────

#[tokio::test]
async fn sweep_removes_expired_tokens_only() {
    let store = MemoryStore::new();
    let account = store.insert_account("user@example.com", "hash");
    let now = chrono::Utc::now();

    store
        .create_token(account.id, "stale", now - Duration::minutes(5))
        .await
        .unwrap();
    // create_token invalidates the prior token but does not delete it.
    let live = store
        .create_token(account.id, "live", now + Duration::hours(1))
        .await
        .unwrap();

    let removed = store.delete_expired_tokens(now).await.unwrap();
    assert_eq!(removed, 1);

    assert!(store.find_token_by_hash("stale").await.unwrap().is_none());
    let kept = store.find_token_by_hash("live").await.unwrap().unwrap();
    assert_eq!(kept.id, live.id);
}
