use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;

use passgate::config::Config;
use passgate::rate_limit::ResetRateLimiter;
use passgate::reset::memory::MemoryStore;
use passgate::reset::notify::{Notifier, NotifyError};
use passgate::reset::{ResetPolicy, ResetService};
use passgate::state::{AppState, SharedState};

pub const BASE_URL: &str = "http://localhost:3000";

pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every mail instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Pull the token value out of the reset URL in the most recent mail.
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let body = &sent.last()?.body;
        let idx = body.find("token=")?;
        let token: String = body[idx + "token=".len()..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        (!token.is_empty()).then_some(token)
    }
}

#[async_trait]
impl Notifier for RecordingMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMail {
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Notifier that always fails, for exercising the notification error path.
pub struct FailingMailer;

#[async_trait]
impl Notifier for FailingMailer {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
        Err(NotifyError::from("smtp unreachable".to_string()))
    }
}

pub fn policy(token_ttl: Duration) -> ResetPolicy {
    ResetPolicy {
        token_ttl,
        min_password_len: 8,
        base_url: BASE_URL.to_string(),
    }
}

pub fn service(
    store: Arc<MemoryStore>,
    notifier: Arc<dyn Notifier>,
    token_ttl: Duration,
) -> ResetService {
    ResetService::new(store, notifier, policy(token_ttl))
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: BASE_URL.to_string(),
        token_ttl_secs: 3600,
        min_password_len: 8,
        log_level: "info".to_string(),
        smtp: None,
    }
}

pub fn test_state(
    store: Arc<MemoryStore>,
    notifier: Arc<dyn Notifier>,
    token_ttl: Duration,
) -> SharedState {
    Arc::new(AppState {
        config: test_config(),
        reset: ResetService::new(store, notifier, policy(token_ttl)),
        reset_limiter: ResetRateLimiter::new(),
    })
}
