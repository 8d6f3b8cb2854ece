use async_trait::async_trait;

#[derive(Debug)]
pub struct NotifyError {
    pub message: String,
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for NotifyError {
    fn from(s: String) -> Self {
        NotifyError { message: s }
    }
}

/// Outbound delivery collaborator. The core only needs this capability, not
/// any particular transport; `email::SmtpMailer` and `email::LogMailer` are
/// the shipped implementations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str)
        -> Result<(), NotifyError>;
}
