pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::reset::notify::{Notifier, NotifyError};

/// SMTP-backed notifier used in real deployments.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError::from(format!("Invalid from address: {e}")))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| NotifyError::from(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| NotifyError::from(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::from(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Fallback notifier for deployments without SMTP configured: the mail body
/// goes to the log instead of the wire, so reset links still reach an
/// operator tailing the logs.
pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        tracing::warn!("SMTP not configured. Mail to {recipient}: {subject}\n{html_body}");
        Ok(())
    }
}
