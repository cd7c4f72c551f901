//! Email notifier delivering through an SMTP relay.

use crate::config::{SmtpConfig, TlsMode};
use crate::notify::{Notification, Notifier};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

/// Subject line of every notification email.
pub const SUBJECT: &str = "Limited pledge available!";

/// Sends a fixed plaintext message containing the pledge URL.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    smtp: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }

    /// Builds the message for a pledge URL (which may be empty).
    pub fn compose(&self, url: &str) -> Result<Message> {
        let from: Mailbox = self.smtp.sender.parse().context("Invalid sender address")?;
        let to: Mailbox = self.smtp.receiver.parse().context("Invalid receiver address")?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!("A limited pledge has become available.\n{}\n", url))
            .context("Failed to build email")
    }

    /// Composes and delivers the message, returning any relay error.
    pub async fn send(&self, url: &str) -> Result<()> {
        let message = self.compose(url)?;
        let port = self.smtp.port.unwrap_or_else(|| self.smtp.tls.default_port());

        debug!("Sending email via {}:{} ({:?})", self.smtp.server, port, self.smtp.tls);

        let builder = match self.smtp.tls {
            TlsMode::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.smtp.server.as_str())
            }
            TlsMode::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.server)
                    .context("Failed to configure STARTTLS relay")?
            }
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp.server)
                .context("Failed to configure TLS relay")?,
        };

        let mut builder = builder.port(port);
        if let Some(username) = self.smtp.username.as_deref().filter(|u| !u.is_empty()) {
            let password = self.smtp.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.to_string(), password));
        }

        builder.build().send(message).await.context("SMTP delivery failed")?;
        Ok(())
    }

    /// Sends and reports the outcome on stdout. Never fails.
    pub async fn send_and_report(&self, url: &str) {
        match self.send(url).await {
            Ok(()) => println!("Successfully sent email"),
            Err(e) => {
                warn!("Email delivery failed: {:#}", e);
                println!("Error: unable to send email: {:#}", e);
            }
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.send_and_report(&notification.url).await;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("email to {} via {}", self.smtp.receiver, self.smtp.server)
    }
}
