//! Outgoing email for verification and password reset links

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutgoingMail {
    pub fn verification(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify Your Account".to_string(),
            html: format!("<p>Click <a href=\"{}\">here</a> to verify your account</p>", link),
        }
    }

    pub fn password_reset(to: &str, link: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Reset Your Password".to_string(),
            html: format!(
                "<p>Click <a href=\"{}\">here</a> to reset your password. \
                 This link will expire in 1 hour.</p>",
                link
            ),
        }
    }
}

/// Delivers mail on behalf of the auth-service
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of delivering it
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        log::info!("Mail to {}: {}\n{}", mail.to, mail.subject, mail.html);
        Ok(())
    }
}
