use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpSettings;

/// Build the plain-text UTF-8 message from the SMTP user to the recipient
pub fn build_message(settings: &SmtpSettings, subject: &str, body: &str) -> Result<Message> {
    let from: Mailbox = settings
        .user
        .parse()
        .with_context(|| format!("Invalid sender address: {}", settings.user))?;
    let to: Mailbox = settings
        .recipient
        .parse()
        .with_context(|| format!("Invalid recipient address: {}", settings.recipient))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .context("Failed to build email message")
}

/// Submit the briefing over STARTTLS with the configured login
pub async fn send_briefing(settings: &SmtpSettings, subject: &str, body: &str) -> Result<()> {
    let message = build_message(settings, subject, body)?;

    let credentials = Credentials::new(settings.user.clone(), settings.password.clone());
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        .with_context(|| format!("Failed to set up SMTP relay {}", settings.host))?
        .port(settings.port)
        .credentials(credentials)
        .build();

    mailer
        .send(message)
        .await
        .context("Failed to send briefing email")?;

    info!(recipient = %settings.recipient, "Briefing email sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(recipient: &str) -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "briefing@example.com".to_string(),
            password: "secret".to_string(),
            recipient: recipient.to_string(),
        }
    }

    #[test]
    fn test_build_message_headers() {
        let message =
            build_message(&settings("reader@example.com"), "Briefing Tech", "Olá, mundo").unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("From: briefing@example.com"));
        assert!(formatted.contains("To: reader@example.com"));
        assert!(formatted.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let err = build_message(&settings("not an address"), "s", "b").unwrap_err();
        assert!(err.to_string().contains("Invalid recipient address"));
    }
}
