//! Outbound verdict reply over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;

use crate::classify::Verdict;
use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::mail::inbound::InboundEmail;

/// Outbound reply seam. The pipeline logs send failures without escalating
/// them, so implementations report errors but must never panic.
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// SMTP reply sender (lettre relay, UTF-8 plain text).
pub struct SmtpReplySender {
    config: SmtpConfig,
    from_address: String,
}

impl SmtpReplySender {
    pub fn new(config: SmtpConfig, from_address: impl Into<String>) -> Self {
        Self {
            config,
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl ReplySender for SmtpReplySender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::relay(&self.config.host)
            .map_err(|e| MailError::Send(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| MailError::InvalidAddress {
                        address: self.from_address.clone(),
                        reason: format!("{e}"),
                    })?,
            )
            .to(to.parse().map_err(|e| MailError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        transport
            .send(&email)
            .map_err(|e| MailError::Send(e.to_string()))?;

        tracing::info!(%to, "Verdict reply sent");
        Ok(())
    }
}

// ── Reply composition (public for testing) ──────────────────────────

/// Subject line for the verdict reply.
pub fn reply_subject(original_subject: &str) -> String {
    format!("Spam detection of {original_subject}")
}

/// Percentage text for a confidence score: shortest round-trip form of
/// `confidence * 100`, keeping a trailing `.0` for whole values. No
/// rounding or truncation beyond float formatting.
pub fn confidence_percent(confidence: f64) -> String {
    format!("{:?}", confidence * 100.0)
}

/// Compose the reply body: receive timestamp, original subject, the full
/// original body (pre-normalization), and the verdict with confidence.
pub fn compose_reply_body(email: &InboundEmail, verdict: &Verdict) -> String {
    format!(
        "We received your email sent at {} with the subject {}.\n\n\
         Here is the email body:\n{}\n\n\
         The email was categorized as {} with a {}% confidence.",
        email.received,
        email.subject,
        email.body,
        verdict.label.as_str(),
        confidence_percent(verdict.confidence),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Label;

    fn sample_email() -> InboundEmail {
        InboundEmail {
            sender: "caller@example.com".to_string(),
            subject: "Claim your reward".to_string(),
            received: "2021-03-26T05:58:41Z".to_string(),
            body: "FreeMsg: Txt: CALL to No: 86888 & claim your reward".to_string(),
        }
    }

    #[test]
    fn reply_subject_prefixes_original() {
        assert_eq!(
            reply_subject("Claim your reward"),
            "Spam detection of Claim your reward"
        );
    }

    #[test]
    fn confidence_percent_keeps_trailing_zero() {
        assert_eq!(confidence_percent(0.0), "0.0");
        assert_eq!(confidence_percent(0.5), "50.0");
        assert_eq!(confidence_percent(1.0), "100.0");
    }

    #[test]
    fn confidence_percent_unrounded() {
        assert_eq!(confidence_percent(0.999), "99.9");
        assert_eq!(confidence_percent(0.92), "92.0");
    }

    #[test]
    fn compose_reply_body_spam_scenario() {
        let email = sample_email();
        let verdict = Verdict {
            label: Label::Spam,
            confidence: 0.92,
        };
        let body = compose_reply_body(&email, &verdict);
        assert_eq!(
            body,
            "We received your email sent at 2021-03-26T05:58:41Z with the subject \
             Claim your reward.\n\nHere is the email body:\nFreeMsg: Txt: CALL to \
             No: 86888 & claim your reward\n\nThe email was categorized as spam \
             with a 92.0% confidence."
        );
    }

    #[test]
    fn compose_reply_body_ham() {
        let email = sample_email();
        let verdict = Verdict {
            label: Label::Ham,
            confidence: 0.75,
        };
        let body = compose_reply_body(&email, &verdict);
        assert!(body.contains("categorized as ham with a 75.0% confidence"));
    }
}
