//! Inbound email parsing.
//!
//! Raw bytes from the object store are parsed as a MIME message. Only the
//! first plain-text part feeds the classifier; a message with no plain-text
//! part classifies an empty body rather than falling back to HTML.

use std::sync::LazyLock;

use mail_parser::{MessageParser, PartType};
use regex::Regex;

use crate::error::MailError;

static WHITESPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\n\r\x0C]+").expect("whitespace regex is valid"));

/// A parsed inbound email. Read-only; discarded after the reply is sent.
#[derive(Debug, Clone)]
pub struct InboundEmail {
    /// Sender address the verdict reply goes back to.
    pub sender: String,
    pub subject: String,
    /// Date header as RFC 3339 text, empty if the header is missing.
    pub received: String,
    /// First plain-text part, verbatim (pre-normalization).
    pub body: String,
}

impl InboundEmail {
    pub fn parse(raw: &[u8]) -> Result<Self, MailError> {
        let parsed = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| MailError::Parse("not a valid MIME message".to_string()))?;

        let sender = parsed
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let subject = parsed.subject().unwrap_or("(no subject)").to_string();

        let received = parsed
            .date()
            .and_then(|d| chrono::DateTime::from_timestamp(d.to_timestamp(), 0))
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();

        // First part declared text/plain; multipart messages without one
        // yield an empty body.
        let body = parsed
            .parts
            .iter()
            .find_map(|part| match &part.body {
                PartType::Text(text) => Some(text.to_string()),
                _ => None,
            })
            .unwrap_or_default();

        Ok(Self {
            sender,
            subject,
            received,
            body,
        })
    }
}

/// Normalize body text for encoding: collapse whitespace runs (space, tab,
/// newline, CR, form feed) into single spaces, drop literal `*`, trim.
/// Idempotent.
pub fn normalize_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUNS.replace_all(text, " ");
    collapsed.replace('*', "").trim().to_string()
}
