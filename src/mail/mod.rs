//! Inbound parsing and outbound reply for the notification pipeline.

pub mod inbound;
pub mod reply;

pub use inbound::{InboundEmail, normalize_text};
pub use reply::{ReplySender, SmtpReplySender};
