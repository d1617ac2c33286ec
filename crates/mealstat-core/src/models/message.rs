//! Raw delivery-confirmation messages as handed over by the mail collaborator.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// An unprocessed email from the source mailbox.
///
/// The core never mutates a message; it only reads `subject` and `body`
/// and copies `id` into the records and failures it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Mailbox-unique message id.
    pub id: String,

    /// Subject header.
    #[serde(default)]
    pub subject: String,

    /// Body as text or HTML.
    pub body: String,

    /// When the mailbox received the message.
    pub received_at: DateTime<FixedOffset>,
}

impl RawMessage {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        received_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            received_at,
        }
    }

    /// Whether the subject marks this message as a reply or a forward.
    pub fn is_reply_or_forward(&self) -> bool {
        let subject = self.subject.trim_start().to_lowercase();
        ["re:", "fw:", "fwd:"]
            .iter()
            .any(|prefix| subject.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-01T20:10:00+05:30").unwrap()
    }

    #[test]
    fn test_reply_detection() {
        let msg = RawMessage::new("1", "Re: Your order was delivered", "body", received());
        assert!(msg.is_reply_or_forward());

        let msg = RawMessage::new("2", "FWD: order delivered", "body", received());
        assert!(msg.is_reply_or_forward());

        let msg = RawMessage::new("3", "Your Swiggy order was successfully delivered", "body", received());
        assert!(!msg.is_reply_or_forward());
    }

    #[test]
    fn test_deserialize_without_subject() {
        let json = r#"{"id":"abc","body":"hello","received_at":"2024-03-01T20:10:00+05:30"}"#;
        let msg: RawMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.subject, "");
        assert_eq!(msg.received_at, received());
    }
}
