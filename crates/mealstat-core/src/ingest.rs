//! Loading [`RawMessage`]s from stored mail.
//!
//! Retrieval itself (authentication, mailbox search) happens elsewhere;
//! these helpers only read what was already saved to disk: a JSON array,
//! JSON lines, or individual RFC 822 `.eml` files.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::models::message::RawMessage;

/// A parsed `.eml` file: the message plus the sender, which the core does
/// not keep but the mailbox filter needs.
#[derive(Debug, Clone)]
pub struct MailEnvelope {
    pub from: String,
    pub message: RawMessage,
}

/// Parse a JSON array of messages, or one message per line.
pub fn read_json_messages(content: &str) -> Result<Vec<RawMessage>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut messages = Vec::new();
    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message = serde_json::from_str(line).map_err(|e| IngestError::InvalidLine {
            line: i + 1,
            reason: e.to_string(),
        })?;
        messages.push(message);
    }

    Ok(messages)
}

/// Parse one RFC 822 message.
///
/// The id is the `Message-ID` header without angle brackets, or
/// `fallback_id` when the header is absent. The body is the first
/// `text/html` part, else the first `text/plain` part.
pub fn parse_eml(raw: &[u8], fallback_id: &str) -> Result<MailEnvelope> {
    let mail = mailparse::parse_mail(raw).map_err(IngestError::from)?;
    let headers = &mail.headers;

    let id = headers
        .get_first_value("Message-ID")
        .map(|v| v.trim().trim_start_matches('<').trim_end_matches('>').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback_id.to_string());
    let subject = headers.get_first_value("Subject").unwrap_or_default();
    let from = headers.get_first_value("From").unwrap_or_default();
    let date = headers
        .get_first_value("Date")
        .ok_or(IngestError::MissingHeader("Date"))?;
    let received_at = parse_date_header(&date)?;

    let body = find_part(&mail, "text/html")
        .or_else(|| find_part(&mail, "text/plain"))
        .map(|part| part.get_body().map_err(IngestError::from))
        .transpose()?
        .unwrap_or_default();

    debug!(id = %id, subject = %subject, body_len = body.len(), "Parsed mail");

    Ok(MailEnvelope {
        from,
        message: RawMessage {
            id,
            subject,
            body,
            received_at,
        },
    })
}

fn find_part<'a>(mail: &'a ParsedMail<'a>, mimetype: &str) -> Option<&'a ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        return (mail.ctype.mimetype.eq_ignore_ascii_case(mimetype)).then_some(mail);
    }
    mail.subparts.iter().find_map(|part| find_part(part, mimetype))
}

fn parse_date_header(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value.trim()) {
        return Ok(date);
    }

    let secs = mailparse::dateparse(value)
        .map_err(|e| IngestError::InvalidDate(format!("{}: {}", value, e)))?;
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|utc| utc.fixed_offset())
        .ok_or_else(|| IngestError::InvalidDate(value.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EML: &str = "From: Swiggy <noreply@swiggy.in>\r\n\
Subject: Your Swiggy order was successfully delivered\r\n\
Date: Fri, 01 Mar 2024 20:10:00 +0530\r\n\
Message-ID: <abc123@swiggy.in>\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"XX\"\r\n\
\r\n\
--XX\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
plain version\r\n\
--XX\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Restaurant</p><p>Tasty Bites</p>\r\n\
--XX--\r\n";

    #[test]
    fn test_parse_eml() {
        let envelope = parse_eml(EML.as_bytes(), "fallback").unwrap();
        assert_eq!(envelope.from, "Swiggy <noreply@swiggy.in>");
        assert_eq!(envelope.message.id, "abc123@swiggy.in");
        assert_eq!(envelope.message.subject, "Your Swiggy order was successfully delivered");
        assert!(envelope.message.body.contains("<p>Tasty Bites</p>"));
        assert_eq!(
            envelope.message.received_at,
            DateTime::parse_from_rfc3339("2024-03-01T20:10:00+05:30").unwrap()
        );
    }

    #[test]
    fn test_parse_eml_fallback_id() {
        let raw = "From: noreply@swiggy.in\r\nSubject: Order delivered\r\nDate: Fri, 01 Mar 2024 20:10:00 +0530\r\n\r\nRestaurant: Tasty Bites\r\n";
        let envelope = parse_eml(raw.as_bytes(), "file-7").unwrap();
        assert_eq!(envelope.message.id, "file-7");
        assert!(envelope.message.body.contains("Restaurant: Tasty Bites"));
    }

    #[test]
    fn test_parse_eml_requires_date() {
        let raw = "From: noreply@swiggy.in\r\nSubject: Order delivered\r\n\r\nbody\r\n";
        assert!(parse_eml(raw.as_bytes(), "x").is_err());
    }

    #[test]
    fn test_json_array_and_lines() {
        let array = r#"[{"id":"1","subject":"s","body":"b","received_at":"2024-03-01T20:10:00+05:30"}]"#;
        assert_eq!(read_json_messages(array).unwrap().len(), 1);

        let lines = "{\"id\":\"1\",\"body\":\"b\",\"received_at\":\"2024-03-01T20:10:00+05:30\"}\n\n{\"id\":\"2\",\"body\":\"c\",\"received_at\":\"2024-03-02T20:10:00+05:30\"}\n";
        let messages = read_json_messages(lines).unwrap();
        assert_eq!(messages.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_json_lines_error_line_number() {
        let lines = "{\"id\":\"1\",\"body\":\"b\",\"received_at\":\"2024-03-01T20:10:00+05:30\"}\nnot json\n";
        let err = read_json_messages(lines).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
