use mailparse::{MailHeaderMap, ParsedMail};
use tracing::warn;

use crate::types::error::{MailvaultError, Result};

/// Structured view of a raw RFC 5322 message
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// Message-ID header, `None` when missing or blank
    pub message_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub recipients: String,
    /// Date header as received
    pub date: String,
    /// Unix seconds, 0 when the Date header is missing or unparsable
    pub date_epoch: i64,
    pub body_text: String,
    pub attachments: Vec<AttachmentPart>,
}

/// A MIME part that carries a filename, with its transfer-decoded payload
#[derive(Debug, Clone)]
pub struct AttachmentPart {
    pub filename: String,
    pub content_type: String,
    pub payload: Vec<u8>,
}

/// Parse raw message bytes into headers, plain-text body and attachment parts.
///
/// Only a structurally broken message is an error; charset and date problems
/// degrade to lossy text and epoch 0.
pub fn parse(raw: &[u8]) -> Result<ParsedMessage> {
    let mail = mailparse::parse_mail(raw)
        .map_err(|e| MailvaultError::Parse(format!("Failed to parse message: {}", e)))?;
    let headers = mail.get_headers();

    let date = headers.get_first_value("Date").unwrap_or_default();

    Ok(ParsedMessage {
        message_id: headers
            .get_first_value("Message-ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        subject: headers
            .get_first_value("Subject")
            .unwrap_or_else(|| "(no subject)".to_string()),
        sender: headers.get_first_value("From").unwrap_or_default(),
        recipients: headers.get_first_value("To").unwrap_or_default(),
        date_epoch: parse_date_epoch(&date),
        date,
        body_text: extract_body_text(&mail),
        attachments: extract_attachment_parts(&mail),
    })
}

/// Plain-text body: every unnamed text/plain part joined by newlines for
/// multipart messages, the single part otherwise
fn extract_body_text(mail: &ParsedMail) -> String {
    if !mail.ctype.mimetype.starts_with("multipart/") {
        return mail.get_body_raw().map(|b| decode_text(&b, &mail.ctype.charset)).unwrap_or_default();
    }

    mail.parts()
        .filter(|part| part.ctype.mimetype == "text/plain" && filename_of(part).is_none())
        .filter_map(|part| {
            let payload = part.get_body_raw().ok()?;
            if payload.is_empty() {
                return None;
            }
            Some(decode_text(&payload, &part.ctype.charset))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every part carrying a filename, in part order. Parts whose payload cannot
/// be decoded or is empty are skipped.
fn extract_attachment_parts(mail: &ParsedMail) -> Vec<AttachmentPart> {
    mail.parts()
        .filter_map(|part| {
            let filename = filename_of(part)?;
            let payload = match part.get_body_raw() {
                Ok(p) if !p.is_empty() => p,
                Ok(_) => return None,
                Err(e) => {
                    warn!("Skipping undecodable attachment '{}': {}", filename, e);
                    return None;
                }
            };
            Some(AttachmentPart {
                filename,
                content_type: part.ctype.mimetype.clone(),
                payload,
            })
        })
        .collect()
}

/// Content-Disposition `filename`, falling back to the Content-Type `name`
fn filename_of(part: &ParsedMail) -> Option<String> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
}

/// Decode text in its declared charset, falling back to lossy UTF-8
pub fn decode_text(payload: &[u8], charset: &str) -> String {
    let label = charset.trim().to_ascii_lowercase();
    if label.is_empty() || label == "us-ascii" || label == "utf-8" || label == "utf8" {
        return String::from_utf8_lossy(payload).into_owned();
    }

    match charset::Charset::for_label(label.as_bytes()) {
        Some(cs) => cs.decode_without_bom_handling(payload).0.into_owned(),
        None => {
            warn!("Unknown encoding '{}', falling back to UTF-8", charset);
            String::from_utf8_lossy(payload).into_owned()
        }
    }
}

/// RFC 5322 date to unix seconds, 0 on any failure
pub fn parse_date_epoch(date: &str) -> i64 {
    if date.trim().is_empty() {
        return 0;
    }
    mailparse::dateparse(date).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_part_message() {
        let raw = b"Message-ID: <abc@example.com>\r\n\
            From: Alice <alice@example.com>\r\n\
            To: bob@example.com\r\n\
            Subject: Lunch\r\n\
            Date: Mon, 2 Mar 2026 10:00:00 +0000\r\n\
            \r\n\
            See you at noon.\r\n";

        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.message_id.as_deref(), Some("<abc@example.com>"));
        assert_eq!(parsed.subject, "Lunch");
        assert_eq!(parsed.sender, "Alice <alice@example.com>");
        assert_eq!(parsed.recipients, "bob@example.com");
        assert_eq!(parsed.date_epoch, 1_772_445_600);
        assert!(parsed.body_text.contains("See you at noon."));
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn test_missing_headers_get_defaults() {
        let parsed = parse(b"From: a@example.com\r\n\r\nbody\r\n").unwrap();
        assert!(parsed.message_id.is_none());
        assert_eq!(parsed.subject, "(no subject)");
        assert_eq!(parsed.date, "");
        assert_eq!(parsed.date_epoch, 0);
    }

    #[test]
    fn test_unparsable_date_is_zero() {
        let parsed = parse(b"Date: sometime last week\r\n\r\nbody\r\n").unwrap();
        assert_eq!(parsed.date, "sometime last week");
        assert_eq!(parsed.date_epoch, 0);
    }

    #[test]
    fn test_multipart_joins_text_parts_and_skips_named_ones() {
        let raw = b"Subject: parts\r\n\
            Content-Type: multipart/mixed; boundary=\"xx\"\r\n\
            \r\n\
            --xx\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            \r\n\
            first\r\n\
            --xx\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>html</p>\r\n\
            --xx\r\n\
            Content-Type: text/plain\r\n\
            Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
            \r\n\
            attached notes\r\n\
            --xx\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            \r\n\
            second\r\n\
            --xx--\r\n";

        let parsed = parse(raw).unwrap();
        let lines: Vec<&str> = parsed.body_text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["first", "second"]);
        assert!(!parsed.body_text.contains("html"));

        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].filename, "notes.txt");
        assert_eq!(parsed.attachments[0].content_type, "text/plain");
    }

    #[test]
    fn test_attachment_name_from_content_type() {
        let raw = b"Content-Type: multipart/mixed; boundary=\"b\"\r\n\
            \r\n\
            --b\r\n\
            Content-Type: application/pdf; name=\"scan.pdf\"\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            JVBERi0xLjQK\r\n\
            --b--\r\n";

        let parsed = parse(raw).unwrap();
        assert_eq!(parsed.attachments.len(), 1);
        assert_eq!(parsed.attachments[0].filename, "scan.pdf");
        assert_eq!(parsed.attachments[0].payload, b"%PDF-1.4\n");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_lossy_utf8() {
        let raw = b"Content-Type: text/plain; charset=x-no-such-charset\r\n\
            \r\n\
            caf\xe9 ol\xc3\xa9\r\n";

        let parsed = parse(raw).unwrap();
        assert!(!parsed.body_text.is_empty());
        assert!(parsed.body_text.contains('\u{FFFD}'));
        assert!(parsed.body_text.contains("olé"));
    }

    #[test]
    fn test_declared_charset_is_honoured() {
        assert_eq!(decode_text(b"caf\xe9", "iso-8859-1"), "café");
        assert_eq!(decode_text(b"caf\xc3\xa9", "UTF-8"), "café");
    }
}
