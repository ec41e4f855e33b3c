//! Content extraction from raw RFC 822 messages

use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};

use crate::error::Result;
use crate::mail::types::MessageRecord;

/// Parse a fetched message into sender, subject and body
pub fn parse_message(raw: &[u8]) -> Result<MessageRecord> {
    let mail = parse_mail(raw)?;

    Ok(MessageRecord {
        sender: extract_sender(&mail),
        subject: extract_subject(&mail),
        body: extract_text_body(&mail)?,
    })
}

/// `From` header as sent, without decoding
pub fn extract_sender(mail: &ParsedMail<'_>) -> String {
    mail.headers
        .get_first_header("From")
        .map(|h| String::from_utf8_lossy(h.get_value_raw()).trim().to_string())
        .unwrap_or_default()
}

/// Subject with RFC 2047 encoded words decoded
pub fn extract_subject(mail: &ParsedMail<'_>) -> String {
    mail.headers.get_first_value("Subject").unwrap_or_default()
}

/// First `text/plain` part that is not an attachment, trimmed.
///
/// A single-part message has its payload decoded whatever its type. A
/// multipart message without a plain-text part yields an empty body.
pub fn extract_text_body(mail: &ParsedMail<'_>) -> Result<String> {
    let body = if is_multipart(mail) {
        match find_plain_text(mail) {
            Some(part) => decode_part(part)?,
            None => String::new(),
        }
    } else {
        decode_part(mail)?
    };

    Ok(body.trim().to_string())
}

fn is_multipart(part: &ParsedMail<'_>) -> bool {
    part.ctype.mimetype.starts_with("multipart/")
}

fn is_attachment(part: &ParsedMail<'_>) -> bool {
    part.get_content_disposition().disposition == DispositionType::Attachment
}

/// Depth-first, pre-order walk over the MIME tree
fn find_plain_text<'a, 'b>(part: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if part.ctype.mimetype == "text/plain" && !is_attachment(part) {
        return Some(part);
    }

    part.subparts.iter().find_map(|sub| find_plain_text(sub))
}

/// Decode transfer encoding and charset. Without a declared charset the
/// payload is read as UTF-8. Invalid bytes are replaced either way.
fn decode_part(part: &ParsedMail<'_>) -> Result<String> {
    if part.ctype.params.contains_key("charset") {
        Ok(part.get_body()?)
    } else {
        let raw = part.get_body_raw()?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPART: &str = "From: Alice <alice@example.com>\r\n\
Subject: =?UTF-8?B?Q2lhbyBtb25kbyDwn4yN?=\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
\r\n\
  Caff=C3=A8 alle 10?  \r\n\
\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Caff&egrave; alle 10?</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: text/plain; name=\"notes.txt\"\r\n\
Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
\r\n\
attached notes\r\n\
--outer--\r\n";

    #[test]
    fn test_multipart_prefers_plain_text() {
        let record = parse_message(MULTIPART.as_bytes()).unwrap();
        assert_eq!(record.sender, "Alice <alice@example.com>");
        assert_eq!(record.subject, "Ciao mondo 🌍");
        assert_eq!(record.body, "Caffè alle 10?");
    }

    #[test]
    fn test_html_before_plain_text() {
        let raw = "From: bob@example.com\r\n\
Subject: Report\r\n\
Content-Type: multipart/alternative; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>numbers</b>\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
\r\n\
numbers\r\n\
--b--\r\n";
        let record = parse_message(raw.as_bytes()).unwrap();
        assert_eq!(record.body, "numbers");
    }

    #[test]
    fn test_attachment_only_gives_empty_body() {
        let raw = "From: carol@example.com\r\n\
Subject: Files\r\n\
Content-Type: multipart/mixed; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>see attachment</p>\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=\"a.txt\"\r\n\
\r\n\
data\r\n\
--b--\r\n";
        let record = parse_message(raw.as_bytes()).unwrap();
        assert_eq!(record.body, "");
    }

    #[test]
    fn test_single_part_without_charset() {
        let mut raw = b"From: dave@example.com\r\nSubject: plain\r\n\r\n  hello \xff world \r\n".to_vec();
        raw.extend_from_slice(b"\r\n");
        let record = parse_message(&raw).unwrap();
        assert_eq!(record.body, "hello \u{fffd} world");
    }

    #[test]
    fn test_latin1_charset_is_honored() {
        let raw = b"From: erin@example.com\r\n\
Subject: =?ISO-8859-1?Q?Gr=FC=DFe?=\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
\r\n\
Gr\xfc\xdfe\r\n";
        let record = parse_message(raw).unwrap();
        assert_eq!(record.subject, "Grüße");
        assert_eq!(record.body, "Grüße");
    }

    #[test]
    fn test_missing_headers() {
        let record = parse_message(b"\r\nbody only\r\n").unwrap();
        assert_eq!(record.sender, "");
        assert_eq!(record.subject, "");
        assert_eq!(record.body, "body only");
    }
}
