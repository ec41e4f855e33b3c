//! Mailbox query and result types

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::imap::DEFAULT_FOLDER;
use crate::error::{McpDemoError, Result, ValidationError};

/// Sender, subject and plain-text body of one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Raw `From` header
    pub sender: String,

    /// Decoded subject
    pub subject: String,

    /// First plain-text part, trimmed
    pub body: String,
}

/// Messages keyed by IMAP UID (serialized as string keys)
pub type MessageListing = BTreeMap<u32, MessageRecord>;

/// Folder plus a half-open `[start_date, end_date)` range of sent dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxQuery {
    pub folder: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MailboxQuery {
    /// Build a query; a missing or blank folder means `INBOX`
    pub fn new(folder: Option<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let folder = folder
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FOLDER.to_string());

        Self {
            folder,
            start_date,
            end_date,
        }
    }

    /// IMAP SEARCH criteria matching the sent-date range
    pub fn search_criteria(&self) -> String {
        format!(
            "SENTSINCE {} SENTBEFORE {}",
            imap_date(self.start_date),
            imap_date(self.end_date)
        )
    }
}

/// Date in IMAP `date` syntax, e.g. `05-Mar-2024`
pub fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Parse `YYYY-MM-DD` or an ISO-8601 date-time, keeping only the date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, pattern) {
            return Ok(dt.date());
        }
    }

    Err(McpDemoError::Validation(ValidationError::InvalidDate {
        value: value.to_string(),
    }))
}

/// Serde adapter for [`parse_date`]
pub fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_search_criteria() {
        let query = MailboxQuery::new(None, date(2024, 3, 5), date(2024, 3, 12));
        assert_eq!(query.folder, "INBOX");
        assert_eq!(
            query.search_criteria(),
            "SENTSINCE 05-Mar-2024 SENTBEFORE 12-Mar-2024"
        );
    }

    #[test]
    fn test_explicit_folder() {
        let query = MailboxQuery::new(Some("[Gmail]/Sent Mail".into()), date(2024, 1, 1), date(2024, 1, 2));
        assert_eq!(query.folder, "[Gmail]/Sent Mail");

        let blank = MailboxQuery::new(Some("  ".into()), date(2024, 1, 1), date(2024, 1, 2));
        assert_eq!(blank.folder, "INBOX");
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("2024-03-05").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_date("2024-03-05T23:10:00").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_date("2024-03-05T23:10:00+02:00").unwrap(), date(2024, 3, 5));
        assert_eq!(parse_date("2024-03-05 08:00:00.250").unwrap(), date(2024, 3, 5));
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn test_listing_serializes_uid_keys() {
        let mut listing = MessageListing::new();
        listing.insert(
            42,
            MessageRecord {
                sender: "a@example.com".into(),
                subject: "Hi".into(),
                body: "Hello".into(),
            },
        );

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["42"]["subject"], "Hi");
    }
}
