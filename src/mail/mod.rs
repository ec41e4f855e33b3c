//! Mailbox access over IMAP
//!
//! Contains query/result types, MIME content extraction and the IMAP client.

pub mod client;
pub mod message;
pub mod types;

pub use client::{collect_messages, ImapSession, MailStore, MailboxClient, MessageSource};
pub use types::{MailboxQuery, MessageListing, MessageRecord};
