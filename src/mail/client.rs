//! IMAP mailbox client
//!
//! Every listing opens its own TLS session, logs in, selects the folder and
//! logs out again when the session guard drops.

use std::net::TcpStream;

use native_tls::{TlsConnector, TlsStream};

use crate::config::{Credentials, ImapConfig};
use crate::error::{MailError, McpDemoError, Result};
use crate::mail::message::parse_message;
use crate::mail::types::{MailboxQuery, MessageListing};

/// Mailbox operations needed to list messages
pub trait MailStore {
    /// Open a folder for reading
    fn select(&mut self, folder: &str) -> Result<()>;

    /// UIDs matching an IMAP SEARCH expression
    fn search(&mut self, criteria: &str) -> Result<Vec<u32>>;

    /// Full RFC 822 bytes of a message; `None` when the server sent no body
    fn fetch_raw(&mut self, uid: u32) -> Result<Option<Vec<u8>>>;
}

/// Anything able to answer a mailbox query (blocking)
pub trait MessageSource: Send + Sync + 'static {
    fn list_messages(&self, query: &MailboxQuery) -> Result<MessageListing>;
}

/// Select the folder, search the date range and parse every hit.
///
/// Fails as a whole on the first error; no partial listing is returned.
pub fn collect_messages<S: MailStore + ?Sized>(
    store: &mut S,
    query: &MailboxQuery,
) -> Result<MessageListing> {
    store.select(&query.folder)?;

    let criteria = query.search_criteria();
    let mut uids = store.search(&criteria)?;
    uids.sort_unstable();
    tracing::info!(
        "Found {} emails matching criteria: {}",
        uids.len(),
        criteria
    );

    let mut listing = MessageListing::new();
    for uid in uids {
        let Some(raw) = store.fetch_raw(uid)? else {
            tracing::debug!(uid, "No message body returned, skipping");
            continue;
        };
        listing.insert(uid, parse_message(&raw)?);
    }

    Ok(listing)
}

type TlsSession = imap::Session<TlsStream<TcpStream>>;

/// Authenticated IMAP session; logs out on drop
pub struct ImapSession {
    session: TlsSession,
}

impl ImapSession {
    /// Connect over TLS and log in
    pub fn open(config: &ImapConfig, credentials: &Credentials) -> Result<Self> {
        let tls = build_tls_connector(config)?;

        let client = imap::connect((config.host.as_str(), config.port), &config.host, &tls)
            .map_err(|e| MailError::Connect {
                host: config.host.clone(),
                port: config.port,
                message: e.to_string(),
            })?;

        let session = client
            .login(&credentials.email, &credentials.imap_key)
            .map_err(|(e, _client)| MailError::Login {
                user: credentials.email.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(host = %config.host, user = %credentials.email, "IMAP session opened");
        Ok(Self { session })
    }
}

impl Drop for ImapSession {
    fn drop(&mut self) {
        match self.session.logout() {
            Ok(()) => tracing::debug!("IMAP session closed"),
            Err(e) => tracing::warn!("IMAP logout failed: {}", e),
        }
    }
}

impl MailStore for ImapSession {
    fn select(&mut self, folder: &str) -> Result<()> {
        self.session
            .select(folder)
            .map(|_| ())
            .map_err(|e| {
                McpDemoError::Mail(MailError::SelectFolder {
                    folder: folder.to_string(),
                    message: e.to_string(),
                })
            })
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<u32>> {
        let uids = self.session.uid_search(criteria).map_err(|e| {
            McpDemoError::Mail(MailError::Search {
                criteria: criteria.to_string(),
                message: e.to_string(),
            })
        })?;

        Ok(uids.into_iter().collect())
    }

    fn fetch_raw(&mut self, uid: u32) -> Result<Option<Vec<u8>>> {
        let fetches = self
            .session
            .uid_fetch(uid.to_string(), "RFC822")
            .map_err(|e| {
                McpDemoError::Mail(MailError::Fetch {
                    uid,
                    message: e.to_string(),
                })
            })?;

        let body = fetches
            .iter()
            .find(|f| f.uid == Some(uid))
            .or_else(|| fetches.first())
            .and_then(|f| f.body())
            .map(<[u8]>::to_vec);

        Ok(body)
    }
}

fn build_tls_connector(config: &ImapConfig) -> Result<TlsConnector> {
    let mut builder = TlsConnector::builder();
    if config.accept_invalid_certs {
        tracing::warn!(
            "TLS certificate verification is disabled for {}",
            config.host
        );
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    builder.build().map_err(|e| {
        McpDemoError::Mail(MailError::Tls {
            message: e.to_string(),
        })
    })
}

/// Lists messages over a fresh IMAP connection per call
#[derive(Debug, Clone)]
pub struct MailboxClient {
    config: ImapConfig,
    credentials: Credentials,
}

impl MailboxClient {
    pub fn new(config: ImapConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &ImapConfig {
        &self.config
    }
}

impl MessageSource for MailboxClient {
    fn list_messages(&self, query: &MailboxQuery) -> Result<MessageListing> {
        let mut session = ImapSession::open(&self.config, &self.credentials)?;
        collect_messages(&mut session, query)
    }
}
