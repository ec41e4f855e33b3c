//! Configuration management for the MCP demo servers
//!
//! Holds the validated mailbox credentials, IMAP endpoint settings and HTTP
//! bind address. Values come from CLI flags (with environment fallbacks) and
//! are validated once, before any server starts.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use validator::Validate;

use crate::error::{McpDemoError, Result, ValidationError};

/// IMAP account credentials
#[derive(Clone, Validate)]
pub struct Credentials {
    /// Account email address (IMAP login)
    #[validate(email)]
    pub email: String,

    /// App-specific IMAP key
    #[validate(length(min = 1))]
    pub imap_key: String,
}

impl Credentials {
    /// Build credentials, rejecting a malformed address or an empty key
    pub fn new(email: impl Into<String>, imap_key: impl Into<String>) -> Result<Self> {
        let credentials = Self {
            email: email.into(),
            imap_key: imap_key.into(),
        };

        credentials.validate().map_err(|e| {
            McpDemoError::Validation(ValidationError::InvalidCredentials {
                message: e.to_string(),
            })
        })?;

        Ok(credentials)
    }
}

// The key never ends up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("imap_key", &"<redacted>")
            .finish()
    }
}

/// IMAP endpoint settings
#[derive(Debug, Clone)]
pub struct ImapConfig {
    /// Server host name
    pub host: String,

    /// Server port (implicit TLS)
    pub port: u16,

    /// Skip certificate and host name verification
    pub accept_invalid_certs: bool,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: imap::HOST.to_string(),
            port: imap::PORT,
            accept_invalid_certs: false,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Address the server binds to
    pub bind: SocketAddr,
}

impl HttpConfig {
    /// Loopback listener on the given port
    pub fn localhost(port: u16) -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::localhost(http::DEFAULT_PORT)
    }
}

/// Map a repeated `-v` count to a log level
pub fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

/// IMAP constants
pub mod imap {
    /// Gmail IMAP host
    pub const HOST: &str = "imap.gmail.com";

    /// IMAP over implicit TLS
    pub const PORT: u16 = 993;

    /// Folder used when a call does not name one
    pub const DEFAULT_FOLDER: &str = "INBOX";
}

/// HTTP transport constants
pub mod http {
    /// Default listen port
    pub const DEFAULT_PORT: u16 = 8000;

    /// Path the MCP endpoint is mounted under
    pub const MCP_PATH: &str = "/mcp";

    /// Header carrying the session id
    pub const SESSION_HEADER: &str = "mcp-session-id";
}
