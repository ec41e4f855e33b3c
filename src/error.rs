//! Error types for the MCP demo servers
//!
//! This module defines the error hierarchy for all operations in the servers.

use thiserror::Error;

/// Main error type for the MCP demo servers
#[derive(Error, Debug)]
pub enum McpDemoError {
    /// IMAP / MIME errors
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mailbox access errors
#[derive(Error, Debug)]
pub enum MailError {
    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    #[error("Failed to connect to {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    #[error("Login failed for {user}: {message}")]
    Login { user: String, message: String },

    #[error("Failed to select folder '{folder}': {message}")]
    SelectFolder { folder: String, message: String },

    #[error("Search failed ({criteria}): {message}")]
    Search { criteria: String, message: String },

    #[error("Failed to fetch message {uid}: {message}")]
    Fetch { uid: u32, message: String },

    #[error("Failed to parse message: {0}")]
    Parse(String),

    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Mailbox task aborted: {0}")]
    Task(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {name}")]
    Missing { name: String },
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    #[error("Invalid date '{value}': expected YYYY-MM-DD or an ISO-8601 date-time")]
    InvalidDate { value: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

/// Reasons a dataset analysis produced no report, or a section of one failed.
///
/// The `Display` output of each variant is the exact text shown to the
/// caller in place of the report (or section).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("The provided dataset is empty or contains no valid data.")]
    Empty,

    #[error("CSV parsing error: {0}")]
    Parse(String),

    #[error("Unexpected error while loading the dataset: {0}")]
    Unexpected(String),

    #[error("Unable to compute descriptive statistics: {0}")]
    Statistics(String),
}

/// Result type alias for MCP demo operations
pub type Result<T> = std::result::Result<T, McpDemoError>;

impl From<imap::Error> for MailError {
    fn from(err: imap::Error) -> Self {
        MailError::Imap(err.to_string())
    }
}

impl From<imap::Error> for McpDemoError {
    fn from(err: imap::Error) -> Self {
        McpDemoError::Mail(MailError::from(err))
    }
}

impl From<mailparse::MailParseError> for MailError {
    fn from(err: mailparse::MailParseError) -> Self {
        MailError::Parse(err.to_string())
    }
}

impl From<mailparse::MailParseError> for McpDemoError {
    fn from(err: mailparse::MailParseError) -> Self {
        McpDemoError::Mail(MailError::from(err))
    }
}
