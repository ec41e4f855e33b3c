//! MCP demo servers
//!
//! Two small Model Context Protocol servers sharing one JSON-RPC layer:
//! a CSV dataset analyzer and an IMAP (Gmail) message lister.

pub mod config;
pub mod dataset;
pub mod error;
pub mod mail;
pub mod mcp;

pub use config::{Credentials, HttpConfig, ImapConfig};
pub use error::{McpDemoError, Result};
