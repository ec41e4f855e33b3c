//! MCP (Model Context Protocol) module
//!
//! JSON-RPC dispatch, tool handlers and the stdio / streamable HTTP transports.

pub mod http;
pub mod server;
pub mod tools;
pub mod types;

use clap::ValueEnum;

use crate::config::HttpConfig;
use crate::error::Result;
use server::McpServer;
use tools::ToolHandler;

/// How a server talks to its client
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST with session headers
    StreamableHttp,
}

/// Serve `handler` on the chosen transport until the client goes away
pub async fn run<H: ToolHandler>(handler: H, transport: Transport, http_config: &HttpConfig) -> Result<()> {
    let server = McpServer::new(handler);
    match transport {
        Transport::Stdio => server.run_stdio().await,
        Transport::StreamableHttp => http::serve(server, http_config).await,
    }
}
