//! Dataset Analyzer MCP Server
//!
//! Serves the `analyze_dataset` tool over stdio or streamable HTTP.

use anyhow::Context;
use clap::Parser;

use mcp_demo_servers::config::{self, http, HttpConfig};
use mcp_demo_servers::mcp::tools::DatasetTools;
use mcp_demo_servers::mcp::{self, Transport};

/// Dataset Analyzer MCP Server
#[derive(Parser)]
#[command(name = "dataset-analyzer")]
#[command(author, version, about = "MCP server producing a descriptive report of a CSV dataset")]
struct Cli {
    /// Transport to serve on (SSE is not offered; use streamable-http)
    #[arg(short, long, value_enum, default_value_t = Transport::StreamableHttp)]
    transport: Transport,

    /// HTTP port to listen on (streamable-http only)
    #[arg(short, long, default_value_t = http::DEFAULT_PORT)]
    port: u16,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol on stdio, so logs always go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(config::log_level(cli.verbose).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(transport = ?cli.transport, "Starting dataset analyzer");

    mcp::run(DatasetTools::new(), cli.transport, &HttpConfig::localhost(cli.port))
        .await
        .context("dataset-analyzer server failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_sse_transport_rejected() {
        let err = Cli::try_parse_from(["dataset-analyzer", "--transport", "sse"]).err();
        assert!(err.is_some());

        let help = Cli::command().render_help().to_string();
        assert!(help.contains("SSE is not offered"));
    }

    #[test]
    fn test_transport_choices() {
        let cli = Cli::try_parse_from(["dataset-analyzer", "-t", "stdio"]).unwrap();
        assert_eq!(cli.transport, Transport::Stdio);

        let cli = Cli::try_parse_from(["dataset-analyzer"]).unwrap();
        assert_eq!(cli.transport, Transport::StreamableHttp);
    }
}
