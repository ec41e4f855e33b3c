//! IMAP Gmail MCP Server
//!
//! Serves the `list_emails` tool over streamable HTTP. Credentials come from
//! flags or the environment and are validated before the server starts.

use anyhow::Context;
use clap::Parser;

use mcp_demo_servers::config::{self, http, imap, Credentials, HttpConfig, ImapConfig};
use mcp_demo_servers::error::{ConfigError, McpDemoError};
use mcp_demo_servers::mail::MailboxClient;
use mcp_demo_servers::mcp::tools::MailTools;
use mcp_demo_servers::mcp::{self, Transport};

/// IMAP Gmail MCP Server
#[derive(Parser)]
#[command(name = "imap-gmail")]
#[command(author, version, about = "MCP server listing Gmail messages over IMAP")]
struct Cli {
    /// Gmail address used to log in
    #[arg(short, long, env = "IMAP_GMAIL_EMAIL")]
    email: Option<String>,

    /// App-specific IMAP key
    #[arg(short = 'k', long, env = "IMAP_GMAIL_KEY", hide_env_values = true)]
    imap_key: Option<String>,

    /// HTTP port to listen on
    #[arg(short, long, default_value_t = http::DEFAULT_PORT)]
    port: u16,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// IMAP server host
    #[arg(long, default_value = imap::HOST)]
    imap_host: String,

    /// IMAP server port
    #[arg(long, default_value_t = imap::PORT)]
    imap_port: u16,

    /// Accept invalid TLS certificates from the IMAP server
    #[arg(long)]
    insecure_skip_tls_verify: bool,
}

impl Cli {
    fn imap_config(&self) -> ImapConfig {
        ImapConfig {
            host: self.imap_host.clone(),
            port: self.imap_port,
            accept_invalid_certs: self.insecure_skip_tls_verify,
        }
    }
}

/// Check everything the mail tools need before anything is built from it
fn validate_startup(cli: &Cli) -> mcp_demo_servers::Result<Credentials> {
    let email = cli.email.clone().ok_or_else(|| {
        McpDemoError::Config(ConfigError::Missing {
            name: "email (--email or IMAP_GMAIL_EMAIL)".to_string(),
        })
    })?;
    let key = cli.imap_key.clone().ok_or_else(|| {
        McpDemoError::Config(ConfigError::Missing {
            name: "IMAP key (--imap-key or IMAP_GMAIL_KEY)".to_string(),
        })
    })?;

    Credentials::new(email, key)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(config::log_level(cli.verbose).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let credentials = match validate_startup(&cli) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid credentials: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let imap_config = cli.imap_config();
    tracing::info!(
        user = %credentials.email,
        host = %imap_config.host,
        port = imap_config.port,
        "Mailbox configured"
    );

    let tools = MailTools::new(MailboxClient::new(imap_config, credentials));
    let http_config = HttpConfig::localhost(cli.port);

    mcp::run(tools, Transport::StreamableHttp, &http_config)
        .await
        .with_context(|| format!("imap-gmail server on {} failed", http_config.bind))?;

    Ok(())
}
