//! MCP Tool definitions and handlers
//!
//! Each server exposes a closed set of tools. Names are resolved to a tool
//! variant before any work is done; unknown names are rejected outright.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::dataset::analyze;
use crate::error::{MailError, McpError, Result};
use crate::mail::types::deserialize_date;
use crate::mail::{MailboxQuery, MessageSource};
use crate::mcp::types::{CallToolResult, Tool};

/// A set of tools served over MCP
#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    /// Name reported in `initialize`
    fn server_name(&self) -> &str;

    /// All available tools
    fn list_tools(&self) -> Vec<Tool>;

    /// Call a tool by name. Unknown names fail with [`McpError::UnknownTool`];
    /// tool-level failures come back as an error result.
    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult>;
}

fn tool_def(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema,
    }
}

/// JSON Schema for a typed argument struct
fn input_schema<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object", "properties": {}}))
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: Value) -> std::result::Result<T, CallToolResult> {
    serde_json::from_value(args).map_err(|e| {
        let err = McpError::InvalidArguments {
            message: e.to_string(),
        };
        tracing::warn!("{}", err);
        CallToolResult::error(err.to_string())
    })
}

// ==================== Dataset Tools ====================

/// Tools of the dataset analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetTool {
    AnalyzeDataset,
}

impl DatasetTool {
    pub const ALL: [DatasetTool; 1] = [DatasetTool::AnalyzeDataset];

    pub fn name(&self) -> &'static str {
        match self {
            DatasetTool::AnalyzeDataset => "analyze_dataset",
        }
    }
}

impl fmt::Display for DatasetTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetTool {
    type Err = McpError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| McpError::UnknownTool { name: s.to_string() })
    }
}

/// Arguments of `analyze_dataset`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AnalyzeDatasetArgs {
    /// CSV content as text, header row first
    pub csv_data: String,
}

/// Tool handler for the dataset analyzer
#[derive(Debug, Clone, Default)]
pub struct DatasetTools;

impl DatasetTools {
    pub fn new() -> Self {
        Self
    }

    fn handle_analyze_dataset(&self, args: Value) -> CallToolResult {
        let args: AnalyzeDatasetArgs = match parse_args(args) {
            Ok(a) => a,
            Err(result) => return result,
        };

        let analysis = analyze(&args.csv_data);
        if let Some(reason) = analysis.failure() {
            tracing::info!("Dataset analysis produced no report: {}", reason);
        }

        CallToolResult::text(analysis.to_string())
    }
}

#[async_trait]
impl ToolHandler for DatasetTools {
    fn server_name(&self) -> &str {
        "dataset-analyzer"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![tool_def(
            DatasetTool::AnalyzeDataset.name(),
            "Analyzes a CSV dataset provided as text: general info, descriptive statistics, \
             null values, a preview of the first rows and IQR outlier analysis",
            input_schema::<AnalyzeDatasetArgs>(),
        )]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult> {
        match name.parse::<DatasetTool>()? {
            DatasetTool::AnalyzeDataset => Ok(self.handle_analyze_dataset(args)),
        }
    }
}

// ==================== Mail Tools ====================

/// Tools of the IMAP mail server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTool {
    ListEmails,
}

impl MailTool {
    pub const ALL: [MailTool; 1] = [MailTool::ListEmails];

    pub fn name(&self) -> &'static str {
        match self {
            MailTool::ListEmails => "list_emails",
        }
    }
}

impl fmt::Display for MailTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MailTool {
    type Err = McpError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| McpError::UnknownTool { name: s.to_string() })
    }
}

/// Arguments of `list_emails`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEmailsArgs {
    /// First sent date to include (YYYY-MM-DD or ISO-8601 date-time)
    #[serde(deserialize_with = "deserialize_date")]
    #[schemars(with = "String")]
    pub start_date: NaiveDate,

    /// First sent date to exclude (YYYY-MM-DD or ISO-8601 date-time)
    #[serde(deserialize_with = "deserialize_date")]
    #[schemars(with = "String")]
    pub end_date: NaiveDate,

    /// Mailbox folder, INBOX when omitted
    #[serde(default)]
    pub folder: Option<String>,
}

/// Tool handler for the IMAP mail server
pub struct MailTools<S: MessageSource> {
    source: Arc<S>,
}

impl<S: MessageSource> MailTools<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    async fn handle_list_emails(&self, args: Value) -> CallToolResult {
        let args: ListEmailsArgs = match parse_args(args) {
            Ok(a) => a,
            Err(result) => return result,
        };

        let query = MailboxQuery::new(args.folder, args.start_date, args.end_date);
        let source = Arc::clone(&self.source);

        let outcome = tokio::task::spawn_blocking(move || source.list_messages(&query)).await;

        let listing = match outcome {
            Ok(Ok(listing)) => listing,
            Ok(Err(e)) => {
                tracing::error!("Error listing emails: {}", e);
                return CallToolResult::error(format!("Error listing emails: {}", e));
            }
            Err(e) => {
                let err = MailError::Task(e.to_string());
                tracing::error!("Error listing emails: {}", err);
                return CallToolResult::error(format!("Error listing emails: {}", err));
            }
        };

        match serde_json::to_value(&listing) {
            Ok(value) => CallToolResult::structured(value),
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }
}

#[async_trait]
impl<S: MessageSource> ToolHandler for MailTools<S> {
    fn server_name(&self) -> &str {
        "imap-gmail"
    }

    fn list_tools(&self) -> Vec<Tool> {
        vec![tool_def(
            MailTool::ListEmails.name(),
            "List emails in the user's Gmail account.",
            input_schema::<ListEmailsArgs>(),
        )]
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult> {
        match name.parse::<MailTool>()? {
            MailTool::ListEmails => Ok(self.handle_list_emails(args).await),
        }
    }
}
