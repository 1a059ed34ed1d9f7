//! Cloud Logging subcommands.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::Value;

use super::CommandContext;
use crate::output::{col, print_items, Column};
use crate::prompt::Confirmer;
use crate::services::logging::{self, EntryFilter, Severity};

const ENTRY_COLUMNS: &[Column] = &[
    col("TIMESTAMP", "timestamp"),
    col("SEVERITY", "severity"),
    col("LOG", "logName"),
    col("TEXT", "textPayload"),
];

const LOG_COLUMNS: &[Column] = &[col("LOG", "")];

#[derive(Subcommand, Debug)]
pub enum LoggingCommand {
    /// Read log entries matching the criteria
    Read {
        /// Free-form filter expression. Mutually exclusive with the
        /// structured flags below
        #[arg(long)]
        filter: Option<String>,
        /// Only entries at or above this severity
        #[arg(long, value_enum)]
        min_severity: Option<Severity>,
        /// Only entries at or after this RFC3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Only entries at or before this RFC3339 timestamp
        #[arg(long)]
        until: Option<DateTime<Utc>>,
    },
    /// List the project's log names
    ListLogs,
    /// Delete all entries of a log
    DeleteLog {
        log: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(command: LoggingCommand, ctx: &CommandContext) -> Result<()> {
    match command {
        LoggingCommand::Read {
            filter,
            min_severity,
            since,
            until,
        } => {
            let criteria = EntryFilter {
                expression: filter,
                min_severity,
                since,
                until,
            };
            let entries = logging::list_entries(&ctx.client, &criteria, &ctx.cancel).await?;
            print_items(&entries, ENTRY_COLUMNS, ctx.format);
        }
        LoggingCommand::ListLogs => {
            let logs = logging::list_logs(&ctx.client, &ctx.cancel).await?;
            let items: Vec<Value> = logs.into_iter().map(Value::String).collect();
            print_items(&items, LOG_COLUMNS, ctx.format);
        }
        LoggingCommand::DeleteLog { log, force } => {
            let mut confirmer = Confirmer::from_terminal(force);
            let prompt = format!(
                "Delete all entries of log {log} in {}?",
                ctx.client.project_id
            );
            if !confirmer.confirm(&prompt)? {
                eprintln!("Aborted");
                return Ok(());
            }
            logging::delete_log(&ctx.client, &log).await?;
            eprintln!("Deleted log {log}");
        }
    }

    Ok(())
}
