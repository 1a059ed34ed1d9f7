//! Command handlers. Each submodule defines the clap subcommand tree for one
//! service and a `run` function dispatching to the service layer.

pub mod bigquery;
pub mod config;
pub mod logging;
pub mod pubsub;
pub mod storage;

use std::time::Duration;

use crate::gcp::client::GcpClient;
use crate::gcp::pager::CancelFlag;
use crate::output::OutputFormat;

/// Everything a command handler needs.
pub struct CommandContext {
    pub client: GcpClient,
    pub cancel: CancelFlag,
    pub format: OutputFormat,
    /// Default deadline for poll-until-complete commands; a per-command
    /// `--timeout-secs` overrides it.
    pub poll_timeout: Option<Duration>,
}
