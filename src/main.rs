use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use gcpctl::commands::bigquery::BigQueryCommand;
use gcpctl::commands::config::ConfigCommand;
use gcpctl::commands::logging::LoggingCommand;
use gcpctl::commands::pubsub::PubsubCommand;
use gcpctl::commands::storage::StorageCommand;
use gcpctl::commands::{self, CommandContext};
use gcpctl::config::Config;
use gcpctl::gcp::auth::GcpCredentials;
use gcpctl::gcp::client::{Endpoints, GcpClient};
use gcpctl::gcp::pager::CancelFlag;
use gcpctl::output::OutputFormat;

/// Command-line tool for Google Cloud REST APIs
#[derive(Parser, Debug)]
#[command(name = "gcpctl", version, about, long_about = None)]
struct Args {
    /// GCP project to use (falls back to saved config, then gcloud defaults)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Use a fixed access token instead of Application Default Credentials
    #[arg(long, global = true, env = "GCP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// BigQuery datasets, tables, and query jobs
    Bq {
        #[command(subcommand)]
        command: BigQueryCommand,
    },
    /// Pub/Sub topics and subscriptions
    Pubsub {
        #[command(subcommand)]
        command: PubsubCommand,
    },
    /// Cloud Logging entries and logs
    Logging {
        #[command(subcommand)]
        command: LoggingCommand,
    },
    /// Cloud Storage buckets and objects
    Storage {
        #[command(subcommand)]
        command: StorageCommand,
    },
    /// Manage saved gcpctl configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: failed to open log file {log_path:?}: {err}");
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcpctl started with log level: {:?}", level);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcpctl").join("gcpctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcpctl").join("gcpctl.log");
    }
    PathBuf::from("gcpctl.log")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    // Config management runs without a client or network access
    if let Commands::Config { command } = args.command {
        return commands::config::run(command, &mut config);
    }

    let project = config
        .effective_project(args.project.as_deref())
        .context(
            "No GCP project configured. Use --project, 'gcpctl config set project <id>', \
             or set GOOGLE_CLOUD_PROJECT",
        )?;

    tracing::info!("Using project: {}", project);

    let credentials = match &args.access_token {
        Some(token) => GcpCredentials::from_static_token(token),
        None => GcpCredentials::new().await?,
    };
    let client = GcpClient::with_credentials(&project, credentials, Endpoints::from_env())?;

    // Ctrl-C requests cooperative cancellation between page fetches
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("cancellation requested");
                cancel.cancel();
            }
        });
    }

    let ctx = CommandContext {
        client,
        cancel,
        format: args.output.or(config.output).unwrap_or_default(),
        poll_timeout: config.poll_timeout_secs.map(Duration::from_secs),
    };

    match args.command {
        Commands::Bq { command } => commands::bigquery::run(command, &ctx).await,
        Commands::Pubsub { command } => commands::pubsub::run(command, &ctx).await,
        Commands::Logging { command } => commands::logging::run(command, &ctx).await,
        Commands::Storage { command } => commands::storage::run(command, &ctx).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
