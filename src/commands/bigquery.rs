//! BigQuery subcommands.

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;

use super::CommandContext;
use crate::output::{col, print_items, print_value, Column};
use crate::prompt::Confirmer;
use crate::services::bigquery::{self, UpsertOutcome};
use crate::services::require;

const DATASET_COLUMNS: &[Column] = &[
    col("DATASET", "datasetReference.datasetId"),
    col("LOCATION", "location"),
];

const TABLE_COLUMNS: &[Column] = &[
    col("TABLE", "tableReference.tableId"),
    col("TYPE", "type"),
    col("CREATED", "creationTime"),
];

#[derive(Subcommand, Debug)]
pub enum BigQueryCommand {
    /// List datasets in the project
    ListDatasets {
        /// Label filter expression, e.g. "labels.dept:eng"
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show a single dataset
    DescribeDataset { dataset: String },
    /// Create a dataset
    CreateDataset {
        dataset: String,
        /// Geographic location, e.g. "EU" or "us-central1"
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a dataset's description, creating the dataset if missing
    UpdateDataset {
        dataset: String,
        #[arg(long)]
        description: String,
    },
    /// Delete a dataset. Prompts when the dataset still has tables
    DeleteDataset {
        dataset: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// List tables of a dataset
    ListTables { dataset: String },
    /// Show a single table
    DescribeTable { dataset: String, table: String },
    /// Submit a standard-SQL query job and wait for it to finish
    Query {
        sql: String,
        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show the status of a job
    JobStatus { job: String },
}

pub async fn run(command: BigQueryCommand, ctx: &CommandContext) -> Result<()> {
    match command {
        BigQueryCommand::ListDatasets { filter } => {
            let datasets =
                bigquery::list_datasets(&ctx.client, filter.as_deref(), &ctx.cancel).await?;
            print_items(&datasets, DATASET_COLUMNS, ctx.format);
        }
        BigQueryCommand::DescribeDataset { dataset } => {
            let found = bigquery::get_dataset(&ctx.client, &dataset).await?;
            let dataset = require(
                found,
                &format!("dataset {dataset}"),
                &ctx.client.project_id,
            )?;
            print_value(&dataset, ctx.format);
        }
        BigQueryCommand::CreateDataset {
            dataset,
            location,
            description,
        } => {
            let created = bigquery::insert_dataset(
                &ctx.client,
                &dataset,
                location.as_deref(),
                description.as_deref(),
            )
            .await?;
            print_value(&created, ctx.format);
        }
        BigQueryCommand::UpdateDataset {
            dataset,
            description,
        } => match bigquery::update_dataset(&ctx.client, &dataset, &description).await? {
            UpsertOutcome::Updated(value) => print_value(&value, ctx.format),
            UpsertOutcome::Created(value) => {
                eprintln!("Dataset {dataset} did not exist; created it");
                print_value(&value, ctx.format);
            }
        },
        BigQueryCommand::DeleteDataset { dataset, force } => {
            let mut confirmer = Confirmer::from_terminal(force);
            if bigquery::delete_dataset_guarded(&ctx.client, &dataset, &mut confirmer).await? {
                eprintln!("Deleted dataset {dataset}");
            } else {
                eprintln!("Aborted");
            }
        }
        BigQueryCommand::ListTables { dataset } => {
            let tables = bigquery::list_tables(&ctx.client, &dataset, &ctx.cancel).await?;
            print_items(&tables, TABLE_COLUMNS, ctx.format);
        }
        BigQueryCommand::DescribeTable { dataset, table } => {
            let found = bigquery::get_table(&ctx.client, &dataset, &table).await?;
            let table = require(
                found,
                &format!("table {dataset}.{table}"),
                &ctx.client.project_id,
            )?;
            print_value(&table, ctx.format);
        }
        BigQueryCommand::Query { sql, timeout_secs } => {
            let timeout = timeout_secs.map(Duration::from_secs).or(ctx.poll_timeout);
            let job = bigquery::run_query(&ctx.client, &sql, timeout).await?;
            print_value(&job, ctx.format);
        }
        BigQueryCommand::JobStatus { job } => {
            let job = bigquery::get_job(&ctx.client, &job).await?;
            print_value(&job, ctx.format);
        }
    }

    Ok(())
}
