//! Cloud Storage subcommands.

use anyhow::Result;
use clap::Subcommand;

use super::CommandContext;
use crate::output::{col, print_items, print_value, Column};
use crate::prompt::Confirmer;
use crate::services::require;
use crate::services::storage;

const BUCKET_COLUMNS: &[Column] = &[
    col("BUCKET", "name"),
    col("LOCATION", "location"),
    col("CREATED", "timeCreated"),
];

const OBJECT_COLUMNS: &[Column] = &[
    col("OBJECT", "name"),
    col("SIZE", "size"),
    col("UPDATED", "updated"),
];

#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// List buckets of the project
    ListBuckets {
        /// Restrict to bucket names with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Show a single bucket
    DescribeBucket { bucket: String },
    /// Delete a bucket. Prompts when the bucket still has objects
    DeleteBucket {
        bucket: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// List objects of a bucket
    ListObjects {
        bucket: String,
        /// Restrict to object names with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Show a single object's metadata
    DescribeObject { bucket: String, object: String },
    /// Delete a single object
    DeleteObject { bucket: String, object: String },
}

pub async fn run(command: StorageCommand, ctx: &CommandContext) -> Result<()> {
    match command {
        StorageCommand::ListBuckets { prefix } => {
            let buckets =
                storage::list_buckets(&ctx.client, prefix.as_deref(), &ctx.cancel).await?;
            print_items(&buckets, BUCKET_COLUMNS, ctx.format);
        }
        StorageCommand::DescribeBucket { bucket } => {
            let found = storage::get_bucket(&ctx.client, &bucket).await?;
            let bucket = require(found, &format!("bucket {bucket}"), &ctx.client.project_id)?;
            print_value(&bucket, ctx.format);
        }
        StorageCommand::DeleteBucket { bucket, force } => {
            let mut confirmer = Confirmer::from_terminal(force);
            if storage::delete_bucket_guarded(&ctx.client, &bucket, &ctx.cancel, &mut confirmer)
                .await?
            {
                eprintln!("Deleted bucket {bucket}");
            } else {
                eprintln!("Aborted");
            }
        }
        StorageCommand::ListObjects { bucket, prefix } => {
            let objects =
                storage::list_objects(&ctx.client, &bucket, prefix.as_deref(), &ctx.cancel)
                    .await?;
            print_items(&objects, OBJECT_COLUMNS, ctx.format);
        }
        StorageCommand::DescribeObject { bucket, object } => {
            let found = storage::get_object(&ctx.client, &bucket, &object).await?;
            let object = require(
                found,
                &format!("object {bucket}/{object}"),
                &ctx.client.project_id,
            )?;
            print_value(&object, ctx.format);
        }
        StorageCommand::DeleteObject { bucket, object } => {
            storage::delete_object(&ctx.client, &bucket, &object).await?;
            eprintln!("Deleted object {bucket}/{object}");
        }
    }

    Ok(())
}
