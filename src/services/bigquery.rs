//! BigQuery v2 - datasets, tables, and query jobs.

use std::io::{BufRead, Write};
use std::time::Duration;

use serde_json::{json, Map, Value};

use super::{get_optional, with_query};
use crate::gcp::client::GcpClient;
use crate::gcp::error::{GcpError, ResourceContext};
use crate::gcp::pager::{fetch_all, CancelFlag, Page};
use crate::gcp::poll::poll_until_done;
use crate::prompt::Confirmer;

/// Outcome of an update-or-create on a dataset.
#[derive(Debug)]
pub enum UpsertOutcome {
    Updated(Value),
    Created(Value),
}

/// List all datasets in the project, optionally narrowed by a label filter
/// expression such as `labels.dept:eng`.
pub async fn list_datasets(
    client: &GcpClient,
    label_filter: Option<&str>,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = client.bigquery_url("datasets");
    let scope = client.project_id.clone();

    fetch_all(&scope, cancel, |token| {
        let url = with_query(
            &base,
            &[("filter", label_filter), ("pageToken", token.as_deref())],
        );
        let scope = scope.clone();
        async move {
            let response = client.get(&url).await.for_resource("datasets", &scope)?;
            Ok(Page::from_response(&response, "datasets"))
        }
    })
    .await
}

/// Fetch one dataset. `Ok(None)` when it does not exist.
pub async fn get_dataset(
    client: &GcpClient,
    dataset_id: &str,
) -> Result<Option<Value>, GcpError> {
    let url = client.bigquery_url(&format!("datasets/{dataset_id}"));
    get_optional(client, &url).await
}

/// Create a dataset. An existing dataset with the same id is a conflict.
pub async fn insert_dataset(
    client: &GcpClient,
    dataset_id: &str,
    location: Option<&str>,
    description: Option<&str>,
) -> Result<Value, GcpError> {
    let mut body = Map::new();
    body.insert(
        "datasetReference".to_string(),
        json!({
            "projectId": client.project_id,
            "datasetId": dataset_id,
        }),
    );
    if let Some(location) = location {
        body.insert("location".to_string(), json!(location));
    }
    if let Some(description) = description {
        body.insert("description".to_string(), json!(description));
    }

    client
        .post(&client.bigquery_url("datasets"), Some(&Value::Object(body)))
        .await
        .for_resource(&format!("dataset {dataset_id}"), &client.project_id)
}

/// Patch the dataset description, creating the dataset when it does not
/// exist. Branches on the lookup outcome rather than treating a 404 as a
/// failure.
pub async fn update_dataset(
    client: &GcpClient,
    dataset_id: &str,
    description: &str,
) -> Result<UpsertOutcome, GcpError> {
    match get_dataset(client, dataset_id).await? {
        Some(_) => {
            let url = client.bigquery_url(&format!("datasets/{dataset_id}"));
            let patched = client
                .patch(&url, &json!({ "description": description }))
                .await
                .for_resource(&format!("dataset {dataset_id}"), &client.project_id)?;
            Ok(UpsertOutcome::Updated(patched))
        }
        None => {
            let created = insert_dataset(client, dataset_id, None, Some(description)).await?;
            Ok(UpsertOutcome::Created(created))
        }
    }
}

/// Whether the dataset currently holds any tables.
pub async fn dataset_is_empty(client: &GcpClient, dataset_id: &str) -> Result<bool, GcpError> {
    let url = with_query(
        &client.bigquery_dataset_url(dataset_id, "tables"),
        &[("maxResults", Some("1"))],
    );
    let response = client
        .get(&url)
        .await
        .for_resource(&format!("dataset {dataset_id}"), &client.project_id)?;
    Ok(Page::from_response(&response, "tables").items.is_empty())
}

/// Delete a dataset. A non-empty dataset passes through the confirmation
/// gate; accepting deletes the dataset together with its tables. Returns
/// whether the delete was issued.
pub async fn delete_dataset_guarded<R: BufRead, W: Write>(
    client: &GcpClient,
    dataset_id: &str,
    confirmer: &mut Confirmer<R, W>,
) -> Result<bool, GcpError> {
    let mut delete_contents = false;

    if !dataset_is_empty(client, dataset_id).await? {
        let prompt = format!(
            "Dataset {dataset_id} in {} is not empty. Delete it and all its tables?",
            client.project_id
        );
        if !confirmer.confirm(&prompt)? {
            tracing::info!("deletion of dataset {} declined", dataset_id);
            return Ok(false);
        }
        delete_contents = true;
    }

    let url = with_query(
        &client.bigquery_url(&format!("datasets/{dataset_id}")),
        &[(
            "deleteContents",
            delete_contents.then_some("true"),
        )],
    );
    client
        .delete(&url)
        .await
        .for_resource(&format!("dataset {dataset_id}"), &client.project_id)?;
    Ok(true)
}

/// List all tables of a dataset.
pub async fn list_tables(
    client: &GcpClient,
    dataset_id: &str,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let base = client.bigquery_dataset_url(dataset_id, "tables");
    let scope = format!("{}/{}", client.project_id, dataset_id);

    fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("pageToken", token.as_deref())]);
        let resource = format!("dataset {dataset_id}");
        async move {
            let response = client
                .get(&url)
                .await
                .for_resource(&resource, &client.project_id)?;
            Ok(Page::from_response(&response, "tables"))
        }
    })
    .await
}

/// Fetch one table. `Ok(None)` when it does not exist.
pub async fn get_table(
    client: &GcpClient,
    dataset_id: &str,
    table_id: &str,
) -> Result<Option<Value>, GcpError> {
    let url = client.bigquery_dataset_url(dataset_id, &format!("tables/{table_id}"));
    get_optional(client, &url).await
}

/// Submit a standard-SQL query job. Returns the job object; the job id lives
/// at `jobReference.jobId`.
pub async fn submit_query_job(client: &GcpClient, sql: &str) -> Result<Value, GcpError> {
    let body = json!({
        "configuration": {
            "query": {
                "query": sql,
                "useLegacySql": false,
            }
        }
    });

    client
        .post(&client.bigquery_url("jobs"), Some(&body))
        .await
        .for_resource("query job", &client.project_id)
}

/// Fetch the current state of a job.
pub async fn get_job(client: &GcpClient, job_id: &str) -> Result<Value, GcpError> {
    let url = client.bigquery_url(&format!("jobs/{job_id}"));
    client
        .get(&url)
        .await
        .for_resource(&format!("job {job_id}"), &client.project_id)
}

fn job_state(job: &Value) -> &str {
    job.pointer("/status/state").and_then(|v| v.as_str()).unwrap_or("")
}

/// Block until `job_id` reaches the `DONE` state, re-fetching its status at
/// a fixed interval. A job that finished with an error surfaces the server's
/// error message.
pub async fn wait_for_job(
    client: &GcpClient,
    job_id: &str,
    timeout: Option<Duration>,
) -> Result<Value, GcpError> {
    let job = poll_until_done(
        &format!("job {job_id}"),
        timeout,
        || get_job(client, job_id),
        |job| job_state(job) == "DONE",
    )
    .await?;

    if let Some(error) = job.pointer("/status/errorResult") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(GcpError::InvalidArgument(format!(
            "job {job_id} failed: {message}"
        )));
    }

    Ok(job)
}

/// Submit a query and wait for it to finish.
pub async fn run_query(
    client: &GcpClient,
    sql: &str,
    timeout: Option<Duration>,
) -> Result<Value, GcpError> {
    let job = submit_query_job(client, sql).await?;

    let job_id = job
        .pointer("/jobReference/jobId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GcpError::EmptyResponse {
            scope: client.project_id.clone(),
        })?
        .to_string();

    tracing::info!("submitted query job {}", job_id);
    wait_for_job(client, &job_id, timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_state_reads_nested_status() {
        let job = json!({ "status": { "state": "RUNNING" } });
        assert_eq!(job_state(&job), "RUNNING");
        assert_eq!(job_state(&json!({})), "");
    }
}
