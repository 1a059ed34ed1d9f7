//! Cloud Logging v2 - log entries and logs.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use futures::TryStreamExt;
use serde_json::{json, Map, Value};

use super::with_query;
use crate::gcp::client::GcpClient;
use crate::gcp::error::{GcpError, ResourceContext};
use crate::gcp::pager::{fetch_all, stream_pages, CancelFlag, Page};

/// Log entry severities, ordered. Closed set per the Logging API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Severity {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }
}

/// Criteria narrowing an entry listing: either a free-form filter
/// expression, or structured constraints (minimum severity, time bounds).
/// The two styles are mutually exclusive.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub expression: Option<String>,
    pub min_severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Translate the criteria into the wire-level filter string. Validation
    /// happens here, before any request is issued.
    pub fn build(&self) -> Result<Option<String>, GcpError> {
        let has_structured =
            self.min_severity.is_some() || self.since.is_some() || self.until.is_some();

        if let Some(expression) = &self.expression {
            if has_structured {
                return Err(GcpError::InvalidArgument(
                    "--filter cannot be combined with --min-severity/--since/--until".to_string(),
                ));
            }
            return Ok(Some(expression.clone()));
        }

        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(GcpError::InvalidArgument(format!(
                    "--since ({since}) is later than --until ({until})"
                )));
            }
        }

        let mut clauses = Vec::new();
        if let Some(severity) = self.min_severity {
            clauses.push(format!("severity>={}", severity.as_str()));
        }
        if let Some(since) = self.since {
            clauses.push(format!("timestamp>=\"{}\"", since.to_rfc3339()));
        }
        if let Some(until) = self.until {
            clauses.push(format!("timestamp<=\"{}\"", until.to_rfc3339()));
        }

        if clauses.is_empty() {
            Ok(None)
        } else {
            Ok(Some(clauses.join(" AND ")))
        }
    }
}

/// List log entries of the project matching the filter criteria. The filter
/// is validated and translated once, before the first request.
///
/// Entry listings can run long, so pages are consumed through the streaming
/// accessor: cancellation between pages ends the listing cleanly with the
/// entries fetched so far.
pub async fn list_entries(
    client: &GcpClient,
    filter: &EntryFilter,
    cancel: &CancelFlag,
) -> Result<Vec<Value>, GcpError> {
    let filter_string = filter.build()?;
    let url = client.logging_url("entries:list");
    let scope = client.project_id.clone();

    stream_pages(scope, cancel.clone(), move |token| {
        let mut body = Map::new();
        body.insert(
            "resourceNames".to_string(),
            json!([format!("projects/{}", client.project_id)]),
        );
        if let Some(filter) = &filter_string {
            body.insert("filter".to_string(), json!(filter));
        }
        if let Some(token) = token {
            body.insert("pageToken".to_string(), json!(token));
        }
        let url = url.clone();
        async move {
            let response = client
                .post(&url, Some(&Value::Object(body)))
                .await
                .for_resource("log entries", &client.project_id)?;
            Ok(Page::from_response(&response, "entries"))
        }
    })
    .try_fold(Vec::new(), |mut entries, page| async move {
        entries.extend(page.items);
        Ok(entries)
    })
    .await
}

/// List the log names of the project.
pub async fn list_logs(client: &GcpClient, cancel: &CancelFlag) -> Result<Vec<String>, GcpError> {
    let base = client.logging_project_url("logs");
    let scope = client.project_id.clone();

    let items = fetch_all(&scope, cancel, |token| {
        let url = with_query(&base, &[("pageToken", token.as_deref())]);
        let scope = scope.clone();
        async move {
            let response = client.get(&url).await.for_resource("logs", &scope)?;
            Ok(Page::from_response(&response, "logNames"))
        }
    })
    .await?;

    Ok(items
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect())
}

/// Delete all entries of a log. The log id is a bare name
/// (e.g. `my-app-log`) or a full resource name; either way the path segment
/// must be URL-encoded.
pub async fn delete_log(client: &GcpClient, log_id: &str) -> Result<(), GcpError> {
    let url = client.logging_project_url(&format!("logs/{}", urlencoding::encode(log_id)));
    client
        .delete(&url)
        .await
        .for_resource(&format!("log {log_id}"), &client.project_id)?;
    Ok(())
}
