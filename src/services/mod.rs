//! Per-service wrappers over the GCP REST APIs.
//!
//! One module per API; each public function maps to a single REST operation.
//! Listing functions drive [`crate::gcp::pager`], single-resource fetches
//! return `Ok(None)` for a missing resource so callers branch on the outcome
//! instead of catching an error.

pub mod bigquery;
pub mod logging;
pub mod pubsub;
pub mod storage;

use serde_json::Value;

use crate::gcp::client::GcpClient;
use crate::gcp::error::GcpError;

/// Append query parameters to a URL, skipping `None` values and
/// URL-encoding the rest. Respects an existing query string.
pub(crate) fn with_query(url: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (key, value) in params {
        if let Some(value) = value {
            parts.push(format!("{}={}", key, urlencoding::encode(value)));
        }
    }

    if parts.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&{}", url, parts.join("&"))
    } else {
        format!("{}?{}", url, parts.join("&"))
    }
}

/// GET a single resource, mapping HTTP 404 to `Ok(None)`.
pub(crate) async fn get_optional(client: &GcpClient, url: &str) -> Result<Option<Value>, GcpError> {
    match client.get(url).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Turn a lookup outcome into the resource, or a structured not-found error
/// naming it.
pub(crate) fn require(
    found: Option<Value>,
    resource: &str,
    scope: &str,
) -> Result<Value, GcpError> {
    found.ok_or_else(|| GcpError::NotFound {
        resource: resource.to_string(),
        scope: scope.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_query_skips_absent_values() {
        let url = with_query("http://x/b", &[("prefix", None), ("pageToken", Some("A"))]);
        assert_eq!(url, "http://x/b?pageToken=A");
    }

    #[test]
    fn with_query_encodes_values() {
        let url = with_query("http://x/datasets", &[("filter", Some("labels.dept:eng"))]);
        assert_eq!(url, "http://x/datasets?filter=labels.dept%3Aeng");
    }

    #[test]
    fn with_query_appends_to_existing_query() {
        let url = with_query("http://x/b?project=p", &[("prefix", Some("logs/"))]);
        assert_eq!(url, "http://x/b?project=p&prefix=logs%2F");
    }

    #[test]
    fn with_query_leaves_url_untouched_when_empty() {
        assert_eq!(with_query("http://x/b", &[("t", None)]), "http://x/b");
    }

    #[test]
    fn require_names_resource_and_scope() {
        let err = require(None, "dataset raw", "my-project").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dataset raw"));
        assert!(msg.contains("my-project"));
    }
}
