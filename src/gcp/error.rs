//! Typed errors for GCP API calls.
//!
//! Transport failures surface as [`GcpError::Http`] with the raw status code.
//! Call sites that know which resource they were touching convert the status
//! into a category carrying the resource name and scope, via
//! [`ResourceContext::for_resource`].

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("{resource} not found in {scope}")]
    NotFound { resource: String, scope: String },

    #[error("permission denied on {resource} in {scope}. Check your GCP IAM permissions")]
    PermissionDenied { resource: String, scope: String },

    #[error("conflict on {resource} in {scope}. The resource may already exist or be in use")]
    Conflict { resource: String, scope: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("empty response from server while reading {scope}")]
    EmptyResponse { scope: String },

    #[error("operation {operation} did not complete within {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    /// The server handed back the token we just sent. Requesting the same
    /// page twice would loop forever, so the listing aborts instead.
    #[error("server repeated a page token while listing {scope}")]
    RepeatedPageToken { scope: String },

    #[error("authentication failed: {0}. Run 'gcloud auth application-default login'")]
    Auth(String),

    #[error("API request failed: {status} {message}")]
    Http { status: u16, message: String },

    #[error("failed to send request")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read confirmation input")]
    Io(#[from] std::io::Error),

    #[error("failed to parse response JSON")]
    Json(#[from] serde_json::Error),
}

impl GcpError {
    /// Map a raw HTTP error onto the category for `resource` under `scope`.
    /// Non-HTTP errors pass through unchanged.
    pub fn for_resource(self, resource: &str, scope: &str) -> Self {
        let (resource, scope) = (resource.to_string(), scope.to_string());
        match self {
            GcpError::Http { status: 404, .. } => GcpError::NotFound { resource, scope },
            GcpError::Http { status: 401 | 403, .. } => {
                GcpError::PermissionDenied { resource, scope }
            }
            GcpError::Http { status: 409, .. } => GcpError::Conflict { resource, scope },
            GcpError::Http { status: 400, message } => GcpError::InvalidArgument(message),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GcpError::NotFound { .. } | GcpError::Http { status: 404, .. }
        )
    }
}

/// Attach resource/scope context to the error side of a result.
pub trait ResourceContext<T> {
    fn for_resource(self, resource: &str, scope: &str) -> Result<T, GcpError>;
}

impl<T> ResourceContext<T> for Result<T, GcpError> {
    fn for_resource(self, resource: &str, scope: &str) -> Result<T, GcpError> {
        self.map_err(|e| e.for_resource(resource, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> GcpError {
        GcpError::Http {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn status_404_becomes_not_found_with_context() {
        let err = http(404).for_resource("topics/alerts", "my-project");
        match err {
            GcpError::NotFound { resource, scope } => {
                assert_eq!(resource, "topics/alerts");
                assert_eq!(scope, "my-project");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        let msg = http(404)
            .for_resource("topics/alerts", "my-project")
            .to_string();
        assert!(msg.contains("topics/alerts"));
        assert!(msg.contains("my-project"));
    }

    #[test]
    fn status_403_becomes_permission_denied() {
        assert!(matches!(
            http(403).for_resource("b/logs", "my-project"),
            GcpError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn status_409_becomes_conflict() {
        assert!(matches!(
            http(409).for_resource("datasets/raw", "my-project"),
            GcpError::Conflict { .. }
        ));
    }

    #[test]
    fn status_400_keeps_server_message() {
        match http(400).for_resource("jobs", "my-project") {
            GcpError::InvalidArgument(msg) => assert_eq!(msg, "boom"),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_statuses_pass_through() {
        assert!(matches!(
            http(500).for_resource("datasets", "my-project"),
            GcpError::Http { status: 500, .. }
        ));
    }
}
