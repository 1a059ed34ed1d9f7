//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication,
//! HTTP functionality, and per-service URL construction.

use serde_json::Value;

use super::auth::GcpCredentials;
use super::error::GcpError;
use super::http::GcpHttpClient;

/// Service endpoint bases. Overridable for emulators and tests.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub bigquery: String,
    pub pubsub: String,
    pub logging: String,
    pub storage: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            bigquery: "https://bigquery.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
            logging: "https://logging.googleapis.com".to_string(),
            storage: "https://storage.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Production endpoints, with the emulator host environment variables
    /// honored where the official emulators define them.
    pub fn from_env() -> Self {
        let mut endpoints = Self::default();
        if let Ok(host) = std::env::var("BIGQUERY_EMULATOR_HOST") {
            endpoints.bigquery = ensure_scheme(&host);
        }
        if let Ok(host) = std::env::var("PUBSUB_EMULATOR_HOST") {
            endpoints.pubsub = ensure_scheme(&host);
        }
        if let Ok(host) = std::env::var("STORAGE_EMULATOR_HOST") {
            endpoints.storage = ensure_scheme(&host);
        }
        endpoints
    }

    /// Point every service at one base URL (mock servers).
    pub fn all(base: &str) -> Self {
        Self {
            bigquery: base.to_string(),
            pubsub: base.to_string(),
            logging: base.to_string(),
            storage: base.to_string(),
        }
    }
}

/// Emulator hosts are usually bare `host:port`
fn ensure_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", host.trim_end_matches('/'))
    }
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client using Application Default Credentials
    pub async fn new(project_id: &str) -> Result<Self, GcpError> {
        let credentials = GcpCredentials::new().await?;
        Self::with_credentials(project_id, credentials, Endpoints::from_env())
    }

    /// Assemble a client from explicit parts
    pub fn with_credentials(
        project_id: &str,
        credentials: GcpCredentials,
        endpoints: Endpoints,
    ) -> Result<Self, GcpError> {
        Ok(Self {
            credentials,
            http: GcpHttpClient::new()?,
            project_id: project_id.to_string(),
            endpoints,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String, GcpError> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value, GcpError> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, GcpError> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(&self, url: &str, body: Option<&Value>) -> Result<Value, GcpError> {
        let token = self.get_token().await?;
        self.http.put(url, &token, body).await
    }

    /// Make a PATCH request to a GCP API
    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value, GcpError> {
        let token = self.get_token().await?;
        self.http.patch(url, &token, body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value, GcpError> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }

    // =========================================================================
    // BigQuery v2 API helpers
    // =========================================================================

    /// Build a project-scoped BigQuery v2 URL
    pub fn bigquery_url(&self, path: &str) -> String {
        format!(
            "{}/bigquery/v2/projects/{}/{}",
            self.endpoints.bigquery, self.project_id, path
        )
    }

    /// Build a dataset-scoped BigQuery v2 URL
    pub fn bigquery_dataset_url(&self, dataset_id: &str, path: &str) -> String {
        self.bigquery_url(&format!("datasets/{}/{}", dataset_id, path))
    }

    // =========================================================================
    // Pub/Sub v1 API helpers
    // =========================================================================

    /// Build a project-scoped Pub/Sub v1 URL
    pub fn pubsub_url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.endpoints.pubsub, self.project_id, path
        )
    }

    /// Build a Pub/Sub v1 URL from a full resource name
    /// (`projects/{project}/subscriptions/{name}`)
    pub fn pubsub_resource_url(&self, full_name: &str) -> String {
        format!("{}/v1/{}", self.endpoints.pubsub, full_name)
    }

    /// Full Pub/Sub topic name for this project
    pub fn topic_name(&self, topic_id: &str) -> String {
        format!("projects/{}/topics/{}", self.project_id, topic_id)
    }

    /// Full Pub/Sub subscription name for this project
    pub fn subscription_name(&self, subscription_id: &str) -> String {
        format!(
            "projects/{}/subscriptions/{}",
            self.project_id, subscription_id
        )
    }

    // =========================================================================
    // Cloud Logging v2 API helpers
    // =========================================================================

    /// Build a Cloud Logging v2 URL
    pub fn logging_url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.endpoints.logging, path)
    }

    /// Build a project-scoped Cloud Logging v2 URL
    pub fn logging_project_url(&self, path: &str) -> String {
        self.logging_url(&format!("projects/{}/{}", self.project_id, path))
    }

    // =========================================================================
    // Cloud Storage v1 API helpers
    // =========================================================================

    /// Build a Cloud Storage v1 URL
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.endpoints.storage, path)
    }

    /// Build a Cloud Storage bucket URL
    pub fn storage_bucket_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}", bucket))
    }

    /// Build a Cloud Storage objects URL
    pub fn storage_objects_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}/o", bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GcpClient {
        GcpClient::with_credentials(
            "my-project",
            GcpCredentials::from_static_token("t"),
            Endpoints::default(),
        )
        .unwrap()
    }

    #[test]
    fn bigquery_urls_are_project_scoped() {
        assert_eq!(
            client().bigquery_url("datasets"),
            "https://bigquery.googleapis.com/bigquery/v2/projects/my-project/datasets"
        );
        assert_eq!(
            client().bigquery_dataset_url("raw", "tables"),
            "https://bigquery.googleapis.com/bigquery/v2/projects/my-project/datasets/raw/tables"
        );
    }

    #[test]
    fn pubsub_names_are_fully_qualified() {
        let c = client();
        assert_eq!(c.topic_name("alerts"), "projects/my-project/topics/alerts");
        assert_eq!(
            c.pubsub_resource_url("projects/my-project/subscriptions/sub-1"),
            "https://pubsub.googleapis.com/v1/projects/my-project/subscriptions/sub-1"
        );
    }

    #[test]
    fn storage_urls_follow_v1_layout() {
        let c = client();
        assert_eq!(
            c.storage_objects_url("my-bucket"),
            "https://storage.googleapis.com/storage/v1/b/my-bucket/o"
        );
    }

    #[test]
    fn emulator_host_gets_http_scheme() {
        assert_eq!(ensure_scheme("localhost:8085"), "http://localhost:8085");
        assert_eq!(
            ensure_scheme("http://localhost:8085/"),
            "http://localhost:8085"
        );
    }
}
