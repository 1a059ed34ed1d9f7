//! GCP Authentication
//!
//! Handles authentication using Application Default Credentials (ADC) or a
//! caller-supplied static access token (scripting and emulator use).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::TokenProvider;
use tokio::sync::RwLock;

use super::error::GcpError;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where access tokens come from.
#[derive(Clone)]
enum TokenSource {
    /// Application Default Credentials via `gcp_auth`.
    Adc(Arc<dyn TokenProvider>),
    /// A fixed token, e.g. from `gcloud auth print-access-token` or an
    /// emulator that accepts anything.
    Static(String),
}

/// GCP credentials holder with token caching
#[derive(Clone)]
pub struct GcpCredentials {
    source: TokenSource,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl GcpCredentials {
    /// Create new GCP credentials using Application Default Credentials
    pub async fn new() -> Result<Self, GcpError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| GcpError::Auth(e.to_string()))?;

        Ok(Self {
            source: TokenSource::Adc(provider),
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Create credentials around a fixed access token.
    pub fn from_static_token(token: &str) -> Self {
        Self {
            source: TokenSource::Static(token.to_string()),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls.
    /// Checks token expiry before returning a cached token.
    pub async fn get_token(&self) -> Result<String, GcpError> {
        let provider = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Adc(provider) => provider,
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = provider
            .token(DEFAULT_SCOPES)
            .await
            .map_err(|e| GcpError::Auth(e.to_string()))?;

        let token_str = token.as_str().to_string();
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token_str.clone(),
                expires_at,
            });
        }

        Ok(token_str)
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format.
/// Project IDs must be 6-30 characters, lowercase letters, digits, and
/// hyphens, starting with a letter and not ending with a hyphen.
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    if !project.starts_with(|c: char| c.is_ascii_lowercase()) || project.ends_with('-') {
        return false;
    }

    project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

const PROJECT_ENV_VARS: &[&str] = &[
    "CLOUDSDK_CORE_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "GCLOUD_PROJECT",
];

/// Read the default project: environment variables first, then the gcloud
/// configuration files. Invalid project IDs are skipped with a warning.
pub fn get_default_project() -> Option<String> {
    for var in PROJECT_ENV_VARS {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;

    if let Ok(content) = std::fs::read_to_string(config_dir.join("properties")) {
        if let Some(project) = project_from_gcloud_ini(&content) {
            return Some(project);
        }
    }

    // Fall back to the active named configuration
    let active = std::fs::read_to_string(config_dir.join("active_config")).ok()?;
    let config_name = active.trim();

    // Security: validate config name to prevent path traversal
    if !config_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", config_name));
    let content = std::fs::read_to_string(config_path).ok()?;
    project_from_gcloud_ini(&content)
}

/// Scan gcloud's INI-style config for `project = ...` in the `[core]`
/// section. A file without section headers (the legacy `properties` layout
/// variant) is treated as already being in `[core]`.
fn project_from_gcloud_ini(content: &str) -> Option<String> {
    let mut in_core_section = !content.contains('[');

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_core_section = line == "[core]";
        } else if in_core_section && line.starts_with("project") && line.contains('=') {
            if let Some(value) = line.split('=').nth(1) {
                let project = value.trim().to_string();
                if validate_project_id(&project) {
                    return Some(project);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_project_ids_pass() {
        assert!(validate_project_id("my-project-123"));
        assert!(validate_project_id("abcdef"));
    }

    #[test]
    fn invalid_project_ids_fail() {
        assert!(!validate_project_id("short"));
        assert!(!validate_project_id("Uppercase-project"));
        assert!(!validate_project_id("1starts-with-digit"));
        assert!(!validate_project_id("ends-with-hyphen-"));
        assert!(!validate_project_id(&"x".repeat(31)));
    }

    #[test]
    fn project_parsed_from_core_section() {
        let ini = "[compute]\nzone = us-central1-a\n[core]\n# comment\nproject = my-project\n";
        assert_eq!(
            project_from_gcloud_ini(ini),
            Some("my-project".to_string())
        );
    }

    #[test]
    fn project_outside_core_section_is_ignored() {
        let ini = "[billing]\nproject = other-project\n";
        assert_eq!(project_from_gcloud_ini(ini), None);
    }

    #[test]
    fn sectionless_properties_file_is_treated_as_core() {
        assert_eq!(
            project_from_gcloud_ini("project = flat-project\n"),
            Some("flat-project".to_string())
        );
    }

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let creds = GcpCredentials::from_static_token("test-token");
        assert_eq!(creds.get_token().await.unwrap(), "test-token");
    }
}
