//! HTTP utilities for GCP REST API calls

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use super::error::GcpError;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging.
/// Truncates long responses and strips non-printable characters.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // the cutoff must not land inside a multi-byte character
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull the human-readable message out of a GCP error body:
/// `{"error": {"code": 404, "message": "..."}}`. Falls back to the
/// sanitized raw body when the shape is unexpected.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| sanitize_for_log(body))
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, GcpError> {
        let client = Client::builder()
            .user_agent(concat!("gcpctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value, GcpError> {
        self.dispatch(Method::GET, url, token, None).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(
        &self,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, GcpError> {
        self.dispatch(Method::POST, url, token, body).await
    }

    /// Make a PUT request to a GCP API
    pub async fn put(
        &self,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, GcpError> {
        self.dispatch(Method::PUT, url, token, body).await
    }

    /// Make a PATCH request to a GCP API
    pub async fn patch(&self, url: &str, token: &str, body: &Value) -> Result<Value, GcpError> {
        self.dispatch(Method::PATCH, url, token, Some(body)).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str, token: &str) -> Result<Value, GcpError> {
        self.dispatch(Method::DELETE, url, token, None).await
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<Value, GcpError> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Security: only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&response_body)
            );
            return Err(GcpError::Http {
                status: status.as_u16(),
                message: extract_error_message(&response_body),
            });
        }

        // DELETE and some mutations return 204/empty bodies
        if status == StatusCode::NO_CONTENT || response_body.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated"));
        assert!(out.len() < body.len());
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("a\x07b\nc"), "abc");
    }

    #[test]
    fn sanitize_truncates_multibyte_bodies_on_char_boundaries() {
        // 67 three-byte characters = 201 bytes; byte 200 is mid-character
        let body = "日".repeat(67);
        let out = sanitize_for_log(&body);
        assert!(out.contains("truncated, 201 bytes total"));
    }

    #[test]
    fn error_message_extracted_from_gcp_shape() {
        let body = r#"{"error": {"code": 404, "message": "Topic does not exist"}}"#;
        assert_eq!(extract_error_message(body), "Topic does not exist");
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(
            extract_error_message("gateway exploded"),
            "gateway exploded"
        );
    }
}
