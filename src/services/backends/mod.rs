pub mod chat;
pub mod gemini;
pub mod huggingface;
pub mod local;

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::BackendError;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

pub fn http_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Passes successful responses through and classifies the rest.
pub(crate) async fn ensure_success(
    provider: &str,
    response: Response,
) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_status(provider, status, body))
}

pub(crate) fn classify_status(provider: &str, status: StatusCode, body: String) -> BackendError {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => BackendError::Unavailable(format!(
            "{provider} model is warming up. Please wait a minute and try again."
        )),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Rejected {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        },
        _ => BackendError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        },
    }
}

pub(crate) async fn probe(client: &Client, provider: &str, url: &str) -> bool {
    match client.get(url).timeout(HEALTH_TIMEOUT).send().await {
        Ok(resp) => {
            if resp.status().is_success() {
                info!(provider, url, "Backend is reachable");
                true
            } else {
                warn!(provider, url, status = %resp.status(), "Backend returned non-OK status");
                false
            }
        }
        Err(e) => {
            warn!(provider, url, error = %e, "Backend not reachable");
            false
        }
    }
}

pub(crate) fn non_empty(provider: &str, content: Option<String>) -> Result<String, BackendError> {
    content
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BackendError::EmptyResponse(provider.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status("Hugging Face", StatusCode::SERVICE_UNAVAILABLE, String::new()),
            BackendError::Unavailable(_)
        ));
        assert!(matches!(
            classify_status("Groq", StatusCode::UNAUTHORIZED, "bad key".to_string()),
            BackendError::Rejected { status: 401, .. }
        ));
        assert!(matches!(
            classify_status("Groq", StatusCode::TOO_MANY_REQUESTS, String::new()),
            BackendError::Status { status: 429, .. }
        ));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("x", Some("  hi ".to_string())).unwrap(), "hi");
        assert!(non_empty("x", Some("   ".to_string())).is_err());
        assert!(non_empty("x", None).is_err());
    }
}
