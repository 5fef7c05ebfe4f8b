use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::BackendError;
use crate::models::ProviderKind;
use crate::services::backends::{ensure_success, non_empty, probe};
use crate::services::encoder::EncodedDocument;
use crate::services::extractor::ExtractionBackend;

const LABEL: &str = "local AI models";

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    images: Vec<String>,
    prompt: String,
}

/// Self-hosted OCR service. It answers `/analyze` with an
/// `{"invoices": [...], "explanation": ...}` envelope, which the response
/// parser unwraps.
pub struct LocalBackend {
    client: Client,
    base_url: String,
}

impl LocalBackend {
    pub fn new(client: Client, base_url: &str) -> Self {
        LocalBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

#[async_trait]
impl ExtractionBackend for LocalBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> bool {
        probe(&self.client, LABEL, &self.health_url()).await
    }

    async fn extract(&self, document: &EncodedDocument, prompt: &str) -> Result<String, BackendError> {
        let request = AnalyzeRequest {
            images: vec![document.data_url()],
            prompt: prompt.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(LABEL, response).await?;
        non_empty(LABEL, Some(response.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let backend = LocalBackend::new(Client::new(), "http://localhost:5000/");
        assert_eq!(backend.endpoint(), "http://localhost:5000");
        assert_eq!(backend.health_url(), "http://localhost:5000/health");
    }

    #[test]
    fn test_request_body() {
        let request = AnalyzeRequest {
            images: vec!["data:image/png;base64,AAAA".to_string()],
            prompt: "extract".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["images"][0], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_unreachable_backend_fails_health_check() {
        // Port 9 (discard) is not expected to serve HTTP.
        let backend = LocalBackend::new(Client::new(), "http://127.0.0.1:9");
        assert!(!backend.health_check().await);
    }
}
