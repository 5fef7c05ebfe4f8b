use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::ProviderKind;
use crate::services::backends::{ensure_success, non_empty};
use crate::services::encoder::EncodedDocument;
use crate::services::extractor::ExtractionBackend;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

const LABEL: &str = "Google Gemini";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(client: Client, api_key: String, model: Option<String>) -> Self {
        GeminiBackend {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| GEMINI_MODEL.to_string()),
            api_key,
        }
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;
        let response = ensure_success(LABEL, response).await?;
        let body: GenerateResponse = response.json().await?;
        unwrap_response(body)
    }
}

fn build_request(prompt: &str, document: Option<&EncodedDocument>) -> GenerateRequest {
    let mut parts = vec![Part::Text {
        text: prompt.to_string(),
    }];
    if let Some(document) = document {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: document.mime_type.to_string(),
                data: document.data.clone(),
            },
        });
    }
    GenerateRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationConfig { temperature: 0.1 },
    }
}

fn unwrap_response(body: GenerateResponse) -> Result<String, BackendError> {
    let text = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        });
    non_empty(LABEL, text)
}

#[async_trait]
impl ExtractionBackend for GeminiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn extract(&self, document: &EncodedDocument, prompt: &str) -> Result<String, BackendError> {
        self.generate(&build_request(prompt, Some(document))).await
    }

    async fn review(&self, prompt: &str) -> Result<Option<String>, BackendError> {
        self.generate(&build_request(prompt, None)).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let document = EncodedDocument {
            name: "bill.pdf".to_string(),
            mime_type: "application/pdf",
            data: "JVBERi0x".to_string(),
        };
        let value = serde_json::to_value(build_request("extract", Some(&document))).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"parts": [
                    {"text": "extract"},
                    {"inline_data": {"mime_type": "application/pdf", "data": "JVBERi0x"}}
                ]}],
                "generationConfig": {"temperature": 0.1f32}
            })
        );
    }

    #[test]
    fn test_unwrap_joins_text_parts() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"vendor\":"}, {"text": " \"A\"}"}]}}]
        }))
        .unwrap();
        assert_eq!(unwrap_response(body).unwrap(), "{\"vendor\": \"A\"}");
    }

    #[test]
    fn test_unwrap_blocked_response() {
        let body: GenerateResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(matches!(
            unwrap_response(body),
            Err(BackendError::EmptyResponse(_))
        ));
    }
}
