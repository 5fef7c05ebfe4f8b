use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::BackendError;
use crate::models::ProviderKind;
use crate::services::backends::{ensure_success, non_empty};
use crate::services::encoder::EncodedDocument;
use crate::services::extractor::ExtractionBackend;

pub const HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const HUGGINGFACE_MODEL: &str = "microsoft/trocr-large-printed";

const LABEL: &str = "Hugging Face";

/// Hosted image-to-text inference. These models take the raw document bytes
/// and no instruction text, so the prompt does not travel with the request.
pub struct HuggingFaceBackend {
    client: Client,
    base_url: String,
    model: String,
    token: String,
}

impl HuggingFaceBackend {
    pub fn new(client: Client, token: String, model: Option<String>) -> Self {
        HuggingFaceBackend {
            client,
            base_url: HUGGINGFACE_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| HUGGINGFACE_MODEL.to_string()),
            token,
        }
    }
}

fn unwrap_response(body: Value) -> Result<String, BackendError> {
    let text = match body {
        Value::Array(items) => items.into_iter().next().map(generated_text),
        Value::Object(_) => Some(generated_text(body)),
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    };
    non_empty(LABEL, text)
}

fn generated_text(item: Value) -> String {
    match item.get("generated_text").and_then(Value::as_str) {
        Some(text) => text.to_string(),
        None => item.to_string(),
    }
}

#[async_trait]
impl ExtractionBackend for HuggingFaceBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    fn label(&self) -> &str {
        LABEL
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn extract(&self, document: &EncodedDocument, _prompt: &str) -> Result<String, BackendError> {
        let bytes = document.decode()?;
        let url = format!("{}/models/{}", self.base_url, self.model);
        debug!(%url, bytes = bytes.len(), "Calling Hugging Face inference");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, document.mime_type)
            .body(bytes)
            .send()
            .await?;
        let response = ensure_success(LABEL, response).await?;
        let body: Value = response.json().await?;
        unwrap_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_array_form() {
        let body = json!([{"generated_text": "{\"vendor\": \"A\"}"}]);
        assert_eq!(unwrap_response(body).unwrap(), "{\"vendor\": \"A\"}");
    }

    #[test]
    fn test_unwrap_object_form() {
        let body = json!({"generated_text": "TAX INVOICE 27AAPFU0939F1ZV"});
        assert_eq!(unwrap_response(body).unwrap(), "TAX INVOICE 27AAPFU0939F1ZV");
    }

    #[test]
    fn test_unwrap_unknown_object_falls_back_to_json_text() {
        let body = json!({"vendor": "A"});
        assert_eq!(unwrap_response(body).unwrap(), "{\"vendor\":\"A\"}");
    }

    #[test]
    fn test_unwrap_empty() {
        assert!(unwrap_response(json!([])).is_err());
        assert!(unwrap_response(Value::Null).is_err());
    }
}
