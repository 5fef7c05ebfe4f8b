// OpenAI-compatible chat completions with image input (Groq, Together).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::models::ProviderKind;
use crate::services::backends::{ensure_success, non_empty};
use crate::services::encoder::EncodedDocument;
use crate::services::extractor::ExtractionBackend;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_MODEL: &str = "llama-3.2-11b-vision-preview";
pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";
pub const TOGETHER_MODEL: &str = "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo";

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct ChatCompletionsBackend {
    kind: ProviderKind,
    label: &'static str,
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsBackend {
    pub fn groq(client: Client, api_key: String, model: Option<String>) -> Self {
        ChatCompletionsBackend {
            kind: ProviderKind::Groq,
            label: "Groq AI",
            client,
            base_url: GROQ_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| GROQ_MODEL.to_string()),
            api_key,
        }
    }

    pub fn together(client: Client, api_key: String, model: Option<String>) -> Self {
        ChatCompletionsBackend {
            kind: ProviderKind::Together,
            label: "Together AI",
            client,
            base_url: TOGETHER_BASE_URL.to_string(),
            model: model.unwrap_or_else(|| TOGETHER_MODEL.to_string()),
            api_key,
        }
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let response = ensure_success(self.label, response).await?;
        let body: ChatResponse = response.json().await?;
        unwrap_response(self.label, body)
    }
}

fn build_request(model: &str, prompt: &str, document: Option<&EncodedDocument>) -> ChatRequest {
    let mut content = vec![ContentPart::Text {
        text: prompt.to_string(),
    }];
    if let Some(document) = document {
        content.push(ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: document.data_url(),
            },
        });
    }
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content,
        }],
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

fn unwrap_response(provider: &str, body: ChatResponse) -> Result<String, BackendError> {
    let content = body.choices.into_iter().next().and_then(|c| c.message.content);
    non_empty(provider, content)
}

#[async_trait]
impl ExtractionBackend for ChatCompletionsBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn label(&self) -> &str {
        self.label
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn extract(&self, document: &EncodedDocument, prompt: &str) -> Result<String, BackendError> {
        let request = build_request(&self.model, prompt, Some(document));
        self.send(&request).await
    }

    async fn review(&self, prompt: &str) -> Result<Option<String>, BackendError> {
        let request = build_request(&self.model, prompt, None);
        self.send(&request).await.map(Some)
    }
}
