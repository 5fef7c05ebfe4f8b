use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::models::{ProviderKind, Settings};
use crate::services::backends::chat::ChatCompletionsBackend;
use crate::services::backends::gemini::GeminiBackend;
use crate::services::backends::huggingface::HuggingFaceBackend;
use crate::services::backends::local::LocalBackend;
use crate::services::backends::http_client;
use crate::services::extractor::{ExtractionBackend, InvoiceExtractor};

static ACTIVE: OnceLock<Arc<InvoiceExtractor>> = OnceLock::new();

/// Maps a configuration value onto a provider, falling back to the default.
pub fn resolve_kind(value: Option<&str>) -> ProviderKind {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => ProviderKind::default(),
        Some(raw) => ProviderKind::parse(raw).unwrap_or_else(|| {
            warn!(
                value = raw,
                fallback = %ProviderKind::default(),
                "Unknown AI provider, using default"
            );
            ProviderKind::default()
        }),
    }
}

pub fn build_backend(settings: &Settings) -> Result<Arc<dyn ExtractionBackend>, ProviderError> {
    let kind = settings.provider;
    let client = http_client(settings.request_timeout_secs)?;
    let model = settings.model.clone();

    let api_key = || {
        settings
            .api_key(kind)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: kind.to_string(),
                reason: format!("missing {}", api_key_variable(kind)),
            })
    };

    let backend: Arc<dyn ExtractionBackend> = match kind {
        ProviderKind::Local => Arc::new(LocalBackend::new(client, &settings.local_url)),
        ProviderKind::Gemini => Arc::new(GeminiBackend::new(client, api_key()?, model)),
        ProviderKind::Groq => Arc::new(ChatCompletionsBackend::groq(client, api_key()?, model)),
        ProviderKind::Together => {
            Arc::new(ChatCompletionsBackend::together(client, api_key()?, model))
        }
        ProviderKind::HuggingFace => Arc::new(HuggingFaceBackend::new(client, api_key()?, model)),
    };
    Ok(backend)
}

pub fn api_key_variable(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Local => "",
        ProviderKind::Gemini => "GEMINI_API_KEY",
        ProviderKind::Groq => "GROQ_API_KEY",
        ProviderKind::Together => "TOGETHER_API_KEY",
        ProviderKind::HuggingFace => "HUGGINGFACE_TOKEN",
    }
}

/// Installs the process-wide extractor. Later calls return the first instance.
pub fn install(settings: &Settings) -> Result<Arc<InvoiceExtractor>, ProviderError> {
    if let Some(existing) = ACTIVE.get() {
        return Ok(existing.clone());
    }
    let backend = build_backend(settings)?;
    info!(
        provider = %backend.kind(),
        endpoint = backend.endpoint(),
        "Using AI provider"
    );
    let extractor = Arc::new(InvoiceExtractor::new(backend, settings.advisory_review));
    Ok(ACTIVE.get_or_init(|| extractor).clone())
}

pub fn active() -> Option<Arc<InvoiceExtractor>> {
    ACTIVE.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_kind_defaults() {
        assert_eq!(resolve_kind(None), ProviderKind::Local);
        assert_eq!(resolve_kind(Some("")), ProviderKind::Local);
        assert_eq!(resolve_kind(Some("openai")), ProviderKind::Local);
        assert_eq!(resolve_kind(Some("GEMINI")), ProviderKind::Gemini);
        assert_eq!(resolve_kind(Some("together")), ProviderKind::Together);
    }

    #[test]
    fn test_hosted_provider_needs_key() {
        let settings = Settings {
            provider: ProviderKind::Groq,
            ..Settings::default()
        };
        let err = build_backend(&settings).err().unwrap();
        match err {
            ProviderError::NotConfigured { provider, reason } => {
                assert_eq!(provider, "groq");
                assert!(reason.contains("GROQ_API_KEY"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_build_each_backend() {
        let settings = Settings {
            gemini_api_key: Some("g".to_string()),
            groq_api_key: Some("q".to_string()),
            together_api_key: Some("t".to_string()),
            huggingface_token: Some("h".to_string()),
            ..Settings::default()
        };
        for kind in ProviderKind::ALL {
            let settings = Settings {
                provider: kind,
                ..settings.clone()
            };
            let backend = build_backend(&settings).unwrap();
            assert_eq!(backend.kind(), kind);
        }
    }

    #[test]
    fn test_install_is_once() {
        let first = install(&Settings::default()).unwrap();
        let other = Settings {
            provider: ProviderKind::Gemini,
            gemini_api_key: Some("g".to_string()),
            ..Settings::default()
        };
        let second = install(&other).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.backend().kind(), ProviderKind::Local);
        assert!(active().is_some());
    }
}
