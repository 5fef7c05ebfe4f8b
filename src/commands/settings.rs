use anyhow::Result;

use crate::error::ProviderError;
use crate::models::{ProviderKind, Settings};
use crate::services::extractor::InvoiceExtractor;
use crate::services::provider::{self, api_key_variable, resolve_kind};

pub fn settings_from(lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let defaults = Settings::default();
    Settings {
        provider: resolve_kind(lookup("KIRANA_AI_PROVIDER").as_deref()),
        gemini_api_key: lookup("GEMINI_API_KEY"),
        groq_api_key: lookup("GROQ_API_KEY"),
        together_api_key: lookup("TOGETHER_API_KEY"),
        huggingface_token: lookup("HUGGINGFACE_TOKEN"),
        local_url: lookup("KIRANA_LOCAL_URL").unwrap_or(defaults.local_url),
        model: lookup("KIRANA_MODEL").filter(|m| !m.trim().is_empty()),
        request_timeout_secs: lookup("KIRANA_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.request_timeout_secs),
        advisory_review: lookup("KIRANA_ADVISORY_REVIEW")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.advisory_review),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub async fn health(extractor: &InvoiceExtractor) -> Result<()> {
    let backend = extractor.backend();
    if !extractor.health_check().await {
        return Err(ProviderError::Unreachable {
            provider: backend.label().to_string(),
            url: backend.endpoint().to_string(),
        }
        .into());
    }
    println!("{} is reachable at {}", backend.label(), backend.endpoint());
    Ok(())
}

pub fn providers(settings: &Settings) {
    let active = provider::active().map(|e| e.backend().kind());
    for kind in ProviderKind::ALL {
        let marker = if Some(kind) == active || (active.is_none() && kind == settings.provider) {
            "*"
        } else {
            " "
        };
        let credential = if !kind.requires_api_key() {
            "no key needed".to_string()
        } else if settings.api_key(kind).is_some() {
            format!("{} set", api_key_variable(kind))
        } else {
            format!("{} missing", api_key_variable(kind))
        };
        println!("{marker} {:<12} {credential}", kind.as_str());
    }
}
