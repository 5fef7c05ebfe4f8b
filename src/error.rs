use std::path::PathBuf;
use thiserror::Error;

/// A document could not be turned into a transport encoding.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document '{0}' is empty")]
    Empty(String),

    #[error("Document '{0}' is not a supported image or PDF")]
    UnsupportedType(String),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// The backend response could not be decoded into an invoice.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Failure of a single backend call.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{provider} rejected the request ({status}): {body}")]
    Rejected {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} error {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("No response content from {0}")]
    EmptyResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Batch-level and configuration failures surfaced to the caller.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} backend is not reachable at {url}")]
    Unreachable { provider: String, url: String },

    #[error("Provider '{provider}' is not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("No documents supplied")]
    EmptyBatch,

    #[error("No usable content returned for any of {count} document(s): {last}")]
    NoUsableContent { count: usize, last: String },

    #[error("Invoice analysis did not finish within {0} seconds")]
    DeadlineExceeded(u64),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Backend is temporarily unavailable, try again shortly: {0}")]
    TransientBackend(String),

    #[error("No invoice data available. Please process invoices first.")]
    NoData,
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
