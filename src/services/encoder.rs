use base64::{engine::general_purpose, Engine as _};
use std::path::{Path, PathBuf};

use crate::error::EncodingError;

/// Where the bytes of an uploaded document live.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub source: DocumentSource,
}

impl Document {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Document {
            name,
            source: DocumentSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Document {
            name: name.into(),
            source: DocumentSource::Bytes(bytes),
        }
    }
}

/// A document ready to be embedded in a backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub name: String,
    pub mime_type: &'static str,
    pub data: String,
}

impl EncodedDocument {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, EncodingError> {
        Ok(general_purpose::STANDARD.decode(&self.data)?)
    }
}

pub async fn encode(document: &Document) -> Result<EncodedDocument, EncodingError> {
    let bytes = match &document.source {
        DocumentSource::Path(path) => {
            tokio::fs::read(path)
                .await
                .map_err(|source| EncodingError::Read {
                    path: path.clone(),
                    source,
                })?
        }
        DocumentSource::Bytes(bytes) => bytes.clone(),
    };
    encode_bytes(&document.name, &bytes)
}

pub fn encode_bytes(name: &str, bytes: &[u8]) -> Result<EncodedDocument, EncodingError> {
    if bytes.is_empty() {
        return Err(EncodingError::Empty(name.to_string()));
    }
    let mime_type = mime_from_name(name)
        .or_else(|| sniff_mime(bytes))
        .ok_or_else(|| EncodingError::UnsupportedType(name.to_string()))?;

    Ok(EncodedDocument {
        name: name.to_string(),
        mime_type,
        data: general_purpose::STANDARD.encode(bytes),
    })
}

fn mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"%PDF") {
        Some("application/pdf")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
