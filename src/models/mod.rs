use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One invoice as extracted from a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub vendor: String,
    pub gstin: String,
    pub invoice_no: String,
    pub date: String,
    pub taxable_amount: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub total: Decimal,
    pub confidence: f64,
}

impl InvoiceRecord {
    pub fn bucket(&self) -> ConfidenceBucket {
        ConfidenceBucket::from_score(self.confidence)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Review,
}

impl ConfidenceBucket {
    pub const HIGH_THRESHOLD: f64 = 0.9;
    pub const MEDIUM_THRESHOLD: f64 = 0.7;

    pub fn from_score(score: f64) -> Self {
        if score >= Self::HIGH_THRESHOLD {
            ConfidenceBucket::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Review
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceBucket::High => "High",
            ConfidenceBucket::Medium => "Medium",
            ConfidenceBucket::Review => "Review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub invoices: Vec<InvoiceRecord>,
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GSTR1Summary {
    #[serde(rename = "totalInvoices")]
    pub total_invoices: usize,
    #[serde(rename = "totalTaxableAmount")]
    pub total_taxable_amount: Decimal,
    #[serde(rename = "totalCGST")]
    pub total_cgst: Decimal,
    #[serde(rename = "totalSGST")]
    pub total_sgst: Decimal,
    #[serde(rename = "totalIGST")]
    pub total_igst: Decimal,
    #[serde(rename = "totalTax")]
    pub total_tax: Decimal,
    #[serde(rename = "totalAmount")]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GSTR1Data {
    pub summary: GSTR1Summary,
    #[serde(rename = "csvData")]
    pub csv_data: String,
}

/// Known extraction backends. Anything else in configuration maps to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Local,
    Gemini,
    Groq,
    Together,
    HuggingFace,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Local,
        ProviderKind::Gemini,
        ProviderKind::Groq,
        ProviderKind::Together,
        ProviderKind::HuggingFace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Groq => "groq",
            ProviderKind::Together => "together",
            ProviderKind::HuggingFace => "huggingface",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::Local)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub provider: ProviderKind,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub together_api_key: Option<String>,
    pub huggingface_token: Option<String>,
    pub local_url: String,
    pub model: Option<String>,
    pub request_timeout_secs: u64,
    pub advisory_review: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            provider: ProviderKind::default(),
            gemini_api_key: None,
            groq_api_key: None,
            together_api_key: None,
            huggingface_token: None,
            local_url: "http://localhost:5000".to_string(),
            model: None,
            request_timeout_secs: 60,
            advisory_review: false,
        }
    }
}

impl Settings {
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::Local => None,
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::Groq => self.groq_api_key.as_deref(),
            ProviderKind::Together => self.together_api_key.as_deref(),
            ProviderKind::HuggingFace => self.huggingface_token.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }
}
