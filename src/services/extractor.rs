use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{BackendError, ExtractionError, ParseError, ProviderError, Result};
use crate::models::{AnalysisResult, GSTR1Data, GSTR1Summary, InvoiceRecord, ProviderKind};
use crate::services::aggregator;
use crate::services::encoder::{self, Document};
use crate::services::parser::{self, NOT_AVAILABLE};
use crate::services::state::Session;
use crate::utils::{format_amount, new_invoice_id, today_ddmmyyyy};

pub const EXTRACTION_PROMPT: &str = r#"You are an expert at reading Indian GST invoices. Analyze this invoice and extract the following information:

1. Vendor/Supplier Name
2. GSTIN (GST Identification Number)
3. Invoice Number
4. Invoice Date (format: DD-MM-YYYY)
5. Taxable Amount (numbers only, no currency symbols)
6. CGST amount
7. SGST amount
8. IGST amount
9. Total Amount
10. Confidence level (0.0 to 1.0) - how clear is the document?

Return ONLY a valid JSON object in this exact format (no markdown, no code blocks, no extra text):
{
  "vendor": "string",
  "gstin": "string",
  "invoiceNo": "string",
  "date": "DD-MM-YYYY",
  "taxableAmount": number,
  "cgst": number,
  "sgst": number,
  "igst": number,
  "total": number,
  "confidence": number
}

Important:
- If you cannot read a field clearly, use 0 for numbers or "N/A" for strings
- Lower the confidence score if the document is unclear
- CGST+SGST are for intra-state, IGST is for inter-state transactions"#;

const UNREADABLE_CONFIDENCE: f64 = 0.1;
const BACKEND_FAILURE_CONFIDENCE: f64 = 0.2;
const PARSE_FAILURE_CONFIDENCE: f64 = 0.3;

/// One hosted or local model that turns an encoded invoice into raw text.
///
/// Implementations only differ in how they build the request and unwrap the
/// response; prompting, parsing and placeholder handling live in
/// [`InvoiceExtractor`].
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Display name used in explanations and logs.
    fn label(&self) -> &str;

    fn endpoint(&self) -> &str;

    async fn health_check(&self) -> bool {
        true
    }

    async fn extract(
        &self,
        document: &encoder::EncodedDocument,
        prompt: &str,
    ) -> std::result::Result<String, BackendError>;

    /// Free-text advisory call. `None` when the backend has no text generation.
    async fn review(&self, _prompt: &str) -> std::result::Result<Option<String>, BackendError> {
        Ok(None)
    }
}

pub struct InvoiceExtractor {
    backend: Arc<dyn ExtractionBackend>,
    advisory_review: bool,
}

enum Failure {
    Unreadable(String),
    Backend(String),
    Unparsable,
}

impl InvoiceExtractor {
    pub fn new(backend: Arc<dyn ExtractionBackend>, advisory_review: bool) -> Self {
        InvoiceExtractor {
            backend,
            advisory_review,
        }
    }

    pub fn backend(&self) -> &dyn ExtractionBackend {
        self.backend.as_ref()
    }

    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Extracts one record per document, in input order.
    pub async fn analyze_invoices(&self, documents: &[Document]) -> Result<AnalysisResult> {
        if documents.is_empty() {
            return Err(ProviderError::EmptyBatch.into());
        }

        if !self.backend.health_check().await {
            return Err(ProviderError::Unreachable {
                provider: self.backend.label().to_string(),
                url: self.backend.endpoint().to_string(),
            }
            .into());
        }

        info!(
            provider = %self.backend.kind(),
            count = documents.len(),
            "Analyzing invoices"
        );

        let mut invoices = Vec::with_capacity(documents.len());
        // Unparsable replies still count as content; unreadable or failed calls do not.
        let mut unusable = 0;
        let mut last_failure = String::new();

        for (index, document) in documents.iter().enumerate() {
            let span = info_span!("extract_document", index, name = %document.name);
            let record = match self.extract_document(index, document).instrument(span).await? {
                Ok(record) => record,
                Err(failure) => {
                    if let Failure::Unreadable(message) | Failure::Backend(message) = &failure {
                        unusable += 1;
                        last_failure = message.clone();
                    }
                    placeholder(index, &failure)
                }
            };
            invoices.push(record);
        }

        if unusable == documents.len() {
            return Err(ProviderError::NoUsableContent {
                count: documents.len(),
                last: last_failure,
            }
            .into());
        }

        let explanation = aggregator::explain(self.backend.label(), &invoices);
        info!(%explanation, "Analysis complete");
        Ok(AnalysisResult {
            invoices,
            explanation,
        })
    }

    // The outer error aborts the batch; the inner one becomes a placeholder.
    async fn extract_document(
        &self,
        index: usize,
        document: &Document,
    ) -> Result<std::result::Result<InvoiceRecord, Failure>> {
        let encoded = match encoder::encode(document).await {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Could not encode document");
                return Ok(Err(Failure::Unreadable(e.to_string())));
            }
        };

        let raw = match self.backend.extract(&encoded, EXTRACTION_PROMPT).await {
            Ok(raw) => raw,
            Err(BackendError::Unavailable(message)) => {
                warn!(%message, "Backend unavailable, aborting batch");
                return Err(ExtractionError::TransientBackend(message));
            }
            Err(e @ BackendError::Rejected { .. }) => {
                return Err(ProviderError::Rejected(e.to_string()).into());
            }
            Err(e) => {
                warn!(error = %e, "Extraction call failed");
                return Ok(Err(Failure::Backend(e.to_string())));
            }
        };

        match parser::parse_invoice(&raw, new_invoice_id(), index) {
            Ok(record) => {
                debug!(
                    vendor = %record.vendor,
                    invoice_no = %record.invoice_no,
                    total = %record.total,
                    confidence = record.confidence,
                    "Parsed invoice"
                );
                Ok(Ok(record))
            }
            Err(e) => {
                log_parse_failure(&e, &raw);
                Ok(Err(Failure::Unparsable))
            }
        }
    }

    /// Reduces the session's invoices into a GSTR-1 draft.
    pub async fn generate_gstr1(&self, session: &Session) -> Result<GSTR1Data> {
        let invoices = session.invoices();
        if invoices.is_empty() {
            return Err(ExtractionError::NoData);
        }

        let data = aggregator::build_gstr1(invoices);

        if self.advisory_review {
            let prompt = review_prompt(&data.summary);
            match self.backend.review(&prompt).await {
                Ok(Some(review)) => info!(%review, "GSTR-1 validation"),
                Ok(None) => debug!("Backend offers no advisory review"),
                Err(e) => warn!(error = %e, "GSTR-1 validation skipped"),
            }
        }

        Ok(data)
    }
}

fn log_parse_failure(error: &ParseError, raw: &str) {
    let preview: String = raw.chars().take(200).collect();
    warn!(error = %error, raw = %preview, "Failed to parse backend response");
}

fn placeholder(index: usize, failure: &Failure) -> InvoiceRecord {
    let (vendor, confidence) = match failure {
        Failure::Unreadable(_) => ("Unreadable document", UNREADABLE_CONFIDENCE),
        Failure::Backend(_) => ("Processing error", BACKEND_FAILURE_CONFIDENCE),
        Failure::Unparsable => ("Unable to extract", PARSE_FAILURE_CONFIDENCE),
    };
    InvoiceRecord {
        id: new_invoice_id(),
        vendor: vendor.to_string(),
        gstin: NOT_AVAILABLE.to_string(),
        invoice_no: format!("Invoice_{}", index + 1),
        date: today_ddmmyyyy(),
        taxable_amount: Decimal::ZERO,
        cgst: Decimal::ZERO,
        sgst: Decimal::ZERO,
        igst: Decimal::ZERO,
        total: Decimal::ZERO,
        confidence,
    }
}

pub fn review_prompt(summary: &GSTR1Summary) -> String {
    format!(
        "As a GST expert, review this GSTR-1 summary and provide any important insights or warnings:

Summary:
- Total Invoices: {}
- Total Taxable Amount: ₹{}
- Total CGST: ₹{}
- Total SGST: ₹{}
- Total IGST: ₹{}
- Total Tax: ₹{}
- Total Amount: ₹{}

Provide a brief validation report (2-3 sentences) about the data consistency and any red flags.",
        summary.total_invoices,
        format_amount(summary.total_taxable_amount),
        format_amount(summary.total_cgst),
        format_amount(summary.total_sgst),
        format_amount(summary.total_igst),
        format_amount(summary.total_tax),
        format_amount(summary.total_amount),
    )
}
