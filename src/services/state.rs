use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{AnalysisResult, GSTR1Data, InvoiceRecord};
use crate::services::encoder::Document;
use crate::services::extractor::InvoiceExtractor;

/// Invoices from the most recent completed analysis.
#[derive(Debug, Default)]
pub struct Session {
    invoices: Vec<InvoiceRecord>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn invoices(&self) -> &[InvoiceRecord] {
        &self.invoices
    }

    pub fn replace(&mut self, invoices: Vec<InvoiceRecord>) {
        self.invoices = invoices;
    }
}

pub struct AppState {
    pub extractor: Arc<InvoiceExtractor>,
    session: Mutex<Session>,
}

impl AppState {
    pub fn new(extractor: Arc<InvoiceExtractor>) -> Self {
        AppState {
            extractor,
            session: Mutex::new(Session::new()),
        }
    }

    /// Runs one analysis and replaces the session's invoices with its output.
    /// The session lock is held for the whole batch so a concurrent GSTR-1
    /// request waits for it.
    pub async fn process_invoices(&self, documents: &[Document]) -> Result<AnalysisResult> {
        let mut session = self.session.lock().await;
        let result = self.extractor.analyze_invoices(documents).await?;
        session.replace(result.invoices.clone());
        Ok(result)
    }

    pub async fn load_invoices(&self, invoices: Vec<InvoiceRecord>) {
        self.session.lock().await.replace(invoices);
    }

    pub async fn fetch_gstr1(&self) -> Result<GSTR1Data> {
        let session = self.session.lock().await;
        self.extractor.generate_gstr1(&session).await
    }

    pub async fn current_invoices(&self) -> Vec<InvoiceRecord> {
        self.session.lock().await.invoices().to_vec()
    }
}
