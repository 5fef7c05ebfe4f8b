use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::gstr1::{export_csv, print_summary};
use crate::error::ProviderError;
use crate::models::{AnalysisResult, InvoiceRecord};
use crate::services::aggregator::total_tax;
use crate::services::encoder::Document;
use crate::services::state::AppState;
use crate::utils::format_amount;

pub struct AnalyzeOptions {
    pub files: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub save: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

pub async fn analyze(state: &AppState, options: AnalyzeOptions) -> Result<()> {
    let documents: Vec<Document> = options.files.iter().map(Document::from_path).collect();

    let result = match options.timeout_secs {
        Some(secs) => tokio::time::timeout(
            Duration::from_secs(secs),
            state.process_invoices(&documents),
        )
        .await
        .map_err(|_| ProviderError::DeadlineExceeded(secs))??,
        None => state.process_invoices(&documents).await?,
    };

    print_analysis(&result);

    if let Some(path) = &options.save {
        save_analysis(path, &result).await?;
        println!("Analysis saved to {}", path.display());
    }

    let data = state.fetch_gstr1().await?;
    println!();
    print_summary(&data.summary);
    let csv_path = export_csv(&options.out_dir, &data, chrono::Local::now().date_naive()).await?;
    println!("GSTR-1 draft written to {}", csv_path.display());
    Ok(())
}

async fn save_analysis(path: &Path, result: &AnalysisResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn print_analysis(result: &AnalysisResult) {
    for (index, invoice) in result.invoices.iter().enumerate() {
        println!("{:>2}. {}", index + 1, describe(invoice));
    }
    println!();
    println!("{}", result.explanation);
}

fn describe(invoice: &InvoiceRecord) -> String {
    format!(
        "[{:<6}] {} | {} | GSTIN {} | {} | taxable ₹{} | tax ₹{} | total ₹{} | {:.0}%",
        invoice.bucket().label(),
        invoice.invoice_no,
        invoice.vendor,
        invoice.gstin,
        invoice.date,
        format_amount(invoice.taxable_amount),
        format_amount(total_tax(invoice)),
        format_amount(invoice.total),
        invoice.confidence * 100.0
    )
}
