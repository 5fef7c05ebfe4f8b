use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::models::{AnalysisResult, GSTR1Data, GSTR1Summary};
use crate::services::state::AppState;
use crate::utils::{export_filename, format_amount};

/// Re-reduces a saved analysis into a GSTR-1 draft and writes the CSV.
pub async fn gstr1(state: &AppState, analysis_path: &Path, out_dir: &Path) -> Result<()> {
    let content = tokio::fs::read_to_string(analysis_path)
        .await
        .with_context(|| format!("Failed to read {}", analysis_path.display()))?;
    let analysis: AnalysisResult = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse analysis file {}", analysis_path.display()))?;

    state.load_invoices(analysis.invoices).await;
    let data = state.fetch_gstr1().await?;

    print_summary(&data.summary);
    let path = export_csv(out_dir, &data, chrono::Local::now().date_naive()).await?;
    println!("GSTR-1 draft written to {}", path.display());
    Ok(())
}

pub async fn export_csv(dir: &Path, data: &GSTR1Data, date: NaiveDate) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(export_filename(date));
    tokio::fs::write(&path, data.csv_data.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn print_summary(summary: &GSTR1Summary) {
    println!("GSTR-1 summary");
    println!("  Invoices:        {}", summary.total_invoices);
    println!("  Taxable amount:  ₹{}", format_amount(summary.total_taxable_amount));
    println!("  CGST:            ₹{}", format_amount(summary.total_cgst));
    println!("  SGST:            ₹{}", format_amount(summary.total_sgst));
    println!("  IGST:            ₹{}", format_amount(summary.total_igst));
    println!("  Total tax:       ₹{}", format_amount(summary.total_tax));
    println!("  Total amount:    ₹{}", format_amount(summary.total_amount));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregator::{build_gstr1, tests::record};

    #[tokio::test]
    async fn test_export_csv_names_file_by_date() {
        let dir = tempfile::tempdir().unwrap();
        let data = build_gstr1(&[record("A1", ["1000", "90", "90", "0", "1180"], 0.95)]);
        let date = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();

        let path = export_csv(&dir.path().join("drafts"), &data, date).await.unwrap();

        assert!(path.ends_with("drafts/GSTR1_Draft_31-05-2024.csv"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), data.csv_data);
    }
}
