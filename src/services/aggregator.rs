use rust_decimal::Decimal;

use crate::models::{ConfidenceBucket, GSTR1Data, GSTR1Summary, InvoiceRecord};

pub const CSV_HEADER: &str = "GSTIN,Invoice No,Date,Taxable Amount,CGST,SGST,IGST,Total";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub high: usize,
    pub medium: usize,
    pub review: usize,
}

pub fn bucket_counts(invoices: &[InvoiceRecord]) -> BucketCounts {
    invoices
        .iter()
        .fold(BucketCounts::default(), |mut counts, invoice| {
            match invoice.bucket() {
                ConfidenceBucket::High => counts.high += 1,
                ConfidenceBucket::Medium => counts.medium += 1,
                ConfidenceBucket::Review => counts.review += 1,
            }
            counts
        })
}

/// Human-readable summary of one extraction run, e.g.
/// `Processed 2 invoice(s) using Groq. 1 high confidence, 1 need review.`
pub fn explain(provider_label: &str, invoices: &[InvoiceRecord]) -> String {
    let counts = bucket_counts(invoices);
    let mut parts = Vec::new();
    if counts.high > 0 {
        parts.push(format!("{} high confidence", counts.high));
    }
    if counts.medium > 0 {
        parts.push(format!("{} medium confidence", counts.medium));
    }
    if counts.review > 0 {
        parts.push(format!("{} need review", counts.review));
    }

    let mut explanation = format!(
        "Processed {} invoice(s) using {}.",
        invoices.len(),
        provider_label
    );
    if !parts.is_empty() {
        explanation.push(' ');
        explanation.push_str(&parts.join(", "));
        explanation.push('.');
    }
    explanation
}

pub fn summarize(invoices: &[InvoiceRecord]) -> GSTR1Summary {
    let mut summary = GSTR1Summary {
        total_invoices: invoices.len(),
        ..GSTR1Summary::default()
    };
    // Sums saturate at Decimal::MAX.
    for invoice in invoices {
        summary.total_taxable_amount = summary
            .total_taxable_amount
            .saturating_add(invoice.taxable_amount);
        summary.total_cgst = summary.total_cgst.saturating_add(invoice.cgst);
        summary.total_sgst = summary.total_sgst.saturating_add(invoice.sgst);
        summary.total_igst = summary.total_igst.saturating_add(invoice.igst);
    }
    summary.total_tax = summary
        .total_cgst
        .saturating_add(summary.total_sgst)
        .saturating_add(summary.total_igst);
    summary.total_amount = summary.total_taxable_amount.saturating_add(summary.total_tax);
    summary
}

// Values are written raw; a comma inside a field shifts the columns.
pub fn to_csv(invoices: &[InvoiceRecord]) -> String {
    let mut lines = Vec::with_capacity(invoices.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for inv in invoices {
        lines.push(format!(
            "{},{},{},{},{},{},{},{}",
            inv.gstin,
            inv.invoice_no,
            inv.date,
            inv.taxable_amount,
            inv.cgst,
            inv.sgst,
            inv.igst,
            inv.total
        ));
    }
    lines.join("\n")
}

pub fn build_gstr1(invoices: &[InvoiceRecord]) -> GSTR1Data {
    GSTR1Data {
        summary: summarize(invoices),
        csv_data: to_csv(invoices),
    }
}

pub fn total_tax(invoice: &InvoiceRecord) -> Decimal {
    invoice
        .cgst
        .saturating_add(invoice.sgst)
        .saturating_add(invoice.igst)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    pub(crate) fn record(invoice_no: &str, amounts: [&str; 5], confidence: f64) -> InvoiceRecord {
        let [taxable, cgst, sgst, igst, total] = amounts.map(|a| Decimal::from_str(a).unwrap());
        InvoiceRecord {
            id: format!("inv_{invoice_no}"),
            vendor: "Sharma Traders".to_string(),
            gstin: "27AAPFU0939F1ZV".to_string(),
            invoice_no: invoice_no.to_string(),
            date: "01-04-2024".to_string(),
            taxable_amount: taxable,
            cgst,
            sgst,
            igst,
            total,
            confidence,
        }
    }

    fn sample() -> Vec<InvoiceRecord> {
        vec![
            record("A1", ["1000", "90", "90", "0", "1180"], 0.95),
            record("A2", ["250.75", "0", "0", "45.135", "295.885"], 0.8),
            record("A3", ["0.1", "0.2", "0.3", "0", "0.6"], 0.4),
        ]
    }

    #[test]
    fn test_summarize_identities() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_invoices, 3);
        assert_eq!(summary.total_taxable_amount, Decimal::from_str("1250.85").unwrap());
        assert_eq!(
            summary.total_tax,
            summary.total_cgst + summary.total_sgst + summary.total_igst
        );
        assert_eq!(
            summary.total_amount,
            summary.total_taxable_amount + summary.total_tax
        );
        assert_eq!(summary.total_tax, Decimal::from_str("225.635").unwrap());
    }

    #[test]
    fn test_summarize_is_order_independent() {
        let invoices = sample();
        let expected = summarize(&invoices);
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|&i| invoices[i].clone()).collect();
            assert_eq!(summarize(&permuted), expected);
        }
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), GSTR1Summary::default());
    }

    #[test]
    fn test_summarize_saturates_instead_of_overflowing() {
        let mut huge = record("Z1", ["0", "0", "0", "0", "0"], 0.9);
        huge.taxable_amount = Decimal::MAX;
        huge.cgst = Decimal::MAX;
        huge.sgst = Decimal::MAX;

        let summary = summarize(&[huge.clone(), huge.clone()]);

        assert_eq!(summary.total_taxable_amount, Decimal::MAX);
        assert_eq!(summary.total_tax, Decimal::MAX);
        assert_eq!(summary.total_amount, Decimal::MAX);
        assert_eq!(total_tax(&huge), Decimal::MAX);
    }

    #[test]
    fn test_csv_shape() {
        let csv = to_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines.iter().all(|l| l.split(',').count() == 8));
        assert_eq!(lines[1], "27AAPFU0939F1ZV,A1,01-04-2024,1000,90,90,0,1180");
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_csv_empty_is_header_only() {
        assert_eq!(to_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn test_explain_lists_non_empty_buckets() {
        assert_eq!(
            explain("Groq", &sample()),
            "Processed 3 invoice(s) using Groq. 1 high confidence, 1 medium confidence, 1 need review."
        );
        let only_high = vec![record("B1", ["1", "0", "0", "0", "1"], 0.99)];
        assert_eq!(
            explain("Gemini", &only_high),
            "Processed 1 invoice(s) using Gemini. 1 high confidence."
        );
    }

    #[test]
    fn test_bucket_counts() {
        assert_eq!(
            bucket_counts(&sample()),
            BucketCounts {
                high: 1,
                medium: 1,
                review: 1
            }
        );
    }
}
