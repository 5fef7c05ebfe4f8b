//! Normalization of free-text model output into [`InvoiceRecord`]s.
//!
//! Steps: strip a markdown fence, cut out the outermost brace span, decode, coerce.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::ParseError;
use crate::models::InvoiceRecord;

pub const NOT_AVAILABLE: &str = "N/A";
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Largest amount (in rupees) accepted from a model reply. Larger values are
/// treated as unreadable. Keeps two-decimal amounts within 15 significant
/// digits, which survive the float encoding of a saved analysis.
pub const MAX_AMOUNT_RUPEES: i64 = 10_000_000_000_000;

/// Removes a leading code fence (with or without a language tag) and its closing fence.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // The rest of the opening line is the language tag, if any.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Returns the span from the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Result<&str, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ParseError::NoJsonObject)?;
    if end <= start {
        return Err(ParseError::NoJsonObject);
    }
    Ok(&text[start..=end])
}

/// Decodes the invoice object, unwrapping an `{"invoices": [...]}` envelope when present.
pub fn decode_invoice_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let json = extract_json_object(strip_code_fence(raw))?;
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(mut object) = value else {
        return Err(ParseError::NotAnObject(kind_of(&value)));
    };

    if let Some(Value::Array(items)) = object.remove("invoices") {
        return match items.into_iter().next() {
            Some(Value::Object(first)) => Ok(first),
            Some(other) => Err(ParseError::NotAnObject(kind_of(&other))),
            None => Err(ParseError::NoJsonObject),
        };
    }
    Ok(object)
}

/// Parses one backend response into a record. `index` is the zero-based
/// position of the document in its batch.
pub fn parse_invoice(raw: &str, id: String, index: usize) -> Result<InvoiceRecord, ParseError> {
    let object = decode_invoice_object(raw)?;
    Ok(coerce_record(&object, id, index))
}

pub fn coerce_record(object: &Map<String, Value>, id: String, index: usize) -> InvoiceRecord {
    InvoiceRecord {
        id,
        vendor: coerce_string(object.get("vendor")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        gstin: coerce_string(object.get("gstin")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        invoice_no: coerce_string(object.get("invoiceNo"))
            .unwrap_or_else(|| format!("INV-{}", index + 1)),
        date: coerce_string(object.get("date")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        taxable_amount: coerce_amount(object.get("taxableAmount")),
        cgst: coerce_amount(object.get("cgst")),
        sgst: coerce_amount(object.get("sgst")),
        igst: coerce_amount(object.get("igst")),
        total: coerce_amount(object.get("total")),
        confidence: coerce_confidence(object.get("confidence")),
    }
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Amounts are non-negative and at most [`MAX_AMOUNT_RUPEES`]; anything else becomes zero.
pub fn coerce_amount(value: Option<&Value>) -> Decimal {
    let amount = match value {
        Some(Value::Number(n)) => number_to_decimal(n),
        Some(Value::String(s)) => parse_amount_text(s),
        _ => None,
    };
    match amount {
        Some(a) if a.is_sign_positive() && a <= Decimal::from(MAX_AMOUNT_RUPEES) => {
            a.normalize()
        }
        _ => Decimal::ZERO,
    }
}

fn number_to_decimal(n: &serde_json::Number) -> Option<Decimal> {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .or_else(|| n.as_f64().and_then(Decimal::from_f64))
}

fn parse_amount_text(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('₹')
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

fn coerce_confidence(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
