use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;

pub fn new_invoice_id() -> String {
    format!("inv_{}", uuid::Uuid::new_v4().simple())
}

pub fn today_ddmmyyyy() -> String {
    format_ddmmyyyy(Local::now().date_naive())
}

pub fn format_ddmmyyyy(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("GSTR1_Draft_{}.csv", format_ddmmyyyy(date))
}
