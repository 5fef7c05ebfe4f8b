pub mod gstr1;
pub mod invoices;
pub mod settings;
