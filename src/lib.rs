pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{EncodingError, ExtractionError, ParseError, ProviderError, Result};
pub use models::{AnalysisResult, GSTR1Data, GSTR1Summary, InvoiceRecord, ProviderKind, Settings};
pub use services::extractor::{ExtractionBackend, InvoiceExtractor};
