pub mod aggregator;
pub mod backends;
pub mod encoder;
pub mod extractor;
pub mod parser;
pub mod provider;
pub mod state;
