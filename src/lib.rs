pub mod dataset;
pub mod engine;
pub mod error;
pub mod filter;
pub mod ingestion;
pub mod metrics;
pub mod records;
pub mod table;
