pub mod data_ingestion;
pub mod data_validation;
pub mod drift;

pub use data_ingestion::DataIngestion;
pub use data_validation::{DataValidation, SchemaConfig};
