pub mod components;
pub mod config;
pub mod constants;
pub mod domain;
pub mod entity;
pub mod pipeline;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "s3")]
pub use config::s3::S3Storage;

#[cfg(feature = "mongodb")]
pub use config::mongo_db::MongoDbSource;

pub use config::cli::LocalStorage;
pub use config::env::{EnvConfig, MongoDbClient, MongoUri};
pub use config::mongo_export::MongoExportSource;
pub use config::toml_config::PipelineToml;
pub use pipeline::{TrainingPipeline, TravelClassifier, TravelData};
pub use utils::error::{PredictiveError, Result};
