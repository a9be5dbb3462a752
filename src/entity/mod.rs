pub mod artifact_entity;
pub mod config_entity;

pub use artifact_entity::{DataIngestionArtifact, DataValidationArtifact};
pub use config_entity::{
    DataIngestionConfig, DataValidationConfig, TrainingPipelineConfig, TravelPredictorConfig,
};
