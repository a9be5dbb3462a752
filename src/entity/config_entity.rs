use crate::config::toml_config::PipelineToml;
use crate::constants::*;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    /// `<artifact root>/<timestamp>` for this run.
    pub artifact_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    pub fn new(settings: &PipelineToml, started_at: DateTime<Local>) -> Self {
        let timestamp = started_at.format(ARTIFACT_TIMESTAMP_FORMAT).to_string();
        Self {
            pipeline_name: settings.pipeline.name.clone(),
            artifact_dir: PathBuf::from(&settings.pipeline.artifact_dir).join(&timestamp),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
    pub random_seed: u64,
    pub database_name: String,
    pub collection_name: String,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig, settings: &PipelineToml) -> Self {
        let data_ingestion_dir = pipeline.artifact_dir.join(DATA_INGESTION_DIR_NAME);
        let ingested_dir = data_ingestion_dir.join(DATA_INGESTION_INGESTED_DIR);
        Self {
            feature_store_file_path: data_ingestion_dir
                .join(DATA_INGESTION_FEATURE_STORE_DIR)
                .join(FILE_NAME),
            training_file_path: ingested_dir.join(TRAIN_FILE_NAME),
            testing_file_path: ingested_dir.join(TEST_FILE_NAME),
            train_test_split_ratio: settings.ingestion.test_ratio,
            random_seed: settings.ingestion.seed,
            database_name: settings
                .source
                .database
                .clone()
                .unwrap_or_else(|| DATABASE_NAME.to_string()),
            collection_name: settings.source.collection.clone(),
            data_ingestion_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub drift_report_file_path: PathBuf,
    pub drift_share_threshold: f64,
    pub stattest_threshold: Option<f64>,
    pub schema_file_path: PathBuf,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig, settings: &PipelineToml) -> Self {
        let data_validation_dir = pipeline.artifact_dir.join(DATA_VALIDATION_DIR_NAME);
        Self {
            drift_report_file_path: data_validation_dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            drift_share_threshold: settings.validation.drift_share,
            stattest_threshold: settings.validation.stattest_threshold,
            schema_file_path: PathBuf::from(&settings.validation.schema_file),
            data_validation_dir,
        }
    }

    /// Validation of files outside a pipeline run, reporting to `report_path`.
    pub fn standalone(settings: &PipelineToml, report_path: PathBuf) -> Self {
        Self {
            data_validation_dir: report_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_default(),
            drift_report_file_path: report_path,
            drift_share_threshold: settings.validation.drift_share,
            stattest_threshold: settings.validation.stattest_threshold,
            schema_file_path: PathBuf::from(&settings.validation.schema_file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelPredictorConfig {
    pub model_bucket_name: String,
    pub model_file_path: String,
}

impl TravelPredictorConfig {
    pub fn new(settings: &PipelineToml) -> Self {
        Self {
            model_bucket_name: settings.model.bucket.clone(),
            model_file_path: settings.model.key.clone(),
        }
    }
}

impl Default for TravelPredictorConfig {
    fn default() -> Self {
        Self {
            model_bucket_name: MODEL_BUCKET_NAME.to_string(),
            model_file_path: MODEL_FILE_NAME.to_string(),
        }
    }
}
