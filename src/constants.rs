//! Fixed names and defaults shared by every pipeline stage.

pub const PIPELINE_NAME: &str = "predictive-analytics";
pub const ARTIFACT_DIR: &str = "artifact";
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

pub const DATABASE_NAME: &str = "PREDICTIVE_ANALYTICS";
pub const COLLECTION_NAME: &str = "travel_data";
pub const DOCUMENT_ID_FIELD: &str = "_id";

pub const MONGODB_URL_KEY: &str = "MONGODB_URL";
pub const AWS_ACCESS_KEY_ID_ENV_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY_ENV_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_REGION_ENV_KEY: &str = "AWS_DEFAULT_REGION";
pub const REGION_NAME: &str = "us-east-1";

pub const CONFIG_FILE_PATH: &str = "config/pipeline.toml";
pub const SCHEMA_FILE_PATH: &str = "config/schema.toml";
pub const MONGO_EXPORT_DIR: &str = "mongo-export";

pub const FILE_NAME: &str = "travel.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";

pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;
pub const DATA_INGESTION_RANDOM_SEED: u64 = 42;

pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.json";
pub const DRIFT_SHARE_THRESHOLD: f64 = 0.5;

/// Above this many reference values the distance-based drift tests are used.
pub const DRIFT_LARGE_SAMPLE: usize = 1000;
pub const DRIFT_P_VALUE_THRESHOLD: f64 = 0.05;
pub const DRIFT_DISTANCE_THRESHOLD: f64 = 0.1;

pub const MODEL_BUCKET_NAME: &str = "predictive-analytics-model";
pub const MODEL_FILE_NAME: &str = "model.json";
pub const MODEL_REGISTRY_DIR: &str = "model-registry";

pub const MISSING_VALUE_MARKERS: &[&str] = &["", "na", "NA", "NaN", "nan", "null", "None"];

pub fn is_missing(value: &str) -> bool {
    MISSING_VALUE_MARKERS.contains(&value.trim())
}
