use crate::constants;
use crate::utils::error::{PredictiveError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_exclusive_range, validate_non_empty_string, validate_path,
    validate_range, validate_s3_bucket_name, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineToml {
    pub pipeline: PipelineSection,
    pub source: SourceSection,
    pub ingestion: IngestionSection,
    pub validation: ValidationSection,
    pub model: ModelSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub name: String,
    pub artifact_dir: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: constants::PIPELINE_NAME.to_string(),
            artifact_dir: constants::ARTIFACT_DIR.to_string(),
        }
    }
}

/// Where the training run reads the collection from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Query the deployment named by `MONGODB_URL`.
    Mongodb,
    /// Read `mongoexport` dumps from `export_dir`.
    Export,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub kind: SourceKind,
    /// Directory holding `mongoexport` dumps laid out as `<database>/<collection>.json`.
    pub export_dir: String,
    /// Unset means the database in `MONGODB_URL`, then the built-in name.
    pub database: Option<String>,
    pub collection: String,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            kind: SourceKind::Mongodb,
            export_dir: constants::MONGO_EXPORT_DIR.to_string(),
            database: None,
            collection: constants::COLLECTION_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSection {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for IngestionSection {
    fn default() -> Self {
        Self {
            test_ratio: constants::DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO,
            seed: constants::DATA_INGESTION_RANDOM_SEED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub schema_file: String,
    pub drift_share: f64,
    pub stattest_threshold: Option<f64>,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            schema_file: constants::SCHEMA_FILE_PATH.to_string(),
            drift_share: constants::DRIFT_SHARE_THRESHOLD,
            stattest_threshold: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub bucket: String,
    pub key: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            bucket: constants::MODEL_BUCKET_NAME.to_string(),
            key: constants::MODEL_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub local_path: String,
    pub region: Option<String>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_path: constants::MODEL_REGISTRY_DIR.to_string(),
            region: None,
        }
    }
}

impl PipelineToml {
    /// Loads the file if it exists, otherwise falls back to built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(
                "⚠️ Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PredictiveError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| PredictiveError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_path("pipeline.artifact_dir", &self.pipeline.artifact_dir)?;

        validate_path("source.export_dir", &self.source.export_dir)?;
        if let Some(database) = &self.source.database {
            validate_non_empty_string("source.database", database)?;
        }
        validate_non_empty_string("source.collection", &self.source.collection)?;

        validate_exclusive_range("ingestion.test_ratio", self.ingestion.test_ratio, 0.0, 1.0)?;

        validate_path("validation.schema_file", &self.validation.schema_file)?;
        validate_range("validation.drift_share", self.validation.drift_share, f64::MIN_POSITIVE, 1.0)?;
        if let Some(threshold) = self.validation.stattest_threshold {
            validate_exclusive_range("validation.stattest_threshold", threshold, 0.0, 1.0)?;
        }

        validate_s3_bucket_name("model.bucket", &self.model.bucket)?;
        validate_path("model.key", &self.model.key)?;

        validate_path("storage.local_path", &self.storage.local_path)?;
        if let Some(region) = &self.storage.region {
            validate_aws_region("storage.region", region)?;
        }

        Ok(())
    }
}

impl Validate for PipelineToml {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
