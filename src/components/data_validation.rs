use crate::components::drift::{build_report, parse_drift_report, DriftOptions, DriftSummary};
use crate::domain::Table;
use crate::entity::{DataIngestionArtifact, DataValidationArtifact, DataValidationConfig};
use crate::utils::error::{PredictiveError, Result};
use crate::utils::main_utils::{read_json_file, read_toml_file, write_json_file};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub dtype: String,
}

/// Expected layout of the ingested dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub columns: Vec<SchemaColumn>,
    #[serde(default)]
    pub numerical_columns: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// Declared columns left out of drift testing.
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

impl SchemaConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let schema: Self = read_toml_file(path.as_ref()).map_err(|e| PredictiveError::SchemaError {
            message: format!("cannot load schema {}: {}", path.as_ref().display(), e),
        })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let schema: Self = toml::from_str(content).map_err(|e| PredictiveError::SchemaError {
            message: e.to_string(),
        })?;
        schema.validate()?;
        Ok(schema)
    }

    fn is_declared(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

impl Validate for SchemaConfig {
    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PredictiveError::ValidationError {
                message: "schema declares no columns".to_string(),
            });
        }

        let undeclared: Vec<&str> = self
            .numerical_columns
            .iter()
            .chain(&self.categorical_columns)
            .chain(&self.drop_columns)
            .map(String::as_str)
            .filter(|name| !self.is_declared(name))
            .collect();
        if !undeclared.is_empty() {
            return Err(PredictiveError::ValidationError {
                message: format!(
                    "columns used but not declared in the schema: {}",
                    undeclared.join(", ")
                ),
            });
        }
        Ok(())
    }
}

pub struct DataValidation {
    data_ingestion_artifact: DataIngestionArtifact,
    data_validation_config: DataValidationConfig,
    schema_config: SchemaConfig,
}

impl DataValidation {
    pub fn new(
        data_ingestion_artifact: DataIngestionArtifact,
        data_validation_config: DataValidationConfig,
    ) -> Result<Self> {
        let schema_config = SchemaConfig::from_file(&data_validation_config.schema_file_path)?;
        Ok(Self::with_schema(
            data_ingestion_artifact,
            data_validation_config,
            schema_config,
        ))
    }

    pub fn with_schema(
        data_ingestion_artifact: DataIngestionArtifact,
        data_validation_config: DataValidationConfig,
        schema_config: SchemaConfig,
    ) -> Self {
        Self {
            data_ingestion_artifact,
            data_validation_config,
            schema_config,
        }
    }

    pub fn validate_number_of_columns(&self, table: &Table) -> bool {
        let required = self.schema_config.columns.len();
        let actual = table.n_columns();
        let status = required == actual;
        tracing::info!(
            "Column count validation: required={}, actual={}, status={}",
            required,
            actual,
            status
        );
        status
    }

    pub fn is_column_exist(&self, table: &Table) -> bool {
        let missing = |wanted: &[String]| -> Vec<String> {
            wanted
                .iter()
                .filter(|c| !table.has_column(c))
                .cloned()
                .collect()
        };
        let missing_numerical = missing(&self.schema_config.numerical_columns);
        let missing_categorical = missing(&self.schema_config.categorical_columns);

        if !missing_numerical.is_empty() {
            tracing::info!("Missing numerical columns: {:?}", missing_numerical);
        }
        if !missing_categorical.is_empty() {
            tracing::info!("Missing categorical columns: {:?}", missing_categorical);
        }

        missing_numerical.is_empty() && missing_categorical.is_empty()
    }

    pub fn read_data<P: AsRef<Path>>(file_path: P) -> Result<Table> {
        Table::read_csv(file_path)
    }

    fn summary_path(&self) -> PathBuf {
        let report = &self.data_validation_config.drift_report_file_path;
        let stem = report
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        report.with_file_name(format!("{}_summary.json", stem))
    }

    /// Writes the drift report, reads it back and summarises it.
    pub fn drift_summary(&self, reference: &Table, current: &Table) -> Result<DriftSummary> {
        let options = DriftOptions {
            numerical_columns: self.schema_config.numerical_columns.clone(),
            categorical_columns: self.schema_config.categorical_columns.clone(),
            excluded_columns: self.schema_config.drop_columns.clone(),
            drift_share: Some(self.data_validation_config.drift_share_threshold),
            stattest_threshold: self.data_validation_config.stattest_threshold,
        };
        let report = build_report(reference, current, &options);

        let report_path = &self.data_validation_config.drift_report_file_path;
        write_json_file(report_path, &report)?;
        let report_value: serde_json::Value = read_json_file(report_path)?;

        let tested = reference
            .headers()
            .iter()
            .filter(|h| !self.schema_config.drop_columns.contains(h))
            .count();
        let summary = parse_drift_report(&report_value, Some(tested));
        let profile = json!({
            "data_drift": {"data": {"metrics": summary}},
            "raw_metrics": report_value.get("metrics").cloned().unwrap_or_default(),
        });
        write_json_file(self.summary_path(), &profile)?;

        tracing::info!(
            "{}/{} drifted (share={}, threshold={}). Dataset drift: {}",
            summary.n_drifted_features,
            summary
                .n_features
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string()),
            summary.drift_share,
            summary.drift_share_threshold,
            summary.dataset_drift
        );
        Ok(summary)
    }

    pub fn detect_dataset_drift(&self, reference: &Table, current: &Table) -> Result<bool> {
        Ok(self.drift_summary(reference, current)?.dataset_drift)
    }

    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        tracing::info!("Starting data validation process...");

        let train = Self::read_data(&self.data_ingestion_artifact.trained_file_path)?;
        let test = Self::read_data(&self.data_ingestion_artifact.test_file_path)?;

        let mut error_messages = Vec::new();
        if !self.validate_number_of_columns(&train) {
            error_messages.push("Training data: Column count mismatch.");
        }
        if !self.validate_number_of_columns(&test) {
            error_messages.push("Test data: Column count mismatch.");
        }
        if !self.is_column_exist(&train) {
            error_messages.push("Training data: Missing required columns.");
        }
        if !self.is_column_exist(&test) {
            error_messages.push("Test data: Missing required columns.");
        }

        let validation_passed = error_messages.is_empty();
        let message = if !validation_passed {
            error_messages.join("; ")
        } else if self.detect_dataset_drift(&train, &test)? {
            "Drift detected".to_string()
        } else {
            "Drift not detected".to_string()
        };

        let artifact = DataValidationArtifact {
            validation_status: validation_passed,
            message,
            drift_report_file_path: self.data_validation_config.drift_report_file_path.clone(),
        };
        tracing::info!("Data validation completed. Artifact: {}", artifact);
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
numerical_columns = ["company_age"]
categorical_columns = ["continent"]

[[columns]]
name = "continent"
dtype = "category"

[[columns]]
name = "company_age"
dtype = "int"
"#;

    fn write_csv(path: &Path, rows: &[(&str, i64)]) {
        let mut table = Table::new(vec!["continent".into(), "company_age".into()]);
        for (continent, age) in rows {
            table
                .push_row(vec![continent.to_string(), age.to_string()])
                .unwrap();
        }
        table.write_csv(path).unwrap();
    }

    fn validation(dir: &TempDir) -> DataValidation {
        let artifact = DataIngestionArtifact {
            trained_file_path: dir.path().join("train.csv"),
            test_file_path: dir.path().join("test.csv"),
        };
        let report = dir.path().join("drift_report/report.json");
        let config = DataValidationConfig {
            data_validation_dir: dir.path().to_path_buf(),
            drift_report_file_path: report,
            drift_share_threshold: 0.5,
            stattest_threshold: None,
            schema_file_path: dir.path().join("schema.toml"),
        };
        DataValidation::with_schema(artifact, config, SchemaConfig::from_toml_str(SCHEMA).unwrap())
    }

    #[test]
    fn identical_sets_pass_without_drift() {
        let dir = TempDir::new().unwrap();
        let rows: Vec<(&str, i64)> = (0..40)
            .map(|i| (if i % 2 == 0 { "Asia" } else { "Europe" }, i))
            .collect();
        write_csv(&dir.path().join("train.csv"), &rows);
        write_csv(&dir.path().join("test.csv"), &rows);

        let artifact = validation(&dir).initiate_data_validation().unwrap();

        assert!(artifact.validation_status);
        assert_eq!(artifact.message, "Drift not detected");
        assert!(dir.path().join("drift_report/report.json").exists());
        assert!(dir.path().join("drift_report/report_summary.json").exists());
    }

    #[test]
    fn shifted_sets_report_drift() {
        let dir = TempDir::new().unwrap();
        let train: Vec<(&str, i64)> = (0..40).map(|i| ("Asia", i)).collect();
        let test: Vec<(&str, i64)> = (0..40).map(|i| ("Europe", i + 500)).collect();
        write_csv(&dir.path().join("train.csv"), &train);
        write_csv(&dir.path().join("test.csv"), &test);

        let artifact = validation(&dir).initiate_data_validation().unwrap();

        assert!(artifact.validation_status);
        assert_eq!(artifact.message, "Drift detected");

        let summary: serde_json::Value =
            read_json_file(dir.path().join("drift_report/report_summary.json")).unwrap();
        assert_eq!(summary["data_drift"]["data"]["metrics"]["n_drifted_features"], 2);
    }

    #[test]
    fn schema_mismatch_skips_drift() {
        let dir = TempDir::new().unwrap();
        let mut table = Table::new(vec!["continent".into()]);
        table.push_row(vec!["Asia".into()]).unwrap();
        table.write_csv(dir.path().join("train.csv")).unwrap();
        table.write_csv(dir.path().join("test.csv")).unwrap();

        let artifact = validation(&dir).initiate_data_validation().unwrap();

        assert!(!artifact.validation_status);
        assert_eq!(
            artifact.message,
            "Training data: Column count mismatch.; Test data: Column count mismatch.; \
             Training data: Missing required columns.; Test data: Missing required columns."
        );
        assert!(!dir.path().join("drift_report/report.json").exists());
    }

    #[test]
    fn dropped_columns_are_not_drift_tested() {
        let dir = TempDir::new().unwrap();
        let train: Vec<(&str, i64)> = (0..40).map(|i| ("Asia", i)).collect();
        let test: Vec<(&str, i64)> = (0..40).map(|i| ("Asia", i + 500)).collect();
        write_csv(&dir.path().join("train.csv"), &train);
        write_csv(&dir.path().join("test.csv"), &test);

        let schema = format!("drop_columns = [\"company_age\"]\n{}", SCHEMA);
        let base = validation(&dir);
        let validation = DataValidation::with_schema(
            base.data_ingestion_artifact.clone(),
            base.data_validation_config.clone(),
            SchemaConfig::from_toml_str(&schema).unwrap(),
        );

        let artifact = validation.initiate_data_validation().unwrap();
        assert!(artifact.validation_status);
        assert_eq!(artifact.message, "Drift not detected");

        let report: serde_json::Value =
            read_json_file(dir.path().join("drift_report/report.json")).unwrap();
        assert!(!report.to_string().contains("company_age"));
    }

    #[test]
    fn undeclared_schema_columns_are_rejected() {
        let err = SchemaConfig::from_toml_str(
            r#"
numerical_columns = ["company_age"]

[[columns]]
name = "continent"
dtype = "category"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, PredictiveError::ValidationError { ref message } if message.contains("company_age")));

        let empty = SchemaConfig::from_toml_str("columns = []").unwrap_err();
        assert!(matches!(empty, PredictiveError::ValidationError { .. }));
    }

    #[test]
    fn missing_schema_file_is_a_schema_error() {
        let dir = TempDir::new().unwrap();
        let artifact = DataIngestionArtifact {
            trained_file_path: dir.path().join("train.csv"),
            test_file_path: dir.path().join("test.csv"),
        };
        let config = DataValidationConfig {
            data_validation_dir: dir.path().to_path_buf(),
            drift_report_file_path: dir.path().join("report.json"),
            drift_share_threshold: 0.5,
            stattest_threshold: None,
            schema_file_path: dir.path().join("absent.toml"),
        };

        let err = DataValidation::new(artifact, config).err().unwrap();
        assert!(matches!(err, PredictiveError::SchemaError { .. }));
    }

    #[test]
    fn missing_train_file_propagates() {
        let dir = TempDir::new().unwrap();
        assert!(validation(&dir).initiate_data_validation().is_err());
    }
}
