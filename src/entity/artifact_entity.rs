use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

impl fmt::Display for DataIngestionArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataIngestionArtifact(train={}, test={})",
            self.trained_file_path.display(),
            self.test_file_path.display()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub drift_report_file_path: PathBuf,
}

impl fmt::Display for DataValidationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataValidationArtifact(status={}, message=\"{}\", report={})",
            self.validation_status,
            self.message,
            self.drift_report_file_path.display()
        )
    }
}
