use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictiveError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Missing environment variables: {}", variables.join(", "))]
    MissingEnvVarError { variables: Vec<String> },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Schema error: {message}")]
    SchemaError { message: String },

    #[error("Data error: {message}")]
    DataError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Model error: {message}")]
    ModelError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Storage,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PredictiveError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::MissingEnvVarError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::CsvError(_)
            | Self::SchemaError { .. }
            | Self::DataError { .. }
            | Self::ValidationError { .. }
            | Self::SerializationError(_) => ErrorCategory::Data,
            Self::StorageError { .. } => ErrorCategory::Storage,
            Self::ModelError { .. } => ErrorCategory::Model,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Data | ErrorCategory::Model => ErrorSeverity::High,
            // remote object stores are usually worth a retry
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingEnvVarError { .. } => {
                "Export MONGODB_URL, AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY before running"
            }
            Self::InvalidConfigValueError { .. } | Self::ConfigValidationError { .. } => {
                "Fix the reported value in the environment or the pipeline TOML file"
            }
            Self::ConfigError { .. } | Self::MissingConfigError { .. } | Self::TomlError(_) => {
                "Check the pipeline TOML file for missing or malformed sections"
            }
            Self::SchemaError { .. } => "Check that the schema file lists every dataset column",
            Self::CsvError(_) | Self::DataError { .. } | Self::SerializationError(_) => {
                "Inspect the exported collection for malformed or empty records"
            }
            Self::ValidationError { .. } => {
                "Declare every listed column under [[columns]] in the schema file"
            }
            Self::StorageError { .. } => {
                "Check that the S3 bucket or MongoDB deployment is reachable and the credentials are valid, then retry"
            }
            Self::ModelError { .. } => {
                "Make sure a model artefact has been pushed to the configured model path"
            }
            Self::IoError(_) => "Check file permissions and free disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingEnvVarError { variables } => format!(
                "Required environment variables are not set: {}",
                variables.join(", ")
            ),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            Self::ModelError { message } => format!("Prediction unavailable: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictiveError>;
