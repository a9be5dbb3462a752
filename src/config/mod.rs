pub mod cli;
pub mod env;
pub mod mongo_db;
pub mod mongo_export;
pub mod s3;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "predictive-analytics")]
#[command(about = "Ingest, validate and serve predictions for the travel dataset")]
pub struct CliConfig {
    /// Path to the pipeline TOML file
    #[arg(short, long, global = true, default_value = crate::constants::CONFIG_FILE_PATH)]
    pub config: PathBuf,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check the required environment variables and print a redacted summary
    EnvCheck,
    /// Run the training pipeline: data ingestion followed by data validation
    Run,
    /// Validate existing train/test CSV files against the schema
    Validate {
        #[arg(long)]
        train: PathBuf,
        #[arg(long)]
        test: PathBuf,
        /// Where to write the drift report
        #[arg(long, default_value = "drift_report/report.json")]
        report: PathBuf,
    },
    /// Predict the outcome for one applicant
    Predict(PredictArgs),
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    /// JSON file holding one applicant; replaces the field flags
    #[arg(long, conflicts_with_all = [
        "continent", "education_of_employee", "has_job_experience", "requires_job_training",
        "no_of_employees", "region_of_employment", "prevailing_wage", "unit_of_wage",
        "full_time_position", "company_age",
    ])]
    pub input: Option<PathBuf>,

    #[arg(long, required_unless_present = "input")]
    pub continent: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub education_of_employee: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub has_job_experience: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub requires_job_training: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub no_of_employees: Option<i64>,
    #[arg(long, required_unless_present = "input")]
    pub region_of_employment: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub prevailing_wage: Option<f64>,
    #[arg(long, required_unless_present = "input")]
    pub unit_of_wage: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub full_time_position: Option<String>,
    #[arg(long, required_unless_present = "input")]
    pub company_age: Option<i64>,
}

#[cfg(feature = "cli")]
fn required<T: Clone>(field: &str, value: &Option<T>) -> crate::utils::error::Result<T> {
    value
        .clone()
        .ok_or_else(|| crate::utils::error::PredictiveError::MissingConfigError {
            field: field.to_string(),
        })
}

#[cfg(feature = "cli")]
impl PredictArgs {
    /// The applicant from `--input`, or assembled from the field flags.
    pub fn travel_data(&self) -> crate::utils::error::Result<crate::pipeline::TravelData> {
        if let Some(input) = &self.input {
            let bytes = std::fs::read(input)?;
            return crate::pipeline::TravelData::from_json(&bytes);
        }

        Ok(crate::pipeline::TravelData {
            continent: required("continent", &self.continent)?,
            education_of_employee: required("education_of_employee", &self.education_of_employee)?,
            has_job_experience: required("has_job_experience", &self.has_job_experience)?,
            requires_job_training: required("requires_job_training", &self.requires_job_training)?,
            no_of_employees: required("no_of_employees", &self.no_of_employees)?,
            region_of_employment: required("region_of_employment", &self.region_of_employment)?,
            prevailing_wage: required("prevailing_wage", &self.prevailing_wage)?,
            unit_of_wage: required("unit_of_wage", &self.unit_of_wage)?,
            full_time_position: required("full_time_position", &self.full_time_position)?,
            company_age: required("company_age", &self.company_age)?,
        })
    }
}
