use crate::domain::{ModelLoader, Storage, Table};
use crate::entity::TravelPredictorConfig;
use crate::pipeline::estimator::TravelEstimator;
use crate::utils::error::{PredictiveError, Result};
use serde::{Deserialize, Serialize};

/// Features of one applicant, as the trained model expects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelData {
    pub continent: String,
    pub education_of_employee: String,
    pub has_job_experience: String,
    pub requires_job_training: String,
    pub no_of_employees: i64,
    pub region_of_employment: String,
    pub prevailing_wage: f64,
    pub unit_of_wage: String,
    pub full_time_position: String,
    pub company_age: i64,
}

impl TravelData {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Column name to single value, in model feature order.
    pub fn get_travel_data_as_dict(&self) -> Vec<(&'static str, String)> {
        vec![
            ("continent", self.continent.clone()),
            ("education_of_employee", self.education_of_employee.clone()),
            ("has_job_experience", self.has_job_experience.clone()),
            ("requires_job_training", self.requires_job_training.clone()),
            ("no_of_employees", self.no_of_employees.to_string()),
            ("region_of_employment", self.region_of_employment.clone()),
            ("prevailing_wage", self.prevailing_wage.to_string()),
            ("unit_of_wage", self.unit_of_wage.clone()),
            ("full_time_position", self.full_time_position.clone()),
            ("company_age", self.company_age.to_string()),
        ]
    }

    pub fn get_travel_input_data_frame(&self) -> Result<Table> {
        let (headers, row): (Vec<String>, Vec<String>) = self
            .get_travel_data_as_dict()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .unzip();

        let mut table = Table::new(headers);
        table.push_row(row)?;
        tracing::debug!("Created travel input frame");
        Ok(table)
    }
}

pub struct TravelClassifier<S: Storage, L: ModelLoader> {
    prediction_pipeline_config: TravelPredictorConfig,
    estimator: TravelEstimator<S, L>,
}

impl<S: Storage, L: ModelLoader> TravelClassifier<S, L> {
    pub fn new(prediction_pipeline_config: TravelPredictorConfig, storage: S, loader: L) -> Self {
        let estimator = TravelEstimator::new(
            storage,
            loader,
            prediction_pipeline_config.model_bucket_name.clone(),
            prediction_pipeline_config.model_file_path.clone(),
        );
        Self {
            prediction_pipeline_config,
            estimator,
        }
    }

    pub fn config(&self) -> &TravelPredictorConfig {
        &self.prediction_pipeline_config
    }

    /// Label for the first row of `dataframe`.
    pub async fn predict(&self, dataframe: &Table) -> Result<String> {
        tracing::info!("Entered predict method of TravelClassifier");
        let predictions = self.estimator.predict(dataframe).await?;
        predictions
            .into_iter()
            .next()
            .ok_or_else(|| PredictiveError::ModelError {
                message: "model returned no prediction for the input".to_string(),
            })
    }
}
