use crate::components::data_ingestion::DataIngestion;
use crate::components::data_validation::DataValidation;
use crate::config::toml_config::PipelineToml;
use crate::domain::CollectionSource;
use crate::entity::{
    DataIngestionArtifact, DataIngestionConfig, DataValidationArtifact, DataValidationConfig,
    TrainingPipelineConfig,
};
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
}

/// Ingestion followed by validation, sharing one timestamped artefact directory.
pub struct TrainingPipeline<C: CollectionSource> {
    pipeline_config: TrainingPipelineConfig,
    data_ingestion_config: DataIngestionConfig,
    data_validation_config: DataValidationConfig,
    source: C,
    monitor: ResourceMonitor,
}

impl<C: CollectionSource> TrainingPipeline<C> {
    pub fn new(settings: &PipelineToml, source: C) -> Self {
        Self::new_with_monitoring(settings, source, Local::now(), false)
    }

    pub fn new_with_monitoring(
        settings: &PipelineToml,
        source: C,
        started_at: DateTime<Local>,
        monitor_enabled: bool,
    ) -> Self {
        let pipeline_config = TrainingPipelineConfig::new(settings, started_at);
        Self {
            data_ingestion_config: DataIngestionConfig::new(&pipeline_config, settings),
            data_validation_config: DataValidationConfig::new(&pipeline_config, settings),
            pipeline_config,
            source,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline_config(&self) -> &TrainingPipelineConfig {
        &self.pipeline_config
    }

    pub async fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        tracing::info!("Entered start_data_ingestion of TrainingPipeline");
        let ingestion = DataIngestion::new(self.data_ingestion_config.clone(), &self.source);
        let artifact = ingestion.initiate_data_ingestion().await?;
        self.monitor.log_stage("data_ingestion");
        tracing::info!("Exited start_data_ingestion of TrainingPipeline");
        Ok(artifact)
    }

    pub fn start_data_validation(
        &self,
        data_ingestion_artifact: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        tracing::info!("Entered start_data_validation of TrainingPipeline");
        let validation = DataValidation::new(
            data_ingestion_artifact.clone(),
            self.data_validation_config.clone(),
        )?;
        let artifact = validation.initiate_data_validation()?;
        self.monitor.log_stage("data_validation");
        tracing::info!("Exited start_data_validation of TrainingPipeline");
        Ok(artifact)
    }

    pub async fn run_pipeline(&self) -> Result<TrainingOutcome> {
        tracing::info!(
            "🚀 Starting {} in {}",
            self.pipeline_config.pipeline_name,
            self.pipeline_config.artifact_dir.display()
        );

        let ingestion = self.start_data_ingestion().await?;
        let validation = self.start_data_validation(&ingestion)?;
        if !validation.validation_status {
            tracing::warn!("⚠️ Validation failed: {}", validation.message);
        }

        self.monitor.log_final();
        Ok(TrainingOutcome {
            ingestion,
            validation,
        })
    }
}
