use clap::Parser;
use predictive_analytics::components::DataValidation;
use predictive_analytics::config::toml_config::{SourceKind, StorageBackend};
use predictive_analytics::domain::CollectionSource;
use predictive_analytics::config::Command;
use predictive_analytics::entity::{DataIngestionArtifact, DataValidationConfig, TravelPredictorConfig};
use predictive_analytics::pipeline::{JsonModelLoader, TrainingOutcome};
use predictive_analytics::utils::error::{ErrorSeverity, Result};
use predictive_analytics::utils::{logger, validation::Validate};
use predictive_analytics::{
    CliConfig, EnvConfig, LocalStorage, MongoDbClient, MongoExportSource, PipelineToml,
    TrainingPipeline, TravelClassifier,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting predictive-analytics CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}

/// Returns whether the command succeeded; a failed validation is not an error.
async fn run(cli: CliConfig) -> Result<bool> {
    let settings = PipelineToml::load_or_default(&cli.config)?;
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match cli.command {
        Command::EnvCheck => {
            let env = EnvConfig::from_env()?;
            env.validate()?;
            println!("✅ Environment configuration is complete");
            for (key, value) in env.summary() {
                println!("  {} = {}", key, value);
            }
            Ok(true)
        }
        Command::Run => {
            let client = MongoDbClient::new(settings.source.database.as_deref())?;
            let mut settings = settings;
            settings.source.database = Some(client.database_name().to_string());

            let outcome = match settings.source.kind {
                SourceKind::Mongodb => train_from_mongodb(&settings, client, cli.monitor).await?,
                SourceKind::Export => {
                    let source = MongoExportSource::with_client(&settings.source.export_dir, client);
                    train(&settings, source, cli.monitor).await?
                }
            };
            println!("📁 Train file: {}", outcome.ingestion.trained_file_path.display());
            println!("📁 Test file: {}", outcome.ingestion.test_file_path.display());
            println!("{}", outcome.validation);
            if outcome.validation.validation_status {
                println!("✅ Training pipeline completed successfully!");
            } else {
                eprintln!("❌ Data validation failed: {}", outcome.validation.message);
            }
            Ok(outcome.validation.validation_status)
        }
        Command::Validate {
            train,
            test,
            report,
        } => {
            let artifact = DataIngestionArtifact {
                trained_file_path: train,
                test_file_path: test,
            };
            let config = DataValidationConfig::standalone(&settings, report);
            let validation = DataValidation::new(artifact, config)?.initiate_data_validation()?;
            println!("{}", validation);
            Ok(validation.validation_status)
        }
        Command::Predict(args) => {
            let frame = args.travel_data()?.get_travel_input_data_frame()?;
            let config = TravelPredictorConfig::new(&settings);

            let label = match settings.storage.backend {
                StorageBackend::Local => {
                    let storage = LocalStorage::new(&settings.storage.local_path);
                    TravelClassifier::new(config, storage, JsonModelLoader)
                        .predict(&frame)
                        .await?
                }
                StorageBackend::S3 => predict_from_s3(&settings, config, &frame).await?,
            };
            println!("{}", label);
            Ok(true)
        }
    }
}

async fn train<C: CollectionSource>(
    settings: &PipelineToml,
    source: C,
    monitor: bool,
) -> Result<TrainingOutcome> {
    TrainingPipeline::new_with_monitoring(settings, source, chrono::Local::now(), monitor)
        .run_pipeline()
        .await
}

#[cfg(feature = "mongodb")]
async fn train_from_mongodb(
    settings: &PipelineToml,
    client: MongoDbClient,
    monitor: bool,
) -> Result<TrainingOutcome> {
    let source = predictive_analytics::MongoDbSource::new(client);
    train(settings, source, monitor).await
}

#[cfg(not(feature = "mongodb"))]
async fn train_from_mongodb(
    _settings: &PipelineToml,
    _client: MongoDbClient,
    _monitor: bool,
) -> Result<TrainingOutcome> {
    Err(predictive_analytics::PredictiveError::ConfigError {
        message: "source.kind = \"mongodb\" requires a build with the `mongodb` feature".to_string(),
    })
}

#[cfg(feature = "s3")]
async fn predict_from_s3(
    settings: &PipelineToml,
    config: TravelPredictorConfig,
    frame: &predictive_analytics::domain::Table,
) -> Result<String> {
    let env = EnvConfig::from_env()?;
    let mut credentials = env.aws_credentials()?.clone();
    if let Some(region) = &settings.storage.region {
        credentials = predictive_analytics::config::env::AwsCredentials::new(
            credentials.access_key_id().to_string(),
            credentials.secret_access_key().to_string(),
            region.clone(),
        )?;
    }
    let storage = predictive_analytics::S3Storage::from_credentials(
        &credentials,
        config.model_bucket_name.clone(),
    )
    .await;
    TravelClassifier::new(config, storage, JsonModelLoader)
        .predict(frame)
        .await
}

#[cfg(not(feature = "s3"))]
async fn predict_from_s3(
    _settings: &PipelineToml,
    _config: TravelPredictorConfig,
    _frame: &predictive_analytics::domain::Table,
) -> Result<String> {
    Err(predictive_analytics::PredictiveError::ConfigError {
        message: "storage.backend = \"s3\" requires a build with the `s3` feature".to_string(),
    })
}
