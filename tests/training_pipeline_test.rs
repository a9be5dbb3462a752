use predictive_analytics::components::DataValidation;
use predictive_analytics::constants::{
    DATA_INGESTION_DIR_NAME, DATA_INGESTION_FEATURE_STORE_DIR, FILE_NAME,
};
use predictive_analytics::domain::Table;
use predictive_analytics::entity::{DataIngestionArtifact, DataValidationConfig};
use predictive_analytics::{MongoExportSource, PipelineToml, PredictiveError, TrainingPipeline};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const CONTINENTS: [&str; 4] = ["Asia", "Europe", "Africa", "North America"];
const EDUCATION: [&str; 4] = ["High School", "Bachelor's", "Master's", "Doctorate"];
const REGIONS: [&str; 3] = ["West", "Northeast", "South"];

fn schema_path() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("config/schema.toml")
        .display()
        .to_string()
}

fn write_export(root: &Path, n: usize) {
    let dir = root.join("mongo-export/PREDICTIVE_ANALYTICS");
    std::fs::create_dir_all(&dir).unwrap();
    let mut file = std::fs::File::create(dir.join("travel_data.json")).unwrap();

    for i in 0..n {
        let doc = serde_json::json!({
            "_id": {"$oid": format!("65a1f0c2e4b0{:012x}", i)},
            "case_id": format!("EZYV{}", i + 1),
            "continent": CONTINENTS[i % CONTINENTS.len()],
            "education_of_employee": EDUCATION[i % EDUCATION.len()],
            "has_job_experience": if i % 3 == 0 { "N" } else { "Y" },
            "requires_job_training": if i % 5 == 0 { "Y" } else { "N" },
            "no_of_employees": 100 + (i * 37) % 5000,
            "yr_of_estab": 1950 + (i * 7) % 70,
            "region_of_employment": REGIONS[i % REGIONS.len()],
            "prevailing_wage": 20000.0 + ((i * 1543) % 90000) as f64,
            "unit_of_wage": "Year",
            "full_time_position": if i % 4 == 0 { "N" } else { "Y" },
            "case_status": if i % 3 == 0 { "Denied" } else { "Certified" },
        });
        writeln!(file, "{}", doc).unwrap();
    }
}

fn settings(root: &Path) -> PipelineToml {
    let mut settings = PipelineToml::default();
    settings.pipeline.artifact_dir = root.join("artifact").display().to_string();
    settings.source.export_dir = root.join("mongo-export").display().to_string();
    settings.validation.schema_file = schema_path();
    settings
}

#[tokio::test]
async fn pipeline_runs_from_mongo_export() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_export(dir.path(), 120);
    let settings = settings(dir.path());
    let source = MongoExportSource::new(&settings.source.export_dir);

    let pipeline = TrainingPipeline::new(&settings, source);
    let outcome = pipeline.run_pipeline().await?;

    let feature_store = pipeline
        .pipeline_config()
        .artifact_dir
        .join(DATA_INGESTION_DIR_NAME)
        .join(DATA_INGESTION_FEATURE_STORE_DIR)
        .join(FILE_NAME);
    let store = Table::read_csv(&feature_store)?;
    assert_eq!(store.n_rows(), 120);
    assert_eq!(store.n_columns(), 12);
    assert!(!store.has_column("_id"));

    let train = Table::read_csv(&outcome.ingestion.trained_file_path)?;
    let test = Table::read_csv(&outcome.ingestion.test_file_path)?;
    assert_eq!(train.n_rows(), 96);
    assert_eq!(test.n_rows(), 24);
    assert_eq!(train.headers(), store.headers());

    assert!(outcome.validation.validation_status);
    assert!(
        outcome.validation.message == "Drift detected"
            || outcome.validation.message == "Drift not detected"
    );
    assert!(outcome.validation.drift_report_file_path.exists());
    Ok(())
}

#[tokio::test]
async fn missing_export_is_reported() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path());
    let source = MongoExportSource::new(&settings.source.export_dir);

    let err = TrainingPipeline::new(&settings, source)
        .run_pipeline()
        .await
        .unwrap_err();

    assert!(matches!(err, PredictiveError::DataError { .. }));
}

#[test]
fn standalone_validation_flags_missing_columns() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut table = Table::new(vec!["continent".into(), "case_status".into()]);
    table.push_row(vec!["Asia".into(), "Certified".into()])?;
    table.write_csv(dir.path().join("train.csv"))?;
    table.write_csv(dir.path().join("test.csv"))?;

    let mut settings = PipelineToml::default();
    settings.validation.schema_file = schema_path();
    let artifact = DataIngestionArtifact {
        trained_file_path: dir.path().join("train.csv"),
        test_file_path: dir.path().join("test.csv"),
    };
    let config = DataValidationConfig::standalone(&settings, dir.path().join("report.json"));

    let result = DataValidation::new(artifact, config)?.initiate_data_validation()?;

    assert!(!result.validation_status);
    assert!(result.message.contains("Training data: Column count mismatch."));
    assert!(result.message.contains("Missing required columns"));
    assert!(!dir.path().join("report.json").exists());
    Ok(())
}
