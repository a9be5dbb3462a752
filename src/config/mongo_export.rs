use crate::config::env::MongoDbClient;
use crate::domain::{CollectionSource, Record};
use crate::utils::error::{PredictiveError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads collections from `mongoexport` dumps.
///
/// A collection lives at `<export_dir>/<database>/<collection>.json` (a JSON
/// array, or one document per line) or `<collection>.jsonl`.
#[derive(Debug, Clone)]
pub struct MongoExportSource {
    export_dir: PathBuf,
    client: Option<MongoDbClient>,
}

impl MongoExportSource {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            client: None,
        }
    }

    /// Ties the source to validated connection settings; the client's database wins.
    pub fn with_client(export_dir: impl Into<PathBuf>, client: MongoDbClient) -> Self {
        Self {
            export_dir: export_dir.into(),
            client: Some(client),
        }
    }

    fn collection_path(&self, database: &str, collection: &str) -> Option<PathBuf> {
        let dir = self.export_dir.join(database);
        ["json", "jsonl"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", collection, ext)))
            .find(|p| p.exists())
    }
}

fn parse_documents(content: &str, path: &Path) -> Result<Vec<Record>> {
    let trimmed = content.trim_start();
    let values: Vec<serde_json::Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)?
    } else {
        trimmed
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<serde_json::Value>)
            .collect::<std::result::Result<_, _>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            serde_json::Value::Object(map) => Ok(Record::new(map)),
            other => Err(PredictiveError::DataError {
                message: format!(
                    "document {} in {} is not an object: {}",
                    index,
                    path.display(),
                    other
                ),
            }),
        })
        .collect()
}

#[async_trait]
impl CollectionSource for MongoExportSource {
    async fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Record>> {
        let database = self
            .client
            .as_ref()
            .map(|c| c.database_name())
            .unwrap_or(database);

        let path = self
            .collection_path(database, collection)
            .ok_or_else(|| PredictiveError::DataError {
                message: format!(
                    "no export found for {}.{} under {}",
                    database,
                    collection,
                    self.export_dir.display()
                ),
            })?;

        tracing::info!("📥 Reading collection {}.{} from {}", database, collection, path.display());
        let content = tokio::fs::read_to_string(&path).await?;
        let records = parse_documents(&content, &path)?;
        tracing::debug!(documents = records.len(), "collection export parsed");
        Ok(records)
    }
}
