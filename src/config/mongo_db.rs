#[cfg(feature = "mongodb")]
use crate::config::env::MongoDbClient;
#[cfg(feature = "mongodb")]
use crate::domain::{CollectionSource, Record};
#[cfg(feature = "mongodb")]
use crate::utils::error::{PredictiveError, Result};
#[cfg(feature = "mongodb")]
use async_trait::async_trait;
#[cfg(feature = "mongodb")]
use mongodb::bson::{doc, Bson, Document};
#[cfg(feature = "mongodb")]
use mongodb::Client;
#[cfg(feature = "mongodb")]
use tokio::sync::OnceCell;

/// Reads a collection from the deployment named by `MONGODB_URL`.
///
/// The driver client is built on first use and kept for later reads.
#[cfg(feature = "mongodb")]
pub struct MongoDbSource {
    settings: MongoDbClient,
    client: OnceCell<Client>,
}

#[cfg(feature = "mongodb")]
fn driver_error(action: &str, error: mongodb::error::Error) -> PredictiveError {
    PredictiveError::StorageError {
        message: format!("MongoDB {} failed: {}", action, error),
    }
}

/// Flattens a BSON document into a record using relaxed extended JSON.
#[cfg(feature = "mongodb")]
pub fn document_to_record(document: Document) -> Result<Record> {
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(map) => Ok(Record::new(map)),
        other => Err(PredictiveError::DataError {
            message: format!("document did not convert to an object: {}", other),
        }),
    }
}

#[cfg(feature = "mongodb")]
impl MongoDbSource {
    pub fn new(settings: MongoDbClient) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    pub fn database_name(&self) -> &str {
        self.settings.database_name()
    }

    async fn client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                tracing::info!(uri = %self.settings.uri(), "🔌 Connecting to MongoDB");
                Client::with_uri_str(self.settings.uri().expose())
                    .await
                    .map_err(|e| driver_error("connection", e))
            })
            .await
    }
}

#[cfg(feature = "mongodb")]
#[async_trait]
impl CollectionSource for MongoDbSource {
    async fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Record>> {
        let database = if database == self.settings.database_name() {
            database
        } else {
            tracing::debug!(
                requested = database,
                using = self.settings.database_name(),
                "database taken from the connection settings"
            );
            self.settings.database_name()
        };

        let client = self.client().await?;
        tracing::info!("📥 Reading collection {}.{} from MongoDB", database, collection);

        let mut cursor = client
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .await
            .map_err(|e| driver_error("find", e))?;

        let mut records = Vec::new();
        while cursor.advance().await.map_err(|e| driver_error("cursor", e))? {
            let document = cursor
                .deserialize_current()
                .map_err(|e| driver_error("decode", e))?;
            records.push(document_to_record(document)?);
        }

        tracing::debug!(documents = records.len(), "collection read");
        Ok(records)
    }
}

#[cfg(all(test, feature = "mongodb"))]
mod tests {
    use super::*;
    use crate::config::env::EnvConfig;
    use crate::domain::Table;
    use mongodb::bson::oid::ObjectId;

    fn settings(url: &str, database: Option<&str>) -> MongoDbClient {
        let env = EnvConfig::mongo_only_from_lookup(|key| {
            (key == crate::constants::MONGODB_URL_KEY).then(|| url.to_string())
        })
        .unwrap();
        MongoDbClient::from_env_config(&env, database)
    }

    #[test]
    fn documents_become_flat_records() {
        let record = document_to_record(doc! {
            "_id": ObjectId::new(),
            "case_id": "EZYV01",
            "continent": "Asia",
            "no_of_employees": 2412_i32,
            "prevailing_wage": 83425.65,
        })
        .unwrap();

        assert_eq!(record.data["continent"], "Asia");
        assert_eq!(record.data["no_of_employees"], 2412);
        assert_eq!(record.data["prevailing_wage"], 83425.65);
        assert!(record.data["_id"].get("$oid").is_some());

        let table = Table::from_records(&[record], &["_id"]);
        assert_eq!(
            table.headers(),
            ["case_id", "continent", "no_of_employees", "prevailing_wage"]
        );
    }

    #[test]
    fn database_comes_from_the_url() {
        let source = MongoDbSource::new(settings(
            "mongodb+srv://analyst:pw@cluster0.example.net/visa_db",
            None,
        ));
        assert_eq!(source.database_name(), "visa_db");
    }

    #[tokio::test]
    async fn unreachable_deployment_is_a_storage_error() {
        let source = MongoDbSource::new(settings(
            "mongodb://127.0.0.1:1/travel?serverSelectionTimeoutMS=200&connectTimeoutMS=200",
            None,
        ));

        let err = source
            .export_collection("travel", "travel_data")
            .await
            .unwrap_err();

        assert!(matches!(err, PredictiveError::StorageError { .. }));
    }
}
