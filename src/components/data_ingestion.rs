use crate::constants::DOCUMENT_ID_FIELD;
use crate::domain::{CollectionSource, Table};
use crate::entity::{DataIngestionArtifact, DataIngestionConfig};
use crate::utils::error::{PredictiveError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Pulls the source collection into the feature store and splits it.
pub struct DataIngestion<'a, C: CollectionSource> {
    config: DataIngestionConfig,
    source: &'a C,
}

impl<'a, C: CollectionSource> DataIngestion<'a, C> {
    pub fn new(config: DataIngestionConfig, source: &'a C) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    pub async fn export_data_into_feature_store(&self) -> Result<Table> {
        tracing::info!(
            "📤 Exporting {}.{} into the feature store",
            self.config.database_name,
            self.config.collection_name
        );

        let records = self
            .source
            .export_collection(&self.config.database_name, &self.config.collection_name)
            .await?;
        if records.is_empty() {
            return Err(PredictiveError::DataError {
                message: format!(
                    "collection {}.{} is empty",
                    self.config.database_name, self.config.collection_name
                ),
            });
        }

        let table = Table::from_records(&records, &[DOCUMENT_ID_FIELD]);
        tracing::info!(
            rows = table.n_rows(),
            columns = table.n_columns(),
            "shape of exported data"
        );

        table.write_csv(&self.config.feature_store_file_path)?;
        tracing::info!(
            "💾 Feature store written to {}",
            self.config.feature_store_file_path.display()
        );
        Ok(table)
    }

    /// Seeded shuffle, then the first `ceil(n * ratio)` rows become the test set.
    pub fn split_data_as_train_test(&self, table: &Table) -> Result<(Table, Table)> {
        let n = table.n_rows();
        if n < 2 {
            return Err(PredictiveError::DataError {
                message: format!("need at least 2 rows to split, got {}", n),
            });
        }

        let test_size = (n as f64 * self.config.train_test_split_ratio).ceil() as usize;
        if test_size == 0 || test_size >= n {
            return Err(PredictiveError::DataError {
                message: format!(
                    "split ratio {} leaves an empty set for {} rows",
                    self.config.train_test_split_ratio, n
                ),
            });
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        indices.shuffle(&mut rng);

        let (test_indices, train_indices) = indices.split_at(test_size);
        let train = table.select_rows(train_indices);
        let test = table.select_rows(test_indices);

        train.write_csv(&self.config.training_file_path)?;
        test.write_csv(&self.config.testing_file_path)?;

        tracing::info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            "✂️ Performed train/test split"
        );
        Ok((train, test))
    }

    pub async fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        tracing::info!("Entered initiate_data_ingestion");

        let table = self.export_data_into_feature_store().await?;
        self.split_data_as_train_test(&table)?;

        let artifact = DataIngestionArtifact {
            trained_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        };
        tracing::info!("Data ingestion completed: {}", artifact);
        Ok(artifact)
    }
}
