use crate::domain::model::{Record, Table};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Object storage for model artefacts (local directory or S3 bucket).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Where raw documents come from. The MongoDB collection is reached through this.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn export_collection(&self, database: &str, collection: &str) -> Result<Vec<Record>>;
}

/// A fitted model able to label rows of a feature table.
pub trait Estimator: Send + Sync {
    fn predict(&self, features: &Table) -> Result<Vec<String>>;
}

/// Decodes a stored model artefact.
pub trait ModelLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Estimator>>;
}
