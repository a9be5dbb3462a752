#[cfg(feature = "s3")]
use crate::config::env::AwsCredentials;
#[cfg(feature = "s3")]
use crate::domain::Storage;
#[cfg(feature = "s3")]
use crate::utils::error::{PredictiveError, Result};
#[cfg(feature = "s3")]
use aws_config::BehaviorVersion;
#[cfg(feature = "s3")]
use aws_sdk_s3::config::{Credentials, Region};
#[cfg(feature = "s3")]
use aws_sdk_s3::operation::get_object::GetObjectError;
#[cfg(feature = "s3")]
use aws_sdk_s3::operation::head_object::HeadObjectError;
#[cfg(feature = "s3")]
use aws_sdk_s3::Client as S3Client;

/// Model registry kept in an S3 bucket.
#[cfg(feature = "s3")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "s3")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Builds a client from the credentials loaded out of the environment.
    pub async fn from_credentials(credentials: &AwsCredentials, bucket: String) -> Self {
        let static_credentials = Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            None,
            None,
            "environment",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region().to_string()))
            .credentials_provider(static_credentials)
            .load()
            .await;

        tracing::info!(bucket = %bucket, region = credentials.region(), "S3 model registry configured");
        Self::new(S3Client::new(&shared), bucket)
    }
}

#[cfg(feature = "s3")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                GetObjectError::NoSuchKey(_) => PredictiveError::StorageError {
                    message: format!("s3://{}/{} does not exist", self.bucket, path),
                },
                other => PredictiveError::StorageError {
                    message: format!("Failed to read s3://{}/{}: {}", self.bucket, path, other),
                },
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| PredictiveError::StorageError {
                message: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| PredictiveError::StorageError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    e.into_service_error()
                ),
            })?;

        tracing::debug!(bucket = %self.bucket, key = path, bytes = data.len(), "object uploaded");
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match e.into_service_error() {
                HeadObjectError::NotFound(_) => Ok(false),
                other => Err(PredictiveError::StorageError {
                    message: format!("Failed to stat s3://{}/{}: {}", self.bucket, path, other),
                }),
            },
        }
    }
}
