use crate::domain::{Estimator, ModelLoader, Storage, Table};
use crate::utils::error::{PredictiveError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFeature {
    pub mean: f64,
    pub scale: f64,
    pub weight: f64,
}

/// Logistic scorer exported by the training side as JSON.
///
/// Numeric features are standardised with `(x - mean) / scale`; categorical
/// features add the weight of their value, unknown values add nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// `[negative, positive]` labels.
    pub classes: [String; 2],
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, NumericFeature>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearClassifier {
    fn column<'t>(&self, features: &'t Table, name: &str) -> Result<Vec<&'t str>> {
        features.column(name).ok_or_else(|| PredictiveError::ModelError {
            message: format!("feature column '{}' is missing from the input", name),
        })
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, features: &Table) -> Result<Vec<f64>> {
        let mut scores = vec![self.intercept; features.n_rows()];

        for (name, feature) in &self.numeric {
            let scale = if feature.scale == 0.0 { 1.0 } else { feature.scale };
            for (score, cell) in scores.iter_mut().zip(self.column(features, name)?) {
                let value: f64 = cell.trim().parse().map_err(|_| PredictiveError::ModelError {
                    message: format!("feature '{}' expects a number, got '{}'", name, cell),
                })?;
                *score += feature.weight * (value - feature.mean) / scale;
            }
        }

        for (name, weights) in &self.categorical {
            for (score, cell) in scores.iter_mut().zip(self.column(features, name)?) {
                *score += weights.get(cell.trim()).copied().unwrap_or(0.0);
            }
        }

        Ok(scores.into_iter().map(|s| 1.0 / (1.0 + (-s).exp())).collect())
    }
}

impl Estimator for LinearClassifier {
    fn predict(&self, features: &Table) -> Result<Vec<String>> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| {
                let index = usize::from(p >= 0.5);
                self.classes[index].clone()
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelLoader;

impl ModelLoader for JsonModelLoader {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn Estimator>> {
        let model: LinearClassifier =
            serde_json::from_slice(bytes).map_err(|e| PredictiveError::ModelError {
                message: format!("model artefact is not a valid linear classifier: {}", e),
            })?;
        Ok(Box::new(model))
    }
}

/// A model kept in the registry bucket, fetched and decoded on first use.
pub struct TravelEstimator<S: Storage, L: ModelLoader> {
    storage: S,
    loader: L,
    bucket_name: String,
    model_path: String,
    loaded_model: OnceCell<Box<dyn Estimator>>,
}

impl<S: Storage, L: ModelLoader> TravelEstimator<S, L> {
    pub fn new(storage: S, loader: L, bucket_name: String, model_path: String) -> Self {
        Self {
            storage,
            loader,
            bucket_name,
            model_path,
            loaded_model: OnceCell::new(),
        }
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub async fn is_model_present(&self) -> Result<bool> {
        self.storage.exists(&self.model_path).await
    }

    pub async fn load_model(&self) -> Result<&dyn Estimator> {
        let model = self
            .loaded_model
            .get_or_try_init(|| async {
                if !self.storage.exists(&self.model_path).await? {
                    return Err(PredictiveError::ModelError {
                        message: format!(
                            "no model found at {}/{}",
                            self.bucket_name, self.model_path
                        ),
                    });
                }
                tracing::info!("📦 Loading model from {}/{}", self.bucket_name, self.model_path);
                let bytes = self.storage.read_file(&self.model_path).await?;
                self.loader.load(&bytes)
            })
            .await?;
        Ok(model.as_ref())
    }

    pub async fn save_model(&self, bytes: &[u8]) -> Result<()> {
        self.storage.write_file(&self.model_path, bytes).await?;
        tracing::info!("Model saved to {}/{}", self.bucket_name, self.model_path);
        Ok(())
    }

    pub async fn predict(&self, features: &Table) -> Result<Vec<String>> {
        self.load_model().await?.predict(features)
    }
}
