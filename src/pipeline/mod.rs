pub mod estimator;
pub mod prediction_pipeline;
pub mod training_pipeline;

pub use estimator::{JsonModelLoader, LinearClassifier, TravelEstimator};
pub use prediction_pipeline::{TravelClassifier, TravelData};
pub use training_pipeline::{TrainingOutcome, TrainingPipeline};
