//! Domain model inference components

pub mod aggregator;
pub mod inference;
pub mod loader;

pub use aggregator::{EqsBreakdown, EqsWeights, RawPredictions, ScoreAggregator, WaterScale};
pub use inference::{InferenceEngine, QualityModel};
pub use loader::{DomainModels, ModelLoader, OnnxModel};
