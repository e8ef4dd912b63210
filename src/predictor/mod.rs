//! Property Predictor
//!
//! Wraps the fixed surrogate model that maps a (composition, processing)
//! vector to a predicted mechanical property value.
//!
//! ## Architecture
//! - `PropertyModel`: evaluation seam over a canonical 19-feature vector
//! - `baseline`: built-in closed-form strengthening model (mode `baseline`)
//! - `surrogate`: Gaussian-process and linear models restored from artifacts
//! - `loader`: artifact retrieval from disk or URL, with an on-disk cache
//! - `registry`: lazily-initialized per (target, mode) predictor cache
//!
//! A `Predictor` is immutable once built and shared as `Arc<Predictor>`.
//! Evaluation is pure: identical inputs always produce the identical value.

pub mod baseline;
pub mod loader;
pub mod registry;
pub mod surrogate;

pub use baseline::StrengtheningModel;
pub use loader::{ArtifactError, ArtifactSource};
pub use registry::{ModelKey, ModelRegistry, ModelStatus};
pub use surrogate::{GaussianProcessModel, LinearModel, ModelArtifact};

use thiserror::Error;

use crate::schema::Features;
use crate::types::{to_features, Composition, Processing, TargetProperty};

/// Mode name of the built-in strengthening model.
pub const BASELINE_MODE: &str = "baseline";

/// Predictor failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// No model is registered (or loadable) for the requested pair.
    #[error("Model not available for {target} ({mode}): {reason}")]
    ModelUnavailable {
        target: TargetProperty,
        mode: String,
        reason: String,
    },
    /// The model could not produce a finite value for one input.
    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}

/// A fixed regression function over the canonical feature vector.
pub trait PropertyModel: Send + Sync + std::fmt::Debug {
    /// Short model family name, for logs and service info.
    fn kind(&self) -> &'static str;

    /// Evaluate the model at one point.
    fn evaluate(&self, features: &Features) -> Result<f64, PredictError>;
}

/// A model pinned to one (target, mode) pair.
#[derive(Debug)]
pub struct Predictor {
    target: TargetProperty,
    mode: String,
    model: Box<dyn PropertyModel>,
}

impl Predictor {
    pub fn new(target: TargetProperty, mode: impl Into<String>, model: Box<dyn PropertyModel>) -> Self {
        Self {
            target,
            mode: mode.into(),
            model,
        }
    }

    /// Built-in baseline predictor for `target`.
    pub fn baseline(target: TargetProperty) -> Self {
        Self::new(target, BASELINE_MODE, Box::new(StrengtheningModel::new(target)))
    }

    pub fn target(&self) -> TargetProperty {
        self.target
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    /// Predict the target property for a composition + processing pair.
    pub fn predict(&self, composition: &Composition, processing: &Processing) -> Result<f64, PredictError> {
        self.predict_features(&to_features(composition, processing))
    }

    /// Predict from an already-assembled feature vector.
    pub fn predict_features(&self, features: &Features) -> Result<f64, PredictError> {
        if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
            return Err(PredictError::Evaluation(format!(
                "non-finite input at feature {pos}"
            )));
        }
        let value = self.model.evaluate(features)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PredictError::Evaluation(format!(
                "{} model produced a non-finite value",
                self.model.kind()
            )))
        }
    }
}
