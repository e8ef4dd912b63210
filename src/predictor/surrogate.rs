//! Trained surrogate models restored from JSON artifacts.
//!
//! Artifacts are exported by the training pipeline with the feature names
//! they were fit on. On load, those names are mapped onto the canonical
//! feature order; an artifact naming an unknown feature is rejected.
//!
//! ```json
//! { "kind": "gaussian_process", "target": "YS",
//!   "feature_names": ["Al", "Si", ...],
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "length_scale": [...], "signal_variance": 1.0,
//!   "x_train": [[...], ...], "alpha": [...],
//!   "y_mean": 250.0, "y_std": 80.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::{feature_index, Features};
use crate::types::TargetProperty;

use super::loader::ArtifactError;
use super::{PredictError, PropertyModel};

// ============================================================================
// Artifact documents
// ============================================================================

/// Standardization applied before the model: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Kernel length scale: isotropic or one per feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthScale {
    Isotropic(f64),
    PerFeature(Vec<f64>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianProcessArtifact {
    #[serde(default)]
    pub target: Option<TargetProperty>,
    pub feature_names: Vec<String>,
    pub scaler: ScalerArtifact,
    pub length_scale: LengthScale,
    #[serde(default = "default_signal_variance")]
    pub signal_variance: f64,
    /// Training inputs, already standardized.
    pub x_train: Vec<Vec<f64>>,
    /// Dual coefficients `K⁻¹ y`.
    pub alpha: Vec<f64>,
    #[serde(default)]
    pub y_mean: f64,
    #[serde(default = "default_y_std")]
    pub y_std: f64,
}

fn default_signal_variance() -> f64 {
    1.0
}

fn default_y_std() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    #[serde(default)]
    pub target: Option<TargetProperty>,
    pub feature_names: Vec<String>,
    pub scaler: ScalerArtifact,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Serialized surrogate, tagged by model family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GaussianProcess(GaussianProcessArtifact),
    Linear(LinearArtifact),
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self, ArtifactError> {
        serde_json::from_slice(bytes).map_err(|e| ArtifactError::Format(e.to_string()))
    }

    pub fn declared_target(&self) -> Option<TargetProperty> {
        match self {
            ModelArtifact::GaussianProcess(a) => a.target,
            ModelArtifact::Linear(a) => a.target,
        }
    }

    /// Validate shapes and build the evaluable model.
    pub fn into_model(self, expected: TargetProperty) -> Result<Box<dyn PropertyModel>, ArtifactError> {
        if let Some(declared) = self.declared_target() {
            if declared != expected {
                return Err(ArtifactError::Shape(format!(
                    "artifact was trained for {declared}, configured for {expected}"
                )));
            }
        }
        let model: Box<dyn PropertyModel> = match self {
            ModelArtifact::GaussianProcess(a) => Box::new(GaussianProcessModel::from_artifact(a)?),
            ModelArtifact::Linear(a) => Box::new(LinearModel::from_artifact(a)?),
        };
        Ok(model)
    }
}

// ============================================================================
// Shared input projection
// ============================================================================

/// Maps canonical features onto the artifact's standardized input space.
#[derive(Debug, Clone)]
struct InputProjection {
    /// Canonical feature index for each artifact input column.
    columns: Vec<usize>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl InputProjection {
    fn new(feature_names: &[String], scaler: ScalerArtifact) -> Result<Self, ArtifactError> {
        let n = feature_names.len();
        if n == 0 {
            return Err(ArtifactError::Shape("artifact lists no features".to_string()));
        }
        let columns = feature_names
            .iter()
            .map(|name| {
                feature_index(name)
                    .ok_or_else(|| ArtifactError::Shape(format!("unknown feature '{name}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if scaler.mean.len() != n || scaler.scale.len() != n {
            return Err(ArtifactError::Shape(format!(
                "scaler has {}/{} entries for {n} features",
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        // Zero-variance columns are passed through unscaled
        let scale = scaler
            .scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok(Self {
            columns,
            mean: scaler.mean,
            scale,
        })
    }

    fn dim(&self) -> usize {
        self.columns.len()
    }

    fn project(&self, features: &Features) -> Vec<f64> {
        self.columns
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&col, (m, s))| (features[col] - m) / s)
            .collect()
    }
}

// ============================================================================
// Gaussian process
// ============================================================================

/// Posterior mean of a squared-exponential Gaussian process.
#[derive(Debug, Clone)]
pub struct GaussianProcessModel {
    input: InputProjection,
    inv_length_scale_sq: Vec<f64>,
    signal_variance: f64,
    x_train: Vec<Vec<f64>>,
    alpha: Vec<f64>,
    y_mean: f64,
    y_std: f64,
}

impl GaussianProcessModel {
    pub fn from_artifact(a: GaussianProcessArtifact) -> Result<Self, ArtifactError> {
        let input = InputProjection::new(&a.feature_names, a.scaler)?;
        let d = input.dim();

        let length_scales = match a.length_scale {
            LengthScale::Isotropic(l) => vec![l; d],
            LengthScale::PerFeature(ls) => ls,
        };
        if length_scales.len() != d {
            return Err(ArtifactError::Shape(format!(
                "{} length scales for {d} features",
                length_scales.len()
            )));
        }
        if length_scales.iter().any(|l| !(*l > 0.0)) {
            return Err(ArtifactError::Shape("length scales must be positive".to_string()));
        }
        if a.x_train.len() != a.alpha.len() {
            return Err(ArtifactError::Shape(format!(
                "{} training points but {} dual coefficients",
                a.x_train.len(),
                a.alpha.len()
            )));
        }
        if let Some(row) = a.x_train.iter().position(|r| r.len() != d) {
            return Err(ArtifactError::Shape(format!(
                "training point {row} has {} values, expected {d}",
                a.x_train[row].len()
            )));
        }

        Ok(Self {
            input,
            inv_length_scale_sq: length_scales.iter().map(|l| 1.0 / (l * l)).collect(),
            signal_variance: a.signal_variance,
            x_train: a.x_train,
            alpha: a.alpha,
            y_mean: a.y_mean,
            y_std: a.y_std,
        })
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let sq: f64 = a
            .iter()
            .zip(b.iter())
            .zip(self.inv_length_scale_sq.iter())
            .map(|((x, y), w)| (x - y).powi(2) * w)
            .sum();
        self.signal_variance * (-0.5 * sq).exp()
    }
}

impl PropertyModel for GaussianProcessModel {
    fn kind(&self) -> &'static str {
        "gaussian_process"
    }

    fn evaluate(&self, features: &Features) -> Result<f64, PredictError> {
        let x = self.input.project(features);
        let mean: f64 = self
            .x_train
            .iter()
            .zip(self.alpha.iter())
            .map(|(xt, a)| a * self.kernel(&x, xt))
            .sum();
        Ok(self.y_mean + self.y_std * mean)
    }
}

// ============================================================================
// Linear
// ============================================================================

/// Standardized linear (ridge / OLS) regression.
#[derive(Debug, Clone)]
pub struct LinearModel {
    input: InputProjection,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    pub fn from_artifact(a: LinearArtifact) -> Result<Self, ArtifactError> {
        let input = InputProjection::new(&a.feature_names, a.scaler)?;
        if a.coefficients.len() != input.dim() {
            return Err(ArtifactError::Shape(format!(
                "{} coefficients for {} features",
                a.coefficients.len(),
                input.dim()
            )));
        }
        Ok(Self {
            input,
            coefficients: a.coefficients,
            intercept: a.intercept,
        })
    }
}

impl PropertyModel for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn evaluate(&self, features: &Features) -> Result<f64, PredictError> {
        let x = self.input.project(features);
        Ok(self.intercept
            + x.iter()
                .zip(self.coefficients.iter())
                .map(|(v, c)| v * c)
                .sum::<f64>())
    }
}
