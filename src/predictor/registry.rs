//! Per (target, mode) predictor cache.
//!
//! Every configured pair owns a `tokio::sync::OnceCell`. The first request
//! for a pair loads its artifact under the cell's single-execution guard;
//! concurrent first requests await the same load instead of fetching twice.
//! A failed load leaves the cell empty, so the next request retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::ModelsConfig;
use crate::types::TargetProperty;

use super::loader::{ArtifactLoader, ArtifactSource};
use super::{PredictError, Predictor, PropertyModel, BASELINE_MODE};

/// Registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub target: TargetProperty,
    pub mode: String,
}

impl ModelKey {
    pub fn new(target: TargetProperty, mode: impl Into<String>) -> Self {
        Self {
            target,
            mode: mode.into(),
        }
    }
}

impl std::fmt::Display for ModelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.target, self.mode)
    }
}

/// Snapshot of one registry slot, for `info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub target: TargetProperty,
    pub mode: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug)]
struct Slot {
    source: Option<ArtifactSource>,
    cell: OnceCell<Arc<Predictor>>,
}

impl Slot {
    fn ready(predictor: Predictor) -> Self {
        Self {
            source: None,
            cell: OnceCell::new_with(Some(Arc::new(predictor))),
        }
    }

    fn lazy(source: ArtifactSource) -> Self {
        Self {
            source: Some(source),
            cell: OnceCell::new(),
        }
    }
}

/// Lazily-initialized predictor cache shared by all requests.
#[derive(Debug)]
pub struct ModelRegistry {
    loader: ArtifactLoader,
    slots: HashMap<ModelKey, Slot>,
}

impl ModelRegistry {
    /// Registry holding only the built-in baseline predictors.
    pub fn builtin() -> Self {
        let mut slots = HashMap::new();
        for target in TargetProperty::ALL {
            slots.insert(
                ModelKey::new(target, BASELINE_MODE),
                Slot::ready(Predictor::baseline(target)),
            );
        }
        Self {
            loader: ArtifactLoader::new(None, Duration::from_secs(crate::config::defaults::HTTP_TIMEOUT_SECS)),
            slots,
        }
    }

    /// Baseline predictors plus one lazy slot per configured artifact.
    pub fn from_config(config: &ModelsConfig) -> Self {
        let mut registry = Self::builtin();
        registry.loader = ArtifactLoader::new(
            config.cache_dir.clone(),
            Duration::from_secs(config.http_timeout_secs),
        );

        for artifact in &config.artifacts {
            let Some(source) = artifact.source() else {
                warn!(property = %artifact.target, mode = %artifact.mode, "Artifact entry has neither path nor url, skipping");
                continue;
            };
            let key = ModelKey::new(artifact.target, artifact.mode.clone());
            if registry.slots.contains_key(&key) {
                warn!(model = %key, "Artifact entry replaces an existing model");
            }
            registry.slots.insert(key, Slot::lazy(source));
        }
        registry
    }

    /// Register an already-built model under `(target, mode)`.
    pub fn insert_model(&mut self, target: TargetProperty, mode: &str, model: Box<dyn PropertyModel>) {
        let predictor = Predictor::new(target, mode, model);
        self.slots.insert(ModelKey::new(target, mode), Slot::ready(predictor));
    }

    /// Whether a slot exists for the pair (loaded or not).
    pub fn contains(&self, target: TargetProperty, mode: &str) -> bool {
        self.slots.contains_key(&ModelKey::new(target, mode))
    }

    /// Resolve the predictor for a pair, loading its artifact on first use.
    pub async fn get(&self, target: TargetProperty, mode: &str) -> Result<Arc<Predictor>, PredictError> {
        let key = ModelKey::new(target, mode);
        let slot = self.slots.get(&key).ok_or_else(|| PredictError::ModelUnavailable {
            target,
            mode: mode.to_string(),
            reason: "no model configured for this target and mode".to_string(),
        })?;

        let predictor = slot
            .cell
            .get_or_try_init(|| self.load(&key, slot.source.as_ref()))
            .await?;
        Ok(Arc::clone(predictor))
    }

    async fn load(&self, key: &ModelKey, source: Option<&ArtifactSource>) -> Result<Arc<Predictor>, PredictError> {
        let unavailable = |reason: String| PredictError::ModelUnavailable {
            target: key.target,
            mode: key.mode.clone(),
            reason,
        };
        let source = source.ok_or_else(|| unavailable("model slot has no artifact source".to_string()))?;

        let artifact = self.loader.load(source).await.map_err(|e| {
            warn!(model = %key, source = %source, error = %e, "Model artifact load failed");
            unavailable(e.to_string())
        })?;
        let model = artifact
            .into_model(key.target)
            .map_err(|e| unavailable(e.to_string()))?;

        info!(model = %key, kind = model.kind(), source = %source, "Model loaded");
        Ok(Arc::new(Predictor::new(key.target, key.mode.clone(), model)))
    }

    /// Status of every slot, ordered by target then mode.
    pub fn statuses(&self) -> Vec<ModelStatus> {
        let mut out: Vec<ModelStatus> = self
            .slots
            .iter()
            .map(|(key, slot)| {
                let loaded = slot.cell.get();
                ModelStatus {
                    target: key.target,
                    mode: key.mode.clone(),
                    loaded: loaded.is_some(),
                    kind: loaded.map(|p| p.kind().to_string()),
                    source: slot.source.as_ref().map(ToString::to_string),
                }
            })
            .collect();
        out.sort_by(|a, b| a.target.code().cmp(b.target.code()).then_with(|| a.mode.cmp(&b.mode)));
        out
    }
}
