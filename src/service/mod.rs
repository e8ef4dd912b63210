//! Alloy Service
//!
//! The operations exposed to callers: `predict`, `suggest`, `health`,
//! `info`. The service owns the read-only process-wide state (model
//! registry, training datasets, configuration) and builds a fresh
//! `SearchContext` for every suggestion.

mod error;
mod requests;
mod responses;

pub use error::ServiceError;
pub use requests::{PredictRequest, SuggestRequest};
pub use responses::{
    DatasetSummary, HealthResponse, InfoResponse, PredictInputs, PredictResponse, SuggestResponse,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::dataset::DatasetStore;
use crate::predictor::ModelRegistry;
use crate::search::{SearchContext, SuggestionEngine};
use crate::types::{TargetProperty, TargetSpec};

/// Operation names reported by `info`.
pub const OPERATIONS: [&str; 4] = ["predict", "suggest", "health", "info"];

/// Cheap to clone; all state is shared.
#[derive(Debug, Clone)]
pub struct AlloyService {
    config: Arc<AppConfig>,
    registry: Arc<ModelRegistry>,
    datasets: Arc<DatasetStore>,
    engine: SuggestionEngine,
}

impl AlloyService {
    /// Build the registry and load datasets from `config`.
    pub fn new(config: AppConfig) -> Self {
        let registry = ModelRegistry::from_config(&config.models);
        let datasets = DatasetStore::from_config(&config.dataset);
        Self::with_parts(config, registry, datasets)
    }

    /// Assemble from pre-built parts.
    pub fn with_parts(config: AppConfig, registry: ModelRegistry, datasets: DatasetStore) -> Self {
        let engine = SuggestionEngine::new(&config.search.strategies);
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            datasets: Arc::new(datasets),
            engine,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn resolve_mode(&self, mode: Option<String>) -> Result<String, ServiceError> {
        let mode = mode.unwrap_or_else(|| self.config.models.default_mode.clone());
        if mode.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("Mode must not be empty".to_string()));
        }
        Ok(mode)
    }

    /// Forward prediction.
    pub async fn predict(&self, req: PredictRequest) -> Result<PredictResponse, ServiceError> {
        let target: TargetProperty = req.target.parse()?;
        let mode = self.resolve_mode(req.mode)?;
        let predictor = self.registry.get(target, &mode).await?;

        let composition = req.composition;
        let processing = req.processing.resolve();
        let predicted_value = predictor.predict(&composition, &processing)?;
        let violations =
            crate::constraints::validate(&composition, &processing, self.config.constraints.sum_epsilon);

        debug!(property = %target, mode = %mode, predicted_value, violations = violations.len(), "Prediction");
        Ok(PredictResponse {
            target,
            mode,
            predicted_value,
            is_valid: violations.is_empty(),
            violations,
            alloy_series: crate::series::classify(&composition),
            inputs: PredictInputs {
                composition,
                processing,
            },
        })
    }

    /// Inverse search. The engine runs on the blocking pool.
    pub async fn suggest(&self, req: SuggestRequest) -> Result<SuggestResponse, ServiceError> {
        let started = Instant::now();
        let target: TargetProperty = req.target.parse()?;
        let mode = self.resolve_mode(req.mode)?;
        let spec = TargetSpec::new(target, req.value, req.tolerance, req.count, mode.clone())?;
        let predictor = self.registry.get(target, &mode).await?;

        let ctx = SearchContext::new(
            spec,
            predictor,
            self.datasets.get(target),
            self.config.search.clone(),
            self.config.constraints.sum_epsilon,
        );
        let engine = self.engine.clone();
        let results = tokio::task::spawn_blocking(move || engine.run(&ctx))
            .await
            .map_err(|e| ServiceError::Internal(format!("Search task failed: {e}")))?;

        if let Some(stats) = &results.model_stats {
            if !stats.in_range {
                warn!(
                    property = %target,
                    value = req.value,
                    pred_min = stats.pred_min,
                    pred_max = stats.pred_max,
                    "Target lies outside the model's observed prediction range"
                );
            }
        }
        if results.candidates.len() < req.count {
            debug!(requested = req.count, returned = results.candidates.len(), "Fewer candidates than requested");
        }

        Ok(SuggestResponse {
            target,
            target_value: req.value,
            tolerance: req.tolerance,
            mode,
            results,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Liveness. Always succeeds.
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy",
            timestamp: Utc::now().to_rfc3339(),
            service: self.config.service.name.clone(),
        }
    }

    /// Service description and model inventory.
    pub fn info(&self) -> InfoResponse {
        InfoResponse {
            service: self.config.service.name.clone(),
            version: env!("CARGO_PKG_VERSION"),
            operations: OPERATIONS.to_vec(),
            default_mode: self.config.models.default_mode.clone(),
            models: self.registry.statuses(),
            datasets: self
                .datasets
                .summary()
                .into_iter()
                .map(|(target, records)| DatasetSummary { target, records })
                .collect(),
            strategies: self.engine.strategies(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Composition, Element};

    fn service() -> AlloyService {
        AlloyService::new(AppConfig::default())
    }

    #[tokio::test]
    async fn test_predict_fills_processing_defaults() {
        let resp = service()
            .predict(PredictRequest {
                target: "ys".to_string(),
                composition: Composition::default().with(Element::Al, 99.0).with(Element::Mg, 1.0),
                processing: Default::default(),
                mode: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.target, TargetProperty::YieldStrength);
        assert_eq!(resp.mode, "baseline");
        assert_eq!(resp.inputs.processing, crate::types::Processing::default());
        assert!(resp.is_valid);
    }

    #[tokio::test]
    async fn test_unknown_target_is_invalid_request() {
        let err = service()
            .suggest(SuggestRequest {
                target: "HV".to_string(),
                ..SuggestRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_out_of_domain_values_rejected() {
        let svc = service();
        for req in [
            SuggestRequest { value: -1.0, ..SuggestRequest::default() },
            SuggestRequest { value: 1500.0, ..SuggestRequest::default() },
            SuggestRequest { tolerance: 0.0, ..SuggestRequest::default() },
            SuggestRequest { tolerance: 1.5, ..SuggestRequest::default() },
            SuggestRequest { count: 0, ..SuggestRequest::default() },
        ] {
            assert!(matches!(svc.suggest(req).await, Err(ServiceError::InvalidRequest(_))));
        }
    }

    #[tokio::test]
    async fn test_unknown_mode_is_unavailable() {
        let err = service()
            .suggest(SuggestRequest {
                mode: Some("exploration_balanced".to_string()),
                ..SuggestRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_health_and_info() {
        let svc = service();
        let health = svc.health();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.service, "alloy-api");
        assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());

        let info = svc.info();
        assert_eq!(info.operations, OPERATIONS.to_vec());
        assert_eq!(info.models.len(), 2);
        assert!(info.models.iter().all(|m| m.loaded));
    }
}
