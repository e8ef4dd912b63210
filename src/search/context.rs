//! Read-only state for one suggestion request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::dataset::TrainingSet;
use crate::predictor::{PredictError, Predictor};
use crate::types::{Candidate, CandidateSource, Composition, Processing, TargetSpec};

/// Everything a generator may read. Built once per request and never
/// mutated, so generators share it across threads without locking.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub target: TargetSpec,
    pub predictor: Arc<Predictor>,
    pub training: Arc<TrainingSet>,
    pub params: SearchConfig,
    pub sum_epsilon: f64,
    deadline: Instant,
}

impl SearchContext {
    pub fn new(
        target: TargetSpec,
        predictor: Arc<Predictor>,
        training: Arc<TrainingSet>,
        params: SearchConfig,
        sum_epsilon: f64,
    ) -> Self {
        let deadline = Instant::now() + Duration::from_millis(params.deadline_ms);
        Self {
            target,
            predictor,
            training,
            params,
            sum_epsilon,
            deadline,
        }
    }

    /// Whether the per-request budget is spent.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn predict(&self, composition: &Composition, processing: &Processing) -> Result<f64, PredictError> {
        self.predictor.predict(composition, processing)
    }

    /// Wrap an already-predicted point as a candidate for this target.
    pub fn candidate(
        &self,
        composition: Composition,
        processing: Processing,
        predicted: f64,
        source: CandidateSource,
    ) -> Candidate {
        Candidate::evaluate(composition, processing, predicted, &self.target, source, self.sum_epsilon)
    }
}
