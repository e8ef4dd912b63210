//! Suggestion engine: runs the configured generators side by side on the
//! rayon pool and hands their outputs to the aggregator.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use super::{aggregate, CandidateGenerator, Generator, GeneratorOutput, SearchContext, StrategyKind};
use crate::types::SuggestionResult;

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    generators: Vec<Generator>,
}

impl SuggestionEngine {
    /// Engine running `strategies` (duplicates ignored).
    pub fn new(strategies: &[StrategyKind]) -> Self {
        let mut kinds: Vec<StrategyKind> = Vec::with_capacity(strategies.len());
        for &k in strategies {
            if !kinds.contains(&k) {
                kinds.push(k);
            }
        }
        Self {
            generators: kinds.into_iter().map(Generator::for_kind).collect(),
        }
    }

    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.generators.iter().map(CandidateGenerator::kind).collect()
    }

    /// Run one search. CPU-bound; call from a blocking context.
    pub fn run(&self, ctx: &SearchContext) -> SuggestionResult {
        let started = Instant::now();

        let outputs: Vec<(StrategyKind, GeneratorOutput)> = self
            .generators
            .par_iter()
            .map(|g| (g.kind(), g.generate(ctx)))
            .collect();

        for (kind, out) in &outputs {
            if out.truncated {
                warn!(strategy = %kind, hits = out.candidates.len(), "Generator stopped at request deadline, returning partial results");
            }
            if out.failures > 0 {
                warn!(strategy = %kind, failures = out.failures, evaluations = out.evaluations, "Dropped candidates after evaluation failures");
            }
        }

        let raw_hits: usize = outputs.iter().map(|(_, o)| o.candidates.len()).sum();
        let result = aggregate(
            outputs.into_iter().map(|(_, o)| o).collect(),
            &ctx.target,
            ctx.params.dedup_distance,
        );

        info!(
            property = %ctx.target.property,
            value = ctx.target.value,
            tolerance = ctx.target.tolerance,
            mode = %ctx.target.mode,
            raw_hits,
            returned = result.candidates.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Suggestion search complete"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::dataset::{TrainingRecord, TrainingSet};
    use crate::predictor::{PredictError, Predictor, PropertyModel, StrengtheningModel};
    use crate::schema::Features;
    use crate::search::RandomScan;
    use crate::types::{CandidateSource, Composition, Element, Processing, TargetProperty, TargetSpec};
    use std::sync::Arc;

    fn alloy_6061() -> Composition {
        Composition::default()
            .with(Element::Al, 97.9)
            .with(Element::Mg, 1.0)
            .with(Element::Si, 0.6)
            .with(Element::Cu, 0.28)
            .with(Element::Cr, 0.2)
    }

    fn context(value: f64, tolerance: f64, count: usize, training: TrainingSet, params: SearchConfig) -> SearchContext {
        SearchContext::new(
            TargetSpec::new(TargetProperty::YieldStrength, value, tolerance, count, "baseline").unwrap(),
            Arc::new(Predictor::baseline(TargetProperty::YieldStrength)),
            Arc::new(training),
            params,
            0.5,
        )
    }

    #[test]
    fn test_strategy_selection() {
        let engine = SuggestionEngine::new(&[StrategyKind::RandomScan, StrategyKind::RandomScan]);
        assert_eq!(engine.strategies(), vec![StrategyKind::RandomScan]);

        let ctx = context(300.0, 0.1, 5, TrainingSet::empty(), SearchConfig::default());
        let result = engine.run(&ctx);
        assert!(result
            .candidates
            .iter()
            .all(|c| c.source == CandidateSource::RandomScan));
    }

    #[test]
    fn test_full_search_invariants() {
        let engine = SuggestionEngine::new(&StrategyKind::ALL);
        let ctx = context(300.0, 0.1, 10, TrainingSet::empty(), SearchConfig::default());
        let result = engine.run(&ctx);

        assert!(!result.candidates.is_empty());
        assert!(result.candidates.len() <= 10);
        let stats = result.model_stats.unwrap();
        for w in result.candidates.windows(2) {
            assert!(w[0].absolute_error <= w[1].absolute_error);
        }
        for c in &result.candidates {
            assert!(c.predicted_value >= stats.pred_min && c.predicted_value <= stats.pred_max);
            assert!((c.composition.sum() - 100.0).abs() <= 0.5);
        }
    }

    #[test]
    fn test_expired_deadline_still_returns_result() {
        let params = SearchConfig {
            deadline_ms: 1,
            ..SearchConfig::default()
        };
        let record = TrainingRecord {
            composition: alloy_6061(),
            processing: Processing::default(),
            ys: Some(276.0),
            uts: None,
        };
        let predicted = Predictor::baseline(TargetProperty::YieldStrength)
            .predict(&alloy_6061().normalized(), &Processing::default())
            .unwrap();
        let ctx = context(predicted, 0.1, 5, TrainingSet::from_records(vec![record]), params);
        std::thread::sleep(std::time::Duration::from_millis(5));

        let result = SuggestionEngine::new(&StrategyKind::ALL).run(&ctx);
        // The lookup has no deadline; the scan and optimizer stop immediately.
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].source, CandidateSource::TrainingData);
    }

    /// Baseline model that fails to converge above 3 wt% Mg.
    #[derive(Debug)]
    struct HighMgUnstable(StrengtheningModel);

    impl PropertyModel for HighMgUnstable {
        fn kind(&self) -> &'static str {
            "high-mg-unstable"
        }

        fn evaluate(&self, features: &Features) -> Result<f64, PredictError> {
            if features[Element::Mg.index()] > 3.0 {
                return Ok(f64::NAN);
            }
            self.0.evaluate(features)
        }
    }

    #[test]
    fn test_evaluation_failures_drop_only_affected_candidates() {
        let predictor = Predictor::new(
            TargetProperty::YieldStrength,
            "baseline",
            Box::new(HighMgUnstable(StrengtheningModel::new(TargetProperty::YieldStrength))),
        );
        let ctx = SearchContext::new(
            TargetSpec::new(TargetProperty::YieldStrength, 300.0, 0.2, 5, "baseline").unwrap(),
            Arc::new(predictor),
            Arc::new(TrainingSet::empty()),
            SearchConfig::default(),
            0.5,
        );

        let scan = RandomScan.generate(&ctx);
        assert!(scan.failures > 0);
        assert!(scan.failures < scan.evaluations);

        let result = SuggestionEngine::new(&StrategyKind::ALL).run(&ctx);
        assert!(!result.candidates.is_empty());
        assert!(result.model_stats.is_some());
        for c in &result.candidates {
            assert!(c.predicted_value.is_finite());
            assert!(c.composition.get(Element::Mg) <= 3.0);
        }
    }
}
