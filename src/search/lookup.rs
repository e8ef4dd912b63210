//! Training-data lookup.
//!
//! Scores every historical record with the predictor (not its measured
//! value, so errors compare across sources) and keeps those inside the
//! tolerance band. The measured value rides along as `actual_value`.

use tracing::debug;

use super::{CandidateGenerator, GeneratorOutput, SearchContext, StrategyKind};
use crate::types::CandidateSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingLookup;

impl CandidateGenerator for TrainingLookup {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TrainingData
    }

    fn generate(&self, ctx: &SearchContext) -> GeneratorOutput {
        let mut out = GeneratorOutput::default();
        let property = ctx.target.property;

        for record in ctx.training.records() {
            let Some(actual) = record.actual(property) else {
                continue;
            };
            out.evaluations += 1;
            let predicted = match ctx.predict(&record.composition, &record.processing) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "Training record evaluation failed, dropping");
                    out.failures += 1;
                    continue;
                }
            };
            if ctx.target.within_tolerance(predicted) {
                out.candidates.push(
                    ctx.candidate(record.composition, record.processing, predicted, CandidateSource::TrainingData)
                        .with_actual(actual),
                );
            }
        }

        // Stable sort keeps dataset order among equal errors
        out.candidates
            .sort_by(|a, b| a.absolute_error.total_cmp(&b.absolute_error));
        out.candidates.truncate(ctx.params.max_training_matches);

        debug!(
            records = ctx.training.len(),
            hits = out.candidates.len(),
            "Training lookup complete"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::dataset::{TrainingRecord, TrainingSet};
    use crate::predictor::Predictor;
    use crate::types::{Composition, Element, Processing, TargetProperty, TargetSpec};
    use std::sync::Arc;

    fn record(mg: f64, si: f64, ys: Option<f64>) -> TrainingRecord {
        TrainingRecord {
            composition: Composition::default()
                .with(Element::Al, 100.0 - mg - si)
                .with(Element::Mg, mg)
                .with(Element::Si, si),
            processing: Processing::default(),
            ys,
            uts: None,
        }
    }

    fn context(value: f64, tolerance: f64, records: Vec<TrainingRecord>) -> SearchContext {
        SearchContext::new(
            TargetSpec::new(TargetProperty::YieldStrength, value, tolerance, 10, "baseline").unwrap(),
            Arc::new(Predictor::baseline(TargetProperty::YieldStrength)),
            Arc::new(TrainingSet::from_records(records)),
            SearchConfig::default(),
            0.5,
        )
    }

    #[test]
    fn test_lookup_keeps_in_band_records_sorted() {
        let records: Vec<_> = (0..8).map(|i| record(0.5 + 0.5 * i as f64, 0.6, Some(200.0))).collect();
        let predictor = Predictor::baseline(TargetProperty::YieldStrength);
        let anchor = predictor
            .predict(&records[3].composition.normalized(), &records[3].processing)
            .unwrap();

        let ctx = context(anchor, 0.2, records);
        let out = TrainingLookup.generate(&ctx);
        assert!(!out.candidates.is_empty());
        assert!(out.candidates[0].absolute_error < 1e-9);
        assert!(out
            .candidates
            .windows(2)
            .all(|w| w[0].absolute_error <= w[1].absolute_error));
        for c in &out.candidates {
            assert_eq!(c.source, CandidateSource::TrainingData);
            assert_eq!(c.actual_value, Some(200.0));
            assert!(c.error_pct <= 0.2);
        }
    }

    #[test]
    fn test_records_without_ground_truth_ignored() {
        let ctx = context(150.0, 1.0, vec![record(1.0, 0.6, None)]);
        let out = TrainingLookup.generate(&ctx);
        assert!(out.candidates.is_empty());
        assert_eq!(out.evaluations, 0);
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let records: Vec<_> = (0..20).map(|i| record(0.3 * i as f64, 0.8, Some(150.0 + i as f64))).collect();
        let ctx = context(180.0, 0.5, records);
        let a = TrainingLookup.generate(&ctx).candidates;
        let b = TrainingLookup.generate(&ctx).candidates;
        assert_eq!(a, b);
        assert!(a.len() <= ctx.params.max_training_matches);
    }
}
