//! Merge, deduplicate, rank and summarize generator outputs.
//!
//! Dedup visits training-data candidates first (they carry ground truth),
//! then everything else by ascending absolute error, and drops any
//! candidate whose composition lies within `dedup_distance` (Manhattan,
//! wt%) of one already kept. The survivors are sorted by absolute error,
//! ties broken by source priority, and truncated to the requested count.
//! When a training-data candidate survives dedup but falls outside the
//! top `count`, the best one replaces the last slot so every answer with
//! qualifying history keeps a measured anchor.

use std::cmp::Ordering;

use statrs::statistics::Statistics;

use super::GeneratorOutput;
use crate::types::{Candidate, CandidateSource, ModelStats, SuggestionResult, TargetSpec};

/// Combine generator outputs into the final ranked result.
pub fn aggregate(outputs: Vec<GeneratorOutput>, target: &TargetSpec, dedup_distance: f64) -> SuggestionResult {
    let mut all: Vec<Candidate> = Vec::new();
    let mut sample: Vec<f64> = Vec::new();
    for output in outputs {
        all.extend(output.candidates);
        sample.extend(output.sample);
    }

    let model_stats = model_stats(&sample, &all, target.value);

    all.sort_by(dedup_order);
    let mut unique: Vec<Candidate> = Vec::with_capacity(all.len());
    for c in all {
        if unique
            .iter()
            .all(|k| k.composition.manhattan_distance(&c.composition) >= dedup_distance)
        {
            unique.push(c);
        }
    }

    unique.sort_by(rank_order);
    let best_training = unique
        .iter()
        .position(|c| c.source == CandidateSource::TrainingData);
    if let Some(pos) = best_training {
        if pos >= target.count {
            let anchor = unique.swap_remove(pos);
            unique.truncate(target.count - 1);
            unique.push(anchor);
        }
    }
    unique.truncate(target.count);
    unique.sort_by(rank_order);

    for (i, c) in unique.iter_mut().enumerate() {
        c.rank = Some(i + 1);
    }

    SuggestionResult {
        candidates: unique,
        model_stats,
        target_range: target.range(),
    }
}

/// Training data first, then ascending error.
fn dedup_order(a: &Candidate, b: &Candidate) -> Ordering {
    let a_training = a.source != CandidateSource::TrainingData;
    let b_training = b.source != CandidateSource::TrainingData;
    a_training
        .cmp(&b_training)
        .then_with(|| a.absolute_error.total_cmp(&b.absolute_error))
        .then_with(|| a.source.priority().cmp(&b.source.priority()))
}

/// Ascending error, ties by source priority.
fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.absolute_error
        .total_cmp(&b.absolute_error)
        .then_with(|| a.source.priority().cmp(&b.source.priority()))
}

/// Prediction statistics for one search.
///
/// The mean comes from the unbiased random-scan sample (falling back to
/// every candidate when no sample exists); min and max span every
/// prediction seen, so each candidate lies inside `[pred_min, pred_max]`.
fn model_stats(sample: &[f64], candidates: &[Candidate], target_value: f64) -> Option<ModelStats> {
    let seen = sample
        .iter()
        .copied()
        .chain(candidates.iter().map(|c| c.predicted_value));
    let (pred_min, pred_max) = seen.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if pred_min > pred_max {
        return None;
    }

    let pred_mean = if sample.is_empty() {
        candidates.iter().map(|c| c.predicted_value).collect::<Vec<_>>().mean()
    } else {
        sample.mean()
    };

    Some(ModelStats {
        pred_min,
        pred_max,
        pred_mean,
        in_range: target_value >= pred_min && target_value <= pred_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Composition, Element, Processing, TargetProperty};

    fn target(value: f64, tolerance: f64, count: usize) -> TargetSpec {
        TargetSpec::new(TargetProperty::YieldStrength, value, tolerance, count, "baseline").unwrap()
    }

    fn cand(t: &TargetSpec, mg: f64, predicted: f64, source: CandidateSource) -> Candidate {
        let comp = Composition::default()
            .with(Element::Al, 100.0 - mg)
            .with(Element::Mg, mg);
        Candidate::evaluate(comp, Processing::default(), predicted, t, source, 0.5)
    }

    fn output(candidates: Vec<Candidate>, sample: Vec<f64>) -> GeneratorOutput {
        GeneratorOutput {
            candidates,
            sample,
            ..GeneratorOutput::default()
        }
    }

    #[test]
    fn test_range_sort_and_rank() {
        let t = target(300.0, 0.1, 10);
        let result = aggregate(
            vec![output(
                vec![
                    cand(&t, 1.0, 320.0, CandidateSource::RandomScan),
                    cand(&t, 3.0, 299.0, CandidateSource::Optimization),
                    cand(&t, 5.0, 290.0, CandidateSource::RandomScan),
                ],
                vec![100.0, 320.0, 290.0, 500.0],
            )],
            &t,
            1.0,
        );
        assert!((result.target_range.low - 270.0).abs() < 1e-9);
        assert!((result.target_range.high - 330.0).abs() < 1e-9);
        let errs: Vec<f64> = result.candidates.iter().map(|c| c.absolute_error).collect();
        assert_eq!(errs, vec![1.0, 10.0, 20.0]);
        let ranks: Vec<usize> = result.candidates.iter().filter_map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);

        let stats = result.model_stats.unwrap();
        assert_eq!(stats.pred_min, 100.0);
        assert_eq!(stats.pred_max, 500.0);
        assert!((stats.pred_mean - 302.5).abs() < 1e-9);
        assert!(stats.in_range);
    }

    #[test]
    fn test_dedup_prefers_training_data() {
        let t = target(200.0, 0.2, 10);
        let training = cand(&t, 2.0, 215.0, CandidateSource::TrainingData).with_actual(210.0);
        let optimized = cand(&t, 2.3, 200.5, CandidateSource::Optimization);
        let result = aggregate(vec![output(vec![optimized, training], vec![])], &t, 1.0);
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].source, CandidateSource::TrainingData);
        assert_eq!(result.candidates[0].actual_value, Some(210.0));
    }

    #[test]
    fn test_truncates_and_keeps_training_anchor() {
        let t = target(200.0, 0.5, 3);
        let mut cands: Vec<Candidate> = (0..6)
            .map(|i| cand(&t, 0.5 + f64::from(i), 200.0 + f64::from(i), CandidateSource::Optimization))
            .collect();
        cands.push(cand(&t, 5.9, 260.0, CandidateSource::TrainingData).with_actual(255.0));
        let result = aggregate(vec![output(cands, vec![])], &t, 0.5);
        assert_eq!(result.candidates.len(), 3);
        assert!(result
            .candidates
            .iter()
            .any(|c| c.source == CandidateSource::TrainingData));
        assert!(result
            .candidates
            .windows(2)
            .all(|w| w[0].absolute_error <= w[1].absolute_error));
    }

    #[test]
    fn test_zero_target_with_full_tolerance() {
        let t = target(0.0, 1.0, 5);
        let result = aggregate(
            vec![output(
                vec![cand(&t, 1.0, 0.0, CandidateSource::RandomScan), cand(&t, 3.0, 12.0, CandidateSource::RandomScan)],
                vec![0.0, 12.0],
            )],
            &t,
            1.0,
        );
        assert_eq!(result.candidates[0].error_pct, 0.0);
        assert!(result.candidates[1].error_pct.is_infinite());
        assert_eq!(result.target_range.low, 0.0);
        assert_eq!(result.target_range.high, 0.0);
    }

    #[test]
    fn test_no_predictions_no_stats() {
        let t = target(250.0, 0.1, 5);
        let result = aggregate(vec![output(vec![], vec![])], &t, 1.0);
        assert!(result.candidates.is_empty());
        assert!(result.model_stats.is_none());
    }

    #[test]
    fn test_stats_cover_candidates_outside_sample() {
        let t = target(250.0, 0.1, 5);
        let result = aggregate(
            vec![
                output(vec![], vec![100.0, 200.0]),
                output(vec![cand(&t, 2.0, 249.0, CandidateSource::Optimization)], vec![]),
            ],
            &t,
            1.0,
        );
        let stats = result.model_stats.unwrap();
        assert_eq!(stats.pred_max, 249.0);
        assert!((stats.pred_mean - 150.0).abs() < 1e-9);
        assert!(!stats.in_range);
    }
}
