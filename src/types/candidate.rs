//! Search output types: candidates, prediction statistics, suggestion results.

use serde::{Deserialize, Serialize};

use super::{Composition, Processing, TargetRange, TargetSpec};
use crate::series::AlloySeries;

/// Which generator produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    TrainingData,
    RandomScan,
    Optimization,
}

impl CandidateSource {
    /// Tie-break priority when candidates collide (lower wins).
    ///
    /// Training data carries ground truth, so it always wins.
    pub const fn priority(self) -> u8 {
        match self {
            CandidateSource::TrainingData => 0,
            CandidateSource::Optimization => 1,
            CandidateSource::RandomScan => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CandidateSource::TrainingData => "training_data",
            CandidateSource::RandomScan => "random_scan",
            CandidateSource::Optimization => "optimization",
        }
    }
}

impl std::fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed (composition, processing) pair evaluated against a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub composition: Composition,
    pub processing: Processing,
    pub predicted_value: f64,
    /// `|predicted_value - target.value|` (MPa)
    pub absolute_error: f64,
    /// `absolute_error / target.value` (fraction)
    pub error_pct: f64,
    pub is_valid: bool,
    pub violations: Vec<String>,
    pub source: CandidateSource,
    pub alloy_series: Vec<AlloySeries>,
    /// Measured value, present only for training-data candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    /// 1-based position in the final ranking, assigned by the aggregator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl Candidate {
    /// Build a candidate from an evaluated point.
    ///
    /// Validity and series tags are derived here so every generator produces
    /// the same shape.
    pub fn evaluate(
        composition: Composition,
        processing: Processing,
        predicted_value: f64,
        target: &TargetSpec,
        source: CandidateSource,
        sum_epsilon: f64,
    ) -> Self {
        let violations = crate::constraints::validate(&composition, &processing, sum_epsilon);
        Self {
            composition,
            processing,
            predicted_value,
            absolute_error: target.absolute_error(predicted_value),
            error_pct: target.error_fraction(predicted_value),
            is_valid: violations.is_empty(),
            violations,
            source,
            alloy_series: crate::series::classify(&composition),
            actual_value: None,
            rank: None,
        }
    }

    #[must_use]
    pub fn with_actual(mut self, actual: f64) -> Self {
        self.actual_value = Some(actual);
        self
    }
}

/// Distribution of predictions observed during one search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub pred_min: f64,
    pub pred_max: f64,
    pub pred_mean: f64,
    /// Whether the target value falls within `[pred_min, pred_max]`.
    pub in_range: bool,
}

/// Ranked output of one suggestion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_stats: Option<ModelStats>,
    pub target_range: TargetRange,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Element, TargetProperty};

    #[test]
    fn test_evaluate_fills_error_metrics() {
        let target = TargetSpec::new(TargetProperty::YieldStrength, 200.0, 0.1, 5, "baseline").unwrap();
        let comp = Composition::default()
            .with(Element::Al, 95.0)
            .with(Element::Mg, 4.5)
            .with(Element::Mn, 0.5);
        let cand = Candidate::evaluate(
            comp,
            Processing::default(),
            210.0,
            &target,
            CandidateSource::RandomScan,
            0.5,
        );
        assert!((cand.absolute_error - 10.0).abs() < 1e-9);
        assert!((cand.error_pct - 0.05).abs() < 1e-9);
        assert!(cand.is_valid, "violations: {:?}", cand.violations);
        assert!(cand.actual_value.is_none());
        assert!(cand.alloy_series.contains(&AlloySeries::Series5xxx));
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let v = serde_json::to_value(CandidateSource::TrainingData).unwrap();
        assert_eq!(v, "training_data");
        assert!(CandidateSource::TrainingData.priority() < CandidateSource::RandomScan.priority());
    }
}
