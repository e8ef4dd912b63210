//! Inverse Search Engine
//!
//! Finds (composition, processing) recipes whose predicted property lands
//! within a tolerance band around a requested value.
//!
//! ## Architecture
//! - `context`: read-only per-request state shared by all generators
//! - `lookup`: training-data lookup (ground-truth anchored candidates)
//! - `random_scan`: uniform sampling, also the unbiased prediction sample
//! - `optimizer`: multi-restart coordinate pattern search
//! - `aggregator`: dedup, rank, truncate, prediction statistics
//! - `engine`: runs the configured generators in parallel on rayon
//!
//! Generators are interchangeable producers of `Candidate`s behind the
//! `CandidateGenerator` trait. The set is closed, so configuration selects
//! variants of the `Generator` enum.

pub mod aggregator;
pub mod context;
pub mod engine;
pub mod lookup;
pub mod optimizer;
pub mod random_scan;

pub use aggregator::aggregate;
pub use context::SearchContext;
pub use engine::SuggestionEngine;
pub use lookup::TrainingLookup;
pub use optimizer::PatternSearch;
pub use random_scan::RandomScan;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::schema::{element_bound, processing_bound};
use crate::types::{Candidate, Composition, Element, Processing, ProcessingParam};

/// Configurable generator identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TrainingData,
    RandomScan,
    Optimization,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::TrainingData,
        StrategyKind::RandomScan,
        StrategyKind::Optimization,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::TrainingData => "training_data",
            StrategyKind::RandomScan => "random_scan",
            StrategyKind::Optimization => "optimization",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one generator produced for one request.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOutput {
    pub candidates: Vec<Candidate>,
    /// Unfiltered predictions usable as an unbiased sample of the model's
    /// output range (random scan only).
    pub sample: Vec<f64>,
    /// Predictor calls made
    pub evaluations: usize,
    /// Predictor calls that failed and were dropped
    pub failures: usize,
    /// Whether the generator stopped at the request deadline
    pub truncated: bool,
}

/// A candidate-producing strategy.
pub trait CandidateGenerator {
    fn kind(&self) -> StrategyKind;

    fn generate(&self, ctx: &SearchContext) -> GeneratorOutput;
}

/// Closed set of generator variants.
#[derive(Debug, Clone, Copy)]
pub enum Generator {
    TrainingLookup(TrainingLookup),
    RandomScan(RandomScan),
    PatternSearch(PatternSearch),
}

impl Generator {
    pub fn for_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::TrainingData => Generator::TrainingLookup(TrainingLookup),
            StrategyKind::RandomScan => Generator::RandomScan(RandomScan),
            StrategyKind::Optimization => Generator::PatternSearch(PatternSearch),
        }
    }
}

impl CandidateGenerator for Generator {
    fn kind(&self) -> StrategyKind {
        match self {
            Generator::TrainingLookup(g) => g.kind(),
            Generator::RandomScan(g) => g.kind(),
            Generator::PatternSearch(g) => g.kind(),
        }
    }

    fn generate(&self, ctx: &SearchContext) -> GeneratorOutput {
        match self {
            Generator::TrainingLookup(g) => g.generate(ctx),
            Generator::RandomScan(g) => g.generate(ctx),
            Generator::PatternSearch(g) => g.generate(ctx),
        }
    }
}

// ============================================================================
// Sampling helpers shared by the random scan and optimizer restarts
// ============================================================================

/// Draw each element uniformly within its bound, then rescale to 100 wt%.
pub(crate) fn sample_composition(rng: &mut StdRng) -> Composition {
    let mut comp = Composition::default();
    for element in Element::ALL {
        let b = element_bound(element);
        comp.set(element, rng.gen_range(b.min..=b.max));
    }
    comp.normalized()
}

/// Draw each processing parameter uniformly within its bound.
pub(crate) fn sample_processing(rng: &mut StdRng) -> Processing {
    let mut proc = Processing::default();
    for param in ProcessingParam::ALL {
        let b = processing_bound(param);
        proc.set(param, rng.gen_range(b.min..=b.max));
    }
    proc
}
