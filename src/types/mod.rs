//! Shared data structures for alloy property prediction and inverse search
//!
//! - `Composition` / `Element`: wt% vector over the 13 tracked elements
//! - `Processing` / `ProcessingInput`: thermomechanical parameters, with defaults
//! - `TargetSpec`: immutable description of one inverse search
//! - `Candidate`, `ModelStats`, `SuggestionResult`: search outputs

mod candidate;
mod composition;
mod processing;
mod target;

pub use candidate::*;
pub use composition::*;
pub use processing::*;
pub use target::*;

use crate::schema::{Features, ELEMENT_COUNT, FEATURE_COUNT, PROCESSING_COUNT};

/// Assemble a canonical model input from a composition and processing vector.
pub fn to_features(composition: &Composition, processing: &Processing) -> Features {
    let mut features = [0.0; FEATURE_COUNT];
    features[..ELEMENT_COUNT].copy_from_slice(&composition.to_array());
    features[ELEMENT_COUNT..].copy_from_slice(&processing.to_array());
    features
}

/// Split a canonical model input back into its two parts.
pub fn from_features(features: &Features) -> (Composition, Processing) {
    let mut comp = [0.0; ELEMENT_COUNT];
    let mut proc = [0.0; PROCESSING_COUNT];
    comp.copy_from_slice(&features[..ELEMENT_COUNT]);
    proc.copy_from_slice(&features[ELEMENT_COUNT..]);
    (Composition::from_array(&comp), Processing::from_array(&proc))
}
