//! Response records for the service operations.

use serde::Serialize;

use crate::predictor::ModelStatus;
use crate::search::StrategyKind;
use crate::series::AlloySeries;
use crate::types::{Composition, Processing, SuggestionResult, TargetProperty};

/// Inputs as evaluated, with processing defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictInputs {
    pub composition: Composition,
    pub processing: Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub target: TargetProperty,
    pub mode: String,
    pub predicted_value: f64,
    pub is_valid: bool,
    pub violations: Vec<String>,
    pub alloy_series: Vec<AlloySeries>,
    pub inputs: PredictInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestResponse {
    pub target: TargetProperty,
    pub target_value: f64,
    pub tolerance: f64,
    pub mode: String,
    pub results: SuggestionResult,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// RFC 3339
    pub timestamp: String,
    pub service: String,
}

/// Records loaded for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub target: TargetProperty,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoResponse {
    pub service: String,
    pub version: &'static str,
    pub operations: Vec<&'static str>,
    pub default_mode: String,
    pub models: Vec<ModelStatus>,
    pub datasets: Vec<DatasetSummary>,
    pub strategies: Vec<StrategyKind>,
}
