//! Request records for the service operations.
//!
//! Unknown keys are rejected at every level. Omitted fields take the
//! documented defaults; the target is kept as text here so an unknown
//! property surfaces as a request error with a readable message.

use serde::{Deserialize, Serialize};

use crate::types::{Composition, ProcessingInput};

fn default_target() -> String {
    "YS".to_string()
}
fn default_value() -> f64 {
    200.0
}
fn default_tolerance() -> f64 {
    0.1
}
fn default_count() -> usize {
    10
}

/// Forward prediction for one alloy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictRequest {
    #[serde(default = "default_target")]
    pub target: String,
    pub composition: Composition,
    #[serde(default)]
    pub processing: ProcessingInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Inverse search for recipes near a target value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestRequest {
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_value")]
    pub value: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_count", alias = "n_suggestions")]
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Default for SuggestRequest {
    fn default() -> Self {
        Self {
            target: default_target(),
            value: default_value(),
            tolerance: default_tolerance(),
            count: default_count(),
            mode: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_defaults_and_alias() {
        let req: SuggestRequest = serde_json::from_str(r#"{"n_suggestions": 3}"#).unwrap();
        assert_eq!(req.count, 3);
        assert_eq!(req.target, "YS");
        assert_eq!(req.value, 200.0);
        assert_eq!(req.tolerance, 0.1);
        assert_eq!(req.mode, None);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(serde_json::from_str::<SuggestRequest>(r#"{"valu": 300}"#).is_err());
        assert!(serde_json::from_str::<PredictRequest>(r#"{"composition": {"Al": 99, "Li": 1}}"#).is_err());
        assert!(serde_json::from_str::<PredictRequest>(
            r#"{"composition": {"Al": 100}, "processing": {"quench_rate": 5}}"#
        )
        .is_err());
    }

    #[test]
    fn test_predict_minimal() {
        let req: PredictRequest = serde_json::from_str(r#"{"composition": {"Al": 99.0, "Mg": 1.0}}"#).unwrap();
        assert_eq!(req.target, "YS");
        assert_eq!(req.composition.mg, 1.0);
        assert_eq!(req.processing, ProcessingInput::default());
    }
}
