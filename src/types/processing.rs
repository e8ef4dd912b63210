//! Processing vector: thermomechanical treatment parameters.

use serde::{Deserialize, Serialize};

use crate::schema::{processing_default, PROCESSING_COUNT};

/// Processing parameters, in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingParam {
    /// Peak homogenization temperature (°C)
    HomogTemp,
    /// Total homogenization time (s)
    HomogTime,
    /// Peak recrystallization anneal temperature (°C)
    RecrystTemp,
    /// Total recrystallization anneal time (s)
    RecrystTime,
    /// Cold rolling reduction (%)
    ColdRolling,
    /// Hot rolling reduction (%)
    HotRolling,
}

impl ProcessingParam {
    pub const ALL: [ProcessingParam; PROCESSING_COUNT] = [
        ProcessingParam::HomogTemp,
        ProcessingParam::HomogTime,
        ProcessingParam::RecrystTemp,
        ProcessingParam::RecrystTime,
        ProcessingParam::ColdRolling,
        ProcessingParam::HotRolling,
    ];

    /// Position within the processing block (0-based).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical JSON / feature key.
    pub const fn key(self) -> &'static str {
        match self {
            ProcessingParam::HomogTemp => "homog_temp_max_C",
            ProcessingParam::HomogTime => "homog_time_total_s",
            ProcessingParam::RecrystTemp => "recryst_temp_max_C",
            ProcessingParam::RecrystTime => "recryst_time_total_s",
            ProcessingParam::ColdRolling => "cold_rolling_reduction_pct",
            ProcessingParam::HotRolling => "hot_rolling_reduction_pct",
        }
    }

    /// Column name used by the historical datasets and older model artifacts.
    pub const fn legacy_key(self) -> Option<&'static str> {
        match self {
            ProcessingParam::ColdRolling => Some("Cold rolling reduction (percentage)"),
            ProcessingParam::HotRolling => Some("Hot rolling reduction (percentage)"),
            _ => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key || p.legacy_key() == Some(key))
    }
}

/// Fully resolved processing vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Processing {
    #[serde(rename = "homog_temp_max_C")]
    pub homog_temp_c: f64,
    #[serde(rename = "homog_time_total_s")]
    pub homog_time_s: f64,
    #[serde(rename = "recryst_temp_max_C")]
    pub recryst_temp_c: f64,
    #[serde(rename = "recryst_time_total_s")]
    pub recryst_time_s: f64,
    #[serde(rename = "cold_rolling_reduction_pct")]
    pub cold_rolling_pct: f64,
    #[serde(rename = "hot_rolling_reduction_pct")]
    pub hot_rolling_pct: f64,
}

impl Default for Processing {
    fn default() -> Self {
        Self::from_array(&ProcessingParam::ALL.map(processing_default))
    }
}

impl Processing {
    pub fn get(&self, param: ProcessingParam) -> f64 {
        match param {
            ProcessingParam::HomogTemp => self.homog_temp_c,
            ProcessingParam::HomogTime => self.homog_time_s,
            ProcessingParam::RecrystTemp => self.recryst_temp_c,
            ProcessingParam::RecrystTime => self.recryst_time_s,
            ProcessingParam::ColdRolling => self.cold_rolling_pct,
            ProcessingParam::HotRolling => self.hot_rolling_pct,
        }
    }

    pub fn set(&mut self, param: ProcessingParam, value: f64) {
        let slot = match param {
            ProcessingParam::HomogTemp => &mut self.homog_temp_c,
            ProcessingParam::HomogTime => &mut self.homog_time_s,
            ProcessingParam::RecrystTemp => &mut self.recryst_temp_c,
            ProcessingParam::RecrystTime => &mut self.recryst_time_s,
            ProcessingParam::ColdRolling => &mut self.cold_rolling_pct,
            ProcessingParam::HotRolling => &mut self.hot_rolling_pct,
        };
        *slot = value;
    }

    pub fn to_array(&self) -> [f64; PROCESSING_COUNT] {
        ProcessingParam::ALL.map(|p| self.get(p))
    }

    pub fn from_array(values: &[f64; PROCESSING_COUNT]) -> Self {
        Self {
            homog_temp_c: values[0],
            homog_time_s: values[1],
            recryst_temp_c: values[2],
            recryst_time_s: values[3],
            cold_rolling_pct: values[4],
            hot_rolling_pct: values[5],
        }
    }
}

/// Processing parameters as supplied by a caller: every field optional.
///
/// Legacy column spellings are accepted as aliases; unknown keys are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessingInput {
    #[serde(rename = "homog_temp_max_C", default, skip_serializing_if = "Option::is_none")]
    pub homog_temp_c: Option<f64>,
    #[serde(rename = "homog_time_total_s", default, skip_serializing_if = "Option::is_none")]
    pub homog_time_s: Option<f64>,
    #[serde(rename = "recryst_temp_max_C", default, skip_serializing_if = "Option::is_none")]
    pub recryst_temp_c: Option<f64>,
    #[serde(rename = "recryst_time_total_s", default, skip_serializing_if = "Option::is_none")]
    pub recryst_time_s: Option<f64>,
    #[serde(
        rename = "cold_rolling_reduction_pct",
        alias = "Cold rolling reduction (percentage)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cold_rolling_pct: Option<f64>,
    #[serde(
        rename = "hot_rolling_reduction_pct",
        alias = "Hot rolling reduction (percentage)",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub hot_rolling_pct: Option<f64>,
}

impl ProcessingInput {
    pub fn get(&self, param: ProcessingParam) -> Option<f64> {
        match param {
            ProcessingParam::HomogTemp => self.homog_temp_c,
            ProcessingParam::HomogTime => self.homog_time_s,
            ProcessingParam::RecrystTemp => self.recryst_temp_c,
            ProcessingParam::RecrystTime => self.recryst_time_s,
            ProcessingParam::ColdRolling => self.cold_rolling_pct,
            ProcessingParam::HotRolling => self.hot_rolling_pct,
        }
    }

    /// Fill absent parameters with their domain defaults.
    pub fn resolve(&self) -> Processing {
        Processing::from_array(
            &ProcessingParam::ALL.map(|p| self.get(p).unwrap_or_else(|| processing_default(p))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fills_defaults() {
        let input = ProcessingInput {
            homog_temp_c: Some(500.0),
            ..Default::default()
        };
        let resolved = input.resolve();
        assert_eq!(resolved.homog_temp_c, 500.0);
        assert_eq!(resolved.homog_time_s, processing_default(ProcessingParam::HomogTime));
        assert_eq!(resolved.hot_rolling_pct, processing_default(ProcessingParam::HotRolling));
    }

    #[test]
    fn test_legacy_alias_accepted() {
        let input: ProcessingInput =
            serde_json::from_str(r#"{"Cold rolling reduction (percentage)": 30.0}"#).unwrap();
        assert_eq!(input.cold_rolling_pct, Some(30.0));
        assert_eq!(input.resolve().cold_rolling_pct, 30.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<ProcessingInput, _> =
            serde_json::from_str(r#"{"quench_rate": 10.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_key() {
        assert_eq!(ProcessingParam::from_key("recryst_time_total_s"), Some(ProcessingParam::RecrystTime));
        assert_eq!(
            ProcessingParam::from_key("Hot rolling reduction (percentage)"),
            Some(ProcessingParam::HotRolling)
        );
        assert_eq!(ProcessingParam::from_key("nope"), None);
    }

    #[test]
    fn test_array_round_trip_order() {
        let p = Processing::default();
        let arr = p.to_array();
        assert_eq!(arr[0], p.homog_temp_c);
        assert_eq!(arr[5], p.hot_rolling_pct);
        assert_eq!(Processing::from_array(&arr), p);
    }
}
