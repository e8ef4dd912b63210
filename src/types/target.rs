//! Target property and the immutable search specification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{MAX_SUGGESTIONS, MAX_TARGET_MPA};

/// Mechanical property being predicted or searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetProperty {
    /// Yield strength (MPa)
    #[serde(rename = "YS")]
    YieldStrength,
    /// Ultimate tensile strength (MPa)
    #[serde(rename = "UTS")]
    UltimateTensileStrength,
}

impl TargetProperty {
    pub const ALL: [TargetProperty; 2] = [
        TargetProperty::YieldStrength,
        TargetProperty::UltimateTensileStrength,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            TargetProperty::YieldStrength => "YS",
            TargetProperty::UltimateTensileStrength => "UTS",
        }
    }

    /// Ground-truth column in the historical datasets.
    pub const fn dataset_column(self) -> &'static str {
        match self {
            TargetProperty::YieldStrength => "YS (MPa)",
            TargetProperty::UltimateTensileStrength => "UTS (MPa)",
        }
    }
}

impl std::fmt::Display for TargetProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for TargetProperty {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YS" => Ok(TargetProperty::YieldStrength),
            "UTS" => Ok(TargetProperty::UltimateTensileStrength),
            _ => Err(TargetError::UnknownProperty(s.to_string())),
        }
    }
}

/// Out-of-domain search parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    #[error("Target must be YS or UTS (got '{0}')")]
    UnknownProperty(String),
    #[error("Value must be between 0 and {max} MPa (got {0})", max = MAX_TARGET_MPA)]
    ValueOutOfRange(f64),
    #[error("Tolerance must be in (0, 1] (got {0})")]
    ToleranceOutOfRange(f64),
    #[error("Count must be between 1 and {max} (got {0})", max = MAX_SUGGESTIONS)]
    CountOutOfRange(usize),
    #[error("Mode must not be empty")]
    EmptyMode,
}

/// Acceptance band `[low, high]` around the target value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub low: f64,
    pub high: f64,
}

/// Immutable description of one inverse search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub property: TargetProperty,
    pub value: f64,
    pub tolerance: f64,
    pub count: usize,
    pub mode: String,
}

impl TargetSpec {
    /// Build a validated target.
    pub fn new(
        property: TargetProperty,
        value: f64,
        tolerance: f64,
        count: usize,
        mode: impl Into<String>,
    ) -> Result<Self, TargetError> {
        if !value.is_finite() || !(0.0..=MAX_TARGET_MPA).contains(&value) {
            return Err(TargetError::ValueOutOfRange(value));
        }
        if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > 1.0 {
            return Err(TargetError::ToleranceOutOfRange(tolerance));
        }
        if count == 0 || count > MAX_SUGGESTIONS {
            return Err(TargetError::CountOutOfRange(count));
        }
        let mode = mode.into();
        if mode.trim().is_empty() {
            return Err(TargetError::EmptyMode);
        }
        Ok(Self {
            property,
            value,
            tolerance,
            count,
            mode,
        })
    }

    pub fn range(&self) -> TargetRange {
        TargetRange {
            low: self.value * (1.0 - self.tolerance),
            high: self.value * (1.0 + self.tolerance),
        }
    }

    pub fn absolute_error(&self, predicted: f64) -> f64 {
        (predicted - self.value).abs()
    }

    /// Relative error as a fraction of the target value.
    ///
    /// A zero target yields 0 for an exact hit and +∞ otherwise.
    pub fn error_fraction(&self, predicted: f64) -> f64 {
        let abs = self.absolute_error(predicted);
        if self.value > 0.0 {
            abs / self.value
        } else if abs == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    }

    pub fn within_tolerance(&self, predicted: f64) -> bool {
        self.error_fraction(predicted) <= self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_for_ys_300() {
        let t = TargetSpec::new(TargetProperty::YieldStrength, 300.0, 0.1, 10, "baseline").unwrap();
        let r = t.range();
        assert!((r.low - 270.0).abs() < 1e-9);
        assert!((r.high - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_domain_checks() {
        let p = TargetProperty::YieldStrength;
        assert!(matches!(
            TargetSpec::new(p, -1.0, 0.1, 10, "m"),
            Err(TargetError::ValueOutOfRange(_))
        ));
        assert!(matches!(
            TargetSpec::new(p, 1500.0, 0.1, 10, "m"),
            Err(TargetError::ValueOutOfRange(_))
        ));
        assert!(matches!(
            TargetSpec::new(p, 300.0, 0.0, 10, "m"),
            Err(TargetError::ToleranceOutOfRange(_))
        ));
        assert!(matches!(
            TargetSpec::new(p, 300.0, 1.5, 10, "m"),
            Err(TargetError::ToleranceOutOfRange(_))
        ));
        assert!(matches!(
            TargetSpec::new(p, 300.0, 0.1, 0, "m"),
            Err(TargetError::CountOutOfRange(0))
        ));
        assert!(matches!(
            TargetSpec::new(p, 300.0, 0.1, 5, " "),
            Err(TargetError::EmptyMode)
        ));
        assert!(TargetSpec::new(p, 0.0, 1.0, 1, "m").is_ok());
    }

    #[test]
    fn test_error_fraction_zero_target() {
        let t = TargetSpec::new(TargetProperty::YieldStrength, 0.0, 1.0, 1, "m").unwrap();
        assert_eq!(t.error_fraction(0.0), 0.0);
        assert!(t.error_fraction(5.0).is_infinite());
        assert!(!t.within_tolerance(5.0));
        assert!(t.within_tolerance(0.0));
    }

    #[test]
    fn test_parse_property() {
        assert_eq!("YS".parse::<TargetProperty>().unwrap(), TargetProperty::YieldStrength);
        assert_eq!("uts".parse::<TargetProperty>().unwrap(), TargetProperty::UltimateTensileStrength);
        assert!("HV".parse::<TargetProperty>().is_err());
    }
}
