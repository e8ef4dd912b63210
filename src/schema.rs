//! Bounds & Schema
//!
//! Static definitions for the 19-dimensional design space: 13 composition
//! elements (wt%) and 6 processing parameters. Everything that needs a bound,
//! a default or a feature position reads it from here.
//!
//! ## Canonical feature order
//!
//! `Al, Si, Fe, Cu, Mn, Mg, Cr, Ni, Zn, Ti, Zr, Sc, Other` followed by
//! `homog_temp_max_C, homog_time_total_s, recryst_temp_max_C,
//! recryst_time_total_s, cold_rolling_reduction_pct, hot_rolling_reduction_pct`.

use serde::{Deserialize, Serialize};

use crate::types::{Element, ProcessingParam};

/// Number of composition elements.
pub const ELEMENT_COUNT: usize = 13;

/// Number of processing parameters.
pub const PROCESSING_COUNT: usize = 6;

/// Total number of model features.
pub const FEATURE_COUNT: usize = ELEMENT_COUNT + PROCESSING_COUNT;

/// Default tolerance on the composition sum (wt%).
pub const DEFAULT_SUM_EPSILON: f64 = 0.5;

/// Largest accepted target value (MPa).
pub const MAX_TARGET_MPA: f64 = 1000.0;

/// Largest accepted suggestion count per request.
pub const MAX_SUGGESTIONS: usize = 100;

/// A model input vector in canonical feature order.
pub type Features = [f64; FEATURE_COUNT];

// ============================================================================
// Bounds
// ============================================================================

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Map `value` into `[0, 1]` relative to this bound.
    pub fn to_unit(&self, value: f64) -> f64 {
        if self.width() <= 0.0 {
            0.0
        } else {
            (value - self.min) / self.width()
        }
    }

    /// Inverse of [`Bound::to_unit`].
    pub fn from_unit(&self, unit: f64) -> f64 {
        self.min + unit * self.width()
    }
}

/// Practical composition limits (wt%).
pub const fn element_bound(element: Element) -> Bound {
    match element {
        Element::Al => Bound::new(85.0, 99.5),
        Element::Si => Bound::new(0.0, 1.5),
        Element::Fe => Bound::new(0.0, 0.5),
        Element::Cu => Bound::new(0.0, 5.0),
        Element::Mn => Bound::new(0.0, 1.5),
        Element::Mg => Bound::new(0.0, 6.0),
        Element::Cr => Bound::new(0.0, 0.35),
        Element::Ni => Bound::new(0.0, 0.1),
        Element::Zn => Bound::new(0.0, 8.0),
        Element::Ti => Bound::new(0.0, 0.2),
        Element::Zr => Bound::new(0.0, 0.25),
        Element::Sc => Bound::new(0.0, 0.5),
        Element::Other => Bound::new(0.0, 0.15),
    }
}

/// Typical processing ranges.
pub const fn processing_bound(param: ProcessingParam) -> Bound {
    match param {
        ProcessingParam::HomogTemp => Bound::new(400.0, 580.0),
        ProcessingParam::HomogTime => Bound::new(3_600.0, 72_000.0),
        ProcessingParam::RecrystTemp => Bound::new(300.0, 550.0),
        ProcessingParam::RecrystTime => Bound::new(60.0, 36_000.0),
        ProcessingParam::ColdRolling => Bound::new(0.0, 90.0),
        ProcessingParam::HotRolling => Bound::new(0.0, 99.0),
    }
}

/// Value used when a request omits a processing parameter.
pub const fn processing_default(param: ProcessingParam) -> f64 {
    match param {
        ProcessingParam::HomogTemp => 540.0,
        ProcessingParam::HomogTime => 28_800.0,
        ProcessingParam::RecrystTemp => 450.0,
        ProcessingParam::RecrystTime => 3_600.0,
        ProcessingParam::ColdRolling => 50.0,
        ProcessingParam::HotRolling => 80.0,
    }
}

/// Bound of the feature at canonical position `index`.
pub fn feature_bound(index: usize) -> Option<Bound> {
    if index < ELEMENT_COUNT {
        Some(element_bound(Element::ALL[index]))
    } else {
        ProcessingParam::ALL
            .get(index - ELEMENT_COUNT)
            .map(|&p| processing_bound(p))
    }
}

// ============================================================================
// Feature names
// ============================================================================

/// Canonical feature names in model order.
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    let mut names = [""; FEATURE_COUNT];
    for element in Element::ALL {
        names[element.index()] = element.symbol();
    }
    for param in ProcessingParam::ALL {
        names[ELEMENT_COUNT + param.index()] = param.key();
    }
    names
}

/// Resolve a feature name (canonical or legacy spelling) to its position.
pub fn feature_index(name: &str) -> Option<usize> {
    let name = name.trim();
    if let Some(element) = Element::from_symbol(name) {
        return Some(element.index());
    }
    ProcessingParam::from_key(name).map(|p| ELEMENT_COUNT + p.index())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_order() {
        let names = feature_names();
        assert_eq!(names[0], "Al");
        assert_eq!(names[1], "Si");
        assert_eq!(names[12], "Other");
        assert_eq!(names[13], "homog_temp_max_C");
        assert_eq!(names[18], "hot_rolling_reduction_pct");
    }

    #[test]
    fn test_feature_index_accepts_legacy_names() {
        assert_eq!(feature_index("Mg"), Some(5));
        assert_eq!(feature_index("Cold rolling reduction (percentage)"), Some(17));
        assert_eq!(feature_index("Hot rolling reduction (percentage)"), Some(18));
        assert_eq!(feature_index("Unobtainium"), None);
    }

    #[test]
    fn test_defaults_within_bounds() {
        for param in ProcessingParam::ALL {
            assert!(
                processing_bound(param).contains(processing_default(param)),
                "{} default out of bounds",
                param.key()
            );
        }
    }

    #[test]
    fn test_unit_mapping() {
        let b = Bound::new(400.0, 580.0);
        assert!((b.to_unit(490.0) - 0.5).abs() < 1e-12);
        assert!((b.from_unit(0.5) - 490.0).abs() < 1e-12);
        assert_eq!(b.clamp(600.0), 580.0);
        assert_eq!(Bound::new(1.0, 1.0).to_unit(1.0), 0.0);
    }

    #[test]
    fn test_feature_bound() {
        assert_eq!(feature_bound(0), Some(Bound::new(85.0, 99.5)));
        assert_eq!(feature_bound(17), Some(Bound::new(0.0, 90.0)));
        assert_eq!(feature_bound(FEATURE_COUNT), None);
    }
}
