//! Constraint Validator
//!
//! Checks a candidate against the physical constraints of the design space.
//! Violations are data, not errors: the result is a list of human-readable
//! descriptions, empty iff the candidate is valid.
//!
//! Checks run in a fixed order so violation lists are reproducible:
//! 1. composition sum within `sum_epsilon` of 100 wt%
//! 2. each element within its bound (canonical element order)
//! 3. each processing parameter within its bound (canonical parameter order)

use crate::schema::{element_bound, processing_bound};
use crate::types::{Composition, Element, Processing, ProcessingParam};

/// Validate a composition + processing pair.
pub fn validate(composition: &Composition, processing: &Processing, sum_epsilon: f64) -> Vec<String> {
    let mut violations = Vec::new();

    let sum = composition.sum();
    // Written as a negated `<=` so a NaN sum is reported too.
    if !((sum - 100.0).abs() <= sum_epsilon) {
        violations.push(format!("Composition sum={sum:.2}%, should be ~100%"));
    }

    for element in Element::ALL {
        let value = composition.get(element);
        let bound = element_bound(element);
        if !bound.contains(value) {
            violations.push(format!(
                "{element}={value:.2}% outside [{}, {}]%",
                bound.min, bound.max
            ));
        }
    }

    for param in ProcessingParam::ALL {
        let value = processing.get(param);
        let bound = processing_bound(param);
        if !bound.contains(value) {
            violations.push(format!(
                "{}={value:.2} outside [{}, {}]",
                param.key(),
                bound.min,
                bound.max
            ));
        }
    }

    violations
}

/// Convenience wrapper: `true` iff [`validate`] reports nothing.
pub fn is_valid(composition: &Composition, processing: &Processing, sum_epsilon: f64) -> bool {
    validate(composition, processing, sum_epsilon).is_empty()
}
