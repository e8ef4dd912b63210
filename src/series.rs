//! Alloy Series Classifier
//!
//! Rule-based tagging of a composition with the wrought aluminum families it
//! resembles. Each series is a small set of element windows that must all
//! hold; tags are not exclusive, and an unusual composition may match none.

use serde::{Deserialize, Serialize};

use crate::types::{Composition, Element};

/// Wrought aluminum alloy family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlloySeries {
    #[serde(rename = "2xxx")]
    Series2xxx,
    #[serde(rename = "5xxx")]
    Series5xxx,
    #[serde(rename = "6xxx")]
    Series6xxx,
    #[serde(rename = "7xxx")]
    Series7xxx,
}

impl AlloySeries {
    pub const fn code(self) -> &'static str {
        match self {
            AlloySeries::Series2xxx => "2xxx",
            AlloySeries::Series5xxx => "5xxx",
            AlloySeries::Series6xxx => "6xxx",
            AlloySeries::Series7xxx => "7xxx",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            AlloySeries::Series2xxx => "Cu-based (aerospace)",
            AlloySeries::Series5xxx => "Mg-based (marine)",
            AlloySeries::Series6xxx => "Mg-Si (extrusions)",
            AlloySeries::Series7xxx => "Zn-based (aerospace)",
        }
    }
}

impl std::fmt::Display for AlloySeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code(), self.description())
    }
}

/// Element window `[lo, hi]` in wt%.
struct Window {
    element: Element,
    lo: f64,
    hi: f64,
}

const fn window(element: Element, lo: f64, hi: f64) -> Window {
    Window { element, lo, hi }
}

/// Series signatures, checked in this order.
const SERIES_RULES: [(AlloySeries, &[Window]); 4] = [
    (
        AlloySeries::Series2xxx,
        &[window(Element::Cu, 2.0, 5.0), window(Element::Mg, 0.0, 2.0)],
    ),
    (
        AlloySeries::Series5xxx,
        &[window(Element::Mg, 2.0, 6.0), window(Element::Cu, 0.0, 0.5)],
    ),
    (
        AlloySeries::Series6xxx,
        &[window(Element::Mg, 0.5, 1.5), window(Element::Si, 0.5, 1.5)],
    ),
    (
        AlloySeries::Series7xxx,
        &[window(Element::Zn, 4.0, 8.0), window(Element::Mg, 1.0, 3.0)],
    ),
];

/// Return every series whose signature the composition satisfies.
pub fn classify(composition: &Composition) -> Vec<AlloySeries> {
    SERIES_RULES
        .iter()
        .filter(|(_, windows)| {
            windows.iter().all(|w| {
                let v = composition.get(w.element);
                v >= w.lo && v <= w.hi
            })
        })
        .map(|(series, _)| *series)
        .collect()
}
