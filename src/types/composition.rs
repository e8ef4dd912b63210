//! Composition vector: weight-percent breakdown over the 13 tracked elements.

use serde::{Deserialize, Serialize};

use crate::schema::ELEMENT_COUNT;

/// Elements tracked by the composition vector, in canonical feature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Al,
    Si,
    Fe,
    Cu,
    Mn,
    Mg,
    Cr,
    Ni,
    Zn,
    Ti,
    Zr,
    Sc,
    Other,
}

impl Element {
    pub const ALL: [Element; ELEMENT_COUNT] = [
        Element::Al,
        Element::Si,
        Element::Fe,
        Element::Cu,
        Element::Mn,
        Element::Mg,
        Element::Cr,
        Element::Ni,
        Element::Zn,
        Element::Ti,
        Element::Zr,
        Element::Sc,
        Element::Other,
    ];

    /// Position in the canonical feature vector.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Element::Al => "Al",
            Element::Si => "Si",
            Element::Fe => "Fe",
            Element::Cu => "Cu",
            Element::Mn => "Mn",
            Element::Mg => "Mg",
            Element::Cr => "Cr",
            Element::Ni => "Ni",
            Element::Zn => "Zn",
            Element::Ti => "Ti",
            Element::Zr => "Zr",
            Element::Sc => "Sc",
            Element::Other => "Other",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.symbol() == symbol)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Alloy composition in wt%.
///
/// Keys are the element symbols; a missing key deserializes as 0 and an
/// unknown key is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Composition {
    #[serde(rename = "Al", default)]
    pub al: f64,
    #[serde(rename = "Si", default)]
    pub si: f64,
    #[serde(rename = "Fe", default)]
    pub fe: f64,
    #[serde(rename = "Cu", default)]
    pub cu: f64,
    #[serde(rename = "Mn", default)]
    pub mn: f64,
    #[serde(rename = "Mg", default)]
    pub mg: f64,
    #[serde(rename = "Cr", default)]
    pub cr: f64,
    #[serde(rename = "Ni", default)]
    pub ni: f64,
    #[serde(rename = "Zn", default)]
    pub zn: f64,
    #[serde(rename = "Ti", default)]
    pub ti: f64,
    #[serde(rename = "Zr", default)]
    pub zr: f64,
    #[serde(rename = "Sc", default)]
    pub sc: f64,
    #[serde(rename = "Other", default)]
    pub other: f64,
}

impl Composition {
    pub fn get(&self, element: Element) -> f64 {
        match element {
            Element::Al => self.al,
            Element::Si => self.si,
            Element::Fe => self.fe,
            Element::Cu => self.cu,
            Element::Mn => self.mn,
            Element::Mg => self.mg,
            Element::Cr => self.cr,
            Element::Ni => self.ni,
            Element::Zn => self.zn,
            Element::Ti => self.ti,
            Element::Zr => self.zr,
            Element::Sc => self.sc,
            Element::Other => self.other,
        }
    }

    pub fn set(&mut self, element: Element, value: f64) {
        let slot = match element {
            Element::Al => &mut self.al,
            Element::Si => &mut self.si,
            Element::Fe => &mut self.fe,
            Element::Cu => &mut self.cu,
            Element::Mn => &mut self.mn,
            Element::Mg => &mut self.mg,
            Element::Cr => &mut self.cr,
            Element::Ni => &mut self.ni,
            Element::Zn => &mut self.zn,
            Element::Ti => &mut self.ti,
            Element::Zr => &mut self.zr,
            Element::Sc => &mut self.sc,
            Element::Other => &mut self.other,
        };
        *slot = value;
    }

    /// Builder-style setter, handy for literals.
    #[must_use]
    pub fn with(mut self, element: Element, value: f64) -> Self {
        self.set(element, value);
        self
    }

    pub fn to_array(&self) -> [f64; ELEMENT_COUNT] {
        Element::ALL.map(|e| self.get(e))
    }

    pub fn from_array(values: &[f64; ELEMENT_COUNT]) -> Self {
        let mut comp = Self::default();
        for element in Element::ALL {
            comp.set(element, values[element.index()]);
        }
        comp
    }

    /// Sum of all element fractions (wt%).
    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Scale every element by the same factor so the total is exactly 100.
    ///
    /// Relative proportions are preserved. A non-positive or non-finite sum
    /// leaves the vector unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if !total.is_finite() || total <= 0.0 {
            return *self;
        }
        let scale = 100.0 / total;
        Self::from_array(&self.to_array().map(|v| v * scale))
    }

    /// Euclidean distance in wt% space.
    pub fn euclidean_distance(&self, other: &Self) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// Manhattan (L1) distance in wt% space.
    pub fn manhattan_distance(&self, other: &Self) -> f64 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloy_6061() -> Composition {
        Composition::default()
            .with(Element::Al, 97.9)
            .with(Element::Mg, 1.0)
            .with(Element::Si, 0.6)
            .with(Element::Cu, 0.28)
            .with(Element::Cr, 0.2)
    }

    #[test]
    fn test_element_index_matches_order() {
        for (i, e) in Element::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
            assert_eq!(Element::from_symbol(e.symbol()), Some(*e));
        }
    }

    #[test]
    fn test_normalized_sums_to_100_and_keeps_proportions() {
        let comp = Composition::default()
            .with(Element::Al, 90.0)
            .with(Element::Mg, 5.0)
            .with(Element::Zn, 25.0);
        let norm = comp.normalized();
        assert!((norm.sum() - 100.0).abs() < 1e-9);
        assert!((norm.zn / norm.mg - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_zero_vector_unchanged() {
        let zero = Composition::default();
        assert_eq!(zero.normalized(), zero);
    }

    #[test]
    fn test_distances() {
        let a = alloy_6061();
        let b = a.with(Element::Mg, 1.3).with(Element::Al, 97.5);
        assert!((a.manhattan_distance(&b) - 0.7).abs() < 1e-9);
        assert!((a.euclidean_distance(&b) - 0.5).abs() < 1e-9);
        assert_eq!(a.euclidean_distance(&a), 0.0);
    }

    #[test]
    fn test_serde_symbol_keys_and_missing_defaults() {
        let comp: Composition = serde_json::from_str(r#"{"Al": 95.0, "Mg": 5.0}"#).unwrap();
        assert_eq!(comp.al, 95.0);
        assert_eq!(comp.mg, 5.0);
        assert_eq!(comp.cu, 0.0);

        let json = serde_json::to_value(comp).unwrap();
        assert_eq!(json["Al"], 95.0);
        assert_eq!(json["Other"], 0.0);
    }

    #[test]
    fn test_serde_rejects_unknown_element() {
        let result: Result<Composition, _> = serde_json::from_str(r#"{"Al": 95.0, "Pb": 5.0}"#);
        assert!(result.is_err());
    }
}
