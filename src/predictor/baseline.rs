//! Built-in strengthening model.
//!
//! A closed-form estimate of yield / tensile strength used when no trained
//! surrogate artifact is configured. Contributions:
//!
//! - **Solid solution**: linear in each element's wt%
//! - **Precipitation**: Mg-Si, Cu-Mg and Zn-Mg pair terms, scaled by how
//!   complete the homogenization was and saturating at `PRECIPITATION_CAP`
//! - **Work hardening**: square-root in cold reduction, relieved by the
//!   recrystallization anneal
//! - **Grain refinement**: linear in hot reduction
//!
//! The model is smooth almost everywhere and monotone in each alloying
//! element, which is all the search engine needs from it.

use crate::schema::{Features, ELEMENT_COUNT};
use crate::types::{Element, ProcessingParam, TargetProperty};

use super::{PredictError, PropertyModel};

/// Annealed pure-aluminum yield strength (MPa).
const BASE_STRENGTH_MPA: f64 = 20.0;

/// Solid-solution coefficients (MPa per wt%), canonical element order.
const SOLID_SOLUTION_MPA: [f64; ELEMENT_COUNT] = [
    0.0,   // Al
    10.0,  // Si
    5.0,   // Fe
    12.0,  // Cu
    25.0,  // Mn
    18.0,  // Mg
    20.0,  // Cr
    5.0,   // Ni
    3.0,   // Zn
    15.0,  // Ti
    30.0,  // Zr
    120.0, // Sc
    5.0,   // Other
];

/// Mg2Si precipitation coefficient (MPa per sqrt(wt%²)).
const MG_SI_COEFF: f64 = 95.0;
/// S-phase (Al2CuMg) precipitation coefficient.
const CU_MG_COEFF: f64 = 40.0;
/// θ' (Al2Cu) precipitation, linear in Cu.
const CU_COEFF: f64 = 20.0;
/// η (MgZn2) precipitation coefficient.
const ZN_MG_COEFF: f64 = 45.0;
/// Saturation level of the combined precipitation term (MPa).
const PRECIPITATION_CAP: f64 = 450.0;

/// Work hardening coefficient (MPa per sqrt(% reduction)).
const WORK_HARDENING_COEFF: f64 = 9.0;
/// Fraction of work hardening removed by a complete anneal.
const MAX_RECOVERY: f64 = 0.8;
/// Grain refinement from hot rolling (MPa per % reduction).
const HOT_ROLLING_COEFF: f64 = 0.3;

/// Reference homogenization soak (s).
const HOMOG_REFERENCE_S: f64 = 28_800.0;
/// Recrystallization onset temperature (°C) and width of the transition.
const RECRYST_ONSET_C: f64 = 350.0;
const RECRYST_WIDTH_C: f64 = 30.0;
/// Time constant of the anneal (s).
const RECRYST_TIME_CONSTANT_S: f64 = 1_800.0;

/// Closed-form strengthening model for one target property.
#[derive(Debug, Clone, Copy)]
pub struct StrengtheningModel {
    target: TargetProperty,
}

impl StrengtheningModel {
    pub fn new(target: TargetProperty) -> Self {
        Self { target }
    }

    fn yield_strength(features: &Features) -> f64 {
        let el = |e: Element| features[e.index()].max(0.0);
        let pr = |p: ProcessingParam| features[ELEMENT_COUNT + p.index()];

        let solid_solution: f64 = Element::ALL
            .iter()
            .map(|&e| SOLID_SOLUTION_MPA[e.index()] * el(e))
            .sum();

        // Homogenization completeness in [0.7, 1.0]
        let temp_frac = ((pr(ProcessingParam::HomogTemp) - 400.0) / 180.0).clamp(0.0, 1.0);
        let time_frac = (pr(ProcessingParam::HomogTime) / HOMOG_REFERENCE_S).clamp(0.0, 1.0);
        let homogenization = 0.7 + 0.3 * smoothstep(temp_frac) * time_frac;

        let mg = el(Element::Mg);
        let raw_precipitation = MG_SI_COEFF * (mg * el(Element::Si)).sqrt()
            + CU_MG_COEFF * (el(Element::Cu) * mg).sqrt()
            + CU_COEFF * el(Element::Cu)
            + ZN_MG_COEFF * (el(Element::Zn) * mg).sqrt();
        let precipitation =
            PRECIPITATION_CAP * (1.0 - (-homogenization * raw_precipitation / PRECIPITATION_CAP).exp());

        let anneal_temp = logistic((pr(ProcessingParam::RecrystTemp) - RECRYST_ONSET_C) / RECRYST_WIDTH_C);
        let anneal_time = 1.0 - (-pr(ProcessingParam::RecrystTime).max(0.0) / RECRYST_TIME_CONSTANT_S).exp();
        let recovery = MAX_RECOVERY * anneal_temp * anneal_time;
        let work_hardening = WORK_HARDENING_COEFF
            * pr(ProcessingParam::ColdRolling).max(0.0).sqrt()
            * (1.0 - recovery);

        let grain_refinement = HOT_ROLLING_COEFF * pr(ProcessingParam::HotRolling).max(0.0);

        BASE_STRENGTH_MPA + solid_solution + precipitation + work_hardening + grain_refinement
    }
}

impl PropertyModel for StrengtheningModel {
    fn kind(&self) -> &'static str {
        "strengthening"
    }

    fn evaluate(&self, features: &Features) -> Result<f64, PredictError> {
        let ys = Self::yield_strength(features);
        Ok(match self.target {
            TargetProperty::YieldStrength => ys,
            // Mg raises the work-hardening capacity, widening the YS-UTS gap
            TargetProperty::UltimateTensileStrength => {
                1.15 * ys + 45.0 + 4.0 * features[Element::Mg.index()].max(0.0)
            }
        })
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn smoothstep(x: f64) -> f64 {
    x * x * (3.0 - 2.0 * x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{to_features, Composition, Processing};

    fn eval(target: TargetProperty, comp: &Composition, proc: &Processing) -> f64 {
        StrengtheningModel::new(target)
            .evaluate(&to_features(comp, proc))
            .unwrap()
    }

    fn alloy_6061() -> Composition {
        Composition::default()
            .with(Element::Al, 97.9)
            .with(Element::Mg, 1.0)
            .with(Element::Si, 0.6)
            .with(Element::Cu, 0.28)
            .with(Element::Cr, 0.2)
    }

    #[test]
    fn test_6061_in_plausible_range() {
        let ys = eval(TargetProperty::YieldStrength, &alloy_6061(), &Processing::default());
        assert!((100.0..400.0).contains(&ys), "ys = {ys}");
    }

    #[test]
    fn test_uts_exceeds_ys() {
        let p = Processing::default();
        let ys = eval(TargetProperty::YieldStrength, &alloy_6061(), &p);
        let uts = eval(TargetProperty::UltimateTensileStrength, &alloy_6061(), &p);
        assert!(uts > ys);
    }

    #[test]
    fn test_monotone_in_mg() {
        let p = Processing::default();
        let low = eval(TargetProperty::YieldStrength, &alloy_6061(), &p);
        let high = eval(TargetProperty::YieldStrength, &alloy_6061().with(Element::Mg, 1.4), &p);
        assert!(high > low);
    }

    #[test]
    fn test_cold_work_hardens_and_anneal_softens() {
        let comp = alloy_6061();
        let mut soft = Processing::default();
        soft.set(ProcessingParam::ColdRolling, 0.0);
        let mut hard = soft;
        hard.set(ProcessingParam::ColdRolling, 80.0);
        hard.set(ProcessingParam::RecrystTemp, 300.0);
        let mut annealed = hard;
        annealed.set(ProcessingParam::RecrystTemp, 550.0);
        annealed.set(ProcessingParam::RecrystTime, 36_000.0);

        let ys_soft = eval(TargetProperty::YieldStrength, &comp, &soft);
        let ys_hard = eval(TargetProperty::YieldStrength, &comp, &hard);
        let ys_annealed = eval(TargetProperty::YieldStrength, &comp, &annealed);
        assert!(ys_hard > ys_soft);
        assert!(ys_annealed < ys_hard);
    }

    #[test]
    fn test_precipitation_saturates() {
        let comp = Composition::default()
            .with(Element::Al, 79.0)
            .with(Element::Zn, 8.0)
            .with(Element::Mg, 6.0)
            .with(Element::Cu, 5.0)
            .with(Element::Si, 1.5);
        let ys = eval(TargetProperty::YieldStrength, &comp, &Processing::default());
        assert!(ys < 1000.0, "ys = {ys}");
    }
}
