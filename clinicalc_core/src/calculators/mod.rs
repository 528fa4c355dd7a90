//! Built-in calculator modules.
//!
//! Each module owns its field table, formula, threshold bands, narrative
//! and references. [`all`] lists one instance of each for registration.

pub mod apgar;
pub mod bmi;
pub mod braden;
pub mod electrolytes;
pub mod fluid_balance;
pub mod glasgow;
pub mod heparin;
pub mod iv_drip;
pub mod map;
pub mod medication_dosage;
pub mod minute_ventilation;
pub mod pediatric_dosage;
pub mod unit_converter;

use crate::calculator::Calculator;
use std::sync::Arc;

/// Every built-in calculator, in registration order
pub fn all() -> Vec<Arc<dyn Calculator>> {
    vec![
        Arc::new(bmi::Bmi),
        Arc::new(map::MeanArterialPressure),
        Arc::new(apgar::Apgar),
        Arc::new(glasgow::GlasgowComaScale),
        Arc::new(fluid_balance::FluidBalance),
        Arc::new(medication_dosage::MedicationDosage),
        Arc::new(pediatric_dosage::PediatricDosage),
        Arc::new(heparin::HeparinDosage),
        Arc::new(electrolytes::ElectrolyteManagement),
        Arc::new(unit_converter::UnitConverter),
        Arc::new(iv_drip::IvDripRate),
        Arc::new(minute_ventilation::MinuteVentilation),
        Arc::new(braden::Braden),
    ]
}
