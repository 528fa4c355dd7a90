//! Unfractionated heparin, weight-based nomogram.
//!
//! Initial dosing depends on the indication; when a current aPTT is supplied
//! the infusion is adjusted with the standard five-band table.

use crate::calculator::Calculator;
use crate::format::{fixed, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const INDICATIONS: &[&str] = &[
    "1 - Tromboembolismo venoso (TVP/TEP)",
    "2 - Síndrome coronario agudo",
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 30.0, 200.0),
    FieldSpec::choice("indication", "Indicación", INDICATIONS),
    FieldSpec::number("concentration", "Concentración", "U/mL", 1.0, 1000.0).or_default("100"),
    FieldSpec::flag("has_aptt", "aPTT disponible"),
    FieldSpec::number("aptt", "aPTT actual", "s", 10.0, 250.0).when("has_aptt"),
    FieldSpec::number("current_rate", "Infusión actual", "U/kg/h", 1.0, 40.0).when("has_aptt"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "The weight-based heparin dosing nomogram compared with a standard care nomogram",
        source: "Annals of Internal Medicine",
        url: Some("https://doi.org/10.7326/0003-4819-119-9-199311010-00002"),
        year: Some(1993),
    },
    Reference {
        title: "Parenteral anticoagulants: Antithrombotic Therapy and Prevention of Thrombosis, 9th ed",
        source: "CHEST Guidelines",
        url: Some("https://doi.org/10.1378/chest.11-2291"),
        year: Some(2012),
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indication {
    VenousThromboembolism,
    AcuteCoronarySyndrome,
}

impl Indication {
    fn from_score(score: i32) -> Self {
        if score == 2 {
            Self::AcuteCoronarySyndrome
        } else {
            Self::VenousThromboembolism
        }
    }

    /// Bolus (U) and infusion (U/h) for the indication
    pub fn initial_dose(self, weight: f64) -> (f64, f64) {
        match self {
            Self::VenousThromboembolism => (80.0 * weight, 18.0 * weight),
            Self::AcuteCoronarySyndrome => ((60.0 * weight).min(4000.0), (12.0 * weight).min(1000.0)),
        }
    }
}

/// aPTT adjustment row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AptAdjustment {
    pub band: &'static str,
    pub rebolus_per_kg: f64,
    pub rate_change_per_kg: f64,
    pub hold_minutes: u32,
}

pub fn aptt_adjustment(aptt: f64) -> AptAdjustment {
    if aptt < 35.0 {
        AptAdjustment {
            band: "< 35 s",
            rebolus_per_kg: 80.0,
            rate_change_per_kg: 4.0,
            hold_minutes: 0,
        }
    } else if aptt <= 45.0 {
        AptAdjustment {
            band: "35-45 s",
            rebolus_per_kg: 40.0,
            rate_change_per_kg: 2.0,
            hold_minutes: 0,
        }
    } else if aptt <= 70.0 {
        AptAdjustment {
            band: "46-70 s (terapéutico)",
            rebolus_per_kg: 0.0,
            rate_change_per_kg: 0.0,
            hold_minutes: 0,
        }
    } else if aptt <= 90.0 {
        AptAdjustment {
            band: "71-90 s",
            rebolus_per_kg: 0.0,
            rate_change_per_kg: -2.0,
            hold_minutes: 0,
        }
    } else {
        AptAdjustment {
            band: "> 90 s",
            rebolus_per_kg: 0.0,
            rate_change_per_kg: -3.0,
            hold_minutes: 60,
        }
    }
}

pub struct HeparinDosage;

impl Calculator for HeparinDosage {
    fn id(&self) -> &'static str {
        "heparin"
    }

    fn name(&self) -> &'static str {
        "Heparina no Fraccionada (Nomograma por Peso)"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let indication = Indication::from_score(inputs.require_score("indication")?);
        let concentration = inputs.require_number("concentration")?;

        let (bolus, infusion) = indication.initial_dose(weight);

        let mut values = ResultValues::new();
        values.insert("bolus_units".into(), whole(bolus));
        values.insert("infusion_units_per_hour".into(), whole(infusion));
        values.insert("infusion_units_per_kg_h".into(), fixed(infusion / weight, 1));
        values.insert("infusion_rate_ml_h".into(), fixed(infusion / concentration, 1));

        if inputs.flag("has_aptt") {
            let aptt = inputs.require_number("aptt")?;
            let current = inputs.require_number("current_rate")?;
            let adjustment = aptt_adjustment(aptt);
            let new_rate = (current + adjustment.rate_change_per_kg).max(0.0);
            let new_units = new_rate * weight;

            values.insert("aptt_band".into(), adjustment.band.into());
            values.insert("rebolus_units".into(), whole(adjustment.rebolus_per_kg * weight));
            values.insert("rate_change_units_kg_h".into(), fixed(adjustment.rate_change_per_kg, 1));
            values.insert("hold_minutes".into(), adjustment.hold_minutes.to_string());
            values.insert("new_rate_units_kg_h".into(), fixed(new_rate, 1));
            values.insert("new_rate_units_h".into(), whole(new_units));
            values.insert("new_rate_ml_h".into(), fixed(new_units / concentration, 1));
            values.insert("next_aptt_hours".into(), "6".into());
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(bolus), Some(infusion)) = (result.number("bolus_units"), result.number("infusion_units_per_hour")) else {
            return narrative::incomplete(self.name());
        };
        let rate = result.value("infusion_rate_ml_h").unwrap_or("-");

        let text = Narrative::new(self.name()).section(
            "Dosis inicial",
            [
                format!("Bolo intravenoso: {} U", whole(bolus)),
                format!(
                    "Infusión continua: {} U/h ({} U/kg/h) = {} mL/h",
                    whole(infusion),
                    result.value("infusion_units_per_kg_h").unwrap_or("-"),
                    rate
                ),
            ],
        );

        let text = match result.value("aptt_band") {
            Some(band) => {
                let mut steps = Vec::new();
                let hold = result.number("hold_minutes").unwrap_or(0.0);
                let rebolus = result.number("rebolus_units").unwrap_or(0.0);
                if hold > 0.0 {
                    steps.push(format!("Suspender la infusión {} minutos", whole(hold)));
                }
                if rebolus > 0.0 {
                    steps.push(format!("Rebolo de {} U", whole(rebolus)));
                }
                steps.push(format!(
                    "Nueva infusión: {} U/kg/h = {} U/h = {} mL/h",
                    result.value("new_rate_units_kg_h").unwrap_or("-"),
                    result.value("new_rate_units_h").unwrap_or("-"),
                    result.value("new_rate_ml_h").unwrap_or("-")
                ));
                steps.push(format!(
                    "Repetir aPTT en {} horas",
                    result.value("next_aptt_hours").unwrap_or("6")
                ));
                text.paragraph(format!("Ajuste según aPTT ({}).", band))
                    .section("Ajuste de infusión", steps)
            }
            None => text.section(
                "Monitorización",
                ["Solicitar aPTT 6 horas después del bolo inicial y ajustar según nomograma"],
            ),
        };

        text.section(
            "Seguridad",
            [
                "Medicamento de alto riesgo: doble verificación independiente de dosis y bomba",
                "Hemograma basal y recuento de plaquetas cada 2-3 días (riesgo de trombocitopenia inducida por heparina)",
                "Vigilar signos de sangrado; antídoto: sulfato de protamina",
            ],
        )
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_vte_initial_dose() {
        let inputs = input_set([("weight", "80"), ("indication", "1")]);
        let result = HeparinDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("bolus_units"), Some("6400"));
        assert_eq!(result.value("infusion_units_per_hour"), Some("1440"));
        assert_eq!(result.value("infusion_rate_ml_h"), Some("14.4"));
        assert_eq!(result.value("aptt_band"), None);
    }

    #[test]
    fn test_acs_dose_is_capped() {
        let (bolus, infusion) = Indication::AcuteCoronarySyndrome.initial_dose(100.0);
        assert_eq!(bolus, 4000.0);
        assert_eq!(infusion, 1000.0);
    }

    #[test]
    fn test_aptt_bands() {
        assert_eq!(aptt_adjustment(30.0).rebolus_per_kg, 80.0);
        assert_eq!(aptt_adjustment(45.0).rate_change_per_kg, 2.0);
        assert_eq!(aptt_adjustment(60.0).rate_change_per_kg, 0.0);
        assert_eq!(aptt_adjustment(90.0).rate_change_per_kg, -2.0);
        assert_eq!(aptt_adjustment(95.0).hold_minutes, 60);
    }

    #[test]
    fn test_high_aptt_adjustment() {
        let inputs = input_set([
            ("weight", "80"),
            ("indication", "1 - Tromboembolismo venoso (TVP/TEP)"),
            ("concentration", "100"),
            ("has_aptt", "true"),
            ("aptt", "100"),
            ("current_rate", "18"),
        ]);
        let result = HeparinDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("new_rate_units_kg_h"), Some("15.0"));
        assert_eq!(result.value("new_rate_units_h"), Some("1200"));
        assert_eq!(result.value("new_rate_ml_h"), Some("12.0"));
        assert_eq!(result.value("hold_minutes"), Some("60"));

        let text = HeparinDosage.interpret(&result);
        assert!(text.contains("Suspender la infusión 60 minutos"));
    }

    #[test]
    fn test_aptt_fields_required_when_flagged() {
        let inputs = input_set([("weight", "80"), ("indication", "1"), ("has_aptt", "true")]);
        let validation = HeparinDosage.validate(&inputs);
        assert_eq!(validation.errors().len(), 2);
    }
}
