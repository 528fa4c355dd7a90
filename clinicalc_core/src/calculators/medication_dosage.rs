//! Weight-based medication dosing.

use crate::calculator::Calculator;
use crate::format::{fixed, flag};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

/// Score is the number of doses per day
const FREQUENCIES: &[&str] = &[
    "1 - Cada 24 horas",
    "2 - Cada 12 horas",
    "3 - Cada 8 horas",
    "4 - Cada 6 horas",
    "6 - Cada 4 horas",
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 1.0, 200.0),
    FieldSpec::number("dose_per_kg", "Dosis por kilo", "mg/kg", 0.01, 100.0),
    FieldSpec::choice("frequency", "Frecuencia", FREQUENCIES),
    FieldSpec::number("concentration", "Concentración", "mg/mL", 0.01, 1000.0).optional(),
    FieldSpec::number("max_single_dose", "Dosis máxima por toma", "mg", 0.1, 10_000.0).optional(),
    FieldSpec::number("max_daily_dose", "Dosis máxima diaria", "mg", 0.1, 50_000.0).optional(),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Medication Math for the Nursing Professional",
        source: "StatPearls Publishing",
        url: Some("https://www.ncbi.nlm.nih.gov/books/NBK545161/"),
        year: Some(2023),
    },
    Reference {
        title: "Guidelines for the safe prescribing of weight-based doses",
        source: "Institute for Safe Medication Practices",
        url: Some("https://www.ismp.org"),
        year: None,
    },
];

/// Why a computed dose was reduced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoseCap {
    None,
    SingleDose,
    DailyDose,
}

impl DoseCap {
    fn describe(self) -> &'static str {
        match self {
            Self::None => "Sin ajuste",
            Self::SingleDose => "Limitada por la dosis máxima por toma",
            Self::DailyDose => "Limitada por la dosis máxima diaria",
        }
    }
}

/// Single dose (mg) after applying the optional per-dose and daily ceilings
pub fn capped_dose(
    weight: f64,
    dose_per_kg: f64,
    doses_per_day: f64,
    max_single: Option<f64>,
    max_daily: Option<f64>,
) -> (f64, DoseCap) {
    let mut single = weight * dose_per_kg;
    let mut cap = DoseCap::None;

    if let Some(max) = max_single.filter(|max| single > *max) {
        single = max;
        cap = DoseCap::SingleDose;
    }
    if let Some(max) = max_daily.filter(|max| single * doses_per_day > *max) {
        single = max / doses_per_day;
        cap = DoseCap::DailyDose;
    }
    (single, cap)
}

pub struct MedicationDosage;

impl Calculator for MedicationDosage {
    fn id(&self) -> &'static str {
        "medication_dosage"
    }

    fn name(&self) -> &'static str {
        "Dosificación de Medicamentos por Peso"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        if let (Some(single), Some(daily)) = (inputs.number("max_single_dose"), inputs.number("max_daily_dose")) {
            if daily < single {
                errors.push("La dosis máxima diaria no puede ser menor que la dosis máxima por toma".to_string());
            }
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let dose_per_kg = inputs.require_number("dose_per_kg")?;
        let doses_per_day = inputs.require_score("frequency")?;
        let per_day = f64::from(doses_per_day);

        let requested = weight * dose_per_kg;
        let (single, cap) = capped_dose(
            weight,
            dose_per_kg,
            per_day,
            inputs.number("max_single_dose"),
            inputs.number("max_daily_dose"),
        );

        let mut values = ResultValues::new();
        values.insert("calculated_dose_mg".into(), fixed(requested, 1));
        values.insert("single_dose_mg".into(), fixed(single, 1));
        values.insert("daily_dose_mg".into(), fixed(single * per_day, 1));
        values.insert("doses_per_day".into(), doses_per_day.to_string());
        values.insert("interval_hours".into(), (24 / doses_per_day).to_string());
        values.insert("dose_capped".into(), flag(cap != DoseCap::None));
        values.insert("cap_reason".into(), cap.describe().into());
        values.insert("effective_mg_per_kg".into(), fixed(single / weight, 2));
        if let Some(concentration) = inputs.number("concentration") {
            values.insert("volume_per_dose_ml".into(), fixed(single / concentration, 1));
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(single), Some(daily)) = (result.number("single_dose_mg"), result.number("daily_dose_mg")) else {
            return narrative::incomplete(self.name());
        };
        let interval = result.value("interval_hours").unwrap_or("-");
        let capped = result.value("dose_capped") == Some("true");

        let mut administration = vec![format!(
            "Administrar {} mg cada {} horas ({} mg/día)",
            fixed(single, 1),
            interval,
            fixed(daily, 1)
        )];
        if let Some(volume) = result.value("volume_per_dose_ml") {
            administration.push(format!(
                "Volumen por toma: {} mL a la concentración indicada ({} mg/mL)",
                volume,
                result.input("concentration").unwrap_or("-")
            ));
        }

        let text = Narrative::new(self.name())
            .paragraph(format!(
                "Dosis calculada: {} mg ({} mg/kg efectivos).",
                result.value("calculated_dose_mg").unwrap_or("-"),
                result.value("effective_mg_per_kg").unwrap_or("-")
            ))
            .section("Administración", administration);

        let text = if capped {
            text.section(
                "Ajuste de dosis",
                [
                    result.value("cap_reason").unwrap_or("Dosis limitada").to_string(),
                    "La dosis por peso supera el máximo indicado: se administra la dosis máxima".to_string(),
                    "Confirmar la indicación y la dosis máxima con la ficha técnica".to_string(),
                ],
            )
        } else {
            text
        };

        text.section(
            "Verificación",
            [
                "Comprobar los cinco correctos: paciente, fármaco, dosis, vía y hora",
                "Doble verificación independiente para medicamentos de alto riesgo",
                "Revisar función renal y hepática para posibles ajustes",
                "Confirmar alergias documentadas",
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
    fn test_uncapped_dose_with_volume() {
        let inputs = input_set([
            ("weight", "70"),
            ("dose_per_kg", "15"),
            ("frequency", "4 - Cada 6 horas"),
            ("concentration", "100"),
        ]);
        let result = MedicationDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("single_dose_mg"), Some("1050.0"));
        assert_eq!(result.value("daily_dose_mg"), Some("4200.0"));
        assert_eq!(result.value("interval_hours"), Some("6"));
        assert_eq!(result.value("volume_per_dose_ml"), Some("10.5"));
        assert_eq!(result.value("dose_capped"), Some("false"));
    }

    #[test]
    fn test_single_dose_cap() {
        let (single, cap) = capped_dose(90.0, 15.0, 4.0, Some(1000.0), None);
        assert_eq!(single, 1000.0);
        assert_eq!(cap, DoseCap::SingleDose);
    }

    #[test]
    fn test_daily_cap_overrides_single() {
        let (single, cap) = capped_dose(70.0, 15.0, 4.0, Some(1000.0), Some(3000.0));
        assert_eq!(single, 750.0);
        assert_eq!(cap, DoseCap::DailyDose);
    }

    #[test]
    fn test_capped_narrative() {
        let inputs = input_set([
            ("weight", "90"),
            ("dose_per_kg", "15"),
            ("frequency", "4"),
            ("max_single_dose", "1000"),
        ]);
        let result = MedicationDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("calculated_dose_mg"), Some("1350.0"));
        assert_eq!(result.value("dose_capped"), Some("true"));
        assert!(MedicationDosage.interpret(&result).contains("dosis máxima por toma"));
    }

    #[test]
    fn test_inconsistent_maximums_rejected() {
        let inputs = input_set([
            ("weight", "70"),
            ("dose_per_kg", "15"),
            ("frequency", "5"),
            ("max_single_dose", "1000"),
            ("max_daily_dose", "500"),
        ]);
        let validation = MedicationDosage.validate(&inputs);

        // frequency 5 is not an option, plus the maximum relation
        assert_eq!(validation.errors().len(), 2, "{:?}", validation.errors());
    }
}
