//! Common clinical unit conversions.

use crate::calculator::Calculator;
use crate::format::fixed;
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{parse_choice, FieldSpec, ParsedInputs};
use crate::{Error, Result};

const CONVERSIONS: &[&str] = &[
    "1 - kg a lb",
    "2 - lb a kg",
    "3 - °C a °F",
    "4 - °F a °C",
    "5 - cm a pulgadas",
    "6 - pulgadas a cm",
    "7 - mg a mcg",
    "8 - mcg a mg",
    "9 - g a mg",
    "10 - mg a g",
    "11 - L a mL",
    "12 - mL a L",
    "13 - Glucosa mg/dL a mmol/L",
    "14 - Glucosa mmol/L a mg/dL",
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("conversion", "Conversión", CONVERSIONS),
    FieldSpec {
        unit: None,
        ..FieldSpec::number("value", "Valor", "", -273.15, 1_000_000.0)
    },
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "The International System of Units (SI), 9th edition",
        source: "Bureau International des Poids et Mesures",
        url: Some("https://www.bipm.org/en/publications/si-brochure"),
        year: Some(2019),
    },
    Reference {
        title: "SI Unit Conversion Table",
        source: "AMA Manual of Style",
        url: None,
        year: Some(2020),
    },
];

const LB_PER_KG: f64 = 2.204_62;
const CM_PER_INCH: f64 = 2.54;
const GLUCOSE_MG_DL_PER_MMOL: f64 = 18.0;

/// One supported conversion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    KgToLb,
    LbToKg,
    CelsiusToFahrenheit,
    FahrenheitToCelsius,
    CmToInch,
    InchToCm,
    MgToMcg,
    McgToMg,
    GToMg,
    MgToG,
    LToMl,
    MlToL,
    GlucoseMgDlToMmol,
    GlucoseMmolToMgDl,
}

impl Conversion {
    pub fn from_score(score: i32) -> Option<Self> {
        Some(match score {
            1 => Self::KgToLb,
            2 => Self::LbToKg,
            3 => Self::CelsiusToFahrenheit,
            4 => Self::FahrenheitToCelsius,
            5 => Self::CmToInch,
            6 => Self::InchToCm,
            7 => Self::MgToMcg,
            8 => Self::McgToMg,
            9 => Self::GToMg,
            10 => Self::MgToG,
            11 => Self::LToMl,
            12 => Self::MlToL,
            13 => Self::GlucoseMgDlToMmol,
            14 => Self::GlucoseMmolToMgDl,
            _ => return None,
        })
    }

    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::KgToLb => value * LB_PER_KG,
            Self::LbToKg => value / LB_PER_KG,
            Self::CelsiusToFahrenheit => value * 9.0 / 5.0 + 32.0,
            Self::FahrenheitToCelsius => (value - 32.0) * 5.0 / 9.0,
            Self::CmToInch => value / CM_PER_INCH,
            Self::InchToCm => value * CM_PER_INCH,
            Self::MgToMcg | Self::GToMg | Self::LToMl => value * 1000.0,
            Self::McgToMg | Self::MgToG | Self::MlToL => value / 1000.0,
            Self::GlucoseMgDlToMmol => value / GLUCOSE_MG_DL_PER_MMOL,
            Self::GlucoseMmolToMgDl => value * GLUCOSE_MG_DL_PER_MMOL,
        }
    }

    /// (from, to) unit symbols
    pub fn units(self) -> (&'static str, &'static str) {
        match self {
            Self::KgToLb => ("kg", "lb"),
            Self::LbToKg => ("lb", "kg"),
            Self::CelsiusToFahrenheit => ("°C", "°F"),
            Self::FahrenheitToCelsius => ("°F", "°C"),
            Self::CmToInch => ("cm", "in"),
            Self::InchToCm => ("in", "cm"),
            Self::MgToMcg => ("mg", "mcg"),
            Self::McgToMg => ("mcg", "mg"),
            Self::GToMg => ("g", "mg"),
            Self::MgToG => ("mg", "g"),
            Self::LToMl => ("L", "mL"),
            Self::MlToL => ("mL", "L"),
            Self::GlucoseMgDlToMmol => ("mg/dL", "mmol/L"),
            Self::GlucoseMmolToMgDl => ("mmol/L", "mg/dL"),
        }
    }

    pub fn is_temperature(self) -> bool {
        matches!(self, Self::CelsiusToFahrenheit | Self::FahrenheitToCelsius)
    }

    fn formula(self) -> &'static str {
        match self {
            Self::KgToLb => "lb = kg × 2.20462",
            Self::LbToKg => "kg = lb ÷ 2.20462",
            Self::CelsiusToFahrenheit => "°F = °C × 9/5 + 32",
            Self::FahrenheitToCelsius => "°C = (°F - 32) × 5/9",
            Self::CmToInch => "in = cm ÷ 2.54",
            Self::InchToCm => "cm = in × 2.54",
            Self::MgToMcg | Self::GToMg | Self::LToMl => "× 1000",
            Self::McgToMg | Self::MgToG | Self::MlToL => "÷ 1000",
            Self::GlucoseMgDlToMmol => "mmol/L = mg/dL ÷ 18",
            Self::GlucoseMmolToMgDl => "mg/dL = mmol/L × 18",
        }
    }

    fn note(self) -> Option<&'static str> {
        match self {
            Self::MgToMcg | Self::McgToMg => {
                Some("Confusión mg/mcg: error de dosificación de mil veces; escribir \"microgramos\" sin abreviar")
            }
            Self::GlucoseMgDlToMmol | Self::GlucoseMmolToMgDl => {
                Some("El factor 18 es específico de la glucosa; no aplicar a otros analitos")
            }
            Self::KgToLb | Self::LbToKg => Some("Las dosis por peso se calculan siempre en kilogramos"),
            _ => None,
        }
    }
}

pub struct UnitConverter;

impl Calculator for UnitConverter {
    fn id(&self) -> &'static str {
        "unit_converter"
    }

    fn name(&self) -> &'static str {
        "Conversor de Unidades Clínicas"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        let conversion = inputs.score("conversion").and_then(Conversion::from_score);
        if let (Some(conversion), Some(value)) = (conversion, inputs.number("value")) {
            if !conversion.is_temperature() && value < 0.0 {
                errors.push("El valor no puede ser negativo para esta conversión".to_string());
            }
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let score = inputs.require_score("conversion")?;
        let value = inputs.require_number("value")?;
        let conversion = Conversion::from_score(score)
            .ok_or_else(|| Error::Computation(format!("unknown conversion {}", score)))?;
        let (from, to) = conversion.units();

        let mut values = ResultValues::new();
        values.insert("converted_value".into(), fixed(conversion.apply(value), 2));
        values.insert("from_unit".into(), from.into());
        values.insert("to_unit".into(), to.into());
        values.insert("formula".into(), conversion.formula().into());
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(converted), Some(from), Some(to)) = (
            result.value("converted_value"),
            result.value("from_unit"),
            result.value("to_unit"),
        ) else {
            return narrative::incomplete(self.name());
        };
        let original = result.input("value").unwrap_or("-");
        let note = result
            .input("conversion")
            .and_then(parse_choice)
            .and_then(|(score, _)| Conversion::from_score(score))
            .and_then(Conversion::note);

        Narrative::new(self.name())
            .paragraph(format!("{} {} = {} {}", original, from, converted, to))
            .paragraph(format!("Fórmula: {}", result.value("formula").unwrap_or("-")))
            .section("Nota de seguridad", note)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    fn convert(conversion: &str, value: &str) -> CalculationResult {
        let inputs = input_set([("conversion", conversion), ("value", value)]);
        UnitConverter.calculate_at(&inputs, 0).unwrap()
    }

    #[test]
    fn test_weight_and_temperature() {
        assert_eq!(convert("1", "70").value("converted_value"), Some("154.32"));
        assert_eq!(convert("3 - °C a °F", "37").value("converted_value"), Some("98.60"));
        assert_eq!(convert("4", "-40").value("converted_value"), Some("-40.00"));
    }

    #[test]
    fn test_glucose_factor() {
        let result = convert("13", "180");
        assert_eq!(result.value("converted_value"), Some("10.00"));
        assert_eq!(result.value("to_unit"), Some("mmol/L"));
        assert!(UnitConverter.interpret(&result).contains("factor 18"));
    }

    #[test]
    fn test_negative_only_for_temperature() {
        let inputs = input_set([("conversion", "1"), ("value", "-5")]);
        assert_eq!(
            UnitConverter.validate(&inputs).errors(),
            ["El valor no puede ser negativo para esta conversión"]
        );
    }

    #[test]
    fn test_unknown_conversion_rejected() {
        let inputs = input_set([("conversion", "15"), ("value", "1")]);
        assert!(!UnitConverter.validate(&inputs).is_valid());
    }

    #[test]
    fn test_interpretation_echoes_both_sides() {
        let text = UnitConverter.interpret(&convert("11", "1.5"));
        assert!(text.contains("1.5 L = 1500.00 mL"));
    }
}
