//! Braden scale for pressure injury risk.
//!
//! Six subscales, five scored 1-4 and friction/shear scored 1-3, giving a
//! total between 6 and 23. Lower totals mean higher risk.

use crate::calculator::Calculator;
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{parse_choice, FieldSpec, ParsedInputs};
use crate::Result;

const SENSORY: &[&str] = &[
    "1 - Completamente limitada",
    "2 - Muy limitada",
    "3 - Ligeramente limitada",
    "4 - Sin limitaciones",
];

const MOISTURE: &[&str] = &[
    "1 - Constantemente húmeda",
    "2 - A menudo húmeda",
    "3 - Ocasionalmente húmeda",
    "4 - Raramente húmeda",
];

const ACTIVITY: &[&str] = &[
    "1 - Encamado",
    "2 - En silla",
    "3 - Deambula ocasionalmente",
    "4 - Deambula frecuentemente",
];

const MOBILITY: &[&str] = &[
    "1 - Completamente inmóvil",
    "2 - Muy limitada",
    "3 - Ligeramente limitada",
    "4 - Sin limitaciones",
];

const NUTRITION: &[&str] = &[
    "1 - Muy pobre",
    "2 - Probablemente inadecuada",
    "3 - Adecuada",
    "4 - Excelente",
];

const FRICTION: &[&str] = &[
    "1 - Problema",
    "2 - Problema potencial",
    "3 - Sin problema aparente",
];

/// (field id, label) in scoring order
const SUBSCALES: &[(&str, &str)] = &[
    ("sensory_perception", "Percepción sensorial"),
    ("moisture", "Humedad"),
    ("activity", "Actividad"),
    ("mobility", "Movilidad"),
    ("nutrition", "Nutrición"),
    ("friction_shear", "Fricción y cizallamiento"),
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("sensory_perception", "Percepción sensorial", SENSORY),
    FieldSpec::choice("moisture", "Humedad", MOISTURE),
    FieldSpec::choice("activity", "Actividad", ACTIVITY),
    FieldSpec::choice("mobility", "Movilidad", MOBILITY),
    FieldSpec::choice("nutrition", "Nutrición", NUTRITION),
    FieldSpec::choice("friction_shear", "Fricción y cizallamiento", FRICTION),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "The Braden Scale for Predicting Pressure Sore Risk",
        source: "Nursing Research",
        url: Some("https://doi.org/10.1097/00006199-198707000-00002"),
        year: Some(1987),
    },
    Reference {
        title: "Prevention and Treatment of Pressure Ulcers/Injuries: Clinical Practice Guideline",
        source: "EPUAP/NPIAP/PPPIA",
        url: Some("https://internationalguideline.com"),
        year: Some(2019),
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BradenRisk {
    VeryHigh,
    High,
    Moderate,
    Low,
    None,
}

impl BradenRisk {
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=9 => Self::VeryHigh,
            10..=12 => Self::High,
            13..=14 => Self::Moderate,
            15..=18 => Self::Low,
            _ => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "Riesgo muy alto",
            Self::High => "Riesgo alto",
            Self::Moderate => "Riesgo moderado",
            Self::Low => "Riesgo bajo",
            Self::None => "Sin riesgo",
        }
    }

    fn reassessment(self) -> &'static str {
        match self {
            Self::VeryHigh | Self::High => "Cada 24 horas",
            Self::Moderate => "Cada 48 horas",
            Self::Low => "Cada 72 horas",
            Self::None => "Semanal o ante cambios clínicos",
        }
    }

    fn repositioning(self) -> Option<&'static str> {
        match self {
            Self::VeryHigh => Some("Cambios posturales cada 2 horas"),
            Self::High => Some("Cambios posturales cada 2-3 horas"),
            Self::Moderate => Some("Cambios posturales cada 3-4 horas"),
            Self::Low | Self::None => None,
        }
    }
}

pub struct Braden;

impl Calculator for Braden {
    fn id(&self) -> &'static str {
        "braden"
    }

    fn name(&self) -> &'static str {
        "Escala de Braden"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let mut total = 0;
        let mut breakdown = Vec::with_capacity(SUBSCALES.len());
        let mut lowest: Vec<&str> = Vec::new();
        let mut lowest_score = i32::MAX;

        for &(id, label) in SUBSCALES {
            let score = inputs.require_score(id)?;
            total += score;
            breakdown.push(format!("{} {}", label, score));
            if score < lowest_score {
                lowest_score = score;
                lowest.clear();
            }
            if score == lowest_score {
                lowest.push(label);
            }
        }
        let risk = BradenRisk::from_score(total);

        let mut values = ResultValues::new();
        values.insert("total_score".into(), total.to_string());
        values.insert("risk_level".into(), risk.label().into());
        values.insert("breakdown".into(), breakdown.join(", "));
        values.insert("lowest_subscales".into(), lowest.join(", "));
        values.insert("reassessment".into(), risk.reassessment().into());
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(total) = result.value("total_score").and_then(|v| v.parse::<i32>().ok()) else {
            return narrative::incomplete(self.name());
        };
        let risk = BradenRisk::from_score(total);
        let score_of = |id: &str| {
            result
                .input(id)
                .and_then(parse_choice)
                .map(|(score, _)| score)
        };

        let mut prevention = Vec::new();
        if let Some(turning) = risk.repositioning() {
            prevention.push(turning.to_string());
        }
        if matches!(risk, BradenRisk::VeryHigh | BradenRisk::High) {
            prevention.push("Superficie especial de manejo de presión (colchón de aire alternante)".to_string());
        }
        if score_of("moisture").is_some_and(|s| s <= 2) {
            prevention.push("Control de la humedad: cremas barrera y cambio frecuente de absorbentes".to_string());
        }
        if score_of("nutrition").is_some_and(|s| s <= 2) {
            prevention.push("Valoración nutricional y suplementos proteicos".to_string());
        }
        if score_of("friction_shear").is_some_and(|s| s == 1) {
            prevention.push("Usar sábanas o dispositivos de movilización para evitar el arrastre".to_string());
        }
        if risk != BradenRisk::None {
            prevention.push("Inspección diaria de la piel en prominencias óseas".to_string());
        }

        Narrative::new(self.name())
            .paragraph(format!("Puntuación total: {}/23. {}.", total, risk.label()))
            .section(
                "Detalle",
                [
                    result.value("breakdown").unwrap_or("-").to_string(),
                    format!(
                        "Subescalas más comprometidas: {}",
                        result.value("lowest_subscales").unwrap_or("-")
                    ),
                ],
            )
            .section("Medidas preventivas", prevention)
            .paragraph(format!("Revaloración: {}.", risk.reassessment()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{input_set, InputSet};

    fn scored(values: [&str; 6]) -> InputSet {
        input_set(SUBSCALES.iter().map(|(id, _)| *id).zip(values))
    }

    #[test]
    fn test_maximum_score_no_risk() {
        let result = Braden.calculate_at(&scored(["4", "4", "4", "4", "4", "3"]), 0).unwrap();
        assert_eq!(result.value("total_score"), Some("23"));
        assert_eq!(result.value("risk_level"), Some("Sin riesgo"));
    }

    #[test]
    fn test_high_risk_lists_lowest_subscales() {
        let result = Braden.calculate_at(&scored(["2", "2", "1", "2", "3", "1"]), 0).unwrap();

        assert_eq!(result.value("total_score"), Some("11"));
        assert_eq!(result.value("risk_level"), Some("Riesgo alto"));
        assert_eq!(
            result.value("lowest_subscales"),
            Some("Actividad, Fricción y cizallamiento")
        );

        let text = Braden.interpret(&result);
        assert!(text.contains("colchón de aire alternante"));
        assert!(text.contains("cremas barrera"));
        assert!(text.contains("Cada 24 horas"));
    }

    #[test]
    fn test_risk_bands() {
        assert_eq!(BradenRisk::from_score(6), BradenRisk::VeryHigh);
        assert_eq!(BradenRisk::from_score(9), BradenRisk::VeryHigh);
        assert_eq!(BradenRisk::from_score(12), BradenRisk::High);
        assert_eq!(BradenRisk::from_score(14), BradenRisk::Moderate);
        assert_eq!(BradenRisk::from_score(18), BradenRisk::Low);
        assert_eq!(BradenRisk::from_score(19), BradenRisk::None);
    }

    #[test]
    fn test_friction_rejects_four() {
        let validation = Braden.validate(&scored(["4", "4", "4", "4", "4", "4"]));
        assert_eq!(
            validation.errors(),
            ["Fricción y cizallamiento: puntuación fuera de las opciones (4)"]
        );
    }
}
