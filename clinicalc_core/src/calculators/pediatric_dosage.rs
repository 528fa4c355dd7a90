//! Pediatric dose estimation from an adult dose.
//!
//! Several classic rules are reported side by side:
//! - Clark: adult dose × weight / 70 kg
//! - Young: adult dose × age / (age + 12), ages 1 to 12
//! - Body surface area (Mosteller): adult dose × BSA / 1.73 m²
//! - Direct mg/kg when a pediatric dose per kilo is known
//!
//! The recommendation prefers mg/kg, then BSA, then Clark, and never
//! exceeds the adult dose.

use crate::calculator::Calculator;
use crate::format::{fixed, flag};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 0.5, 80.0),
    FieldSpec::number("age", "Edad", "años", 0.0, 17.0),
    FieldSpec::number("adult_dose", "Dosis adulta", "mg", 0.1, 5000.0),
    FieldSpec::number("height", "Talla", "cm", 30.0, 200.0).optional(),
    FieldSpec::number("dose_per_kg", "Dosis pediátrica por kilo", "mg/kg", 0.01, 100.0).optional(),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Simplified calculation of body-surface area",
        source: "New England Journal of Medicine",
        url: Some("https://doi.org/10.1056/NEJM198710223171717"),
        year: Some(1987),
    },
    Reference {
        title: "Pediatric Dosage Calculations",
        source: "StatPearls Publishing",
        url: Some("https://www.ncbi.nlm.nih.gov/books/NBK556054/"),
        year: Some(2023),
    },
    Reference {
        title: "BNF for Children",
        source: "BMJ Group / Pharmaceutical Press",
        url: Some("https://bnfc.nice.org.uk"),
        year: None,
    },
];

const ADULT_WEIGHT_KG: f64 = 70.0;
const ADULT_BSA_M2: f64 = 1.73;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeGroup {
    Neonate,
    Infant,
    Toddler,
    Child,
    Adolescent,
}

impl AgeGroup {
    pub fn from_age(years: f64) -> Self {
        if years < 1.0 / 12.0 {
            Self::Neonate
        } else if years < 1.0 {
            Self::Infant
        } else if years < 6.0 {
            Self::Toddler
        } else if years < 12.0 {
            Self::Child
        } else {
            Self::Adolescent
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Neonate => "Neonato",
            Self::Infant => "Lactante",
            Self::Toddler => "Preescolar",
            Self::Child => "Escolar",
            Self::Adolescent => "Adolescente",
        }
    }
}

/// Mosteller body surface area in m²
pub fn mosteller_bsa(height_cm: f64, weight_kg: f64) -> f64 {
    (height_cm * weight_kg / 3600.0).sqrt()
}

pub fn clark_dose(adult_dose: f64, weight_kg: f64) -> f64 {
    adult_dose * weight_kg / ADULT_WEIGHT_KG
}

/// Young's rule, defined for ages 1 to 12
pub fn young_dose(adult_dose: f64, age_years: f64) -> Option<f64> {
    (1.0..=12.0)
        .contains(&age_years)
        .then(|| adult_dose * age_years / (age_years + 12.0))
}

pub struct PediatricDosage;

impl Calculator for PediatricDosage {
    fn id(&self) -> &'static str {
        "pediatric_dosage"
    }

    fn name(&self) -> &'static str {
        "Dosificación Pediátrica"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let age = inputs.require_number("age")?;
        let adult_dose = inputs.require_number("adult_dose")?;

        let clark = clark_dose(adult_dose, weight);
        let young = young_dose(adult_dose, age);
        let bsa = inputs.number("height").map(|h| mosteller_bsa(h, weight));
        let bsa_dose = bsa.map(|bsa| adult_dose * bsa / ADULT_BSA_M2);
        let per_kg_dose = inputs.number("dose_per_kg").map(|d| d * weight);

        let (method, candidate) = match (per_kg_dose, bsa_dose) {
            (Some(dose), _) => ("Dosis por kilo", dose),
            (None, Some(dose)) => ("Superficie corporal", dose),
            (None, None) => ("Regla de Clark", clark),
        };
        let capped = candidate > adult_dose;
        let recommended = candidate.min(adult_dose);

        let mut values = ResultValues::new();
        values.insert("age_group".into(), AgeGroup::from_age(age).label().into());
        values.insert("clark_dose_mg".into(), fixed(clark, 1));
        values.insert(
            "young_dose_mg".into(),
            young.map(|d| fixed(d, 1)).unwrap_or_else(|| "No aplica".into()),
        );
        if let (Some(bsa), Some(dose)) = (bsa, bsa_dose) {
            values.insert("bsa_m2".into(), fixed(bsa, 2));
            values.insert("bsa_dose_mg".into(), fixed(dose, 1));
        }
        if let Some(dose) = per_kg_dose {
            values.insert("weight_based_dose_mg".into(), fixed(dose, 1));
        }
        values.insert("recommended_dose_mg".into(), fixed(recommended, 1));
        values.insert("recommended_method".into(), method.into());
        values.insert("capped_at_adult_dose".into(), flag(capped));
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(recommended) = result.number("recommended_dose_mg") else {
            return narrative::incomplete(self.name());
        };
        let method = result.value("recommended_method").unwrap_or("-");
        let group = result.value("age_group").unwrap_or("-");

        let mut comparison = vec![format!(
            "Regla de Clark: {} mg",
            result.value("clark_dose_mg").unwrap_or("-")
        )];
        comparison.push(format!(
            "Regla de Young: {}",
            match result.value("young_dose_mg") {
                Some("No aplica") | None => "no aplicable fuera de 1-12 años".to_string(),
                Some(dose) => format!("{} mg", dose),
            }
        ));
        if let Some(dose) = result.value("bsa_dose_mg") {
            comparison.push(format!(
                "Superficie corporal ({} m²): {} mg",
                result.value("bsa_m2").unwrap_or("-"),
                dose
            ));
        }
        if let Some(dose) = result.value("weight_based_dose_mg") {
            comparison.push(format!("Dosis por kilo: {} mg", dose));
        }

        let mut cautions = vec![
            "Las reglas de Clark y Young son aproximaciones; priorizar la dosis pediátrica establecida cuando exista",
            "Verificar la dosis con un formulario pediátrico y doble verificación independiente",
        ];
        if matches!(group, "Neonato" | "Lactante") {
            cautions.push(
                "Neonatos y lactantes: inmadurez renal y hepática, considerar ampliar intervalos de dosificación",
            );
        }
        if result.value("capped_at_adult_dose") == Some("true") {
            cautions.push("La dosis calculada superaba la dosis adulta y se ha limitado a ésta");
        }

        Narrative::new(self.name())
            .paragraph(format!(
                "Dosis recomendada: {} mg ({}). Grupo de edad: {}.",
                fixed(recommended, 1),
                method,
                group
            ))
            .section("Comparativa de métodos", comparison)
            .section("Precauciones", cautions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_clark_when_only_weight_known() {
        let inputs = input_set([("weight", "20"), ("age", "6"), ("adult_dose", "500")]);
        let result = PediatricDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("clark_dose_mg"), Some("142.9"));
        assert_eq!(result.value("young_dose_mg"), Some("166.7"));
        assert_eq!(result.value("recommended_dose_mg"), Some("142.9"));
        assert_eq!(result.value("recommended_method"), Some("Regla de Clark"));
        assert_eq!(result.value("age_group"), Some("Escolar"));
    }

    #[test]
    fn test_bsa_preferred_over_clark() {
        let inputs = input_set([
            ("weight", "20"),
            ("age", "6"),
            ("adult_dose", "500"),
            ("height", "115"),
        ]);
        let result = PediatricDosage.calculate_at(&inputs, 0).unwrap();

        // sqrt(115 * 20 / 3600) = 0.799
        assert_eq!(result.value("bsa_m2"), Some("0.80"));
        assert_eq!(result.value("recommended_method"), Some("Superficie corporal"));
        assert_eq!(result.value("recommended_dose_mg"), Some("231.0"));
    }

    #[test]
    fn test_per_kg_capped_at_adult_dose() {
        let inputs = input_set([
            ("weight", "60"),
            ("age", "15"),
            ("adult_dose", "1000"),
            ("dose_per_kg", "20"),
        ]);
        let result = PediatricDosage.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("weight_based_dose_mg"), Some("1200.0"));
        assert_eq!(result.value("recommended_dose_mg"), Some("1000.0"));
        assert_eq!(result.value("capped_at_adult_dose"), Some("true"));
        assert_eq!(result.value("young_dose_mg"), Some("No aplica"));
        assert!(PediatricDosage.interpret(&result).contains("limitado"));
    }

    #[test]
    fn test_age_groups() {
        assert_eq!(AgeGroup::from_age(0.05), AgeGroup::Neonate);
        assert_eq!(AgeGroup::from_age(0.5), AgeGroup::Infant);
        assert_eq!(AgeGroup::from_age(3.0), AgeGroup::Toddler);
        assert_eq!(AgeGroup::from_age(12.0), AgeGroup::Adolescent);
    }

    #[test]
    fn test_infant_cautions() {
        let inputs = input_set([("weight", "6"), ("age", "0.4"), ("adult_dose", "100")]);
        let result = PediatricDosage.calculate_at(&inputs, 0).unwrap();
        assert!(PediatricDosage.interpret(&result).contains("inmadurez renal"));
    }
}
