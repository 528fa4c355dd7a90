//! Sodium and potassium assessment with replacement estimates.

use crate::calculator::Calculator;
use crate::format::{fixed, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const SEXES: &[&str] = &["1 - Masculino", "2 - Femenino"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 1.0, 200.0),
    FieldSpec::number("age", "Edad", "años", 0.0, 120.0),
    FieldSpec::choice("sex", "Sexo", SEXES),
    FieldSpec::number("sodium", "Sodio sérico", "mEq/L", 100.0, 200.0),
    FieldSpec::number("potassium", "Potasio sérico", "mEq/L", 1.0, 10.0),
    FieldSpec::number("target_sodium", "Sodio objetivo", "mEq/L", 120.0, 145.0).or_default("140"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Hyponatremia",
        source: "New England Journal of Medicine",
        url: Some("https://doi.org/10.1056/NEJM200005253422107"),
        year: Some(2000),
    },
    Reference {
        title: "Hypernatremia",
        source: "New England Journal of Medicine",
        url: Some("https://doi.org/10.1056/NEJM200005183422006"),
        year: Some(2000),
    },
    Reference {
        title: "Clinical practice guideline on diagnosis and treatment of hyponatraemia",
        source: "European Journal of Endocrinology",
        url: Some("https://doi.org/10.1530/EJE-13-1020"),
        year: Some(2014),
    },
];

/// Sodium content of common infusates, mEq/L
const SALINE_3: f64 = 513.0;
const SALINE_09: f64 = 154.0;
/// Maximum safe sodium correction in 24h, mEq/L
const MAX_SODIUM_CORRECTION: f64 = 8.0;

/// Total body water fraction by age and sex
pub fn water_fraction(age: f64, female: bool) -> f64 {
    match (age < 18.0, age >= 65.0, female) {
        (true, _, _) => 0.6,
        (_, true, true) => 0.45,
        (_, true, false) => 0.5,
        (_, false, true) => 0.5,
        (_, false, false) => 0.6,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SodiumStatus {
    SevereHypo,
    ModerateHypo,
    MildHypo,
    Normal,
    Hyper,
}

impl SodiumStatus {
    pub fn from_level(sodium: f64) -> Self {
        if sodium < 120.0 {
            Self::SevereHypo
        } else if sodium < 130.0 {
            Self::ModerateHypo
        } else if sodium < 135.0 {
            Self::MildHypo
        } else if sodium <= 145.0 {
            Self::Normal
        } else {
            Self::Hyper
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SevereHypo => "Hiponatremia grave",
            Self::ModerateHypo => "Hiponatremia moderada",
            Self::MildHypo => "Hiponatremia leve",
            Self::Normal => "Sodio normal",
            Self::Hyper => "Hipernatremia",
        }
    }

    fn is_hypo(self) -> bool {
        matches!(self, Self::SevereHypo | Self::ModerateHypo | Self::MildHypo)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PotassiumStatus {
    SevereHypo,
    ModerateHypo,
    MildHypo,
    Normal,
    MildHyper,
    ModerateHyper,
    SevereHyper,
}

impl PotassiumStatus {
    pub fn from_level(potassium: f64) -> Self {
        if potassium < 2.5 {
            Self::SevereHypo
        } else if potassium < 3.0 {
            Self::ModerateHypo
        } else if potassium < 3.5 {
            Self::MildHypo
        } else if potassium <= 5.0 {
            Self::Normal
        } else if potassium < 6.0 {
            Self::MildHyper
        } else if potassium < 7.0 {
            Self::ModerateHyper
        } else {
            Self::SevereHyper
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SevereHypo => "Hipopotasemia grave",
            Self::ModerateHypo => "Hipopotasemia moderada",
            Self::MildHypo => "Hipopotasemia leve",
            Self::Normal => "Potasio normal",
            Self::MildHyper => "Hiperpotasemia leve",
            Self::ModerateHyper => "Hiperpotasemia moderada",
            Self::SevereHyper => "Hiperpotasemia grave",
        }
    }
}

/// Expected serum sodium change after one litre of infusate (Adrogué-Madias)
pub fn sodium_change_per_litre(infusate: f64, serum: f64, body_water: f64) -> f64 {
    (infusate - serum) / (body_water + 1.0)
}

pub struct ElectrolyteManagement;

impl Calculator for ElectrolyteManagement {
    fn id(&self) -> &'static str {
        "electrolytes"
    }

    fn name(&self) -> &'static str {
        "Manejo de Electrolitos (Sodio y Potasio)"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        if let (Some(sodium), Some(target)) = (inputs.number("sodium"), inputs.number("target_sodium")) {
            if sodium < 135.0 && target <= sodium {
                errors.push("El sodio objetivo debe ser mayor que el sodio actual".to_string());
            }
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let age = inputs.require_number("age")?;
        let female = inputs.require_score("sex")? == 2;
        let sodium = inputs.require_number("sodium")?;
        let potassium = inputs.require_number("potassium")?;
        let target = inputs.require_number("target_sodium")?;

        let body_water = weight * water_fraction(age, female);
        let sodium_status = SodiumStatus::from_level(sodium);
        let potassium_status = PotassiumStatus::from_level(potassium);

        let mut values = ResultValues::new();
        values.insert("total_body_water_l".into(), fixed(body_water, 1));
        values.insert("sodium_status".into(), sodium_status.label().into());
        values.insert("potassium_status".into(), potassium_status.label().into());

        if sodium_status.is_hypo() {
            // Correction goal is bounded by the safe daily limit
            let goal = target.min(sodium + MAX_SODIUM_CORRECTION);
            values.insert("sodium_deficit_meq".into(), whole(body_water * (target - sodium)));
            values.insert("sodium_goal_24h".into(), whole(goal));
            values.insert(
                "max_sodium_24h_meq".into(),
                whole(body_water * MAX_SODIUM_CORRECTION),
            );
            values.insert(
                "na_change_per_litre_3pct".into(),
                fixed(sodium_change_per_litre(SALINE_3, sodium, body_water), 1),
            );
            values.insert(
                "na_change_per_litre_09pct".into(),
                fixed(sodium_change_per_litre(SALINE_09, sodium, body_water), 1),
            );
        } else if sodium_status == SodiumStatus::Hyper {
            values.insert(
                "free_water_deficit_l".into(),
                fixed(body_water * (sodium / 140.0 - 1.0), 1),
            );
        }

        if potassium < 3.5 {
            values.insert("potassium_deficit_meq".into(), whole((4.0 - potassium) * 100.0));
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(sodium), Some(potassium)) = (
            result.input("sodium").and_then(|v| v.parse::<f64>().ok()),
            result.input("potassium").and_then(|v| v.parse::<f64>().ok()),
        ) else {
            return narrative::incomplete(self.name());
        };
        let sodium_status = SodiumStatus::from_level(sodium);
        let potassium_status = PotassiumStatus::from_level(potassium);

        let text = Narrative::new(self.name()).paragraph(format!(
            "Na {} mEq/L: {}. K {} mEq/L: {}. Agua corporal total estimada: {} L.",
            sodium,
            sodium_status.label(),
            potassium,
            potassium_status.label(),
            result.value("total_body_water_l").unwrap_or("-")
        ));

        let sodium_plan: Vec<String> = match sodium_status {
            SodiumStatus::SevereHypo | SodiumStatus::ModerateHypo | SodiumStatus::MildHypo => {
                let mut plan = vec![
                    format!(
                        "Déficit de sodio hasta el objetivo: {} mEq",
                        result.value("sodium_deficit_meq").unwrap_or("-")
                    ),
                    format!(
                        "No superar 8 mEq/L en 24 h (objetivo del día: {} mEq/L, máximo {} mEq)",
                        result.value("sodium_goal_24h").unwrap_or("-"),
                        result.value("max_sodium_24h_meq").unwrap_or("-")
                    ),
                    format!(
                        "Cambio esperado por litro: NaCl 3 % +{} mEq/L, NaCl 0.9 % +{} mEq/L",
                        result.value("na_change_per_litre_3pct").unwrap_or("-"),
                        result.value("na_change_per_litre_09pct").unwrap_or("-")
                    ),
                    "Controles de sodio cada 4-6 horas durante la corrección".to_string(),
                ];
                if sodium_status == SodiumStatus::SevereHypo {
                    plan.insert(
                        0,
                        "Si hay síntomas graves (convulsiones, coma): bolo de 150 mL de NaCl 3 % en 20 minutos".to_string(),
                    );
                    plan.push("Riesgo de síndrome de desmielinización osmótica con corrección rápida".to_string());
                }
                plan
            }
            SodiumStatus::Normal => Vec::new(),
            SodiumStatus::Hyper => vec![
                format!(
                    "Déficit de agua libre: {} L",
                    result.value("free_water_deficit_l").unwrap_or("-")
                ),
                "Reponer en 48-72 horas; descenso máximo de 10 mEq/L en 24 h".to_string(),
                "Preferir vía oral o enteral; si IV, glucosado 5 %".to_string(),
            ],
        };

        let potassium_plan: Vec<String> = match potassium_status {
            PotassiumStatus::SevereHypo | PotassiumStatus::ModerateHypo | PotassiumStatus::MildHypo => {
                let mut plan = vec![format!(
                    "Déficit estimado de potasio: {} mEq (aprox. 100 mEq por cada 1 mEq/L por debajo de 4)",
                    result.value("potassium_deficit_meq").unwrap_or("-")
                )];
                if potassium_status == PotassiumStatus::MildHypo {
                    plan.push("Preferir reposición oral (KCl 40-80 mEq/día repartidos)".to_string());
                } else {
                    plan.push("Reposición IV: máximo 10 mEq/h por vía periférica, 20 mEq/h por vía central con monitorización".to_string());
                    plan.push("Monitorización electrocardiográfica continua".to_string());
                }
                plan.push("Corregir magnesio si está bajo; la hipomagnesemia impide corregir el potasio".to_string());
                plan
            }
            PotassiumStatus::Normal => Vec::new(),
            PotassiumStatus::MildHyper => vec![
                "Repetir la determinación para descartar hemólisis".to_string(),
                "Revisar fármacos retenedores de potasio (IECA, ARA-II, espironolactona)".to_string(),
            ],
            PotassiumStatus::ModerateHyper | PotassiumStatus::SevereHyper => vec![
                "Electrocardiograma inmediato".to_string(),
                "Gluconato cálcico 10 % 10 mL IV si hay alteraciones electrocardiográficas".to_string(),
                "Insulina rápida 10 U con glucosa 25 g IV y salbutamol nebulizado".to_string(),
                "Valorar diálisis si es refractaria o hay insuficiencia renal".to_string(),
            ],
        };

        text.section("Plan para el sodio", sodium_plan)
            .section("Plan para el potasio", potassium_plan)
            .paragraph(
                "Las fórmulas estiman el déficit inicial; ajustar con determinaciones seriadas y la \
                 situación clínica.",
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_water_fractions() {
        assert_eq!(water_fraction(10.0, true), 0.6);
        assert_eq!(water_fraction(40.0, false), 0.6);
        assert_eq!(water_fraction(40.0, true), 0.5);
        assert_eq!(water_fraction(70.0, false), 0.5);
        assert_eq!(water_fraction(70.0, true), 0.45);
    }

    #[test]
    fn test_hyponatremia_plan() {
        let inputs = input_set([
            ("weight", "70"),
            ("age", "50"),
            ("sex", "1 - Masculino"),
            ("sodium", "120"),
            ("potassium", "4.0"),
        ]);
        let result = ElectrolyteManagement.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("total_body_water_l"), Some("42.0"));
        assert_eq!(result.value("sodium_status"), Some("Hiponatremia moderada"));
        assert_eq!(result.value("sodium_deficit_meq"), Some("840"));
        assert_eq!(result.value("sodium_goal_24h"), Some("128"));
        // (513 - 120) / 43
        assert_eq!(result.value("na_change_per_litre_3pct"), Some("9.1"));
        assert_eq!(result.value("potassium_deficit_meq"), None);
    }

    #[test]
    fn test_hypernatremia_free_water() {
        let inputs = input_set([
            ("weight", "60"),
            ("age", "80"),
            ("sex", "2"),
            ("sodium", "154"),
            ("potassium", "2.8"),
        ]);
        let result = ElectrolyteManagement.calculate_at(&inputs, 0).unwrap();

        // 27 L * 0.1
        assert_eq!(result.value("free_water_deficit_l"), Some("2.7"));
        assert_eq!(result.value("potassium_status"), Some("Hipopotasemia moderada"));
        assert_eq!(result.value("potassium_deficit_meq"), Some("120"));

        let text = ElectrolyteManagement.interpret(&result);
        assert!(text.contains("Déficit de agua libre: 2.7 L"));
        assert!(text.contains("10 mEq/h"));
    }

    #[test]
    fn test_target_must_exceed_low_sodium() {
        let inputs = input_set([
            ("weight", "70"),
            ("age", "50"),
            ("sex", "1"),
            ("sodium", "130"),
            ("potassium", "4"),
            ("target_sodium", "125"),
        ]);
        let validation = ElectrolyteManagement.validate(&inputs);
        assert_eq!(
            validation.errors(),
            ["El sodio objetivo debe ser mayor que el sodio actual"]
        );
    }

    #[test]
    fn test_severe_hyperkalemia_narrative() {
        let inputs = input_set([
            ("weight", "70"),
            ("age", "50"),
            ("sex", "1"),
            ("sodium", "140"),
            ("potassium", "7.2"),
        ]);
        let result = ElectrolyteManagement.calculate_at(&inputs, 0).unwrap();
        assert_eq!(result.value("potassium_status"), Some("Hiperpotasemia grave"));
        assert!(ElectrolyteManagement.interpret(&result).contains("Gluconato cálcico"));
    }
}
