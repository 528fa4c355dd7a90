//! Body Mass Index.

use crate::calculator::Calculator;
use crate::format::fixed;
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 1.0, 200.0),
    FieldSpec::number("height", "Altura", "cm", 50.0, 250.0),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Obesity: preventing and managing the global epidemic",
        source: "WHO Technical Report Series 894",
        url: Some("https://apps.who.int/iris/handle/10665/42330"),
        year: Some(2000),
    },
    Reference {
        title: "Adult BMI Categories",
        source: "Centers for Disease Control and Prevention",
        url: Some("https://www.cdc.gov/bmi/adult-calculator/bmi-categories.html"),
        year: Some(2024),
    },
];

const NORMAL_MIN: f64 = 18.5;
const NORMAL_MAX: f64 = 24.9;

/// BMI band, lower bound inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Inverse of [`label`](Self::label)
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Underweight, Self::Normal, Self::Overweight, Self::Obese]
            .into_iter()
            .find(|c| c.label() == label)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

/// WHO obesity class for BMI >= 30
fn obesity_class(bmi: f64) -> Option<&'static str> {
    if bmi >= 40.0 {
        Some("Clase III")
    } else if bmi >= 35.0 {
        Some("Clase II")
    } else if bmi >= 30.0 {
        Some("Clase I")
    } else {
        None
    }
}

pub struct Bmi;

impl Calculator for Bmi {
    fn id(&self) -> &'static str {
        "bmi"
    }

    fn name(&self) -> &'static str {
        "Índice de Masa Corporal (IMC)"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let height_m = inputs.require_number("height")? / 100.0;
        let height_sq = height_m * height_m;

        let bmi = weight / height_sq;
        let category = BmiCategory::from_bmi(bmi);

        let healthy_min = NORMAL_MIN * height_sq;
        let healthy_max = NORMAL_MAX * height_sq;
        let difference = match category {
            BmiCategory::Underweight => healthy_min - weight,
            BmiCategory::Normal => 0.0,
            BmiCategory::Overweight | BmiCategory::Obese => healthy_max - weight,
        };

        let mut values = ResultValues::new();
        values.insert("bmi".into(), fixed(bmi, 1));
        values.insert("category".into(), category.label().into());
        values.insert(
            "healthy_weight_range".into(),
            format!("{} - {} kg", fixed(healthy_min, 1), fixed(healthy_max, 1)),
        );
        values.insert("weight_to_healthy_range".into(), fixed(difference, 1));
        if let Some(class) = obesity_class(bmi) {
            values.insert("obesity_class".into(), class.into());
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(bmi) = result.number("bmi") else {
            return narrative::incomplete(self.name());
        };
        // The stored category was taken from the unrounded value
        let category = result
            .value("category")
            .and_then(BmiCategory::from_label)
            .unwrap_or_else(|| BmiCategory::from_bmi(bmi));
        let range = result.value("healthy_weight_range").unwrap_or("-");
        let difference = result.number("weight_to_healthy_range").unwrap_or(0.0);

        let summary = format!(
            "IMC de {} kg/m² ({}). Rango de peso saludable para esta talla: {}.",
            fixed(bmi, 1),
            category.label(),
            range
        );

        let text = Narrative::new(self.name()).paragraph(summary);
        let text = match category {
            BmiCategory::Underweight => text
                .paragraph(format!(
                    "Bajo peso. Se necesitarían aproximadamente {} kg para alcanzar el límite inferior del rango saludable.",
                    fixed(difference, 1)
                ))
                .section(
                    "Recomendaciones",
                    [
                        "Evaluar ingesta alimentaria y causas de pérdida de peso (malabsorción, hipertiroidismo, trastornos de la conducta alimentaria)",
                        "Solicitar valoración nutricional y considerar suplementación calórico-proteica",
                        "Vigilar déficits de micronutrientes (hierro, vitamina D, B12)",
                    ],
                )
                .section_if(
                    bmi < 16.0,
                    "Alerta",
                    ["Delgadez severa (IMC < 16): riesgo de síndrome de realimentación, iniciar el soporte nutricional de forma progresiva"],
                ),
            BmiCategory::Normal => text
                .paragraph("Peso normal para la talla. Mantener hábitos actuales.")
                .section(
                    "Recomendaciones",
                    [
                        "Actividad física regular: al menos 150 minutos semanales de intensidad moderada",
                        "Dieta equilibrada y control anual del peso",
                    ],
                ),
            BmiCategory::Overweight => text
                .paragraph(format!(
                    "Sobrepeso. Reducir aproximadamente {} kg situaría el IMC en el rango saludable.",
                    fixed(difference.abs(), 1)
                ))
                .section(
                    "Recomendaciones",
                    [
                        "Objetivo inicial: pérdida del 5-10 % del peso en 6 meses",
                        "Plan de alimentación con déficit calórico moderado y aumento de actividad física",
                        "Cribado de factores de riesgo cardiovascular (presión arterial, glucemia, lípidos)",
                    ],
                ),
            BmiCategory::Obese => {
                let class = result.value("obesity_class").unwrap_or("Clase I");
                text.paragraph(format!(
                    "Obesidad ({}). Reducir aproximadamente {} kg situaría el IMC en el rango saludable.",
                    class,
                    fixed(difference.abs(), 1)
                ))
                .section(
                    "Recomendaciones",
                    [
                        "Intervención estructurada sobre estilo de vida con seguimiento mensual",
                        "Cribado de diabetes tipo 2, hipertensión, dislipemia y apnea obstructiva del sueño",
                        "Considerar tratamiento farmacológico si no se alcanzan objetivos con medidas higiénico-dietéticas",
                    ],
                )
                .section_if(
                    bmi >= 35.0,
                    "Consideraciones adicionales",
                    ["Con IMC >= 35 y comorbilidades, o IMC >= 40, valorar derivación a cirugía bariátrica"],
                )
            }
        };

        text.paragraph(
            "El IMC no distingue masa grasa de masa magra; interpretar con precaución en deportistas, \
             ancianos, embarazadas y menores de 18 años.",
        )
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_reference_adult() {
        let result = Bmi
            .calculate_at(&input_set([("height", "170"), ("weight", "70")]), 0)
            .unwrap();

        assert_eq!(result.value("bmi"), Some("24.2"));
        assert_eq!(result.value("category"), Some("Normal weight"));
        assert_eq!(result.value("healthy_weight_range"), Some("53.5 - 72.0 kg"));
        assert_eq!(result.value("weight_to_healthy_range"), Some("0.0"));
        assert_eq!(result.value("obesity_class"), None);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_category_uses_unrounded_value() {
        // 53.35 / 1.7^2 = 18.460..., shown as 18.5
        let result = Bmi
            .calculate_at(&input_set([("height", "170"), ("weight", "53.35")]), 0)
            .unwrap();

        assert_eq!(result.value("bmi"), Some("18.5"));
        assert_eq!(result.value("category"), Some("Underweight"));
        assert!(Bmi.interpret(&result).contains("Bajo peso"));
    }

    #[test]
    fn test_obesity_class_uses_unrounded_value() {
        // 76.77 / 1.6^2 = 29.988..., shown as 30.0
        let result = Bmi
            .calculate_at(&input_set([("height", "160"), ("weight", "76.77")]), 0)
            .unwrap();

        assert_eq!(result.value("bmi"), Some("30.0"));
        assert_eq!(result.value("category"), Some("Overweight"));
        assert_eq!(result.value("obesity_class"), None);
    }

    #[test]
    fn test_obesity_class_reported() {
        let result = Bmi
            .calculate_at(&input_set([("height", "160"), ("weight", "100")]), 0)
            .unwrap();

        assert_eq!(result.value("bmi"), Some("39.1"));
        assert_eq!(result.value("category"), Some("Obese"));
        assert_eq!(result.value("obesity_class"), Some("Clase II"));
        assert!(Bmi.interpret(&result).contains("cirugía bariátrica"));
    }

    #[test]
    fn test_validation_collects_both_ranges() {
        let validation = Bmi.validate(&input_set([("height", "20"), ("weight", "500")]));

        assert!(!validation.is_valid());
        assert_eq!(validation.errors().len(), 2);
    }

    #[test]
    fn test_interpretation_is_deterministic() {
        let inputs = input_set([("height", "150"), ("weight", "40")]);
        let a = Bmi.calculate_at(&inputs, 7).unwrap();
        let b = Bmi.calculate_at(&inputs, 7).unwrap();

        assert_eq!(a, b);
        assert_eq!(Bmi.interpret(&a), Bmi.interpret(&b));
        assert!(Bmi.interpret(&a).contains("Bajo peso"));
    }
}
