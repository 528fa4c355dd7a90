//! Glasgow Coma Scale.

use crate::calculator::Calculator;
use crate::format::flag;
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const EYE: &[&str] = &[
    "4 - Espontánea",
    "3 - A la orden verbal",
    "2 - Al dolor",
    "1 - Ninguna",
];
const VERBAL: &[&str] = &[
    "5 - Orientada",
    "4 - Confusa",
    "3 - Palabras inapropiadas",
    "2 - Sonidos incomprensibles",
    "1 - Ninguna",
];
const MOTOR: &[&str] = &[
    "6 - Obedece órdenes",
    "5 - Localiza el dolor",
    "4 - Retirada al dolor",
    "3 - Flexión anormal (decorticación)",
    "2 - Extensión (descerebración)",
    "1 - Ninguna",
];
const CONTEXTS: &[&str] = &[
    "General",
    "Trauma craneoencefálico",
    "Postquirúrgico",
    "Intoxicación",
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("eye", "Apertura ocular", EYE),
    FieldSpec::choice("verbal", "Respuesta verbal", VERBAL),
    FieldSpec::choice("motor", "Respuesta motora", MOTOR),
    FieldSpec::text("clinical_context", "Contexto clínico", CONTEXTS).or_default("General"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Assessment of coma and impaired consciousness: a practical scale",
        source: "The Lancet",
        url: Some("https://doi.org/10.1016/S0140-6736(74)91639-0"),
        year: Some(1974),
    },
    Reference {
        title: "The Glasgow Coma Scale at 40 years: standing the test of time",
        source: "The Lancet Neurology",
        url: Some("https://doi.org/10.1016/S1474-4422(14)70120-6"),
        year: Some(2014),
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsciousnessLevel {
    Full,
    MildConfusion,
    Moderate,
    Severe,
}

impl ConsciousnessLevel {
    pub fn from_total(total: i32) -> Self {
        match total {
            15.. => Self::Full,
            13..=14 => Self::MildConfusion,
            9..=12 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "Conciencia plena",
            Self::MildConfusion => "Confusión leve",
            Self::Moderate => "Alteración moderada de la conciencia",
            Self::Severe => "Alteración grave / coma",
        }
    }

    /// Head injury severity for the same total
    pub fn injury_severity(self) -> &'static str {
        match self {
            Self::Full | Self::MildConfusion => "TCE leve",
            Self::Moderate => "TCE moderado",
            Self::Severe => "TCE grave",
        }
    }
}

pub struct GlasgowComaScale;

impl Calculator for GlasgowComaScale {
    fn id(&self) -> &'static str {
        "glasgow"
    }

    fn name(&self) -> &'static str {
        "Escala de Coma de Glasgow"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let eye = inputs.require_score("eye")?;
        let verbal = inputs.require_score("verbal")?;
        let motor = inputs.require_score("motor")?;
        let context = inputs.require_text("clinical_context")?;

        let total = eye + verbal + motor;
        let level = ConsciousnessLevel::from_total(total);

        let mut values = ResultValues::new();
        values.insert("total_score".into(), total.to_string());
        values.insert("level".into(), level.label().into());
        values.insert("breakdown".into(), format!("O{} V{} M{}", eye, verbal, motor));
        values.insert("airway_at_risk".into(), flag(total <= 8));
        values.insert("clinical_context".into(), context.to_string());
        if context == "Trauma craneoencefálico" {
            values.insert("injury_severity".into(), level.injury_severity().into());
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(total) = result.number("total_score").map(|t| t as i32) else {
            return narrative::incomplete(self.name());
        };
        let level = ConsciousnessLevel::from_total(total);
        let breakdown = result.value("breakdown").unwrap_or("-");
        let context = result.value("clinical_context").unwrap_or("General");

        let text = Narrative::new(self.name()).paragraph(format!(
            "Glasgow {}/15 ({}): {}.",
            total,
            breakdown,
            level.label()
        ));

        let text = match level {
            ConsciousnessLevel::Full => text
                .paragraph("Paciente alerta y orientado.")
                .section("Monitorización", ["Valoración neurológica según protocolo de la unidad"]),
            ConsciousnessLevel::MildConfusion => text
                .paragraph("Alteración leve del nivel de conciencia.")
                .section(
                    "Acciones",
                    [
                        "Valoración neurológica cada 1-2 horas",
                        "Descartar hipoglucemia, hipoxia y efectos de fármacos",
                        "Vigilar signos de deterioro: cefalea creciente, vómitos, asimetría pupilar",
                    ],
                ),
            ConsciousnessLevel::Moderate => text
                .paragraph("Alteración moderada: riesgo de deterioro neurológico.")
                .section(
                    "Acciones",
                    [
                        "Valoración neurológica horaria incluyendo pupilas",
                        "Avisar al médico responsable",
                        "Cabecera a 30 grados y vigilancia de la vía aérea",
                        "Considerar tomografía craneal urgente",
                    ],
                ),
            ConsciousnessLevel::Severe => text
                .paragraph("Alteración grave / coma: vía aérea en riesgo.")
                .section(
                    "Acciones inmediatas",
                    [
                        "Glasgow <= 8: valorar intubación orotraqueal para protección de la vía aérea",
                        "Solicitar valoración urgente por cuidados intensivos",
                        "Mantener oxigenación y PAM adecuadas para preservar la perfusión cerebral",
                        "Valoración pupilar y neurológica cada 15 minutos",
                    ],
                ),
        };

        let context_notes: Vec<&str> = match context {
            "Trauma craneoencefálico" => vec![
                "Clasificación del traumatismo: TCE leve 13-15, moderado 9-12, grave 3-8",
                "Inmovilización cervical hasta descartar lesión raquídea",
                "Una caída de 2 o más puntos obliga a reevaluación inmediata y neuroimagen",
            ],
            "Postquirúrgico" => vec![
                "Considerar efecto residual de anestésicos y analgésicos opioides",
                "Comparar con la puntuación basal prequirúrgica",
            ],
            "Intoxicación" => vec![
                "La puntuación puede infraestimar la reserva neurológica en intoxicaciones",
                "Valorar antídotos específicos (naloxona, flumazenil) según sospecha",
                "Proteger la vía aérea aunque el paciente parezca estable",
            ],
            _ => Vec::new(),
        };

        let text = match result.value("injury_severity") {
            Some(severity) => text.paragraph(format!("Gravedad del traumatismo: {}.", severity)),
            None => text,
        };

        text.section("Contexto clínico", context_notes)
            .paragraph(
                "Registrar siempre los tres componentes además del total; la respuesta motora es \
                 el componente con mayor valor pronóstico.",
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_full_consciousness() {
        let result = GlasgowComaScale
            .calculate_at(&input_set([("eye", "4"), ("verbal", "5"), ("motor", "6")]), 0)
            .unwrap();

        assert_eq!(result.value("total_score"), Some("15"));
        assert_eq!(result.value("level"), Some("Conciencia plena"));
        assert_eq!(result.value("breakdown"), Some("O4 V5 M6"));
        assert_eq!(result.value("airway_at_risk"), Some("false"));
        assert_eq!(result.value("clinical_context"), Some("General"));
    }

    #[test]
    fn test_minimum_total_is_three() {
        let result = GlasgowComaScale
            .calculate_at(
                &input_set([
                    ("eye", "1 - Ninguna"),
                    ("verbal", "1 - Ninguna"),
                    ("motor", "1 - Ninguna"),
                ]),
                0,
            )
            .unwrap();

        assert_eq!(result.value("total_score"), Some("3"));
        assert_eq!(result.value("airway_at_risk"), Some("true"));
        assert!(GlasgowComaScale.interpret(&result).contains("intubación"));
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(ConsciousnessLevel::from_total(14), ConsciousnessLevel::MildConfusion);
        assert_eq!(ConsciousnessLevel::from_total(13), ConsciousnessLevel::MildConfusion);
        assert_eq!(ConsciousnessLevel::from_total(12), ConsciousnessLevel::Moderate);
        assert_eq!(ConsciousnessLevel::from_total(9), ConsciousnessLevel::Moderate);
        assert_eq!(ConsciousnessLevel::from_total(8), ConsciousnessLevel::Severe);
    }

    #[test]
    fn test_trauma_context_adds_severity() {
        let result = GlasgowComaScale
            .calculate_at(
                &input_set([
                    ("eye", "3"),
                    ("verbal", "3"),
                    ("motor", "5"),
                    ("clinical_context", "Trauma craneoencefálico"),
                ]),
                0,
            )
            .unwrap();

        assert_eq!(result.value("total_score"), Some("11"));
        assert_eq!(result.value("injury_severity"), Some("TCE moderado"));
        let text = GlasgowComaScale.interpret(&result);
        assert!(text.contains("Gravedad del traumatismo: TCE moderado"));
        assert!(text.contains("Inmovilización cervical"));
    }

    #[test]
    fn test_out_of_range_components_rejected() {
        let validation =
            GlasgowComaScale.validate(&input_set([("eye", "0"), ("verbal", "6"), ("motor", "7")]));
        assert_eq!(validation.errors().len(), 3);
    }
}
