//! APGAR newborn assessment.

use crate::calculator::Calculator;
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const APPEARANCE: &[&str] = &[
    "0 - Azul o pálido",
    "1 - Cuerpo rosado, extremidades azules",
    "2 - Completamente rosado",
];
const PULSE: &[&str] = &["0 - Ausente", "1 - Menos de 100 lpm", "2 - 100 lpm o más"];
const GRIMACE: &[&str] = &[
    "0 - Sin respuesta",
    "1 - Mueca",
    "2 - Llanto vigoroso, tos o estornudo",
];
const ACTIVITY: &[&str] = &[
    "0 - Flácido",
    "1 - Cierta flexión de extremidades",
    "2 - Movimiento activo",
];
const RESPIRATION: &[&str] = &["0 - Ausente", "1 - Lenta o irregular", "2 - Buena, llanto fuerte"];
const MINUTE: &[&str] = &["1 - 1 minuto", "5 - 5 minutos", "10 - 10 minutos"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("appearance", "Apariencia (color)", APPEARANCE),
    FieldSpec::choice("pulse", "Pulso", PULSE),
    FieldSpec::choice("grimace", "Reflejos (irritabilidad)", GRIMACE),
    FieldSpec::choice("activity", "Actividad (tono muscular)", ACTIVITY),
    FieldSpec::choice("respiration", "Respiración", RESPIRATION),
    FieldSpec::choice("minute", "Minuto de evaluación", MINUTE).or_default("1 - 1 minuto"),
];

const COMPONENTS: [(&str, &str); 5] = [
    ("appearance", "Apariencia"),
    ("pulse", "Pulso"),
    ("grimace", "Reflejos"),
    ("activity", "Actividad"),
    ("respiration", "Respiración"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "A proposal for a new method of evaluation of the newborn infant",
        source: "Current Researches in Anesthesia & Analgesia",
        url: None,
        year: Some(1953),
    },
    Reference {
        title: "The Apgar Score (Committee Opinion 644)",
        source: "American Academy of Pediatrics / ACOG, Pediatrics",
        url: Some("https://doi.org/10.1542/peds.2015-2651"),
        year: Some(2015),
    },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApgarStatus {
    Good,
    ModerateAssistance,
    ImmediateAssistance,
}

impl ApgarStatus {
    pub fn from_total(total: i32) -> Self {
        match total {
            7.. => Self::Good,
            4..=6 => Self::ModerateAssistance,
            _ => Self::ImmediateAssistance,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Buen estado",
            Self::ModerateAssistance => "Requiere asistencia moderada",
            Self::ImmediateAssistance => "Requiere asistencia inmediata",
        }
    }
}

pub struct Apgar;

impl Calculator for Apgar {
    fn id(&self) -> &'static str {
        "apgar"
    }

    fn name(&self) -> &'static str {
        "Test de APGAR"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let mut total = 0;
        let mut breakdown = Vec::with_capacity(COMPONENTS.len());
        let mut weakest = Vec::new();
        for (id, label) in COMPONENTS {
            let score = inputs.require_score(id)?;
            total += score;
            breakdown.push(format!("{} {}", label, score));
            if score == 0 {
                weakest.push(label);
            }
        }
        let minute = inputs.require_score("minute")?;
        let status = ApgarStatus::from_total(total);

        let mut values = ResultValues::new();
        values.insert("total_score".into(), total.to_string());
        values.insert("status".into(), status.label().into());
        values.insert("breakdown".into(), breakdown.join(", "));
        values.insert("assessment_minute".into(), minute.to_string());
        if !weakest.is_empty() {
            values.insert("absent_signs".into(), weakest.join(", "));
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(total) = result.number("total_score").map(|t| t as i32) else {
            return narrative::incomplete(self.name());
        };
        let status = ApgarStatus::from_total(total);
        let minute = result.number("assessment_minute").map(|m| m as i32).unwrap_or(1);
        let breakdown = result.value("breakdown").unwrap_or("-");

        let text = Narrative::new(self.name()).paragraph(format!(
            "Puntuación APGAR {}/10 al minuto {}: {}. Desglose: {}.",
            total,
            minute,
            status.label(),
            breakdown
        ));

        let text = match status {
            ApgarStatus::Good => text
                .paragraph("Adaptación adecuada a la vida extrauterina.")
                .section(
                    "Cuidados",
                    [
                        "Contacto piel con piel e inicio precoz de la lactancia",
                        "Secado, mantener temperatura y cuidados de rutina",
                        "Repetir la valoración a los 5 minutos",
                    ],
                ),
            ApgarStatus::ModerateAssistance => text
                .paragraph("Depresión neonatal moderada.")
                .section(
                    "Acciones inmediatas",
                    [
                        "Secar, estimular y posicionar la vía aérea",
                        "Aspirar secreciones solo si obstruyen la vía aérea",
                        "Administrar oxígeno o ventilación con presión positiva si la respiración es inadecuada",
                        "Reevaluar frecuencia cardíaca y respiración cada 30 segundos",
                    ],
                ),
            ApgarStatus::ImmediateAssistance => text
                .paragraph("Depresión neonatal grave: requiere reanimación inmediata.")
                .section(
                    "Acciones inmediatas",
                    [
                        "Iniciar reanimación neonatal según algoritmo vigente",
                        "Ventilación con presión positiva; compresiones torácicas si FC < 60 lpm tras 30 segundos de ventilación eficaz",
                        "Solicitar presencia del equipo de neonatología",
                        "Preparar acceso vascular umbilical y adrenalina",
                    ],
                ),
        };

        let text = text.section_if(
            result.value("absent_signs").is_some(),
            "Signos ausentes",
            [result.value("absent_signs").unwrap_or_default()],
        );

        let follow_up = if minute >= 5 && total < 7 {
            vec![
                "Puntuación < 7 a partir del minuto 5: repetir la valoración cada 5 minutos hasta los 20 minutos".to_string(),
                "Documentar las intervenciones de reanimación junto a cada puntuación".to_string(),
            ]
        } else if minute == 1 {
            vec!["Repetir la valoración a los 5 minutos de vida".to_string()]
        } else {
            Vec::new()
        };

        text.section("Seguimiento", follow_up)
            .paragraph(
                "La puntuación APGAR describe la condición del recién nacido; no debe usarse aislada \
                 para decidir el inicio de la reanimación ni para predecir la evolución neurológica.",
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{input_set, InputSet};

    fn all_scores(score: &str) -> InputSet {
        input_set(COMPONENTS.iter().map(|(id, _)| (*id, score)))
    }

    #[test]
    fn test_all_twos_is_ten() {
        let result = Apgar.calculate_at(&all_scores("2"), 0).unwrap();

        assert_eq!(result.value("total_score"), Some("10"));
        assert_eq!(result.value("status"), Some("Buen estado"));
        assert_eq!(result.value("assessment_minute"), Some("1"));
        assert_eq!(result.value("absent_signs"), None);
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let inputs = input_set([
            ("appearance", "1 - Cuerpo rosado, extremidades azules"),
            ("pulse", "2 - 100 lpm o más"),
            ("grimace", "0 - Sin respuesta"),
            ("activity", "1 - Cierta flexión de extremidades"),
            ("respiration", "1 - Lenta o irregular"),
            ("minute", "5 - 5 minutos"),
        ]);
        let result = Apgar.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("total_score"), Some("5"));
        assert_eq!(result.value("status"), Some("Requiere asistencia moderada"));
        assert_eq!(result.value("absent_signs"), Some("Reflejos"));
        assert!(Apgar.interpret(&result).contains("cada 5 minutos"));
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(ApgarStatus::from_total(10), ApgarStatus::Good);
        assert_eq!(ApgarStatus::from_total(7), ApgarStatus::Good);
        assert_eq!(ApgarStatus::from_total(6), ApgarStatus::ModerateAssistance);
        assert_eq!(ApgarStatus::from_total(4), ApgarStatus::ModerateAssistance);
        assert_eq!(ApgarStatus::from_total(3), ApgarStatus::ImmediateAssistance);
        assert_eq!(ApgarStatus::from_total(0), ApgarStatus::ImmediateAssistance);
    }

    #[test]
    fn test_total_always_in_range() {
        for score in ["0", "1", "2"] {
            let result = Apgar.calculate_at(&all_scores(score), 0).unwrap();
            let total: i32 = result.value("total_score").unwrap().parse().unwrap();
            assert!((0..=10).contains(&total));
        }
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let mut inputs = all_scores("2");
        inputs.insert("pulse".into(), "3 - Taquicardia".into());
        inputs.remove("respiration");

        let validation = Apgar.validate(&inputs);
        assert_eq!(validation.errors().len(), 2, "{:?}", validation.errors());
    }

    #[test]
    fn test_zero_total_needs_resuscitation() {
        let result = Apgar.calculate_at(&all_scores("0"), 0).unwrap();
        assert_eq!(result.value("status"), Some("Requiere asistencia inmediata"));
        assert!(Apgar.interpret(&result).contains("reanimación neonatal"));
    }
}
