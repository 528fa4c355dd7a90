//! Mean Arterial Pressure.

use crate::calculator::Calculator;
use crate::format::{fixed, flag, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("systolic", "Presión sistólica", "mmHg", 50.0, 250.0),
    FieldSpec::number("diastolic", "Presión diastólica", "mmHg", 30.0, 150.0),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Mean arterial pressure: therapeutic goals and pharmacologic support",
        source: "Critical Care Clinics",
        url: None,
        year: Some(2010),
    },
    Reference {
        title: "Surviving Sepsis Campaign: International Guidelines for Management of Sepsis and Septic Shock 2021",
        source: "Critical Care Medicine",
        url: Some("https://doi.org/10.1097/CCM.0000000000005337"),
        year: Some(2021),
    },
];

/// MAP band, checked from the top down
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapBand {
    Elevated,
    High,
    Normal,
    Borderline,
    Low,
    Critical,
}

impl MapBand {
    pub fn from_map(map: f64) -> Self {
        if map >= 100.0 {
            Self::Elevated
        } else if map >= 90.0 {
            Self::High
        } else if map >= 70.0 {
            Self::Normal
        } else if map >= 60.0 {
            Self::Borderline
        } else if map >= 50.0 {
            Self::Low
        } else {
            Self::Critical
        }
    }

    /// Inverse of [`code`](Self::code)
    pub fn from_code(code: &str) -> Option<Self> {
        [
            Self::Elevated,
            Self::High,
            Self::Normal,
            Self::Borderline,
            Self::Low,
            Self::Critical,
        ]
        .into_iter()
        .find(|band| band.code() == code)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Elevated => "elevated",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Borderline => "borderline",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Elevated => "PAM elevada",
            Self::High => "PAM alta",
            Self::Normal => "PAM normal",
            Self::Borderline => "PAM limítrofe",
            Self::Low => "PAM baja",
            Self::Critical => "PAM críticamente baja",
        }
    }
}

pub struct MeanArterialPressure;

impl Calculator for MeanArterialPressure {
    fn id(&self) -> &'static str {
        "map"
    }

    fn name(&self) -> &'static str {
        "Presión Arterial Media (PAM)"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        if let (Some(systolic), Some(diastolic)) = (inputs.number("systolic"), inputs.number("diastolic")) {
            if systolic <= diastolic {
                errors.push("La presión sistólica debe ser mayor que la diastólica".to_string());
            }
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let systolic = inputs.require_number("systolic")?;
        let diastolic = inputs.require_number("diastolic")?;

        let map = (systolic + 2.0 * diastolic) / 3.0;
        let band = MapBand::from_map(map);
        let pulse_pressure = systolic - diastolic;

        let mut values = ResultValues::new();
        values.insert("map".into(), fixed(map, 1));
        values.insert("classification".into(), band.code().into());
        values.insert("classification_label".into(), band.label().into());
        values.insert("pulse_pressure".into(), whole(pulse_pressure));
        values.insert("perfusion_target_met".into(), flag(map >= 65.0));
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(map) = result.number("map") else {
            return narrative::incomplete(self.name());
        };
        let band = result
            .value("classification")
            .and_then(MapBand::from_code)
            .unwrap_or_else(|| MapBand::from_map(map));
        let pulse_pressure = result.number("pulse_pressure");

        let mut text = Narrative::new(self.name()).paragraph(format!(
            "PAM de {} mmHg: {}.",
            fixed(map, 1),
            band.label()
        ));

        text = match band {
            MapBand::Elevated => text
                .paragraph("Presión de perfusión por encima del rango habitual; sugiere hipertensión sostenida.")
                .section(
                    "Acciones",
                    [
                        "Confirmar con una segunda medición tras 5 minutos de reposo",
                        "Buscar síntomas de daño de órgano diana (cefalea, dolor torácico, déficit neurológico)",
                        "Revisar tratamiento antihipertensivo y adherencia",
                    ],
                ),
            MapBand::High => text
                .paragraph("Presión de perfusión en el límite alto del rango adecuado.")
                .section(
                    "Acciones",
                    [
                        "Controles seriados de presión arterial",
                        "Valorar factores contribuyentes: dolor, ansiedad, retención hídrica",
                    ],
                ),
            MapBand::Normal => text
                .paragraph("Perfusión orgánica adecuada.")
                .section("Monitorización", ["Continuar con la frecuencia de control habitual"]),
            MapBand::Borderline => text
                .paragraph("Perfusión limítrofe: por debajo de 65 mmHg puede comprometerse la perfusión renal y cerebral.")
                .section(
                    "Acciones",
                    [
                        "Evaluar signos de hipoperfusión: diuresis, estado mental, relleno capilar, lactato",
                        "Considerar reposición de volumen si hay hipovolemia",
                        "Aumentar la frecuencia de monitorización",
                    ],
                ),
            MapBand::Low => text
                .paragraph("Hipotensión con riesgo de hipoperfusión tisular.")
                .section(
                    "Acciones inmediatas",
                    [
                        "Avisar al médico responsable",
                        "Administrar bolo de cristaloides según protocolo (por ejemplo 500 mL en 15 minutos)",
                        "Monitorización continua y control de diuresis horaria",
                        "Valorar vasopresores si no responde a volumen (objetivo PAM >= 65 mmHg)",
                    ],
                ),
            MapBand::Critical => text
                .paragraph("Hipotensión crítica: riesgo inminente de fallo orgánico.")
                .section(
                    "Acciones inmediatas",
                    [
                        "Activar el equipo de respuesta rápida",
                        "Asegurar acceso venoso de gran calibre y reposición enérgica",
                        "Iniciar vasopresores según protocolo de shock",
                        "Descartar causas reversibles: hemorragia, sepsis, anafilaxia, taponamiento",
                    ],
                ),
        };

        if let Some(pp) = pulse_pressure {
            text = text
                .section_if(
                    pp < 25.0,
                    "Presión de pulso",
                    [format!("Presión de pulso estrecha ({} mmHg): puede indicar bajo gasto cardíaco", whole(pp))],
                )
                .section_if(
                    pp > 60.0,
                    "Presión de pulso",
                    [format!("Presión de pulso amplia ({} mmHg): asociada a rigidez arterial o estados hiperdinámicos", whole(pp))],
                );
        }

        text.finish()
    }
}
