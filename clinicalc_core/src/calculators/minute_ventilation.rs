//! Minute and alveolar ventilation, with tidal volume per predicted body weight.

use crate::calculator::Calculator;
use crate::format::{fixed, flag, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::{Error, Result};

const SEXES: &[&str] = &["1 - Masculino", "2 - Femenino"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("tidal_volume", "Volumen corriente", "mL", 50.0, 2000.0),
    FieldSpec::number("respiratory_rate", "Frecuencia respiratoria", "rpm", 4.0, 60.0),
    // PBW stays above 15 kg from 120 cm for either sex
    FieldSpec::number("height", "Talla", "cm", 120.0, 250.0).optional(),
    FieldSpec::choice("sex", "Sexo", SEXES).optional(),
    FieldSpec::flag("on_ventilator", "Ventilación mecánica"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Ventilation with lower tidal volumes as compared with traditional tidal volumes for acute lung injury and the acute respiratory distress syndrome",
        source: "New England Journal of Medicine (ARDSNet)",
        url: Some("https://doi.org/10.1056/NEJM200005043421801"),
        year: Some(2000),
    },
    Reference {
        title: "Respiratory Physiology: The Essentials, 10th edition",
        source: "Wolters Kluwer",
        url: None,
        year: Some(2016),
    },
];

/// Anatomical dead space when no predicted body weight is available
const DEFAULT_DEAD_SPACE_ML: f64 = 150.0;
const DEAD_SPACE_ML_PER_KG: f64 = 2.2;

/// Predicted body weight (ARDSNet)
pub fn predicted_body_weight(height_cm: f64, female: bool) -> f64 {
    let base = if female { 45.5 } else { 50.0 };
    base + 0.91 * (height_cm - 152.4)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VentilationBand {
    Low,
    Normal,
    Elevated,
    High,
}

impl VentilationBand {
    pub fn from_litres(ve: f64) -> Self {
        if ve < 5.0 {
            Self::Low
        } else if ve <= 10.0 {
            Self::Normal
        } else if ve <= 15.0 {
            Self::Elevated
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Hipoventilación",
            Self::Normal => "Normal",
            Self::Elevated => "Elevada",
            Self::High => "Muy elevada",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TidalVolumeBand {
    Protective,
    Acceptable,
    Excessive,
}

impl TidalVolumeBand {
    pub fn from_ml_per_kg(ml_per_kg: f64) -> Self {
        if ml_per_kg <= 6.0 {
            Self::Protective
        } else if ml_per_kg <= 8.0 {
            Self::Acceptable
        } else {
            Self::Excessive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Protective => "Protectora",
            Self::Acceptable => "Aceptable",
            Self::Excessive => "Excesiva",
        }
    }
}

pub struct MinuteVentilation;

impl Calculator for MinuteVentilation {
    fn id(&self) -> &'static str {
        "minute_ventilation"
    }

    fn name(&self) -> &'static str {
        "Ventilación Minuto"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        if inputs.contains("height") && !inputs.contains("sex") {
            errors.push("Sexo es obligatorio para calcular el peso corporal predicho".to_string());
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let tidal = inputs.require_number("tidal_volume")?;
        let rate = inputs.require_number("respiratory_rate")?;

        let ve = tidal * rate / 1000.0;
        let pbw = match (inputs.number("height"), inputs.score("sex")) {
            (Some(height), Some(sex)) => Some(predicted_body_weight(height, sex == 2)),
            _ => None,
        };
        if let Some(pbw) = pbw.filter(|w| *w <= 0.0) {
            return Err(Error::Computation(format!(
                "predicted body weight must be positive, got {}",
                pbw
            )));
        }
        let dead_space = pbw.map_or(DEFAULT_DEAD_SPACE_ML, |w| w * DEAD_SPACE_ML_PER_KG);
        let alveolar = ((tidal - dead_space).max(0.0) * rate) / 1000.0;

        let mut values = ResultValues::new();
        values.insert("minute_ventilation_l".into(), fixed(ve, 1));
        values.insert("ventilation_status".into(), VentilationBand::from_litres(ve).label().into());
        values.insert("dead_space_ml".into(), whole(dead_space));
        values.insert("alveolar_ventilation_l".into(), fixed(alveolar, 1));
        values.insert("on_ventilator".into(), flag(inputs.flag("on_ventilator")));
        if let Some(pbw) = pbw {
            let per_kg = tidal / pbw;
            values.insert("predicted_body_weight_kg".into(), fixed(pbw, 1));
            values.insert("tidal_volume_ml_kg".into(), fixed(per_kg, 1));
            values.insert("tidal_volume_status".into(), TidalVolumeBand::from_ml_per_kg(per_kg).label().into());
            values.insert("protective_tidal_volume_ml".into(), whole(pbw * 6.0));
        }
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let Some(ve) = result.number("minute_ventilation_l") else {
            return narrative::incomplete(self.name());
        };
        let band = VentilationBand::from_litres(ve);
        let ventilated = result.input_flag("on_ventilator");

        let mut findings = vec![format!(
            "Ventilación alveolar: {} L/min (espacio muerto {} mL)",
            result.value("alveolar_ventilation_l").unwrap_or("-"),
            result.value("dead_space_ml").unwrap_or("-")
        )];
        if let Some(per_kg) = result.value("tidal_volume_ml_kg") {
            findings.push(format!(
                "Volumen corriente: {} mL/kg de peso predicho ({} kg), {}",
                per_kg,
                result.value("predicted_body_weight_kg").unwrap_or("-"),
                result.value("tidal_volume_status").unwrap_or("-").to_lowercase()
            ));
        }

        let guidance: Vec<String> = match band {
            VentilationBand::Low => vec![
                "Riesgo de hipercapnia: valorar gasometría arterial".to_string(),
                "Descartar depresión respiratoria por sedantes u opioides".to_string(),
            ],
            VentilationBand::Normal => Vec::new(),
            VentilationBand::Elevated | VentilationBand::High => vec![
                "Buscar causa de la hiperventilación: acidosis metabólica, sepsis, dolor o ansiedad".to_string(),
                "Correlacionar con PaCO2 en gasometría".to_string(),
            ],
        };

        let mut ventilator = Vec::new();
        if ventilated {
            if let Some(protective) = result.value("protective_tidal_volume_ml") {
                ventilator.push(format!("Volumen corriente protector (6 mL/kg): {} mL", protective));
            }
            if result.value("tidal_volume_status") == Some("Excesiva") {
                ventilator.push("Reducir el volumen corriente para limitar la lesión pulmonar inducida".to_string());
            }
            ventilator.push("Mantener presión meseta por debajo de 30 cmH2O".to_string());
        }

        Narrative::new(self.name())
            .paragraph(format!("Ventilación minuto: {} L/min ({}).", fixed(ve, 1), band.label()))
            .section("Hallazgos", findings)
            .section("Recomendaciones", guidance)
            .section_if(ventilated, "Ventilación mecánica", ventilator)
            .finish()
    }
}
