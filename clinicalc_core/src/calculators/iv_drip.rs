//! Gravity drip and pump rate for an intravenous infusion.

use crate::calculator::Calculator;
use crate::format::{fixed, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

/// Score is the drop factor in gtt/mL
const DROP_FACTORS: &[&str] = &[
    "10 - Macrogotero 10 gtt/mL",
    "15 - Macrogotero 15 gtt/mL",
    "20 - Macrogotero 20 gtt/mL",
    "60 - Microgotero 60 gtt/mL",
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("volume", "Volumen total", "mL", 1.0, 5000.0),
    FieldSpec::number("hours", "Horas", "h", 0.0, 72.0),
    FieldSpec::number("minutes", "Minutos", "min", 0.0, 59.0).or_default("0"),
    FieldSpec::choice("drop_factor", "Factor de goteo", DROP_FACTORS),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Intravenous Fluid Administration",
        source: "StatPearls Publishing",
        url: Some("https://www.ncbi.nlm.nih.gov/books/NBK542225/"),
        year: Some(2023),
    },
    Reference {
        title: "Infusion Therapy Standards of Practice, 9th edition",
        source: "Journal of Infusion Nursing",
        url: Some("https://doi.org/10.1097/NAN.0000000000000436"),
        year: Some(2024),
    },
];

const MAX_MINUTES: f64 = 72.0 * 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateBand {
    KeepVeinOpen,
    Standard,
    Fast,
    Rapid,
}

impl RateBand {
    pub fn from_ml_per_hour(rate: f64) -> Self {
        if rate < 10.0 {
            Self::KeepVeinOpen
        } else if rate <= 250.0 {
            Self::Standard
        } else if rate <= 500.0 {
            Self::Fast
        } else {
            Self::Rapid
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::KeepVeinOpen => "Mantener vía (KVO)",
            Self::Standard => "Ritmo estándar",
            Self::Fast => "Ritmo rápido",
            Self::Rapid => "Infusión rápida / bolo",
        }
    }
}

/// Drops per minute for `volume` mL over `minutes`
pub fn drops_per_minute(volume: f64, minutes: f64, drop_factor: f64) -> f64 {
    volume * drop_factor / minutes
}

pub struct IvDripRate;

impl Calculator for IvDripRate {
    fn id(&self) -> &'static str {
        "iv_drip_rate"
    }

    fn name(&self) -> &'static str {
        "Velocidad de Goteo Intravenoso"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn check_relations(&self, inputs: &ParsedInputs, errors: &mut Vec<String>) {
        if let (Some(hours), Some(minutes)) = (inputs.number("hours"), inputs.number("minutes")) {
            let total = hours * 60.0 + minutes;
            if total <= 0.0 {
                errors.push("La duración de la infusión debe ser mayor que cero".to_string());
            } else if total > MAX_MINUTES {
                errors.push("La duración de la infusión no puede superar 72 horas".to_string());
            }
        }
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let volume = inputs.require_number("volume")?;
        let minutes = inputs.require_number("hours")? * 60.0 + inputs.require_number("minutes")?;
        let factor = f64::from(inputs.require_score("drop_factor")?);

        let ml_per_hour = volume / (minutes / 60.0);
        let drops = drops_per_minute(volume, minutes, factor);

        let mut values = ResultValues::new();
        values.insert("ml_per_hour".into(), fixed(ml_per_hour, 1));
        values.insert("drops_per_minute".into(), whole(drops));
        values.insert("seconds_per_drop".into(), fixed(60.0 / drops, 1));
        values.insert("total_minutes".into(), whole(minutes));
        values.insert("rate_band".into(), RateBand::from_ml_per_hour(ml_per_hour).label().into());
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(rate), Some(drops)) = (result.number("ml_per_hour"), result.value("drops_per_minute")) else {
            return narrative::incomplete(self.name());
        };
        let band = RateBand::from_ml_per_hour(rate);

        let mut checks = vec![
            "Contar las gotas durante un minuto completo tras ajustar el regulador".to_string(),
            "Revisar el punto de inserción por signos de flebitis o extravasación".to_string(),
        ];
        match band {
            RateBand::KeepVeinOpen => {
                checks.push("Ritmo muy bajo: considerar bomba de infusión para mayor precisión".to_string())
            }
            RateBand::Fast | RateBand::Rapid => {
                checks.push("Vigilar sobrecarga de volumen: auscultación, disnea y edemas".to_string());
                checks.push("Preferir bomba de infusión a ritmos altos".to_string());
            }
            RateBand::Standard => {}
        }

        Narrative::new(self.name())
            .paragraph(format!(
                "Ritmo: {} mL/h = {} gotas/min (una gota cada {} s). {}.",
                fixed(rate, 1),
                drops,
                result.value("seconds_per_drop").unwrap_or("-"),
                band.label()
            ))
            .section("Comprobaciones", checks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_litre_over_eight_hours() {
        let inputs = input_set([("volume", "1000"), ("hours", "8"), ("drop_factor", "20")]);
        let result = IvDripRate.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("ml_per_hour"), Some("125.0"));
        // 1000 * 20 / 480 = 41.67
        assert_eq!(result.value("drops_per_minute"), Some("42"));
        assert_eq!(result.value("rate_band"), Some("Ritmo estándar"));
    }

    #[test]
    fn test_microdrip_equals_ml_per_hour() {
        let inputs = input_set([
            ("volume", "100"),
            ("hours", "1"),
            ("minutes", "30"),
            ("drop_factor", "60 - Microgotero 60 gtt/mL"),
        ]);
        let result = IvDripRate.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("ml_per_hour"), Some("66.7"));
        assert_eq!(result.value("drops_per_minute"), Some("67"));
        assert_eq!(result.value("total_minutes"), Some("90"));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let inputs = input_set([("volume", "500"), ("hours", "0"), ("drop_factor", "15")]);
        assert_eq!(
            IvDripRate.validate(&inputs).errors(),
            ["La duración de la infusión debe ser mayor que cero"]
        );
    }

    #[test]
    fn test_over_72_hours_rejected() {
        let inputs = input_set([
            ("volume", "500"),
            ("hours", "72"),
            ("minutes", "30"),
            ("drop_factor", "15"),
        ]);
        assert!(!IvDripRate.validate(&inputs).is_valid());
    }

    #[test]
    fn test_rate_bands() {
        assert_eq!(RateBand::from_ml_per_hour(5.0), RateBand::KeepVeinOpen);
        assert_eq!(RateBand::from_ml_per_hour(250.0), RateBand::Standard);
        assert_eq!(RateBand::from_ml_per_hour(500.0), RateBand::Fast);
        assert_eq!(RateBand::from_ml_per_hour(1000.0), RateBand::Rapid);
    }

    #[test]
    fn test_fast_rate_warns_about_overload() {
        let inputs = input_set([("volume", "1000"), ("hours", "2"), ("drop_factor", "15")]);
        let result = IvDripRate.calculate_at(&inputs, 0).unwrap();
        assert!(IvDripRate.interpret(&result).contains("sobrecarga de volumen"));
    }
}
