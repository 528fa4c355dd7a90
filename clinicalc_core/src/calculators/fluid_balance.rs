//! 24-hour fluid balance with estimated insensible losses.

use crate::calculator::Calculator;
use crate::format::{fixed, round_to, whole};
use crate::narrative::{self, Narrative};
use crate::types::{CalculationResult, Reference, ResultValues};
use crate::validation::{FieldSpec, ParsedInputs};
use crate::Result;

const ENVIRONMENTS: &[&str] = &[
    "Normal",
    "Extreme Heat",
    "Phototherapy",
    "Incubator",
    "Dry Environment",
];

const MAX_VOLUME: f64 = 20_000.0;

const INTAKES: [(&str, &str); 5] = [
    ("oral_intake", "Oral"),
    ("iv_intake", "IV"),
    ("enteral_intake", "Enteral"),
    ("medication_intake", "Medicación"),
    ("other_intake", "Otros"),
];

const OUTPUTS: [(&str, &str); 4] = [
    ("urine_output", "Diuresis"),
    ("stool_output", "Heces"),
    ("drain_output", "Drenajes"),
    ("vomit_output", "Vómitos"),
];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::number("weight", "Peso", "kg", 0.5, 200.0),
    FieldSpec::flag("has_fever", "Fiebre"),
    FieldSpec::number("temperature", "Temperatura", "°C", 35.0, 43.0).when("has_fever"),
    FieldSpec::flag("mechanical_ventilation", "Ventilación mecánica"),
    FieldSpec::flag("hyperventilation", "Hiperventilación"),
    FieldSpec::text("environment", "Entorno", ENVIRONMENTS).or_default("Normal"),
    FieldSpec::number("oral_intake", "Ingesta oral", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("iv_intake", "Fluidoterapia IV", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("enteral_intake", "Nutrición enteral", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("medication_intake", "Volumen de medicación", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("other_intake", "Otros ingresos", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("urine_output", "Diuresis", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("stool_output", "Heces", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("drain_output", "Drenajes", "mL", 0.0, MAX_VOLUME).or_default("0"),
    FieldSpec::number("vomit_output", "Vómitos", "mL", 0.0, MAX_VOLUME).or_default("0"),
];

const REFERENCES: &[Reference] = &[
    Reference {
        title: "Fluid balance and outcome in critically ill patients",
        source: "Intensive Care Medicine",
        url: None,
        year: Some(2017),
    },
    Reference {
        title: "Intravenous fluid therapy in adults in hospital (CG174)",
        source: "National Institute for Health and Care Excellence",
        url: Some("https://www.nice.org.uk/guidance/cg174"),
        year: Some(2013),
    },
    Reference {
        title: "Insensible water loss in newborn infants",
        source: "Clinics in Perinatology",
        url: None,
        year: Some(1991),
    },
];

/// Insensible loss rate in mL/kg/24h before modifiers
fn base_rate(weight: f64) -> f64 {
    if weight >= 20.0 {
        15.0
    } else {
        20.0
    }
}

fn environment_factor(environment: &str) -> f64 {
    match environment {
        "Extreme Heat" => 1.8,
        "Phototherapy" => 1.3,
        "Incubator" => 0.7,
        "Dry Environment" => 1.2,
        _ => 1.0,
    }
}

/// Estimated insensible loss over 24h and the modifiers applied
#[derive(Clone, Debug, PartialEq)]
pub struct InsensibleLoss {
    pub volume: f64,
    pub factors: Vec<String>,
}

pub fn insensible_loss(
    weight: f64,
    temperature: Option<f64>,
    mechanical_ventilation: bool,
    hyperventilation: bool,
    environment: &str,
) -> InsensibleLoss {
    let mut loss = weight * base_rate(weight);
    let mut factors = Vec::new();

    if let Some(temp) = temperature.filter(|t| *t > 37.0) {
        let factor = 1.0 + 0.13 * (temp - 37.0);
        loss *= factor;
        factors.push(format!("Fiebre ×{}", fixed(factor, 2)));
    }

    if mechanical_ventilation {
        loss *= 0.5;
        factors.push("Ventilación mecánica ×0.5".to_string());
    } else if hyperventilation {
        loss *= 1.5;
        factors.push("Hiperventilación ×1.5".to_string());
    }

    let env = environment_factor(environment);
    if env != 1.0 {
        loss *= env;
        factors.push(format!("{} ×{}", environment, env));
    }

    InsensibleLoss {
        volume: round_to(loss, 0),
        factors,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceBand {
    VeryPositive,
    Positive,
    Balanced,
    VeryNegative,
    Negative,
    Neutral,
}

impl BalanceBand {
    pub fn from_balance(balance: f64) -> Self {
        if balance > 1000.0 {
            Self::VeryPositive
        } else if balance > 500.0 {
            Self::Positive
        } else if (-500.0..=500.0).contains(&balance) {
            Self::Balanced
        } else if balance < -1000.0 {
            Self::VeryNegative
        } else if balance < -500.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::VeryPositive => "very_positive",
            Self::Positive => "positive",
            Self::Balanced => "balanced",
            Self::VeryNegative => "very_negative",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryPositive => "Balance muy positivo",
            Self::Positive => "Balance positivo",
            Self::Balanced => "Balance equilibrado",
            Self::VeryNegative => "Balance muy negativo",
            Self::Negative => "Balance negativo",
            Self::Neutral => "Balance neutro",
        }
    }
}

fn sum_fields(inputs: &ParsedInputs, fields: &[(&str, &str)]) -> (f64, String) {
    let mut total = 0.0;
    let mut parts = Vec::new();
    for (id, label) in fields {
        let volume = inputs.number(id).unwrap_or(0.0);
        total += volume;
        if volume > 0.0 {
            parts.push(format!("{} {} mL", label, whole(volume)));
        }
    }
    (total, parts.join(" + "))
}

pub struct FluidBalance;

impl Calculator for FluidBalance {
    fn id(&self) -> &'static str {
        "fluid_balance"
    }

    fn name(&self) -> &'static str {
        "Balance Hídrico (24 h)"
    }

    fn fields(&self) -> &'static [FieldSpec] {
        FIELDS
    }

    fn references(&self) -> &'static [Reference] {
        REFERENCES
    }

    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues> {
        let weight = inputs.require_number("weight")?;
        let temperature = if inputs.flag("has_fever") {
            Some(inputs.require_number("temperature")?)
        } else {
            None
        };
        let environment = inputs.require_text("environment")?;

        let insensible = insensible_loss(
            weight,
            temperature,
            inputs.flag("mechanical_ventilation"),
            inputs.flag("hyperventilation"),
            environment,
        );

        let (total_intake, intake_breakdown) = sum_fields(inputs, &INTAKES);
        let (measured_output, output_breakdown) = sum_fields(inputs, &OUTPUTS);
        let total_output = measured_output + insensible.volume;
        let balance = round_to(total_intake, 0) - round_to(total_output, 0);
        let band = BalanceBand::from_balance(balance);

        let mut values = ResultValues::new();
        values.insert("insensible_loss".into(), whole(insensible.volume));
        values.insert("insensible_rate".into(), fixed(insensible.volume / weight, 1));
        values.insert("total_intake".into(), whole(total_intake));
        values.insert("measured_output".into(), whole(measured_output));
        values.insert("total_output".into(), whole(total_output));
        values.insert("balance".into(), whole(balance));
        values.insert("classification".into(), band.code().into());
        values.insert("classification_label".into(), band.label().into());
        values.insert("balance_per_kg".into(), fixed(balance / weight, 1));
        values.insert(
            "intake_breakdown".into(),
            if intake_breakdown.is_empty() { "Sin ingresos".into() } else { intake_breakdown },
        );
        values.insert(
            "output_breakdown".into(),
            if output_breakdown.is_empty() {
                format!("Pérdidas insensibles {} mL", whole(insensible.volume))
            } else {
                format!("{} + Pérdidas insensibles {} mL", output_breakdown, whole(insensible.volume))
            },
        );
        values.insert(
            "factors_applied".into(),
            if insensible.factors.is_empty() {
                "Ninguno".into()
            } else {
                insensible.factors.join(", ")
            },
        );
        Ok(values)
    }

    fn interpret(&self, result: &CalculationResult) -> String {
        let (Some(balance), Some(intake), Some(output)) = (
            result.number("balance"),
            result.number("total_intake"),
            result.number("total_output"),
        ) else {
            return narrative::incomplete(self.name());
        };
        let band = BalanceBand::from_balance(balance);
        let insensible = result.value("insensible_loss").unwrap_or("0");

        let text = Narrative::new(self.name())
            .paragraph(format!(
                "{}: {} mL en 24 h (ingresos {} mL, egresos {} mL).",
                band.label(),
                whole(balance),
                whole(intake),
                whole(output)
            ))
            .section(
                "Desglose",
                [
                    format!("Ingresos: {}", result.value("intake_breakdown").unwrap_or("-")),
                    format!("Egresos: {}", result.value("output_breakdown").unwrap_or("-")),
                    format!(
                        "Pérdidas insensibles estimadas: {} mL ({} mL/kg/24 h); modificadores: {}",
                        insensible,
                        result.value("insensible_rate").unwrap_or("-"),
                        result.value("factors_applied").unwrap_or("Ninguno")
                    ),
                ],
            );

        let text = match band {
            BalanceBand::VeryPositive => text
                .paragraph("Sobrecarga hídrica significativa.")
                .section(
                    "Acciones",
                    [
                        "Buscar signos de sobrecarga: edemas, crepitantes, ingurgitación yugular, ganancia de peso",
                        "Revisar la prescripción de fluidos y concentrar medicación intravenosa",
                        "Valorar diuréticos con el médico responsable",
                        "Control de peso diario y de electrolitos",
                    ],
                ),
            BalanceBand::Positive => text
                .paragraph("Balance positivo moderado.")
                .section(
                    "Acciones",
                    [
                        "Revisar la necesidad de la fluidoterapia de mantenimiento",
                        "Vigilar edemas y función respiratoria",
                    ],
                ),
            BalanceBand::Balanced | BalanceBand::Neutral => text
                .paragraph("Ingresos y egresos equilibrados.")
                .section("Monitorización", ["Continuar con el registro horario de ingresos y egresos"]),
            BalanceBand::Negative => text
                .paragraph("Balance negativo: riesgo de deshidratación si se mantiene.")
                .section(
                    "Acciones",
                    [
                        "Valorar signos de deshidratación: mucosas, turgencia cutánea, taquicardia, hipotensión",
                        "Comprobar diuresis mínima de 0.5 mL/kg/h",
                        "Considerar aumentar el aporte oral o intravenoso",
                    ],
                ),
            BalanceBand::VeryNegative => text
                .paragraph("Balance muy negativo: riesgo de hipovolemia.")
                .section(
                    "Acciones",
                    [
                        "Avisar al médico responsable",
                        "Control de constantes y diuresis horaria",
                        "Analítica con función renal y electrolitos",
                        "Reposición de volumen según prescripción",
                    ],
                ),
        };

        text.section_if(
            result.input_flag("has_fever"),
            "Fiebre",
            ["La fiebre aumenta las pérdidas insensibles aproximadamente un 13 % por cada grado por encima de 37 °C"],
        )
        .section_if(
            result.input_flag("mechanical_ventilation"),
            "Ventilación mecánica",
            ["La humidificación del circuito reduce las pérdidas respiratorias; se ha aplicado un factor 0.5"],
        )
        .paragraph(
            "Las pérdidas insensibles son una estimación; contrastar con el peso diario cuando sea posible.",
        )
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    #[test]
    fn test_adult_negative_balance() {
        let inputs = input_set([
            ("weight", "70"),
            ("oral_intake", "200"),
            ("iv_intake", "1000"),
            ("urine_output", "800"),
        ]);
        let result = FluidBalance.calculate_at(&inputs, 0).unwrap();

        assert_eq!(result.value("insensible_loss"), Some("1050"));
        assert_eq!(result.value("total_intake"), Some("1200"));
        assert_eq!(result.value("total_output"), Some("1850"));
        assert_eq!(result.value("balance"), Some("-650"));
        assert_eq!(result.value("classification"), Some("negative"));
        assert_eq!(result.value("factors_applied"), Some("Ninguno"));
        assert!(FluidBalance.interpret(&result).contains("Balance negativo"));
    }

    #[test]
    fn test_child_base_rate() {
        let loss = insensible_loss(10.0, None, false, false, "Normal");
        assert_eq!(loss.volume, 200.0);
        assert!(loss.factors.is_empty());
    }

    #[test]
    fn test_fever_factor_applies_only_above_37() {
        let febrile = insensible_loss(70.0, Some(39.0), false, false, "Normal");
        // 1050 * 1.26
        assert_eq!(febrile.volume, 1323.0);

        let normal = insensible_loss(70.0, Some(36.5), false, false, "Normal");
        assert_eq!(normal.volume, 1050.0);
    }

    #[test]
    fn test_modifiers_stack() {
        let loss = insensible_loss(3.0, None, true, false, "Phototherapy");
        // 3 * 20 * 0.5 * 1.3 = 39
        assert_eq!(loss.volume, 39.0);
        assert_eq!(loss.factors.len(), 2);

        let hyper = insensible_loss(40.0, None, false, true, "Incubator");
        // 600 * 1.5 * 0.7 = 630
        assert_eq!(hyper.volume, 630.0);
    }

    #[test]
    fn test_ventilation_overrides_hyperventilation() {
        let inputs = input_set([
            ("weight", "70"),
            ("mechanical_ventilation", "true"),
            ("hyperventilation", "true"),
        ]);
        assert!(FluidBalance.validate(&inputs).is_valid());

        let result = FluidBalance.calculate_at(&inputs, 0).unwrap();
        // 70 * 15 * 0.5 = 525
        assert_eq!(result.value("insensible_loss"), Some("525"));
    }

    #[test]
    fn test_balance_bands() {
        assert_eq!(BalanceBand::from_balance(1001.0), BalanceBand::VeryPositive);
        assert_eq!(BalanceBand::from_balance(1000.0), BalanceBand::Positive);
        assert_eq!(BalanceBand::from_balance(500.0), BalanceBand::Balanced);
        assert_eq!(BalanceBand::from_balance(-500.0), BalanceBand::Balanced);
        assert_eq!(BalanceBand::from_balance(-501.0), BalanceBand::Negative);
        assert_eq!(BalanceBand::from_balance(-1000.0), BalanceBand::Negative);
        assert_eq!(BalanceBand::from_balance(-1001.0), BalanceBand::VeryNegative);
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let inputs = input_set([
            ("has_fever", "true"),
            ("temperature", "45"),
            ("oral_intake", "-5"),
        ]);
        let validation = FluidBalance.validate(&inputs);

        // missing weight, temperature range, oral range
        assert_eq!(validation.errors().len(), 3, "{:?}", validation.errors());
        assert!(validation.errors()[0].contains("Peso"));
    }

    #[test]
    fn test_temperature_required_with_fever() {
        let inputs = input_set([("weight", "70"), ("has_fever", "true")]);
        let validation = FluidBalance.validate(&inputs);
        assert_eq!(validation.errors(), ["Temperatura es obligatorio"]);
    }

    #[test]
    fn test_febrile_ventilated_narrative() {
        let inputs = input_set([
            ("weight", "80"),
            ("has_fever", "true"),
            ("temperature", "38"),
            ("mechanical_ventilation", "true"),
            ("iv_intake", "3000"),
            ("urine_output", "1200"),
        ]);
        let result = FluidBalance.calculate_at(&inputs, 0).unwrap();

        // 80 * 15 * 1.13 * 0.5 = 678
        assert_eq!(result.value("insensible_loss"), Some("678"));
        assert_eq!(result.value("balance"), Some("1122"));
        assert_eq!(result.value("classification"), Some("very_positive"));

        let text = FluidBalance.interpret(&result);
        assert!(text.contains("Fiebre"));
        assert!(text.contains("Ventilación mecánica"));
        assert!(text.contains("Sobrecarga hídrica"));
    }
}
