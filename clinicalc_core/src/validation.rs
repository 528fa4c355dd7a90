//! Field declarations and the shared validation pass.
//!
//! Every calculator describes its inputs as a constant table of
//! [`FieldSpec`]. The same table drives validation and is what form-rendering
//! code reads, so bounds live in exactly one place.
//!
//! Validation never stops at the first problem: every violated rule across
//! every field ends up in the returned error list.

use crate::types::{InputSet, InputValue};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Logical type of a field, with its constraints
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Decimal number within an inclusive range
    Number { min: f64, max: f64 },
    /// `"true"` or `"false"`
    Flag,
    /// One of the listed `"<score> - <label>"` options
    Choice { options: &'static [&'static str] },
    /// One of the listed labels, matched case-insensitively
    Text { options: &'static [&'static str] },
}

/// Declaration of one input field
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub kind: FieldKind,
    pub required: bool,
    /// Flag field that must be `"true"` for this field to apply
    pub only_when: Option<&'static str>,
    /// Raw value used when the field is absent
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub const fn number(id: &'static str, label: &'static str, unit: &'static str, min: f64, max: f64) -> Self {
        Self {
            id,
            label,
            unit: Some(unit),
            kind: FieldKind::Number { min, max },
            required: true,
            only_when: None,
            default: None,
        }
    }

    /// Optional flag defaulting to `false`
    pub const fn flag(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            unit: None,
            kind: FieldKind::Flag,
            required: false,
            only_when: None,
            default: Some("false"),
        }
    }

    pub const fn choice(id: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            id,
            label,
            unit: None,
            kind: FieldKind::Choice { options },
            required: true,
            only_when: None,
            default: None,
        }
    }

    pub const fn text(id: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            id,
            label,
            unit: None,
            kind: FieldKind::Text { options },
            required: true,
            only_when: None,
            default: None,
        }
    }

    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional with a default injected when absent
    pub const fn or_default(mut self, default: &'static str) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    /// Only checked when `flag` is `"true"`
    pub const fn when(mut self, flag: &'static str) -> Self {
        self.only_when = Some(flag);
        self
    }

    fn range_message(&self, min: f64, max: f64) -> String {
        match self.unit {
            Some(unit) => format!("{} debe estar entre {} y {} {}", self.label, min, max, unit),
            None => format!("{} debe estar entre {} y {}", self.label, min, max),
        }
    }
}

/// Split `"<score> - <label>"` into its parts. A bare integer is accepted.
pub fn parse_choice(raw: &str) -> Option<(i32, String)> {
    let raw = raw.trim();
    match raw.split_once(" - ") {
        Some((head, tail)) => head
            .trim()
            .parse()
            .ok()
            .map(|score| (score, tail.trim().to_string())),
        None => raw.parse().ok().map(|score| (score, String::new())),
    }
}

/// Parse `"true"` / `"false"` (case-insensitive)
pub fn parse_flag(raw: &str) -> Option<bool> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Typed view of a validated input set
#[derive(Clone, Debug, Default)]
pub struct ParsedInputs {
    values: HashMap<&'static str, InputValue>,
}

impl ParsedInputs {
    pub fn get(&self, id: &str) -> Option<&InputValue> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    pub fn number(&self, id: &str) -> Option<f64> {
        match self.values.get(id) {
            Some(InputValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Absent flags read as `false`
    pub fn flag(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(InputValue::Flag(true)))
    }

    pub fn score(&self, id: &str) -> Option<i32> {
        match self.values.get(id) {
            Some(InputValue::Choice { score, .. }) => Some(*score),
            _ => None,
        }
    }

    pub fn choice_label(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(InputValue::Choice { label, .. }) => Some(label),
            _ => None,
        }
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        match self.values.get(id) {
            Some(InputValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn require_number(&self, id: &str) -> Result<f64> {
        self.number(id).ok_or_else(|| missing(id))
    }

    pub fn require_score(&self, id: &str) -> Result<i32> {
        self.score(id).ok_or_else(|| missing(id))
    }

    pub fn require_text(&self, id: &str) -> Result<&str> {
        self.text(id).ok_or_else(|| missing(id))
    }

    fn insert(&mut self, id: &'static str, value: InputValue) {
        self.values.insert(id, value);
    }
}

fn missing(id: &str) -> Error {
    Error::Computation(format!("no validated value for field '{}'", id))
}

/// Check `inputs` against `fields`, collecting every violation.
///
/// Returns the parsed values of every field that passed, alongside all
/// error messages in field declaration order.
pub fn parse_fields(fields: &[FieldSpec], inputs: &InputSet) -> (ParsedInputs, Vec<String>) {
    let mut parsed = ParsedInputs::default();
    let mut errors = Vec::new();

    for field in fields {
        if let Some(gate) = field.only_when {
            let enabled = inputs
                .get(gate)
                .and_then(|raw| parse_flag(raw))
                .unwrap_or(false);
            if !enabled {
                continue;
            }
        }

        let provided = inputs
            .get(field.id)
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty());

        let raw = match (provided, field.default) {
            (Some(raw), _) => raw,
            (None, _) if field.required => {
                errors.push(format!("{} es obligatorio", field.label));
                continue;
            }
            (None, Some(default)) => default,
            (None, None) => continue,
        };

        match parse_value(field, raw) {
            Ok(value) => parsed.insert(field.id, value),
            Err(message) => errors.push(message),
        }
    }

    (parsed, errors)
}

fn parse_value(field: &FieldSpec, raw: &str) -> std::result::Result<InputValue, String> {
    match field.kind {
        FieldKind::Number { min, max } => {
            let value: f64 = raw
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| format!("{} debe ser un número válido", field.label))?;
            if value < min || value > max {
                return Err(field.range_message(min, max));
            }
            Ok(InputValue::Number(value))
        }
        FieldKind::Flag => parse_flag(raw)
            .map(InputValue::Flag)
            .ok_or_else(|| format!("{} debe ser 'true' o 'false'", field.label)),
        FieldKind::Choice { options } => {
            let (score, label) = parse_choice(raw)
                .ok_or_else(|| format!("{}: opción no válida '{}'", field.label, raw))?;
            let known = options
                .iter()
                .filter_map(|option| parse_choice(option))
                .find(|(option_score, _)| *option_score == score);
            match known {
                // Keep the canonical label when only the score was sent
                Some((_, canonical)) if label.is_empty() => Ok(InputValue::Choice {
                    score,
                    label: canonical,
                }),
                Some(_) => Ok(InputValue::Choice { score, label }),
                None => Err(format!("{}: puntuación fuera de las opciones ({})", field.label, score)),
            }
        }
        FieldKind::Text { options } => options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(raw))
            .map(|option| InputValue::Text(option.to_string()))
            .ok_or_else(|| format!("{}: opción no válida '{}'", field.label, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::input_set;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::number("weight", "Peso", "kg", 1.0, 200.0),
        FieldSpec::flag("has_fever", "Fiebre"),
        FieldSpec::number("temperature", "Temperatura", "°C", 35.0, 43.0).when("has_fever"),
        FieldSpec::choice("eye", "Apertura ocular", &["4 - Espontánea", "1 - Ninguna"]),
        FieldSpec::text("environment", "Entorno", &["Normal", "Incubator"]).or_default("Normal"),
        FieldSpec::number("oral", "Oral", "mL", 0.0, 10000.0).or_default("0"),
    ];

    #[test]
    fn test_valid_inputs_parse_to_typed_values() {
        let inputs = input_set([
            ("weight", "70"),
            ("has_fever", "true"),
            ("temperature", "38.5"),
            ("eye", "4 - Espontánea"),
            ("environment", "incubator"),
        ]);
        let (parsed, errors) = parse_fields(FIELDS, &inputs);

        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(parsed.number("weight"), Some(70.0));
        assert!(parsed.flag("has_fever"));
        assert_eq!(parsed.number("temperature"), Some(38.5));
        assert_eq!(parsed.score("eye"), Some(4));
        assert_eq!(parsed.text("environment"), Some("Incubator"));
        assert_eq!(parsed.number("oral"), Some(0.0));
    }

    #[test]
    fn test_errors_accumulate_across_fields() {
        let inputs = input_set([
            ("has_fever", "true"),
            ("temperature", "50"),
            ("eye", "abc"),
        ]);
        let (_, errors) = parse_fields(FIELDS, &inputs);

        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert!(errors[0].contains("Peso es obligatorio"));
        assert!(errors[1].contains("Temperatura debe estar entre 35 y 43 °C"));
        assert!(errors[2].contains("Apertura ocular"));
    }

    #[test]
    fn test_gated_field_skipped_when_flag_off() {
        let inputs = input_set([("weight", "70"), ("temperature", "99"), ("eye", "1")]);
        let (parsed, errors) = parse_fields(FIELDS, &inputs);

        assert!(errors.is_empty(), "{:?}", errors);
        assert!(!parsed.contains("temperature"));
        assert_eq!(parsed.choice_label("eye"), Some("Ninguna"));
    }

    #[test]
    fn test_malformed_values_are_errors_not_panics() {
        let inputs = input_set([
            ("weight", "NaN"),
            ("has_fever", "yes"),
            ("eye", "3 - Inventada"),
            ("environment", "Space"),
        ]);
        let (_, errors) = parse_fields(FIELDS, &inputs);

        assert_eq!(errors.len(), 4, "{:?}", errors);
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let inputs = input_set([("weight", "   "), ("eye", "4")]);
        let (_, errors) = parse_fields(FIELDS, &inputs);
        assert_eq!(errors, vec!["Peso es obligatorio".to_string()]);
    }

    #[test]
    fn test_parse_choice_forms() {
        assert_eq!(parse_choice("2 - Rosado"), Some((2, "Rosado".into())));
        assert_eq!(parse_choice(" 10 "), Some((10, String::new())));
        assert_eq!(parse_choice("dos - Rosado"), None);
    }

    #[test]
    fn test_require_reports_missing_field() {
        let parsed = ParsedInputs::default();
        assert!(matches!(
            parsed.require_number("weight"),
            Err(Error::Computation(_))
        ));
    }
}
