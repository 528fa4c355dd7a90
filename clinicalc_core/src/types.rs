//! Core data types shared by every calculator.
//!
//! The external contract is string based: inputs arrive as a map of field id
//! to raw text and results leave as a map of result key to formatted text.
//! - Input sets and parsed input values
//! - Validation outcomes
//! - Calculation results
//! - Bibliographic references

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Raw input keyed by field id. Numbers, flags and choices are all text.
pub type InputSet = HashMap<String, String>;

/// Formatted outputs keyed by result id.
pub type ResultValues = BTreeMap<String, String>;

/// Build an [`InputSet`] from string pairs.
pub fn input_set<K, V, I>(pairs: I) -> InputSet
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ============================================================================
// Parsed Inputs
// ============================================================================

/// A raw input value after it has been parsed against its field declaration
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Number(f64),
    Text(String),
    Flag(bool),
    /// Enumerated option `"<score> - <label>"`
    Choice { score: i32, label: String },
}

// ============================================================================
// Validation
// ============================================================================

/// Outcome of checking an input set against a calculator's rules.
///
/// `is_valid` is always `errors.is_empty()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self::from_errors(Vec::new())
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Errors joined the way `InvalidInput` reports them
    pub fn joined(&self) -> String {
        self.errors.join("; ")
    }
}

// ============================================================================
// Calculation Result
// ============================================================================

/// Immutable record of one computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    calculator_id: String,
    /// Creation instant, milliseconds since the Unix epoch
    timestamp: i64,
    input_values: BTreeMap<String, String>,
    result_values: ResultValues,
}

impl CalculationResult {
    pub fn new(
        calculator_id: impl Into<String>,
        timestamp: i64,
        input_values: BTreeMap<String, String>,
        result_values: ResultValues,
    ) -> Self {
        Self {
            calculator_id: calculator_id.into(),
            timestamp,
            input_values,
            result_values,
        }
    }

    pub fn calculator_id(&self) -> &str {
        &self.calculator_id
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn input_values(&self) -> &BTreeMap<String, String> {
        &self.input_values
    }

    pub fn result_values(&self) -> &ResultValues {
        &self.result_values
    }

    /// Formatted result value
    pub fn value(&self, key: &str) -> Option<&str> {
        self.result_values.get(key).map(String::as_str)
    }

    /// Result value parsed back to a number
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|v| v.trim().parse().ok())
    }

    /// Echoed raw input
    pub fn input(&self, key: &str) -> Option<&str> {
        self.input_values.get(key).map(String::as_str)
    }

    /// Echoed boolean input; absent or malformed reads as `false`
    pub fn input_flag(&self, key: &str) -> bool {
        self.input(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

// ============================================================================
// References
// ============================================================================

/// Bibliographic source backing a calculator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub title: &'static str,
    pub source: &'static str,
    pub url: Option<&'static str>,
    pub year: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_invariant() {
        assert!(ValidationResult::valid().is_valid());

        let invalid = ValidationResult::from_errors(vec!["a".into(), "b".into()]);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.joined(), "a; b");
    }

    #[test]
    fn test_result_accessors() {
        let mut inputs = BTreeMap::new();
        inputs.insert("has_fever".to_string(), "TRUE".to_string());
        let mut values = ResultValues::new();
        values.insert("bmi".into(), "24.2".into());

        let result = CalculationResult::new("bmi", 42, inputs, values);

        assert_eq!(result.number("bmi"), Some(24.2));
        assert_eq!(result.value("missing"), None);
        assert!(result.input_flag("has_fever"));
        assert!(!result.input_flag("ventilated"));
    }

    #[test]
    fn test_result_serde_roundtrip_keeps_everything() {
        let result = CalculationResult::new(
            "map",
            1_700_000_000_000,
            BTreeMap::from([("systolic".to_string(), "120".to_string())]),
            ResultValues::from([("map".to_string(), "93.3".to_string())]),
        );

        let json = serde_json::to_string(&result).unwrap();
        let parsed: CalculationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
