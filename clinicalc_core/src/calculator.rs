//! The contract every clinical calculator implements.

use crate::types::{CalculationResult, InputSet, Reference, ResultValues, ValidationResult};
use crate::validation::{parse_fields, FieldSpec, ParsedInputs};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// A clinical calculator: validate, compute, classify and narrate.
///
/// Implementations hold only constants, so one instance can serve any
/// number of calls from any number of threads.
pub trait Calculator: Send + Sync {
    /// Stable identifier used for dispatch and stored in results
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Field declarations, which are also the validation rules
    fn fields(&self) -> &'static [FieldSpec];

    fn references(&self) -> &'static [Reference];

    /// Cross-field rules, run after every field has been parsed.
    ///
    /// Only fields present in `inputs` passed their own checks.
    fn check_relations(&self, _inputs: &ParsedInputs, _errors: &mut Vec<String>) {}

    /// Apply the formula to validated inputs
    fn compute(&self, inputs: &ParsedInputs) -> Result<ResultValues>;

    /// Narrative for a result previously produced by this calculator
    fn interpret(&self, result: &CalculationResult) -> String;

    /// Parse and check `inputs`, returning typed values and every error
    fn parse(&self, inputs: &InputSet) -> (ParsedInputs, Vec<String>) {
        let (parsed, mut errors) = parse_fields(self.fields(), inputs);
        self.check_relations(&parsed, &mut errors);
        (parsed, errors)
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        let (_, errors) = self.parse(inputs);
        ValidationResult::from_errors(errors)
    }

    /// Calculate, stamping the result with the current time
    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult> {
        self.calculate_at(inputs, chrono::Utc::now().timestamp_millis())
    }

    /// Calculate with an explicit timestamp (epoch milliseconds)
    fn calculate_at(&self, inputs: &InputSet, timestamp: i64) -> Result<CalculationResult> {
        let (parsed, errors) = self.parse(inputs);
        if !errors.is_empty() {
            return Err(Error::InvalidInput {
                calculator_id: self.id().to_string(),
                message: errors.join("; "),
            });
        }

        let values = self.compute(&parsed)?;
        tracing::debug!("{} produced {} result values", self.id(), values.len());

        let echoed = echo_inputs(self.fields(), inputs, &parsed);
        Ok(CalculationResult::new(self.id(), timestamp, echoed, values))
    }
}

/// Raw values of the fields that took part in the calculation.
///
/// Unknown keys and fields switched off by their gate are dropped; absent
/// fields that fell back to a default are echoed with that default.
fn echo_inputs(fields: &[FieldSpec], inputs: &InputSet, parsed: &ParsedInputs) -> BTreeMap<String, String> {
    fields
        .iter()
        .filter(|field| parsed.contains(field.id))
        .filter_map(|field| {
            let raw = inputs
                .get(field.id)
                .map(|raw| raw.trim())
                .filter(|raw| !raw.is_empty())
                .or(field.default)?;
            Some((field.id.to_string(), raw.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::heparin::HeparinDosage;
    use crate::types::input_set;

    #[test]
    fn test_echo_keeps_declared_fields_and_defaults() {
        let inputs = input_set([
            ("weight", " 80 "),
            ("indication", "1"),
            ("aptt", "60"),
            ("bed", "12"),
        ]);
        let result = HeparinDosage.calculate_at(&inputs, 0).unwrap();

        let echoed: Vec<_> = result
            .input_values()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            echoed,
            [
                ("concentration", "100"),
                ("has_aptt", "false"),
                ("indication", "1"),
                ("weight", "80"),
            ]
        );
    }
}
