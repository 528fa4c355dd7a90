//! Calculator registry and dispatch.
//!
//! The registry is filled once at startup and then only read. `register`
//! takes `&mut self`, so interleaving registration with lookups is ruled out
//! by the borrow checker; share the finished service behind `&` or `Arc`.

use crate::calculator::Calculator;
use crate::calculators;
use crate::types::{CalculationResult, InputSet, Reference, ValidationResult};
use crate::validation::FieldSpec;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

/// Cached default service - built once and never mutated afterwards
static DEFAULT_SERVICE: Lazy<CalculatorService> = Lazy::new(CalculatorService::with_defaults);

/// Get a reference to the shared service holding every built-in calculator
pub fn default_service() -> &'static CalculatorService {
    &DEFAULT_SERVICE
}

/// Lookup table from calculator id to calculator
#[derive(Default)]
pub struct CalculatorService {
    calculators: HashMap<String, Arc<dyn Calculator>>,
}

impl CalculatorService {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in calculator
    pub fn with_defaults() -> Self {
        let mut service = Self::new();
        for calculator in calculators::all() {
            service.register(calculator);
        }
        service
    }

    /// Register `calculator` under its id.
    ///
    /// An existing entry with the same id is replaced (last write wins) and
    /// returned.
    pub fn register(&mut self, calculator: Arc<dyn Calculator>) -> Option<Arc<dyn Calculator>> {
        let id = calculator.id().to_string();
        let previous = self.calculators.insert(id.clone(), calculator);
        if previous.is_some() {
            tracing::warn!("Calculator '{}' was already registered, replacing it", id);
        } else {
            tracing::debug!("Registered calculator '{}'", id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Result<&dyn Calculator> {
        self.calculators
            .get(id)
            .map(|c| &**c)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.calculators.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.calculators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registered calculators, sorted by id
    pub fn calculators(&self) -> Vec<&dyn Calculator> {
        let mut all: Vec<_> = self.calculators.values().map(|c| &**c).collect();
        all.sort_by_key(|c| c.id());
        all
    }

    pub fn validate(&self, id: &str, inputs: &InputSet) -> Result<ValidationResult> {
        Ok(self.get(id)?.validate(inputs))
    }

    /// Like [`validate`](Self::validate), folding an unknown id into an
    /// invalid result for display
    pub fn validate_or_report(&self, id: &str, inputs: &InputSet) -> ValidationResult {
        match self.get(id) {
            Ok(calculator) => calculator.validate(inputs),
            Err(_) => ValidationResult::from_errors(vec![format!(
                "Calculadora no encontrada: {}",
                id
            )]),
        }
    }

    pub fn calculate(&self, id: &str, inputs: &InputSet) -> Result<CalculationResult> {
        let calculator = self.get(id)?;
        tracing::debug!("Dispatching calculation to '{}'", id);
        calculator.calculate(inputs)
    }

    pub fn calculate_at(&self, id: &str, inputs: &InputSet, timestamp: i64) -> Result<CalculationResult> {
        self.get(id)?.calculate_at(inputs, timestamp)
    }

    pub fn interpret(&self, id: &str, result: &CalculationResult) -> Result<String> {
        let calculator = self.get(id)?;
        if result.calculator_id() != id {
            return Err(Error::Mismatch {
                expected: id.to_string(),
                found: result.calculator_id().to_string(),
            });
        }
        Ok(calculator.interpret(result))
    }

    pub fn list_references(&self, id: &str) -> Result<&'static [Reference]> {
        Ok(self.get(id)?.references())
    }

    /// Field metadata for form rendering
    pub fn fields(&self, id: &str) -> Result<&'static [FieldSpec]> {
        Ok(self.get(id)?.fields())
    }
}
