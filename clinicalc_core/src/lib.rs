#![forbid(unsafe_code)]

//! Clinical calculator engine.
//!
//! This crate provides:
//! - The [`Calculator`] contract and a registry that dispatches by id
//! - Thirteen built-in calculators (anthropometry, hemodynamics, neonatal
//!   and neurological scores, fluid and electrolyte management, dosing,
//!   infusion rates, ventilation and pressure injury risk)
//! - A declarative field schema shared by validation and form rendering
//! - Deterministic narrative interpretation of results
//! - Application support: configuration, logging, result history and CSV export
//!
//! Calculators never perform I/O and hold no mutable state.

pub mod types;
pub mod error;
pub mod format;
pub mod narrative;
pub mod validation;
pub mod calculator;
pub mod calculators;
pub mod service;
pub mod config;
pub mod logging;
pub mod history;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use calculator::Calculator;
pub use service::{default_service, CalculatorService};
pub use validation::{FieldKind, FieldSpec, ParsedInputs};
pub use config::{Config, OutputFormat};
pub use history::{read_history, HistoryEntry, JsonlHistory, ResultSink};
pub use export::export_csv;
