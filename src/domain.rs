//! Domain models for technical debt remediation.
//!
//! This module contains the core domain types: the characteristic tree, the
//! requirements attached to it, remediation costs, rule references and the
//! validation report produced by an import.

/// Remediation cost values and unit conversion.
pub mod work_unit;
pub use work_unit::{TimeUnit, UnitRatios, WorkUnit};

/// Rule references and rule catalogs.
pub mod rule;
pub use rule::{CachedRuleCatalog, InMemoryRuleCatalog, Rule, RuleCatalog, RuleReference};

/// Requirements and remediation functions.
pub mod requirement;
pub use requirement::{FunctionEncoding, Normalization, RemediationFunction, Requirement};

mod characteristic;
pub use characteristic::Characteristic;

mod model;
pub(crate) use model::CharacteristicId;
pub use model::DebtModel;

mod report;
pub use report::{Severity, ValidationReport};

mod config;
pub use config::Config;
