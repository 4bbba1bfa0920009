//! Technical debt remediation models
//!
//! A debt model is a tree of quality characteristics whose leaves bind
//! coding rules to remediation costs. Models are imported from YAML or JSON
//! documents and checked against a catalog of known rules.

pub mod domain;
pub use domain::{
    Characteristic, Config, DebtModel, Requirement, RuleCatalog, RuleReference, TimeUnit,
    ValidationReport, WorkUnit,
};

pub mod import;
pub use import::{import, ImportIssue, MalformedDocumentError, ModelImporter};

/// Loading rule catalogs from disk.
pub mod storage;
