//! Importing debt models from documents.
//!
//! [`ModelImporter`] walks a [`Document`] and builds a
//! [`DebtModel`](crate::DebtModel), checking every requirement against a
//! [`RuleCatalog`](crate::RuleCatalog). Problems that only affect part of the
//! document are collected as [`ImportIssue`]s in the returned
//! [`ValidationReport`](crate::ValidationReport).

mod document;
pub use document::{Document, MalformedDocumentError, Node};

mod issue;
pub use issue::{CostField, ImportIssue};

mod importer;
pub use importer::{import, ModelImporter};
