//! Builds a [`DebtModel`] from a model document.
//!
//! Import never stops at a faulty element. Each problem is recorded in the
//! [`ValidationReport`] and the offending requirement or characteristic is
//! left out of the model. Only a document that cannot be read at all is
//! returned as an error.

use tracing::instrument;

use super::{
    document::{Document, MalformedDocumentError, Node},
    issue::{CostField, ImportIssue},
};
use crate::domain::{
    work_unit::{ParseWorkUnitError, DEFAULT_UNIT},
    CharacteristicId, DebtModel, FunctionEncoding, Normalization, Requirement, RuleCatalog,
    RuleReference, Severity, TimeUnit, ValidationReport, WorkUnit,
};

/// Imports debt models, validating requirements against a rule catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelImporter;

impl ModelImporter {
    /// Creates an importer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Imports a model from document text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a model document. Every other
    /// problem is recorded in the returned report.
    pub fn import<C: RuleCatalog + ?Sized>(
        &self,
        text: &str,
        catalog: &C,
    ) -> Result<(DebtModel, ValidationReport), MalformedDocumentError> {
        let document = Document::parse(text)?;
        Ok(self.import_document(&document, catalog))
    }

    /// Imports a model from raw document bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8 text or not a model
    /// document.
    pub fn import_bytes<C: RuleCatalog + ?Sized>(
        &self,
        bytes: &[u8],
        catalog: &C,
    ) -> Result<(DebtModel, ValidationReport), MalformedDocumentError> {
        let document = Document::from_bytes(bytes)?;
        Ok(self.import_document(&document, catalog))
    }

    /// Imports a model from an already parsed document.
    #[instrument(level = "debug", skip_all)]
    pub fn import_document<C: RuleCatalog + ?Sized>(
        &self,
        document: &Document,
        catalog: &C,
    ) -> (DebtModel, ValidationReport) {
        let mut session = Session {
            catalog,
            model: DebtModel::default(),
            report: ValidationReport::new(),
        };

        for node in document.characteristics() {
            session.characteristic(node, None);
        }

        tracing::debug!(
            characteristics = session.model.len(),
            errors = session.report.errors().len(),
            warnings = session.report.warnings().len(),
            "import finished"
        );
        (session.model, session.report)
    }
}

/// Imports a model from document text with a default [`ModelImporter`].
///
/// # Errors
///
/// Returns an error if the text is not a model document.
pub fn import<C: RuleCatalog + ?Sized>(
    text: &str,
    catalog: &C,
) -> Result<(DebtModel, ValidationReport), MalformedDocumentError> {
    ModelImporter::new().import(text, catalog)
}

/// State of one import call.
struct Session<'c, C: ?Sized> {
    catalog: &'c C,
    model: DebtModel,
    report: ValidationReport,
}

impl<C: RuleCatalog + ?Sized> Session<'_, C> {
    fn record(&mut self, issue: ImportIssue) {
        let severity = issue.severity();
        match severity {
            Severity::Warning => tracing::debug!(%issue, "import warning"),
            Severity::Error => tracing::warn!(%issue, "import error"),
        }
        self.report.add(severity, issue.to_string());
    }

    fn characteristic(&mut self, node: Node<'_>, parent: Option<CharacteristicId>) {
        let Some(key) = node.text("key") else {
            let parent = parent.map(|id| self.model.data(id).key.clone());
            self.record(ImportIssue::MissingKey { parent });
            return;
        };
        let Some(name) = node.text("name") else {
            self.record(ImportIssue::MissingName { key });
            return;
        };

        if self.model.contains_key(&key) {
            self.record(ImportIssue::DuplicateKey { key: key.clone() });
        }

        let id = match parent {
            Some(parent) => self.model.add_child(parent, key, name),
            None => self.model.add_root(key, name),
        };

        for child in node.characteristics() {
            self.characteristic(child, Some(id));
        }
        for requirement in node.requirements() {
            if let Some(requirement) = self.requirement(requirement, id) {
                self.model.add_requirement(id, requirement);
            }
        }
    }

    fn requirement(&mut self, node: Node<'_>, owner: CharacteristicId) -> Option<Requirement> {
        let Some(rule) = node
            .text("rule-repository")
            .zip(node.text("rule-key"))
            .and_then(|(repository, key)| RuleReference::new(repository, key).ok())
        else {
            let characteristic = self.model.data(owner).key.clone();
            self.record(ImportIssue::MissingRule { characteristic });
            return None;
        };

        if self
            .catalog
            .find(rule.repository(), rule.key())
            .is_none()
        {
            self.record(ImportIssue::UnresolvedRule(rule));
            return None;
        }

        let Some(function) = node.raw("function") else {
            self.record(ImportIssue::MissingFunction { rule });
            return None;
        };
        let encoding = match function.parse::<FunctionEncoding>() {
            Ok(encoding) => encoding,
            Err(_) => {
                self.record(ImportIssue::InvalidFunction { function, rule });
                return None;
            }
        };

        let (function, rewritten) = match encoding.normalize() {
            Normalization::Current(function) => (function, false),
            Normalization::Rewritten(function) => (function, true),
            Normalization::Unsupported => {
                self.record(ImportIssue::DeprecatedFunctionDropped {
                    function: encoding,
                    rule,
                });
                return None;
            }
        };

        let factor = self.cost(node, CostField::Factor)?;
        let offset = if rewritten {
            WorkUnit::zero(DEFAULT_UNIT)
        } else {
            self.cost(node, CostField::Offset)?
        };

        if rewritten {
            self.record(ImportIssue::DeprecatedFunctionReplaced {
                function: encoding,
                replacement: function,
                rule: rule.clone(),
            });
        }

        tracing::debug!(%rule, %function, %factor, %offset, "requirement imported");
        Some(Requirement::new(rule, function, factor, offset))
    }

    /// Reads a cost from `<field>-value`/`<field>-unit`, or from a nested
    /// `<field>: {value, unit}` mapping. Absent (or null) values are zero;
    /// present values that are not numbers are reported.
    fn cost(&mut self, node: Node<'_>, field: CostField) -> Option<WorkUnit> {
        let nested = node.child(field.as_str());
        let value = node
            .raw(field.value_field())
            .or_else(|| nested.and_then(|nested| nested.raw("value")));
        let unit = node
            .raw(field.unit_field())
            .or_else(|| nested.and_then(|nested| nested.raw("unit")));

        let unit = match unit.map(|unit| unit.parse::<TimeUnit>().map_err(|_| unit)) {
            None => DEFAULT_UNIT,
            Some(Ok(unit)) => unit,
            Some(Err(value)) => {
                self.record(ImportIssue::InvalidUnit { value, field });
                return None;
            }
        };

        let Some(value) = value else {
            return Some(WorkUnit::zero(unit));
        };
        match WorkUnit::parse(&value, unit) {
            Ok(cost) => Some(cost),
            Err(ParseWorkUnitError::NotNumeric(_)) => {
                self.record(ImportIssue::InvalidNumericValue { value, field });
                None
            }
            Err(ParseWorkUnitError::Negative(_)) => {
                self.record(ImportIssue::NegativeValue { value, field });
                None
            }
            Err(ParseWorkUnitError::TooPrecise(_)) => {
                self.record(ImportIssue::ImpreciseValue { value, field });
                None
            }
            Err(ParseWorkUnitError::TooLarge(_)) => {
                self.record(ImportIssue::ValueTooLarge { value, field });
                None
            }
        }
    }
}
