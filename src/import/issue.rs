use std::fmt;

use crate::domain::{FunctionEncoding, RemediationFunction, RuleReference, Severity};

/// Which cost of a requirement a value was read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostField {
    /// The cost per violation.
    Factor,
    /// The fixed cost.
    Offset,
}

impl CostField {
    /// The field name used in messages, e.g. `factor`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Factor => "factor",
            Self::Offset => "offset",
        }
    }

    pub(crate) const fn value_field(self) -> &'static str {
        match self {
            Self::Factor => "factor-value",
            Self::Offset => "offset-value",
        }
    }

    pub(crate) const fn unit_field(self) -> &'static str {
        match self {
            Self::Factor => "factor-unit",
            Self::Offset => "offset-unit",
        }
    }
}

impl fmt::Display for CostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable problem found while importing a document.
///
/// The `Display` form of an issue is the message recorded in the
/// [`ValidationReport`](crate::ValidationReport).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportIssue {
    /// A requirement refers to a rule the catalog does not know. The
    /// requirement is skipped.
    #[error("Rule not found: {0}")]
    UnresolvedRule(RuleReference),

    /// A requirement uses a deprecated function that was rewritten to a
    /// current one.
    #[error(
        "Function '{function}' is deprecated and has been replaced by '{replacement}' for rule \
         {rule}: its threshold is ignored"
    )]
    DeprecatedFunctionReplaced {
        /// The deprecated encoding found in the document.
        function: FunctionEncoding,
        /// The function used instead.
        replacement: RemediationFunction,
        /// The rule the requirement applies to.
        rule: RuleReference,
    },

    /// A requirement uses a deprecated function with no current
    /// equivalent. The requirement is skipped.
    #[error("Function '{function}' is deprecated and no longer supported for rule {rule}: requirement ignored")]
    DeprecatedFunctionDropped {
        /// The deprecated encoding found in the document.
        function: FunctionEncoding,
        /// The rule the requirement applies to.
        rule: RuleReference,
    },

    /// A requirement names an unknown function. The requirement is skipped.
    #[error("Unknown function '{function}' for rule {rule}: requirement ignored")]
    InvalidFunction {
        /// The function name as written in the document.
        function: String,
        /// The rule the requirement applies to.
        rule: RuleReference,
    },

    /// A requirement names no function at all. The requirement is skipped.
    #[error("Missing function for rule {rule}: requirement ignored")]
    MissingFunction {
        /// The rule the requirement applies to.
        rule: RuleReference,
    },

    /// A cost value is not numeric. The requirement is skipped.
    #[error("Cannot import value '{value}' for field {field} - Expected a numeric value instead")]
    InvalidNumericValue {
        /// The text as written in the document.
        value: String,
        /// The cost the text was read for.
        field: CostField,
    },

    /// A cost value is below zero. The requirement is skipped.
    #[error("Cannot import value '{value}' for field {field} - Expected a non-negative value instead")]
    NegativeValue {
        /// The text as written in the document.
        value: String,
        /// The cost the text was read for.
        field: CostField,
    },

    /// A cost value needs more than three decimal places. The requirement is
    /// skipped rather than imported with a rounded cost.
    #[error(
        "Cannot import value '{value}' for field {field} - Expected at most 3 decimal places instead"
    )]
    ImpreciseValue {
        /// The text as written in the document.
        value: String,
        /// The cost the text was read for.
        field: CostField,
    },

    /// A cost value is too large to represent. The requirement is skipped.
    #[error("Cannot import value '{value}' for field {field} - Expected a smaller value instead")]
    ValueTooLarge {
        /// The text as written in the document.
        value: String,
        /// The cost the text was read for.
        field: CostField,
    },

    /// A cost unit is not a known time unit. The requirement is skipped.
    #[error("Cannot import value '{value}' for field {field} unit - Expected one of d, h, mn instead")]
    InvalidUnit {
        /// The unit as written in the document.
        value: String,
        /// The cost the unit was read for.
        field: CostField,
    },

    /// A requirement lacks a rule repository or key. The requirement is
    /// skipped.
    #[error(
        "Cannot import requirement of characteristic '{characteristic}' - Expected a \
         rule-repository and a rule-key"
    )]
    MissingRule {
        /// Key of the characteristic holding the requirement.
        characteristic: String,
    },

    /// A characteristic element has no key. It is skipped along with
    /// everything nested in it.
    #[error("Cannot import characteristic{} - Expected a key", display_parent(.parent.as_deref()))]
    MissingKey {
        /// Key of the enclosing characteristic, if any.
        parent: Option<String>,
    },

    /// A characteristic element has no name. It is skipped along with
    /// everything nested in it.
    #[error("Cannot import characteristic '{key}' - Expected a name")]
    MissingName {
        /// The characteristic's key.
        key: String,
    },

    /// A characteristic key was already used. The later characteristic wins
    /// key lookups; both stay in the tree.
    #[error("Duplicate characteristic key '{key}': the last definition takes precedence")]
    DuplicateKey {
        /// The repeated key.
        key: String,
    },
}

fn display_parent(parent: Option<&str>) -> String {
    parent.map_or_else(String::new, |parent| format!(" under '{parent}'"))
}

impl ImportIssue {
    /// Whether the issue is reported as a warning or an error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedRule(_)
            | Self::DeprecatedFunctionReplaced { .. }
            | Self::DeprecatedFunctionDropped { .. }
            | Self::DuplicateKey { .. } => Severity::Warning,
            Self::InvalidFunction { .. }
            | Self::MissingFunction { .. }
            | Self::InvalidNumericValue { .. }
            | Self::NegativeValue { .. }
            | Self::ImpreciseValue { .. }
            | Self::ValueTooLarge { .. }
            | Self::InvalidUnit { .. }
            | Self::MissingRule { .. }
            | Self::MissingKey { .. }
            | Self::MissingName { .. } => Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RuleReference {
        RuleReference::new("checkstyle", "Regexp").unwrap()
    }

    #[test]
    fn unresolved_rule_message() {
        let issue = ImportIssue::UnresolvedRule(RuleReference::new("findbugs", "Foo").unwrap());
        assert_eq!(issue.to_string(), "Rule not found: [repository=findbugs, key=Foo]");
        assert_eq!(issue.severity(), Severity::Warning);
    }

    #[test]
    fn invalid_numeric_value_message() {
        let issue = ImportIssue::InvalidNumericValue {
            value: "abc".to_string(),
            field: CostField::Factor,
        };
        assert_eq!(
            issue.to_string(),
            "Cannot import value 'abc' for field factor - Expected a numeric value instead"
        );
        assert_eq!(issue.severity(), Severity::Error);
    }

    #[test]
    fn unrepresentable_values_are_errors() {
        let imprecise = ImportIssue::ImpreciseValue {
            value: "0.0004".to_string(),
            field: CostField::Factor,
        };
        let large = ImportIssue::ValueTooLarge {
            value: "1e20".to_string(),
            field: CostField::Offset,
        };
        assert_eq!(
            imprecise.to_string(),
            "Cannot import value '0.0004' for field factor - Expected at most 3 decimal places \
             instead"
        );
        assert_eq!(
            large.to_string(),
            "Cannot import value '1e20' for field offset - Expected a smaller value instead"
        );
        assert_eq!(imprecise.severity(), Severity::Error);
        assert_eq!(large.severity(), Severity::Error);
    }

    #[test]
    fn deprecated_messages_name_the_rule() {
        let replaced = ImportIssue::DeprecatedFunctionReplaced {
            function: FunctionEncoding::LinearWithThreshold,
            replacement: RemediationFunction::Linear,
            rule: rule(),
        };
        let dropped = ImportIssue::DeprecatedFunctionDropped {
            function: FunctionEncoding::ConstantPerFile,
            rule: rule(),
        };

        for issue in [replaced, dropped] {
            let message = issue.to_string();
            assert!(message.contains("[repository=checkstyle, key=Regexp]"));
            assert_eq!(issue.severity(), Severity::Warning);
        }
    }

    #[test]
    fn invalid_function_names_function_and_rule() {
        let issue = ImportIssue::InvalidFunction {
            function: "exponential".to_string(),
            rule: rule(),
        };
        assert_eq!(
            issue.to_string(),
            "Unknown function 'exponential' for rule [repository=checkstyle, key=Regexp]: \
             requirement ignored"
        );
        assert_eq!(issue.severity(), Severity::Error);
    }

    #[test]
    fn missing_key_mentions_parent() {
        let nested = ImportIssue::MissingKey {
            parent: Some("EFFICIENCY".to_string()),
        };
        let root = ImportIssue::MissingKey { parent: None };
        assert_eq!(
            nested.to_string(),
            "Cannot import characteristic under 'EFFICIENCY' - Expected a key"
        );
        assert_eq!(root.to_string(), "Cannot import characteristic - Expected a key");
    }
}
