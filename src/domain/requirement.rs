use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::domain::{RuleReference, WorkUnit};

/// How a requirement's remediation cost grows with the number of
/// violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, borsh::BorshSerialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationFunction {
    /// `factor × violations`.
    Linear,
    /// `offset + factor × violations`.
    LinearWithOffset,
}

impl RemediationFunction {
    /// The name used for this function in model documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::LinearWithOffset => "linear_with_offset",
        }
    }
}

impl fmt::Display for RemediationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every function encoding a model document may use, including the
/// deprecated ones.
///
/// Documents are decoded into this type first and then normalized exactly
/// once, with [`FunctionEncoding::normalize`], into a
/// [`RemediationFunction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionEncoding {
    /// `linear`.
    Linear,
    /// `linear_with_offset`.
    LinearWithOffset,
    /// `linear_with_threshold` (deprecated): a factor plus a threshold with
    /// no real offset semantics.
    LinearWithThreshold,
    /// `constant_per_file` (deprecated): a cost that does not depend on the
    /// size of the code.
    ConstantPerFile,
}

/// The outcome of normalizing a [`FunctionEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// A current function, kept as-is.
    Current(RemediationFunction),
    /// A deprecated function rewritten to a current one. Its threshold is
    /// discarded and its offset is zero.
    Rewritten(RemediationFunction),
    /// A deprecated function with no current equivalent. The requirement
    /// is dropped.
    Unsupported,
}

impl FunctionEncoding {
    /// The name used for this encoding in model documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::LinearWithOffset => "linear_with_offset",
            Self::LinearWithThreshold => "linear_with_threshold",
            Self::ConstantPerFile => "constant_per_file",
        }
    }

    /// Maps this encoding onto the current set of functions.
    #[must_use]
    pub const fn normalize(self) -> Normalization {
        match self {
            Self::Linear => Normalization::Current(RemediationFunction::Linear),
            Self::LinearWithOffset => Normalization::Current(RemediationFunction::LinearWithOffset),
            Self::LinearWithThreshold => Normalization::Rewritten(RemediationFunction::Linear),
            Self::ConstantPerFile => Normalization::Unsupported,
        }
    }
}

impl fmt::Display for FunctionEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a function name matches no known encoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown remediation function '{0}'")]
pub struct UnknownFunctionError(String);

impl FromStr for FunctionEncoding {
    type Err = UnknownFunctionError;

    /// Names are matched case-insensitively, with `-` and `_` treated alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(Self::Linear),
            "linear_with_offset" => Ok(Self::LinearWithOffset),
            "linear_with_threshold" => Ok(Self::LinearWithThreshold),
            "constant_per_file" => Ok(Self::ConstantPerFile),
            _ => Err(UnknownFunctionError(s.to_string())),
        }
    }
}

/// The remediation cost bound to violations of one rule.
///
/// Requirements only ever carry a current [`RemediationFunction`];
/// deprecated encodings are normalized or dropped before one is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    #[serde(serialize_with = "rule_as_parts")]
    rule: RuleReference,
    function: RemediationFunction,
    factor: WorkUnit,
    offset: WorkUnit,
}

impl Requirement {
    /// Creates a requirement.
    #[must_use]
    pub const fn new(
        rule: RuleReference,
        function: RemediationFunction,
        factor: WorkUnit,
        offset: WorkUnit,
    ) -> Self {
        Self {
            rule,
            function,
            factor,
            offset,
        }
    }

    /// The rule this requirement applies to.
    #[must_use]
    pub const fn rule(&self) -> &RuleReference {
        &self.rule
    }

    /// The remediation function.
    #[must_use]
    pub const fn function(&self) -> RemediationFunction {
        self.function
    }

    /// The cost per violation.
    #[must_use]
    pub const fn factor(&self) -> WorkUnit {
        self.factor
    }

    /// The fixed cost added once, zero unless the function has an offset.
    #[must_use]
    pub const fn offset(&self) -> WorkUnit {
        self.offset
    }
}

fn rule_as_parts<S>(rule: &RuleReference, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeStruct;

    let mut state = serializer.serialize_struct("RuleReference", 2)?;
    state.serialize_field("repository", rule.repository())?;
    state.serialize_field("key", rule.key())?;
    state.end()
}
