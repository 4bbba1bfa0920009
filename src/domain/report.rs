use serde::Serialize;

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Part of the document was rewritten or skipped, as intended for
    /// legacy input.
    Warning,
    /// Part of the document was invalid and has been skipped.
    Error,
}

/// Ordered warning and error messages collected during an import.
///
/// Messages are appended in the order problems are encountered and are
/// never deduplicated: two faulty requirements produce two messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message with the given severity.
    pub fn add(&mut self, severity: Severity, message: impl Into<String>) {
        match severity {
            Severity::Warning => self.warnings.push(message.into()),
            Severity::Error => self.errors.push(message.into()),
        }
    }

    /// Appends an error message.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.add(Severity::Error, message);
    }

    /// Appends a warning message.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.add(Severity::Warning, message);
    }

    /// Error messages, in the order they were reported.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Warning messages, in the order they were reported.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Whether any error was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether any warning was reported.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether nothing was reported at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}
