//! Diagnostics reported while loading a genealogy file.
//!
//! Loading is best-effort: a malformed field falls back to its default and an
//! element that cannot be resolved is dropped, and each case is reported as a
//! [`Diagnostic`] instead of failing the whole load.
//!
//! - [`Severity::Error`] - the element was dropped
//! - [`Severity::Warning`] - a field fell back to its sentinel or empty value
//!
//! Spans are byte ranges into the loaded source text, so a caller can render
//! snippets.

use std::{fmt, ops::Range};

/// A byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The element was dropped from the document.
    Error,

    /// The element was kept with a defaulted field.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Codes categorizing load diagnostics.
///
/// - `E1xx` - malformed values
/// - `E2xx` - unresolved references
/// - `E3xx` - structural conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A coordinate or size is not a number.
    E100,

    /// A date matches none of the accepted formats.
    E101,

    /// A color string cannot be parsed.
    E102,

    /// Gender is neither male nor female.
    E103,

    /// An element with an unexpected tag name.
    E104,

    /// A relationship or marriage names a person that does not exist.
    E200,

    /// A relationship or marriage lacks a person reference attribute.
    E201,

    /// Two persons share the same id.
    E300,

    /// A relationship connects a person to itself or repeats an existing one.
    E301,

    /// A marriage involves a person who is already married.
    E302,
}

impl DiagnosticCode {
    /// Short description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            DiagnosticCode::E100 => "malformed number",
            DiagnosticCode::E101 => "malformed date",
            DiagnosticCode::E102 => "malformed color",
            DiagnosticCode::E103 => "unknown gender",
            DiagnosticCode::E104 => "unexpected element",
            DiagnosticCode::E200 => "unresolved person reference",
            DiagnosticCode::E201 => "missing person reference",
            DiagnosticCode::E300 => "duplicate person id",
            DiagnosticCode::E301 => "invalid relationship",
            DiagnosticCode::E302 => "conflicting marriage",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A message attached to a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    span: Span,
    message: String,
}

impl Label {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single load problem with optional code, labeled spans and help text.
///
/// # Example
///
/// ```text
/// error[E200]: relationship references unknown person `p42`
///   |
/// 7 | <relationship from="p1" to="p42" color="#000000" width="2"/>
///   | ------------------------------------------------------------ dropped
///   |
///   = help: relationships must connect two persons defined in the file
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<DiagnosticCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use lineage::diagnostic::{Diagnostic, DiagnosticCode, Span};
    /// let diag = Diagnostic::error("relationship references unknown person `p42`")
    ///     .with_code(DiagnosticCode::E200)
    ///     .with_label(Span::new(0..10), "dropped");
    /// assert_eq!(diag.to_string(), "error[E200]: relationship references unknown person `p42`");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<DiagnosticCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Accumulates diagnostics during a load.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_code() {
        let with_code = Diagnostic::warning("bad date").with_code(DiagnosticCode::E101);
        assert_eq!(with_code.to_string(), "warning[E101]: bad date");

        let without_code = Diagnostic::error("broken");
        assert_eq!(without_code.to_string(), "error: broken");
    }

    #[test]
    fn test_builder_accessors() {
        let diag = Diagnostic::error("unknown person")
            .with_code(DiagnosticCode::E200)
            .with_label(Span::new(4..12), "here")
            .with_help("define the person first");

        assert!(diag.severity().is_error());
        assert_eq!(diag.code(), Some(DiagnosticCode::E200));
        assert_eq!(diag.labels().len(), 1);
        assert_eq!(diag.labels()[0].span().len(), 8);
        assert_eq!(diag.labels()[0].message(), "here");
        assert_eq!(diag.help(), Some("define the person first"));
    }

    #[test]
    fn test_collector_tracks_errors() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("defaulted"));
        assert!(!collector.has_errors());

        collector.emit(Diagnostic::error("dropped"));
        assert!(collector.has_errors());
        assert_eq!(collector.finish().len(), 2);
    }

    #[test]
    fn test_span() {
        let span = Span::new(3..3);
        assert!(span.is_empty());
        assert_eq!(Span::new(2..7).len(), 5);
    }
}
