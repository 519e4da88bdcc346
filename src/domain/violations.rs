//! Core domain models for style violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are entities with behavior, not just data
//! - Violations are immutable once built; builder methods consume and return them
//! - Diagnostics record file-level failures (lexing, parsing, I/O) next to rule violations
//! - ValidationReport acts as an aggregate root managing both collections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity levels for style violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Warnings that should be addressed
    Warning,
    /// Errors that fail CI builds
    Error,
}

impl Severity {
    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A style-convention violation detected by a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    rule_id: String,
    severity: Severity,
    file_path: PathBuf,
    line: u32,
    column: u32,
    message: String,
    context: Option<String>,
    suggested_fix: Option<String>,
}

impl Violation {
    /// Create a new violation at a 1-based line and column
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file_path: impl Into<PathBuf>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            file_path: file_path.into(),
            line,
            column,
            message: message.into(),
            context: None,
            suggested_fix: None,
        }
    }

    /// Add source code context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggested fix. Suggestions are reported, never applied.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_fix = Some(suggestion.into());
        self
    }

    /// Replace the severity (used when configuration overrides a rule's default)
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn suggested_fix(&self) -> Option<&str> {
        self.suggested_fix.as_deref()
    }

    /// Deterministic report ordering: (file, line, column, rule id)
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.file_path
            .cmp(&other.file_path)
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.column.cmp(&other.column))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Kinds of file-level failures reported alongside violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed token such as an unterminated string or comment
    LexError,
    /// Malformed structural declaration
    ParseError,
    /// Source file could not be read
    IoError,
    /// Configuration problem that does not stop the run
    ConfigWarning,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LexError => "LexError",
            Self::ParseError => "ParseError",
            Self::IoError => "IoError",
            Self::ConfigWarning => "ConfigWarning",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::ConfigWarning => Severity::Warning,
            Self::LexError | Self::ParseError | Self::IoError => Severity::Error,
        }
    }
}

/// A file-level failure that happened while analyzing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    file_path: PathBuf,
    line: Option<u32>,
    column: Option<u32>,
    message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, file_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            file_path: file_path.into(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn report_order(&self, other: &Self) -> Ordering {
        self.file_path
            .cmp(&other.file_path)
            .then_with(|| self.line.unwrap_or(0).cmp(&other.line.unwrap_or(0)))
            .then_with(|| self.column.unwrap_or(0).cmp(&other.column.unwrap_or(0)))
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| self.message.cmp(&other.message))
    }
}

/// Everything the pipeline produced for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub violations: Vec<Violation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// A report holding a single diagnostic, e.g. for an unreadable file
    pub fn from_diagnostic(diagnostic: Diagnostic) -> Self {
        Self {
            violations: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.diagnostics.is_empty()
    }
}

/// Summary statistics for a validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Total number of files analyzed
    pub total_files: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
    /// Whether the run was cancelled before every file completed
    pub cancelled: bool,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Number of violations at or above the given severity
    pub fn at_or_above(&self, threshold: Severity) -> usize {
        match threshold {
            Severity::Info => self.total(),
            Severity::Warning => self.warning + self.error,
            Severity::Error => self.error,
        }
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Complete validation report containing all violations, diagnostics and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All violations found during validation
    pub violations: Vec<Violation>,
    /// File-level failures
    pub diagnostics: Vec<Diagnostic>,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Configuration used for this validation
    pub config_fingerprint: Option<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            diagnostics: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Add a file-level diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add the results of one analyzed file
    pub fn add_file_report(&mut self, file: FileReport) {
        for violation in file.violations {
            self.add_violation(violation);
        }
        self.diagnostics.extend(file.diagnostics);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether any violation reaches the threshold
    pub fn has_violations_at(&self, threshold: Severity) -> bool {
        self.summary.violations_by_severity.at_or_above(threshold) > 0
    }

    /// Whether any diagnostics of the given kind were recorded
    pub fn has_diagnostics_of(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// Get violations raised by a specific rule
    pub fn violations_for_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.rule_id == rule_id)
    }

    /// Set the number of files analyzed
    pub fn set_files_analyzed(&mut self, count: usize) {
        self.summary.total_files = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Record that the run stopped early
    pub fn mark_cancelled(&mut self) {
        self.summary.cancelled = true;
    }

    /// Sort violations and diagnostics by (file, line, column, rule) for consistent output
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(Violation::report_order);
        self.diagnostics.sort_by(Diagnostic::report_order);
    }

    /// Process exit code for this report.
    ///
    /// 2 when any file could not be read, 1 when violations reach the
    /// threshold or a file failed to lex or parse, 0 otherwise.
    pub fn exit_code(&self, threshold: Severity) -> i32 {
        if self.has_diagnostics_of(DiagnosticKind::IoError) {
            2
        } else if self.has_violations_at(threshold)
            || self.has_diagnostics_of(DiagnosticKind::LexError)
            || self.has_diagnostics_of(DiagnosticKind::ParseError)
        {
            1
        } else {
            0
        }
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during validation
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Path pattern compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Analysis failed for a specific file
    #[error("Analysis error in {file}: {message}")]
    Analysis { file: String, message: String },

    /// Cache operation failed
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl LintError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create an analysis error
    pub fn analysis(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Analysis {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }
}

/// Result type for lintcs operations
pub type LintResult<T> = Result<T, LintError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(rule: &str, file: &str, line: u32, column: u32) -> Violation {
        Violation::new(rule, Severity::Warning, file, line, column, "message")
    }

    #[test]
    fn test_violation_creation() {
        let violation = Violation::new(
            "PascalCaseType",
            Severity::Error,
            "src/Service.cs",
            3,
            14,
            "Type name 'dataService' should be PascalCase",
        )
        .with_suggestion("DataService");

        assert_eq!(violation.rule_id(), "PascalCaseType");
        assert_eq!(violation.severity(), Severity::Error);
        assert_eq!(violation.file_path(), Path::new("src/Service.cs"));
        assert_eq!((violation.line(), violation.column()), (3, 14));
        assert_eq!(violation.suggested_fix(), Some("DataService"));
    }

    #[test]
    fn test_validation_report_counts() {
        let mut report = ValidationReport::new();
        report.add_violation(violation("a", "A.cs", 1, 1).with_severity(Severity::Error));
        report.add_violation(violation("b", "B.cs", 1, 1));

        assert!(report.has_violations());
        assert_eq!(report.summary.violations_by_severity.total(), 2);
        assert!(report.has_violations_at(Severity::Error));
        assert_eq!(report.summary.violations_by_severity.at_or_above(Severity::Warning), 2);
    }

    #[test]
    fn test_sort_order_is_file_line_column_rule() {
        let mut report = ValidationReport::new();
        report.add_violation(violation("Zeta", "b.cs", 1, 1));
        report.add_violation(violation("Beta", "a.cs", 2, 5));
        report.add_violation(violation("Alpha", "a.cs", 2, 5));
        report.add_violation(violation("Alpha", "a.cs", 2, 1));
        report.add_violation(violation("Alpha", "a.cs", 1, 9));
        report.sort_violations();

        let order: Vec<_> = report
            .violations
            .iter()
            .map(|v| (v.file_path().display().to_string(), v.line(), v.column(), v.rule_id().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.cs".to_string(), 1, 9, "Alpha".to_string()),
                ("a.cs".to_string(), 2, 1, "Alpha".to_string()),
                ("a.cs".to_string(), 2, 5, "Alpha".to_string()),
                ("a.cs".to_string(), 2, 5, "Beta".to_string()),
                ("b.cs".to_string(), 1, 1, "Zeta".to_string()),
            ]
        );
    }

    #[test]
    fn test_exit_codes() {
        let mut report = ValidationReport::new();
        assert_eq!(report.exit_code(Severity::Info), 0);

        report.add_violation(violation("a", "A.cs", 1, 1));
        assert_eq!(report.exit_code(Severity::Warning), 1);
        assert_eq!(report.exit_code(Severity::Error), 0);

        report.add_diagnostic(Diagnostic::new(DiagnosticKind::LexError, "B.cs", "unterminated"));
        assert_eq!(report.exit_code(Severity::Error), 1);

        report.add_diagnostic(Diagnostic::new(DiagnosticKind::IoError, "C.cs", "denied"));
        assert_eq!(report.exit_code(Severity::Error), 2);
    }

    #[test]
    fn test_file_reports_merge_into_counts() {
        let mut report = ValidationReport::new();
        report.add_file_report(FileReport {
            violations: vec![violation("a", "A.cs", 1, 1), violation("b", "A.cs", 2, 1)],
            diagnostics: vec![Diagnostic::new(DiagnosticKind::ParseError, "A.cs", "unclosed scope")],
        });
        report.add_file_report(FileReport::from_diagnostic(Diagnostic::new(
            DiagnosticKind::IoError,
            "B.cs",
            "permission denied",
        )));

        assert_eq!(report.summary.violations_by_severity.warning, 2);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(FileReport::default().is_clean());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert_eq!(Severity::Info.to_string(), "info");
    }
}
