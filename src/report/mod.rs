//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - Violations and diagnostics are flattened into one ordered record list before rendering
//! - Each formatter encapsulates the rules for its specific output format
//! - Rendering is pure; only `write_report` touches an output sink

use crate::domain::violations::{
    Diagnostic, LintError, LintResult, Severity, ValidationReport, Violation,
};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text grouped by file
    Text,
    /// JSON array of records for programmatic consumption
    Json,
    /// SARIF 2.1.0 for code scanning tools
    Sarif,
    /// GitHub Actions workflow commands
    Github,
}

impl OutputFormat {
    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["text", "json", "sarif", "github"]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Sarif => "sarif",
            Self::Github => "github",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "human" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "sarif" => Ok(Self::Sarif),
            "github" => Ok(Self::Github),
            other => Err(LintError::config(format!(
                "Unknown output format '{other}'. Available: {}",
                Self::all_formats().join(", ")
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (text format only)
    pub use_colors: bool,
    /// Whether to show the offending source line
    pub show_context: bool,
    /// Whether to show suggested fixes
    pub show_suggestions: bool,
    /// Violations below this severity are left out; diagnostics are always shown
    pub min_severity: Option<Severity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_context: true,
            show_suggestions: true,
            min_severity: None,
        }
    }
}

/// One rendered line item: a violation or a diagnostic
struct Record<'a> {
    file: &'a Path,
    line: Option<u32>,
    column: Option<u32>,
    rule: &'a str,
    severity: Severity,
    message: &'a str,
    context: Option<&'a str>,
    suggestion: Option<&'a str>,
    is_diagnostic: bool,
}

impl<'a> Record<'a> {
    fn from_violation(v: &'a Violation) -> Self {
        Self {
            file: v.file_path(),
            line: Some(v.line()),
            column: Some(v.column()),
            rule: v.rule_id(),
            severity: v.severity(),
            message: v.message(),
            context: v.context(),
            suggestion: v.suggested_fix(),
            is_diagnostic: false,
        }
    }

    fn from_diagnostic(d: &'a Diagnostic) -> Self {
        Self {
            file: d.file_path(),
            line: d.line(),
            column: d.column(),
            rule: d.kind().as_str(),
            severity: d.severity(),
            message: d.message(),
            context: None,
            suggestion: None,
            is_diagnostic: true,
        }
    }

    fn order(&self, other: &Self) -> Ordering {
        self.file
            .cmp(other.file)
            .then_with(|| self.line.unwrap_or(0).cmp(&other.line.unwrap_or(0)))
            .then_with(|| self.column.unwrap_or(0).cmp(&other.column.unwrap_or(0)))
            .then_with(|| self.rule.cmp(other.rule))
            .then_with(|| self.message.cmp(other.message))
    }

    fn position(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => format!("{line}:{column}"),
            (Some(line), None) => line.to_string(),
            _ => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Error,
    Warning,
    Info,
    Dim,
    Bold,
    Success,
}

impl Style {
    fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Error,
            Severity::Warning => Self::Warning,
            Severity::Info => Self::Info,
        }
    }
}

#[cfg(feature = "colors")]
fn paint(text: &str, style: Style, enabled: bool) -> String {
    use colored::Colorize;

    if !enabled {
        return text.to_string();
    }
    match style {
        Style::Error => text.red().to_string(),
        Style::Warning => text.yellow().to_string(),
        Style::Info => text.cyan().to_string(),
        Style::Dim => text.dimmed().to_string(),
        Style::Bold => text.bold().to_string(),
        Style::Success => text.green().to_string(),
    }
}

#[cfg(not(feature = "colors"))]
fn paint(text: &str, _style: Style, _enabled: bool) -> String {
    text.to_string()
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Format a validation report in the specified format
    pub fn format_report(&self, report: &ValidationReport, format: OutputFormat) -> LintResult<String> {
        let records = self.records(report);
        match format {
            OutputFormat::Text => Ok(self.format_text(report, &records)),
            OutputFormat::Json => self.format_json(&records),
            OutputFormat::Sarif => self.format_sarif(&records),
            OutputFormat::Github => Ok(self.format_github(&records)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
        mut writer: W,
    ) -> LintResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Violations passing the severity filter plus every diagnostic, in report order
    fn records<'a>(&self, report: &'a ValidationReport) -> Vec<Record<'a>> {
        let mut records: Vec<Record<'a>> = report
            .violations
            .iter()
            .filter(|v| self.options.min_severity.map_or(true, |min| v.severity() >= min))
            .map(Record::from_violation)
            .chain(report.diagnostics.iter().map(Record::from_diagnostic))
            .collect();
        records.sort_by(|a, b| a.order(b));
        records
    }

    /// Format report in human-readable text
    fn format_text(&self, report: &ValidationReport, records: &[Record<'_>]) -> String {
        let colors = self.options.use_colors;
        let mut output = String::new();

        if records.is_empty() {
            output.push_str(&paint("No style violations found", Style::Success, colors));
            output.push('\n');
        }

        let mut by_file: BTreeMap<&Path, Vec<&Record<'_>>> = BTreeMap::new();
        for record in records {
            by_file.entry(record.file).or_default().push(record);
        }

        for (file, file_records) in by_file {
            output.push_str(&paint(&file.display().to_string(), Style::Bold, colors));
            output.push('\n');

            for record in file_records {
                output.push_str(&format!(
                    "  {} {} [{}] {}\n",
                    paint(&record.position(), Style::Dim, colors),
                    record.rule,
                    paint(record.severity.as_str(), Style::for_severity(record.severity), colors),
                    record.message
                ));
                if self.options.show_context {
                    if let Some(context) = record.context {
                        output.push_str(&paint(&format!("    | {context}"), Style::Dim, colors));
                        output.push('\n');
                    }
                }
                if self.options.show_suggestions {
                    if let Some(suggestion) = record.suggestion {
                        output.push_str(&format!("    = help: {suggestion}\n"));
                    }
                }
            }
            output.push('\n');
        }

        output.push_str(&self.format_summary(report, records));
        output
    }

    /// Summary line; timings are left out so reruns render identically
    fn format_summary(&self, report: &ValidationReport, records: &[Record<'_>]) -> String {
        let colors = self.options.use_colors;
        let count = |severity: Severity| {
            records
                .iter()
                .filter(|r| !r.is_diagnostic && r.severity == severity)
                .count()
        };
        let diagnostics = records.iter().filter(|r| r.is_diagnostic).count();

        let mut parts = Vec::new();
        let errors = count(Severity::Error);
        if errors > 0 {
            parts.push(paint(&plural(errors, "error"), Style::Error, colors));
        }
        let warnings = count(Severity::Warning);
        if warnings > 0 {
            parts.push(paint(&plural(warnings, "warning"), Style::Warning, colors));
        }
        let infos = count(Severity::Info);
        if infos > 0 {
            parts.push(paint(&format!("{infos} info"), Style::Info, colors));
        }
        if diagnostics > 0 {
            parts.push(paint(&plural(diagnostics, "diagnostic"), Style::Error, colors));
        }
        if parts.is_empty() {
            parts.push(paint("0 violations", Style::Success, colors));
        }

        let mut summary = format!(
            "{} {} in {}",
            paint("Summary:", Style::Bold, colors),
            parts.join(", "),
            plural(report.summary.total_files, "file")
        );
        if report.summary.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary.push('\n');
        summary
    }

    /// Format report as a JSON array of records
    fn format_json(&self, records: &[Record<'_>]) -> LintResult<String> {
        let json_records: Vec<JsonValue> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "file": r.file.display().to_string(),
                    "line": r.line,
                    "column": r.column,
                    "rule": r.rule,
                    "severity": r.severity.as_str(),
                    "message": r.message,
                })
            })
            .collect();

        serde_json::to_string_pretty(&json_records)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| LintError::config(format!("JSON serialization failed: {e}")))
    }

    /// Format report in SARIF format
    fn format_sarif(&self, records: &[Record<'_>]) -> LintResult<String> {
        let results: Vec<JsonValue> = records
            .iter()
            .map(|r| {
                let level = match r.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "note",
                };
                let mut result = serde_json::json!({
                    "ruleId": r.rule,
                    "level": level,
                    "message": { "text": r.message },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": r.file.display().to_string().replace('\\', "/")
                            },
                            "region": {
                                "startLine": r.line.unwrap_or(1),
                                "startColumn": r.column.unwrap_or(1)
                            }
                        }
                    }]
                });
                if let Some(suggestion) = r.suggestion {
                    result["fixes"] = serde_json::json!([{ "description": { "text": suggestion } }]);
                }
                result
            })
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "lintcs",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                },
                "results": results
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| LintError::config(format!("SARIF serialization failed: {e}")))
    }

    /// Format report for GitHub Actions
    fn format_github(&self, records: &[Record<'_>]) -> String {
        let mut output = String::new();
        for r in records {
            let level = match r.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "notice",
            };
            let mut properties = format!("file={}", escape_property(&r.file.display().to_string()));
            if let Some(line) = r.line {
                properties.push_str(&format!(",line={line}"));
            }
            if let Some(column) = r.column {
                properties.push_str(&format!(",col={column}"));
            }
            properties.push_str(&format!(",title={}", escape_property(r.rule)));

            output.push_str(&format!("::{level} {properties}::{}\n", escape_data(r.message)));
        }
        output
    }
}

/// Escape workflow command data
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Escape workflow command property values
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::violations::DiagnosticKind;

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    fn create_test_report() -> ValidationReport {
        let mut report = ValidationReport::new();
        report.add_violation(
            Violation::new(
                "PascalCaseType",
                Severity::Warning,
                "src/Service.cs",
                1,
                14,
                "type 'dataService' should be PascalCase",
            )
            .with_context("public class dataService {}")
            .with_suggestion("rename to 'DataService'"),
        );
        report.add_violation(Violation::new(
            "OneStatementPerLine",
            Severity::Info,
            "src/A.cs",
            3,
            9,
            "statement starts on the same line as the previous statement",
        ));
        report.add_diagnostic(
            Diagnostic::new(DiagnosticKind::LexError, "src/Broken.cs", "unterminated string literal")
                .with_position(2, 20),
        );
        report.set_files_analyzed(3);
        report.set_execution_time(1234);
        report
    }

    #[test]
    fn test_text_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Text).unwrap();

        assert!(output.contains("src/Service.cs\n  1:14 PascalCaseType [warning] type 'dataService' should be PascalCase\n"));
        assert!(output.contains("    | public class dataService {}\n"));
        assert!(output.contains("    = help: rename to 'DataService'\n"));
        assert!(output.contains("2:20 LexError [error] unterminated string literal"));
        assert!(output.ends_with("Summary: 1 warning, 1 info, 1 diagnostic in 3 files\n"));
        // files render in path order
        let a = output.find("src/A.cs").unwrap();
        let broken = output.find("src/Broken.cs").unwrap();
        let service = output.find("src/Service.cs").unwrap();
        assert!(a < broken && broken < service);
    }

    #[test]
    fn test_text_format_has_no_timings() {
        let report = create_test_report();
        let first = plain().format_report(&report, OutputFormat::Text).unwrap();
        let mut rerun = report.clone();
        rerun.set_execution_time(99);
        assert_eq!(first, plain().format_report(&rerun, OutputFormat::Text).unwrap());
        assert!(!first.contains("1234"));
    }

    #[test]
    fn test_json_format_is_ordered_array() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        let records = json.as_array().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["file"], "src/A.cs");
        assert_eq!(records[1]["rule"], "LexError");
        assert_eq!(records[2]["rule"], "PascalCaseType");
        assert_eq!(records[2]["line"], 1);
        assert_eq!(records[2]["column"], 14);
        assert_eq!(records[2]["severity"], "warning");
    }

    #[test]
    fn test_sarif_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Sarif).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        let results = json["runs"][0]["results"].as_array().unwrap();

        assert_eq!(json["version"], "2.1.0");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["level"], "note");
        assert_eq!(results[2]["fixes"][0]["description"]["text"], "rename to 'DataService'");
    }

    #[test]
    fn test_github_format() {
        let output = plain().format_report(&create_test_report(), OutputFormat::Github).unwrap();
        assert!(output.contains(
            "::warning file=src/Service.cs,line=1,col=14,title=PascalCaseType::type 'dataService' should be PascalCase\n"
        ));
        assert!(output.contains("::notice file=src/A.cs"));
        assert!(output.contains("::error file=src/Broken.cs,line=2,col=20,title=LexError::"));
    }

    #[test]
    fn test_empty_report() {
        let output = plain().format_report(&ValidationReport::new(), OutputFormat::Text).unwrap();
        assert!(output.starts_with("No style violations found\n"));
        assert!(output.contains("0 violations in 0 files"));
    }

    #[test]
    fn test_severity_filtering_keeps_diagnostics() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            min_severity: Some(Severity::Warning),
            ..Default::default()
        });
        let output = formatter.format_report(&create_test_report(), OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        let rules: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rule"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(rules, vec!["LexError", "PascalCaseType"]);
    }

    #[test]
    fn test_format_names() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("junit".parse::<OutputFormat>().is_err());
        for name in OutputFormat::all_formats() {
            assert_eq!(name.parse::<OutputFormat>().unwrap().as_str(), *name);
        }
    }

    #[test]
    fn test_write_report() {
        let mut buffer = Vec::new();
        plain()
            .write_report(&create_test_report(), OutputFormat::Github, &mut buffer)
            .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_workflow_command_escaping() {
        assert_eq!(escape_data("50%\nnext"), "50%25%0Anext");
        assert_eq!(escape_property("C:\\src,a.cs"), "C%3A\\src%2Ca.cs");
    }
}
