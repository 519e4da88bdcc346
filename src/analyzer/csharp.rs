//! C# per-file pipeline: tokenizer, structural parser, rule engine
//!
//! Architecture: Pipeline - each stage consumes the previous stage's output for one file
//! - Lex errors become diagnostics and disable the parser; token rules still run
//! - Parse errors become diagnostics; the partial scope tree is still checked
//! - Cancellation is checked between stages and discards the file's partial results

use super::{CancellationToken, FileAnalyzer};
use crate::domain::violations::{Diagnostic, DiagnosticKind, FileReport, LintResult};
use crate::rules::{ProjectSymbols, RuleContext, RuleEngine};
use crate::syntax::{parse, tokenize};
use std::path::Path;
use std::sync::Arc;

/// Analyzer for `.cs` files
#[derive(Debug)]
pub struct CSharpAnalyzer {
    engine: RuleEngine,
}

impl CSharpAnalyzer {
    pub fn new(engine: RuleEngine) -> Self {
        Self { engine }
    }

    /// Analyzer running every rule at its default severity
    pub fn with_defaults() -> LintResult<Self> {
        Ok(Self::new(RuleEngine::with_defaults()?))
    }

    pub fn with_symbols(mut self, symbols: Arc<dyn ProjectSymbols>) -> Self {
        self.engine = self.engine.with_symbols(symbols);
        self
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }
}

impl FileAnalyzer for CSharpAnalyzer {
    fn analyze(&self, file_path: &Path, content: &str, cancel: &CancellationToken) -> Option<FileReport> {
        if cancel.is_cancelled() {
            return None;
        }
        let mut report = FileReport::default();

        let stream = tokenize(content);
        for error in &stream.errors {
            report.diagnostics.push(
                Diagnostic::new(DiagnosticKind::LexError, file_path, error.kind.to_string())
                    .with_position(error.position.line, error.position.column),
            );
        }
        if cancel.is_cancelled() {
            return None;
        }

        let tree = if stream.has_errors() {
            tracing::debug!(
                "skipping structural parse of {}: {} lex errors",
                file_path.display(),
                stream.errors.len()
            );
            None
        } else {
            let outcome = parse(&stream);
            for error in &outcome.errors {
                report.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::ParseError,
                        file_path,
                        format!("{}: {}", error.kind, error.message),
                    )
                    .with_position(error.position.line, error.position.column),
                );
            }
            Some(outcome.tree)
        };
        if cancel.is_cancelled() {
            return None;
        }

        let significant = stream.significant();
        let ctx = RuleContext {
            file: file_path,
            source: content,
            tokens: &stream.tokens,
            significant: &significant,
            tree: tree.as_ref(),
            symbols: self.engine.symbols(),
        };
        report.violations = self.engine.run(&ctx);

        tracing::debug!(
            "{}: {} violations, {} diagnostics",
            file_path.display(),
            report.violations.len(),
            report.diagnostics.len()
        );
        Some(report)
    }

    fn handles_file(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(source: &str) -> FileReport {
        CSharpAnalyzer::with_defaults()
            .unwrap()
            .analyze(Path::new("Test.cs"), source, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_clean_file() {
        let report = analyze("namespace Shop\n{\n    public class OrderService\n    {\n        private int _count;\n    }\n}\n");
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn test_lex_error_keeps_token_rules() {
        let report = analyze("public class dataService { void M() { a(); b(); } }\nstring s = \"open;\n");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind(), DiagnosticKind::LexError);
        assert_eq!(report.diagnostics[0].message(), "unterminated string literal");
        // the naming rule needs the scope tree, the statement rule does not
        assert!(report.violations.iter().all(|v| v.rule_id() == "OneStatementPerLine"));
        assert_eq!(report.violations.len(), 1);
    }

    #[test]
    fn test_parse_error_is_reported_with_other_violations() {
        let report = analyze("public class dataService\n{\n    public void Run(\n");
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.kind() == DiagnosticKind::ParseError));
        assert!(report.violations.iter().any(|v| v.rule_id() == "PascalCaseType"));
    }

    #[test]
    fn test_cancelled_file_produces_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let analyzer = CSharpAnalyzer::with_defaults().unwrap();
        assert!(analyzer.analyze(Path::new("A.cs"), "class a {}", &token).is_none());
    }

    #[test]
    fn test_handles_only_csharp_files() {
        let analyzer = CSharpAnalyzer::with_defaults().unwrap();
        assert!(analyzer.handles_file(Path::new("src/Service.cs")));
        assert!(analyzer.handles_file(Path::new("LEGACY.CS")));
        assert!(!analyzer.handles_file(Path::new("build.csproj")));
    }
}
