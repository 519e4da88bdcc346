//! lintcs - Style-convention linter for C# source code
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Syntax, rules and report formats are independent of files and terminals
//! - The analyzer and cache are the only layers that touch the file system
//! - `StyleValidator` bundles them for the CLI and for embedding in other tools

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod domain;
pub mod report;
pub mod rules;
pub mod syntax;

// Re-export main types for convenient access
pub use domain::violations::{
    Diagnostic, DiagnosticKind, FileReport, LintError, LintResult, Severity, ValidationReport,
    ValidationSummary, Violation,
};

pub use config::{ConfigBuilder, RuleSettings, StyleConfig};

pub use analyzer::{AnalysisOptions, Analyzer, CancellationToken};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use cache::{CacheStatistics, FileCache};

pub use rules::{NoProjectSymbols, ProjectSymbols, RuleId};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// High-level validator combining analysis, caching and reporting
pub struct StyleValidator {
    analyzer: Arc<Analyzer>,
    cache: Option<FileCache>,
    report_formatter: ReportFormatter,
}

impl StyleValidator {
    /// Create a validator from an already configured analyzer
    pub fn from_analyzer(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            cache: None,
            report_formatter: ReportFormatter::default(),
        }
    }

    /// Create a new validator with the given configuration
    pub fn new_with_config(config: StyleConfig) -> LintResult<Self> {
        Ok(Self::from_analyzer(Analyzer::new(config)?))
    }

    /// Create a validator with default configuration
    pub fn new() -> LintResult<Self> {
        Self::new_with_config(StyleConfig::default())
    }

    /// Create a validator loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        Self::new_with_config(StyleConfig::load_from_file(path)?)
    }

    /// Enable caching with the specified cache file
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_path: P) -> LintResult<Self> {
        self.cache = Some(FileCache::open(cache_path)?);
        Ok(self)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Token that stops a running validation; completed files stay in the report
    pub fn cancellation_token(&self) -> CancellationToken {
        self.analyzer.cancellation_token()
    }

    /// Validate files and directories on a blocking worker, saving the cache afterwards
    pub async fn validate<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<ValidationReport> {
        let analyzer = Arc::clone(&self.analyzer);
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let options = options.clone();
        let mut cache = self.cache.take();

        let (report, cache) = tokio::task::spawn_blocking(move || {
            let report = match cache.as_mut() {
                Some(cache) => analyzer.analyze_paths_cached(paths.as_slice(), &options, cache),
                None => analyzer.analyze_paths(paths.as_slice(), &options),
            };
            (report, cache)
        })
        .await
        .map_err(|e| LintError::analysis("validation task", e.to_string()))?;

        self.cache = cache;
        let report = report?;
        if let Err(e) = self.save_cache() {
            tracing::warn!("Failed to save cache: {}", e);
        }
        Ok(report)
    }

    /// Validate files and directories on the calling thread
    pub fn validate_blocking<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<ValidationReport> {
        let report = match self.cache.as_mut() {
            Some(cache) => self.analyzer.analyze_paths_cached(paths, options, cache)?,
            None => self.analyzer.analyze_paths(paths, options)?,
        };
        if let Err(e) = self.save_cache() {
            tracing::warn!("Failed to save cache: {}", e);
        }
        Ok(report)
    }

    /// Validate a single file
    pub fn validate_file<P: AsRef<Path>>(&self, file_path: P) -> LintResult<ValidationReport> {
        let options = AnalysisOptions {
            parallel: false,
            ..Default::default()
        };
        self.analyzer.analyze_paths(&[file_path.as_ref()], &options)
    }

    /// Validate in-memory source as if it were stored at `file_path`
    pub fn validate_source(&self, file_path: &Path, content: &str) -> Option<FileReport> {
        self.analyzer.analyze_source(file_path, content)
    }

    /// Format a validation report for output
    pub fn format_report(&self, report: &ValidationReport, format: OutputFormat) -> LintResult<String> {
        self.report_formatter.format_report(report, format)
    }

    /// Rules the configuration enables, in registry order
    pub fn enabled_rules(&self) -> Vec<RuleId> {
        self.analyzer.enabled_rules()
    }

    /// Get cache statistics (if caching is enabled)
    pub fn cache_statistics(&self) -> Option<CacheStatistics> {
        self.cache.as_ref().map(|c| c.statistics())
    }

    /// Clear cache (if enabled)
    pub fn clear_cache(&mut self) -> LintResult<()> {
        if let Some(cache) = &mut self.cache {
            cache.clear()?;
        }
        Ok(())
    }

    /// Save cache to disk (if enabled and modified)
    pub fn save_cache(&mut self) -> LintResult<()> {
        if let Some(cache) = &mut self.cache {
            cache.save()?;
        }
        Ok(())
    }

    /// Cleanup cache by removing entries for non-existent files
    pub fn cleanup_cache(&mut self) -> Option<usize> {
        self.cache.as_mut().map(FileCache::cleanup)
    }
}

/// Convenience function to create a validator with default settings
pub fn create_validator() -> LintResult<StyleValidator> {
    StyleValidator::new()
}

/// Convenience function to validate files with default settings
pub async fn validate_files<P: AsRef<Path>>(files: &[P]) -> LintResult<ValidationReport> {
    let mut validator = StyleValidator::new()?;
    validator.validate(files, &AnalysisOptions::default()).await
}

/// Convenience function to validate a directory with default settings
pub fn validate_directory<P: AsRef<Path>>(directory: P) -> LintResult<ValidationReport> {
    let validator = StyleValidator::new()?;
    validator
        .analyzer()
        .analyze_paths(&[directory.as_ref()], &AnalysisOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_files() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("DataService.cs");
        fs::write(&test_file, "public class dataService {}\n").unwrap();

        let report = validate_files(&[&test_file]).await.unwrap();

        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_id(), "PascalCaseType");
        assert_eq!(report.exit_code(Severity::Warning), 1);
        assert_eq!(report.exit_code(Severity::Error), 0);
    }

    #[tokio::test]
    async fn test_validate_with_cache_persists_entries() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join(".lintcs/cache.json");
        let source = temp_dir.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("Worker.cs"), "class Worker\n{\n    private int count;\n}\n").unwrap();

        let mut validator = StyleValidator::new().unwrap().with_cache(&cache_path).unwrap();
        let first = validator.validate(&[&source], &AnalysisOptions::default()).await.unwrap();
        let second = validator.validate(&[&source], &AnalysisOptions::default()).await.unwrap();

        assert!(cache_path.exists());
        assert_eq!(first.violations, second.violations);
        assert_eq!(first.violations[0].rule_id(), "CamelCaseUnderscoreField");

        let stats = validator.cache_statistics().unwrap();
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }

    #[test]
    fn test_single_file_validation() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("Queue.cs");
        fs::write(&test_file, "namespace N\n{\n    using Azure;\n}\n").unwrap();

        let validator = StyleValidator::new().unwrap();
        let report = validator.validate_file(&test_file).unwrap();

        assert_eq!(report.summary.total_files, 1);
        assert!(report.violations_for_rule("UsingOutsideNamespace").count() == 1);
    }

    #[test]
    fn test_validate_source_without_files() {
        let validator = StyleValidator::new().unwrap();
        let report = validator
            .validate_source(Path::new("Inline.cs"), "interface Repository {}\n")
            .unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule_id(), "InterfacePrefix");
    }

    #[test]
    fn test_disabled_rules_are_not_run() {
        let config = ConfigBuilder::new()
            .disable_rule(RuleId::PascalCaseType)
            .build()
            .unwrap();
        let validator = StyleValidator::new_with_config(config).unwrap();

        assert!(!validator.enabled_rules().contains(&RuleId::PascalCaseType));
        let report = validator
            .validate_source(Path::new("A.cs"), "public class dataService {}\n")
            .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_report_formatting() {
        let validator = StyleValidator::new().unwrap();
        let mut report = ValidationReport::new();
        report.add_file_report(
            validator
                .validate_source(Path::new("A.cs"), "public class dataService {}\n")
                .unwrap(),
        );

        let json = validator.format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["rule"], "PascalCaseType");
    }

    #[test]
    fn test_convenience_functions() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Clean.cs"), "public class Clean {}\n").unwrap();

        let validator = create_validator().unwrap();
        assert_eq!(validator.enabled_rules().len(), RuleId::ALL.len());

        let report = validate_directory(temp_dir.path()).unwrap();
        assert_eq!(report.summary.total_files, 1);
        assert!(!report.has_violations());
    }
}
