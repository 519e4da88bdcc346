//! Main analysis orchestrator for lintcs
//!
//! CDD Principle: Domain Services - Analyzer orchestrates multi-file validation runs
//! - Coordinates path discovery, per-file pipelines and result aggregation
//! - Files run in parallel; each worker folds into its own buffer and buffers merge at the end
//! - Cancellation is cooperative and leaves completed files in the report

pub mod csharp;
pub mod path_filter;

pub use csharp::CSharpAnalyzer;
pub use path_filter::PathFilter;

use crate::cache::{content_hash, FileCache};
use crate::config::StyleConfig;
use crate::domain::violations::{
    Diagnostic, DiagnosticKind, FileReport, LintError, LintResult, ValidationReport,
};
use crate::rules::{ProjectSymbols, RuleEngine, RuleId};
use rayon::prelude::*;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared flag asking a running analysis to stop
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options for customizing analysis behavior
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Whether to use parallel processing
    pub parallel: bool,
    /// Worker count; defaults to the available parallelism
    pub jobs: Option<usize>,
    /// Maximum number of files to analyze
    pub max_files: Option<usize>,
    /// Additional patterns to exclude for this run
    pub exclude_patterns: Vec<String>,
    /// Whether to skip .lintcsignore files
    pub ignore_ignore_files: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: None,
            max_files: None,
            exclude_patterns: Vec::new(),
            ignore_ignore_files: false,
        }
    }
}

impl AnalysisOptions {
    /// Size of the worker pool
    pub fn worker_count(&self) -> usize {
        self.jobs.filter(|&jobs| jobs > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

/// Trait for per-language file analyzers
pub trait FileAnalyzer: Send + Sync {
    /// Analyze one file's content; `None` when cancelled part-way
    fn analyze(&self, file_path: &Path, content: &str, cancel: &CancellationToken) -> Option<FileReport>;

    /// Check if this analyzer handles the given file type
    fn handles_file(&self, file_path: &Path) -> bool;
}

/// Per-worker accumulator, merged after the parallel phase
struct Batch<T> {
    items: Vec<T>,
    cancelled: bool,
}

impl<T> Batch<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            cancelled: false,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.items.extend(other.items);
        self.cancelled |= other.cancelled;
        self
    }
}

/// What happened to one file in a cached run
enum CachedOutcome {
    Hit(FileReport),
    Fresh {
        path: PathBuf,
        hash: String,
        report: FileReport,
    },
    Unreadable(FileReport),
}

/// Read a source file; failures become an IoError report for that file
fn read_source(path: &Path) -> Result<String, FileReport> {
    let bytes = fs::read(path).map_err(|e| {
        tracing::warn!("Failed to read {}: {}", path.display(), e);
        FileReport::from_diagnostic(Diagnostic::new(
            DiagnosticKind::IoError,
            path,
            format!("failed to read file: {e}"),
        ))
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{} is not valid UTF-8; decoding lossily", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(without_bom) => without_bom.to_string(),
        None => text,
    })
}

/// Main analyzer that orchestrates the entire validation process
pub struct Analyzer {
    config: StyleConfig,
    path_filter: PathFilter,
    csharp: CSharpAnalyzer,
    cancel: CancellationToken,
}

impl Analyzer {
    /// Create a new analyzer with the given configuration
    pub fn new(config: StyleConfig) -> LintResult<Self> {
        config.validate()?;
        for warning in config.warnings() {
            tracing::warn!("Configuration: {}", warning);
        }

        let path_filter = PathFilter::new(config.paths.patterns.clone(), config.paths.ignore_file.clone())
            .map_err(|e| LintError::config(format!("Failed to create path filter: {e}")))?;
        let engine = RuleEngine::new(&config.rule_selection())?;

        Ok(Self {
            config,
            path_filter,
            csharp: CSharpAnalyzer::new(engine),
            cancel: CancellationToken::new(),
        })
    }

    /// Create an analyzer with default configuration
    pub fn with_defaults() -> LintResult<Self> {
        Self::new(StyleConfig::default())
    }

    /// Use a project-wide symbol table for using-directive ambiguity
    pub fn with_symbols(mut self, symbols: Arc<dyn ProjectSymbols>) -> Self {
        self.csharp = self.csharp.with_symbols(symbols);
        self
    }

    /// Share an externally controlled cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Rules this analyzer runs, in registry order
    pub fn enabled_rules(&self) -> Vec<RuleId> {
        self.csharp.engine().enabled_rules().collect()
    }

    /// Get configuration fingerprint for cache validation
    pub fn config_fingerprint(&self) -> String {
        self.config.fingerprint()
    }

    /// Analyze in-memory source as if it were `file_path`
    pub fn analyze_source(&self, file_path: &Path, content: &str) -> Option<FileReport> {
        self.csharp.analyze(file_path, content, &self.cancel)
    }

    /// Read and analyze a single file; unreadable files yield an IoError diagnostic
    pub fn analyze_file<P: AsRef<Path>>(&self, file_path: P) -> Option<FileReport> {
        let file_path = file_path.as_ref();
        match read_source(file_path) {
            Ok(content) => self.analyze_source(file_path, &content),
            Err(report) => Some(report),
        }
    }

    /// Files selected by `paths` and `options`, plus diagnostics for unusable paths
    pub fn collect_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<(Vec<PathBuf>, Vec<Diagnostic>)> {
        let mut filter = self.path_filter.clone();
        if options.ignore_ignore_files {
            filter = filter.without_ignore_files();
        }
        for pattern in &options.exclude_patterns {
            filter.add_pattern(pattern)?;
        }

        let mut files = Vec::new();
        let mut diagnostics = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                files.extend(filter.find_files(path)?);
            } else if path.is_file() {
                if !self.csharp.handles_file(path) {
                    tracing::warn!("Skipping {}: not a C# source file", path.display());
                    continue;
                }
                let root = path.parent().unwrap_or_else(|| Path::new(""));
                if filter.should_analyze(root, path)? {
                    files.push(path.to_path_buf());
                }
            } else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::IoError,
                    path,
                    "path does not exist or is not accessible",
                ));
            }
        }

        files.sort();
        files.dedup();
        if let Some(max_files) = options.max_files {
            files.truncate(max_files);
        }
        Ok((files, diagnostics))
    }

    /// Analyze files and directories and return a complete validation report
    pub fn analyze_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
    ) -> LintResult<ValidationReport> {
        let start_time = Instant::now();
        let (files, diagnostics) = self.collect_files(paths, options)?;
        tracing::debug!("analyzing {} files", files.len());

        let batch = self.run_files(&files, options, |path| self.analyze_file(path))?;
        let completed = batch.items.len();
        Ok(self.finish(batch.items, completed, batch.cancelled, diagnostics, start_time))
    }

    /// Like [`Analyzer::analyze_paths`], replaying cached results for unchanged files
    pub fn analyze_paths_cached<P: AsRef<Path>>(
        &self,
        paths: &[P],
        options: &AnalysisOptions,
        cache: &mut FileCache,
    ) -> LintResult<ValidationReport> {
        let start_time = Instant::now();
        let (files, diagnostics) = self.collect_files(paths, options)?;
        let fingerprint = self.config_fingerprint();

        let lookup = &*cache;
        let batch = self.run_files(&files, options, |path| {
            let content = match read_source(path) {
                Ok(content) => content,
                Err(report) => return Some(CachedOutcome::Unreadable(report)),
            };
            let hash = content_hash(&content);
            if let Some(report) = lookup.lookup(path, &hash, &fingerprint) {
                return Some(CachedOutcome::Hit(report));
            }
            self.analyze_source(path, &content).map(|report| CachedOutcome::Fresh {
                path: path.to_path_buf(),
                hash,
                report,
            })
        })?;

        let completed = batch.items.len();
        let mut reports = Vec::with_capacity(completed);
        for outcome in batch.items {
            match outcome {
                CachedOutcome::Hit(report) => {
                    cache.record_hit();
                    reports.push(report);
                }
                CachedOutcome::Fresh { path, hash, report } => {
                    cache.store(&path, hash, &fingerprint, report.clone());
                    reports.push(report);
                }
                CachedOutcome::Unreadable(report) => reports.push(report),
            }
        }
        Ok(self.finish(reports, completed, batch.cancelled, diagnostics, start_time))
    }

    /// Run `analyze` over every file, stopping early when cancelled
    fn run_files<T, F>(&self, files: &[PathBuf], options: &AnalysisOptions, analyze: F) -> LintResult<Batch<T>>
    where
        T: Send,
        F: Fn(&Path) -> Option<T> + Sync,
    {
        let step = |mut batch: Batch<T>, path: &PathBuf| {
            if self.cancel.is_cancelled() {
                batch.cancelled = true;
                return batch;
            }
            match analyze(path) {
                Some(item) => batch.items.push(item),
                None => batch.cancelled = true,
            }
            batch
        };

        if options.parallel && files.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.worker_count())
                .build()
                .map_err(|e| LintError::analysis("worker pool", e.to_string()))?;
            Ok(pool.install(|| {
                files
                    .par_iter()
                    .fold(Batch::empty, step)
                    .reduce(Batch::empty, Batch::merge)
            }))
        } else {
            Ok(files.iter().fold(Batch::empty(), step))
        }
    }

    fn finish(
        &self,
        reports: Vec<FileReport>,
        completed: usize,
        cancelled: bool,
        diagnostics: Vec<Diagnostic>,
        start_time: Instant,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        for diagnostic in self.config.warning_diagnostics().into_iter().chain(diagnostics) {
            report.add_diagnostic(diagnostic);
        }
        for file in reports {
            report.add_file_report(file);
        }
        if cancelled {
            tracing::warn!("Analysis cancelled after {} files", completed);
            report.mark_cancelled();
        }

        report.set_files_analyzed(completed);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config_fingerprint());
        report.sort_violations();

        tracing::info!(
            "Analyzed {} files: {} violations, {} diagnostics",
            completed,
            report.violations.len(),
            report.diagnostics.len()
        );
        report
    }
}
