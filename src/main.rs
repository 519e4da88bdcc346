//! lintcs CLI - Command-line interface for C# style-convention checks
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates arguments into configuration, analysis options and report options
//! - Owns process concerns: exit codes, Ctrl-C, terminal detection and logging setup
//! - Reports go to stdout, logs to stderr

use clap::{Args, Parser, Subcommand, ValueEnum};
use lintcs::cache::DEFAULT_CACHE_FILE;
use lintcs::config::DEFAULT_CONFIG_FILES;
use lintcs::rules::{self, naming};
use lintcs::{
    AnalysisOptions, FileCache, LintError, LintResult, OutputFormat, ReportFormatter,
    ReportOptions, RuleId, Severity, StyleConfig, StyleValidator,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

/// lintcs - C# style-convention linter
#[derive(Parser)]
#[command(name = "lintcs")]
#[command(version)]
#[command(about = "Checks C# sources against naming, layout and declaration conventions")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    check: CheckArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Args, Clone)]
struct CheckArgs {
    /// Files or directories to check (defaults to the current directory).
    /// A path named like a subcommand needs `lintcs check <path>` or a `./` prefix
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormatArg,

    /// Lowest violation severity that makes the run fail
    #[arg(long, value_enum, default_value = "warning")]
    severity_threshold: SeverityArg,

    /// Additional exclude patterns
    #[arg(long, action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Ignore .lintcsignore files
    #[arg(long)]
    no_ignore: bool,

    /// Disable parallel processing
    #[arg(long)]
    no_parallel: bool,

    /// Number of worker threads
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Reuse results for unchanged files
    #[arg(long)]
    cache: bool,

    /// Custom cache file path
    #[arg(long)]
    cache_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files and directories (the default when no subcommand is given)
    Check(CheckArgs),

    /// List available rules
    Rules {
        /// Show only enabled rules
        #[arg(long)]
        enabled_only: bool,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Watch for file changes and run checks automatically
    Watch {
        /// Path to watch (defaults to current directory)
        path: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Inspect or reset the result cache
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cache statistics
    Stats {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },

    /// Clear the cache
    Clear {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },

    /// Clean up entries for deleted files
    Cleanup {
        /// Cache file path
        #[arg(long)]
        cache_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq, Eq, Debug)]
enum OutputFormatArg {
    Text,
    Json,
    Sarif,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
            OutputFormatArg::Github => OutputFormat::Github,
        }
    }
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

async fn run_command(cli: Cli) -> LintResult<i32> {
    let use_colors = !cli.no_color && std::io::stdout().is_terminal();
    match cli.command {
        None => run_check(cli.check, cli.config.as_deref(), use_colors).await,
        Some(Commands::Check(args)) => run_check(args, cli.config.as_deref(), use_colors).await,
        Some(Commands::Rules { enabled_only }) => run_list_rules(cli.config.as_deref(), enabled_only),
        Some(Commands::Explain { rule_id }) => run_explain(&rule_id),
        Some(Commands::ValidateConfig { config_file }) => {
            run_validate_config(config_file.as_deref().or(cli.config.as_deref()))
        }
        Some(Commands::Watch { path, delay }) => {
            let config_path = cli.config.clone();
            let watch_path = path.unwrap_or_else(|| PathBuf::from("."));
            tokio::task::spawn_blocking(move || {
                run_watch(&watch_path, config_path.as_deref(), delay, use_colors)
            })
            .await
            .map_err(|e| LintError::analysis("watch", e.to_string()))?
        }
        Some(Commands::Cache { action }) => run_cache_command(action),
    }
}

/// Configuration from `--config`, else a default file in the working directory
fn load_config(config_path: Option<&Path>) -> LintResult<StyleConfig> {
    let cwd = std::env::current_dir()?;
    StyleConfig::discover(config_path, &cwd)
}

fn analysis_options(args: &CheckArgs) -> AnalysisOptions {
    AnalysisOptions {
        parallel: !args.no_parallel,
        jobs: args.jobs,
        exclude_patterns: args.exclude.clone(),
        ignore_ignore_files: args.no_ignore,
        ..Default::default()
    }
}

async fn run_check(args: CheckArgs, config_path: Option<&Path>, use_colors: bool) -> LintResult<i32> {
    let config = load_config(config_path)?;
    let mut validator = StyleValidator::new_with_config(config)?.with_report_formatter(
        ReportFormatter::new(ReportOptions {
            use_colors,
            ..Default::default()
        }),
    );

    if args.cache {
        let cache_path = args
            .cache_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE));
        validator = validator.with_cache(cache_path)?;
    }

    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };

    let token = validator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing files in progress...");
            token.cancel();
        }
    });

    let result = validator.validate(&paths, &analysis_options(&args)).await;
    interrupt.abort();
    let report = result?;

    let format: OutputFormat = args.format.into();
    let formatted = validator.format_report(&report, format)?;
    print!("{formatted}");

    if format == OutputFormat::Text {
        if let Some(stats) = validator.cache_statistics() {
            eprintln!("{}", stats.format_display());
        }
    }

    Ok(report.exit_code(args.severity_threshold.into()))
}

fn run_watch(watch_path: &Path, config_path: Option<&Path>, delay_ms: u64, use_colors: bool) -> LintResult<i32> {
    use notify::{Event, RecursiveMode, Result as NotifyResult, Watcher};
    use std::sync::mpsc;

    eprintln!("Watching {} (Ctrl+C to stop)", watch_path.display());

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
        Ok(event) => {
            if tx.send(event).is_err() {
                tracing::debug!("watch channel closed");
            }
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    })
    .map_err(|e| LintError::config(format!("Failed to create file watcher: {e}")))?;

    watcher.watch(watch_path, RecursiveMode::Recursive).map_err(|e| {
        LintError::config(format!("Failed to watch path '{}': {}", watch_path.display(), e))
    })?;

    let debounce = Duration::from_millis(delay_ms);
    run_watch_analysis(watch_path, config_path, use_colors);

    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => {
                tracing::warn!("File watcher disconnected");
                break;
            }
        };
        if !should_trigger_analysis(&event) {
            continue;
        }

        // Let a burst of saves settle, then drain it
        std::thread::sleep(debounce);
        while rx.try_recv().is_ok() {}

        print!("\x1B[2J\x1B[H");
        run_watch_analysis(watch_path, config_path, use_colors);
    }

    Ok(0)
}

/// Whether a file system event touches C# sources or a configuration file
fn should_trigger_analysis(event: &notify::Event) -> bool {
    use notify::EventKind;

    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
        return false;
    }

    event.paths.iter().any(|path| {
        let is_source = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cs"));
        let is_config = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| DEFAULT_CONFIG_FILES.contains(&name));
        is_source || is_config
    })
}

/// One watch-mode pass; the configuration is reloaded every time
fn run_watch_analysis(watch_path: &Path, config_path: Option<&Path>, use_colors: bool) {
    let mut validator = match load_config(config_path).and_then(StyleValidator::new_with_config) {
        Ok(validator) => validator.with_report_formatter(ReportFormatter::new(ReportOptions {
            use_colors,
            ..Default::default()
        })),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return;
        }
    };

    match validator
        .validate_blocking(&[watch_path], &AnalysisOptions::default())
        .and_then(|report| validator.format_report(&report, OutputFormat::Text))
    {
        Ok(formatted) => print!("{formatted}"),
        Err(e) => eprintln!("Analysis error: {e}"),
    }
}

fn run_validate_config(config_path: Option<&Path>) -> LintResult<i32> {
    let cwd = std::env::current_dir()?;
    let config_path = match config_path {
        Some(path) => path.to_path_buf(),
        None => match StyleConfig::find_default_file(&cwd) {
            Some(path) => path,
            None => {
                eprintln!(
                    "No configuration file found (looked for {})",
                    DEFAULT_CONFIG_FILES.join(", ")
                );
                return Ok(2);
            }
        },
    };

    println!("Validating configuration: {}", config_path.display());

    match StyleConfig::load_from_file(&config_path) {
        Ok(config) => {
            let enabled = config.rule_selection().len();
            println!("Configuration is valid");
            println!("  Rules: {} total, {} enabled", RuleId::ALL.len(), enabled);
            println!("  Path patterns: {}", config.paths.patterns.len());
            for warning in config.warnings() {
                println!("  warning: {warning}");
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            Ok(2)
        }
    }
}

fn run_explain(rule_id: &str) -> LintResult<i32> {
    let Ok(id) = rule_id.parse::<RuleId>() else {
        eprintln!("Rule '{rule_id}' not found");
        eprintln!();
        eprintln!("Available rules:");
        for id in RuleId::ALL {
            eprintln!("  - {id}");
        }
        return Ok(1);
    };

    let rule = rules::build_rule(id, None)?;
    println!("Rule: {id}");
    println!("Default severity: {}", id.default_severity());
    println!("Applies to: {}", rule.applies_to());
    println!();
    println!("{}", rule.description());
    if let Some(pattern) = naming::default_pattern(id) {
        println!();
        println!("Pattern: {pattern}");
        println!("(override with `rules.{id}.pattern` in the configuration)");
    }
    Ok(0)
}

fn run_cache_command(action: CacheCommands) -> LintResult<i32> {
    let default_path = || PathBuf::from(DEFAULT_CACHE_FILE);
    match action {
        CacheCommands::Stats { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(default_path);
            if !cache_path.exists() {
                println!("No cache file found at {}", cache_path.display());
                return Ok(1);
            }

            let stats = FileCache::open(&cache_path)?.statistics();
            println!("Cache statistics");
            println!("  File: {}", cache_path.display());
            println!("  {}", stats.format_display());
            println!("  Created: {}", stats.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Updated: {}", stats.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
            Ok(0)
        }
        CacheCommands::Clear { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(default_path);
            FileCache::new(&cache_path).clear()?;
            println!("Cache cleared: {}", cache_path.display());
            Ok(0)
        }
        CacheCommands::Cleanup { cache_file } => {
            let cache_path = cache_file.unwrap_or_else(default_path);
            if !cache_path.exists() {
                println!("No cache file found at {}", cache_path.display());
                return Ok(1);
            }

            let mut cache = FileCache::open(&cache_path)?;
            let removed = cache.cleanup();
            cache.save()?;
            println!("Removed {removed} stale cache entries");
            Ok(0)
        }
    }
}

fn run_list_rules(config_path: Option<&Path>, enabled_only: bool) -> LintResult<i32> {
    let config = load_config(config_path)?;

    for rule in rules::all_rules()? {
        let settings = config.rule_settings(rule.id());
        if enabled_only && !settings.enabled {
            continue;
        }
        let status = if settings.enabled { "on " } else { "off" };
        println!(
            "{} {:<26} [{}] {}",
            status,
            rule.id().as_str(),
            settings.severity,
            rule.description()
        );
    }
    Ok(0)
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn check_args(paths: Vec<PathBuf>) -> CheckArgs {
        CheckArgs {
            paths,
            format: OutputFormatArg::Json,
            severity_threshold: SeverityArg::Warning,
            exclude: Vec::new(),
            no_ignore: false,
            no_parallel: true,
            jobs: None,
            cache: false,
            cache_file: None,
        }
    }

    #[tokio::test]
    async fn test_check_command_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        let dirty = temp_dir.path().join("Dirty.cs");
        let clean = temp_dir.path().join("Clean.cs");
        fs::write(&dirty, "public class dataService {}\n").unwrap();
        fs::write(&clean, "public class DataService {}\n").unwrap();
        let config = temp_dir.path().join("lintcs.yaml");
        fs::write(&config, "version: \"1.0\"\n").unwrap();

        let result = run_check(check_args(vec![dirty.clone()]), Some(config.as_path()), false).await;
        assert_eq!(result.unwrap(), 1);

        let result = run_check(check_args(vec![clean]), Some(config.as_path()), false).await;
        assert_eq!(result.unwrap(), 0);

        let mut lenient = check_args(vec![dirty]);
        lenient.severity_threshold = SeverityArg::Error;
        assert_eq!(run_check(lenient, Some(config.as_path()), false).await.unwrap(), 0);

        let missing = check_args(vec![temp_dir.path().join("Missing.cs")]);
        assert_eq!(run_check(missing, Some(config.as_path()), false).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_check_command_rejects_bad_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("lintcs.yaml");
        fs::write(&config, "version: \"9.9\"\n").unwrap();

        let result = run_check(check_args(vec![temp_dir.path().to_path_buf()]), Some(config.as_path()), false).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("lintcs.yaml");
        fs::write(&config_file, StyleConfig::default().to_yaml().unwrap()).unwrap();
        assert_eq!(run_validate_config(Some(config_file.as_path())).unwrap(), 0);

        fs::write(&config_file, "rules: [not, a, map]\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file.as_path())).unwrap(), 2);
    }

    #[test]
    fn test_explain_rule() {
        assert_eq!(run_explain("PascalCaseType").unwrap(), 0);
        assert_eq!(run_explain("ShortCircuitOperator").unwrap(), 0);
        assert_eq!(run_explain("todo_comments").unwrap(), 1);
    }

    #[test]
    fn test_list_rules() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("lintcs.yaml");
        fs::write(&config, "rules:\n  VarApparentType: { enabled: false }\n").unwrap();

        assert_eq!(run_list_rules(Some(config.as_path()), false).unwrap(), 0);
        assert_eq!(run_list_rules(Some(config.as_path()), true).unwrap(), 0);
    }

    #[test]
    fn test_cache_commands() {
        let temp_dir = TempDir::new().unwrap();
        let cache_file = temp_dir.path().join("cache.json");

        let stats = CacheCommands::Stats {
            cache_file: Some(cache_file.clone()),
        };
        assert_eq!(run_cache_command(stats).unwrap(), 1);

        let mut cache = FileCache::open(&cache_file).unwrap();
        cache.save().unwrap();

        let cleanup = CacheCommands::Cleanup {
            cache_file: Some(cache_file.clone()),
        };
        assert_eq!(run_cache_command(cleanup).unwrap(), 0);

        let clear = CacheCommands::Clear {
            cache_file: Some(cache_file.clone()),
        };
        assert_eq!(run_cache_command(clear).unwrap(), 0);
        assert!(!cache_file.exists());
    }

    #[test]
    fn test_watch_trigger_filter() {
        use notify::event::{CreateKind, EventKind, ModifyKind};

        let source = notify::Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("src/A.cs"));
        let config = notify::Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("lintcs.yaml"));
        let other = notify::Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("README.md"));
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("src/A.cs"));

        assert!(should_trigger_analysis(&source));
        assert!(should_trigger_analysis(&config));
        assert!(!should_trigger_analysis(&other));
        assert!(!should_trigger_analysis(&access));
    }

    #[test]
    fn test_cli_parses_default_check() {
        let cli = Cli::try_parse_from(["lintcs", "--format", "json", "--exclude", "gen/**", "src"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.check.format, OutputFormatArg::Json);
        assert_eq!(cli.check.paths, vec![PathBuf::from("src")]);

        let cli = Cli::try_parse_from(["lintcs", "explain", "InterfacePrefix"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Explain { .. })));
    }

    #[test]
    fn test_paths_named_like_subcommands() {
        let cli = Cli::try_parse_from(["lintcs", "check", "--format", "sarif", "watch"]).unwrap();
        let Some(Commands::Check(args)) = cli.command else {
            panic!("expected the check subcommand");
        };
        assert_eq!(args.paths, vec![PathBuf::from("watch")]);
        assert_eq!(args.format, OutputFormatArg::Sarif);

        let cli = Cli::try_parse_from(["lintcs", "./watch"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.check.paths, vec![PathBuf::from("./watch")]);

        let cli = Cli::try_parse_from(["lintcs", "watch"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Watch { .. })));
    }
}
