//! Configuration loading for lintcs
//!
//! Architecture: Anti-Corruption Layer - configuration translates external YAML into rule selections
//! - Raw YAML structures are converted to clean domain objects before analysis starts
//! - Rule defaults live with the rules; the file only records overrides
//! - Problems that do not prevent a run become warnings, everything else is a configuration error

use crate::domain::violations::{Diagnostic, DiagnosticKind, LintError, LintResult, Severity};
use crate::rules::{RuleId, RuleSelection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration versions this build understands
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// File names looked up when no configuration is given explicitly
pub const DEFAULT_CONFIG_FILES: &[&str] = &["lintcs.yaml", "lintcs.yml", ".lintcs.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,
    /// Path filtering configuration
    #[serde(default)]
    pub paths: PathConfig,
    /// Per-rule overrides keyed by rule id
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
    /// File the configuration was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Path filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Include/exclude patterns (gitignore-style, `!` re-includes)
    #[serde(default = "default_path_patterns")]
    pub patterns: Vec<String>,
    /// Ignore file name looked up in analyzed directories; empty disables it
    #[serde(default = "default_ignore_file")]
    pub ignore_file: Option<String>,
}

/// Overrides for a single rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub severity: Option<Severity>,
    /// Replacement regex for naming rules
    pub pattern: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
            pattern: None,
        }
    }
}

/// Effective settings of one rule after applying overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSettings {
    pub enabled: bool,
    pub severity: Severity,
    pub pattern: Option<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            patterns: default_path_patterns(),
            ignore_file: default_ignore_file(),
        }
    }
}

impl StyleConfig {
    /// Load configuration from a YAML (or JSON) file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> LintResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LintError::config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        let mut config = Self::parse(&contents)
            .map_err(|e| LintError::config(format!("Failed to parse config file '{}': {}", path.display(), e)))?;
        config.source = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> LintResult<Self> {
        let config = Self::parse(content)
            .map_err(|e| LintError::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document is a valid, all-defaults configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// First default configuration file present in `dir`
    pub fn find_default_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Load `explicit` if given, else a default file from `dir`, else the built-in defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> LintResult<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => match Self::find_default_file(dir) {
                Some(path) => {
                    tracing::debug!("using configuration {}", path.display());
                    Self::load_from_file(path)
                }
                None => Ok(Self::default()),
            },
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> LintResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(LintError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {}",
                self.version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        for pattern in &self.paths.patterns {
            let glob_text = pattern.trim_start_matches('!').trim_matches('/');
            glob::Pattern::new(glob_text)
                .map_err(|e| LintError::config(format!("Invalid path pattern '{pattern}': {e}")))?;
        }

        for (name, rule) in &self.rules {
            let Ok(id) = name.parse::<RuleId>() else {
                continue;
            };
            if let (true, Some(pattern)) = (id.is_naming_rule(), &rule.pattern) {
                regex::Regex::new(pattern).map_err(|e| {
                    LintError::config(format!("Invalid regex pattern for rule '{name}': {e}"))
                })?;
            }
        }

        Ok(())
    }

    /// Problems that do not stop the run
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (name, rule) in &self.rules {
            match name.parse::<RuleId>() {
                Err(_) => warnings.push(format!("unknown rule '{name}' ignored")),
                Ok(id) if rule.pattern.is_some() && !id.is_naming_rule() => {
                    warnings.push(format!("rule '{name}' does not take a pattern; it is ignored"))
                }
                Ok(_) => {}
            }
        }
        warnings
    }

    /// Warnings as report diagnostics attributed to the configuration file
    pub fn warning_diagnostics(&self) -> Vec<Diagnostic> {
        let file = self
            .source
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));
        self.warnings()
            .into_iter()
            .map(|message| Diagnostic::new(DiagnosticKind::ConfigWarning, file.clone(), message))
            .collect()
    }

    /// Effective settings for a rule
    pub fn rule_settings(&self, id: RuleId) -> RuleSettings {
        match self.rules.get(id.as_str()) {
            Some(rule) => RuleSettings {
                enabled: rule.enabled,
                severity: rule.severity.unwrap_or_else(|| id.default_severity()),
                pattern: rule.pattern.clone().filter(|_| id.is_naming_rule()),
            },
            None => RuleSettings {
                enabled: true,
                severity: id.default_severity(),
                pattern: None,
            },
        }
    }

    /// Enabled rules with their effective settings, in registry order
    pub fn rule_selection(&self) -> Vec<RuleSelection> {
        RuleId::ALL
            .into_iter()
            .filter_map(|id| {
                let settings = self.rule_settings(id);
                settings.enabled.then(|| RuleSelection {
                    id,
                    severity: settings.severity,
                    pattern: settings.pattern,
                })
            })
            .collect()
    }

    /// Convert to YAML for display
    pub fn to_yaml(&self) -> LintResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LintError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the configuration for cache validation
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.version.hash(&mut hasher);
        self.paths.patterns.hash(&mut hasher);
        self.paths.ignore_file.hash(&mut hasher);

        // Effective settings, so spelling a default out explicitly does not invalidate the cache
        for selection in self.rule_selection() {
            selection.id.as_str().hash(&mut hasher);
            selection.severity.hash(&mut hasher);
            selection.pattern.hash(&mut hasher);
        }

        format!("{:x}", hasher.finish())
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: PathConfig::default(),
            rules: BTreeMap::new(),
            source: None,
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_path_patterns() -> Vec<String> {
    vec![
        // Build output and VCS metadata
        "**/bin/**".to_string(),
        "**/obj/**".to_string(),
        "**/.git/**".to_string(),
    ]
}

fn default_ignore_file() -> Option<String> {
    Some(".lintcsignore".to_string())
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: StyleConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: StyleConfig::default(),
        }
    }

    /// Add a path pattern
    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.paths.patterns.push(pattern.into());
        self
    }

    /// Set the ignore file name
    pub fn ignore_file(mut self, filename: impl Into<String>) -> Self {
        self.config.paths.ignore_file = Some(filename.into());
        self
    }

    pub fn disable_rule(mut self, id: RuleId) -> Self {
        self.config.rules.entry(id.as_str().to_string()).or_default().enabled = false;
        self
    }

    pub fn rule_severity(mut self, id: RuleId, severity: Severity) -> Self {
        self.config.rules.entry(id.as_str().to_string()).or_default().severity = Some(severity);
        self
    }

    pub fn rule_pattern(mut self, id: RuleId, pattern: impl Into<String>) -> Self {
        self.config.rules.entry(id.as_str().to_string()).or_default().pattern = Some(pattern.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> LintResult<StyleConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_enable_every_rule() {
        let config = StyleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rule_selection().len(), RuleId::ALL.len());
        assert_eq!(config.paths.ignore_file.as_deref(), Some(".lintcsignore"));
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_rule_overrides() {
        let config = StyleConfig::load_from_str(
            r#"
version: "1.0"
rules:
  PascalCaseType: { enabled: true, severity: error }
  VarApparentType: { enabled: false }
  StaticFieldPrefix: { pattern: "^(s_)?[a-z][A-Za-z0-9]*$" }
"#,
        )
        .unwrap();

        assert_eq!(config.rule_settings(RuleId::PascalCaseType).severity, Severity::Error);
        assert!(!config.rule_settings(RuleId::VarApparentType).enabled);
        assert_eq!(
            config.rule_settings(RuleId::StaticFieldPrefix).pattern.as_deref(),
            Some("^(s_)?[a-z][A-Za-z0-9]*$")
        );

        let selection = config.rule_selection();
        assert_eq!(selection.len(), RuleId::ALL.len() - 1);
        assert!(selection.iter().all(|s| s.id != RuleId::VarApparentType));
        // paths section omitted entirely: defaults apply
        assert!(config.paths.patterns.contains(&"**/obj/**".to_string()));
    }

    #[test]
    fn test_unknown_rules_are_warnings() {
        let config = StyleConfig::load_from_str(
            "rules:\n  NoSuchRule: { enabled: false }\n  OneStatementPerLine: { pattern: \"x\" }\n",
        )
        .unwrap();
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.contains("NoSuchRule")));

        let diagnostics = config.warning_diagnostics();
        assert!(diagnostics.iter().all(|d| d.kind() == DiagnosticKind::ConfigWarning));
        assert_eq!(config.rule_settings(RuleId::OneStatementPerLine).pattern, None);
    }

    #[test]
    fn test_configuration_errors() {
        assert!(StyleConfig::load_from_str("version: \"2.0\"").is_err());
        assert!(StyleConfig::load_from_str("rules: [unclosed").is_err());
        assert!(StyleConfig::load_from_str("paths:\n  patterns: [\"[invalid\"]\n").is_err());
        assert!(
            StyleConfig::load_from_str("rules:\n  PascalCaseType: { pattern: \"([\" }\n").is_err()
        );
    }

    #[test]
    fn test_json_and_empty_documents() {
        let config = StyleConfig::load_from_str(r#"{"rules": {"InterfacePrefix": {"severity": "info"}}}"#).unwrap();
        assert_eq!(config.rule_settings(RuleId::InterfacePrefix).severity, Severity::Info);
        assert!(StyleConfig::load_from_str("").is_ok());
    }

    #[test]
    fn test_fingerprint_tracks_effective_settings() {
        let base = StyleConfig::default();
        let explicit = StyleConfig::load_from_str("rules:\n  PascalCaseType: { enabled: true }\n").unwrap();
        let changed = ConfigBuilder::new()
            .rule_severity(RuleId::PascalCaseType, Severity::Error)
            .build()
            .unwrap();

        assert_eq!(base.fingerprint(), base.fingerprint());
        assert_eq!(base.fingerprint(), explicit.fingerprint());
        assert_ne!(base.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_discover_default_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(StyleConfig::find_default_file(temp_dir.path()).is_none());

        fs::write(temp_dir.path().join("lintcs.yml"), "rules:\n  PascalCaseType: { severity: error }\n").unwrap();
        let config = StyleConfig::discover(None, temp_dir.path()).unwrap();
        assert_eq!(config.rule_settings(RuleId::PascalCaseType).severity, Severity::Error);
        assert_eq!(config.source.as_deref(), Some(temp_dir.path().join("lintcs.yml").as_path()));

        let missing = temp_dir.path().join("missing.yaml");
        assert!(StyleConfig::discover(Some(&missing), temp_dir.path()).is_err());
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new()
            .add_path_pattern("**/Generated/**")
            .ignore_file(".customignore")
            .disable_rule(RuleId::OneStatementPerLine)
            .rule_pattern(RuleId::CamelCaseParameter, "^[a-z]+$")
            .build()
            .unwrap();
        assert!(config.paths.patterns.contains(&"**/Generated/**".to_string()));
        assert!(!config.rule_settings(RuleId::OneStatementPerLine).enabled);
        assert!(ConfigBuilder::new().rule_pattern(RuleId::PascalCaseType, "(").build().is_err());
    }
}
