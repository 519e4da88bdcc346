//! Path filtering using .gitignore-style patterns
//!
//! Architectural Principle: Service Layer - PathFilter decides which C# files take part in a run
//! - Configured patterns apply in order, the last matching pattern wins, `!` re-includes
//! - `.lintcsignore` files found between the analyzed root and a file add further patterns
//! - Patterns match paths relative to the directory being walked

use crate::domain::violations::{LintError, LintResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of the files discovered in directories
const SOURCE_EXTENSION: &str = "cs";

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<FilterPattern>,
    /// Name of per-directory ignore files, when they are honored
    ignore_filename: Option<String>,
}

/// A single path filter pattern
#[derive(Debug, Clone)]
struct FilterPattern {
    pattern: glob::Pattern,
    /// `!pattern` re-includes what earlier patterns excluded
    is_include: bool,
    /// `/pattern` only matches from the root
    anchored: bool,
    /// `pattern/` only matches directories
    directory_only: bool,
    /// Patterns with an inner `/` match whole relative paths, others match single components
    has_separator: bool,
}

impl FilterPattern {
    fn parse(raw: &str) -> LintResult<Self> {
        let (is_include, rest) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };
        let anchored = rest.starts_with('/');
        let directory_only = rest.ends_with('/');
        let body = rest.trim_matches('/');
        let pattern = glob::Pattern::new(body)
            .map_err(|e| LintError::pattern(format!("Invalid pattern '{raw}': {e}")))?;

        Ok(Self {
            pattern,
            is_include,
            anchored,
            directory_only,
            has_separator: body.contains('/'),
        })
    }

    /// Match a relative file path or any of its parent directories
    fn matches(&self, relative: &Path) -> bool {
        relative
            .ancestors()
            .filter(|candidate| !candidate.as_os_str().is_empty())
            .enumerate()
            .any(|(depth, candidate)| {
                // depth 0 is the file itself
                if self.directory_only && depth == 0 {
                    return false;
                }
                if self.anchored || self.has_separator {
                    self.pattern.matches(&normalize(candidate))
                } else {
                    candidate
                        .file_name()
                        .is_some_and(|name| self.pattern.matches(&name.to_string_lossy()))
                }
            })
    }
}

/// Relative path text with `/` separators on every platform
fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Last matching pattern decides; `None` when nothing matched
fn last_match(patterns: &[FilterPattern], relative: &Path) -> Option<bool> {
    patterns
        .iter()
        .rev()
        .find(|pattern| pattern.matches(relative))
        .map(|pattern| !pattern.is_include)
}

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> LintResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| FilterPattern::parse(raw))
            .collect::<LintResult<Vec<_>>>()?;

        Ok(Self {
            patterns,
            ignore_filename: ignore_filename.filter(|name| !name.is_empty()),
        })
    }

    /// Create a default path filter excluding build output
    pub fn with_defaults() -> LintResult<Self> {
        Self::new(
            vec!["**/bin/**".to_string(), "**/obj/**".to_string(), "**/.git/**".to_string()],
            Some(".lintcsignore".to_string()),
        )
    }

    /// Stop honoring per-directory ignore files
    pub fn without_ignore_files(mut self) -> Self {
        self.ignore_filename = None;
        self
    }

    /// Add a pattern to the filter; it takes precedence over earlier ones
    pub fn add_pattern(&mut self, pattern: &str) -> LintResult<()> {
        self.patterns.push(FilterPattern::parse(pattern)?);
        Ok(())
    }

    /// Whether the configured patterns exclude a path given relative to the analyzed root
    pub fn is_excluded(&self, relative: &Path) -> bool {
        last_match(&self.patterns, relative).unwrap_or(false)
    }

    /// Check if `path`, found under `root`, should be analyzed
    pub fn should_analyze(&self, root: &Path, path: &Path) -> LintResult<bool> {
        self.should_analyze_with(root, path, &mut IgnoreCache::default())
    }

    fn should_analyze_with(
        &self,
        root: &Path,
        path: &Path,
        ignore_cache: &mut IgnoreCache,
    ) -> LintResult<bool> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if self.is_excluded(relative) {
            return Ok(false);
        }
        Ok(!self.is_ignored_by_files(root, path, ignore_cache)?)
    }

    /// Check ignore files from `root` down to the file's directory; deeper files win
    fn is_ignored_by_files(
        &self,
        root: &Path,
        path: &Path,
        ignore_cache: &mut IgnoreCache,
    ) -> LintResult<bool> {
        let Some(ignore_filename) = &self.ignore_filename else {
            return Ok(false);
        };

        let mut directories: Vec<&Path> = path
            .ancestors()
            .skip(1)
            .take_while(|dir| dir.starts_with(root))
            .collect();
        directories.reverse();

        let mut ignored = false;
        for dir in directories {
            let patterns = ignore_cache.patterns(dir, ignore_filename)?;
            if let Ok(relative) = path.strip_prefix(dir) {
                if let Some(excluded) = last_match(patterns, relative) {
                    ignored = excluded;
                }
            }
        }
        Ok(ignored)
    }

    /// Every C# file under `root` that should be analyzed, sorted
    pub fn find_files<P: AsRef<Path>>(&self, root: P) -> LintResult<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();
        let mut ignore_cache = IgnoreCache::default();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let is_source = entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION));
            if is_source && self.should_analyze_with(root, path, &mut ignore_cache)? {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Ignore-file patterns per directory, read at most once per walk
#[derive(Debug, Default)]
struct IgnoreCache {
    /// Directories without an ignore file map to no patterns
    by_directory: HashMap<PathBuf, Vec<FilterPattern>>,
}

impl IgnoreCache {
    fn patterns(&mut self, dir: &Path, ignore_filename: &str) -> LintResult<&[FilterPattern]> {
        if !self.by_directory.contains_key(dir) {
            let ignore_file = dir.join(ignore_filename);
            let patterns = if ignore_file.is_file() {
                load_ignore_file(&ignore_file)?
            } else {
                Vec::new()
            };
            self.by_directory.insert(dir.to_path_buf(), patterns);
        }
        Ok(self
            .by_directory
            .get(dir)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }
}

/// Load patterns from an ignore file; invalid lines are skipped with a warning
fn load_ignore_file(path: &Path) -> LintResult<Vec<FilterPattern>> {
    let content = fs::read_to_string(path).map_err(|e| {
        LintError::config(format!("Failed to read ignore file '{}': {}", path.display(), e))
    })?;

    let mut patterns = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match FilterPattern::parse(line) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => tracing::warn!("Ignoring pattern in {}: {}", path.display(), e),
        }
    }
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filter(patterns: &[&str]) -> PathFilter {
        PathFilter::new(patterns.iter().map(|p| p.to_string()).collect(), None).unwrap()
    }

    #[test]
    fn test_basic_exclusion() {
        let filter = filter(&["**/bin/**", "*.Designer.cs"]);
        assert!(!filter.is_excluded(Path::new("src/Service.cs")));
        assert!(filter.is_excluded(Path::new("src/bin/Debug/Service.cs")));
        assert!(filter.is_excluded(Path::new("bin/Service.cs")));
        assert!(filter.is_excluded(Path::new("src/Form1.Designer.cs")));
    }

    #[test]
    fn test_include_override_and_order() {
        let filter = filter(&["generated/**", "!generated/Keep.cs"]);
        assert!(filter.is_excluded(Path::new("generated/Other.cs")));
        assert!(!filter.is_excluded(Path::new("generated/Keep.cs")));

        let reordered = self::filter(&["!generated/Keep.cs", "generated/**"]);
        assert!(reordered.is_excluded(Path::new("generated/Keep.cs")));
    }

    #[test]
    fn test_directory_and_anchored_patterns() {
        let filter = filter(&["obj/", "/Legacy"]);
        assert!(filter.is_excluded(Path::new("src/obj/Temp.cs")));
        // a file named like the directory pattern is not a directory
        assert!(!filter.is_excluded(Path::new("src/obj")));
        assert!(filter.is_excluded(Path::new("Legacy/Old.cs")));
        assert!(!filter.is_excluded(Path::new("src/Legacy/Old.cs")));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PathFilter::new(vec!["[invalid".to_string()], None).is_err());
    }

    #[test]
    fn test_find_files_only_returns_csharp_sources() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("bin/Debug")).unwrap();
        fs::write(root.join("src/B.cs"), "class B { }").unwrap();
        fs::write(root.join("src/A.cs"), "class A { }").unwrap();
        fs::write(root.join("src/notes.txt"), "").unwrap();
        fs::write(root.join("bin/Debug/C.cs"), "class C { }").unwrap();

        let files = PathFilter::with_defaults().unwrap().find_files(root).unwrap();
        assert_eq!(files, vec![root.join("src/A.cs"), root.join("src/B.cs")]);
    }

    #[test]
    fn test_ignore_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src/Generated")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join(".lintcsignore"), "# generated code\nGenerated/\ntests/**\n!tests/Important.cs\n").unwrap();
        fs::write(root.join("src/Service.cs"), "").unwrap();
        fs::write(root.join("src/Generated/Proxy.cs"), "").unwrap();
        fs::write(root.join("tests/Unit.cs"), "").unwrap();
        fs::write(root.join("tests/Important.cs"), "").unwrap();

        let filter = PathFilter::with_defaults().unwrap();
        let files = filter.find_files(root).unwrap();
        assert_eq!(files, vec![root.join("src/Service.cs"), root.join("tests/Important.cs")]);

        let everything = filter.without_ignore_files().find_files(root).unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn test_ignore_file_is_read_once_per_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("gen")).unwrap();
        fs::write(root.join("gen/.lintcsignore"), "Proxy*.cs\n[broken\n").unwrap();
        for name in ["ProxyA.cs", "ProxyB.cs", "Model.cs"] {
            fs::write(root.join("gen").join(name), "").unwrap();
        }

        let filter = PathFilter::with_defaults().unwrap();
        let mut ignore_cache = IgnoreCache::default();
        assert!(!filter
            .should_analyze_with(root, &root.join("gen/ProxyA.cs"), &mut ignore_cache)
            .unwrap());

        // later files in the walk keep the patterns already loaded
        fs::remove_file(root.join("gen/.lintcsignore")).unwrap();
        assert!(!filter
            .should_analyze_with(root, &root.join("gen/ProxyB.cs"), &mut ignore_cache)
            .unwrap());
        assert!(filter
            .should_analyze_with(root, &root.join("gen/Model.cs"), &mut ignore_cache)
            .unwrap());
        assert_eq!(ignore_cache.by_directory.len(), 2);
        assert_eq!(ignore_cache.by_directory[&root.join("gen")].len(), 1);

        // a fresh walk reads the directory again
        assert!(filter.should_analyze(root, &root.join("gen/ProxyB.cs")).unwrap());
    }
}
