//! Style rule registry and engine
//!
//! Architecture: Strategy Pattern - every convention is an independent [`StyleRule`]
//! - Rules read a shared [`RuleContext`] and return violations; they never mutate shared state
//! - The engine concatenates rule outputs, so the result does not depend on rule order
//! - Adding a rule means adding a [`RuleId`] variant and a registry entry, nothing else

pub mod declarations;
pub mod layout;
pub mod naming;
pub mod operators;

use crate::domain::violations::{LintError, LintResult, Severity, Violation};
use crate::syntax::{Position, Role, ScopeTree, Token};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Identifier of every built-in rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    PascalCaseType,
    InterfacePrefix,
    PascalCasePublicMember,
    CamelCaseUnderscoreField,
    StaticFieldPrefix,
    ThreadStaticFieldPrefix,
    CamelCaseParameter,
    VarApparentType,
    ExplicitForeachType,
    UsingOutsideNamespace,
    ShortCircuitOperator,
    OneStatementPerLine,
    OneDeclarationPerLine,
    PascalCaseConstant,
    PascalCasePrivateMember,
    TypeParameterPrefix,
}

impl RuleId {
    pub const ALL: [RuleId; 16] = [
        Self::PascalCaseType,
        Self::InterfacePrefix,
        Self::PascalCasePublicMember,
        Self::CamelCaseUnderscoreField,
        Self::StaticFieldPrefix,
        Self::ThreadStaticFieldPrefix,
        Self::CamelCaseParameter,
        Self::VarApparentType,
        Self::ExplicitForeachType,
        Self::UsingOutsideNamespace,
        Self::ShortCircuitOperator,
        Self::OneStatementPerLine,
        Self::OneDeclarationPerLine,
        Self::PascalCaseConstant,
        Self::PascalCasePrivateMember,
        Self::TypeParameterPrefix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PascalCaseType => "PascalCaseType",
            Self::InterfacePrefix => "InterfacePrefix",
            Self::PascalCasePublicMember => "PascalCasePublicMember",
            Self::CamelCaseUnderscoreField => "CamelCaseUnderscoreField",
            Self::StaticFieldPrefix => "StaticFieldPrefix",
            Self::ThreadStaticFieldPrefix => "ThreadStaticFieldPrefix",
            Self::CamelCaseParameter => "CamelCaseParameter",
            Self::VarApparentType => "VarApparentType",
            Self::ExplicitForeachType => "ExplicitForeachType",
            Self::UsingOutsideNamespace => "UsingOutsideNamespace",
            Self::ShortCircuitOperator => "ShortCircuitOperator",
            Self::OneStatementPerLine => "OneStatementPerLine",
            Self::OneDeclarationPerLine => "OneDeclarationPerLine",
            Self::PascalCaseConstant => "PascalCaseConstant",
            Self::PascalCasePrivateMember => "PascalCasePrivateMember",
            Self::TypeParameterPrefix => "TypeParameterPrefix",
        }
    }

    /// Severity used when the configuration does not override it
    pub fn default_severity(self) -> Severity {
        match self {
            Self::VarApparentType
            | Self::ExplicitForeachType
            | Self::OneStatementPerLine
            | Self::OneDeclarationPerLine => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Whether the rule checks names against a configurable pattern
    pub fn is_naming_rule(self) -> bool {
        naming::default_pattern(self).is_some()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = LintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| LintError::config(format!("Unknown rule '{s}'")))
    }
}

/// What a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Bindings declared with this role
    Role(Role),
    UsingDirectives,
    DeclarationGroups,
    /// The raw token stream; runs even when parsing was skipped
    Tokens,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "{role} declarations"),
            Self::UsingDirectives => f.write_str("using directives"),
            Self::DeclarationGroups => f.write_str("comma-separated declarations"),
            Self::Tokens => f.write_str("token stream"),
        }
    }
}

/// Project-wide knowledge of declared namespaces.
///
/// A nested `using` is only hazardous when its name can bind to a different
/// namespace relative to the enclosing one. Single-file analysis cannot know
/// that, so implementations answer `None` when unsure.
pub trait ProjectSymbols: Send + Sync + fmt::Debug {
    /// `Some(true)` when `target` resolves differently inside `namespace`
    fn is_ambiguous(&self, target: &str, namespace: Option<&str>) -> Option<bool>;
}

/// Default symbol table: knows nothing, so every nested using is reported
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProjectSymbols;

impl ProjectSymbols for NoProjectSymbols {
    fn is_ambiguous(&self, _target: &str, _namespace: Option<&str>) -> Option<bool> {
        None
    }
}

/// Everything a rule may look at for one file
pub struct RuleContext<'a, 'src> {
    pub file: &'a Path,
    pub source: &'src str,
    /// All tokens, trivia included
    pub tokens: &'a [Token<'src>],
    /// Tokens without whitespace, comments and directives
    pub significant: &'a [Token<'src>],
    /// Absent when the file failed to lex
    pub tree: Option<&'a ScopeTree>,
    pub symbols: &'a dyn ProjectSymbols,
}

impl<'a, 'src> RuleContext<'a, 'src> {
    /// Trimmed text of a 1-based source line
    pub fn line_text(&self, line: u32) -> Option<&'src str> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.source.lines().nth(index).map(str::trim)
    }

    /// A violation of `rule` at `position`, carrying the source line as context
    pub fn violation(&self, rule: RuleId, position: Position, message: impl Into<String>) -> Violation {
        let violation = Violation::new(
            rule.as_str(),
            rule.default_severity(),
            self.file,
            position.line,
            position.column,
            message,
        );
        match self.line_text(position.line) {
            Some(text) if !text.is_empty() => violation.with_context(text),
            _ => violation,
        }
    }
}

/// A single, independent style convention
pub trait StyleRule: Send + Sync {
    fn id(&self) -> RuleId;

    fn description(&self) -> &'static str;

    fn applies_to(&self) -> Target;

    /// Rules that need the scope tree are skipped for files that failed to lex
    fn requires_tree(&self) -> bool {
        !matches!(self.applies_to(), Target::Tokens)
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation>;
}

/// One enabled rule with its effective settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSelection {
    pub id: RuleId,
    pub severity: Severity,
    /// Replacement pattern for naming rules
    pub pattern: Option<String>,
}

impl RuleSelection {
    pub fn new(id: RuleId) -> Self {
        Self {
            id,
            severity: id.default_severity(),
            pattern: None,
        }
    }
}

/// Build the rule for `id`, honoring a pattern override for naming rules
pub fn build_rule(id: RuleId, pattern: Option<&str>) -> LintResult<Box<dyn StyleRule>> {
    let rule: Box<dyn StyleRule> = match id {
        RuleId::VarApparentType => Box::new(declarations::VarApparentType),
        RuleId::ExplicitForeachType => Box::new(declarations::ExplicitForeachType),
        RuleId::UsingOutsideNamespace => Box::new(declarations::UsingOutsideNamespace),
        RuleId::OneDeclarationPerLine => Box::new(declarations::OneDeclarationPerLine),
        RuleId::OneStatementPerLine => Box::new(layout::OneStatementPerLine),
        RuleId::ShortCircuitOperator => Box::new(operators::ShortCircuitOperator),
        naming_id => Box::new(naming::NamingRule::new(naming_id, pattern)?),
    };
    Ok(rule)
}

/// One instance of every built-in rule with default settings
pub fn all_rules() -> LintResult<Vec<Box<dyn StyleRule>>> {
    RuleId::ALL.into_iter().map(|id| build_rule(id, None)).collect()
}

struct EnabledRule {
    rule: Box<dyn StyleRule>,
    severity: Severity,
}

/// Runs the enabled rules over one file
pub struct RuleEngine {
    rules: Vec<EnabledRule>,
    symbols: Arc<dyn ProjectSymbols>,
}

impl RuleEngine {
    /// Engine running the selected rules at their configured severities
    pub fn new(selection: &[RuleSelection]) -> LintResult<Self> {
        let rules = selection
            .iter()
            .map(|s| {
                Ok(EnabledRule {
                    rule: build_rule(s.id, s.pattern.as_deref())?,
                    severity: s.severity,
                })
            })
            .collect::<LintResult<Vec<_>>>()?;
        Ok(Self {
            rules,
            symbols: Arc::new(NoProjectSymbols),
        })
    }

    /// Engine running every rule at its default severity
    pub fn with_defaults() -> LintResult<Self> {
        let selection: Vec<_> = RuleId::ALL.into_iter().map(RuleSelection::new).collect();
        Self::new(&selection)
    }

    /// Engine over an explicit rule list, in the given order
    pub fn from_rules(rules: Vec<Box<dyn StyleRule>>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| {
                    let severity = rule.id().default_severity();
                    EnabledRule { rule, severity }
                })
                .collect(),
            symbols: Arc::new(NoProjectSymbols),
        }
    }

    pub fn with_symbols(mut self, symbols: Arc<dyn ProjectSymbols>) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn symbols(&self) -> &dyn ProjectSymbols {
        self.symbols.as_ref()
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|r| r.rule.id())
    }

    /// Run every applicable rule; tree-based rules are skipped without a tree
    pub fn run(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        self.rules
            .iter()
            .filter(|enabled| ctx.tree.is_some() || !enabled.rule.requires_tree())
            .flat_map(|enabled| {
                let violations = enabled.rule.check(ctx);
                tracing::debug!(
                    "rule {} found {} violations in {}",
                    enabled.rule.id(),
                    violations.len(),
                    ctx.file.display()
                );
                violations
                    .into_iter()
                    .map(move |v| v.with_severity(enabled.severity))
            })
            .collect()
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.enabled_rules().collect::<Vec<_>>())
            .field("symbols", &self.symbols)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    const SAMPLE: &str = r#"
using System;
namespace Shop
{
    using Azure;

    public class orderService : IDisposable
    {
        private int count, total;
        private static int counter;
        public void Process(int OrderId)
        {
            var result = Compute(OrderId); Log(result);
            foreach (var item in items) { }
            if ((count != 0) | (total > 0)) { }
        }
    }
}
"#;

    #[test]
    fn test_rule_ids_round_trip_through_names() {
        for id in RuleId::ALL {
            assert_eq!(id.as_str().parse::<RuleId>().unwrap(), id);
        }
        assert!("NoSuchRule".parse::<RuleId>().is_err());
    }

    #[test]
    fn test_registry_has_one_rule_per_id() {
        let rules = all_rules().unwrap();
        let ids: Vec<_> = rules.iter().map(|r| r.id()).collect();
        assert_eq!(ids, RuleId::ALL.to_vec());
        assert!(rules.iter().all(|r| !r.description().is_empty()));
    }

    #[test]
    fn test_rule_order_does_not_change_results() {
        let forward = run_rules(SAMPLE, all_rules().unwrap());
        let mut reversed_rules = all_rules().unwrap();
        reversed_rules.reverse();
        let reversed = run_rules(SAMPLE, reversed_rules);
        let mut rotated_rules = all_rules().unwrap();
        rotated_rules.rotate_left(5);
        let rotated = run_rules(SAMPLE, rotated_rules);

        assert!(!forward.is_empty());
        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
    }

    #[test]
    fn test_sample_triggers_each_family() {
        let violations = run_rules(SAMPLE, all_rules().unwrap());
        let fired: std::collections::BTreeSet<_> = violations.iter().map(|v| v.rule_id()).collect();
        for expected in [
            "UsingOutsideNamespace",
            "PascalCaseType",
            "CamelCaseUnderscoreField",
            "StaticFieldPrefix",
            "CamelCaseParameter",
            "VarApparentType",
            "ExplicitForeachType",
            "OneStatementPerLine",
            "OneDeclarationPerLine",
            "ShortCircuitOperator",
        ] {
            assert!(fired.contains(expected), "{expected} did not fire: {fired:?}");
        }
    }

    #[test]
    fn test_configured_severity_overrides_default() {
        let selection = vec![RuleSelection {
            id: RuleId::PascalCaseType,
            severity: Severity::Error,
            pattern: None,
        }];
        let engine = RuleEngine::new(&selection).unwrap();
        let stream = crate::syntax::tokenize("class lower { }");
        let significant = stream.significant();
        let tree = crate::syntax::parse(&stream).tree;
        let ctx = RuleContext {
            file: Path::new("A.cs"),
            source: "class lower { }",
            tokens: &stream.tokens,
            significant: &significant,
            tree: Some(&tree),
            symbols: engine.symbols(),
        };
        let violations = engine.run(&ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity(), Severity::Error);
    }

    #[test]
    fn test_tree_rules_skipped_without_tree() {
        let source = "class lower { void M() { a(); b(); } }";
        let stream = crate::syntax::tokenize(source);
        let significant = stream.significant();
        let ctx = RuleContext {
            file: Path::new("A.cs"),
            source,
            tokens: &stream.tokens,
            significant: &significant,
            tree: None,
            symbols: &NoProjectSymbols,
        };
        let violations = RuleEngine::with_defaults().unwrap().run(&ctx);
        assert!(violations.iter().all(|v| v.rule_id() == "OneStatementPerLine"));
        assert_eq!(violations.len(), 1);
    }
}
