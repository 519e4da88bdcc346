//! Naming-convention rules
//!
//! Each naming rule pairs a binding [`Role`] with an anchored regex. Names
//! are checked literally: all-caps acronyms such as `ID` satisfy
//! `^[A-Z][A-Za-z0-9]*$`, and nothing is special-cased beyond discards.

use super::{RuleContext, RuleId, StyleRule, Target};
use crate::domain::violations::{LintError, LintResult, Violation};
use crate::syntax::Role;
use regex::Regex;

const PASCAL_CASE: &str = "^[A-Z][A-Za-z0-9]*$";
const CAMEL_CASE: &str = "^[a-z][A-Za-z0-9]*$";

/// Built-in pattern of a naming rule, `None` for other rules
pub fn default_pattern(id: RuleId) -> Option<&'static str> {
    let pattern = match id {
        RuleId::PascalCaseType
        | RuleId::PascalCasePublicMember
        | RuleId::PascalCaseConstant
        | RuleId::PascalCasePrivateMember => PASCAL_CASE,
        RuleId::InterfacePrefix => "^I[A-Z][A-Za-z0-9]*$",
        RuleId::CamelCaseUnderscoreField => "^_[a-z][A-Za-z0-9]*$",
        RuleId::StaticFieldPrefix => "^s_[a-z][A-Za-z0-9]*$",
        RuleId::ThreadStaticFieldPrefix => "^t_[a-z][A-Za-z0-9]*$",
        RuleId::CamelCaseParameter => CAMEL_CASE,
        RuleId::TypeParameterPrefix => "^T([A-Z][A-Za-z0-9]*)?$",
        _ => return None,
    };
    Some(pattern)
}

fn role_for(id: RuleId) -> Option<Role> {
    let role = match id {
        RuleId::PascalCaseType => Role::TypeName,
        RuleId::InterfacePrefix => Role::InterfaceName,
        RuleId::PascalCasePublicMember => Role::PublicMember,
        RuleId::CamelCaseUnderscoreField => Role::PrivateField,
        RuleId::StaticFieldPrefix => Role::StaticField,
        RuleId::ThreadStaticFieldPrefix => Role::ThreadStaticField,
        RuleId::CamelCaseParameter => Role::Parameter,
        RuleId::PascalCaseConstant => Role::Constant,
        RuleId::PascalCasePrivateMember => Role::PrivateMember,
        RuleId::TypeParameterPrefix => Role::TypeParameter,
        _ => return None,
    };
    Some(role)
}

/// Split an identifier into lowercase words at underscores and case changes
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = c.is_uppercase()
            && !current.is_empty()
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || chars.get(i + 1).is_some_and(|n| n.is_lowercase()));
        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pascal_case(name: &str) -> String {
    words(name).iter().map(|w| capitalize(w)).collect()
}

fn camel_case(name: &str) -> String {
    let words = words(name);
    let mut result = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            result.push_str(word);
        } else {
            result.push_str(&capitalize(word));
        }
    }
    result
}

/// Conventional spelling of `name` under rule `id`
fn conventional_name(id: RuleId, name: &str) -> String {
    match id {
        RuleId::InterfacePrefix => {
            let base = name
                .strip_prefix('I')
                .filter(|rest| rest.starts_with(|c: char| c.is_uppercase()))
                .unwrap_or(name);
            format!("I{}", pascal_case(base))
        }
        RuleId::TypeParameterPrefix => {
            let base = name.strip_prefix('T').unwrap_or(name);
            format!("T{}", pascal_case(base))
        }
        RuleId::CamelCaseUnderscoreField => format!("_{}", camel_case(name)),
        RuleId::StaticFieldPrefix => {
            format!("s_{}", camel_case(name.strip_prefix("s_").unwrap_or(name)))
        }
        RuleId::ThreadStaticFieldPrefix => {
            format!("t_{}", camel_case(name.strip_prefix("t_").unwrap_or(name)))
        }
        RuleId::CamelCaseParameter => camel_case(name),
        _ => pascal_case(name),
    }
}

fn expectation(id: RuleId) -> &'static str {
    match id {
        RuleId::InterfacePrefix => "PascalCase with an 'I' prefix",
        RuleId::TypeParameterPrefix => "PascalCase with a 'T' prefix",
        RuleId::CamelCaseUnderscoreField => "camelCase with a '_' prefix",
        RuleId::StaticFieldPrefix => "camelCase with an 's_' prefix",
        RuleId::ThreadStaticFieldPrefix => "camelCase with a 't_' prefix",
        RuleId::CamelCaseParameter => "camelCase",
        _ => "PascalCase",
    }
}

/// Checks every binding of one role against a name pattern
#[derive(Debug, Clone)]
pub struct NamingRule {
    id: RuleId,
    role: Role,
    pattern: Regex,
    custom_pattern: bool,
}

impl NamingRule {
    /// Naming rule for `id`, optionally replacing its built-in pattern
    pub fn new(id: RuleId, pattern: Option<&str>) -> LintResult<Self> {
        let (Some(role), Some(default)) = (role_for(id), default_pattern(id)) else {
            return Err(LintError::config(format!("{id} is not a naming rule")));
        };
        let source = pattern.unwrap_or(default);
        let regex = Regex::new(source)
            .map_err(|e| LintError::pattern(format!("Invalid pattern '{source}' for {id}: {e}")))?;
        Ok(Self {
            id,
            role,
            pattern: regex,
            custom_pattern: pattern.is_some(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn suggestion(&self, name: &str) -> Option<String> {
        let candidate = conventional_name(self.id, name);
        (candidate != name && self.pattern.is_match(&candidate)).then_some(candidate)
    }
}

impl StyleRule for NamingRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn description(&self) -> &'static str {
        match self.id {
            RuleId::PascalCaseType => "Type names use PascalCase",
            RuleId::InterfacePrefix => "Interface names start with 'I' followed by PascalCase",
            RuleId::PascalCasePublicMember => "Public, protected and protected internal members use PascalCase",
            RuleId::CamelCaseUnderscoreField => "Private and internal instance fields use camelCase prefixed with '_'",
            RuleId::StaticFieldPrefix => "Private and internal static fields use camelCase prefixed with 's_'",
            RuleId::ThreadStaticFieldPrefix => "Thread-static fields use camelCase prefixed with 't_'",
            RuleId::CamelCaseParameter => "Method parameters use camelCase",
            RuleId::PascalCaseConstant => "Constants use PascalCase",
            RuleId::PascalCasePrivateMember => "Private methods, properties, events and local functions use PascalCase",
            _ => "Type parameters start with 'T' followed by PascalCase",
        }
    }

    fn applies_to(&self) -> Target {
        Target::Role(self.role)
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let Some(tree) = ctx.tree else {
            return Vec::new();
        };
        tree.bindings_with_role(self.role)
            // discards
            .filter(|b| !b.name.chars().all(|c| c == '_'))
            .filter(|b| !self.pattern.is_match(&b.name))
            .map(|binding| {
                let message = if self.custom_pattern {
                    format!(
                        "{} '{}' does not match the configured pattern {}",
                        self.role,
                        binding.name,
                        self.pattern.as_str()
                    )
                } else {
                    format!(
                        "{} '{}' should be {}",
                        self.role,
                        binding.name,
                        expectation(self.id)
                    )
                };
                let violation = ctx.violation(self.id, binding.position, message);
                match self.suggestion(&binding.name) {
                    Some(name) => violation.with_suggestion(format!("rename to '{name}'")),
                    None => violation,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{check, run_rules};
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DataService", 0)]
    #[case("ID", 0)]
    #[case("Http2Client", 0)]
    #[case("dataService", 1)]
    #[case("IO_Stream", 1)]
    #[case("_Hidden", 1)]
    fn test_pascal_case_type(#[case] name: &str, #[case] expected: usize) {
        let source = format!("public class {name} {{ }}");
        assert_eq!(check(&source, RuleId::PascalCaseType).len(), expected);
    }

    #[rstest]
    #[case("IWorkerQueue", 0)]
    #[case("WorkerQueue", 1)]
    #[case("Iworker", 1)]
    fn test_interface_prefix(#[case] name: &str, #[case] expected: usize) {
        let source = format!("interface {name} {{ }}");
        assert_eq!(check(&source, RuleId::InterfacePrefix).len(), expected);
    }

    #[rstest]
    #[case("_workerQueue", 0)]
    #[case("_a1", 0)]
    #[case("workerQueue", 1)]
    #[case("_WorkerQueue", 1)]
    #[case("m_queue", 1)]
    fn test_private_field(#[case] name: &str, #[case] expected: usize) {
        let source = format!("class C {{ private IWorkerQueue {name}; }}");
        assert_eq!(check(&source, RuleId::CamelCaseUnderscoreField).len(), expected);
    }

    #[test]
    fn test_field_prefix_rules_target_their_own_roles() {
        let source = r#"
class C
{
    private static int s_ok;
    internal static int total;
    [ThreadStatic]
    private static int t_ok;
    [System.ThreadStatic]
    static int current;
    public static int Shared;
}
"#;
        let statics = check(source, RuleId::StaticFieldPrefix);
        assert_eq!(statics.len(), 1);
        assert!(statics[0].message().contains("'total'"));
        assert_eq!(statics[0].suggested_fix(), Some("rename to 's_total'"));

        let thread_statics = check(source, RuleId::ThreadStaticFieldPrefix);
        assert_eq!(thread_statics.len(), 1);
        assert!(thread_statics[0].message().contains("'current'"));

        assert!(check(source, RuleId::CamelCaseUnderscoreField).is_empty());
        assert!(check(source, RuleId::PascalCasePublicMember).is_empty());
    }

    #[test]
    fn test_parameters_and_members() {
        let source = "public class C { public int itemCount { get; set; } public void Run(int RetryCount, string name, int _) { } }";
        let parameters = check(source, RuleId::CamelCaseParameter);
        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].suggested_fix(), Some("rename to 'retryCount'"));

        let members = check(source, RuleId::PascalCasePublicMember);
        assert_eq!(members.len(), 1);
        assert!(members[0].message().starts_with("public member 'itemCount'"));
    }

    #[test]
    fn test_added_naming_rules() {
        let source = "class Box<Item, TValue> { const int maxSize = 4; private void reset() { } }";
        assert_eq!(check(source, RuleId::TypeParameterPrefix).len(), 1);
        assert_eq!(check(source, RuleId::PascalCaseConstant).len(), 1);
        assert_eq!(check(source, RuleId::PascalCasePrivateMember).len(), 1);
    }

    #[test]
    fn test_violation_position_and_context() {
        let violations = check("public class dataService {}", RuleId::PascalCaseType);
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].line(), violations[0].column()), (1, 14));
        assert_eq!(violations[0].context(), Some("public class dataService {}"));
        assert_eq!(violations[0].suggested_fix(), Some("rename to 'DataService'"));
    }

    #[test]
    fn test_custom_pattern() {
        let rule = NamingRule::new(RuleId::CamelCaseUnderscoreField, Some("^m_[a-z]+$")).unwrap();
        let violations = run_rules(
            "class C { private int m_count; private int _count; }",
            vec![Box::new(rule)],
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message().contains("'_count'"));
        assert!(NamingRule::new(RuleId::PascalCaseType, Some("([")).is_err());
        assert!(NamingRule::new(RuleId::VarApparentType, None).is_err());
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(pascal_case("data_service"), "DataService");
        assert_eq!(pascal_case("HTTPServer"), "HttpServer");
        assert_eq!(camel_case("WorkerQueue"), "workerQueue");
        assert_eq!(conventional_name(RuleId::CamelCaseUnderscoreField, "workerQueue"), "_workerQueue");
        assert_eq!(conventional_name(RuleId::InterfacePrefix, "workerQueue"), "IWorkerQueue");
        assert_eq!(conventional_name(RuleId::StaticFieldPrefix, "s_Count"), "s_count");
    }
}
