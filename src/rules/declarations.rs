//! Declaration rules: implicit typing, using placement and declarators per line

use super::{RuleContext, RuleId, StyleRule, Target};
use crate::domain::violations::Violation;
use crate::syntax::{Apparentness, Binding, Role};
use std::collections::BTreeMap;

/// `var` only when the initializer shows the type
#[derive(Debug, Default, Clone, Copy)]
pub struct VarApparentType;

impl StyleRule for VarApparentType {
    fn id(&self) -> RuleId {
        RuleId::VarApparentType
    }

    fn description(&self) -> &'static str {
        "Use 'var' only when the type is apparent from the initializer (new, literal or cast)"
    }

    fn applies_to(&self) -> Target {
        Target::Role(Role::LocalVariable)
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let Some(tree) = ctx.tree else {
            return Vec::new();
        };
        tree.bindings_with_role(Role::LocalVariable)
            .filter(|b| {
                b.local.is_some_and(|local| {
                    local.uses_var && !local.in_foreach && local.apparentness == Apparentness::NotApparent
                })
            })
            .map(|b| {
                ctx.violation(
                    self.id(),
                    b.position,
                    format!("'var' is used for '{}' but its type is not apparent from the initializer", b.name),
                )
                .with_suggestion(format!("declare '{}' with an explicit type", b.name))
            })
            .collect()
    }
}

/// foreach iteration variables declare their element type
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitForeachType;

impl StyleRule for ExplicitForeachType {
    fn id(&self) -> RuleId {
        RuleId::ExplicitForeachType
    }

    fn description(&self) -> &'static str {
        "Declare foreach iteration variables with an explicit type instead of 'var'"
    }

    fn applies_to(&self) -> Target {
        Target::Role(Role::LocalVariable)
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let Some(tree) = ctx.tree else {
            return Vec::new();
        };
        tree.bindings_with_role(Role::LocalVariable)
            .filter(|b| b.in_foreach() && b.uses_var())
            .map(|b| {
                ctx.violation(
                    self.id(),
                    b.position,
                    format!("foreach variable '{}' is declared with 'var'", b.name),
                )
                .with_suggestion("replace 'var' with the element type")
            })
            .collect()
    }
}

/// `using` directives belong above the namespace declaration
#[derive(Debug, Default, Clone, Copy)]
pub struct UsingOutsideNamespace;

impl StyleRule for UsingOutsideNamespace {
    fn id(&self) -> RuleId {
        RuleId::UsingOutsideNamespace
    }

    fn description(&self) -> &'static str {
        "Place using directives outside the namespace declaration"
    }

    fn applies_to(&self) -> Target {
        Target::UsingDirectives
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let Some(tree) = ctx.tree else {
            return Vec::new();
        };
        tree.usings()
            .iter()
            .filter(|u| u.inside_namespace)
            // Only a symbol table that positively rules out ambiguity clears a nested using
            .filter(|u| ctx.symbols.is_ambiguous(&u.target, u.namespace.as_deref()) != Some(false))
            .map(|u| {
                let message = match &u.namespace {
                    Some(namespace) => format!(
                        "using directive '{}' is inside namespace '{}'",
                        u.target, namespace
                    ),
                    None => format!("using directive '{}' is inside a namespace", u.target),
                };
                ctx.violation(self.id(), u.position, message)
                    .with_suggestion("move the directive above the namespace declaration")
            })
            .collect()
    }
}

/// One declarator per physical line
#[derive(Debug, Default, Clone, Copy)]
pub struct OneDeclarationPerLine;

impl StyleRule for OneDeclarationPerLine {
    fn id(&self) -> RuleId {
        RuleId::OneDeclarationPerLine
    }

    fn description(&self) -> &'static str {
        "Write only one declaration per line"
    }

    fn applies_to(&self) -> Target {
        Target::DeclarationGroups
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let Some(tree) = ctx.tree else {
            return Vec::new();
        };
        let mut groups: BTreeMap<u32, Vec<(u32, &Binding)>> = BTreeMap::new();
        for binding in tree.bindings() {
            if let Some(group) = binding.group {
                groups.entry(group.id).or_default().push((group.index, binding));
            }
        }

        let mut violations = Vec::new();
        for declarators in groups.values_mut() {
            declarators.sort_by_key(|(index, _)| *index);
            for pair in declarators.windows(2) {
                let (previous, current) = (pair[0].1, pair[1].1);
                if previous.position.line == current.position.line {
                    violations.push(
                        ctx.violation(
                            self.id(),
                            current.position,
                            format!(
                                "'{}' is declared on the same line as '{}'",
                                current.name, previous.name
                            ),
                        )
                        .with_suggestion(format!("declare '{}' on its own line", current.name)),
                    );
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::check;
    use super::*;

    #[test]
    fn test_var_with_apparent_initializers_is_allowed() {
        let source = r#"
class C
{
    void M()
    {
        var message = "hello";
        var total = 0;
        var builder = new StringBuilder();
        var value = (int)reader.Read();
        int explicitValue = Compute();
    }
}
"#;
        assert!(check(source, RuleId::VarApparentType).is_empty());
    }

    #[test]
    fn test_var_with_non_apparent_initializer() {
        let source = "class C { void M() { var result = Convert.ToInt32(text); } }";
        let violations = check(source, RuleId::VarApparentType);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message().contains("'result'"));
        assert_eq!(violations[0].suggested_fix(), Some("declare 'result' with an explicit type"));
    }

    #[test]
    fn test_foreach_var_is_only_flagged_by_foreach_rule() {
        let source = "class C { void M() { foreach (var item in items) { } foreach (string name in names) { } } }";
        assert_eq!(check(source, RuleId::ExplicitForeachType).len(), 1);
        assert!(check(source, RuleId::VarApparentType).is_empty());
    }

    #[test]
    fn test_using_inside_namespace() {
        let source = "using System;\nnamespace N\n{\n    using Azure;\n    class C { }\n}\n";
        let violations = check(source, RuleId::UsingOutsideNamespace);
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].line(), violations[0].column()), (4, 5));
        assert_eq!(violations[0].message(), "using directive 'Azure' is inside namespace 'N'");
    }

    #[test]
    fn test_usings_before_file_scoped_namespace_are_allowed() {
        let source = "using System;\nusing Azure;\nnamespace N;\nclass C { }\n";
        assert!(check(source, RuleId::UsingOutsideNamespace).is_empty());
    }

    #[test]
    fn test_one_declaration_per_line() {
        let source = r#"
class C
{
    private int _a, _b;
    private int _c,
        _d;
    void M()
    {
        int x = 1, y = 2, z = 3;
        for (int i = 0, j = 0; i < j; i++) { }
    }
}
"#;
        let violations = check(source, RuleId::OneDeclarationPerLine);
        let names: Vec<_> = violations
            .iter()
            .map(|v| v.message().split('\'').nth(1).unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["_b", "y", "z"]);
    }
}
