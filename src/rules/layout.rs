//! Layout rules that work on the token stream alone

use super::{RuleContext, RuleId, StyleRule, Target};
use crate::domain::violations::Violation;
use crate::syntax::Token;

/// Accessor keywords whose `;` does not end a statement
const ACCESSORS: &[&str] = &["get", "set", "init", "add", "remove"];

/// One statement per physical line.
///
/// A `;` ends a statement only when the innermost open bracket is a brace
/// (or there is none), which leaves `for (;;)` headers alone while still
/// seeing statements inside lambda bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct OneStatementPerLine;

fn ends_statement(tokens: &[Token<'_>], index: usize, innermost: Option<&str>) -> bool {
    if !matches!(innermost, None | Some("{")) {
        return false;
    }
    match index.checked_sub(1).and_then(|i| tokens.get(i)) {
        Some(previous) => !(previous.is_identifier() && ACCESSORS.contains(&previous.text)),
        None => true,
    }
}

impl StyleRule for OneStatementPerLine {
    fn id(&self) -> RuleId {
        RuleId::OneStatementPerLine
    }

    fn description(&self) -> &'static str {
        "Write only one statement per line"
    }

    fn applies_to(&self) -> Target {
        Target::Tokens
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let tokens = ctx.significant;
        let mut open: Vec<&str> = Vec::new();
        let mut violations = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            if token.is_punct("(") || token.is_punct("[") || token.is_punct("{") {
                open.push(token.text);
                continue;
            }
            if token.is_punct(")") || token.is_punct("]") || token.is_punct("}") {
                open.pop();
                continue;
            }
            if !token.is_punct(";") || !ends_statement(tokens, index, open.last().copied()) {
                continue;
            }
            let Some(next) = tokens.get(index + 1) else {
                continue;
            };
            if next.line() == token.line() && !next.is_punct("}") {
                violations.push(
                    ctx.violation(
                        self.id(),
                        next.start(),
                        "statement starts on the same line as the previous statement",
                    )
                    .with_suggestion("move the statement to its own line"),
                );
            }
        }
        violations
    }
}
