//! Operator rules
//!
//! `&` and `|` evaluate both operands. When both operands are clearly
//! boolean, `&&` and `||` give the same result and skip needless work.
//! Without type information the check is conservative: an operand counts as
//! boolean only when it syntactically must be one.

use super::{RuleContext, RuleId, StyleRule, Target};
use crate::domain::violations::Violation;
use crate::syntax::token::is_predefined_type;
use crate::syntax::{Token, TokenKind};

/// Tokens that end an operand of `&` / `|` at bracket depth zero
const OPERAND_BOUNDARIES: &[&str] = &[
    ",", ";", "{", "}", "=", "=>", "?", ":", "??", "&&", "||", "&", "|", "^", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", "??=", "<<=",
];

const COMPARISONS: &[&str] = &["==", "!=", "<=", ">="];

#[derive(Debug, Default, Clone, Copy)]
pub struct ShortCircuitOperator;

fn is_boundary(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Punctuation => OPERAND_BOUNDARIES.contains(&token.text),
        TokenKind::Keyword => matches!(token.text, "return" | "when" | "if" | "while"),
        _ => false,
    }
}

/// A binary operator follows an operand; `x is string & y` ends in a type keyword
fn follows_operand(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier | TokenKind::Literal => true,
        TokenKind::Punctuation => matches!(token.text, ")" | "]"),
        TokenKind::Keyword => matches!(token.text, "this" | "base") || is_predefined_type(token.text),
        _ => false,
    }
}

/// Operand to the left of the operator at `index`
fn left_operand<'a, 'src>(tokens: &'a [Token<'src>], index: usize) -> &'a [Token<'src>] {
    let mut depth = 0usize;
    let mut start = index;
    while start > 0 {
        let token = &tokens[start - 1];
        if token.is_punct(")") || token.is_punct("]") {
            depth += 1;
        } else if token.is_punct("(") || token.is_punct("[") {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if depth == 0 && is_boundary(token) {
            break;
        }
        start -= 1;
    }
    &tokens[start..index]
}

/// Operand to the right of the operator at `index`
fn right_operand<'a, 'src>(tokens: &'a [Token<'src>], index: usize) -> &'a [Token<'src>] {
    let mut depth = 0usize;
    let mut end = index + 1;
    while let Some(token) = tokens.get(end) {
        if token.is_punct("(") || token.is_punct("[") {
            depth += 1;
        } else if token.is_punct(")") || token.is_punct("]") {
            if depth == 0 {
                break;
            }
            depth -= 1;
        } else if depth == 0 && is_boundary(token) {
            break;
        }
        end += 1;
    }
    &tokens[index + 1..end]
}

/// Whether an operand is syntactically boolean
fn is_boolean_operand(tokens: &[Token<'_>]) -> bool {
    let Some(first) = tokens.first() else {
        return false;
    };
    if tokens.len() == 1 {
        return first.kind == TokenKind::Literal && matches!(first.text, "true" | "false");
    }
    if first.is_punct("!") {
        return true;
    }
    if first.is_punct("(") && closes_at_end(tokens) {
        let inner = &tokens[1..tokens.len() - 1];
        return is_boolean_operand(inner) || has_logical_operator(inner);
    }

    let mut depth = 0usize;
    // unmatched top-level `<` tokens; generic argument lists close them again
    let mut open_angles = 0usize;
    let mut relational = false;
    let mut index = 0;
    while let Some(token) = tokens.get(index) {
        index += 1;
        if token.is_punct("(") || token.is_punct("[") {
            depth += 1;
        } else if token.is_punct(")") || token.is_punct("]") {
            depth = depth.saturating_sub(1);
        } else if depth > 0 {
            continue;
        } else if token.is_punct(">") {
            let run = angle_run(&tokens[index - 1..]);
            index += run.len - 1;
            if run.assigns {
                continue;
            }
            if open_angles >= run.len {
                open_angles -= run.len;
            } else if run.len == 1 {
                relational = true;
            }
            // two or more adjacent `>` without matching `<` are a shift
        } else if COMPARISONS.iter().any(|c| token.is_punct(c)) || token.is_keyword("is") {
            return true;
        } else if token.is_punct("<") {
            open_angles += 1;
        }
    }
    relational || open_angles > 0
}

/// Adjacent `>` tokens starting a slice; the lexer never joins them
struct AngleRun {
    len: usize,
    /// The run ends in `>=` written flush against it, as in `>>=`
    assigns: bool,
}

fn angle_run(tokens: &[Token<'_>]) -> AngleRun {
    let mut run = AngleRun {
        len: 1,
        assigns: false,
    };
    while let (Some(previous), Some(next)) = (tokens.get(run.len - 1), tokens.get(run.len)) {
        if previous.span.end.offset != next.span.start.offset {
            break;
        }
        if next.is_punct(">") {
            run.len += 1;
        } else {
            if next.is_punct(">=") {
                run.len += 1;
                run.assigns = true;
            }
            break;
        }
    }
    run
}

/// `&&` or `||` at the top level of a parenthesized operand
fn has_logical_operator(tokens: &[Token<'_>]) -> bool {
    let mut depth = 0usize;
    tokens.iter().any(|token| {
        if token.is_punct("(") || token.is_punct("[") {
            depth += 1;
        } else if token.is_punct(")") || token.is_punct("]") {
            depth = depth.saturating_sub(1);
        }
        depth == 0 && (token.is_punct("&&") || token.is_punct("||"))
    })
}

/// The `(` at the start of `tokens` is matched by the last token
fn closes_at_end(tokens: &[Token<'_>]) -> bool {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return i == tokens.len() - 1;
            }
        }
    }
    false
}

impl StyleRule for ShortCircuitOperator {
    fn id(&self) -> RuleId {
        RuleId::ShortCircuitOperator
    }

    fn description(&self) -> &'static str {
        "Use && and || instead of & and | when both operands are boolean"
    }

    fn applies_to(&self) -> Target {
        Target::Tokens
    }

    fn check(&self, ctx: &RuleContext<'_, '_>) -> Vec<Violation> {
        let tokens = ctx.significant;
        let mut violations = Vec::new();
        for (index, token) in tokens.iter().enumerate() {
            let replacement = if token.is_punct("&") {
                "&&"
            } else if token.is_punct("|") {
                "||"
            } else {
                continue;
            };
            // unary `&` (address-of) has no left operand
            if index == 0 || !follows_operand(&tokens[index - 1]) {
                continue;
            }
            let left = left_operand(tokens, index);
            let right = right_operand(tokens, index);
            if is_boolean_operand(left) && is_boolean_operand(right) {
                violations.push(
                    ctx.violation(
                        self.id(),
                        token.start(),
                        format!(
                            "'{}' evaluates both boolean operands; use '{}' to short-circuit",
                            token.text, replacement
                        ),
                    )
                    .with_suggestion(format!("replace '{}' with '{}'", token.text, replacement)),
                );
            }
        }
        violations
    }
}
