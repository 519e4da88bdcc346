//! Shallow structural parser for C#
//!
//! Builds a [`ScopeTree`] from the significant tokens of a file. The parser
//! recognises declarations (namespaces, types, members, parameters, locals
//! and `using` directives) and skips expressions by bracket matching, which
//! is enough to classify every declared identifier by role.
//!
//! Errors are isolated: a malformed declaration is abandoned, the parser
//! resynchronizes at the next `;` or balanced `{ }` group of the enclosing
//! scope, and sibling declarations are still recorded.

use super::lexer::TokenStream;
use super::token::{is_contextual_keyword, is_predefined_type, Position, Token, TokenKind};
use super::tree::{
    Accessibility, Apparentness, Binding, DeclarationGroup, LocalInfo, MemberKind, Modifiers,
    Role, ScopeId, ScopeKind, ScopeTree, TypeKind, UsingDirective,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("missing identifier")]
    MissingIdentifier,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unclosed scope")]
    UnclosedScope,
}

/// A malformed declaration; parsing continued after it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {position}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: Position, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            message: message.into(),
        }
    }
}

/// Result of parsing one file: always a tree, plus any isolated errors
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub tree: ScopeTree,
    pub errors: Vec<ParseError>,
}

/// Parse the significant tokens of a lexed file
pub fn parse(stream: &TokenStream<'_>) -> ParseOutcome {
    Parser::new(stream.significant()).parse()
}

/// Where a local declaration appears; changes how it terminates and groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalContext {
    Statement,
    Constant,
    /// `for (int i = 0, j = 0; ...)`: declarators are not a declaration group
    ForInitializer,
    /// `using (var x = ...)`: terminated by `)`
    UsingResource,
}

/// A declared name collected before its binding can be classified
#[derive(Debug, Clone, Copy)]
struct Declarator<'src> {
    token: Token<'src>,
    uses_var: bool,
}

#[derive(Debug, Clone, Copy)]
struct ParsedType {
    is_var: bool,
}

#[derive(Debug, Default)]
struct MemberHeader {
    modifiers: Modifiers,
    has_attributes: bool,
}

/// Recursive-descent parser over significant tokens
pub struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    tree: ScopeTree,
    errors: Vec<ParseError>,
}

fn is_name(token: &Token<'_>) -> bool {
    token.is_identifier() || (token.kind == TokenKind::Keyword && is_contextual_keyword(token.text))
}

fn is_type_keyword(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Keyword && is_predefined_type(token.text)
}

fn closer(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token<'src>>) -> Self {
        Self {
            tokens,
            pos: 0,
            tree: ScopeTree::new(),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> ParseOutcome {
        let root = self.tree.root();
        self.parse_namespace_members(root, false, None);
        tracing::debug!(
            "parsed {} scopes with {} errors",
            self.tree.scope_count(),
            self.errors.len()
        );
        ParseOutcome {
            tree: self.tree,
            errors: self.errors,
        }
    }

    // Token cursor

    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<Token<'src>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn at_punct(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_punct(text))
    }

    fn at_keyword(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(text))
    }

    fn nth_is_punct(&self, n: usize, text: &str) -> bool {
        self.peek_at(n).is_some_and(|t| t.is_punct(text))
    }

    fn eat_punct(&mut self, text: &str) -> bool {
        if self.at_punct(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, text: &str) -> bool {
        if self.at_keyword(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_name(&mut self) -> Option<Token<'src>> {
        match self.peek() {
            Some(token) if is_name(&token) => self.bump(),
            _ => None,
        }
    }

    fn current_position(&self) -> Position {
        self.peek()
            .or_else(|| self.tokens.last().copied())
            .map(|t| t.start())
            .unwrap_or_default()
    }

    fn error(&mut self, kind: ParseErrorKind, message: impl Into<String>) {
        let error = ParseError::new(kind, self.current_position(), message);
        tracing::debug!("parse error: {}", error);
        self.errors.push(error);
    }

    fn unclosed(&mut self, open: Position, what: &str) {
        self.errors.push(ParseError::new(
            ParseErrorKind::UnclosedScope,
            open,
            format!("{what} opened here is never closed"),
        ));
    }

    // Skipping

    /// Consume a bracketed group starting at the current opener
    fn skip_balanced(&mut self) -> bool {
        let mut depth = 0usize;
        while let Some(token) = self.bump() {
            if token.kind != TokenKind::Punctuation {
                continue;
            }
            match token.text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Skip an expression up to a top-level token in `stops`, an unmatched
    /// closer, or a `;` outside any braces. Nothing terminating is consumed.
    /// Lambda block bodies are parsed so their locals are recorded.
    fn skip_expression(&mut self, scope: ScopeId, stops: &[&str]) {
        let mut open: Vec<&'static str> = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Punctuation {
                match token.text {
                    "{" if self.pos > 0 && self.tokens[self.pos - 1].is_punct("=>") => {
                        self.parse_block(scope);
                        continue;
                    }
                    "(" | "[" | "{" => open.push(closer(token.text)),
                    ")" | "]" | "}" => {
                        if open.pop().is_none() {
                            return;
                        }
                    }
                    ";" if !open.contains(&"}") => return,
                    text if open.is_empty() && stops.contains(&text) => return,
                    _ => {}
                }
            }
            self.pos += 1;
        }
    }

    fn skip_to_statement_end(&mut self, scope: ScopeId) {
        self.skip_expression(scope, &[]);
        self.eat_punct(";");
    }

    /// `( ... )` as in an `if` condition
    fn skip_parenthesized(&mut self, scope: ScopeId) {
        if self.eat_punct("(") {
            self.skip_expression(scope, &[]);
            if !self.eat_punct(")") {
                self.error(ParseErrorKind::UnexpectedToken, "expected ')'");
            }
        }
    }

    /// Resynchronize after a malformed member: stop after the next `;` or
    /// balanced `{ }` group, or before the `}` closing the enclosing scope
    fn recover_member(&mut self) {
        while let Some(token) = self.peek() {
            match token.text {
                ";" if token.kind == TokenKind::Punctuation => {
                    self.pos += 1;
                    return;
                }
                "}" if token.kind == TokenKind::Punctuation => return,
                "{" if token.kind == TokenKind::Punctuation => {
                    self.skip_balanced();
                    return;
                }
                "(" | "[" if token.kind == TokenKind::Punctuation => {
                    self.skip_balanced();
                }
                _ => self.pos += 1,
            }
        }
    }

    // Types

    /// Parse a type reference; the cursor is restored when none is present
    fn parse_type(&mut self) -> Option<ParsedType> {
        let start = self.pos;
        let token = self.peek()?;
        if token.is_punct("(") {
            if !self.parse_tuple_type() {
                self.pos = start;
                return None;
            }
        } else if is_name(&token) || is_type_keyword(&token) {
            self.pos += 1;
            loop {
                self.try_type_arguments();
                let qualified = (self.at_punct(".") || self.at_punct("::"))
                    && self.peek_at(1).is_some_and(|t| is_name(&t));
                if !qualified {
                    break;
                }
                self.pos += 2;
            }
        } else {
            return None;
        }
        let is_var = token.text == "var" && self.pos == start + 1;

        loop {
            if self.at_punct("?") || self.at_punct("*") {
                self.pos += 1;
            } else if self.at_punct("[") && (self.nth_is_punct(1, "]") || self.nth_is_punct(1, ",")) {
                while let Some(t) = self.bump() {
                    if t.is_punct("]") {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        Some(ParsedType { is_var })
    }

    fn parse_tuple_type(&mut self) -> bool {
        self.pos += 1;
        loop {
            if self.parse_type().is_none() {
                return false;
            }
            self.expect_name();
            if self.eat_punct(",") {
                continue;
            }
            return self.eat_punct(")");
        }
    }

    /// Consume `<...>` generic arguments if they are well formed
    fn try_type_arguments(&mut self) -> bool {
        if !self.at_punct("<") {
            return false;
        }
        let start = self.pos;
        self.pos += 1;
        let mut depth = 1usize;
        while let Some(token) = self.bump() {
            let allowed = match token.kind {
                TokenKind::Identifier => true,
                TokenKind::Keyword => {
                    is_predefined_type(token.text) || is_contextual_keyword(token.text)
                }
                TokenKind::Punctuation => match token.text {
                    "<" => {
                        depth += 1;
                        true
                    }
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            return true;
                        }
                        true
                    }
                    "," | "." | "::" | "?" | "[" | "]" | "(" | ")" | "*" => true,
                    _ => false,
                },
                _ => false,
            };
            if !allowed {
                break;
            }
        }
        self.pos = start;
        false
    }

    // Namespace level

    fn parse_namespace_members(&mut self, scope: ScopeId, inside_namespace: bool, open: Option<Position>) {
        loop {
            let Some(token) = self.peek() else {
                if let Some(open) = open {
                    self.unclosed(open, "namespace");
                }
                return;
            };
            if token.is_punct("}") {
                self.pos += 1;
                if open.is_some() {
                    return;
                }
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    token.start(),
                    "unmatched '}'",
                ));
                continue;
            }

            let start = self.pos;
            if self.is_using_directive() {
                self.parse_using_directive(scope, inside_namespace);
            } else if token.is_keyword("namespace") {
                if self.parse_namespace(scope, open) {
                    return;
                }
            } else if token.is_keyword("extern") && self.peek_at(1).is_some_and(|t| t.text == "alias") {
                self.skip_to_statement_end(scope);
            } else {
                let header = self.parse_member_header();
                if self.at_type_declaration() {
                    self.parse_type_declaration(scope, header);
                } else if header.has_attributes && header.modifiers == Modifiers::default() {
                    // assembly or module attributes
                } else {
                    self.pos = start;
                    self.parse_statement(scope);
                }
            }

            if self.pos == start {
                self.error(ParseErrorKind::UnexpectedToken, format!("unexpected '{}'", token.text));
                self.pos += 1;
            }
        }
    }

    fn is_using_directive(&self) -> bool {
        let mut i = self.pos;
        if self.tokens.get(i).is_some_and(|t| t.is_keyword("global")) {
            i += 1;
        }
        if !self.tokens.get(i).is_some_and(|t| t.is_keyword("using")) {
            return false;
        }
        i += 1;
        match self.tokens.get(i) {
            Some(t) if t.is_keyword("static") => true,
            Some(t) if is_name(t) => {
                i += 1;
                loop {
                    match self.tokens.get(i) {
                        Some(t) if t.is_punct(";") || t.is_punct("=") => return true,
                        Some(t) if t.is_punct(".") || t.is_punct("::") => {
                            if !self.tokens.get(i + 1).is_some_and(is_name) {
                                return false;
                            }
                            i += 2;
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    fn parse_using_directive(&mut self, scope: ScopeId, inside_namespace: bool) {
        let namespace = if inside_namespace {
            self.tree.scope(scope).name.clone()
        } else {
            None
        };
        let position = self.current_position();
        let is_global = self.eat_keyword("global");
        self.eat_keyword("using");
        let is_static = self.eat_keyword("static");
        let alias = match (self.peek(), self.peek_at(1)) {
            (Some(name), Some(eq)) if is_name(&name) && eq.is_punct("=") => {
                self.pos += 2;
                Some(name.identifier_name().to_string())
            }
            _ => None,
        };
        let mut target = String::new();
        while let Some(token) = self.peek() {
            if token.is_punct(";") || token.is_punct("}") {
                break;
            }
            target.push_str(token.text);
            self.pos += 1;
        }
        if !self.eat_punct(";") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ';' after using directive");
        }
        self.tree.add_using(UsingDirective {
            target,
            alias,
            is_static,
            is_global,
            position,
            inside_namespace,
            namespace,
        });
    }

    /// Returns true for a file-scoped namespace, which consumes the rest of its container
    fn parse_namespace(&mut self, scope: ScopeId, outer_open: Option<Position>) -> bool {
        self.pos += 1;
        let mut name = String::new();
        while let Some(token) = self.peek() {
            if is_name(&token) || token.is_punct(".") || token.is_punct("::") {
                name.push_str(token.text);
                self.pos += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            self.error(ParseErrorKind::MissingIdentifier, "namespace declaration without a name");
            self.recover_member();
            return false;
        }

        let namespace = self.tree.add_scope(ScopeKind::Namespace, Some(name), scope);
        if self.eat_punct(";") {
            self.parse_namespace_members(namespace, true, outer_open);
            return true;
        }
        if self.at_punct("{") {
            let open = self.current_position();
            self.pos += 1;
            self.parse_namespace_members(namespace, true, Some(open));
        } else {
            self.error(ParseErrorKind::UnexpectedToken, "expected '{' or ';' after namespace name");
            self.recover_member();
        }
        false
    }

    // Declarations shared by namespaces and type bodies

    fn parse_member_header(&mut self) -> MemberHeader {
        let mut header = MemberHeader::default();
        while let Some(token) = self.peek() {
            if token.is_punct("[") {
                header.modifiers.thread_static |= self.parse_attribute_section();
                header.has_attributes = true;
            } else if token.kind == TokenKind::Keyword
                && token.text != "new"
                && header.modifiers.apply(token.text)
            {
                self.pos += 1;
            } else if token.is_keyword("new") && !self.nth_is_punct(1, "(") && !self.nth_is_punct(1, "[") {
                self.pos += 1;
            } else if token.is_keyword("ref")
                && self
                    .peek_at(1)
                    .is_some_and(|t| t.is_keyword("struct") || t.is_keyword("partial") || t.is_keyword("readonly"))
            {
                self.pos += 1;
            } else if token.is_identifier()
                && token.text == "file"
                && self.peek_at(1).is_some_and(|t| t.kind == TokenKind::Keyword)
            {
                self.pos += 1;
            } else {
                break;
            }
        }
        header
    }

    /// Consume `[...]`; true when it names `ThreadStatic`
    fn parse_attribute_section(&mut self) -> bool {
        let mut thread_static = false;
        let mut depth = 0usize;
        while let Some(token) = self.bump() {
            match token.text {
                "[" | "(" if token.kind == TokenKind::Punctuation => depth += 1,
                "]" | ")" if token.kind == TokenKind::Punctuation => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                "ThreadStatic" | "ThreadStaticAttribute" if depth == 1 => thread_static = true,
                _ => {}
            }
        }
        thread_static
    }

    fn at_type_declaration(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        match token.text {
            "class" | "struct" | "interface" | "enum" | "delegate" => token.kind == TokenKind::Keyword,
            "record" => {
                token.kind == TokenKind::Keyword
                    && self.peek_at(1).is_some_and(|t| {
                        is_name(&t) || t.is_keyword("class") || t.is_keyword("struct")
                    })
            }
            _ => false,
        }
    }

    fn enclosing_type(&self, scope: ScopeId) -> Option<TypeKind> {
        self.tree.scope(scope).type_kind
    }

    fn parse_type_declaration(&mut self, scope: ScopeId, header: MemberHeader) {
        let Some(keyword) = self.bump() else {
            return;
        };
        let type_kind = match keyword.text {
            "class" => TypeKind::Class,
            "struct" => TypeKind::Struct,
            "interface" => TypeKind::Interface,
            "enum" => TypeKind::Enum,
            "delegate" => {
                self.parse_delegate(scope, header);
                return;
            }
            _ => {
                if !self.eat_keyword("class") {
                    self.eat_keyword("struct");
                }
                TypeKind::Record
            }
        };

        let Some(name) = self.expect_name() else {
            self.error(ParseErrorKind::MissingIdentifier, format!("{} declaration without a name", keyword.text));
            self.recover_member();
            return;
        };
        let role = if type_kind == TypeKind::Interface {
            Role::InterfaceName
        } else {
            Role::TypeName
        };
        let accessibility = match self.enclosing_type(scope) {
            Some(owner) => header.modifiers.effective_accessibility(owner),
            None => header.modifiers.accessibility,
        };
        self.tree.add_binding(
            scope,
            Binding::new(name.identifier_name(), role, MemberKind::Type, name.start())
                .with_accessibility(accessibility),
        );

        let type_scope = self
            .tree
            .add_type_scope(type_kind, name.identifier_name().to_string(), scope);
        self.parse_type_parameters(type_scope);

        if self.at_punct("(") {
            if type_kind == TypeKind::Record {
                self.parse_parameter_list(type_scope, Role::PublicMember, MemberKind::RecordProperty);
            } else {
                let constructor = self.tree.add_scope(
                    ScopeKind::Method,
                    Some(name.identifier_name().to_string()),
                    type_scope,
                );
                self.parse_parameter_list(constructor, Role::Parameter, MemberKind::Parameter);
            }
        }

        // base list and constraints
        while let Some(token) = self.peek() {
            if token.is_punct("{") || token.is_punct(";") || token.is_punct("}") {
                break;
            }
            if token.is_punct("(") {
                self.skip_balanced();
            } else {
                self.pos += 1;
            }
        }

        if self.at_punct("{") {
            let open = self.current_position();
            self.pos += 1;
            if type_kind == TypeKind::Enum {
                self.parse_enum_body(type_scope, open);
            } else {
                self.parse_type_body(type_scope, type_kind, open);
            }
            self.eat_punct(";");
        } else if !self.eat_punct(";") {
            self.error(ParseErrorKind::UnexpectedToken, "expected type body");
        }
    }

    fn parse_delegate(&mut self, scope: ScopeId, header: MemberHeader) {
        if self.parse_type().is_none() {
            self.error(ParseErrorKind::UnexpectedToken, "expected delegate return type");
            self.recover_member();
            return;
        }
        let Some(name) = self.expect_name() else {
            self.error(ParseErrorKind::MissingIdentifier, "delegate declaration without a name");
            self.recover_member();
            return;
        };
        self.tree.add_binding(
            scope,
            Binding::new(name.identifier_name(), Role::TypeName, MemberKind::Type, name.start())
                .with_accessibility(header.modifiers.accessibility),
        );
        let method = self
            .tree
            .add_scope(ScopeKind::Method, Some(name.identifier_name().to_string()), scope);
        self.parse_type_parameters(method);
        if self.at_punct("(") {
            self.parse_parameter_list(method, Role::Parameter, MemberKind::Parameter);
        }
        self.skip_constraints();
        if !self.eat_punct(";") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ';' after delegate declaration");
            self.recover_member();
        }
    }

    fn parse_type_parameters(&mut self, scope: ScopeId) {
        if !self.eat_punct("<") {
            return;
        }
        loop {
            while self.at_punct("[") {
                self.parse_attribute_section();
            }
            if !self.eat_keyword("in") {
                self.eat_keyword("out");
            }
            match self.expect_name() {
                Some(name) => {
                    self.tree.add_binding(
                        scope,
                        Binding::new(
                            name.identifier_name(),
                            Role::TypeParameter,
                            MemberKind::TypeParameter,
                            name.start(),
                        ),
                    );
                }
                None => {
                    self.error(ParseErrorKind::MissingIdentifier, "expected type parameter name");
                    while let Some(token) = self.bump() {
                        if token.is_punct(">") {
                            break;
                        }
                    }
                    return;
                }
            }
            if self.eat_punct(",") {
                continue;
            }
            if !self.eat_punct(">") {
                self.error(ParseErrorKind::UnexpectedToken, "expected '>' after type parameters");
            }
            return;
        }
    }

    /// `(...)` or `[...]` parameter list; the cursor must be at the opener
    fn parse_parameter_list(&mut self, scope: ScopeId, role: Role, kind: MemberKind) {
        let Some(open) = self.bump() else {
            return;
        };
        let close = closer(open.text);
        let accessibility = if role == Role::PublicMember {
            Accessibility::Public
        } else {
            Accessibility::Unspecified
        };
        if self.eat_punct(close) {
            return;
        }
        loop {
            while self.at_punct("[") {
                self.parse_attribute_section();
            }
            while self.peek().is_some_and(|t| {
                matches!(t.text, "this" | "ref" | "out" | "in" | "params" | "readonly")
                    && t.kind == TokenKind::Keyword
                    || t.is_identifier() && t.text == "scoped"
            }) {
                self.pos += 1;
            }
            if self.parse_type().is_none() {
                self.error(ParseErrorKind::UnexpectedToken, "expected parameter type");
                break;
            }
            let Some(name) = self.expect_name() else {
                self.error(ParseErrorKind::MissingIdentifier, "parameter without a name");
                break;
            };
            self.tree.add_binding(
                scope,
                Binding::new(name.identifier_name(), role, kind, name.start())
                    .with_accessibility(accessibility),
            );
            if self.eat_punct("=") {
                self.skip_expression(scope, &[","]);
            }
            if self.eat_punct(",") {
                continue;
            }
            if self.eat_punct(close) {
                return;
            }
            self.error(ParseErrorKind::UnexpectedToken, format!("expected ',' or '{close}'"));
            break;
        }
        self.skip_expression(scope, &[]);
        self.eat_punct(close);
    }

    /// `where T : ...` clauses ahead of a body
    fn skip_constraints(&mut self) {
        while self.at_keyword("where") {
            while let Some(token) = self.peek() {
                if token.is_punct("{") || token.is_punct(";") || token.is_punct("=>") || token.is_punct("}") {
                    break;
                }
                if token.is_punct("(") {
                    self.skip_balanced();
                } else {
                    self.pos += 1;
                }
            }
        }
    }

    // Type bodies

    fn parse_type_body(&mut self, scope: ScopeId, owner: TypeKind, open: Position) {
        loop {
            let Some(token) = self.peek() else {
                self.unclosed(open, "type body");
                return;
            };
            if token.is_punct("}") {
                self.pos += 1;
                return;
            }
            if token.is_punct(";") {
                self.pos += 1;
                continue;
            }
            let start = self.pos;
            if !self.parse_member(scope, owner) {
                self.recover_member();
            }
            if self.pos == start {
                self.error(ParseErrorKind::UnexpectedToken, format!("unexpected '{}'", token.text));
                self.pos += 1;
            }
        }
    }

    fn parse_enum_body(&mut self, scope: ScopeId, open: Position) {
        loop {
            while self.at_punct("[") {
                self.parse_attribute_section();
            }
            let Some(token) = self.peek() else {
                self.unclosed(open, "enum body");
                return;
            };
            if token.is_punct("}") {
                self.pos += 1;
                return;
            }
            match self.expect_name() {
                Some(name) => {
                    self.tree.add_binding(
                        scope,
                        Binding::new(name.identifier_name(), Role::PublicMember, MemberKind::EnumMember, name.start())
                            .with_accessibility(Accessibility::Public),
                    );
                    if self.eat_punct("=") {
                        self.skip_expression(scope, &[","]);
                    }
                    if !self.eat_punct(",") && !self.at_punct("}") {
                        self.error(ParseErrorKind::UnexpectedToken, "expected ',' between enum members");
                        self.recover_member();
                    }
                }
                None => {
                    self.error(ParseErrorKind::MissingIdentifier, "expected enum member name");
                    self.pos += 1;
                }
            }
        }
    }

    /// Parse one member; false when it was malformed and the caller must recover
    fn parse_member(&mut self, scope: ScopeId, owner: TypeKind) -> bool {
        let header = self.parse_member_header();
        let Some(token) = self.peek() else {
            return true;
        };
        if token.is_punct("}") {
            return true;
        }
        if self.at_type_declaration() {
            self.parse_type_declaration(scope, header);
            return true;
        }
        if token.is_keyword("event") {
            self.pos += 1;
            return self.parse_event(scope, owner, &header);
        }
        if token.is_keyword("implicit") || token.is_keyword("explicit") {
            self.pos += 1;
            if !self.eat_keyword("operator") || self.parse_type().is_none() {
                self.error(ParseErrorKind::UnexpectedToken, "malformed conversion operator");
                return false;
            }
            return self.parse_method_rest(scope, "operator");
        }
        if token.is_punct("~") {
            self.pos += 1;
            if self.expect_name().is_none() {
                self.error(ParseErrorKind::MissingIdentifier, "finalizer without a name");
                return false;
            }
            return self.parse_method_rest(scope, "finalizer");
        }
        if is_name(&token) && self.nth_is_punct(1, "(") {
            self.pos += 1;
            return self.parse_method_rest(scope, token.identifier_name());
        }

        if self.eat_keyword("ref") {
            self.eat_keyword("readonly");
        }
        if self.parse_type().is_none() {
            self.error(ParseErrorKind::UnexpectedToken, format!("expected a member declaration, found '{}'", token.text));
            return false;
        }

        if self.at_keyword("this") && self.nth_is_punct(1, "[") {
            self.pos += 1;
            let indexer = self.tree.add_scope(ScopeKind::Method, Some("this".into()), scope);
            self.parse_parameter_list(indexer, Role::Parameter, MemberKind::Parameter);
            return self.parse_accessors(indexer);
        }
        if self.eat_keyword("operator") {
            while let Some(t) = self.peek() {
                if t.is_punct("(") {
                    break;
                }
                self.pos += 1;
            }
            return self.parse_method_rest(scope, "operator");
        }

        let Some(name) = self.expect_name() else {
            self.error(ParseErrorKind::MissingIdentifier, "member declaration without a name");
            return false;
        };
        let (name, explicit) = self.parse_explicit_interface_name(name);

        match self.peek() {
            Some(t) if t.is_punct("(") || t.is_punct("<") => {
                if !explicit {
                    self.add_member(scope, owner, &header, name, MemberKind::Method, None);
                }
                self.parse_method_rest(scope, name.identifier_name())
            }
            Some(t) if t.is_punct("{") || t.is_punct("=>") => {
                if !explicit {
                    self.add_member(scope, owner, &header, name, MemberKind::Property, None);
                }
                let accessors = self
                    .tree
                    .add_scope(ScopeKind::Method, Some(name.identifier_name().to_string()), scope);
                self.parse_accessors(accessors)
            }
            Some(t) if t.is_punct("=") || t.is_punct(";") || t.is_punct(",") || t.is_punct("[") => {
                self.parse_field_declarators(scope, owner, &header, name, MemberKind::Field)
            }
            _ => {
                self.error(ParseErrorKind::UnexpectedToken, "expected field, property or method body");
                false
            }
        }
    }

    /// `IFoo.Bar` or `IFoo<T>.Bar`: returns the last segment and whether it was qualified
    fn parse_explicit_interface_name(&mut self, mut name: Token<'src>) -> (Token<'src>, bool) {
        let mut explicit = false;
        loop {
            let save = self.pos;
            self.try_type_arguments();
            if self.at_punct(".") && self.peek_at(1).is_some_and(|t| is_name(&t) || t.is_keyword("this")) {
                self.pos += 1;
                explicit = true;
                match self.peek() {
                    Some(t) if is_name(&t) => {
                        name = t;
                        self.pos += 1;
                    }
                    _ => return (name, explicit),
                }
            } else {
                self.pos = save;
                return (name, explicit);
            }
        }
    }

    fn add_member(
        &mut self,
        scope: ScopeId,
        owner: TypeKind,
        header: &MemberHeader,
        name: Token<'src>,
        kind: MemberKind,
        group: Option<DeclarationGroup>,
    ) {
        let role = Role::for_member(kind, &header.modifiers, owner);
        let accessibility = header.modifiers.effective_accessibility(owner);
        self.tree.add_binding(
            scope,
            Binding::new(name.identifier_name(), role, kind, name.start())
                .with_accessibility(accessibility)
                .with_group(group),
        );
    }

    fn parse_field_declarators(
        &mut self,
        scope: ScopeId,
        owner: TypeKind,
        header: &MemberHeader,
        first: Token<'src>,
        kind: MemberKind,
    ) -> bool {
        let id = self.tree.next_group_id();
        let mut name = first;
        let mut index = 0;
        loop {
            self.add_member(scope, owner, header, name, kind, Some(DeclarationGroup { id, index }));
            if self.at_punct("[") {
                self.skip_balanced();
            }
            if self.eat_punct("=") {
                self.skip_expression(scope, &[","]);
            }
            if !self.eat_punct(",") {
                break;
            }
            match self.expect_name() {
                Some(next) => name = next,
                None => {
                    self.error(ParseErrorKind::MissingIdentifier, "expected declarator after ','");
                    return false;
                }
            }
            index += 1;
        }
        if !self.eat_punct(";") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ';' after field declaration");
            return false;
        }
        true
    }

    fn parse_event(&mut self, scope: ScopeId, owner: TypeKind, header: &MemberHeader) -> bool {
        if self.parse_type().is_none() {
            self.error(ParseErrorKind::UnexpectedToken, "expected event type");
            return false;
        }
        let Some(name) = self.expect_name() else {
            self.error(ParseErrorKind::MissingIdentifier, "event declaration without a name");
            return false;
        };
        let (name, explicit) = self.parse_explicit_interface_name(name);
        if self.at_punct("{") {
            if !explicit {
                self.add_member(scope, owner, header, name, MemberKind::Event, None);
            }
            let accessors = self
                .tree
                .add_scope(ScopeKind::Method, Some(name.identifier_name().to_string()), scope);
            return self.parse_accessors(accessors);
        }
        self.parse_field_declarators(scope, owner, header, name, MemberKind::Event)
    }

    /// Type parameters, parameters, constraints and body of a method-like member
    fn parse_method_rest(&mut self, scope: ScopeId, name: &str) -> bool {
        let method = self.tree.add_scope(ScopeKind::Method, Some(name.to_string()), scope);
        self.parse_type_parameters(method);
        if !self.at_punct("(") {
            self.error(ParseErrorKind::UnexpectedToken, "expected parameter list");
            return false;
        }
        self.parse_parameter_list(method, Role::Parameter, MemberKind::Parameter);
        if self.eat_punct(":") {
            // constructor initializer
            if self.eat_keyword("base") || self.eat_keyword("this") {
                if self.at_punct("(") {
                    self.skip_balanced();
                }
            }
        }
        self.skip_constraints();
        self.parse_method_body(method)
    }

    fn parse_method_body(&mut self, method: ScopeId) -> bool {
        if self.at_punct("{") {
            self.parse_block(method);
            true
        } else if self.eat_punct("=>") {
            self.skip_to_statement_end(method);
            true
        } else if self.eat_punct(";") {
            true
        } else {
            self.error(ParseErrorKind::UnexpectedToken, "expected method body");
            false
        }
    }

    /// Accessor list `{ get; set; }`, or an expression body
    fn parse_accessors(&mut self, scope: ScopeId) -> bool {
        if self.eat_punct("=>") {
            self.skip_to_statement_end(scope);
            return true;
        }
        if !self.at_punct("{") {
            self.error(ParseErrorKind::UnexpectedToken, "expected accessor list");
            return false;
        }
        let open = self.current_position();
        self.pos += 1;
        loop {
            let _ = self.parse_member_header();
            let Some(token) = self.peek() else {
                self.unclosed(open, "accessor list");
                return true;
            };
            if token.is_punct("}") {
                self.pos += 1;
                break;
            }
            if !matches!(token.text, "get" | "set" | "init" | "add" | "remove") {
                self.error(ParseErrorKind::UnexpectedToken, format!("unexpected '{}' in accessor list", token.text));
                self.recover_member();
                continue;
            }
            self.pos += 1;
            if self.eat_punct(";") {
                continue;
            }
            if !self.parse_method_body(scope) {
                self.recover_member();
            }
        }
        if self.eat_punct("=") {
            self.skip_to_statement_end(scope);
        }
        true
    }

    // Statements

    fn parse_block(&mut self, parent: ScopeId) {
        let open = self.current_position();
        self.pos += 1;
        let scope = self.tree.add_scope(ScopeKind::Block, None, parent);
        loop {
            let Some(token) = self.peek() else {
                self.unclosed(open, "block");
                return;
            };
            if token.is_punct("}") {
                self.pos += 1;
                return;
            }
            self.parse_statement_guarded(scope);
        }
    }

    fn parse_statement_guarded(&mut self, scope: ScopeId) {
        let start = self.pos;
        self.parse_statement(scope);
        if self.pos == start {
            if let Some(token) = self.peek() {
                self.error(ParseErrorKind::UnexpectedToken, format!("unexpected '{}'", token.text));
            }
            self.pos += 1;
        }
    }

    /// Body of `if`, `while`, `for` and similar
    fn parse_embedded(&mut self, scope: ScopeId) {
        match self.peek() {
            Some(t) if t.is_punct("}") => {}
            Some(_) => self.parse_statement_guarded(scope),
            None => {}
        }
    }

    fn parse_statement(&mut self, scope: ScopeId) {
        let Some(token) = self.peek() else {
            return;
        };
        match (token.kind, token.text) {
            (TokenKind::Punctuation, "{") => self.parse_block(scope),
            (TokenKind::Punctuation, ";") => self.pos += 1,
            (TokenKind::Keyword, "if" | "while" | "lock" | "fixed") => {
                self.pos += 1;
                self.skip_parenthesized(scope);
                self.parse_embedded(scope);
            }
            (TokenKind::Keyword, "else" | "try" | "finally") => {
                self.pos += 1;
                self.parse_embedded(scope);
            }
            (TokenKind::Keyword, "checked" | "unchecked" | "unsafe") if self.nth_is_punct(1, "{") => {
                self.pos += 1;
                self.parse_block(scope);
            }
            (TokenKind::Keyword, "do") => {
                self.pos += 1;
                self.parse_embedded(scope);
                if self.eat_keyword("while") {
                    self.skip_to_statement_end(scope);
                }
            }
            (TokenKind::Keyword, "catch") => {
                self.pos += 1;
                self.skip_parenthesized(scope);
                if self.eat_keyword("when") {
                    self.skip_parenthesized(scope);
                }
                self.parse_embedded(scope);
            }
            (TokenKind::Keyword, "switch") => self.parse_switch(scope),
            (TokenKind::Keyword, "for") => self.parse_for(scope),
            (TokenKind::Keyword, "foreach") => self.parse_foreach(scope),
            (TokenKind::Keyword, "await") if self.peek_at(1).is_some_and(|t| t.is_keyword("foreach")) => {
                self.pos += 1;
                self.parse_foreach(scope);
            }
            (TokenKind::Keyword, "await") if self.peek_at(1).is_some_and(|t| t.is_keyword("using")) => {
                self.pos += 1;
                self.parse_using_statement(scope);
            }
            (TokenKind::Keyword, "using") => self.parse_using_statement(scope),
            (TokenKind::Keyword, "const") => {
                self.pos += 1;
                if !self.parse_local_declaration(scope, LocalContext::Constant) {
                    self.error(ParseErrorKind::UnexpectedToken, "malformed local constant");
                    self.skip_to_statement_end(scope);
                }
            }
            (TokenKind::Keyword, "return" | "throw" | "break" | "continue" | "goto" | "yield" | "await") => {
                self.skip_to_statement_end(scope);
            }
            (TokenKind::Identifier, _) if self.nth_is_punct(1, ":") => self.pos += 2,
            _ => self.parse_declaration_or_expression(scope),
        }
    }

    fn parse_switch(&mut self, scope: ScopeId) {
        self.pos += 1;
        self.skip_parenthesized(scope);
        if !self.at_punct("{") {
            self.error(ParseErrorKind::UnexpectedToken, "expected switch body");
            return;
        }
        let open = self.current_position();
        self.pos += 1;
        let body = self.tree.add_scope(ScopeKind::Block, None, scope);
        loop {
            let Some(token) = self.peek() else {
                self.unclosed(open, "switch body");
                return;
            };
            if token.is_punct("}") {
                self.pos += 1;
                return;
            }
            if token.is_keyword("case") {
                self.pos += 1;
                self.skip_expression(body, &[":"]);
                self.eat_punct(":");
            } else if token.is_keyword("default") && self.nth_is_punct(1, ":") {
                self.pos += 2;
            } else {
                self.parse_statement_guarded(body);
            }
        }
    }

    fn parse_for(&mut self, scope: ScopeId) {
        self.pos += 1;
        if !self.eat_punct("(") {
            self.error(ParseErrorKind::UnexpectedToken, "expected '(' after for");
            return;
        }
        let for_scope = self.tree.add_scope(ScopeKind::Block, None, scope);
        if !self.eat_punct(";") && !self.parse_local_declaration(for_scope, LocalContext::ForInitializer) {
            self.skip_to_statement_end(for_scope);
        }
        self.skip_to_statement_end(for_scope);
        self.skip_expression(for_scope, &[]);
        if !self.eat_punct(")") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ')' after for header");
        }
        self.parse_embedded(for_scope);
    }

    fn parse_foreach(&mut self, scope: ScopeId) {
        self.pos += 1;
        if !self.eat_punct("(") {
            self.error(ParseErrorKind::UnexpectedToken, "expected '(' after foreach");
            return;
        }
        let foreach_scope = self.tree.add_scope(ScopeKind::Block, None, scope);
        if self.eat_keyword("ref") {
            self.eat_keyword("readonly");
        }

        let declarators = if self.at_keyword("var") && self.nth_is_punct(1, "(") {
            self.pos += 1;
            self.parse_deconstruction(true)
        } else if self.at_punct("(") {
            self.parse_deconstruction(false)
        } else {
            self.parse_type().and_then(|ty| {
                self.expect_name().map(|token| {
                    vec![Declarator {
                        token,
                        uses_var: ty.is_var,
                    }]
                })
            })
        };

        match declarators {
            Some(declarators) if self.at_keyword("in") => {
                for declarator in declarators {
                    self.add_local(
                        foreach_scope,
                        declarator,
                        true,
                        Apparentness::NotApplicable,
                        Role::LocalVariable,
                        None,
                    );
                }
            }
            _ => self.error(ParseErrorKind::MissingIdentifier, "malformed foreach iteration variable"),
        }
        self.skip_expression(foreach_scope, &[]);
        if !self.eat_punct(")") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ')' after foreach header");
        }
        self.parse_embedded(foreach_scope);
    }

    fn parse_using_statement(&mut self, scope: ScopeId) {
        self.pos += 1;
        if self.eat_punct("(") {
            let resource = self.tree.add_scope(ScopeKind::Block, None, scope);
            if !self.parse_local_declaration(resource, LocalContext::UsingResource) {
                self.skip_expression(resource, &[]);
            }
            if !self.eat_punct(")") {
                self.error(ParseErrorKind::UnexpectedToken, "expected ')' after using resource");
            }
            self.parse_embedded(resource);
        } else if !self.parse_local_declaration(scope, LocalContext::Statement) {
            self.skip_to_statement_end(scope);
        }
    }

    fn parse_declaration_or_expression(&mut self, scope: ScopeId) {
        if self.parse_local_function(scope) || self.parse_local_declaration(scope, LocalContext::Statement) {
            return;
        }
        self.skip_to_statement_end(scope);
    }

    fn parse_local_function(&mut self, scope: ScopeId) -> bool {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|t| matches!(t.text, "static" | "async" | "unsafe" | "extern") && t.kind == TokenKind::Keyword)
        {
            self.pos += 1;
        }
        let is_function = self.parse_type().is_some()
            && self.peek().is_some_and(|t| is_name(&t))
            && (self.nth_is_punct(1, "(") || self.nth_is_punct(1, "<"));
        let name = if is_function { self.bump() } else { None };
        let Some(name) = name else {
            self.pos = start;
            return false;
        };
        // `Foo<T> Bar<...` could still be a comparison chain; require a parameter list
        let save = self.pos;
        if self.at_punct("<") && !self.try_type_arguments() {
            self.pos = start;
            return false;
        }
        if !self.at_punct("(") {
            self.pos = start;
            return false;
        }
        self.pos = save;

        self.tree.add_binding(
            scope,
            Binding::new(name.identifier_name(), Role::PrivateMember, MemberKind::LocalFunction, name.start())
                .with_accessibility(Accessibility::Private),
        );
        if !self.parse_method_rest(scope, name.identifier_name()) {
            self.recover_member();
        }
        true
    }

    /// Parse a local declaration at the cursor; restores the cursor and
    /// returns false when the tokens are not a declaration
    fn parse_local_declaration(&mut self, scope: ScopeId, context: LocalContext) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|t| {
            (t.is_identifier() && t.text == "scoped") || t.is_keyword("ref") || t.is_keyword("readonly")
        }) {
            self.pos += 1;
        }

        if self.at_keyword("var") && self.nth_is_punct(1, "(") {
            self.pos += 1;
            return self.finish_deconstruction(scope, start, true);
        }
        if self.at_punct("(") && context == LocalContext::Statement {
            return self.finish_deconstruction(scope, start, false);
        }

        let Some(ty) = self.parse_type() else {
            self.pos = start;
            return false;
        };
        let declares = self.peek().is_some_and(|t| is_name(&t))
            && self.peek_at(1).is_some_and(|t| {
                t.is_punct("=")
                    || t.is_punct(";")
                    || t.is_punct(",")
                    || (context == LocalContext::UsingResource && t.is_punct(")"))
            });
        if !declares {
            self.pos = start;
            return false;
        }

        let group = match context {
            LocalContext::ForInitializer => None,
            _ => Some(self.tree.next_group_id()),
        };
        let role = if context == LocalContext::Constant {
            Role::Constant
        } else {
            Role::LocalVariable
        };
        let mut index = 0;
        loop {
            let Some(token) = self.expect_name() else {
                self.error(ParseErrorKind::MissingIdentifier, "expected declarator after ','");
                self.skip_to_statement_end(scope);
                return true;
            };
            let apparentness = if self.eat_punct("=") {
                let initializer_start = self.pos;
                self.skip_expression(scope, &[","]);
                classify_initializer(&self.tokens[initializer_start..self.pos])
            } else {
                Apparentness::NotApplicable
            };
            let declarator = Declarator {
                token,
                uses_var: ty.is_var,
            };
            let group = group.map(|id| DeclarationGroup { id, index });
            self.add_local(scope, declarator, false, apparentness, role, group);
            if !self.eat_punct(",") {
                break;
            }
            index += 1;
        }
        if context != LocalContext::UsingResource && !self.eat_punct(";") {
            self.error(ParseErrorKind::UnexpectedToken, "expected ';' after local declaration");
            self.skip_to_statement_end(scope);
        }
        true
    }

    /// `var (a, b) = ...;` or `(int a, string b) = ...;`
    fn finish_deconstruction(&mut self, scope: ScopeId, start: usize, uses_var: bool) -> bool {
        let declarators = self.parse_deconstruction(uses_var);
        let Some(declarators) = declarators.filter(|_| self.at_punct("=")) else {
            self.pos = start;
            return false;
        };
        self.pos += 1;
        let initializer_start = self.pos;
        self.skip_expression(scope, &[]);
        let apparentness = classify_initializer(&self.tokens[initializer_start..self.pos]);
        for declarator in declarators {
            self.add_local(scope, declarator, false, apparentness, Role::LocalVariable, None);
        }
        self.eat_punct(";");
        true
    }

    /// Names inside a deconstruction pattern. Under `var` bare names are
    /// declarations; otherwise every element needs an explicit type.
    fn parse_deconstruction(&mut self, uses_var: bool) -> Option<Vec<Declarator<'src>>> {
        if !self.eat_punct("(") {
            return None;
        }
        let mut declarators = Vec::new();
        loop {
            if self.at_punct("(") {
                declarators.extend(self.parse_deconstruction(uses_var)?);
            } else if uses_var {
                let token = self.expect_name()?;
                if token.text != "_" {
                    declarators.push(Declarator { token, uses_var });
                }
            } else {
                let ty = self.parse_type()?;
                let token = self.expect_name()?;
                if token.text != "_" {
                    declarators.push(Declarator {
                        token,
                        uses_var: ty.is_var,
                    });
                }
            }
            if self.eat_punct(",") {
                continue;
            }
            return self.eat_punct(")").then_some(declarators);
        }
    }

    fn add_local(
        &mut self,
        scope: ScopeId,
        declarator: Declarator<'src>,
        in_foreach: bool,
        apparentness: Apparentness,
        role: Role,
        group: Option<DeclarationGroup>,
    ) {
        let token = declarator.token;
        self.tree.add_binding(
            scope,
            Binding::new(token.identifier_name(), role, MemberKind::Local, token.start())
                .with_local(LocalInfo {
                    uses_var: declarator.uses_var,
                    in_foreach,
                    apparentness,
                })
                .with_group(group),
        );
    }
}

/// Index just past the bracketed group opening at `tokens[open]`
fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.kind != TokenKind::Punctuation {
            continue;
        }
        match token.text {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_type_token(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier => true,
        TokenKind::Keyword => is_predefined_type(token.text) || is_contextual_keyword(token.text),
        TokenKind::Punctuation => matches!(token.text, "." | "::" | "<" | ">" | "," | "?" | "[" | "]"),
        _ => false,
    }
}

/// Whether an initializer's type is apparent from the expression itself.
///
/// Apparent initializers are a complete `new` expression, a literal
/// (optionally negated) or an explicit cast. A parenthesized apparent
/// expression is apparent too.
pub fn classify_initializer(tokens: &[Token<'_>]) -> Apparentness {
    let apparent = match tokens {
        [] => false,
        [literal] => literal.kind == TokenKind::Literal,
        [sign, literal] if sign.is_punct("-") || sign.is_punct("+") => literal.kind == TokenKind::Literal,
        [first, ..] if first.is_keyword("new") => is_complete_new_expression(tokens),
        [first, ..] if first.is_punct("(") => match matching_close(tokens, 0) {
            Some(end) if end == tokens.len() => {
                classify_initializer(&tokens[1..end - 1]) == Apparentness::Apparent
            }
            Some(end) => is_cast(tokens, end),
            None => false,
        },
        _ => false,
    };
    if apparent {
        Apparentness::Apparent
    } else {
        Apparentness::NotApparent
    }
}

/// `new T(...)`, `new T[n]`, `new T { ... }`, `new[] { ... }` with nothing chained after
fn is_complete_new_expression(tokens: &[Token<'_>]) -> bool {
    let mut i = 1;
    while tokens.get(i).is_some_and(|t| is_type_token(t) && !t.is_punct("[")) {
        i += 1;
    }
    while let Some(token) = tokens.get(i) {
        if !(token.is_punct("(") || token.is_punct("[") || token.is_punct("{")) {
            return false;
        }
        match matching_close(tokens, i) {
            Some(end) => i = end,
            None => return false,
        }
    }
    true
}

/// `(T)operand`, where `close` is the index just past `)`
fn is_cast(tokens: &[Token<'_>], close: usize) -> bool {
    let inner = &tokens[1..close - 1];
    if inner.is_empty() || !inner.iter().all(is_type_token) || inner[0].kind == TokenKind::Punctuation {
        return false;
    }
    let Some(operand) = tokens.get(close) else {
        return false;
    };
    match operand.kind {
        TokenKind::Identifier | TokenKind::Literal | TokenKind::Keyword => true,
        TokenKind::Punctuation => {
            operand.is_punct("(")
                || ((operand.is_punct("-") || operand.is_punct("!") || operand.is_punct("~"))
                    && inner.len() == 1
                    && is_type_keyword(&inner[0]))
        }
        _ => false,
    }
}
