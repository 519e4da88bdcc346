//! Lexical analysis for C# source code.
//!
//! The lexer is a lazy iterator over [`Token`]s. Tokens and the spans of
//! [`LexError`]s together cover the whole input with no gaps or overlaps,
//! so trivia-sensitive rules can reason about physical lines.
//!
//! # Error recovery
//!
//! An unterminated regular string or char literal stops at the end of its
//! line; unterminated verbatim strings, raw strings and block comments run
//! to the end of input. Lexing then resumes, so a single pass reports every
//! malformed literal in a file.

use std::iter::Peekable;
use std::str::CharIndices;

use super::token::{is_keyword, is_literal_keyword, Position, Span, Token, TokenKind};

/// What went wrong while lexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
}

/// A malformed token, with the span the lexer consumed while recovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {position}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
    pub span: Span,
}

/// Three-character operators, checked before the two-character ones
const OPERATORS_3: &[&str] = &["??=", "<<="];

/// `>>` is intentionally absent: nested generic argument lists close with two `>` tokens
const OPERATORS_2: &[&str] = &[
    "&&", "||", "??", "?.", "=>", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "++", "--", "::", "->", "<<", "..",
];

const SINGLE_PUNCTUATION: &str = "{}()[];,.:?+-*/%&|^!~=<>";

/// A restartable, lazy tokenizer for C# source text.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    position: Position,
    /// Only whitespace seen since the last newline; preprocessor directives must start a line
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: Position::start(),
            at_line_start: true,
        }
    }

    /// A fresh lexer positioned at the beginning of the same source
    pub fn restart(&self) -> Self {
        Self::new(self.source)
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n` characters past the next one (`n = 0` is [`Self::peek_char`])
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (offset, c) = self.chars.next()?;
        self.position.offset = offset + c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(c)
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.position.offset..]
    }

    fn token(&self, kind: TokenKind, start: Position) -> Token<'src> {
        Token::new(
            kind,
            &self.source[start.offset..self.position.offset],
            Span::new(start, self.position),
        )
    }

    fn error(&self, kind: LexErrorKind, start: Position) -> LexError {
        LexError {
            kind,
            position: start,
            span: Span::new(start, self.position),
        }
    }

    fn lex_line_comment(&mut self) {
        self.advance_while(|c| c != '\n');
    }

    fn lex_block_comment(&mut self) -> Result<(), LexErrorKind> {
        self.advance_n(2);
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedComment),
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance_n(2);
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Counts consecutive `"` characters starting at the next character
    fn count_quotes(&self) -> usize {
        self.remaining().chars().take_while(|&c| c == '"').count()
    }

    /// Body of a `"..."` literal after the opening quote
    fn lex_regular_string_body(&mut self) -> Result<(), LexErrorKind> {
        loop {
            match self.peek_char() {
                None | Some('\n') => return Err(LexErrorKind::UnterminatedString),
                Some('\\') => {
                    self.advance();
                    if self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('"') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Body of a `@"..."` literal after the opening quote; `""` escapes a quote
    fn lex_verbatim_string_body(&mut self) -> Result<(), LexErrorKind> {
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('"') if self.peek_char_n(1) == Some('"') => self.advance_n(2),
                Some('"') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Raw string literal opened by `quotes` (three or more) quote characters
    fn lex_raw_string(&mut self, quotes: usize) -> Result<(), LexErrorKind> {
        self.advance_n(quotes);
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('"') => {
                    let run = self.count_quotes();
                    self.advance_n(run);
                    if run >= quotes {
                        return Ok(());
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Body of an interpolated string after the opening quote
    fn lex_interpolated_body(&mut self, verbatim: bool) -> Result<(), LexErrorKind> {
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('\n') if !verbatim => return Err(LexErrorKind::UnterminatedString),
                Some('\\') if !verbatim => {
                    self.advance();
                    if self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('"') if verbatim && self.peek_char_n(1) == Some('"') => self.advance_n(2),
                Some('"') => {
                    self.advance();
                    return Ok(());
                }
                Some('{') if self.peek_char_n(1) == Some('{') => self.advance_n(2),
                Some('{') => {
                    self.advance();
                    self.lex_interpolation_hole()?;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Expression hole of an interpolated string, after its `{`
    fn lex_interpolation_hole(&mut self) -> Result<(), LexErrorKind> {
        let mut depth = 1usize;
        loop {
            match self.peek_char() {
                None => return Err(LexErrorKind::UnterminatedString),
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some('"') => {
                    self.advance();
                    self.lex_regular_string_body()?;
                }
                Some('@') if self.peek_char_n(1) == Some('"') => {
                    self.advance_n(2);
                    self.lex_verbatim_string_body()?;
                }
                Some('$') => {
                    self.advance();
                    let verbatim = self.peek_char() == Some('@');
                    if verbatim {
                        self.advance();
                    }
                    if self.peek_char() == Some('"') {
                        self.advance();
                        self.lex_interpolated_body(verbatim)?;
                    }
                }
                Some('\'') => {
                    self.lex_char_literal()?;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// `$"..."`, `$@"..."`, `@$"..."` and `$$"""..."""`
    fn lex_interpolated_string(&mut self) -> Result<(), LexErrorKind> {
        let mut verbatim = false;
        while let Some(c) = self.peek_char() {
            match c {
                '$' => {
                    self.advance();
                }
                '@' => {
                    verbatim = true;
                    self.advance();
                }
                _ => break,
            }
        }
        let quotes = self.count_quotes();
        if quotes >= 3 {
            return self.lex_raw_string(quotes);
        }
        self.advance();
        self.lex_interpolated_body(verbatim)
    }

    fn lex_char_literal(&mut self) -> Result<(), LexErrorKind> {
        self.advance();
        if self.peek_char() == Some('\\') {
            self.advance_n(2);
        }
        loop {
            match self.peek_char() {
                None | Some('\n') => return Err(LexErrorKind::UnterminatedChar),
                Some('\'') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_number(&mut self) {
        let is_hex = self.remaining().starts_with("0x") || self.remaining().starts_with("0X");
        let mut previous = '\0';
        while let Some(c) = self.peek_char() {
            let continues = c.is_ascii_alphanumeric()
                || c == '_'
                || (c == '.' && self.peek_char_n(1).is_some_and(|n| n.is_ascii_digit()))
                || (matches!(c, '+' | '-')
                    && matches!(previous, 'e' | 'E')
                    && !is_hex
                    && self.peek_char_n(1).is_some_and(|n| n.is_ascii_digit()));
            if !continues {
                break;
            }
            previous = c;
            self.advance();
        }
    }

    fn lex_identifier(&mut self) {
        self.advance_while(|c| c.is_alphanumeric() || c == '_');
    }

    fn lex_punctuation(&mut self) -> Result<(), LexErrorKind> {
        let remaining = self.remaining();
        if let Some(op) = OPERATORS_3
            .iter()
            .chain(OPERATORS_2.iter())
            .find(|op| remaining.starts_with(**op))
        {
            self.advance_n(op.len());
            return Ok(());
        }
        match self.advance() {
            Some(c) if SINGLE_PUNCTUATION.contains(c) => Ok(()),
            Some(c) => Err(LexErrorKind::UnexpectedCharacter(c)),
            None => Ok(()),
        }
    }

    /// Lexes one token starting at `c`
    fn lex_token(&mut self, c: char) -> Result<TokenKind, LexErrorKind> {
        match c {
            c if c.is_whitespace() => {
                self.advance_while(char::is_whitespace);
                Ok(TokenKind::Whitespace)
            }
            '/' if self.peek_char_n(1) == Some('/') => {
                self.lex_line_comment();
                Ok(TokenKind::Comment)
            }
            '/' if self.peek_char_n(1) == Some('*') => {
                self.lex_block_comment().map(|_| TokenKind::Comment)
            }
            '#' if self.at_line_start => {
                self.lex_line_comment();
                Ok(TokenKind::Directive)
            }
            '"' => {
                let quotes = self.count_quotes();
                if quotes >= 3 {
                    self.lex_raw_string(quotes)?;
                } else {
                    self.advance();
                    self.lex_regular_string_body()?;
                }
                Ok(TokenKind::Literal)
            }
            '@' if self.peek_char_n(1) == Some('"') => {
                self.advance_n(2);
                self.lex_verbatim_string_body().map(|_| TokenKind::Literal)
            }
            '@' if self.peek_char_n(1) == Some('$') => {
                self.lex_interpolated_string().map(|_| TokenKind::Literal)
            }
            '@' if self.peek_char_n(1).is_some_and(|n| n.is_alphabetic() || n == '_') => {
                self.advance();
                self.lex_identifier();
                Ok(TokenKind::Identifier)
            }
            '$' if matches!(self.peek_char_n(1), Some('"' | '@' | '$')) => {
                self.lex_interpolated_string().map(|_| TokenKind::Literal)
            }
            '\'' => self.lex_char_literal().map(|_| TokenKind::Literal),
            c if c.is_ascii_digit() => {
                self.lex_number();
                Ok(TokenKind::Literal)
            }
            '.' if self.peek_char_n(1).is_some_and(|n| n.is_ascii_digit()) => {
                self.lex_number();
                Ok(TokenKind::Literal)
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = self.position.offset;
                self.lex_identifier();
                let text = &self.source[start..self.position.offset];
                if is_literal_keyword(text) {
                    Ok(TokenKind::Literal)
                } else if is_keyword(text) {
                    Ok(TokenKind::Keyword)
                } else {
                    Ok(TokenKind::Identifier)
                }
            }
            _ => self.lex_punctuation().map(|_| TokenKind::Punctuation),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.peek_char()?;
        let start = self.position;
        let result = self.lex_token(c);

        match result {
            Ok(TokenKind::Whitespace) => {
                let token = self.token(TokenKind::Whitespace, start);
                if token.text.contains('\n') {
                    self.at_line_start = true;
                }
                Some(Ok(token))
            }
            Ok(kind) => {
                self.at_line_start = false;
                Some(Ok(self.token(kind, start)))
            }
            Err(kind) => {
                self.at_line_start = false;
                Some(Err(self.error(kind, start)))
            }
        }
    }
}

/// Every token and lex error of one source file
#[derive(Debug, Clone, Default)]
pub struct TokenStream<'src> {
    pub tokens: Vec<Token<'src>>,
    pub errors: Vec<LexError>,
}

impl<'src> TokenStream<'src> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Tokens the structural parser consumes (no whitespace, comments or directives)
    pub fn significant(&self) -> Vec<Token<'src>> {
        self.tokens.iter().copied().filter(|t| !t.is_trivia()).collect()
    }
}

/// Lex an entire source file, collecting errors instead of stopping at them
pub fn tokenize(source: &str) -> TokenStream<'_> {
    let mut stream = TokenStream::default();
    for item in Lexer::new(source) {
        match item {
            Ok(token) => stream.tokens.push(token),
            Err(error) => {
                tracing::debug!("lex error: {}", error);
                stream.errors.push(error);
            }
        }
    }
    stream
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(source: &str) -> Vec<(TokenKind, &str)> {
        tokenize(source)
            .tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Whitespace)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    /// Tokens and error spans must tile the input exactly
    fn assert_full_coverage(source: &str) {
        let mut pieces: Vec<(usize, usize)> = Vec::new();
        for item in Lexer::new(source) {
            match item {
                Ok(token) => pieces.push((token.span.start.offset, token.span.end.offset)),
                Err(error) => pieces.push((error.span.start.offset, error.span.end.offset)),
            }
        }
        let mut cursor = 0;
        for (start, end) in pieces {
            assert_eq!(start, cursor, "gap or overlap at byte {cursor}");
            assert!(end > start, "empty token at byte {start}");
            cursor = end;
        }
        assert_eq!(cursor, source.len());
    }

    #[test]
    fn test_declaration_tokens() {
        let tokens = kinds_and_texts("public class DataService { }");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Keyword, "public"),
                (TokenKind::Keyword, "class"),
                (TokenKind::Identifier, "DataService"),
                (TokenKind::Punctuation, "{"),
                (TokenKind::Punctuation, "}"),
            ]
        );
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let stream = tokenize("int a;\n  var b = 1;");
        let b = stream.tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.span.start.line, b.span.start.column), (2, 7));
        let mut previous = None;
        for token in &stream.tokens {
            if let Some(prev) = previous {
                assert!(token.span.start.offset > prev);
            }
            previous = Some(token.span.start.offset);
        }
    }

    #[test]
    fn test_operators() {
        let tokens = kinds_and_texts("a && b || c ?? d => e != f & g | h");
        let ops: Vec<_> = tokens
            .iter()
            .filter(|(k, _)| *k == TokenKind::Punctuation)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(ops, vec!["&&", "||", "??", "=>", "!=", "&", "|"]);
    }

    #[test]
    fn test_nested_generics_close_with_single_angles() {
        let tokens = kinds_and_texts("List<List<int>> x;");
        let closers = tokens.iter().filter(|(_, t)| *t == ">").count();
        assert_eq!(closers, 2);
    }

    #[test]
    fn test_string_forms() {
        let source = r#"var a = "x\"y"; var b = @"c:\dir""q"; var c = $"{n} {"in"}"; var d = """raw "quoted" """;"#;
        let stream = tokenize(source);
        assert!(stream.errors.is_empty(), "{:?}", stream.errors);
        let literals: Vec<_> = stream
            .tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Literal)
            .map(|t| t.text)
            .collect();
        assert_eq!(
            literals,
            vec![
                r#""x\"y""#,
                r#"@"c:\dir""q""#,
                r#"$"{n} {"in"}""#,
                r#""""raw "quoted" """"#,
            ]
        );
        assert_full_coverage(source);
    }

    #[test]
    fn test_comments_and_directives() {
        let tokens = kinds_and_texts("#region Fields\n// note\n/* block */ int x; #notdirective");
        assert_eq!(tokens[0], (TokenKind::Directive, "#region Fields"));
        assert_eq!(tokens[1], (TokenKind::Comment, "// note"));
        assert_eq!(tokens[2], (TokenKind::Comment, "/* block */"));
    }

    #[test]
    fn test_unterminated_string_recovers_at_end_of_line() {
        let source = "var s = \"oops;\nint x = 1;";
        let stream = tokenize(source);
        assert_eq!(stream.errors.len(), 1);
        assert_eq!(stream.errors[0].kind, LexErrorKind::UnterminatedString);
        assert_eq!(stream.errors[0].position.line, 1);
        assert_eq!(stream.errors[0].position.column, 9);
        assert!(stream.tokens.iter().any(|t| t.text == "x" && t.line() == 2));
        assert_full_coverage(source);
    }

    #[test]
    fn test_multiple_errors_in_one_pass() {
        let source = "char c = 'a\nvar s = \"b\n/* never closed";
        let stream = tokenize(source);
        let kinds: Vec<_> = stream.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LexErrorKind::UnterminatedChar,
                LexErrorKind::UnterminatedString,
                LexErrorKind::UnterminatedComment,
            ]
        );
        assert_full_coverage(source);
    }

    #[test]
    fn test_unexpected_character() {
        let stream = tokenize("int a = 1 ` 2;");
        assert_eq!(stream.errors.len(), 1);
        assert_eq!(stream.errors[0].kind, LexErrorKind::UnexpectedCharacter('`'));
    }

    #[test]
    fn test_literal_keywords_and_numbers() {
        let tokens = kinds_and_texts("x = true; y = 1.5e-3f; z = 0xFF; w = null;");
        let literals: Vec<_> = tokens
            .iter()
            .filter(|(k, _)| *k == TokenKind::Literal)
            .map(|(_, t)| *t)
            .collect();
        assert_eq!(literals, vec!["true", "1.5e-3f", "0xFF", "null"]);
    }

    #[test]
    fn test_lexer_is_restartable() {
        let mut lexer = Lexer::new("a b c");
        let first: Vec<_> = lexer.by_ref().filter_map(Result::ok).map(|t| t.text).collect();
        let again: Vec<_> = lexer.restart().filter_map(Result::ok).map(|t| t.text).collect();
        assert_eq!(first, again);
    }
}
