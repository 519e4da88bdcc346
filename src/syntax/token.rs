//! Token types produced by the C# lexer

use std::fmt;

/// A location in source text. Lines and columns are 1-based; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Byte offset into the source
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Position of the first character of a file
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Punctuation,
    /// String, char, numeric and `true` / `false` / `null` literals
    Literal,
    Comment,
    Whitespace,
    /// Preprocessor line such as `#region` or `#if DEBUG`
    Directive,
}

impl TokenKind {
    /// Trivia is skipped by the structural parser
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment | Self::Directive)
    }
}

/// A lexed token borrowing its text from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn start(&self) -> Position {
        self.span.start
    }

    pub fn line(&self) -> u32 {
        self.span.start.line
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Punctuation token with exactly this text
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    /// Keyword token with exactly this text
    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier text with a verbatim `@` prefix removed
    pub fn identifier_name(&self) -> &'src str {
        self.text.strip_prefix('@').unwrap_or(self.text)
    }
}

/// Reserved C# keywords
const RESERVED_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "finally", "fixed", "float", "for", "foreach",
    "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock", "long",
    "namespace", "new", "object", "operator", "out", "override", "params", "private",
    "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof",
    "stackalloc", "static", "string", "struct", "switch", "this", "throw", "try", "typeof",
    "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile",
    "while",
];

/// Contextual keywords the structural parser relies on
const CONTEXTUAL_KEYWORDS: &[&str] = &[
    "async", "await", "global", "partial", "record", "required", "var", "when", "where",
    "yield",
];

/// Built-in type keywords usable as a declared type
const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

pub fn is_keyword(text: &str) -> bool {
    RESERVED_KEYWORDS.contains(&text) || CONTEXTUAL_KEYWORDS.contains(&text)
}

/// Contextual keywords may still name variables and members
pub fn is_contextual_keyword(text: &str) -> bool {
    CONTEXTUAL_KEYWORDS.contains(&text)
}

pub fn is_predefined_type(text: &str) -> bool {
    PREDEFINED_TYPES.contains(&text)
}

/// Literal keywords lexed as [`TokenKind::Literal`]
pub fn is_literal_keyword(text: &str) -> bool {
    matches!(text, "true" | "false" | "null")
}
