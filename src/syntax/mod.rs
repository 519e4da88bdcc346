//! C# syntax front end
//!
//! Architecture: Two-stage pipeline
//! - `lexer` turns source text into positioned tokens, recovering from malformed literals
//! - `parser` builds a shallow scope tree of declarations from the significant tokens
//! - Both stages borrow the source; nothing here outlives a single file's analysis

pub mod lexer;
pub mod parser;
pub mod token;
pub mod tree;

pub use lexer::{tokenize, LexError, LexErrorKind, Lexer, TokenStream};
pub use parser::{parse, ParseError, ParseErrorKind, ParseOutcome};
pub use token::{Position, Span, Token, TokenKind};
pub use tree::{
    Accessibility, Apparentness, Binding, BindingId, MemberKind, Role, Scope, ScopeId, ScopeKind,
    ScopeTree, TypeKind, UsingDirective,
};
