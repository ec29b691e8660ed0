//! Typst math: lexing, parsing and writing.

mod ast;
mod lexer;
mod parser;
mod writer;

pub use self::ast::{Call, Cells, TypstNode};
pub use self::lexer::tokenize;
pub use self::parser::parse;
pub use self::writer::{WriterConfig, write};

use crate::Token;

/// A token of Typst math.
pub type TypstToken = Token<TypstKind>;

/// The kind of a [`TypstToken`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TypstKind {
    /// A single letter, a number, a punctuation mark or an escaped character
    /// like `\{`.
    Element,
    /// A named symbol or function like `alpha` or `arrow.r`. Shorthands are
    /// lexed to the symbol they stand for.
    Symbol,
    /// The content of a string literal, unescaped.
    Text,
    /// A line comment, without the slashes.
    Comment,
    /// A run of spaces.
    Space,
    /// A line break in the source.
    Newline,
    /// Structural punctuation: script markers, the alignment point `&` and
    /// the line break `\`.
    Control,
    /// The `#none` literal.
    None,
    /// Something that has no meaning in math, like an unterminated string.
    Unknown,
}

/// Parses a Typst formula into a syntax tree.
///
/// Convenience for [`tokenize`] followed by [`parse`].
pub fn parse_str(text: &str) -> crate::SyntaxResult<TypstNode> {
    parse(&tokenize(text))
}
