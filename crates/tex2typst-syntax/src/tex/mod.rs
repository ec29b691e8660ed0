//! TeX math: lexing, parsing and writing.

mod ast;
mod lexer;
mod parser;
mod writer;

pub use self::ast::{Env, Func, TexNode};
pub use self::lexer::{expand_macros, tokenize};
pub use self::parser::parse;
pub use self::writer::write;

use crate::Token;

/// A token of TeX math.
pub type TexToken = Token<TexKind>;

/// The kind of a [`TexToken`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TexKind {
    /// A letter, a number, a punctuation mark or an escaped character like
    /// `\{`.
    Element,
    /// A command like `\alpha` or `\frac`, including the backslash.
    Command,
    /// Raw text from the argument of `\text` and friends.
    Text,
    /// A comment, without the percent sign.
    Comment,
    /// A run of spaces.
    Space,
    /// A line break in the source.
    Newline,
    /// Structural punctuation: braces, script markers, the cell and row
    /// separators and spacing commands like `\,`.
    Control,
    /// A character that has no meaning in TeX math.
    Unknown,
}

/// Parses a TeX formula into a syntax tree.
///
/// Convenience for [`tokenize`] followed by [`parse`].
pub fn parse_str(text: &str) -> crate::SyntaxResult<TexNode> {
    parse(&tokenize(text))
}
