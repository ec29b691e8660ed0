use std::fmt::{self, Debug, Formatter};

use ecow::EcoString;

use crate::Span;

/// A lexed token of either dialect.
///
/// Equality is structural: two tokens are equal if their kind and text
/// match, regardless of where they were lexed from.
#[derive(Clone)]
pub struct Token<K> {
    /// What kind of token this is.
    pub kind: K,
    /// The token's text. For most kinds this is the source text verbatim;
    /// literal text tokens hold their content without quotes or braces.
    pub text: EcoString,
    /// Where the token was lexed from.
    pub span: Span,
}

impl<K> Token<K> {
    /// Create a new detached token.
    pub fn new(kind: K, text: impl Into<EcoString>) -> Self {
        Self { kind, text: text.into(), span: Span::detached() }
    }

    /// Attach a span to the token.
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl<K: PartialEq> Token<K> {
    /// Whether the token has the given kind and text.
    pub fn is(&self, kind: K, text: &str) -> bool {
        self.kind == kind && self.text == text
    }
}

impl<K: PartialEq> PartialEq for Token<K> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

impl<K: Eq> Eq for Token<K> {}

impl<K: Debug> Debug for Token<K> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.text)
    }
}
