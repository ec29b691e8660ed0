use std::fmt::{self, Display, Formatter};

use ecow::{EcoString, EcoVec, eco_vec};

use crate::Span;

/// A result type with a syntax error.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// A syntactical error in either dialect.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SyntaxError {
    /// What went wrong.
    pub kind: SyntaxErrorKind,
    /// The token the error applies to. For unclosed constructs, this is the
    /// opening token.
    pub span: Span,
    /// Additional hints to the user, indicating how this error could be avoided
    /// or worked around.
    pub hints: EcoVec<EcoString>,
}

impl SyntaxError {
    /// Create a new error at the given span.
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self { kind, span, hints: eco_vec![] }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// The human-readable error message.
    pub fn message(&self) -> EcoString {
        ecow::eco_format!("{}", self.kind)
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for SyntaxError {}

/// The closed set of things that can go wrong while parsing.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SyntaxErrorKind {
    /// An opening brace or parenthesis without a matching close.
    UnclosedDelimiter(EcoString),
    /// A closing brace or parenthesis without a matching open.
    UnexpectedClose(EcoString),
    /// A command ran out of tokens before all its arguments were read.
    MissingArgument(EcoString),
    /// A second superscript directly after a first.
    DoubleSuperscript,
    /// A second subscript directly after a first.
    DoubleSubscript,
    /// A cell separator outside of an alignment environment.
    StrayCellSeparator,
    /// A row separator outside of an alignment environment.
    StrayRowSeparator,
    /// A `\left` without a matching `\right`.
    UnclosedLeft,
    /// A `\right` without a preceding `\left`.
    UnexpectedRight,
    /// A token after `\left` or `\right` that is not a delimiter.
    InvalidDelimiter(EcoString),
    /// A `\begin` without a matching `\end`.
    UnclosedEnvironment(EcoString),
    /// An `\end` whose name differs from its `\begin`.
    MismatchedEnvironment { begin: EcoString, end: EcoString },
    /// An `\end` without a preceding `\begin`.
    UnexpectedEnd(EcoString),
    /// An infix operator without an operand on one side.
    MissingOperand(EcoString),
    /// An argument with the wrong shape, like a non-text environment name.
    InvalidArgument(EcoString),
}

impl Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnclosedDelimiter(delim) => write!(f, "unclosed delimiter `{delim}`"),
            Self::UnexpectedClose(delim) => write!(f, "unexpected closing `{delim}`"),
            Self::MissingArgument(command) => {
                write!(f, "missing argument for `{command}`")
            }
            Self::DoubleSuperscript => f.pad("double superscript"),
            Self::DoubleSubscript => f.pad("double subscript"),
            Self::StrayCellSeparator => {
                f.pad("cell separator `&` outside of an alignment environment")
            }
            Self::StrayRowSeparator => {
                f.pad("row separator outside of an alignment environment")
            }
            Self::UnclosedLeft => f.pad("`\\left` without matching `\\right`"),
            Self::UnexpectedRight => f.pad("`\\right` without matching `\\left`"),
            Self::InvalidDelimiter(text) => write!(f, "`{text}` is not a delimiter"),
            Self::UnclosedEnvironment(name) => {
                write!(f, "environment `{name}` is never closed")
            }
            Self::MismatchedEnvironment { begin, end } => {
                write!(f, "environment `{begin}` is closed by `\\end{{{end}}}`")
            }
            Self::UnexpectedEnd(name) => {
                write!(f, "`\\end{{{name}}}` without matching `\\begin`")
            }
            Self::MissingOperand(op) => write!(f, "missing operand for `{op}`"),
            Self::InvalidArgument(message) => f.pad(message),
        }
    }
}

/// Return early with a syntax error.
///
/// ```ignore
/// bail!(DoubleSuperscript, token.span);
/// bail!(MissingArgument(name.clone()), span; hint: "add braces");
/// ```
#[macro_export]
#[doc(hidden)]
macro_rules! __bail {
    ($kind:ident $(($($arg:expr),* $(,)?))?, $span:expr $(; hint: $hint:expr)* $(,)?) => {
        return Err($crate::SyntaxError::new(
            $crate::SyntaxErrorKind::$kind $(($($arg),*))?,
            $span,
        ) $(.with_hint($hint))*)
    };
}

#[doc(inline)]
pub use crate::__bail as bail;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SyntaxError::new(SyntaxErrorKind::DoubleSuperscript, Span::detached());
        assert_eq!(err.message(), "double superscript");

        let err = SyntaxError::new(
            SyntaxErrorKind::MismatchedEnvironment { begin: "cases".into(), end: "matrix".into() },
            Span::new(0, 4),
        );
        assert_eq!(err.to_string(), "environment `cases` is closed by `\\end{matrix}`");
    }

    #[test]
    fn test_error_hints() {
        let err = SyntaxError::new(SyntaxErrorKind::StrayCellSeparator, Span::new(1, 2))
            .with_hint("wrap the rows in an `aligned` environment");
        assert_eq!(err.hints.len(), 1);
    }
}
