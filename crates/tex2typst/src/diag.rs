//! Conversion errors and the error type of the public entry points.

use std::fmt::{self, Display, Formatter};

use ecow::{EcoString, EcoVec, eco_format, eco_vec};
use tex2typst_syntax::{Span, SyntaxError};

/// A result type with a conversion error.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// An error that occurred while rewriting one syntax tree into the other.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ConvertError {
    /// What went wrong.
    pub kind: ConvertErrorKind,
    /// Where in the input the offending construct is. Detached until the
    /// error is [located](Self::locate).
    pub span: Span,
    /// Additional hints to the user, indicating how this error could be avoided
    /// or worked around.
    pub hints: EcoVec<EcoString>,
}

impl ConvertError {
    /// Create a new error that does not point into the input yet.
    pub fn new(kind: ConvertErrorKind) -> Self {
        Self { kind, span: Span::detached(), hints: eco_vec![] }
    }

    /// Add a hint to the error.
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// The human-readable error message.
    pub fn message(&self) -> EcoString {
        eco_format!("{}", self.kind)
    }

    /// Point the error at the first occurrence of the offending text in the
    /// input.
    ///
    /// Syntax trees do not remember where their nodes came from, so this is
    /// the best guess there is. Errors that already have a span keep it.
    pub fn locate(mut self, text: &str) -> Self {
        if !self.span.is_detached() {
            return self;
        }
        let needle = self.kind.culprit();
        if !needle.is_empty()
            && let Some(start) = text.find(needle)
        {
            self.span = Span::new(start, start + needle.len());
        }
        self
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ConvertError {}

/// The closed set of things that can go wrong while converting.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ConvertErrorKind {
    /// A TeX command with no Typst counterpart.
    UnknownMacro(EcoString),
    /// A Typst symbol or function with no TeX counterpart.
    UnknownSymbol(EcoString),
    /// A character without meaning in math.
    UnknownToken(EcoString),
    /// An environment that has no counterpart.
    UnknownEnvironment(EcoString),
    /// A delimiter that has no counterpart.
    UnknownDelimiter(EcoString),
    /// An argument with a shape the conversion cannot express.
    InvalidArgument(EcoString),
}

impl ConvertErrorKind {
    /// The input text the error is about.
    fn culprit(&self) -> &str {
        match self {
            Self::UnknownMacro(text)
            | Self::UnknownSymbol(text)
            | Self::UnknownToken(text)
            | Self::UnknownEnvironment(text)
            | Self::UnknownDelimiter(text) => text,
            Self::InvalidArgument(_) => "",
        }
    }
}

impl Display for ConvertErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownMacro(name) => write!(f, "unknown macro `{name}`"),
            Self::UnknownSymbol(name) => write!(f, "unknown symbol `{name}`"),
            Self::UnknownToken(text) => write!(f, "unexpected character `{text}`"),
            Self::UnknownEnvironment(name) => write!(f, "unknown environment `{name}`"),
            Self::UnknownDelimiter(delim) => write!(f, "unknown delimiter `{delim}`"),
            Self::InvalidArgument(message) => f.pad(message),
        }
    }
}

/// Return early with a conversion error.
///
/// ```ignore
/// bail!(UnknownMacro(name.clone()));
/// bail!(UnknownEnvironment(name.clone()); hint: "try `matrix` instead");
/// ```
macro_rules! __bail {
    ($kind:ident ($($arg:expr),* $(,)?) $(; hint: $hint:expr)* $(,)?) => {
        return Err($crate::diag::ConvertError::new(
            $crate::diag::ConvertErrorKind::$kind($($arg),*),
        ) $(.with_hint($hint))*)
    };
}

pub(crate) use __bail as bail;

/// Everything that can go wrong in a conversion.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Error {
    /// The input could not be parsed.
    Syntax(SyntaxError),
    /// The parsed input could not be converted.
    Convert(ConvertError),
}

impl Error {
    /// The human-readable error message.
    pub fn message(&self) -> EcoString {
        match self {
            Self::Syntax(err) => err.message(),
            Self::Convert(err) => err.message(),
        }
    }

    /// Where in the input the error is. May be detached.
    pub fn span(&self) -> Span {
        match self {
            Self::Syntax(err) => err.span,
            Self::Convert(err) => err.span,
        }
    }

    /// Hints on how to avoid the error.
    pub fn hints(&self) -> &[EcoString] {
        match self {
            Self::Syntax(err) => &err.hints,
            Self::Convert(err) => &err.hints,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Syntax(err) => err.fmt(f),
            Self::Convert(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Syntax(err) => Some(err),
            Self::Convert(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Self::Syntax(err)
    }
}

impl From<ConvertError> for Error {
    fn from(err: ConvertError) -> Self {
        Self::Convert(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate() {
        let err = ConvertError::new(ConvertErrorKind::UnknownMacro("\\foo".into()));
        assert!(err.span.is_detached());
        let err = err.locate("a + \\foo{b}");
        assert_eq!(err.span.range(), Some(4..8));
    }

    #[test]
    fn test_locate_keeps_span() {
        let mut err = ConvertError::new(ConvertErrorKind::UnknownSymbol("abc".into()));
        err.span = Span::new(0, 1);
        assert_eq!(err.locate("abc abc").span.range(), Some(0..1));
    }

    #[test]
    fn test_error_conversions() {
        fn fails() -> Result<(), Error> {
            Err(ConvertError::new(ConvertErrorKind::UnknownEnvironment("foo".into()))
                .with_hint("use `matrix`"))?
        }
        let err = fails().unwrap_err();
        assert_eq!(err.message(), "unknown environment `foo`");
        assert_eq!(err.hints(), ["use `matrix`"]);
    }
}
