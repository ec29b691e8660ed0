//! Translates math formulas between LaTeX and Typst.
//!
//! ```
//! use tex2typst::{Options, tex2typst, typst2tex};
//!
//! let options = Options::default();
//! assert_eq!(tex2typst(r"\frac{1}{2} \cdot \alpha", &options).unwrap(), "1/2 dot.op alpha");
//! assert_eq!(typst2tex("sqrt(x)", &options).unwrap(), r"\sqrt{x}");
//! ```
//!
//! Conversion runs in four stages: the input is tokenized, parsed into a
//! syntax tree of its dialect, rewritten into a syntax tree of the other
//! dialect and finally written out. Only the rewriting lives in this crate,
//! the other stages are in [`tex2typst_syntax`].

pub mod convert;
pub mod diag;

mod options;

pub use self::diag::{ConvertError, ConvertErrorKind, ConvertResult, Error};
pub use self::options::{ConfigError, Options};

use tex2typst_syntax::{tex, typst};

/// Converts a TeX formula into Typst.
///
/// Custom macros from the options are expanded before parsing.
#[tracing::instrument(skip_all)]
pub fn tex2typst(text: &str, options: &Options) -> Result<String, Error> {
    let mut tokens = tex::tokenize(text);
    if !options.custom_tex_macros.is_empty() {
        tokens = tex::expand_macros(tokens, |name| options.tex_macro(name).cloned());
    }
    let tree = tex::parse(&tokens)?;
    let converted = convert::tex_to_typst(&tree, options).map_err(|err| err.locate(text))?;
    let output = typst::write(&converted, &options.writer_config());
    tracing::debug!(input = text.len(), output = output.len(), "converted tex to typst");
    Ok(output)
}

/// Converts a Typst formula into TeX.
#[tracing::instrument(skip_all)]
pub fn typst2tex(text: &str, options: &Options) -> Result<String, Error> {
    let tree = typst::parse_str(text)?;
    let converted = convert::typst_to_tex(&tree, options).map_err(|err| err.locate(text))?;
    let output = tex::write(&converted);
    tracing::debug!(input = text.len(), output = output.len(), "converted typst to tex");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn roundtrip_tex(text: &str) {
        let options = Options::default();
        let typst = tex2typst(text, &options).unwrap();
        assert_eq!(typst2tex(&typst, &options).unwrap(), text, "via {typst}");
    }

    #[track_caller]
    fn roundtrip_typst(text: &str) {
        let options = Options::default();
        let tex = typst2tex(text, &options).unwrap();
        assert_eq!(tex2typst(&tex, &options).unwrap(), text, "via {tex}");
    }

    #[test]
    fn test_roundtrip() {
        roundtrip_tex("\\frac{a}{b}");
        roundtrip_tex("x_1^2 + \\alpha");
        roundtrip_tex("\\sqrt[3]{x}");
        roundtrip_tex("\\begin{pmatrix}\na & b \\\\\nc & d\n\\end{pmatrix}");
        roundtrip_tex("\\left\\{ a \\right.");
        roundtrip_typst("mat(delim: \"(\", a, b; c, d)");
        roundtrip_typst("lr(\\{ a)");
        roundtrip_typst("floor(x)");
        roundtrip_typst("x in RR");
    }

    #[test]
    fn test_syntax_error() {
        let err = tex2typst("x^2^3", &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
        assert_eq!(err.message(), "double superscript");
        assert_eq!(err.span().range(), Some(3..4));
        assert!(!err.hints().is_empty());
    }

    #[test]
    fn test_convert_error_is_located() {
        let err = tex2typst("a + \\foo", &Options::default()).unwrap_err();
        assert!(matches!(err, Error::Convert(_)));
        assert_eq!(err.span().range(), Some(4..8));
    }
}
