use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use ecow::EcoString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tex2typst_syntax::typst::WriterConfig;

/// How to convert.
///
/// Every field has a default, so a configuration file only needs to list
/// what it changes:
///
/// ```toml
/// frac-to-slash = false
///
/// [custom-tex-macros]
/// RR = "\\mathbb{R}"
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Write symbols like `arrow.r` as their shorthand `->`.
    pub prefer_shorthands: bool,
    /// Write fractions as `a/b` instead of `frac(a, b)`.
    pub frac_to_slash: bool,
    /// Write `\infty` as `oo` instead of `infinity`.
    pub infty_to_oo: bool,
    /// Pass unknown commands and symbols through instead of failing.
    pub non_strict: bool,
    /// Rewrite common constructs into their idiomatic form, like
    /// `\left| x \right|` into `abs(x)`.
    pub optimize: bool,
    /// Keep the spaces of TeX input.
    pub keep_spaces: bool,
    /// A function to wrap `\text` with when the text is not ASCII. Empty
    /// means no wrapper.
    pub non_ascii_wrapper: EcoString,
    /// TeX macros to expand before parsing, by name.
    pub custom_tex_macros: IndexMap<EcoString, EcoString>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prefer_shorthands: true,
            frac_to_slash: true,
            infty_to_oo: false,
            non_strict: false,
            optimize: true,
            keep_spaces: false,
            non_ascii_wrapper: EcoString::new(),
            custom_tex_macros: IndexMap::new(),
        }
    }
}

impl Options {
    /// Parse options from TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError {
            path: None,
            message: err.message().into(),
        })
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError {
            path: Some(path.into()),
            message: ecow::eco_format!("could not read file ({err})"),
        })?;
        tracing::debug!(path = %path.display(), "loading options");
        Self::from_toml(&text).map_err(|err| ConfigError { path: Some(path.into()), ..err })
    }

    /// Serialize the options to TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }

    /// The expansion of a custom macro. Names may be given with or without
    /// their backslash.
    pub fn tex_macro(&self, name: &str) -> Option<&EcoString> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        self.custom_tex_macros
            .iter()
            .find(|(key, _)| key.strip_prefix('\\').unwrap_or(key) == name)
            .map(|(_, expansion)| expansion)
    }

    /// How the Typst writer should be set up.
    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            prefer_shorthands: self.prefer_shorthands,
            infty_to_oo: self.infty_to_oo,
            optimize: self.optimize,
        }
    }
}

/// Options could not be loaded.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConfigError {
    /// The file that was loaded, if any.
    pub path: Option<PathBuf>,
    /// What went wrong.
    pub message: EcoString,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "invalid options in {}: {}", path.display(), self.message),
            None => write!(f, "invalid options: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::from_toml("").unwrap();
        assert_eq!(options, Options::default());
        assert!(options.prefer_shorthands);
        assert!(options.frac_to_slash);
        assert!(!options.non_strict);
    }

    #[test]
    fn test_from_toml() {
        let options = Options::from_toml(
            "frac-to-slash = false\n\
             non-ascii-wrapper = \"ascii\"\n\
             [custom-tex-macros]\n\
             \"\\\\R\" = \"\\\\mathbb{R}\"\n",
        )
        .unwrap();
        assert!(!options.frac_to_slash);
        assert_eq!(options.non_ascii_wrapper, "ascii");
        assert_eq!(options.tex_macro("R").map(EcoString::as_str), Some("\\mathbb{R}"));
        assert_eq!(options.tex_macro("\\R").map(EcoString::as_str), Some("\\mathbb{R}"));
        assert_eq!(options.tex_macro("S"), None);
    }

    #[test]
    fn test_unknown_field() {
        let err = Options::from_toml("fraction = true").unwrap_err();
        assert!(err.path.is_none());
        assert!(err.to_string().starts_with("invalid options: "));
    }

    #[test]
    fn test_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "optimize = false").unwrap();
        let options = Options::load(file.path()).unwrap();
        assert!(!options.optimize);

        let err = Options::load(Path::new("/does/not/exist.toml")).unwrap_err();
        assert!(err.message.starts_with("could not read file"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut options = Options { keep_spaces: true, ..Options::default() };
        options.custom_tex_macros.insert("half".into(), "\\frac{1}{2}".into());
        assert_eq!(Options::from_toml(&options.to_toml()).unwrap(), options);
    }
}
