use std::fs;
use std::io::{self, Read};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use ecow::eco_format;
use tex2typst::{Error, Options};

use crate::args::{ConvertCommand, DiagnosticFormat, OptionArgs};
use crate::{StrResult, set_failed, terminal};

/// A conversion in one direction.
pub type Conversion = fn(&str, &Options) -> Result<String, Error>;

/// Execute a conversion command.
pub fn convert(command: &ConvertCommand, conversion: Conversion) -> StrResult<()> {
    let options = command.options.options()?;
    let input = read_input(command)?;
    let text = input.trim_end_matches(['\n', '\r']);

    match conversion(text, &options) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            set_failed();
            tracing::info!(?err, "conversion failed");
            print_diagnostic(text, &err, command.diagnostic_format)
                .map_err(|err| eco_format!("failed to print diagnostics ({err})"))?;
        }
    }

    Ok(())
}

impl OptionArgs {
    /// The options from the configuration file, overridden by the flags.
    pub fn options(&self) -> StrResult<Options> {
        let mut options = match &self.config {
            Some(path) => Options::load(path).map_err(|err| eco_format!("{err}"))?,
            None => Options::default(),
        };

        if self.no_prefer_shorthands {
            options.prefer_shorthands = false;
        }
        if self.no_frac_to_slash {
            options.frac_to_slash = false;
        }
        if self.no_optimize {
            options.optimize = false;
        }
        options.infty_to_oo |= self.infty_to_oo;
        options.non_strict |= self.non_strict;
        options.keep_spaces |= self.keep_spaces;
        if let Some(wrapper) = &self.non_ascii_wrapper {
            options.non_ascii_wrapper = wrapper.into();
        }
        options.custom_tex_macros.extend(self.macros.iter().cloned());

        Ok(options)
    }
}

/// Read the formula from the file, the argument or stdin.
fn read_input(command: &ConvertCommand) -> StrResult<String> {
    if let Some(path) = &command.file {
        return fs::read_to_string(path)
            .map_err(|err| eco_format!("failed to read {} ({err})", path.display()));
    }

    match command.input.as_deref() {
        Some("-") | None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| eco_format!("failed to read from stdin ({err})"))?;
            Ok(buf)
        }
        Some(text) => Ok(text.into()),
    }
}

/// Print a conversion error pointing into the formula.
fn print_diagnostic(
    source: &str,
    error: &Error,
    diagnostic_format: DiagnosticFormat,
) -> Result<(), codespan_reporting::files::Error> {
    let mut config = term::Config { tab_width: 2, ..Default::default() };
    if diagnostic_format == DiagnosticFormat::Short {
        config.display_style = term::DisplayStyle::Short;
    }

    let file = SimpleFile::new("<input>", source);
    let diag = Diagnostic::error()
        .with_message(error.message())
        .with_notes(
            error
                .hints()
                .iter()
                .map(|hint| eco_format!("hint: {hint}").into())
                .collect(),
        )
        .with_labels(
            error
                .span()
                .range()
                .filter(|range| range.end <= source.len())
                .map(|range| Label::primary((), range))
                .into_iter()
                .collect(),
        );

    term::emit(&mut terminal::out(), &config, &file, &diag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_args() -> OptionArgs {
        OptionArgs {
            config: None,
            no_prefer_shorthands: false,
            no_frac_to_slash: false,
            infty_to_oo: false,
            non_strict: false,
            no_optimize: false,
            keep_spaces: false,
            non_ascii_wrapper: None,
            macros: vec![],
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = OptionArgs {
            no_frac_to_slash: true,
            infty_to_oo: true,
            non_ascii_wrapper: Some("txt".into()),
            macros: vec![("R".into(), "\\mathbb{R}".into())],
            ..option_args()
        };
        let options = args.options().unwrap();
        assert!(!options.frac_to_slash);
        assert!(options.infty_to_oo);
        assert!(options.prefer_shorthands);
        assert_eq!(options.non_ascii_wrapper, "txt");
        assert!(options.tex_macro("\\R").is_some());
    }

    #[test]
    fn test_missing_config() {
        let args = OptionArgs {
            config: Some("/does/not/exist.toml".into()),
            ..option_args()
        };
        assert!(args.options().unwrap_err().starts_with("invalid options in"));
    }
}
