use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use clap::{ArgAction, Args, ColorChoice, Parser, Subcommand, ValueEnum};
use ecow::EcoString;

/// Converts math formulas between LaTeX and Typst.
#[derive(Debug, Clone, Parser)]
#[clap(name = "t2t", version, author)]
pub struct CliArguments {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,

    /// Whether to use color. When set to `auto` if the terminal supports it
    #[clap(long, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,

    /// Sets the level of logging verbosity:
    /// -v = warning & error, -vv = info, -vvv = debug, -vvvv = trace
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbosity: u8,
}

/// What to do.
#[derive(Debug, Clone, Subcommand)]
#[command()]
pub enum Command {
    /// Converts a LaTeX formula into Typst
    #[command(visible_alias = "t")]
    Tex2typst(ConvertCommand),

    /// Converts a Typst formula into LaTeX
    #[command(visible_alias = "x")]
    Typst2tex(ConvertCommand),

    /// Lists the symbols known to both dialects
    Symbols(SymbolsCommand),
}

/// Converts a formula and prints the result to stdout
#[derive(Debug, Clone, Parser)]
pub struct ConvertCommand {
    /// The formula to convert. Read from stdin when absent or `-`
    pub input: Option<String>,

    /// Reads the formula from a file
    #[clap(long, short, value_name = "PATH", conflicts_with = "input")]
    pub file: Option<PathBuf>,

    /// Conversion options.
    #[clap(flatten)]
    pub options: OptionArgs,

    /// In which format to emit diagnostics
    #[clap(
        long,
        default_value_t = DiagnosticFormat::Human,
        value_parser = clap::value_parser!(DiagnosticFormat)
    )]
    pub diagnostic_format: DiagnosticFormat,
}

/// Arguments that adjust the conversion. They take precedence over the
/// configuration file.
#[derive(Debug, Clone, Args)]
pub struct OptionArgs {
    /// Loads options from a TOML file
    #[clap(long, env = "T2T_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Writes symbols by name instead of shorthands like `->`
    #[arg(long)]
    pub no_prefer_shorthands: bool,

    /// Writes fractions as `frac(a, b)` instead of `a/b`
    #[arg(long)]
    pub no_frac_to_slash: bool,

    /// Writes `\infty` as `oo`
    #[arg(long)]
    pub infty_to_oo: bool,

    /// Passes unknown commands and symbols through instead of failing
    #[arg(long)]
    pub non_strict: bool,

    /// Keeps constructs as written instead of using idiomatic forms
    #[arg(long)]
    pub no_optimize: bool,

    /// Keeps the spaces of TeX input
    #[arg(long)]
    pub keep_spaces: bool,

    /// Wraps non-ASCII `\text` in this function
    #[arg(long, value_name = "NAME")]
    pub non_ascii_wrapper: Option<String>,

    /// Defines a TeX macro to expand before parsing
    #[clap(
        long = "macro",
        value_name = "NAME=EXPANSION",
        value_parser = parse_macro,
        action = ArgAction::Append,
    )]
    pub macros: Vec<(EcoString, EcoString)>,
}

/// Parses a `NAME=EXPANSION` macro definition.
fn parse_macro(raw: &str) -> Result<(EcoString, EcoString), String> {
    let (name, expansion) = raw
        .split_once('=')
        .ok_or("macro definitions must have the form `NAME=EXPANSION`")?;
    let name = name.trim();
    if name.trim_start_matches('\\').is_empty() {
        return Err("macro name must not be empty".into());
    }
    Ok((name.into(), expansion.into()))
}

/// Lists the symbols known to both dialects
#[derive(Debug, Clone, Parser)]
pub struct SymbolsCommand {
    /// Only lists entries containing this text
    pub filter: Option<String>,

    /// Lists Typst shorthands instead of symbols
    #[arg(long)]
    pub shorthands: bool,
}

/// Which format to use for diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum)]
pub enum DiagnosticFormat {
    Human,
    Short,
}

impl Display for DiagnosticFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_possible_value()
            .expect("no values are skipped")
            .get_name()
            .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_macro() {
        assert_eq!(
            parse_macro("\\RR=\\mathbb{R}").unwrap(),
            ("\\RR".into(), "\\mathbb{R}".into())
        );
        assert_eq!(parse_macro("eq=a=b").unwrap(), ("eq".into(), "a=b".into()));
        assert!(parse_macro("RR").is_err());
        assert!(parse_macro("\\=x").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let args = CliArguments::try_parse_from([
            "t2t",
            "t",
            "--macro",
            "R=\\mathbb{R}",
            "--non-strict",
            "-vv",
            "\\R",
        ])
        .unwrap();
        assert_eq!(args.verbosity, 2);
        let Command::Tex2typst(command) = args.command else { panic!("wrong command") };
        assert_eq!(command.input.as_deref(), Some("\\R"));
        assert!(command.options.non_strict);
        assert_eq!(command.options.macros.len(), 1);
        assert_eq!(command.diagnostic_format, DiagnosticFormat::Human);
    }

    #[test]
    fn test_file_conflicts_with_input() {
        assert!(CliArguments::try_parse_from(["t2t", "x", "-f", "a.txt", "x"]).is_err());
    }
}
