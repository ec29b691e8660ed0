use std::io::IsTerminal;

use codespan_reporting::term::termcolor::{self, ColorChoice};

use crate::ARGS;

/// A stream to stderr that only writes colors when the user wants them and
/// the terminal supports them.
///
/// The converted formula goes to stdout, so everything meant for the user
/// alone goes here.
pub fn out() -> termcolor::StandardStream {
    let color_choice = match ARGS.color {
        clap::ColorChoice::Auto if std::io::stderr().is_terminal() => ColorChoice::Auto,
        clap::ColorChoice::Always => ColorChoice::Always,
        _ => ColorChoice::Never,
    };
    termcolor::StandardStream::stderr(color_choice)
}
