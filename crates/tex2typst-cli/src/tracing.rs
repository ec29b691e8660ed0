use tracing::metadata::LevelFilter;

use crate::args::CliArguments;

/// Initializes the tracing system. Log lines go to stderr.
pub fn setup_tracing(args: &CliArguments) {
    tracing_subscriber::fmt()
        .without_time()
        .with_writer(std::io::stderr)
        .with_max_level(level_filter(args))
        .init();
}

/// Returns the log level filter for the given verbosity level.
fn level_filter(args: &CliArguments) -> LevelFilter {
    match args.verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
