use std::process::ExitCode;

use tex2typst_cli::args::Command;
use tex2typst_cli::{ARGS, EXIT, StrResult, print_error, set_failed};

/// Entry point.
fn main() -> ExitCode {
    tex2typst_cli::tracing::setup_tracing(&ARGS);

    let res = dispatch();

    if let Err(msg) = res {
        set_failed();
        print_error(&msg).expect("failed to print error");
    }

    EXIT.with(|cell| cell.get())
}

/// Execute the requested command.
fn dispatch() -> StrResult<()> {
    match &ARGS.command {
        Command::Tex2typst(command) => {
            tex2typst_cli::convert::convert(command, tex2typst::tex2typst)?
        }
        Command::Typst2tex(command) => {
            tex2typst_cli::convert::convert(command, tex2typst::typst2tex)?
        }
        Command::Symbols(command) => tex2typst_cli::symbols::symbols(command),
    }

    Ok(())
}
