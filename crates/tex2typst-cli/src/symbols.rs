use tex2typst_syntax::symbols;

use crate::args::SymbolsCommand;

/// Execute a symbol listing command.
pub fn symbols(command: &SymbolsCommand) {
    let filter = command.filter.as_deref().unwrap_or_default();

    if command.shorthands {
        for &(name, shorthand) in symbols::shorthands() {
            if name.contains(filter) || shorthand.contains(filter) {
                println!("{shorthand:<8}{name}");
            }
        }
        return;
    }

    for &(tex, typst) in symbols::symbols() {
        if tex.contains(filter) || typst.contains(filter) {
            println!("{:<24}{typst}", format!("\\{tex}"));
        }
    }
}
