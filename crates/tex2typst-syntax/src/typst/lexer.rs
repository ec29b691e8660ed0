use std::sync::LazyLock;

use ecow::EcoString;

use crate::scanner::{self, Lexed, Rule};
use crate::symbols;
use crate::typst::{TypstKind, TypstToken};

/// Splits Typst math into tokens.
///
/// Whitespace is preserved. Characters that Typst math has no use for
/// become [`TypstKind::Unknown`] tokens instead of failing.
pub fn tokenize(text: &str) -> Vec<TypstToken> {
    let tokens = scanner::scan(text, &RULES, TypstKind::Unknown);
    tracing::trace!(count = tokens.len(), "lexed typst");
    tokens
}

static RULES: LazyLock<Vec<Rule<TypstKind>>> = LazyLock::new(|| {
    vec![
        Rule::new(r"//[^\n]*", |c| Lexed::one(TypstKind::Comment, &c[0][2..])),
        Rule::new(r"/", |c| Lexed::one(TypstKind::Element, &c[0])),
        Rule::new(r"[_^&]", |c| Lexed::one(TypstKind::Control, &c[0])),
        Rule::new(r"\r?\n", |_| Lexed::one(TypstKind::Newline, "\n")),
        Rule::new(r"[^\S\n]+", |c| Lexed::one(TypstKind::Space, &c[0])),
        // A backslash before whitespace is a line break. The whitespace is
        // lexed on its own.
        Rule::new(r"\\(?:\s|$)", |_| Lexed::Prefix(1, vec![(TypstKind::Control, "\\".into())])),
        Rule::new(r"\\\S", |c| Lexed::one(TypstKind::Element, &c[0])),
        Rule::new(r#""(?:[^"\\]|\\.)*""#, |c| Lexed::one(TypstKind::Text, unescape(&c[0]))),
        Rule::new(&shorthand_pattern(), |c| match shorthand_name(&c[0]) {
            Some(name) => Lexed::one(TypstKind::Symbol, name),
            None => Lexed::Reject,
        }),
        Rule::new(r"[0-9]+(?:\.[0-9]+)?", |c| Lexed::one(TypstKind::Element, &c[0])),
        Rule::new(r"[+\-*='<>!.,;:?()\[\]|{}]", |c| Lexed::one(TypstKind::Element, &c[0])),
        Rule::new(r"#none", |_| Lexed::one(TypstKind::None, "#none")),
        Rule::new(r"#[a-zA-Z0-9_][a-zA-Z0-9_.\-]*", |c| Lexed::one(TypstKind::Symbol, &c[0])),
        // A code expression with at most one level of nested parentheses.
        Rule::new(r"#\((?:[^()]|\([^()]*\))*\)", |c| Lexed::one(TypstKind::Symbol, &c[0])),
        Rule::new(r"[a-zA-Z]+(?:\.[a-zA-Z]+)*", |c| {
            let kind = if c[0].len() == 1 { TypstKind::Element } else { TypstKind::Symbol };
            Lexed::one(kind, &c[0])
        }),
        Rule::new(r#"[^$#"\\]"#, |c| Lexed::one(TypstKind::Element, &c[0])),
    ]
});

/// A pattern that matches every shorthand, longest alternatives first.
fn shorthand_pattern() -> String {
    let mut shorthands: Vec<&str> = symbols::shorthands().iter().map(|&(_, s)| s).collect();
    shorthands.sort_by_key(|s| std::cmp::Reverse(s.len()));
    shorthands.iter().map(|s| regex::escape(s)).collect::<Vec<_>>().join("|")
}

fn shorthand_name(text: &str) -> Option<&'static str> {
    symbols::shorthands().iter().find(|&&(_, s)| s == text).map(|&(name, _)| name)
}

/// Resolves the escapes of a string literal and strips its quotes.
fn unescape(literal: &str) -> EcoString {
    let inner = &literal[1..literal.len() - 1];
    let mut out = EcoString::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}
