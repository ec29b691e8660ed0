use std::sync::LazyLock;

use ecow::{EcoString, eco_format};
use regex::Captures;

use crate::scanner::{self, Lexed, Rule};
use crate::symbols;
use crate::tex::{TexKind, TexToken};

/// Splits TeX math into tokens.
///
/// Whitespace is preserved. Characters that TeX math has no use for become
/// [`TexKind::Unknown`] tokens instead of failing.
pub fn tokenize(text: &str) -> Vec<TexToken> {
    let tokens = scanner::scan(text, &RULES, TexKind::Unknown);
    tracing::trace!(count = tokens.len(), "lexed tex");
    tokens
}

/// Replaces every command that names a user macro with its tokenized
/// expansion.
///
/// The lookup receives command names without the leading backslash.
/// Expansions are not expanded again. Expanded tokens take the span of the
/// command they replace.
pub fn expand_macros<F>(tokens: Vec<TexToken>, mut lookup: F) -> Vec<TexToken>
where
    F: FnMut(&str) -> Option<EcoString>,
{
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let expansion = match token.kind {
            TexKind::Command => lookup(&token.text[1..]),
            _ => None,
        };
        match expansion {
            Some(text) => {
                tracing::debug!(name = %token.text, expansion = %text, "expanding macro");
                let span = token.span;
                out.extend(tokenize(&text).into_iter().map(|t| t.spanned(span)));
            }
            None => out.push(token),
        }
    }
    out
}

static RULES: LazyLock<Vec<Rule<TexKind>>> = LazyLock::new(|| {
    vec![
        // The column specification of an array is raw text.
        Rule::new(r"\\begin\s*\{array\}\s*\{([^}]*)\}", |c| {
            Lexed::Tokens(vec![
                (TexKind::Command, "\\begin".into()),
                (TexKind::Control, "{".into()),
                (TexKind::Text, "array".into()),
                (TexKind::Control, "}".into()),
                (TexKind::Control, "{".into()),
                (TexKind::Text, c[1].into()),
                (TexKind::Control, "}".into()),
            ])
        }),
        Rule::new(
            r"\\(text|operatorname\*?|begin|end|hspace)\s*\{((?:\\textbackslash\{\}|\\.|[^{}\\])*)\}",
            |c| {
                Lexed::Tokens(vec![
                    (TexKind::Command, eco_format!("\\{}", &c[1])),
                    (TexKind::Control, "{".into()),
                    (TexKind::Text, unescape_text(&c[2])),
                    (TexKind::Control, "}".into()),
                ])
            },
        ),
        Rule::new(r"%[^\n]*", |c| Lexed::one(TexKind::Comment, &c[0][1..])),
        Rule::new(r"[{}_^&]", |c| Lexed::one(TexKind::Control, &c[0])),
        // A script only takes the first digit of a number: `x_12` is `x_{1}2`.
        Rule::new(r"[_^]\s*[0-9]{2,}", script_digit),
        Rule::new(r"\\[\\,:;!> ]", |c| Lexed::one(TexKind::Control, &c[0])),
        Rule::new(r"~", |c| Lexed::one(TexKind::Control, &c[0])),
        Rule::new(r"\r?\n", |_| Lexed::one(TexKind::Newline, "\n")),
        Rule::new(r"[^\S\n]+", |c| Lexed::one(TexKind::Space, &c[0])),
        Rule::new(r"\\[{}%$&#_|]", |c| Lexed::one(TexKind::Element, &c[0])),
        Rule::new(r"(\\[a-zA-Z]+)(\s*\d|\s+[a-zA-Z])\s*([0-9a-zA-Z])", bare_pair),
        Rule::new(r"(\\[a-zA-Z]+)(\s*\d|\s+[a-zA-Z])", bare_single),
        Rule::new(r"\\[a-zA-Z]+", |c| Lexed::one(TexKind::Command, &c[0])),
        Rule::new(r"[0-9]+(\.[0-9]+)?", |c| Lexed::one(TexKind::Element, &c[0])),
        Rule::new(r"[a-zA-Z]", |c| Lexed::one(TexKind::Element, &c[0])),
        Rule::new(r"[+\-*/='<>!.,;:?()\[\]|]", |c| Lexed::one(TexKind::Element, &c[0])),
        Rule::new(r"[^\x00-\x7F]", |c| Lexed::one(TexKind::Element, &c[0])),
    ]
});

/// Resolves the escapes of text arguments: `\}` is `}` and
/// `\textbackslash{}` is a backslash. Other commands stay as written.
fn unescape_text(text: &str) -> EcoString {
    let mut out = EcoString::new();
    let mut rest = text;
    while let Some(i) = rest.find('\\') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        if let Some(after) = rest.strip_prefix("\\textbackslash{}") {
            out.push('\\');
            rest = after;
        } else if let Some(c) = rest[1..].chars().next().filter(|c| "{}%&#_$".contains(*c)) {
            out.push(c);
            rest = &rest[1 + c.len_utf8()..];
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Lexes `_12` as `_`, `1` and leaves the rest of the digits for later.
fn script_digit(c: &Captures) -> Lexed<TexKind> {
    let text = &c[0];
    let Some(digit) = text.find(|c: char| c.is_ascii_digit()) else {
        return Lexed::Reject;
    };
    Lexed::Prefix(
        digit + 1,
        vec![
            (TexKind::Control, text[..1].into()),
            (TexKind::Element, text[digit..digit + 1].into()),
        ],
    )
}

/// Lexes `\frac12` as a command with two bare arguments.
fn bare_pair(c: &Captures) -> Lexed<TexKind> {
    if symbols::tex_arity(&c[1][1..]) != Some(2) {
        return Lexed::Reject;
    }
    Lexed::Tokens(vec![
        (TexKind::Command, c[1].into()),
        (TexKind::Element, c[2].trim_start().into()),
        (TexKind::Element, c[3].into()),
    ])
}

/// Lexes `\sqrt2` as a command with one bare argument.
fn bare_single(c: &Captures) -> Lexed<TexKind> {
    if symbols::tex_arity(&c[1][1..]) != Some(1) {
        return Lexed::Reject;
    }
    Lexed::Tokens(vec![
        (TexKind::Command, c[1].into()),
        (TexKind::Element, c[2].trim_start().into()),
    ])
}
