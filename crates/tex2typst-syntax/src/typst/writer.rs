use std::sync::LazyLock;

use ecow::{EcoString, eco_format};
use regex::Regex;

use crate::node::{Attach, Delimited, Grid};
use crate::symbols;
use crate::typst::{Call, Cells, TypstNode};

/// How to write Typst math.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct WriterConfig {
    /// Write symbols that have a shorthand, like `arrow.r`, as the
    /// shorthand, like `->`.
    pub prefer_shorthands: bool,
    /// Write `infinity` as `oo`.
    pub infty_to_oo: bool,
    /// Fold bracket pairs like `floor.l x floor.r` into calls like
    /// `floor(x)`.
    pub optimize: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self { prefer_shorthands: true, infty_to_oo: false, optimize: true }
    }
}

/// Serializes a syntax tree into Typst math.
pub fn write(node: &TypstNode, config: &WriterConfig) -> String {
    let mut w = Writer { config, pieces: vec![] };
    w.node(node, Context::default());
    let text = join(&w.pieces);
    tracing::trace!(pieces = w.pieces.len(), "wrote typst");
    cleanup(&text, config)
}

/// Where a node is written.
#[derive(Debug, Default, Copy, Clone)]
struct Context {
    /// Whether a comma would end the argument of an enclosing call.
    in_args: bool,
    /// Whether a semicolon would end the row of an enclosing matrix.
    in_matrix: bool,
}

impl Context {
    fn args(self) -> Self {
        Self { in_args: true, in_matrix: false }
    }

    fn matrix(self) -> Self {
        Self { in_args: true, in_matrix: true }
    }

    fn nested(self) -> Self {
        Self { in_args: false, in_matrix: false }
    }
}

/// An output token or a space that is dropped where it would be noise.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Token(EcoString),
    SoftSpace,
}

struct Writer<'a> {
    config: &'a WriterConfig,
    pieces: Vec<Piece>,
}

impl Writer<'_> {
    fn push(&mut self, token: impl Into<EcoString>) {
        self.pieces.push(Piece::Token(token.into()));
    }

    fn soft_space(&mut self) {
        self.pieces.push(Piece::SoftSpace);
    }

    fn node(&mut self, node: &TypstNode, cx: Context) {
        match node {
            TypstNode::Atom(text) if text == "," && cx.in_args => self.push("comma"),
            TypstNode::Atom(text) if text == ";" && cx.in_matrix => self.push("semi"),
            TypstNode::Atom(text) | TypstNode::Unknown(text) | TypstNode::Control(text) => {
                self.push(text.clone())
            }
            TypstNode::Symbol(name) => self.symbol(name),
            TypstNode::Text(text) => self.push(quote(text)),
            TypstNode::Comment(text) => {
                self.push(eco_format!("//{text}"));
                self.push("\n");
            }
            TypstNode::Space(space) => self.push(space.clone()),
            TypstNode::None => self.push("#none"),
            TypstNode::Empty => {}
            TypstNode::Group(nodes) => nodes.iter().for_each(|n| self.node(n, cx)),
            TypstNode::Parens(nodes) => {
                self.push("(");
                nodes.iter().for_each(|n| self.node(n, cx.nested()));
                self.push(")");
            }
            TypstNode::Attach(attach) => self.attach(attach, cx),
            TypstNode::Call(call) => self.call(call, cx),
            TypstNode::Frac(num, den) => {
                if needs_parens(num) {
                    self.soft_space();
                }
                self.operand(num, cx);
                self.push("/");
                self.operand(den, cx);
            }
            TypstNode::LeftRight(delimited) => self.left_right(delimited, cx),
            TypstNode::Matrix(cells) => self.cells("mat", cells, ";", ",", cx),
            TypstNode::Cases(cells) => self.cells("cases", cells, ",", "&", cx),
            TypstNode::Align(rows) => self.align(rows, cx),
        }
    }

    fn symbol(&mut self, name: &str) {
        if self.config.infty_to_oo && name == "infinity" {
            return self.push("oo");
        }
        if self.config.prefer_shorthands
            && let Some(shorthand) = symbols::shorthand(name)
        {
            return self.push(shorthand);
        }
        self.push(name);
    }

    fn attach(&mut self, attach: &Attach<TypstNode>, cx: Context) {
        match &*attach.base {
            TypstNode::Empty => self.push("\"\""),
            base => self.operand(base, cx),
        }

        let mut sup = attach.sup.as_deref();
        if let Some(marks) = sup.and_then(prime_marks) {
            for _ in 0..marks {
                self.push("'");
            }
            sup = None;
        }

        let mut bare = true;
        if let Some(sub) = &attach.sub {
            self.push("_");
            bare = self.script(sub, cx);
        }
        if let Some(sup) = sup {
            self.push("^");
            bare = self.script(sup, cx);
        }

        if bare && (attach.sub.is_some() || sup.is_some()) {
            self.soft_space();
        }
    }

    /// Writes a script and returns whether it went without parentheses.
    fn script(&mut self, node: &TypstNode, cx: Context) -> bool {
        let wrap = matches!(
            node,
            TypstNode::Group(_)
                | TypstNode::Attach(_)
                | TypstNode::Frac(..)
                | TypstNode::Parens(_)
                | TypstNode::Empty
        );
        if wrap {
            self.push("(");
            self.node(node, cx.nested());
            self.push(")");
        } else {
            self.node(node, cx);
        }
        !wrap
    }

    /// Writes a node with parentheses if it would not hold together on its
    /// own as a fraction operand or script base.
    fn operand(&mut self, node: &TypstNode, cx: Context) {
        if needs_parens(node) {
            self.push("(");
            self.node(node, cx.nested());
            self.push(")");
        } else {
            self.node(node, cx);
        }
    }

    fn call(&mut self, call: &Call, cx: Context) {
        self.push(eco_format!("{}(", call.name));
        let mut first = true;
        for arg in &call.args {
            if !first {
                self.push(",");
            }
            first = false;
            self.node(arg, cx.args());
        }
        for (key, value) in &call.named {
            if !first {
                self.push(",");
            }
            first = false;
            self.push(eco_format!("{key}:"));
            self.node(value, cx.args());
        }
        self.push(")");
    }

    fn left_right(&mut self, delimited: &Delimited<TypstNode>, cx: Context) {
        self.push("lr(");
        if let Some(left) = &delimited.left {
            self.push(left.clone());
        }
        self.node(&delimited.body, cx.args());
        if let Some(right) = &delimited.right {
            self.push(right.clone());
        }
        self.push(")");
    }

    fn cells(&mut self, name: &str, cells: &Cells, row_sep: &str, cell_sep: &str, cx: Context) {
        let inner = if row_sep == ";" { cx.matrix() } else { cx.args() };
        self.push(eco_format!("{name}("));
        for (i, (key, value)) in cells.named.iter().enumerate() {
            if i > 0 {
                self.push(",");
            }
            self.push(eco_format!("{key}:"));
            self.node(value, cx.args());
        }
        if !cells.named.is_empty() && !cells.rows.is_empty() {
            self.push(",");
        }
        for (i, row) in cells.rows.iter().enumerate() {
            if i > 0 {
                self.push(row_sep);
            }
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    self.push(cell_sep);
                }
                self.node(cell, inner);
            }
        }
        self.push(")");
    }

    fn align(&mut self, rows: &Grid<TypstNode>, cx: Context) {
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                self.push("\\");
                self.push("\n");
            }
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    self.push("&");
                }
                self.node(cell, cx);
            }
        }
    }
}

/// How many primes a superscript consists of, if it consists of nothing
/// else.
fn prime_marks(sup: &TypstNode) -> Option<usize> {
    let is_prime = |n: &TypstNode| matches!(n, TypstNode::Atom(s) if s == "'");
    match sup {
        TypstNode::Group(nodes) if !nodes.is_empty() && nodes.iter().all(is_prime) => {
            Some(nodes.len())
        }
        node if is_prime(node) => Some(1),
        _ => None,
    }
}

/// Whether an operand must be wrapped in parentheses.
fn needs_parens(node: &TypstNode) -> bool {
    match node {
        TypstNode::Group(nodes) => !is_enclosed(nodes),
        TypstNode::Attach(_) | TypstNode::Frac(..) | TypstNode::Empty => true,
        _ => false,
    }
}

/// Whether the sequence is one pair of brackets around its content.
fn is_enclosed(nodes: &[TypstNode]) -> bool {
    let bracket = |n: &TypstNode| match n {
        TypstNode::Atom(s) => match s.as_str() {
            "(" | "[" | "{" => 1,
            ")" | "]" | "}" => -1,
            _ => 0,
        },
        _ => 0,
    };
    if nodes.len() < 2 || bracket(&nodes[0]) != 1 {
        return false;
    }
    let mut depth = 0;
    for (i, node) in nodes.iter().enumerate() {
        depth += bracket(node);
        if depth == 0 {
            return i + 1 == nodes.len();
        }
    }
    false
}

/// Quotes and escapes a string literal.
fn quote(text: &str) -> EcoString {
    let mut out = EcoString::from("\"");
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Joins pieces, inserting spaces where they are needed.
fn join(pieces: &[Piece]) -> String {
    let mut buf = String::new();
    let mut open_bar = false;

    for (i, piece) in pieces.iter().enumerate() {
        let token = match piece {
            Piece::Token(token) => token.as_str(),
            Piece::SoftSpace => {
                let next = pieces[i + 1..].iter().find_map(|p| match p {
                    Piece::Token(t) => Some(t.as_str()),
                    Piece::SoftSpace => None,
                });
                let dropped = next.is_none_or(|t| {
                    t.starts_with(char::is_whitespace)
                        || t.starts_with([')', ']', '}', ',', ';'])
                });
                if !dropped && !buf.is_empty() && !buf.ends_with(char::is_whitespace) {
                    buf.push(' ');
                }
                continue;
            }
        };

        if token.is_empty() {
            continue;
        }

        if token.starts_with('\n') {
            buf.truncate(buf.trim_end_matches(' ').len());
            buf.push_str(token);
            continue;
        }

        if token.starts_with(char::is_whitespace) {
            if !buf.is_empty() && !buf.ends_with(char::is_whitespace) {
                buf.push(' ');
            }
            continue;
        }

        if needs_space(&buf, token, open_bar) {
            buf.push(' ');
        }
        buf.push_str(token);
        if token == "|" {
            open_bar = !open_bar;
        }
    }

    buf
}

/// Whether a space must separate the buffer from the next token.
fn needs_space(buf: &str, token: &str, open_bar: bool) -> bool {
    let Some(last) = buf.chars().next_back() else { return false };
    let first = token.chars().next().unwrap_or(' ');

    if last.is_whitespace() {
        return false;
    }
    if matches!(last, '(' | '_' | '^' | '\'') {
        return false;
    }
    if last == '{' && !buf.ends_with("\\{") {
        return false;
    }
    if (last == '[' || (last == '|' && open_bar)) && is_word(first) {
        return false;
    }
    if matches!(token, ")" | "]" | "}") || (token == "|" && open_bar) {
        return false;
    }
    if token == "(" {
        return !opens_without_space(buf);
    }
    if matches!(token, "_" | "^" | "," | ";" | "!" | "'") {
        return false;
    }
    if last.is_ascii_digit() && first.is_ascii_digit() {
        return false;
    }
    if ends_with_leading_sign(buf) {
        return false;
    }
    if last == '&' && token == "=" {
        return false;
    }
    if last == '/' || token == "/" {
        return false;
    }
    true
}

/// Whether a bare parenthesis may directly follow the buffer without
/// turning what precedes it into a function call.
fn opens_without_space(buf: &str) -> bool {
    let Some(last) = buf.chars().next_back() else { return true };
    if matches!(last, ')' | ']' | '\'' | '(' | '[' | '{' | '_' | '^') || last.is_ascii_digit() {
        return true;
    }
    if !last.is_alphabetic() {
        return false;
    }
    let ident =
        buf.len() - buf.trim_end_matches(|c| unicode_ident::is_xid_start(c) || c == '.').len();
    ident == last.len_utf8()
}

/// Whether the buffer ends with a sign that belongs to the next token.
fn ends_with_leading_sign(buf: &str) -> bool {
    let Some(rest) = buf.strip_suffix(['-', '+']) else { return false };
    let rest = rest.trim_end();
    rest.is_empty() || rest.ends_with(['(', '[', '{', ',', '=', '_', '^', '&'])
}

fn is_word(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

static FLOOR: LazyLock<Regex> = LazyLock::new(|| pair_pattern("floor"));
static CEIL: LazyLock<Regex> = LazyLock::new(|| pair_pattern("ceil"));
static EMPTY_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(floor|ceil|round)\(\)").unwrap_or_else(|e| panic!("{e}")));

fn pair_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"{name}\.l\s*(.*?)\s*{name}\.r"))
        .unwrap_or_else(|err| panic!("invalid cleanup pattern: {err}"))
}

/// Rewrites idioms that only show up once the whole formula is written.
fn cleanup(text: &str, config: &WriterConfig) -> String {
    let trim = |text: &str| text.lines().map(str::trim_end).collect::<Vec<_>>().join("\n");
    if !config.optimize {
        return trim(text);
    }
    let text = FLOOR.replace_all(text, "floor($1)");
    let text = CEIL.replace_all(&text, "ceil($1)");
    let text = EMPTY_CALL.replace_all(&text, "$1(\"\")");
    trim(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typst::parse_str;

    #[track_caller]
    fn test(text: &str, goal: &str) {
        let node = parse_str(text).unwrap();
        assert_eq!(write(&node, &WriterConfig::default()), goal);
    }

    #[track_caller]
    fn test_tree(node: TypstNode, goal: &str) {
        assert_eq!(write(&node, &WriterConfig::default()), goal);
    }

    fn atom(text: &str) -> TypstNode {
        TypstNode::Atom(text.into())
    }

    #[test]
    fn test_write_spacing() {
        test("a+b", "a + b");
        test("f(x)", "f(x)");
        test("alpha (x)", "alpha (x)");
        test("(-a)", "(-a)");
        test("a, b", "a, b");
        test("n!", "n!");
        test("a/b", "a/b");
    }

    #[test]
    fn test_write_scripts() {
        test("x_1^2", "x_1^2");
        test("x^(a+b)", "x^(a + b)");
        test("f'", "f'");
        test("y'_1", "y'_1");
        test("f'^2", "f^('2)");
        test_tree(
            TypstNode::Group(vec![
                TypstNode::Attach(Attach::new(atom("x"), Some(atom("1")), None)),
                atom("2"),
            ]),
            "x_1 2",
        );
    }

    #[test]
    fn test_write_fractions() {
        test("(a+b)/c", "(a + b)/c");
        test("x^2/y", "(x^2)/y");
        test("a/b/c", "(a/b)/c");
    }

    #[test]
    fn test_write_calls() {
        test("sqrt(x)", "sqrt(x)");
        test("frac(a, b)", "frac(a, b)");
        test("op(\"sgn\", limits: #true)", "op(\"sgn\", limits: #true)");
        test_tree(
            TypstNode::call("sqrt", vec![TypstNode::Group(vec![atom("a"), atom(","), atom("b")])]),
            "sqrt(a comma b)",
        );
    }

    #[test]
    fn test_write_matrix() {
        test("mat(delim: \"(\", a, b; c, d)", "mat(delim: \"(\", a, b; c, d)");
        test("mat(a, b; c, d)", "mat(a, b; c, d)");
        let semicolon = TypstNode::Group(vec![atom("a"), atom(";"), atom("b")]);
        test_tree(
            TypstNode::Matrix(Cells {
                rows: vec![vec![semicolon.clone(), atom("c")]],
                named: vec![],
            }),
            "mat(a semi b, c)",
        );
        test_tree(semicolon, "a; b");
    }

    #[test]
    fn test_write_left_right() {
        test("lr(\\{ a)", "lr(\\{ a)");
        test("lr(chevron.l x chevron.r)", "lr(chevron.l x chevron.r)");
    }

    #[test]
    fn test_write_align() {
        test("a &= b \\\n c &= d", "a &= b \\\nc &= d");
    }

    #[test]
    fn test_write_shorthands() {
        let node = TypstNode::Group(vec![atom("a"), TypstNode::symbol("arrow.r"), atom("b")]);
        test_tree(node.clone(), "a -> b");
        let config = WriterConfig { prefer_shorthands: false, ..WriterConfig::default() };
        assert_eq!(write(&node, &config), "a arrow.r b");
        let config = WriterConfig { infty_to_oo: true, ..WriterConfig::default() };
        assert_eq!(write(&TypstNode::symbol("infinity"), &config), "oo");
    }

    #[test]
    fn test_write_text() {
        test("\"say \\\"hi\\\"\"", "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_cleanup() {
        let node = TypstNode::Group(vec![
            TypstNode::symbol("floor.l"),
            atom("x"),
            TypstNode::symbol("floor.r"),
        ]);
        test_tree(node, "floor(x)");
        test_tree(TypstNode::Group(vec![
            TypstNode::symbol("ceil.l"),
            TypstNode::symbol("ceil.r"),
        ]), "ceil(\"\")");
    }

    #[test]
    fn test_cleanup_needs_optimize() {
        let node = TypstNode::Group(vec![
            TypstNode::symbol("floor.l"),
            atom("x"),
            TypstNode::symbol("floor.r"),
        ]);
        let config = WriterConfig { optimize: false, ..WriterConfig::default() };
        assert_eq!(write(&node, &config), "floor.l x floor.r");
    }
}
