use crate::node::{Attach, Delimited};
use crate::tex::{Env, Func, TexNode};

/// Serializes a syntax tree back into TeX math.
///
/// Nodes are written as a stream of tokens and whitespace between tokens is
/// only inserted where TeX needs it or where it helps reading.
pub fn write(node: &TexNode) -> String {
    let mut w = Writer::default();
    w.node(node);
    let mut buf = w.buf;
    buf.truncate(buf.trim_end().len());
    buf
}

#[derive(Default)]
struct Writer {
    buf: String,
    /// Whether an odd number of bare `|` has been written.
    open_bar: bool,
}

impl Writer {
    fn node(&mut self, node: &TexNode) {
        match node {
            TexNode::Element(text) | TexNode::Unknown(text) | TexNode::Control(text) => {
                self.push(text)
            }
            TexNode::Symbol(name) => self.push(&format!("\\{name}")),
            TexNode::Text(text) => self.push(&format!("\\text{{{}}}", escape_text(text))),
            TexNode::Comment(text) => {
                self.push(&format!("%{text}"));
                self.push("\n");
            }
            TexNode::Space(space) => self.push(space),
            TexNode::Empty => {}
            TexNode::Group(nodes) => nodes.iter().for_each(|n| self.node(n)),
            TexNode::Attach(attach) => self.attach(attach),
            TexNode::Func(func) => self.func(func),
            TexNode::LeftRight(delimited) => self.left_right(delimited),
            TexNode::Env(env) => self.env(env),
        }
    }

    fn attach(&mut self, attach: &Attach<TexNode>) {
        match &*attach.base {
            base @ (TexNode::Group(_) | TexNode::Attach(_) | TexNode::Empty) => {
                self.push("{");
                self.node(base);
                self.push("}");
            }
            base => self.node(base),
        }

        // Leading primes go right after the base.
        let mut sup = attach.sup.as_deref();
        if let Some(node) = sup {
            let marks = leading_primes(node);
            for _ in 0..marks {
                self.push("'");
            }
            sup = match node {
                TexNode::Group(nodes) if marks > 0 => match &nodes[marks..] {
                    [] => None,
                    [single] => Some(single),
                    _ => {
                        self.script("_", attach.sub.as_deref());
                        self.push("^");
                        self.push("{");
                        nodes[marks..].iter().for_each(|n| self.node(n));
                        self.push("}");
                        return;
                    }
                },
                _ if marks > 0 => None,
                _ => sup,
            };
        }

        self.script("_", attach.sub.as_deref());
        self.script("^", sup);
    }

    fn script(&mut self, marker: &str, script: Option<&TexNode>) {
        let Some(script) = script else { return };
        self.push(marker);
        let bare = match script {
            TexNode::Element(text) => text.chars().count() == 1 || text.starts_with('\\'),
            TexNode::Symbol(_) => true,
            _ => false,
        };
        if bare {
            self.node(script);
        } else {
            self.push("{");
            self.node(script);
            self.push("}");
        }
    }

    fn func(&mut self, func: &Func) {
        self.push(&format!("\\{}", func.name));
        if let Some(degree) = &func.degree {
            self.push("[");
            self.node(degree);
            self.push("]");
        }
        for arg in &func.args {
            self.push("{");
            match arg {
                TexNode::Text(text) => self.push(&escape_text(text)),
                arg => self.node(arg),
            }
            self.push("}");
        }
    }

    fn left_right(&mut self, delimited: &Delimited<TexNode>) {
        let left = delimited.left.as_deref().unwrap_or(".");
        let right = delimited.right.as_deref().unwrap_or(".");
        self.push(&format!("\\left{left}"));
        self.push(" ");
        match &*delimited.body {
            TexNode::Group(nodes) => {
                let start = nodes.iter().take_while(|n| n.is_space()).count();
                let end = nodes.len() - nodes[start..].iter().rev().take_while(|n| n.is_space()).count();
                nodes[start..end].iter().for_each(|n| self.node(n));
            }
            body if body.is_space() => {}
            body => self.node(body),
        }
        self.push(&format!("\\right{right}"));
    }

    fn env(&mut self, env: &Env) {
        self.push(&format!("\\begin{{{}}}", env.name));
        if let Some(spec) = &env.spec {
            self.buf.push_str(&format!("{{{spec}}}"));
        }
        self.push("\n");
        for (i, row) in env.rows.iter().enumerate() {
            if i > 0 {
                self.push("\\\\");
                self.push("\n");
            }
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    self.push("&");
                }
                self.node(cell);
            }
        }
        self.push("\n");
        self.push(&format!("\\end{{{}}}", env.name));
    }

    /// Appends a token, preceded by a space unless it would be noise.
    fn push(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        if self.needs_space(token) {
            self.buf.push(' ');
        }
        self.buf.push_str(token);
        if token == "|" {
            self.open_bar = !self.open_bar;
        }
    }

    fn needs_space(&self, token: &str) -> bool {
        let buf = self.buf.as_str();
        let Some(last) = buf.chars().next_back() else { return false };
        let first = token.chars().next().unwrap_or(' ');

        if last.is_whitespace() || first.is_whitespace() {
            return false;
        }
        if matches!(last, '{' | '(' | '[' | '|' | '_' | '^') {
            return false;
        }
        if token == "[" && ends_with_command(buf) {
            return false;
        }
        if matches!(
            token,
            "." | "," | ";" | ":" | "!" | "?" | "(" | ")" | "]" | "{" | "}" | "_" | "^" | "'"
                | "\\{"
                | "\\}"
        ) {
            return false;
        }
        if token == "|" && self.open_bar {
            return false;
        }
        if buf == "-" || buf == "+" || ends_with_leading_sign(buf) {
            return false;
        }
        if last == '&' && token == "=" {
            return false;
        }
        if last.is_ascii_digit() && first.is_ascii_digit() {
            return false;
        }
        true
    }
}

/// How many prime marks a superscript starts with.
fn leading_primes(node: &TexNode) -> usize {
    let is_prime = |n: &TexNode| matches!(n, TexNode::Element(s) if s == "'");
    match node {
        TexNode::Group(nodes) => nodes.iter().take_while(|n| is_prime(n)).count(),
        node if is_prime(node) => 1,
        _ => 0,
    }
}

/// Escapes the characters that TeX reads specially inside `\text{}`.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '%' | '&' | '#' | '_' | '$' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Whether the text ends with a command name like `\sqrt`.
fn ends_with_command(text: &str) -> bool {
    let name = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    name.len() < text.len() && name.ends_with('\\')
}

/// Whether the text ends with a sign directly after an opening bracket, as
/// in `(-`.
fn ends_with_leading_sign(text: &str) -> bool {
    let Some(rest) = text.strip_suffix(['-', '+']) else { return false };
    rest.trim_end().ends_with(['(', '[', '{'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tex::parse_str;

    #[track_caller]
    fn test(text: &str, goal: &str) {
        let node = parse_str(text).unwrap();
        assert_eq!(write(&node), goal);
    }

    fn el(text: &str) -> TexNode {
        TexNode::Element(text.into())
    }

    #[test]
    fn test_write_commands() {
        test("\\frac{a}{b}", "\\frac{a}{b}");
        test("\\frac12", "\\frac{1}{2}");
        test("\\sqrt[3]{x}", "\\sqrt[3]{x}");
        test("\\text{a b}", "\\text{a b}");
        test("\\alpha+\\beta", "\\alpha + \\beta");
    }

    #[test]
    fn test_write_scripts() {
        test("x_1^2", "x_1^2");
        test("x^{10}", "x^{10}");
        test("x_{i+1}", "x_{i + 1}");
        test("x^\\alpha", "x^\\alpha");
        test("{a b}^2", "{a b}^2");
        test("f'", "f'");
        test("y_1'", "y'_1");
        test("f''^2", "f''^2");
    }

    #[test]
    fn test_write_spacing() {
        test("(-a)", "(-a)");
        test("-a+b", "-a + b");
        test("f(x)", "f(x)");
        test("a,b", "a, b");
        test("|x|", "|x|");
    }

    #[test]
    fn test_write_left_right() {
        test("\\left(x\\right)", "\\left( x \\right)");
        test("\\left\\{ a \\right.", "\\left\\{ a \\right.");
    }

    #[test]
    fn test_write_environment() {
        test(
            "\\begin{aligned}a&=b\\\\c&=d\\end{aligned}",
            "\\begin{aligned}\na &= b \\\\\nc &= d\n\\end{aligned}",
        );
        test(
            "\\begin{array}{c|c}1&2\\end{array}",
            "\\begin{array}{c|c}\n1 & 2\n\\end{array}",
        );
    }

    #[test]
    fn test_write_built_tree() {
        let node = TexNode::Attach(Attach::new(
            TexNode::Empty,
            None,
            Some(TexNode::Group(vec![el("a"), el("b")])),
        ));
        assert_eq!(write(&node), "{}^{a b}");
    }

    #[test]
    fn test_write_escaped_text() {
        let text = |t: &str| TexNode::Text(t.into());
        assert_eq!(write(&text("a}b")), "\\text{a\\}b}");
        assert_eq!(write(&text("50% & $5")), "\\text{50\\% \\& \\$5}");
        assert_eq!(write(&text("x_1 #2")), "\\text{x\\_1 \\#2}");
        assert_eq!(write(&text("a\\b")), "\\text{a\\textbackslash{}b}");
        assert_eq!(
            write(&TexNode::func("operatorname", vec![text("{op}")])),
            "\\operatorname{\\{op\\}}"
        );
        test("\\text{a\\}b \\textbackslash{}}", "\\text{a\\}b \\textbackslash{}}");
    }
}
