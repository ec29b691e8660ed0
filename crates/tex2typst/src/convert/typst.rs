use std::sync::LazyLock;

use ecow::{EcoString, eco_format};
use regex::Regex;
use tex2typst_syntax::tex::{Env, Func, TexNode};
use tex2typst_syntax::typst::{self, Call, Cells, TypstNode, WriterConfig};
use tex2typst_syntax::{Attach, Delimited, Grid, symbols};

use crate::Options;
use crate::diag::{ConvertResult, bail};

/// Rewrites a Typst syntax tree into a TeX syntax tree.
pub fn typst_to_tex(node: &TypstNode, options: &Options) -> ConvertResult<TexNode> {
    Converter { options }.node(node)
}

struct Converter<'a> {
    options: &'a Options,
}

impl Converter<'_> {
    fn node(&self, node: &TypstNode) -> ConvertResult<TexNode> {
        Ok(match node {
            TypstNode::Atom(text) => atom(text),
            TypstNode::Symbol(name) => self.symbol(name)?,
            TypstNode::Text(text) => TexNode::func("text", vec![TexNode::Text(text.clone())]),
            TypstNode::Comment(text) => TexNode::Comment(text.clone()),
            TypstNode::Space(_) | TypstNode::None | TypstNode::Empty => TexNode::Empty,
            TypstNode::Control(text) if text == "\\" => TexNode::Control("\\\\".into()),
            TypstNode::Control(text) => TexNode::Control(text.clone()),
            TypstNode::Unknown(text) if self.options.non_strict => {
                tracing::debug!(%text, "passing unknown token through");
                TexNode::Unknown(text.clone())
            }
            TypstNode::Unknown(text) => bail!(UnknownToken(text.clone())),
            TypstNode::Group(nodes) => TexNode::group(self.sequence(nodes)?),
            TypstNode::Parens(nodes) => {
                let body = TexNode::group(self.sequence(nodes)?);
                if nodes.iter().any(TypstNode::is_tall) {
                    TexNode::LeftRight(Delimited::new(Some("(".into()), body, Some(")".into())))
                } else {
                    bracketed(TexNode::Element("(".into()), body, TexNode::Element(")".into()))
                }
            }
            TypstNode::Attach(attach) => self.attach(attach)?,
            TypstNode::Call(call) => self.call(call)?,
            TypstNode::Frac(num, den) => {
                TexNode::func("frac", vec![self.node(num)?, self.node(den)?])
            }
            TypstNode::LeftRight(delimited) => {
                let left = delimited.left.as_deref().map(delimiter).transpose()?;
                let right = delimited.right.as_deref().map(delimiter).transpose()?;
                TexNode::LeftRight(Delimited::new(left, self.node(&delimited.body)?, right))
            }
            TypstNode::Matrix(cells) => self.matrix(cells)?,
            TypstNode::Cases(cells) => env("cases", None, self.grid(&cells.rows)?),
            TypstNode::Align(rows) => env("aligned", None, self.grid(rows)?),
        })
    }

    fn sequence(&self, nodes: &[TypstNode]) -> ConvertResult<Vec<TexNode>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.node(node)? {
                TexNode::Empty => {}
                node => out.push(node),
            }
        }
        Ok(out)
    }

    fn grid(&self, rows: &Grid<TypstNode>) -> ConvertResult<Grid<TexNode>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| self.node(cell)).collect())
            .collect()
    }

    fn symbol(&self, name: &str) -> ConvertResult<TexNode> {
        let control = |text: &str| TexNode::Control(text.into());
        Ok(match name {
            "comma" => TexNode::Element(",".into()),
            "semi" => TexNode::Element(";".into()),
            "thin" => control("\\,"),
            "med" => control("\\:"),
            "thick" => control("\\;"),
            "space" => control("\\ "),
            "space.nobreak" => control("~"),
            "dif" => TexNode::func("mathrm", vec![TexNode::Element("d".into())]),
            "eq.def" => TexNode::func(
                "overset",
                vec![TexNode::Text("def".into()), TexNode::Element("=".into())],
            ),
            _ if is_double_letter(name) => {
                TexNode::func("mathbb", vec![TexNode::Element(name[..1].into())])
            }
            _ => match symbols::typst_to_tex(name) {
                Some(tex) => TexNode::Symbol(tex.into()),
                None if symbols::is_typst_operator(name) => operator(name),
                None if self.options.non_strict => {
                    tracing::debug!(name, "passing unknown symbol through");
                    TexNode::Unknown(name.into())
                }
                None => bail!(UnknownSymbol(name.into())),
            },
        })
    }

    fn attach(&self, attach: &Attach<TypstNode>) -> ConvertResult<TexNode> {
        let sub = attach.sub.as_deref().map(|n| self.node(n)).transpose()?;
        let sup = attach.sup.as_deref().map(|n| self.node(n)).transpose()?;

        let base = match &*attach.base {
            // Scripts on `limits` go above and below.
            TypstNode::Call(call) if call.name == "limits" && call.named.is_empty() => {
                let [body] = call.args.as_slice() else {
                    bail!(InvalidArgument("`limits` takes exactly one argument".into()));
                };
                let mut node = self.node(body)?;
                if let Some(sup) = sup {
                    node = TexNode::func("overset", vec![sup, node]);
                }
                if let Some(sub) = sub {
                    node = TexNode::func("underset", vec![sub, node]);
                }
                return Ok(node);
            }
            TypstNode::Text(text) if text.is_empty() => TexNode::Empty,
            base => self.node(base)?,
        };

        Ok(TexNode::Attach(Attach::new(base, sub, sup)))
    }

    fn call(&self, call: &Call) -> ConvertResult<TexNode> {
        // An operator with limits is the only named argument TeX can express.
        if call.name == "op"
            && let ([TypstNode::Text(text)], [(key, TypstNode::Symbol(value))]) =
                (call.args.as_slice(), call.named.as_slice())
            && key == "limits"
            && value == "#true"
        {
            return Ok(TexNode::func("operatorname*", vec![TexNode::Text(text.clone())]));
        }
        if !call.named.is_empty() {
            return self.generic(call);
        }

        let name = call.name.as_str();
        Ok(match (name, call.args.as_slice()) {
            ("frac", [num, den]) => TexNode::func("frac", vec![self.node(num)?, self.node(den)?]),
            ("binom", [n, k]) => TexNode::func("binom", vec![self.node(n)?, self.node(k)?]),
            ("sqrt", [radicand]) => TexNode::func("sqrt", vec![self.node(radicand)?]),
            ("root", [degree, radicand]) => TexNode::Func(Func {
                name: "sqrt".into(),
                args: vec![self.node(radicand)?],
                degree: Some(Box::new(self.node(degree)?)),
            }),
            ("op", [TypstNode::Text(text)]) => operator(text),
            ("#h", [length]) => {
                let length = plain(length);
                if length == "-math.thin.amount" {
                    TexNode::Control("\\!".into())
                } else {
                    TexNode::func("hspace", vec![TexNode::Text(length)])
                }
            }
            ("upright", [TypstNode::Call(inner)])
                if inner.name == "bold" && inner.args.len() == 1 && inner.named.is_empty() =>
            {
                TexNode::func("mathbf", vec![self.node(&inner.args[0])?])
            }
            ("abs", [body]) => self.fence("|", body, "|")?,
            ("norm", [body]) => self.fence("\\|", body, "\\|")?,
            ("floor", [body]) => self.fence("\\lfloor", body, "\\rfloor")?,
            ("ceil", [body]) => self.fence("\\lceil", body, "\\rceil")?,
            ("round", [body]) => self.fence("\\lfloor", body, "\\rceil")?,
            ("overbrace", [body, label]) => {
                let brace = TexNode::func("overbrace", vec![self.node(body)?]);
                TexNode::Attach(Attach::new(brace, None, Some(self.node(label)?)))
            }
            ("underbrace", [body, label]) => {
                let brace = TexNode::func("underbrace", vec![self.node(body)?]);
                TexNode::Attach(Attach::new(brace, Some(self.node(label)?), None))
            }
            // Sizing and style wrappers that TeX has no use for.
            ("lr" | "display" | "inline" | "limits" | "scripts", [body]) => self.node(body)?,
            (_, [TypstNode::Text(text)]) if self.options.non_ascii_wrapper == name => {
                TexNode::func("text", vec![TexNode::Text(text.clone())])
            }
            _ => self.generic(call)?,
        })
    }

    /// Converts a call by looking up its name.
    fn generic(&self, call: &Call) -> ConvertResult<TexNode> {
        let name = call.name.as_str();
        if let Some((key, _)) = call.named.first() {
            if !self.options.non_strict {
                bail!(InvalidArgument(eco_format!(
                    "argument `{key}` of `{name}` cannot be expressed in TeX"
                )));
            }
            tracing::debug!(name, key = %key, "dropping named arguments");
        }

        let args = call.args.iter().map(|arg| self.node(arg)).collect::<ConvertResult<Vec<_>>>()?;
        match symbols::typst_to_tex(name) {
            Some(tex) => match symbols::tex_arity(tex) {
                Some(arity) if usize::from(arity) == args.len() => Ok(TexNode::func(tex, args)),
                Some(arity) => bail!(InvalidArgument(eco_format!(
                    "`{name}` takes {arity} argument{} in TeX",
                    if arity == 1 { "" } else { "s" }
                ))),
                // A symbol applied to arguments, like `sin(x)`.
                None => Ok(applied(TexNode::Symbol(tex.into()), args)),
            },
            None if symbols::is_typst_operator(name) => Ok(applied(operator(name), args)),
            None if self.options.non_strict => {
                tracing::debug!(name, "passing unknown function through");
                Ok(TexNode::func(name, args))
            }
            None => bail!(
                UnknownSymbol(call.name.clone());
                hint: "enable non-strict mode to pass unknown functions through"
            ),
        }
    }

    /// Encloses a body in delimiters, sized only if the body is tall.
    fn fence(&self, left: &str, body: &TypstNode, right: &str) -> ConvertResult<TexNode> {
        let converted = self.node(body)?;
        if body.is_tall() {
            return Ok(TexNode::LeftRight(Delimited::new(
                Some(left.into()),
                converted,
                Some(right.into()),
            )));
        }
        Ok(bracketed(delimiter_node(left), converted, delimiter_node(right)))
    }

    fn matrix(&self, cells: &Cells) -> ConvertResult<TexNode> {
        let rows = self.grid(&cells.rows)?;
        let delim = match cells.get("delim") {
            None => Some("("),
            Some(TypstNode::None) => None,
            Some(TypstNode::Text(delim)) => Some(delim.as_str()),
            Some(other) => bail!(UnknownDelimiter(plain(other))),
        };
        let (name, fences) = match delim {
            None => ("matrix", None),
            Some("(") => ("pmatrix", Some(("(", ")"))),
            Some("[") => ("bmatrix", Some(("[", "]"))),
            Some("{") => ("Bmatrix", Some(("\\{", "\\}"))),
            Some("|") => ("vmatrix", Some(("|", "|"))),
            Some("||") => ("Vmatrix", Some(("\\|", "\\|"))),
            Some(other) => bail!(
                UnknownDelimiter(other.into());
                hint: "TeX matrices support `(`, `[`, `{`, `|` and `||`"
            ),
        };

        for (key, _) in &cells.named {
            if !matches!(key.as_str(), "delim" | "align" | "augment") && !self.options.non_strict {
                bail!(InvalidArgument(eco_format!("matrix argument `{key}` cannot be expressed in TeX")));
            }
        }

        if cells.get("align").is_none() && cells.get("augment").is_none() {
            return Ok(env(name, None, rows));
        }

        // Alignment and rules need an array, which has no delimiters.
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let spec = self.array_spec(cells, columns)?;
        let array = env("array", Some(spec), rows);
        Ok(match fences {
            Some((left, right)) => {
                TexNode::LeftRight(Delimited::new(Some(left.into()), array, Some(right.into())))
            }
            None => array,
        })
    }

    /// Builds the column specification of an `array` from `align` and
    /// `augment`.
    fn array_spec(&self, cells: &Cells, columns: usize) -> ConvertResult<EcoString> {
        let align = match cells.get("align") {
            None => 'c',
            Some(TypstNode::Symbol(value)) => match value.as_str() {
                "#left" | "#start" => 'l',
                "#right" | "#end" => 'r',
                "#center" => 'c',
                _ => bail!(InvalidArgument(eco_format!("unsupported matrix alignment `{value}`"))),
            },
            Some(other) => {
                bail!(InvalidArgument(eco_format!("unsupported matrix alignment `{}`", plain(other))))
            }
        };

        let lines = match cells.get("augment") {
            None => vec![],
            Some(TypstNode::Symbol(value)) => {
                if value.contains("hline") && !self.options.non_strict {
                    bail!(InvalidArgument("horizontal rules cannot be expressed in TeX".into()));
                }
                let vlines = value.split("hline").next().unwrap_or_default();
                augment_lines(vlines, columns)
            }
            Some(other) => {
                bail!(InvalidArgument(eco_format!("unsupported augmentation `{}`", plain(other))))
            }
        };

        let mut spec = EcoString::new();
        for i in 0..=columns {
            for _ in lines.iter().filter(|&&line| line == i) {
                spec.push('|');
            }
            if i < columns {
                spec.push(align);
            }
        }
        Ok(spec)
    }
}

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?[0-9]+").unwrap_or_else(|err| panic!("invalid number pattern: {err}"))
});

/// The column positions of the vertical rules in an `augment` value like
/// `#1` or `#(vline: (1, -1))`. Negative positions count from the end.
fn augment_lines(value: &str, columns: usize) -> Vec<usize> {
    let columns = i64::try_from(columns).unwrap_or(i64::MAX);
    let mut lines: Vec<usize> = NUMBER
        .find_iter(value)
        .filter_map(|m| m.as_str().parse::<i64>().ok())
        .map(|n| if n < 0 { columns + n } else { n })
        .filter_map(|n| usize::try_from(n.clamp(0, columns)).ok())
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

fn atom(text: &str) -> TexNode {
    let text = match text {
        "{" | "\\{" => "\\{",
        "}" | "\\}" => "\\}",
        "%" => "\\%",
        "\\_" | "\\&" | "\\#" | "\\$" | "\\%" => text,
        "\\\\" => return TexNode::Symbol("backslash".into()),
        "~" => return TexNode::Control("~".into()),
        _ => text.strip_prefix('\\').filter(|rest| !rest.is_empty()).unwrap_or(text),
    };
    TexNode::Element(text.into())
}

/// Maps a delimiter of `lr` to one that may follow `\left` or `\right`.
fn delimiter(delim: &str) -> ConvertResult<EcoString> {
    Ok(match delim {
        "(" | "\\(" => "(".into(),
        ")" | "\\)" => ")".into(),
        "[" | "\\[" => "[".into(),
        "]" | "\\]" => "]".into(),
        "{" | "\\{" => "\\{".into(),
        "}" | "\\}" => "\\}".into(),
        "|" | "\\|" | "bar.v" => "|".into(),
        "bar.v.double" => "\\|".into(),
        "slash" => "/".into(),
        _ => match symbols::typst_to_tex(delim) {
            Some(tex) => eco_format!("\\{tex}"),
            None => bail!(UnknownDelimiter(delim.into())),
        },
    })
}

/// A delimiter as a node of its own, for pairs that are not sized.
fn delimiter_node(delim: &str) -> TexNode {
    match delim.strip_prefix('\\') {
        Some(name) if name.chars().all(|c| c.is_ascii_alphabetic()) => {
            TexNode::Symbol(name.into())
        }
        _ => TexNode::Element(delim.into()),
    }
}

fn operator(name: &str) -> TexNode {
    TexNode::func("operatorname", vec![TexNode::Text(name.into())])
}

/// A head followed by a parenthesized argument list: `\sin(x)`.
fn applied(head: TexNode, args: Vec<TexNode>) -> TexNode {
    let mut nodes = vec![head, TexNode::Element("(".into())];
    for (i, arg) in args.into_iter().enumerate() {
        if i > 0 {
            nodes.push(TexNode::Element(",".into()));
        }
        nodes.push(arg);
    }
    nodes.push(TexNode::Element(")".into()));
    TexNode::Group(nodes)
}

fn bracketed(open: TexNode, body: TexNode, close: TexNode) -> TexNode {
    let mut nodes = vec![open];
    match body {
        TexNode::Group(inner) => nodes.extend(inner),
        TexNode::Empty => {}
        body => nodes.push(body),
    }
    nodes.push(close);
    TexNode::Group(nodes)
}

fn env(name: &str, spec: Option<EcoString>, rows: Grid<TexNode>) -> TexNode {
    TexNode::Env(Env { name: name.into(), spec, rows })
}

/// Whether the name is a doubled capital like `RR`.
fn is_double_letter(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0] == bytes[1] && bytes[0].is_ascii_uppercase()
}

/// Writes a node back to compact Typst text.
fn plain(node: &TypstNode) -> EcoString {
    let config = WriterConfig { prefer_shorthands: false, infty_to_oo: false, optimize: false };
    typst::write(node, &config).split_whitespace().collect::<String>().into()
}

#[cfg(test)]
mod tests {
    use crate::diag::{ConvertErrorKind, Error};
    use crate::{Options, typst2tex};

    #[track_caller]
    fn test(text: &str, goal: &str) {
        test_with(text, goal, &Options::default());
    }

    #[track_caller]
    fn test_with(text: &str, goal: &str, options: &Options) {
        assert_eq!(typst2tex(text, options).unwrap(), goal);
    }

    #[track_caller]
    fn test_error(text: &str, kind: ConvertErrorKind) {
        match typst2tex(text, &Options::default()) {
            Err(Error::Convert(err)) => assert_eq!(err.kind, kind),
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_symbols() {
        test("alpha + beta", "\\alpha + \\beta");
        test("a -> b", "a \\rightarrow b");
        test("x in RR", "x \\in \\mathbb{R}");
        test("dif x", "\\mathrm{d} x");
        test("a thin b", "a \\, b");
        test("sech x", "\\operatorname{sech} x");
        test("eq.def", "\\overset{def}{=}");
    }

    #[test]
    fn test_convert_fractions() {
        test("a/b", "\\frac{a}{b}");
        test("frac(a, b)", "\\frac{a}{b}");
        test("(a + b)/2", "\\frac{a + b}{2}");
        test("binom(n, k)", "\\binom{n}{k}");
    }

    #[test]
    fn test_convert_calls() {
        test("sqrt(x)", "\\sqrt{x}");
        test("root(3, x)", "\\sqrt[3]{x}");
        test("\"hello\"", "\\text{hello}");
        test("upright(bold(x))", "\\mathbf{x}");
        test("bold(x)", "\\boldsymbol{x}");
        test("op(\"sgn\") x", "\\operatorname{sgn} x");
        test("op(\"argmax\", limits: #true)_x f", "\\operatorname*{argmax}_x f");
        test("\"a}b\"", "\\text{a\\}b}");
        test("sin(x)", "\\sin(x)");
        test("#h(1em)", "\\hspace{1em}");
        test("a #h(-math.thin.amount) b", "a \\! b");
        test("overbrace(a + b, n)", "\\overbrace{a + b}^n");
        test("limits(=)^(d e f)", "\\overset{d e f}{=}");
    }

    #[test]
    fn test_convert_scripts() {
        test("x_1^2", "x_1^2");
        test("\"\"_a", "{}_a");
        test("f'", "f'");
    }

    #[test]
    fn test_convert_delimiters() {
        test("f(x)", "f(x)");
        test("(a/b)", "\\left( \\frac{a}{b} \\right)");
        test("abs(x)", "|x|");
        test("abs(x/2)", "\\left| \\frac{x}{2} \\right|");
        test("floor(x)", "\\lfloor x \\rfloor");
        test("lr(\\{ a)", "\\left\\{ a \\right.");
        test("lr(chevron.l x chevron.r)", "\\left\\langle x \\right\\rangle");
    }

    #[test]
    fn test_convert_matrices() {
        test(
            "mat(delim: \"(\", a, b; c, d)",
            "\\begin{pmatrix}\na & b \\\\\nc & d\n\\end{pmatrix}",
        );
        test("mat(delim: #none, 1, 2)", "\\begin{matrix}\n1 & 2\n\\end{matrix}");
        test("mat(1, 2)", "\\begin{pmatrix}\n1 & 2\n\\end{pmatrix}");
        test(
            "mat(delim: #none, augment: #1, 1, 2)",
            "\\begin{array}{c|c}\n1 & 2\n\\end{array}",
        );
        test(
            "mat(delim: #none, align: #left, augment: #(vline: (1, 2)), 1, 2, 3)",
            "\\begin{array}{l|l|l}\n1 & 2 & 3\n\\end{array}",
        );
        test_error("mat(delim: \"<\", 1)", ConvertErrorKind::UnknownDelimiter("<".into()));
    }

    #[test]
    fn test_convert_grids() {
        test(
            "cases(1 & x > 0, 0 & \"else\")",
            "\\begin{cases}\n1 & x > 0 \\\\\n0 & \\text{else}\n\\end{cases}",
        );
        test(
            "a &= b \\\n c &= d",
            "\\begin{aligned}\na &= b \\\\\nc &= d\n\\end{aligned}",
        );
    }

    #[test]
    fn test_convert_unknown() {
        test_error("abc", ConvertErrorKind::UnknownSymbol("abc".into()));
        test_error("foo(x)", ConvertErrorKind::UnknownSymbol("foo".into()));
        test_with("abc", "abc", &Options { non_strict: true, ..Options::default() });
    }
}
