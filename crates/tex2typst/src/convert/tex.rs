use std::sync::LazyLock;

use ecow::{EcoString, eco_format};
use regex::Regex;
use tex2typst_syntax::tex::{Env, Func, TexNode};
use tex2typst_syntax::typst::{Call, Cells, TypstNode};
use tex2typst_syntax::{Attach, Delimited, Grid, symbols};

use crate::Options;
use crate::diag::{ConvertResult, bail};

/// Rewrites a TeX syntax tree into a Typst syntax tree.
pub fn tex_to_typst(node: &TexNode, options: &Options) -> ConvertResult<TypstNode> {
    Converter { options }.node(node)
}

struct Converter<'a> {
    options: &'a Options,
}

impl Converter<'_> {
    fn node(&self, node: &TexNode) -> ConvertResult<TypstNode> {
        Ok(match node {
            TexNode::Element(text) => element(text),
            TexNode::Symbol(name) => self.symbol(name)?,
            TexNode::Unknown(text) => self.unknown(text)?,
            TexNode::Text(text) => TypstNode::Text(text.clone()),
            TexNode::Comment(text) => TypstNode::Comment(text.clone()),
            TexNode::Space(space) if self.options.keep_spaces => TypstNode::Space(space.clone()),
            TexNode::Space(_) | TexNode::Empty => TypstNode::Empty,
            TexNode::Control(text) => control(text)?,
            TexNode::Group(nodes) => TypstNode::group(self.sequence(nodes)?),
            TexNode::Attach(attach) => self.attach(attach)?,
            TexNode::Func(func) => self.func(func)?,
            TexNode::LeftRight(delimited) => self.left_right(delimited)?,
            TexNode::Env(env) => self.env(env)?,
        })
    }

    /// Converts a sequence, dropping what converts to nothing.
    fn sequence(&self, nodes: &[TexNode]) -> ConvertResult<Vec<TypstNode>> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.node(node)? {
                TypstNode::Empty => {}
                node => out.push(node),
            }
        }
        Ok(out)
    }

    fn symbol(&self, name: &str) -> ConvertResult<TypstNode> {
        match symbols::tex_to_typst(name) {
            Some(mapped) => Ok(TypstNode::symbol(mapped)),
            None => self.unknown(&eco_format!("\\{name}")),
        }
    }

    fn unknown(&self, text: &EcoString) -> ConvertResult<TypstNode> {
        match text.strip_prefix('\\') {
            Some(name) if self.options.non_strict => {
                tracing::debug!(%text, "passing unknown macro through");
                Ok(TypstNode::symbol(name))
            }
            Some(_) => bail!(
                UnknownMacro(text.clone());
                hint: "enable non-strict mode to pass unknown macros through"
            ),
            None if self.options.non_strict => {
                tracing::debug!(%text, "passing unknown character through");
                Ok(TypstNode::Text(text.clone()))
            }
            None => bail!(UnknownToken(text.clone())),
        }
    }

    fn attach(&self, attach: &Attach<TexNode>) -> ConvertResult<TypstNode> {
        // A brace with its label becomes a two-argument call.
        if let TexNode::Func(func) = &*attach.base
            && let [body] = func.args.as_slice()
        {
            let label = match (func.name.as_str(), &attach.sub, &attach.sup) {
                ("overbrace", None, Some(label)) => Some(label),
                ("underbrace", Some(label), None) => Some(label),
                _ => None,
            };
            if let Some(label) = label {
                return Ok(TypstNode::call(
                    func.name.clone(),
                    vec![self.node(body)?, self.node(label)?],
                ));
            }
        }

        let base = self.node(&attach.base)?;
        let sub = attach.sub.as_deref().map(|n| self.node(n)).transpose()?;
        let sup = attach.sup.as_deref().map(|n| self.node(n)).transpose()?;
        Ok(TypstNode::Attach(Attach::new(base, sub, sup)))
    }

    fn func(&self, func: &Func) -> ConvertResult<TypstNode> {
        let optimize = self.options.optimize;
        Ok(match (func.name.as_str(), func.args.as_slice()) {
            ("frac" | "dfrac" | "tfrac", [num, den]) => {
                let (num, den) = (self.node(num)?, self.node(den)?);
                if self.options.frac_to_slash {
                    TypstNode::Frac(Box::new(num), Box::new(den))
                } else {
                    TypstNode::call("frac", vec![num, den])
                }
            }
            ("binom" | "dbinom" | "tbinom", [n, k]) => {
                TypstNode::call("binom", vec![self.node(n)?, self.node(k)?])
            }
            ("sqrt", [radicand]) => match &func.degree {
                Some(degree) => {
                    TypstNode::call("root", vec![self.node(degree)?, self.node(radicand)?])
                }
                None => TypstNode::call("sqrt", vec![self.node(radicand)?]),
            },
            ("text", [TexNode::Text(text)]) => self.text(text),
            ("operatorname", [TexNode::Text(name)]) => {
                let name = name.trim();
                if symbols::is_typst_operator(name) {
                    TypstNode::symbol(name)
                } else {
                    TypstNode::call("op", vec![TypstNode::Text(name.into())])
                }
            }
            ("operatorname*", [TexNode::Text(name)]) => {
                let mut call = Call::new("op", vec![TypstNode::Text(name.trim().into())]);
                call.named.push(("limits".into(), TypstNode::symbol("#true")));
                TypstNode::Call(call)
            }
            ("hspace", [TexNode::Text(length)]) => {
                TypstNode::call("#h", vec![TypstNode::Atom(length.trim().into())])
            }
            ("mathbf", [body]) => TypstNode::call(
                "upright",
                vec![TypstNode::call("bold", vec![self.node(body)?])],
            ),
            ("mathbb", [TexNode::Element(letter)])
                if optimize && letter.len() == 1 && letter.chars().all(|c| c.is_ascii_uppercase()) =>
            {
                TypstNode::symbol(eco_format!("{letter}{letter}"))
            }
            ("mathrm", [TexNode::Element(d)]) if optimize && d == "d" => TypstNode::symbol("dif"),
            ("overset" | "stackrel", [top, base]) => {
                if optimize && is_def(top) && *base == TexNode::Element("=".into()) {
                    return Ok(TypstNode::symbol("eq.def"));
                }
                let base = TypstNode::call("limits", vec![self.node(base)?]);
                TypstNode::Attach(Attach::new(base, None, Some(self.node(top)?)))
            }
            ("underset", [bottom, base]) => {
                let base = TypstNode::call("limits", vec![self.node(base)?]);
                TypstNode::Attach(Attach::new(base, Some(self.node(bottom)?), None))
            }
            (name, args) => {
                let args = args.iter().map(|arg| self.node(arg)).collect::<ConvertResult<_>>()?;
                match symbols::tex_to_typst(name) {
                    Some(mapped) => TypstNode::Call(Call::new(mapped, args)),
                    None if self.options.non_strict => {
                        tracing::debug!(name, "passing unknown command through");
                        TypstNode::Call(Call::new(name, args))
                    }
                    None => bail!(UnknownMacro(eco_format!("\\{name}"))),
                }
            }
        })
    }

    fn text(&self, text: &EcoString) -> TypstNode {
        let wrapper = &self.options.non_ascii_wrapper;
        if !wrapper.is_empty() && !text.is_ascii() {
            return TypstNode::call(wrapper.clone(), vec![TypstNode::Text(text.clone())]);
        }
        TypstNode::Text(text.clone())
    }

    fn left_right(&self, delimited: &Delimited<TexNode>) -> ConvertResult<TypstNode> {
        let body = self.node(&delimited.body)?;
        let left = delimited.left.as_deref();
        let right = delimited.right.as_deref();

        // Typst scales matching brackets on its own.
        match (left, right) {
            (None, None) => return Ok(body),
            (Some("("), Some(")")) => return Ok(TypstNode::Parens(unwrap_group(body))),
            (Some("["), Some("]")) => return Ok(bracketed("[", body, "]")),
            (Some("\\{" | "\\lbrace"), Some("\\}" | "\\rbrace")) => {
                return Ok(bracketed("{", body, "}"));
            }
            _ => {}
        }

        if self.options.optimize {
            let call = match (left, right) {
                (Some("|" | "\\vert" | "\\lvert"), Some("|" | "\\vert" | "\\rvert")) => Some("abs"),
                (Some("\\|" | "\\Vert" | "\\lVert"), Some("\\|" | "\\Vert" | "\\rVert")) => {
                    Some("norm")
                }
                (Some("\\lfloor"), Some("\\rfloor")) => Some("floor"),
                (Some("\\lceil"), Some("\\rceil")) => Some("ceil"),
                (Some("\\lfloor"), Some("\\rceil")) => Some("round"),
                _ => None,
            };
            if let Some(name) = call {
                return Ok(TypstNode::call(name, vec![body]));
            }
        }

        let left = left.map(delimiter).transpose()?;
        let right = right.map(delimiter).transpose()?;
        Ok(TypstNode::LeftRight(Delimited::new(left, body, right)))
    }

    fn env(&self, env: &Env) -> ConvertResult<TypstNode> {
        let rows = self.grid(&env.rows)?;
        Ok(match env.name.as_str() {
            "aligned" | "align" | "align*" | "alignat" | "alignat*" | "gathered" | "gather"
            | "gather*" | "split" | "eqnarray" | "eqnarray*" => TypstNode::Align(rows),
            "cases" => TypstNode::Cases(Cells::new(rows)),
            "matrix" | "smallmatrix" => matrix(rows, TypstNode::None),
            "pmatrix" => matrix(rows, TypstNode::Text("(".into())),
            "bmatrix" => matrix(rows, TypstNode::Text("[".into())),
            "Bmatrix" => matrix(rows, TypstNode::Text("{".into())),
            "vmatrix" => matrix(rows, TypstNode::Text("|".into())),
            "Vmatrix" => matrix(rows, TypstNode::Text("||".into())),
            "array" => self.array(env.spec.as_deref().unwrap_or_default(), rows)?,
            name => bail!(
                UnknownEnvironment(name.into());
                hint: "supported are `matrix`, `pmatrix`, `bmatrix`, `cases`, `aligned` and `array` among others"
            ),
        })
    }

    fn grid(&self, rows: &Grid<TexNode>) -> ConvertResult<Grid<TypstNode>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| self.node(cell)).collect())
            .collect()
    }

    /// Converts an `array` into a matrix without delimiters. Column
    /// alignment and vertical rules become named arguments.
    fn array(&self, spec: &str, rows: Grid<TypstNode>) -> ConvertResult<TypstNode> {
        let spec: EcoString = spec.chars().filter(|c| !c.is_whitespace()).collect();
        if !ARRAY_SPEC.is_match(&spec) {
            bail!(InvalidArgument(eco_format!("invalid column specification `{spec}`")));
        }

        let mut columns = vec![];
        let mut lines = vec![];
        for c in spec.chars() {
            match c {
                '|' => lines.push(columns.len()),
                c => columns.push(c),
            }
        }

        let mut cells = Cells::new(rows);
        cells.named.push(("delim".into(), TypstNode::None));

        let uniform = columns.windows(2).all(|pair| pair[0] == pair[1]);
        match columns.first() {
            Some('l') if uniform => cells.named.push(("align".into(), TypstNode::symbol("#left"))),
            Some('r') if uniform => {
                cells.named.push(("align".into(), TypstNode::symbol("#right")))
            }
            _ if uniform || self.options.non_strict => {}
            _ => bail!(
                InvalidArgument(eco_format!("mixed column alignment `{spec}` cannot be expressed"));
                hint: "Typst aligns all columns of a matrix the same way"
            ),
        }

        let augment = match lines.as_slice() {
            [] => None,
            [line] => Some(eco_format!("#{line}")),
            lines => {
                let list = lines.iter().map(usize::to_string).collect::<Vec<_>>().join(", ");
                Some(eco_format!("#(vline: ({list}))"))
            }
        };
        if let Some(augment) = augment {
            cells.named.push(("augment".into(), TypstNode::Symbol(augment)));
        }

        Ok(TypstNode::Matrix(cells))
    }
}

static ARRAY_SPEC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|*(?:[lcr]\|*)+$").unwrap_or_else(|err| panic!("invalid spec pattern: {err}"))
});

fn element(text: &EcoString) -> TypstNode {
    let text = match text.as_str() {
        "/" => "\\/",
        "\\{" => "{",
        "\\}" => "}",
        "\\%" => "%",
        "\\|" => return TypstNode::symbol("bar.v.double"),
        _ => return TypstNode::Atom(text.clone()),
    };
    TypstNode::Atom(text.into())
}

fn control(text: &str) -> ConvertResult<TypstNode> {
    Ok(match text {
        "\\\\" => TypstNode::Control("\\".into()),
        "&" => TypstNode::Control("&".into()),
        "\\!" => TypstNode::call("#h", vec![TypstNode::Atom("-math.thin.amount".into())]),
        "\\," => TypstNode::symbol("thin"),
        "\\:" | "\\>" => TypstNode::symbol("med"),
        "\\;" => TypstNode::symbol("thick"),
        "\\ " => TypstNode::symbol("space"),
        "~" => TypstNode::symbol("space.nobreak"),
        _ => bail!(UnknownToken(text.into())),
    })
}

/// Maps a TeX delimiter to one that may stand at either end of `lr`.
fn delimiter(delim: &str) -> ConvertResult<EcoString> {
    Ok(match delim {
        "(" | ")" | "[" | "]" => eco_format!("\\{delim}"),
        "\\{" | "\\}" | "|" => delim.into(),
        "\\|" => "bar.v.double".into(),
        "<" => "chevron.l".into(),
        ">" => "chevron.r".into(),
        "/" => "slash".into(),
        _ => match delim.strip_prefix('\\').and_then(symbols::tex_to_typst) {
            Some(mapped) => mapped.into(),
            None => bail!(UnknownDelimiter(delim.into())),
        },
    })
}

fn matrix(rows: Grid<TypstNode>, delim: TypstNode) -> TypstNode {
    let mut cells = Cells::new(rows);
    cells.named.push(("delim".into(), delim));
    TypstNode::Matrix(cells)
}

fn unwrap_group(node: TypstNode) -> Vec<TypstNode> {
    match node {
        TypstNode::Group(nodes) => nodes,
        TypstNode::Empty => vec![],
        node => vec![node],
    }
}

fn bracketed(open: &str, body: TypstNode, close: &str) -> TypstNode {
    let mut nodes = vec![TypstNode::Atom(open.into())];
    nodes.extend(unwrap_group(body));
    nodes.push(TypstNode::Atom(close.into()));
    TypstNode::Group(nodes)
}

/// Whether the node spells `def`, as in `\overset{def}{=}`.
fn is_def(node: &TexNode) -> bool {
    let letters = |nodes: &[TexNode]| {
        nodes.iter().filter(|n| !n.is_space()).map(|n| match n {
            TexNode::Element(s) => s.as_str(),
            _ => "",
        }).collect::<String>()
    };
    match node {
        TexNode::Group(nodes) => letters(nodes) == "def",
        TexNode::Text(text) => text.trim() == "def",
        TexNode::Func(func) if func.name == "text" || func.name == "mathrm" => {
            func.args.first().is_some_and(is_def)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::diag::{ConvertErrorKind, Error};
    use crate::{Options, tex2typst};

    #[track_caller]
    fn test(text: &str, goal: &str) {
        test_with(text, goal, &Options::default());
    }

    #[track_caller]
    fn test_with(text: &str, goal: &str, options: &Options) {
        assert_eq!(tex2typst(text, options).unwrap(), goal);
    }

    #[track_caller]
    fn test_error(text: &str, kind: ConvertErrorKind) {
        match tex2typst(text, &Options::default()) {
            Err(Error::Convert(err)) => assert_eq!(err.kind, kind),
            other => panic!("expected conversion error, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_symbols() {
        test("\\alpha + \\beta", "alpha + beta");
        test("a \\to b", "a -> b");
        test("x \\leq y", "x <= y");
        test("\\infty", "infinity");
        test_with("\\infty", "oo", &Options { infty_to_oo: true, ..Options::default() });
        test_with(
            "a \\to b",
            "a arrow.r b",
            &Options { prefer_shorthands: false, ..Options::default() },
        );
    }

    #[test]
    fn test_convert_fractions() {
        test("\\frac{a}{b}", "a/b");
        test("\\frac{a+b}{c}", "(a + b)/c");
        test_with(
            "\\frac{a}{b}",
            "frac(a, b)",
            &Options { frac_to_slash: false, ..Options::default() },
        );
        test("\\binom{n}{k}", "binom(n, k)");
    }

    #[test]
    fn test_convert_commands() {
        test("\\sqrt{x}", "sqrt(x)");
        test("\\sqrt[3]{x}", "root(3, x)");
        test("a + b = \\text{hello}", "a + b = \"hello\"");
        test("\\mathbf{x}", "upright(bold(x))");
        test("\\mathbb{R}", "RR");
        test_with("\\mathbb{R}", "bb(R)", &Options { optimize: false, ..Options::default() });
        test("\\hat{x}", "hat(x)");
        test("\\operatorname{sgn} x", "op(\"sgn\") x");
        test("\\operatorname{sech} x", "sech x");
        test("\\operatorname*{argmax}_x f", "op(\"argmax\", limits: #true)_x f");
        test("\\overset{def}{=}", "eq.def");
        test("\\overbrace{a+b}^{n}", "overbrace(a + b, n)");
    }

    #[test]
    fn test_convert_scripts() {
        test("x_1^2", "x_1^2");
        test("x^{a+b}", "x^(a + b)");
        test("{}_a", "\"\"_a");
        test("x_12", "x_1 2");
    }

    #[test]
    fn test_convert_spacing() {
        test("a\\,b", "a thin b");
        test("a\\;b", "a thick b");
        test("a~b", "a space.nobreak b");
        test("\\hspace{1em}", "#h(1em)");
        test("a\\!b", "a #h(-math.thin.amount) b");
    }

    #[test]
    fn test_convert_delimiters() {
        test("\\left( \\frac{a}{b} \\right)", "(a/b)");
        test("\\left\\{ a \\right.", "lr(\\{ a)");
        test("\\left. a \\right|", "lr(a |)");
        test("\\left| x \\right|", "abs(x)");
        test("\\left\\| x \\right\\|", "norm(x)");
        test("\\left\\lfloor x \\right\\rfloor", "floor(x)");
        test("\\left\\langle x \\right\\rangle", "lr(chevron.l x chevron.r)");
        test_with(
            "\\left| x \\right|",
            "lr(|x|)",
            &Options { optimize: false, ..Options::default() },
        );
    }

    #[test]
    fn test_convert_environments() {
        test(
            "\\begin{pmatrix}a&b\\\\c&d\\end{pmatrix}",
            "mat(delim: \"(\", a, b; c, d)",
        );
        test("\\begin{matrix}1&2\\end{matrix}", "mat(delim: #none, 1, 2)");
        test(
            "\\begin{cases} 1 & x > 0 \\\\ 0 & \\text{else} \\end{cases}",
            "cases(1 & x > 0, 0 & \"else\")",
        );
        test(
            "\\begin{aligned} a &= b \\\\ c &= d \\end{aligned}",
            "a &= b \\\nc &= d",
        );
    }

    #[test]
    fn test_convert_array() {
        test(
            "\\begin{array}{c|c}1&2\\end{array}",
            "mat(delim: #none, augment: #1, 1, 2)",
        );
        test(
            "\\begin{array}{ll}1&2\\end{array}",
            "mat(delim: #none, align: #left, 1, 2)",
        );
        test(
            "\\begin{array}{c|c|c}1&2&3\\end{array}",
            "mat(delim: #none, augment: #(vline: (1, 2)), 1, 2, 3)",
        );
        test_error(
            "\\begin{array}{lc}1&2\\end{array}",
            ConvertErrorKind::InvalidArgument(
                "mixed column alignment `lc` cannot be expressed".into(),
            ),
        );
    }

    #[test]
    fn test_convert_unknown() {
        test_error("\\foo", ConvertErrorKind::UnknownMacro("\\foo".into()));
        test_error("\\begin{foo}a\\end{foo}", ConvertErrorKind::UnknownEnvironment("foo".into()));
        test_with("\\foo", "foo", &Options { non_strict: true, ..Options::default() });
    }

    #[test]
    fn test_convert_options() {
        let mut options = Options { non_ascii_wrapper: "txt".into(), ..Options::default() };
        test_with("\\text{héllo}", "txt(\"héllo\")", &options);
        test_with("\\text{hello}", "\"hello\"", &options);
        options.custom_tex_macros.insert("R".into(), "\\mathbb{R}".into());
        test_with("x \\in \\R", "x in RR", &options);
        test_with("f (x)", "f (x)", &Options { keep_spaces: true, ..Options::default() });
        test_with("f (x)", "f(x)", &Options::default());
        test_with(
            "\\left\\lfloor x \\right\\rfloor",
            "lr(floor.l x floor.r)",
            &Options { optimize: false, ..Options::default() },
        );
    }
}
