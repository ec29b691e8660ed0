use ecow::EcoString;

use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult, bail};
use crate::node::{Attach, Delimited, Grid};
use crate::symbols;
use crate::tex::{Env, Func, TexKind, TexNode, TexToken};

/// Parses TeX tokens into a syntax tree.
///
/// Whitespace next to script markers is dropped; all other whitespace is
/// kept as [`TexNode::Space`] for later passes to honor or ignore.
#[tracing::instrument(skip_all)]
pub fn parse(tokens: &[TexToken]) -> SyntaxResult<TexNode> {
    let tokens = strip_script_spaces(tokens);
    let mut p = Parser { tokens: &tokens, align_depth: 0 };
    let nodes = p.sequence(0, tokens.len())?;
    Ok(TexNode::group(nodes))
}

/// A recursive descent parser over a token slice.
///
/// Every method takes the position to start at and the position to stop
/// before, and returns the position after what it consumed.
struct Parser<'a> {
    tokens: &'a [TexToken],
    /// How many environments enclose the current position. Cell and row
    /// separators are only allowed inside one.
    align_depth: usize,
}

impl Parser<'_> {
    /// Parses nodes until `end`.
    fn sequence(&mut self, start: usize, end: usize) -> SyntaxResult<Vec<TexNode>> {
        let mut nodes = vec![];
        let mut pos = start;
        while pos < end {
            let (node, next) = self.expr(pos, end)?;
            nodes.push(node);
            pos = next;
        }
        Ok(nodes)
    }

    /// Parses an expression with its primes and scripts: `x'_1^2`.
    fn expr(&mut self, pos: usize, end: usize) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let (base, mut pos) = self.atom(pos, end)?;
        let mut primes = count_primes(tokens, &mut pos, end);
        let mut sub = None;
        let mut sup = None;

        while pos < end {
            let token = &tokens[pos];
            if token.is(TexKind::Control, "_") {
                if sub.is_some() {
                    bail!(DoubleSubscript, token.span; hint: "use braces to group the subscripts");
                }
                let (script, next) = self.argument(pos + 1, end, token)?;
                sub = Some(script);
                pos = next;
                primes += count_primes(tokens, &mut pos, end);
            } else if token.is(TexKind::Control, "^") {
                if sup.is_some() {
                    bail!(DoubleSuperscript, token.span; hint: "use braces to group the superscripts");
                }
                let (script, next) = self.argument(pos + 1, end, token)?;
                sup = Some(script);
                pos = next;
            } else {
                break;
            }
        }

        if primes > 0 {
            let mut marks = vec![TexNode::Element("'".into()); primes];
            marks.extend(sup);
            sup = Some(TexNode::Group(marks));
        }

        if sub.is_none() && sup.is_none() {
            return Ok((base, pos));
        }

        Ok((TexNode::Attach(Attach::new(base, sub, sup)), pos))
    }

    /// Parses an expression without scripts.
    fn atom(&mut self, pos: usize, end: usize) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let token = &tokens[pos];
        let node = match token.kind {
            TexKind::Element => TexNode::Element(token.text.clone()),
            TexKind::Text => TexNode::Text(token.text.clone()),
            TexKind::Comment => TexNode::Comment(token.text.clone()),
            TexKind::Space | TexKind::Newline => TexNode::Space(token.text.clone()),
            TexKind::Unknown => TexNode::Unknown(token.text.clone()),
            TexKind::Command => return self.command(pos, end),
            TexKind::Control => match token.text.as_str() {
                "{" => {
                    let Some(close) = find_closing(tokens, pos, end, is_open_brace, is_close_brace)
                    else {
                        bail!(UnclosedDelimiter("{".into()), token.span);
                    };
                    let nodes = self.sequence(pos + 1, close)?;
                    return Ok((TexNode::group(nodes), close + 1));
                }
                "}" => bail!(UnexpectedClose("}".into()), token.span),
                // A script without base.
                "_" | "^" => return Ok((TexNode::Empty, pos)),
                "&" if self.align_depth == 0 => bail!(
                    StrayCellSeparator, token.span;
                    hint: "cells can only be separated inside an environment like `aligned`"
                ),
                "\\\\" if self.align_depth == 0 => bail!(
                    StrayRowSeparator, token.span;
                    hint: "rows can only be separated inside an environment like `aligned`"
                ),
                _ => TexNode::Control(token.text.clone()),
            },
        };
        Ok((node, pos + 1))
    }

    /// Parses a command and its arguments.
    fn command(&mut self, pos: usize, end: usize) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let token = &tokens[pos];
        let name = &token.text[1..];

        match name {
            "left" => return self.left_right(pos, end),
            "right" => bail!(UnexpectedRight, token.span),
            "begin" => return self.environment(pos, end),
            "end" => {
                let name = braced_text(tokens, pos + 1, end).unwrap_or_default();
                bail!(UnexpectedEnd(name), token.span);
            }
            "text" | "operatorname" | "operatorname*" | "hspace" => {
                let (text, next) = self.text_argument(pos + 1, end, token)?;
                return Ok((TexNode::func(name, vec![TexNode::Text(text)]), next));
            }
            _ => {}
        }

        let Some(arity) = symbols::tex_arity(name) else {
            let node = if symbols::tex_to_typst(name).is_some() {
                TexNode::Symbol(name.into())
            } else {
                TexNode::Unknown(token.text.clone())
            };
            return Ok((node, pos + 1));
        };

        let mut next = pos + 1;
        let mut degree = None;
        if name == "sqrt" {
            let open = skip_spaces(tokens, next, end);
            if open < end && tokens[open].is(TexKind::Element, "[") {
                let Some(close) =
                    find_closing(tokens, open, end, is_open_bracket, is_close_bracket)
                else {
                    bail!(UnclosedDelimiter("[".into()), tokens[open].span);
                };
                degree = Some(Box::new(TexNode::group(self.sequence(open + 1, close)?)));
                next = close + 1;
            }
        }

        let mut args = Vec::with_capacity(usize::from(arity));
        for _ in 0..arity {
            let (arg, after) = self.argument(next, end, token)?;
            args.push(arg);
            next = after;
        }

        Ok((TexNode::Func(Func { name: name.into(), args, degree }), next))
    }

    /// Parses the single expression that forms an argument of `owner`.
    fn argument(
        &mut self,
        pos: usize,
        end: usize,
        owner: &TexToken,
    ) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let pos = skip_spaces(tokens, pos, end);
        let missing = || {
            SyntaxError::new(SyntaxErrorKind::MissingArgument(owner.text.clone()), owner.span)
        };
        let Some(token) = tokens[..end].get(pos) else {
            return Err(missing());
        };
        if token.kind == TexKind::Control
            && matches!(token.text.as_str(), "_" | "^" | "&" | "\\\\" | "}")
        {
            return Err(missing());
        }
        self.atom(pos, end)
    }

    /// Parses the raw text argument of `\text` and friends.
    fn text_argument(
        &self,
        pos: usize,
        end: usize,
        owner: &TexToken,
    ) -> SyntaxResult<(EcoString, usize)> {
        let tokens = self.tokens;
        let pos = skip_spaces(tokens, pos, end);
        if let Some(text) = braced_text(tokens, pos, end) {
            return Ok((text, pos + 3));
        }
        match tokens[..end].get(pos) {
            Some(token) if token.kind == TexKind::Element => Ok((token.text.clone(), pos + 1)),
            _ => bail!(MissingArgument(owner.text.clone()), owner.span),
        }
    }

    /// Parses `\left( ... \right)`.
    fn left_right(&mut self, pos: usize, end: usize) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let left = &tokens[pos];
        let Some(right) = find_closing(tokens, pos, end, is_left, is_right) else {
            bail!(UnclosedLeft, left.span; hint: "use `\\right.` for an invisible delimiter");
        };

        let (open, body_start) = delimiter(tokens, pos + 1, right, left)?;
        let (close, after) = delimiter(tokens, right + 1, end, &tokens[right])?;
        let body = self.sequence(body_start, right)?;

        Ok((TexNode::LeftRight(Delimited::new(open, TexNode::group(body), close)), after))
    }

    /// Parses `\begin{name} ... \end{name}`.
    fn environment(&mut self, pos: usize, end: usize) -> SyntaxResult<(TexNode, usize)> {
        let tokens = self.tokens;
        let begin = &tokens[pos];
        let Some(name) = braced_text(tokens, pos + 1, end) else {
            bail!(InvalidArgument("expected environment name after `\\begin`".into()), begin.span);
        };

        let Some(close) = find_closing(tokens, pos, end, is_begin, is_end) else {
            bail!(UnclosedEnvironment(name), begin.span);
        };

        let mut body_start = pos + 4;
        let mut spec = None;
        if name == "array"
            && let Some(text) = braced_text(tokens, body_start, close)
        {
            spec = Some(text);
            body_start += 3;
        }

        let Some(end_name) = braced_text(tokens, close + 1, end) else {
            bail!(InvalidArgument("expected environment name after `\\end`".into()), tokens[close].span);
        };
        if end_name != name {
            return Err(SyntaxError::new(
                SyntaxErrorKind::MismatchedEnvironment { begin: name, end: end_name },
                tokens[close].span,
            ));
        }

        self.align_depth += 1;
        let rows = self.grid(body_start, close);
        self.align_depth -= 1;

        Ok((TexNode::Env(Env { name, spec, rows: rows? }), close + 4))
    }

    /// Splits an environment body into rows and cells.
    fn grid(&mut self, start: usize, end: usize) -> SyntaxResult<Grid<TexNode>> {
        let tokens = self.tokens;
        let mut rows = vec![];
        let mut row = vec![];
        let mut cell = vec![];
        let mut pos = start;

        while pos < end {
            let token = &tokens[pos];
            if token.is(TexKind::Control, "&") {
                row.push(finish_cell(std::mem::take(&mut cell)));
                pos += 1;
            } else if token.is(TexKind::Control, "\\\\") {
                row.push(finish_cell(std::mem::take(&mut cell)));
                rows.push(std::mem::take(&mut row));
                pos += 1;
            } else {
                let (node, next) = self.expr(pos, end)?;
                cell.push(node);
                pos = next;
            }
        }

        // A trailing row separator does not open another row.
        let last = finish_cell(cell);
        if !(row.is_empty() && last == TexNode::Empty && !rows.is_empty()) {
            row.push(last);
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Drops whitespace next to `_` and `^`.
fn strip_script_spaces(tokens: &[TexToken]) -> Vec<TexToken> {
    let is_space = |t: &&TexToken| matches!(t.kind, TexKind::Space | TexKind::Newline);
    let is_script = |t: &TexToken| t.is(TexKind::Control, "_") || t.is(TexKind::Control, "^");

    let mut out = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        if is_space(&token) {
            let next = tokens[i + 1..].iter().find(|t| !is_space(t));
            let prev = tokens[..i].iter().rev().find(|t| !is_space(t));
            if next.is_some_and(is_script) || prev.is_some_and(is_script) {
                continue;
            }
        }
        out.push(token.clone());
    }
    out
}

/// Trims surrounding whitespace off a cell.
fn finish_cell(mut nodes: Vec<TexNode>) -> TexNode {
    while nodes.last().is_some_and(TexNode::is_space) {
        nodes.pop();
    }
    let start = nodes.iter().take_while(|n| n.is_space()).count();
    TexNode::group(nodes.split_off(start))
}

/// Counts and skips prime marks.
fn count_primes(tokens: &[TexToken], pos: &mut usize, end: usize) -> usize {
    let start = *pos;
    while *pos < end && tokens[*pos].is(TexKind::Element, "'") {
        *pos += 1;
    }
    *pos - start
}

/// Reads the delimiter after `\left` or `\right`. The null delimiter `.`
/// yields `None`.
fn delimiter(
    tokens: &[TexToken],
    pos: usize,
    end: usize,
    owner: &TexToken,
) -> SyntaxResult<(Option<EcoString>, usize)> {
    let pos = skip_spaces(tokens, pos, end);
    let Some(token) = tokens[..end].get(pos) else {
        bail!(MissingArgument(owner.text.clone()), owner.span);
    };
    if !is_delimiter(token) {
        bail!(InvalidDelimiter(token.text.clone()), token.span);
    }
    let delim = (token.text != ".").then(|| token.text.clone());
    Ok((delim, pos + 1))
}

/// Whether the token may follow `\left` or `\right`.
fn is_delimiter(token: &TexToken) -> bool {
    match token.kind {
        TexKind::Element => matches!(
            token.text.as_str(),
            "(" | ")" | "[" | "]" | "|" | "/" | "." | "<" | ">" | "\\{" | "\\}" | "\\|"
        ),
        TexKind::Command => matches!(
            &token.text[1..],
            "langle"
                | "rangle"
                | "lfloor"
                | "rfloor"
                | "lceil"
                | "rceil"
                | "vert"
                | "Vert"
                | "lvert"
                | "rvert"
                | "lVert"
                | "rVert"
                | "lbrace"
                | "rbrace"
                | "lbrack"
                | "rbrack"
                | "uparrow"
                | "downarrow"
                | "updownarrow"
                | "Uparrow"
                | "Downarrow"
                | "backslash"
        ),
        _ => false,
    }
}

/// Reads `{`, text, `}` as the lexer emits them after `\begin` and friends.
fn braced_text(tokens: &[TexToken], pos: usize, end: usize) -> Option<EcoString> {
    match tokens[..end].get(pos..pos + 3)? {
        [open, text, close]
            if open.is(TexKind::Control, "{")
                && text.kind == TexKind::Text
                && close.is(TexKind::Control, "}") =>
        {
            Some(text.text.trim().into())
        }
        _ => None,
    }
}

/// Finds the closing token that matches the opening token at `start`.
fn find_closing(
    tokens: &[TexToken],
    start: usize,
    end: usize,
    open: fn(&TexToken) -> bool,
    close: fn(&TexToken) -> bool,
) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens[start..end].iter().enumerate() {
        if open(token) {
            depth += 1;
        } else if close(token) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(start + i);
            }
        }
    }
    None
}

fn skip_spaces(tokens: &[TexToken], mut pos: usize, end: usize) -> usize {
    while pos < end && matches!(tokens[pos].kind, TexKind::Space | TexKind::Newline) {
        pos += 1;
    }
    pos
}

fn is_open_brace(token: &TexToken) -> bool {
    token.is(TexKind::Control, "{")
}

fn is_close_brace(token: &TexToken) -> bool {
    token.is(TexKind::Control, "}")
}

fn is_open_bracket(token: &TexToken) -> bool {
    token.is(TexKind::Element, "[")
}

fn is_close_bracket(token: &TexToken) -> bool {
    token.is(TexKind::Element, "]")
}

fn is_left(token: &TexToken) -> bool {
    token.is(TexKind::Command, "\\left")
}

fn is_right(token: &TexToken) -> bool {
    token.is(TexKind::Command, "\\right")
}

fn is_begin(token: &TexToken) -> bool {
    token.is(TexKind::Command, "\\begin")
}

fn is_end(token: &TexToken) -> bool {
    token.is(TexKind::Command, "\\end")
}
