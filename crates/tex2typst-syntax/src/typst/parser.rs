use ecow::EcoString;

use crate::Span;
use crate::error::{SyntaxResult, bail};
use crate::node::{Attach, Delimited, Grid};
use crate::typst::{Call, Cells, TypstKind, TypstNode, TypstToken};

/// Parses Typst tokens into a syntax tree.
///
/// A formula with line breaks or alignment points at the top level becomes
/// an [`Align`](TypstNode::Align) grid.
#[tracing::instrument(skip_all)]
pub fn parse(tokens: &[TypstToken]) -> SyntaxResult<TypstNode> {
    let p = Parser { tokens };
    let end = tokens.len();

    let aligned = split(tokens, 0, end, |t| {
        t.is(TypstKind::Control, "\\") || t.is(TypstKind::Control, "&")
    });
    if aligned.len() == 1 {
        return Ok(TypstNode::group(p.sequence(0, end)?));
    }

    let rows = p.grid(0, end, |t| t.is(TypstKind::Control, "\\"), |t| {
        t.is(TypstKind::Control, "&")
    })?;
    Ok(TypstNode::Align(rows))
}

struct Parser<'a> {
    tokens: &'a [TypstToken],
}

/// A parsed node or a pending division.
enum Item {
    Node(TypstNode),
    Slash(Span),
}

impl Parser<'_> {
    /// Parses nodes until `end` and resolves divisions.
    fn sequence(&self, start: usize, end: usize) -> SyntaxResult<Vec<TypstNode>> {
        let mut items = vec![];
        let mut pos = start;
        while pos < end {
            let token = &self.tokens[pos];
            if token.is(TypstKind::Element, "/") {
                items.push(Item::Slash(token.span));
                pos += 1;
                continue;
            }
            let (node, next) = self.expr(pos, end)?;
            items.push(Item::Node(node));
            pos = next;
        }
        process_operators(items)
    }

    /// Parses an expression with its primes and scripts.
    fn expr(&self, pos: usize, end: usize) -> SyntaxResult<(TypstNode, usize)> {
        let tokens = self.tokens;
        let (base, mut pos) = self.atom(pos, end)?;
        let mut primes = count_primes(tokens, &mut pos, end);
        let mut sub = None;
        let mut sup = None;

        while pos < end {
            let token = &tokens[pos];
            if token.is(TypstKind::Control, "_") {
                if sub.is_some() {
                    bail!(DoubleSubscript, token.span; hint: "use parentheses to group the subscripts");
                }
                let (script, next) = self.script(pos + 1, end, token)?;
                sub = Some(script);
                pos = next;
                primes += count_primes(tokens, &mut pos, end);
            } else if token.is(TypstKind::Control, "^") {
                if sup.is_some() {
                    bail!(DoubleSuperscript, token.span; hint: "use parentheses to group the superscripts");
                }
                let (script, next) = self.script(pos + 1, end, token)?;
                sup = Some(script);
                pos = next;
            } else {
                break;
            }
        }

        if primes > 0 {
            let mut marks = vec![TypstNode::Atom("'".into()); primes];
            marks.extend(sup);
            sup = Some(TypstNode::Group(marks));
        }

        if sub.is_none() && sup.is_none() {
            return Ok((base, pos));
        }

        Ok((TypstNode::Attach(Attach::new(base, sub, sup)), pos))
    }

    /// Parses the operand of `_` or `^`. Parentheses only group.
    fn script(
        &self,
        pos: usize,
        end: usize,
        owner: &TypstToken,
    ) -> SyntaxResult<(TypstNode, usize)> {
        let tokens = self.tokens;
        let pos = skip_spaces(tokens, pos, end);
        let Some(token) = tokens[..end].get(pos) else {
            bail!(MissingArgument(owner.text.clone()), owner.span);
        };
        if token.kind == TypstKind::Control || token.is(TypstKind::Element, ")") {
            bail!(MissingArgument(owner.text.clone()), owner.span);
        }
        match self.atom(pos, end)? {
            (TypstNode::Parens(nodes), next) => Ok((TypstNode::group(nodes), next)),
            other => Ok(other),
        }
    }

    /// Parses an expression without scripts.
    fn atom(&self, pos: usize, end: usize) -> SyntaxResult<(TypstNode, usize)> {
        let tokens = self.tokens;
        let token = &tokens[pos];
        let node = match token.kind {
            TypstKind::Element => match token.text.as_str() {
                "(" => {
                    let close = self.closing_paren(pos, end)?;
                    return Ok((TypstNode::Parens(self.sequence(pos + 1, close)?), close + 1));
                }
                ")" => bail!(UnexpectedClose(")".into()), token.span),
                _ => TypstNode::Atom(token.text.clone()),
            },
            TypstKind::Symbol => {
                if tokens[..end].get(pos + 1).is_some_and(|t| t.is(TypstKind::Element, "(")) {
                    return self.call(pos, end);
                }
                TypstNode::Symbol(token.text.clone())
            }
            TypstKind::Text => TypstNode::Text(token.text.clone()),
            TypstKind::Comment => TypstNode::Comment(token.text.clone()),
            TypstKind::Space | TypstKind::Newline => TypstNode::Space(token.text.clone()),
            TypstKind::Control => match token.text.as_str() {
                // A script without base.
                "_" | "^" => return Ok((TypstNode::Empty, pos)),
                _ => TypstNode::Control(token.text.clone()),
            },
            TypstKind::None => TypstNode::None,
            TypstKind::Unknown => TypstNode::Unknown(token.text.clone()),
        };
        Ok((node, pos + 1))
    }

    /// Parses a function call. The name is at `pos`, the opening parenthesis
    /// right after it.
    fn call(&self, pos: usize, end: usize) -> SyntaxResult<(TypstNode, usize)> {
        let tokens = self.tokens;
        let name = tokens[pos].text.clone();
        let open = pos + 1;
        let close = self.closing_paren(open, end)?;
        let (start, stop) = (open + 1, close);

        let is_comma = |t: &TypstToken| t.is(TypstKind::Element, ",");
        let is_semicolon = |t: &TypstToken| t.is(TypstKind::Element, ";");
        let is_amp = |t: &TypstToken| t.is(TypstKind::Control, "&");

        let node = match name.as_str() {
            "mat" => TypstNode::Matrix(self.cells(start, stop, is_semicolon, is_comma)?),
            "cases" => TypstNode::Cases(self.cells(start, stop, is_comma, is_amp)?),
            "lr" => self.left_right(start, stop)?,
            _ => {
                let mut call = Call::new(name, vec![]);
                let mut args = split(tokens, start, stop, is_comma);
                if args.last().is_some_and(|&(s, e)| is_blank(tokens, s, e)) {
                    args.pop();
                }
                for (s, e) in args {
                    match named_arg(tokens, s, e) {
                        Some((key, value)) => call.named.push((key, self.cell(value, e)?)),
                        None => call.args.push(self.cell(s, e)?),
                    }
                }
                TypstNode::Call(call)
            }
        };

        Ok((node, close + 1))
    }

    /// Parses the body of `lr(...)`. Delimiters at either end of the body
    /// become the delimiters of the pair.
    fn left_right(&self, start: usize, end: usize) -> SyntaxResult<TypstNode> {
        let tokens = self.tokens;
        let start = skip_spaces(tokens, start, end);
        let end = end - tokens[start..end].iter().rev().take_while(|t| is_space(t)).count();

        if start < end
            && tokens[start].is(TypstKind::Element, "(")
            && matching_paren(tokens, start, end) == Some(end - 1)
        {
            let body = self.cell(start + 1, end - 1)?;
            return Ok(TypstNode::LeftRight(Delimited::new(
                Some("(".into()),
                body,
                Some(")".into()),
            )));
        }

        let mut body_start = start;
        let mut body_end = end;
        let mut left = None;
        let mut right = None;
        // A parenthesis that is balanced inside the body groups, it does
        // not delimit.
        if body_start < body_end {
            let first = &tokens[body_start];
            if is_delimiter(first)
                && !(first.is(TypstKind::Element, "(")
                    && matching_paren(tokens, body_start, body_end).is_some())
            {
                left = Some(first.text.clone());
                body_start += 1;
            }
        }
        if body_start < body_end {
            let last = &tokens[body_end - 1];
            if is_delimiter(last)
                && !(last.is(TypstKind::Element, ")")
                    && paren_depth(tokens, body_start, body_end - 1) > 0)
            {
                right = Some(last.text.clone());
                body_end -= 1;
            }
        }

        let body = self.cell(body_start, body_end)?;
        if left.is_none() && right.is_none() {
            return Ok(TypstNode::call("lr", vec![body]));
        }
        Ok(TypstNode::LeftRight(Delimited::new(left, body, right)))
    }

    /// Parses the grid of a matrix-like call together with its named
    /// arguments.
    fn cells(
        &self,
        start: usize,
        end: usize,
        row_sep: fn(&TypstToken) -> bool,
        cell_sep: fn(&TypstToken) -> bool,
    ) -> SyntaxResult<Cells> {
        let tokens = self.tokens;
        let mut cells = Cells::default();
        let mut rows = split(tokens, start, end, row_sep);
        if rows.last().is_some_and(|&(s, e)| is_blank(tokens, s, e)) {
            rows.pop();
        }

        for (s, e) in rows {
            let mut row = vec![];
            for (cs, ce) in split(tokens, s, e, cell_sep) {
                match named_arg(tokens, cs, ce) {
                    Some((key, value)) => cells.named.push((key, self.cell(value, ce)?)),
                    None => row.push(self.cell(cs, ce)?),
                }
            }
            // A trailing separator does not open another cell.
            if row.len() > 1 && row.last() == Some(&TypstNode::Empty) {
                row.pop();
            }
            if !row.is_empty() {
                cells.rows.push(row);
            }
        }

        Ok(cells)
    }

    /// Parses an alignment grid.
    fn grid(
        &self,
        start: usize,
        end: usize,
        row_sep: fn(&TypstToken) -> bool,
        cell_sep: fn(&TypstToken) -> bool,
    ) -> SyntaxResult<Grid<TypstNode>> {
        let tokens = self.tokens;
        let mut rows = split(tokens, start, end, row_sep);
        if rows.len() > 1 && rows.last().is_some_and(|&(s, e)| is_blank(tokens, s, e)) {
            rows.pop();
        }
        rows.into_iter()
            .map(|(s, e)| {
                split(tokens, s, e, cell_sep)
                    .into_iter()
                    .map(|(cs, ce)| self.cell(cs, ce))
                    .collect()
            })
            .collect()
    }

    /// Parses a cell or argument, ignoring surrounding whitespace.
    fn cell(&self, start: usize, end: usize) -> SyntaxResult<TypstNode> {
        let mut nodes = self.sequence(start, end)?;
        while nodes.last().is_some_and(TypstNode::is_space) {
            nodes.pop();
        }
        let leading = nodes.iter().take_while(|n| n.is_space()).count();
        Ok(TypstNode::group(nodes.split_off(leading)))
    }

    /// Finds the parenthesis that closes the one at `open`.
    fn closing_paren(&self, open: usize, end: usize) -> SyntaxResult<usize> {
        match matching_paren(self.tokens, open, end) {
            Some(close) => Ok(close),
            None => bail!(UnclosedDelimiter("(".into()), self.tokens[open].span),
        }
    }
}

/// The parenthesis that closes the one at `open`, if it closes before `end`.
fn matching_paren(tokens: &[TypstToken], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens[open..end].iter().enumerate() {
        if token.is(TypstKind::Element, "(") {
            depth += 1;
        } else if token.is(TypstKind::Element, ")") {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(open + i);
            }
        }
    }
    None
}

/// How many parentheses in the range are left open at its end.
fn paren_depth(tokens: &[TypstToken], start: usize, end: usize) -> usize {
    tokens[start..end].iter().fold(0, |depth: usize, token| {
        if token.is(TypstKind::Element, "(") {
            depth + 1
        } else if token.is(TypstKind::Element, ")") {
            depth.saturating_sub(1)
        } else {
            depth
        }
    })
}

/// Folds every `/` and the operands around it into a fraction.
///
/// Divisions are left-associative and bind the nearest expression on either
/// side. Parentheses around an operand only group and are removed.
fn process_operators(items: Vec<Item>) -> SyntaxResult<Vec<TypstNode>> {
    let mut out: Vec<TypstNode> = vec![];
    let mut pending: Option<Span> = None;

    for item in items {
        match item {
            Item::Slash(span) => {
                if pending.is_some() {
                    bail!(MissingOperand("/".into()), span);
                }
                while out.last().is_some_and(TypstNode::is_space) {
                    out.pop();
                }
                if out.is_empty() {
                    bail!(MissingOperand("/".into()), span; hint: "add a numerator before the slash");
                }
                pending = Some(span);
            }
            Item::Node(node) if node.is_space() && pending.is_some() => {}
            Item::Node(node) => match pending.take() {
                Some(span) => {
                    let Some(num) = out.pop() else {
                        bail!(MissingOperand("/".into()), span);
                    };
                    out.push(TypstNode::Frac(Box::new(unparen(num)), Box::new(unparen(node))));
                }
                None => out.push(node),
            },
        }
    }

    if let Some(span) = pending {
        bail!(MissingOperand("/".into()), span; hint: "add a denominator after the slash");
    }

    Ok(out)
}

/// Removes the parentheses of a fraction operand.
fn unparen(node: TypstNode) -> TypstNode {
    match node {
        TypstNode::Parens(nodes) => TypstNode::group(nodes),
        node => node,
    }
}

/// Splits a range at separators outside of parentheses.
fn split(
    tokens: &[TypstToken],
    start: usize,
    end: usize,
    is_sep: impl Fn(&TypstToken) -> bool,
) -> Vec<(usize, usize)> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut from = start;
    for (i, token) in tokens[start..end].iter().enumerate() {
        let pos = start + i;
        if token.is(TypstKind::Element, "(") {
            depth += 1;
        } else if token.is(TypstKind::Element, ")") {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && is_sep(token) {
            parts.push((from, pos));
            from = pos + 1;
        }
    }
    parts.push((from, end));
    parts
}

/// Recognizes `key: value` and returns the key and where the value starts.
fn named_arg(tokens: &[TypstToken], start: usize, end: usize) -> Option<(EcoString, usize)> {
    let start = skip_spaces(tokens, start, end);
    let key = tokens[..end].get(start)?;
    let is_ident = match key.kind {
        TypstKind::Symbol => !key.text.starts_with('#'),
        TypstKind::Element => key.text.chars().all(|c| c.is_ascii_alphabetic()),
        _ => false,
    };
    let colon = tokens[..end].get(start + 1)?;
    (is_ident && colon.is(TypstKind::Element, ":")).then(|| (key.text.clone(), start + 2))
}

/// Whether the token may follow `lr(` or end its body.
fn is_delimiter(token: &TypstToken) -> bool {
    match token.kind {
        TypstKind::Element => matches!(
            token.text.as_str(),
            "(" | ")" | "[" | "]" | "{" | "}" | "|" | "\\(" | "\\)" | "\\[" | "\\]" | "\\{"
                | "\\}"
                | "\\|"
        ),
        TypstKind::Symbol => matches!(
            token.text.as_str(),
            "chevron.l"
                | "chevron.r"
                | "angle.l"
                | "angle.r"
                | "floor.l"
                | "floor.r"
                | "ceil.l"
                | "ceil.r"
                | "bar.v"
                | "bar.v.double"
                | "brace.l"
                | "brace.r"
                | "bracket.l"
                | "bracket.r"
                | "paren.l"
                | "paren.r"
                | "arrow.t"
                | "arrow.b"
                | "arrow.t.b"
                | "arrow.t.double"
                | "arrow.b.double"
                | "slash"
                | "backslash"
        ),
        _ => false,
    }
}

fn count_primes(tokens: &[TypstToken], pos: &mut usize, end: usize) -> usize {
    let start = *pos;
    while *pos < end && tokens[*pos].is(TypstKind::Element, "'") {
        *pos += 1;
    }
    *pos - start
}

fn is_space(token: &TypstToken) -> bool {
    matches!(token.kind, TypstKind::Space | TypstKind::Newline)
}

fn is_blank(tokens: &[TypstToken], start: usize, end: usize) -> bool {
    tokens[start..end].iter().all(is_space)
}

fn skip_spaces(tokens: &[TypstToken], mut pos: usize, end: usize) -> usize {
    while pos < end && is_space(&tokens[pos]) {
        pos += 1;
    }
    pos
}
