use ecow::EcoString;

use crate::node::{Attach, Delimited, Grid};

/// A node in a Typst math syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TypstNode {
    /// A letter, number, punctuation mark or escaped character.
    Atom(EcoString),
    /// A named symbol like `alpha` or `arrow.r`.
    Symbol(EcoString),
    /// A string literal, unescaped.
    Text(EcoString),
    /// A line comment, without the slashes.
    Comment(EcoString),
    /// Whitespace: a run of spaces or a single newline.
    Space(EcoString),
    /// The alignment point `&` or the line break `\`.
    Control(EcoString),
    /// The `#none` literal.
    None,
    /// Something without meaning in math, stored as written.
    Unknown(EcoString),
    /// Nothing. Stands in for a missing base.
    Empty,
    /// A sequence of nodes.
    Group(Vec<TypstNode>),
    /// A sequence in parentheses: `(a + b)`.
    Parens(Vec<TypstNode>),
    /// A base with scripts.
    Attach(Attach<TypstNode>),
    /// A function call like `sqrt(x)` or `op("sgn")`.
    Call(Call),
    /// A fraction from the slash operator: `a/b`.
    Frac(Box<TypstNode>, Box<TypstNode>),
    /// Content between sized delimiters: `lr(\{ a)`.
    LeftRight(Delimited<TypstNode>),
    /// A matrix: `mat(delim: "[", a, b; c, d)`.
    Matrix(Cells),
    /// A case distinction: `cases(x &"if" y, z &"else")`.
    Cases(Cells),
    /// Lines separated by `\` with alignment points `&`.
    Align(Grid<TypstNode>),
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// The function name.
    pub name: EcoString,
    /// The positional arguments.
    pub args: Vec<TypstNode>,
    /// The named arguments, in order.
    pub named: Vec<(EcoString, TypstNode)>,
}

impl Call {
    /// A call with positional arguments only.
    pub fn new(name: impl Into<EcoString>, args: Vec<TypstNode>) -> Self {
        Self { name: name.into(), args, named: vec![] }
    }

    /// The value of a named argument.
    pub fn get(&self, key: &str) -> Option<&TypstNode> {
        self.named.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// The grid of a matrix-like call and its named arguments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cells {
    /// The cells, one list per row.
    pub rows: Grid<TypstNode>,
    /// The named arguments, in order.
    pub named: Vec<(EcoString, TypstNode)>,
}

impl Cells {
    /// Cells without named arguments.
    pub fn new(rows: Grid<TypstNode>) -> Self {
        Self { rows, named: vec![] }
    }

    /// The value of a named argument.
    pub fn get(&self, key: &str) -> Option<&TypstNode> {
        self.named.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl TypstNode {
    /// Create a node from a sequence: nothing becomes [`Empty`](Self::Empty)
    /// and a single node stands for itself.
    pub fn group(mut nodes: Vec<TypstNode>) -> Self {
        match nodes.len() {
            0 => Self::Empty,
            1 => nodes.pop().unwrap_or(Self::Empty),
            _ => Self::Group(nodes),
        }
    }

    /// Create a call node.
    pub fn call(name: impl Into<EcoString>, args: Vec<TypstNode>) -> Self {
        Self::Call(Call::new(name, args))
    }

    /// Create a symbol node.
    pub fn symbol(name: impl Into<EcoString>) -> Self {
        Self::Symbol(name.into())
    }

    /// Whether this is whitespace.
    pub fn is_space(&self) -> bool {
        matches!(self, Self::Space(_))
    }

    /// Whether this node renders taller than a line of text.
    pub fn is_tall(&self) -> bool {
        match self {
            Self::Atom(_)
            | Self::Symbol(_)
            | Self::Text(_)
            | Self::Comment(_)
            | Self::Space(_)
            | Self::Control(_)
            | Self::None
            | Self::Unknown(_)
            | Self::Empty => false,
            Self::Frac(..) | Self::Matrix(_) | Self::Cases(_) | Self::Align(_) => true,
            Self::Group(nodes) | Self::Parens(nodes) => nodes.iter().any(Self::is_tall),
            Self::Attach(attach) => attach.children().any(Self::is_tall),
            Self::Call(call) => {
                matches!(call.name.as_str(), "frac" | "binom")
                    || call.args.iter().any(Self::is_tall)
            }
            Self::LeftRight(delimited) => delimited.body.is_tall(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_tall() {
        let a = || TypstNode::Atom("a".into());
        let frac = TypstNode::Frac(Box::new(a()), Box::new(a()));
        assert!(frac.is_tall());
        assert!(TypstNode::Parens(vec![a(), frac]).is_tall());
        assert!(TypstNode::call("binom", vec![a(), a()]).is_tall());
        assert!(!TypstNode::call("sqrt", vec![a()]).is_tall());
        assert!(TypstNode::Matrix(Cells::default()).is_tall());
    }

    #[test]
    fn test_named_lookup() {
        let mut cells = Cells::new(vec![]);
        cells.named.push(("delim".into(), TypstNode::Text("[".into())));
        assert_eq!(cells.get("delim"), Some(&TypstNode::Text("[".into())));
        assert_eq!(cells.get("align"), None);
    }
}
