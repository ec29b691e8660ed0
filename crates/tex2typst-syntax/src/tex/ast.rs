use ecow::EcoString;

use crate::node::{Attach, Delimited, Grid};

/// A node in a TeX math syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TexNode {
    /// A letter, number, punctuation mark or escaped character.
    Element(EcoString),
    /// A known command without arguments, stored without backslash.
    Symbol(EcoString),
    /// A command that is neither a known symbol nor takes arguments, or a
    /// character without meaning in math. Stored as written.
    Unknown(EcoString),
    /// Text from `\text{...}`.
    Text(EcoString),
    /// A comment, without the percent sign.
    Comment(EcoString),
    /// Whitespace: a run of spaces or a single newline.
    Space(EcoString),
    /// Structural punctuation that survived parsing, like `\,` or `~`.
    Control(EcoString),
    /// Nothing. Stands in for a missing base.
    Empty,
    /// A sequence of nodes.
    Group(Vec<TexNode>),
    /// A base with scripts.
    Attach(Attach<TexNode>),
    /// A command with arguments.
    Func(Func),
    /// A `\left ... \right` pair.
    LeftRight(Delimited<TexNode>),
    /// A `\begin{...} ... \end{...}` environment.
    Env(Env),
}

/// A command with arguments, like `\frac{a}{b}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    /// The command name, without backslash.
    pub name: EcoString,
    /// The mandatory arguments.
    pub args: Vec<TexNode>,
    /// The degree of a root: `\sqrt[3]{x}`.
    pub degree: Option<Box<TexNode>>,
}

impl Func {
    /// A command without optional argument.
    pub fn new(name: impl Into<EcoString>, args: Vec<TexNode>) -> Self {
        Self { name: name.into(), args, degree: None }
    }
}

/// An environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Env {
    /// The environment name, like `pmatrix`.
    pub name: EcoString,
    /// The column specification of an `array`.
    pub spec: Option<EcoString>,
    /// The cells, one list per row.
    pub rows: Grid<TexNode>,
}

impl TexNode {
    /// Create a node from a sequence: nothing becomes [`Empty`](Self::Empty)
    /// and a single node stands for itself.
    pub fn group(mut nodes: Vec<TexNode>) -> Self {
        match nodes.len() {
            0 => Self::Empty,
            1 => nodes.pop().unwrap_or(Self::Empty),
            _ => Self::Group(nodes),
        }
    }

    /// Create a command node.
    pub fn func(name: impl Into<EcoString>, args: Vec<TexNode>) -> Self {
        Self::Func(Func::new(name, args))
    }

    /// Whether this is whitespace.
    pub fn is_space(&self) -> bool {
        matches!(self, Self::Space(_))
    }

    /// Whether this is a run of spaces, as opposed to a newline.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Space(s) if !s.contains('\n'))
    }

    /// Whether this node renders taller than a line of text.
    pub fn is_tall(&self) -> bool {
        match self {
            Self::Element(_)
            | Self::Symbol(_)
            | Self::Unknown(_)
            | Self::Text(_)
            | Self::Comment(_)
            | Self::Space(_)
            | Self::Control(_)
            | Self::Empty => false,
            Self::Group(nodes) => nodes.iter().any(Self::is_tall),
            Self::Attach(attach) => attach.children().any(Self::is_tall),
            Self::Func(func) => {
                matches!(
                    func.name.as_str(),
                    "frac" | "dfrac" | "tfrac" | "binom" | "dbinom" | "tbinom"
                ) || func.args.iter().any(Self::is_tall)
            }
            Self::LeftRight(delimited) => delimited.body.is_tall(),
            Self::Env(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_collapses() {
        assert_eq!(TexNode::group(vec![]), TexNode::Empty);
        assert_eq!(
            TexNode::group(vec![TexNode::Element("a".into())]),
            TexNode::Element("a".into())
        );
    }

    #[test]
    fn test_is_tall() {
        let a = || TexNode::Element("a".into());
        let frac = TexNode::func("frac", vec![a(), a()]);
        assert!(!a().is_tall());
        assert!(frac.is_tall());
        assert!(TexNode::Group(vec![a(), frac.clone()]).is_tall());
        assert!(TexNode::Attach(Attach::new(frac, None, Some(a()))).is_tall());
        assert!(!TexNode::func("sqrt", vec![a()]).is_tall());
    }
}
