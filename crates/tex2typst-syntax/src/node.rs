//! Node shapes shared by both dialects' syntax trees.

use ecow::EcoString;

/// A base with a subscript, a superscript or both.
#[derive(Debug, Clone, PartialEq)]
pub struct Attach<N> {
    /// The attached-to node.
    pub base: Box<N>,
    /// The subscript.
    pub sub: Option<Box<N>>,
    /// The superscript. Primes live here.
    pub sup: Option<Box<N>>,
}

impl<N> Attach<N> {
    /// Attach scripts to a base. At least one script must be present.
    pub fn new(base: N, sub: Option<N>, sup: Option<N>) -> Self {
        debug_assert!(sub.is_some() || sup.is_some());
        Self {
            base: Box::new(base),
            sub: sub.map(Box::new),
            sup: sup.map(Box::new),
        }
    }

    /// The base and scripts, in that order.
    pub fn children(&self) -> impl Iterator<Item = &N> {
        std::iter::once(&*self.base)
            .chain(self.sub.as_deref())
            .chain(self.sup.as_deref())
    }
}

/// A body between a pair of sized delimiters.
///
/// A missing delimiter is the null delimiter, written `.` in TeX.
#[derive(Debug, Clone, PartialEq)]
pub struct Delimited<N> {
    /// The opening delimiter, as written in the node's dialect.
    pub left: Option<EcoString>,
    /// The enclosed content.
    pub body: Box<N>,
    /// The closing delimiter, as written in the node's dialect.
    pub right: Option<EcoString>,
}

impl<N> Delimited<N> {
    /// Wrap a body in delimiters.
    pub fn new(left: Option<EcoString>, body: N, right: Option<EcoString>) -> Self {
        Self { left, body: Box::new(body), right }
    }
}

/// Rows of cells.
pub type Grid<N> = Vec<Vec<N>>;
