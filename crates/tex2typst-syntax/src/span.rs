use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

/// A byte range in a formula's source text.
///
/// Every token carries the span it was lexed from and errors point back at
/// the token that caused them. Tokens that were produced by macro expansion
/// inherit the span of the macro invocation they replace.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// Create a span from start and end byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start: saturate(start), end: saturate(end) }
    }

    /// A span that does not point into the source.
    pub const fn detached() -> Self {
        Self { start: u32::MAX, end: u32::MAX }
    }

    /// Whether the span is detached.
    pub const fn is_detached(self) -> bool {
        self.start == u32::MAX
    }

    /// The byte range of the span, if it is not detached.
    pub fn range(self) -> Option<Range<usize>> {
        (!self.is_detached()).then(|| self.start as usize..self.end as usize)
    }

    /// The smallest span covering both `self` and `other`.
    ///
    /// A detached span yields to the other one.
    pub fn join(self, other: Self) -> Self {
        if self.is_detached() {
            return other;
        }
        if other.is_detached() {
            return self;
        }
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Return `other` if `self` is detached and `self` otherwise.
    pub fn or(self, other: Self) -> Self {
        if self.is_detached() { other } else { self }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.range() {
            Some(range) => write!(f, "Span({range:?})"),
            None => f.pad("Span(detached)"),
        }
    }
}

fn saturate(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX - 1)
}
