//! Parsing and writing of TeX and Typst math.
//!
//! Both dialects share the same pipeline: a table-driven [scanner] splits
//! text into [`Token`]s, a recursive descent parser builds a syntax tree and
//! a writer serializes a tree back to text. Converting between the trees is
//! up to the `tex2typst` crate.
//!
//! ```
//! use tex2typst_syntax::tex;
//!
//! let node = tex::parse_str(r"\frac{a}{b}").unwrap();
//! assert_eq!(tex::write(&node), r"\frac{a}{b}");
//! ```

pub mod scanner;
pub mod symbols;
pub mod tex;
pub mod typst;

mod error;
mod node;
mod span;
mod token;

pub use self::error::{SyntaxError, SyntaxErrorKind, SyntaxResult, bail};
pub use self::node::{Attach, Delimited, Grid};
pub use self::span::Span;
pub use self::token::Token;
