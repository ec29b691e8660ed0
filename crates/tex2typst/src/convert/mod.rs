//! Rewriting syntax trees from one dialect into the other.
//!
//! Both directions are a single exhaustive match over the source tree. Head
//! names with a dedicated rewrite are matched before the generic table
//! lookup, so exactly one rule applies to every node.

mod tex;
mod typst;

pub use self::tex::tex_to_typst;
pub use self::typst::typst_to_tex;
