//! Static lookup tables shared by the lexers, parsers and converters.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;

/// Maps a TeX command name (without backslash) to its Typst equivalent.
pub fn tex_to_typst(name: &str) -> Option<&'static str> {
    FORWARD.get(name).copied()
}

/// Maps a Typst symbol or function name to its preferred TeX command name
/// (without backslash).
pub fn typst_to_tex(name: &str) -> Option<&'static str> {
    BACKWARD.get(name).copied()
}

/// The shorthand for a Typst symbol, like `->` for `arrow.r`.
pub fn shorthand(name: &str) -> Option<&'static str> {
    SHORTHANDS.iter().find(|&&(n, _)| n == name).map(|&(_, s)| s)
}

/// All symbol pairs in table order: TeX name first, Typst name second.
pub fn symbols() -> &'static [(&'static str, &'static str)] {
    SYMBOLS
}

/// All shorthand pairs: Typst name first, shorthand second.
pub fn shorthands() -> &'static [(&'static str, &'static str)] {
    SHORTHANDS
}

/// How many mandatory arguments a TeX command takes, if it takes any.
///
/// Commands that are not listed here take no arguments.
pub fn tex_arity(name: &str) -> Option<u8> {
    TEX_ARITY.get(name).copied()
}

/// Whether the name is one of Typst's built-in math operators like `sin` or
/// `sech`.
pub fn is_typst_operator(name: &str) -> bool {
    TYPST_OPERATORS.contains(name)
}

static FORWARD: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| SYMBOLS.iter().copied().collect());

// The first TeX name listed for a Typst name is preferred on the way back.
static BACKWARD: LazyLock<FxHashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = FxHashMap::default();
    for &(tex, typst) in SYMBOLS.iter().chain(ALIASES) {
        map.entry(typst).or_insert(tex);
    }
    map
});

static TEX_ARITY: phf::Map<&'static str, u8> = phf::phf_map! {
    "sqrt" => 1,
    "text" => 1,
    "operatorname" => 1,
    "hspace" => 1,
    "mathbb" => 1,
    "mathbf" => 1,
    "mathcal" => 1,
    "mathfrak" => 1,
    "mathit" => 1,
    "mathrm" => 1,
    "mathscr" => 1,
    "mathsf" => 1,
    "mathtt" => 1,
    "boldsymbol" => 1,
    "bm" => 1,
    "hat" => 1,
    "widehat" => 1,
    "tilde" => 1,
    "widetilde" => 1,
    "bar" => 1,
    "overline" => 1,
    "underline" => 1,
    "vec" => 1,
    "overrightarrow" => 1,
    "overleftarrow" => 1,
    "dot" => 1,
    "ddot" => 1,
    "dddot" => 1,
    "acute" => 1,
    "grave" => 1,
    "breve" => 1,
    "check" => 1,
    "mathring" => 1,
    "overbrace" => 1,
    "underbrace" => 1,
    "cancel" => 1,
    "frac" => 2,
    "dfrac" => 2,
    "tfrac" => 2,
    "binom" => 2,
    "dbinom" => 2,
    "tbinom" => 2,
    "overset" => 2,
    "underset" => 2,
    "stackrel" => 2,
};

static TYPST_OPERATORS: phf::Set<&'static str> = phf::phf_set! {
    "arccos", "arcsin", "arctan", "arg", "cos", "cosh", "cot", "coth", "csc",
    "csch", "ctg", "deg", "det", "dim", "exp", "gcd", "lcm", "hom", "id", "im",
    "inf", "ker", "lg", "lim", "liminf", "limsup", "ln", "log", "max", "min",
    "mod", "Pr", "sec", "sech", "sin", "sinc", "sinh", "sup", "tan", "tanh",
    "tg",
};

static SHORTHANDS: &[(&str, &str)] = &[
    ("arrow.r", "->"),
    ("arrow.r.long", "-->"),
    ("arrow.r.bar", "|->"),
    ("arrow.r.double", "=>"),
    ("arrow.r.double.long", "==>"),
    ("arrow.r.double.bar", "|=>"),
    ("arrow.r.squiggly", "~>"),
    ("arrow.r.tail", ">->"),
    ("arrow.r.twohead", "->>"),
    ("arrow.l", "<-"),
    ("arrow.l.long", "<--"),
    ("arrow.l.double.long", "<=="),
    ("arrow.l.squiggly", "<~"),
    ("arrow.l.tail", "<-<"),
    ("arrow.l.twohead", "<<-"),
    ("arrow.l.r", "<->"),
    ("arrow.l.r.long", "<-->"),
    ("arrow.l.r.double", "<=>"),
    ("arrow.l.r.double.long", "<==>"),
    ("eq.not", "!="),
    ("lt.eq", "<="),
    ("gt.eq", ">="),
    ("lt.double", "<<"),
    ("gt.double", ">>"),
    ("lt.triple", "<<<"),
    ("gt.triple", ">>>"),
    ("colon.eq", ":="),
    ("eq.colon", "=:"),
    ("dots.h", "..."),
];

/// Typst names that only appear on the way back, mapped to TeX.
static ALIASES: &[(&str, &str)] = &[
    ("infty", "oo"),
    ("partial", "diff"),
    ("langle", "angle.l"),
    ("rangle", "angle.r"),
    ("cap", "sect"),
    ("bigcap", "sect.big"),
    ("star", "star.stroked"),
];

static SYMBOLS: &[(&str, &str)] = &[
    // Lowercase Greek.
    ("alpha", "alpha"),
    ("beta", "beta"),
    ("gamma", "gamma"),
    ("delta", "delta"),
    ("varepsilon", "epsilon"),
    ("epsilon", "epsilon.alt"),
    ("zeta", "zeta"),
    ("eta", "eta"),
    ("theta", "theta"),
    ("vartheta", "theta.alt"),
    ("iota", "iota"),
    ("kappa", "kappa"),
    ("varkappa", "kappa.alt"),
    ("lambda", "lambda"),
    ("mu", "mu"),
    ("nu", "nu"),
    ("xi", "xi"),
    ("omicron", "omicron"),
    ("pi", "pi"),
    ("varpi", "pi.alt"),
    ("rho", "rho"),
    ("varrho", "rho.alt"),
    ("sigma", "sigma"),
    ("varsigma", "sigma.alt"),
    ("tau", "tau"),
    ("upsilon", "upsilon"),
    ("varphi", "phi"),
    ("phi", "phi.alt"),
    ("chi", "chi"),
    ("psi", "psi"),
    ("omega", "omega"),
    // Uppercase Greek.
    ("Gamma", "Gamma"),
    ("Delta", "Delta"),
    ("Theta", "Theta"),
    ("Lambda", "Lambda"),
    ("Xi", "Xi"),
    ("Pi", "Pi"),
    ("Sigma", "Sigma"),
    ("Upsilon", "Upsilon"),
    ("Phi", "Phi"),
    ("Psi", "Psi"),
    ("Omega", "Omega"),
    // Hebrew.
    ("aleph", "aleph"),
    ("beth", "beth"),
    ("gimel", "gimel"),
    ("daleth", "daleth"),
    // Binary operators.
    ("pm", "plus.minus"),
    ("mp", "minus.plus"),
    ("times", "times"),
    ("div", "div"),
    ("cdot", "dot.op"),
    ("ast", "ast.op"),
    ("star", "star.op"),
    ("circ", "compose"),
    ("bullet", "bullet"),
    ("oplus", "plus.circle"),
    ("ominus", "minus.circle"),
    ("otimes", "times.circle"),
    ("odot", "dot.circle"),
    ("cup", "union"),
    ("cap", "inter"),
    ("sqcup", "union.sq"),
    ("sqcap", "inter.sq"),
    ("uplus", "union.plus"),
    ("setminus", "without"),
    ("wedge", "and"),
    ("land", "and"),
    ("vee", "or"),
    ("lor", "or"),
    ("coprod", "product.co"),
    ("amalg", "product.co"),
    ("dagger", "dagger"),
    ("dag", "dagger"),
    ("ddagger", "dagger.double"),
    ("ddag", "dagger.double"),
    ("wr", "wreath"),
    // Relations.
    ("leq", "lt.eq"),
    ("le", "lt.eq"),
    ("geq", "gt.eq"),
    ("ge", "gt.eq"),
    ("neq", "eq.not"),
    ("ne", "eq.not"),
    ("lt", "lt"),
    ("gt", "gt"),
    ("equiv", "equiv"),
    ("approx", "approx"),
    ("sim", "tilde.op"),
    ("simeq", "tilde.eq"),
    ("cong", "tilde.equiv"),
    ("propto", "prop"),
    ("ll", "lt.double"),
    ("gg", "gt.double"),
    ("lll", "lt.triple"),
    ("ggg", "gt.triple"),
    ("prec", "prec"),
    ("succ", "succ"),
    ("preceq", "prec.eq"),
    ("succeq", "succ.eq"),
    ("leqslant", "lt.eq.slant"),
    ("geqslant", "gt.eq.slant"),
    ("lesssim", "lt.tilde"),
    ("gtrsim", "gt.tilde"),
    ("in", "in"),
    ("notin", "in.not"),
    ("ni", "in.rev"),
    ("subset", "subset"),
    ("supset", "supset"),
    ("subseteq", "subset.eq"),
    ("supseteq", "supset.eq"),
    ("subsetneq", "subset.neq"),
    ("supsetneq", "supset.neq"),
    ("nsubseteq", "subset.eq.not"),
    ("nsupseteq", "supset.eq.not"),
    ("perp", "perp"),
    ("parallel", "parallel"),
    ("mid", "divides"),
    ("nmid", "divides.not"),
    ("models", "models"),
    ("vdash", "tack.r"),
    ("dashv", "tack.l"),
    ("vDash", "tack.r.double"),
    ("asymp", "asymp"),
    ("doteq", "eq.dot"),
    ("triangleq", "eq.delta"),
    ("coloneqq", "colon.eq"),
    ("eqqcolon", "eq.colon"),
    ("bowtie", "join"),
    // Arrows.
    ("rightarrow", "arrow.r"),
    ("to", "arrow.r"),
    ("leftarrow", "arrow.l"),
    ("gets", "arrow.l"),
    ("leftrightarrow", "arrow.l.r"),
    ("Rightarrow", "arrow.r.double"),
    ("Leftarrow", "arrow.l.double"),
    ("Leftrightarrow", "arrow.l.r.double"),
    ("longrightarrow", "arrow.r.long"),
    ("longleftarrow", "arrow.l.long"),
    ("longleftrightarrow", "arrow.l.r.long"),
    ("Longrightarrow", "arrow.r.double.long"),
    ("implies", "arrow.r.double.long"),
    ("Longleftarrow", "arrow.l.double.long"),
    ("impliedby", "arrow.l.double.long"),
    ("Longleftrightarrow", "arrow.l.r.double.long"),
    ("iff", "arrow.l.r.double.long"),
    ("uparrow", "arrow.t"),
    ("downarrow", "arrow.b"),
    ("updownarrow", "arrow.t.b"),
    ("Uparrow", "arrow.t.double"),
    ("Downarrow", "arrow.b.double"),
    ("Updownarrow", "arrow.t.b.double"),
    ("nearrow", "arrow.tr"),
    ("searrow", "arrow.br"),
    ("nwarrow", "arrow.tl"),
    ("swarrow", "arrow.bl"),
    ("mapsto", "arrow.r.bar"),
    ("longmapsto", "arrow.r.long.bar"),
    ("Mapsto", "arrow.r.double.bar"),
    ("hookrightarrow", "arrow.r.hook"),
    ("hookleftarrow", "arrow.l.hook"),
    ("twoheadrightarrow", "arrow.r.twohead"),
    ("twoheadleftarrow", "arrow.l.twohead"),
    ("rightarrowtail", "arrow.r.tail"),
    ("leftarrowtail", "arrow.l.tail"),
    ("rightsquigarrow", "arrow.r.squiggly"),
    ("leftsquigarrow", "arrow.l.squiggly"),
    ("rightharpoonup", "harpoon.rt"),
    ("rightharpoondown", "harpoon.rb"),
    ("leftharpoonup", "harpoon.lt"),
    ("leftharpoondown", "harpoon.lb"),
    ("rightleftharpoons", "harpoons.rtlb"),
    ("leftrightharpoons", "harpoons.ltrb"),
    // Large operators.
    ("sum", "sum"),
    ("prod", "product"),
    ("int", "integral"),
    ("iint", "integral.double"),
    ("iiint", "integral.triple"),
    ("oint", "integral.cont"),
    ("bigcup", "union.big"),
    ("bigcap", "inter.big"),
    ("bigsqcup", "union.sq.big"),
    ("biguplus", "union.plus.big"),
    ("bigoplus", "plus.circle.big"),
    ("bigotimes", "times.circle.big"),
    ("bigodot", "dot.circle.big"),
    ("bigwedge", "and.big"),
    ("bigvee", "or.big"),
    // Operators that Typst knows by the same name.
    ("arccos", "arccos"),
    ("arcsin", "arcsin"),
    ("arctan", "arctan"),
    ("arg", "arg"),
    ("cos", "cos"),
    ("cosh", "cosh"),
    ("cot", "cot"),
    ("coth", "coth"),
    ("csc", "csc"),
    ("deg", "deg"),
    ("det", "det"),
    ("dim", "dim"),
    ("exp", "exp"),
    ("gcd", "gcd"),
    ("hom", "hom"),
    ("inf", "inf"),
    ("ker", "ker"),
    ("lg", "lg"),
    ("lim", "lim"),
    ("liminf", "liminf"),
    ("limsup", "limsup"),
    ("ln", "ln"),
    ("log", "log"),
    ("max", "max"),
    ("min", "min"),
    ("Pr", "Pr"),
    ("sec", "sec"),
    ("sin", "sin"),
    ("sinh", "sinh"),
    ("sup", "sup"),
    ("tan", "tan"),
    ("tanh", "tanh"),
    ("bmod", "mod"),
    ("mod", "mod"),
    // Miscellaneous.
    ("infty", "infinity"),
    ("partial", "partial"),
    ("nabla", "nabla"),
    ("forall", "forall"),
    ("exists", "exists"),
    ("nexists", "exists.not"),
    ("emptyset", "emptyset"),
    ("varnothing", "nothing"),
    ("neg", "not"),
    ("lnot", "not"),
    ("top", "top"),
    ("bot", "bot"),
    ("angle", "angle"),
    ("measuredangle", "angle.arc"),
    ("triangle", "triangle.stroked.t"),
    ("square", "square.stroked"),
    ("Box", "square.stroked"),
    ("blacksquare", "square.filled"),
    ("ell", "ell"),
    ("hbar", "planck.reduce"),
    ("imath", "dotless.i"),
    ("jmath", "dotless.j"),
    ("Re", "Re"),
    ("Im", "Im"),
    ("prime", "prime"),
    ("backprime", "prime.rev"),
    ("therefore", "therefore"),
    ("because", "because"),
    ("checkmark", "checkmark"),
    ("flat", "flat"),
    ("sharp", "sharp"),
    ("natural", "natural"),
    ("S", "section"),
    ("P", "pilcrow"),
    ("copyright", "copyright"),
    ("degree", "degree"),
    ("colon", "colon"),
    ("backslash", "backslash"),
    // Dots.
    ("ldots", "dots.h"),
    ("dots", "dots.h"),
    ("dotsc", "dots.h"),
    ("cdots", "dots.h.c"),
    ("dotsb", "dots.h.c"),
    ("vdots", "dots.v"),
    ("ddots", "dots.down"),
    // Delimiters.
    ("langle", "chevron.l"),
    ("rangle", "chevron.r"),
    ("lfloor", "floor.l"),
    ("rfloor", "floor.r"),
    ("lceil", "ceil.l"),
    ("rceil", "ceil.r"),
    ("lbrace", "brace.l"),
    ("rbrace", "brace.r"),
    ("lbrack", "bracket.l"),
    ("rbrack", "bracket.r"),
    ("vert", "bar.v"),
    ("lvert", "bar.v"),
    ("rvert", "bar.v"),
    ("Vert", "bar.v.double"),
    ("lVert", "bar.v.double"),
    ("rVert", "bar.v.double"),
    // Spacing.
    ("quad", "quad"),
    ("qquad", "wide"),
    ("enspace", "space.en"),
    ("thinspace", "thin"),
    ("medspace", "med"),
    ("thickspace", "thick"),
    // Styles, accents and other functions.
    ("mathbb", "bb"),
    ("mathcal", "cal"),
    ("mathfrak", "frak"),
    ("mathit", "italic"),
    ("mathrm", "upright"),
    ("mathsf", "sans"),
    ("mathtt", "mono"),
    ("mathscr", "scr"),
    ("boldsymbol", "bold"),
    ("bm", "bold"),
    ("hat", "hat"),
    ("widehat", "hat"),
    ("tilde", "tilde"),
    ("widetilde", "tilde"),
    ("bar", "macron"),
    ("overline", "overline"),
    ("underline", "underline"),
    ("vec", "arrow"),
    ("overrightarrow", "arrow"),
    ("overleftarrow", "arrow.l"),
    ("dot", "dot"),
    ("ddot", "dot.double"),
    ("dddot", "dot.triple"),
    ("acute", "acute"),
    ("grave", "grave"),
    ("breve", "breve"),
    ("check", "caron"),
    ("mathring", "circle"),
    ("overbrace", "overbrace"),
    ("underbrace", "underbrace"),
    ("cancel", "cancel"),
    ("sqrt", "sqrt"),
    ("frac", "frac"),
    ("dfrac", "frac"),
    ("tfrac", "frac"),
    ("binom", "binom"),
    ("dbinom", "binom"),
    ("tbinom", "binom"),
];
