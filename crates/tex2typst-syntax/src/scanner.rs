//! A table-driven scanner shared by both dialects' lexers.
//!
//! A lexer is described by an ordered list of [`Rule`]s. At each position,
//! every rule's pattern is matched against the remaining text. The longest
//! match wins and ties go to the rule declared first. The winning rule's
//! action decides what to emit. It may also reject the match, in which case
//! the next best candidate at the same position is tried.

use ecow::EcoString;
use regex::{Captures, Regex};
use unscanny::Scanner;

use crate::{Span, Token};

/// The outcome of a rule's action.
pub enum Lexed<K> {
    /// Emit the tokens and consume the whole match.
    Tokens(Vec<(K, EcoString)>),
    /// Emit the tokens, but only consume the first `n` bytes of the match.
    /// The rest is lexed again.
    Prefix(usize, Vec<(K, EcoString)>),
    /// Try the next best candidate at the same position.
    Reject,
}

impl<K> Lexed<K> {
    /// Emit a single token and consume the whole match.
    pub fn one(kind: K, text: impl Into<EcoString>) -> Self {
        Self::Tokens(vec![(kind, text.into())])
    }
}

/// Decides what to do with a match.
pub type Action<K> = fn(&Captures) -> Lexed<K>;

/// A pattern and what to do when it wins at a position.
pub struct Rule<K> {
    pattern: Regex,
    action: Action<K>,
}

impl<K> Rule<K> {
    /// Create a rule. The pattern is anchored at the current position.
    ///
    /// Panics if the pattern is invalid. Rule tables are static, so this is
    /// a programming error.
    pub fn new(pattern: &str, action: Action<K>) -> Self {
        let pattern = Regex::new(&format!("^(?:{pattern})"))
            .unwrap_or_else(|err| panic!("invalid lexer rule `{pattern}`: {err}"));
        Self { pattern, action }
    }
}

/// Splits text into tokens according to a rule table.
///
/// Characters at which no rule produces anything become single-character
/// tokens of the `unknown` kind; lexing never fails.
pub fn scan<K: Copy>(text: &str, rules: &[Rule<K>], unknown: K) -> Vec<Token<K>> {
    let mut s = Scanner::new(text);
    let mut tokens = vec![];
    let mut candidates: Vec<(usize, usize, Captures)> = vec![];

    while !s.done() {
        let start = s.cursor();
        let rest = s.after();

        candidates.clear();
        for (i, rule) in rules.iter().enumerate() {
            if let Some(captures) = rule.pattern.captures(rest) {
                let len = captures.get(0).map_or(0, |m| m.len());
                if len > 0 {
                    candidates.push((len, i, captures));
                }
            }
        }

        // Longest match first, earlier rules win ties.
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut consumed = None;
        for (len, i, captures) in candidates.drain(..) {
            let (len, emitted) = match (rules[i].action)(&captures) {
                Lexed::Reject => continue,
                Lexed::Tokens(emitted) => (len, emitted),
                Lexed::Prefix(n, emitted) => {
                    debug_assert!(n > 0 && rest.is_char_boundary(n));
                    (n.clamp(1, len), emitted)
                }
            };

            let span = Span::new(start, start + len);
            tokens.extend(
                emitted.into_iter().map(|(kind, text)| Token::new(kind, text).spanned(span)),
            );
            consumed = Some(len);
            break;
        }

        match consumed {
            Some(len) => s.jump(start + len),
            None => {
                s.eat();
                let span = Span::new(start, s.cursor());
                tokens.push(Token::new(unknown, s.from(start)).spanned(span));
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    enum Kind {
        Word,
        Pair,
        Digit,
        Unknown,
    }

    fn rules() -> Vec<Rule<Kind>> {
        vec![
            Rule::new(r"[a-z]+", |c| Lexed::one(Kind::Word, &c[0])),
            // Only accepts pairs of equal digits.
            Rule::new(r"[0-9]{2}", |c| {
                let text = &c[0];
                if text[..1] == text[1..] {
                    Lexed::one(Kind::Pair, text)
                } else {
                    Lexed::Reject
                }
            }),
            Rule::new(r"[0-9]", |c| Lexed::one(Kind::Digit, &c[0])),
            Rule::new(r"[a-z]+!", |c| Lexed::Prefix(1, vec![(Kind::Word, c[0][..1].into())])),
        ]
    }

    #[track_caller]
    fn test(text: &str, goal: &[(Kind, &str)]) {
        let found: Vec<_> = scan(text, &rules(), Kind::Unknown)
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect();
        let goal: Vec<_> = goal.iter().map(|&(kind, text)| (kind, text.into())).collect();
        assert_eq!(found, goal);
    }

    #[test]
    fn test_longest_match() {
        test("abc", &[(Kind::Word, "abc")]);
        test("11", &[(Kind::Pair, "11")]);
    }

    #[test]
    fn test_reject_falls_through() {
        test("12", &[(Kind::Digit, "1"), (Kind::Digit, "2")]);
    }

    #[test]
    fn test_prefix_cutback() {
        test(
            "ab!",
            &[(Kind::Word, "a"), (Kind::Word, "b"), (Kind::Unknown, "!")],
        );
    }

    #[test]
    fn test_unknown_characters() {
        test("a?", &[(Kind::Word, "a"), (Kind::Unknown, "?")]);
        test("é", &[(Kind::Unknown, "é")]);
    }

    #[test]
    fn test_spans() {
        let tokens = scan("ab 7", &rules(), Kind::Unknown);
        let spans: Vec<_> = tokens.iter().map(|t| t.span.range()).collect();
        assert_eq!(spans, [Some(0..2), Some(2..3), Some(3..4)]);
    }
}
