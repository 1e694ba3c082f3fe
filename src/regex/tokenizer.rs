//! Tokenizer: classifies input symbols and enforces the adjacency grammar.
//!
//! Reserved symbols: `+` (union), `^*` (Kleene star), `^+` (Kleene plus),
//! `.` or `ε` (empty word), `(` and `)`. Whitespace is skipped; every other
//! character is a letter.

use super::token::{Tag, TagSet, Token};
use crate::error::{FsmError, Result};

/// Multi-character symbols, matched before single characters.
const MULTI_CHAR_SYMBOLS: &[(&str, Tag)] = &[("^*", Tag::KleeneStar), ("^+", Tag::KleenePlus)];

/// Characters that are neither letters nor part of a reserved symbol on their own.
const FORBIDDEN: &[char] = &['^', '*'];

/// Output of [`tag`]: the token stream plus the alphabet in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedInput {
    pub tokens: Vec<Token>,
    pub alphabet: Vec<char>,
}

/// Tag `text` and validate the adjacency grammar.
///
/// Parenthesis balance is checked separately by [`count_tags`].
pub fn tag(text: &str) -> Result<TaggedInput> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut alphabet: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (tag, width) = match classify(&chars[i..]) {
            Some(found) => found,
            None => {
                return Err(FsmError::invalid(
                    format!("forbidden symbol '{}'", c),
                    Some(i),
                ))
            }
        };

        check_adjacent(tokens.last().map(|t| t.tag), tag, i)?;

        if tag == Tag::Letter && !alphabet.contains(&c) {
            alphabet.push(c);
        }
        tokens.push(Token {
            tag,
            offset: i,
            text: chars[i..i + width].iter().collect(),
        });
        i += width;
    }

    let last = match tokens.last() {
        Some(last) => last,
        None => return Err(FsmError::invalid("expression is empty", None)),
    };
    if last.tag.is(TagSet::of(Tag::Union) | Tag::OpeningParenthesis) {
        return Err(FsmError::invalid(
            format!("expression cannot end with {}", last.tag),
            Some(last.offset),
        ));
    }

    Ok(TaggedInput { tokens, alphabet })
}

/// Check that parentheses are balanced and never close before they open.
pub fn count_tags(input: &TaggedInput) -> Result<()> {
    let mut depth: i64 = 0;
    for token in &input.tokens {
        match token.tag {
            Tag::OpeningParenthesis => depth += 1,
            Tag::ClosingParenthesis => {
                depth -= 1;
                if depth < 0 {
                    return Err(FsmError::invalid(
                        "closing parenthesis without matching opening parenthesis",
                        Some(token.offset),
                    ));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        let opening = input
            .tokens
            .iter()
            .filter(|t| t.tag == Tag::OpeningParenthesis)
            .map(|t| t.offset)
            .last();
        return Err(FsmError::invalid(
            format!("{} unclosed parenthesis", depth),
            opening,
        ));
    }
    Ok(())
}

fn classify(rest: &[char]) -> Option<(Tag, usize)> {
    for (symbol, tag) in MULTI_CHAR_SYMBOLS {
        let width = symbol.chars().count();
        if rest.len() >= width && rest[..width].iter().copied().eq(symbol.chars()) {
            return Some((*tag, width));
        }
    }

    let c = rest[0];
    if FORBIDDEN.contains(&c) {
        return None;
    }
    let tag = match c {
        '+' => Tag::Union,
        '.' | 'ε' => Tag::EmptyWord,
        '(' => Tag::OpeningParenthesis,
        ')' => Tag::ClosingParenthesis,
        _ => Tag::Letter,
    };
    Some((tag, 1))
}

/// Tags that may not directly precede `next`, and whether `next` is barred from
/// starting the expression.
fn forbidden_before(next: Tag) -> (TagSet, bool) {
    let after_union_or_open = TagSet::of(Tag::Union) | Tag::OpeningParenthesis;
    match next {
        Tag::Union => (after_union_or_open, true),
        Tag::KleeneStar | Tag::KleenePlus => (after_union_or_open | TagSet::UNARY_OPERATOR, true),
        Tag::ClosingParenthesis => (after_union_or_open, true),
        Tag::Letter | Tag::EmptyWord | Tag::OpeningParenthesis => (TagSet::NONE, false),
    }
}

fn check_adjacent(previous: Option<Tag>, next: Tag, offset: usize) -> Result<()> {
    let (forbidden, not_first) = forbidden_before(next);
    match previous {
        None if not_first => Err(FsmError::invalid(
            format!("expression cannot start with {}", next),
            Some(offset),
        )),
        Some(prev) if prev.is(forbidden) => {
            let reason = if prev == Tag::OpeningParenthesis && next == Tag::ClosingParenthesis {
                "empty parentheses".to_string()
            } else {
                format!("{} cannot follow {}", next, prev)
            };
            Err(FsmError::invalid(reason, Some(offset)))
        }
        _ => Ok(()),
    }
}
