//! Brzozowski derivatives over the parse tree.
//!
//! `derive(E, a)` is the expression matching `w` iff `E` matches `aw`.
//! `None` stands for the dead expression (no word can follow).

use rayon::prelude::*;

use super::ast::{Node, NodeKind, Operator};
use super::optimizer::optimize;
use crate::error::Result;

/// Derive `node` by `letter`. Consumes the tree; clone first to keep it.
pub fn derive(node: Node, letter: char) -> Result<Option<Node>> {
    match node.operator {
        // E^* = ε + E·E^* and E^+ = E·E^*. The ε branch dies on any letter, and
        // a skip through E lands on E^* again, so both reduce to d(E)·E^*.
        Operator::Star | Operator::Plus => {
            let body = node.without_operator();
            let starred = node.with_operator(Operator::Star);
            match derive(body, letter)? {
                Some(d) => Ok(Some(optimize(followed_by(d, vec![starred]))?)),
                None => Ok(None),
            }
        }
        Operator::None => match node.kind {
            NodeKind::EmptyWord => Ok(None),
            NodeKind::Letter(c) => Ok((c == letter).then(Node::empty_word)),
            NodeKind::Concatenation(parts) => derive_concatenation(parts, letter),
            NodeKind::Union(parts) => derive_union(parts, letter),
        },
    }
}

/// d(h·t) = d(h)·t, plus d(t) when h generates ε.
///
/// For a starred head the first alternative uses the star once and the second
/// skips it; for a head union with an ε branch they are "head without ε, then
/// tail" and "tail alone".
fn derive_concatenation(mut parts: Vec<Node>, letter: char) -> Result<Option<Node>> {
    if parts.is_empty() {
        return Ok(None);
    }
    let head = parts.remove(0);
    let tail = parts;

    let skipped = if head.nullable() {
        derive(sequence(tail.clone()), letter)?
    } else {
        None
    };
    let consumed = derive(head, letter)?.map(|d| followed_by(d, tail));

    match (consumed, skipped) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => Ok(Some(optimize(only)?)),
        (Some(first), Some(second)) => Ok(Some(optimize(Node::union(vec![first, second]))?)),
    }
}

/// Derive every member independently; dead members drop out.
fn derive_union(parts: Vec<Node>, letter: char) -> Result<Option<Node>> {
    let derived: Vec<Option<Node>> = parts
        .into_par_iter()
        .map(|part| derive(part, letter))
        .collect::<Result<_>>()?;
    let survivors: Vec<Node> = derived.into_iter().flatten().collect();
    if survivors.is_empty() {
        return Ok(None);
    }
    Ok(Some(optimize(Node::union(survivors))?))
}

/// `head` followed by `tail`; an ε head disappears.
fn followed_by(head: Node, tail: Vec<Node>) -> Node {
    if head.is_empty_word() {
        return sequence(tail);
    }
    let mut parts = Vec::with_capacity(tail.len() + 1);
    parts.push(head);
    parts.extend(tail);
    Node::concatenation(parts)
}

/// Concatenation of `parts`, or ε when there are none.
fn sequence(parts: Vec<Node>) -> Node {
    match parts.len() {
        0 => Node::empty_word(),
        _ => Node::concatenation(parts),
    }
}

/// Whether `node` matches `word`, by repeated derivation.
pub fn matches(node: &Node, word: &str) -> Result<bool> {
    let mut current = node.clone();
    for c in word.chars() {
        match derive(current, c)? {
            Some(next) => current = next,
            None => return Ok(false),
        }
    }
    Ok(current.nullable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::parser::parse;
    use crate::regex::tokenizer::tag;

    fn tree(text: &str) -> Node {
        optimize(parse(&tag(text).unwrap()).unwrap()).unwrap()
    }

    fn derived(text: &str, letter: char) -> Option<String> {
        derive(tree(text), letter)
            .unwrap()
            .map(|n| optimize(n).unwrap().to_string())
    }

    #[test]
    fn test_letter() {
        assert_eq!(derived("a", 'a').as_deref(), Some("ε"));
        assert_eq!(derived("a", 'b'), None);
    }

    #[test]
    fn test_empty_word_dies() {
        assert_eq!(derived(".", 'a'), None);
    }

    #[test]
    fn test_star_self_loop() {
        assert_eq!(derive(tree("a^*"), 'a').unwrap(), Some(tree("a^*")));
    }

    #[test]
    fn test_plus_becomes_star() {
        assert_eq!(derive(tree("a^+"), 'a').unwrap(), Some(tree("a^*")));
        assert_eq!(derive(tree("(a)^+"), 'a').unwrap(), Some(tree("a^*")));
    }

    #[test]
    fn test_concatenation_head_only() {
        assert_eq!(derived("abc", 'a').as_deref(), Some("bc"));
        assert_eq!(derived("abc", 'b'), None);
        assert_eq!(derived("abc", 'c'), None);
    }

    #[test]
    fn test_starred_head_skip_and_use() {
        // skip a^* and consume b, or use the star once
        assert_eq!(derive(tree("a^*b"), 'b').unwrap(), Some(tree(".")));
        assert_eq!(derive(tree("a^*b"), 'a').unwrap(), Some(tree("a^*b")));
        assert_eq!(derived("a^*b", 'c'), None);
    }

    #[test]
    fn test_union_head_with_empty_branch() {
        assert_eq!(derive(tree("(a+.)b"), 'b').unwrap(), Some(tree(".")));
        assert_eq!(derive(tree("(a+.)b"), 'a').unwrap(), Some(tree("b")));
    }

    #[test]
    fn test_nullable_union_head_without_empty_branch() {
        // (a^* + b)c accepts "c"
        assert_eq!(derive(tree("(a^*+b)c"), 'c').unwrap(), Some(tree(".")));
        assert_eq!(derive(tree("(a^*+b)c"), 'a').unwrap(), Some(tree("a^*c")));
    }

    #[test]
    fn test_union_members_die_independently() {
        assert_eq!(derive(tree("ab+ac+b"), 'a').unwrap(), Some(tree("b+c")));
        assert_eq!(derive(tree("ab+ac+b"), 'b').unwrap(), Some(tree(".")));
        assert_eq!(derived("ab+ac", 'c'), None);
    }

    #[test]
    fn test_nested_nullable_star_terminates() {
        let d = derive(tree("(a^*b^*)^*c"), 'b').unwrap().unwrap();
        assert!(matches(&d, "c").unwrap());
        assert!(matches(&d, "abbac").unwrap());
        assert!(!matches(&d, "").unwrap());
    }

    #[test]
    fn test_group_star() {
        let d = derive(tree("(ab)^*"), 'a').unwrap();
        assert_eq!(d, Some(tree("b(ab)^*")));
    }

    #[test]
    fn test_matches() {
        let r = tree("0+1(0+1)^*");
        assert!(matches(&r, "0").unwrap());
        assert!(matches(&r, "11001010").unwrap());
        assert!(!matches(&r, "").unwrap());
        assert!(!matches(&r, "01").unwrap());
        assert!(!matches(&r, "12").unwrap());

        let r = tree("(a+b)^*abb");
        assert!(matches(&r, "abb").unwrap());
        assert!(matches(&r, "babaabb").unwrap());
        assert!(!matches(&r, "abba").unwrap());
    }
}
