//! Recursive-descent parser over tagged tokens.
//!
//! One call per nesting level. A level collects branches; each branch is a
//! run of concatenated elements, and a `+` starts the next branch.

use super::ast::{Node, Operator};
use super::token::{Tag, Token};
use super::tokenizer::TaggedInput;
use crate::error::{FsmError, Result};

/// Parse a validated token stream into an (unoptimized) tree.
pub fn parse(input: &TaggedInput) -> Result<Node> {
    let (root, consumed) = parse_level(&input.tokens, 0, 0)?;
    if let Some(token) = input.tokens.get(consumed) {
        return Err(FsmError::IncompleteParse {
            position: token.offset,
        });
    }
    Ok(root)
}

/// Branches of one nesting level under construction.
struct LevelBuilder {
    branches: Vec<Vec<Node>>,
}

impl LevelBuilder {
    fn new() -> Self {
        Self {
            branches: vec![Vec::new()],
        }
    }

    fn current(&mut self) -> &mut Vec<Node> {
        // `branches` starts with one entry and only ever grows
        let last = self.branches.len() - 1;
        &mut self.branches[last]
    }

    fn push(&mut self, node: Node) {
        self.current().push(node);
    }

    /// A `+` at this level: close the current branch, open the next one.
    fn branch(&mut self, offset: usize) -> Result<()> {
        if self.current().is_empty() {
            return Err(FsmError::invalid("union without left operand", Some(offset)));
        }
        self.branches.push(Vec::new());
        Ok(())
    }

    /// Attach a postfix operator to the last completed element.
    fn apply(&mut self, operator: Operator, offset: usize) -> Result<()> {
        match self.current().last_mut() {
            Some(last) if last.operator == Operator::None => {
                last.operator = operator;
                Ok(())
            }
            Some(_) => Err(FsmError::invalid("operators cannot be stacked", Some(offset))),
            None => Err(FsmError::invalid("operator without operand", Some(offset))),
        }
    }

    fn finish(mut self, offset: usize) -> Result<Node> {
        if self.branches.iter().any(Vec::is_empty) {
            return Err(FsmError::invalid("empty alternative", Some(offset)));
        }
        if self.branches.len() == 1 {
            let parts = self.branches.pop().unwrap_or_default();
            return Ok(Node::concatenation(parts));
        }
        Ok(Node::union(
            self.branches.into_iter().map(Node::concatenation).collect(),
        ))
    }
}

/// Parse from `start` until the matching `)` (or the end at depth 0).
/// Returns the subtree and the index of the first token not consumed.
fn parse_level(tokens: &[Token], start: usize, depth: usize) -> Result<(Node, usize)> {
    let mut level = LevelBuilder::new();
    let mut i = start;

    while let Some(token) = tokens.get(i) {
        match token.tag {
            Tag::Letter => {
                let c = token.letter().ok_or_else(|| {
                    FsmError::invariant(format!("letter token without text at {}", token.offset))
                })?;
                level.push(Node::letter(c));
            }
            Tag::EmptyWord => level.push(Node::empty_word()),
            Tag::Union => level.branch(token.offset)?,
            Tag::KleeneStar => level.apply(Operator::Star, token.offset)?,
            Tag::KleenePlus => level.apply(Operator::Plus, token.offset)?,
            Tag::OpeningParenthesis => {
                let (group, next) = parse_level(tokens, i + 1, depth + 1)?;
                level.push(group);
                i = next;
                continue;
            }
            Tag::ClosingParenthesis => {
                if depth == 0 {
                    // stray `)`: hand it back so the caller reports it
                    return Ok((level.finish(token.offset)?, i));
                }
                return Ok((level.finish(token.offset)?, i + 1));
            }
        }
        i += 1;
    }

    let end = tokens.last().map_or(0, |t| t.offset);
    if depth > 0 {
        return Err(FsmError::invalid("unclosed parenthesis", Some(end)));
    }
    Ok((level.finish(end)?, i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::ast::NodeKind;
    use crate::regex::tokenizer::tag;

    fn parse_str(text: &str) -> Result<Node> {
        parse(&tag(text)?)
    }

    fn a() -> Node {
        Node::letter('a')
    }

    fn b() -> Node {
        Node::letter('b')
    }

    #[test]
    fn test_concatenation() {
        let tree = parse_str("ab").unwrap();
        assert_eq!(tree, Node::concatenation(vec![a(), b()]));
    }

    #[test]
    fn test_union_branches() {
        let tree = parse_str("a+b+ab").unwrap();
        assert_eq!(
            tree,
            Node::union(vec![
                Node::concatenation(vec![a()]),
                Node::concatenation(vec![b()]),
                Node::concatenation(vec![a(), b()]),
            ])
        );
    }

    #[test]
    fn test_operator_binds_to_last_element() {
        let tree = parse_str("ab^*").unwrap();
        assert_eq!(
            tree,
            Node::concatenation(vec![a(), b().with_operator(Operator::Star)])
        );
    }

    #[test]
    fn test_group_with_operator() {
        let tree = parse_str("(a+b)^+a").unwrap();
        let group = Node::union(vec![
            Node::concatenation(vec![a()]),
            Node::concatenation(vec![b()]),
        ])
        .with_operator(Operator::Plus);
        assert_eq!(tree, Node::concatenation(vec![group, a()]));
    }

    #[test]
    fn test_nested_groups() {
        let tree = parse_str("((a))").unwrap();
        let inner = Node::concatenation(vec![a()]);
        let middle = Node::concatenation(vec![inner]);
        assert_eq!(tree, Node::concatenation(vec![middle]));
    }

    #[test]
    fn test_empty_word() {
        let tree = parse_str("a.").unwrap();
        assert!(matches!(tree.kind, NodeKind::Concatenation(ref p) if p[1].is_empty_word()));
    }

    #[test]
    fn test_stray_closing_is_incomplete_parse() {
        // balance is normally checked first; the parser still refuses trailing tokens
        let tagged = tag("a)b").unwrap();
        assert!(matches!(
            parse(&tagged),
            Err(FsmError::IncompleteParse { position: 1 })
        ));
    }

    #[test]
    fn test_unclosed_group_rejected() {
        let tagged = tag("(ab").unwrap();
        assert!(matches!(
            parse(&tagged),
            Err(FsmError::InvalidExpression { .. })
        ));
    }
}
