//! Tree rewriter - keeps equivalent expressions in one normal-ish shape.
//!
//! `rewrite` makes one bottom-up pass and reports whether any rule fired;
//! `optimize` repeats it until nothing changes. Every rule preserves the
//! language and either removes a node or weakens an operator, so the loop
//! terminates.

use rayon::prelude::*;

use super::ast::{Node, NodeKind, Operator};
use crate::error::{FsmError, Result};

/// Rewrite `node` to a fixpoint.
pub fn optimize(node: Node) -> Result<Node> {
    let mut node = node;
    loop {
        let (next, changed) = rewrite(node)?;
        node = next;
        if !changed {
            return Ok(node);
        }
    }
}

/// One rewriting pass. Returns the new tree and whether it differs.
pub fn rewrite(node: Node) -> Result<(Node, bool)> {
    let Node { kind, operator } = node;
    let (node, changed) = match kind {
        // ε^* = ε^+ = ε
        NodeKind::EmptyWord => (Node::empty_word(), operator != Operator::None),
        NodeKind::Letter(c) => (Node::letter(c).with_operator(operator), false),
        NodeKind::Concatenation(parts) => rewrite_concatenation(parts, operator)?,
        NodeKind::Union(parts) => rewrite_union(parts, operator)?,
    };

    // E^+ = E^* whenever E already generates ε
    if node.operator == Operator::Plus && node.content_nullable() {
        return Ok((node.with_operator(Operator::Star), true));
    }
    Ok((node, changed))
}

/// A container left with one member is replaced by it, operators merged.
fn collapse_singleton(child: Node, operator: Operator) -> Node {
    let merged = Operator::merge(operator, child.operator);
    child.with_operator(merged)
}

fn rewrite_concatenation(parts: Vec<Node>, operator: Operator) -> Result<(Node, bool)> {
    let mut changed = false;
    let mut members = Vec::with_capacity(parts.len());
    for part in parts {
        let (member, member_changed) = rewrite(part)?;
        changed |= member_changed;
        members.push(member);
    }

    if members.iter().any(Node::is_empty_word) {
        members.retain(|m| !m.is_empty_word());
        changed = true;
        if members.is_empty() {
            return Ok((Node::empty_word(), true));
        }
    }

    if members.iter().any(is_plain_concatenation) {
        members = members
            .into_iter()
            .flat_map(|m| match m {
                Node {
                    kind: NodeKind::Concatenation(inner),
                    operator: Operator::None,
                } => inner,
                other => vec![other],
            })
            .collect();
        changed = true;
    }

    changed |= merge_adjacent_repeats(&mut members);

    if members.is_empty() {
        return Err(FsmError::invariant("concatenation reduced to zero members"));
    }
    if members.len() == 1 {
        let child = members.remove(0);
        return Ok((collapse_singleton(child, operator), true));
    }
    Ok((Node::concatenation(members).with_operator(operator), changed))
}

/// `x^* x^*` → `x^*`, `x^* x^+` → `x^+`, `x x^*` → `x^+` (one merge per pass).
fn merge_adjacent_repeats(members: &mut Vec<Node>) -> bool {
    for i in 1..members.len() {
        let (x, y) = (&members[i - 1], &members[i]);
        if !x.same_content(y) {
            continue;
        }
        let merged = match (x.operator, y.operator) {
            (Operator::Star, Operator::Star) => Operator::Star,
            (Operator::Star, Operator::Plus) | (Operator::Plus, Operator::Star) => Operator::Plus,
            (Operator::Star, Operator::None) | (Operator::None, Operator::Star) => Operator::Plus,
            // x^+ x^+ and x x^+ need at least two copies; no single operator says that
            _ => continue,
        };
        members[i - 1].operator = merged;
        members.remove(i);
        return true;
    }
    false
}

fn rewrite_union(parts: Vec<Node>, operator: Operator) -> Result<(Node, bool)> {
    let rewritten: Vec<(Node, bool)> = parts.into_par_iter().map(rewrite).collect::<Result<_>>()?;
    let mut changed = rewritten.iter().any(|(_, c)| *c);
    let mut members: Vec<Node> = rewritten.into_iter().map(|(m, _)| m).collect();

    if members.iter().any(is_plain_union) {
        members = members
            .into_iter()
            .flat_map(|m| match m {
                Node {
                    kind: NodeKind::Union(inner),
                    operator: Operator::None,
                } => inner,
                other => vec![other],
            })
            .collect();
        changed = true;
    }

    // the star already yields ε
    if operator == Operator::Star
        && members.iter().any(Node::is_empty_word)
        && members.iter().any(|m| !m.is_empty_word())
    {
        members.retain(|m| !m.is_empty_word());
        changed = true;
    }

    let mut unique: Vec<Node> = Vec::with_capacity(members.len());
    for member in members {
        if unique.contains(&member) {
            changed = true;
        } else {
            unique.push(member);
        }
    }
    let mut members = unique;

    changed |= fold_repeated_members(&mut members);
    changed |= absorb_empty_word(&mut members);

    if members.is_empty() {
        return Err(FsmError::invariant("union reduced to zero members"));
    }
    if members.len() == 1 {
        let child = members.remove(0);
        return Ok((collapse_singleton(child, operator), true));
    }
    Ok((Node::union(members).with_operator(operator), changed))
}

/// Fold two members equal up to their operators into one (one fold per pass).
fn fold_repeated_members(members: &mut Vec<Node>) -> bool {
    for i in 0..members.len() {
        for j in i + 1..members.len() {
            if !members[i].same_content(&members[j]) {
                continue;
            }
            let folded = match (members[i].operator, members[j].operator) {
                (Operator::Plus, Operator::None) | (Operator::None, Operator::Plus) => {
                    Operator::Plus
                }
                (Operator::Star, _) | (_, Operator::Star) => Operator::Star,
                _ => continue,
            };
            members[i].operator = folded;
            members.remove(j);
            return true;
        }
    }
    false
}

/// `ε + x^+` → `x^*`; `ε + y` → `y` when `y` already generates ε.
fn absorb_empty_word(members: &mut Vec<Node>) -> bool {
    let Some(epsilon) = members.iter().position(Node::is_empty_word) else {
        return false;
    };
    if let Some(plus) = members.iter().position(|m| m.operator == Operator::Plus) {
        members[plus].operator = Operator::Star;
        members.remove(epsilon);
        return true;
    }
    if members.iter().any(|m| !m.is_empty_word() && m.nullable()) {
        members.remove(epsilon);
        return true;
    }
    false
}

fn is_plain_concatenation(node: &Node) -> bool {
    node.operator == Operator::None && matches!(node.kind, NodeKind::Concatenation(_))
}

fn is_plain_union(node: &Node) -> bool {
    node.operator == Operator::None && matches!(node.kind, NodeKind::Union(_))
}
