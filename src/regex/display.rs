//! Canonical text rendering of a parse tree.
//!
//! The output re-tokenizes to the same tree (after optimization), which is
//! what lets derived trees be re-parsed into fresh expressions.

use super::ast::{Node, NodeKind, Operator};
use super::token::Tag;

/// Where a node is rendered, which decides whether it needs parentheses.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Top,
    InConcatenation,
    InUnion,
}

/// Render `node` in the input syntax (`+`, `^*`, `^+`, `ε`, parentheses).
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, Position::Top, &mut out);
    out
}

fn write_node(node: &Node, position: Position, out: &mut String) {
    match &node.kind {
        NodeKind::EmptyWord => out.push_str(Tag::EmptyWord.symbol()),
        NodeKind::Letter(c) => out.push(*c),
        NodeKind::Concatenation(parts) | NodeKind::Union(parts) if parts.is_empty() => {
            out.push_str(Tag::EmptyWord.symbol())
        }
        NodeKind::Concatenation(parts) => {
            let grouped = node.operator != Operator::None;
            if grouped {
                out.push('(');
            }
            for part in parts {
                write_node(part, Position::InConcatenation, out);
            }
            if grouped {
                out.push(')');
            }
        }
        NodeKind::Union(parts) => {
            let grouped = node.operator != Operator::None || position != Position::Top;
            if grouped {
                out.push('(');
            }
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push_str(Tag::Union.symbol());
                }
                write_node(part, Position::InUnion, out);
            }
            if grouped {
                out.push(')');
            }
        }
    }
    out.push_str(node.operator.symbol());
}
