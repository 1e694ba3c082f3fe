//! Parse tree - the structured form of a regular expression.
//!
//! Parents own their children outright. There are no parent links: rendering
//! and derivation pass whatever context they need down the recursion.

use std::fmt;

/// Optional unary postfix operator carried by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operator {
    #[default]
    None,
    /// `^*` - zero or more repetitions
    Star,
    /// `^+` - one or more repetitions
    Plus,
}

impl Operator {
    /// Operator of `(x^inner)^outer` collapsed onto `x`.
    pub fn merge(outer: Operator, inner: Operator) -> Operator {
        match (outer, inner) {
            (Operator::None, op) | (op, Operator::None) => op,
            (Operator::Star, _) | (_, Operator::Star) => Operator::Star,
            (Operator::Plus, Operator::Plus) => Operator::Plus,
        }
    }

    pub fn is_repeating(self) -> bool {
        self != Operator::None
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::None => "",
            Operator::Star => "^*",
            Operator::Plus => "^+",
        }
    }
}

/// Shape of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// ε
    EmptyWord,
    /// A single letter of the alphabet
    Letter(char),
    /// Members matched one after another (order matters)
    Concatenation(Vec<Node>),
    /// Alternatives (order kept for display only)
    Union(Vec<Node>),
}

/// A parse-tree node: a shape plus its postfix operator.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub operator: Operator,
}

impl Node {
    pub fn empty_word() -> Node {
        Node {
            kind: NodeKind::EmptyWord,
            operator: Operator::None,
        }
    }

    pub fn letter(c: char) -> Node {
        Node {
            kind: NodeKind::Letter(c),
            operator: Operator::None,
        }
    }

    pub fn concatenation(parts: Vec<Node>) -> Node {
        Node {
            kind: NodeKind::Concatenation(parts),
            operator: Operator::None,
        }
    }

    pub fn union(parts: Vec<Node>) -> Node {
        Node {
            kind: NodeKind::Union(parts),
            operator: Operator::None,
        }
    }

    /// Same node with `operator` replacing its own.
    pub fn with_operator(mut self, operator: Operator) -> Node {
        self.operator = operator;
        self
    }

    /// Copy of this node without its operator.
    pub fn without_operator(&self) -> Node {
        self.clone().with_operator(Operator::None)
    }

    pub fn is_empty_word(&self) -> bool {
        matches!(self.kind, NodeKind::EmptyWord)
    }

    pub fn is_compound(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Concatenation(_) | NodeKind::Union(_)
        )
    }

    /// Members of a Concatenation/Union, empty for leaves.
    pub fn parts(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Concatenation(parts) | NodeKind::Union(parts) => parts,
            NodeKind::EmptyWord | NodeKind::Letter(_) => &[],
        }
    }

    /// Whether the language of this node contains the empty word.
    pub fn nullable(&self) -> bool {
        self.operator == Operator::Star || self.content_nullable()
    }

    /// Nullability of the node's shape, ignoring its own operator.
    pub fn content_nullable(&self) -> bool {
        match &self.kind {
            NodeKind::EmptyWord => true,
            NodeKind::Letter(_) => false,
            NodeKind::Concatenation(parts) => parts.iter().all(Node::nullable),
            NodeKind::Union(parts) => parts.iter().any(Node::nullable),
        }
    }

    /// Letters occurring in this tree, first-seen order.
    pub fn alphabet(&self) -> Vec<char> {
        let mut letters = Vec::new();
        self.collect_letters(&mut letters);
        letters
    }

    fn collect_letters(&self, letters: &mut Vec<char>) {
        match &self.kind {
            NodeKind::Letter(c) => {
                if !letters.contains(c) {
                    letters.push(*c);
                }
            }
            NodeKind::EmptyWord => {}
            NodeKind::Concatenation(parts) | NodeKind::Union(parts) => {
                for part in parts {
                    part.collect_letters(letters);
                }
            }
        }
    }

    /// Number of nodes in this tree.
    pub fn size(&self) -> usize {
        1 + self.parts().iter().map(Node::size).sum::<usize>()
    }

    /// Equal shape and children, ignoring this node's own operator.
    pub fn same_content(&self, other: &Node) -> bool {
        match (&self.kind, &other.kind) {
            (NodeKind::EmptyWord, NodeKind::EmptyWord) => true,
            (NodeKind::Letter(a), NodeKind::Letter(b)) => a == b,
            (NodeKind::Concatenation(a), NodeKind::Concatenation(b)) => a == b,
            (NodeKind::Union(a), NodeKind::Union(b)) => bag_eq(a, b),
            _ => false,
        }
    }
}

/// Multiset equality: every member of `a` pairs with a distinct equal member of `b`.
fn bag_eq(a: &[Node], b: &[Node]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| match (0..b.len()).find(|&i| !used[i] && *x == b[i]) {
        Some(i) => {
            used[i] = true;
            true
        }
        None => false,
    })
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.same_content(other)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::display::render(self))
    }
}
