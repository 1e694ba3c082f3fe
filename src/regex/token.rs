//! Symbol tags produced by the tokenizer.

use std::fmt;
use std::ops::BitOr;

/// Classification of one input symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Letter,
    Union,
    KleeneStar,
    KleenePlus,
    EmptyWord,
    OpeningParenthesis,
    ClosingParenthesis,
}

impl Tag {
    /// Bit of this tag inside a [`TagSet`].
    pub const fn bit(self) -> u16 {
        match self {
            Tag::Letter => 1 << 0,
            Tag::Union => 1 << 1,
            Tag::KleeneStar => 1 << 2,
            Tag::KleenePlus => 1 << 3,
            Tag::EmptyWord => 1 << 4,
            Tag::OpeningParenthesis => 1 << 5,
            Tag::ClosingParenthesis => 1 << 6,
        }
    }

    pub fn is(self, set: TagSet) -> bool {
        set.contains(self)
    }

    /// Reserved text for this tag (letters have none).
    pub fn symbol(self) -> &'static str {
        match self {
            Tag::Letter => "",
            Tag::Union => "+",
            Tag::KleeneStar => "^*",
            Tag::KleenePlus => "^+",
            Tag::EmptyWord => "ε",
            Tag::OpeningParenthesis => "(",
            Tag::ClosingParenthesis => ")",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Letter => "letter",
            Tag::Union => "union",
            Tag::KleeneStar => "Kleene star",
            Tag::KleenePlus => "Kleene plus",
            Tag::EmptyWord => "empty word",
            Tag::OpeningParenthesis => "opening parenthesis",
            Tag::ClosingParenthesis => "closing parenthesis",
        };
        f.write_str(name)
    }
}

/// A set of tags, used for the adjacency grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSet(u16);

impl TagSet {
    pub const NONE: TagSet = TagSet(0);
    /// KleeneStar and KleenePlus.
    pub const UNARY_OPERATOR: TagSet = TagSet(Tag::KleeneStar.bit() | Tag::KleenePlus.bit());
    /// Both parentheses.
    pub const GROUPING: TagSet =
        TagSet(Tag::OpeningParenthesis.bit() | Tag::ClosingParenthesis.bit());

    pub const fn of(tag: Tag) -> TagSet {
        TagSet(tag.bit())
    }

    pub fn contains(self, tag: Tag) -> bool {
        self.0 & tag.bit() != 0
    }
}

impl BitOr for TagSet {
    type Output = TagSet;

    fn bitor(self, rhs: TagSet) -> TagSet {
        TagSet(self.0 | rhs.0)
    }
}

impl BitOr<Tag> for TagSet {
    type Output = TagSet;

    fn bitor(self, rhs: Tag) -> TagSet {
        TagSet(self.0 | rhs.bit())
    }
}

impl From<Tag> for TagSet {
    fn from(tag: Tag) -> Self {
        TagSet::of(tag)
    }
}

/// One tagged symbol of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tag: Tag,
    /// Character offset (not byte offset) of the symbol in the input.
    pub offset: usize,
    /// The raw slice that produced this token.
    pub text: String,
}

impl Token {
    /// The letter carried by a `Letter` token.
    pub fn letter(&self) -> Option<char> {
        match self.tag {
            Tag::Letter => self.text.chars().next(),
            _ => None,
        }
    }
}
