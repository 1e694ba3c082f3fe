//! Regular expressions with Brzozowski derivatives.
//!
//! Input syntax: letters are any character except the reserved symbols
//! `+` (union), `^*` (Kleene star), `^+` (Kleene plus), `.`/`ε` (empty word)
//! and parentheses. Whitespace is ignored.
//!
//! The pipeline is tag → balance check → parse → optimize. Derivatives are
//! taken on the optimized tree, rendered back to text and re-evaluated, so
//! every derived expression is itself a canonical [`RegularExpression`].
//!
//! # Example
//!
//! ```
//! use regex2fsm::regex::RegularExpression;
//!
//! let r = RegularExpression::new("1(0+1)^*").unwrap();
//! let d = r.derive('1').unwrap().unwrap();
//! assert_eq!(d.canonical().unwrap(), "(0+1)^*");
//! assert!(d.generates_empty_word().unwrap());
//! ```

pub mod ast;
pub mod derivative;
mod display;
pub mod expression;
pub mod optimizer;
pub mod parser;
pub mod token;
pub mod tokenizer;

pub use ast::{Node, NodeKind, Operator};
pub use derivative::{derive, matches};
pub use display::render;
pub use expression::RegularExpression;
pub use optimizer::optimize;
pub use parser::parse;
pub use token::{Tag, TagSet, Token};
pub use tokenizer::{count_tags, tag, TaggedInput};

#[cfg(test)]
mod tests {
    use super::*;

    fn re(text: &str) -> RegularExpression {
        RegularExpression::new(text).unwrap()
    }

    #[test]
    fn test_integration_binary_numbers() {
        let r = re("0+1(0+1)^*");
        assert!(r.matches("0").unwrap());
        assert!(r.matches("1").unwrap());
        assert!(r.matches("11001010").unwrap());
        assert!(!r.matches("01").unwrap());
        assert!(!r.matches("").unwrap());
    }

    #[test]
    fn test_integration_derivative_chain() {
        let r = re("ab^*c");
        let after_a = r.derive('a').unwrap().unwrap();
        assert_eq!(after_a.canonical().unwrap(), "b^*c");
        let after_b = after_a.derive('b').unwrap().unwrap();
        assert!(after_b.equals(&after_a).unwrap());
        let after_c = after_b.derive('c').unwrap().unwrap();
        assert_eq!(after_c.canonical().unwrap(), "ε");
        assert!(after_c.generates_empty_word().unwrap());
    }

    #[test]
    fn test_integration_star_absorbs() {
        let r = re("a^*");
        let d = r.derive('a').unwrap().unwrap();
        assert!(d.equals(&r).unwrap());
    }

    #[test]
    fn test_integration_death() {
        assert!(re("ab").derive('b').unwrap().is_none());
        assert!(re("a").derive('a').unwrap().unwrap().canonical().unwrap() == "ε");
    }

    #[test]
    fn test_integration_empty_word_spellings() {
        assert!(re(".").equals(&re("ε")).unwrap());
        assert!(re("a.").equals(&re("aε")).unwrap());
    }

    #[test]
    fn test_integration_canonical_round_trip() {
        for text in ["(a+b)^*abb", "a(b+.)^+", "((x))^+y^*y", "0+10+(1)^*"] {
            let once = re(text);
            let again = re(once.canonical().unwrap());
            assert!(once.equals(&again).unwrap(), "{} -> {}", text, once);
            assert_eq!(once.canonical().unwrap(), again.canonical().unwrap());
        }
    }
}
