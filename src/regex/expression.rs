//! `RegularExpression`: input text plus its lazily evaluated tree.
//!
//! Evaluation (tag, balance check, parse, optimize) runs at most once and is
//! cached. A failed evaluation is not cached, so the error is reported again
//! on every access.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use tracing::trace;

use super::ast::Node;
use super::derivative;
use super::optimizer::optimize;
use super::parser::parse;
use super::tokenizer::{count_tags, tag};
use crate::error::{FsmError, Result};

#[derive(Debug, Clone)]
struct Evaluated {
    tree: Node,
    alphabet: Vec<char>,
    canonical: String,
}

/// A regular expression over the letters of its own input.
#[derive(Debug, Clone)]
pub struct RegularExpression {
    input: String,
    evaluated: OnceLock<Evaluated>,
}

impl RegularExpression {
    /// Wrap `text` without validating it.
    pub fn unevaluated(text: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            evaluated: OnceLock::new(),
        }
    }

    /// Parse and optimize `text` right away.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let expression = Self::unevaluated(text);
        expression.evaluate()?;
        Ok(expression)
    }

    /// Validate, parse and optimize the input. Idempotent.
    pub fn evaluate(&self) -> Result<()> {
        self.evaluated().map(|_| ())
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated.get().is_some()
    }

    fn evaluated(&self) -> Result<&Evaluated> {
        if let Some(done) = self.evaluated.get() {
            return Ok(done);
        }

        let tagged = tag(&self.input)?;
        count_tags(&tagged)?;
        let tree = optimize(parse(&tagged)?)?;
        let canonical = tree.to_string();
        trace!(input = %self.input, canonical = %canonical, "evaluated expression");

        // a concurrent evaluation may have won; both results are identical
        let _ = self.evaluated.set(Evaluated {
            tree,
            alphabet: tagged.alphabet,
            canonical,
        });
        self.evaluated
            .get()
            .ok_or_else(|| FsmError::invariant("evaluation result was not stored"))
    }

    /// The text this expression was created from.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Letters of the input, first-seen order.
    pub fn alphabet(&self) -> Result<&[char]> {
        Ok(&self.evaluated()?.alphabet)
    }

    /// The optimized parse tree.
    pub fn tree(&self) -> Result<&Node> {
        Ok(&self.evaluated()?.tree)
    }

    /// Rendering of the optimized tree.
    pub fn canonical(&self) -> Result<&str> {
        Ok(&self.evaluated()?.canonical)
    }

    pub fn generates_empty_word(&self) -> Result<bool> {
        Ok(self.tree()?.nullable())
    }

    /// Derivative by `letter`, or `None` when no word can follow.
    ///
    /// `letter` must belong to this expression's alphabet.
    pub fn derive(&self, letter: char) -> Result<Option<RegularExpression>> {
        let evaluated = self.evaluated()?;
        if !evaluated.alphabet.contains(&letter) {
            return Err(FsmError::InvalidArgument(format!(
                "letter '{}' is not in the alphabet of {}",
                letter, evaluated.canonical
            )));
        }

        let Some(derived) = derivative::derive(evaluated.tree.clone(), letter)? else {
            return Ok(None);
        };
        let text = optimize(derived)?.to_string();
        RegularExpression::new(text.as_str())
            .map(Some)
            .map_err(|e| FsmError::invariant(format!("derivative '{}' does not re-parse: {}", text, e)))
    }

    /// Whether `word` belongs to the language, by repeated derivation.
    pub fn matches(&self, word: &str) -> Result<bool> {
        derivative::matches(self.tree()?, word)
    }

    /// Syntactic equivalence: same input text, or equal optimized trees.
    pub fn equals(&self, other: &RegularExpression) -> Result<bool> {
        if self.input == other.input {
            return Ok(true);
        }
        Ok(self.tree()? == other.tree()?)
    }

    /// Heuristic closeness in `[0, 1]`, used to rank merge candidates.
    ///
    /// 1.0 for equal expressions and 0.0 for disjoint alphabets. Otherwise
    /// the mean of the alphabets' Jaccard index and the Dice coefficient of
    /// the two bags of rendered subtrees.
    pub fn similarity(&self, other: &RegularExpression) -> Result<f64> {
        if self.equals(other)? {
            return Ok(1.0);
        }

        let (a, b) = (self.alphabet()?, other.alphabet()?);
        let shared = a.iter().filter(|c| b.contains(c)).count();
        if shared == 0 {
            return Ok(0.0);
        }
        let jaccard = shared as f64 / (a.len() + b.len() - shared) as f64;

        let (left, right) = (subtree_bag(self.tree()?), subtree_bag(other.tree()?));
        let left_total: usize = left.values().sum();
        let right_total: usize = right.values().sum();
        let common: usize = left
            .iter()
            .map(|(text, n)| right.get(text).map_or(0, |m| (*n).min(*m)))
            .sum();
        let dice = 2.0 * common as f64 / (left_total + right_total) as f64;

        Ok(((jaccard + dice) / 2.0).clamp(0.0, 1.0))
    }
}

/// Rendered subtree -> number of occurrences.
fn subtree_bag(tree: &Node) -> HashMap<String, usize> {
    let mut bag = HashMap::new();
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        *bag.entry(node.to_string()).or_insert(0) += 1;
        stack.extend(node.parts());
    }
    bag
}

impl fmt::Display for RegularExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Ok(canonical) => f.write_str(canonical),
            Err(_) => f.write_str(&self.input),
        }
    }
}

impl FromStr for RegularExpression {
    type Err = FsmError;

    fn from_str(s: &str) -> Result<Self> {
        RegularExpression::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(text: &str) -> RegularExpression {
        RegularExpression::new(text).unwrap()
    }

    #[test]
    fn test_lazy_evaluation() {
        let expression = RegularExpression::unevaluated("a+b");
        assert!(!expression.is_evaluated());
        assert_eq!(expression.canonical().unwrap(), "a+b");
        assert!(expression.is_evaluated());
        expression.evaluate().unwrap();
    }

    #[test]
    fn test_invalid_input_reports_every_time() {
        let expression = RegularExpression::unevaluated("a+");
        assert!(expression.evaluate().is_err());
        assert!(matches!(
            expression.alphabet(),
            Err(FsmError::InvalidExpression { position: Some(1), .. })
        ));
        assert_eq!(expression.to_string(), "a+");
        assert!(RegularExpression::new("").is_err());
    }

    #[test]
    fn test_alphabet_keeps_input_letters() {
        assert_eq!(re("ba(c+a)^*").alphabet().unwrap(), &['b', 'a', 'c']);
    }

    #[test]
    fn test_derive_rejects_foreign_letter() {
        assert!(matches!(
            re("ab").derive('z'),
            Err(FsmError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_derive_builds_fresh_expression() {
        let d = re("a(b+c)").derive('a').unwrap().unwrap();
        assert_eq!(d.canonical().unwrap(), "b+c");
        assert_eq!(d.alphabet().unwrap(), &['b', 'c']);
        assert!(re("a(b+c)").derive('b').unwrap().is_none());
    }

    #[test]
    fn test_equals() {
        assert!(re("a+b").equals(&re("b+a")).unwrap());
        assert!(!re("ab").equals(&re("ba")).unwrap());
        assert!(re("(a^*)^*").equals(&re("a^*")).unwrap());
        assert!(re("x").equals(&re("x")).unwrap());
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(re("a+b").similarity(&re("b+a")).unwrap(), 1.0);
        assert_eq!(re("ab").similarity(&re("cd")).unwrap(), 0.0);

        let close = re("(a+b)^*a").similarity(&re("(a+b)^*b")).unwrap();
        let far = re("(a+b)^*a").similarity(&re("bbbc")).unwrap();
        assert!(close > far, "{} <= {}", close, far);
        assert!(close < 1.0 && far > 0.0);
    }

    #[test]
    fn test_matches_and_nullability() {
        let expression = re("(ab)^*");
        assert!(expression.generates_empty_word().unwrap());
        assert!(expression.matches("abab").unwrap());
        assert!(!expression.matches("aba").unwrap());
    }

    #[test]
    fn test_display_and_from_str() {
        let parsed: RegularExpression = "(a)(b) + .".parse().unwrap();
        assert_eq!(parsed.to_string(), "ab+ε");
        assert_eq!(parsed.input(), "(a)(b) + .");
        assert!("a^^".parse::<RegularExpression>().is_err());
    }
}
