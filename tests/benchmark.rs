//! Machine vs derivative matching benchmark.
//!
//! Runs the same words through a constructed machine and through repeated
//! derivation of the expression. Both must agree; the report shows what the
//! up-front construction buys per word.

use regex2fsm::{FiniteStateMachine, RegularExpression};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
struct Timing {
    pub words: usize,
    pub accepted: usize,
    pub total_time_us: u128,
}

#[derive(Debug, Clone, Serialize)]
struct Comparison {
    pub expression: String,
    pub states: usize,
    pub transitions: usize,
    pub build_time_us: u128,
    pub machine: Timing,
    pub derivatives: Timing,
}

/// Deterministic words over `alphabet`: every word up to `max_len` letters.
fn all_words(alphabet: &[char], max_len: usize) -> Vec<String> {
    let mut words = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for word in &frontier {
            for c in alphabet {
                let mut longer = word.clone();
                longer.push(*c);
                next.push(longer);
            }
        }
        words.extend(next.iter().cloned());
        frontier = next;
    }
    words
}

fn compare(text: &str, max_len: usize) -> Comparison {
    let expression = RegularExpression::new(text).unwrap();
    let words = all_words(expression.alphabet().unwrap(), max_len);

    let start = Instant::now();
    let mut machine = FiniteStateMachine::new(text).unwrap();
    machine.construct().unwrap();
    let build_time_us = start.elapsed().as_micros();

    let start = Instant::now();
    let by_machine: Vec<bool> = words.iter().map(|w| machine.accepts(w).unwrap()).collect();
    let machine_time = start.elapsed().as_micros();

    let start = Instant::now();
    let by_derivatives: Vec<bool> = words
        .iter()
        .map(|w| expression.matches(w).unwrap())
        .collect();
    let derivative_time = start.elapsed().as_micros();

    for (i, word) in words.iter().enumerate() {
        assert_eq!(by_machine[i], by_derivatives[i], "{} on '{}'", text, word);
    }

    Comparison {
        expression: expression.to_string(),
        states: machine.states().len(),
        transitions: machine.transitions().len(),
        build_time_us,
        machine: Timing {
            words: words.len(),
            accepted: by_machine.iter().filter(|a| **a).count(),
            total_time_us: machine_time,
        },
        derivatives: Timing {
            words: words.len(),
            accepted: by_derivatives.iter().filter(|a| **a).count(),
            total_time_us: derivative_time,
        },
    }
}

fn run_benchmark(expressions: &[&str], max_len: usize) -> Vec<Comparison> {
    println!("\n========================================");
    println!("Machine vs Derivatives");
    println!("========================================\n");

    let mut results = Vec::new();
    for text in expressions {
        let c = compare(text, max_len);
        println!("  {}:", c.expression);
        println!("    States:      {} ({} transitions)", c.states, c.transitions);
        println!("    Build:       {}us", c.build_time_us);
        println!(
            "    Machine:     {}us for {} words",
            c.machine.total_time_us, c.machine.words
        );
        println!(
            "    Derivatives: {}us for {} words",
            c.derivatives.total_time_us, c.derivatives.words
        );
        println!();
        results.push(c);
    }

    println!("{}", serde_json::to_string_pretty(&results).unwrap());
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_agrees() {
        let results = run_benchmark(
            &["(a+b)^*abb", "0+1(0+1)^*", "(ab+ba)^*(a+.)", "a^*b^*c^*"],
            6,
        );
        assert_eq!(results.len(), 4);
        for c in &results {
            assert!(c.states > 0);
            assert_eq!(c.machine.accepted, c.derivatives.accepted);
        }
    }

    #[test]
    fn test_all_words() {
        let words = all_words(&['a', 'b'], 2);
        assert_eq!(words, vec!["", "a", "b", "aa", "ab", "ba", "bb"]);
    }
}
