//! Finite-state machines built from derivatives.
//!
//! Each state stands for an expression; the transition by a letter leads to
//! the state of the expression's derivative by that letter. Construction
//! stops once every reachable derivative has a state, which happens because
//! derivatives are compared up to the rewriter's normal form.
//!
//! ```
//! use regex2fsm::fsm::FiniteStateMachine;
//!
//! let mut machine = FiniteStateMachine::new("(a)^+").unwrap();
//! machine.construct().unwrap();
//! assert_eq!(machine.states(), vec!["a^+", "a^*"]);
//! assert_eq!(machine.accepting_states(), vec![1]);
//! assert!(machine.accepts("aaa").unwrap());
//! ```

pub mod construction;
pub mod machine;
pub mod resolver;
pub mod session;
pub mod types;

pub use construction::{Construction, StepOutcome};
pub use machine::{FiniteStateMachine, StepReport};
pub use resolver::{
    Candidate, DistinctResolver, EquivalenceResolver, FnResolver, PendingQuestion, Resolution,
};
pub use session::{Advance, SharedMachine};
pub use types::{MachineSnapshot, Progress, StateGroup, StateId, StateView, Transition};
