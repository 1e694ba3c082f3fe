//! # regex2fsm
//!
//! Regular expressions to finite-state machines with Brzozowski derivatives.
//!
//! An expression is tagged, checked, parsed and rewritten into a normal form.
//! Its derivative by a letter is again an expression, so the states of the
//! machine are the distinct derivatives reachable from the input, and each
//! transition records which letter produced which derivative.
//!
//! ## Quick Start
//!
//! ```rust
//! use regex2fsm::{FiniteStateMachine, RegularExpression};
//!
//! let r = RegularExpression::new("0+1(0+1)^*").unwrap();
//! assert!(r.equals(&RegularExpression::new("1(1+0)^*+0").unwrap()).unwrap());
//!
//! let mut machine = FiniteStateMachine::new("0+1(0+1)^*").unwrap();
//! machine.construct().unwrap();
//! assert!(machine.accepts("11001010").unwrap());
//! assert!(!machine.accepts("0110").unwrap());
//! ```

pub mod config;
pub mod error;
pub mod fsm;
pub mod regex;

// Re-exports for convenience
pub use config::Config;
pub use error::{FsmError, Result};

pub use fsm::{
    Advance, DistinctResolver, EquivalenceResolver, FiniteStateMachine, FnResolver,
    MachineSnapshot, PendingQuestion, Resolution, SharedMachine, StateId, StepReport, Transition,
};
pub use regex::{Node, Operator, RegularExpression};
