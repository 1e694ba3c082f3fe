//! Plain data exchanged with callers: states, transitions, snapshots.

use serde::{Deserialize, Serialize};

use crate::error::{FsmError, Result};
use crate::regex::RegularExpression;

/// Dense state index; state 0 is the initial state.
pub type StateId = usize;

/// Expressions known to denote the same state.
#[derive(Debug, Clone)]
pub struct StateGroup {
    pub id: StateId,
    /// The expression this state is derived from.
    pub representative: RegularExpression,
    /// Further expressions folded into this state.
    pub aliases: Vec<RegularExpression>,
    pub accepting: bool,
}

impl StateGroup {
    pub fn new(id: StateId, representative: RegularExpression, accepting: bool) -> Self {
        Self {
            id,
            representative,
            aliases: Vec::new(),
            accepting,
        }
    }

    /// Representative first, then aliases.
    pub fn members(&self) -> impl Iterator<Item = &RegularExpression> {
        std::iter::once(&self.representative).chain(self.aliases.iter())
    }
}

/// All letters leading from one state to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: StateId,
    pub letters: Vec<char>,
    pub to: StateId,
}

/// Remaining construction work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub remaining_to_label: usize,
    pub remaining_to_derive: usize,
    /// Transitions waiting for their target expression to be labelled.
    pub pending_transitions: usize,
}

impl Progress {
    pub fn is_finished(&self) -> bool {
        self.remaining_to_label == 0 && self.remaining_to_derive == 0
    }
}

/// One state as shown to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    pub id: StateId,
    pub expression: String,
    pub accepting: bool,
}

/// Consistent copy of a machine's current data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub expression: String,
    pub alphabet: Vec<char>,
    pub states: Vec<StateView>,
    pub accepting: Vec<StateId>,
    pub transitions: Vec<Transition>,
    pub progress: Progress,
    pub finished: bool,
}

impl MachineSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| FsmError::SerializeError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_members_order() {
        let mut group = StateGroup::new(0, RegularExpression::unevaluated("a"), false);
        group.aliases.push(RegularExpression::unevaluated("(a)"));
        let inputs: Vec<&str> = group.members().map(|m| m.input()).collect();
        assert_eq!(inputs, vec!["a", "(a)"]);
    }

    #[test]
    fn test_snapshot_json() {
        let snapshot = MachineSnapshot {
            expression: "a^*".to_string(),
            alphabet: vec!['a'],
            states: vec![StateView {
                id: 0,
                expression: "a^*".to_string(),
                accepting: true,
            }],
            accepting: vec![0],
            transitions: vec![Transition {
                from: 0,
                letters: vec!['a'],
                to: 0,
            }],
            progress: Progress::default(),
            finished: true,
        };
        let json = snapshot.to_json().unwrap();
        let back: MachineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.progress.is_finished());
    }
}
