//! Incremental state construction.
//!
//! Two worklists drive the build. Unlabelled expressions wait to be matched
//! against existing states (or to become new states); each carries the
//! transitions that point at it. Labelled states wait to be derived by every
//! letter of their alphabet.
//!
//! Every step is planned against `&self` first and committed afterwards. Only
//! planning can fail, so an error leaves the construction untouched.

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;
use tracing::{debug, info};

use super::resolver::{rank_candidates, PendingQuestion};
use super::types::{Progress, StateGroup, StateId, Transition};
use crate::error::{FsmError, Result};
use crate::regex::RegularExpression;

/// An expression reached by some transition but not yet assigned a state.
#[derive(Debug, Clone)]
struct PendingExpression {
    expression: RegularExpression,
    /// `(from, letter)` transitions that lead here.
    waiting: Vec<(StateId, char)>,
}

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The head expression now belongs to this state.
    Labelled(StateId),
    /// This state's outgoing transitions were computed.
    Derived(StateId),
    /// No syntactic match and ask mode is on; nothing changed.
    Uncertain,
    Finished,
}

/// Result of deriving one state by each letter, in alphabet order.
pub type Derivatives = Vec<(char, Option<RegularExpression>)>;

enum LabelPlan {
    Fold(StateId),
    Create { accepting: bool },
}

enum Target {
    State(StateId),
    /// Index into `unlabeled`.
    Pending(usize),
    /// Index into the expressions this step adds.
    Fresh(usize),
}

#[derive(Debug, Clone)]
pub struct Construction {
    groups: Vec<StateGroup>,
    edges: BTreeMap<(StateId, StateId), Vec<char>>,
    unlabeled: VecDeque<PendingExpression>,
    underived: VecDeque<StateId>,
    awaiting: bool,
    max_states: usize,
    generation: u64,
}

impl Construction {
    /// Start from `root`, which becomes state 0 on the first step.
    /// `max_states == 0` means no limit.
    pub fn new(root: RegularExpression, max_states: usize) -> Self {
        let mut unlabeled = VecDeque::new();
        unlabeled.push_back(PendingExpression {
            expression: root,
            waiting: Vec::new(),
        });
        Self {
            groups: Vec::new(),
            edges: BTreeMap::new(),
            unlabeled,
            underived: VecDeque::new(),
            awaiting: false,
            max_states,
            generation: 0,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub fn groups(&self) -> &[StateGroup] {
        &self.groups
    }

    pub fn is_finished(&self) -> bool {
        self.unlabeled.is_empty() && self.underived.is_empty()
    }

    /// True after an `Uncertain` step until the label is resolved.
    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Bumped by every committed step.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self) -> Progress {
        Progress {
            remaining_to_label: self.unlabeled.len(),
            remaining_to_derive: self.underived.len(),
            pending_transitions: self.unlabeled.iter().map(|p| p.waiting.len()).sum(),
        }
    }

    /// Transitions ordered by `(from, to)`.
    pub fn transitions(&self) -> Vec<Transition> {
        self.edges
            .iter()
            .map(|(&(from, to), letters)| Transition {
                from,
                letters: letters.clone(),
                to,
            })
            .collect()
    }

    /// Where `letter` leads from `from`, if anywhere.
    pub fn target(&self, from: StateId, letter: char) -> Option<StateId> {
        self.edges
            .range((from, 0)..=(from, StateId::MAX))
            .find(|(_, letters)| letters.contains(&letter))
            .map(|(&(_, to), _)| to)
    }

    /// The question behind the current pause, if paused.
    pub fn pending_question(&self) -> Result<Option<PendingQuestion>> {
        if !self.awaiting {
            return Ok(None);
        }
        let Some(head) = self.unlabeled.front() else {
            return Ok(None);
        };
        Ok(Some(PendingQuestion {
            expression: head.expression.to_string(),
            candidates: rank_candidates(&head.expression, &self.groups)?,
        }))
    }

    // ─── Steps ───────────────────────────────────────────────────

    /// Label the next expression if any, otherwise derive the next state.
    pub fn step(&mut self, confident: bool) -> Result<StepOutcome> {
        if !self.unlabeled.is_empty() {
            return self.label_step(confident);
        }
        match self.next_derivation() {
            Some((state, representative)) => {
                let derived = derive_all(&representative)?;
                self.apply_derivation(state, derived)?;
                Ok(StepOutcome::Derived(state))
            }
            None => Ok(StepOutcome::Finished),
        }
    }

    /// Match the head of the unlabelled queue against the existing states.
    pub fn label_step(&mut self, confident: bool) -> Result<StepOutcome> {
        let Some(head) = self.unlabeled.front() else {
            return Ok(StepOutcome::Finished);
        };

        let plan = match self.find_group(&head.expression)? {
            Some(id) => LabelPlan::Fold(id),
            // with no states yet there is nothing to ask about
            None if confident || self.groups.is_empty() => self.plan_create(&head.expression)?,
            None => {
                if !self.awaiting {
                    debug!(expression = %head.expression, "label uncertain, awaiting resolution");
                }
                self.awaiting = true;
                return Ok(StepOutcome::Uncertain);
            }
        };
        self.commit_label(plan).map(StepOutcome::Labelled)
    }

    /// Answer an `Uncertain` step: `Some(k)` folds the head into state `k`,
    /// `None` gives it a new state.
    pub fn resolve_pending_label(&mut self, choice: Option<StateId>) -> Result<StateId> {
        if !self.awaiting {
            return Err(FsmError::InvalidArgument(
                "no label is awaiting resolution".to_string(),
            ));
        }
        let Some(head) = self.unlabeled.front() else {
            return Err(FsmError::invariant("awaiting resolution with nothing to label"));
        };
        let plan = match choice {
            Some(id) if id < self.groups.len() => LabelPlan::Fold(id),
            Some(id) => {
                return Err(FsmError::InvalidArgument(format!(
                    "state {} does not exist ({} states)",
                    id,
                    self.groups.len()
                )))
            }
            None => self.plan_create(&head.expression)?,
        };
        self.commit_label(plan)
    }

    /// The next state to derive and its representative.
    pub fn next_derivation(&self) -> Option<(StateId, RegularExpression)> {
        let state = *self.underived.front()?;
        let group = self.groups.get(state)?;
        Some((state, group.representative.clone()))
    }

    /// Wire up the derivatives of `state`, which must head the derivation queue.
    pub fn apply_derivation(&mut self, state: StateId, derived: Derivatives) -> Result<()> {
        if self.underived.front() != Some(&state) {
            return Err(FsmError::invariant(format!(
                "state {} is not next in the derivation queue",
                state
            )));
        }

        let mut planned: Vec<(char, Target)> = Vec::new();
        let mut fresh: Vec<RegularExpression> = Vec::new();
        for (letter, expression) in derived {
            let Some(expression) = expression else {
                continue;
            };
            let target = if let Some(id) = self.find_group(&expression)? {
                Target::State(id)
            } else if let Some(i) = self.find_pending(&expression)? {
                Target::Pending(i)
            } else if let Some(j) = position_of(&fresh, &expression)? {
                Target::Fresh(j)
            } else {
                fresh.push(expression);
                Target::Fresh(fresh.len() - 1)
            };
            planned.push((letter, target));
        }

        // commit
        self.underived.pop_front();
        let base = self.unlabeled.len();
        let added = fresh.len();
        self.unlabeled
            .extend(fresh.into_iter().map(|expression| PendingExpression {
                expression,
                waiting: Vec::new(),
            }));
        for (letter, target) in planned {
            match target {
                Target::State(id) => self.add_edge(state, letter, id),
                Target::Pending(i) => self.unlabeled[i].waiting.push((state, letter)),
                Target::Fresh(j) => self.unlabeled[base + j].waiting.push((state, letter)),
            }
        }
        self.generation += 1;
        debug!(state, new_expressions = added, "derived state");
        self.log_if_finished();
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────

    fn plan_create(&self, expression: &RegularExpression) -> Result<LabelPlan> {
        if self.max_states > 0 && self.groups.len() >= self.max_states {
            return Err(FsmError::StateLimitExceeded(self.max_states));
        }
        Ok(LabelPlan::Create {
            accepting: expression.generates_empty_word()?,
        })
    }

    fn commit_label(&mut self, plan: LabelPlan) -> Result<StateId> {
        let Some(head) = self.unlabeled.pop_front() else {
            return Err(FsmError::invariant("label committed with nothing to label"));
        };
        let id = match plan {
            LabelPlan::Fold(id) => {
                let group = &mut self.groups[id];
                if !group.members().any(|m| m.input() == head.expression.input()) {
                    group.aliases.push(head.expression);
                }
                id
            }
            LabelPlan::Create { accepting } => {
                let id = self.groups.len();
                debug!(state = id, expression = %head.expression, accepting, "new state");
                self.groups
                    .push(StateGroup::new(id, head.expression, accepting));
                self.underived.push_back(id);
                id
            }
        };
        for (from, letter) in head.waiting {
            self.add_edge(from, letter, id);
        }
        self.awaiting = false;
        self.generation += 1;
        self.log_if_finished();
        Ok(id)
    }

    fn add_edge(&mut self, from: StateId, letter: char, to: StateId) {
        let letters = self.edges.entry((from, to)).or_default();
        if !letters.contains(&letter) {
            letters.push(letter);
        }
    }

    fn find_group(&self, expression: &RegularExpression) -> Result<Option<StateId>> {
        for group in &self.groups {
            for member in group.members() {
                if expression.equals(member)? {
                    return Ok(Some(group.id));
                }
            }
        }
        Ok(None)
    }

    fn find_pending(&self, expression: &RegularExpression) -> Result<Option<usize>> {
        for (i, pending) in self.unlabeled.iter().enumerate() {
            if expression.equals(&pending.expression)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    fn log_if_finished(&self) {
        if self.is_finished() {
            info!(
                states = self.groups.len(),
                transitions = self.edges.len(),
                "construction finished"
            );
        }
    }
}

fn position_of(list: &[RegularExpression], expression: &RegularExpression) -> Result<Option<usize>> {
    for (i, candidate) in list.iter().enumerate() {
        if expression.equals(candidate)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Derive `representative` by every letter of its alphabet, in parallel.
pub fn derive_all(representative: &RegularExpression) -> Result<Derivatives> {
    representative
        .alphabet()?
        .par_iter()
        .map(|&letter| -> Result<(char, Option<RegularExpression>)> {
            Ok((letter, representative.derive(letter)?))
        })
        .collect()
}
