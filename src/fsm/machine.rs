//! `FiniteStateMachine`: construction driver plus word evaluation.

use tracing::{debug, trace};

use super::construction::{Construction, StepOutcome};
use super::resolver::{DistinctResolver, EquivalenceResolver, PendingQuestion};
use super::types::{MachineSnapshot, Progress, StateId, StateView, Transition};
use crate::config::{Config, ConstructionConfig};
use crate::error::{FsmError, Result};
use crate::regex::RegularExpression;

/// Outcome of [`FiniteStateMachine::construct_step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepReport {
    /// Work was done and more remains.
    Progressed { steps: usize },
    /// Ask mode hit an expression it could not label on its own.
    AwaitingResolution(PendingQuestion),
    Finished,
}

/// A word being traced through the finished machine.
#[derive(Debug, Clone)]
struct Evaluation {
    word: Vec<char>,
    position: usize,
    /// `None` once a letter led nowhere.
    current: Option<StateId>,
}

#[derive(Debug, Clone)]
pub struct FiniteStateMachine {
    expression: RegularExpression,
    construction: Construction,
    config: ConstructionConfig,
    evaluation: Option<Evaluation>,
}

impl FiniteStateMachine {
    /// Machine for `text` with the default configuration.
    pub fn new(text: &str) -> Result<Self> {
        Self::with_config(text, &Config::default())
    }

    pub fn with_config(text: &str, config: &Config) -> Result<Self> {
        let expression = RegularExpression::new(text)?;
        debug!(input = %text, canonical = %expression, "machine created");
        Ok(Self::from_expression(expression, config.construction.clone()))
    }

    pub fn from_expression(expression: RegularExpression, config: ConstructionConfig) -> Self {
        let construction = Construction::new(expression.clone(), config.max_states);
        Self {
            expression,
            construction,
            config,
            evaluation: None,
        }
    }

    pub fn expression(&self) -> &RegularExpression {
        &self.expression
    }

    pub fn config(&self) -> &ConstructionConfig {
        &self.config
    }

    pub(crate) fn construction(&self) -> &Construction {
        &self.construction
    }

    pub(crate) fn construction_mut(&mut self) -> &mut Construction {
        &mut self.construction
    }

    // ─── Construction ────────────────────────────────────────────

    /// Run up to `max_steps` construction steps.
    ///
    /// With `confident` unset, an expression that matches no state pauses the
    /// construction until [`resolve_pending_label`](Self::resolve_pending_label).
    pub fn construct_step(&mut self, max_steps: usize, confident: bool) -> Result<StepReport> {
        let mut steps = 0;
        while steps < max_steps {
            match self.construction.step(confident)? {
                StepOutcome::Finished => break,
                StepOutcome::Uncertain => return self.awaiting_report(),
                StepOutcome::Labelled(_) | StepOutcome::Derived(_) => steps += 1,
            }
        }
        trace!(steps, "construction steps done");
        if self.construction.is_finished() {
            Ok(StepReport::Finished)
        } else {
            Ok(StepReport::Progressed { steps })
        }
    }

    fn awaiting_report(&self) -> Result<StepReport> {
        match self.construction.pending_question()? {
            Some(question) => Ok(StepReport::AwaitingResolution(question)),
            None => Err(FsmError::invariant("paused without a pending question")),
        }
    }

    /// Build to completion in ask mode, answering every pause with `resolver`.
    pub fn construct_all(&mut self, resolver: &mut dyn EquivalenceResolver) -> Result<()> {
        let batch = self.config.step_batch.max(1);
        loop {
            match self.construct_step(batch, false)? {
                StepReport::Finished => return Ok(()),
                StepReport::Progressed { .. } => {}
                StepReport::AwaitingResolution(question) => {
                    let choice = resolver.resolve(&question);
                    debug!(expression = %question.expression, ?choice, "resolved label");
                    self.resolve_pending_label(choice.into())?;
                }
            }
        }
    }

    /// Build to completion following the configured mode.
    pub fn construct(&mut self) -> Result<()> {
        if !self.config.confident {
            return self.construct_all(&mut DistinctResolver);
        }
        let batch = self.config.step_batch.max(1);
        while self.construct_step(batch, true)? != StepReport::Finished {}
        Ok(())
    }

    pub fn is_construction_finished(&self) -> bool {
        self.construction.is_finished()
    }

    /// See [`Construction::resolve_pending_label`].
    pub fn resolve_pending_label(&mut self, choice: Option<StateId>) -> Result<StateId> {
        self.construction.resolve_pending_label(choice)
    }

    pub fn pending_question(&self) -> Result<Option<PendingQuestion>> {
        self.construction.pending_question()
    }

    // ─── Snapshots ───────────────────────────────────────────────

    /// Canonical representative of each state, by id.
    pub fn states(&self) -> Vec<String> {
        self.construction
            .groups()
            .iter()
            .map(|g| g.representative.to_string())
            .collect()
    }

    pub fn accepting_states(&self) -> Vec<StateId> {
        self.construction
            .groups()
            .iter()
            .filter(|g| g.accepting)
            .map(|g| g.id)
            .collect()
    }

    pub fn transitions(&self) -> Vec<Transition> {
        self.construction.transitions()
    }

    pub fn progress(&self) -> Progress {
        self.construction.progress()
    }

    pub fn snapshot(&self) -> Result<MachineSnapshot> {
        Ok(MachineSnapshot {
            expression: self.expression.canonical()?.to_string(),
            alphabet: self.expression.alphabet()?.to_vec(),
            states: self
                .construction
                .groups()
                .iter()
                .map(|g| StateView {
                    id: g.id,
                    expression: g.representative.to_string(),
                    accepting: g.accepting,
                })
                .collect(),
            accepting: self.accepting_states(),
            transitions: self.transitions(),
            progress: self.progress(),
            finished: self.is_construction_finished(),
        })
    }

    // ─── Word evaluation ─────────────────────────────────────────

    /// Start tracing `word` from state 0. Requires a finished construction.
    pub fn begin_evaluation(&mut self, word: &str) -> Result<()> {
        if !self.construction.is_finished() {
            return Err(FsmError::InvalidArgument(
                "construction must finish before evaluating words".to_string(),
            ));
        }
        self.evaluation = Some(Evaluation {
            word: word.chars().collect(),
            position: 0,
            current: Some(0),
        });
        Ok(())
    }

    /// Consume one letter. Returns `false` when there was nothing left to do.
    pub fn evaluate_step(&mut self) -> Result<bool> {
        let Some(evaluation) = self.evaluation.as_mut() else {
            return Err(FsmError::InvalidArgument(
                "no evaluation in progress".to_string(),
            ));
        };
        let (Some(state), Some(&letter)) = (evaluation.current, evaluation.word.get(evaluation.position))
        else {
            return Ok(false);
        };
        evaluation.current = self.construction.target(state, letter);
        evaluation.position += 1;
        trace!(from = state, %letter, to = ?evaluation.current, "evaluation step");
        Ok(true)
    }

    /// True when the word is consumed or the trace has died.
    pub fn is_evaluation_finished(&self) -> bool {
        match &self.evaluation {
            Some(e) => e.current.is_none() || e.position >= e.word.len(),
            None => true,
        }
    }

    /// Current state of the trace; -1 when dead or not evaluating.
    pub fn current_state_id(&self) -> i64 {
        self.evaluation
            .as_ref()
            .and_then(|e| e.current)
            .map_or(-1, |id| id as i64)
    }

    /// Letters consumed so far.
    pub fn evaluation_position(&self) -> usize {
        self.evaluation.as_ref().map_or(0, |e| e.position)
    }

    pub fn is_accepting(&self) -> bool {
        let Some(current) = self.evaluation.as_ref().and_then(|e| e.current) else {
            return false;
        };
        self.construction
            .groups()
            .get(current)
            .map_or(false, |g| g.accepting)
    }

    /// Trace the whole word and report acceptance.
    pub fn accepts(&mut self, word: &str) -> Result<bool> {
        self.begin_evaluation(word)?;
        while self.evaluate_step()? {}
        Ok(self.is_evaluation_finished() && self.is_accepting())
    }
}
