//! Deciding equivalences that syntactic comparison could not settle.
//!
//! When a pending expression matches no state syntactically, it may still
//! denote a state already built. In ask mode construction pauses with a
//! [`PendingQuestion`] and an [`EquivalenceResolver`] answers it.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::{StateGroup, StateId};
use crate::error::Result;
use crate::regex::RegularExpression;

/// An existing state offered as a merge target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub state: StateId,
    pub expression: String,
    /// Advisory score in `[0, 1]`.
    pub similarity: f64,
}

/// The expression awaiting a label, with candidates best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub expression: String,
    pub candidates: Vec<Candidate>,
}

impl PendingQuestion {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// Answer to a [`PendingQuestion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The expression denotes this existing state.
    SameAs(StateId),
    /// The expression gets a state of its own.
    NewState,
}

impl From<Resolution> for Option<StateId> {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::SameAs(id) => Some(id),
            Resolution::NewState => None,
        }
    }
}

pub trait EquivalenceResolver {
    fn resolve(&mut self, question: &PendingQuestion) -> Resolution;
}

/// Always answers [`Resolution::NewState`].
///
/// Never merges expressions that are not known to be equal, so the machine
/// stays correct, though possibly larger than minimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistinctResolver;

impl EquivalenceResolver for DistinctResolver {
    fn resolve(&mut self, _question: &PendingQuestion) -> Resolution {
        Resolution::NewState
    }
}

/// Adapts a closure.
pub struct FnResolver<F>(pub F);

impl<F> EquivalenceResolver for FnResolver<F>
where
    F: FnMut(&PendingQuestion) -> Resolution,
{
    fn resolve(&mut self, question: &PendingQuestion) -> Resolution {
        (self.0)(question)
    }
}

/// Score every state against `expression`, best first (ties by id).
pub fn rank_candidates(
    expression: &RegularExpression,
    groups: &[StateGroup],
) -> Result<Vec<Candidate>> {
    let mut candidates: Vec<Candidate> = groups
        .par_iter()
        .map(|group| -> Result<Candidate> {
            Ok(Candidate {
                state: group.id,
                expression: group.representative.to_string(),
                similarity: expression.similarity(&group.representative)?,
            })
        })
        .collect::<Result<_>>()?;
    candidates.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.state.cmp(&b.state))
    });
    Ok(candidates)
}
