//! Shared machine session for multi-threaded drivers.
//!
//! Labelling is cheap and runs under the lock. Derivation is the expensive
//! part: `advance` clones the representative under the lock, derives it with
//! the lock released, and commits only if nothing else touched the session
//! meanwhile. Otherwise the work is dropped and [`Advance::Discarded`] is
//! returned; the caller may simply advance again.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};
use uuid::Uuid;

use super::construction::{derive_all, Derivatives, StepOutcome};
use super::machine::FiniteStateMachine;
use super::resolver::PendingQuestion;
use super::types::{MachineSnapshot, StateId};
use crate::error::{FsmError, Result};
use crate::regex::RegularExpression;

/// Outcome of [`SharedMachine::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Progressed { steps: usize },
    AwaitingResolution(PendingQuestion),
    Finished,
    /// The session was restarted, aborted or advanced by another caller
    /// while a derivation was in flight.
    Discarded,
}

struct Session {
    id: Uuid,
    machine: FiniteStateMachine,
}

/// Derivation work handed out under the lock.
struct Ticket {
    session: Uuid,
    generation: u64,
    state: StateId,
}

enum Planned {
    Labelled,
    Uncertain(PendingQuestion),
    Finished,
    Derive(Ticket, RegularExpression),
}

#[derive(Clone)]
pub struct SharedMachine {
    inner: Arc<Mutex<Session>>,
}

impl SharedMachine {
    pub fn new(machine: FiniteStateMachine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Session {
                id: Uuid::new_v4(),
                machine,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.inner
            .lock()
            .map_err(|e| FsmError::invariant(format!("lock error: {}", e)))
    }

    pub fn session_id(&self) -> Result<Uuid> {
        Ok(self.lock()?.id)
    }

    /// Run up to `max_steps` construction steps.
    pub fn advance(&self, max_steps: usize, confident: bool) -> Result<Advance> {
        let mut steps = 0;
        while steps < max_steps {
            let (ticket, representative) = match self.plan(confident)? {
                Planned::Labelled => {
                    steps += 1;
                    continue;
                }
                Planned::Uncertain(question) => return Ok(Advance::AwaitingResolution(question)),
                Planned::Finished => break,
                Planned::Derive(ticket, representative) => (ticket, representative),
            };

            let derived = derive_all(&representative)?;
            if !self.commit(ticket, derived)? {
                return Ok(Advance::Discarded);
            }
            steps += 1;
        }

        if self.lock()?.machine.is_construction_finished() {
            Ok(Advance::Finished)
        } else {
            Ok(Advance::Progressed { steps })
        }
    }

    /// Under the lock: label if possible, otherwise hand out the next derivation.
    fn plan(&self, confident: bool) -> Result<Planned> {
        let mut session = self.lock()?;
        let id = session.id;
        let construction = session.machine.construction_mut();
        if construction.progress().remaining_to_label > 0 {
            return match construction.label_step(confident)? {
                StepOutcome::Uncertain => match construction.pending_question()? {
                    Some(question) => Ok(Planned::Uncertain(question)),
                    None => Err(FsmError::invariant("paused without a pending question")),
                },
                _ => Ok(Planned::Labelled),
            };
        }
        match construction.next_derivation() {
            Some((state, representative)) => Ok(Planned::Derive(
                Ticket {
                    session: id,
                    generation: construction.generation(),
                    state,
                },
                representative,
            )),
            None => Ok(Planned::Finished),
        }
    }

    /// Re-lock and apply `derived` if the ticket is still current.
    fn commit(&self, ticket: Ticket, derived: Derivatives) -> Result<bool> {
        let mut session = self.lock()?;
        let current = session.machine.construction().generation();
        if session.id != ticket.session || current != ticket.generation {
            warn!(
                state = ticket.state,
                session = %ticket.session,
                "discarding stale derivation"
            );
            return Ok(false);
        }
        session
            .machine
            .construction_mut()
            .apply_derivation(ticket.state, derived)?;
        Ok(true)
    }

    pub fn resolve_pending_label(&self, choice: Option<StateId>) -> Result<StateId> {
        self.lock()?.machine.resolve_pending_label(choice)
    }

    /// Replace the machine with a fresh one for `text`, keeping the configuration.
    pub fn restart(&self, text: &str) -> Result<Uuid> {
        let mut session = self.lock()?;
        let config = session.machine.config().clone();
        let expression = RegularExpression::new(text)?;
        session.machine = FiniteStateMachine::from_expression(expression, config);
        session.id = Uuid::new_v4();
        debug!(session = %session.id, input = %text, "session restarted");
        Ok(session.id)
    }

    /// Invalidate in-flight derivations without touching the machine.
    pub fn abort(&self) -> Result<Uuid> {
        let mut session = self.lock()?;
        session.id = Uuid::new_v4();
        debug!(session = %session.id, "session aborted");
        Ok(session.id)
    }

    pub fn snapshot(&self) -> Result<MachineSnapshot> {
        self.lock()?.machine.snapshot()
    }

    /// Run `f` against the machine under the lock.
    pub fn with_machine<R>(&self, f: impl FnOnce(&mut FiniteStateMachine) -> R) -> Result<R> {
        Ok(f(&mut self.lock()?.machine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn shared(text: &str) -> SharedMachine {
        SharedMachine::new(FiniteStateMachine::new(text).unwrap())
    }

    fn ticket_for(machine: &SharedMachine) -> (Ticket, RegularExpression) {
        // label state 0, then take the derivation of state 0
        assert!(matches!(machine.plan(true).unwrap(), Planned::Labelled));
        match machine.plan(true).unwrap() {
            Planned::Derive(ticket, representative) => (ticket, representative),
            _ => panic!("expected a derivation"),
        }
    }

    #[test]
    fn test_advance_to_completion() {
        let machine = shared("(a+b)^*abb");
        let mut rounds = 0;
        while machine.advance(3, true).unwrap() != Advance::Finished {
            rounds += 1;
            assert!(rounds < 100);
        }
        let snapshot = machine.snapshot().unwrap();
        assert!(snapshot.finished);
        assert_eq!(snapshot.states.len(), 4);
    }

    #[test]
    fn test_abort_discards_in_flight_derivation() {
        let machine = shared("ab");
        let (ticket, representative) = ticket_for(&machine);
        let derived = derive_all(&representative).unwrap();

        machine.abort().unwrap();
        assert!(!machine.commit(ticket, derived).unwrap());
        assert_eq!(machine.snapshot().unwrap().progress.remaining_to_derive, 1);
    }

    #[test]
    fn test_concurrent_commit_discards_second() {
        let machine = shared("ab");
        let (first, representative) = ticket_for(&machine);
        let second = Ticket {
            session: first.session,
            generation: first.generation,
            state: first.state,
        };
        let derived = derive_all(&representative).unwrap();

        assert!(machine.commit(first, derived.clone()).unwrap());
        assert!(!machine.commit(second, derived).unwrap());
    }

    #[test]
    fn test_restart_replaces_machine() {
        let machine = shared("ab");
        let before = machine.session_id().unwrap();
        machine.advance(10, true).unwrap();
        let after = machine.restart("a^*").unwrap();
        assert_ne!(before, after);
        let snapshot = machine.snapshot().unwrap();
        assert_eq!(snapshot.expression, "a^*");
        assert!(!snapshot.finished);
        assert!(machine.restart("a+").is_err());
    }

    #[test]
    fn test_ask_mode_through_session() {
        let machine = shared("(a)^+");
        let Advance::AwaitingResolution(question) = machine.advance(10, false).unwrap() else {
            panic!("expected a pause");
        };
        assert_eq!(question.candidates.len(), 1);
        machine.resolve_pending_label(None).unwrap();
        assert_eq!(machine.advance(10, false).unwrap(), Advance::Finished);
    }

    #[test]
    fn test_threads_share_one_construction() {
        let machine = shared("(0+1)^*1(0+1)");
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let machine = machine.clone();
                thread::spawn(move || loop {
                    match machine.advance(1, true).unwrap() {
                        Advance::Finished => break,
                        _ => continue,
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let accepts = machine
            .with_machine(|m| m.accepts("0110").unwrap())
            .unwrap();
        assert!(accepts);
        assert!(machine
            .with_machine(|m| !m.accepts("0100").unwrap())
            .unwrap());
    }
}
