//! Runtime semantics: enabledness, conflicts and the concurrent step.
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::random::Chooser;
use crate::net::structure::{Marking, NetDefinition, Tokens};

/// The pre-mutation check of a firing set found too few tokens. The marking
/// is left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("firing set needs {required} token(s) from {place} but only {available} present")]
pub struct StepIntegrityError {
    pub place: PlaceId,
    pub available: Tokens,
    pub required: Tokens,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("marking has {found} places, net has {expected}")]
    MarkingLength { expected: usize, found: usize },
    #[error("firing could not be completed: {0}")]
    Integrity(#[from] StepIntegrityError),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The transitions fired together, in pick order.
    Fired(Vec<TransitionId>),
    /// Nothing was enabled; the marking is unchanged.
    Blocked,
}

impl StepOutcome {
    pub fn fired(&self) -> &[TransitionId] {
        match self {
            StepOutcome::Fired(set) => set,
            StepOutcome::Blocked => &[],
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, StepOutcome::Blocked)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Fired(set) => {
                write!(f, "fired transitions: [{}]", set.iter().join(", "))
            }
            StepOutcome::Blocked => f.write_str("no enabled transitions, the net is blocked"),
        }
    }
}

impl NetDefinition {
    /// `marking[p] >= W_in[t][p]` for every place. Out-of-range transitions
    /// and markings of the wrong length never enable anything.
    pub fn is_enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        if transition.index() >= self.transitions() || marking.len() != self.places() {
            return false;
        }
        self.w_in()
            .row(transition)
            .iter()
            .zip(marking.as_slice())
            .all(|(&needed, &tokens)| tokens >= Tokens::from(needed))
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        self.transition_ids()
            .filter(|&t| self.is_enabled(marking, t))
            .collect()
    }

    /// Two transitions conflict when they consume from a common place.
    pub fn conflicts(&self, a: TransitionId, b: TransitionId) -> bool {
        self.w_in().rows_overlap(a, b)
    }

    /// Greedy maximal independent set over the conflict graph of the
    /// currently enabled transitions.
    ///
    /// Repeatedly picks one remaining transition through `chooser`, keeps it
    /// and drops it together with everything it conflicts with. The result
    /// cannot be extended, but it is not necessarily the largest possible
    /// conflict-free set; that depends on the pick order.
    pub fn select_firing_set<C>(
        &self,
        marking: &Marking,
        chooser: &mut C,
    ) -> Result<Vec<TransitionId>, FireError>
    where
        C: Chooser + ?Sized,
    {
        self.check_marking_len(marking)?;
        let mut available = self.enabled_transitions(marking);
        let mut firing = Vec::with_capacity(available.len());

        while !available.is_empty() {
            let picked = available[chooser.pick(available.len())];
            firing.push(picked);
            available.retain(|&other| other != picked && !self.conflicts(picked, other));
            log::trace!("picked {picked}, {} candidate(s) left", available.len());
        }

        Ok(firing)
    }

    /// Applies a set of transitions as one transaction.
    ///
    /// Consumption is summed and checked against the marking before anything
    /// is written. Production saturates at the marking's capacity: tokens
    /// beyond it are dropped, not reported.
    pub fn fire_transitions(
        &self,
        marking: &mut Marking,
        firing: &[TransitionId],
    ) -> Result<(), FireError> {
        self.check_marking_len(marking)?;
        if let Some(&t) = firing.iter().find(|t| t.index() >= self.transitions()) {
            return Err(FireError::OutOfBounds(t));
        }

        let required = self.arc_totals(firing, |t, p| self.w_in().get(t, p));
        let produced = self.arc_totals(firing, |t, p| self.w_out().get(t, p));

        for (place, &needed) in required.iter_enumerated() {
            let available = marking.tokens(place);
            if available < needed {
                return Err(StepIntegrityError {
                    place,
                    available,
                    required: needed,
                }
                .into());
            }
        }

        let capacity = marking.capacity();
        for (place, tokens) in marking.tokens_mut().iter_mut().enumerate() {
            let place = PlaceId::from_usize(place);
            let after_consume = *tokens - required[place];
            *tokens = after_consume.saturating_add(produced[place]).min(capacity);
        }
        Ok(())
    }

    /// One concurrent step: select a maximal conflict-free set among the
    /// enabled transitions and fire it atomically.
    pub fn step<C>(&self, marking: &mut Marking, chooser: &mut C) -> Result<StepOutcome, FireError>
    where
        C: Chooser + ?Sized,
    {
        let firing = self.select_firing_set(marking, chooser)?;
        if firing.is_empty() {
            log::debug!("step: net is blocked");
            return Ok(StepOutcome::Blocked);
        }
        self.fire_transitions(marking, &firing)?;
        log::debug!("step: fired [{}]", firing.iter().join(", "));
        Ok(StepOutcome::Fired(firing))
    }

    fn check_marking_len(&self, marking: &Marking) -> Result<(), FireError> {
        if marking.len() != self.places() {
            return Err(FireError::MarkingLength {
                expected: self.places(),
                found: marking.len(),
            });
        }
        Ok(())
    }

    fn arc_totals(
        &self,
        firing: &[TransitionId],
        arc: impl Fn(TransitionId, PlaceId) -> bool,
    ) -> IndexVec<PlaceId, Tokens> {
        IndexVec::from_fn(self.places(), |place| {
            firing.iter().filter(|&&t| arc(t, place)).count() as Tokens
        })
    }
}
