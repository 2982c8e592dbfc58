//! The live simulation state: one net, one marking, one random source.
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::net::io::NetSnapshot;
use crate::net::random::{self, Chooser};
use crate::net::text::{self, FormatError};
use crate::net::{
    DimensionMismatchError, FireError, Marking, NetDefinition, StepOutcome, StructureError, Tokens,
    TransitionId,
};
use crate::observer::{StateEvent, StateObserver};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Dimensions(#[from] DimensionMismatchError),
    #[error(transparent)]
    Fire(#[from] FireError),
    #[error("snapshot has MAX_TOKENS = {found}, the simulation runs with {expected}")]
    Capacity { expected: Tokens, found: Tokens },
}

/// Owns the only live [`NetDefinition`] and [`Marking`].
///
/// Every mutation is all-or-nothing: on error the previous state is kept.
/// Observers are told about each successful mutation.
pub struct Simulation<C = StdRng> {
    net: NetDefinition,
    marking: Marking,
    chooser: C,
    observers: Vec<Box<dyn StateObserver>>,
}

impl Simulation<StdRng> {
    /// Random net and marking from a seeded `StdRng`, or from OS entropy
    /// when no seed is given.
    pub fn seeded(
        places: usize,
        transitions: usize,
        capacity: Tokens,
        seed: Option<u64>,
    ) -> Result<Self, SimError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::random(places, transitions, capacity, rng)
    }
}

impl<C> Simulation<C>
where
    C: Chooser,
{
    pub fn new(net: NetDefinition, marking: Marking, chooser: C) -> Result<Self, SimError> {
        net.check_marking(&marking)?;
        Ok(Self {
            net,
            marking,
            chooser,
            observers: Vec::new(),
        })
    }

    pub fn random(
        places: usize,
        transitions: usize,
        capacity: Tokens,
        mut chooser: C,
    ) -> Result<Self, SimError> {
        let net = random::random_topology(places, transitions, &mut chooser)?;
        let marking = random::random_marking(places, capacity, &mut chooser)?;
        Self::new(net, marking, chooser)
    }

    pub fn with_observer(mut self, observer: impl StateObserver + 'static) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&mut self, observer: impl StateObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn net(&self) -> &NetDefinition {
        &self.net
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn capacity(&self) -> Tokens {
        self.marking.capacity()
    }

    pub fn is_enabled(&self, transition: TransitionId) -> bool {
        self.net.is_enabled(&self.marking, transition)
    }

    pub fn enabled_transitions(&self) -> Vec<TransitionId> {
        self.net.enabled_transitions(&self.marking)
    }

    /// Fires one maximal conflict-free set of enabled transitions.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        let outcome = self.net.step(&mut self.marking, &mut self.chooser)?;
        self.notify(&format!("after step: {outcome}"));
        Ok(outcome)
    }

    /// Replaces the topology with a fresh random one of the same size. The
    /// marking is kept.
    pub fn regenerate_net(&mut self) -> Result<(), SimError> {
        let net = random::random_topology(
            self.net.places(),
            self.net.transitions(),
            &mut self.chooser,
        )?;
        self.net = net;
        log::info!("generated a new random net");
        self.notify("after generating a random net");
        Ok(())
    }

    pub fn regenerate_marking(&mut self) -> Result<(), SimError> {
        let marking =
            random::random_marking(self.net.places(), self.capacity(), &mut self.chooser)?;
        self.marking = marking;
        log::info!("generated a new random marking");
        self.notify("after generating a random marking");
        Ok(())
    }

    /// Bulk edit: proposes a complete new marking and both matrices at the
    /// live dimensions. Nothing changes unless all of it validates.
    pub fn propose(
        &mut self,
        marking: Vec<Tokens>,
        w_in: &[Vec<u8>],
        w_out: &[Vec<u8>],
    ) -> Result<(), SimError> {
        let net = NetDefinition::new(self.net.places(), self.net.transitions(), w_in, w_out)?;
        let marking = Marking::new(marking, self.capacity())?;
        net.check_marking(&marking)?;
        self.commit(net, marking, "after editing the net");
        Ok(())
    }

    /// Loads the text format at the live dimensions and capacity.
    pub fn load_text(&mut self, input: &str) -> Result<(), SimError> {
        let (net, marking) = text::parse(
            input,
            self.net.places(),
            self.net.transitions(),
            self.capacity(),
        )?;
        self.commit(net, marking, "after loading from text");
        Ok(())
    }

    /// Loads a snapshot whose `(P, T)` and `MAX_TOKENS` must equal the live
    /// ones.
    pub fn load_snapshot(&mut self, snapshot: NetSnapshot) -> Result<(), SimError> {
        self.net
            .check_dimensions(snapshot.places, snapshot.transitions)?;
        if snapshot.max_tokens != self.capacity() {
            return Err(SimError::Capacity {
                expected: self.capacity(),
                found: snapshot.max_tokens,
            });
        }
        let (net, marking) = snapshot.into_parts()?;
        self.commit(net, marking, "after loading a snapshot");
        Ok(())
    }

    pub fn snapshot(&self) -> NetSnapshot {
        NetSnapshot::capture(&self.net, &self.marking)
    }

    pub fn to_text(&self) -> String {
        text::format(&self.net, &self.marking)
    }

    fn commit(&mut self, net: NetDefinition, marking: Marking, label: &str) {
        log::info!(
            "replacing state: P={}, T={}",
            net.places(),
            net.transitions()
        );
        self.net = net;
        self.marking = marking;
        self.notify(label);
    }

    fn notify(&mut self, label: &str) {
        let event = StateEvent {
            label,
            net: &self.net,
            marking: &self.marking,
        };
        for observer in self.observers.iter_mut() {
            if let Err(err) = observer.notify(&event) {
                log::warn!("state observer failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    use super::*;
    use crate::net::MAX_TOKENS;
    use crate::net::random::ScriptedChooser;

    fn single_arc(marking: Vec<Tokens>) -> Simulation<ScriptedChooser> {
        let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
        let marking = Marking::new(marking, MAX_TOKENS).unwrap();
        Simulation::new(net, marking, ScriptedChooser::default()).unwrap()
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl StateObserver + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let observer = move |event: &StateEvent<'_>| -> io::Result<()> {
            sink.borrow_mut().push(event.label.to_string());
            Ok(())
        };
        (seen, observer)
    }

    #[test]
    fn step_fires_and_notifies() {
        let (seen, observer) = recorder();
        let mut sim = single_arc(vec![1, 0]).with_observer(observer);
        let outcome = sim.step().unwrap();
        assert_eq!(outcome.fired(), &[TransitionId::new(0)]);
        assert_eq!(sim.marking().to_vec(), vec![0, 1]);

        let outcome = sim.step().unwrap();
        assert!(outcome.is_blocked());
        assert_eq!(sim.marking().to_vec(), vec![0, 1]);
        assert_eq!(seen.borrow().len(), 2);
        assert!(seen.borrow()[1].contains("blocked"));
    }

    #[test]
    fn failing_observer_does_not_abort_step() {
        let mut sim = single_arc(vec![1, 0])
            .with_observer(|_: &StateEvent<'_>| -> io::Result<()> {
                Err(io::Error::other("disk full"))
            });
        assert!(sim.step().is_ok());
        assert_eq!(sim.marking().to_vec(), vec![0, 1]);
    }

    #[test]
    fn rejected_edit_keeps_previous_state() {
        let (seen, observer) = recorder();
        let mut sim = single_arc(vec![1, 0]).with_observer(observer);
        let before = (sim.net().clone(), sim.marking().clone());

        let err = sim.propose(vec![1, 1], &[vec![0, 0]], &[vec![0, 1]]).unwrap_err();
        assert!(matches!(err, SimError::Structure(StructureError::Disconnected { .. })));
        let err = sim.propose(vec![4, 0], &[vec![1, 1]], &[vec![0, 1]]).unwrap_err();
        assert!(matches!(err, SimError::Structure(StructureError::TokenRange { .. })));
        assert_eq!((sim.net().clone(), sim.marking().clone()), before);
        assert!(sim.load_text("M: 0 1 2\n").is_err());
        assert!(seen.borrow().is_empty());

        sim.propose(vec![2, 2], &[vec![1, 1]], &[vec![1, 0]]).unwrap();
        assert_eq!(sim.marking().to_vec(), vec![2, 2]);
        assert_eq!(sim.net().w_in().to_rows(), vec![vec![1, 1]]);
        assert_eq!(*seen.borrow(), vec!["after editing the net".to_string()]);
    }

    #[test]
    fn failed_parse_keeps_previous_state() {
        let mut sim = single_arc(vec![1, 0]);
        let before = sim.to_text();
        let err = sim.load_text("M: 0 1 2\n").unwrap_err();
        assert!(matches!(err, SimError::Format(FormatError::MarkingCount { .. })));
        assert_eq!(sim.to_text(), before);

        let replacement = before.replace("M: 1 0", "M: 3 3");
        sim.load_text(&replacement).unwrap();
        assert_eq!(sim.marking().to_vec(), vec![3, 3]);
    }

    #[test]
    fn snapshot_dimensions_must_match() {
        let mut sim = single_arc(vec![1, 0]);
        let mut snapshot = sim.snapshot();
        snapshot.places = 3;
        let err = sim.load_snapshot(snapshot).unwrap_err();
        assert!(matches!(
            err,
            SimError::Dimensions(DimensionMismatchError {
                expected_places: 2,
                places: 3,
                ..
            })
        ));

        let mut snapshot = sim.snapshot();
        snapshot.marking = vec![0, 2];
        sim.load_snapshot(snapshot).unwrap();
        assert_eq!(sim.marking().to_vec(), vec![0, 2]);
    }

    #[test]
    fn snapshot_capacity_must_match() {
        let (seen, observer) = recorder();
        let mut sim = single_arc(vec![1, 0]).with_observer(observer);
        let mut snapshot = sim.snapshot();
        snapshot.max_tokens = 9;
        snapshot.marking = vec![9, 0];
        let err = sim.load_snapshot(snapshot).unwrap_err();
        assert!(matches!(
            err,
            SimError::Capacity {
                expected: MAX_TOKENS,
                found: 9
            }
        ));
        assert_eq!(sim.capacity(), MAX_TOKENS);
        assert_eq!(sim.marking().to_vec(), vec![1, 0]);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn regeneration_keeps_dimensions() {
        let mut sim = Simulation::seeded(7, 5, MAX_TOKENS, Some(11)).unwrap();
        sim.regenerate_net().unwrap();
        sim.regenerate_marking().unwrap();
        assert_eq!(sim.net().places(), 7);
        assert_eq!(sim.net().transitions(), 5);
        assert!(sim.marking().as_slice().iter().all(|&v| v <= MAX_TOKENS));
    }

    #[test]
    fn mismatched_pairing_is_rejected() {
        let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
        let marking = Marking::new(vec![0, 0, 0], MAX_TOKENS).unwrap();
        assert!(Simulation::new(net, marking, ScriptedChooser::default()).is_err());
    }
}
