//! Injectable randomness and the random instance generators.
use std::collections::VecDeque;

use rand::Rng;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::{IncidenceMatrix, MatrixKind};
use crate::net::index_vec::Idx;
use crate::net::structure::{Marking, NetDefinition, StructureError, Tokens};

/// Source of every random decision the simulator makes.
///
/// Any [`rand::Rng`] is a chooser; tests can script the sequence with
/// [`ScriptedChooser`].
pub trait Chooser {
    /// Uniform index in `0..n`. `n` is never zero.
    fn pick(&mut self, n: usize) -> usize;

    /// Fair coin.
    fn coin(&mut self) -> bool;
}

impl<R> Chooser for R
where
    R: Rng + ?Sized,
{
    fn pick(&mut self, n: usize) -> usize {
        self.random_range(0..n)
    }

    fn coin(&mut self) -> bool {
        self.random_bool(0.5)
    }
}

/// Replays fixed answers. Picks are reduced modulo `n`; once a queue runs
/// dry, picks return `0` and coins return `false`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChooser {
    picks: VecDeque<usize>,
    coins: VecDeque<bool>,
}

impl ScriptedChooser {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
            coins: VecDeque::new(),
        }
    }

    pub fn with_coins(mut self, coins: impl IntoIterator<Item = bool>) -> Self {
        self.coins.extend(coins);
        self
    }
}

impl Chooser for ScriptedChooser {
    fn pick(&mut self, n: usize) -> usize {
        self.picks.pop_front().map_or(0, |value| value % n.max(1))
    }

    fn coin(&mut self) -> bool {
        self.coins.pop_front().unwrap_or(false)
    }
}

/// Random ordinary net: each arc is a fair coin, and an all-zero row gets
/// one cell, chosen uniformly, set to `1`.
///
/// Rows are drawn transition by transition, `W_in` before `W_out`.
pub fn random_topology<C>(
    places: usize,
    transitions: usize,
    chooser: &mut C,
) -> Result<NetDefinition, StructureError>
where
    C: Chooser + ?Sized,
{
    if places == 0 || transitions == 0 {
        return Err(StructureError::EmptyNet {
            places,
            transitions,
        });
    }

    let mut w_in = IncidenceMatrix::from_fn(MatrixKind::Input, transitions, places, |_, _| false);
    let mut w_out =
        IncidenceMatrix::from_fn(MatrixKind::Output, transitions, places, |_, _| false);

    for t in (0..transitions).map(TransitionId::from_usize) {
        fill_row(&mut w_in, t, chooser);
        fill_row(&mut w_out, t, chooser);
    }

    NetDefinition::from_matrices(w_in, w_out)
}

fn fill_row<C>(matrix: &mut IncidenceMatrix, transition: TransitionId, chooser: &mut C)
where
    C: Chooser + ?Sized,
{
    let places = matrix.places();
    for p in (0..places).map(PlaceId::from_usize) {
        let cell = chooser.coin();
        matrix.set(transition, p, cell);
    }
    if matrix.row_sum(transition) == 0 {
        let forced = PlaceId::from_usize(chooser.pick(places));
        matrix.set(transition, forced, true);
    }
}

/// Uniform token count in `0..=capacity` for each place.
pub fn random_marking<C>(
    places: usize,
    capacity: Tokens,
    chooser: &mut C,
) -> Result<Marking, StructureError>
where
    C: Chooser + ?Sized,
{
    if places == 0 {
        return Err(StructureError::EmptyNet {
            places,
            transitions: 0,
        });
    }
    let tokens = (0..places)
        .map(|_| chooser.pick(capacity as usize + 1) as Tokens)
        .collect();
    Marking::new(tokens, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn all_tails_forces_one_cell_per_row() {
        // No coins scripted: every draw is 0, so each row is repaired with
        // the scripted pick.
        let mut chooser = ScriptedChooser::new([2, 0, 1, 1]);
        let net = random_topology(3, 2, &mut chooser).unwrap();
        assert_eq!(net.w_in().to_rows(), vec![vec![0, 0, 1], vec![0, 1, 0]]);
        assert_eq!(net.w_out().to_rows(), vec![vec![1, 0, 0], vec![0, 1, 0]]);
    }

    #[test]
    fn coins_are_kept_when_row_is_connected() {
        let mut chooser = ScriptedChooser::default().with_coins([true, false, false, true]);
        let net = random_topology(2, 1, &mut chooser).unwrap();
        assert_eq!(net.w_in().to_rows(), vec![vec![1, 0]]);
        assert_eq!(net.w_out().to_rows(), vec![vec![0, 1]]);
    }

    #[test]
    fn seeded_generation_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let net = random_topology(7, 5, &mut rng).unwrap();
            for t in net.transition_ids() {
                assert!(net.w_in().row_sum(t) >= 1);
                assert!(net.w_out().row_sum(t) >= 1);
            }
            let marking = random_marking(7, 3, &mut rng).unwrap();
            assert_eq!(marking.len(), 7);
            assert!(marking.as_slice().iter().all(|&v| v <= 3));
        }
    }

    #[test]
    fn same_seed_same_net() {
        let a = random_topology(6, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = random_topology(6, 4, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_dimensions_are_range_errors() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_topology(0, 3, &mut rng).is_err());
        assert!(random_topology(3, 0, &mut rng).is_err());
        assert!(random_marking(0, 3, &mut rng).is_err());
    }
}
