//! Static net topology and the bounded marking paired with it.
use std::fmt;

use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::{IncidenceMatrix, MatrixKind};
use crate::net::index_vec::{Idx, IndexVec};

pub type Tokens = u32;

/// Default place capacity.
pub const MAX_TOKENS: Tokens = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("a net needs at least one place and one transition, got P={places}, T={transitions}")]
    EmptyNet { places: usize, transitions: usize },
    #[error("{matrix} has {found} transition rows, expected {expected}")]
    RowCount {
        matrix: MatrixKind,
        expected: usize,
        found: usize,
    },
    #[error("{matrix} row {transition} has {found} values, expected {expected}")]
    RowLength {
        matrix: MatrixKind,
        transition: TransitionId,
        expected: usize,
        found: usize,
    },
    #[error("{matrix}[{transition}][{place}] must be 0 or 1 (ordinary net), found {value}")]
    NonBinary {
        matrix: MatrixKind,
        transition: TransitionId,
        place: PlaceId,
        value: u8,
    },
    #[error("transition {transition} is not connected to any place in {matrix}")]
    Disconnected {
        matrix: MatrixKind,
        transition: TransitionId,
    },
    #[error("marking has {found} values, expected {expected}")]
    MarkingLength { expected: usize, found: usize },
    #[error("marking of {place} must be in 0..={capacity}, found {value}")]
    TokenRange {
        place: PlaceId,
        value: Tokens,
        capacity: Tokens,
    },
}

/// Raised when whole-state data does not match the live `(P, T)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "net dimensions do not match: expected P={expected_places}, T={expected_transitions}, \
     got P={places}, T={transitions}"
)]
pub struct DimensionMismatchError {
    pub expected_places: usize,
    pub expected_transitions: usize,
    pub places: usize,
    pub transitions: usize,
}

/// Fixed topology of an ordinary net: `(P, T, W_in, W_out)`.
///
/// Immutable once built. Replacing the topology means building a new value
/// through [`NetDefinition::new`], a generator, or the text parser.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NetDefinition {
    w_in: IncidenceMatrix,
    w_out: IncidenceMatrix,
}

impl NetDefinition {
    pub fn new(
        places: usize,
        transitions: usize,
        w_in: &[Vec<u8>],
        w_out: &[Vec<u8>],
    ) -> Result<Self, StructureError> {
        check_dimensions(places, transitions)?;
        let w_in = IncidenceMatrix::from_rows(MatrixKind::Input, transitions, places, w_in)?;
        let w_out = IncidenceMatrix::from_rows(MatrixKind::Output, transitions, places, w_out)?;
        Ok(Self { w_in, w_out })
    }

    /// Pairs two matrices that were built or repaired elsewhere.
    pub(crate) fn from_matrices(
        w_in: IncidenceMatrix,
        w_out: IncidenceMatrix,
    ) -> Result<Self, StructureError> {
        debug_assert_eq!(w_in.kind(), MatrixKind::Input);
        debug_assert_eq!(w_out.kind(), MatrixKind::Output);
        check_dimensions(w_in.places(), w_in.transitions())?;
        if w_out.transitions() != w_in.transitions() {
            return Err(StructureError::RowCount {
                matrix: MatrixKind::Output,
                expected: w_in.transitions(),
                found: w_out.transitions(),
            });
        }
        if w_out.places() != w_in.places() {
            return Err(StructureError::RowLength {
                matrix: MatrixKind::Output,
                transition: TransitionId::new(0),
                expected: w_in.places(),
                found: w_out.places(),
            });
        }
        w_in.check_connected()?;
        w_out.check_connected()?;
        Ok(Self { w_in, w_out })
    }

    pub fn places(&self) -> usize {
        self.w_in.places()
    }

    pub fn transitions(&self) -> usize {
        self.w_in.transitions()
    }

    pub fn place_ids(&self) -> impl Iterator<Item = PlaceId> + use<> {
        (0..self.places()).map(PlaceId::from_usize)
    }

    pub fn transition_ids(&self) -> impl Iterator<Item = TransitionId> + use<> {
        (0..self.transitions()).map(TransitionId::from_usize)
    }

    pub fn w_in(&self) -> &IncidenceMatrix {
        &self.w_in
    }

    pub fn w_out(&self) -> &IncidenceMatrix {
        &self.w_out
    }

    pub fn matrix(&self, kind: MatrixKind) -> &IncidenceMatrix {
        match kind {
            MatrixKind::Input => &self.w_in,
            MatrixKind::Output => &self.w_out,
        }
    }

    /// `Err` unless the marking has exactly one value per place.
    pub fn check_marking(&self, marking: &Marking) -> Result<(), StructureError> {
        if marking.len() != self.places() {
            return Err(StructureError::MarkingLength {
                expected: self.places(),
                found: marking.len(),
            });
        }
        Ok(())
    }

    /// `Err` unless this net has the given dimensions.
    pub fn check_dimensions(
        &self,
        places: usize,
        transitions: usize,
    ) -> Result<(), DimensionMismatchError> {
        if self.places() != places || self.transitions() != transitions {
            return Err(DimensionMismatchError {
                expected_places: self.places(),
                expected_transitions: self.transitions(),
                places,
                transitions,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for NetDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetDefinition")
            .field("places", &self.places())
            .field("transitions", &self.transitions())
            .field("w_in", &self.w_in.to_rows())
            .field("w_out", &self.w_out.to_rows())
            .finish()
    }
}

fn check_dimensions(places: usize, transitions: usize) -> Result<(), StructureError> {
    if places == 0 || transitions == 0 {
        return Err(StructureError::EmptyNet {
            places,
            transitions,
        });
    }
    Ok(())
}

/// Token count per place, each in `0..=capacity`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Marking {
    tokens: IndexVec<PlaceId, Tokens>,
    capacity: Tokens,
}

impl Marking {
    pub fn new(tokens: Vec<Tokens>, capacity: Tokens) -> Result<Self, StructureError> {
        if let Some((idx, &value)) = tokens
            .iter()
            .enumerate()
            .find(|(_, value)| **value > capacity)
        {
            return Err(StructureError::TokenRange {
                place: PlaceId::from_usize(idx),
                value,
                capacity,
            });
        }
        Ok(Self {
            tokens: IndexVec::from_vec(tokens),
            capacity,
        })
    }

    /// Like [`Marking::new`], but values above capacity are clamped.
    pub fn saturating(tokens: Vec<Tokens>, capacity: Tokens) -> Self {
        Self {
            tokens: IndexVec::from_vec(tokens.into_iter().map(|v| v.min(capacity)).collect()),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn capacity(&self) -> Tokens {
        self.capacity
    }

    pub fn tokens(&self, place: PlaceId) -> Tokens {
        self.tokens[place]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, Tokens)> + '_ {
        self.tokens.iter_enumerated().map(|(place, &tokens)| (place, tokens))
    }

    pub fn as_slice(&self) -> &[Tokens] {
        self.tokens.as_slice()
    }

    pub fn to_vec(&self) -> Vec<Tokens> {
        self.tokens.as_slice().to_vec()
    }

    /// Only the firing code writes token counts directly.
    pub(crate) fn tokens_mut(&mut self) -> &mut IndexVec<PlaceId, Tokens> {
        &mut self.tokens
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marking")
            .field("tokens", &self.tokens)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_every_matrix() {
        let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
        assert_eq!(net.places(), 2);
        assert_eq!(net.transitions(), 1);

        let err = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 0]]).unwrap_err();
        assert_eq!(
            err,
            StructureError::Disconnected {
                matrix: MatrixKind::Output,
                transition: TransitionId::new(0),
            }
        );
        assert_eq!(
            err.to_string(),
            "transition t1 is not connected to any place in W_out"
        );
    }

    #[test]
    fn empty_dimensions_are_rejected() {
        assert!(matches!(
            NetDefinition::new(0, 1, &[vec![]], &[vec![]]),
            Err(StructureError::EmptyNet { places: 0, .. })
        ));
        assert!(matches!(
            NetDefinition::new(2, 0, &[], &[]),
            Err(StructureError::EmptyNet { transitions: 0, .. })
        ));
    }

    #[test]
    fn marking_is_bounded_by_capacity() {
        let err = Marking::new(vec![0, 4, 1], 3).unwrap_err();
        assert_eq!(
            err,
            StructureError::TokenRange {
                place: PlaceId::new(1),
                value: 4,
                capacity: 3,
            }
        );

        let clamped = Marking::saturating(vec![1, 5, 5], 3);
        assert_eq!(clamped.to_vec(), vec![1, 3, 3]);
    }

    #[test]
    fn marking_pairing_checks_length() {
        let net = NetDefinition::new(2, 1, &[vec![1, 0]], &[vec![0, 1]]).unwrap();
        let marking = Marking::new(vec![1, 0, 0], MAX_TOKENS).unwrap();
        assert_eq!(
            net.check_marking(&marking),
            Err(StructureError::MarkingLength {
                expected: 2,
                found: 3
            })
        );
        assert!(net.check_dimensions(2, 1).is_ok());
        assert!(net.check_dimensions(3, 1).is_err());
    }
}
