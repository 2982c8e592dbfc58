//! Binary transition-by-place arc matrices (`W_in`, `W_out`).
use std::fmt;

use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::StructureError;

type SmallRow = SmallVec<[bool; 8]>;

/// Which of the two arc matrices a value or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    /// Consumption arcs, place -> transition.
    Input,
    /// Production arcs, transition -> place.
    Output,
}

impl MatrixKind {
    pub const fn name(self) -> &'static str {
        match self {
            MatrixKind::Input => "W_in",
            MatrixKind::Output => "W_out",
        }
    }
}

impl fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `T × P` matrix of `{0, 1}` cells, one row per transition.
///
/// Every value of this type has passed [`IncidenceMatrix::from_rows`] (or was
/// built by a generator that repairs rows before returning), so each row has
/// the expected width and at least one set cell.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IncidenceMatrix {
    kind: MatrixKind,
    rows: IndexVec<TransitionId, SmallRow>,
    places: usize,
}

impl IncidenceMatrix {
    /// Validates raw cells and builds the matrix. Fails on the first
    /// offending row, in transition order.
    pub fn from_rows(
        kind: MatrixKind,
        transitions: usize,
        places: usize,
        raw: &[Vec<u8>],
    ) -> Result<Self, StructureError> {
        if raw.len() != transitions {
            return Err(StructureError::RowCount {
                matrix: kind,
                expected: transitions,
                found: raw.len(),
            });
        }

        let mut rows = Vec::with_capacity(transitions);
        for (idx, cells) in raw.iter().enumerate() {
            let transition = TransitionId::from_usize(idx);
            if cells.len() != places {
                return Err(StructureError::RowLength {
                    matrix: kind,
                    transition,
                    expected: places,
                    found: cells.len(),
                });
            }
            let mut row = SmallRow::with_capacity(places);
            for (p, &value) in cells.iter().enumerate() {
                match value {
                    0 => row.push(false),
                    1 => row.push(true),
                    _ => {
                        return Err(StructureError::NonBinary {
                            matrix: kind,
                            transition,
                            place: PlaceId::from_usize(p),
                            value,
                        });
                    }
                }
            }
            rows.push(row);
        }

        let matrix = Self {
            kind,
            rows: IndexVec::from_vec(rows),
            places,
        };
        matrix.check_connected()?;
        Ok(matrix)
    }

    /// Builds a matrix cell by cell without checks. Callers must run
    /// [`IncidenceMatrix::check_connected`] or repair rows themselves.
    pub(crate) fn from_fn(
        kind: MatrixKind,
        transitions: usize,
        places: usize,
        mut cell: impl FnMut(TransitionId, PlaceId) -> bool,
    ) -> Self {
        let rows = IndexVec::from_fn(transitions, |t| {
            (0..places)
                .map(|p| cell(t, PlaceId::from_usize(p)))
                .collect::<SmallRow>()
        });
        Self { kind, rows, places }
    }

    pub(crate) fn set(&mut self, transition: TransitionId, place: PlaceId, value: bool) {
        self.rows[transition][place.index()] = value;
    }

    /// Every transition must have at least one arc in this matrix.
    pub fn check_connected(&self) -> Result<(), StructureError> {
        match self.rows.indices().find(|&t| self.row_sum(t) == 0) {
            Some(transition) => Err(StructureError::Disconnected {
                matrix: self.kind,
                transition,
            }),
            None => Ok(()),
        }
    }

    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    pub fn transitions(&self) -> usize {
        self.rows.len()
    }

    pub fn places(&self) -> usize {
        self.places
    }

    pub fn get(&self, transition: TransitionId, place: PlaceId) -> bool {
        self.rows[transition][place.index()]
    }

    /// Cell as an arc weight, `0` or `1`.
    pub fn weight(&self, transition: TransitionId, place: PlaceId) -> u8 {
        u8::from(self.get(transition, place))
    }

    pub fn row(&self, transition: TransitionId) -> &[bool] {
        &self.rows[transition]
    }

    pub fn row_sum(&self, transition: TransitionId) -> usize {
        self.rows[transition].iter().filter(|&&cell| cell).count()
    }

    /// Places with a set cell in the given row.
    pub fn places_of(&self, transition: TransitionId) -> impl Iterator<Item = PlaceId> + '_ {
        self.rows[transition]
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell)
            .map(|(p, _)| PlaceId::from_usize(p))
    }

    /// True when both rows have a `1` at some common place.
    pub fn rows_overlap(&self, a: TransitionId, b: TransitionId) -> bool {
        self.rows[a]
            .iter()
            .zip(self.rows[b].iter())
            .any(|(&left, &right)| left && right)
    }

    /// Cells as `0`/`1` integers, for serialization.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&cell| u8::from(cell)).collect())
            .collect()
    }
}

impl fmt::Debug for IncidenceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidenceMatrix")
            .field("kind", &self.kind)
            .field("rows", &self.to_rows())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_accepts_binary_connected_rows() {
        let matrix =
            IncidenceMatrix::from_rows(MatrixKind::Input, 2, 3, &[vec![1, 0, 1], vec![0, 1, 0]])
                .unwrap();
        assert_eq!(matrix.transitions(), 2);
        assert_eq!(matrix.places(), 3);
        assert_eq!(matrix.row_sum(TransitionId::new(0)), 2);
        assert!(matrix.get(TransitionId::new(1), PlaceId::new(1)));
        assert_eq!(matrix.to_rows(), vec![vec![1, 0, 1], vec![0, 1, 0]]);
    }

    #[test]
    fn from_rows_rejects_non_binary_cell() {
        let err = IncidenceMatrix::from_rows(MatrixKind::Output, 1, 2, &[vec![1, 2]]).unwrap_err();
        assert_eq!(
            err,
            StructureError::NonBinary {
                matrix: MatrixKind::Output,
                transition: TransitionId::new(0),
                place: PlaceId::new(1),
                value: 2,
            }
        );
    }

    #[test]
    fn from_rows_rejects_zero_row() {
        let err = IncidenceMatrix::from_rows(MatrixKind::Input, 2, 2, &[vec![1, 0], vec![0, 0]])
            .unwrap_err();
        assert_eq!(
            err,
            StructureError::Disconnected {
                matrix: MatrixKind::Input,
                transition: TransitionId::new(1),
            }
        );
    }

    #[test]
    fn from_rows_rejects_wrong_shape() {
        assert!(matches!(
            IncidenceMatrix::from_rows(MatrixKind::Input, 2, 2, &[vec![1, 0]]),
            Err(StructureError::RowCount { expected: 2, found: 1, .. })
        ));
        assert!(matches!(
            IncidenceMatrix::from_rows(MatrixKind::Input, 1, 2, &[vec![1, 0, 1]]),
            Err(StructureError::RowLength { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn overlap_requires_common_place() {
        let matrix = IncidenceMatrix::from_rows(
            MatrixKind::Input,
            3,
            3,
            &[vec![1, 1, 0], vec![0, 1, 0], vec![0, 0, 1]],
        )
        .unwrap();
        let (t0, t1, t2) = (TransitionId::new(0), TransitionId::new(1), TransitionId::new(2));
        assert!(matrix.rows_overlap(t0, t1));
        assert!(!matrix.rows_overlap(t0, t2));
        assert!(matrix.rows_overlap(t2, t2));
        assert_eq!(matrix.places_of(t0).collect::<Vec<_>>(), vec![PlaceId::new(0), PlaceId::new(1)]);
    }
}
