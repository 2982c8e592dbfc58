//! Line-oriented text form of a net and its marking.
//!
//! ```text
//! Marking:
//! M: 1 0 3
//!
//! W_in:
//!     p1 p2 p3
//! t1: 1 0 0
//! t2: 0 1 1
//!
//! W_out:
//!     p1 p2 p3
//! t1: 0 1 0
//! t2: 1 0 0
//! ```
//!
//! Dimensions are not written; the reader supplies the expected `P`, `T` and
//! capacity.
use std::fmt::Write as _;
use std::num::IntErrorKind;

use itertools::Itertools;
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::{IncidenceMatrix, MatrixKind};
use crate::net::index_vec::Idx;
use crate::net::structure::{Marking, NetDefinition, StructureError, Tokens};

/// Malformed text. Line numbers are 1-based.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("input is empty")]
    Empty,
    #[error("no marking line of the form 'M: v1 v2 ... vP'")]
    MissingMarking,
    #[error("line {line}: marking M must have {expected} values, found {found}")]
    MarkingCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: marking of {place} must be in 0..={max_tokens}, found {value}")]
    MarkingRange {
        line: usize,
        place: PlaceId,
        value: i64,
        max_tokens: Tokens,
    },
    #[error("line {line}: '{token}' is not an integer")]
    NotInteger { line: usize, token: String },
    #[error("no line starting with '{0}'")]
    MissingBlock(MatrixKind),
    #[error("line {line}: expected '{transition}: v1 ... vP' in {block}, found '{found}'")]
    RowLabel {
        line: usize,
        block: MatrixKind,
        transition: TransitionId,
        found: String,
    },
    #[error("{block} ends before row {transition}")]
    MissingRow {
        block: MatrixKind,
        transition: TransitionId,
    },
    #[error("line {line}: row {transition} of {block} must have {expected} values, found {found}")]
    RowLength {
        line: usize,
        block: MatrixKind,
        transition: TransitionId,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {block}[{transition}][{place}] must be 0 or 1 (ordinary net), found {value}")]
    NonBinary {
        line: usize,
        block: MatrixKind,
        transition: TransitionId,
        place: PlaceId,
        value: i64,
    },
    #[error("line {line}: transition {transition} in {block} is not connected to any place")]
    Disconnected {
        line: usize,
        block: MatrixKind,
        transition: TransitionId,
    },
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Renders the full state. Output always ends with a newline.
pub fn format(net: &NetDefinition, marking: &Marking) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Marking:");
    let _ = writeln!(out, "M: {}", marking.as_slice().iter().join(" "));
    let _ = writeln!(out);
    write_matrix(&mut out, net.w_in());
    let _ = writeln!(out);
    write_matrix(&mut out, net.w_out());
    out
}

fn write_matrix(out: &mut String, matrix: &IncidenceMatrix) {
    let header = (0..matrix.places()).map(PlaceId::from_usize).join(" ");
    let _ = writeln!(out, "{}:", matrix.kind());
    let _ = writeln!(out, "    {header}");
    for t in (0..matrix.transitions()).map(TransitionId::from_usize) {
        let row = matrix.row(t).iter().map(|&cell| u8::from(cell)).join(" ");
        let _ = writeln!(out, "{t}: {row}");
    }
}

/// Parses and validates the whole text. Nothing is returned unless every
/// line checks out.
pub fn parse(
    text: &str,
    expected_places: usize,
    expected_transitions: usize,
    max_tokens: Tokens,
) -> Result<(NetDefinition, Marking), FormatError> {
    let lines = text.lines().map(str::trim).collect::<Vec<_>>();
    if lines.iter().all(|line| line.is_empty()) {
        return Err(FormatError::Empty);
    }

    let marking = parse_marking(&lines, expected_places, max_tokens)?;
    let w_in = parse_block(&lines, MatrixKind::Input, expected_places, expected_transitions)?;
    let w_out = parse_block(&lines, MatrixKind::Output, expected_places, expected_transitions)?;
    let net = NetDefinition::new(expected_places, expected_transitions, &w_in, &w_out)?;
    net.check_marking(&marking)?;
    Ok((net, marking))
}

fn parse_marking(
    lines: &[&str],
    expected_places: usize,
    max_tokens: Tokens,
) -> Result<Marking, FormatError> {
    let (idx, line) = lines
        .iter()
        .enumerate()
        .find(|(_, line)| line.to_ascii_lowercase().starts_with("m:"))
        .ok_or(FormatError::MissingMarking)?;
    let line_no = idx + 1;

    let values = parse_integers(&line[2..], line_no)?;
    if values.len() != expected_places {
        return Err(FormatError::MarkingCount {
            line: line_no,
            expected: expected_places,
            found: values.len(),
        });
    }

    let mut tokens = Vec::with_capacity(values.len());
    for (p, value) in values.into_iter().enumerate() {
        match Tokens::try_from(value) {
            Ok(count) if count <= max_tokens => tokens.push(count),
            _ => {
                return Err(FormatError::MarkingRange {
                    line: line_no,
                    place: PlaceId::from_usize(p),
                    value,
                    max_tokens,
                });
            }
        }
    }
    Ok(Marking::new(tokens, max_tokens)?)
}

/// Finds the block heading, skips the header line after it and reads
/// exactly `T` labelled rows.
fn parse_block(
    lines: &[&str],
    block: MatrixKind,
    expected_places: usize,
    expected_transitions: usize,
) -> Result<Vec<Vec<u8>>, FormatError> {
    let prefix = block.name().to_ascii_lowercase();
    let heading = lines
        .iter()
        .position(|line| line.to_ascii_lowercase().starts_with(&prefix))
        .ok_or(FormatError::MissingBlock(block))?;
    let rows_start = heading + 2;

    let mut rows = Vec::with_capacity(expected_transitions);
    for transition in (0..expected_transitions).map(TransitionId::from_usize) {
        let idx = rows_start + transition.index();
        let line = match lines.get(idx) {
            Some(line) if !line.is_empty() => *line,
            _ => return Err(FormatError::MissingRow { block, transition }),
        };
        let line_no = idx + 1;

        let label_mismatch = || FormatError::RowLabel {
            line: line_no,
            block,
            transition,
            found: line.to_string(),
        };
        let (label, data) = line.split_once(':').ok_or_else(label_mismatch)?;
        if !label.trim().eq_ignore_ascii_case(&transition.to_string()) {
            return Err(label_mismatch());
        }

        let values = parse_integers(data, line_no)?;
        if values.len() != expected_places {
            return Err(FormatError::RowLength {
                line: line_no,
                block,
                transition,
                expected: expected_places,
                found: values.len(),
            });
        }

        let mut row = Vec::with_capacity(values.len());
        for (p, value) in values.into_iter().enumerate() {
            match value {
                0 | 1 => row.push(value as u8),
                _ => {
                    return Err(FormatError::NonBinary {
                        line: line_no,
                        block,
                        transition,
                        place: PlaceId::from_usize(p),
                        value,
                    });
                }
            }
        }
        if row.iter().all(|&cell| cell == 0) {
            return Err(FormatError::Disconnected {
                line: line_no,
                block,
                transition,
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Integers too large for `i64` clamp to its bounds so that callers report
/// them as out of range rather than malformed.
fn parse_integers(data: &str, line: usize) -> Result<Vec<i64>, FormatError> {
    data.split_whitespace()
        .map(|token| match token.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(err) => match err.kind() {
                IntErrorKind::PosOverflow => Ok(i64::MAX),
                IntErrorKind::NegOverflow => Ok(i64::MIN),
                _ => Err(FormatError::NotInteger {
                    line,
                    token: token.to_string(),
                }),
            },
        })
        .collect()
}
