//! State keys: canonical occupancy encoding of a configuration.
//!
//! The board is a flat row-major array where each cell holds the 1-based index
//! of the piece covering it, or 0 for empty. Two configurations with the same
//! occupancy get equal keys regardless of which piece values produced them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::pieces::{Board, Configuration, Coord, Piece};

/// Canonical, hashable identity of a configuration.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Arc<[u16]>);

impl StateKey {
    pub fn from_cells(cells: Vec<u16>) -> Self {
        Self(cells.into())
    }

    /// Per-cell labels, row-major.
    #[inline]
    pub fn cells(&self) -> &[u16] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct piece labels present.
    pub fn piece_count(&self) -> usize {
        let mut labels: Vec<u16> = self.0.iter().copied().filter(|&label| label > 0).collect();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    /// Collapses every occupied cell to label 1, keeping only the occupancy pattern.
    pub fn to_occupancy(&self) -> Self {
        Self(self.0.iter().map(|&label| u16::from(label > 0)).collect())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{label}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateKey({self})")
    }
}

impl FromStr for StateKey {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        text.trim()
            .split(',')
            .map(|cell| {
                cell.trim()
                    .parse::<u16>()
                    .map_err(|_| Error::MalformedKey(format!("bad cell {cell:?} in {text:?}")))
            })
            .collect::<Result<Vec<u16>>>()
            .map(Self::from_cells)
    }
}

impl Serialize for StateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Converts (x, y) to a linear cell index: `idx = y * width + x`.
#[inline(always)]
pub fn cell_index(board: &Board, (x, y): Coord) -> usize {
    y as usize * board.width + x as usize
}

/// Converts a linear cell index back to (x, y).
#[inline(always)]
pub fn cell_coord(board: &Board, cell_index: usize) -> Coord {
    (
        (cell_index % board.width) as i32,
        (cell_index / board.width) as i32,
    )
}

/// Encodes a configuration into its state key.
///
/// Pieces are labelled by position in the configuration (index + 1). Cells
/// that fall outside the board are ignored; validated configurations have none.
pub fn encode(board: &Board, pieces: &[Piece]) -> StateKey {
    let mut cells = vec![0u16; board.cell_count()];

    for (index, piece) in pieces.iter().enumerate() {
        let label = (index + 1) as u16;
        for cell in piece.cells() {
            if board.contains(cell) {
                cells[cell_index(board, cell)] = label;
            }
        }
    }

    StateKey::from_cells(cells)
}

/// Decodes a state key back into a configuration.
///
/// Cells are grouped by label in increasing label order. Each group's bounding
/// box decides its shape: a full box is a rectangle, anything else a custom
/// piece. Piece ids are `label - 1`.
pub fn decode(board: &Board, key: &StateKey) -> Result<Configuration> {
    if key.len() != board.cell_count() {
        return Err(Error::KeyLength {
            expected: board.cell_count(),
            found: key.len(),
        });
    }

    let mut groups: BTreeMap<u16, Vec<Coord>> = BTreeMap::new();
    for (idx, &label) in key.cells().iter().enumerate() {
        if label > 0 {
            groups.entry(label).or_default().push(cell_coord(board, idx));
        }
    }

    groups
        .into_iter()
        .map(|(label, cells)| {
            let id = usize::from(label - 1);
            let min_x = cells.iter().map(|&(x, _)| x).min().unwrap_or(0);
            let min_y = cells.iter().map(|&(_, y)| y).min().unwrap_or(0);
            let width = cells.iter().map(|&(x, _)| x).max().unwrap_or(0) - min_x + 1;
            let height = cells.iter().map(|&(_, y)| y).max().unwrap_or(0) - min_y + 1;

            if cells.len() == (width * height) as usize {
                Piece::rect(id, min_x, min_y, width, height)
            } else {
                Piece::custom(id, &cells)
            }
        })
        .collect()
}

/// Display character for a piece label: digits, then letters, then `#`.
pub fn label_char(label: u16) -> char {
    if label == 0 {
        return '.';
    }
    char::from_digit(u32::from(label), 36)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('#')
}

/// Formats a state as rows of label characters, top row first.
pub fn format_state(board: &Board, key: &StateKey) -> String {
    let mut output = String::with_capacity(board.cell_count() + board.height);
    for row in key.cells().chunks(board.width) {
        output.extend(row.iter().map(|&label| label_char(label)));
        output.push('\n');
    }
    output
}

/// Parses a text board into its geometry and starting configuration.
///
/// One line per row; `.` is empty and every other character names a piece.
/// Pieces are ordered by the first appearance of their character in reading
/// order. Blank lines are skipped.
pub fn parse_board(text: &str) -> Result<(Board, Configuration)> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    let height = rows.len();
    let width = rows.first().map_or(0, |row| row.chars().count());
    let board = Board::new(width, height)?;

    let mut names: Vec<char> = Vec::new();
    let mut cells = Vec::with_capacity(board.cell_count());
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != width {
            return Err(Error::MalformedKey(format!(
                "row {y} has {} cells, expected {width}",
                row.chars().count()
            )));
        }
        for name in row.chars() {
            if name == '.' {
                cells.push(0);
                continue;
            }
            let index = match names.iter().position(|&known| known == name) {
                Some(index) => index,
                None => {
                    names.push(name);
                    names.len() - 1
                }
            };
            cells.push((index + 1) as u16);
        }
    }

    let pieces = decode(&board, &StateKey::from_cells(cells))?;
    Ok((board, pieces))
}
