//! Board and piece definitions.
//!
//! A piece is an anchor position plus a shape: either a full rectangle or an
//! explicit set of cell offsets normalized so the minimum offset is the origin.
//! Pieces are cheap to clone (custom cell lists are shared), and a move always
//! produces a new piece value.

use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};

/// A 2D board cell position, `(x, y)` with y growing downwards.
pub type Coord = (i32, i32);

/// One concrete assignment of positions to all pieces, indexed by logical piece.
pub type Configuration = Vec<Piece>;

/// Most pieces a configuration may hold; state keys store labels as `u16`.
pub const MAX_PIECES: usize = u16::MAX as usize;

/// Fixed board geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    pub width: usize,
    pub height: usize,
}

impl Board {
    /// Creates a board of any positive size whose cell count fits a `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyBoard { width, height });
        }
        if width.checked_mul(height).is_none() {
            return Err(Error::BoardTooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    /// Creates a board whose dimensions must both lie within `range`.
    pub fn within(width: usize, height: usize, range: RangeInclusive<usize>) -> Result<Self> {
        if !range.contains(&width) || !range.contains(&height) {
            return Err(Error::BoardOutOfRange {
                width,
                height,
                min: *range.start(),
                max: *range.end(),
            });
        }
        Self::new(width, height)
    }

    /// Total number of cells.
    ///
    /// Saturates for a hand-built board; [`Board::new`] rejects such sizes.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    #[inline]
    pub fn contains(&self, (x, y): Coord) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
}

/// Piece geometry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    /// A full `width x height` block.
    Rect { width: i32, height: i32 },
    /// Arbitrary cells; offsets are unique and their bounding box is
    /// `width x height` with its corner at the origin.
    Custom {
        width: i32,
        height: i32,
        cells: Arc<[Coord]>,
    },
}

/// A piece placed on the board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    pub id: usize,
    pub x: i32,
    pub y: i32,
    pub shape: Shape,
}

impl Piece {
    /// A rectangular piece anchored at its top-left cell.
    ///
    /// Every covered cell must be representable, so the far corner may not
    /// pass `i32::MAX`.
    pub fn rect(id: usize, x: i32, y: i32, width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidShape(format!(
                "rectangle must be at least 1x1, got {width}x{height}"
            )));
        }
        if x.checked_add(width - 1).is_none() || y.checked_add(height - 1).is_none() {
            return Err(Error::InvalidShape(format!(
                "{width}x{height} rectangle at ({x}, {y}) runs past the coordinate range"
            )));
        }
        Ok(Self {
            id,
            x,
            y,
            shape: Shape::Rect { width, height },
        })
    }

    /// An arbitrary-shaped piece from absolute board cells.
    ///
    /// The anchor becomes the top-left corner of the cells' bounding box and the
    /// offsets are stored relative to it. A set that fills its bounding box is
    /// still stored as a custom shape; use [`Piece::rect`] for plain blocks.
    pub fn custom(id: usize, cells: &[Coord]) -> Result<Self> {
        if cells.is_empty() {
            return Err(Error::InvalidShape("custom piece has no cells".into()));
        }
        let min_x = cells.iter().map(|&(x, _)| x).min().unwrap_or(0);
        let min_y = cells.iter().map(|&(_, y)| y).min().unwrap_or(0);
        let max_x = cells.iter().map(|&(x, _)| x).max().unwrap_or(0);
        let max_y = cells.iter().map(|&(_, y)| y).max().unwrap_or(0);
        let extent = |min: i32, max: i32| max.checked_sub(min).and_then(|span| span.checked_add(1));
        let (Some(width), Some(height)) = (extent(min_x, max_x), extent(min_y, max_y)) else {
            return Err(Error::InvalidShape(format!(
                "custom piece spans ({min_x}, {min_y}) to ({max_x}, {max_y}), too wide to store"
            )));
        };

        let mut offsets: Vec<Coord> = cells.iter().map(|&(x, y)| (x - min_x, y - min_y)).collect();
        offsets.sort_by_key(|&(dx, dy)| (dy, dx));
        let before = offsets.len();
        offsets.dedup();
        if offsets.len() != before {
            return Err(Error::InvalidShape("custom piece repeats a cell".into()));
        }

        Ok(Self {
            id,
            x: min_x,
            y: min_y,
            shape: Shape::Custom {
                width,
                height,
                cells: offsets.into(),
            },
        })
    }

    #[inline]
    pub fn width(&self) -> i32 {
        match self.shape {
            Shape::Rect { width, .. } | Shape::Custom { width, .. } => width,
        }
    }

    #[inline]
    pub fn height(&self) -> i32 {
        match self.shape {
            Shape::Rect { height, .. } | Shape::Custom { height, .. } => height,
        }
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        matches!(self.shape, Shape::Custom { .. })
    }

    /// Number of cells this piece covers.
    pub fn cell_count(&self) -> usize {
        match &self.shape {
            Shape::Rect { width, height } => (width * height) as usize,
            Shape::Custom { cells, .. } => cells.len(),
        }
    }

    /// Cell offsets relative to the anchor, row-major for rectangles.
    pub fn offsets(&self) -> impl Iterator<Item = Coord> + '_ {
        let (rect, custom) = match &self.shape {
            Shape::Rect { width, height } => {
                let (w, h) = (*width, *height);
                (
                    Some((0..h).flat_map(move |dy| (0..w).map(move |dx| (dx, dy)))),
                    None,
                )
            }
            Shape::Custom { cells, .. } => (None, Some(cells.iter().copied())),
        };
        rect.into_iter()
            .flatten()
            .chain(custom.into_iter().flatten())
    }

    /// Absolute cells this piece would cover if anchored at `(x, y)`.
    pub fn cells_at(&self, x: i32, y: i32) -> impl Iterator<Item = Coord> + '_ {
        self.offsets().map(move |(dx, dy)| (x + dx, y + dy))
    }

    /// Absolute cells at the current anchor.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells_at(self.x, self.y)
    }

    /// The same piece anchored elsewhere.
    #[inline]
    pub fn moved_to(&self, x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }
}

/// A named starting puzzle.
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub width: usize,
    pub height: usize,
    /// Rows of the starting board: `.` is empty, equal characters form one piece.
    pub rows: &'static [&'static str],
}

/// Built-in puzzles, smallest first.
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "corner",
        description: "one unit block on a 2x2 board",
        width: 2,
        height: 2,
        rows: &["A.", ".."],
    },
    Preset {
        name: "pair",
        description: "two unit blocks on a 3x1 strip",
        width: 3,
        height: 1,
        rows: &["AB."],
    },
    Preset {
        name: "starter",
        description: "a bar, a post and a unit block on a 3x3 board",
        width: 3,
        height: 3,
        rows: &["AAB", "..B", "C.."],
    },
    Preset {
        name: "tee",
        description: "an L-shaped piece with two blocks on a 4x4 board",
        width: 4,
        height: 4,
        rows: &["A...", "A.BB", "AA..", "...C"],
    },
    Preset {
        name: "classic",
        description: "the 4x5 Klotski opening (large state space)",
        width: 4,
        height: 5,
        rows: &["ABBC", "ABBC", "DEEF", "DGHF", "I..J"],
    },
];

/// Looks up a preset by name.
pub fn preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.name == name)
}

impl Preset {
    /// The preset's board and starting pieces.
    pub fn load(&self) -> Result<(Board, Configuration)> {
        crate::grid::parse_board(&self.rows.join("\n"))
    }
}

/// Board and pieces of the preset called `name`.
pub fn load_preset(name: &str) -> Result<(Board, Configuration)> {
    preset(name)
        .ok_or_else(|| Error::UnknownPreset(name.to_string()))?
        .load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_offsets_cover_full_grid() {
        let piece = Piece::rect(0, 1, 2, 2, 3).unwrap();
        let cells: Vec<Coord> = piece.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (1, 2));
        assert_eq!(cells[5], (2, 4));
    }

    #[test]
    fn test_custom_piece_normalizes_to_bounding_box() {
        let piece = Piece::custom(3, &[(2, 1), (2, 2), (3, 2)]).unwrap();
        assert_eq!((piece.x, piece.y), (2, 1));
        assert_eq!((piece.width(), piece.height()), (2, 2));
        let mut offsets: Vec<Coord> = piece.offsets().collect();
        offsets.sort();
        assert_eq!(offsets, vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_custom_piece_rejects_duplicates_and_empty() {
        assert!(Piece::custom(0, &[(0, 0), (0, 0)]).is_err());
        assert!(Piece::custom(0, &[]).is_err());
        assert!(Piece::rect(0, 0, 0, 0, 1).is_err());
    }

    #[test]
    fn test_pieces_must_stay_in_coordinate_range() {
        assert!(matches!(
            Piece::custom(0, &[(i32::MIN, 0), (i32::MAX, 0)]),
            Err(Error::InvalidShape(_))
        ));
        assert!(matches!(
            Piece::rect(0, i32::MAX, 0, 2, 1),
            Err(Error::InvalidShape(_))
        ));
        // a single cell at the very edge is still representable
        assert!(Piece::rect(0, i32::MAX, i32::MAX, 1, 1).is_ok());
        assert!(Piece::custom(0, &[(i32::MAX, 0)]).is_ok());
    }

    #[test]
    fn test_moved_to_leaves_original_untouched() {
        let piece = Piece::rect(1, 0, 0, 1, 2).unwrap();
        let moved = piece.moved_to(1, 0);
        assert_eq!((piece.x, piece.y), (0, 0));
        assert_eq!((moved.x, moved.y), (1, 0));
        assert_eq!(moved.shape, piece.shape);
    }

    #[test]
    fn test_board_range_checks() {
        assert!(Board::new(0, 3).is_err());
        assert!(matches!(
            Board::new(usize::MAX, 2),
            Err(Error::BoardTooLarge { .. })
        ));
        assert!(Board::within(2, 5, 3..=8).is_err());
        assert!(Board::within(9, 5, 3..=8).is_err());
        assert_eq!(Board::within(4, 5, 3..=8).unwrap().cell_count(), 20);
    }

    #[test]
    fn test_presets_have_matching_rows() {
        for preset in PRESETS {
            assert_eq!(preset.rows.len(), preset.height, "{}", preset.name);
            for row in preset.rows {
                assert_eq!(row.chars().count(), preset.width, "{}", preset.name);
            }
            let (board, pieces) = preset.load().unwrap();
            assert_eq!((board.width, board.height), (preset.width, preset.height));
            assert!(!pieces.is_empty());
        }
    }

    #[test]
    fn test_tee_preset_has_custom_piece() {
        let (_, pieces) = load_preset("tee").unwrap();
        assert_eq!(pieces.len(), 3);
        assert!(pieces[0].is_custom());
        assert!(matches!(load_preset("nope"), Err(Error::UnknownPreset(_))));
    }
}
