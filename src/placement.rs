//! Bounds and overlap checks for candidate placements.

use crate::pieces::{Board, Piece, Shape};

/// Whether `start..start + len` lies within `0..limit`.
///
/// Computed in `i64` so anchors near `i32::MAX` are rejected instead of wrapping.
fn span_fits(start: i32, len: i32, limit: usize) -> bool {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    start >= 0 && i64::from(start) + i64::from(len) <= limit
}

/// Half-open spans `[a, a + a_len)` and `[b, b + b_len)` intersect.
fn spans_intersect(a: i32, a_len: i32, b: i32, b_len: i32) -> bool {
    let (a, b) = (i64::from(a), i64::from(b));
    a < b + i64::from(b_len) && b < a + i64::from(a_len)
}

/// Whether every cell of `piece`, anchored at `(x, y)`, lies on the board.
pub fn fits_on_board(board: &Board, piece: &Piece, x: i32, y: i32) -> bool {
    let boxed = span_fits(x, piece.width(), board.width) && span_fits(y, piece.height(), board.height);
    match piece.shape {
        Shape::Rect { .. } => boxed,
        // the box check keeps the cell arithmetic below in range
        Shape::Custom { .. } => boxed && piece.cells_at(x, y).all(|cell| board.contains(cell)),
    }
}

/// Whether two placed pieces share a cell.
///
/// Two rectangles use a box test; anything involving a custom shape compares
/// every absolute cell pair, which is fine for the small pieces a board holds.
pub fn pieces_overlap(a: &Piece, b: &Piece) -> bool {
    let boxes_meet = spans_intersect(a.x, a.width(), b.x, b.width())
        && spans_intersect(a.y, a.height(), b.y, b.height());
    match (&a.shape, &b.shape) {
        (Shape::Rect { .. }, Shape::Rect { .. }) => boxes_meet,
        _ => boxes_meet && a.cells().any(|cell_a| b.cells().any(|cell_b| cell_a == cell_b)),
    }
}

/// Whether the piece at `piece_index` could sit at `(x, y)` with every other
/// piece of the configuration left where it is.
pub fn can_place(board: &Board, pieces: &[Piece], piece_index: usize, x: i32, y: i32) -> bool {
    let Some(piece) = pieces.get(piece_index) else {
        return false;
    };
    if !fits_on_board(board, piece, x, y) {
        return false;
    }

    let candidate = piece.moved_to(x, y);
    pieces
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != piece_index)
        .all(|(_, other)| !pieces_overlap(&candidate, other))
}

/// Whether every piece of the configuration is on the board and no two overlap.
///
/// Returns the index of the first offending piece on failure.
pub fn validate(board: &Board, pieces: &[Piece]) -> Result<(), usize> {
    for (index, piece) in pieces.iter().enumerate() {
        if !can_place(board, pieces, index, piece.x, piece.y) {
            return Err(index);
        }
    }
    Ok(())
}
