//! Breadth-first reachability search over single-cell piece moves.
//!
//! - Frontier holds full configurations, since moves need piece coordinates
//! - Each distinct key is enqueued once, so work is bounded by the state count
//! - Every valid move records an edge, including moves into states that were
//!   already discovered; the graph does not depend on discovery order

use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::DIRECTIONS;
use crate::grid::{encode, StateKey};
use crate::pieces::{Board, Configuration, Piece, MAX_PIECES};
use crate::placement::{can_place, validate};
use crate::space::StateSpace;
use crate::SpaceBuilder;

/// Rejects piece sets that cannot be encoded or are empty.
pub(crate) fn check_pieces(pieces: &[Piece]) -> Result<()> {
    if pieces.is_empty() {
        return Err(Error::NoPieces);
    }
    if pieces.len() > MAX_PIECES {
        return Err(Error::TooManyPieces {
            count: pieces.len(),
            max: MAX_PIECES,
        });
    }
    Ok(())
}

/// Rejects configurations no search can start from.
pub(crate) fn check_start(board: &Board, pieces: &[Piece]) -> Result<()> {
    check_pieces(pieces)?;
    validate(board, pieces).map_err(|index| Error::InvalidPlacement {
        index,
        x: pieces[index].x,
        y: pieces[index].y,
    })
}

/// Finds every configuration reachable from `initial`.
///
/// The caller's pieces are copied up front and never modified. States are
/// returned in breadth-first discovery order, starting with `initial`.
pub fn explore(board: &Board, initial: &[Piece]) -> Result<StateSpace> {
    check_start(board, initial)?;

    let start: Configuration = initial.to_vec();
    let start_key = encode(board, &start);

    let mut space = StateSpace::new();
    space.insert(start_key.clone());
    let mut frontier: VecDeque<(StateKey, Configuration)> = VecDeque::from([(start_key, start)]);

    while let Some((key, pieces)) = frontier.pop_front() {
        for (piece_index, piece) in pieces.iter().enumerate() {
            for direction in DIRECTIONS {
                let (dx, dy) = direction.delta();
                let (x, y) = (piece.x + dx, piece.y + dy);
                if !can_place(board, &pieces, piece_index, x, y) {
                    continue;
                }

                let mut next = pieces.clone();
                next[piece_index] = piece.moved_to(x, y);
                let next_key = encode(board, &next);

                space.add_edge(&key, &next_key);
                if space.insert(next_key.clone()) {
                    frontier.push_back((next_key, next));
                }
            }
        }
    }

    debug!(
        pieces = initial.len(),
        states = space.len(),
        edges = space.edge_count(),
        "reachability search finished"
    );
    Ok(space)
}

/// [`SpaceBuilder`] running the breadth-first reachability search.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reachability;

impl SpaceBuilder for Reachability {
    fn build(&self, board: &Board, pieces: &[Piece]) -> Result<StateSpace> {
        explore(board, pieces)
    }

    fn name(&self) -> &'static str {
        "reachable"
    }
}
