//! Exhaustive enumeration of every legal placement of a piece set.
//!
//! Unlike the reachability search this ignores how pieces could get somewhere:
//! each piece is tried at every anchor where it fits, in piece order, and any
//! complete non-overlapping assignment is a state. Two states are joined when
//! exactly one piece differs and it differs by a single unit step.
//!
//! The state count is exponential in free cells and the edge pass is quadratic
//! in states; callers bound piece counts and board size before calling this.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::is_unit_step;
use crate::grid::{encode, StateKey};
use crate::pieces::{Board, Configuration, Coord, Piece};
use crate::placement::pieces_overlap;
use crate::search::check_pieces;
use crate::space::StateSpace;
use crate::SpaceBuilder;

/// State count above which the pairwise edge pass is reported as slow.
pub(crate) const LARGE_ENUMERATION: usize = 5_000;

/// Every anchor at which `piece`'s bounding box fits on the board, row-major.
fn anchor_positions(board: &Board, piece: &Piece) -> Vec<Coord> {
    let max_x = board.width as i32 - piece.width();
    let max_y = board.height as i32 - piece.height();
    (0..=max_y)
        .flat_map(|y| (0..=max_x).map(move |x| (x, y)))
        .collect()
}

/// A node of the depth-first placement search.
struct PartialPlacement {
    /// Pieces placed so far, one per leading piece index.
    placed: Configuration,
    /// Index into the next piece's anchor list to try.
    next_anchor: usize,
}

/// Whether two configurations differ by one piece moving one cell.
///
/// Pieces are compared by index, so two interchangeable pieces that swapped
/// places count as two moved pieces.
pub fn single_move_apart(a: &[Piece], b: &[Piece]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut moved = a
        .iter()
        .zip(b)
        .filter(|(piece_a, piece_b)| (piece_a.x, piece_a.y) != (piece_b.x, piece_b.y));

    match (moved.next(), moved.next()) {
        (Some((piece_a, piece_b)), None) => {
            is_unit_step((piece_a.x, piece_a.y), (piece_b.x, piece_b.y))
        }
        _ => false,
    }
}

/// Enumerates all non-overlapping placements of `pieces` on `board`.
///
/// Only the pieces' shapes and order matter; their current anchors are ignored.
/// States come out in depth-first order (piece 0's anchor varies slowest).
pub fn enumerate_all(board: &Board, pieces: &[Piece]) -> Result<StateSpace> {
    check_pieces(pieces)?;

    let anchors: Vec<Vec<Coord>> = pieces
        .iter()
        .map(|piece| anchor_positions(board, piece))
        .collect();

    let mut space = StateSpace::new();
    let mut configurations: Vec<Configuration> = Vec::new();

    let mut search_stack = vec![PartialPlacement {
        placed: Vec::with_capacity(pieces.len()),
        next_anchor: 0,
    }];

    while let Some(mut partial) = search_stack.pop() {
        let depth = partial.placed.len();
        if depth == pieces.len() {
            if space.insert(encode(board, &partial.placed)) {
                configurations.push(partial.placed);
            }
            continue;
        }

        let candidates = &anchors[depth];
        while partial.next_anchor < candidates.len() {
            let (x, y) = candidates[partial.next_anchor];
            partial.next_anchor += 1;

            let piece = pieces[depth].moved_to(x, y);
            if partial
                .placed
                .iter()
                .any(|other| pieces_overlap(&piece, other))
            {
                continue;
            }

            let mut placed = partial.placed.clone();
            placed.push(piece);

            // resume this node after the child subtree is exhausted
            search_stack.push(partial);
            search_stack.push(PartialPlacement {
                placed,
                next_anchor: 0,
            });
            break;
        }
    }

    if space.len() > LARGE_ENUMERATION {
        warn!(
            states = space.len(),
            "large enumeration; pairwise edge construction is quadratic"
        );
    }

    let keys = space.states().to_vec();
    for i in 0..configurations.len() {
        for j in (i + 1)..configurations.len() {
            if single_move_apart(&configurations[i], &configurations[j]) {
                space.add_edge(&keys[i], &keys[j]);
                space.add_edge(&keys[j], &keys[i]);
            }
        }
    }

    debug!(
        pieces = pieces.len(),
        states = space.len(),
        edges = space.edge_count(),
        "placement enumeration finished"
    );
    Ok(space)
}

/// States of `space` that cannot be reached from `start` along its edges.
///
/// If `start` is not part of the space, every state is unreachable.
pub fn unreachable_from(space: &StateSpace, start: &StateKey) -> Vec<StateKey> {
    let mut visited: FxHashSet<&StateKey> = FxHashSet::default();
    if space.contains(start) {
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(key) = queue.pop_front() {
            for next in space.graph().neighbors(key) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    space
        .states()
        .iter()
        .filter(|key| !visited.contains(key))
        .cloned()
        .collect()
}

/// [`SpaceBuilder`] enumerating every legal placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllPlacements;

impl SpaceBuilder for AllPlacements {
    fn build(&self, board: &Board, pieces: &[Piece]) -> Result<StateSpace> {
        enumerate_all(board, pieces)
    }

    fn name(&self) -> &'static str {
        "all"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::grid::parse_board;
    use crate::search::explore;

    fn unit(id: usize, x: i32, y: i32) -> Piece {
        Piece::rect(id, x, y, 1, 1).unwrap()
    }

    fn key(text: &str) -> StateKey {
        text.parse().unwrap()
    }

    #[test]
    fn test_single_block_enumerates_every_cell() {
        let board = Board::new(2, 2).unwrap();
        let space = enumerate_all(&board, &[unit(0, 0, 0)]).unwrap();
        assert_eq!(space.len(), 4);
        assert_eq!(space.edge_count(), 8);
    }

    #[test]
    fn test_two_blocks_on_strip_enumerate_both_orders() {
        let board = Board::new(3, 1).unwrap();
        let space = enumerate_all(&board, &[unit(0, 0, 0), unit(1, 1, 0)]).unwrap();
        assert_eq!(space.len(), 6);
        assert_eq!(space.states()[0], key("1,2,0"));
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let (board, pieces) = parse_board("AAB\n..B\nC..").unwrap();
        let space = enumerate_all(&board, &pieces).unwrap();
        assert!(space.edge_count() > 0);
        for (from, edges) in space.graph().iter() {
            for to in edges {
                assert!(space.graph().has_edge(to, from), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_enumeration_has_no_self_loops() {
        let (board, pieces) = parse_board("AAB\n..B\nC..").unwrap();
        let space = enumerate_all(&board, &pieces).unwrap();
        for (from, edges) in space.graph().iter() {
            assert!(!edges.contains(from), "{from}");
            assert!(!space.graph().has_edge(from, from));
        }
    }

    #[test]
    fn test_enumeration_contains_reachable_states() {
        let (board, pieces) = parse_board("A...\nA.BB\nAA..\n...C").unwrap();
        let all = enumerate_all(&board, &pieces).unwrap();
        let reachable = explore(&board, &pieces).unwrap();
        assert!(all.len() >= reachable.len());
        for state in reachable.states() {
            assert!(all.contains(state), "{state}");
        }
    }

    #[test]
    fn test_single_move_apart() {
        let a = vec![unit(0, 0, 0), unit(1, 2, 0)];
        assert!(single_move_apart(&a, &[unit(0, 1, 0), unit(1, 2, 0)]));
        assert!(!single_move_apart(&a, &[unit(0, 1, 0), unit(1, 1, 1)]));
        assert!(!single_move_apart(&a, &[unit(0, 0, 0), unit(1, 0, 2)]));
        assert!(!single_move_apart(&a, &a));
        assert!(!single_move_apart(&a, &a[..1]));
    }

    #[test]
    fn test_unreachable_states_are_swapped_orders() {
        let board = Board::new(3, 1).unwrap();
        let pieces = [unit(0, 0, 0), unit(1, 1, 0)];
        let all = enumerate_all(&board, &pieces).unwrap();

        let mut unreachable = unreachable_from(&all, &key("1,2,0"));
        unreachable.sort();
        assert_eq!(unreachable, vec![key("0,2,1"), key("2,0,1"), key("2,1,0")]);
        assert_eq!(unreachable_from(&all, &key("9,9,9")).len(), 6);
    }

    #[test]
    fn test_oversized_piece_has_no_placements() {
        let board = Board::new(2, 2).unwrap();
        let pieces = [Piece::rect(0, 0, 0, 3, 1).unwrap()];
        assert!(enumerate_all(&board, &pieces).unwrap().is_empty());
        assert!(matches!(enumerate_all(&board, &[]), Err(Error::NoPieces)));
    }
}
