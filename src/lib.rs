//! Sliding Block State Space Library
//!
//! Explores the configuration space of sliding-block puzzles: every
//! arrangement reachable by single-cell moves, every legal arrangement at all,
//! coarser and finer views of the same space, and a 3D embedding for display.

pub mod aggregate;
pub mod config;
pub mod distance;
pub mod enumerate;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod levels;
pub mod persistence;
pub mod pieces;
pub mod placement;
pub mod search;
pub mod space;

pub use error::{Error, Result};

use pieces::{Board, Piece};
use space::StateSpace;

/// A strategy that turns a board and a piece list into a state space.
///
/// Lets callers pick between the reachable-only search and the full placement
/// enumeration without matching on a mode flag.
pub trait SpaceBuilder {
    fn build(&self, board: &Board, pieces: &[Piece]) -> Result<StateSpace>;
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use enumerate::AllPlacements;
    use pieces::load_preset;
    use search::Reachability;

    #[test]
    fn test_builders_differ_only_in_coverage() {
        let (board, pieces) = load_preset("pair").unwrap();
        let builders: [&dyn SpaceBuilder; 2] = [&Reachability, &AllPlacements];

        let sizes: Vec<(&str, usize)> = builders
            .iter()
            .map(|builder| (builder.name(), builder.build(&board, &pieces).unwrap().len()))
            .collect();
        assert_eq!(sizes, vec![("reachable", 3), ("all", 6)]);
    }
}
