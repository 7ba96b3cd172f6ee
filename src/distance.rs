//! Pairwise target distances between states.
//!
//! The distance between two states is the sum over piece indices of the
//! Manhattan distance between the two anchors. A piece missing on one side
//! stands at a fixed off-board sentinel, so states with different piece counts
//! still get a large but finite distance. Raw sums are scaled and capped so the
//! layout's springs never see extreme rest lengths.

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::grid::{decode, StateKey};
use crate::pieces::{Board, Coord, Piece};

/// Where a piece absent from one of the two states is assumed to be.
pub const MISSING_PIECE: Coord = (-100, -100);

/// Raw distances are divided by this before capping.
pub const DISTANCE_SCALE: f64 = 10.0;

/// Largest target distance handed to the layout.
pub const MAX_DISTANCE: f64 = 15.0;

/// Unscaled distance between two configurations.
pub fn raw_distance(a: &[Piece], b: &[Piece]) -> i64 {
    let anchor = |pieces: &[Piece], k: usize| {
        pieces
            .get(k)
            .map_or(MISSING_PIECE, |piece| (piece.x, piece.y))
    };

    (0..a.len().max(b.len()))
        .map(|k| {
            let (ax, ay) = anchor(a, k);
            let (bx, by) = anchor(b, k);
            i64::from((ax - bx).abs()) + i64::from((ay - by).abs())
        })
        .sum()
}

/// Scales and caps a raw distance into `[0, MAX_DISTANCE]`.
#[inline]
pub fn normalize(raw: i64) -> f64 {
    (raw as f64 / DISTANCE_SCALE).min(MAX_DISTANCE)
}

/// Dense, symmetric matrix of normalized distances over an ordered state list.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
    index: FxHashMap<StateKey, usize>,
}

impl DistanceMatrix {
    /// Number of states covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Distance between the states at positions `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Position of `key` in the list the matrix was built from.
    #[inline]
    pub fn index_of(&self, key: &StateKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Distance between two keys, if both are covered.
    pub fn between(&self, a: &StateKey, b: &StateKey) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }
}

/// Builds the distance matrix for `states`, decoding each once.
///
/// Costs O(n² · p) for n states of p pieces. Fails only if a key does not
/// decode on `board`.
pub fn distance_matrix(board: &Board, states: &[StateKey]) -> Result<DistanceMatrix> {
    let configurations = states
        .iter()
        .map(|key| decode(board, key))
        .collect::<Result<Vec<_>>>()?;

    let size = states.len();
    let mut values = vec![0.0; size * size];
    for i in 0..size {
        for j in (i + 1)..size {
            let distance = normalize(raw_distance(&configurations[i], &configurations[j]));
            values[i * size + j] = distance;
            values[j * size + i] = distance;
        }
    }

    let index = states
        .iter()
        .enumerate()
        .map(|(i, key)| (key.clone(), i))
        .collect();

    Ok(DistanceMatrix {
        size,
        values,
        index,
    })
}
