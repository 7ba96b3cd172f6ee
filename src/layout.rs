//! Force-directed 3D embedding of a state graph.
//!
//! Each iteration:
//! - every pair of states repels with an inverse-square force, the distance
//!   floored before squaring so near-coincident nodes stay finite
//! - every graph edge acts as a spring whose rest length is the distance
//!   model's target for that pair
//! - a weak pull draws every node towards the current centroid
//! - the summed force is added to the position, scaled by a fixed damping
//!
//! Nodes start on a spiral that is a pure function of their index, so the
//! whole layout is deterministic for a given state order and iteration count.

use std::f64::consts::TAU;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{Tunables, BASE_ITERATIONS};
use crate::distance::DistanceMatrix;
use crate::geometry::Point3;
use crate::grid::StateKey;
use crate::space::StateGraph;

/// Golden ratio, used as the spiral's angular step.
const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Force constants for [`force_directed`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParams {
    pub iterations: usize,
    pub repulsion: f64,
    pub attraction: f64,
    pub damping: f64,
    pub centering: f64,
    /// Separations below this are treated as this for repulsion.
    pub min_separation: f64,
    /// Added to separations used as divisors.
    pub softening: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: BASE_ITERATIONS,
            repulsion: 8.0,
            attraction: 0.05,
            damping: 0.92,
            centering: 0.01,
            min_separation: 5.0,
            softening: 0.1,
        }
    }
}

impl LayoutParams {
    pub fn from_tunables(tunables: &Tunables) -> Self {
        Self {
            iterations: tunables.layout_iterations(),
            ..Self::default()
        }
    }
}

/// Computed positions, one per state, in the order the states were given.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    states: Vec<StateKey>,
    positions: Vec<Point3>,
    index: FxHashMap<StateKey, usize>,
}

impl Layout {
    pub fn states(&self) -> &[StateKey] {
        &self.states
    }

    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    pub fn position(&self, key: &StateKey) -> Option<Point3> {
        self.index.get(key).map(|&i| self.positions[i])
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, Point3)> {
        self.states.iter().zip(self.positions.iter().copied())
    }
}

/// Starting position of the `index`-th of `count` nodes.
///
/// Radius grows linearly from 20 to 50 while the angle advances by a golden
/// fraction of a turn; z spreads over `[-5, 5]`.
pub fn spiral_position(index: usize, count: usize) -> Point3 {
    let t = index as f64 / count.saturating_sub(1).max(1) as f64;
    let radius = 20.0 + t * 30.0;
    let angle = t * TAU * GOLDEN_RATIO;
    Point3::new(angle.cos() * radius, angle.sin() * radius, (t - 0.5) * 10.0)
}

/// Lays out `states` in 3D.
///
/// Only edges of `graph` whose endpoints are both in `states` and covered by
/// `distances` act as springs.
pub fn force_directed(
    states: &[StateKey],
    graph: &StateGraph,
    distances: &DistanceMatrix,
    params: &LayoutParams,
) -> Layout {
    let count = states.len();
    let index: FxHashMap<StateKey, usize> = states
        .iter()
        .enumerate()
        .map(|(i, key)| (key.clone(), i))
        .collect();

    let springs: Vec<(usize, usize, f64)> = states
        .iter()
        .enumerate()
        .flat_map(|(i, from)| {
            let index = &index;
            graph.neighbors(from).iter().filter_map(move |to| {
                let j = *index.get(to)?;
                Some((i, j, distances.between(from, to)?))
            })
        })
        .collect();

    let mut positions: Vec<Point3> = (0..count).map(|i| spiral_position(i, count)).collect();
    let mut forces = vec![Point3::ZERO; count];

    for _ in 0..params.iterations {
        forces.fill(Point3::ZERO);

        for i in 0..count {
            for j in (i + 1)..count {
                let delta = positions[i] - positions[j];
                let separation = delta.length() + params.softening;
                let floored = separation.max(params.min_separation);
                let push = delta * (params.repulsion / (floored * floored) / separation);
                forces[i] += push;
                forces[j] -= push;
            }
        }

        for &(i, j, rest_length) in &springs {
            let delta = positions[i] - positions[j];
            let actual = delta.length();
            let pull = delta * (params.attraction * (actual - rest_length) / (actual + params.softening));
            forces[i] -= pull;
            forces[j] += pull;
        }

        let Some(center) = Point3::centroid(positions.iter().copied()) else {
            break;
        };
        for (position, force) in positions.iter_mut().zip(&forces) {
            let centered = *force - (*position - center) * params.centering;
            *position += centered * params.damping;
        }
    }

    debug!(
        states = count,
        springs = springs.len(),
        iterations = params.iterations,
        "layout finished"
    );

    Layout {
        states: states.to_vec(),
        positions,
        index,
    }
}
