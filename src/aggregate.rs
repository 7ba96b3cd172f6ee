//! Positional bucketing of laid-out states into meta-nodes.
//!
//! States are cut into consecutive chunks in the order given (no spatial
//! clustering). Each chunk becomes one node at the centroid of its members'
//! layout positions, and each pair of chunks joined by at least one real edge
//! gets exactly one meta-edge. Every state must be laid out, so the nodes
//! always number `ceil(n / chunk_size)` and cover each state exactly once.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::geometry::Point3;
use crate::grid::StateKey;
use crate::layout::Layout;
use crate::space::StateGraph;

/// A group of consecutive states drawn as one node.
#[derive(Clone, Debug, Serialize)]
pub struct MetaNode {
    pub id: usize,
    pub centroid: Point3,
    pub members: Vec<StateKey>,
}

/// One edge between two meta-nodes, `from < to`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetaEdge {
    pub from: usize,
    pub to: usize,
    pub start: Point3,
    pub end: Point3,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Aggregation {
    pub nodes: Vec<MetaNode>,
    pub edges: Vec<MetaEdge>,
}

impl Aggregation {
    /// Member states of a meta-node.
    pub fn states_for(&self, id: usize) -> Option<&[StateKey]> {
        self.nodes.get(id).map(|node| node.members.as_slice())
    }

    /// The meta-node a state belongs to.
    pub fn group_of(&self, key: &StateKey) -> Option<usize> {
        self.nodes
            .iter()
            .find(|node| node.members.contains(key))
            .map(|node| node.id)
    }
}

/// Groups `states` into chunks of at most `chunk_size` and links the chunks.
///
/// Fails with [`Error::Unpositioned`] if `layout` misses any of `states`.
pub fn aggregate(
    states: &[StateKey],
    layout: &Layout,
    graph: &StateGraph,
    chunk_size: usize,
) -> Result<Aggregation> {
    if chunk_size == 0 {
        return Err(Error::ZeroChunkSize);
    }

    let mut group_of: FxHashMap<&StateKey, usize> = FxHashMap::default();
    let mut nodes = Vec::with_capacity(states.len().div_ceil(chunk_size));

    for chunk in states.chunks(chunk_size) {
        let positions = chunk
            .iter()
            .map(|key| {
                layout
                    .position(key)
                    .ok_or_else(|| Error::Unpositioned(key.to_string()))
            })
            .collect::<Result<Vec<Point3>>>()?;
        let Some(centroid) = Point3::centroid(positions) else {
            continue;
        };
        let id = nodes.len();
        for key in chunk {
            group_of.insert(key, id);
        }
        nodes.push(MetaNode {
            id,
            centroid,
            members: chunk.to_vec(),
        });
    }

    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut edges = Vec::new();
    for from in states {
        let Some(&group_a) = group_of.get(from) else {
            continue;
        };
        for to in graph.neighbors(from) {
            let Some(&group_b) = group_of.get(to) else {
                continue;
            };
            if group_a == group_b {
                continue;
            }
            let pair = (group_a.min(group_b), group_a.max(group_b));
            if seen.insert(pair) {
                edges.push(MetaEdge {
                    from: pair.0,
                    to: pair.1,
                    start: nodes[pair.0].centroid,
                    end: nodes[pair.1].centroid,
                });
            }
        }
    }

    Ok(Aggregation { nodes, edges })
}
