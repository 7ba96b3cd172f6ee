//! Explored state spaces: an ordered state set plus its transition graph.

use rustc_hash::FxHashMap;

use crate::grid::StateKey;

/// Directed adjacency between state keys.
///
/// Adjacency lists are created on first use, never hold a key twice, and never
/// contain the source key itself.
#[derive(Clone, Debug, Default)]
pub struct StateGraph {
    adjacency: FxHashMap<StateKey, Vec<StateKey>>,
    edge_count: usize,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `from -> to`. Returns `false` for self-loops and duplicates.
    pub fn add_edge(&mut self, from: &StateKey, to: &StateKey) -> bool {
        if from == to {
            return false;
        }
        let edges = self.adjacency.entry(from.clone()).or_default();
        if edges.contains(to) {
            return false;
        }
        edges.push(to.clone());
        self.edge_count += 1;
        true
    }

    /// Keys reachable from `key` in one move, in discovery order.
    pub fn neighbors(&self, key: &StateKey) -> &[StateKey] {
        self.adjacency.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn has_edge(&self, from: &StateKey, to: &StateKey) -> bool {
        self.neighbors(from).contains(to)
    }

    /// Total number of directed edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Every source key with its adjacency list, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &[StateKey])> {
        self.adjacency
            .iter()
            .map(|(from, edges)| (from, edges.as_slice()))
    }
}

/// A set of distinct states in discovery order, with their transition graph.
#[derive(Clone, Debug, Default)]
pub struct StateSpace {
    states: Vec<StateKey>,
    index: FxHashMap<StateKey, usize>,
    graph: StateGraph,
}

impl StateSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state. Returns `false` if it was already present.
    pub fn insert(&mut self, key: StateKey) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.states.len());
        self.states.push(key);
        true
    }

    /// Records a transition between two states; see [`StateGraph::add_edge`].
    pub fn add_edge(&mut self, from: &StateKey, to: &StateKey) -> bool {
        self.graph.add_edge(from, to)
    }

    #[inline]
    pub fn contains(&self, key: &StateKey) -> bool {
        self.index.contains_key(key)
    }

    /// Position of `key` in discovery order.
    #[inline]
    pub fn index_of(&self, key: &StateKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    #[inline]
    pub fn states(&self) -> &[StateKey] {
        &self.states
    }

    #[inline]
    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> StateKey {
        text.parse().unwrap()
    }

    #[test]
    fn test_graph_rejects_self_loops_and_duplicates() {
        let mut graph = StateGraph::new();
        let a = key("1,0");
        let b = key("0,1");
        assert!(!graph.add_edge(&a, &a));
        assert!(graph.add_edge(&a, &b));
        assert!(!graph.add_edge(&a, &b));
        assert!(graph.add_edge(&b, &a));
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(&a, &b));
        assert!(graph.neighbors(&key("9,9")).is_empty());
    }

    #[test]
    fn test_space_keeps_discovery_order() {
        let mut space = StateSpace::new();
        assert!(space.insert(key("0,1")));
        assert!(space.insert(key("1,0")));
        assert!(!space.insert(key("0,1")));
        assert_eq!(space.len(), 2);
        assert_eq!(space.index_of(&key("1,0")), Some(1));
        assert_eq!(space.states()[0], key("0,1"));
    }
}
