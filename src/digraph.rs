//! Minimal directed graph over an index arena
//!
//! Vertices live in a slot vector and are addressed by [`NodeIndex`]. Indices
//! are never reused, so an index stays valid (or dangling, never aliased)
//! after removals. Outgoing and incoming adjacency are stored per slot as
//! sorted index sets, giving O(1) access to a vertex's neighbourhood and
//! deterministic iteration order.
//!
//! # Example
//!
//! ```
//! use guardminer::digraph::DiGraph;
//!
//! let mut g = DiGraph::new();
//! let a = g.add_vertex("a");
//! let b = g.add_vertex("b");
//! g.add_edge(a, b);
//!
//! assert_eq!(g.roots(), vec![a]);
//! assert!(g.to_dot(|v| v.to_string()).contains("v0 -> v1"));
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// Stable handle of a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    data: T,
    outgoing: BTreeSet<NodeIndex>,
    incoming: BTreeSet<NodeIndex>,
}

/// Directed graph with vertex payloads of type `T`
#[derive(Debug, Clone)]
pub struct DiGraph<T> {
    slots: Vec<Option<Slot<T>>>,
    live: usize,
    edges: usize,
}

impl<T> Default for DiGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DiGraph<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            edges: 0,
        }
    }

    pub fn add_vertex(&mut self, data: T) -> NodeIndex {
        let index = NodeIndex(self.slots.len());
        self.slots.push(Some(Slot {
            data,
            outgoing: BTreeSet::new(),
            incoming: BTreeSet::new(),
        }));
        self.live += 1;
        index
    }

    /// Remove a vertex and every edge touching it, returning its payload
    pub fn remove_vertex(&mut self, v: NodeIndex) -> Option<T> {
        let slot = self.slots.get_mut(v.index())?.take()?;
        self.live -= 1;

        for to in &slot.outgoing {
            if let Some(target) = self.slot_mut(*to) {
                target.incoming.remove(&v);
            }
        }
        for from in &slot.incoming {
            if let Some(source) = self.slot_mut(*from) {
                source.outgoing.remove(&v);
            }
        }
        self.edges -= slot.outgoing.len() + slot.incoming.len();

        Some(slot.data)
    }

    /// Add the edge `from -> to`
    ///
    /// Returns `false` if either endpoint is missing or the edge already
    /// exists. Self-loops are refused.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        if from == to || !self.contains_vertex(from) || !self.contains_vertex(to) {
            return false;
        }
        let inserted = self
            .slot_mut(from)
            .map(|slot| slot.outgoing.insert(to))
            .unwrap_or(false);
        if inserted {
            if let Some(slot) = self.slot_mut(to) {
                slot.incoming.insert(from);
            }
            self.edges += 1;
        }
        inserted
    }

    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex) -> bool {
        let removed = self
            .slot_mut(from)
            .map(|slot| slot.outgoing.remove(&to))
            .unwrap_or(false);
        if removed {
            if let Some(slot) = self.slot_mut(to) {
                slot.incoming.remove(&from);
            }
            self.edges -= 1;
        }
        removed
    }

    pub fn contains_vertex(&self, v: NodeIndex) -> bool {
        self.slot(v).is_some()
    }

    pub fn contains_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.slot(from)
            .map(|slot| slot.outgoing.contains(&to))
            .unwrap_or(false)
    }

    pub fn vertex(&self, v: NodeIndex) -> Option<&T> {
        self.slot(v).map(|slot| &slot.data)
    }

    /// Direct targets of `v`'s outgoing edges
    pub fn successors(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.slot(v).into_iter().flat_map(|slot| slot.outgoing.iter().copied())
    }

    /// Direct sources of `v`'s incoming edges
    pub fn predecessors(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.slot(v).into_iter().flat_map(|slot| slot.incoming.iter().copied())
    }

    pub fn out_degree(&self, v: NodeIndex) -> usize {
        self.slot(v).map(|slot| slot.outgoing.len()).unwrap_or(0)
    }

    pub fn in_degree(&self, v: NodeIndex) -> usize {
        self.slot(v).map(|slot| slot.incoming.len()).unwrap_or(0)
    }

    /// Live vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = (NodeIndex, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|slot| (NodeIndex(i), &slot.data))
        })
    }

    /// All edges, grouped by source in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.vertices()
            .flat_map(move |(from, _)| self.successors(from).map(move |to| (from, to)))
    }

    /// Vertices without incoming edges
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.vertices()
            .map(|(v, _)| v)
            .filter(|v| self.in_degree(*v) == 0)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.live
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Graphviz description: one labelled box per vertex, one arrow per edge
    ///
    /// `label` output is placed inside a quoted DOT string; double quotes are
    /// escaped here, other escapes (such as `\n`) pass through.
    pub fn to_dot(&self, label: impl Fn(&T) -> String) -> String {
        let mut out = String::from("digraph {\n");
        for (v, data) in self.vertices() {
            let text = label(data).replace('"', "\\\"");
            out.push_str(&format!("\t{} [label=\"{}\", shape=box]\n", v, text));
        }
        for (from, to) in self.edges() {
            out.push_str(&format!("\t{} -> {}\n", from, to));
        }
        out.push_str("}\n");
        out
    }

    fn slot(&self, v: NodeIndex) -> Option<&Slot<T>> {
        self.slots.get(v.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, v: NodeIndex) -> Option<&mut Slot<T>> {
        self.slots.get_mut(v.index()).and_then(Option::as_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (DiGraph<&'static str>, [NodeIndex; 4]) {
        let mut g = DiGraph::new();
        let a = g.add_vertex("a");
        let b = g.add_vertex("b");
        let c = g.add_vertex("c");
        let d = g.add_vertex("d");
        g.add_edge(a, b);
        g.add_edge(a, c);
        g.add_edge(b, d);
        g.add_edge(c, d);
        (g, [a, b, c, d])
    }

    #[test]
    fn test_empty_graph() {
        let g: DiGraph<u8> = DiGraph::new();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.roots().is_empty());
        assert_eq!(g.to_dot(|v| v.to_string()), "digraph {\n}\n");
    }

    #[test]
    fn test_neighbours_both_directions() {
        let (g, [a, b, c, d]) = diamond();
        assert_eq!(g.successors(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(g.predecessors(d).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(g.out_degree(a), 2);
        assert_eq!(g.in_degree(a), 0);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(g.roots(), vec![a]);
    }

    #[test]
    fn test_duplicate_and_self_edges_refused() {
        let (mut g, [a, b, ..]) = diamond();
        assert!(!g.add_edge(a, b));
        assert!(!g.add_edge(a, a));
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn test_remove_edge() {
        let (mut g, [a, b, _, d]) = diamond();
        assert!(g.remove_edge(a, b));
        assert!(!g.remove_edge(a, b));
        assert!(!g.contains_edge(a, b));
        assert_eq!(g.predecessors(b).count(), 0);
        assert_eq!(g.roots(), vec![a, b]);
        assert!(g.contains_edge(b, d));
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn test_indices_are_positional_and_never_reused() {
        let mut g = DiGraph::new();
        let ids: Vec<NodeIndex> = (0..1000).map(|i| g.add_vertex(i)).collect();
        for (i, v) in ids.iter().enumerate() {
            assert_eq!(v.index(), i);
        }
        g.remove_vertex(ids[3]);
        let fresh = g.add_vertex(1000);
        assert_eq!(fresh.index(), 1000);
        assert!(!g.contains_vertex(ids[3]));
        assert_eq!(g.vertex(fresh), Some(&1000));
        assert_eq!(fresh.to_string(), "v1000");
    }

    #[test]
    fn test_remove_vertex_drops_touching_edges() {
        let (mut g, [a, b, c, d]) = diamond();
        assert_eq!(g.remove_vertex(b), Some("b"));
        assert_eq!(g.remove_vertex(b), None);

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.successors(a).collect::<Vec<_>>(), vec![c]);
        assert_eq!(g.predecessors(d).collect::<Vec<_>>(), vec![c]);
        assert!(!g.add_edge(a, b));
    }

    #[test]
    fn test_indices_not_reused() {
        let mut g = DiGraph::new();
        let a = g.add_vertex(1);
        g.remove_vertex(a);
        let b = g.add_vertex(2);
        assert_ne!(a, b);
        assert_eq!(g.vertex(a), None);
        assert_eq!(g.vertex(b), Some(&2));
    }

    #[test]
    fn test_dot_output_escapes_quotes() {
        let mut g = DiGraph::new();
        let a = g.add_vertex("say \"hi\"");
        let b = g.add_vertex("x");
        g.add_edge(a, b);

        let dot = g.to_dot(|v| v.to_string());
        assert!(dot.starts_with("digraph {\n"));
        assert!(dot.contains("\tv0 [label=\"say \\\"hi\\\"\", shape=box]\n"));
        assert!(dot.contains("\tv0 -> v1\n"));
        assert!(dot.ends_with("}\n"));
    }
}
