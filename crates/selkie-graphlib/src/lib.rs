#![forbid(unsafe_code)]

//! Graph container APIs used by `selkie`.
//!
//! The layout engine operates on value-copy snapshots of this container, so `Graph` is `Clone`
//! and never hands out references that outlive a snapshot. Nodes and edges are keyed by
//! caller-supplied string ids; an adjacency index is maintained eagerly so neighbor queries do
//! not scan the edge list.

use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Structural identity of an edge: endpoints and directionality, separate from whatever label
/// the engine attaches. Directionality drives the adjacency index, so it lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub bidirectional: bool,
}

#[derive(Debug, Clone)]
struct NodeEntry<N> {
    id: String,
    label: N,
}

#[derive(Debug, Clone)]
struct EdgeEntry<E> {
    record: EdgeRecord,
    label: E,
}

/// An id-keyed graph with node labels `N` and edge labels `E`.
///
/// Adjacency is reference-counted per ordered pair: two parallel edges over the same endpoints
/// contribute two counts, and the neighbor entry survives until the last one is removed.
#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    nodes: Vec<NodeEntry<N>>,
    node_index: HashMap<String, usize>,

    edges: Vec<EdgeEntry<E>>,
    edge_index: HashMap<String, usize>,

    adjacency: HashMap<String, HashMap<String, usize>>,
}

impl<N, E> Default for Graph<N, E>
where
    N: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E>
where
    N: Default,
{
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            adjacency: HashMap::default(),
        }
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Inserts a node, or replaces its label if the id is already present.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        if let Some(&idx) = self.node_index.get(&id) {
            self.nodes[idx].label = label;
            return self;
        }
        let idx = self.nodes.len();
        self.nodes.push(NodeEntry {
            id: id.clone(),
            label,
        });
        self.node_index.insert(id, idx);
        self
    }

    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return self;
        }
        self.set_node(id, N::default())
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx].label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.node_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.nodes[idx].label)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &N)> {
        self.nodes.iter().map(|n| (n.id.as_str(), &n.label))
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut N),
    {
        for n in &mut self.nodes {
            f(&n.id, &mut n.label);
        }
    }

    /// Removes a node and every edge touching it. Returns `false` if the id is unknown.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(idx) = self.node_index.remove(id) else {
            return false;
        };

        self.nodes.remove(idx);
        for i in idx..self.nodes.len() {
            let node_id = self.nodes[i].id.as_str();
            if let Some(v) = self.node_index.get_mut(node_id) {
                *v = i;
            }
        }

        let incident: Vec<String> = self
            .edges
            .iter()
            .filter(|e| e.record.from == id || e.record.to == id)
            .map(|e| e.record.id.clone())
            .collect();
        for edge_id in incident {
            let _ = self.remove_edge(&edge_id);
        }

        self.adjacency.remove(id);
        true
    }

    pub fn has_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    /// Inserts an edge, ensuring both endpoints exist (missing ones get `N::default()`).
    ///
    /// Re-using an existing edge id replaces the whole edge: the old record is unlinked from
    /// the adjacency index before the new one is linked.
    pub fn set_edge(
        &mut self,
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        bidirectional: bool,
        label: E,
    ) -> &mut Self {
        let id = id.into();
        let from = from.into();
        let to = to.into();
        self.ensure_node(from.clone());
        self.ensure_node(to.clone());

        let record = EdgeRecord {
            id: id.clone(),
            from,
            to,
            bidirectional,
        };

        if let Some(&idx) = self.edge_index.get(&id) {
            let old = self.edges[idx].record.clone();
            self.unlink(&old);
            self.link(&record);
            self.edges[idx] = EdgeEntry { record, label };
            return self;
        }

        self.link(&record);
        let idx = self.edges.len();
        self.edges.push(EdgeEntry { record, label });
        self.edge_index.insert(id, idx);
        self
    }

    pub fn edge(&self, id: &str) -> Option<&E> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx].label)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut E> {
        self.edge_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.edges[idx].label)
    }

    pub fn edge_record(&self, id: &str) -> Option<&EdgeRecord> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx].record)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_ids(&self) -> Vec<String> {
        self.edges.iter().map(|e| e.record.id.clone()).collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeRecord> {
        self.edges.iter().map(|e| &e.record)
    }

    pub fn for_each_edge<F>(&self, mut f: F)
    where
        F: FnMut(&EdgeRecord, &E),
    {
        for e in &self.edges {
            f(&e.record, &e.label);
        }
    }

    /// Removes an edge by id. Idempotent: removing an absent id returns `false` and changes
    /// nothing.
    pub fn remove_edge(&mut self, id: &str) -> bool {
        let Some(idx) = self.edge_index.remove(id) else {
            return false;
        };
        let record = self.edges[idx].record.clone();
        self.unlink(&record);
        self.edges.remove(idx);
        for i in idx..self.edges.len() {
            let edge_id = self.edges[i].record.id.as_str();
            if let Some(v) = self.edge_index.get_mut(edge_id) {
                *v = i;
            }
        }
        true
    }

    /// Neighbor ids reachable from `id` through the adjacency index.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(adj) = self.adjacency.get(id) else {
            return Vec::new();
        };
        adj.keys().map(|s| s.as_str()).collect()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map(|adj| adj.len()).unwrap_or(0)
    }

    pub fn is_connected(&self, from: &str, to: &str) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|adj| adj.contains_key(to))
    }

    fn link(&mut self, record: &EdgeRecord) {
        self.link_one(&record.from, &record.to);
        if record.bidirectional {
            self.link_one(&record.to, &record.from);
        }
    }

    fn unlink(&mut self, record: &EdgeRecord) {
        self.unlink_one(&record.from, &record.to);
        if record.bidirectional {
            self.unlink_one(&record.to, &record.from);
        }
    }

    fn link_one(&mut self, from: &str, to: &str) {
        *self
            .adjacency
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_insert(0) += 1;
    }

    fn unlink_one(&mut self, from: &str, to: &str) {
        let Some(adj) = self.adjacency.get_mut(from) else {
            return;
        };
        if let Some(count) = adj.get_mut(to) {
            *count -= 1;
            if *count == 0 {
                adj.remove(to);
            }
        }
        if adj.is_empty() {
            self.adjacency.remove(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Graph;

    #[test]
    fn replacing_an_edge_id_relinks_adjacency() {
        let mut g: Graph<(), ()> = Graph::new();
        g.set_edge("e", "a", "b", false, ());
        assert!(g.is_connected("a", "b"));

        g.set_edge("e", "a", "c", true, ());
        assert!(!g.is_connected("a", "b"));
        assert!(g.is_connected("a", "c"));
        assert!(g.is_connected("c", "a"));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn parallel_edges_keep_the_neighbor_entry_alive() {
        let mut g: Graph<(), ()> = Graph::new();
        g.set_edge("e1", "a", "b", false, ());
        g.set_edge("e2", "a", "b", false, ());

        assert!(g.remove_edge("e1"));
        assert!(g.is_connected("a", "b"));
        assert!(g.remove_edge("e2"));
        assert!(!g.is_connected("a", "b"));
    }
}
