use selkie_graphlib::Graph;

fn sorted_neighbors(g: &Graph<(), ()>, id: &str) -> Vec<String> {
    let mut out: Vec<String> = g.neighbors(id).into_iter().map(|s| s.to_string()).collect();
    out.sort();
    out
}

/// Every adjacency entry must be backed by at least one edge, and every edge must be reflected
/// in the adjacency index.
fn assert_adjacency_consistent(g: &Graph<(), ()>) {
    for id in g.node_ids() {
        for n in g.neighbors(&id) {
            assert!(g.has_node(n), "adjacency of {id} references missing node {n}");
            let backed = g
                .edges()
                .any(|e| (e.from == id && e.to == n) || (e.bidirectional && e.to == id && e.from == n));
            assert!(backed, "adjacency {id} -> {n} has no backing edge");
        }
    }
    for e in g.edges() {
        assert!(g.is_connected(&e.from, &e.to), "edge {} missing from adjacency", e.id);
        if e.bidirectional {
            assert!(g.is_connected(&e.to, &e.from), "edge {} missing reverse adjacency", e.id);
        }
    }
}

#[test]
fn add_edge_populates_adjacency_in_edge_direction() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("e1", "a", "b", false, ());

    assert!(g.is_connected("a", "b"));
    assert!(!g.is_connected("b", "a"));
    assert_eq!(g.degree("a"), 1);
    assert_eq!(g.degree("b"), 0);
}

#[test]
fn bidirectional_edge_populates_both_directions() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("e1", "a", "b", true, ());

    assert!(g.is_connected("a", "b"));
    assert!(g.is_connected("b", "a"));
    assert_eq!(sorted_neighbors(&g, "a"), vec!["b".to_string()]);
    assert_eq!(sorted_neighbors(&g, "b"), vec!["a".to_string()]);
}

#[test]
fn set_edge_ensures_missing_endpoints() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("e1", "a", "b", false, ());
    assert!(g.has_node("a"));
    assert!(g.has_node("b"));
    assert_eq!(g.node_count(), 2);
}

#[test]
fn remove_node_cascades_edge_removal() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("ab", "a", "b", true, ());
    g.set_edge("bc", "b", "c", true, ());
    g.set_edge("ca", "c", "a", true, ());

    assert!(g.remove_node("b"));
    assert_eq!(g.node_count(), 2);
    assert_eq!(g.edge_count(), 1);
    assert!(g.edge("ca").is_some());
    assert!(!g.is_connected("a", "b"));
    assert!(!g.is_connected("c", "b"));
    assert_adjacency_consistent(&g);
}

#[test]
fn remove_edge_is_idempotent() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("e1", "a", "b", false, ());

    assert!(g.remove_edge("e1"));
    assert!(!g.remove_edge("e1"));
    assert_eq!(g.edge_count(), 0);
    assert!(!g.is_connected("a", "b"));
    assert_eq!(g.node_count(), 2);
}

#[test]
fn remove_missing_node_returns_false() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_node("a", ());
    assert!(!g.remove_node("zzz"));
    assert_eq!(g.node_count(), 1);
}

#[test]
fn degree_counts_distinct_neighbors_not_edges() {
    let mut g: Graph<(), ()> = Graph::new();
    g.set_edge("e1", "a", "b", false, ());
    g.set_edge("e2", "a", "b", false, ());
    g.set_edge("e3", "a", "c", false, ());

    assert_eq!(g.degree("a"), 2);
    assert!(g.remove_edge("e1"));
    assert_eq!(g.degree("a"), 2);
    assert!(g.remove_edge("e2"));
    assert_eq!(g.degree("a"), 1);
}

// Deterministic xorshift op stream; exercises interleaved add/remove sequences against the
// adjacency-consistency invariant.
#[test]
fn adjacency_stays_consistent_under_interleaved_mutation() {
    let mut g: Graph<(), ()> = Graph::new();
    let mut state: u64 = 0x9E3779B97F4A7C15;
    let mut next = move || {
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        state.wrapping_mul(0x2545F4914F6CDD1D)
    };

    for step in 0..500 {
        let r = next();
        let a = format!("n{}", r % 12);
        let b = format!("n{}", (r >> 8) % 12);
        let edge_id = format!("e{}", (r >> 16) % 40);
        match (r >> 32) % 5 {
            0 => {
                g.set_node(a, ());
            }
            1 => {
                g.set_edge(edge_id, a, b, (r >> 24) % 2 == 0, ());
            }
            2 => {
                let _ = g.remove_edge(&edge_id);
            }
            3 => {
                let _ = g.remove_node(&a);
            }
            _ => {
                g.set_edge(edge_id, a, b, true, ());
            }
        }

        if step % 25 == 0 {
            assert_adjacency_consistent(&g);
        }
    }
    assert_adjacency_consistent(&g);
}
