//! Depth-first and breadth-first walks over a [`Graph`]
//!
//! Both walks follow outgoing edges in insertion order and keep a visited
//! set, so they terminate on cyclic graphs and are deterministic for a fixed
//! edge order. A start ID that is not in the graph produces no visits.

use super::node::Node;
use super::store::Graph;
use super::types::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

impl Graph {
    /// Pre-order depth-first walk from `start`
    ///
    /// Visits the start node, then each outgoing target in edge order,
    /// descending fully into one branch before the next. Uses an explicit
    /// stack; the visit order matches the recursive formulation.
    pub fn dfs<F>(&self, start: &str, mut visit: F)
    where
        F: FnMut(&Node),
    {
        let Some((start_id, _)) = self.node_entry(start) else {
            return;
        };

        let mut visited: FxHashSet<&NodeId> = FxHashSet::default();
        let mut stack = vec![start_id];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some((_, node)) = self.node_entry(id.as_str()) else {
                continue;
            };
            visit(node);

            // Reverse so the first edge is popped first
            stack.extend(
                node.targets()
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .filter(|t| !visited.contains(t)),
            );
        }
    }

    /// Level-order breadth-first walk from `start`
    ///
    /// Nodes are marked visited when enqueued, not when visited, so no node
    /// is queued twice.
    pub fn bfs<F>(&self, start: &str, mut visit: F)
    where
        F: FnMut(&Node),
    {
        let Some((start_id, start_node)) = self.node_entry(start) else {
            return;
        };

        let mut visited: FxHashSet<&NodeId> = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(start_id);
        queue.push_back(start_node);

        while let Some(node) = queue.pop_front() {
            visit(node);
            for target in node.targets() {
                if visited.insert(target) {
                    if let Some((_, next)) = self.node_entry(target.as_str()) {
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    /// IDs in depth-first visit order
    pub fn dfs_order(&self, start: &str) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.dfs(start, |n| order.push(n.id().clone()));
        order
    }

    /// IDs in breadth-first visit order
    pub fn bfs_order(&self, start: &str) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.bfs(start, |n| order.push(n.id().clone()));
        order
    }

    /// Fewest-hops path from `start` to `end`, both ends included
    ///
    /// `None` if either node is missing or `end` is unreachable.
    pub fn shortest_path(&self, start: &str, end: &str) -> Option<Vec<NodeId>> {
        let (start_id, start_node) = self.node_entry(start)?;
        let (end_id, _) = self.node_entry(end)?;
        if start_id == end_id {
            return Some(vec![start_id.clone()]);
        }

        let mut parents: FxHashMap<&NodeId, &NodeId> = FxHashMap::default();
        let mut visited: FxHashSet<&NodeId> = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(start_id);
        queue.push_back(start_node);

        'search: while let Some(node) = queue.pop_front() {
            for target in node.targets() {
                if visited.insert(target) {
                    parents.insert(target, node.id());
                    if target == end_id {
                        break 'search;
                    }
                    if let Some((_, next)) = self.node_entry(target.as_str()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        if !parents.contains_key(end_id) {
            return None;
        }
        let mut path = vec![end_id.clone()];
        let mut current = end_id;
        while let Some(&parent) = parents.get(current) {
            path.push(parent.clone());
            current = parent;
        }
        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{Graph, NodeId, PropertyMap};

    fn graph_with_edges(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.add_node(*id, PropertyMap::new());
        }
        for (start, end) in edges {
            graph.add_edge(start, end, "knows", PropertyMap::new()).unwrap();
        }
        graph
    }

    fn ids(order: &[NodeId]) -> Vec<&str> {
        order.iter().map(NodeId::as_str).collect()
    }

    #[test]
    fn test_cycle_order() {
        let graph = graph_with_edges(&["1", "2", "3"], &[("1", "2"), ("2", "3"), ("3", "1")]);

        assert_eq!(ids(&graph.bfs_order("1")), vec!["1", "2", "3"]);
        assert_eq!(ids(&graph.dfs_order("1")), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_branching_order_distinguishes_walks() {
        let graph = graph_with_edges(
            &["1", "2", "3", "4"],
            &[("1", "2"), ("1", "3"), ("2", "4")],
        );

        assert_eq!(ids(&graph.bfs_order("1")), vec!["1", "2", "3", "4"]);
        assert_eq!(ids(&graph.dfs_order("1")), vec!["1", "2", "4", "3"]);
    }

    #[test]
    fn test_missing_start_visits_nothing() {
        let graph = graph_with_edges(&["1"], &[]);
        let mut visits = 0;
        graph.dfs("nope", |_| visits += 1);
        graph.bfs("nope", |_| visits += 1);
        assert_eq!(visits, 0);
    }

    #[test]
    fn test_diamond_visits_each_node_once() {
        let graph = graph_with_edges(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("a", "b")],
        );

        assert_eq!(ids(&graph.bfs_order("a")), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(&graph.dfs_order("a")), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_edge_order_is_observable() {
        let graph = graph_with_edges(&["1", "2", "3"], &[("1", "3"), ("1", "2")]);
        assert_eq!(ids(&graph.bfs_order("1")), vec!["1", "3", "2"]);
        assert_eq!(ids(&graph.dfs_order("1")), vec!["1", "3", "2"]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let names: Vec<String> = (0..50_000).map(|i| i.to_string()).collect();
        let mut graph = Graph::new();
        for name in &names {
            graph.add_node(name.as_str(), PropertyMap::new());
        }
        for pair in names.windows(2) {
            graph
                .add_edge(&pair[0], &pair[1], "next", PropertyMap::new())
                .unwrap();
        }

        assert_eq!(graph.dfs_order("0").len(), 50_000);
    }

    #[test]
    fn test_shortest_path() {
        let graph = graph_with_edges(
            &["1", "2", "3", "4", "5"],
            &[("1", "2"), ("2", "3"), ("3", "4"), ("1", "4")],
        );

        let path = graph.shortest_path("1", "4").unwrap();
        assert_eq!(ids(&path), vec!["1", "4"]);

        let path = graph.shortest_path("2", "4").unwrap();
        assert_eq!(ids(&path), vec!["2", "3", "4"]);

        assert_eq!(ids(&graph.shortest_path("3", "3").unwrap()), vec!["3"]);
        assert!(graph.shortest_path("4", "1").is_none());
        assert!(graph.shortest_path("1", "5").is_none());
        assert!(graph.shortest_path("1", "missing").is_none());
    }
}
