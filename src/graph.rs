//! In-memory edge snapshot and graph traversals.
//!
//! A `GraphSnapshot` is rebuilt from the relationship store on every call;
//! adjacency lists preserve edge creation order, which fixes traversal order
//! (and therefore critical-path tie-breaking) deterministically.
//!
//! `parent_child` is assumed acyclic, but every recursive walk still carries
//! a visited set so corrupted data cannot recurse forever.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::relationship::{RelationKind, RelationshipRecord};

/// Point-in-time adjacency view over the relationship graph
#[derive(Debug, Default)]
pub struct GraphSnapshot {
    /// `depends_on` edges: source -> targets (the tasks the source depends on)
    depends_on: HashMap<String, Vec<String>>,
    /// `parent_child` edges: parent -> children
    children: HashMap<String, Vec<String>>,
    /// `parent_child` edges: child -> parent (first edge wins)
    parent: HashMap<String, String>,
    /// One-hop `blocks`/`blocked_by` neighbours in either direction
    blocking: HashMap<String, Vec<String>>,
}

/// A node of the reconstructed parent/child hierarchy
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TreeNode {
    pub id: String,
    pub children: Vec<TreeNode>,
}

impl GraphSnapshot {
    /// Build a snapshot from edge records.
    ///
    /// Callers pass edges in creation order (the relationship store loads
    /// them that way); insertion order is preserved per adjacency list.
    pub fn from_edges(edges: &[RelationshipRecord]) -> Self {
        let mut snapshot = GraphSnapshot::default();

        for edge in edges {
            let source = edge.source_task_id.clone();
            let target = edge.target_task_id.clone();
            match edge.kind {
                RelationKind::DependsOn => {
                    snapshot.depends_on.entry(source).or_default().push(target);
                }
                RelationKind::ParentChild => {
                    snapshot
                        .children
                        .entry(source.clone())
                        .or_default()
                        .push(target.clone());
                    snapshot.parent.entry(target).or_insert(source);
                }
                RelationKind::Blocks | RelationKind::BlockedBy => {
                    snapshot
                        .blocking
                        .entry(source.clone())
                        .or_default()
                        .push(target.clone());
                    snapshot.blocking.entry(target).or_default().push(source);
                }
                RelationKind::RequiredFor
                | RelationKind::RelatedTo
                | RelationKind::Duplicates
                | RelationKind::DuplicatedBy => {}
            }
        }

        snapshot
    }

    /// Direct dependencies of a task, in edge creation order
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.depends_on.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct children of a task, in edge creation order
    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent of a task, if any
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parent.get(id).map(String::as_str)
    }

    /// Would adding `source -> target` close a cycle in the `depends_on`
    /// subgraph?
    ///
    /// Walks outward from `target` along existing dependencies; reaching
    /// `source` means the proposed edge closes a loop. Visited nodes are
    /// pruned, so shared sub-dependencies are explored once and the check
    /// runs in O(V+E).
    pub fn would_create_cycle(&self, source: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![target];

        while let Some(current) = stack.pop() {
            if current == source {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for next in self.dependencies_of(current) {
                if !visited.contains(next.as_str()) {
                    stack.push(next);
                }
            }
        }

        false
    }

    /// All tasks transitively reachable from `root` via `depends_on`,
    /// depth-first, each visited once, in discovery order. The root itself
    /// is not included. A task with no dependencies yields an empty chain.
    pub fn dependency_chain(&self, root: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root.to_string());
        let mut chain = Vec::new();
        self.collect_chain(root, &mut visited, &mut chain);
        chain
    }

    fn collect_chain(&self, id: &str, visited: &mut HashSet<String>, chain: &mut Vec<String>) {
        for next in self.dependencies_of(id) {
            if visited.insert(next.clone()) {
                chain.push(next.clone());
                self.collect_chain(next, visited, chain);
            }
        }
    }

    /// Reconstruct the `parent_child` hierarchy rooted at `root`.
    pub fn hierarchy_tree(&self, root: &str) -> TreeNode {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root.to_string());
        self.build_tree(root, &mut visited)
    }

    fn build_tree(&self, id: &str, visited: &mut HashSet<String>) -> TreeNode {
        let mut node = TreeNode {
            id: id.to_string(),
            children: Vec::new(),
        };
        for child in self.children_of(id) {
            if visited.insert(child.clone()) {
                node.children.push(self.build_tree(child, visited));
            }
        }
        node
    }

    /// Tasks related to `id` via `blocks`/`blocked_by` in either direction,
    /// one hop only, sorted and deduplicated.
    pub fn blocking_set(&self, id: &str) -> Vec<String> {
        let mut set: Vec<String> = self
            .blocking
            .get(id)
            .map(|neighbours| neighbours.clone())
            .unwrap_or_default();
        set.sort();
        set.dedup();
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn edge(source: &str, target: &str, kind: RelationKind) -> RelationshipRecord {
        RelationshipRecord {
            id: format!("{source}->{target}"),
            source_task_id: source.to_string(),
            target_task_id: target.to_string(),
            kind,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cycle_detected_transitively() {
        let edges = vec![
            edge("a", "b", RelationKind::DependsOn),
            edge("b", "c", RelationKind::DependsOn),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        assert!(snapshot.would_create_cycle("c", "a"));
        assert!(snapshot.would_create_cycle("b", "a"));
        assert!(!snapshot.would_create_cycle("a", "c"));
        assert!(!snapshot.would_create_cycle("d", "a"));
    }

    #[test]
    fn cycle_check_terminates_on_shared_subgraphs() {
        // Diamond: a -> b, a -> c, b -> d, c -> d
        let edges = vec![
            edge("a", "b", RelationKind::DependsOn),
            edge("a", "c", RelationKind::DependsOn),
            edge("b", "d", RelationKind::DependsOn),
            edge("c", "d", RelationKind::DependsOn),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        assert!(snapshot.would_create_cycle("d", "a"));
        assert!(!snapshot.would_create_cycle("a", "d"));
    }

    #[test]
    fn chain_is_discovery_ordered_and_visits_once() {
        let edges = vec![
            edge("a", "b", RelationKind::DependsOn),
            edge("a", "c", RelationKind::DependsOn),
            edge("b", "d", RelationKind::DependsOn),
            edge("c", "d", RelationKind::DependsOn),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        assert_eq!(snapshot.dependency_chain("a"), vec!["b", "d", "c"]);
        assert_eq!(snapshot.dependency_chain("d"), Vec::<String>::new());
    }

    #[test]
    fn tree_reconstructs_nesting() {
        let edges = vec![
            edge("root", "a", RelationKind::ParentChild),
            edge("root", "b", RelationKind::ParentChild),
            edge("a", "a1", RelationKind::ParentChild),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        let tree = snapshot.hierarchy_tree("root");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].id, "a");
        assert_eq!(tree.children[0].children[0].id, "a1");
        assert!(tree.children[1].children.is_empty());

        assert_eq!(snapshot.parent_of("a1"), Some("a"));
        assert_eq!(snapshot.parent_of("root"), None);
    }

    #[test]
    fn tree_survives_corrupt_parent_cycle() {
        // a -> b -> a should not recurse forever
        let edges = vec![
            edge("a", "b", RelationKind::ParentChild),
            edge("b", "a", RelationKind::ParentChild),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        let tree = snapshot.hierarchy_tree("a");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].id, "b");
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn blocking_set_is_one_hop_both_directions() {
        let edges = vec![
            edge("a", "b", RelationKind::Blocks),
            edge("c", "a", RelationKind::BlockedBy),
            edge("b", "d", RelationKind::Blocks),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        // d is two hops from a and must not appear
        assert_eq!(snapshot.blocking_set("a"), vec!["b", "c"]);
        assert_eq!(snapshot.blocking_set("d"), vec!["b"]);
        assert!(snapshot.blocking_set("x").is_empty());
    }

    #[test]
    fn unrelated_kinds_do_not_enter_adjacency() {
        let edges = vec![
            edge("a", "b", RelationKind::RelatedTo),
            edge("a", "c", RelationKind::Duplicates),
        ];
        let snapshot = GraphSnapshot::from_edges(&edges);

        assert!(snapshot.dependency_chain("a").is_empty());
        assert!(snapshot.blocking_set("a").is_empty());
        assert!(snapshot.hierarchy_tree("a").children.is_empty());
    }
}
