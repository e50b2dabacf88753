/// Graph traversal and tag queries.
///
/// Every query walks the subtree in pre-order: a node is visited before its
/// descendants, siblings in child order. Results are therefore reproducible
/// for a given tree. No query fails; "nothing found" is `None` or an empty
/// vector.

use super::graph::SceneGraph;
use super::node::{NodeId, NodeKey};
use super::tag_set::TagSet;

/// How a tag query combines its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicOp {
    /// Node must carry every queried tag
    And,
    /// Node must carry at least one queried tag
    #[default]
    Or,
}

/// Tag predicate shared by every query
pub fn has_tags(node_tags: &TagSet, tags: &TagSet, op: LogicOp) -> bool {
    match op {
        LogicOp::And => node_tags.has_all(tags),
        LogicOp::Or => node_tags.has_any(tags),
    }
}

/// Pre-order iterator over a subtree
///
/// Uses an explicit stack, so tree depth is not bounded by the call stack.
/// Stale keys are skipped.
pub struct PreOrder<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeKey>,
}

impl<'a> PreOrder<'a> {
    pub fn new(graph: &'a SceneGraph, root: NodeKey) -> Self {
        Self {
            graph,
            stack: vec![root],
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        while let Some(key) = self.stack.pop() {
            let Some(node) = self.graph.node(key) else {
                continue;
            };
            self.stack.extend(node.children().iter().rev().copied());
            return Some(key);
        }
        None
    }
}

/// First node with identity `id`
pub fn find_by_id(graph: &SceneGraph, root: NodeKey, id: NodeId) -> Option<NodeKey> {
    PreOrder::new(graph, root).find(|&key| graph.id(key) == Some(id))
}

/// First node matching `tags` under `op`
pub fn find_one_with_tags(
    graph: &SceneGraph,
    root: NodeKey,
    tags: &TagSet,
    op: LogicOp,
) -> Option<NodeKey> {
    PreOrder::new(graph, root).find(|&key| matches(graph, key, tags, op))
}

/// Every node matching `tags` under `op`
pub fn find_all_with_tags(
    graph: &SceneGraph,
    root: NodeKey,
    tags: &TagSet,
    op: LogicOp,
) -> Vec<NodeKey> {
    PreOrder::new(graph, root)
        .filter(|&key| matches(graph, key, tags, op))
        .collect()
}

fn matches(graph: &SceneGraph, key: NodeKey, tags: &TagSet, op: LogicOp) -> bool {
    graph
        .tags(key)
        .map_or(false, |node_tags| has_tags(node_tags, tags, op))
}

#[cfg(test)]
#[path = "traversal_tests.rs"]
mod tests;
