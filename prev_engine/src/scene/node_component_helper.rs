/// NodeComponentHelper: component access across the tree.
///
/// Combines tag queries with repository lookups. `find_one` and the
/// `get_*` functions are strict (the caller states the component exists);
/// `find_component` and `has_component` are lenient lookups.
///
/// Registering through `add_component` keeps the node's tags in step with
/// its repository, so tag filters see the capability without looking inside
/// the repository.

use crate::error::Result;
use crate::engine_bail;
use super::component_repository::{Capability, Shared};
use super::graph::SceneGraph;
use super::node::NodeKey;
use super::tag_set::TagSet;
use super::traversal::{self, LogicOp};

/// First `C` of the first node matching `tags`
///
/// # Errors
///
/// - `NodeNotFound` if no node matches
/// - `ComponentNotFound` if the first matching node lacks `C`
pub fn find_one<C: Capability + ?Sized>(
    graph: &SceneGraph,
    root: NodeKey,
    tags: &TagSet,
    op: LogicOp,
) -> Result<Shared<C>> {
    let Some(node) = traversal::find_one_with_tags(graph, root, tags, op) else {
        engine_bail!("prev::NodeComponentHelper", @NodeNotFound,
            "no node matches {} ({:?}) under {}", tags, op, graph.describe(root));
    };
    get_component::<C>(graph, node)
}

/// Every `C` of every node matching `tags`, in pre-order
///
/// Empty when no node matches.
///
/// # Errors
///
/// `ComponentNotFound` if a matching node lacks `C`.
pub fn find_all<C: Capability + ?Sized>(
    graph: &SceneGraph,
    root: NodeKey,
    tags: &TagSet,
    op: LogicOp,
) -> Result<Vec<Shared<C>>> {
    let mut result = Vec::new();
    for node in traversal::find_all_with_tags(graph, root, tags, op) {
        result.extend(get_all_components::<C>(graph, node)?);
    }
    Ok(result)
}

/// Register `handle` on `node` and add `tags` to the node
pub fn add_component<C: Capability + ?Sized>(
    graph: &mut SceneGraph,
    node: NodeKey,
    handle: Shared<C>,
    tags: impl Into<TagSet>,
) -> Result<()> {
    let Some(scene_node) = graph.node_mut(node) else {
        engine_bail!("prev::NodeComponentHelper", @InvalidNode,
            "cannot add {} to a stale node", C::LABEL);
    };
    scene_node.components.add(handle);
    scene_node.tags += tags.into();
    Ok(())
}

/// Remove every `C` from `node` and subtract `tags` from the node
///
/// # Errors
///
/// `ComponentNotFound` if `C` is not registered; tags are left untouched.
pub fn remove_components<C: Capability + ?Sized>(
    graph: &mut SceneGraph,
    node: NodeKey,
    tags: impl Into<TagSet>,
) -> Result<Vec<Shared<C>>> {
    let Some(scene_node) = graph.node_mut(node) else {
        engine_bail!("prev::NodeComponentHelper", @InvalidNode,
            "cannot remove {} from a stale node", C::LABEL);
    };
    let removed = scene_node.components.remove::<C>()?;
    scene_node.tags -= tags.into();
    Ok(removed)
}

/// First `C` of `node`
///
/// # Errors
///
/// `InvalidNode` for a stale key, `ComponentNotFound` if `C` is missing.
pub fn get_component<C: Capability + ?Sized>(graph: &SceneGraph, node: NodeKey) -> Result<Shared<C>> {
    let Some(scene_node) = graph.node(node) else {
        engine_bail!("prev::NodeComponentHelper", @InvalidNode,
            "cannot read {} from a stale node", C::LABEL);
    };
    match scene_node.components.find_one::<C>() {
        Some(handle) => Ok(handle),
        None => engine_bail!("prev::NodeComponentHelper", @ComponentNotFound,
            "{} is not registered on {}", C::LABEL, scene_node.describe()),
    }
}

/// Every `C` of `node`
///
/// # Errors
///
/// `InvalidNode` for a stale key, `ComponentNotFound` if `C` is missing.
pub fn get_all_components<C: Capability + ?Sized>(
    graph: &SceneGraph,
    node: NodeKey,
) -> Result<Vec<Shared<C>>> {
    let Some(scene_node) = graph.node(node) else {
        engine_bail!("prev::NodeComponentHelper", @InvalidNode,
            "cannot read {} from a stale node", C::LABEL);
    };
    let handles = scene_node.components.find_all::<C>();
    if handles.is_empty() {
        engine_bail!("prev::NodeComponentHelper", @ComponentNotFound,
            "{} is not registered on {}", C::LABEL, scene_node.describe());
    }
    Ok(handles)
}

/// First `C` of `node`, if the node is live and has one
pub fn find_component<C: Capability + ?Sized>(graph: &SceneGraph, node: NodeKey) -> Option<Shared<C>> {
    graph.components(node).and_then(|components| components.find_one::<C>())
}

/// Whether `node` is present, live and carries `C`
pub fn has_component<C: Capability + ?Sized>(graph: &SceneGraph, node: Option<NodeKey>) -> bool {
    node.and_then(|key| graph.components(key))
        .map_or(false, |components| components.contains::<C>())
}

#[cfg(test)]
#[path = "node_component_helper_tests.rs"]
mod tests;
