/// NodeBehavior: per-node lifecycle hooks.
///
/// A behaviour is what a "derived node" adds on top of tags and components:
/// a terrain tile registering with its manager, a player reacting to keys.
/// Every hook defaults to a no-op. Hooks receive a `NodeContext` that grants
/// mutable access to the whole graph; while a hook runs its behaviour is
/// detached from the node, so the hook can freely mutate its own node.

use crate::config::EngineConfig;
use crate::error::Result;
use super::component_repository::ComponentRepository;
use super::graph::SceneGraph;
use super::input::InputEvent;
use super::node::{NodeId, NodeKey};
use super::tag_set::TagSet;

pub trait NodeBehavior {
    /// Short name used in trace logs
    fn name(&self) -> &str {
        "NodeBehavior"
    }

    /// Runs before the node's children are initialized
    fn init(&mut self, _ctx: &mut NodeContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs once every child subtree has been initialized
    fn children_initialized(&mut self, _ctx: &mut NodeContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs before the node's children are updated
    fn update(&mut self, _ctx: &mut NodeContext<'_>, _delta_time: f32) -> Result<()> {
        Ok(())
    }

    /// Runs while the node's components are still registered
    fn shutdown(&mut self, _ctx: &mut NodeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut NodeContext<'_>, _event: &InputEvent) -> Result<()> {
        Ok(())
    }
}

/// Access granted to a behaviour hook
pub struct NodeContext<'a> {
    /// The whole scene arena
    pub graph: &'a mut SceneGraph,
    /// The node whose behaviour is running
    pub node: NodeKey,
    pub config: &'a EngineConfig,
}

impl NodeContext<'_> {
    pub fn id(&self) -> Option<NodeId> {
        self.graph.id(self.node)
    }

    pub fn tags(&self) -> Option<&TagSet> {
        self.graph.tags(self.node)
    }

    pub fn tags_mut(&mut self) -> Option<&mut TagSet> {
        self.graph.tags_mut(self.node)
    }

    pub fn components(&self) -> Option<&ComponentRepository> {
        self.graph.components(self.node)
    }

    pub fn components_mut(&mut self) -> Option<&mut ComponentRepository> {
        self.graph.components_mut(self.node)
    }

    /// Root of the tree this node belongs to
    pub fn root(&self) -> NodeKey {
        self.graph.root_of(self.node)
    }
}
