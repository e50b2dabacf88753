/// SceneGraph: arena owning every scene node.
///
/// Nodes are stored in a SlotMap and addressed by `NodeKey`. A key that no
/// longer resolves behaves like an expired weak reference: lenient accessors
/// return `None`, strict operations fail with `InvalidNode`.
///
/// Structural changes requested while a tree is being walked go through the
/// deferred queue (`schedule_*`) and are applied by
/// `commit_structural_changes` at the end of the frame.

use std::collections::VecDeque;
use std::rc::Rc;
use slotmap::SlotMap;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::{engine_bail, engine_debug, engine_trace};
use super::behavior::{NodeBehavior, NodeContext};
use super::component_repository::ComponentRepository;
use super::input::InputEvent;
use super::node::{NodeId, NodeKey, SceneNode};
use super::tag_set::TagSet;
use super::traversal::PreOrder;

/// A structural change waiting for `commit_structural_changes`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralChange {
    AddChild { parent: NodeKey, child: NodeKey },
    /// Shut down, detach and drop `child`
    Remove { parent: NodeKey, child: NodeKey },
    Shutdown(NodeKey),
}

pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    config: Rc<EngineConfig>,
    pending: VecDeque<StructuralChange>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SceneGraph {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            config: Rc::new(config),
            pending: VecDeque::new(),
        }
    }

    /// Configuration handed to behaviours
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ===== NODE CREATION =====

    /// Create a detached node without behaviour
    pub fn create_node(&mut self, tags: impl Into<TagSet>) -> NodeKey {
        self.nodes.insert(SceneNode::new(tags.into(), None))
    }

    /// Create a detached node driven by `behavior`
    pub fn create_node_with(
        &mut self,
        tags: impl Into<TagSet>,
        behavior: impl NodeBehavior + 'static,
    ) -> NodeKey {
        self.nodes.insert(SceneNode::new(tags.into(), Some(Box::new(behavior))))
    }

    // ===== ACCESSORS =====

    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn id(&self, key: NodeKey) -> Option<NodeId> {
        self.nodes.get(key).map(SceneNode::id)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    /// Children in insertion order (empty for a stale key)
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map_or(&[], |node| node.children.as_slice())
    }

    pub fn is_root(&self, key: NodeKey) -> bool {
        self.parent(key).is_none()
    }

    /// Follow parent links up to the top of the tree
    pub fn root_of(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn tags(&self, key: NodeKey) -> Option<&TagSet> {
        self.nodes.get(key).map(|node| &node.tags)
    }

    pub fn tags_mut(&mut self, key: NodeKey) -> Option<&mut TagSet> {
        self.nodes.get_mut(key).map(|node| &mut node.tags)
    }

    pub fn components(&self, key: NodeKey) -> Option<&ComponentRepository> {
        self.nodes.get(key).map(|node| &node.components)
    }

    pub fn components_mut(&mut self, key: NodeKey) -> Option<&mut ComponentRepository> {
        self.nodes.get_mut(key).map(|node| &mut node.components)
    }

    /// Diagnostic description of a node, or of a stale key
    pub fn describe(&self, key: NodeKey) -> String {
        match self.nodes.get(key) {
            Some(node) => node.describe(),
            None => format!("stale node key {:?}", key),
        }
    }

    // ===== TREE STRUCTURE =====

    /// Link `child` under `parent`
    ///
    /// # Errors
    ///
    /// `InvalidNode` if a key is stale, if `child` already has a parent or
    /// if both keys are the same node.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        if parent == child {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "cannot add {} as a child of itself", self.describe(child));
        }
        if !self.contains(parent) {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "add_child: parent is a {}", self.describe(parent));
        }
        let Some(child_node) = self.nodes.get(child) else {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "add_child: child is a {}", self.describe(child));
        };
        if child_node.parent.is_some() {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "{} already has a parent", child_node.describe());
        }
        debug_assert!(
            self.root_of(parent) != child,
            "add_child would create a cycle"
        );

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Unlink `child` from `parent`; the child stays alive as a detached root
    ///
    /// # Errors
    ///
    /// `InvalidNode` if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let position = self.nodes
            .get(parent)
            .and_then(|node| node.children.iter().position(|&c| c == child));

        let Some(position) = position else {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "{} is not a child of {}", self.describe(child), self.describe(parent));
        };

        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.remove(position);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        Ok(())
    }

    /// Drop a detached subtree from the arena
    ///
    /// Components still registered in the subtree are released (and reported
    /// by their repository); call `shutdown` first for an orderly teardown.
    ///
    /// # Errors
    ///
    /// `InvalidNode` if `key` is stale or still attached to a parent.
    pub fn destroy(&mut self, key: NodeKey) -> Result<()> {
        let Some(node) = self.nodes.get(key) else {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "cannot destroy a {}", self.describe(key));
        };
        if node.parent.is_some() {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "cannot destroy attached {}", node.describe());
        }
        self.drop_subtree(key);
        Ok(())
    }

    fn drop_subtree(&mut self, key: NodeKey) {
        let doomed: Vec<NodeKey> = PreOrder::new(self, key).collect();
        for doomed_key in doomed {
            self.nodes.remove(doomed_key);
        }
    }

    // ===== LIFECYCLE =====

    /// Initialize a subtree: self, then children in order, then the
    /// `children_initialized` hook
    pub fn init(&mut self, key: NodeKey) -> Result<()> {
        if self.is_root(key) {
            engine_debug!("prev::SceneGraph", "initializing tree at {}", self.describe(key));
        }
        self.init_node(key)
    }

    fn init_node(&mut self, key: NodeKey) -> Result<()> {
        engine_trace!("prev::SceneGraph", "init {}", self.describe(key));
        self.with_behavior(key, |behavior, ctx| behavior.init(ctx))?;
        for child in self.children(key).to_vec() {
            self.init_node(child)?;
        }
        self.with_behavior(key, |behavior, ctx| behavior.children_initialized(ctx))
    }

    /// Update a subtree, parents before children
    pub fn update(&mut self, key: NodeKey, delta_time: f32) -> Result<()> {
        self.with_behavior(key, |behavior, ctx| behavior.update(ctx, delta_time))?;
        for child in self.children(key).to_vec() {
            self.update(child, delta_time)?;
        }
        Ok(())
    }

    /// Shut a subtree down
    ///
    /// The behaviour hook runs first with components still registered, then
    /// the children are shut down and dropped, then the node's components,
    /// tags and behaviour are cleared. The key keeps resolving to an empty
    /// node.
    ///
    /// A node whose own hook fails keeps its behaviour, components and
    /// children, so the shutdown can be retried.
    pub fn shutdown(&mut self, key: NodeKey) -> Result<()> {
        if !self.contains(key) {
            engine_bail!("prev::SceneGraph", @InvalidNode,
                "cannot shut down a {}", self.describe(key));
        }
        if self.is_root(key) {
            engine_debug!("prev::SceneGraph", "shutting down tree at {}", self.describe(key));
        }
        self.shutdown_node(key)
    }

    fn shutdown_node(&mut self, key: NodeKey) -> Result<()> {
        engine_trace!("prev::SceneGraph", "shutdown {}", self.describe(key));
        let behavior = self.nodes.get_mut(key).and_then(|node| node.behavior.take());
        if let Some(mut behavior) = behavior {
            if let Err(error) = self.run_detached(key, behavior.as_mut(), |behavior, ctx| behavior.shutdown(ctx)) {
                if let Some(node) = self.nodes.get_mut(key) {
                    if node.behavior.is_none() {
                        node.behavior = Some(behavior);
                    }
                }
                return Err(error);
            }
        }

        let children = self.children(key).to_vec();
        for &child in &children {
            self.shutdown_node(child)?;
        }
        for child in children {
            self.drop_subtree(child);
        }

        if let Some(node) = self.nodes.get_mut(key) {
            node.children.clear();
            node.components.clear();
            node.tags.clear();
            node.behavior = None;
        }
        Ok(())
    }

    /// Deliver an input event to every behaviour of a subtree, in pre-order
    pub fn dispatch_event(&mut self, key: NodeKey, event: &InputEvent) -> Result<()> {
        let visit: Vec<NodeKey> = PreOrder::new(self, key).collect();
        for node in visit {
            self.with_behavior(node, |behavior, ctx| behavior.on_event(ctx, event))?;
        }
        Ok(())
    }

    fn with_behavior<F>(&mut self, key: NodeKey, hook: F) -> Result<()>
    where
        F: FnOnce(&mut dyn NodeBehavior, &mut NodeContext<'_>) -> Result<()>,
    {
        let Some(mut behavior) = self.nodes.get_mut(key).and_then(|node| node.behavior.take()) else {
            return Ok(());
        };
        let result = self.run_detached(key, behavior.as_mut(), hook);
        if let Some(node) = self.nodes.get_mut(key) {
            if node.behavior.is_none() {
                node.behavior = Some(behavior);
            }
        }
        result
    }

    fn run_detached<F>(&mut self, key: NodeKey, behavior: &mut dyn NodeBehavior, hook: F) -> Result<()>
    where
        F: FnOnce(&mut dyn NodeBehavior, &mut NodeContext<'_>) -> Result<()>,
    {
        let config = Rc::clone(&self.config);
        let mut ctx = NodeContext {
            graph: self,
            node: key,
            config: &config,
        };
        hook(behavior, &mut ctx)
    }

    // ===== DEFERRED STRUCTURAL CHANGES =====

    pub fn schedule_add_child(&mut self, parent: NodeKey, child: NodeKey) {
        self.pending.push_back(StructuralChange::AddChild { parent, child });
    }

    /// Shut `child` down at commit time, then detach and drop it
    pub fn schedule_removal(&mut self, parent: NodeKey, child: NodeKey) {
        self.pending.push_back(StructuralChange::Remove { parent, child });
    }

    pub fn schedule_shutdown(&mut self, key: NodeKey) {
        self.pending.push_back(StructuralChange::Shutdown(key));
    }

    /// Changes queued since the last commit, oldest first
    pub fn pending_changes(&self) -> impl Iterator<Item = &StructuralChange> {
        self.pending.iter()
    }

    /// Apply every queued change in FIFO order
    ///
    /// Stops at the first failing change; the remaining changes stay queued.
    /// A change that does not fit the tree is dropped. A change whose
    /// shutdown hook fails goes back to the front of the queue, with the
    /// node still attached.
    pub fn commit_structural_changes(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Some(change) = self.pending.pop_front() {
            match change {
                StructuralChange::AddChild { parent, child } => self.add_child(parent, child)?,
                StructuralChange::Remove { parent, child } => {
                    if !self.children(parent).contains(&child) {
                        engine_bail!("prev::SceneGraph", @InvalidNode,
                            "cannot remove {}: not a child of {}", self.describe(child), self.describe(parent));
                    }
                    self.shutdown_or_requeue(change, child)?;
                    self.remove_child(parent, child)?;
                    self.destroy(child)?;
                }
                StructuralChange::Shutdown(key) => {
                    if !self.contains(key) {
                        engine_bail!("prev::SceneGraph", @InvalidNode,
                            "cannot shut down a {}", self.describe(key));
                    }
                    self.shutdown_or_requeue(change, key)?;
                }
            }
            applied += 1;
        }
        if applied > 0 {
            engine_trace!("prev::SceneGraph", "committed {} structural change(s)", applied);
        }
        Ok(applied)
    }

    fn shutdown_or_requeue(&mut self, change: StructuralChange, key: NodeKey) -> Result<()> {
        let result = self.shutdown(key);
        if result.is_err() {
            self.pending.push_front(change);
        }
        result
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
