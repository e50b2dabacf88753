/// SceneNode: one entry of the scene arena.
///
/// A node carries an identity, a tag set, its component repository, the
/// tree links and an optional behaviour. Nodes are created and linked
/// through `SceneGraph`; the links are arena keys, so a parent never holds
/// a strong reference back up the tree.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use slotmap::new_key_type;
use super::behavior::NodeBehavior;
use super::component_repository::ComponentRepository;
use super::tag_set::TagSet;

new_key_type! {
    /// Stable key of a node inside a `SceneGraph`
    pub struct NodeKey;
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide node identity
///
/// Ids are handed out monotonically at construction and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the scene tree
pub struct SceneNode {
    id: NodeId,
    pub(crate) tags: TagSet,
    pub(crate) components: ComponentRepository,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
}

impl SceneNode {
    pub(crate) fn new(tags: TagSet, behavior: Option<Box<dyn NodeBehavior>>) -> Self {
        let id = NodeId::next();
        Self {
            id,
            tags,
            components: ComponentRepository::new(format!("node {}", id)),
            parent: None,
            children: Vec::new(),
            behavior,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagSet {
        &mut self.tags
    }

    pub fn components(&self) -> &ComponentRepository {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRepository {
        &mut self.components
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether a behaviour is attached (absent while its hook is running)
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    /// `node #id {tags}`, used in error messages
    pub fn describe(&self) -> String {
        format!("node {} {}", self.id, self.tags)
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("tags", &self.tags)
            .field("components", &self.components.capability_labels())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}
