//! Scene module
//!
//! Provides the node arena and lifecycle, tags, per-node component
//! repositories, tree traversal and the component helper functions.

mod behavior;
mod component_repository;
mod graph;
mod input;
mod node;
mod tag_set;
pub mod node_component_helper;
pub mod tags;
pub mod traversal;

pub use behavior::{NodeBehavior, NodeContext};
pub use component_repository::{shared, Capability, ComponentRepository, Shared};
pub use graph::{SceneGraph, StructuralChange};
pub use input::InputEvent;
pub use node::{NodeId, NodeKey, SceneNode};
pub use tag_set::TagSet;
pub use traversal::{LogicOp, PreOrder};
