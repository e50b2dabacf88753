//! Asset module
//!
//! CPU-side meshes, materials and animation clips, and models (meshes
//! uploaded through a GPU resource provider).

mod animation;
mod material;
mod mesh;
mod model;

pub use animation::{Animation, BoneTrack, Keyframe};
pub use material::Material;
pub use mesh::{Mesh, MeshDesc, MeshNode, MeshPart, VertexComponent, VertexLayout};
pub use model::Model;
