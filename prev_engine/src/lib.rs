/*!
# PreV Engine

Scene-graph component system with a strategy-driven render protocol.

The scene is an arena of nodes addressed by keys. Each node carries a tag
set, a repository of capability components (`Rc<RefCell<dyn Trait>>`),
optional behaviour hooks and a list of children. Tag queries over the tree
find "the" main camera, light or shadows node; renderers walk the tree
every pass and resolve what they need fresh on every draw.

## Architecture

- **scene**: nodes, tags, component repositories, traversal, lifecycle
- **component**: transform, camera, light, shadows, bounding volume, render,
  animation render, terrain, terrain manager, selectable, ray casting
- **asset**: meshes, materials, uploaded models, skeletal animations
- **render**: opaque GPU provider, recording backend, uniform rings,
  `Renderer`, `StrategyRenderer` and `MasterRenderer`
- **math**: frustum, rays and bounding shapes

Everything is reachable through the [`prev`] namespace module.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod math;
pub mod asset;
pub mod scene;
pub mod component;
pub mod render;

// Main prev namespace module
pub mod prev {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton and configuration
    pub use crate::engine::Engine;
    pub use crate::config::EngineConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{CapturingLogger, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Component sub-module
    pub mod component {
        pub use crate::component::*;
    }

    // Asset sub-module
    pub mod asset {
        pub use crate::asset::*;
    }

    // Render sub-module with all rendering types
    pub mod render {
        pub use crate::render::*;
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }
}

// Re-export math library at crate root
pub use glam;
