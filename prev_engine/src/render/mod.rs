//! Render module
//!
//! The GPU abstraction (opaque provider and command list), the recording
//! backend used headless, per-frame uniform rings, and the renderer
//! protocol: `Renderer`, the strategy-driven `StrategyRenderer`, the
//! per-pass `RenderContext` and the `MasterRenderer` that sequences passes.

pub mod context;
pub mod gpu;
mod master_renderer;
pub mod recording;
pub mod renderer;
pub mod strategies;
mod uniform_ring;

pub use context::{CameraView, RenderContext};
pub use gpu::{
    AddressMode, BufferDesc, BufferHandle, BufferUsage, CommandList, CullMode, DescriptorSetHandle, Filter,
    GpuResourceProvider, ImageDesc, ImageFormat, ImageHandle, IndexType, PipelineDesc, PipelineHandle, Rect2D,
    SamplerDesc, SamplerHandle, ShaderBindings, Viewport,
};
pub use master_renderer::{reflected_camera, reflection_clip_plane, refraction_clip_plane, MasterRenderer};
pub use recording::{RecordingCommandList, RecordingGpu};
pub use renderer::{
    DrawInput, Drawable, FrameStats, InstanceData, RenderFrame, RenderStrategy, Renderer, RendererStats, StrategyRenderer,
    TerrainLayering,
};
pub use strategies::{
    AnimationStrategy, DefaultStrategy, ParticlesStrategy, ShadowsStrategy, SkyBoxStrategy, TerrainStrategy,
    WaterStrategy,
};
pub use uniform_ring::{UniformRing, UniformSlot};
