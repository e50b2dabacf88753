/// GPU resource provider and command recording seams.
///
/// The scene layer never talks to a graphics API directly. Pipelines,
/// buffers, images, samplers and descriptor sets are created through a
/// `GpuResourceProvider` and referred to by opaque slotmap handles; draw
/// commands are recorded into a `CommandList`.

use slotmap::new_key_type;
use crate::error::Result;

new_key_type! {
    pub struct PipelineHandle;
    pub struct BufferHandle;
    pub struct ImageHandle;
    pub struct SamplerHandle;
    pub struct DescriptorSetHandle;
}

// ===== DESCRIPTORS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    /// Per-instance vertex data
    Instance,
    Index,
    Uniform,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Rgba8,
    R32Float,
    Depth32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Array layers (shadow cascades use one layer each)
    pub layers: u32,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address_mode: AddressMode,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: Filter::Linear,
            address_mode: AddressMode::Repeat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Graphics pipeline description
///
/// Shader code is owned by the provider and selected by `name`; the
/// description only lists the binding slots the pipeline exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDesc {
    pub name: String,
    /// Uniform buffer slot names (e.g. "uboVS")
    pub uniform_slots: Vec<String>,
    /// Combined image/sampler slot names (e.g. "colorSampler")
    pub sampler_slots: Vec<String>,
    pub depth_test: bool,
    pub depth_write: bool,
    pub blending: bool,
    pub cull_mode: CullMode,
    /// Whether the vertex stage reads a per-instance buffer at binding 1
    pub instanced: bool,
}

impl PipelineDesc {
    /// Opaque, depth-tested pipeline with back-face culling
    pub fn opaque(name: &str, uniform_slots: &[&str], sampler_slots: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            uniform_slots: uniform_slots.iter().map(|s| s.to_string()).collect(),
            sampler_slots: sampler_slots.iter().map(|s| s.to_string()).collect(),
            depth_test: true,
            depth_write: true,
            blending: false,
            cull_mode: CullMode::Back,
            instanced: false,
        }
    }

    /// Additive-blended pipeline that tests depth without writing it
    pub fn blended(name: &str, uniform_slots: &[&str], sampler_slots: &[&str]) -> Self {
        Self {
            depth_write: false,
            blending: true,
            cull_mode: CullMode::None,
            ..Self::opaque(name, uniform_slots, sampler_slots)
        }
    }

    pub fn with_instancing(mut self) -> Self {
        self.instanced = true;
        self
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }
}

/// Uniform buffer range bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBinding {
    pub buffer: BufferHandle,
    pub offset: u64,
    pub range: u64,
}

/// Image and sampler bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBinding {
    pub image: ImageHandle,
    pub sampler: SamplerHandle,
}

/// Resources to write into a descriptor set, keyed by slot name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderBindings {
    uniforms: Vec<(String, UniformBinding)>,
    images: Vec<(String, ImageBinding)>,
}

impl ShaderBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_uniform(&mut self, slot: &str, binding: UniformBinding) -> &mut Self {
        self.uniforms.push((slot.to_string(), binding));
        self
    }

    pub fn bind_image(&mut self, slot: &str, image: ImageHandle, sampler: SamplerHandle) -> &mut Self {
        self.images.push((slot.to_string(), ImageBinding { image, sampler }));
        self
    }

    pub fn uniforms(&self) -> &[(String, UniformBinding)] {
        &self.uniforms
    }

    pub fn images(&self) -> &[(String, ImageBinding)] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty() && self.images.is_empty()
    }
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Full-depth viewport covering this rectangle
    pub fn viewport(&self) -> Viewport {
        Viewport {
            x: self.x as f32,
            y: self.y as f32,
            width: self.width as f32,
            height: self.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

// ===== PROVIDER =====

/// Factory and owner of GPU resources
///
/// Every method that takes a handle fails with `InvalidResource` when the
/// handle is unknown or already destroyed.
pub trait GpuResourceProvider {
    /// Minimum offset alignment for uniform buffer bindings
    fn uniform_alignment(&self) -> u64;

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle>;
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) -> Result<()>;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle>;
    fn destroy_buffer(&mut self, buffer: BufferHandle) -> Result<()>;

    /// Copy `bytes` into `buffer` starting at `offset`
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, bytes: &[u8]) -> Result<()>;

    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle>;
    fn destroy_image(&mut self, image: ImageHandle) -> Result<()>;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle>;
    fn destroy_sampler(&mut self, sampler: SamplerHandle) -> Result<()>;

    /// Write `bindings` into a descriptor set laid out for `pipeline`
    ///
    /// Slots must be declared by the pipeline's description.
    fn update_descriptor_set(
        &mut self,
        pipeline: PipelineHandle,
        bindings: &ShaderBindings,
    ) -> Result<DescriptorSetHandle>;
}

// ===== COMMAND LIST =====

/// Command list for recording rendering commands
pub trait CommandList {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<()>;

    /// Bind a descriptor set to the currently bound pipeline's layout
    fn bind_descriptor_set(&mut self, pipeline: PipelineHandle, set: DescriptorSetHandle) -> Result<()>;

    /// Bind a vertex buffer
    ///
    /// # Arguments
    ///
    /// * `buffer` - Buffer to bind
    /// * `offset` - Offset into the buffer in bytes
    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()>;

    /// Bind an index buffer
    ///
    /// # Arguments
    ///
    /// * `buffer` - Buffer to bind
    /// * `offset` - Offset into the buffer in bytes
    /// * `index_type` - Type of indices (U16 or U32)
    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Bind the per-instance vertex buffer (binding 1)
    fn bind_instance_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()>;

    /// Draw `instance_count` copies of an indexed range
    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<()>;
}
