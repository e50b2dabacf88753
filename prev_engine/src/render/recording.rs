/// Recording GPU provider and command list (no graphics API required)
///
/// `RecordingGpu` keeps every resource in a SlotMap and validates handles,
/// slot names and buffer ranges the way a real backend would reject them.
/// `RecordingCommandList` records each command as a string. The demo and
/// the tests drive the renderers against these.

use slotmap::SlotMap;
use crate::error::Result;
use crate::engine_bail;
use super::gpu::{
    BufferDesc, BufferHandle, CommandList, DescriptorSetHandle, GpuResourceProvider,
    ImageDesc, ImageHandle, IndexType, PipelineDesc, PipelineHandle, Rect2D,
    SamplerDesc, SamplerHandle, ShaderBindings, Viewport,
};

// ============================================================================
// Recording GPU
// ============================================================================

struct RecordedBuffer {
    desc: BufferDesc,
    data: Vec<u8>,
}

struct RecordedDescriptorSet {
    pipeline: PipelineHandle,
    bindings: ShaderBindings,
}

pub struct RecordingGpu {
    uniform_alignment: u64,
    pipelines: SlotMap<PipelineHandle, PipelineDesc>,
    buffers: SlotMap<BufferHandle, RecordedBuffer>,
    images: SlotMap<ImageHandle, ImageDesc>,
    samplers: SlotMap<SamplerHandle, SamplerDesc>,
    descriptor_sets: SlotMap<DescriptorSetHandle, RecordedDescriptorSet>,
}

impl Default for RecordingGpu {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RecordingGpu {
    pub fn new(uniform_alignment: u64) -> Self {
        Self {
            uniform_alignment: uniform_alignment.max(1),
            pipelines: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            images: SlotMap::with_key(),
            samplers: SlotMap::with_key(),
            descriptor_sets: SlotMap::with_key(),
        }
    }

    pub fn pipeline_desc(&self, pipeline: PipelineHandle) -> Option<&PipelineDesc> {
        self.pipelines.get(pipeline)
    }

    pub fn buffer_desc(&self, buffer: BufferHandle) -> Option<&BufferDesc> {
        self.buffers.get(buffer).map(|b| &b.desc)
    }

    /// Current contents of a buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    pub fn image_desc(&self, image: ImageHandle) -> Option<&ImageDesc> {
        self.images.get(image)
    }

    pub fn descriptor_set(&self, set: DescriptorSetHandle) -> Option<&ShaderBindings> {
        self.descriptor_sets.get(set).map(|s| &s.bindings)
    }

    pub fn descriptor_set_pipeline(&self, set: DescriptorSetHandle) -> Option<PipelineHandle> {
        self.descriptor_sets.get(set).map(|s| s.pipeline)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sampler_count(&self) -> usize {
        self.samplers.len()
    }

    pub fn descriptor_set_count(&self) -> usize {
        self.descriptor_sets.len()
    }

    /// Release every descriptor set (frame boundary, like a pool reset)
    pub fn reset_descriptor_sets(&mut self) {
        self.descriptor_sets.clear();
    }

    /// Total number of live resources of every kind
    pub fn live_resources(&self) -> usize {
        self.pipelines.len() + self.buffers.len() + self.images.len() + self.samplers.len()
    }
}

impl GpuResourceProvider for RecordingGpu {
    fn uniform_alignment(&self) -> u64 {
        self.uniform_alignment
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        if desc.name.is_empty() {
            engine_bail!("prev::RecordingGpu", @InvalidResource, "pipeline name is empty");
        }
        Ok(self.pipelines.insert(desc.clone()))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) -> Result<()> {
        if self.pipelines.remove(pipeline).is_none() {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "destroy_pipeline: unknown handle {:?}", pipeline);
        }
        self.descriptor_sets.retain(|_, set| set.pipeline != pipeline);
        Ok(())
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<BufferHandle> {
        if desc.size == 0 {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "buffer '{}' has zero size", desc.name);
        }
        let size = usize::try_from(desc.size).unwrap_or(usize::MAX);
        Ok(self.buffers.insert(RecordedBuffer {
            desc: desc.clone(),
            data: vec![0; size],
        }))
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) -> Result<()> {
        if self.buffers.remove(buffer).is_none() {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "destroy_buffer: unknown handle {:?}", buffer);
        }
        Ok(())
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, bytes: &[u8]) -> Result<()> {
        let Some(target) = self.buffers.get_mut(buffer) else {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "write_buffer: unknown handle {:?}", buffer);
        };
        let start = offset as usize;
        let end = start.saturating_add(bytes.len());
        if end > target.data.len() {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "write of {} bytes at offset {} overflows buffer '{}' ({} bytes)",
                bytes.len(), offset, target.desc.name, target.data.len());
        }
        target.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle> {
        if desc.width == 0 || desc.height == 0 || desc.layers == 0 {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "image '{}' has an empty extent", desc.name);
        }
        Ok(self.images.insert(desc.clone()))
    }

    fn destroy_image(&mut self, image: ImageHandle) -> Result<()> {
        if self.images.remove(image).is_none() {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "destroy_image: unknown handle {:?}", image);
        }
        Ok(())
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        Ok(self.samplers.insert(*desc))
    }

    fn destroy_sampler(&mut self, sampler: SamplerHandle) -> Result<()> {
        if self.samplers.remove(sampler).is_none() {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "destroy_sampler: unknown handle {:?}", sampler);
        }
        Ok(())
    }

    fn update_descriptor_set(
        &mut self,
        pipeline: PipelineHandle,
        bindings: &ShaderBindings,
    ) -> Result<DescriptorSetHandle> {
        let Some(desc) = self.pipelines.get(pipeline) else {
            engine_bail!("prev::RecordingGpu", @InvalidResource,
                "update_descriptor_set: unknown pipeline {:?}", pipeline);
        };

        for (slot, uniform) in bindings.uniforms() {
            if !desc.uniform_slots.iter().any(|s| s == slot) {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "pipeline '{}' has no uniform slot '{}'", desc.name, slot);
            }
            let Some(buffer) = self.buffers.get(uniform.buffer) else {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "slot '{}' references an unknown buffer", slot);
            };
            if uniform.offset + uniform.range > buffer.desc.size {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "slot '{}' range {}+{} exceeds buffer '{}'",
                    slot, uniform.offset, uniform.range, buffer.desc.name);
            }
            if uniform.offset % self.uniform_alignment != 0 {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "slot '{}' offset {} is not aligned to {}", slot, uniform.offset, self.uniform_alignment);
            }
        }

        for (slot, image) in bindings.images() {
            if !desc.sampler_slots.iter().any(|s| s == slot) {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "pipeline '{}' has no sampler slot '{}'", desc.name, slot);
            }
            if !self.images.contains_key(image.image) || !self.samplers.contains_key(image.sampler) {
                engine_bail!("prev::RecordingGpu", @InvalidResource,
                    "slot '{}' references an unknown image or sampler", slot);
            }
        }

        Ok(self.descriptor_sets.insert(RecordedDescriptorSet {
            pipeline,
            bindings: bindings.clone(),
        }))
    }
}

// ============================================================================
// Recording CommandList
// ============================================================================

/// Command list that records every command as a string
#[derive(Debug, Default)]
pub struct RecordingCommandList {
    pub commands: Vec<String>,
    recording: bool,
}

impl RecordingCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Number of recorded commands whose text starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, command: String) -> Result<()> {
        if !self.recording {
            engine_bail!("prev::RecordingCommandList",
                "'{}' recorded outside begin/end", command);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl CommandList for RecordingCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.recording {
            engine_bail!("prev::RecordingCommandList", "begin called twice");
        }
        self.recording = true;
        self.commands.push("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.record("end".to_string())?;
        self.recording = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport({}x{})", viewport.width, viewport.height))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor({}x{})", scissor.width, scissor.height))
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) -> Result<()> {
        self.record(format!("bind_pipeline({:?})", pipeline))
    }

    fn bind_descriptor_set(&mut self, _pipeline: PipelineHandle, set: DescriptorSetHandle) -> Result<()> {
        self.record(format!("bind_descriptor_set({:?})", set))
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer({:?}, {})", buffer, offset))
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer({:?}, {}, {:?})", buffer, offset, index_type))
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed({}, {}, {})", index_count, first_index, vertex_offset))
    }

    fn bind_instance_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        self.record(format!("bind_instance_buffer({:?}, {})", buffer, offset))
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> Result<()> {
        if instance_count == 0 {
            engine_bail!("prev::RecordingCommandList", "instanced draw with zero instances");
        }
        self.record(format!("draw_indexed_instanced({}, {}, {}, {})",
            index_count, instance_count, first_index, vertex_offset))
    }
}

#[cfg(test)]
#[path = "recording_tests.rs"]
mod tests;
