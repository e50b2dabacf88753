/// Model: a mesh uploaded to GPU buffers.

use std::sync::Arc;
use crate::error::Result;
use crate::engine_trace;
use crate::render::gpu::{BufferDesc, BufferHandle, BufferUsage, GpuResourceProvider};
use super::mesh::Mesh;

#[derive(Debug, Clone)]
pub struct Model {
    mesh: Arc<Mesh>,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
}

impl Model {
    /// Create vertex and index buffers for `mesh` and fill them
    pub fn upload(gpu: &mut dyn GpuResourceProvider, mesh: Arc<Mesh>) -> Result<Self> {
        let vertex_bytes = mesh.vertex_bytes();
        let vertex_buffer = gpu.create_buffer(&BufferDesc {
            name: format!("{} vertices", mesh.name()),
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::Vertex,
        })?;
        gpu.write_buffer(vertex_buffer, 0, vertex_bytes)?;

        let index_bytes = mesh.index_bytes();
        let index_buffer = gpu.create_buffer(&BufferDesc {
            name: format!("{} indices", mesh.name()),
            size: index_bytes.len() as u64,
            usage: BufferUsage::Index,
        })?;
        gpu.write_buffer(index_buffer, 0, index_bytes)?;

        engine_trace!("prev::Model", "uploaded '{}' ({} vertices, {} indices)",
            mesh.name(), mesh.vertex_count(), mesh.indices().len());

        Ok(Self { mesh, vertex_buffer, index_buffer })
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    /// Release both buffers
    pub fn destroy(&self, gpu: &mut dyn GpuResourceProvider) -> Result<()> {
        gpu.destroy_buffer(self.vertex_buffer)?;
        gpu.destroy_buffer(self.index_buffer)
    }
}
