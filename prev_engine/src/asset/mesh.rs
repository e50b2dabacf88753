/// Resource-level mesh type.
///
/// A Mesh is CPU-side geometry: interleaved vertex data described by a
/// `VertexLayout`, 32-bit indices, parts (index ranges drawn with one
/// material) and nodes (a local transform plus the parts it draws).
/// Positions are also kept separately for bounding-volume construction.
///
/// No GPU resources are created at this level; see `Model::upload`.

use glam::{Mat4, Vec3};
use crate::error::Result;
use crate::engine_bail;
use crate::math::Aabb;

// ===== VERTEX LAYOUT =====

/// One interleaved vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexComponent {
    Position,
    Normal,
    TexCoord,
    Tangent,
    BoneIndices,
    BoneWeights,
}

impl VertexComponent {
    /// Number of f32 values
    pub fn float_count(&self) -> u32 {
        match self {
            VertexComponent::Position | VertexComponent::Normal | VertexComponent::Tangent => 3,
            VertexComponent::TexCoord => 2,
            VertexComponent::BoneIndices | VertexComponent::BoneWeights => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    components: Vec<VertexComponent>,
}

impl VertexLayout {
    pub fn new(components: &[VertexComponent]) -> Self {
        Self { components: components.to_vec() }
    }

    /// Position, normal, texture coordinates
    pub fn static_mesh() -> Self {
        Self::new(&[VertexComponent::Position, VertexComponent::Normal, VertexComponent::TexCoord])
    }

    pub fn components(&self) -> &[VertexComponent] {
        &self.components
    }

    /// Floats per vertex
    pub fn float_count(&self) -> u32 {
        self.components.iter().map(VertexComponent::float_count).sum()
    }

    /// Bytes per vertex
    pub fn stride(&self) -> u32 {
        self.float_count() * 4
    }
}

// ===== PARTS AND NODES =====

/// Index range drawn with a single material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPart {
    pub first_vertex: u32,
    pub first_index: u32,
    pub index_count: u32,
    pub material_index: usize,
}

/// Local transform plus the parts drawn with it
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub transform: Mat4,
    pub mesh_part_indices: Vec<usize>,
}

impl MeshNode {
    /// Identity node drawing every part of a mesh with `part_count` parts
    pub fn all_parts(part_count: usize) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            mesh_part_indices: (0..part_count).collect(),
        }
    }
}

// ===== MESH =====

#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    layout: VertexLayout,
    positions: Vec<Vec3>,
    vertex_data: Vec<f32>,
    indices: Vec<u32>,
    parts: Vec<MeshPart>,
    nodes: Vec<MeshNode>,
}

/// Mesh creation descriptor
pub struct MeshDesc {
    pub name: String,
    pub layout: VertexLayout,
    pub positions: Vec<Vec3>,
    /// Interleaved vertex data, `layout.float_count()` floats per vertex
    pub vertex_data: Vec<f32>,
    pub indices: Vec<u32>,
    pub parts: Vec<MeshPart>,
    pub nodes: Vec<MeshNode>,
}

impl Mesh {
    /// Validate and build a mesh
    ///
    /// # Errors
    ///
    /// `InvalidResource` when the vertex data does not match the layout, or
    /// a part or node references data that does not exist.
    pub fn from_desc(desc: MeshDesc) -> Result<Self> {
        let floats = desc.layout.float_count() as usize;
        if floats == 0 || desc.vertex_data.len() != desc.positions.len() * floats {
            engine_bail!("prev::Mesh", @InvalidResource,
                "mesh '{}': {} floats for {} vertices of {} floats",
                desc.name, desc.vertex_data.len(), desc.positions.len(), floats);
        }

        let vertex_count = desc.positions.len() as u64;
        if let Some(bad) = desc.indices.iter().find(|&&i| u64::from(i) >= vertex_count) {
            engine_bail!("prev::Mesh", @InvalidResource,
                "mesh '{}': index {} out of {} vertices", desc.name, bad, vertex_count);
        }

        for (index, part) in desc.parts.iter().enumerate() {
            let end = u64::from(part.first_index) + u64::from(part.index_count);
            if end > desc.indices.len() as u64 {
                engine_bail!("prev::Mesh", @InvalidResource,
                    "mesh '{}': part {} reads indices up to {} of {}",
                    desc.name, index, end, desc.indices.len());
            }
        }

        for (index, node) in desc.nodes.iter().enumerate() {
            if let Some(bad) = node.mesh_part_indices.iter().find(|&&p| p >= desc.parts.len()) {
                engine_bail!("prev::Mesh", @InvalidResource,
                    "mesh '{}': node {} references missing part {}", desc.name, index, bad);
            }
        }

        Ok(Self {
            name: desc.name,
            layout: desc.layout,
            positions: desc.positions,
            vertex_data: desc.vertex_data,
            indices: desc.indices,
            parts: desc.parts,
            nodes: desc.nodes,
        })
    }

    /// Axis-aligned cube of edge `size` centred on the origin
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, tangent u, tangent v) per face
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut vertex_data = Vec::with_capacity(24 * 8);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * h;
                positions.push(position);
                vertex_data.extend_from_slice(&position.to_array());
                vertex_data.extend_from_slice(&normal.to_array());
                vertex_data.extend_from_slice(&[(su + 1.0) * 0.5, (1.0 - sv) * 0.5]);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            name: "cube".to_string(),
            layout: VertexLayout::static_mesh(),
            positions,
            vertex_data,
            indices,
            parts: vec![MeshPart { first_vertex: 0, first_index: 0, index_count: 36, material_index: 0 }],
            nodes: vec![MeshNode::all_parts(1)],
        }
    }

    /// Flat square on the XZ plane, facing +Y, spanning `-half..half`
    pub fn quad(half: f32) -> Self {
        let mut positions = Vec::with_capacity(4);
        let mut vertex_data = Vec::with_capacity(4 * 8);
        for (x, z) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)] {
            let position = Vec3::new(x * half, 0.0, z * half);
            positions.push(position);
            vertex_data.extend_from_slice(&position.to_array());
            vertex_data.extend_from_slice(&Vec3::Y.to_array());
            vertex_data.extend_from_slice(&[(x + 1.0) * 0.5, (z + 1.0) * 0.5]);
        }

        Self {
            name: "quad".to_string(),
            layout: VertexLayout::static_mesh(),
            positions,
            vertex_data,
            indices: vec![0, 1, 2, 0, 2, 3],
            parts: vec![MeshPart { first_vertex: 0, first_index: 0, index_count: 6, material_index: 0 }],
            nodes: vec![MeshNode::all_parts(1)],
        }
    }

    /// Square grid of `resolution × resolution` vertices spanning `size`
    ///
    /// Vertex `(column, row)` sits at `(column, row) / (resolution - 1) × size`
    /// on the XZ plane with height `heights[row × resolution + column]`.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if `resolution < 2` or `heights` has the wrong length.
    pub fn grid(resolution: u32, size: f32, heights: &[f32]) -> Result<Self> {
        let n = resolution as usize;
        if n < 2 || heights.len() != n * n {
            engine_bail!("prev::Mesh", @InvalidResource,
                "grid of resolution {} needs {} heights, got {}", resolution, n * n, heights.len());
        }

        let cell = size / (n - 1) as f32;
        let height = |column: usize, row: usize| heights[row.min(n - 1) * n + column.min(n - 1)];

        let mut positions = Vec::with_capacity(n * n);
        let mut vertex_data = Vec::with_capacity(n * n * 8);
        for row in 0..n {
            for column in 0..n {
                let position = Vec3::new(column as f32 * cell, height(column, row), row as f32 * cell);
                let left = height(column.saturating_sub(1), row);
                let right = height(column + 1, row);
                let down = height(column, row.saturating_sub(1));
                let up = height(column, row + 1);
                let normal = Vec3::new(left - right, 2.0 * cell, down - up).normalize_or_zero();

                positions.push(position);
                vertex_data.extend_from_slice(&position.to_array());
                vertex_data.extend_from_slice(&normal.to_array());
                vertex_data.extend_from_slice(&[
                    column as f32 / (n - 1) as f32,
                    row as f32 / (n - 1) as f32,
                ]);
            }
        }

        let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
        for row in 0..n - 1 {
            for column in 0..n - 1 {
                let top_left = (row * n + column) as u32;
                let top_right = top_left + 1;
                let bottom_left = top_left + n as u32;
                let bottom_right = bottom_left + 1;
                indices.extend_from_slice(&[
                    top_left, bottom_left, top_right,
                    top_right, bottom_left, bottom_right,
                ]);
            }
        }

        let index_count = indices.len() as u32;
        Ok(Self {
            name: "grid".to_string(),
            layout: VertexLayout::static_mesh(),
            positions,
            vertex_data,
            indices,
            parts: vec![MeshPart { first_vertex: 0, first_index: 0, index_count, material_index: 0 }],
            nodes: vec![MeshNode::all_parts(1)],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn parts(&self) -> &[MeshPart] {
        &self.parts
    }

    pub fn part(&self, index: usize) -> Option<&MeshPart> {
        self.parts.get(index)
    }

    pub fn nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Bounds of the vertex positions, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// Interleaved vertex data as bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertex_data)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
