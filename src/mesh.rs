use nalgebra::Vector3;

/// Axis-aligned extents of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

/// Indexed triangle mesh produced by the loader.
///
/// `vertices` is the deduplicated point set, flattened as x,y,z triples;
/// `indices` holds three entries per triangle, in the same triangle order as
/// the source file. A reload replaces the whole mesh, there is no mutation
/// API.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        debug_assert!(vertices.len() % 3 == 0);
        debug_assert!(indices.len() % 3 == 0);
        Self { vertices, indices }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Byte view of the vertex buffer, ready for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Byte view of the index buffer, ready for GPU upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn xmin(&self) -> f32 {
        self.bound(0, false)
    }

    pub fn xmax(&self) -> f32 {
        self.bound(0, true)
    }

    pub fn ymin(&self) -> f32 {
        self.bound(1, false)
    }

    pub fn ymax(&self) -> f32 {
        self.bound(1, true)
    }

    pub fn zmin(&self) -> f32 {
        self.bound(2, false)
    }

    pub fn zmax(&self) -> f32 {
        self.bound(2, true)
    }

    // An empty mesh reports the sentinel extents [-1, 1] on every axis so
    // that camera framing still has something to look at.
    fn bound(&self, axis: usize, max: bool) -> f32 {
        if self.vertices.is_empty() {
            return if max { 1.0 } else { -1.0 };
        }
        let components = self.vertices.iter().skip(axis).step_by(3).copied();
        if max {
            components.fold(f32::NEG_INFINITY, f32::max)
        } else {
            components.fold(f32::INFINITY, f32::min)
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            min: Vector3::new(self.xmin(), self.ymin(), self.zmin()),
            max: Vector3::new(self.xmax(), self.ymax(), self.zmax()),
        }
    }
}
