use super::skin::BoneAsset;

/// One submesh as the importer supplies it: raw vertex arrays, a flat
/// index list, the bones that skin it, and the material it resolves
/// against. Multi-submesh models keep vertex ids mesh-local; the runtime
/// packs submeshes into shared buffers and offsets them.
#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    /// May be empty when the source carries no normals.
    pub normals: Vec<[f32; 3]>,
    /// May be empty when the source carries no texture coordinates.
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub bones: Vec<BoneAsset>,
    pub material_index: Option<usize>,
}

impl MeshAsset {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
