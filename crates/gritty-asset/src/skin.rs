use glam::Mat4;

/// A single influence of a bone on a mesh-local vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

/// A named bone binding for one mesh: the bind-pose offset matrix that
/// moves a vertex from mesh space into the bone's local space, and the
/// list of vertices it influences.
#[derive(Debug, Clone)]
pub struct BoneAsset {
    pub name: String,
    pub offset_matrix: Mat4,
    pub weights: Vec<VertexWeight>,
}
