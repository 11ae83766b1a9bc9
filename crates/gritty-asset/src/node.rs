use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Local bind transform of a node, kept in whichever form the source
/// authored it.
#[derive(Debug, Clone)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<DecomposedTransform> for Mat4 {
    fn from(value: DecomposedTransform) -> Self {
        Mat4::from_translation(value.translation)
            * Mat4::from_quat(value.rotation)
            * Mat4::from_scale(value.scale)
    }
}

impl From<NodeTransform> for Mat4 {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => matrix,
            NodeTransform::Decomposed(decomposed) => decomposed.into(),
        }
    }
}

/// One node of the scene hierarchy; the parent owns its children.
#[derive(Debug, Clone, Default)]
pub struct NodeAsset {
    pub name: Option<String>,
    /// `None` means identity.
    pub transform: Option<NodeTransform>,
    pub children: Vec<NodeAsset>,
}

impl NodeAsset {
    pub fn local_transform(&self) -> Mat4 {
        self.transform
            .clone()
            .map(Mat4::from)
            .unwrap_or(Mat4::IDENTITY)
    }
}
