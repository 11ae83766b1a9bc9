use super::{
    animation::AnimationClipAsset, material::MaterialAsset, mesh::MeshAsset, node::NodeAsset,
};

/// A complete imported scene. Immutable after load; the runtime borrows
/// or owns it for the model's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub name: Option<String>,
    /// Scene roots. Importers that can produce several roots wrap them
    /// under a synthetic identity root, so well-formed scenes hold
    /// exactly one entry here.
    pub nodes: Vec<NodeAsset>,
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<MaterialAsset>,
    pub animations: Vec<AnimationClipAsset>,
}

impl SceneAsset {
    pub fn root(&self) -> Option<&NodeAsset> {
        self.nodes.first()
    }

    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty()
    }
}
