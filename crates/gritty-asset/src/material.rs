/// Texture role within a material. The naming convention follows the
/// sampler layout the renderer resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Normal,
    Emission,
}

/// Reference to a texture; never decoded here. `uri` is `None` when the
/// source embeds the image in a binary buffer, in which case the texture
/// loader resolves it by material index instead.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    pub kind: TextureKind,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialAsset {
    pub name: Option<String>,
    pub textures: Vec<TextureSlot>,
}
