//! Imported-scene data model for skinned models.
//!
//! This library provides the immutable scene shape a model importer hands
//! to the runtime: a named node hierarchy, flat mesh lists with per-bone
//! weight data, per-node keyframe channels, and material texture
//! references. A glTF import path is available behind the `gltf` feature;
//! scenes can also be assembled directly, which is what the runtime's
//! tests do.
//!
pub mod animation;
/// Model loaders producing [`scene::SceneAsset`] values.
pub mod loader;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod skin;
