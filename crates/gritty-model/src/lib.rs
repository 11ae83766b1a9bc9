//! Runtime side of the skinned-model pipeline.
//!
//! A loaded [`gritty_asset::scene::SceneAsset`] goes in once; out come
//! the shapes a renderer uploads: packed skinned vertices, indices, draw
//! ranges per submesh, and a per-frame bone matrix array from
//! [`model::AnimatedModel::evaluate_pose`]. Everything here is
//! single-threaded and frame-driven; pose evaluation never fails, it
//! degrades: bad clip indices are ignored and degenerate clips hold
//! their first frame.
//!
pub mod bone;
mod evaluator;
pub mod model;
pub mod vertex;
