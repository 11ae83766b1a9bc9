use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;
use gritty_asset::{animation::AnimationClipAsset, scene::SceneAsset};
use log::{debug, warn};

use crate::{
    bone::BoneTable,
    evaluator::{self, ClipBinding, Hierarchy},
    vertex::{SkinnedVertex, MAX_BONE_INFLUENCES},
};

/// Playback rate used for clips whose source declared none.
const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

#[derive(Debug)]
pub enum ModelError {
    NoRootNode,
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NoRootNode => write!(f, "Scene has no root node"),
        }
    }
}

impl Error for ModelError {}

/// Parameters for one submesh draw call against the packed vertex and
/// index buffers. Stable after load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawRange {
    pub base_vertex: u32,
    pub base_index: u32,
    pub index_count: u32,
    pub material_index: Option<usize>,
}

/// Common capability surface of skinned and static models, so callers
/// never special-case the two: a clip-less model reports no animations
/// and evaluates identity poses, which draws it statically.
pub trait Model {
    fn has_animations(&self) -> bool;

    fn animation_count(&self) -> usize;

    /// Produces the bone matrix array for `seconds` of elapsed playback
    /// time, ready for upload as a uniform array indexed by bone id.
    fn evaluate_pose_into(&self, seconds: f32, out: &mut Vec<Mat4>);

    fn evaluate_pose(&self, seconds: f32) -> Vec<Mat4> {
        let mut out = Vec::new();
        self.evaluate_pose_into(seconds, &mut out);
        out
    }

    fn draw_ranges(&self) -> &[DrawRange];
}

/// Owns a loaded scene and everything derived from it at load time:
/// the bone table, the packed skin vertices, per-submesh draw ranges,
/// the flattened hierarchy and the per-clip channel bindings. The only
/// per-frame work is [`AnimatedModel::evaluate_pose`], which rewrites
/// an output buffer wholesale and never fails.
#[derive(Debug)]
pub struct AnimatedModel {
    scene: SceneAsset,
    bones: BoneTable,
    hierarchy: Hierarchy,
    bindings: Vec<ClipBinding>,
    vertices: Vec<SkinnedVertex>,
    indices: Vec<u32>,
    draw_ranges: Vec<DrawRange>,
    global_inverse: Mat4,
    current_animation: usize,
}

impl AnimatedModel {
    pub fn from_scene(scene: SceneAsset) -> Result<Self, ModelError> {
        let root = scene.root().ok_or(ModelError::NoRootNode)?;
        let global_inverse = root.local_transform().inverse();

        let mut bones = BoneTable::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let mut draw_ranges = Vec::new();

        for mesh in &scene.meshes {
            let base_vertex = vertices.len() as u32;
            let base_index = indices.len() as u32;
            draw_ranges.push(DrawRange {
                base_vertex,
                base_index,
                index_count: mesh.indices.len() as u32,
                material_index: mesh.material_index,
            });

            for vertex in 0..mesh.vertex_count() {
                vertices.push(SkinnedVertex {
                    position: mesh.positions[vertex],
                    normal: mesh.normals.get(vertex).copied().unwrap_or_default(),
                    tex_coord: mesh.tex_coords.get(vertex).copied().unwrap_or_default(),
                    ..SkinnedVertex::default()
                });
            }
            indices.extend_from_slice(&mesh.indices);

            for bone_asset in &mesh.bones {
                let bone = bones.intern(&bone_asset.name, bone_asset.offset_matrix);
                for influence in &bone_asset.weights {
                    let vertex = base_vertex as usize + influence.vertex as usize;
                    let Some(entry) = vertices.get_mut(vertex) else {
                        warn!(
                            "Bone {:?} references vertex {} outside of its mesh",
                            bone_asset.name, influence.vertex
                        );
                        continue;
                    };
                    if !entry.push_bone(bone, influence.weight) {
                        warn!(
                            "Vertex {} already has {} influences, dropping bone {:?} (weight {})",
                            vertex, MAX_BONE_INFLUENCES, bone_asset.name, influence.weight
                        );
                    }
                }
            }
        }

        let hierarchy = Hierarchy::from_asset(root, &bones);
        let bindings = scene
            .animations
            .iter()
            .map(|clip| hierarchy.bind_clip(clip))
            .collect();

        Ok(Self {
            scene,
            bones,
            hierarchy,
            bindings,
            vertices,
            indices,
            draw_ranges,
            global_inverse,
            current_animation: 0,
        })
    }

    /// Selects the clip used by subsequent pose evaluations. An
    /// out-of-range index leaves the current clip unchanged; callers
    /// may race ahead of the available clip count.
    pub fn set_animation(&mut self, animation: usize) {
        if animation < self.scene.animations.len() {
            self.current_animation = animation;
        } else {
            debug!(
                "Ignoring out-of-range animation index {} ({} clips)",
                animation,
                self.scene.animations.len()
            );
        }
    }

    pub fn current_animation(&self) -> usize {
        self.current_animation
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn vertices(&self) -> &[SkinnedVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn scene(&self) -> &SceneAsset {
        &self.scene
    }

    pub fn has_animations(&self) -> bool {
        self.scene.has_animations()
    }

    pub fn animation_count(&self) -> usize {
        self.scene.animations.len()
    }

    pub fn draw_ranges(&self) -> &[DrawRange] {
        &self.draw_ranges
    }

    pub fn evaluate_pose(&self, seconds: f32) -> Vec<Mat4> {
        let mut out = Vec::new();
        self.evaluate_pose_into(seconds, &mut out);
        out
    }

    /// Produces the bone matrix array for `seconds` of elapsed playback
    /// time. `out` is rewritten wholesale: one matrix per bone, all
    /// identity when the model has no clips. Infallible and reentrant.
    pub fn evaluate_pose_into(&self, seconds: f32, out: &mut Vec<Mat4>) {
        out.clear();
        out.resize(self.bones.len(), Mat4::IDENTITY);

        let Some(clip) = self.scene.animations.get(self.current_animation) else {
            return;
        };
        let binding = &self.bindings[self.current_animation];

        let duration = Self::clip_duration(clip);
        let ticks_per_second = if clip.ticks_per_second != 0.0 {
            clip.ticks_per_second
        } else {
            DEFAULT_TICKS_PER_SECOND
        };
        let ticks = f64::from(seconds) * ticks_per_second;
        // Wrap into [0, duration) so playback loops; zero-duration clips
        // hold their first frame instead of dividing.
        let time = if duration > 0.0 { ticks % duration } else { 0.0 };

        evaluator::evaluate(
            &self.hierarchy,
            clip,
            binding,
            &self.bones,
            self.global_inverse,
            time,
            out,
        );
    }

    /// Clip length in ticks, taken from the last position key of the
    /// first channel. Channels are assumed co-terminal; a clip without
    /// keys has zero duration and holds its first frame.
    fn clip_duration(clip: &AnimationClipAsset) -> f64 {
        clip.channels
            .first()
            .and_then(|channel| channel.position_keys.last())
            .map(|key| key.time)
            .unwrap_or(0.0)
    }
}

impl Model for AnimatedModel {
    fn has_animations(&self) -> bool {
        AnimatedModel::has_animations(self)
    }

    fn animation_count(&self) -> usize {
        AnimatedModel::animation_count(self)
    }

    fn evaluate_pose_into(&self, seconds: f32, out: &mut Vec<Mat4>) {
        AnimatedModel::evaluate_pose_into(self, seconds, out);
    }

    fn draw_ranges(&self) -> &[DrawRange] {
        AnimatedModel::draw_ranges(self)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use gritty_asset::{
        animation::{Keyframe, NodeChannelAsset},
        mesh::MeshAsset,
        node::NodeAsset,
        skin::{BoneAsset, VertexWeight},
    };

    use super::*;

    fn make_channel(node: &str, position_keys: &[(f64, [f32; 3])]) -> NodeChannelAsset {
        NodeChannelAsset {
            node: node.to_string(),
            position_keys: position_keys
                .iter()
                .map(|(time, value)| Keyframe {
                    time: *time,
                    value: *value,
                })
                .collect(),
            rotation_keys: vec![Keyframe {
                time: 0.0,
                value: [0.0, 0.0, 0.0, 1.0],
            }],
            scaling_keys: vec![Keyframe {
                time: 0.0,
                value: [1.0, 1.0, 1.0],
            }],
        }
    }

    /// Two-bone rig: a static root bone and an animated child, skinning
    /// one vertex each.
    fn make_rig() -> SceneAsset {
        SceneAsset {
            nodes: vec![NodeAsset {
                name: Some("root".to_string()),
                transform: None,
                children: vec![NodeAsset {
                    name: Some("bone".to_string()),
                    transform: None,
                    children: Vec::new(),
                }],
            }],
            meshes: vec![MeshAsset {
                positions: vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                indices: vec![0, 1, 0],
                bones: vec![
                    BoneAsset {
                        name: "root".to_string(),
                        offset_matrix: Mat4::IDENTITY,
                        weights: vec![VertexWeight {
                            vertex: 0,
                            weight: 1.0,
                        }],
                    },
                    BoneAsset {
                        name: "bone".to_string(),
                        offset_matrix: Mat4::IDENTITY,
                        weights: vec![VertexWeight {
                            vertex: 1,
                            weight: 1.0,
                        }],
                    },
                ],
                ..MeshAsset::default()
            }],
            animations: vec![AnimationClipAsset {
                name: Some("raise".to_string()),
                ticks_per_second: 10.0,
                channels: vec![make_channel(
                    "bone",
                    &[(0.0, [0.0, 0.0, 0.0]), (10.0, [0.0, 1.0, 0.0])],
                )],
            }],
            ..SceneAsset::default()
        }
    }

    #[test]
    fn empty_scene_is_a_load_error() {
        assert!(matches!(
            AnimatedModel::from_scene(SceneAsset::default()),
            Err(ModelError::NoRootNode)
        ));
    }

    #[test]
    fn draw_ranges_accumulate_across_submeshes() {
        let mut scene = make_rig();
        scene.meshes.push(MeshAsset {
            positions: vec![[1.0, 0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material_index: Some(1),
            ..MeshAsset::default()
        });
        let model = AnimatedModel::from_scene(scene).unwrap();

        assert_eq!(model.draw_ranges().len(), 2);
        assert_eq!(model.draw_ranges()[0].base_vertex, 0);
        assert_eq!(model.draw_ranges()[0].index_count, 3);
        assert_eq!(model.draw_ranges()[1].base_vertex, 2);
        assert_eq!(model.draw_ranges()[1].base_index, 3);
        assert_eq!(model.draw_ranges()[1].material_index, Some(1));
        assert_eq!(model.vertices().len(), 5);
        assert_eq!(model.indices().len(), 6);
    }

    #[test]
    fn skin_weights_land_on_the_packed_vertices() {
        let model = AnimatedModel::from_scene(make_rig()).unwrap();
        assert_eq!(model.bone_count(), 2);
        assert_eq!(model.vertices()[0].bone_ids[0], 0);
        assert_eq!(model.vertices()[0].bone_weights[0], 1.0);
        assert_eq!(model.vertices()[1].bone_ids[0], 1);
    }

    #[test]
    fn fifth_influence_on_a_vertex_is_dropped() {
        let mut scene = make_rig();
        let bones = &mut scene.meshes[0].bones;
        for extra in 0..4 {
            bones.push(BoneAsset {
                name: format!("extra{}", extra),
                offset_matrix: Mat4::IDENTITY,
                weights: vec![VertexWeight {
                    vertex: 0,
                    weight: 0.1,
                }],
            });
        }
        let model = AnimatedModel::from_scene(scene).unwrap();

        // Slot 0 holds the original full-weight root influence, the
        // first three extras fill the rest, the fourth is dropped.
        let vertex = model.vertices()[0];
        assert_eq!(vertex.bone_ids, [0, 2, 3, 4]);
        assert_eq!(vertex.bone_weights, [1.0, 0.1, 0.1, 0.1]);
    }

    #[test]
    fn animated_bone_translates_halfway_at_half_a_second() {
        let model = AnimatedModel::from_scene(make_rig()).unwrap();
        // 0.5 s at 10 ticks/s = 5 ticks into a 10-tick clip.
        let pose = model.evaluate_pose(0.5);

        assert_eq!(pose.len(), 2);
        assert_eq!(pose[0], Mat4::IDENTITY);
        let (_, _, translation) = pose[1].to_scale_rotation_translation();
        assert!((translation - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn looping_poses_wrap_exactly() {
        let model = AnimatedModel::from_scene(make_rig()).unwrap();
        // The clip lasts 10 ticks at 10 ticks/s = 1 second.
        let pose = model.evaluate_pose(0.25);
        let wrapped = model.evaluate_pose(1.25);
        assert_eq!(pose, wrapped);
    }

    #[test]
    fn out_of_range_animation_index_is_ignored() {
        let mut scene = make_rig();
        scene.animations.push(AnimationClipAsset {
            name: Some("idle".to_string()),
            ticks_per_second: 10.0,
            channels: vec![make_channel("bone", &[(0.0, [0.0, 0.0, 0.0])])],
        });
        let mut model = AnimatedModel::from_scene(scene).unwrap();

        model.set_animation(1);
        assert_eq!(model.current_animation(), 1);
        model.set_animation(999);
        assert_eq!(model.current_animation(), 1);
    }

    #[test]
    fn model_without_clips_evaluates_identity() {
        let mut scene = make_rig();
        scene.animations.clear();
        let model = AnimatedModel::from_scene(scene).unwrap();

        assert!(!model.has_animations());
        let pose = model.evaluate_pose(3.5);
        assert_eq!(pose, vec![Mat4::IDENTITY; 2]);
    }

    #[test]
    fn zero_duration_clip_holds_its_first_frame() {
        let mut scene = make_rig();
        scene.animations[0].channels[0].position_keys.truncate(1);
        let model = AnimatedModel::from_scene(scene).unwrap();

        let pose = model.evaluate_pose(12.0);
        let (_, _, translation) = pose[1].to_scale_rotation_translation();
        assert!(translation.length() < 1e-6);
    }

    #[test]
    fn skinned_and_static_models_share_the_capability_trait() {
        fn upload_shapes(model: &dyn Model) -> (bool, usize, usize) {
            (
                model.has_animations(),
                model.evaluate_pose(0.0).len(),
                model.draw_ranges().len(),
            )
        }

        let animated = AnimatedModel::from_scene(make_rig()).unwrap();
        let mut static_scene = make_rig();
        static_scene.animations.clear();
        let static_model = AnimatedModel::from_scene(static_scene).unwrap();

        assert_eq!(upload_shapes(&animated), (true, 2, 1));
        assert_eq!(upload_shapes(&static_model), (false, 2, 1));
    }

    #[test]
    fn global_inverse_cancels_the_root_bind_transform() {
        let mut scene = make_rig();
        scene.nodes[0].transform = Some(gritty_asset::node::NodeTransform::Matrix(
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        ));
        let model = AnimatedModel::from_scene(scene).unwrap();

        // The un-animated root bone ends up at identity: its world
        // transform is exactly the root transform the global inverse
        // undoes.
        let pose = model.evaluate_pose(0.0);
        let (_, _, translation) = pose[0].to_scale_rotation_translation();
        assert!(translation.length() < 1e-6);
    }
}
