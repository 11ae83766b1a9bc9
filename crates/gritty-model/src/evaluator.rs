//! Per-frame pose evaluation: keyframe sampling and hierarchical
//! transform propagation over a flattened node tree.

use std::fmt::Debug;

use glam::{Mat4, Quat, Vec3};
use gritty_asset::{
    animation::{AnimationClipAsset, Keyframe},
    node::NodeAsset,
};

use crate::bone::BoneTable;

/// Flattened form of the scene's node tree. Nodes are addressed by
/// index with the root at 0; names and bone indices are resolved once
/// here so the per-frame walk never touches a string.
#[derive(Debug, Default)]
pub(crate) struct Hierarchy {
    nodes: Vec<HierarchyNode>,
}

#[derive(Debug)]
struct HierarchyNode {
    name: Option<String>,
    local_transform: Mat4,
    bone: Option<usize>,
    children: Vec<usize>,
}

impl Hierarchy {
    /// Flattens the node tree. The bone table must already be complete,
    /// since nodes are matched to bones by name here.
    pub(crate) fn from_asset(root: &NodeAsset, bones: &BoneTable) -> Self {
        let mut hierarchy = Self::default();
        hierarchy.push_node(root, bones);
        hierarchy
    }

    fn push_node(&mut self, node: &NodeAsset, bones: &BoneTable) -> usize {
        let index = self.nodes.len();
        self.nodes.push(HierarchyNode {
            name: node.name.clone(),
            local_transform: node.local_transform(),
            bone: node.name.as_deref().and_then(|name| bones.index_of(name)),
            children: Vec::new(),
        });
        let children = node
            .children
            .iter()
            .map(|child| self.push_node(child, bones))
            .collect();
        self.nodes[index].children = children;
        index
    }

    /// Resolves which channel of `clip` drives each node, by node name.
    /// Done once per clip at load so evaluation indexes straight into
    /// the channel list.
    pub(crate) fn bind_clip(&self, clip: &AnimationClipAsset) -> ClipBinding {
        let channels = self
            .nodes
            .iter()
            .map(|node| {
                node.name.as_deref().and_then(|name| {
                    clip.channels
                        .iter()
                        .position(|channel| channel.node == name)
                })
            })
            .collect();
        ClipBinding { channels }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Per-clip channel lookup, indexed by hierarchy node.
#[derive(Debug, Default)]
pub(crate) struct ClipBinding {
    channels: Vec<Option<usize>>,
}

/// Writes the final skinning matrix of every bone reached from the root
/// into `out`, which the caller has sized to the bone table and filled
/// with identity. `time` is the already-wrapped clip time in ticks.
pub(crate) fn evaluate(
    hierarchy: &Hierarchy,
    clip: &AnimationClipAsset,
    binding: &ClipBinding,
    bones: &BoneTable,
    global_inverse: Mat4,
    time: f64,
    out: &mut [Mat4],
) {
    if hierarchy.is_empty() {
        return;
    }
    let context = PoseContext {
        hierarchy,
        clip,
        binding,
        bones,
        global_inverse,
        time,
    };
    context.visit(0, Mat4::IDENTITY, out);
}

struct PoseContext<'a> {
    hierarchy: &'a Hierarchy,
    clip: &'a AnimationClipAsset,
    binding: &'a ClipBinding,
    bones: &'a BoneTable,
    global_inverse: Mat4,
    time: f64,
}

impl PoseContext<'_> {
    fn visit(&self, node_index: usize, parent: Mat4, out: &mut [Mat4]) {
        let node = &self.hierarchy.nodes[node_index];

        let local = match self.binding.channels[node_index] {
            Some(channel) => {
                let channel = &self.clip.channels[channel];
                let translation = sample_vec3(&channel.position_keys, self.time, Vec3::ZERO);
                let rotation = sample_quat(&channel.rotation_keys, self.time);
                let scale = sample_vec3(&channel.scaling_keys, self.time, Vec3::ONE);
                Mat4::from_translation(translation)
                    * Mat4::from_quat(rotation)
                    * Mat4::from_scale(scale)
            }
            None => node.local_transform,
        };

        let world = parent * local;
        if let Some(bone) = node.bone {
            out[bone] = self.global_inverse * world * self.bones.offset(bone);
        }
        for &child in &node.children {
            self.visit(child, world, out);
        }
    }
}

/// Index of the key opening the segment that brackets `time`: the first
/// `i` with `time < keys[i + 1].time`. When the scan runs past the end
/// the final segment is used, which clamps the pose to the last key
/// instead of faulting mid-frame. Callers guarantee at least two keys.
fn find_keyframe<T: Debug + Clone>(time: f64, keys: &[Keyframe<T>]) -> usize {
    for index in 0..keys.len() - 1 {
        if time < keys[index + 1].time {
            return index;
        }
    }
    keys.len() - 2
}

/// Interpolation factor within a segment, clamped to `[0, 1]`.
fn segment_factor(time: f64, start: f64, end: f64) -> f32 {
    let span = end - start;
    if span <= 0.0 {
        return 0.0;
    }
    (((time - start) / span) as f32).clamp(0.0, 1.0)
}

fn sample_vec3(keys: &[Keyframe<[f32; 3]>], time: f64, default: Vec3) -> Vec3 {
    match keys {
        [] => default,
        [only] => Vec3::from_array(only.value),
        _ => {
            let index = find_keyframe(time, keys);
            let (start, end) = (&keys[index], &keys[index + 1]);
            let factor = segment_factor(time, start.time, end.time);
            Vec3::from_array(start.value).lerp(Vec3::from_array(end.value), factor)
        }
    }
}

fn sample_quat(keys: &[Keyframe<[f32; 4]>], time: f64) -> Quat {
    match keys {
        [] => Quat::IDENTITY,
        [only] => Quat::from_array(only.value),
        _ => {
            let index = find_keyframe(time, keys);
            let (start, end) = (&keys[index], &keys[index + 1]);
            let factor = segment_factor(time, start.time, end.time);
            // Renormalize: slerp drifts off unit length and the keys
            // themselves are not guaranteed normalized.
            Quat::from_array(start.value)
                .slerp(Quat::from_array(end.value), factor)
                .normalize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec3_keys(keys: &[(f64, [f32; 3])]) -> Vec<Keyframe<[f32; 3]>> {
        keys.iter()
            .map(|(time, value)| Keyframe {
                time: *time,
                value: *value,
            })
            .collect()
    }

    fn quat_keys(keys: &[(f64, [f32; 4])]) -> Vec<Keyframe<[f32; 4]>> {
        keys.iter()
            .map(|(time, value)| Keyframe {
                time: *time,
                value: *value,
            })
            .collect()
    }

    #[test]
    fn single_key_track_is_time_invariant() {
        let keys = vec3_keys(&[(0.0, [1.0, 2.0, 3.0])]);
        for time in [0.0, 0.5, 7.0, 1000.0] {
            assert_eq!(sample_vec3(&keys, time, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn empty_track_yields_the_default() {
        assert_eq!(sample_vec3(&[], 3.0, Vec3::ONE), Vec3::ONE);
        assert_eq!(sample_quat(&[], 3.0), Quat::IDENTITY);
    }

    #[test]
    fn sampling_at_a_key_time_returns_that_key() {
        let keys = vec3_keys(&[
            (0.0, [0.0, 0.0, 0.0]),
            (10.0, [0.0, 1.0, 0.0]),
            (20.0, [5.0, 5.0, 5.0]),
        ]);
        assert_eq!(sample_vec3(&keys, 0.0, Vec3::ZERO), Vec3::ZERO);
        assert_eq!(sample_vec3(&keys, 10.0, Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(sample_vec3(&keys, 20.0, Vec3::ZERO), Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn positions_interpolate_linearly() {
        let keys = vec3_keys(&[(0.0, [0.0, 0.0, 0.0]), (10.0, [0.0, 1.0, 0.0])]);
        let sampled = sample_vec3(&keys, 5.0, Vec3::ZERO);
        assert!((sampled - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn time_past_the_last_segment_clamps_to_the_last_key() {
        let keys = vec3_keys(&[(0.0, [0.0, 0.0, 0.0]), (10.0, [0.0, 1.0, 0.0])]);
        assert_eq!(sample_vec3(&keys, 50.0, Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn interpolated_rotations_are_unit_length() {
        // Deliberately non-normalized keys.
        let keys = quat_keys(&[(0.0, [0.0, 0.0, 0.0, 2.0]), (1.0, [0.0, 3.0, 0.0, 0.0])]);
        for time in [0.1, 0.25, 0.5, 0.9] {
            let rotation = sample_quat(&keys, time);
            assert!((rotation.length() - 1.0).abs() < 1e-5);
        }
    }
}
