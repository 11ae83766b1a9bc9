use std::fmt::Debug;

#[derive(Debug, Clone)]
pub struct Keyframe<T: Debug + Clone> {
    /// Key time in ticks.
    pub time: f64,
    pub value: T,
}

/// Keyframe tracks for one animated node. Tracks are time-ordered with
/// unique key times; a single-key track holds a static value. Rotation
/// values are `[x, y, z, w]` quaternion components.
#[derive(Debug, Clone, Default)]
pub struct NodeChannelAsset {
    /// Name of the node this channel drives.
    pub node: String,
    pub position_keys: Vec<Keyframe<[f32; 3]>>,
    pub rotation_keys: Vec<Keyframe<[f32; 4]>>,
    pub scaling_keys: Vec<Keyframe<[f32; 3]>>,
}

/// One animation clip: per-node channels plus the clip's playback rate.
#[derive(Debug, Clone, Default)]
pub struct AnimationClipAsset {
    pub name: Option<String>,
    /// Ticks per second as declared by the source; 0.0 means the source
    /// left the rate unspecified and playback falls back to a default.
    pub ticks_per_second: f64,
    pub channels: Vec<NodeChannelAsset>,
}
