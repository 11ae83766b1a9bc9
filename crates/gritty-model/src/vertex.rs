use bytemuck::{Pod, Zeroable};

/// A vertex can be influenced by at most this many bones; additional
/// influences are dropped at build time.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Vertex layout handed to the GPU upload layer: standard attributes
/// plus four bone-id/weight slots for skinning.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub bone_ids: [i32; MAX_BONE_INFLUENCES],
    pub bone_weights: [f32; MAX_BONE_INFLUENCES],
}

impl SkinnedVertex {
    /// Records a bone influence in the first free slot; a slot is free
    /// while its weight is 0.0. Returns false when all slots are taken;
    /// the influence is dropped and the existing slots stay untouched.
    pub fn push_bone(&mut self, bone: usize, weight: f32) -> bool {
        for slot in 0..MAX_BONE_INFLUENCES {
            if self.bone_weights[slot] == 0.0 {
                self.bone_ids[slot] = bone as i32;
                self.bone_weights[slot] = weight;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn influences_fill_slots_in_order() {
        let mut vertex = SkinnedVertex::default();
        assert!(vertex.push_bone(7, 0.5));
        assert!(vertex.push_bone(2, 0.25));
        assert_eq!(vertex.bone_ids, [7, 2, 0, 0]);
        assert_eq!(vertex.bone_weights, [0.5, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn fifth_influence_is_dropped() {
        let mut vertex = SkinnedVertex::default();
        for bone in 0..MAX_BONE_INFLUENCES {
            assert!(vertex.push_bone(bone, 0.25));
        }
        let before = vertex;
        assert!(!vertex.push_bone(99, 0.9));
        // The original four entries survive unchanged.
        assert_eq!(vertex, before);
    }
}
