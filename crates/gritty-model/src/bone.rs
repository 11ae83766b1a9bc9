use std::collections::HashMap;

use glam::Mat4;

/// Interns bone names into dense indices and keeps each bone's bind
/// offset matrix. Indices are contiguous from 0 in first-encountered
/// order and are shared across submeshes that reference the same
/// skeleton. Built once at load; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct BoneTable {
    name_to_index: HashMap<String, usize>,
    offsets: Vec<Mat4>,
}

impl BoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bone's index, allocating the next free one for a
    /// first-seen name. The offset of the first registration wins;
    /// later registrations of the same name only look the index up.
    pub fn intern(&mut self, name: &str, offset: Mat4) -> usize {
        if let Some(index) = self.name_to_index.get(name) {
            return *index;
        }
        let index = self.offsets.len();
        self.offsets.push(offset);
        self.name_to_index.insert(name.to_string(), index);
        index
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn offset(&self, index: usize) -> Mat4 {
        self.offsets[index]
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_allocates_contiguous_indices() {
        let mut table = BoneTable::new();
        assert_eq!(table.intern("hip", Mat4::IDENTITY), 0);
        assert_eq!(table.intern("spine", Mat4::IDENTITY), 1);
        assert_eq!(table.intern("head", Mat4::IDENTITY), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn interning_is_idempotent_across_meshes() {
        let mut table = BoneTable::new();
        let first = table.intern("spine", Mat4::from_scale(glam::Vec3::splat(2.0)));
        // A second submesh registering the same bone reuses the index
        // and keeps the original offset.
        let second = table.intern("spine", Mat4::IDENTITY);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.offset(first), Mat4::from_scale(glam::Vec3::splat(2.0)));
    }

    #[test]
    fn lookup_of_unknown_name_is_none() {
        let table = BoneTable::new();
        assert!(table.index_of("tail").is_none());
        assert!(table.is_empty());
    }
}
