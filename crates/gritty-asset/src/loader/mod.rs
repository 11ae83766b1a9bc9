#[cfg(feature = "gltf")]
use glam::Mat4;

/// GLTF loader built on the `gltf` crate.
#[cfg(feature = "gltf")]
pub mod gltf;

#[cfg(feature = "gltf")]
#[inline]
fn chunk_vec2<T: Copy>(data: &[T]) -> Vec<[T; 2]> {
    data.chunks_exact(2)
        .map(|item| item.try_into().unwrap())
        .collect()
}

#[cfg(feature = "gltf")]
#[inline]
fn chunk_vec3<T: Copy>(data: &[T]) -> Vec<[T; 3]> {
    data.chunks_exact(3)
        .map(|item| item.try_into().unwrap())
        .collect()
}

#[cfg(feature = "gltf")]
#[inline]
fn chunk_vec4<T: Copy>(data: &[T]) -> Vec<[T; 4]> {
    data.chunks_exact(4)
        .map(|item| item.try_into().unwrap())
        .collect()
}

#[cfg(feature = "gltf")]
#[inline]
fn chunk_mat4(data: &[f32]) -> Vec<Mat4> {
    data.chunks_exact(16)
        .map(|item| {
            let array = item.try_into().unwrap();
            Mat4::from_cols_array(&array)
        })
        .collect()
}
