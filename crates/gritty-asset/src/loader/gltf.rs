use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    path::Path,
};

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::{DataType, Dimensions},
    animation::{Interpolation, Property},
    mesh::Mode,
    scene::Transform,
    Accessor, Document, Mesh, Node, Primitive, Semantic, Skin, Texture,
};
use log::{debug, warn};

use crate::{
    animation::{AnimationClipAsset, Keyframe, NodeChannelAsset},
    material::{MaterialAsset, TextureKind, TextureSlot},
    mesh::MeshAsset,
    node::{DecomposedTransform, NodeAsset, NodeTransform},
    scene::SceneAsset,
    skin::{BoneAsset, VertexWeight},
};

use super::{chunk_mat4, chunk_vec2, chunk_vec3, chunk_vec4};

#[derive(Debug)]
pub enum GltfLoadError {
    Gltf(gltf::Error),
    NoScene,
    SparseAccessor(usize),
    AccessorOutOfBounds(usize),
    BadAccessorDataType(DataType, DataType),
    BadAccessorDimensions(Dimensions, Dimensions),
    MissingPositions(usize),
    UnpairedJointWeights(usize),
    UnsupportedPrimitiveMode(Mode),
}

impl Display for GltfLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GltfLoadError::Gltf(error) => Display::fmt(error, f),
            GltfLoadError::NoScene => write!(f, "Document contains no scene"),
            GltfLoadError::SparseAccessor(index) => {
                write!(f, "Sparse accessor #{} is not supported", index)
            }
            GltfLoadError::AccessorOutOfBounds(index) => {
                write!(f, "Accessor #{} reads past its buffer", index)
            }
            GltfLoadError::BadAccessorDataType(expected, actual) => {
                write!(
                    f,
                    "Bad accessor data type: expected {:?}, but got {:?}",
                    expected, actual
                )
            }
            GltfLoadError::BadAccessorDimensions(expected, actual) => {
                write!(
                    f,
                    "Bad accessor dimensions: expected {:?}, but got {:?}",
                    expected, actual
                )
            }
            GltfLoadError::MissingPositions(index) => {
                write!(f, "Mesh #{} has a primitive without positions", index)
            }
            GltfLoadError::UnpairedJointWeights(index) => {
                write!(f, "Mesh #{} has unpaired joint and weight sets", index)
            }
            GltfLoadError::UnsupportedPrimitiveMode(mode) => {
                write!(f, "Unsupported primitive mode: {:?}", mode)
            }
        }
    }
}

impl From<gltf::Error> for GltfLoadError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

impl Error for GltfLoadError {}

/// Load a scene from a GLTF or GLB file on disk.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<SceneAsset, GltfLoadError> {
    let (document, buffers, _images) = gltf::import(path)?;
    GltfSceneLoader::new(&document, &buffers).load()
}

/// Load a scene from an in-memory GLTF or GLB document.
pub fn load_gltf_from_slice(slice: &[u8]) -> Result<SceneAsset, GltfLoadError> {
    let (document, buffers, _images) = gltf::import_slice(slice)?;
    GltfSceneLoader::new(&document, &buffers).load()
}

/// Stable node label: channels and bones bind to nodes by name, so
/// unnamed nodes get one synthesized from their index.
fn node_label(node: &Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()))
}

fn texture_uri(texture: &Texture) -> Option<String> {
    match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
        gltf::image::Source::View { .. } => None,
    }
}

struct GltfSceneLoader<'a> {
    document: &'a Document,
    buffers: &'a [gltf::buffer::Data],
    meshes: Vec<MeshAsset>,
}

impl<'a> GltfSceneLoader<'a> {
    fn new(document: &'a Document, buffers: &'a [gltf::buffer::Data]) -> Self {
        Self {
            document,
            buffers,
            meshes: Vec::new(),
        }
    }

    fn load(mut self) -> Result<SceneAsset, GltfLoadError> {
        let materials = self.load_materials();
        let animations = self
            .document
            .animations()
            .map(|animation| self.load_animation(animation))
            .collect::<Result<_, _>>()?;

        let scene = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())
            .ok_or(GltfLoadError::NoScene)?;
        let name = scene.name().map(str::to_string);
        let roots = scene
            .nodes()
            .map(|node| self.load_node(node))
            .collect::<Result<Vec<_>, _>>()?;
        // Consumers expect a single-rooted tree; wrap multi-root scenes
        // under a synthetic identity root.
        let nodes = if roots.len() > 1 {
            vec![NodeAsset {
                name: name.clone(),
                transform: None,
                children: roots,
            }]
        } else {
            roots
        };

        Ok(SceneAsset {
            name,
            nodes,
            meshes: self.meshes,
            materials,
            animations,
        })
    }

    fn check_accessor(
        accessor: &Accessor,
        data_type: DataType,
        dimensions: Dimensions,
    ) -> Result<(), GltfLoadError> {
        if accessor.data_type() != data_type {
            return Err(GltfLoadError::BadAccessorDataType(
                data_type,
                accessor.data_type(),
            ));
        }
        Self::check_dimensions(accessor, dimensions)
    }

    fn check_dimensions(
        accessor: &Accessor,
        dimensions: Dimensions,
    ) -> Result<(), GltfLoadError> {
        if accessor.dimensions() != dimensions {
            return Err(GltfLoadError::BadAccessorDimensions(
                dimensions,
                accessor.dimensions(),
            ));
        }
        Ok(())
    }

    /// Reads an accessor's items into a contiguous byte vector,
    /// collapsing any interleaving stride.
    fn read_accessor(&self, accessor: &Accessor) -> Result<Vec<u8>, GltfLoadError> {
        if accessor.sparse().is_some() {
            return Err(GltfLoadError::SparseAccessor(accessor.index()));
        }

        let num_size: usize = match accessor.data_type() {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::U32 | DataType::F32 => 4,
        };
        let item_size: usize = match accessor.dimensions() {
            Dimensions::Scalar => 1,
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            Dimensions::Mat2 => 4,
            Dimensions::Mat3 => 9,
            Dimensions::Mat4 => 16,
        };
        let item_length = num_size * item_size;
        let count = accessor.count();

        let Some(view) = accessor.view() else {
            // Accessors without a view are all zeroes by definition.
            return Ok(vec![0; count * item_length]);
        };
        let buffer = self
            .buffers
            .get(view.buffer().index())
            .ok_or(GltfLoadError::AccessorOutOfBounds(accessor.index()))?;
        let offset = accessor.offset() + view.offset();
        let stride = view.stride().unwrap_or(item_length);

        if count == 0 {
            return Ok(Vec::new());
        }
        let end = offset + stride * (count - 1) + item_length;
        if end > buffer.len() {
            return Err(GltfLoadError::AccessorOutOfBounds(accessor.index()));
        }

        if stride == item_length {
            return Ok(buffer[offset..offset + count * item_length].to_vec());
        }
        let mut data = Vec::with_capacity(count * item_length);
        for item in 0..count {
            let start = offset + item * stride;
            data.extend_from_slice(&buffer[start..start + item_length]);
        }
        Ok(data)
    }

    fn read_f32(&self, accessor: &Accessor) -> Result<Vec<f32>, GltfLoadError> {
        if accessor.data_type() != DataType::F32 {
            return Err(GltfLoadError::BadAccessorDataType(
                DataType::F32,
                accessor.data_type(),
            ));
        }
        let data = self.read_accessor(accessor)?;
        Ok(data
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
            .collect())
    }

    fn read_indices(&self, accessor: &Accessor) -> Result<Vec<u32>, GltfLoadError> {
        let data_type = accessor.data_type();
        let data = self.read_accessor(accessor)?;
        Ok(match data_type {
            DataType::U8 => data.into_iter().map(u32::from).collect(),
            DataType::U16 => data
                .chunks_exact(2)
                .map(|chunk| u32::from(u16::from_le_bytes(chunk.try_into().unwrap())))
                .collect(),
            DataType::U32 => data
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
                .collect(),
            other => return Err(GltfLoadError::BadAccessorDataType(DataType::U32, other)),
        })
    }

    fn read_joints(&self, accessor: &Accessor) -> Result<Vec<[u16; 4]>, GltfLoadError> {
        Self::check_dimensions(accessor, Dimensions::Vec4)?;
        let data_type = accessor.data_type();
        let data = self.read_accessor(accessor)?;
        let joints: Vec<u16> = match data_type {
            DataType::U8 => data.into_iter().map(u16::from).collect(),
            DataType::U16 => data
                .chunks_exact(2)
                .map(|chunk| u16::from_le_bytes(chunk.try_into().unwrap()))
                .collect(),
            other => return Err(GltfLoadError::BadAccessorDataType(DataType::U16, other)),
        };
        Ok(chunk_vec4(&joints))
    }

    /// Reads integer-quantized or float data as normalized f32.
    fn read_normalized(&self, accessor: &Accessor) -> Result<Vec<f32>, GltfLoadError> {
        let data_type = accessor.data_type();
        let data = self.read_accessor(accessor)?;
        Ok(match data_type {
            DataType::U8 => data
                .into_iter()
                .map(|num| f32::from(num) / f32::from(u8::MAX))
                .collect(),
            DataType::U16 => data
                .chunks_exact(2)
                .map(|chunk| {
                    f32::from(u16::from_le_bytes(chunk.try_into().unwrap())) / f32::from(u16::MAX)
                })
                .collect(),
            DataType::F32 => data
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
                .collect(),
            other => return Err(GltfLoadError::BadAccessorDataType(DataType::F32, other)),
        })
    }

    fn load_materials(&self) -> Vec<MaterialAsset> {
        self.document
            .materials()
            .map(|material| {
                let mut textures = Vec::new();
                let pbr = material.pbr_metallic_roughness();
                if let Some(info) = pbr.base_color_texture() {
                    textures.push(TextureSlot {
                        kind: TextureKind::Diffuse,
                        uri: texture_uri(&info.texture()),
                    });
                }
                if let Some(info) = material.normal_texture() {
                    textures.push(TextureSlot {
                        kind: TextureKind::Normal,
                        uri: texture_uri(&info.texture()),
                    });
                }
                if let Some(info) = material.emissive_texture() {
                    textures.push(TextureSlot {
                        kind: TextureKind::Emission,
                        uri: texture_uri(&info.texture()),
                    });
                }
                MaterialAsset {
                    name: material.name().map(str::to_string),
                    textures,
                }
            })
            .collect()
    }

    fn load_node(&mut self, node: Node) -> Result<NodeAsset, GltfLoadError> {
        if let Some(mesh) = node.mesh() {
            let skin = node.skin();
            for primitive in mesh.primitives() {
                let mesh_asset = self.load_primitive(&mesh, skin.as_ref(), primitive)?;
                self.meshes.push(mesh_asset);
            }
        }

        let transform = match node.transform() {
            Transform::Matrix { matrix } => {
                NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix))
            }
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        let children = node
            .children()
            .map(|child| self.load_node(child))
            .collect::<Result<_, _>>()?;

        Ok(NodeAsset {
            name: Some(node_label(&node)),
            transform: Some(transform),
            children,
        })
    }

    fn load_primitive(
        &self,
        mesh: &Mesh,
        skin: Option<&Skin>,
        primitive: Primitive,
    ) -> Result<MeshAsset, GltfLoadError> {
        if primitive.mode() != Mode::Triangles {
            return Err(GltfLoadError::UnsupportedPrimitiveMode(primitive.mode()));
        }

        let mut positions = None;
        let mut normals = Vec::new();
        let mut tex_coords = Vec::new();
        let mut joints = None;
        let mut weights = None;

        for (semantic, accessor) in primitive.attributes() {
            match semantic {
                Semantic::Positions => {
                    Self::check_accessor(&accessor, DataType::F32, Dimensions::Vec3)?;
                    positions = Some(chunk_vec3(&self.read_f32(&accessor)?));
                }
                Semantic::Normals => {
                    Self::check_accessor(&accessor, DataType::F32, Dimensions::Vec3)?;
                    normals = chunk_vec3(&self.read_f32(&accessor)?);
                }
                Semantic::TexCoords(0) => {
                    Self::check_dimensions(&accessor, Dimensions::Vec2)?;
                    tex_coords = chunk_vec2(&self.read_normalized(&accessor)?);
                }
                Semantic::Joints(0) => {
                    joints = Some(self.read_joints(&accessor)?);
                }
                Semantic::Weights(0) => {
                    Self::check_dimensions(&accessor, Dimensions::Vec4)?;
                    weights = Some(chunk_vec4(&self.read_normalized(&accessor)?));
                }
                // Further attribute sets, colors and tangents are not
                // carried by the scene shape.
                _ => {}
            }
        }

        let positions = positions.ok_or(GltfLoadError::MissingPositions(mesh.index()))?;
        let indices = match primitive.indices() {
            Some(accessor) => self.read_indices(&accessor)?,
            None => (0..positions.len() as u32).collect(),
        };

        let bones = if let (Some(skin), Some(joints), Some(weights)) = (skin, &joints, &weights) {
            if joints.len() != weights.len() {
                return Err(GltfLoadError::UnpairedJointWeights(mesh.index()));
            }
            self.load_bones(skin, joints, weights)?
        } else {
            if skin.is_none() && (joints.is_some() || weights.is_some()) {
                warn!(
                    "Mesh {:?} carries skinning attributes but its node has no skin",
                    mesh.name()
                );
            }
            Vec::new()
        };

        Ok(MeshAsset {
            name: mesh.name().map(str::to_string),
            positions,
            normals,
            tex_coords,
            indices,
            bones,
            material_index: primitive.material().index(),
        })
    }

    /// Inverts the per-vertex joint/weight sets into the per-bone weight
    /// lists the scene shape uses. Every joint of the skin gets a bone
    /// entry so that bone indexing stays consistent across submeshes
    /// sharing the skeleton; unreferenced bones just end up with an
    /// empty weight list.
    fn load_bones(
        &self,
        skin: &Skin,
        joints: &[[u16; 4]],
        weights: &[[f32; 4]],
    ) -> Result<Vec<BoneAsset>, GltfLoadError> {
        let offsets = match skin.inverse_bind_matrices() {
            Some(accessor) => {
                Self::check_accessor(&accessor, DataType::F32, Dimensions::Mat4)?;
                chunk_mat4(&self.read_f32(&accessor)?)
            }
            None => Vec::new(),
        };

        let mut bones: Vec<BoneAsset> = skin
            .joints()
            .enumerate()
            .map(|(index, joint)| BoneAsset {
                name: node_label(&joint),
                offset_matrix: offsets.get(index).copied().unwrap_or(Mat4::IDENTITY),
                weights: Vec::new(),
            })
            .collect();

        for (vertex, (vertex_joints, vertex_weights)) in joints.iter().zip(weights).enumerate() {
            for slot in 0..4 {
                let weight = vertex_weights[slot];
                if weight <= 0.0 {
                    continue;
                }
                let joint = vertex_joints[slot] as usize;
                let Some(bone) = bones.get_mut(joint) else {
                    warn!(
                        "Vertex {} references joint {} outside of the skin's {} joints",
                        vertex,
                        joint,
                        bones.len()
                    );
                    continue;
                };
                bone.weights.push(VertexWeight {
                    vertex: vertex as u32,
                    weight,
                });
            }
        }

        Ok(bones)
    }

    fn load_animation(
        &self,
        animation: gltf::Animation,
    ) -> Result<AnimationClipAsset, GltfLoadError> {
        let mut channels: Vec<NodeChannelAsset> = Vec::new();
        let mut by_node: HashMap<String, usize> = HashMap::new();

        for channel in animation.channels() {
            let target = channel.target();
            let property = target.property();
            if property == Property::MorphTargetWeights {
                debug!(
                    "Skipping morph-target weights channel in animation {:?}",
                    animation.name()
                );
                continue;
            }

            let node = node_label(&target.node());
            let sampler = channel.sampler();
            Self::check_accessor(&sampler.input(), DataType::F32, Dimensions::Scalar)?;
            let times = self.read_f32(&sampler.input())?;
            let interpolation = sampler.interpolation();
            if interpolation == Interpolation::CubicSpline {
                debug!(
                    "Flattening cubic-spline sampler in animation {:?} to its key values",
                    animation.name()
                );
            }

            let index = match by_node.get(&node) {
                Some(index) => *index,
                None => {
                    channels.push(NodeChannelAsset {
                        node: node.clone(),
                        ..NodeChannelAsset::default()
                    });
                    by_node.insert(node, channels.len() - 1);
                    channels.len() - 1
                }
            };

            match property {
                Property::Translation => {
                    Self::check_accessor(&sampler.output(), DataType::F32, Dimensions::Vec3)?;
                    let values = chunk_vec3(&self.read_f32(&sampler.output())?);
                    channels[index].position_keys = make_keyframes(&times, values, interpolation);
                }
                Property::Rotation => {
                    Self::check_dimensions(&sampler.output(), Dimensions::Vec4)?;
                    let values = chunk_vec4(&self.read_normalized(&sampler.output())?);
                    channels[index].rotation_keys = make_keyframes(&times, values, interpolation);
                }
                Property::Scale => {
                    Self::check_accessor(&sampler.output(), DataType::F32, Dimensions::Vec3)?;
                    let values = chunk_vec3(&self.read_f32(&sampler.output())?);
                    channels[index].scaling_keys = make_keyframes(&times, values, interpolation);
                }
                Property::MorphTargetWeights => {}
            }
        }

        Ok(AnimationClipAsset {
            name: animation.name().map(str::to_string),
            // GLTF key times are seconds.
            ticks_per_second: 1.0,
            channels,
        })
    }
}

fn make_keyframes<T: Debug + Clone>(
    times: &[f32],
    values: Vec<T>,
    interpolation: Interpolation,
) -> Vec<Keyframe<T>> {
    let values: Vec<T> = if interpolation == Interpolation::CubicSpline {
        // Cubic-spline output comes as (in-tangent, value, out-tangent)
        // triplets; keep the value element.
        values
            .chunks_exact(3)
            .map(|triplet| triplet[1].clone())
            .collect()
    } else {
        values
    };
    times
        .iter()
        .zip(values)
        .map(|(time, value)| Keyframe {
            time: f64::from(*time),
            value,
        })
        .collect()
}
