//! Conversion of a parsed glTF file into the loader's [`Document`].

use std::collections::HashMap;

use crate::{
    data_structures::{
        document::{
            Accessor, ComponentType, Document, ElementType, MeshData, Node, Primitive, Semantic,
            TexCoordChannels, Topology,
        },
        transform::local_matrix,
    },
    errors::FormatError,
};

impl Document {
    /// Builds a document from glTF structure plus the already loaded buffers,
    /// indexed like the file's `buffers` array.
    ///
    /// Only accessors that some mesh primitive references are read. `scene`
    /// selects the root set; `None` uses the default scene, then the first scene,
    /// then every node without a parent.
    pub fn from_gltf(
        gltf: &gltf::Document,
        buffers: &[Vec<u8>],
        scene: Option<usize>,
    ) -> Result<Document, FormatError> {
        let mut accessors = Vec::new();
        let mut remap = HashMap::new();
        let mut local_accessor = |accessor: gltf::Accessor<'_>| -> Result<usize, FormatError> {
            if let Some(&local) = remap.get(&accessor.index()) {
                return Ok(local);
            }
            accessors.push(read_accessor(&accessor, buffers)?);
            remap.insert(accessor.index(), accessors.len() - 1);
            Ok(accessors.len() - 1)
        };

        let mut meshes = Vec::with_capacity(gltf.meshes().len());
        for mesh in gltf.meshes() {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                let mut attributes = Vec::new();
                for (semantic, accessor) in primitive.attributes() {
                    attributes.push((to_semantic(semantic), local_accessor(accessor)?));
                }
                let indices = primitive.indices().map(&mut local_accessor).transpose()?;
                let material = primitive.material();
                primitives.push(Primitive {
                    topology: to_topology(primitive.mode()),
                    indices,
                    attributes,
                    material: material.index(),
                    channels: tex_coord_channels(&material),
                });
            }
            meshes.push(MeshData {
                name: mesh.name().map(str::to_string),
                primitives,
            });
        }

        let nodes = gltf
            .nodes()
            .map(|node| Node {
                name: node.name().map(str::to_string),
                local: local_matrix(node.transform()),
                mesh: node.mesh().map(|mesh| mesh.index()),
                children: node.children().map(|child| child.index()).collect(),
            })
            .collect::<Vec<_>>();

        let roots = match scene {
            Some(index) => gltf
                .scenes()
                .nth(index)
                .ok_or(FormatError::MissingScene(index))?
                .nodes()
                .map(|node| node.index())
                .collect(),
            None => match gltf.default_scene().or_else(|| gltf.scenes().next()) {
                Some(scene) => scene.nodes().map(|node| node.index()).collect(),
                None => parentless(&nodes),
            },
        };

        Ok(Document {
            nodes,
            meshes,
            accessors,
            roots,
        })
    }
}

fn parentless(nodes: &[Node]) -> Vec<usize> {
    let mut has_parent = vec![false; nodes.len()];
    for child in nodes.iter().flat_map(|node| &node.children) {
        if let Some(flag) = has_parent.get_mut(*child) {
            *flag = true;
        }
    }
    (0..nodes.len()).filter(|i| !has_parent[*i]).collect()
}

/// Copies an accessor's elements out of its buffer view, dropping the stride.
fn read_accessor(accessor: &gltf::Accessor<'_>, buffers: &[Vec<u8>]) -> Result<Accessor, FormatError> {
    let index = accessor.index();
    if accessor.sparse().is_some() {
        return Err(FormatError::SparseAccessor(index));
    }
    let view = accessor.view().ok_or(FormatError::SparseAccessor(index))?;
    let buffer = buffers
        .get(view.buffer().index())
        .ok_or(FormatError::MissingBuffer(view.buffer().index()))?;

    let element_type = to_element_type(accessor.dimensions());
    let component_type = to_component_type(accessor.data_type());
    let element_size = element_type.components() * component_type.size();
    let stride = view.stride().unwrap_or(element_size);
    let count = accessor.count();
    let out_of_bounds = || FormatError::AccessorOutOfBounds(index);
    let view_end = view
        .offset()
        .checked_add(view.length())
        .ok_or_else(out_of_bounds)?
        .min(buffer.len());
    let start = view
        .offset()
        .checked_add(accessor.offset())
        .ok_or_else(out_of_bounds)?;
    if count > 0 {
        let end = (count - 1)
            .checked_mul(stride)
            .and_then(|last| last.checked_add(start))
            .and_then(|last| last.checked_add(element_size))
            .ok_or_else(out_of_bounds)?;
        if end > view_end {
            return Err(out_of_bounds());
        }
    }

    let size = count.checked_mul(element_size).ok_or_else(out_of_bounds)?;
    let mut data = Vec::with_capacity(size);
    for i in 0..count {
        let offset = start + i * stride;
        data.extend_from_slice(&buffer[offset..offset + element_size]);
    }
    Ok(Accessor::from_raw(
        element_type,
        component_type,
        accessor.normalized(),
        count,
        data,
    ))
}

fn to_semantic(semantic: gltf::Semantic) -> Semantic {
    match semantic {
        gltf::Semantic::Positions => Semantic::Position,
        gltf::Semantic::Normals => Semantic::Normal,
        gltf::Semantic::Tangents => Semantic::Tangent,
        gltf::Semantic::TexCoords(channel) => Semantic::TexCoord(channel),
        gltf::Semantic::Colors(set) => Semantic::Other(format!("COLOR_{set}")),
        gltf::Semantic::Joints(set) => Semantic::Other(format!("JOINTS_{set}")),
        gltf::Semantic::Weights(set) => Semantic::Other(format!("WEIGHTS_{set}")),
        #[allow(unreachable_patterns)]
        other => Semantic::Other(format!("{other:?}")),
    }
}

fn to_topology(mode: gltf::mesh::Mode) -> Topology {
    match mode {
        gltf::mesh::Mode::Points => Topology::Points,
        gltf::mesh::Mode::Lines => Topology::Lines,
        gltf::mesh::Mode::LineLoop => Topology::LineLoop,
        gltf::mesh::Mode::LineStrip => Topology::LineStrip,
        gltf::mesh::Mode::Triangles => Topology::Triangles,
        gltf::mesh::Mode::TriangleStrip => Topology::TriangleStrip,
        gltf::mesh::Mode::TriangleFan => Topology::TriangleFan,
    }
}

fn to_element_type(dimensions: gltf::accessor::Dimensions) -> ElementType {
    use gltf::accessor::Dimensions;
    match dimensions {
        Dimensions::Scalar => ElementType::Scalar,
        Dimensions::Vec2 => ElementType::Vec2,
        Dimensions::Vec3 => ElementType::Vec3,
        Dimensions::Vec4 => ElementType::Vec4,
        Dimensions::Mat2 => ElementType::Mat2,
        Dimensions::Mat3 => ElementType::Mat3,
        Dimensions::Mat4 => ElementType::Mat4,
    }
}

fn to_component_type(data_type: gltf::accessor::DataType) -> ComponentType {
    use gltf::accessor::DataType;
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

fn tex_coord_channels(material: &gltf::Material<'_>) -> TexCoordChannels {
    let pbr = material.pbr_metallic_roughness();
    TexCoordChannels {
        base_color: pbr.base_color_texture().map_or(0, |t| t.tex_coord() as u8),
        metallic_roughness: pbr
            .metallic_roughness_texture()
            .map_or(0, |t| t.tex_coord() as u8),
        normal: material.normal_texture().map_or(0, |t| t.tex_coord() as u8),
        occlusion: material.occlusion_texture().map_or(0, |t| t.tex_coord() as u8),
        emissive: material.emissive_texture().map_or(0, |t| t.tex_coord() as u8),
    }
}
