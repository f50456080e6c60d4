//! In-memory document model of a 3D asset.
//!
//! This mirrors the node → mesh → primitive → accessor shape of glTF but owns
//! its data: every accessor is stored tightly packed so it can be unpacked
//! without touching the original buffers again. Nodes, meshes and accessors
//! reference each other by index, the same way the file format does.

use std::fmt;

use cgmath::{Matrix4, SquareMatrix};

use crate::errors::FormatError;

/// Shape of one accessor element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    pub fn components(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 => 4,
            ElementType::Mat2 => 4,
            ElementType::Mat3 => 9,
            ElementType::Mat4 => 16,
        }
    }
}

/// Encoding of a single component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

/// What a primitive attribute means.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    /// Colors, joints, weights and application specific attributes.
    Other(String),
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semantic::Position => f.write_str("POSITION"),
            Semantic::Normal => f.write_str("NORMAL"),
            Semantic::Tangent => f.write_str("TANGENT"),
            Semantic::TexCoord(channel) => write!(f, "TEXCOORD_{channel}"),
            Semantic::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// A typed view of element data.
///
/// `data` holds `count` elements back to back in little-endian order, without
/// the stride padding the source buffer view may have had.
#[derive(Clone, Debug, PartialEq)]
pub struct Accessor {
    pub element_type: ElementType,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub count: usize,
    data: Vec<u8>,
}

impl Accessor {
    pub fn from_raw(
        element_type: ElementType,
        component_type: ComponentType,
        normalized: bool,
        count: usize,
        data: Vec<u8>,
    ) -> Self {
        Self {
            element_type,
            component_type,
            normalized,
            count,
            data,
        }
    }

    /// Float accessor over `values`, which must hold whole elements.
    pub fn from_f32(element_type: ElementType, values: &[f32]) -> Result<Self, FormatError> {
        let components = element_type.components();
        if values.len() % components != 0 {
            return Err(FormatError::PartialElement {
                components,
                values: values.len(),
            });
        }
        Ok(Self::from_raw(
            element_type,
            ComponentType::F32,
            false,
            values.len() / components,
            bytemuck::cast_slice(values).to_vec(),
        ))
    }

    pub fn from_u16(indices: &[u16]) -> Self {
        let data = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        Self::from_raw(ElementType::Scalar, ComponentType::U16, false, indices.len(), data)
    }

    pub fn from_u32(indices: &[u32]) -> Self {
        let data = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        Self::from_raw(ElementType::Scalar, ComponentType::U32, false, indices.len(), data)
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        self.element_type.components() * self.component_type.size()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Checks that the stored bytes hold exactly `count` elements.
    pub fn check_size(&self, index: usize) -> Result<(), FormatError> {
        // saturates so an absurd count still reports instead of overflowing
        let expected = self.count.saturating_mul(self.element_size());
        if self.data.len() != expected {
            return Err(FormatError::AccessorSizeMismatch {
                accessor: index,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Converts every component to `f32`.
    ///
    /// Normalized integer components are mapped to `[0, 1]` (unsigned) or
    /// `[-1, 1]` (signed) as glTF defines it, other integers keep their value.
    pub fn unpack_floats(&self) -> Vec<f32> {
        let size = self.component_type.size();
        let components = self.data.chunks_exact(size);
        match (self.component_type, self.normalized) {
            (ComponentType::F32, _) => components
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            (ComponentType::U8, true) => components.map(|c| c[0] as f32 / 255.0).collect(),
            (ComponentType::I8, true) => components
                .map(|c| (c[0] as i8 as f32 / 127.0).max(-1.0))
                .collect(),
            (ComponentType::U16, true) => components
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as f32 / 65535.0)
                .collect(),
            (ComponentType::I16, true) => components
                .map(|c| (i16::from_le_bytes([c[0], c[1]]) as f32 / 32767.0).max(-1.0))
                .collect(),
            (ComponentType::U32, true) => components
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32 / u32::MAX as f32)
                .collect(),
            (ComponentType::U8, false) => components.map(|c| c[0] as f32).collect(),
            (ComponentType::I8, false) => components.map(|c| c[0] as i8 as f32).collect(),
            (ComponentType::U16, false) => components
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as f32)
                .collect(),
            (ComponentType::I16, false) => components
                .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32)
                .collect(),
            (ComponentType::U32, false) => components
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
                .collect(),
        }
    }

    /// Widens unsigned integer components to `u32`.
    ///
    /// Returns `None` for float and signed encodings, which cannot be indices.
    pub fn unpack_indices(&self) -> Option<Vec<u32>> {
        let size = self.component_type.size();
        let components = self.data.chunks_exact(size);
        match self.component_type {
            ComponentType::U8 => Some(components.map(|c| c[0] as u32).collect()),
            ComponentType::U16 => Some(
                components
                    .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                    .collect(),
            ),
            ComponentType::U32 => Some(
                components
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ComponentType::I8 | ComponentType::I16 | ComponentType::F32 => None,
        }
    }
}

/// Texture coordinate channel used by each material slot.
///
/// Only stored so a renderer can later pick the matching texcoord buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TexCoordChannels {
    pub base_color: u8,
    pub metallic_roughness: u8,
    pub normal: u8,
    pub occlusion: u8,
    pub emissive: u8,
}

#[derive(Clone, Debug)]
pub struct Primitive {
    pub topology: Topology,
    /// Accessor index of the index data; `None` for non-indexed geometry.
    pub indices: Option<usize>,
    /// Attribute semantics paired with accessor indices, in document order.
    pub attributes: Vec<(Semantic, usize)>,
    pub material: Option<usize>,
    pub channels: TexCoordChannels,
}

impl Primitive {
    pub fn triangles(attributes: Vec<(Semantic, usize)>, indices: Option<usize>) -> Self {
        Self {
            topology: Topology::Triangles,
            indices,
            attributes,
            material: None,
            channels: TexCoordChannels::default(),
        }
    }

    pub fn attribute(&self, semantic: &Semantic) -> Option<usize> {
        self.attributes
            .iter()
            .find(|(s, _)| s == semantic)
            .map(|(_, accessor)| *accessor)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    /// Transform relative to the parent node.
    pub local: Matrix4<f32>,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            local: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
        }
    }
}

/// A fully resolved asset: every accessor already holds its bytes.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub meshes: Vec<MeshData>,
    pub accessors: Vec<Accessor>,
    /// Root node indices of the selected scene, in document order.
    pub roots: Vec<usize>,
}

impl Document {
    pub fn node(&self, index: usize) -> Result<&Node, FormatError> {
        self.nodes.get(index).ok_or(FormatError::InvalidNode(index))
    }

    pub fn mesh(&self, index: usize) -> Result<&MeshData, FormatError> {
        self.meshes.get(index).ok_or(FormatError::InvalidMesh(index))
    }

    pub fn accessor(&self, index: usize) -> Result<&Accessor, FormatError> {
        self.accessors
            .get(index)
            .ok_or(FormatError::InvalidAccessor(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_components_map_to_unit_range() {
        let accessor = Accessor::from_raw(
            ElementType::Vec2,
            ComponentType::U8,
            true,
            1,
            vec![0, 255],
        );
        assert_eq!(accessor.unpack_floats(), vec![0.0, 1.0]);

        let accessor = Accessor::from_raw(
            ElementType::Scalar,
            ComponentType::I16,
            true,
            1,
            i16::MIN.to_le_bytes().to_vec(),
        );
        assert_eq!(accessor.unpack_floats(), vec![-1.0]);
    }

    #[test]
    fn indices_widen_to_u32() {
        let accessor = Accessor::from_u16(&[0, 1, u16::MAX]);
        assert_eq!(accessor.unpack_indices(), Some(vec![0, 1, 65535]));
        assert_eq!(accessor.element_size(), 2);

        let floats = Accessor::from_f32(ElementType::Scalar, &[1.0]).unwrap();
        assert_eq!(floats.unpack_indices(), None);
    }

    #[test]
    fn float_values_must_form_whole_elements() {
        assert_eq!(
            Accessor::from_f32(ElementType::Vec3, &[0.0, 0.0, 0.0, 1.0]).unwrap_err(),
            FormatError::PartialElement {
                components: 3,
                values: 4
            }
        );
        let accessor = Accessor::from_f32(ElementType::Vec3, &[0.0; 6]).unwrap();
        assert_eq!(accessor.count, 2);
        assert!(accessor.check_size(0).is_ok());
    }

    #[test]
    fn raw_data_must_match_count() {
        let accessor =
            Accessor::from_raw(ElementType::Vec3, ComponentType::F32, false, 3, vec![0; 24]);
        assert_eq!(
            accessor.check_size(5).unwrap_err(),
            FormatError::AccessorSizeMismatch {
                accessor: 5,
                expected: 36,
                actual: 24
            }
        );
    }
}
