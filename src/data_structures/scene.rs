//! Flattened scene representation.
//!
//! A loaded model ends up as one contiguous array of [`Mesh`]es (one per scene
//! node) plus one GPU buffer per attribute stream. Parent/child links are
//! `(children_offset, children_count)` ranges into that same array, so the whole
//! hierarchy lives in a single allocation with no owning pointers.
//!
//! # Key types
//!
//! - [`Stream`] names one of the attribute streams packed into its own buffer
//! - [`SceneInfo`] holds the byte/element totals computed before packing
//! - [`Span`] is a byte range inside one stream buffer
//! - [`Mesh`] is one flattened node, [`Submesh`] one of its primitives
//! - [`Scene`] owns the buffers and the flattened arrays

use std::{fmt, ops::Range};

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::document::{ComponentType, ElementType, TexCoordChannels};

/// Highest number of texture coordinate channels a scene can carry.
pub const MAX_TEX_COORD_CHANNELS: usize = 16;

/// One destination buffer.
///
/// The declaration order is also the order in which the streams are laid out in
/// the staging buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stream {
    Position,
    Normal,
    Tangent,
    TexCoord(u8),
    Index,
}

impl Stream {
    /// Number of distinct streams, texcoord channels included.
    pub const COUNT: usize = 4 + MAX_TEX_COORD_CHANNELS;

    /// Dense index of the stream, in staging layout order.
    pub fn slot(self) -> usize {
        match self {
            Stream::Position => 0,
            Stream::Normal => 1,
            Stream::Tangent => 2,
            Stream::TexCoord(channel) => 3 + channel as usize,
            Stream::Index => 3 + MAX_TEX_COORD_CHANNELS,
        }
    }

    pub fn from_slot(slot: usize) -> Self {
        match slot {
            0 => Stream::Position,
            1 => Stream::Normal,
            2 => Stream::Tangent,
            s if s < 3 + MAX_TEX_COORD_CHANNELS => Stream::TexCoord((s - 3) as u8),
            _ => Stream::Index,
        }
    }

    /// All streams in staging layout order.
    pub fn all() -> impl Iterator<Item = Stream> {
        (0..Self::COUNT).map(Self::from_slot)
    }

    /// Element layout the stream is stored with on the GPU.
    pub fn element_type(self) -> ElementType {
        match self {
            Stream::Position | Stream::Normal => ElementType::Vec3,
            Stream::Tangent => ElementType::Vec4,
            Stream::TexCoord(_) => ElementType::Vec2,
            Stream::Index => ElementType::Scalar,
        }
    }

    pub fn component_type(self) -> ComponentType {
        match self {
            Stream::Index => ComponentType::U32,
            _ => ComponentType::F32,
        }
    }

    /// Bytes per element: 12 for positions/normals, 16 for tangents, 8 for
    /// texcoords and 4 for (promoted) indices.
    pub fn element_size(self) -> u64 {
        (self.element_type().components() * self.component_type().size()) as u64
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Position => f.pad("Position"),
            Stream::Normal => f.pad("Normal"),
            Stream::Tangent => f.pad("Tangent"),
            Stream::TexCoord(channel) => f.pad(&format!("TexCoord{channel}")),
            Stream::Index => f.pad("Index"),
        }
    }
}

/// Aggregate sizes of a document, computed once before anything is allocated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneInfo {
    pub index_count: u64,
    pub position_bytes: u64,
    pub normal_bytes: u64,
    pub tangent_bytes: u64,
    pub tex_coord_bytes: [u64; MAX_TEX_COORD_CHANNELS],
    /// Every node reachable from the roots, mesh-less ones included.
    pub total_nodes: usize,
    pub root_nodes: usize,
    pub primitive_count: usize,
}

impl SceneInfo {
    pub fn stream_bytes(&self, stream: Stream) -> u64 {
        match stream {
            Stream::Position => self.position_bytes,
            Stream::Normal => self.normal_bytes,
            Stream::Tangent => self.tangent_bytes,
            Stream::TexCoord(channel) => self.tex_coord_bytes[channel as usize],
            Stream::Index => self.index_count * Stream::Index.element_size(),
        }
    }

    pub(crate) fn add_bytes(&mut self, stream: Stream, bytes: u64) {
        match stream {
            Stream::Position => self.position_bytes += bytes,
            Stream::Normal => self.normal_bytes += bytes,
            Stream::Tangent => self.tangent_bytes += bytes,
            Stream::TexCoord(channel) => self.tex_coord_bytes[channel as usize] += bytes,
            Stream::Index => self.index_count += bytes / Stream::Index.element_size(),
        }
    }

    /// Where the stream's region starts inside the staging buffer.
    pub fn base_offset(&self, stream: Stream) -> u64 {
        Stream::all()
            .take_while(|s| *s != stream)
            .map(|s| self.stream_bytes(s))
            .sum()
    }

    /// Size of the staging buffer holding every stream back to back.
    pub fn staging_bytes(&self) -> u64 {
        Stream::all().map(|s| self.stream_bytes(s)).sum()
    }

    /// Number of texcoord buffers a scene needs (highest used channel + 1).
    pub fn tex_coord_channels(&self) -> usize {
        self.tex_coord_bytes
            .iter()
            .rposition(|bytes| *bytes > 0)
            .map_or(0, |channel| channel + 1)
    }
}

/// Byte range inside one stream buffer.
///
/// Empty spans still carry the cursor position they were recorded at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub offset: u64,
    pub len: u64,
}

impl Span {
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One primitive of a mesh: the unit a renderer issues a draw call for.
///
/// Indices are relative to the submesh's first vertex, so a draw uses
/// `positions.offset / 12` as base vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submesh {
    pub index_count: u32,
    pub vertex_count: u32,
    pub material: Option<usize>,
    pub channels: TexCoordChannels,
    pub(crate) spans: [Span; Stream::COUNT],
}

impl Submesh {
    pub fn span(&self, stream: Stream) -> Span {
        self.spans[stream.slot()]
    }

    pub fn base_vertex(&self) -> u64 {
        self.span(Stream::Position).offset / Stream::Position.element_size()
    }

    pub fn first_index(&self) -> u64 {
        self.span(Stream::Index).offset / Stream::Index.element_size()
    }
}

/// One flattened scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    /// Transform relative to the parent, as authored.
    pub local: Matrix4<f32>,
    /// Composition of all ancestor transforms with `local`.
    pub world: Matrix4<f32>,
    /// Sum over all primitives; 0 for nodes without a mesh.
    pub index_count: u32,
    pub children_offset: u32,
    pub children_count: u32,
    pub submesh_offset: u32,
    pub submesh_count: u32,
    /// Channels of the first primitive's material.
    pub channels: TexCoordChannels,
    pub(crate) spans: [Span; Stream::COUNT],
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            name: None,
            local: Matrix4::identity(),
            world: Matrix4::identity(),
            index_count: 0,
            children_offset: 0,
            children_count: 0,
            submesh_offset: 0,
            submesh_count: 0,
            channels: TexCoordChannels::default(),
            spans: [Span::default(); Stream::COUNT],
        }
    }
}

impl Mesh {
    /// Bytes this node occupies in `stream`, covering all of its primitives.
    pub fn span(&self, stream: Stream) -> Span {
        self.spans[stream.slot()]
    }

    /// Byte offset into the stream's buffer.
    pub fn offset(&self, stream: Stream) -> u64 {
        self.span(stream).offset
    }

    pub fn children(&self) -> Range<usize> {
        self.children_offset as usize..(self.children_offset + self.children_count) as usize
    }

    pub fn submeshes(&self) -> Range<usize> {
        self.submesh_offset as usize..(self.submesh_offset + self.submesh_count) as usize
    }

    pub fn has_geometry(&self) -> bool {
        self.submesh_count > 0
    }
}

/// A loaded model: per-stream buffers plus the flattened node table.
///
/// `B` is the uploader's buffer handle, a `wgpu::Buffer` for real GPU loads.
/// The scene owns its buffers; dropping it releases them.
#[derive(Debug)]
pub struct Scene<B = wgpu::Buffer> {
    pub positions: B,
    pub normals: B,
    pub tangents: B,
    /// One buffer per channel `0..info.tex_coord_channels()`.
    pub tex_coords: Vec<B>,
    pub indices: B,
    /// Roots first (`0..root_count`), then each node's children as one block.
    pub meshes: Vec<Mesh>,
    pub submeshes: Vec<Submesh>,
    pub root_count: usize,
    pub info: SceneInfo,
}

impl<B> Scene<B> {
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn roots(&self) -> &[Mesh] {
        &self.meshes[..self.root_count]
    }

    pub fn children(&self, index: usize) -> &[Mesh] {
        &self.meshes[self.meshes[index].children()]
    }

    pub fn submeshes_of(&self, index: usize) -> &[Submesh] {
        &self.submeshes[self.meshes[index].submeshes()]
    }

    pub fn buffer(&self, stream: Stream) -> Option<&B> {
        match stream {
            Stream::Position => Some(&self.positions),
            Stream::Normal => Some(&self.normals),
            Stream::Tangent => Some(&self.tangents),
            Stream::TexCoord(channel) => self.tex_coords.get(channel as usize),
            Stream::Index => Some(&self.indices),
        }
    }

    /// Recomputes every `world` matrix from the `local` ones.
    ///
    /// Call after changing any `local` transform; see
    /// [`crate::processing::propagate::recalculate_transforms`].
    pub fn recalculate_transforms(&mut self) {
        crate::processing::propagate::recalculate_transforms(&mut self.meshes, self.root_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_round_trip_in_layout_order() {
        let streams: Vec<Stream> = Stream::all().collect();
        assert_eq!(streams.len(), Stream::COUNT);
        assert_eq!(streams[0], Stream::Position);
        assert_eq!(streams[3], Stream::TexCoord(0));
        assert_eq!(streams[Stream::COUNT - 1], Stream::Index);
        for (slot, stream) in streams.into_iter().enumerate() {
            assert_eq!(stream.slot(), slot);
        }
    }

    #[test]
    fn base_offsets_stack_streams() {
        let mut info = SceneInfo {
            index_count: 3,
            position_bytes: 36,
            normal_bytes: 36,
            ..Default::default()
        };
        info.tex_coord_bytes[1] = 24;
        assert_eq!(info.base_offset(Stream::Position), 0);
        assert_eq!(info.base_offset(Stream::Normal), 36);
        assert_eq!(info.base_offset(Stream::Tangent), 72);
        assert_eq!(info.base_offset(Stream::TexCoord(1)), 72);
        assert_eq!(info.base_offset(Stream::Index), 96);
        assert_eq!(info.staging_bytes(), 108);
        assert_eq!(info.tex_coord_channels(), 2);
    }
}
