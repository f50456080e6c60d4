//! Second pass: flattening and filling the staging buffer.
//!
//! The node tree becomes one `Vec<Mesh>`: the roots take the first slots, and
//! every node reserves one contiguous block for its children before its
//! children are visited. All attribute and index data is unpacked straight into a single
//! staging buffer in which every stream owns the region
//! `[base_offset, base_offset + stream_bytes)`.

use std::ops::Range;

use crate::{
    data_structures::{
        document::{Document, Primitive},
        scene::{Mesh, SceneInfo, Span, Stream, Submesh},
    },
    errors::FormatError,
    processing::{PrimitiveStreams, primitive_streams},
};

/// Output of [`pack`], ready for one batched upload.
#[derive(Debug)]
pub struct PackedScene {
    /// Every stream back to back, laid out as described by [`SceneInfo::base_offset`].
    pub staging: Vec<u8>,
    pub meshes: Vec<Mesh>,
    pub submeshes: Vec<Submesh>,
    pub root_count: usize,
}

/// Write cursors of one load.
///
/// Each stream has a fixed base offset in the staging buffer and a cursor that
/// only moves forward; a second cursor hands out child slots of the flattened
/// mesh array. Running past either limit means the packer walked the tree
/// differently than the analyzer did, which is a bug and panics.
#[derive(Debug)]
pub struct SceneProcessing {
    base: [u64; Stream::COUNT],
    cursor: [u64; Stream::COUNT],
    end: [u64; Stream::COUNT],
    next_slot: usize,
    total_nodes: usize,
}

impl SceneProcessing {
    pub fn new(info: &SceneInfo) -> Self {
        let mut base = [0; Stream::COUNT];
        let mut end = [0; Stream::COUNT];
        let mut offset = 0;
        for stream in Stream::all() {
            base[stream.slot()] = offset;
            offset += info.stream_bytes(stream);
            end[stream.slot()] = offset;
        }
        Self {
            base,
            cursor: base,
            end,
            next_slot: 0,
            total_nodes: info.total_nodes,
        }
    }

    pub fn base_offset(&self, stream: Stream) -> u64 {
        self.base[stream.slot()]
    }

    /// Bytes written to `stream` so far.
    pub fn written(&self, stream: Stream) -> u64 {
        self.cursor[stream.slot()] - self.base[stream.slot()]
    }

    /// Claims `len` bytes of `stream`, returning the recorded span and the
    /// staging range to fill.
    pub fn claim(&mut self, stream: Stream, len: u64) -> (Span, Range<usize>) {
        let slot = stream.slot();
        let start = self.cursor[slot];
        assert!(
            start + len <= self.end[slot],
            "{stream} cursor overflow: {} + {len} exceeds {} bytes; analyzer and packer disagree",
            start - self.base[slot],
            self.end[slot] - self.base[slot],
        );
        self.cursor[slot] = start + len;
        let span = Span {
            offset: start - self.base[slot],
            len,
        };
        (span, start as usize..(start + len) as usize)
    }

    /// Spans of length zero at the current cursors.
    pub fn empty_spans(&self) -> [Span; Stream::COUNT] {
        std::array::from_fn(|slot| Span {
            offset: self.cursor[slot] - self.base[slot],
            len: 0,
        })
    }

    /// Spans covering everything written since `start` was taken.
    pub fn spans_since(&self, start: &[Span; Stream::COUNT]) -> [Span; Stream::COUNT] {
        std::array::from_fn(|slot| Span {
            offset: start[slot].offset,
            len: self.cursor[slot] - self.base[slot] - start[slot].offset,
        })
    }

    /// Reserves `count` contiguous slots of the flattened array.
    pub fn reserve_children(&mut self, count: usize) -> usize {
        let first = self.next_slot;
        assert!(
            first + count <= self.total_nodes,
            "child slots {first}..{} exceed the {} analyzed nodes",
            first + count,
            self.total_nodes
        );
        self.next_slot += count;
        first
    }

    /// Checks that every cursor ended exactly where the analyzer said it would.
    pub fn finish(&self) {
        for stream in Stream::all() {
            let slot = stream.slot();
            assert_eq!(
                self.cursor[slot], self.end[slot],
                "{stream} stream was not filled completely"
            );
        }
        assert_eq!(
            self.next_slot, self.total_nodes,
            "flattened node count differs from the analyzed one"
        );
    }
}

/// Flattens the tree and unpacks all stream data, visiting nodes in the order
/// [`crate::processing::analyze`] did.
pub fn pack(document: &Document, info: &SceneInfo) -> Result<PackedScene, FormatError> {
    let mut staging = vec![0u8; info.staging_bytes() as usize];
    let mut meshes = vec![Mesh::default(); info.total_nodes];
    let mut submeshes = Vec::with_capacity(info.primitive_count);
    let mut processing = SceneProcessing::new(info);

    let first_root = processing.reserve_children(document.roots.len());
    let mut target = Target {
        staging: &mut staging,
        meshes: &mut meshes,
        submeshes: &mut submeshes,
    };
    // (node, slot) pairs; pushed in reverse so they pop in document order
    let mut pending: Vec<(usize, usize)> = document
        .roots
        .iter()
        .enumerate()
        .rev()
        .map(|(i, &root)| (root, first_root + i))
        .collect();
    while let Some((index, slot)) = pending.pop() {
        let children = pack_node(document, index, slot, &mut processing, &mut target)?;
        let node = document.node(index)?;
        pending.extend(
            node.children
                .iter()
                .enumerate()
                .rev()
                .map(|(i, &child)| (child, children.start + i)),
        );
    }
    processing.finish();

    Ok(PackedScene {
        staging,
        meshes,
        submeshes,
        root_count: document.roots.len(),
    })
}

struct Target<'a> {
    staging: &'a mut [u8],
    meshes: &'a mut [Mesh],
    submeshes: &'a mut Vec<Submesh>,
}

/// Fills `slot` from node `index` and returns the slots reserved for its
/// children.
fn pack_node(
    document: &Document,
    index: usize,
    slot: usize,
    processing: &mut SceneProcessing,
    target: &mut Target<'_>,
) -> Result<Range<usize>, FormatError> {
    let node = document.node(index)?;
    let mut mesh = Mesh {
        name: node.name.clone(),
        local: node.local,
        // scratch value, the propagator composes the real one
        world: node.local,
        ..Default::default()
    };

    let start = processing.empty_spans();
    mesh.submesh_offset = target.submeshes.len() as u32;
    if let Some(mesh_index) = node.mesh {
        let data = document.mesh(mesh_index)?;
        for (primitive_index, primitive) in data.primitives.iter().enumerate() {
            let streams = primitive_streams(document, mesh_index, primitive_index, primitive)?;
            let submesh = pack_primitive(primitive, &streams, processing, target)?;
            mesh.index_count += submesh.index_count;
            target.submeshes.push(submesh);
        }
        mesh.submesh_count = data.primitives.len() as u32;
        if let Some(primitive) = data.primitives.first() {
            mesh.channels = primitive.channels;
        }
    }
    mesh.spans = processing.spans_since(&start);

    mesh.children_offset = processing.reserve_children(node.children.len()) as u32;
    mesh.children_count = node.children.len() as u32;
    log::debug!(
        "Flattened node {index} ({}) into slot {slot}: {} indices, children {:?}",
        node.name.as_deref().unwrap_or("unnamed"),
        mesh.index_count,
        mesh.children()
    );
    let children = mesh.children();
    target.meshes[slot] = mesh;
    Ok(children)
}

fn pack_primitive(
    primitive: &Primitive,
    streams: &PrimitiveStreams<'_>,
    processing: &mut SceneProcessing,
    target: &mut Target<'_>,
) -> Result<Submesh, FormatError> {
    let mut submesh = Submesh {
        vertex_count: streams.vertex_count as u32,
        material: primitive.material,
        channels: primitive.channels,
        spans: processing.empty_spans(),
        ..Default::default()
    };

    for (stream, accessor) in &streams.attributes {
        let floats = accessor.unpack_floats();
        let bytes: &[u8] = bytemuck::cast_slice(&floats);
        let (span, range) = processing.claim(*stream, bytes.len() as u64);
        target.staging[range].copy_from_slice(bytes);
        submesh.spans[stream.slot()] = span;
    }

    let indices = match streams.indices {
        Some(accessor) => accessor
            .unpack_indices()
            .ok_or(FormatError::UnsupportedIndices {
                element: accessor.element_type,
                component: accessor.component_type,
            })?,
        None => (0..streams.vertex_count as u32).collect(),
    };
    if let Some(&index) = indices
        .iter()
        .find(|&&index| index as usize >= streams.vertex_count)
    {
        return Err(FormatError::IndexOutOfRange {
            index,
            vertex_count: streams.vertex_count,
        });
    }
    let bytes: &[u8] = bytemuck::cast_slice(&indices);
    let (span, range) = processing.claim(Stream::Index, bytes.len() as u64);
    target.staging[range].copy_from_slice(bytes);
    submesh.spans[Stream::Index.slot()] = span;
    submesh.index_count = indices.len() as u32;

    Ok(submesh)
}
