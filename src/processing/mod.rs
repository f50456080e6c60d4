//! Turns a [`Document`] into a GPU-resident [`Scene`].
//!
//! Loading runs in fixed phases:
//!
//! 1. [`analyze`] walks the node tree once and sums up how many bytes every
//!    stream needs ([`SceneInfo`](crate::data_structures::scene::SceneInfo)).
//! 2. [`pack`] walks the tree again in the same order, flattens it into the mesh
//!    array and unpacks all attribute/index data into one staging buffer.
//! 3. The uploader creates one buffer per stream and copies each stream's region
//!    of the staging buffer into it, one copy per stream.
//! 4. [`propagate`] composes the world transforms.
//!
//! Both walks take their per-primitive stream list from [`primitive_streams`],
//! so they cannot disagree about which accessors land in which stream.

pub mod analyze;
pub mod pack;
pub mod propagate;

use instant::Instant;

use crate::{
    data_structures::{
        document::{Accessor, ComponentType, Document, ElementType, Primitive, Semantic, Topology},
        scene::{MAX_TEX_COORD_CHANNELS, Scene, Stream},
    },
    errors::{FormatError, LoadError},
    upload::{BufferUploader, StreamRegion},
};

pub use analyze::analyze;
pub use pack::{PackedScene, SceneProcessing, pack};
pub use propagate::recalculate_transforms;

/// Runs the whole load pipeline against `uploader`.
///
/// Either every buffer is created and filled, or an error is returned and no
/// `Scene` exists.
pub fn build_scene<U: BufferUploader>(
    document: &Document,
    uploader: &U,
) -> Result<Scene<U::Buffer>, LoadError> {
    let started = Instant::now();
    let info = analyze(document)?;
    let PackedScene {
        staging,
        mut meshes,
        submeshes,
        root_count,
    } = pack(document, &info)?;

    let mut positions = uploader.create_buffer(Stream::Position, info.position_bytes)?;
    let mut normals = uploader.create_buffer(Stream::Normal, info.normal_bytes)?;
    let mut tangents = uploader.create_buffer(Stream::Tangent, info.tangent_bytes)?;
    let mut indices = uploader.create_buffer(Stream::Index, info.stream_bytes(Stream::Index))?;
    let mut tex_coords = (0..info.tex_coord_channels())
        .map(|channel| {
            let stream = Stream::TexCoord(channel as u8);
            uploader.create_buffer(stream, info.stream_bytes(stream))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let region = |stream| StreamRegion {
        stream,
        offset: info.base_offset(stream),
        size: info.stream_bytes(stream),
    };
    let mut copies = vec![
        (region(Stream::Position), &mut positions),
        (region(Stream::Normal), &mut normals),
        (region(Stream::Tangent), &mut tangents),
    ];
    copies.extend(
        tex_coords
            .iter_mut()
            .enumerate()
            .map(|(channel, buffer)| (region(Stream::TexCoord(channel as u8)), buffer)),
    );
    copies.push((region(Stream::Index), &mut indices));
    uploader.upload(&staging, copies)?;
    drop(staging);

    recalculate_transforms(&mut meshes, root_count);

    log::info!(
        "Loaded scene: {} nodes ({} roots), {} primitives, {} indices, {} staging bytes in {:?}",
        info.total_nodes,
        info.root_nodes,
        info.primitive_count,
        info.index_count,
        info.staging_bytes(),
        started.elapsed()
    );

    Ok(Scene {
        positions,
        normals,
        tangents,
        tex_coords,
        indices,
        meshes,
        submeshes,
        root_count,
        info,
    })
}

/// Maps a supported semantic to its stream and checks the accessor layout.
///
/// Returns `Ok(None)` for semantics that are not packed at all.
pub(crate) fn stream_for(
    semantic: &Semantic,
    accessor: &Accessor,
) -> Result<Option<Stream>, FormatError> {
    let stream = match semantic {
        Semantic::Position => Stream::Position,
        Semantic::Normal => Stream::Normal,
        Semantic::Tangent => Stream::Tangent,
        Semantic::TexCoord(channel) if (*channel as usize) < MAX_TEX_COORD_CHANNELS => {
            Stream::TexCoord(*channel as u8)
        }
        Semantic::TexCoord(channel) => {
            return Err(FormatError::TexCoordChannelOutOfRange(*channel));
        }
        Semantic::Other(_) => return Ok(None),
    };
    let expected_element = stream.element_type();
    if accessor.element_type != expected_element
        || accessor.component_type != ComponentType::F32
    {
        return Err(FormatError::UnsupportedAttribute {
            semantic: semantic.to_string(),
            element: accessor.element_type,
            component: accessor.component_type,
            normalized: accessor.normalized,
            expected_element,
            expected_component: ComponentType::F32,
        });
    }
    Ok(Some(stream))
}

/// Index accessors must be scalar u16 or u32; both are widened to u32.
pub(crate) fn check_indices(accessor: &Accessor) -> Result<(), FormatError> {
    match (accessor.element_type, accessor.component_type) {
        (ElementType::Scalar, ComponentType::U16 | ComponentType::U32) => Ok(()),
        (element, component) => Err(FormatError::UnsupportedIndices { element, component }),
    }
}

/// Validated view of one primitive: its vertex count and the accessors to pack.
pub(crate) struct PrimitiveStreams<'a> {
    pub vertex_count: usize,
    /// Supported attributes in document order.
    pub attributes: Vec<(Stream, &'a Accessor)>,
    /// `None` when the primitive is drawn without an index buffer.
    pub indices: Option<&'a Accessor>,
}

impl PrimitiveStreams<'_> {
    pub fn index_count(&self) -> usize {
        self.indices.map_or(self.vertex_count, |indices| indices.count)
    }
}

/// Resolves and validates everything about a primitive that decides its layout.
///
/// Accessors whose stored bytes disagree with their `count` are rejected here,
/// so the packer never writes a different amount than the analyzer sized.
///
/// This is the single source of truth shared by the analyzer and the packer.
pub(crate) fn primitive_streams<'a>(
    document: &'a Document,
    mesh: usize,
    index: usize,
    primitive: &Primitive,
) -> Result<PrimitiveStreams<'a>, FormatError> {
    if primitive.topology != Topology::Triangles {
        return Err(FormatError::UnsupportedTopology {
            mesh,
            primitive: index,
            mode: format!("{:?}", primitive.topology),
        });
    }

    let vertex_count = match primitive.attribute(&Semantic::Position) {
        Some(accessor) => document.accessor(accessor)?.count,
        None => 0,
    };

    let mut attributes = Vec::with_capacity(primitive.attributes.len());
    for (semantic, accessor_index) in &primitive.attributes {
        let accessor = document.accessor(*accessor_index)?;
        let Some(stream) = stream_for(semantic, accessor)? else {
            continue;
        };
        accessor.check_size(*accessor_index)?;
        if accessor.count != vertex_count {
            return Err(FormatError::AttributeCountMismatch {
                semantic: semantic.to_string(),
                expected: vertex_count,
                actual: accessor.count,
            });
        }
        attributes.push((stream, accessor));
    }

    let indices = match primitive.indices {
        Some(accessor_index) => {
            let accessor = document.accessor(accessor_index)?;
            check_indices(accessor)?;
            accessor.check_size(accessor_index)?;
            Some(accessor)
        }
        None => None,
    };

    Ok(PrimitiveStreams {
        vertex_count,
        attributes,
        indices,
    })
}
