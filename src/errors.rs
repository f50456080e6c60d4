//! Error types for scene loading.
//!
//! Loading fails in three distinct ways:
//!
//! - [`FormatError`]: the asset uses something outside the supported profile
//!   (attribute encodings, topology, graph shape). Fatal for the load.
//! - [`UploadError`]: the uploader could not create or fill a destination buffer.
//! - Internal invariant violations (packing cursors diverging from the sizes the
//!   analyzer computed) are bugs, not data errors, and panic instead of being
//!   returned here.
//!
//! [`LoadError`] wraps both for [`crate::processing::build_scene`]. File access and
//! glTF parsing failures surface through `anyhow` in [`crate::resources`].

use thiserror::Error;

use crate::data_structures::{
    document::{ComponentType, ElementType},
    scene::Stream,
};

/// The asset is valid glTF but falls outside the profile this loader packs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error(
        "attribute {semantic} must be {expected_element:?} of {expected_component:?}, found {element:?} of {component:?} (normalized: {normalized})"
    )]
    UnsupportedAttribute {
        semantic: String,
        element: ElementType,
        component: ComponentType,
        normalized: bool,
        expected_element: ElementType,
        expected_component: ComponentType,
    },

    #[error("indices must be scalar u16 or u32, found {element:?} of {component:?}")]
    UnsupportedIndices {
        element: ElementType,
        component: ComponentType,
    },

    #[error("primitive {primitive} of mesh {mesh} is not a triangle list ({mode})")]
    UnsupportedTopology {
        mesh: usize,
        primitive: usize,
        mode: String,
    },

    #[error("texture coordinate channel {0} exceeds the supported 16 channels")]
    TexCoordChannelOutOfRange(u32),

    #[error("attribute {semantic} has {actual} elements but the primitive has {expected} vertices")]
    AttributeCountMismatch {
        semantic: String,
        expected: usize,
        actual: usize,
    },

    #[error("index {index} references past the {vertex_count} vertices of its primitive")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("accessor {0} is sparse or has no buffer view")]
    SparseAccessor(usize),

    #[error("accessor {accessor} holds {actual} bytes but its count requires {expected}")]
    AccessorSizeMismatch {
        accessor: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{values} values do not form whole elements of {components} components")]
    PartialElement { components: usize, values: usize },

    #[error("accessor {0} reads past the end of its buffer")]
    AccessorOutOfBounds(usize),

    #[error("buffer {0} has no data (missing GLB chunk or unresolved uri)")]
    MissingBuffer(usize),

    #[error("node {0} does not exist")]
    InvalidNode(usize),

    #[error("mesh {0} does not exist")]
    InvalidMesh(usize),

    #[error("accessor {0} does not exist")]
    InvalidAccessor(usize),

    #[error("node {0} is reachable more than once; only trees are supported")]
    NodeVisitedTwice(usize),

    #[error("scene {0} does not exist")]
    MissingScene(usize),
}

/// Failure reported by a [`crate::upload::BufferUploader`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{stream} buffer needs {size} bytes but the device allows at most {max}")]
    BufferTooLarge { stream: Stream, size: u64, max: u64 },

    #[error("{stream} region {offset}..{end} lies outside the {staging} byte staging buffer")]
    RegionOutOfBounds {
        stream: Stream,
        offset: u64,
        end: u64,
        staging: u64,
    },

    #[error("{stream} region at {offset} with {size} bytes is not {alignment}-byte aligned")]
    Misaligned {
        stream: Stream,
        offset: u64,
        size: u64,
        alignment: u64,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("unsupported asset: {0}")]
    Format(#[from] FormatError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}
