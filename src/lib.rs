//! flow-scene
//!
//! Loads glTF scene graphs into a handful of large GPU buffers: one per vertex
//! attribute stream plus one index buffer, and a flat array of meshes that
//! describes which part of each buffer belongs to which node. Loading is two
//! passes over the same depth-first order (sizing, then packing into a single
//! staging buffer), one batched upload, and a transform sweep over the flat
//! array.
//!
//! High-level modules
//! - `config`: per-load settings such as the asset directory
//! - `context`: headless wgpu device/queue for tools and tests
//! - `data_structures`: the input document model and the resulting scene
//! - `errors`: format, upload and load errors
//! - `logging`: logger setup for native and wasm
//! - `processing`: scene analysis, packing and transform propagation
//! - `resources`: reading glTF files and buffers from disk or the web
//! - `upload`: the uploader seam with wgpu and host memory implementations
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod errors;
pub mod logging;
pub mod processing;
pub mod resources;
pub mod upload;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::LoadConfig;
pub use data_structures::scene::{Mesh, Scene, SceneInfo, Span, Stream, Submesh};
pub use errors::{FormatError, LoadError, UploadError};
pub use processing::build_scene;
