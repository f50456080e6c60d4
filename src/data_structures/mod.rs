//! Engine data structures: the parsed asset document, transforms and the flattened scene.
//!
//! - `document` is the typed node/mesh/accessor model a loaded asset is turned into
//! - `transform` holds TRS transforms and their 4x4 matrix form
//! - `scene` contains the flattened mesh table, sizing info and the GPU-resident `Scene`

pub mod document;
pub mod scene;
pub mod transform;
