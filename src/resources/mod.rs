/**
 * This module contains all logic for loading models from external files and
 * turning them into GPU resident scenes.
 */
pub mod asset;
pub mod gltf_document;

use anyhow::Context as _;

use crate::{
    config::LoadConfig,
    data_structures::{document::Document, scene::Scene},
    processing::build_scene,
    upload::{BufferUploader, WgpuUploader},
};

pub use asset::{load_binary, load_buffers};

/// Parses a `.gltf` or `.glb` file below the asset directory, together with all
/// its buffers, into a [`Document`].
pub async fn load_document(file_name: &str, config: &LoadConfig) -> anyhow::Result<Document> {
    let path = config.resolve(file_name);
    let bytes = load_binary(&path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid glTF file", path.display()))?;
    let base_dir = path.parent().unwrap_or(&path);
    let buffers = load_buffers(&gltf, base_dir)
        .await
        .with_context(|| format!("Could not load the buffers of {file_name}"))?;
    let document = Document::from_gltf(&gltf, &buffers, config.scene)
        .with_context(|| format!("Unsupported content in {file_name}"))?;
    Ok(document)
}

/// Loads a model through any uploader, e.g. a
/// [`HostUploader`](crate::upload::HostUploader) for tooling.
pub async fn load_model_with<U: BufferUploader>(
    file_name: &str,
    config: &LoadConfig,
    uploader: &U,
) -> anyhow::Result<Scene<U::Buffer>> {
    let document = load_document(file_name, config).await?;
    let scene = build_scene(&document, uploader)
        .with_context(|| format!("Failed to build scene from {file_name}"))?;
    Ok(scene)
}

/// Loads a model into wgpu buffers.
pub async fn load_model(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &LoadConfig,
) -> anyhow::Result<Scene> {
    let uploader = WgpuUploader::new(device, queue, &config.label);
    load_model_with(file_name, config, &uploader).await
}

/// Blocking variant of [`load_model`] on a private runtime.
///
/// Must not be called from within an async runtime.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_model_blocking(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &LoadConfig,
) -> anyhow::Result<Scene> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(load_model(file_name, device, queue, config))
}
