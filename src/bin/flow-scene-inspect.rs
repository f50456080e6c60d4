//! Loads a model without a GPU and prints how it was flattened.
//!
//! Usage: `flow-scene-inspect <model.gltf|model.glb> [scene]`, relative to
//! `FLOW_SCENE_ASSET_DIR` (default `./assets`).

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context as _;
    use flow_scene::{
        LoadConfig, Stream, data_structures::transform::translation_of, logging::init_logging,
        resources::load_model_with, upload::HostUploader,
    };

    init_logging();
    let mut args = std::env::args().skip(1);
    let file_name = args
        .next()
        .context("usage: flow-scene-inspect <model> [scene]")?;
    let mut config = LoadConfig::from_env();
    if let Some(scene) = args.next() {
        config = config.with_scene(scene.parse().context("scene must be an index")?);
    }

    let scene = load_model_with(&file_name, &config, &HostUploader::default()).await?;
    let info = &scene.info;
    println!(
        "{file_name}: {} nodes ({} roots), {} primitives, {} indices",
        info.total_nodes, info.root_nodes, info.primitive_count, info.index_count
    );
    for stream in Stream::all().filter(|stream| info.stream_bytes(*stream) > 0) {
        println!(
            "  {stream:>12}: {:>10} bytes at staging offset {}",
            info.stream_bytes(stream),
            info.base_offset(stream)
        );
    }
    println!();
    println!(
        "{:>5}  {:<24} {:>8} {:>10} {:>10}  world translation",
        "slot", "name", "indices", "children", "submeshes"
    );
    for (slot, mesh) in scene.meshes.iter().enumerate() {
        let translation = translation_of(&mesh.world);
        println!(
            "{slot:>5}  {:<24} {:>8} {:>10} {:>10}  ({:.3}, {:.3}, {:.3})",
            mesh.name.as_deref().unwrap_or("-"),
            mesh.index_count,
            format!("{:?}", mesh.children()),
            format!("{:?}", mesh.submeshes()),
            translation.x,
            translation.y,
            translation.z
        );
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
