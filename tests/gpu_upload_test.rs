#[cfg(feature = "integration-tests")]
use crate::common::test_utils::{f32s, parent_child_scene, u32s};

#[cfg(feature = "integration-tests")]
mod common;

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_read_back_uploaded_streams() {
    use flow_scene::{build_scene, context::GpuContext, upload::read_buffer};

    let ctx = GpuContext::new_headless().await.unwrap();
    let scene = build_scene(&parent_child_scene(), &ctx.uploader("test")).unwrap();

    let positions = read_buffer(&ctx.device, &ctx.queue, &scene.positions)
        .await
        .unwrap();
    assert_eq!(
        f32s(&positions),
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    );
    let indices = read_buffer(&ctx.device, &ctx.queue, &scene.indices)
        .await
        .unwrap();
    assert_eq!(u32s(&indices), vec![0, 1, 2]);
    assert_eq!(scene.normals.size(), 0);
    assert!(scene.tex_coords.is_empty());
}

#[tokio::test]
#[cfg(feature = "integration-tests")]
async fn should_load_fixture_onto_gpu() {
    use flow_scene::{LoadConfig, context::GpuContext, resources::load_model, upload::read_buffer};

    let ctx = GpuContext::new_headless().await.unwrap();
    let config = LoadConfig::default().with_asset_dir("tests/fixtures");
    let scene = load_model("parent_child.glb", &ctx.device, &ctx.queue, &config)
        .await
        .unwrap();
    assert_eq!(scene.len(), 2);
    let uvs = read_buffer(&ctx.device, &ctx.queue, &scene.tex_coords[0])
        .await
        .unwrap();
    assert_eq!(f32s(&uvs), vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_load_blocking_outside_a_runtime() {
    use flow_scene::{LoadConfig, context::GpuContext, resources::load_model_blocking};

    let ctx = futures::executor::block_on(GpuContext::new_headless()).unwrap();
    let config = LoadConfig::default().with_asset_dir("tests/fixtures");
    let scene = load_model_blocking("parent_child.gltf", &ctx.device, &ctx.queue, &config).unwrap();
    assert_eq!(scene.info.index_count, 3);
}
