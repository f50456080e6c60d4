use flow_scene::{
    FormatError, SceneInfo,
    data_structures::document::{Accessor, ComponentType, ElementType, Primitive, Semantic, Topology},
    processing::analyze,
};

use crate::common::test_utils::{DocumentBuilder, TRIANGLE, parent_child_scene, translate};

mod common;

#[test]
fn should_size_parent_child_scene() {
    let info = analyze(&parent_child_scene()).unwrap();
    assert_eq!(
        info,
        SceneInfo {
            index_count: 3,
            position_bytes: 36,
            total_nodes: 2,
            root_nodes: 1,
            primitive_count: 1,
            ..Default::default()
        }
    );
    assert_eq!(info.staging_bytes(), 36 + 12);
    assert_eq!(info.tex_coord_channels(), 0);
}

#[test]
fn should_count_meshless_node_without_bytes() {
    let mut builder = DocumentBuilder::new();
    let empty = builder.node("empty", translate(0.0, 0.0, 0.0), None);
    builder.root(empty);
    let info = analyze(&builder.build()).unwrap();

    assert_eq!(info.total_nodes, 1);
    assert_eq!(info.root_nodes, 1);
    assert_eq!(info.staging_bytes(), 0);
}

#[test]
fn should_sum_every_stream_over_all_primitives() {
    let mut builder = DocumentBuilder::new();
    let positions = builder.accessor(Accessor::from_f32(ElementType::Vec3, &TRIANGLE).unwrap());
    let normals = builder.accessor(Accessor::from_f32(ElementType::Vec3, &[0.0; 9]).unwrap());
    let tangents = builder.accessor(Accessor::from_f32(ElementType::Vec4, &[0.0; 12]).unwrap());
    let uv0 = builder.accessor(Accessor::from_f32(ElementType::Vec2, &[0.0; 6]).unwrap());
    let uv2 = builder.accessor(Accessor::from_f32(ElementType::Vec2, &[0.0; 6]).unwrap());
    let indices = builder.accessor(Accessor::from_u32(&[0, 1, 2, 2, 1, 0]));
    let full = Primitive::triangles(
        vec![
            (Semantic::Position, positions),
            (Semantic::Normal, normals),
            (Semantic::Tangent, tangents),
            (Semantic::TexCoord(0), uv0),
            (Semantic::TexCoord(2), uv2),
        ],
        Some(indices),
    );
    let mesh = builder.mesh(vec![full]);
    let a = builder.node("a", translate(0.0, 0.0, 0.0), Some(mesh));
    let b = builder.node("b", translate(0.0, 0.0, 0.0), Some(mesh));
    builder.root(a);
    builder.root(b);
    let info = analyze(&builder.build()).unwrap();

    assert_eq!(info.position_bytes, 2 * 3 * 12);
    assert_eq!(info.normal_bytes, 2 * 3 * 12);
    assert_eq!(info.tangent_bytes, 2 * 3 * 16);
    assert_eq!(info.tex_coord_bytes[0], 2 * 3 * 8);
    assert_eq!(info.tex_coord_bytes[1], 0);
    assert_eq!(info.tex_coord_bytes[2], 2 * 3 * 8);
    assert_eq!(info.index_count, 12);
    assert_eq!(info.tex_coord_channels(), 3);
    assert_eq!(info.root_nodes, 2);
}

#[test]
fn should_count_generated_indices_for_non_indexed_primitives() {
    let mut builder = DocumentBuilder::new();
    let primitive = builder.positions_primitive(&[0.0; 18], None);
    let mesh = builder.mesh(vec![primitive]);
    let node = builder.node("quad", translate(0.0, 0.0, 0.0), Some(mesh));
    builder.root(node);
    let info = analyze(&builder.build()).unwrap();
    assert_eq!(info.index_count, 6);
}

#[test]
fn should_ignore_unsupported_semantics() {
    let mut builder = DocumentBuilder::new();
    let mut primitive = builder.positions_primitive(&TRIANGLE, Some(&[0, 1, 2]));
    let colors = builder.accessor(Accessor::from_f32(ElementType::Vec4, &[1.0; 12]).unwrap());
    primitive
        .attributes
        .push((Semantic::Other("COLOR_0".to_string()), colors));
    let mesh = builder.mesh(vec![primitive]);
    let node = builder.node("colored", translate(0.0, 0.0, 0.0), Some(mesh));
    builder.root(node);
    let info = analyze(&builder.build()).unwrap();
    assert_eq!(info.position_bytes, 36);
    assert_eq!(info.staging_bytes(), 36 + 12);
}

fn single_primitive(primitive: impl FnOnce(&mut DocumentBuilder) -> Primitive) -> Result<SceneInfo, FormatError> {
    let mut builder = DocumentBuilder::new();
    let primitive = primitive(&mut builder);
    let mesh = builder.mesh(vec![primitive]);
    let node = builder.node("n", translate(0.0, 0.0, 0.0), Some(mesh));
    builder.root(node);
    analyze(&builder.build())
}

#[test]
fn should_reject_non_float_positions() {
    let err = single_primitive(|builder| {
        let positions = builder.accessor(Accessor::from_raw(
            ElementType::Vec3,
            ComponentType::U16,
            true,
            1,
            vec![0; 6],
        ));
        Primitive::triangles(vec![(Semantic::Position, positions)], None)
    })
    .unwrap_err();
    assert!(matches!(
        err,
        FormatError::UnsupportedAttribute {
            component: ComponentType::U16,
            expected_component: ComponentType::F32,
            ..
        }
    ));
}

#[test]
fn should_reject_vec3_tex_coords() {
    let err = single_primitive(|builder| {
        let mut primitive = builder.positions_primitive(&TRIANGLE, None);
        let uv = builder.accessor(Accessor::from_f32(ElementType::Vec3, &[0.0; 9]).unwrap());
        primitive.attributes.push((Semantic::TexCoord(0), uv));
        primitive
    })
    .unwrap_err();
    assert!(matches!(
        err,
        FormatError::UnsupportedAttribute {
            element: ElementType::Vec3,
            expected_element: ElementType::Vec2,
            ..
        }
    ));
}

#[test]
fn should_reject_u8_and_float_indices() {
    let err = single_primitive(|builder| {
        let positions = builder.accessor(Accessor::from_f32(ElementType::Vec3, &TRIANGLE).unwrap());
        let indices = builder.accessor(Accessor::from_raw(
            ElementType::Scalar,
            ComponentType::U8,
            false,
            3,
            vec![0, 1, 2],
        ));
        Primitive::triangles(vec![(Semantic::Position, positions)], Some(indices))
    })
    .unwrap_err();
    assert_eq!(
        err,
        FormatError::UnsupportedIndices {
            element: ElementType::Scalar,
            component: ComponentType::U8
        }
    );

    let err = single_primitive(|builder| {
        let positions = builder.accessor(Accessor::from_f32(ElementType::Vec3, &TRIANGLE).unwrap());
        let indices = builder.accessor(Accessor::from_f32(ElementType::Scalar, &[0.0, 1.0, 2.0]).unwrap());
        Primitive::triangles(vec![(Semantic::Position, positions)], Some(indices))
    })
    .unwrap_err();
    assert!(matches!(err, FormatError::UnsupportedIndices { .. }));
}

#[test]
fn should_reject_non_triangle_topology() {
    let err = single_primitive(|builder| {
        let mut primitive = builder.positions_primitive(&TRIANGLE, None);
        primitive.topology = Topology::TriangleStrip;
        primitive
    })
    .unwrap_err();
    assert!(matches!(err, FormatError::UnsupportedTopology { mesh: 0, primitive: 0, .. }));
}

#[test]
fn should_reject_tex_coord_channel_past_sixteen() {
    let err = single_primitive(|builder| {
        let mut primitive = builder.positions_primitive(&TRIANGLE, None);
        let uv = builder.accessor(Accessor::from_f32(ElementType::Vec2, &[0.0; 6]).unwrap());
        primitive.attributes.push((Semantic::TexCoord(16), uv));
        primitive
    })
    .unwrap_err();
    assert_eq!(err, FormatError::TexCoordChannelOutOfRange(16));
}

#[test]
fn should_reject_attribute_count_mismatch() {
    let err = single_primitive(|builder| {
        let mut primitive = builder.positions_primitive(&TRIANGLE, None);
        let normals = builder.accessor(Accessor::from_f32(ElementType::Vec3, &[0.0; 6]).unwrap());
        primitive.attributes.push((Semantic::Normal, normals));
        primitive
    })
    .unwrap_err();
    assert_eq!(
        err,
        FormatError::AttributeCountMismatch {
            semantic: Semantic::Normal.to_string(),
            expected: 3,
            actual: 2
        }
    );
}

#[test]
fn should_reject_shared_nodes() {
    let mut builder = DocumentBuilder::new();
    let a = builder.node("a", translate(0.0, 0.0, 0.0), None);
    let b = builder.node("b", translate(0.0, 0.0, 0.0), None);
    let shared = builder.node("shared", translate(0.0, 0.0, 0.0), None);
    builder.child(a, shared);
    builder.child(b, shared);
    builder.root(a);
    builder.root(b);
    assert_eq!(
        analyze(&builder.build()).unwrap_err(),
        FormatError::NodeVisitedTwice(2)
    );
}

#[test]
fn should_reject_dangling_references() {
    let mut builder = DocumentBuilder::new();
    let node = builder.node("lost", translate(0.0, 0.0, 0.0), Some(7));
    builder.root(node);
    assert_eq!(
        analyze(&builder.build()).unwrap_err(),
        FormatError::InvalidMesh(7)
    );
}
