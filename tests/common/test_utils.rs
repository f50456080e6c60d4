use cgmath::{Matrix4, Vector3};
use flow_scene::data_structures::document::{
    Accessor, Document, ElementType, MeshData, Node, Primitive, Semantic,
};

pub const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

pub fn translate(x: f32, y: f32, z: f32) -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(x, y, z))
}

/// Builds small documents by hand. Nodes are only added as roots when asked.
#[derive(Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accessor(&mut self, accessor: Accessor) -> usize {
        self.document.accessors.push(accessor);
        self.document.accessors.len() - 1
    }

    pub fn mesh(&mut self, primitives: Vec<Primitive>) -> usize {
        self.document.meshes.push(MeshData {
            name: None,
            primitives,
        });
        self.document.meshes.len() - 1
    }

    /// A primitive with the given positions and optional `u16` indices.
    pub fn positions_primitive(&mut self, positions: &[f32], indices: Option<&[u16]>) -> Primitive {
        let positions = self.accessor(Accessor::from_f32(ElementType::Vec3, positions).unwrap());
        let indices = indices.map(|indices| self.accessor(Accessor::from_u16(indices)));
        Primitive::triangles(vec![(Semantic::Position, positions)], indices)
    }

    /// A mesh with one indexed triangle.
    pub fn triangle_mesh(&mut self) -> usize {
        let primitive = self.positions_primitive(&TRIANGLE, Some(&[0, 1, 2]));
        self.mesh(vec![primitive])
    }

    pub fn node(&mut self, name: &str, local: Matrix4<f32>, mesh: Option<usize>) -> usize {
        self.document.nodes.push(Node {
            name: Some(name.to_string()),
            local,
            mesh,
            children: Vec::new(),
        });
        self.document.nodes.len() - 1
    }

    pub fn child(&mut self, parent: usize, child: usize) {
        self.document.nodes[parent].children.push(child);
    }

    pub fn root(&mut self, node: usize) {
        self.document.roots.push(node);
    }

    pub fn build(self) -> Document {
        self.document
    }
}

/// Root R at (0, 0, 5) with a single child C at (1, 0, 0) that holds one triangle.
pub fn parent_child_scene() -> Document {
    let mut builder = DocumentBuilder::new();
    let triangle = builder.triangle_mesh();
    let root = builder.node("R", translate(0.0, 0.0, 5.0), None);
    let child = builder.node("C", translate(1.0, 0.0, 0.0), Some(triangle));
    builder.child(root, child);
    builder.root(root);
    builder.build()
}

pub fn f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn u32s(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
