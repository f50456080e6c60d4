//! First pass: sizing.

use crate::{
    data_structures::{
        document::{Document, Semantic},
        scene::{SceneInfo, Stream},
    },
    errors::FormatError,
    processing::primitive_streams,
};

/// Walks the scene depth-first, children in document order, and sums up how
/// much every stream needs.
///
/// This visiting order is the contract with [`crate::processing::pack`]: the
/// packer writes streams in exactly this order and sizes nothing itself. The
/// walk keeps its own stack, so tree depth is bounded by memory only.
pub fn analyze(document: &Document) -> Result<SceneInfo, FormatError> {
    let mut info = SceneInfo {
        root_nodes: document.roots.len(),
        ..Default::default()
    };
    let mut visited = vec![false; document.nodes.len()];
    let mut pending: Vec<usize> = document.roots.iter().rev().copied().collect();
    while let Some(index) = pending.pop() {
        let node = document.node(index)?;
        if std::mem::replace(&mut visited[index], true) {
            return Err(FormatError::NodeVisitedTwice(index));
        }
        visit(document, node.mesh, &mut info)?;
        pending.extend(node.children.iter().rev());
    }
    if info.total_nodes == 0 {
        log::warn!("Scene has no nodes; all buffers will be empty");
    }
    Ok(info)
}

fn visit(
    document: &Document,
    mesh: Option<usize>,
    info: &mut SceneInfo,
) -> Result<(), FormatError> {
    info.total_nodes += 1;
    let Some(mesh_index) = mesh else {
        return Ok(());
    };
    let mesh = document.mesh(mesh_index)?;
    for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
        for (semantic, _) in &primitive.attributes {
            if let Semantic::Other(name) = semantic {
                log::warn!("Ignoring unsupported attribute {name} of mesh {mesh_index}");
            }
        }
        let streams = primitive_streams(document, mesh_index, primitive_index, primitive)?;
        for (stream, accessor) in &streams.attributes {
            info.add_bytes(*stream, accessor.count as u64 * stream.element_size());
        }
        info.add_bytes(
            Stream::Index,
            streams.index_count() as u64 * Stream::Index.element_size(),
        );
        info.primitive_count += 1;
    }
    Ok(())
}
