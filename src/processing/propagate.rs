//! World transform propagation over the flattened mesh array.

use crate::data_structures::scene::Mesh;

/// Composes `world = parent.world * local` for every mesh, roots taking their
/// `local` unchanged.
///
/// Uses full 4x4 multiplication with column vectors, so `local` is applied first
/// and the parent's rotation and scale act on the child's translation.
///
/// The packer always places a node's children block after the node's own slot,
/// so a single forward sweep visits every parent before its children. Running it
/// again without touching any `local` reproduces the same matrices bit for bit.
pub fn recalculate_transforms(meshes: &mut [Mesh], root_count: usize) {
    for root in &mut meshes[..root_count] {
        root.world = root.local;
    }
    for parent in 0..meshes.len() {
        let world = meshes[parent].world;
        let children = meshes[parent].children();
        debug_assert!(
            children.is_empty() || children.start > parent,
            "children of slot {parent} start before it at {}",
            children.start
        );
        for child in &mut meshes[children] {
            child.world = world * child.local;
        }
    }
}
