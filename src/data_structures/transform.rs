//! Node transforms.
//!
//! Scene nodes store their placement as a column-major 4x4 matrix. Authoring
//! tools and glTF often describe it as translation, rotation and scale instead,
//! which [`Transform`] converts with the usual `T * R * S` order.

use cgmath::{Matrix4, One, Vector3};

/// Translation, rotation (as quaternion) and non-uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

impl From<Transform> for Matrix4<f32> {
    fn from(transform: Transform) -> Self {
        transform.to_matrix()
    }
}

/// Local matrix of a glTF node, whichever way the file authored it.
pub fn local_matrix(transform: gltf::scene::Transform) -> Matrix4<f32> {
    match transform {
        gltf::scene::Transform::Matrix { matrix } => Matrix4::from(matrix),
        gltf::scene::Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Transform {
            position: translation.into(),
            // glTF stores quaternions as [x, y, z, w]
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
        .to_matrix(),
    }
}

/// Translation column of an affine matrix.
pub fn translation_of(matrix: &Matrix4<f32>) -> Vector3<f32> {
    matrix.w.truncate()
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Rotation3, SquareMatrix};

    use super::*;

    #[test]
    fn decomposed_and_matrix_forms_agree() {
        let rotation = cgmath::Quaternion::from_angle_y(Deg(90.0));
        let transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation,
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let decomposed = local_matrix(gltf::scene::Transform::Decomposed {
            translation: [1.0, 2.0, 3.0],
            rotation: [rotation.v.x, rotation.v.y, rotation.v.z, rotation.s],
            scale: [2.0, 2.0, 2.0],
        });
        assert_eq!(decomposed, transform.to_matrix());

        let matrix: [[f32; 4]; 4] = transform.to_matrix().into();
        assert_eq!(
            local_matrix(gltf::scene::Transform::Matrix { matrix }),
            transform.to_matrix()
        );
    }

    #[test]
    fn identity_has_no_translation() {
        assert_eq!(Transform::new().to_matrix(), Matrix4::identity());
        assert_eq!(
            translation_of(&Transform::from(Vector3::new(4.0, 5.0, 6.0)).to_matrix()),
            Vector3::new(4.0, 5.0, 6.0)
        );
    }
}
