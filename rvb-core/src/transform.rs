/// Axis-convention transform applied to exported positions and normals
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::f32::consts::FRAC_PI_2;

/// Fixed export transform: identity, or Z-up to Y-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Rotation of -90 degrees about +X: (0, 0, 1) maps to (0, 1, 0).
    pub fn z_up_to_y_up() -> Self {
        Self {
            matrix: Matrix4::new_rotation(Vector3::new(-FRAC_PI_2, 0.0, 0.0)),
        }
    }

    pub fn for_export(y_up: bool) -> Self {
        if y_up {
            Self::z_up_to_y_up()
        } else {
            Self::identity()
        }
    }

    pub fn matrix(&self) -> &Matrix4<f32> {
        &self.matrix
    }

    /// Upper 3x3 block, used for directions
    pub fn rotation(&self) -> Matrix3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    /// Rotate a normal without renormalizing it
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        self.rotation() * normal
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
