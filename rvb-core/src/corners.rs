/// Triangle-corner attribute resolution
use nalgebra::{Point2, Point3, Vector3};

use crate::geometry::{LoopTriangle, Mesh};

/// Untransformed attributes of one triangle corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Point2<f32>,
}

/// Anything that can supply triangles as resolved corners.
///
/// The RVB writer only needs this, so synthetic fixtures can stand in for
/// a full [`Mesh`].
pub trait CornerSource {
    fn triangle_count(&self) -> usize;

    /// Corners of triangle `index`, in winding order
    fn triangle(&self, index: usize) -> [Corner; 3];
}

impl CornerSource for [[Corner; 3]] {
    fn triangle_count(&self) -> usize {
        self.len()
    }

    fn triangle(&self, index: usize) -> [Corner; 3] {
        self[index]
    }
}

/// Resolves a mesh's loop triangles into corners.
///
/// Smooth polygons take each loop's normal (custom, else the vertex normal);
/// flat polygons take the face normal. Without a UV layer every UV is zero.
pub struct MeshCorners<'a> {
    mesh: &'a Mesh,
    triangles: Vec<LoopTriangle>,
    vertex_normals: Vec<Vector3<f32>>,
}

impl<'a> MeshCorners<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        let vertex_normals = if mesh.polygons.iter().any(|p| p.use_smooth) {
            mesh.vertex_normals()
        } else {
            Vec::new()
        };
        Self {
            mesh,
            triangles: mesh.loop_triangles(),
            vertex_normals,
        }
    }

    fn loop_normal(&self, loop_index: usize) -> Vector3<f32> {
        let l = &self.mesh.loops[loop_index];
        l.normal.unwrap_or_else(|| self.vertex_normals[l.vertex as usize])
    }

    fn corner(&self, loop_index: usize, polygon: usize) -> Corner {
        let polygon = &self.mesh.polygons[polygon];
        let normal = if polygon.use_smooth {
            self.loop_normal(loop_index)
        } else {
            polygon.normal
        };
        let uv = match &self.mesh.uv_layer {
            Some(layer) => layer[loop_index],
            None => Point2::origin(),
        };
        Corner {
            position: self.mesh.loop_position(loop_index),
            normal,
            uv,
        }
    }
}

impl CornerSource for MeshCorners<'_> {
    fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn triangle(&self, index: usize) -> [Corner; 3] {
        let triangle = &self.triangles[index];
        triangle.loops.map(|l| self.corner(l, triangle.polygon))
    }
}
