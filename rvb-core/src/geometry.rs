/// Polygon mesh model: vertices, loops, polygons and an optional UV layer
use nalgebra::{Point2, Point3, Vector3};

/// One corner of a polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loop {
    pub vertex: u32,
    /// Custom split normal supplied by the importer, if any
    pub normal: Option<Vector3<f32>>,
}

/// A face made of `loop_total` consecutive loops starting at `loop_start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polygon {
    pub loop_start: usize,
    pub loop_total: usize,
    pub use_smooth: bool,
    pub normal: Vector3<f32>,
}

impl Polygon {
    pub fn loops(&self) -> std::ops::Range<usize> {
        self.loop_start..self.loop_start + self.loop_total
    }
}

/// A triangle of a polygon's tessellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTriangle {
    pub loops: [usize; 3],
    pub polygon: usize,
}

/// Corner data handed to [`Mesh::add_polygon`]
#[derive(Debug, Clone, Copy)]
pub struct PolygonCorner {
    pub vertex: u32,
    pub normal: Option<Vector3<f32>>,
    pub uv: Option<Point2<f32>>,
}

impl PolygonCorner {
    pub fn new(vertex: u32) -> Self {
        Self {
            vertex,
            normal: None,
            uv: None,
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = Some(Point2::new(u, v));
        self
    }

    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        self.normal = Some(normal);
        self
    }
}

/// A polygon mesh.
///
/// Loops of one polygon are stored contiguously. When present, `uv_layer`
/// holds exactly one coordinate per loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>,
    pub loops: Vec<Loop>,
    pub polygons: Vec<Polygon>,
    pub uv_layer: Option<Vec<Point2<f32>>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32) -> u32 {
        self.vertices.push(Point3::new(x, y, z));
        (self.vertices.len() - 1) as u32
    }

    /// Append a polygon and return its index.
    ///
    /// The face normal is computed immediately. A UV layer is created on the
    /// first corner that carries a coordinate; loops added before that read
    /// as (0, 0).
    pub fn add_polygon(&mut self, corners: &[PolygonCorner], use_smooth: bool) -> usize {
        let loop_start = self.loops.len();

        if self.uv_layer.is_none() && corners.iter().any(|c| c.uv.is_some()) {
            self.uv_layer = Some(vec![Point2::origin(); loop_start]);
        }

        for corner in corners {
            self.loops.push(Loop {
                vertex: corner.vertex,
                normal: corner.normal,
            });
            if let Some(layer) = &mut self.uv_layer {
                layer.push(corner.uv.unwrap_or_else(Point2::origin));
            }
        }

        let mut polygon = Polygon {
            loop_start,
            loop_total: corners.len(),
            use_smooth,
            normal: Vector3::zeros(),
        };
        polygon.normal = normalize_or_zero(self.area_normal(&polygon));
        self.polygons.push(polygon);
        self.polygons.len() - 1
    }

    pub fn loop_position(&self, loop_index: usize) -> Point3<f32> {
        self.vertices[self.loops[loop_index].vertex as usize]
    }

    /// Newell normal of a polygon, with length equal to twice its area
    fn area_normal(&self, polygon: &Polygon) -> Vector3<f32> {
        let mut normal = Vector3::zeros();
        for i in 0..polygon.loop_total {
            let current = self.loop_position(polygon.loop_start + i);
            let next = self.loop_position(polygon.loop_start + (i + 1) % polygon.loop_total);
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        normal
    }

    /// Recompute every face normal from the current geometry
    pub fn calc_normals(&mut self) {
        for i in 0..self.polygons.len() {
            let normal = normalize_or_zero(self.area_normal(&self.polygons[i]));
            self.polygons[i].normal = normal;
        }
    }

    /// Area-weighted average of the face normals around each vertex
    pub fn vertex_normals(&self) -> Vec<Vector3<f32>> {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        for polygon in &self.polygons {
            let weighted = self.area_normal(polygon);
            for l in polygon.loops() {
                sums[self.loops[l].vertex as usize] += weighted;
            }
        }
        sums.into_iter().map(normalize_or_zero).collect()
    }

    /// Fan tessellation of every polygon.
    ///
    /// Polygons with fewer than three loops produce no triangles.
    pub fn loop_triangles(&self) -> Vec<LoopTriangle> {
        let mut triangles = Vec::with_capacity(self.triangle_count());
        for (index, polygon) in self.polygons.iter().enumerate() {
            let first = polygon.loop_start;
            for i in 1..polygon.loop_total.saturating_sub(1) {
                triangles.push(LoopTriangle {
                    loops: [first, first + i, first + i + 1],
                    polygon: index,
                });
            }
        }
        triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| p.loop_total.saturating_sub(2))
            .sum()
    }

    /// Split every polygon into triangles in place.
    ///
    /// Loop normals and UVs travel with their loops, the smooth flag is
    /// inherited, and the face normals of the new triangles are recomputed.
    pub fn triangulate(&mut self) {
        let triangles = self.loop_triangles();
        let old_loops = std::mem::take(&mut self.loops);
        let old_polygons = std::mem::take(&mut self.polygons);
        let old_uvs = self.uv_layer.take();

        let mut uvs = old_uvs.as_ref().map(|_| Vec::with_capacity(triangles.len() * 3));
        self.loops.reserve(triangles.len() * 3);
        self.polygons.reserve(triangles.len());

        for triangle in &triangles {
            let loop_start = self.loops.len();
            for &l in &triangle.loops {
                self.loops.push(old_loops[l]);
                if let (Some(new), Some(old)) = (&mut uvs, &old_uvs) {
                    new.push(old[l]);
                }
            }
            self.polygons.push(Polygon {
                loop_start,
                loop_total: 3,
                use_smooth: old_polygons[triangle.polygon].use_smooth,
                normal: Vector3::zeros(),
            });
        }

        self.uv_layer = uvs;
        self.calc_normals();
    }

    /// Axis-aligned cube of quads centred on the origin, with per-face UVs
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::new();
        for &(x, y, z) in &[
            (-half, -half, -half),
            (half, -half, -half),
            (half, half, -half),
            (-half, half, -half),
            (-half, -half, half),
            (half, -half, half),
            (half, half, half),
            (-half, half, half),
        ] {
            mesh.add_vertex(x, y, z);
        }

        // Counter-clockwise seen from outside
        let faces: [[u32; 4]; 6] = [
            [4, 5, 6, 7], // +Z
            [1, 0, 3, 2], // -Z
            [3, 7, 6, 2], // +Y
            [0, 1, 5, 4], // -Y
            [1, 2, 6, 5], // +X
            [0, 4, 7, 3], // -X
        ];
        let uvs = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        for face in &faces {
            let corners: Vec<PolygonCorner> = face
                .iter()
                .zip(uvs.iter())
                .map(|(&v, &(u, w))| PolygonCorner::new(v).with_uv(u, w))
                .collect();
            mesh.add_polygon(&corners, false);
        }

        mesh
    }
}

pub(crate) fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    v.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_vertex(1.0, 0.0, 0.0);
        mesh.add_vertex(1.0, 1.0, 0.0);
        mesh.add_vertex(0.0, 1.0, 0.0);
        let corners: Vec<_> = (0..4).map(PolygonCorner::new).collect();
        mesh.add_polygon(&corners, false);
        mesh
    }

    #[test]
    fn test_face_normal() {
        let mesh = quad();
        assert_relative_eq!(mesh.polygons[0].normal, Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_polygon_has_zero_normal() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_vertex(1.0, 0.0, 0.0);
        mesh.add_vertex(2.0, 0.0, 0.0);
        let corners: Vec<_> = (0..3).map(PolygonCorner::new).collect();
        mesh.add_polygon(&corners, false);
        assert_eq!(mesh.polygons[0].normal, Vector3::zeros());
    }

    #[test]
    fn test_loop_triangles_fan() {
        let mesh = quad();
        let triangles = mesh.loop_triangles();
        assert_eq!(
            triangles,
            vec![
                LoopTriangle { loops: [0, 1, 2], polygon: 0 },
                LoopTriangle { loops: [0, 2, 3], polygon: 0 },
            ]
        );
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_short_polygon_yields_no_triangles() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_vertex(1.0, 0.0, 0.0);
        mesh.add_polygon(&[PolygonCorner::new(0), PolygonCorner::new(1)], false);
        assert!(mesh.loop_triangles().is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_uv_layer_backfills_earlier_loops() {
        let mut mesh = quad();
        let corners: Vec<_> = (0..3).map(|v| PolygonCorner::new(v).with_uv(0.5, 0.25)).collect();
        mesh.add_polygon(&corners, false);
        let layer = mesh.uv_layer.as_ref().unwrap();
        assert_eq!(layer.len(), mesh.loops.len());
        assert_eq!(layer[0], Point2::origin());
        assert_eq!(layer[4], Point2::new(0.5, 0.25));
    }

    #[test]
    fn test_triangulate_cube() {
        let mut cube = Mesh::cube(2.0);
        assert_eq!(cube.polygons.len(), 6);
        cube.triangulate();
        assert_eq!(cube.polygons.len(), 12);
        assert_eq!(cube.loops.len(), 36);
        assert_eq!(cube.uv_layer.as_ref().map(Vec::len), Some(36));
        assert!(cube.polygons.iter().all(|p| p.loop_total == 3));
        // +Z face split in two keeps its normal
        assert_relative_eq!(cube.polygons[0].normal, Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(cube.polygons[1].normal, Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_triangulate_keeps_smooth_flag_and_custom_normals() {
        let mut mesh = Mesh::new();
        for &(x, y) in &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.add_vertex(x, y, 0.0);
        }
        let corners: Vec<_> = (0..4)
            .map(|v| PolygonCorner::new(v).with_normal(Vector3::new(0.0, v as f32, 1.0)))
            .collect();
        mesh.add_polygon(&corners, true);
        mesh.triangulate();
        assert!(mesh.polygons.iter().all(|p| p.use_smooth));
        // second triangle is loops [0, 2, 3] of the quad
        assert_eq!(mesh.loops[4].normal, Some(Vector3::new(0.0, 2.0, 1.0)));
        assert_eq!(mesh.loops[5].vertex, 3);
    }

    #[test]
    fn test_cube_vertex_normals_point_outward() {
        let cube = Mesh::cube(2.0);
        let normals = cube.vertex_normals();
        let expected = Vector3::new(1.0, 1.0, 1.0).normalize();
        assert_relative_eq!(normals[6], expected, epsilon = 1e-6);
        for (position, normal) in cube.vertices.iter().zip(&normals) {
            assert!(position.coords.dot(normal) > 0.0);
        }
    }
}
