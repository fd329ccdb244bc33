/// Mesh to RVB1 export
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::corners::{CornerSource, MeshCorners};
use crate::error::{RvbError, RvbResult};
use crate::geometry::Mesh;
use crate::rvb::{RvbWriter, VertexRecord};
use crate::scene::Scene;
use crate::transform::Transform;

/// Export switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Split every polygon into triangles before export
    pub triangulate: bool,
    /// Rotate from Z-up to Y-up
    pub y_up: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            y_up: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub object: String,
    pub triangle_count: usize,
    pub vertex_count: u32,
}

/// Number of records `source` produces, if it fits the header's `u32`
fn vertex_count<S: CornerSource + ?Sized>(source: &S) -> RvbResult<u32> {
    let corners = source.triangle_count() * 3;
    u32::try_from(corners).map_err(|_| RvbError::TooManyVertices(corners))
}

/// Write every triangle of `source` as RVB1 records into `w`.
pub fn write_corners<W, S>(w: W, source: &S, transform: &Transform) -> RvbResult<W>
where
    W: Write,
    S: CornerSource + ?Sized,
{
    let mut writer = RvbWriter::new(w, vertex_count(source)?)?;
    for index in 0..source.triangle_count() {
        for corner in source.triangle(index) {
            writer.write_record(&VertexRecord {
                position: transform.transform_point(&corner.position),
                normal: transform.transform_normal(&corner.normal),
                uv: corner.uv,
                color: VertexRecord::WHITE,
            })?;
        }
    }
    writer.finish()
}

/// Export a mesh into `w`; returns the writer and the vertex count.
///
/// The mesh is not modified: triangulation happens on a working copy that
/// is dropped before returning.
pub fn export_mesh<W: Write>(mesh: &Mesh, w: W, options: &ExportOptions) -> RvbResult<(W, u32)> {
    let mut working = mesh.clone();
    if options.triangulate {
        working.triangulate();
        debug!("triangulated to {} polygons", working.polygons.len());
    }

    let corners = MeshCorners::new(&working);
    let count = vertex_count(&corners)?;
    let transform = Transform::for_export(options.y_up);
    let w = write_corners(w, &corners, &transform)?;
    Ok((w, count))
}

/// Export the scene's active object to `path`.
///
/// Without an active object this returns [`RvbError::NoActiveObject`] and no
/// file is created.
pub fn export_scene<P: AsRef<Path>>(
    scene: &Scene,
    path: P,
    options: &ExportOptions,
) -> RvbResult<ExportSummary> {
    let path = path.as_ref();
    let object = scene.active_object().ok_or(RvbError::NoActiveObject)?;
    debug!(
        "exporting {:?} (triangulate={}, y_up={})",
        object.name, options.triangulate, options.y_up
    );

    let f = File::create(path).map_err(|e| RvbError::IoPath {
        source: e,
        path: path.display().to_string(),
    })?;
    let (_w, vertex_count) = export_mesh(&object.mesh, BufWriter::new(f), options)?;

    info!(
        "wrote {} vertices of {:?} to {}",
        vertex_count,
        object.name,
        path.display()
    );
    Ok(ExportSummary {
        object: object.name.clone(),
        triangle_count: vertex_count as usize / 3,
        vertex_count,
    })
}
