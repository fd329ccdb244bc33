/// RVB Core Library - mesh model, importers and the RVB1 raw vertex buffer format
///
/// This library reads OBJ and STL meshes into a scene of named objects,
/// resolves per-corner positions, normals and UVs, and writes them as
/// unindexed RVB1 vertex records.

pub mod corners;
pub mod error;
pub mod export;
pub mod geometry;
pub mod obj;
pub mod rvb;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use corners::{Corner, CornerSource, MeshCorners};
pub use error::{ImportError, RvbError, RvbResult};
pub use export::{export_mesh, export_scene, write_corners, ExportOptions, ExportSummary};
pub use geometry::{LoopTriangle, Mesh, Polygon, PolygonCorner};
pub use rvb::{Attribute, Header, RvbReader, RvbWriter, VertexRecord};
pub use scene::{load_scene, Object, Scene};
pub use transform::Transform;
