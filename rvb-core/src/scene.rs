/// Named mesh objects with an active selection
use std::path::Path;

use tracing::{debug, warn};

use crate::error::ImportError;
use crate::geometry::Mesh;
use crate::{obj, stl};

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub mesh: Mesh,
}

/// Objects in file order. The active object is the one that gets exported.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub active: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object; the first one added becomes active.
    pub fn add_object(&mut self, name: impl Into<String>, mesh: Mesh) -> usize {
        self.objects.push(Object {
            name: name.into(),
            mesh,
        });
        let index = self.objects.len() - 1;
        if self.active.is_none() {
            self.active = Some(index);
        }
        index
    }

    pub fn active_object(&self) -> Option<&Object> {
        self.active.and_then(|i| self.objects.get(i))
    }

    /// Make the object called `name` active.
    ///
    /// An unknown name clears the selection, so a later export reports that
    /// nothing is selected.
    pub fn set_active(&mut self, name: &str) -> bool {
        self.active = self.objects.iter().position(|o| o.name == name);
        if self.active.is_none() {
            warn!("no object named {name:?}; selection cleared");
        }
        self.active.is_some()
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }
}

/// Load an `.obj` or `.stl` file into a scene.
///
/// Unnamed geometry is named after the file stem.
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "object".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let data = std::fs::read(path).map_err(|e| ImportError::IoPath {
        source: e,
        path: path.display().to_string(),
    })?;
    debug!("read {} bytes from {}", data.len(), path.display());

    match extension.as_str() {
        "obj" => {
            let text = std::str::from_utf8(&data).map_err(|_| ImportError::NotUtf8)?;
            obj::parse_obj(text, &stem)
        }
        "stl" => {
            let mesh = stl::parse_stl(&data)?;
            let mut scene = Scene::new();
            scene.add_object(stem, mesh);
            Ok(scene)
        }
        _ => Err(ImportError::UnsupportedFormat(extension)),
    }
}
