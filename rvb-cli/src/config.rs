/// Export settings file
use std::path::Path;

use anyhow::Context;
use rvb_core::ExportOptions;
use serde::Deserialize;

/// Contents of a `--config` TOML file.
///
/// ```toml
/// triangulate = true
/// y_up = false
/// object = "Suzanne"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub object: Option<String>,
    #[serde(flatten)]
    pub options: ExportOptions,
}

impl ExportConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply command-line overrides. Flags only ever switch options off; an
    /// explicit object name replaces the configured one.
    pub fn with_overrides(
        mut self,
        object: Option<&str>,
        no_triangulate: bool,
        no_y_up: bool,
    ) -> Self {
        if let Some(name) = object {
            self.object = Some(name.to_string());
        }
        self.options.triangulate &= !no_triangulate;
        self.options.y_up &= !no_y_up;
        self
    }
}
