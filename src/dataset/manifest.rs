use std::path::Path;

use anyhow::Context as _;

use crate::dataset::class_map::ClassMap;
use crate::foundation::error::{MosaicError, MosaicResult};

/// Contents of the `data.yaml` file consumed by YOLO trainers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatasetManifest {
    /// Training image folder, relative to the dataset root.
    pub train: String,
    /// Validation image folder, relative to the dataset root.
    pub val: String,
    /// Number of classes.
    pub nc: u32,
    /// Class names indexed by class id.
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Manifest covering every class id up to the highest mapped one.
    pub fn from_class_map(map: &ClassMap) -> Self {
        Self {
            train: "images".to_string(),
            val: "images".to_string(),
            nc: map.class_count(),
            names: map.names_by_class_id(),
        }
    }

    /// YAML text of the manifest.
    pub fn to_yaml(&self) -> MosaicResult<String> {
        serde_yaml::to_string(self).map_err(|e| MosaicError::serde(e.to_string()))
    }

    /// Loads a `data.yaml` file.
    pub fn read(path: &Path) -> MosaicResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read dataset manifest '{}'", path.display()))?;
        serde_yaml::from_str(&text).map_err(|e| MosaicError::serde(e.to_string()))
    }

    /// Writes the manifest to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> MosaicResult<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml)
            .with_context(|| format!("write dataset manifest '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/manifest.rs"]
mod tests;
