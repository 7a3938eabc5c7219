use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Map manifest loaded by `new_game`. Terrain payloads live next to the
/// manifest and belong to the renderer; the runtime only needs the metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapDescriptor {
    pub name: String,
    #[serde(default = "MapDescriptor::default_extent")]
    pub width: u32,
    #[serde(default = "MapDescriptor::default_extent")]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<[f32; 3]>,
}

impl MapDescriptor {
    const fn default_extent() -> u32 {
        128
    }

    pub fn load(dir: impl AsRef<Path>, file: &str) -> Result<Self> {
        let path = dir.as_ref().join(file);
        let bytes = fs::read(&path).with_context(|| format!("reading map manifest '{}'", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing map manifest '{}'", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub descriptor: MapDescriptor,
    pub path: PathBuf,
}

impl LoadedMap {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
