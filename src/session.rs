use crate::camera::CameraRegistry;
use crate::environment::Lighting;
use crate::map::{LoadedMap, MapDescriptor};
use anyhow::Result;
use glam::Vec3;
use std::path::{Path, PathBuf};

/// Per-game state the script mutates directly: the loaded map, lighting and
/// the camera rigs. A `new_game` call replaces the map and applies any
/// lighting defaults the map manifest carries.
pub struct Session {
    pub lighting: Lighting,
    pub cameras: CameraRegistry,
    map: Option<LoadedMap>,
}

impl Session {
    pub fn new() -> Self {
        Self { lighting: Lighting::new(), cameras: CameraRegistry::new(), map: None }
    }

    pub fn new_game(&mut self, dir: impl AsRef<Path>, file: &str) -> Result<&LoadedMap> {
        let dir = dir.as_ref();
        let descriptor = MapDescriptor::load(dir, file)?;
        if let Some([r, g, b]) = descriptor.ambient {
            self.lighting.set_ambient(Vec3::new(r, g, b));
        }
        let path: PathBuf = dir.join(file);
        Ok(self.map.insert(LoadedMap { descriptor, path }))
    }

    pub fn map(&self) -> Option<&LoadedMap> {
        self.map.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
