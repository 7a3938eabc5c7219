use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Model manifest describing a spawnable asset. `clips` is empty for static
/// props; animated actors list the named clips the host may play.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelManifest {
    pub name: String,
    pub mesh: String,
    #[serde(default)]
    pub clips: Vec<String>,
}

impl ModelManifest {
    pub fn has_clip(&self, clip: &str) -> bool {
        self.clips.iter().any(|c| c == clip)
    }
}

/// Caches model manifests by `(dir, file)` so repeated spawns of the same
/// asset hit the filesystem once.
#[derive(Default)]
pub struct AssetManager {
    models: HashMap<String, ModelManifest>,
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn model_key(dir: &str, file: &str) -> String {
        format!("{dir}/{file}")
    }

    pub fn load_model(&mut self, dir: &str, file: &str) -> Result<&ModelManifest> {
        match self.models.entry(Self::model_key(dir, file)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let manifest = read_manifest(dir, file)?;
                Ok(entry.insert(manifest))
            }
        }
    }

    pub fn model(&self, dir: &str, file: &str) -> Option<&ModelManifest> {
        self.models.get(&Self::model_key(dir, file))
    }

    /// Registers an in-memory manifest, bypassing the filesystem. Used by
    /// generated content and test setups.
    pub fn insert_model(&mut self, dir: &str, file: &str, manifest: ModelManifest) {
        self.models.insert(Self::model_key(dir, file), manifest);
    }

    pub fn loaded_model_count(&self) -> usize {
        self.models.len()
    }
}

fn read_manifest(dir: &str, file: &str) -> Result<ModelManifest> {
    let path = Path::new(dir).join(file);
    let bytes = fs::read(&path).with_context(|| format!("reading model manifest '{}'", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing model manifest '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(dir: &Path, file: &str, json: &str) {
        let mut f = std::fs::File::create(dir.join(file)).expect("create manifest");
        write!(f, "{json}").expect("write manifest");
    }

    #[test]
    fn load_model_caches_by_dir_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_manifest(
            dir.path(),
            "crate.json",
            r#"{ "name": "Crate", "mesh": "crate.mesh" }"#,
        );

        let mut assets = AssetManager::new();
        let dir_str = dir.path().to_string_lossy().into_owned();
        let manifest = assets.load_model(&dir_str, "crate.json").expect("load manifest");
        assert_eq!(manifest.name, "Crate");
        assert!(manifest.clips.is_empty());
        assert_eq!(assets.loaded_model_count(), 1);

        // Second load must not re-read the file.
        std::fs::remove_file(dir.path().join("crate.json")).expect("remove manifest");
        assets.load_model(&dir_str, "crate.json").expect("cached manifest");
    }

    #[test]
    fn missing_manifest_error_names_the_file() {
        let mut assets = AssetManager::new();
        let err = assets.load_model("no/such/dir", "ghost.json").unwrap_err();
        assert!(err.to_string().contains("ghost.json"), "error should name the manifest: {err}");
    }

    #[test]
    fn has_clip_matches_exact_names() {
        let manifest = ModelManifest {
            name: "Sinbad".to_string(),
            mesh: "sinbad.mesh".to_string(),
            clips: vec!["Dance".to_string(), "RunBase".to_string()],
        };
        assert!(manifest.has_clip("Dance"));
        assert!(!manifest.has_clip("dance"));
    }
}
