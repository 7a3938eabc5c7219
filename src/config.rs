use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    #[serde(default = "ScriptConfig::default_main_script")]
    pub main_script: String,
}

impl ScriptConfig {
    fn default_main_script() -> String {
        "assets/scripts/demo.rhai".to_string()
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self { main_script: Self::default_main_script() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_dt")]
    pub dt: f32,
    #[serde(default = "SimulationConfig::default_steps")]
    pub steps: u32,
}

impl SimulationConfig {
    fn default_dt() -> f32 {
        0.016
    }

    const fn default_steps() -> u32 {
        120
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { dt: Self::default_dt(), steps: Self::default_steps() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfigOverrides {
    pub script: Option<String>,
    pub steps: Option<u32>,
    pub dt: Option<f32>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(script) = &overrides.script {
            self.script.main_script = script.clone();
        }
        if let Some(steps) = overrides.steps {
            self.simulation.steps = steps;
        }
        if let Some(dt) = overrides.dt {
            self.simulation.dt = dt;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.script.is_none() && self.steps.is_none() && self.dt.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.script.is_some() {
            fields.push("script");
        }
        if self.steps.is_some() {
            fields.push("steps");
        }
        if self.dt.is_some() {
            fields.push("dt");
        }
        fields
    }
}
