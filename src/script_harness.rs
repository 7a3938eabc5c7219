use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::camera::CameraRegistry;
use crate::ecs::EcsWorld;
use crate::environment::Lighting;
use crate::events::EventPayload;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    #[serde(default = "default_main_script")]
    pub main_script: String,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub key_presses: Vec<FixtureKeyPress>,
    #[serde(default)]
    pub custom_events: Vec<FixtureCustomEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureKeyPress {
    pub step: usize,
    pub scancode: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureCustomEvent {
    pub step: usize,
    pub code: u32,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessOutput {
    pub steps: usize,
    pub dt: f32,
    pub results: Vec<StepResult>,
    pub final_entities: Vec<EntitySummary>,
    pub camera: CameraSummary,
    pub lighting: LightingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub step: usize,
    pub logs: Vec<String>,
    pub dispatched: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySummary {
    pub name: String,
    pub translation: [f32; 3],
    pub yaw: f32,
    pub scale: [f32; 3],
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraSummary {
    pub index: usize,
    pub mode: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LightingSummary {
    pub ambient: [f32; 3],
    pub sun_color: [f32; 3],
    pub sun_position: [f32; 3],
}

/// Runs one scripted session deterministically: scheduled key presses and
/// custom events are injected at the start of their step, and the final
/// world state is summarized for comparison.
pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    let mut runtime = Runtime::new(&fixture.main_script);
    let mut results = Vec::with_capacity(fixture.steps);

    for step in 0..fixture.steps {
        let mut pressed = Vec::new();
        for press in fixture.key_presses.iter().filter(|p| p.step == step) {
            runtime.press_key(press.scancode);
            pressed.push(press.scancode);
        }
        for event in fixture.custom_events.iter().filter(|e| e.step == step) {
            let payload = match &event.payload {
                Some(text) => EventPayload::Text(text.clone()),
                None => EventPayload::Empty,
            };
            runtime.queue_custom(event.code, payload);
        }

        let report = runtime.step(fixture.dt);
        if let Some(error) = runtime.host().last_error() {
            anyhow::bail!("script error at step {step}: {error}");
        }
        results.push(StepResult { step, logs: report.logs, dispatched: report.dispatched });

        // Release scheduled keys so a later step can press them again.
        for scancode in pressed {
            runtime.release_key(scancode);
        }
    }

    let final_entities = collect_entities(&mut runtime.ecs);
    let camera = summarize_camera(&runtime.session.cameras);
    let lighting = summarize_lighting(&runtime.session.lighting);
    let map = runtime.session.map().map(|m| m.name().to_string());

    Ok(HarnessOutput {
        steps: fixture.steps,
        dt: fixture.dt,
        results,
        final_entities,
        camera,
        lighting,
        map,
    })
}

pub fn load_fixture<P: AsRef<Path>>(path: P) -> Result<HarnessFixture> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("opening fixture '{}'", path.as_ref().display()))?;
    serde_json::from_reader(file).with_context(|| "parsing fixture JSON")
}

fn collect_entities(ecs: &mut EcsWorld) -> Vec<EntitySummary> {
    ecs.snapshot()
        .into_iter()
        .map(|info| EntitySummary {
            name: info.name,
            translation: info.translation.to_array(),
            yaw: info.yaw,
            scale: info.scale.to_array(),
            active: info.active,
            clip: info.clip,
        })
        .collect()
}

fn summarize_camera(cameras: &CameraRegistry) -> CameraSummary {
    CameraSummary { index: cameras.active_index(), mode: cameras.active_rig().mode.index() }
}

fn summarize_lighting(lighting: &Lighting) -> LightingSummary {
    LightingSummary {
        ambient: lighting.ambient().to_array(),
        sun_color: lighting.sun_color().to_array(),
        sun_position: lighting.sun_position().to_array(),
    }
}

fn default_dt() -> f32 {
    0.016
}

fn default_steps() -> usize {
    3
}

fn default_main_script() -> String {
    "assets/scripts/demo.rhai".to_string()
}
