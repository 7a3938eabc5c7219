use std::path::Path;

use crate::assets::AssetManager;
use crate::ecs::EcsWorld;
use crate::events::{EventBus, EventCode, EventPayload, EVENT_KEYDOWN};
use crate::input::Input;
use crate::scripts::{EventHandlers, ScriptApi, ScriptHost};
use crate::session::Session;

/// Events queued by a handler are delivered in the same step, up to this
/// many drain passes; anything still queued spills into the next step.
const MAX_DISPATCH_PASSES: usize = 8;

pub struct StepReport {
    pub logs: Vec<String>,
    pub dispatched: usize,
}

/// Headless game runtime: one script, one world, one synchronous event
/// pump. The embedder owns the loop and calls `step` at whatever cadence it
/// likes; everything here runs on the calling thread.
pub struct Runtime {
    pub ecs: EcsWorld,
    pub assets: AssetManager,
    pub input: Input,
    pub bus: EventBus,
    pub session: Session,
    handlers: EventHandlers,
    host: ScriptHost,
    logs: Vec<String>,
    steps: u64,
}

impl Runtime {
    pub fn new(script_path: impl AsRef<Path>) -> Self {
        Self {
            ecs: EcsWorld::new(),
            assets: AssetManager::new(),
            input: Input::new(),
            bus: EventBus::default(),
            session: Session::new(),
            handlers: EventHandlers::default(),
            host: ScriptHost::new(script_path),
            logs: Vec::new(),
            steps: 0,
        }
    }

    pub fn host(&self) -> &ScriptHost {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut ScriptHost {
        &mut self.host
    }

    pub fn handlers(&self) -> &EventHandlers {
        &self.handlers
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn press_key(&mut self, scancode: u32) {
        self.input.press(scancode);
    }

    pub fn release_key(&mut self, scancode: u32) {
        self.input.release(scancode);
    }

    pub fn queue_custom(&mut self, code: EventCode, payload: EventPayload) {
        self.bus.global(code, payload);
    }

    /// One cooperative step: key presses become bus events, the script runs
    /// (top level once, then `update`), queued events are dispatched to the
    /// registered handlers, and the ECS schedule advances.
    pub fn step(&mut self, dt: f32) -> StepReport {
        for scancode in self.input.drain_pressed() {
            self.bus.global(EVENT_KEYDOWN, EventPayload::Int(scancode as i64));
        }

        let api = self.api();
        self.host.update(api, dt);

        let mut dispatched = 0usize;
        let mut passes = 0usize;
        while !self.bus.is_empty() && passes < MAX_DISPATCH_PASSES {
            let events = self.bus.drain();
            let api = self.api();
            dispatched += self.host.dispatch(api, &events);
            passes += 1;
        }

        self.ecs.update(dt);
        self.steps += 1;

        StepReport { logs: std::mem::take(&mut self.logs), dispatched }
    }

    fn api(&mut self) -> ScriptApi {
        ScriptApi::new(
            &mut self.ecs,
            &mut self.assets,
            &mut self.session,
            &mut self.bus,
            &mut self.handlers,
            &mut self.logs,
        )
    }
}
