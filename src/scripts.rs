use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use glam::Vec3;
use rand::Rng;
use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, FnPtr, Map, Scope, AST, FLOAT, INT};
use smallvec::SmallVec;

use crate::assets::AssetManager;
use crate::camera::CameraMode;
use crate::ecs::EcsWorld;
use crate::events::{EventBus, EventCode, EventPayload, QueuedEvent, EVENT_KEYDOWN};
use crate::session::Session;

/// A script callback subscribed to an event code. `user_data` is promoted to
/// a shared value at registration so callbacks can keep mutable state (the
/// demo's toggle counters) across invocations.
#[derive(Clone)]
pub struct ScriptHandler {
    pub callback: FnPtr,
    pub user_data: Dynamic,
}

type HandlerList = SmallVec<[ScriptHandler; 2]>;

/// Registration table for script event handlers, keyed globally by event
/// code and per entity for targeted notifications.
#[derive(Default)]
pub struct EventHandlers {
    global: HashMap<EventCode, HandlerList>,
    targeted: HashMap<(Entity, EventCode), HandlerList>,
}

impl EventHandlers {
    pub fn register_global(&mut self, code: EventCode, handler: ScriptHandler) {
        self.global.entry(code).or_default().push(handler);
    }

    pub fn unregister_global(&mut self, code: EventCode, fn_name: &str) -> bool {
        let Some(list) = self.global.get_mut(&code) else {
            return false;
        };
        let before = list.len();
        list.retain(|handler| handler.callback.fn_name() != fn_name);
        before != list.len()
    }

    pub fn register_targeted(&mut self, target: Entity, code: EventCode, handler: ScriptHandler) {
        self.targeted.entry((target, code)).or_default().push(handler);
    }

    pub fn unregister_targeted(&mut self, target: Entity, code: EventCode, fn_name: &str) -> bool {
        let Some(list) = self.targeted.get_mut(&(target, code)) else {
            return false;
        };
        let before = list.len();
        list.retain(|handler| handler.callback.fn_name() != fn_name);
        before != list.len()
    }

    pub fn forget_entity(&mut self, target: Entity) {
        self.targeted.retain(|(entity, _), _| *entity != target);
    }

    /// Drops every targeted registration. Used when the world is cleared
    /// wholesale, since all entity handles become stale at once.
    pub fn forget_all_entities(&mut self) {
        self.targeted.clear();
    }

    /// Cloned handler list for one event. Snapshotting up front lets a
    /// callback re-register or unregister without invalidating the dispatch
    /// pass that invoked it.
    pub fn snapshot(&self, code: EventCode, target: Option<Entity>) -> HandlerList {
        match target {
            Some(entity) => self.targeted.get(&(entity, code)).cloned().unwrap_or_default(),
            None => self.global.get(&code).cloned().unwrap_or_default(),
        }
    }

    pub fn global_count(&self) -> usize {
        self.global.values().map(|list| list.len()).sum()
    }

    pub fn targeted_count(&self) -> usize {
        self.targeted.values().map(|list| list.len()).sum()
    }
}

/// Script-visible handle over the runtime subsystems, registered with the
/// engine as the `Game` type. Raw pointers keep it `Copy` for cheap passing
/// into callbacks; instances only live for the duration of a host call.
#[derive(Clone, Copy)]
pub struct ScriptApi {
    ecs: *mut EcsWorld,
    assets: *mut AssetManager,
    session: *mut Session,
    bus: *mut EventBus,
    handlers: *mut EventHandlers,
    logs: *mut Vec<String>,
}

unsafe impl Send for ScriptApi {}
unsafe impl Sync for ScriptApi {}

impl ScriptApi {
    pub fn new(
        ecs: &mut EcsWorld,
        assets: &mut AssetManager,
        session: &mut Session,
        bus: &mut EventBus,
        handlers: &mut EventHandlers,
        logs: &mut Vec<String>,
    ) -> Self {
        Self { ecs, assets, session, bus, handlers, logs }
    }

    fn handler_snapshot(&self, code: EventCode, target: Option<Entity>) -> HandlerList {
        let handlers = unsafe { &*self.handlers };
        handlers.snapshot(code, target)
    }

    // ---------- Lighting ----------

    fn set_ambient_light(&mut self, r: FLOAT, g: FLOAT, b: FLOAT) {
        let session = unsafe { &mut *self.session };
        session.lighting.set_ambient(Vec3::new(r as f32, g as f32, b as f32));
    }

    fn set_sun_color(&mut self, r: FLOAT, g: FLOAT, b: FLOAT) {
        let session = unsafe { &mut *self.session };
        session.lighting.set_sun_color(Vec3::new(r as f32, g as f32, b as f32));
    }

    fn set_sun_position(&mut self, x: FLOAT, y: FLOAT, z: FLOAT) {
        let session = unsafe { &mut *self.session };
        session.lighting.set_sun_position(Vec3::new(x as f32, y as f32, z as f32));
    }

    // ---------- Session ----------

    fn new_game(&mut self, dir: &str, file: &str) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        let session = unsafe { &mut *self.session };
        let handlers = unsafe { &mut *self.handlers };
        let loaded = session.new_game(dir, file).map(|map| map.name().to_string());
        match loaded {
            Ok(name) => {
                ecs.clear();
                handlers.forget_all_entities();
                self.log(&format!("new game on map '{name}'"));
                true
            }
            Err(err) => {
                eprintln!("[script] new_game error: {err:#}");
                false
            }
        }
    }

    fn activate_camera(&mut self, index: INT, mode: INT) -> bool {
        let session = unsafe { &mut *self.session };
        let Some(mode) = CameraMode::from_index(mode) else {
            eprintln!("[script] activate_camera: unknown mode {mode}");
            return false;
        };
        let Ok(index) = usize::try_from(index) else {
            eprintln!("[script] activate_camera: invalid index {index}");
            return false;
        };
        session.cameras.activate(index, mode)
    }

    // ---------- Entities ----------

    fn spawn_prop(&mut self, dir: &str, file: &str, name: &str) -> INT {
        let ecs = unsafe { &mut *self.ecs };
        let assets = unsafe { &mut *self.assets };
        match ecs.spawn_prop(assets, dir, file, name) {
            Ok(entity) => entity.to_bits() as INT,
            Err(err) => {
                eprintln!("[script] spawn_prop error: {err:#}");
                -1
            }
        }
    }

    fn spawn_actor(&mut self, dir: &str, file: &str, name: &str, clip: &str) -> INT {
        let ecs = unsafe { &mut *self.ecs };
        let assets = unsafe { &mut *self.assets };
        match ecs.spawn_actor(assets, dir, file, name, clip) {
            Ok(entity) => entity.to_bits() as INT,
            Err(err) => {
                eprintln!("[script] spawn_actor error: {err:#}");
                -1
            }
        }
    }

    fn set_position(&mut self, handle: INT, x: FLOAT, y: FLOAT, z: FLOAT) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        match entity_from_bits(handle) {
            Some(entity) => ecs.set_translation(entity, Vec3::new(x as f32, y as f32, z as f32)),
            None => false,
        }
    }

    fn set_scale(&mut self, handle: INT, x: FLOAT, y: FLOAT, z: FLOAT) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        match entity_from_bits(handle) {
            Some(entity) => ecs.set_scale(entity, Vec3::new(x as f32, y as f32, z as f32)),
            None => false,
        }
    }

    fn activate(&mut self, handle: INT) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        match entity_from_bits(handle) {
            Some(entity) => ecs.activate(entity),
            None => false,
        }
    }

    fn play_anim(&mut self, handle: INT, clip: &str) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        let Some(entity) = entity_from_bits(handle) else {
            return false;
        };
        match ecs.play_anim(entity, clip) {
            Ok(()) => true,
            Err(err) => {
                eprintln!("[script] play_anim error: {err:#}");
                false
            }
        }
    }

    fn despawn(&mut self, handle: INT) -> bool {
        let ecs = unsafe { &mut *self.ecs };
        let handlers = unsafe { &mut *self.handlers };
        match entity_from_bits(handle) {
            Some(entity) => {
                handlers.forget_entity(entity);
                ecs.despawn_entity(entity)
            }
            None => false,
        }
    }

    // ---------- Events ----------

    fn register_event_handler(&mut self, code: INT, callback: FnPtr, user_data: Dynamic) {
        let handlers = unsafe { &mut *self.handlers };
        let Some(code) = code_from_int(code) else {
            eprintln!("[script] register_event_handler: invalid code {code}");
            return;
        };
        handlers.register_global(code, ScriptHandler { callback, user_data: share(user_data) });
    }

    fn unregister_event_handler(&mut self, code: INT, callback: FnPtr) -> bool {
        let handlers = unsafe { &mut *self.handlers };
        match code_from_int(code) {
            Some(code) => handlers.unregister_global(code, callback.fn_name()),
            None => false,
        }
    }

    fn register_entity_handler(&mut self, handle: INT, code: INT, callback: FnPtr, user_data: Dynamic) {
        let ecs = unsafe { &*self.ecs };
        let handlers = unsafe { &mut *self.handlers };
        let (Some(entity), Some(code)) = (entity_from_bits(handle), code_from_int(code)) else {
            eprintln!("[script] register_entity_handler: invalid handle {handle} or code {code}");
            return;
        };
        if !ecs.entity_exists(entity) {
            eprintln!("[script] register_entity_handler: no entity for handle {handle}");
            return;
        }
        handlers.register_targeted(entity, code, ScriptHandler { callback, user_data: share(user_data) });
    }

    fn unregister_entity_handler(&mut self, handle: INT, code: INT, callback: FnPtr) -> bool {
        let handlers = unsafe { &mut *self.handlers };
        match (entity_from_bits(handle), code_from_int(code)) {
            (Some(entity), Some(code)) => handlers.unregister_targeted(entity, code, callback.fn_name()),
            _ => false,
        }
    }

    fn notify(&mut self, handle: INT, code: INT, payload: Dynamic) -> bool {
        let ecs = unsafe { &*self.ecs };
        let bus = unsafe { &mut *self.bus };
        let (Some(entity), Some(code)) = (entity_from_bits(handle), code_from_int(code)) else {
            return false;
        };
        if !ecs.entity_exists(entity) {
            return false;
        }
        bus.notify(entity, code, payload_from_dynamic(&payload));
        true
    }

    fn global_event(&mut self, code: INT, payload: Dynamic) -> bool {
        let bus = unsafe { &mut *self.bus };
        let Some(code) = code_from_int(code) else {
            eprintln!("[script] global_event: invalid code {code}");
            return false;
        };
        bus.global(code, payload_from_dynamic(&payload));
        true
    }

    // ---------- Utility ----------

    fn log(&mut self, message: &str) {
        let logs = unsafe { &mut *self.logs };
        logs.push(message.to_string());
        println!("[script] {message}");
    }

    fn random_range(&mut self, min: FLOAT, max: FLOAT) -> FLOAT {
        if !(max > min) {
            return min;
        }
        let mut rng = rand::thread_rng();
        rng.gen_range(min..max)
    }
}

fn share(value: Dynamic) -> Dynamic {
    if value.is_shared() {
        value
    } else {
        value.into_shared()
    }
}

fn entity_from_bits(bits: INT) -> Option<Entity> {
    if bits < 0 {
        None
    } else {
        Entity::try_from_bits(bits as u64).ok()
    }
}

fn code_from_int(code: INT) -> Option<EventCode> {
    EventCode::try_from(code).ok()
}

fn payload_from_dynamic(value: &Dynamic) -> EventPayload {
    if value.is_unit() {
        EventPayload::Empty
    } else if let Ok(int) = value.as_int() {
        EventPayload::Int(int)
    } else if let Ok(float) = value.as_float() {
        EventPayload::Float(float)
    } else if let Ok(flag) = value.as_bool() {
        EventPayload::Bool(flag)
    } else if value.is_string() {
        match value.clone().into_string() {
            Ok(text) => EventPayload::Text(text),
            Err(_) => EventPayload::Empty,
        }
    } else {
        EventPayload::Text(value.to_string())
    }
}

fn payload_to_dynamic(payload: &EventPayload) -> Dynamic {
    match payload {
        EventPayload::Empty => Dynamic::UNIT,
        EventPayload::Int(value) => Dynamic::from(*value),
        EventPayload::Float(value) => Dynamic::from(*value),
        EventPayload::Bool(value) => Dynamic::from(*value),
        EventPayload::Text(value) => Dynamic::from(value.clone()),
    }
}

fn event_to_map(event: &QueuedEvent) -> Map {
    let mut map = Map::new();
    map.insert("code".into(), Dynamic::from(event.code as INT));
    if event.code == EVENT_KEYDOWN {
        if let Some(scancode) = event.payload.scancode() {
            map.insert("scancode".into(), Dynamic::from(scancode as INT));
        }
    }
    if let Some(target) = event.target {
        map.insert("target".into(), Dynamic::from(target.to_bits() as INT));
    }
    map.insert("payload".into(), payload_to_dynamic(&event.payload));
    map
}

/// Owns the embedded interpreter and the main script. The script's top
/// level runs once per (re)load with `api` in scope; after that the host
/// only calls an optional `update(api, dt)` plus registered event handlers.
pub struct ScriptHost {
    engine: Engine,
    ast: Option<AST>,
    scope: Scope<'static>,
    script_path: PathBuf,
    last_modified: Option<SystemTime>,
    error: Option<String>,
    enabled: bool,
    started: bool,
}

impl ScriptHost {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut engine = Engine::new();
        engine.set_fast_operators(true);
        register_api(&mut engine);
        Self {
            engine,
            ast: None,
            scope: Scope::new(),
            script_path: path.as_ref().to_path_buf(),
            last_modified: None,
            error: None,
            enabled: true,
            started: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enable: bool) {
        self.enabled = enable;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn force_reload(&mut self) -> Result<()> {
        self.load_script().map(|_| ())
    }

    /// Runs the script top level on first call after a (re)load, then the
    /// optional `update(api, dt)` function.
    pub fn update(&mut self, api: ScriptApi, dt: f32) {
        if let Err(err) = self.reload_if_needed() {
            self.error = Some(err.to_string());
            return;
        }
        if !self.enabled {
            return;
        }
        let Some(ast) = self.ast.as_ref() else {
            return;
        };

        if !self.started {
            self.scope = Scope::new();
            self.scope.push("api", api);
            match self.engine.eval_ast_with_scope::<Dynamic>(&mut self.scope, ast) {
                Ok(_) => {
                    self.started = true;
                    self.error = None;
                }
                Err(err) => {
                    self.error = Some(err.to_string());
                    return;
                }
            }
        }

        let options = CallFnOptions::new().eval_ast(false);
        match self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut self.scope,
            ast,
            "update",
            (api, dt as FLOAT),
        ) {
            Ok(_) => {
                self.error = None;
            }
            Err(err) => {
                if matches!(err.as_ref(), EvalAltResult::ErrorFunctionNotFound(..)) {
                    self.error = None;
                } else {
                    self.error = Some(err.to_string());
                }
            }
        }
    }

    /// Delivers a batch of drained events to the registered handlers.
    /// Returns the number of successful callback invocations.
    pub fn dispatch(&mut self, api: ScriptApi, events: &[QueuedEvent]) -> usize {
        if !self.enabled || !self.started {
            return 0;
        }
        let Some(ast) = self.ast.as_ref() else {
            return 0;
        };

        let mut dispatched = 0usize;
        let mut first_error: Option<String> = None;
        for event in events {
            for handler in api.handler_snapshot(event.code, event.target) {
                let options = CallFnOptions::new().eval_ast(false);
                let result = self.engine.call_fn_with_options::<Dynamic>(
                    options,
                    &mut self.scope,
                    ast,
                    handler.callback.fn_name(),
                    (api, handler.user_data.clone(), event_to_map(event)),
                );
                match result {
                    Ok(_) => dispatched += 1,
                    Err(err) => {
                        eprintln!("[script] handler '{}' failed: {err}", handler.callback.fn_name());
                        if first_error.is_none() {
                            first_error = Some(err.to_string());
                        }
                    }
                }
            }
        }
        if let Some(err) = first_error {
            self.error = Some(err);
        }
        dispatched
    }

    fn reload_if_needed(&mut self) -> Result<()> {
        let metadata = fs::metadata(&self.script_path)
            .with_context(|| format!("script file '{}' not accessible", self.script_path.display()))?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if self.ast.is_none() || self.last_modified.map_or(true, |prev| modified > prev) {
            self.load_script()?;
        }
        Ok(())
    }

    fn load_script(&mut self) -> Result<&AST> {
        let source = fs::read_to_string(&self.script_path)
            .with_context(|| format!("reading {}", self.script_path.display()))?;
        let ast = self.engine.compile(source).with_context(|| "compiling script")?;
        self.scope = Scope::new();
        self.last_modified = fs::metadata(&self.script_path).ok().and_then(|meta| meta.modified().ok());
        self.started = false;
        self.error = None;
        Ok(self.ast.insert(ast))
    }
}

fn register_api(engine: &mut Engine) {
    engine.register_type_with_name::<ScriptApi>("Game");
    engine.register_fn("set_ambient_light", ScriptApi::set_ambient_light);
    engine.register_fn("set_sun_color", ScriptApi::set_sun_color);
    engine.register_fn("set_sun_position", ScriptApi::set_sun_position);
    engine.register_fn("new_game", ScriptApi::new_game);
    engine.register_fn("activate_camera", ScriptApi::activate_camera);
    engine.register_fn("spawn_prop", ScriptApi::spawn_prop);
    engine.register_fn("spawn_actor", ScriptApi::spawn_actor);
    engine.register_fn("set_position", ScriptApi::set_position);
    engine.register_fn("set_scale", ScriptApi::set_scale);
    engine.register_fn("activate", ScriptApi::activate);
    engine.register_fn("play_anim", ScriptApi::play_anim);
    engine.register_fn("despawn", ScriptApi::despawn);
    engine.register_fn("register_event_handler", ScriptApi::register_event_handler);
    engine.register_fn("unregister_event_handler", ScriptApi::unregister_event_handler);
    engine.register_fn("register_entity_handler", ScriptApi::register_entity_handler);
    engine.register_fn("unregister_entity_handler", ScriptApi::unregister_entity_handler);
    engine.register_fn("notify", ScriptApi::notify);
    engine.register_fn("global_event", ScriptApi::global_event);
    engine.register_fn("log", ScriptApi::log);
    engine.register_fn("rand", ScriptApi::random_range);
}
