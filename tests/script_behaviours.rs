use std::io::Write;

use boreal_engine::animation::AnimationPlayer;
use boreal_engine::camera::CameraMode;
use boreal_engine::ecs::Name;
use boreal_engine::events::EventPayload;
use boreal_engine::Runtime;
use glam::Vec3;
use tempfile::NamedTempFile;

const DT: f32 = 0.016;
const SCANCODE_C: u32 = 6;
const SCANCODE_V: u32 = 25;

fn write_script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp script");
    file.write_all(contents.as_bytes()).expect("write script");
    file.flush().expect("flush script");
    file
}

fn demo_runtime() -> Runtime {
    let mut runtime = Runtime::new("assets/scripts/demo.rhai");
    runtime.step(DT);
    assert!(
        runtime.host().last_error().is_none(),
        "demo setup failed: {:?}",
        runtime.host().last_error()
    );
    runtime
}

fn sinbad_clip(runtime: &mut Runtime) -> Option<String> {
    runtime
        .ecs
        .snapshot()
        .into_iter()
        .find(|e| e.name == "Sinbad")
        .and_then(|e| e.clip)
}

#[test]
fn demo_setup_spawns_and_activates_the_scene() {
    let mut runtime = Runtime::new("assets/scripts/demo.rhai");
    let report = runtime.step(DT);
    assert!(
        runtime.host().last_error().is_none(),
        "demo setup failed: {:?}",
        runtime.host().last_error()
    );

    let snapshot = runtime.ecs.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.iter().all(|e| e.active));

    let sinbad = snapshot.iter().find(|e| e.name == "Sinbad").expect("sinbad spawned");
    assert_eq!(sinbad.translation, Vec3::new(0.0, 6.0, -50.0));
    assert_eq!(sinbad.clip.as_deref(), Some("Dance"));

    let oak = snapshot.iter().find(|e| e.name == "OakTree").expect("oak spawned");
    assert_eq!(oak.scale, Vec3::splat(2.0));
    assert!(oak.clip.is_none());

    assert_eq!(runtime.session.map().map(|m| m.name()), Some("Grass Cliffs"));
    assert_eq!(runtime.session.lighting.ambient(), Vec3::splat(1.0));
    assert_eq!(runtime.session.lighting.sun_position(), Vec3::new(1024.0, 512.0, 256.0));

    // The setup-time ping is dispatched within the same step.
    assert!(report.dispatched >= 1);
    assert!(report.logs.iter().any(|l| l.contains("demo ping: [UserArg, EventArg]")));
}

#[test]
fn v_key_alternates_the_actor_animation() {
    let mut runtime = demo_runtime();
    assert_eq!(sinbad_clip(&mut runtime).as_deref(), Some("Dance"));

    let expected = ["RunBase", "Dance", "RunBase", "Dance"];
    for clip in expected {
        runtime.press_key(SCANCODE_V);
        runtime.step(DT);
        runtime.release_key(SCANCODE_V);
        assert!(runtime.host().last_error().is_none());
        assert_eq!(sinbad_clip(&mut runtime).as_deref(), Some(clip));
    }
}

#[test]
fn c_key_alternates_the_active_camera() {
    let mut runtime = demo_runtime();
    assert_eq!(runtime.session.cameras.active_index(), 0);

    runtime.press_key(SCANCODE_C);
    runtime.step(DT);
    runtime.release_key(SCANCODE_C);
    assert_eq!(runtime.session.cameras.active_index(), 1);
    assert_eq!(runtime.session.cameras.active_rig().mode, CameraMode::FreeFly);

    runtime.press_key(SCANCODE_C);
    runtime.step(DT);
    runtime.release_key(SCANCODE_C);
    assert_eq!(runtime.session.cameras.active_index(), 0);
    assert_eq!(runtime.session.cameras.active_rig().mode, CameraMode::Overhead);
}

#[test]
fn custom_event_carries_payload_and_user_data() {
    let mut runtime = demo_runtime();
    runtime.queue_custom(0x2_0000, EventPayload::Text("hello".into()));
    let report = runtime.step(DT);
    assert!(report.logs.iter().any(|l| l.contains("demo ping: [UserArg, hello]")));
}

#[test]
fn handler_user_data_persists_across_invocations() {
    let script = write_script(
        r#"
        let state = #{ count: 0 };
        api.register_event_handler(0x20007, Fn("on_tick"), state);

        fn on_tick(api, state, event) {
            state.count += 1;
            api.log(`count:${state.count}`);
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    runtime.step(DT);
    assert!(runtime.host().last_error().is_none());

    runtime.queue_custom(0x20007, EventPayload::Empty);
    let first = runtime.step(DT);
    runtime.queue_custom(0x20007, EventPayload::Empty);
    let second = runtime.step(DT);

    assert!(first.logs.iter().any(|l| l == "count:1"));
    assert!(second.logs.iter().any(|l| l == "count:2"));
}

#[test]
fn handler_can_unregister_itself() {
    let script = write_script(
        r#"
        api.register_event_handler(0x20008, Fn("once"), ());

        fn once(api, state, event) {
            api.log("fired");
            api.unregister_event_handler(0x20008, Fn("once"));
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    runtime.step(DT);

    runtime.queue_custom(0x20008, EventPayload::Empty);
    let first = runtime.step(DT);
    runtime.queue_custom(0x20008, EventPayload::Empty);
    let second = runtime.step(DT);

    assert_eq!(first.logs.iter().filter(|l| *l == "fired").count(), 1);
    assert_eq!(first.dispatched, 1);
    assert!(second.logs.is_empty());
    assert_eq!(second.dispatched, 0);
}

#[test]
fn targeted_handler_can_be_unregistered() {
    let script = write_script(
        r#"
        let actor = api.spawn_actor("assets/models/sinbad", "sinbad.json", "Sinbad", "Dance");
        api.activate(actor);
        let state = #{ actor: actor };
        api.register_event_handler(0x300, Fn("on_key"), state);
        api.register_entity_handler(actor, 0x20011, Fn("on_poke"), ());

        fn on_key(api, state, event) {
            if event.scancode == 6 {
                api.unregister_entity_handler(state.actor, 0x20011, Fn("on_poke"));
            } else {
                api.notify(state.actor, 0x20011, ());
            }
        }

        fn on_poke(api, state, event) {
            api.log("poked");
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    runtime.step(DT);
    assert!(runtime.host().last_error().is_none());

    runtime.press_key(SCANCODE_V);
    let first = runtime.step(DT);
    runtime.release_key(SCANCODE_V);
    assert!(first.logs.iter().any(|l| l == "poked"));

    runtime.press_key(SCANCODE_C);
    runtime.step(DT);
    runtime.release_key(SCANCODE_C);
    assert_eq!(runtime.handlers().targeted_count(), 0);

    runtime.press_key(SCANCODE_V);
    let third = runtime.step(DT);
    runtime.release_key(SCANCODE_V);
    assert!(third.logs.iter().all(|l| l != "poked"));
}

#[test]
fn new_game_drops_stale_entity_handlers() {
    let script = write_script(
        r#"
        let actor = api.spawn_actor("assets/models/sinbad", "sinbad.json", "Sinbad", "Dance");
        api.register_entity_handler(actor, 0x20010, Fn("on_poke"), ());
        api.new_game("assets/maps/grass-cliffs-1", "grass-cliffs.json");

        fn on_poke(api, state, event) {
            api.log("poked");
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    runtime.step(DT);
    assert!(runtime.host().last_error().is_none());

    assert_eq!(runtime.ecs.entity_count(), 0);
    assert_eq!(runtime.handlers().targeted_count(), 0);
}

#[test]
fn update_runs_every_step_but_top_level_runs_once() {
    let script = write_script(
        r#"
        api.log("setup");

        fn update(api, dt) {
            api.log("tick");
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    let first = runtime.step(DT);
    let second = runtime.step(DT);

    assert_eq!(first.logs.iter().filter(|l| *l == "setup").count(), 1);
    assert!(first.logs.iter().any(|l| l == "tick"));
    assert!(second.logs.iter().all(|l| l != "setup"));
    assert!(second.logs.iter().any(|l| l == "tick"));
}

#[test]
fn failed_spawn_returns_sentinel_handle() {
    let script = write_script(
        r#"
        let h = api.spawn_prop("assets/models/missing", "ghost.json", "Ghost");
        api.log(`handle:${h}`);
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    let report = runtime.step(DT);
    assert!(runtime.host().last_error().is_none());
    assert!(report.logs.iter().any(|l| l == "handle:-1"));
    assert_eq!(runtime.ecs.entity_count(), 0);
}

#[test]
fn handler_error_is_surfaced() {
    let script = write_script(
        r#"
        api.register_event_handler(0x20009, Fn("boom"), ());

        fn boom(api, state, event) {
            this_function_does_not_exist();
        }
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    runtime.step(DT);
    assert!(runtime.host().last_error().is_none());

    runtime.queue_custom(0x20009, EventPayload::Empty);
    runtime.step(DT);
    assert!(runtime.host().last_error().is_some());
}

#[test]
fn inactive_actor_animation_does_not_advance() {
    let script = write_script(
        r#"
        let a = api.spawn_actor("assets/models/sinbad", "sinbad.json", "Idle", "IdleBase");
        let b = api.spawn_actor("assets/models/sinbad", "sinbad.json", "Runner", "RunBase");
        api.activate(b);
        "#,
    );
    let mut runtime = Runtime::new(script.path());
    for _ in 0..4 {
        runtime.step(DT);
    }
    assert!(runtime.host().last_error().is_none());

    let snapshot = runtime.ecs.snapshot();
    let idle = snapshot.iter().find(|e| e.name == "Idle").expect("idle actor");
    let runner = snapshot.iter().find(|e| e.name == "Runner").expect("runner actor");
    assert!(!idle.active);
    assert!(runner.active);

    let mut query = runtime.ecs.world.query::<(&Name, &AnimationPlayer)>();
    for (name, player) in query.iter(&runtime.ecs.world) {
        match name.0.as_str() {
            "Idle" => assert_eq!(player.time(), 0.0),
            "Runner" => assert!(player.time() > 0.0),
            other => panic!("unexpected entity {other}"),
        }
    }
}
