use boreal_engine::cli::CliOverrides;
use boreal_engine::config::AppConfig;
use boreal_engine::time::Time;
use boreal_engine::Runtime;

const CONFIG_PATH: &str = "assets/config/app.json";

fn main() {
    let overrides = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed.into_config_overrides(),
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };

    let mut config = AppConfig::load_or_default(CONFIG_PATH);
    if !overrides.is_empty() {
        println!("[cli] overriding config fields: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }

    let mut runtime = Runtime::new(&config.script.main_script);
    let mut time = Time::new();
    let mut dispatched_total = 0usize;

    println!(
        "[runtime] running '{}' for {} steps at dt={}",
        config.script.main_script, config.simulation.steps, config.simulation.dt
    );
    for _ in 0..config.simulation.steps {
        let report = runtime.step(config.simulation.dt);
        dispatched_total += report.dispatched;
        if let Some(error) = runtime.host().last_error() {
            eprintln!("[runtime] script error: {error}");
            std::process::exit(1);
        }
        time.tick();
    }

    println!(
        "[runtime] done: {} steps, {} entities, {} handler invocations, {:.2}s wall time",
        runtime.steps(),
        runtime.ecs.entity_count(),
        dispatched_total,
        time.elapsed_seconds()
    );
}
