pub mod animation;
pub mod assets;
pub mod camera;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod environment;
pub mod events;
pub mod input;
pub mod map;
pub mod runtime;
pub mod script_harness;
pub mod scripts;
pub mod session;
pub mod time;

pub use runtime::{Runtime, StepReport};
