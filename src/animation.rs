use anyhow::{bail, Result};
use bevy_ecs::prelude::Component;

/// Clip-selection state for an animated entity. Playback here is a looped
/// clock over the named clip; blending and skinning belong to the renderer.
#[derive(Component, Debug, Clone)]
pub struct AnimationPlayer {
    clips: Vec<String>,
    current: usize,
    time: f32,
}

impl AnimationPlayer {
    pub fn new(clips: Vec<String>, initial: &str) -> Result<Self> {
        if clips.is_empty() {
            bail!("animation player requires at least one clip");
        }
        let Some(current) = clips.iter().position(|c| c == initial) else {
            bail!("unknown initial clip '{initial}' (available: {})", clips.join(", "));
        };
        Ok(Self { clips, current, time: 0.0 })
    }

    /// Switches to the named clip and restarts its clock.
    pub fn play(&mut self, clip: &str) -> Result<()> {
        let Some(index) = self.clips.iter().position(|c| c == clip) else {
            bail!("unknown clip '{clip}' (available: {})", self.clips.join(", "));
        };
        self.current = index;
        self.time = 0.0;
        Ok(())
    }

    pub fn current_clip(&self) -> &str {
        &self.clips[self.current]
    }

    pub fn clips(&self) -> &[String] {
        &self.clips
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt.max(0.0);
    }
}
