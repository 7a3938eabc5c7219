use glam::Vec3;

/// Scene lighting state mutated by scripts: a flat ambient term plus a
/// single sun-style emitter positioned in world space. Consumers poll the
/// revision counter instead of diffing the vectors.
#[derive(Debug, Clone)]
pub struct Lighting {
    ambient: Vec3,
    sun_color: Vec3,
    sun_position: Vec3,
    revision: u64,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.03),
            sun_color: Vec3::new(1.05, 0.98, 0.92),
            sun_position: Vec3::new(512.0, 1024.0, 256.0),
            revision: 0,
        }
    }
}

impl Lighting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ambient(&mut self, color: Vec3) {
        let color = color.max(Vec3::ZERO);
        if self.ambient != color {
            self.ambient = color;
            self.revision += 1;
        }
    }

    pub fn set_sun_color(&mut self, color: Vec3) {
        let color = color.max(Vec3::ZERO);
        if self.sun_color != color {
            self.sun_color = color;
            self.revision += 1;
        }
    }

    pub fn set_sun_position(&mut self, position: Vec3) {
        if self.sun_position != position {
            self.sun_position = position;
            self.revision += 1;
        }
    }

    pub fn ambient(&self) -> Vec3 {
        self.ambient
    }

    pub fn sun_color(&self) -> Vec3 {
        self.sun_color
    }

    pub fn sun_position(&self) -> Vec3 {
        self.sun_position
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_channels_are_clamped() {
        let mut lighting = Lighting::new();
        lighting.set_ambient(Vec3::new(-1.0, 0.5, 2.0));
        assert_eq!(lighting.ambient(), Vec3::new(0.0, 0.5, 2.0));
    }

    #[test]
    fn revision_bumps_only_on_change() {
        let mut lighting = Lighting::new();
        let base = lighting.revision();
        lighting.set_sun_position(Vec3::new(1024.0, 512.0, 256.0));
        assert_eq!(lighting.revision(), base + 1);
        lighting.set_sun_position(Vec3::new(1024.0, 512.0, 256.0));
        assert_eq!(lighting.revision(), base + 1);
    }
}
