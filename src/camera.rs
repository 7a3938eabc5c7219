use glam::{Mat4, Vec3};

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera used by every rig. Headless consumers only need the
/// matrices to stay finite; the windowed embedder supplies the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self, viewport: (u32, u32)) -> Mat4 {
        let aspect = if viewport.1 > 0 { viewport.0 as f32 / viewport.1 as f32 } else { 1.0 };
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Control schemes a rig can be switched between. The integer values are
/// part of the scripting surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FreeFly,
    Overhead,
}

impl CameraMode {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(CameraMode::FreeFly),
            1 => Some(CameraMode::Overhead),
            _ => None,
        }
    }

    pub fn index(self) -> u32 {
        match self {
            CameraMode::FreeFly => 0,
            CameraMode::Overhead => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::FreeFly => "FreeFly",
            CameraMode::Overhead => "Overhead",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub name: String,
    pub camera: Camera3D,
    pub mode: CameraMode,
}

/// Indexed camera rigs plus the active selection. Scripts switch rigs by
/// index and assign the control mode at activation time.
pub struct CameraRegistry {
    rigs: Vec<CameraRig>,
    active: usize,
}

impl CameraRegistry {
    pub fn new() -> Self {
        let rigs = vec![
            CameraRig {
                name: "chase".to_string(),
                camera: Camera3D::new(
                    Vec3::new(0.0, 18.0, 24.0),
                    Vec3::ZERO,
                    60.0_f32.to_radians(),
                    0.1,
                    2000.0,
                ),
                mode: CameraMode::FreeFly,
            },
            CameraRig {
                name: "overview".to_string(),
                camera: Camera3D::new(
                    Vec3::new(0.0, 180.0, 1.0),
                    Vec3::ZERO,
                    45.0_f32.to_radians(),
                    0.1,
                    4000.0,
                ),
                mode: CameraMode::Overhead,
            },
        ];
        Self { rigs, active: 0 }
    }

    pub fn activate(&mut self, index: usize, mode: CameraMode) -> bool {
        let Some(rig) = self.rigs.get_mut(index) else {
            return false;
        };
        rig.mode = mode;
        self.active = index;
        true
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_rig(&self) -> &CameraRig {
        &self.rigs[self.active]
    }

    pub fn rig(&self, index: usize) -> Option<&CameraRig> {
        self.rigs.get(index)
    }

    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new()
    }
}
