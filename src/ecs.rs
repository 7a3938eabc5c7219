use crate::animation::AnimationPlayer;
use crate::assets::AssetManager;
use anyhow::{anyhow, Result};
use bevy_ecs::prelude::*;
use glam::Vec3;

// ---------- Components ----------
#[derive(Component, Clone, Copy)]
pub struct Transform {
    pub translation: Vec3,
    pub yaw: f32,
    pub scale: Vec3,
}
impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, yaw: 0.0, scale: Vec3::splat(1.0) }
    }
}

#[derive(Component, Clone)]
pub struct Name(pub String);

#[derive(Component, Clone)]
pub struct ModelRef {
    pub dir: String,
    pub file: String,
}

/// Entities spawn inactive and join the simulation only once activated.
#[derive(Component, Clone, Copy, Default)]
pub struct Active;

#[derive(Resource, Clone, Copy)]
pub struct TimeDelta(pub f32);

pub struct EntityInfo {
    pub name: String,
    pub translation: Vec3,
    pub yaw: f32,
    pub scale: Vec3,
    pub active: bool,
    pub clip: Option<String>,
}

// ---------- World container ----------
pub struct EcsWorld {
    pub world: World,
    schedule: Schedule,
}

impl EcsWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(TimeDelta(0.0));

        let mut schedule = Schedule::default();
        schedule.add_systems(sys_advance_animations);

        Self { world, schedule }
    }

    pub fn update(&mut self, dt: f32) {
        self.world.resource_mut::<TimeDelta>().0 = dt;
        self.schedule.run(&mut self.world);
    }

    pub fn spawn_prop(
        &mut self,
        assets: &mut AssetManager,
        dir: &str,
        file: &str,
        name: &str,
    ) -> Result<Entity> {
        assets.load_model(dir, file)?;
        let entity = self
            .world
            .spawn((
                Transform::default(),
                Name(name.to_string()),
                ModelRef { dir: dir.to_string(), file: file.to_string() },
            ))
            .id();
        Ok(entity)
    }

    pub fn spawn_actor(
        &mut self,
        assets: &mut AssetManager,
        dir: &str,
        file: &str,
        name: &str,
        initial_clip: &str,
    ) -> Result<Entity> {
        let manifest = assets.load_model(dir, file)?;
        if manifest.clips.is_empty() {
            return Err(anyhow!("model '{dir}/{file}' has no animation clips"));
        }
        let player = AnimationPlayer::new(manifest.clips.clone(), initial_clip)?;
        let entity = self
            .world
            .spawn((
                Transform::default(),
                Name(name.to_string()),
                ModelRef { dir: dir.to_string(), file: file.to_string() },
                player,
            ))
            .id();
        Ok(entity)
    }

    pub fn activate(&mut self, entity: Entity) -> bool {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            e.insert(Active);
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.world.get::<Active>(entity).is_some()
    }

    pub fn set_translation(&mut self, entity: Entity, translation: Vec3) -> bool {
        if let Some(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.translation = translation;
            true
        } else {
            false
        }
    }

    pub fn set_scale(&mut self, entity: Entity, scale: Vec3) -> bool {
        if let Some(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.scale = scale;
            true
        } else {
            false
        }
    }

    pub fn set_yaw(&mut self, entity: Entity, yaw: f32) -> bool {
        if let Some(mut transform) = self.world.get_mut::<Transform>(entity) {
            transform.yaw = yaw;
            true
        } else {
            false
        }
    }

    pub fn play_anim(&mut self, entity: Entity, clip: &str) -> Result<()> {
        let mut player = self
            .world
            .get_mut::<AnimationPlayer>(entity)
            .ok_or_else(|| anyhow!("entity {} has no animation player", entity.index()))?;
        player.play(clip)
    }

    pub fn current_clip(&self, entity: Entity) -> Option<String> {
        self.world.get::<AnimationPlayer>(entity).map(|p| p.current_clip().to_string())
    }

    pub fn anim_time(&self, entity: Entity) -> Option<f32> {
        self.world.get::<AnimationPlayer>(entity).map(|p| p.time())
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn despawn_entity(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    pub fn clear(&mut self) {
        self.world.clear_entities();
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    /// Stable (name-sorted) snapshot of every named entity, for tooling and
    /// the script harness.
    pub fn snapshot(&mut self) -> Vec<EntityInfo> {
        let mut query = self.world.query::<(
            &Name,
            &Transform,
            Option<&Active>,
            Option<&AnimationPlayer>,
        )>();
        let mut out: Vec<EntityInfo> = query
            .iter(&self.world)
            .map(|(name, transform, active, player)| EntityInfo {
                name: name.0.clone(),
                translation: transform.translation,
                yaw: transform.yaw,
                scale: transform.scale,
                active: active.is_some(),
                clip: player.map(|p| p.current_clip().to_string()),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

// ---------- Systems ----------
fn sys_advance_animations(mut players: Query<&mut AnimationPlayer, With<Active>>, dt: Res<TimeDelta>) {
    for mut player in &mut players {
        player.advance(dt.0);
    }
}
