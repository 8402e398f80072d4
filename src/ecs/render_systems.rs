//! 场景渲染系统：网格和精灵

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::{
    CameraManager, EngineSystem, LayerId, LayerManipulatorManager, Managers, Sprite, Transform,
    ZIndex,
};
use crate::config::SceneEditorConfig;
use crate::core::EditorResult;
use crate::module::{EditorSettingsModule, ModuleLookup, ModuleLookupExt, ModuleRef};
use crate::render::{borrow_batch, DrawCommand, SharedBatch};

/// 单方向最多绘制的网格线数，缩放过小时不再画网格
const MAX_GRID_LINES: usize = 512;

pub struct GridRendererSystem {
    batch: SharedBatch,
    fallback: SceneEditorConfig,
    settings: Option<ModuleRef<EditorSettingsModule>>,
}

impl GridRendererSystem {
    pub fn new(batch: SharedBatch) -> Self {
        Self {
            batch,
            fallback: SceneEditorConfig::default(),
            settings: None,
        }
    }

    fn current_settings(&self) -> SceneEditorConfig {
        match &self.settings {
            Some(settings) => settings.borrow().scene.clone(),
            None => self.fallback.clone(),
        }
    }

    fn grid_lines(min: f32, max: f32, size: f32) -> Option<Vec<f32>> {
        let first = (min / size).floor() as i64;
        let last = (max / size).ceil() as i64;
        let count = usize::try_from(last.checked_sub(first)?.checked_add(1)?).ok()?;
        if count > MAX_GRID_LINES {
            return None;
        }
        Some((first..=last).map(|i| i as f32 * size).collect())
    }
}

impl EngineSystem for GridRendererSystem {
    fn inject_modules(&mut self, modules: &dyn ModuleLookup) -> EditorResult<()> {
        self.settings = modules.find_in_hierarchy::<EditorSettingsModule>();
        if self.settings.is_none() {
            tracing::debug!(target: "render", "EditorSettingsModule not found, grid uses default settings");
        }
        Ok(())
    }

    fn process(&mut self, _world: &mut World, managers: &mut Managers) -> EditorResult<()> {
        let settings = self.current_settings();
        if !settings.show_grid || settings.grid_size <= 0.0 {
            return Ok(());
        }

        let camera = managers.require::<CameraManager>()?;
        let (min, max) = camera.camera().borrow().visible_bounds();
        let (Some(xs), Some(ys)) = (
            Self::grid_lines(min.x, max.x, settings.grid_size),
            Self::grid_lines(min.y, max.y, settings.grid_size),
        ) else {
            tracing::trace!(target: "render", "Grid too dense, skipped");
            return Ok(());
        };

        let mut batch = borrow_batch(&self.batch)?;
        batch.begin(camera.combined())?;
        for x in xs {
            batch.draw(DrawCommand::Line {
                from: Vec2::new(x, min.y),
                to: Vec2::new(x, max.y),
                color: settings.grid_color,
            })?;
        }
        for y in ys {
            batch.draw(DrawCommand::Line {
                from: Vec2::new(min.x, y),
                to: Vec2::new(max.x, y),
                color: settings.grid_color,
            })?;
        }
        batch.end()
    }

    crate::impl_as_any!();
}

/// 按 (图层, z) 顺序绘制精灵，跳过隐藏图层
pub struct SpriteRenderSystem {
    batch: SharedBatch,
}

impl SpriteRenderSystem {
    pub fn new(batch: SharedBatch) -> Self {
        Self { batch }
    }
}

impl EngineSystem for SpriteRenderSystem {
    fn process(&mut self, world: &mut World, managers: &mut Managers) -> EditorResult<()> {
        let layers = managers.get::<LayerManipulatorManager>();
        let camera = managers.require::<CameraManager>()?;

        let mut query = world.query::<(Entity, &Transform, &Sprite, Option<&LayerId>, Option<&ZIndex>)>();
        let mut visible: Vec<_> = query
            .iter(world)
            .map(|(entity, transform, sprite, layer, z)| {
                (entity, transform, sprite, layer.map_or(0, |l| l.0), z.map_or(0, |z| z.0))
            })
            .filter(|(.., layer, _)| layers.map_or(true, |l| l.is_visible(*layer)))
            .collect();
        if visible.is_empty() {
            return Ok(());
        }
        visible.sort_by_key(|(entity, _, _, layer, z)| (*layer, *z, entity.index()));

        let mut batch = borrow_batch(&self.batch)?;
        batch.begin(camera.combined())?;
        for (_, transform, sprite, ..) in visible {
            batch.draw(DrawCommand::Sprite {
                texture: sprite.texture.clone(),
                generation: sprite.texture_generation,
                position: transform.position,
                size: sprite.size(),
                origin: transform.origin,
                scale: transform.scale,
                rotation: transform.rotation,
                tint: sprite.tint,
                flip_x: sprite.flip_x,
                flip_y: sprite.flip_y,
            })?;
        }
        batch.end()
    }

    crate::impl_as_any!();
}

/// 每个场景都需要的绘制系统
pub fn common_systems(batch: &SharedBatch) -> Vec<Box<dyn EngineSystem>> {
    vec![Box::new(SpriteRenderSystem::new(batch.clone()))]
}
