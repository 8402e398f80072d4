//! 相机交互：滚轮缩放、右键/中键拖动平移、Home 键复位

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::{EntityEngineConfigurator, SceneContext, SceneModule};
use crate::config::SceneEditorConfig;
use crate::core::{EditorError, EditorResult};
use crate::ecs::{CameraManager, EntityEngine, OrthographicCamera};
use crate::module::{EditorSettingsModule, Module, ModuleLookup, ModuleLookupExt};
use crate::platform::{InputEvent, KeyCode, ModuleInput, MouseButton};

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: u32,
    last: Vec2,
}

#[derive(Default)]
pub struct CameraModule {
    camera: Option<Rc<RefCell<OrthographicCamera>>>,
    settings: SceneEditorConfig,
    drag: Option<Drag>,
    context: Option<SceneContext>,
}

impl CameraModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<Vec2> {
        self.camera.as_ref().map(|c| c.borrow().position)
    }

    pub fn zoom(&self) -> Option<f32> {
        self.camera.as_ref().map(|c| c.borrow().zoom)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn context(&self) -> Option<&SceneContext> {
        self.context.as_ref()
    }
}

impl EntityEngineConfigurator for CameraModule {
    fn setup_entity_engine(&mut self, engine: &mut EntityEngine) -> EditorResult<()> {
        let manager = engine
            .manager::<CameraManager>()
            .ok_or_else(|| EditorError::missing("CameraManager"))?;
        self.camera = Some(manager.camera());
        Ok(())
    }
}

impl Module for CameraModule {
    fn init(&mut self, modules: &dyn ModuleLookup) -> EditorResult<()> {
        if let Some(settings) = modules.find_in_hierarchy::<EditorSettingsModule>() {
            self.settings = settings.borrow().scene.clone();
        }
        Ok(())
    }
}

impl SceneModule for CameraModule {
    fn set_scene_context(&mut self, context: SceneContext) {
        self.context = Some(context);
    }

    fn on_hide(&mut self) {
        self.drag = None;
    }

    fn as_engine_configurator(&mut self) -> Option<&mut dyn EntityEngineConfigurator> {
        Some(self)
    }
}

impl ModuleInput for CameraModule {
    fn touch_down(&mut self, _event: &InputEvent, x: f32, y: f32, pointer: u32, button: MouseButton) -> bool {
        if !matches!(button, MouseButton::Right | MouseButton::Middle) || self.camera.is_none() {
            return false;
        }
        self.drag = Some(Drag {
            pointer,
            last: Vec2::new(x, y),
        });
        true
    }

    fn touch_up(&mut self, _event: &InputEvent, _x: f32, _y: f32, pointer: u32, _button: MouseButton) {
        if self.drag.is_some_and(|d| d.pointer == pointer) {
            self.drag = None;
        }
    }

    fn touch_dragged(&mut self, _event: &InputEvent, x: f32, y: f32, pointer: u32) {
        let (Some(drag), Some(camera)) = (self.drag.as_mut(), self.camera.as_ref()) else {
            return;
        };
        if drag.pointer != pointer {
            return;
        }

        let current = Vec2::new(x, y);
        // 屏幕坐标 y 轴向下，世界坐标 y 轴向上
        let delta = Vec2::new(drag.last.x - current.x, current.y - drag.last.y);
        let mut camera = camera.borrow_mut();
        let zoom = camera.zoom;
        camera.translate(delta * zoom);
        drag.last = current;
    }

    fn scrolled(&mut self, _event: &InputEvent, _x: f32, _y: f32, amount: i32) -> bool {
        let Some(camera) = self.camera.as_ref() else {
            return false;
        };
        let mut camera = camera.borrow_mut();
        let factor = 1.0 + self.settings.zoom_step * amount as f32;
        camera.zoom = self.settings.clamp_zoom(camera.zoom * factor.max(0.01));
        tracing::trace!(target: "camera", zoom = camera.zoom, "Camera zoomed");
        true
    }

    fn key_down(&mut self, _event: &InputEvent, key: KeyCode) -> bool {
        match (key, self.camera.as_ref()) {
            (KeyCode::Home, Some(camera)) => {
                camera.borrow_mut().reset();
                true
            }
            _ => false,
        }
    }
}
