//! 场景相机

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use super::EngineManager;

/// 窗口尺寸变化时相机视口的适配方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneViewport {
    /// 一个世界单位等于一个像素
    #[default]
    Screen,
    /// 拉伸世界尺寸填满窗口
    Stretch,
    /// 保持比例，完整显示世界尺寸
    Fit,
    /// 保持比例，填满窗口，可能裁掉一部分
    Fill,
    /// 保持比例，沿短边扩展可见区域
    Extend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrthographicCamera {
    /// 视口中心
    pub position: Vec2,
    pub zoom: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl OrthographicCamera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport_width,
            viewport_height,
        }
    }

    pub fn visible_bounds(&self) -> (Vec2, Vec2) {
        let half = Vec2::new(self.viewport_width, self.viewport_height) * self.zoom * 0.5;
        (self.position - half, self.position + half)
    }

    pub fn combined(&self) -> Mat4 {
        let (min, max) = self.visible_bounds();
        Mat4::orthographic_rh(min.x, max.x, min.y, max.y, -1.0, 1.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// 屏幕坐标（原点左上，y 向下）转世界坐标
    pub fn unproject(&self, screen: Vec2, screen_size: Vec2) -> Vec2 {
        if screen_size.x <= 0.0 || screen_size.y <= 0.0 {
            return self.position;
        }
        let (min, max) = self.visible_bounds();
        let normalized = Vec2::new(screen.x / screen_size.x, 1.0 - screen.y / screen_size.y);
        min + normalized * (max - min)
    }

    pub fn reset(&mut self) {
        self.position = Vec2::ZERO;
        self.zoom = 1.0;
    }
}

/// 持有场景相机并按视口策略处理窗口尺寸变化
#[derive(Debug)]
pub struct CameraManager {
    viewport: SceneViewport,
    world_size: Vec2,
    screen_size: Vec2,
    camera: Rc<RefCell<OrthographicCamera>>,
}

impl CameraManager {
    pub fn new(viewport: SceneViewport, world_width: f32, world_height: f32) -> Self {
        Self {
            viewport,
            world_size: Vec2::new(world_width, world_height),
            screen_size: Vec2::ZERO,
            camera: Rc::new(RefCell::new(OrthographicCamera::new(world_width, world_height))),
        }
    }

    /// 编辑器视图使用的屏幕视口，世界尺寸随窗口变化
    pub fn screen() -> Self {
        Self::new(SceneViewport::Screen, 0.0, 0.0)
    }

    pub fn viewport(&self) -> SceneViewport {
        self.viewport
    }

    pub fn camera(&self) -> Rc<RefCell<OrthographicCamera>> {
        Rc::clone(&self.camera)
    }

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    pub fn combined(&self) -> Mat4 {
        self.camera.borrow().combined()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let screen = Vec2::new(width as f32, height as f32);
        self.screen_size = screen;

        let world = self.world_size;
        let visible = match self.viewport {
            SceneViewport::Screen => screen,
            SceneViewport::Stretch | SceneViewport::Fit => world,
            SceneViewport::Fill | SceneViewport::Extend if world.x <= 0.0 || world.y <= 0.0 => screen,
            SceneViewport::Fill => {
                let scale = (screen.x / world.x).max(screen.y / world.y);
                screen / scale
            }
            SceneViewport::Extend => {
                let scale = (screen.x / world.x).min(screen.y / world.y);
                screen / scale
            }
        };

        let mut camera = self.camera.borrow_mut();
        camera.viewport_width = visible.x;
        camera.viewport_height = visible.y;
        tracing::trace!(target: "camera", viewport = ?self.viewport, width, height, "Camera resized");
    }

    pub fn unproject(&self, screen: Vec2) -> Vec2 {
        self.camera.borrow().unproject(screen, self.screen_size)
    }
}

impl EngineManager for CameraManager {
    crate::impl_as_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_viewport_follows_window() {
        let mut manager = CameraManager::screen();
        manager.resize(800, 600);

        let camera = manager.camera();
        assert_eq!(camera.borrow().viewport_width, 800.0);
        assert_eq!(camera.borrow().visible_bounds(), (Vec2::new(-400.0, -300.0), Vec2::new(400.0, 300.0)));
    }

    #[test]
    fn test_extend_keeps_world_visible() {
        let mut manager = CameraManager::new(SceneViewport::Extend, 100.0, 100.0);
        manager.resize(200, 100);
        let camera = manager.camera();
        let camera = camera.borrow();
        assert_eq!((camera.viewport_width, camera.viewport_height), (200.0, 100.0));

        let mut fill = CameraManager::new(SceneViewport::Fill, 100.0, 100.0);
        fill.resize(200, 100);
        assert_eq!(fill.camera().borrow().viewport_height, 50.0);
    }

    #[test]
    fn test_unproject_center_and_corner() {
        let mut manager = CameraManager::screen();
        manager.resize(100, 100);
        manager.camera().borrow_mut().position = Vec2::new(10.0, 10.0);

        assert_eq!(manager.unproject(Vec2::new(50.0, 50.0)), Vec2::new(10.0, 10.0));
        assert_eq!(manager.unproject(Vec2::new(0.0, 0.0)), Vec2::new(-40.0, 60.0));
    }
}
