use bevy_ecs::prelude::*;
use glam::Vec2;

pub mod camera;
pub mod engine;
pub mod groups;
pub mod infrastructure;
pub mod layers;
pub mod proxy;
pub mod render_systems;
pub mod serializer;
pub mod texture_reload;

#[cfg(test)]
mod tests;

pub use camera::{CameraManager, OrthographicCamera, SceneViewport};
pub use engine::{EngineManager, EngineSystem, EntityEngine, Managers};
pub use groups::{GroupIdProviderSystem, GroupProxy, GroupProxyProviderSystem};
pub use infrastructure::EngineInfrastructure;
pub use layers::{LayerManipulatorManager, ZIndexManipulatorManager};
pub use proxy::{EntityProxy, EntityProxyCache};
pub use render_systems::{common_systems, GridRendererSystem, SpriteRenderSystem};
pub use serializer::EntitySerializerManager;
pub use texture_reload::TextureReloaderManager;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// 左下角位置
    pub position: Vec2,
    pub scale: Vec2,
    /// 旋转和缩放的原点，相对 `position`
    pub origin: Vec2,
    /// 角度制
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            origin: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// 轴对齐包围盒，忽略旋转
    pub fn bounds(&self, size: Vec2) -> (Vec2, Vec2) {
        let scaled = size * self.scale;
        let min = self.position + self.origin - self.origin * self.scale;
        let max = min + scaled;
        (min.min(max), min.max(max))
    }
}

#[derive(Component, Clone, Debug, PartialEq)]
pub struct Sprite {
    /// 项目内纹理路径
    pub texture: String,
    pub width: f32,
    pub height: f32,
    pub tint: [f32; 4],
    pub flip_x: bool,
    pub flip_y: bool,
    /// 最近一次看到的纹理重载代数
    pub texture_generation: u64,
}

impl Sprite {
    pub fn new(texture: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            texture: texture.into(),
            width,
            height,
            tint: [1.0; 4],
            flip_x: false,
            flip_y: false,
            texture_generation: 0,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZIndex(pub i32);

/// 实体所属的组，外层在前
#[derive(Component, Clone, Debug, Default, PartialEq, Eq)]
pub struct Groups {
    pub ids: Vec<i32>,
}

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct EntityName(pub String);

/// 编辑器内稳定的实体编号，由 `EntityProxyCache` 分配
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u64);

/// 帧时间
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct Time {
    pub delta_seconds: f32,
    pub elapsed_seconds: f64,
    pub frame: u64,
}
