//! 实体方案：场景文件中实体的可序列化描述

use bevy_ecs::prelude::*;
use bevy_ecs::world::EntityWorldMut;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::{EditorResult, SchemeError};
use crate::ecs::{EntityEngine, EntityName, Groups, LayerId, Sprite, Transform, ZIndex};

fn unit_scale() -> [f32; 2] {
    [1.0, 1.0]
}

fn opaque_white() -> [f32; 4] {
    [1.0; 4]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ComponentScheme {
    Name {
        name: String,
    },
    Transform {
        position: [f32; 2],
        #[serde(default = "unit_scale")]
        scale: [f32; 2],
        #[serde(default)]
        origin: [f32; 2],
        #[serde(default)]
        rotation: f32,
    },
    Sprite {
        texture: String,
        width: f32,
        height: f32,
        #[serde(default = "opaque_white")]
        tint: [f32; 4],
        #[serde(default)]
        flip_x: bool,
        #[serde(default)]
        flip_y: bool,
    },
    Layer {
        id: u32,
    },
    ZIndex {
        value: i32,
    },
    Groups {
        ids: Vec<i32>,
    },
}

impl ComponentScheme {
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentScheme::Name { .. } => "Name",
            ComponentScheme::Transform { .. } => "Transform",
            ComponentScheme::Sprite { .. } => "Sprite",
            ComponentScheme::Layer { .. } => "Layer",
            ComponentScheme::ZIndex { .. } => "ZIndex",
            ComponentScheme::Groups { .. } => "Groups",
        }
    }

    pub fn validate(&self) -> Result<(), SchemeError> {
        let invalid = |reason: &str| SchemeError::InvalidValue {
            component: self.kind(),
            reason: reason.to_string(),
        };

        match self {
            ComponentScheme::Transform { position, scale, origin, rotation } => {
                let mut values = position.iter().chain(scale).chain(origin).chain(std::iter::once(rotation));
                if values.any(|v| !v.is_finite()) {
                    return Err(invalid("non-finite value"));
                }
            }
            ComponentScheme::Sprite { texture, width, height, .. } => {
                if texture.is_empty() {
                    return Err(invalid("texture path is empty"));
                }
                if !(width.is_finite() && height.is_finite() && *width > 0.0 && *height > 0.0) {
                    return Err(invalid("size must be positive"));
                }
            }
            ComponentScheme::Groups { ids } => {
                if ids.iter().any(|&id| id < 0) {
                    return Err(invalid("group ids must be non-negative"));
                }
            }
            ComponentScheme::Name { .. } | ComponentScheme::Layer { .. } | ComponentScheme::ZIndex { .. } => {}
        }
        Ok(())
    }

    fn insert_into(&self, entity: &mut EntityWorldMut<'_>) {
        match self {
            ComponentScheme::Name { name } => {
                entity.insert(EntityName(name.clone()));
            }
            ComponentScheme::Transform { position, scale, origin, rotation } => {
                entity.insert(Transform {
                    position: Vec2::from(*position),
                    scale: Vec2::from(*scale),
                    origin: Vec2::from(*origin),
                    rotation: *rotation,
                });
            }
            ComponentScheme::Sprite { texture, width, height, tint, flip_x, flip_y } => {
                entity.insert(Sprite {
                    texture: texture.clone(),
                    width: *width,
                    height: *height,
                    tint: *tint,
                    flip_x: *flip_x,
                    flip_y: *flip_y,
                    texture_generation: 0,
                });
            }
            ComponentScheme::Layer { id } => {
                entity.insert(LayerId(*id));
            }
            ComponentScheme::ZIndex { value } => {
                entity.insert(ZIndex(*value));
            }
            ComponentScheme::Groups { ids } => {
                entity.insert(Groups { ids: ids.clone() });
            }
        }
    }
}

impl From<&Transform> for ComponentScheme {
    fn from(transform: &Transform) -> Self {
        ComponentScheme::Transform {
            position: transform.position.to_array(),
            scale: transform.scale.to_array(),
            origin: transform.origin.to_array(),
            rotation: transform.rotation,
        }
    }
}

impl From<&Sprite> for ComponentScheme {
    fn from(sprite: &Sprite) -> Self {
        ComponentScheme::Sprite {
            texture: sprite.texture.clone(),
            width: sprite.width,
            height: sprite.height,
            tint: sprite.tint,
            flip_x: sprite.flip_x,
            flip_y: sprite.flip_y,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityScheme {
    pub components: Vec<ComponentScheme>,
}

impl EntityScheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component: ComponentScheme) -> Self {
        self.components.push(component);
        self
    }

    pub fn push(&mut self, component: ComponentScheme) {
        self.components.push(component);
    }

    pub fn name(&self) -> Option<&str> {
        self.components.iter().find_map(|c| match c {
            ComponentScheme::Name { name } => Some(name.as_str()),
            _ => None,
        })
    }

    /// 至少一个组件，每种组件最多一个，且数值合法
    pub fn validate(&self) -> Result<(), SchemeError> {
        if self.components.is_empty() {
            return Err(SchemeError::Empty);
        }
        for (index, component) in self.components.iter().enumerate() {
            if self.components[..index].iter().any(|c| c.kind() == component.kind()) {
                return Err(SchemeError::DuplicateComponent(component.kind()));
            }
            component.validate()?;
        }
        Ok(())
    }

    /// 在引擎中创建实体
    ///
    /// 纹理是否存在不在这里检查，缺失的纹理由渲染后端按路径处理。
    pub fn build(&self, engine: &mut EntityEngine) -> EditorResult<Entity> {
        self.validate()?;
        engine.build_entity(|entity| {
            for component in &self.components {
                component.insert_into(entity);
            }
            Ok(())
        })
    }
}
