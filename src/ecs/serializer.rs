//! 把实体写回场景方案

use bevy_ecs::prelude::*;

use super::{EngineManager, EntityName, Groups, LayerId, ProxyId, Sprite, Transform, ZIndex};
use crate::scene::{ComponentScheme, EntityScheme};

#[derive(Debug, Default)]
pub struct EntitySerializerManager;

impl EntitySerializerManager {
    pub fn new() -> Self {
        Self
    }

    /// 没有可保存组件的实体返回 `None`
    pub fn serialize(&self, world: &World, entity: Entity) -> Option<EntityScheme> {
        let mut scheme = EntityScheme::new();

        if let Some(name) = world.get::<EntityName>(entity) {
            scheme.push(ComponentScheme::Name { name: name.0.clone() });
        }
        if let Some(transform) = world.get::<Transform>(entity) {
            scheme.push(ComponentScheme::from(transform));
        }
        if let Some(sprite) = world.get::<Sprite>(entity) {
            scheme.push(ComponentScheme::from(sprite));
        }
        if let Some(layer) = world.get::<LayerId>(entity) {
            scheme.push(ComponentScheme::Layer { id: layer.0 });
        }
        if let Some(z) = world.get::<ZIndex>(entity) {
            scheme.push(ComponentScheme::ZIndex { value: z.0 });
        }
        if let Some(groups) = world.get::<Groups>(entity).filter(|g| !g.ids.is_empty()) {
            scheme.push(ComponentScheme::Groups { ids: groups.ids.clone() });
        }

        (!scheme.components.is_empty()).then_some(scheme)
    }

    /// 所有实体按 (图层, z, 代理编号) 排序后序列化
    pub fn serialize_all(&self, world: &mut World) -> Vec<EntityScheme> {
        let mut query = world.query::<(Entity, Option<&LayerId>, Option<&ZIndex>, Option<&ProxyId>)>();
        let mut entities: Vec<(Entity, u32, i32, u64)> = query
            .iter(world)
            .map(|(entity, layer, z, proxy)| {
                (
                    entity,
                    layer.map_or(0, |l| l.0),
                    z.map_or(0, |z| z.0),
                    proxy.map_or(u64::MAX, |p| p.0),
                )
            })
            .collect();
        entities.sort_by_key(|&(entity, layer, z, proxy)| (layer, z, proxy, entity.index()));

        entities
            .into_iter()
            .filter_map(|(entity, ..)| self.serialize(world, entity))
            .collect()
    }
}

impl EngineManager for EntitySerializerManager {
    crate::impl_as_any!();
}
