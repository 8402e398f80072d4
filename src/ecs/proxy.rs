//! 实体代理
//!
//! `Entity` 在销毁后可能被复用，编辑器界面（选择、撤销）改用单调递增的 `ProxyId` 引用实体。

use std::collections::HashMap;

use bevy_ecs::prelude::*;

use super::{EngineManager, ProxyId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityProxy {
    pub id: ProxyId,
    pub entity: Entity,
}

#[derive(Debug, Default)]
pub struct EntityProxyCache {
    next_id: u64,
    by_entity: HashMap<Entity, ProxyId>,
    by_id: HashMap<ProxyId, Entity>,
}

impl EntityProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: Entity) -> Option<EntityProxy> {
        self.by_entity
            .get(&entity)
            .map(|&id| EntityProxy { id, entity })
    }

    pub fn entity(&self, id: ProxyId) -> Option<Entity> {
        self.by_id.get(&id).copied()
    }

    /// 按编号排序的全部代理
    pub fn proxies(&self) -> Vec<EntityProxy> {
        let mut proxies: Vec<EntityProxy> = self
            .by_id
            .iter()
            .map(|(&id, &entity)| EntityProxy { id, entity })
            .collect();
        proxies.sort_by_key(|p| p.id);
        proxies
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl EngineManager for EntityProxyCache {
    fn entity_added(&mut self, world: &mut World, entity: Entity) {
        let id = ProxyId(self.next_id);
        self.next_id += 1;

        if let Some(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(id);
        }
        self.by_entity.insert(entity, id);
        self.by_id.insert(id, entity);
    }

    fn entity_removed(&mut self, _world: &mut World, entity: Entity) {
        if let Some(id) = self.by_entity.remove(&entity) {
            self.by_id.remove(&id);
        }
    }

    fn dispose(&mut self) {
        self.by_entity.clear();
        self.by_id.clear();
    }

    crate::impl_as_any!();
}
