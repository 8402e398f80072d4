//! 图层与 z 序操作

use std::collections::BTreeSet;

use bevy_ecs::prelude::*;

use super::{EngineManager, LayerId, ProxyId, ZIndex};
use crate::scene::LayerInfo;

/// 图层可见性以及实体在图层间的移动
#[derive(Debug, Default)]
pub struct LayerManipulatorManager {
    hidden: BTreeSet<u32>,
}

impl LayerManipulatorManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layers(layers: &[LayerInfo]) -> Self {
        Self {
            hidden: layers.iter().filter(|l| !l.visible).map(|l| l.id).collect(),
        }
    }

    pub fn is_visible(&self, layer: u32) -> bool {
        !self.hidden.contains(&layer)
    }

    pub fn set_visible(&mut self, layer: u32, visible: bool) {
        if visible {
            self.hidden.remove(&layer);
        } else {
            self.hidden.insert(layer);
        }
    }

    pub fn hidden_layers(&self) -> impl Iterator<Item = u32> + '_ {
        self.hidden.iter().copied()
    }

    /// 没有 `LayerId` 的实体视为在 0 层
    pub fn entities_on_layer(&self, world: &mut World, layer: u32) -> Vec<Entity> {
        let mut query = world.query::<(Entity, Option<&LayerId>)>();
        query
            .iter(world)
            .filter(|(_, id)| id.map_or(0, |id| id.0) == layer)
            .map(|(entity, _)| entity)
            .collect()
    }

    pub fn move_to_layer(&self, world: &mut World, entity: Entity, layer: u32) -> bool {
        match world.get_entity_mut(entity) {
            Some(mut entity_mut) => {
                entity_mut.insert(LayerId(layer));
                true
            }
            None => false,
        }
    }

    /// 把 `from` 层的所有实体移到 `into` 层，返回移动的数量
    pub fn merge_layer(&self, world: &mut World, from: u32, into: u32) -> usize {
        let entities = self.entities_on_layer(world, from);
        for &entity in &entities {
            self.move_to_layer(world, entity, into);
        }
        entities.len()
    }

    pub fn swap_layers(&self, world: &mut World, a: u32, b: u32) -> usize {
        let on_a = self.entities_on_layer(world, a);
        let on_b = self.entities_on_layer(world, b);
        for &entity in &on_a {
            self.move_to_layer(world, entity, b);
        }
        for &entity in &on_b {
            self.move_to_layer(world, entity, a);
        }
        on_a.len() + on_b.len()
    }
}

impl EngineManager for LayerManipulatorManager {
    crate::impl_as_any!();
}

/// 同一图层内的 z 序调整
#[derive(Debug, Default)]
pub struct ZIndexManipulatorManager;

impl ZIndexManipulatorManager {
    pub fn new() -> Self {
        Self
    }

    /// 图层内实体按 (z, proxy, index) 排序
    pub fn ordered(&self, world: &mut World, layer: u32) -> Vec<(Entity, i32)> {
        let mut query = world.query::<(Entity, Option<&LayerId>, Option<&ZIndex>, Option<&ProxyId>)>();
        let mut entries: Vec<(Entity, i32, u64)> = query
            .iter(world)
            .filter(|(_, id, _, _)| id.map_or(0, |id| id.0) == layer)
            .map(|(entity, _, z, proxy)| {
                (entity, z.map_or(0, |z| z.0), proxy.map_or(u64::MAX, |p| p.0))
            })
            .collect();
        entries.sort_by_key(|&(entity, z, proxy)| (z, proxy, entity.index()));
        entries.into_iter().map(|(entity, z, _)| (entity, z)).collect()
    }

    fn layer_of(world: &World, entity: Entity) -> Option<u32> {
        world.get_entity(entity)?;
        Some(world.get::<LayerId>(entity).map_or(0, |l| l.0))
    }

    fn set_z(world: &mut World, entity: Entity, z: i32) {
        if let Some(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(ZIndex(z));
        }
    }

    /// 与上方相邻的实体交换位置
    pub fn bring_forward(&self, world: &mut World, entity: Entity) -> bool {
        self.swap_with_neighbor(world, entity, 1)
    }

    pub fn send_backward(&self, world: &mut World, entity: Entity) -> bool {
        self.swap_with_neighbor(world, entity, -1)
    }

    fn swap_with_neighbor(&self, world: &mut World, entity: Entity, step: isize) -> bool {
        let Some(layer) = Self::layer_of(world, entity) else {
            return false;
        };
        let mut ordered = self.ordered(world, layer);
        let Some(position) = ordered.iter().position(|&(e, _)| e == entity) else {
            return false;
        };
        let Some(neighbor) = position.checked_add_signed(step).filter(|&n| n < ordered.len()) else {
            return false;
        };

        ordered.swap(position, neighbor);
        self.apply_order(world, &ordered);
        true
    }

    pub fn bring_to_front(&self, world: &mut World, entity: Entity) -> bool {
        let Some(layer) = Self::layer_of(world, entity) else {
            return false;
        };
        let mut ordered = self.ordered(world, layer);
        let Some(position) = ordered.iter().position(|&(e, _)| e == entity) else {
            return false;
        };
        let moved = ordered.remove(position);
        ordered.push(moved);
        self.apply_order(world, &ordered);
        true
    }

    pub fn send_to_back(&self, world: &mut World, entity: Entity) -> bool {
        let Some(layer) = Self::layer_of(world, entity) else {
            return false;
        };
        let mut ordered = self.ordered(world, layer);
        let Some(position) = ordered.iter().position(|&(e, _)| e == entity) else {
            return false;
        };
        let moved = ordered.remove(position);
        ordered.insert(0, moved);
        self.apply_order(world, &ordered);
        true
    }

    /// 把图层内的 z 值重排为 0..n
    pub fn normalize(&self, world: &mut World, layer: u32) {
        let ordered = self.ordered(world, layer);
        self.apply_order(world, &ordered);
    }

    fn apply_order(&self, world: &mut World, ordered: &[(Entity, i32)]) {
        for (z, &(entity, old)) in ordered.iter().enumerate() {
            let z = z as i32;
            if z != old || world.get::<ZIndex>(entity).is_none() {
                Self::set_z(world, entity, z);
            }
        }
    }
}

impl EngineManager for ZIndexManipulatorManager {
    crate::impl_as_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(world: &mut World, layer: u32, z: i32) -> Entity {
        world.spawn((LayerId(layer), ZIndex(z))).id()
    }

    fn z(world: &World, entity: Entity) -> i32 {
        world.get::<ZIndex>(entity).unwrap().0
    }

    #[test]
    fn test_bring_forward_swaps_neighbors() {
        let mut world = World::new();
        let a = spawn(&mut world, 0, 0);
        let b = spawn(&mut world, 0, 5);
        let other = spawn(&mut world, 1, 3);

        let manager = ZIndexManipulatorManager::new();
        assert!(manager.bring_forward(&mut world, a));
        assert!(z(&world, a) > z(&world, b));
        assert_eq!(z(&world, other), 3);

        assert!(!manager.bring_forward(&mut world, a));
        assert!(manager.send_to_back(&mut world, a));
        assert!(z(&world, a) < z(&world, b));
    }

    #[test]
    fn test_layer_moves() {
        let mut world = World::new();
        let a = spawn(&mut world, 0, 0);
        let b = spawn(&mut world, 2, 0);
        let unlayered = world.spawn(ZIndex(1)).id();

        let manager = LayerManipulatorManager::new();
        assert_eq!(manager.entities_on_layer(&mut world, 0).len(), 2);
        assert_eq!(manager.swap_layers(&mut world, 0, 2), 3);
        assert_eq!(world.get::<LayerId>(a), Some(&LayerId(2)));
        assert_eq!(world.get::<LayerId>(b), Some(&LayerId(0)));
        assert_eq!(world.get::<LayerId>(unlayered), Some(&LayerId(2)));
    }

    #[test]
    fn test_visibility() {
        let mut manager = LayerManipulatorManager::from_layers(&[LayerInfo::new(1, "Hidden").hidden()]);
        assert!(!manager.is_visible(1));
        manager.set_visible(1, true);
        assert!(manager.is_visible(1));
    }
}
