//! 实体分组
//!
//! 两个系统都是被动的：只在编辑操作需要最新分组信息时通过 `process_system` 刷新。

use std::collections::{BTreeMap, BTreeSet};

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::{EngineSystem, Groups, Managers, Sprite, Transform};
use crate::core::EditorResult;

/// 分配未被占用的组编号
#[derive(Debug, Default)]
pub struct GroupIdProviderSystem {
    used: BTreeSet<i32>,
}

impl GroupIdProviderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// 最小的未使用非负编号
    pub fn free_group_id(&self) -> i32 {
        (0..)
            .find(|id| !self.used.contains(id))
            .unwrap_or_default()
    }

    /// 取得空闲编号并立即标记为已使用
    pub fn allocate(&mut self) -> i32 {
        let id = self.free_group_id();
        self.used.insert(id);
        id
    }

    pub fn is_used(&self, id: i32) -> bool {
        self.used.contains(&id)
    }
}

impl EngineSystem for GroupIdProviderSystem {
    fn process(&mut self, world: &mut World, _managers: &mut Managers) -> EditorResult<()> {
        let mut query = world.query::<&Groups>();
        self.used = query.iter(world).flat_map(|g| g.ids.iter().copied()).collect();
        Ok(())
    }

    crate::impl_as_any!();
}

/// 一个组的成员和包围盒
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProxy {
    pub group_id: i32,
    pub entities: Vec<Entity>,
    /// 成员中带 `Transform` 和 `Sprite` 的部分的并集
    pub bounds: Option<(Vec2, Vec2)>,
}

impl GroupProxy {
    fn new(group_id: i32) -> Self {
        Self {
            group_id,
            entities: Vec::new(),
            bounds: None,
        }
    }

    fn include(&mut self, entity: Entity, rect: Option<(Vec2, Vec2)>) {
        self.entities.push(entity);
        if let Some((min, max)) = rect {
            self.bounds = Some(match self.bounds {
                Some((lo, hi)) => (lo.min(min), hi.max(max)),
                None => (min, max),
            });
        }
    }
}

#[derive(Debug, Default)]
pub struct GroupProxyProviderSystem {
    proxies: BTreeMap<i32, GroupProxy>,
}

impl GroupProxyProviderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proxy(&self, group_id: i32) -> Option<&GroupProxy> {
        self.proxies.get(&group_id)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.proxies.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl EngineSystem for GroupProxyProviderSystem {
    fn process(&mut self, world: &mut World, _managers: &mut Managers) -> EditorResult<()> {
        self.proxies.clear();

        let mut query = world.query::<(Entity, &Groups, Option<&Transform>, Option<&Sprite>)>();
        let mut members: Vec<_> = query
            .iter(world)
            .map(|(entity, groups, transform, sprite)| {
                let rect = transform.zip(sprite).map(|(t, s)| t.bounds(s.size()));
                (entity, groups.ids.clone(), rect)
            })
            .collect();
        members.sort_by_key(|(entity, _, _)| entity.index());

        for (entity, ids, rect) in members {
            for id in ids {
                self.proxies
                    .entry(id)
                    .or_insert_with(|| GroupProxy::new(id))
                    .include(entity, rect);
            }
        }

        tracing::trace!(target: "engine", groups = self.proxies.len(), "Group proxies rebuilt");
        Ok(())
    }

    crate::impl_as_any!();
}
