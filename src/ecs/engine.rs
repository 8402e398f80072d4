//! 实体引擎
//!
//! 包装 `bevy_ecs::World`，按注册顺序驱动管理器和系统。
//! 被动系统只在 `process_system` 显式调用时运行，不参与每帧 `process`。
//! 通过 `fix_registered` 固定下来的管理器和系统不能再被替换。

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;

use bevy_ecs::prelude::*;
use bevy_ecs::world::EntityWorldMut;

use super::Time;
use crate::core::{EditorError, EditorResult};
use crate::module::ModuleLookup;

/// 管理器：保存跨实体的状态，响应实体增删
pub trait EngineManager: Any {
    fn initialize(&mut self, _world: &mut World) -> EditorResult<()> {
        Ok(())
    }

    /// 每帧在所有系统之前调用
    fn before_process(&mut self, _world: &mut World) {}

    fn entity_added(&mut self, _world: &mut World, _entity: Entity) {}

    /// 实体被销毁前调用，此时组件仍可读取
    fn entity_removed(&mut self, _world: &mut World, _entity: Entity) {}

    fn inject_modules(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
        Ok(())
    }

    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub trait EngineSystem: Any {
    fn initialize(&mut self, _world: &mut World, _managers: &mut Managers) -> EditorResult<()> {
        Ok(())
    }

    fn process(&mut self, world: &mut World, managers: &mut Managers) -> EditorResult<()>;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn inject_modules(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
        Ok(())
    }

    fn dispose(&mut self) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 按注册顺序保存的管理器，同一类型只保留一个
#[derive(Default)]
pub struct Managers {
    entries: Vec<Box<dyn EngineManager>>,
}

impl Managers {
    /// 插入管理器，返回被替换的同类型旧实例
    pub fn insert(&mut self, manager: Box<dyn EngineManager>) -> Option<Box<dyn EngineManager>> {
        let type_id = manager.as_any().type_id();
        match self.position(type_id) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index], manager)),
            None => {
                self.entries.push(manager);
                None
            }
        }
    }

    pub fn get<T: EngineManager>(&self) -> Option<&T> {
        self.entries.iter().find_map(|m| m.as_any().downcast_ref::<T>())
    }

    pub fn get_mut<T: EngineManager>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|m| m.as_any_mut().downcast_mut::<T>())
    }

    pub fn require<T: EngineManager>(&self) -> EditorResult<&T> {
        self.get::<T>()
            .ok_or_else(|| EditorError::missing(type_name::<T>()))
    }

    pub fn contains<T: EngineManager>(&self) -> bool {
        self.get::<T>().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn EngineManager>> {
        self.entries.iter_mut()
    }

    fn position(&self, type_id: TypeId) -> Option<usize> {
        self.entries.iter().position(|m| m.as_any().type_id() == type_id)
    }

    fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.entries.iter().map(|m| m.as_any().type_id())
    }
}

struct SystemEntry {
    name: &'static str,
    passive: bool,
    system: Box<dyn EngineSystem>,
}

/// 事务期间的一次注册，回滚时据此恢复
enum Registration {
    Manager {
        type_id: TypeId,
        replaced: Option<Box<dyn EngineManager>>,
    },
    System {
        type_id: TypeId,
        replaced: Option<SystemEntry>,
    },
}

pub struct EntityEngine {
    world: World,
    managers: Managers,
    systems: Vec<SystemEntry>,
    fixed: HashSet<TypeId>,
    journal: Option<Vec<Registration>>,
    initialized: bool,
}

impl Default for EntityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityEngine {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(Time::default());
        Self {
            world,
            managers: Managers::default(),
            systems: Vec::new(),
            fixed: HashSet::new(),
            journal: None,
            initialized: false,
        }
    }

    /// 把当前所有管理器和系统标记为固定，之后同类型的注册会失败
    pub fn fix_registered(&mut self) {
        let managers: Vec<TypeId> = self.managers.type_ids().collect();
        self.fixed.extend(managers);
        self.fixed
            .extend(self.systems.iter().map(|e| e.system.as_any().type_id()));
    }

    pub fn is_fixed<T: Any>(&self) -> bool {
        self.fixed.contains(&TypeId::of::<T>())
    }

    fn ensure_replaceable(&self, type_id: TypeId, name: &str) -> EditorResult<()> {
        if self.fixed.contains(&type_id) {
            return Err(EditorError::illegal_state(format!(
                "{name} is fixed engine infrastructure and can't be replaced"
            )));
        }
        Ok(())
    }

    /// 在事务中运行注册
    ///
    /// `f` 返回错误时，期间注册的管理器和系统被撤销，被替换的旧实例恢复原位。
    /// 只记录注册，不记录实体的增删。
    pub fn transaction<R>(&mut self, f: impl FnOnce(&mut Self) -> EditorResult<R>) -> EditorResult<R> {
        if self.journal.is_some() {
            return f(self);
        }

        self.journal = Some(Vec::new());
        let result = f(self);
        let journal = self.journal.take().unwrap_or_default();
        match result {
            Ok(value) => {
                for registration in journal {
                    match registration {
                        Registration::Manager { replaced: Some(mut old), .. } => old.dispose(),
                        Registration::System { replaced: Some(mut old), .. } => old.system.dispose(),
                        _ => {}
                    }
                }
                Ok(value)
            }
            Err(e) => {
                if !journal.is_empty() {
                    tracing::debug!(target: "engine", "Rolling back {} engine registrations", journal.len());
                }
                for registration in journal.into_iter().rev() {
                    self.revert(registration);
                }
                Err(e)
            }
        }
    }

    fn revert(&mut self, registration: Registration) {
        match registration {
            Registration::Manager { type_id, replaced } => {
                let Some(index) = self.managers.position(type_id) else {
                    return;
                };
                let mut added = match replaced {
                    Some(old) => std::mem::replace(&mut self.managers.entries[index], old),
                    None => self.managers.entries.remove(index),
                };
                added.dispose();
            }
            Registration::System { type_id, replaced } => {
                let Some(index) = self
                    .systems
                    .iter()
                    .position(|e| e.system.as_any().type_id() == type_id)
                else {
                    return;
                };
                let mut added = match replaced {
                    Some(old) => std::mem::replace(&mut self.systems[index], old),
                    None => self.systems.remove(index),
                };
                added.system.dispose();
            }
        }
    }

    pub fn set_manager<T: EngineManager>(&mut self, manager: T) -> EditorResult<()> {
        self.set_manager_boxed(Box::new(manager))
    }

    /// 同类型的管理器会被替换，固定的管理器除外；引擎已初始化时立即初始化新管理器
    pub fn set_manager_boxed(&mut self, mut manager: Box<dyn EngineManager>) -> EditorResult<()> {
        let type_id = manager.as_any().type_id();
        self.ensure_replaceable(type_id, "manager")?;
        if self.initialized {
            manager.initialize(&mut self.world)?;
        }

        let replaced = self.managers.insert(manager);
        if replaced.is_some() {
            tracing::warn!(target: "engine", "Replacing manager of the same type");
        }
        match self.journal.as_mut() {
            Some(journal) => journal.push(Registration::Manager { type_id, replaced }),
            None => {
                if let Some(mut old) = replaced {
                    old.dispose();
                }
            }
        }
        Ok(())
    }

    pub fn set_system<T: EngineSystem>(&mut self, system: T, passive: bool) -> EditorResult<()> {
        self.set_system_boxed(Box::new(system), passive)
    }

    /// 同类型的系统会被替换，固定的系统除外；引擎已初始化时立即初始化新系统
    pub fn set_system_boxed(&mut self, mut system: Box<dyn EngineSystem>, passive: bool) -> EditorResult<()> {
        let type_id = system.as_any().type_id();
        let name = system.name();
        self.ensure_replaceable(type_id, name)?;
        if self.initialized {
            system.initialize(&mut self.world, &mut self.managers)?;
        }

        let entry = SystemEntry { name, passive, system };
        let replaced = match self
            .systems
            .iter()
            .position(|e| e.system.as_any().type_id() == type_id)
        {
            Some(index) => {
                tracing::warn!(target: "engine", "Replacing system {}", name);
                Some(std::mem::replace(&mut self.systems[index], entry))
            }
            None => {
                self.systems.push(entry);
                None
            }
        };
        match self.journal.as_mut() {
            Some(journal) => journal.push(Registration::System { type_id, replaced }),
            None => {
                if let Some(mut old) = replaced {
                    old.system.dispose();
                }
            }
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> EditorResult<()> {
        if self.initialized {
            return Err(EditorError::illegal_state("EntityEngine already initialized"));
        }

        for manager in self.managers.iter_mut() {
            manager.initialize(&mut self.world)?;
        }
        for entry in &mut self.systems {
            entry.system.initialize(&mut self.world, &mut self.managers)?;
        }

        self.initialized = true;
        tracing::debug!(
            target: "engine",
            managers = self.managers.len(),
            systems = self.systems.len(),
            "EntityEngine initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn set_delta(&mut self, delta: f32) {
        self.world.resource_mut::<Time>().delta_seconds = delta;
    }

    pub fn delta(&self) -> f32 {
        self.world.resource::<Time>().delta_seconds
    }

    /// 运行一帧：管理器 `before_process`，然后按顺序运行所有非被动系统
    pub fn process(&mut self) -> EditorResult<()> {
        if !self.initialized {
            return Err(EditorError::illegal_state("EntityEngine processed before initialize"));
        }

        {
            let mut time = self.world.resource_mut::<Time>();
            let delta = f64::from(time.delta_seconds);
            time.elapsed_seconds += delta;
            time.frame += 1;
        }

        for manager in self.managers.iter_mut() {
            manager.before_process(&mut self.world);
        }
        for entry in self.systems.iter_mut().filter(|e| !e.passive) {
            entry.system.process(&mut self.world, &mut self.managers)?;
        }
        Ok(())
    }

    /// 单独运行一个系统（通常是被动系统）
    pub fn process_system<T: EngineSystem>(&mut self) -> EditorResult<()> {
        let entry = self
            .systems
            .iter_mut()
            .find(|e| e.system.as_any().is::<T>())
            .ok_or_else(|| EditorError::missing(type_name::<T>()))?;
        entry.system.process(&mut self.world, &mut self.managers)
    }

    pub fn manager<T: EngineManager>(&self) -> Option<&T> {
        self.managers.get::<T>()
    }

    pub fn manager_mut<T: EngineManager>(&mut self) -> Option<&mut T> {
        self.managers.get_mut::<T>()
    }

    /// 同时借用管理器和世界
    pub fn with_manager<T: EngineManager, R>(&mut self, f: impl FnOnce(&mut T, &mut World) -> R) -> Option<R> {
        let manager = self.managers.get_mut::<T>()?;
        Some(f(manager, &mut self.world))
    }

    pub fn managers(&self) -> &Managers {
        &self.managers
    }

    pub fn system<T: EngineSystem>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|e| e.system.as_any().downcast_ref::<T>())
    }

    pub fn system_mut<T: EngineSystem>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|e| e.system.as_any_mut().downcast_mut::<T>())
    }

    pub fn is_passive<T: EngineSystem>(&self) -> Option<bool> {
        self.systems
            .iter()
            .find(|e| e.system.as_any().is::<T>())
            .map(|e| e.passive)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|e| e.name).collect()
    }

    /// 创建实体，`build` 返回错误时实体被回收
    pub fn build_entity<F>(&mut self, build: F) -> EditorResult<Entity>
    where
        F: FnOnce(&mut EntityWorldMut<'_>) -> EditorResult<()>,
    {
        let mut entity_mut = self.world.spawn_empty();
        let entity = entity_mut.id();
        if let Err(e) = build(&mut entity_mut) {
            self.world.despawn(entity);
            return Err(e);
        }

        for manager in self.managers.iter_mut() {
            manager.entity_added(&mut self.world, entity);
        }
        Ok(entity)
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.world.get_entity(entity).is_none() {
            return false;
        }
        for manager in self.managers.iter_mut() {
            manager.entity_removed(&mut self.world, entity);
        }
        self.world.despawn(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    /// 把模块句柄注入系统和管理器（先系统后管理器）
    pub fn inject_modules(&mut self, modules: &dyn ModuleLookup) -> EditorResult<()> {
        for entry in &mut self.systems {
            entry.system.inject_modules(modules)?;
        }
        for manager in self.managers.iter_mut() {
            manager.inject_modules(modules)?;
        }
        Ok(())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn dispose(&mut self) {
        for entry in &mut self.systems {
            entry.system.dispose();
        }
        for manager in self.managers.iter_mut() {
            manager.dispose();
        }
        self.world.clear_entities();
        tracing::debug!(target: "engine", "EntityEngine disposed");
    }
}
