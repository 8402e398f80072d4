//! 场景实体引擎的标准管理器和系统组合

use super::{
    common_systems, CameraManager, EngineManager, EngineSystem, EntityEngine, EntityProxyCache,
    EntitySerializerManager, GridRendererSystem, GroupIdProviderSystem, GroupProxyProviderSystem,
    LayerManipulatorManager, TextureReloaderManager, ZIndexManipulatorManager,
};
use crate::core::EditorResult;
use crate::module::{ModuleRef, TextureCacheModule};
use crate::render::SharedBatch;
use crate::scene::EditorScene;

/// 待安装到 `EntityEngine` 的管理器和系统
///
/// 安装顺序即注册顺序，也就是每帧的运行顺序。
#[derive(Default)]
pub struct EngineInfrastructure {
    managers: Vec<Box<dyn EngineManager>>,
    systems: Vec<(Box<dyn EngineSystem>, bool)>,
}

impl EngineInfrastructure {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 编辑器场景使用的完整组合
    pub fn standard(
        batch: &SharedBatch,
        texture_cache: &ModuleRef<TextureCacheModule>,
        scene: &EditorScene,
    ) -> Self {
        let mut infrastructure = Self::empty()
            .with_manager(CameraManager::screen())
            .with_manager(LayerManipulatorManager::from_layers(&scene.layers))
            .with_manager(ZIndexManipulatorManager::new())
            .with_manager(EntityProxyCache::new())
            .with_manager(EntitySerializerManager::new())
            .with_manager(TextureReloaderManager::subscribed(texture_cache))
            .with_passive_system(GroupIdProviderSystem::new())
            .with_passive_system(GroupProxyProviderSystem::new())
            .with_system(GridRendererSystem::new(batch.clone()));

        for system in common_systems(batch) {
            infrastructure.systems.push((system, false));
        }
        infrastructure
    }

    pub fn with_manager<T: EngineManager>(mut self, manager: T) -> Self {
        self.managers.push(Box::new(manager));
        self
    }

    pub fn with_system<T: EngineSystem>(mut self, system: T) -> Self {
        self.systems.push((Box::new(system), false));
        self
    }

    /// 被动系统不参与每帧处理
    pub fn with_passive_system<T: EngineSystem>(mut self, system: T) -> Self {
        self.systems.push((Box::new(system), true));
        self
    }

    pub fn has_manager<T: EngineManager>(&self) -> bool {
        self.managers.iter().any(|m| m.as_any().is::<T>())
    }

    pub fn manager_count(&self) -> usize {
        self.managers.len()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// 安装到引擎并固定下来，此后同类型的管理器和系统不能再注册
    pub fn install(self, engine: &mut EntityEngine) -> EditorResult<()> {
        for manager in self.managers {
            engine.set_manager_boxed(manager)?;
        }
        for (system, passive) in self.systems {
            tracing::trace!(target: "engine", passive, "Installing system {}", system.name());
            engine.set_system_boxed(system, passive)?;
        }
        engine.fix_registered();
        Ok(())
    }
}
