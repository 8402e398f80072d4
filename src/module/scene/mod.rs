//! 场景作用域模块

use std::rc::Rc;

use super::{EditorModuleContainer, Module, Project, ProjectModuleContainer};
use crate::core::EditorResult;
use crate::ecs::EntityEngine;
use crate::platform::ModuleInput;
use crate::render::RenderBatch;
use crate::scene::SharedScene;

pub mod camera;
pub mod container;
pub mod io;

pub use camera::CameraModule;
pub use container::SceneModuleContainer;
pub use io::SceneIoModule;

/// 场景标签页标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneTab {
    pub id: u64,
    pub title: String,
}

impl SceneTab {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self { id, title: title.into() }
    }
}

/// 添加到场景容器时注入给模块的引用
#[derive(Clone)]
pub struct SceneContext {
    pub project: Rc<Project>,
    pub project_container: Rc<ProjectModuleContainer>,
    pub editor_container: Rc<EditorModuleContainer>,
    pub tab: SceneTab,
    pub scene: SharedScene,
}

/// 需要在实体引擎中注册系统或管理器的模块
pub trait EntityEngineConfigurator {
    /// 在模块注册进容器之前调用，此时引擎尚未初始化
    fn setup_entity_engine(&mut self, engine: &mut EntityEngine) -> EditorResult<()>;
}

pub trait SceneModule: Module + ModuleInput {
    /// 在 `SceneModuleContainer::add` 中调用，早于 `init`
    fn set_scene_context(&mut self, context: SceneContext);

    fn render(&mut self, _batch: &mut RenderBatch) -> EditorResult<()> {
        Ok(())
    }

    fn on_show(&mut self) {}

    fn on_hide(&mut self) {}

    fn save(&mut self) -> EditorResult<()> {
        Ok(())
    }

    fn as_engine_configurator(&mut self) -> Option<&mut dyn EntityEngineConfigurator> {
        None
    }
}
