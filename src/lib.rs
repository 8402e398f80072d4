//! # Scene Editor
//!
//! 2D 游戏引擎可视化场景编辑器的核心：场景模块容器和导出设置。
//!
//! ## Features
//!
//! - **Module Scopes**: 编辑器 / 项目 / 场景三级模块容器，按类型查找并沿父链回退
//! - **Entity Engine**: 基于 `bevy_ecs` 的实体引擎，预置相机、图层、序列化等管理器
//! - **Input Fan-out**: UI 输入逐个转发给场景模块，布尔结果取或
//! - **Exporter Settings**: 按整数标签持久化的导出设置，前后版本兼容
//!
//! ### Example
//!
//! ```ignore
//! use scene_editor::prelude::*;
//!
//! let mut container = SceneModuleContainer::new(project_container, tab, scene, &batch)?;
//! container.add(CameraModule::new())?;
//! container.init()?;
//! container.render(&batch)?;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: 错误类型、日志、通用宏
//! - [`config`]: 编辑器配置
//! - [`module`]: 模块容器和内置模块
//! - [`ecs`]: 实体引擎及其管理器和系统
//! - [`scene`]: 场景文件与实体方案
//! - [`export`]: 导出设置

/// Core infrastructure: errors, logging, macros
pub mod core;
/// Configuration system
pub mod config;
/// Host window and input abstraction
pub mod platform;
/// Draw command recording
pub mod render;
/// Entity engine built on bevy_ecs
pub mod ecs;
/// Scene files and entity schemes
pub mod scene;
/// Editor module containers
pub mod module;
/// Exporter settings
pub mod export;
/// Tagged-field binary codec
pub mod serialization;

pub mod prelude {
    pub use crate::config::{EditorConfig, SceneEditorConfig};
    pub use crate::core::{EditorError, EditorResult};
    pub use crate::ecs::{EngineInfrastructure, EntityEngine};
    pub use crate::export::{ExporterSettings, TextureFilter};
    pub use crate::module::{
        CameraModule, EditorModuleContainer, EditorSettingsModule, Module, ModuleLookup,
        ModuleLookupExt, Project, ProjectModuleContainer, SceneIoModule, SceneModule,
        SceneModuleContainer, SceneTab, TextureCacheModule,
    };
    pub use crate::platform::{dispatch_input, Graphics, HeadlessGraphics, InputEvent, InputEventType, ModuleInput};
    pub use crate::render::{RenderBatch, SharedBatch};
    pub use crate::scene::{EditorScene, EntityScheme};
    pub use crate::serialization::TaggedRecord;
}
