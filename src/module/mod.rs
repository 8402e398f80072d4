//! 编辑器模块系统
//!
//! 模块按作用域分三层容器：
//! - `EditorModuleContainer` - 整个编辑器进程唯一
//! - `ProjectModuleContainer` - 每个打开的项目一个，父容器为编辑器容器
//! - `SceneModuleContainer` - 每个打开的场景标签页一个，父容器为项目容器
//!
//! 父容器在子容器构造时以 `Rc` 传入且之后不可更换，因此层级天然无环，
//! `find_in_hierarchy` 沿父链向上查找总会终止。

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{EditorError, EditorResult};

pub mod container;
pub mod editor;
pub mod project;
pub mod scene;

pub use container::ModuleContainer;
pub use editor::{EditorModuleContainer, EditorSettingsModule};
pub use project::{Project, ProjectModuleContainer, TextureCacheModule, TextureInfo, TextureReloaded};
pub use scene::{
    CameraModule, EntityEngineConfigurator, SceneContext, SceneIoModule, SceneModule,
    SceneModuleContainer, SceneTab,
};

/// 模块句柄
pub type ModuleRef<T> = Rc<RefCell<T>>;

/// 模块生命周期
///
/// `init` 中可以通过 `modules` 取得同级或上级模块的句柄并保存下来；
/// 此时模块自身正被可变借用，不要借用自己的句柄。
pub trait Module: Any {
    fn init(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
        Ok(())
    }

    /// 所有模块 `init` 完成后调用
    fn post_init(&mut self) {}

    fn resize(&mut self) {}

    fn dispose(&mut self) {}
}

/// 按类型查找模块（类型擦除版本）
pub trait ModuleLookup {
    /// 只在当前容器中查找
    fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>>;

    /// 先查当前容器，找不到再交给父容器
    fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>>;
}

/// `ModuleLookup` 的泛型便捷方法
pub trait ModuleLookupExt: ModuleLookup {
    fn get<T: Any>(&self) -> Option<ModuleRef<T>> {
        downcast_module(self.lookup_local(TypeId::of::<T>()))
    }

    fn require<T: Any>(&self) -> EditorResult<ModuleRef<T>> {
        self.get::<T>()
            .ok_or(EditorError::ModuleNotFound(type_name::<T>()))
    }

    fn find_in_hierarchy<T: Any>(&self) -> Option<ModuleRef<T>> {
        downcast_module(self.lookup_in_hierarchy(TypeId::of::<T>()))
    }
}

impl<L: ModuleLookup + ?Sized> ModuleLookupExt for L {}

fn downcast_module<T: Any>(handle: Option<Rc<dyn Any>>) -> Option<ModuleRef<T>> {
    handle?.downcast::<RefCell<T>>().ok()
}
