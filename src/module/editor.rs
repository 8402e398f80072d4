//! 编辑器作用域模块容器

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use super::{Module, ModuleContainer, ModuleLookup, ModuleRef};
use crate::config::{EditorConfig, SceneEditorConfig};
use crate::core::EditorResult;
use crate::platform::Graphics;

/// 编辑器设置，供网格渲染、相机等模块读取
#[derive(Debug, Clone, Default)]
pub struct EditorSettingsModule {
    pub scene: SceneEditorConfig,
}

impl EditorSettingsModule {
    pub fn new(scene: SceneEditorConfig) -> Self {
        Self { scene }
    }
}

impl Module for EditorSettingsModule {}

/// 编辑器容器，层级的根
pub struct EditorModuleContainer {
    graphics: Rc<dyn Graphics>,
    config: EditorConfig,
    modules: ModuleContainer<dyn Module>,
}

impl EditorModuleContainer {
    pub fn new(graphics: Rc<dyn Graphics>, config: EditorConfig) -> Self {
        Self {
            graphics,
            config,
            modules: ModuleContainer::new("editor"),
        }
    }

    /// 创建容器并注册 `EditorSettingsModule`
    pub fn with_default_modules(graphics: Rc<dyn Graphics>, config: EditorConfig) -> EditorResult<Self> {
        let settings = EditorSettingsModule::new(config.scene.clone());
        let mut container = Self::new(graphics, config);
        container.add(settings)?;
        Ok(container)
    }

    pub fn add<T: Module>(&mut self, module: T) -> EditorResult<ModuleRef<T>> {
        let handle = Rc::new(RefCell::new(module));
        let erased: Rc<RefCell<dyn Module>> = handle.clone();
        self.modules.insert(handle.clone(), erased.clone())?;

        if self.modules.is_initialized() {
            tracing::warn!(target: "module", "Module added to editor container after init, initializing immediately");
            self.modules.init_late(&erased, &*self)?;
        }
        Ok(handle)
    }

    pub fn init(&mut self) -> EditorResult<()> {
        self.modules.init_all(&*self)?;
        tracing::info!(target: "module", "Editor modules initialized: {:?}", self.modules.type_names());
        Ok(())
    }

    pub fn resize(&self) {
        self.modules.resize_all();
    }

    pub fn dispose(&mut self) {
        self.modules.dispose_all();
    }

    pub fn graphics(&self) -> Rc<dyn Graphics> {
        Rc::clone(&self.graphics)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }
}

impl ModuleLookup for EditorModuleContainer {
    fn lookup_local(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules.find(type_id)
    }

    fn lookup_in_hierarchy(&self, type_id: TypeId) -> Option<Rc<dyn Any>> {
        self.modules.find(type_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleLookupExt;
    use crate::platform::HeadlessGraphics;

    #[test]
    fn test_default_modules_registered() {
        let mut config = EditorConfig::default();
        config.scene.grid_size = 64.0;

        let mut editor =
            EditorModuleContainer::with_default_modules(Rc::new(HeadlessGraphics::default()), config).unwrap();
        editor.init().unwrap();

        let settings = editor.find_in_hierarchy::<EditorSettingsModule>().unwrap();
        assert_eq!(settings.borrow().scene.grid_size, 64.0);
        assert_eq!(editor.module_count(), 1);
    }

    #[test]
    fn test_late_module_is_initialized() {
        #[derive(Default)]
        struct Flag(bool);
        impl Module for Flag {
            fn init(&mut self, _modules: &dyn ModuleLookup) -> EditorResult<()> {
                self.0 = true;
                Ok(())
            }
        }

        let mut editor = EditorModuleContainer::new(Rc::new(HeadlessGraphics::default()), EditorConfig::default());
        editor.init().unwrap();
        let flag = editor.add(Flag::default()).unwrap();
        assert!(flag.borrow().0);
    }
}
